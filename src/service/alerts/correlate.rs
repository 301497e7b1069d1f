// Copyright 2025 OpenObserve Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Correlation and deduplication. An inbound alert either repeats a stored
//! one (same environment, resource, event and severity), changes the
//! severity of a stored one (same identity through the event name or the
//! correlated events), or opens a new document.
//!
//! Classification and mutation run under a keyed lock on the alert's
//! correlation lane (environment + resource), so concurrent workers racing
//! on the same identity serialise instead of double-inserting.

use chrono::Duration;
use config::{get_config, meta::alerts::Alert, utils::time};
use infra::{
    db::{self, Db},
    local_lock,
};

use super::status;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Correlation {
    Duplicate,
    SeverityChange,
    New,
}

impl Correlation {
    /// Duplicates are persisted but never forwarded downstream.
    pub fn should_publish(&self) -> bool {
        !matches!(self, Correlation::Duplicate)
    }
}

pub struct Processed {
    pub alert: Alert,
    pub correlation: Correlation,
}

/// Run one transformed alert through classification and persistence.
/// Returns the persisted document.
pub async fn process(mut incoming: Alert) -> Result<Processed, anyhow::Error> {
    resolve_expiry(&mut incoming);

    let lock_key = incoming.correlation_key();
    let _guard = local_lock::lock(&lock_key).await;
    let db = db::get_db().await;

    if let Some(mut stored) = db.find_duplicate(&incoming).await? {
        log::info!("{} : Duplicate alert -> update dup count", incoming.id);
        stored.absorb_duplicate(&incoming);
        if let Some(new_status) = status::on_duplicate(stored.severity, stored.status) {
            stored.set_status(new_status, time::now());
            log::info!(
                "{} : Alert status for duplicate {} {} alert changed to {}",
                incoming.id,
                stored.severity,
                stored.event,
                new_status
            );
        }
        db.put_alert(&stored).await?;
        return Ok(Processed {
            alert: stored,
            correlation: Correlation::Duplicate,
        });
    }

    if let Some(mut stored) = db.find_correlated(&incoming).await? {
        let previous = stored.severity;
        log::info!(
            "{} : Event and/or severity change {} {} -> {} update details",
            incoming.id,
            incoming.event,
            previous,
            incoming.severity
        );
        stored.apply_severity_change(&incoming);
        if let Some(new_status) = status::on_severity_change(stored.severity, previous) {
            stored.set_status(new_status, time::now());
            log::info!(
                "{} : Alert status for {} {} alert with diff event/severity changed to {}",
                incoming.id,
                stored.severity,
                stored.event,
                new_status
            );
        }
        db.put_alert(&stored).await?;
        return Ok(Processed {
            alert: stored,
            correlation: Correlation::SeverityChange,
        });
    }

    log::info!("{} : New alert -> insert", incoming.id);
    incoming.init_new();
    let initial = status::initial(incoming.severity);
    incoming.set_status(initial, time::now());
    db.put_alert(&incoming).await?;
    log::info!(
        "{} : Alert status for new {} {} alert set to {}",
        incoming.id,
        incoming.severity,
        incoming.event,
        initial
    );
    Ok(Processed {
        alert: incoming,
        correlation: Correlation::New,
    })
}

/// Resolve `timeout` and `expire_time`: an explicit 0 disables expiry, a
/// missing timeout gets the server default, and the expire time is always
/// `create_time + timeout`.
fn resolve_expiry(alert: &mut Alert) {
    let timeout = match alert.timeout {
        Some(0) => {
            alert.expire_time = None;
            return;
        }
        Some(timeout) if timeout > 0 => timeout,
        _ => {
            let timeout = get_config().common.default_timeout;
            alert.timeout = Some(timeout);
            timeout
        }
    };
    alert.expire_time = Some(alert.create_time + Duration::seconds(timeout));
}

#[cfg(test)]
mod tests {
    use config::meta::alerts::Severity;

    use super::*;

    fn alert_at(create: &str) -> Alert {
        Alert {
            create_time: time::parse_iso_milli(create).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_expiry_explicit_timeout() {
        let mut alert = alert_at("2024-01-01T00:00:00.000Z");
        alert.timeout = Some(600);
        resolve_expiry(&mut alert);
        assert_eq!(
            alert.expire_time,
            Some(alert.create_time + Duration::seconds(600))
        );
    }

    #[test]
    fn test_resolve_expiry_zero_disables() {
        let mut alert = alert_at("2024-01-01T00:00:00.000Z");
        alert.timeout = Some(0);
        resolve_expiry(&mut alert);
        assert_eq!(alert.expire_time, None);
    }

    #[test]
    fn test_resolve_expiry_default_applied() {
        let mut alert = alert_at("2024-01-01T00:00:00.000Z");
        resolve_expiry(&mut alert);
        assert_eq!(alert.timeout, Some(86_400));
        assert_eq!(
            alert.expire_time,
            Some(alert.create_time + Duration::seconds(86_400))
        );
    }

    #[test]
    fn test_resolve_expiry_negative_timeout_gets_default() {
        let mut alert = alert_at("2024-01-01T00:00:00.000Z");
        alert.timeout = Some(-5);
        resolve_expiry(&mut alert);
        assert_eq!(alert.timeout, Some(86_400));
        assert!(alert.expire_time.is_some());
    }

    #[test]
    fn test_duplicates_never_publish() {
        assert!(!Correlation::Duplicate.should_publish());
        assert!(Correlation::SeverityChange.should_publish());
        assert!(Correlation::New.should_publish());
    }

    #[test]
    fn test_severity_matters_for_classification() {
        let mut stored = Alert {
            environment: vec!["PROD".to_string()],
            resource: "host1".to_string(),
            event: "NodeDown".to_string(),
            severity: Severity::Major,
            ..Default::default()
        };
        let incoming = Alert {
            severity: Severity::Critical,
            ..stored.clone()
        };
        assert!(!stored.is_duplicate_of(&incoming));
        assert!(stored.correlates_with(&incoming));

        stored.severity = Severity::Critical;
        assert!(stored.is_duplicate_of(&incoming));
    }
}
