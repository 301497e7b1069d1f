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

//! Downstream fan-out: every published alert goes to the notify topic
//! (fan-out, lossy) and the logger queue (durable, archived). A failed send
//! is logged and never rolls back the persistence already committed.

use bytes::Bytes;
use config::{get_config, meta::alerts::Alert, utils::json};
use infra::queue::{self, MessageHeaders, Queue};

/// Wire form of a processed alert: the persisted document without its
/// history trail.
pub fn encode(alert: &Alert) -> Result<Bytes, anyhow::Error> {
    let mut doc = alert.clone();
    doc.history.clear();
    Ok(Bytes::from(json::to_vec(&doc)?))
}

pub fn headers(alert: &Alert) -> MessageHeaders {
    let mut headers = MessageHeaders::new();
    headers.insert("type".to_string(), alert.alert_type.clone());
    headers.insert("correlation-id".to_string(), alert.id.clone());
    headers
}

/// Forward the processed alert to both downstream destinations.
pub async fn forward(alert: &Alert) {
    let body = match encode(alert) {
        Ok(body) => body,
        Err(e) => {
            log::error!("{} : Failed to encode alert: {}", alert.id, e);
            return;
        }
    };
    let headers = headers(alert);
    let cfg = get_config();
    let queue = queue::get_queue().await;

    log::info!("{} : Fwd alert to {}", alert.id, cfg.broker.notify_topic);
    wait_connected(queue.as_ref()).await;
    if let Err(e) = queue
        .broadcast(&cfg.broker.notify_topic, &headers, body.clone())
        .await
    {
        log::error!("Failed to send alert to broker {e}");
    }

    log::info!("{} : Fwd alert to {}", alert.id, cfg.broker.logger_queue);
    wait_connected(queue.as_ref()).await;
    if let Err(e) = queue
        .publish(&cfg.broker.logger_queue, &headers, body)
        .await
    {
        log::error!("Failed to send alert to broker {e}");
    }

    log::info!(
        "{} : Alert forwarded to {} and {}",
        alert.id,
        cfg.broker.notify_topic,
        cfg.broker.logger_queue
    );
}

async fn wait_connected(queue: &dyn Queue) {
    while !queue.is_connected() {
        log::warn!("Waiting for message broker to become available");
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }
}

#[cfg(test)]
mod tests {
    use config::meta::alerts::{HistoryEntry, Severity, Status};
    use config::utils::time;

    use super::*;

    #[test]
    fn test_encode_drops_history_and_keeps_canonical_fields() {
        let mut alert = Alert {
            id: "a1".to_string(),
            alert_type: "exceptionAlert".to_string(),
            environment: vec!["PROD".to_string()],
            resource: "host1".to_string(),
            event: "NodeDown".to_string(),
            severity: Severity::Major,
            severity_code: 2,
            receive_time: Some(time::now()),
            ..Default::default()
        };
        alert.init_new();
        alert.set_status(Status::Open, time::now());
        assert_eq!(alert.history.len(), 2);

        let body = encode(&alert).unwrap();
        let decoded: Alert = json::from_slice(&body).unwrap();
        assert!(decoded.history.is_empty());
        assert_eq!(decoded.id, alert.id);
        assert_eq!(decoded.severity, alert.severity);
        assert_eq!(decoded.status, Status::Open);
        assert_eq!(decoded.last_receive_id, "a1");

        // encoding does not mutate the persisted document
        assert!(matches!(alert.history[0], HistoryEntry::Event { .. }));
    }

    #[test]
    fn test_headers_carry_type_and_correlation_id() {
        let alert = Alert {
            id: "a1".to_string(),
            alert_type: "serviceAlert".to_string(),
            ..Default::default()
        };
        let headers = headers(&alert);
        assert_eq!(headers.get("type").map(String::as_str), Some("serviceAlert"));
        assert_eq!(headers.get("correlation-id").map(String::as_str), Some("a1"));
    }
}
