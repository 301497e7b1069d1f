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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{json, time};

/// Alert severity, ordered per ITU RFC 5674 / syslog RFC 5424.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Warning,
    Normal,
    Inform,
    Debug,
    #[default]
    Unknown,
}

impl Severity {
    /// Numeric code for the severity. `severity_code` on the document is
    /// always derived from this, never trusted from the wire.
    pub fn code(&self) -> u8 {
        match self {
            Severity::Critical => 1,
            Severity::Major => 2,
            Severity::Minor => 3,
            Severity::Warning => 4,
            Severity::Normal => 5,
            Severity::Inform => 6,
            Severity::Debug => 7,
            Severity::Unknown => 9,
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Status {
    Open,
    Ack,
    Closed,
    Expired,
    #[default]
    Unknown,
}

/// Append-only audit trail entry. Event records capture each distinct
/// observation folded into the alert; status records capture every status
/// transition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum HistoryEntry {
    #[serde(rename_all = "camelCase")]
    Event {
        #[serde(with = "time::iso_milli")]
        create_time: DateTime<Utc>,
        #[serde(with = "time::iso_milli")]
        receive_time: DateTime<Utc>,
        severity: Severity,
        severity_code: u8,
        event: String,
        value: String,
        text: String,
        id: String,
    },
    #[serde(rename_all = "camelCase")]
    Status {
        status: Status,
        #[serde(with = "time::iso_milli")]
        update_time: DateTime<Utc>,
    },
}

/// Canonical alert document. The same shape travels on the wire (inbound
/// messages simply leave the server-maintained fields at their defaults) and
/// is persisted in the `alerts` collection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type", default)]
    pub alert_type: String,
    pub environment: Vec<String>,
    pub resource: String,
    pub event: String,
    pub severity: Severity,
    #[serde(default)]
    pub severity_code: u8,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub service: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub correlated_events: Vec<String>,
    #[serde(default)]
    pub threshold_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphs: Option<json::Value>,
    /// Seconds until expiry. 0 disables expiry, absent applies the server
    /// default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(with = "time::iso_milli", default = "time::now")]
    pub create_time: DateTime<Utc>,
    #[serde(default, with = "time::iso_milli_opt", skip_serializing_if = "Option::is_none")]
    pub receive_time: Option<DateTime<Utc>>,
    #[serde(default, with = "time::iso_milli_opt", skip_serializing_if = "Option::is_none")]
    pub last_receive_time: Option<DateTime<Utc>>,
    #[serde(default, with = "time::iso_milli_opt", skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub previous_severity: Severity,
    #[serde(default)]
    pub duplicate_count: u64,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_receive_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
}

impl Default for Alert {
    fn default() -> Self {
        Self {
            id: String::new(),
            alert_type: String::new(),
            environment: Vec::new(),
            resource: String::new(),
            event: String::new(),
            severity: Severity::Unknown,
            severity_code: 0,
            group: String::new(),
            value: String::new(),
            text: String::new(),
            summary: String::new(),
            origin: String::new(),
            service: Vec::new(),
            tags: Vec::new(),
            correlated_events: Vec::new(),
            threshold_info: String::new(),
            more_info: None,
            graphs: None,
            timeout: None,
            create_time: time::now(),
            receive_time: None,
            last_receive_time: None,
            expire_time: None,
            status: Status::Unknown,
            previous_severity: Severity::Unknown,
            duplicate_count: 0,
            repeat: false,
            last_receive_id: String::new(),
            history: Vec::new(),
        }
    }
}

impl Alert {
    /// Re-derive the fields the server owns on an inbound message.
    pub fn normalise(&mut self) {
        self.severity_code = self.severity.code();
    }

    /// Two alerts observe the same condition when their event names are
    /// equal or either one lists the other's event as correlated.
    pub fn matches_event(&self, other: &Alert) -> bool {
        self.event == other.event
            || self.correlated_events.iter().any(|e| e == &other.event)
            || other.correlated_events.iter().any(|e| e == &self.event)
    }

    /// Exact duplicate: same environment, resource, event and severity.
    pub fn is_duplicate_of(&self, incoming: &Alert) -> bool {
        self.environment == incoming.environment
            && self.resource == incoming.resource
            && self.event == incoming.event
            && self.severity == incoming.severity
    }

    /// Same alert identity, any severity: environment and resource match and
    /// the event names match directly or through `correlated_events`.
    pub fn correlates_with(&self, incoming: &Alert) -> bool {
        self.environment == incoming.environment
            && self.resource == incoming.resource
            && self.matches_event(incoming)
    }

    /// Lane key for serialising concurrent mutations of the same alert
    /// identity. Both the duplicate and the severity-change queries key on
    /// environment + resource, so that pair is the correlation lane.
    pub fn correlation_key(&self) -> String {
        format!("{}/{}", self.environment.join(","), self.resource)
    }

    fn event_history_entry(&self) -> HistoryEntry {
        HistoryEntry::Event {
            create_time: self.create_time,
            receive_time: self.receive_time.unwrap_or(self.create_time),
            severity: self.severity,
            severity_code: self.severity_code,
            event: self.event.clone(),
            value: self.value.clone(),
            text: self.text.clone(),
            id: self.last_receive_id.clone(),
        }
    }

    /// First observation of this identity: stamp the server-owned fields and
    /// open the history trail. Status is elected separately.
    pub fn init_new(&mut self) {
        self.normalise();
        self.last_receive_id = self.id.clone();
        self.last_receive_time = self.receive_time;
        self.previous_severity = Severity::Unknown;
        self.repeat = false;
        self.duplicate_count = 0;
        let entry = self.event_history_entry();
        self.history.push(entry);
    }

    /// Fold a same-severity repeat into this document.
    pub fn absorb_duplicate(&mut self, incoming: &Alert) {
        self.last_receive_time = incoming.receive_time;
        self.expire_time = incoming.expire_time;
        self.last_receive_id = incoming.id.clone();
        self.text = incoming.text.clone();
        self.summary = incoming.summary.clone();
        self.value = incoming.value.clone();
        self.tags = incoming.tags.clone();
        self.origin = incoming.origin.clone();
        self.repeat = true;
        self.duplicate_count += 1;
    }

    /// Fold a severity (or correlated-event) change into this document. The
    /// incoming event name wins and an event-history entry is appended.
    pub fn apply_severity_change(&mut self, incoming: &Alert) {
        self.previous_severity = self.severity;
        self.event = incoming.event.clone();
        self.severity = incoming.severity;
        self.severity_code = incoming.severity.code();
        self.create_time = incoming.create_time;
        self.receive_time = incoming.receive_time;
        self.last_receive_time = incoming.receive_time;
        self.expire_time = incoming.expire_time;
        self.last_receive_id = incoming.id.clone();
        self.text = incoming.text.clone();
        self.summary = incoming.summary.clone();
        self.value = incoming.value.clone();
        self.tags = incoming.tags.clone();
        self.origin = incoming.origin.clone();
        self.threshold_info = incoming.threshold_info.clone();
        self.repeat = false;
        self.duplicate_count = 0;
        let entry = self.event_history_entry();
        self.history.push(entry);
    }

    /// Elect a status and record the transition.
    pub fn set_status(&mut self, status: Status, update_time: DateTime<Utc>) {
        self.status = status;
        self.history.push(HistoryEntry::Status {
            status,
            update_time,
        });
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample_alert() -> Alert {
        Alert {
            id: "a1".to_string(),
            alert_type: "exceptionAlert".to_string(),
            environment: vec!["PROD".to_string()],
            resource: "host1".to_string(),
            event: "NodeDown".to_string(),
            severity: Severity::Major,
            severity_code: 2,
            summary: "host1 is down".to_string(),
            origin: "pinger/monitor01".to_string(),
            create_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            receive_time: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_severity_codes() {
        assert_eq!(Severity::Critical.code(), 1);
        assert_eq!(Severity::Major.code(), 2);
        assert_eq!(Severity::Minor.code(), 3);
        assert_eq!(Severity::Warning.code(), 4);
        assert_eq!(Severity::Normal.code(), 5);
        assert_eq!(Severity::Inform.code(), 6);
        assert_eq!(Severity::Debug.code(), 7);
    }

    #[test]
    fn test_severity_wire_names_are_uppercase() {
        assert_eq!(json::to_string(&Severity::Critical).unwrap(), r#""CRITICAL""#);
        let s: Severity = json::from_str(r#""NORMAL""#).unwrap();
        assert_eq!(s, Severity::Normal);
    }

    #[test]
    fn test_matches_event_correlation_both_directions() {
        let mut stored = sample_alert();
        stored.event = "PingFail".to_string();
        stored.correlated_events = vec!["PingTimeout".to_string()];

        let mut incoming = sample_alert();
        incoming.event = "PingTimeout".to_string();
        assert!(stored.correlates_with(&incoming));

        // reverse direction: incoming declares the stored event as correlated
        stored.correlated_events.clear();
        incoming.correlated_events = vec!["PingFail".to_string()];
        assert!(stored.correlates_with(&incoming));

        incoming.correlated_events.clear();
        assert!(!stored.correlates_with(&incoming));
    }

    #[test]
    fn test_absorb_duplicate_increments_and_repeats() {
        let mut stored = sample_alert();
        stored.init_new();
        let mut incoming = sample_alert();
        incoming.id = "a2".to_string();
        incoming.summary = "still down".to_string();

        stored.absorb_duplicate(&incoming);
        assert_eq!(stored.duplicate_count, 1);
        assert!(stored.repeat);
        assert_eq!(stored.last_receive_id, "a2");
        assert_eq!(stored.summary, "still down");
        // history untouched by the duplicate path itself
        assert_eq!(stored.history.len(), 1);
    }

    #[test]
    fn test_apply_severity_change_tracks_previous_severity() {
        let mut stored = sample_alert();
        stored.init_new();
        let mut incoming = sample_alert();
        incoming.id = "a3".to_string();
        incoming.severity = Severity::Critical;

        stored.apply_severity_change(&incoming);
        assert_eq!(stored.severity, Severity::Critical);
        assert_eq!(stored.severity_code, 1);
        assert_eq!(stored.previous_severity, Severity::Major);
        assert_eq!(stored.duplicate_count, 0);
        assert!(!stored.repeat);
        assert_eq!(stored.history.len(), 2);
    }

    #[test]
    fn test_inbound_message_decodes_with_defaults() {
        let body = r#"{
            "id": "a1",
            "type": "exceptionAlert",
            "environment": ["PROD"],
            "resource": "host1",
            "event": "NodeDown",
            "severity": "MAJOR",
            "severityCode": 2,
            "group": "Network",
            "value": "DOWN",
            "text": "ping failed",
            "summary": "host1 is down",
            "origin": "pinger/monitor01",
            "service": ["Core"],
            "tags": ["dc:1"],
            "thresholdInfo": "5 pings > 1s",
            "createTime": "2024-01-01T00:00:00.000Z",
            "timeout": 600
        }"#;
        let alert: Alert = json::from_str(body).unwrap();
        assert_eq!(alert.status, Status::Unknown);
        assert_eq!(alert.previous_severity, Severity::Unknown);
        assert_eq!(alert.duplicate_count, 0);
        assert!(alert.history.is_empty());
        assert_eq!(alert.timeout, Some(600));
    }

    #[test]
    fn test_history_entry_shapes_round_trip() {
        let mut alert = sample_alert();
        alert.init_new();
        alert.set_status(Status::Open, time::now());

        let encoded = json::to_string(&alert.history).unwrap();
        let decoded: Vec<HistoryEntry> = json::from_str(&encoded).unwrap();
        assert_eq!(decoded, alert.history);
        assert!(matches!(decoded[0], HistoryEntry::Event { .. }));
        assert!(matches!(decoded[1], HistoryEntry::Status { .. }));
    }
}
