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

use serde::{Deserialize, Serialize};

/// Static descriptor of a management statistic: everything but the measured
/// numbers.
#[derive(Clone, Copy, Debug)]
pub struct StatDef {
    pub group: &'static str,
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

impl StatDef {
    pub fn key(&self, kind: &str) -> String {
        format!("{}/{}/{}", self.group, self.name, kind)
    }
}

/// Management statistic persisted in the `status` collection, keyed by
/// `(group, name, type)`. Timers accumulate a count and total elapsed time,
/// gauges hold the latest value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ManagementStat {
    #[serde(rename_all = "camelCase")]
    Timer {
        group: String,
        name: String,
        title: String,
        description: String,
        count: i64,
        total_time: i64,
    },
    #[serde(rename_all = "camelCase")]
    Gauge {
        group: String,
        name: String,
        title: String,
        description: String,
        value: i64,
    },
}

impl ManagementStat {
    pub fn group(&self) -> &str {
        match self {
            ManagementStat::Timer { group, .. } | ManagementStat::Gauge { group, .. } => group,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ManagementStat::Timer { name, .. } | ManagementStat::Gauge { name, .. } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ManagementStat::Timer { .. } => "timer",
            ManagementStat::Gauge { .. } => "gauge",
        }
    }

    /// Collection key: `(group, name, type)`.
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.group(), self.name(), self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::json;

    #[test]
    fn test_timer_wire_shape() {
        let stat = ManagementStat::Timer {
            group: "alerts".to_string(),
            name: "processed".to_string(),
            title: "Alert process rate and duration".to_string(),
            description: "Time taken to process the alert".to_string(),
            count: 3,
            total_time: 42,
        };
        let encoded = json::to_value(&stat).unwrap();
        assert_eq!(encoded["type"], "timer");
        assert_eq!(encoded["totalTime"], 42);
        assert_eq!(stat.key(), "alerts/processed/timer");
    }

    #[test]
    fn test_gauge_wire_shape() {
        let stat = ManagementStat::Gauge {
            group: "alerts".to_string(),
            name: "queue".to_string(),
            title: "Alert internal queue length".to_string(),
            description: "Length of internal alert queue".to_string(),
            value: 7,
        };
        let encoded = json::to_value(&stat).unwrap();
        assert_eq!(encoded["type"], "gauge");
        assert_eq!(encoded["value"], 7);
        assert_eq!(stat.key(), "alerts/queue/gauge");
    }
}
