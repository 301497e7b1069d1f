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

//! Transform and blackout rules. The rule file is a YAML list evaluated in
//! order; the first rule whose `match` map is a subset of the alert's fields
//! is applied and evaluation stops. Parsed rules are cached and re-read when
//! the file's modification time changes, so edits become effective on the
//! next processed message.

use std::{sync::Arc, time::SystemTime};

use config::{
    get_config,
    meta::alerts::{Alert, Severity},
    utils::json,
};
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use serde::Deserialize;

use super::parsers;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Field name to required literal value; all entries must match.
    #[serde(rename = "match")]
    pub matches: HashMap<String, json::Value>,
    /// Named parser to run before the field mutators.
    #[serde(default)]
    pub parser: Option<String>,
    #[serde(default)]
    pub suppress: bool,
    // field mutators
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, rename = "correlatedEvents")]
    pub correlated_events: Option<Vec<String>>,
    #[serde(default, rename = "thresholdInfo")]
    pub threshold_info: Option<String>,
}

struct CachedRules {
    mtime: Option<SystemTime>,
    rules: Arc<Vec<Rule>>,
}

static RULES: Lazy<std::sync::RwLock<CachedRules>> = Lazy::new(|| {
    std::sync::RwLock::new(CachedRules {
        mtime: None,
        rules: Arc::new(Vec::new()),
    })
});

/// Current rule set. A missing or unparsable file logs a warning and yields
/// an empty set; it never fails the alert being processed.
pub fn load() -> Arc<Vec<Rule>> {
    let path = get_config().common.rules_file.clone();
    let mtime = std::fs::metadata(&path)
        .and_then(|meta| meta.modified())
        .ok();

    {
        let cached = RULES.read().unwrap();
        if cached.mtime.is_some() && cached.mtime == mtime {
            return cached.rules.clone();
        }
    }

    let rules = match read_rules(&path) {
        Ok(rules) => {
            log::info!("[TRANSFORM] loaded {} alert transforms and blackout rules", rules.len());
            rules
        }
        Err(e) => {
            log::warn!("[TRANSFORM] failed to load alert transforms and blackout rules: {e}");
            Vec::new()
        }
    };
    let rules = Arc::new(rules);
    let mut cached = RULES.write().unwrap();
    cached.mtime = mtime;
    cached.rules = rules.clone();
    rules
}

fn read_rules(path: &str) -> Result<Vec<Rule>, anyhow::Error> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Apply the first matching rule. Returns true when the alert is suppressed
/// by a blackout rule.
pub fn apply(alert: &mut Alert) -> bool {
    let rules = load();
    apply_rules(alert, &rules)
}

fn apply_rules(alert: &mut Alert, rules: &[Rule]) -> bool {
    let Some(rule) = rules.iter().find(|rule| matches(alert, rule)) else {
        return false;
    };

    if let Some(name) = &rule.parser {
        match parsers::get(name) {
            Some(parser) => parser(alert),
            None => log::warn!("[TRANSFORM] parser {name} is not registered"),
        }
    }

    if let Some(event) = &rule.event {
        alert.event = event.clone();
    }
    if let Some(resource) = &rule.resource {
        alert.resource = resource.clone();
    }
    if let Some(severity) = rule.severity {
        alert.severity = severity;
    }
    if let Some(group) = &rule.group {
        alert.group = group.clone();
    }
    if let Some(value) = &rule.value {
        alert.value = value.clone();
    }
    if let Some(text) = &rule.text {
        alert.text = text.clone();
    }
    if let Some(environment) = &rule.environment {
        alert.environment = vec![environment.clone()];
    }
    if let Some(service) = &rule.service {
        alert.service = vec![service.clone()];
    }
    if let Some(tags) = &rule.tags {
        alert.tags = tags.clone();
    }
    if let Some(correlated) = &rule.correlated_events {
        alert.correlated_events = correlated.clone();
    }
    if let Some(threshold) = &rule.threshold_info {
        alert.threshold_info = threshold.clone();
    }
    alert.normalise();

    rule.suppress
}

fn matches(alert: &Alert, rule: &Rule) -> bool {
    let Ok(fields) = json::to_value(alert) else {
        return false;
    };
    rule.matches
        .iter()
        .all(|(field, required)| fields.get(field) == Some(required))
}

#[cfg(test)]
mod tests {
    use config::meta::alerts::Status;

    use super::*;

    fn sample_alert() -> Alert {
        Alert {
            id: "a1".to_string(),
            environment: vec!["PROD".to_string()],
            resource: "web01.example.com".to_string(),
            event: "NodeDown".to_string(),
            severity: Severity::Major,
            severity_code: 2,
            origin: "pinger/monitor01".to_string(),
            ..Default::default()
        }
    }

    fn parse(yaml: &str) -> Vec<Rule> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = parse(
            r#"
- match: { origin: "pinger/monitor01" }
  group: "Network"
- match: { origin: "pinger/monitor01" }
  group: "Ignored"
"#,
        );
        let mut alert = sample_alert();
        assert!(!apply_rules(&mut alert, &rules));
        assert_eq!(alert.group, "Network");
    }

    #[test]
    fn test_match_is_exact_on_list_fields() {
        let rules = parse(
            r#"
- match: { environment: ["PROD"] }
  tags: ["prod"]
"#,
        );
        let mut alert = sample_alert();
        assert!(!apply_rules(&mut alert, &rules));
        assert_eq!(alert.tags, vec!["prod".to_string()]);

        let mut alert = sample_alert();
        alert.environment = vec!["PROD".to_string(), "DR".to_string()];
        apply_rules(&mut alert, &rules);
        assert!(alert.tags.is_empty());
    }

    #[test]
    fn test_suppress_short_circuits() {
        let rules = parse(
            r#"
- match: { origin: "noisy" }
  suppress: true
"#,
        );
        let mut alert = sample_alert();
        alert.origin = "noisy".to_string();
        assert!(apply_rules(&mut alert, &rules));
    }

    #[test]
    fn test_severity_mutator_rederives_code() {
        let rules = parse(
            r#"
- match: { event: "NodeDown" }
  severity: WARNING
"#,
        );
        let mut alert = sample_alert();
        apply_rules(&mut alert, &rules);
        assert_eq!(alert.severity, Severity::Warning);
        assert_eq!(alert.severity_code, 4);
        assert_eq!(alert.status, Status::Unknown);
    }

    #[test]
    fn test_environment_mutator_wraps_into_list() {
        let rules = parse(
            r#"
- match: { event: "NodeDown" }
  environment: "INFRA"
  service: "Network"
"#,
        );
        let mut alert = sample_alert();
        apply_rules(&mut alert, &rules);
        assert_eq!(alert.environment, vec!["INFRA".to_string()]);
        assert_eq!(alert.service, vec!["Network".to_string()]);
    }

    #[test]
    fn test_parser_runs_before_mutators() {
        let rules = parse(
            r#"
- match: { event: "NodeDown" }
  parser: hostname
  group: "Network"
"#,
        );
        let mut alert = sample_alert();
        apply_rules(&mut alert, &rules);
        assert_eq!(alert.resource, "web01");
        assert_eq!(alert.group, "Network");
    }

    #[test]
    fn test_no_rule_matches_leaves_alert_untouched() {
        let rules = parse(
            r#"
- match: { origin: "somewhere-else" }
  suppress: true
"#,
        );
        let mut alert = sample_alert();
        let before = alert.clone();
        assert!(!apply_rules(&mut alert, &rules));
        assert_eq!(alert, before);
    }
}
