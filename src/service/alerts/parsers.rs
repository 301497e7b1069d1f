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

//! Compiled-in registry of named alert parsers. A transform rule names one
//! of these; it runs against the alert before the rule's field mutators.

use config::meta::alerts::Alert;
use hashbrown::HashMap;
use once_cell::sync::Lazy;

pub type ParserFn = fn(&mut Alert);

static PARSERS: Lazy<HashMap<&'static str, ParserFn>> = Lazy::new(|| {
    let mut parsers: HashMap<&'static str, ParserFn> = HashMap::new();
    parsers.insert("hostname", hostname);
    parsers.insert("snmptrap", snmptrap);
    parsers
});

pub fn get(name: &str) -> Option<ParserFn> {
    PARSERS.get(name).copied()
}

/// Strip the domain part from a fully-qualified resource name.
fn hostname(alert: &mut Alert) {
    if let Some(host) = alert.resource.split('.').next() {
        alert.resource = host.to_string();
    }
}

/// SNMP trap senders put the OID in the event and the bound value in the
/// text; lift the variable binding into `value` when it is still empty.
fn snmptrap(alert: &mut Alert) {
    if alert.value.is_empty()
        && let Some((_, bound)) = alert.text.split_once('=')
    {
        alert.value = bound.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_parser_strips_domain() {
        let parser = get("hostname").unwrap();
        let mut alert = Alert {
            resource: "web01.example.com".to_string(),
            ..Default::default()
        };
        parser(&mut alert);
        assert_eq!(alert.resource, "web01");
    }

    #[test]
    fn test_snmptrap_parser_extracts_value() {
        let parser = get("snmptrap").unwrap();
        let mut alert = Alert {
            text: "ifOperStatus = down".to_string(),
            ..Default::default()
        };
        parser(&mut alert);
        assert_eq!(alert.value, "down");
    }

    #[test]
    fn test_unknown_parser_is_none() {
        assert!(get("does-not-exist").is_none());
    }
}
