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

//! Archival indexer. Consumes the durable logger queue and posts every
//! alert to the full-text search backend in the logstash record layout the
//! search frontends expect. An indexing failure is logged and the message
//! is not retried; the broker acknowledgement already happened.

use config::{get_config, utils::json};
use infra::queue::{self, Queue};

/// Build the search-index record for one alert document.
pub fn index_record(alert: json::Value) -> json::Value {
    // the search frontend chokes on null tags, hence the literal "none"
    let tags = match alert.get("tags") {
        Some(json::Value::Array(tags)) if !tags.is_empty() => json::Value::Array(tags.clone()),
        _ => json::Value::String("none".to_string()),
    };
    json::json!({
        "@message":     alert.get("summary").cloned().unwrap_or_default(),
        "@source":      alert.get("resource").cloned().unwrap_or_default(),
        "@source_host": "not_used",
        "@source_path": alert.get("origin").cloned().unwrap_or_default(),
        "@tags":        tags,
        "@timestamp":   alert.get("lastReceiveTime").cloned().unwrap_or_default(),
        "@type":        alert.get("type").cloned().unwrap_or_default(),
        "@fields":      alert,
    })
}

/// Consume the logger queue until the process is stopped.
pub async fn run() -> Result<(), anyhow::Error> {
    let cfg = get_config();
    let queue = queue::get_queue().await;
    queue.create(&cfg.broker.logger_queue).await?;
    let mut rx = queue.consume(&cfg.broker.logger_queue).await?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(cfg.index.timeout_secs))
        .build()?;

    while let Some(message) = rx.recv().await {
        if let Err(e) = index_message(&client, &message.body).await {
            log::error!("Alert indexing failed - {e}");
        }
    }
    Ok(())
}

async fn index_message(client: &reqwest::Client, body: &[u8]) -> Result<(), anyhow::Error> {
    let alert: json::Value = json::from_slice(body)?;
    let id = alert
        .get("lastReceiveId")
        .and_then(json::Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    log::info!(
        "{} : [{}] {}",
        id,
        alert.get("status").and_then(json::Value::as_str).unwrap_or("UNKNOWN"),
        alert.get("summary").and_then(json::Value::as_str).unwrap_or(""),
    );

    let cfg = get_config();
    let alert_type = alert
        .get("type")
        .and_then(json::Value::as_str)
        .unwrap_or("alert")
        .to_string();
    let record = index_record(alert);
    let url = format!("{}/{}", cfg.index.base_url, alert_type);

    let response = client.post(&url).json(&record).send().await?;
    let body: json::Value = response.error_for_status()?.json().await?;
    let doc_id = body.get("_id").and_then(json::Value::as_str).unwrap_or("");
    log::info!("{} : Alert indexed at {}/{}", id, url, doc_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_record_layout() {
        let alert = json::json!({
            "id": "a1",
            "type": "exceptionAlert",
            "summary": "host1 is down",
            "resource": "host1",
            "origin": "pinger/monitor01",
            "tags": ["dc:1"],
            "lastReceiveTime": "2024-01-01T00:00:00.000Z",
            "severity": "MAJOR"
        });
        let record = index_record(alert.clone());
        assert_eq!(record["@message"], "host1 is down");
        assert_eq!(record["@source"], "host1");
        assert_eq!(record["@source_host"], "not_used");
        assert_eq!(record["@source_path"], "pinger/monitor01");
        assert_eq!(record["@tags"], json::json!(["dc:1"]));
        assert_eq!(record["@timestamp"], "2024-01-01T00:00:00.000Z");
        assert_eq!(record["@type"], "exceptionAlert");
        assert_eq!(record["@fields"], alert);
    }

    #[test]
    fn test_empty_tags_become_the_literal_none() {
        let record = index_record(json::json!({ "tags": [] }));
        assert_eq!(record["@tags"], "none");

        let record = index_record(json::json!({}));
        assert_eq!(record["@tags"], "none");
    }
}
