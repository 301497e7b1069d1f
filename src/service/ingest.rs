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

//! Ingress dispatcher. Runs in the broker consumer context: decode, stamp
//! the receive time, divert heartbeats, hand alerts to the worker queue.
//! An undecodable body is logged and dropped, never redelivered.

use chrono::{DateTime, Utc};
use config::{
    meta::{alerts::Alert, heartbeat::Heartbeat},
    metrics,
    utils::{json, time},
};
use infra::db::{self, Db};
use serde::Deserialize;

use crate::job;

#[derive(Deserialize)]
struct HeartbeatMessage {
    #[serde(default)]
    id: String,
    origin: String,
    #[serde(default)]
    version: String,
    #[serde(rename = "createTime", with = "time::iso_milli")]
    create_time: DateTime<Utc>,
}

pub async fn dispatch(body: &[u8]) {
    let value: json::Value = match json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            log::error!("Could not decode JSON - {e}");
            metrics::ALERTS_DROPPED.inc();
            return;
        }
    };
    let receive_time = time::now();

    if value.get("type").and_then(json::Value::as_str) == Some("heartbeat") {
        handle_heartbeat(value, receive_time).await;
        return;
    }

    let mut alert: Alert = match json::from_value(value) {
        Ok(alert) => alert,
        Err(e) => {
            log::error!("Could not decode JSON - {e}");
            metrics::ALERTS_DROPPED.inc();
            return;
        }
    };
    alert.receive_time = Some(receive_time);
    alert.normalise();
    metrics::ALERTS_RECEIVED.inc();
    job::enqueue(alert);
}

async fn handle_heartbeat(value: json::Value, receive_time: DateTime<Utc>) {
    let message: HeartbeatMessage = match json::from_value(value) {
        Ok(message) => message,
        Err(e) => {
            log::error!("Could not decode JSON - {e}");
            metrics::ALERTS_DROPPED.inc();
            return;
        }
    };
    let hb = Heartbeat {
        origin: message.origin.clone(),
        version: message.version,
        create_time: message.create_time,
        receive_time,
    };
    if let Err(e) = db::get_db().await.upsert_heartbeat(&hb).await {
        log::error!("{} : heartbeat upsert failed: {}", message.id, e);
        return;
    }
    metrics::HEARTBEATS_RECEIVED.inc();
    log::info!("{} : heartbeat from {}", message.id, message.origin);
}
