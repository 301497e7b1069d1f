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

//! Management statistics persisted in the `status` collection, plus the
//! server self-heartbeat. None of these failures propagate: a stats write
//! error must never fail the alert that triggered it.

use std::time::Instant;

use config::{
    instance_origin,
    meta::{alerts::Alert, heartbeat::Heartbeat, stats::StatDef},
    metrics,
    utils::time,
};
use infra::db::{self, Db};

pub const PROCESSED_TIMER: StatDef = StatDef {
    group: "alerts",
    name: "processed",
    title: "Alert process rate and duration",
    description: "Time taken to process the alert",
};

pub const RECEIVED_TIMER: StatDef = StatDef {
    group: "alerts",
    name: "received",
    title: "Alert receive rate and latency",
    description: "Time taken for alert to be received by the server",
};

pub const QUEUE_GAUGE: StatDef = StatDef {
    group: "alerts",
    name: "queue",
    title: "Alert internal queue length",
    description: "Length of internal alert queue",
};

/// Record the three per-alert stats and the self-heartbeat.
pub async fn record(alert: &Alert, work_start: Instant, queue_len: i64) {
    let db = db::get_db().await;

    let proc_latency = work_start.elapsed().as_millis() as i64;
    if let Err(e) = db.incr_timer(&PROCESSED_TIMER, proc_latency).await {
        log::error!("[STATS] processed timer update failed: {e}");
    }

    // receive latency is receive - create at the source; clock skew can make
    // it negative and it is recorded as observed
    let recv_latency = match alert.receive_time {
        Some(receive_time) => (receive_time - alert.create_time).num_milliseconds(),
        None => 0,
    };
    if let Err(e) = db.incr_timer(&RECEIVED_TIMER, recv_latency).await {
        log::error!("[STATS] received timer update failed: {e}");
    }

    if let Err(e) = db.set_gauge(&QUEUE_GAUGE, queue_len).await {
        log::error!("[STATS] queue gauge update failed: {e}");
    }

    metrics::ALERTS_PROCESSED.inc();
    metrics::ALERT_PROCESS_TIME.observe(proc_latency as f64 / 1000.0);

    self_heartbeat().await;

    log::info!(
        "{} : Alert receive latency = {} ms, process latency = {} ms, queue length = {}",
        alert.id,
        recv_latency,
        proc_latency,
        queue_len
    );
}

pub async fn self_heartbeat() {
    let now = time::now();
    let hb = Heartbeat {
        origin: instance_origin(),
        version: config::VERSION.to_string(),
        create_time: now,
        receive_time: now,
    };
    if let Err(e) = db::get_db().await.upsert_heartbeat(&hb).await {
        log::error!("[STATS] self heartbeat update failed: {e}");
    }
}
