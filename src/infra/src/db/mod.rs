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

use async_trait::async_trait;
use config::{
    get_config,
    meta::{
        alerts::Alert,
        heartbeat::Heartbeat,
        stats::{ManagementStat, StatDef},
    },
};
use tokio::sync::OnceCell;

use crate::errors::Result;

pub mod memory;
pub mod sled;

static DEFAULT: OnceCell<Box<dyn Db>> = OnceCell::const_new();

pub async fn get_db() -> &'static Box<dyn Db> {
    DEFAULT.get_or_init(default).await
}

pub async fn init() -> Result<()> {
    get_db().await.create_table().await
}

async fn default() -> Box<dyn Db> {
    match get_config().common.meta_store.as_str() {
        "memory" => Box::<memory::MemoryDb>::default(),
        _ => Box::<sled::SledDb>::default(),
    }
}

/// Document store behind the alert pipeline: the `alerts`, `heartbeats` and
/// `status` collections.
///
/// Writes to a single document are atomic in every backend. Linearisation of
/// a classify-then-mutate sequence on one alert identity is the caller's job
/// (`local_lock` keyed on the alert's correlation key).
#[async_trait]
pub trait Db: Sync + Send + 'static {
    async fn create_table(&self) -> Result<()>;

    async fn get_alert(&self, id: &str) -> Result<Option<Alert>>;
    /// Insert or fully replace the document for `alert.id`.
    async fn put_alert(&self, alert: &Alert) -> Result<()>;
    /// Stored alert with the same environment, resource, event and severity.
    async fn find_duplicate(&self, incoming: &Alert) -> Result<Option<Alert>>;
    /// Stored alert with the same environment and resource whose event
    /// matches directly or through correlated events.
    async fn find_correlated(&self, incoming: &Alert) -> Result<Option<Alert>>;
    async fn list_alerts(&self) -> Result<Vec<Alert>>;

    async fn upsert_heartbeat(&self, hb: &Heartbeat) -> Result<()>;
    async fn list_heartbeats(&self) -> Result<Vec<Heartbeat>>;

    /// `count += 1, total_time += elapsed_ms` on the timer stat, creating it
    /// on first use.
    async fn incr_timer(&self, def: &StatDef, elapsed_ms: i64) -> Result<()>;
    /// Overwrite the gauge stat value, creating it on first use.
    async fn set_gauge(&self, def: &StatDef, value: i64) -> Result<()>;
    async fn list_stats(&self) -> Result<Vec<ManagementStat>>;

    async fn close(&self) -> Result<()>;
}

pub(crate) fn merge_timer(existing: Option<ManagementStat>, def: &StatDef, elapsed_ms: i64) -> ManagementStat {
    match existing {
        Some(ManagementStat::Timer {
            group,
            name,
            title,
            description,
            count,
            total_time,
        }) => ManagementStat::Timer {
            group,
            name,
            title,
            description,
            count: count + 1,
            total_time: total_time + elapsed_ms,
        },
        _ => ManagementStat::Timer {
            group: def.group.to_string(),
            name: def.name.to_string(),
            title: def.title.to_string(),
            description: def.description.to_string(),
            count: 1,
            total_time: elapsed_ms,
        },
    }
}

pub(crate) fn make_gauge(def: &StatDef, value: i64) -> ManagementStat {
    ManagementStat::Gauge {
        group: def.group.to_string(),
        name: def.name.to_string(),
        title: def.title.to_string(),
        description: def.description.to_string(),
        value,
    }
}
