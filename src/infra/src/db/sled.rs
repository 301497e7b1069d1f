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
    utils::json,
};

use crate::errors::Result;

const TREE_ALERTS: &str = "alerts";
const TREE_HEARTBEATS: &str = "heartbeats";
const TREE_STATUS: &str = "status";

/// Embedded document store. Documents are JSON values in one tree per
/// collection; `alerts` is keyed by document id, `heartbeats` by origin and
/// `status` by `(group, name, type)`.
pub struct SledDb {
    db: ::sled::Db,
}

impl SledDb {
    pub fn new(path: &str) -> Result<SledDb> {
        let db = ::sled::open(path)?;
        Ok(SledDb { db })
    }

    fn tree(&self, name: &str) -> Result<::sled::Tree> {
        Ok(self.db.open_tree(name)?)
    }

    fn scan_alerts<F>(&self, mut pred: F) -> Result<Option<Alert>>
    where
        F: FnMut(&Alert) -> bool,
    {
        for item in self.tree(TREE_ALERTS)?.iter() {
            let (_k, v) = item?;
            let alert: Alert = json::from_slice(&v)?;
            if pred(&alert) {
                return Ok(Some(alert));
            }
        }
        Ok(None)
    }
}

impl Default for SledDb {
    fn default() -> Self {
        // store unreachable at boot is fatal
        Self::new(&get_config().common.data_db_dir).expect("sled db open failed")
    }
}

#[async_trait]
impl super::Db for SledDb {
    async fn create_table(&self) -> Result<()> {
        for name in [TREE_ALERTS, TREE_HEARTBEATS, TREE_STATUS] {
            self.tree(name)?;
        }
        Ok(())
    }

    async fn get_alert(&self, id: &str) -> Result<Option<Alert>> {
        match self.tree(TREE_ALERTS)?.get(id)? {
            Some(v) => Ok(Some(json::from_slice(&v)?)),
            None => Ok(None),
        }
    }

    async fn put_alert(&self, alert: &Alert) -> Result<()> {
        self.tree(TREE_ALERTS)?
            .insert(alert.id.as_str(), json::to_vec(alert)?)?;
        Ok(())
    }

    async fn find_duplicate(&self, incoming: &Alert) -> Result<Option<Alert>> {
        self.scan_alerts(|stored| stored.is_duplicate_of(incoming))
    }

    async fn find_correlated(&self, incoming: &Alert) -> Result<Option<Alert>> {
        self.scan_alerts(|stored| stored.correlates_with(incoming))
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>> {
        let mut alerts = Vec::new();
        for item in self.tree(TREE_ALERTS)?.iter() {
            let (_k, v) = item?;
            alerts.push(json::from_slice(&v)?);
        }
        Ok(alerts)
    }

    async fn upsert_heartbeat(&self, hb: &Heartbeat) -> Result<()> {
        self.tree(TREE_HEARTBEATS)?
            .insert(hb.origin.as_str(), json::to_vec(hb)?)?;
        Ok(())
    }

    async fn list_heartbeats(&self) -> Result<Vec<Heartbeat>> {
        let mut heartbeats = Vec::new();
        for item in self.tree(TREE_HEARTBEATS)?.iter() {
            let (_k, v) = item?;
            heartbeats.push(json::from_slice(&v)?);
        }
        Ok(heartbeats)
    }

    async fn incr_timer(&self, def: &StatDef, elapsed_ms: i64) -> Result<()> {
        let tree = self.tree(TREE_STATUS)?;
        let key = def.key("timer");
        let existing = match tree.get(&key)? {
            Some(v) => Some(json::from_slice(&v)?),
            None => None,
        };
        let merged = super::merge_timer(existing, def, elapsed_ms);
        tree.insert(key.as_str(), json::to_vec(&merged)?)?;
        Ok(())
    }

    async fn set_gauge(&self, def: &StatDef, value: i64) -> Result<()> {
        let key = def.key("gauge");
        self.tree(TREE_STATUS)?
            .insert(key.as_str(), json::to_vec(&super::make_gauge(def, value))?)?;
        Ok(())
    }

    async fn list_stats(&self) -> Result<Vec<ManagementStat>> {
        let mut stats = Vec::new();
        for item in self.tree(TREE_STATUS)?.iter() {
            let (_k, v) = item?;
            stats.push(json::from_slice(&v)?);
        }
        Ok(stats)
    }

    async fn close(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use config::meta::alerts::Severity;

    use super::*;
    use crate::db::Db;

    fn open_temp() -> (tempfile::TempDir, SledDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = SledDb::new(dir.path().to_str().unwrap()).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn test_alert_round_trip() {
        let (_dir, db) = open_temp();
        let alert = Alert {
            id: "a1".to_string(),
            environment: vec!["PROD".to_string()],
            resource: "host1".to_string(),
            event: "NodeDown".to_string(),
            severity: Severity::Major,
            severity_code: 2,
            ..Default::default()
        };
        db.put_alert(&alert).await.unwrap();

        let loaded = db.get_alert("a1").await.unwrap().unwrap();
        assert_eq!(loaded, alert);
        assert!(db.find_duplicate(&alert).await.unwrap().is_some());
        assert_eq!(db.list_alerts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_upsert_is_keyed_by_origin() {
        let (_dir, db) = open_temp();
        let mut hb = Heartbeat {
            origin: "pinger/mon01".to_string(),
            version: "1.0".to_string(),
            create_time: config::utils::time::now(),
            receive_time: config::utils::time::now(),
        };
        db.upsert_heartbeat(&hb).await.unwrap();
        hb.version = "1.1".to_string();
        db.upsert_heartbeat(&hb).await.unwrap();

        let all = db.list_heartbeats().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].version, "1.1");
    }
}
