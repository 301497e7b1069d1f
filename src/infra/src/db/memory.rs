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
use config::meta::{
    alerts::Alert,
    heartbeat::Heartbeat,
    stats::{ManagementStat, StatDef},
};
use hashbrown::HashMap;
use tokio::sync::RwLock;

use crate::errors::Result;

/// Volatile backend for tests and throwaway local runs.
#[derive(Default)]
pub struct MemoryDb {
    alerts: RwLock<HashMap<String, Alert>>,
    heartbeats: RwLock<HashMap<String, Heartbeat>>,
    stats: RwLock<HashMap<String, ManagementStat>>,
}

#[async_trait]
impl super::Db for MemoryDb {
    async fn create_table(&self) -> Result<()> {
        Ok(())
    }

    async fn get_alert(&self, id: &str) -> Result<Option<Alert>> {
        Ok(self.alerts.read().await.get(id).cloned())
    }

    async fn put_alert(&self, alert: &Alert) -> Result<()> {
        self.alerts
            .write()
            .await
            .insert(alert.id.clone(), alert.clone());
        Ok(())
    }

    async fn find_duplicate(&self, incoming: &Alert) -> Result<Option<Alert>> {
        Ok(self
            .alerts
            .read()
            .await
            .values()
            .find(|stored| stored.is_duplicate_of(incoming))
            .cloned())
    }

    async fn find_correlated(&self, incoming: &Alert) -> Result<Option<Alert>> {
        Ok(self
            .alerts
            .read()
            .await
            .values()
            .find(|stored| stored.correlates_with(incoming))
            .cloned())
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>> {
        Ok(self.alerts.read().await.values().cloned().collect())
    }

    async fn upsert_heartbeat(&self, hb: &Heartbeat) -> Result<()> {
        self.heartbeats
            .write()
            .await
            .insert(hb.origin.clone(), hb.clone());
        Ok(())
    }

    async fn list_heartbeats(&self) -> Result<Vec<Heartbeat>> {
        Ok(self.heartbeats.read().await.values().cloned().collect())
    }

    async fn incr_timer(&self, def: &StatDef, elapsed_ms: i64) -> Result<()> {
        let mut stats = self.stats.write().await;
        let key = def.key("timer");
        let merged = super::merge_timer(stats.remove(&key), def, elapsed_ms);
        stats.insert(key, merged);
        Ok(())
    }

    async fn set_gauge(&self, def: &StatDef, value: i64) -> Result<()> {
        let mut stats = self.stats.write().await;
        stats.insert(def.key("gauge"), super::make_gauge(def, value));
        Ok(())
    }

    async fn list_stats(&self) -> Result<Vec<ManagementStat>> {
        Ok(self.stats.read().await.values().cloned().collect())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use config::meta::alerts::Severity;

    use super::*;
    use crate::db::Db;

    fn alert(id: &str, event: &str, severity: Severity) -> Alert {
        Alert {
            id: id.to_string(),
            environment: vec!["PROD".to_string()],
            resource: "host1".to_string(),
            event: event.to_string(),
            severity,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_find_duplicate_requires_same_severity() {
        let db = MemoryDb::default();
        db.put_alert(&alert("a1", "NodeDown", Severity::Major))
            .await
            .unwrap();

        let same = alert("a2", "NodeDown", Severity::Major);
        assert!(db.find_duplicate(&same).await.unwrap().is_some());

        let hotter = alert("a3", "NodeDown", Severity::Critical);
        assert!(db.find_duplicate(&hotter).await.unwrap().is_none());
        assert!(db.find_correlated(&hotter).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_timer_accumulates_and_gauge_overwrites() {
        let db = MemoryDb::default();
        let timer = StatDef {
            group: "alerts",
            name: "processed",
            title: "t",
            description: "d",
        };
        db.incr_timer(&timer, 10).await.unwrap();
        db.incr_timer(&timer, 5).await.unwrap();

        let gauge = StatDef {
            group: "alerts",
            name: "queue",
            title: "t",
            description: "d",
        };
        db.set_gauge(&gauge, 3).await.unwrap();
        db.set_gauge(&gauge, 1).await.unwrap();

        let stats = db.list_stats().await.unwrap();
        assert_eq!(stats.len(), 2);
        for stat in stats {
            match stat {
                ManagementStat::Timer {
                    count, total_time, ..
                } => {
                    assert_eq!(count, 2);
                    assert_eq!(total_time, 15);
                }
                ManagementStat::Gauge { value, .. } => assert_eq!(value, 1),
            }
        }
    }
}
