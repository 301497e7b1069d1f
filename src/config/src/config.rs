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

use std::sync::Arc;

use arc_swap::ArcSwap;
use dotenv_config::EnvConfig;
use dotenvy::dotenv_override;
use once_cell::sync::Lazy;

pub const DEFAULT_ALERT_TIMEOUT: i64 = 86_400; // expire OPEN alerts after 1 day

static CONFIG: Lazy<ArcSwap<Config>> = Lazy::new(|| ArcSwap::from(Arc::new(init())));

pub fn get_config() -> Arc<Config> {
    CONFIG.load().clone()
}

pub fn refresh_config() -> Result<(), anyhow::Error> {
    CONFIG.store(Arc::new(init()));
    Ok(())
}

/// Origin string the server reports under, e.g. `alerta/monitor01`.
pub fn instance_origin() -> String {
    let host = sysinfo::System::host_name().unwrap_or_else(|| "localhost".to_string());
    format!("{}/{}", get_config().common.app_name, host)
}

#[derive(EnvConfig)]
pub struct Config {
    pub common: Common,
    pub limit: Limit,
    pub broker: Broker,
    pub index: Index,
}

#[derive(EnvConfig)]
pub struct Common {
    #[env_config(name = "ALERTA_APP_NAME", default = "alerta")]
    pub app_name: String,
    #[env_config(name = "ALERTA_DATA_DIR", default = "./data/")]
    pub data_dir: String,
    #[env_config(name = "ALERTA_DATA_DB_DIR", default = "")] // default: {data_dir}db/
    pub data_db_dir: String,
    #[env_config(name = "ALERTA_META_STORE", default = "sled")]
    pub meta_store: String,
    #[env_config(name = "ALERTA_QUEUE_STORE", default = "nats")]
    pub queue_store: String,
    #[env_config(name = "ALERTA_RULES_FILE", default = "./conf/alerta.yaml")]
    pub rules_file: String,
    #[env_config(name = "ALERTA_PID_FILE", default = "./data/alerta.pid")]
    pub pid_file: String,
    #[env_config(name = "ALERTA_LOGGER_PID_FILE", default = "./data/alerta-logger.pid")]
    pub logger_pid_file: String,
    #[env_config(
        name = "ALERTA_DEFAULT_TIMEOUT",
        default = 86400,
        help = "Seconds before an alert without an explicit timeout expires"
    )]
    pub default_timeout: i64,
}

#[derive(EnvConfig)]
pub struct Limit {
    #[env_config(name = "ALERTA_SERVER_WORKERS", default = 4)]
    pub server_workers: usize,
}

#[derive(EnvConfig)]
pub struct Broker {
    #[env_config(
        name = "ALERTA_BROKER_ADDR",
        default = "nats://127.0.0.1:4222",
        help = "Comma-separated failover list of broker endpoints"
    )]
    pub addr: String,
    #[env_config(name = "ALERTA_BROKER_PREFIX", default = "alerta_")]
    pub prefix: String,
    #[env_config(name = "ALERTA_ALERT_QUEUE", default = "alerts")]
    pub alert_queue: String,
    #[env_config(name = "ALERTA_NOTIFY_TOPIC", default = "notify")]
    pub notify_topic: String,
    #[env_config(name = "ALERTA_LOGGER_QUEUE", default = "logger")]
    pub logger_queue: String,
    #[env_config(name = "ALERTA_BROKER_RECONNECT_INITIAL_SECS", default = 5)]
    pub reconnect_initial_secs: u64,
    #[env_config(name = "ALERTA_BROKER_RECONNECT_MAX_SECS", default = 120)]
    pub reconnect_max_secs: u64,
    #[env_config(name = "ALERTA_BROKER_RECONNECT_ATTEMPTS", default = 20)]
    pub reconnect_attempts: usize,
}

#[derive(EnvConfig)]
pub struct Index {
    #[env_config(name = "ALERTA_INDEX_BASE_URL", default = "http://127.0.0.1:9200/logstash")]
    pub base_url: String,
    #[env_config(name = "ALERTA_INDEX_TIMEOUT_SECS", default = 10)]
    pub timeout_secs: u64,
}

pub fn init() -> Config {
    dotenv_override().ok();
    let mut cfg = Config::init().unwrap();
    if cfg.limit.server_workers == 0 {
        cfg.limit.server_workers = 4;
    }
    if !cfg.common.data_dir.ends_with('/') {
        cfg.common.data_dir = format!("{}/", cfg.common.data_dir);
    }
    if cfg.common.data_db_dir.is_empty() {
        cfg.common.data_db_dir = format!("{}db/", cfg.common.data_dir);
    }
    cfg.common.default_timeout = cfg.common.default_timeout.max(0);
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = init();
        assert_eq!(cfg.limit.server_workers, 4);
        assert!(cfg.common.data_db_dir.starts_with(&cfg.common.data_dir));
        assert_eq!(cfg.common.default_timeout, DEFAULT_ALERT_TIMEOUT);
        assert_eq!(cfg.broker.alert_queue, "alerts");
        assert_eq!(cfg.broker.notify_topic, "notify");
        assert_eq!(cfg.broker.logger_queue, "logger");
    }
}
