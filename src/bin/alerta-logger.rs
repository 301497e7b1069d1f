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

use alerta::service::logger;
use anyhow::Context;
use config::get_config;
use infra::{pidfile::PidFile, queue};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    log::info!("Starting up Alert Logger version {}", config::VERSION);

    let cfg = get_config();
    let _pid_lock = PidFile::acquire(&cfg.common.logger_pid_file)
        .context("another alert logger instance is already running")?;

    queue::init().await.context("broker init failed")?;

    tokio::select! {
        ret = logger::run() => ret?,
        _ = tokio::signal::ctrl_c() => {
            log::info!("[LOGGER] shutdown signal received");
        }
    }
    Ok(())
}
