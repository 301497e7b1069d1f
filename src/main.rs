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

use alerta::{job, service::ingest};
use anyhow::Context;
use config::get_config;
use infra::{
    db::Db,
    pidfile::PidFile,
    queue::{self, Queue},
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    log::info!("Starting up Alerta version {}", config::VERSION);

    let cfg = get_config();
    let _pid_lock = PidFile::acquire(&cfg.common.pid_file)
        .context("another alerta instance is already running")?;

    config::metrics::init();
    infra::init().await.context("infra init failed")?;

    let worker_handles = job::run();

    let queue = queue::get_queue().await;
    let mut inbound = queue.consume(&cfg.broker.alert_queue).await?;

    loop {
        tokio::select! {
            message = inbound.recv() => {
                match message {
                    Some(message) => ingest::dispatch(&message.body).await,
                    None => {
                        log::warn!("[SERVER] inbound consumer closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("[SERVER] shutdown signal received");
                break;
            }
        }
    }

    job::shutdown(worker_handles).await;
    infra::db::get_db().await.close().await?;
    queue.close().await?;
    log::info!("[SERVER] shutdown complete");
    Ok(())
}
