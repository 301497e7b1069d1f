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

//! Worker pool. The dispatcher enqueues onto an unbounded in-process FIFO;
//! N workers drain it, each finishing one alert before pulling the next.
//! Shutdown posts one sentinel per worker and joins them, so in-flight work
//! drains while queued backlog may be abandoned.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use config::{get_config, meta::alerts::Alert, metrics};
use once_cell::sync::Lazy;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};

use crate::service;

pub enum QueueItem {
    Alert(Box<Alert>),
    Shutdown,
}

struct AlertQueue {
    sender: mpsc::UnboundedSender<QueueItem>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<QueueItem>>>,
    len: AtomicI64,
}

static ALERT_QUEUE: Lazy<AlertQueue> = Lazy::new(|| {
    let (tx, rx) = mpsc::unbounded_channel();
    AlertQueue {
        sender: tx,
        receiver: Arc::new(Mutex::new(rx)),
        len: AtomicI64::new(0),
    }
});

/// Hand an alert to the workers. Never blocks; under backlog the queue
/// simply grows and the length gauge shows it.
pub fn enqueue(alert: Alert) {
    if ALERT_QUEUE
        .sender
        .send(QueueItem::Alert(Box::new(alert)))
        .is_err()
    {
        log::error!("[JOB] alert queue is closed, dropping alert");
        return;
    }
    let len = ALERT_QUEUE.len.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::QUEUE_LENGTH.set(len);
}

pub fn queue_len() -> i64 {
    ALERT_QUEUE.len.load(Ordering::Relaxed)
}

/// Spawn the worker pool.
pub fn run() -> Vec<JoinHandle<()>> {
    let workers = get_config().limit.server_workers;
    (0..workers)
        .map(|id| {
            let rx = ALERT_QUEUE.receiver.clone();
            tokio::spawn(async move {
                loop {
                    let item = rx.lock().await.recv().await;
                    match item {
                        None => {
                            log::debug!("[JOB] worker-{id} receiving channel is closed");
                            break;
                        }
                        Some(QueueItem::Shutdown) => {
                            log::info!("[JOB] worker-{id} is shutting down");
                            break;
                        }
                        Some(QueueItem::Alert(alert)) => {
                            let len = ALERT_QUEUE.len.fetch_sub(1, Ordering::Relaxed) - 1;
                            metrics::QUEUE_LENGTH.set(len);
                            if let Err(e) = service::alerts::process(*alert, len).await {
                                log::error!("[JOB] worker-{id} alert processing error: {e}");
                            }
                        }
                    }
                }
            })
        })
        .collect()
}

/// Post one sentinel per worker and wait for all of them to drain.
pub async fn shutdown(handles: Vec<JoinHandle<()>>) {
    for _ in 0..handles.len() {
        let _ = ALERT_QUEUE.sender.send(QueueItem::Shutdown);
    }
    for handle in handles {
        let _ = handle.await;
    }
}
