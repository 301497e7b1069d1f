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

use std::time::Duration;

use async_nats::{connection::State, jetstream};
use async_trait::async_trait;
use bytes::Bytes;
use config::get_config;
use futures::TryStreamExt;
use tokio::{
    sync::{OnceCell, mpsc},
    task::JoinHandle,
};

use crate::errors::*;
use crate::queue::Queue;

static NATS_CLIENT: OnceCell<async_nats::Client> = OnceCell::const_new();

pub async fn init() -> Result<()> {
    let queue = NatsQueue::default();
    let cfg = get_config();
    queue.create(&cfg.broker.alert_queue).await?;
    queue.create(&cfg.broker.logger_queue).await?;
    Ok(())
}

/// Connect once and share the client process-wide. The client keeps
/// reconnecting on its own with exponential backoff between the configured
/// initial delay and cap, for at most the configured number of attempts.
pub async fn get_nats_client() -> &'static async_nats::Client {
    NATS_CLIENT
        .get_or_init(|| async {
            let cfg = get_config();
            loop {
                match connect().await {
                    Ok(client) => return client,
                    Err(e) => {
                        log::error!("[QUEUE:NATS] connect to {} failed: {}", cfg.broker.addr, e);
                        tokio::time::sleep(Duration::from_secs(cfg.broker.reconnect_initial_secs))
                            .await;
                    }
                }
            }
        })
        .await
}

async fn connect() -> Result<async_nats::Client> {
    let cfg = get_config();
    let initial = cfg.broker.reconnect_initial_secs;
    let cap = cfg.broker.reconnect_max_secs;
    let opts = async_nats::ConnectOptions::new()
        .max_reconnects(Some(cfg.broker.reconnect_attempts))
        .reconnect_delay_callback(move |attempts| {
            let secs = initial.saturating_mul(1u64 << attempts.min(16) as u32);
            Duration::from_secs(secs.min(cap))
        });
    Ok(async_nats::connect_with_options(cfg.broker.addr.clone(), opts).await?)
}

fn to_header_map(headers: &super::MessageHeaders) -> async_nats::HeaderMap {
    let mut map = async_nats::HeaderMap::new();
    for (k, v) in headers.iter() {
        map.insert(k.as_str(), v.as_str());
    }
    map
}

fn from_header_map(headers: Option<&async_nats::HeaderMap>) -> super::MessageHeaders {
    let mut map = super::MessageHeaders::new();
    if let Some(headers) = headers {
        for (k, values) in headers.iter() {
            if let Some(v) = values.first() {
                map.insert(k.to_string(), v.to_string());
            }
        }
    }
    map
}

pub struct NatsQueue {
    prefix: String,
}

impl NatsQueue {
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches(|v| v == '/');
        Self {
            prefix: prefix.to_string(),
        }
    }
}

impl Default for NatsQueue {
    fn default() -> Self {
        Self::new(&get_config().broker.prefix)
    }
}

#[async_trait]
impl super::Queue for NatsQueue {
    async fn create(&self, dest: &str) -> Result<()> {
        let client = get_nats_client().await.clone();
        let jetstream = jetstream::new(client);
        let stream_name = format!("{}{}", self.prefix, dest);
        let config = jetstream::stream::Config {
            name: stream_name.to_string(),
            subjects: vec![stream_name.to_string()],
            retention: jetstream::stream::RetentionPolicy::Limits,
            ..Default::default()
        };
        _ = jetstream.get_or_create_stream(config).await?;
        Ok(())
    }

    async fn publish(&self, dest: &str, headers: &super::MessageHeaders, body: Bytes) -> Result<()> {
        let client = get_nats_client().await.clone();
        let jetstream = jetstream::new(client);
        let subject = format!("{}{}", self.prefix, dest);
        let ack = jetstream
            .publish_with_headers(subject, to_header_map(headers), body)
            .await?;
        ack.await?;
        Ok(())
    }

    async fn broadcast(&self, dest: &str, headers: &super::MessageHeaders, body: Bytes) -> Result<()> {
        let client = get_nats_client().await.clone();
        let subject = format!("{}{}", self.prefix, dest);
        client
            .publish_with_headers(subject, to_header_map(headers), body)
            .await?;
        Ok(())
    }

    async fn consume(&self, dest: &str) -> Result<mpsc::Receiver<super::Message>> {
        let (tx, rx) = mpsc::channel(1024);
        let stream_name = format!("{}{}", self.prefix, dest);
        let dest = dest.to_string();
        let _task: JoinHandle<Result<()>> = tokio::task::spawn(async move {
            let cfg = get_config();
            let consumer_name = cfg.common.app_name.clone();
            loop {
                let client = get_nats_client().await.clone();
                let jetstream = jetstream::new(client);
                let config = jetstream::stream::Config {
                    name: stream_name.to_string(),
                    subjects: vec![stream_name.to_string()],
                    retention: jetstream::stream::RetentionPolicy::Limits,
                    ..Default::default()
                };
                let stream = match jetstream.get_or_create_stream(config).await {
                    Ok(stream) => stream,
                    Err(e) => {
                        log::error!("[QUEUE:NATS] get stream {stream_name} error: {e}");
                        tokio::time::sleep(Duration::from_secs(cfg.broker.reconnect_initial_secs))
                            .await;
                        continue;
                    }
                };
                let config = jetstream::consumer::pull::Config {
                    name: Some(consumer_name.to_string()),
                    durable_name: Some(consumer_name.to_string()),
                    ..Default::default()
                };
                let consumer = match stream.get_or_create_consumer(&consumer_name, config).await {
                    Ok(consumer) => consumer,
                    Err(e) => {
                        log::error!("[QUEUE:NATS] get consumer {consumer_name} error: {e}");
                        tokio::time::sleep(Duration::from_secs(cfg.broker.reconnect_initial_secs))
                            .await;
                        continue;
                    }
                };
                let mut messages = match consumer.messages().await {
                    Ok(messages) => messages,
                    Err(e) => {
                        log::error!("[QUEUE:NATS] consumer stream error: {e}");
                        continue;
                    }
                };
                while let Ok(Some(message)) = messages.try_next().await {
                    // auto acknowledgement mode
                    if let Err(e) = message.ack().await {
                        log::warn!("[QUEUE:NATS] ack error: {e}");
                    }
                    let message = super::Message {
                        destination: dest.clone(),
                        headers: from_header_map(message.headers.as_ref()),
                        body: message.payload.clone(),
                    };
                    if tx.send(message).await.is_err() {
                        return Ok(());
                    }
                }
                log::warn!("[QUEUE:NATS] consumer for {stream_name} interrupted, resubscribing");
            }
        });
        Ok(rx)
    }

    fn is_connected(&self) -> bool {
        match NATS_CLIENT.get() {
            Some(client) => client.connection_state() == State::Connected,
            None => false,
        }
    }

    async fn close(&self) -> Result<()> {
        if let Some(client) = NATS_CLIENT.get() {
            let _ = client.flush().await;
        }
        Ok(())
    }
}
