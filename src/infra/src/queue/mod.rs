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
use bytes::Bytes;
use config::get_config;
use hashbrown::HashMap;
use tokio::sync::{OnceCell, mpsc};

use crate::errors::Result;

pub mod memory;
pub mod nats;

pub type MessageHeaders = HashMap<String, String>;

/// One delivered broker message.
#[derive(Clone, Debug)]
pub struct Message {
    pub destination: String,
    pub headers: MessageHeaders,
    pub body: Bytes,
}

static DEFAULT: OnceCell<Box<dyn Queue>> = OnceCell::const_new();

pub async fn get_queue() -> &'static Box<dyn Queue> {
    DEFAULT.get_or_init(default).await
}

pub async fn init() -> Result<()> {
    match get_config().common.queue_store.as_str() {
        "memory" => Ok(()),
        _ => nats::init().await,
    }
}

async fn default() -> Box<dyn Queue> {
    match get_config().common.queue_store.as_str() {
        "memory" => Box::<memory::MemoryQueue>::default(),
        _ => Box::<nats::NatsQueue>::default(),
    }
}

/// Message broker client. `publish` commits to a durable queue, `broadcast`
/// is fire-and-forget fan-out; neither confirms subscriber delivery.
#[async_trait]
pub trait Queue: Sync + Send + 'static {
    /// Ensure the durable destination exists.
    async fn create(&self, dest: &str) -> Result<()>;
    async fn publish(&self, dest: &str, headers: &MessageHeaders, body: Bytes) -> Result<()>;
    async fn broadcast(&self, dest: &str, headers: &MessageHeaders, body: Bytes) -> Result<()>;
    /// Consume the durable destination with automatic acknowledgement.
    async fn consume(&self, dest: &str) -> Result<mpsc::Receiver<Message>>;
    fn is_connected(&self) -> bool;
    async fn close(&self) -> Result<()>;
}
