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

//! In-process broker used by tests and local mode. Durable destinations
//! buffer published messages until a consumer attaches; broadcast
//! destinations deliver to current subscribers only, matching topic
//! semantics where absent subscribers simply miss messages.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use tokio::sync::{Mutex, mpsc};

use crate::errors::{Error, Result};

#[derive(Default)]
struct Destination {
    buffer: VecDeque<super::Message>,
    consumer: Option<mpsc::Sender<super::Message>>,
    subscribers: Vec<mpsc::Sender<super::Message>>,
}

static DESTINATIONS: Lazy<Mutex<HashMap<String, Destination>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Default)]
pub struct MemoryQueue {}

impl MemoryQueue {
    pub fn new() -> Self {
        Self {}
    }

    /// Attach a broadcast subscriber, topic-style: only messages sent while
    /// attached are delivered.
    pub async fn subscribe(&self, dest: &str) -> mpsc::Receiver<super::Message> {
        let (tx, rx) = mpsc::channel(1024);
        let mut destinations = DESTINATIONS.lock().await;
        destinations
            .entry(dest.to_string())
            .or_default()
            .subscribers
            .push(tx);
        rx
    }
}

#[async_trait]
impl super::Queue for MemoryQueue {
    async fn create(&self, dest: &str) -> Result<()> {
        let mut destinations = DESTINATIONS.lock().await;
        destinations.entry(dest.to_string()).or_default();
        Ok(())
    }

    async fn publish(&self, dest: &str, headers: &super::MessageHeaders, body: Bytes) -> Result<()> {
        let message = super::Message {
            destination: dest.to_string(),
            headers: headers.clone(),
            body,
        };
        let mut destinations = DESTINATIONS.lock().await;
        let destination = destinations.entry(dest.to_string()).or_default();
        match &destination.consumer {
            Some(tx) => {
                if let Err(e) = tx.try_send(message) {
                    return Err(Error::Message(format!("memory queue send error: {e}")));
                }
            }
            None => destination.buffer.push_back(message),
        }
        Ok(())
    }

    async fn broadcast(&self, dest: &str, headers: &super::MessageHeaders, body: Bytes) -> Result<()> {
        let message = super::Message {
            destination: dest.to_string(),
            headers: headers.clone(),
            body,
        };
        let mut destinations = DESTINATIONS.lock().await;
        let destination = destinations.entry(dest.to_string()).or_default();
        destination
            .subscribers
            .retain(|tx| tx.try_send(message.clone()).is_ok());
        Ok(())
    }

    async fn consume(&self, dest: &str) -> Result<mpsc::Receiver<super::Message>> {
        let (tx, rx) = mpsc::channel(1024);
        let mut destinations = DESTINATIONS.lock().await;
        let destination = destinations.entry(dest.to_string()).or_default();
        while let Some(message) = destination.buffer.pop_front() {
            if let Err(e) = tx.try_send(message) {
                return Err(Error::Message(format!("memory queue send error: {e}")));
            }
        }
        destination.consumer = Some(tx);
        Ok(rx)
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Queue;

    #[tokio::test]
    async fn test_publish_buffers_until_consumed() {
        let queue = MemoryQueue::new();
        let headers = super::super::MessageHeaders::new();
        queue
            .publish("test_buffered", &headers, Bytes::from_static(b"one"))
            .await
            .unwrap();

        let mut rx = queue.consume("test_buffered").await.unwrap();
        let got = rx.recv().await.unwrap();
        assert_eq!(got.body, Bytes::from_static(b"one"));

        queue
            .publish("test_buffered", &headers, Bytes::from_static(b"two"))
            .await
            .unwrap();
        let got = rx.recv().await.unwrap();
        assert_eq!(got.body, Bytes::from_static(b"two"));
    }

    #[tokio::test]
    async fn test_broadcast_misses_absent_subscribers() {
        let queue = MemoryQueue::new();
        let headers = super::super::MessageHeaders::new();

        // nobody listening: the message is lost, not an error
        queue
            .broadcast("test_topic", &headers, Bytes::from_static(b"lost"))
            .await
            .unwrap();

        let mut rx = queue.subscribe("test_topic").await;
        queue
            .broadcast("test_topic", &headers, Bytes::from_static(b"seen"))
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().body, Bytes::from_static(b"seen"));
        assert!(rx.try_recv().is_err());
    }
}
