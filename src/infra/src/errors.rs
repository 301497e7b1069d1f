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

use async_nats::{error::Error as NatsError, jetstream};
use config::utils::json;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("IoError# {0}")]
    IoError(#[from] std::io::Error),
    #[error("SerdeJsonError# {0}")]
    SerdeJsonError(#[from] json::Error),
    #[error("SledError# {0}")]
    SledError(#[from] ::sled::Error),
    #[error("Error# {0}")]
    NatsConnectError(#[from] async_nats::ConnectError),
    #[error("Error# {0}")]
    NatsPublishError(#[from] async_nats::PublishError),
    #[error("Error# {0}")]
    NatsJetstreamCreateStreamError(#[from] NatsError<jetstream::context::CreateStreamErrorKind>),
    #[error("Error# {0}")]
    NatsJetstreamPublishError(#[from] NatsError<jetstream::context::PublishErrorKind>),
    #[error("ProcessLockHeld# live process {0} holds the lock file")]
    ProcessLockHeld(u32),
    #[error("Error# {0}")]
    Message(String),
}
