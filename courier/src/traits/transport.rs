/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt::{self, Debug};
use std::time::Duration;

use async_trait::async_trait;

use crate::message::{InboundMessage, OutboundMessage};

/// Errors reported by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport has been closed and accepts no further work.
    Closed,
    /// The transport refused the request.
    Rejected(String),
    /// Connection or I/O failure.
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Transport closed"),
            Self::Rejected(reason) => write!(f, "Transport rejected request: {reason}"),
            Self::Io(e) => write!(f, "Transport I/O error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// The pub/sub client the dispatch engine talks to.
///
/// Connection management, reconnection and consumer provisioning belong to
/// the implementation. The engine only receives messages and passes
/// acknowledgment decisions back.
///
/// Every method may be called concurrently from many workers, and the
/// acknowledgment methods may be called more than once for the same message;
/// implementations must tolerate repeated calls without failing.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    /// Waits for the next message. `Ok(None)` means the transport is closed and
    /// no more messages will arrive.
    async fn receive(&self) -> Result<Option<InboundMessage>, TransportError>;

    /// Acknowledges successful processing.
    async fn ack(&self, message: &InboundMessage) -> Result<(), TransportError>;

    /// Requests redelivery. `None` defers the delay to the transport's policy.
    async fn nak(
        &self,
        message: &InboundMessage,
        delay: Option<Duration>,
    ) -> Result<(), TransportError>;

    /// Stops redelivery of the message.
    async fn term(&self, message: &InboundMessage) -> Result<(), TransportError>;

    /// Publishes a wrapped message.
    async fn publish(&self, message: OutboundMessage) -> Result<(), TransportError>;
}
