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

use std::fmt;

use crate::common::codec::DeserializationFailure;
use crate::dispatch::DeliveryMode;
use crate::message::EnvelopeError;

/// Why a message did not complete normally.
///
/// None of these escape the engine as an `Err`; each is resolved locally and
/// reported on the [`DispatchOutcome`](crate::dispatch::DispatchOutcome).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A required envelope attribute is missing or invalid.
    Envelope(EnvelopeError),
    /// The payload could not be decoded into the binding's type.
    Deserialization(DeserializationFailure),
    /// The handler returned an error or panicked.
    Handler {
        /// The binding's delivery mode.
        mode: DeliveryMode,
        /// The handler's error message.
        message: String,
    },
    /// The message arrived after the runtime shut down.
    PostShutdown,
    /// No binding matches the message's subject.
    NoBinding(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Envelope(e) => write!(f, "Invalid envelope: {e}"),
            Self::Deserialization(e) => write!(f, "Payload deserialization failed: {e}"),
            Self::Handler { mode, message } => write!(f, "Handler failed ({mode} mode): {message}"),
            Self::PostShutdown => write!(f, "Message received after shutdown"),
            Self::NoBinding(subject) => write!(f, "No subscriber registered for subject '{subject}'"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Envelope(e) => Some(e),
            Self::Deserialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EnvelopeError> for DispatchError {
    fn from(err: EnvelopeError) -> Self {
        Self::Envelope(err)
    }
}

impl From<DeserializationFailure> for DispatchError {
    fn from(err: DeserializationFailure) -> Self {
        Self::Deserialization(err)
    }
}
