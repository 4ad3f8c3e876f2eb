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

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use mti::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, instrument, trace};

use crate::common::codec::{CodecSlot, PayloadType, SerializationFailure};
use crate::message::{EventEnvelope, Headers, OutboundMessage};
use crate::traits::{Transport, TransportError};

/// Errors returned by [`Publisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The codec could not encode the value. Never retried.
    Serialization(SerializationFailure),
    /// The transport refused the message.
    Transport(TransportError),
    /// The subject is empty or contains a wildcard.
    InvalidSubject(String),
    /// The runtime has been shut down.
    ShutDown,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialization(e) => write!(f, "Failed to serialize payload: {e}"),
            Self::Transport(e) => write!(f, "Failed to publish: {e}"),
            Self::InvalidSubject(subject) => write!(f, "Cannot publish to subject '{subject}'"),
            Self::ShutDown => write!(f, "The runtime has been shut down"),
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialization(e) => Some(e),
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SerializationFailure> for PublishError {
    fn from(err: SerializationFailure) -> Self {
        Self::Serialization(err)
    }
}

impl From<TransportError> for PublishError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// Envelope attributes supplied by the caller of a publish.
///
/// Only the event type is required. `source` falls back to the configured
/// default, `id` to a generated `evt_` identifier and `time` to now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventAttributes {
    event_type: String,
    source: Option<String>,
    id: Option<String>,
    time: Option<String>,
    extensions: Headers,
}

impl EventAttributes {
    /// Attributes for an event of type `event_type`.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Self::default()
        }
    }

    /// Sets `ce-source`.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets `ce-id` instead of generating one.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets `ce-time` (RFC 3339) instead of using the current time.
    #[must_use]
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Adds a header carried alongside the envelope attributes.
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extensions.insert(name.into(), value.into());
        self
    }
}

/// Encodes typed values, wraps them in an event envelope and hands them to
/// the transport.
#[derive(Clone)]
pub struct Publisher {
    codec: Arc<CodecSlot>,
    transport: Arc<dyn Transport>,
    default_source: String,
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("transport", &self.transport)
            .field("default_source", &self.default_source)
            .finish_non_exhaustive()
    }
}

impl Publisher {
    pub(crate) fn new(
        codec: Arc<CodecSlot>,
        transport: Arc<dyn Transport>,
        default_source: impl Into<String>,
    ) -> Self {
        Self {
            codec,
            transport,
            default_source: default_source.into(),
        }
    }

    /// Publishes `value` on `subject` and returns the event's `ce-id`.
    ///
    /// # Errors
    ///
    /// See [`PublishError`].
    pub async fn publish<T>(
        &self,
        subject: &str,
        value: &T,
        attributes: EventAttributes,
    ) -> Result<String, PublishError>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.publish_typed(subject, value, &PayloadType::of::<T>(), attributes)
            .await
    }

    /// Publishes a value described by an explicit type token, for types
    /// only a custom codec understands.
    ///
    /// # Errors
    ///
    /// See [`PublishError`].
    #[instrument(skip(self, value, payload_type, attributes), fields(type_name = payload_type.type_name()))]
    pub async fn publish_typed<T>(
        &self,
        subject: &str,
        value: &T,
        payload_type: &PayloadType,
        attributes: EventAttributes,
    ) -> Result<String, PublishError>
    where
        T: Any + Send + Sync,
    {
        if subject.is_empty() || subject.split('.').any(|t| t.is_empty() || t == "*" || t == ">") {
            return Err(PublishError::InvalidSubject(subject.to_string()));
        }
        let codec = self.codec.current().ok_or(PublishError::ShutDown)?;

        let data = codec.encode(value, payload_type).map_err(|e| {
            error!(subject, "Failed to encode payload: {}", e);
            PublishError::Serialization(e)
        })?;

        let EventAttributes {
            event_type,
            source,
            id,
            time,
            extensions,
        } = attributes;
        let id = id.unwrap_or_else(|| "evt".create_type_id::<V7>().to_string());
        let time = time.unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        let source = source.unwrap_or_else(|| self.default_source.clone());

        let envelope = extensions.into_iter().fold(
            EventEnvelope::new(event_type, source, id.clone(), data)
                .with_time(time)
                .with_datacontenttype(codec.content_type()),
            |envelope, (name, value)| envelope.with_extension(name, value),
        );
        drop(codec);

        let (headers, body) = envelope.wrap();
        self.transport
            .publish(OutboundMessage::new(subject, headers, body))
            .await?;
        trace!(subject, id = id.as_str(), "Published event");
        Ok(id)
    }
}
