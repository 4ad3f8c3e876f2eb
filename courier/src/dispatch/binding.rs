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
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::codec::{DecodedPayload, PayloadType};
use crate::common::{HandlerFuture, Invocation, Invoker};
use crate::message::Delivery;

/// How a handler is invoked and who acknowledges its messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMode {
    /// The handler receives the bare payload and the engine acknowledges.
    ///
    /// On success the engine acks when `auto_ack` is set and does nothing
    /// otherwise. On handler failure it always naks.
    Automatic {
        /// Ack on successful return.
        auto_ack: bool,
    },
    /// The handler receives a [`Delivery`] and acknowledges itself. The engine
    /// never acknowledges on its behalf.
    Explicit,
}

impl DeliveryMode {
    /// `true` for [`DeliveryMode::Explicit`].
    #[must_use]
    pub const fn is_explicit(self) -> bool {
        matches!(self, Self::Explicit)
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic { auto_ack: true } => write!(f, "automatic"),
            Self::Automatic { auto_ack: false } => write!(f, "automatic (no auto-ack)"),
            Self::Explicit => write!(f, "explicit"),
        }
    }
}

/// Options for an Automatic-mode subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Ack after the handler returns successfully. Defaults to `true`.
    pub auto_ack: bool,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self { auto_ack: true }
    }
}

/// A registered handler together with everything the engine needs to route
/// and decode messages for it. Immutable once built.
pub struct SubscriberBinding {
    subject: String,
    payload_type: PayloadType,
    mode: DeliveryMode,
    invoker: Invoker,
}

impl fmt::Debug for SubscriberBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberBinding")
            .field("subject", &self.subject)
            .field("payload_type", &self.payload_type.type_name())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl SubscriberBinding {
    /// An Automatic-mode binding for a serde payload type.
    pub fn automatic<T, F>(subject: impl Into<String>, options: SubscribeOptions, handler: F) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: Fn(T) -> HandlerFuture + Send + Sync + 'static,
    {
        Self::automatic_with_type(subject, PayloadType::of::<T>(), options, handler)
    }

    /// An Explicit-mode binding for a serde payload type.
    pub fn explicit<T, F>(subject: impl Into<String>, handler: F) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: Fn(Delivery<T>) -> HandlerFuture + Send + Sync + 'static,
    {
        Self::explicit_with_type(subject, PayloadType::of::<T>(), handler)
    }

    /// An Automatic-mode binding for a type without serde support.
    ///
    /// Only a custom codec can decode such a type; registering it while the
    /// default codec is active fails validation.
    pub fn automatic_opaque<T, F>(subject: impl Into<String>, options: SubscribeOptions, handler: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(T) -> HandlerFuture + Send + Sync + 'static,
    {
        Self::automatic_with_type(subject, PayloadType::opaque::<T>(), options, handler)
    }

    /// An Explicit-mode binding for a type without serde support.
    pub fn explicit_opaque<T, F>(subject: impl Into<String>, handler: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Delivery<T>) -> HandlerFuture + Send + Sync + 'static,
    {
        Self::explicit_with_type(subject, PayloadType::opaque::<T>(), handler)
    }

    fn automatic_with_type<T, F>(
        subject: impl Into<String>,
        payload_type: PayloadType,
        options: SubscribeOptions,
        handler: F,
    ) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(T) -> HandlerFuture + Send + Sync + 'static,
    {
        let invoker: Invoker = Arc::new(move |decoded: DecodedPayload, _invocation: Invocation| {
            decoded.downcast::<T>().ok().map(|value| handler(*value))
        });
        Self {
            subject: subject.into(),
            payload_type,
            mode: DeliveryMode::Automatic {
                auto_ack: options.auto_ack,
            },
            invoker,
        }
    }

    fn explicit_with_type<T, F>(subject: impl Into<String>, payload_type: PayloadType, handler: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Delivery<T>) -> HandlerFuture + Send + Sync + 'static,
    {
        let invoker: Invoker = Arc::new(move |decoded: DecodedPayload, invocation: Invocation| {
            decoded.downcast::<T>().ok().map(|value| {
                handler(Delivery::new(
                    *value,
                    invocation.envelope,
                    invocation.acknowledger,
                ))
            })
        });
        Self {
            subject: subject.into(),
            payload_type,
            mode: DeliveryMode::Explicit,
            invoker,
        }
    }

    /// The subject pattern this binding receives from.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The type token payloads are decoded into.
    #[must_use]
    pub const fn payload_type(&self) -> &PayloadType {
        &self.payload_type
    }

    /// The binding's delivery mode.
    #[must_use]
    pub const fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub(crate) fn invoke(&self, decoded: DecodedPayload, invocation: Invocation) -> Option<HandlerFuture> {
        (self.invoker)(decoded, invocation)
    }
}
