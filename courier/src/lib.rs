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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Courier
//!
//! Typed publish/subscribe messaging over a pluggable transport. Payloads
//! travel in a binary-mode event envelope: the attributes ride in `ce-*`
//! headers and the body is the encoded payload.
//!
//! ## Key Concepts
//!
//! - **Envelope (`EventEnvelope`)**: `ce-specversion`, `ce-type`, `ce-source`
//!   and `ce-id` are required; messages missing any of them are naked before
//!   decoding.
//! - **Codec (`PayloadCodec`)**: one per runtime, JSON by default. Payload
//!   types are checked against the default codec when they are subscribed.
//! - **Bindings**: `subscribe` registers an Automatic-mode handler that takes
//!   the payload and lets the engine acknowledge; `subscribe_explicit`
//!   registers one that takes a `Delivery<T>` and acknowledges itself.
//! - **Dispatch (`DispatchEngine`)**: runs each message through envelope
//!   check, decode, handler and acknowledgment. Failures end in a logged nak,
//!   never in a dropped message.
//! - **Runtime (`CourierRuntime`)**: owns bindings and codec, runs worker
//!   tasks against a `Transport`, and tears down on shutdown.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use courier::prelude::*;
//!
//! #[courier_payload]
//! struct OrderData {
//!     order_id: String,
//! }
//!
//! let runtime = CourierApp::launch();
//! runtime.subscribe::<OrderData, _>("orders.created", |order| {
//!     Box::pin(async move {
//!         tracing::info!(order_id = %order.order_id, "Order received");
//!         Ok(())
//!     })
//! })?;
//!
//! let transport = Arc::new(MemoryTransport::new());
//! runtime.run(transport.clone()).await;
//! runtime
//!     .publisher(transport)
//!     .publish("orders.created", &OrderData { order_id: "o-1".into() }, EventAttributes::new("order.created"))
//!     .await?;
//! ```

extern crate self as courier;

/// Runtime assembly, configuration, publishing and codecs.
pub mod common;

/// Bindings, the binding registry and the dispatch engine.
pub mod dispatch;

/// Message types and acknowledgment control.
pub mod message;

/// The traits applications implement to plug into the runtime.
pub mod traits;

/// Bundled transports.
pub mod transport;

#[doc(hidden)]
pub mod __private {
    pub use serde;
}

/// A prelude module for conveniently importing the most commonly used items.
///
/// # Re-exports
///
/// ## Macros (from `courier-macro`)
/// *   [`courier_macro::courier_payload`]: Attribute macro for defining payload types.
///
/// ## External Crates
/// *   [`async_trait::async_trait`]: For implementing [`Transport`](crate::traits::Transport).
///
/// ## Core Types
/// *   [`crate::common::CourierApp`] and [`crate::common::CourierSettings`]: launching a runtime.
/// *   [`crate::common::CourierRuntime`]: the runtime handle.
/// *   [`crate::common::Publisher`] and [`crate::common::EventAttributes`]: publishing.
/// *   [`crate::message::Delivery`] and [`crate::message::Acknowledger`]: Explicit-mode acknowledgment.
/// *   [`crate::transport::MemoryTransport`]: the loopback transport.
pub mod prelude {
    // Macros from courier-macro
    pub use courier_macro::courier_payload;

    // External crate re-exports
    pub use async_trait::async_trait;

    // Core types
    pub use crate::common::codec::{
        DecodedPayload, DeserializationFailure, JsonCodec, PayloadType, SerializationFailure,
    };
    pub use crate::common::{
        CourierApp, CourierConfig, CourierRuntime, CourierSettings, EventAttributes, HandlerError,
        HandlerFuture, PublishError, Publisher,
    };
    pub use crate::dispatch::{
        DeliveryMode, DispatchEngine, DispatchError, DispatchOutcome, RegistrationError,
        Resolution, SubscribeOptions, SubscriberBinding,
    };
    pub use crate::message::{
        AckDecision, Acknowledger, Delivery, DeliveryInfo, EventEnvelope, Headers, InboundMessage,
        OutboundMessage,
    };
    pub use crate::traits::{DispatchHook, PayloadCodec, Transport, TransportError};
    pub use crate::transport::MemoryTransport;
}
