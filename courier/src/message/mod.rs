//! Message types flowing between the transport, the dispatch engine and handlers.
//!
//! *   [`InboundMessage`]: a raw message as delivered, with [`DeliveryInfo`] bookkeeping.
//! *   [`EventEnvelope`]: the binary-mode event envelope carried in `ce-*` headers.
//! *   [`AckDecision`]: the fate of an inbound message.
//! *   [`Acknowledger`] and [`Delivery`]: acknowledgment control handed to handlers.
//! *   [`OutboundMessage`]: a wrapped message ready for the transport.

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

pub use ack_decision::AckDecision;
pub use delivery::{Acknowledger, Delivery};
pub use event_envelope::{
    EnvelopeError, EventEnvelope, HEADER_DATACONTENTTYPE, HEADER_ID, HEADER_SOURCE,
    HEADER_SPECVERSION, HEADER_TIME, HEADER_TYPE, SPEC_VERSION,
};
pub use inbound_message::{DeliveryInfo, Headers, InboundMessage};
pub use outbound_message::OutboundMessage;

mod ack_decision;
/// Defines the [`Acknowledger`] and the Explicit-mode [`Delivery`] wrapper.
mod delivery;
/// Binary-mode envelope wrapping and validation.
mod event_envelope;
mod inbound_message;
mod outbound_message;
