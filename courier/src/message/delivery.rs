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
use std::time::Duration;

use static_assertions::assert_impl_all;
use tracing::trace;

use crate::message::{AckDecision, DeliveryInfo, EventEnvelope, Headers, InboundMessage};
use crate::traits::{Transport, TransportError};

/// Pass-through acknowledgment control for one inbound message.
///
/// Cheap to clone and safe to move into background tasks: an Explicit-mode
/// handler may hand it off and acknowledge long after it has returned. No local
/// state is tracked, so repeated calls are forwarded to the transport as-is and
/// the transport decides which one takes effect.
#[derive(Clone)]
pub struct Acknowledger {
    transport: Arc<dyn Transport>,
    message: Arc<InboundMessage>,
}

assert_impl_all!(Acknowledger: Send, Sync, Clone);

impl fmt::Debug for Acknowledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acknowledger")
            .field("subject", &self.message.subject())
            .field("stream_sequence", &self.message.delivery().stream_sequence)
            .finish_non_exhaustive()
    }
}

impl Acknowledger {
    pub(crate) fn new(transport: Arc<dyn Transport>, message: Arc<InboundMessage>) -> Self {
        Self { transport, message }
    }

    /// Acknowledges the message.
    ///
    /// # Errors
    ///
    /// Returns the transport's error, if any.
    pub async fn ack(&self) -> Result<(), TransportError> {
        self.apply(AckDecision::Ack).await
    }

    /// Requests redelivery, after `delay` when given, otherwise per the
    /// transport's redelivery policy.
    ///
    /// # Errors
    ///
    /// Returns the transport's error, if any.
    pub async fn nak(&self, delay: Option<Duration>) -> Result<(), TransportError> {
        self.apply(AckDecision::Nak(delay)).await
    }

    /// Stops redelivery of the message.
    ///
    /// # Errors
    ///
    /// Returns the transport's error, if any.
    pub async fn term(&self) -> Result<(), TransportError> {
        self.apply(AckDecision::Term).await
    }

    /// Forwards `decision` to the transport.
    ///
    /// # Errors
    ///
    /// Returns the transport's error, if any.
    pub async fn apply(&self, decision: AckDecision) -> Result<(), TransportError> {
        trace!(
            subject = self.message.subject(),
            stream_sequence = self.message.delivery().stream_sequence,
            %decision,
            "Applying acknowledgment"
        );
        match decision {
            AckDecision::Ack => self.transport.ack(&self.message).await,
            AckDecision::Nak(delay) => self.transport.nak(&self.message, delay).await,
            AckDecision::Term => self.transport.term(&self.message).await,
        }
    }

    /// The message this acknowledger controls.
    #[must_use]
    pub fn message(&self) -> &InboundMessage {
        &self.message
    }
}

/// What an Explicit-mode handler receives: the decoded payload together with
/// acknowledgment control over the message that carried it.
///
/// The engine never acknowledges a message delivered this way. The handler
/// decides between [`ack`](Delivery::ack), [`nak`](Delivery::nak) and
/// [`term`](Delivery::term), or does nothing and lets the transport's ack
/// timeout redeliver it.
pub struct Delivery<T> {
    payload: Arc<T>,
    envelope: Arc<EventEnvelope>,
    acknowledger: Acknowledger,
}

assert_impl_all!(Delivery<String>: Send, Sync, Clone);

impl<T> Clone for Delivery<T> {
    fn clone(&self) -> Self {
        Self {
            payload: Arc::clone(&self.payload),
            envelope: Arc::clone(&self.envelope),
            acknowledger: self.acknowledger.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Delivery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("payload", &self.payload)
            .field("event_type", &self.envelope.event_type())
            .field("id", &self.envelope.id())
            .field("acknowledger", &self.acknowledger)
            .finish()
    }
}

impl<T> Delivery<T> {
    pub(crate) fn new(payload: T, envelope: Arc<EventEnvelope>, acknowledger: Acknowledger) -> Self {
        Self {
            payload: Arc::new(payload),
            envelope,
            acknowledger,
        }
    }

    /// The decoded payload. Every call returns the same instance.
    #[must_use]
    pub fn payload(&self) -> Arc<T> {
        Arc::clone(&self.payload)
    }

    /// The subject the message arrived on.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.acknowledger.message().subject()
    }

    /// The raw transport headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        self.acknowledger.message().headers()
    }

    /// Delivery count and sequence numbers.
    #[must_use]
    pub fn delivery_info(&self) -> &DeliveryInfo {
        self.acknowledger.message().delivery()
    }

    /// The unwrapped event envelope.
    #[must_use]
    pub fn envelope(&self) -> &EventEnvelope {
        &self.envelope
    }

    /// A detached acknowledgment handle for use after the handler returns.
    #[must_use]
    pub fn acknowledger(&self) -> Acknowledger {
        self.acknowledger.clone()
    }

    /// Acknowledges the message.
    ///
    /// # Errors
    ///
    /// Returns the transport's error, if any.
    pub async fn ack(&self) -> Result<(), TransportError> {
        self.acknowledger.ack().await
    }

    /// Requests redelivery, optionally after `delay`.
    ///
    /// # Errors
    ///
    /// Returns the transport's error, if any.
    pub async fn nak(&self, delay: Option<Duration>) -> Result<(), TransportError> {
        self.acknowledger.nak(delay).await
    }

    /// Stops redelivery of the message.
    ///
    /// # Errors
    ///
    /// Returns the transport's error, if any.
    pub async fn term(&self) -> Result<(), TransportError> {
        self.acknowledger.term().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{HEADER_ID, HEADER_SOURCE, HEADER_SPECVERSION, HEADER_TYPE};
    use crate::transport::MemoryTransport;

    fn message() -> InboundMessage {
        let headers: Headers = [
            (HEADER_SPECVERSION, "1.0"),
            (HEADER_TYPE, "order.created"),
            (HEADER_SOURCE, "/orders"),
            (HEADER_ID, "evt-1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        InboundMessage::new("orders.created", headers, b"{}".to_vec(), DeliveryInfo::first(7, 1))
    }

    #[tokio::test]
    async fn repeated_calls_are_forwarded_without_error() {
        let transport = Arc::new(MemoryTransport::new());
        let message = Arc::new(message());
        let ack = Acknowledger::new(transport.clone(), message);

        ack.ack().await.expect("first ack");
        ack.ack().await.expect("second ack");
        ack.nak(None).await.expect("nak after ack");

        assert_eq!(
            transport.decisions(7),
            vec![AckDecision::Ack, AckDecision::Ack, AckDecision::nak()]
        );
        assert_eq!(transport.effective_decision(7), Some(AckDecision::Ack));
    }

    #[tokio::test]
    async fn delivery_tolerates_repeated_nak_and_ack() {
        let transport = Arc::new(MemoryTransport::new());
        let message = Arc::new(message());
        let envelope = Arc::new(
            EventEnvelope::unwrap(message.headers(), message.body()).expect("valid envelope"),
        );
        let delivery = Delivery::new(
            "payload".to_string(),
            envelope,
            Acknowledger::new(transport.clone(), message),
        );

        delivery.nak(None).await.expect("first nak");
        delivery.nak(None).await.expect("second nak");
        delivery.ack().await.expect("first ack");
        delivery.ack().await.expect("second ack");

        assert_eq!(
            transport.decisions(7),
            vec![
                AckDecision::nak(),
                AckDecision::nak(),
                AckDecision::Ack,
                AckDecision::Ack
            ]
        );
        assert_eq!(transport.effective_decision(7), Some(AckDecision::nak()));
    }

    #[tokio::test]
    async fn payload_is_the_same_instance() {
        let transport = Arc::new(MemoryTransport::new());
        let message = Arc::new(message());
        let envelope = Arc::new(
            EventEnvelope::unwrap(message.headers(), message.body()).expect("valid envelope"),
        );
        let delivery = Delivery::new(
            "payload".to_string(),
            envelope,
            Acknowledger::new(transport.clone(), message),
        );

        assert!(Arc::ptr_eq(&delivery.payload(), &delivery.payload()));
        assert!(Arc::ptr_eq(&delivery.payload(), &delivery.clone().payload()));
        assert_eq!(delivery.subject(), "orders.created");
        assert_eq!(delivery.envelope().id(), "evt-1");

        let detached = delivery.acknowledger();
        tokio::spawn(async move { detached.term().await })
            .await
            .expect("join")
            .expect("term");
        assert_eq!(transport.effective_decision(7), Some(AckDecision::Term));
    }
}
