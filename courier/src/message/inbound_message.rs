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

use std::collections::HashMap;
use std::time::SystemTime;

use static_assertions::assert_impl_all;

/// Raw transport header map. Insertion order carries no meaning.
pub type Headers = HashMap<String, String>;

/// Delivery bookkeeping the transport attaches to every message it hands out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryInfo {
    /// Position of the message in the stream.
    pub stream_sequence: u64,
    /// Position of the message in this consumer's delivery order.
    pub consumer_sequence: u64,
    /// How many times the message has been delivered, starting at 1.
    pub delivered: u32,
    /// When the transport stored the message.
    pub timestamp: SystemTime,
}

impl DeliveryInfo {
    /// Creates delivery metadata for a first delivery.
    #[must_use]
    pub fn first(stream_sequence: u64, consumer_sequence: u64) -> Self {
        Self {
            stream_sequence,
            consumer_sequence,
            delivered: 1,
            timestamp: SystemTime::now(),
        }
    }

    /// Returns a copy describing the next redelivery of the same message.
    #[must_use]
    pub fn redelivered(&self, consumer_sequence: u64) -> Self {
        Self {
            stream_sequence: self.stream_sequence,
            consumer_sequence,
            delivered: self.delivered.saturating_add(1),
            timestamp: self.timestamp,
        }
    }

    /// `true` when this is not the first delivery.
    #[must_use]
    pub const fn is_redelivery(&self) -> bool {
        self.delivered > 1
    }
}

impl Default for DeliveryInfo {
    fn default() -> Self {
        Self::first(0, 0)
    }
}

/// A single message exactly as the transport delivered it.
///
/// The dispatch engine owns an `InboundMessage` for one pass through the
/// pipeline and never mutates it. Explicit-mode handlers see it again through
/// the read-only accessors on [`Delivery`](crate::message::Delivery).
#[derive(Debug, Clone)]
pub struct InboundMessage {
    subject: String,
    headers: Headers,
    body: Vec<u8>,
    delivery: DeliveryInfo,
}

impl InboundMessage {
    /// Creates a message from its raw parts.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        headers: Headers,
        body: Vec<u8>,
        delivery: DeliveryInfo,
    ) -> Self {
        Self {
            subject: subject.into(),
            headers,
            body,
            delivery,
        }
    }

    /// The subject the message was published on.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// All transport headers, envelope attributes included.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Looks up a single header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// The raw message body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Delivery metadata supplied by the transport.
    #[must_use]
    pub const fn delivery(&self) -> &DeliveryInfo {
        &self.delivery
    }
}

assert_impl_all!(InboundMessage: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redelivery_keeps_stream_position() {
        let first = DeliveryInfo::first(7, 1);
        assert!(!first.is_redelivery());

        let second = first.redelivered(2);
        assert_eq!(second.stream_sequence, 7);
        assert_eq!(second.consumer_sequence, 2);
        assert_eq!(second.delivered, 2);
        assert!(second.is_redelivery());
    }

    #[test]
    fn header_lookup_is_exact() {
        let mut headers = Headers::new();
        headers.insert("ce-id".to_string(), "42".to_string());
        let message = InboundMessage::new("orders", headers, Vec::new(), DeliveryInfo::default());

        assert_eq!(message.header("ce-id"), Some("42"));
        assert_eq!(message.header("CE-ID"), None);
    }
}
