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

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{debug, trace};

use crate::common::config::{MemoryTransportConfig, CONFIG};
use crate::message::{AckDecision, DeliveryInfo, Headers, InboundMessage, OutboundMessage};
use crate::traits::{Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AckRecord {
    delivered: u32,
    decision: AckDecision,
}

/// Loopback transport backed by a Tokio channel.
///
/// Published messages come straight back out of [`receive`](Transport::receive)
/// with fresh sequence numbers. Every acknowledgment call is recorded per
/// stream sequence, so tests can check exactly what reached the transport.
/// Only the first decision for a delivery takes effect; later ones are
/// recorded and otherwise ignored.
///
/// With [`with_redelivery`](Self::with_redelivery), an effective nak puts the
/// message back on the queue, after its delay, until the delivery limit is
/// reached.
#[derive(Debug)]
pub struct MemoryTransport {
    sender: Mutex<Option<mpsc::Sender<InboundMessage>>>,
    receiver: AsyncMutex<mpsc::Receiver<InboundMessage>>,
    stream_sequence: AtomicU64,
    consumer_sequence: AtomicU64,
    acknowledgments: DashMap<u64, Vec<AckRecord>>,
    published: Mutex<Vec<OutboundMessage>>,
    max_deliver: Option<u32>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// Creates a transport sized from the global configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&CONFIG.memory)
    }

    /// Creates a transport from explicit settings.
    #[must_use]
    pub fn from_config(config: &MemoryTransportConfig) -> Self {
        Self::with_capacity(config.channel_capacity)
    }

    /// Creates a transport whose queue holds at most `capacity` messages.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: AsyncMutex::new(receiver),
            stream_sequence: AtomicU64::new(0),
            consumer_sequence: AtomicU64::new(0),
            acknowledgments: DashMap::new(),
            published: Mutex::new(Vec::new()),
            max_deliver: None,
        }
    }

    /// Redeliver naked messages until each has been delivered `max_deliver` times.
    #[must_use]
    pub fn with_redelivery(mut self, max_deliver: u32) -> Self {
        self.max_deliver = Some(max_deliver.max(1));
        self
    }

    /// Queues a raw message as a first delivery and returns its delivery metadata.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] once the transport is closed.
    pub async fn inject(
        &self,
        subject: impl Into<String>,
        headers: Headers,
        body: Vec<u8>,
    ) -> Result<DeliveryInfo, TransportError> {
        let delivery = DeliveryInfo::first(
            self.stream_sequence.fetch_add(1, Ordering::SeqCst) + 1,
            self.next_consumer_sequence(),
        );
        self.enqueue(InboundMessage::new(subject, headers, body, delivery.clone()))
            .await?;
        Ok(delivery)
    }

    /// Queues `message` exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] once the transport is closed.
    pub async fn inject_message(&self, message: InboundMessage) -> Result<(), TransportError> {
        self.enqueue(message).await
    }

    /// Every decision recorded for the stream sequence, in call order.
    #[must_use]
    pub fn decisions(&self, stream_sequence: u64) -> Vec<AckDecision> {
        self.acknowledgments
            .get(&stream_sequence)
            .map(|records| records.iter().map(|r| r.decision).collect())
            .unwrap_or_default()
    }

    /// The decision that took effect for the latest delivery of the stream
    /// sequence: the first one recorded for that delivery.
    #[must_use]
    pub fn effective_decision(&self, stream_sequence: u64) -> Option<AckDecision> {
        let records = self.acknowledgments.get(&stream_sequence)?;
        let latest = records.iter().map(|r| r.delivered).max()?;
        records
            .iter()
            .find(|r| r.delivered == latest)
            .map(|r| r.decision)
    }

    /// Messages handed to [`publish`](Transport::publish), in order.
    #[must_use]
    pub fn published(&self) -> Vec<OutboundMessage> {
        self.published.lock().clone()
    }

    /// Stops accepting new messages. Queued messages can still be received;
    /// after that `receive` returns `Ok(None)`.
    pub fn close(&self) {
        if self.sender.lock().take().is_some() {
            debug!("Memory transport closed");
        }
    }

    /// `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    fn next_consumer_sequence(&self) -> u64 {
        self.consumer_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn enqueue(&self, message: InboundMessage) -> Result<(), TransportError> {
        let sender = self.sender.lock().clone().ok_or(TransportError::Closed)?;
        sender.send(message).await.map_err(|_| TransportError::Closed)
    }

    // Returns true when this is the first decision for the message's delivery.
    fn record(&self, message: &InboundMessage, decision: AckDecision) -> bool {
        let delivered = message.delivery().delivered;
        let mut records = self
            .acknowledgments
            .entry(message.delivery().stream_sequence)
            .or_default();
        let first = !records.iter().any(|r| r.delivered == delivered);
        records.push(AckRecord {
            delivered,
            decision,
        });
        trace!(
            subject = message.subject(),
            stream_sequence = message.delivery().stream_sequence,
            delivered,
            %decision,
            effective = first,
            "Recorded acknowledgment"
        );
        first
    }

    fn schedule_redelivery(&self, message: &InboundMessage, delay: Option<Duration>) {
        let Some(max_deliver) = self.max_deliver else {
            return;
        };
        if message.delivery().delivered >= max_deliver {
            debug!(
                subject = message.subject(),
                stream_sequence = message.delivery().stream_sequence,
                "Delivery limit reached; not redelivering"
            );
            return;
        }
        let Some(sender) = self.sender.lock().clone() else {
            return;
        };
        let redelivery = InboundMessage::new(
            message.subject(),
            message.headers().clone(),
            message.body().to_vec(),
            message.delivery().redelivered(self.next_consumer_sequence()),
        );
        tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let _ = sender.send(redelivery).await;
        });
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn receive(&self) -> Result<Option<InboundMessage>, TransportError> {
        Ok(self.receiver.lock().await.recv().await)
    }

    async fn ack(&self, message: &InboundMessage) -> Result<(), TransportError> {
        self.record(message, AckDecision::Ack);
        Ok(())
    }

    async fn nak(
        &self,
        message: &InboundMessage,
        delay: Option<Duration>,
    ) -> Result<(), TransportError> {
        if self.record(message, AckDecision::Nak(delay)) {
            self.schedule_redelivery(message, delay);
        }
        Ok(())
    }

    async fn term(&self, message: &InboundMessage) -> Result<(), TransportError> {
        self.record(message, AckDecision::Term);
        Ok(())
    }

    async fn publish(&self, message: OutboundMessage) -> Result<(), TransportError> {
        let sender = self.sender.lock().clone().ok_or(TransportError::Closed)?;
        self.published.lock().push(message.clone());
        let delivery = DeliveryInfo::first(
            self.stream_sequence.fetch_add(1, Ordering::SeqCst) + 1,
            self.next_consumer_sequence(),
        );
        let inbound = InboundMessage::new(message.subject, message.headers, message.body, delivery);
        sender.send(inbound).await.map_err(|_| TransportError::Closed)
    }
}
