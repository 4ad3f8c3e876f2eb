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

#![allow(dead_code)]

use courier::message::{DeliveryInfo, EventEnvelope, Headers, InboundMessage};
use courier::prelude::*;

#[courier_payload]
#[derive(PartialEq, Default)]
pub struct OrderData {
    pub order_id: String,
    pub quantity: u32,
}

impl OrderData {
    pub fn new(order_id: &str, quantity: u32) -> Self {
        Self {
            order_id: order_id.to_string(),
            quantity,
        }
    }

    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap()
    }
}

#[courier_payload(camel_case)]
#[derive(PartialEq)]
pub struct ShipmentData {
    pub tracking_number: String,
    pub carrier_code: String,
}

/// Headers for a valid envelope.
pub fn envelope_headers(event_type: &str, id: &str) -> Headers {
    let (headers, _) = EventEnvelope::new(event_type, "/tests", id, Vec::new())
        .with_time("2024-05-01T12:00:00Z")
        .with_datacontenttype("application/json")
        .wrap();
    headers
}

/// A first-delivery message with the given stream sequence.
pub fn inbound(subject: &str, headers: Headers, body: Vec<u8>, stream_sequence: u64) -> InboundMessage {
    InboundMessage::new(subject, headers, body, DeliveryInfo::first(stream_sequence, stream_sequence))
}

/// A valid `order.created` message carrying `order`.
pub fn order_message(subject: &str, order: &OrderData, stream_sequence: u64) -> InboundMessage {
    inbound(
        subject,
        envelope_headers("order.created", &format!("evt-{stream_sequence}")),
        order.to_json(),
        stream_sequence,
    )
}
