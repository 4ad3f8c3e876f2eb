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

use crate::message::Headers;

/// A fully wrapped message ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Subject to publish on.
    pub subject: String,
    /// Envelope attribute headers plus any extension headers.
    pub headers: Headers,
    /// Encoded payload bytes.
    pub body: Vec<u8>,
}

impl OutboundMessage {
    /// Creates an outbound message from its parts.
    #[must_use]
    pub fn new(subject: impl Into<String>, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            subject: subject.into(),
            headers,
            body,
        }
    }
}
