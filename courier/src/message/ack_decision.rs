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
use std::time::Duration;

/// The fate of one inbound message as communicated to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckDecision {
    /// Processing succeeded; the transport may forget the message.
    Ack,
    /// Processing failed; the transport should redeliver, optionally after a delay.
    ///
    /// `None` leaves the delay to the transport's own redelivery policy.
    Nak(Option<Duration>),
    /// Stop redelivering regardless of the configured maximum delivery count.
    Term,
}

impl AckDecision {
    /// A negative acknowledgment without a delay override.
    #[must_use]
    pub const fn nak() -> Self {
        Self::Nak(None)
    }

    /// A negative acknowledgment asking for redelivery after `delay`.
    #[must_use]
    pub const fn nak_after(delay: Duration) -> Self {
        Self::Nak(Some(delay))
    }
}

impl fmt::Display for AckDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ack => write!(f, "ack"),
            Self::Nak(None) => write!(f, "nak"),
            Self::Nak(Some(delay)) => write!(f, "nak({}ms)", delay.as_millis()),
            Self::Term => write!(f, "term"),
        }
    }
}
