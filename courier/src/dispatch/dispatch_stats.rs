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

use std::sync::atomic::{AtomicUsize, Ordering};

/// Running totals kept by the dispatch engine, for health checks.
#[derive(Debug, Default)]
pub struct DispatchStats {
    received: AtomicUsize,
    acked: AtomicUsize,
    naked: AtomicUsize,
    no_action: AtomicUsize,
    handed_to_handler: AtomicUsize,
    handler_errors: AtomicUsize,
    envelope_errors: AtomicUsize,
    decode_errors: AtomicUsize,
    post_shutdown: AtomicUsize,
    unrouted: AtomicUsize,
    ack_failures: AtomicUsize,
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStatsSnapshot {
    /// Messages taken from the transport.
    pub received: usize,
    /// Messages the engine acked and the transport accepted the ack for.
    pub acked: usize,
    /// Messages the engine naked and the transport accepted the nak for.
    pub naked: usize,
    /// Automatic-mode successes left unacknowledged because `auto_ack` is off.
    pub no_action: usize,
    /// Explicit-mode messages whose fate was left to the handler.
    pub handed_to_handler: usize,
    /// Handler failures and panics, in either mode.
    pub handler_errors: usize,
    /// Messages rejected for an invalid envelope.
    pub envelope_errors: usize,
    /// Messages whose payload failed to decode.
    pub decode_errors: usize,
    /// Messages received after shutdown.
    pub post_shutdown: usize,
    /// Messages with no matching binding.
    pub unrouted: usize,
    /// Engine acks or naks the transport refused.
    pub ack_failures: usize,
}

macro_rules! counters {
    ($($field:ident => $record:ident),* $(,)?) => {
        impl DispatchStats {
            $(
                pub(crate) fn $record(&self) {
                    self.$field.fetch_add(1, Ordering::Relaxed);
                }
            )*

            /// Copies the current totals.
            #[must_use]
            pub fn snapshot(&self) -> DispatchStatsSnapshot {
                DispatchStatsSnapshot {
                    $($field: self.$field.load(Ordering::Relaxed),)*
                }
            }
        }
    };
}

counters! {
    received => record_received,
    acked => record_acked,
    naked => record_naked,
    no_action => record_no_action,
    handed_to_handler => record_handed_to_handler,
    handler_errors => record_handler_error,
    envelope_errors => record_envelope_error,
    decode_errors => record_decode_error,
    post_shutdown => record_post_shutdown,
    unrouted => record_unrouted,
    ack_failures => record_ack_failure,
}

impl DispatchStats {
    /// Create new statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages taken from the transport so far.
    #[must_use]
    pub fn received(&self) -> usize {
        self.received.load(Ordering::Relaxed)
    }
}
