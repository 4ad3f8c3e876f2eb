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

//! The per-message pipeline: envelope check, payload decode, handler call
//! and acknowledgment.
//!
//! Every message walks `Received → EnvelopeValidated → PayloadDecoded →
//! HandlerInvoked → Resolved`, leaving early for `Resolved` on the first
//! failure. No failure escapes as an error: each one ends in a logged Nak,
//! except handler failures in Explicit mode, which are only logged.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, instrument, trace, warn};

use crate::common::codec::{CodecSlot, DeserializationFailure};
use crate::common::config::LoggingConfig;
use crate::common::{HandlerError, Invocation};
use crate::dispatch::{BindingRegistry, DeliveryMode, DispatchError, DispatchStats, SubscriberBinding};
use crate::message::{AckDecision, Acknowledger, EventEnvelope, InboundMessage};
use crate::traits::{DispatchHook, Transport, TransportError};

/// Where a message is in the dispatch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DispatchState {
    /// Taken from the transport.
    Received,
    /// All required envelope attributes are present and valid.
    EnvelopeValidated,
    /// The payload decoded into the binding's type.
    PayloadDecoded,
    /// The handler has been called.
    HandlerInvoked,
    /// The message's fate is settled.
    Resolved,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::EnvelopeValidated => "envelope-validated",
            Self::PayloadDecoded => "payload-decoded",
            Self::HandlerInvoked => "handler-invoked",
            Self::Resolved => "resolved",
        };
        f.write_str(name)
    }
}

/// How the engine settled a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// The engine acked.
    Acked,
    /// The engine naked without a delay override.
    Naked,
    /// Automatic mode with `auto_ack` off: the handler succeeded and the
    /// engine did nothing.
    NoAction,
    /// Explicit mode: whatever the handler did is the message's fate.
    HandedToHandler,
}

impl Resolution {
    /// The acknowledgment the engine itself issued, if any.
    #[must_use]
    pub const fn engine_decision(self) -> Option<AckDecision> {
        match self {
            Self::Acked => Some(AckDecision::Ack),
            Self::Naked => Some(AckDecision::Nak(None)),
            Self::NoAction | Self::HandedToHandler => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Acked => "acked",
            Self::Naked => "naked",
            Self::NoAction => "no-action",
            Self::HandedToHandler => "handed-to-handler",
        };
        f.write_str(name)
    }
}

/// The result of dispatching one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    subject: String,
    resolution: Resolution,
    last_state: DispatchState,
    error: Option<DispatchError>,
    transport_error: Option<TransportError>,
}

impl DispatchOutcome {
    /// Subject of the dispatched message.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// How the message was settled.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// The furthest state reached before `Resolved`.
    #[must_use]
    pub const fn last_state(&self) -> DispatchState {
        self.last_state
    }

    /// `true` if the handler was called.
    #[must_use]
    pub fn handler_invoked(&self) -> bool {
        self.last_state >= DispatchState::HandlerInvoked
    }

    /// The failure that shaped the resolution, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&DispatchError> {
        self.error.as_ref()
    }

    /// Error from the transport when applying the engine's decision.
    #[must_use]
    pub const fn transport_error(&self) -> Option<&TransportError> {
        self.transport_error.as_ref()
    }
}

/// Runs inbound messages through the dispatch pipeline.
///
/// Cheap to clone; clones share bindings, codec, transport and statistics.
/// Any number of workers may call [`dispatch`](Self::dispatch) concurrently.
#[derive(Clone)]
pub struct DispatchEngine {
    bindings: Arc<BindingRegistry>,
    codec: Arc<CodecSlot>,
    transport: Arc<dyn Transport>,
    logging: LoggingConfig,
    hook: Option<Arc<dyn DispatchHook>>,
    stats: Arc<DispatchStats>,
}

impl fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("subjects", &self.bindings.subjects())
            .field("transport", &self.transport)
            .field("logging", &self.logging)
            .field("hook", &self.hook.is_some())
            .finish_non_exhaustive()
    }
}

impl DispatchEngine {
    /// Creates an engine with default logging, no hook and fresh statistics.
    #[must_use]
    pub fn new(
        bindings: Arc<BindingRegistry>,
        codec: Arc<CodecSlot>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            bindings,
            codec,
            transport,
            logging: LoggingConfig::default(),
            hook: None,
            stats: Arc::new(DispatchStats::new()),
        }
    }

    /// Replaces the failure-logging settings.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Installs a lifecycle hook.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn DispatchHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Records into `stats` instead of a private counter set.
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<DispatchStats>) -> Self {
        self.stats = stats;
        self
    }

    /// The engine's statistics.
    #[must_use]
    pub const fn stats(&self) -> &Arc<DispatchStats> {
        &self.stats
    }

    /// The transport acknowledgments are sent to.
    #[must_use]
    pub const fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Runs `message` through the pipeline to completion.
    #[instrument(
        name = "dispatch",
        skip_all,
        fields(
            subject = message.subject(),
            stream_sequence = message.delivery().stream_sequence,
            delivered = message.delivery().delivered,
        )
    )]
    pub async fn dispatch(&self, message: InboundMessage) -> DispatchOutcome {
        let message = Arc::new(message);
        self.stats.record_received();
        if let Some(hook) = &self.hook {
            hook.on_received(&message);
        }

        let outcome = self.run(&message).await;
        trace!(
            state = %DispatchState::Resolved,
            resolution = %outcome.resolution,
            "Dispatch complete"
        );

        if let Some(hook) = &self.hook {
            hook.on_resolved(&message, &outcome);
        }
        outcome
    }

    async fn run(&self, message: &Arc<InboundMessage>) -> DispatchOutcome {
        let acknowledger = Acknowledger::new(Arc::clone(&self.transport), Arc::clone(message));

        let Some(codec) = self.codec.current() else {
            error!(
                subject = message.subject(),
                "Message received after shutdown; forcing nak without decoding"
            );
            self.stats.record_post_shutdown();
            return self
                .nak(&acknowledger, DispatchState::Received, DispatchError::PostShutdown)
                .await;
        };
        trace!(state = %DispatchState::Received);

        let envelope = match EventEnvelope::unwrap(message.headers(), message.body()) {
            Ok(envelope) => Arc::new(envelope),
            Err(e) => {
                error!(
                    subject = message.subject(),
                    attribute = e.attribute(),
                    "Invalid event envelope: {}",
                    e
                );
                self.stats.record_envelope_error();
                return self.nak(&acknowledger, DispatchState::Received, e.into()).await;
            }
        };
        trace!(state = %DispatchState::EnvelopeValidated, event_type = envelope.event_type());

        let Some(binding) = self.bindings.resolve(message.subject()) else {
            error!(subject = message.subject(), "No subscriber registered for subject");
            self.stats.record_unrouted();
            return self
                .nak(
                    &acknowledger,
                    DispatchState::EnvelopeValidated,
                    DispatchError::NoBinding(message.subject().to_string()),
                )
                .await;
        };

        let target = binding.payload_type();
        let decoded = codec
            .decode(envelope.data(), target, envelope.event_type())
            .and_then(|decoded| {
                if (*decoded).type_id() == target.type_id() {
                    Ok(decoded)
                } else {
                    Err(DeserializationFailure::TypeMismatch {
                        expected: target.type_name().to_string(),
                    })
                }
            });
        drop(codec);
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(e) => return self.decode_failed(&acknowledger, &binding, e).await,
        };
        trace!(state = %DispatchState::PayloadDecoded, type_name = target.type_name());

        let invocation = Invocation {
            envelope,
            acknowledger: acknowledger.clone(),
        };
        let invoked = std::panic::catch_unwind(AssertUnwindSafe(|| binding.invoke(decoded, invocation)));
        let result = match invoked {
            Ok(Some(future)) => {
                trace!(state = %DispatchState::HandlerInvoked, mode = %binding.mode());
                match AssertUnwindSafe(future).catch_unwind().await {
                    Ok(result) => result.map_err(|e: HandlerError| e.to_string()),
                    Err(panic) => Err(panic_message(panic.as_ref())),
                }
            }
            Ok(None) => {
                let failure = DeserializationFailure::TypeMismatch {
                    expected: target.type_name().to_string(),
                };
                return self.decode_failed(&acknowledger, &binding, failure).await;
            }
            Err(panic) => Err(panic_message(panic.as_ref())),
        };

        self.resolve(&acknowledger, &binding, result).await
    }

    async fn resolve(
        &self,
        acknowledger: &Acknowledger,
        binding: &SubscriberBinding,
        result: Result<(), String>,
    ) -> DispatchOutcome {
        let mode = binding.mode();
        let message = acknowledger.message();
        let handler_error = result.err().map(|reason| {
            error!(
                subject = message.subject(),
                binding = binding.subject(),
                type_name = binding.payload_type().type_name(),
                mode = %mode,
                "Handler failed: {}",
                reason
            );
            self.stats.record_handler_error();
            DispatchError::Handler {
                mode,
                message: reason,
            }
        });

        match (mode, handler_error) {
            (DeliveryMode::Automatic { .. }, Some(e)) => {
                self.nak(acknowledger, DispatchState::HandlerInvoked, e).await
            }
            (DeliveryMode::Automatic { auto_ack: true }, None) => {
                let transport_error = self.apply(acknowledger, AckDecision::Ack).await;
                self.outcome(
                    acknowledger,
                    Resolution::Acked,
                    DispatchState::HandlerInvoked,
                    None,
                    transport_error,
                )
            }
            (DeliveryMode::Automatic { auto_ack: false }, None) => {
                self.stats.record_no_action();
                self.outcome(
                    acknowledger,
                    Resolution::NoAction,
                    DispatchState::HandlerInvoked,
                    None,
                    None,
                )
            }
            (DeliveryMode::Explicit, error) => {
                self.stats.record_handed_to_handler();
                self.outcome(
                    acknowledger,
                    Resolution::HandedToHandler,
                    DispatchState::HandlerInvoked,
                    error,
                    None,
                )
            }
        }
    }

    async fn decode_failed(
        &self,
        acknowledger: &Acknowledger,
        binding: &SubscriberBinding,
        failure: DeserializationFailure,
    ) -> DispatchOutcome {
        let message = acknowledger.message();
        error!(
            subject = message.subject(),
            type_name = binding.payload_type().type_name(),
            payload = %self.payload_preview(message.body()),
            "Failed to deserialize payload: {}",
            failure
        );
        self.stats.record_decode_error();
        self.nak(acknowledger, DispatchState::EnvelopeValidated, failure.into())
            .await
    }

    async fn nak(
        &self,
        acknowledger: &Acknowledger,
        last_state: DispatchState,
        error: DispatchError,
    ) -> DispatchOutcome {
        let transport_error = self.apply(acknowledger, AckDecision::nak()).await;
        self.outcome(
            acknowledger,
            Resolution::Naked,
            last_state,
            Some(error),
            transport_error,
        )
    }

    async fn apply(&self, acknowledger: &Acknowledger, decision: AckDecision) -> Option<TransportError> {
        match acknowledger.apply(decision).await {
            Ok(()) => {
                match decision {
                    AckDecision::Ack => self.stats.record_acked(),
                    AckDecision::Nak(_) => self.stats.record_naked(),
                    AckDecision::Term => {}
                }
                None
            }
            Err(e) => {
                self.stats.record_ack_failure();
                warn!(
                    subject = acknowledger.message().subject(),
                    %decision,
                    "Transport failed to apply acknowledgment: {}",
                    e
                );
                Some(e)
            }
        }
    }

    fn outcome(
        &self,
        acknowledger: &Acknowledger,
        resolution: Resolution,
        last_state: DispatchState,
        error: Option<DispatchError>,
        transport_error: Option<TransportError>,
    ) -> DispatchOutcome {
        DispatchOutcome {
            subject: acknowledger.message().subject().to_string(),
            resolution,
            last_state,
            error,
            transport_error,
        }
    }

    fn payload_preview(&self, body: &[u8]) -> String {
        if !self.logging.log_payloads_on_error {
            return "<payload logging disabled>".to_string();
        }
        let limit = self.logging.payload_preview_bytes;
        if body.len() <= limit {
            String::from_utf8_lossy(body).into_owned()
        } else {
            format!(
                "{}... ({} bytes total)",
                String::from_utf8_lossy(&body[..limit]),
                body.len()
            )
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}
