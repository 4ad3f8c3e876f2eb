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

use crate::dispatch::DispatchOutcome;
use crate::message::InboundMessage;

/// Observes the dispatch engine's per-message lifecycle.
///
/// Both callbacks run inline on the worker processing the message, so they
/// should return quickly. Typical uses are tracing-span propagation and
/// feeding health checks.
///
/// ```rust,ignore
/// #[derive(Debug, Default)]
/// struct CountNaks(AtomicU64);
///
/// impl DispatchHook for CountNaks {
///     fn on_resolved(&self, _message: &InboundMessage, outcome: &DispatchOutcome) {
///         if outcome.resolution() == Resolution::Naked {
///             self.0.fetch_add(1, Ordering::Relaxed);
///         }
///     }
/// }
/// ```
pub trait DispatchHook: Send + Sync + 'static {
    /// Called once a message is received, before its envelope is checked.
    fn on_received(&self, _message: &InboundMessage) {}

    /// Called after the message reaches its final state.
    fn on_resolved(&self, _message: &InboundMessage, _outcome: &DispatchOutcome) {}
}
