//! Routing inbound messages to subscriber bindings.
//!
//! *   [`SubscriberBinding`]: a handler with its subject, payload type and [`DeliveryMode`].
//! *   [`BindingRegistry`]: the subject-keyed table of bindings, with wildcard lookup.
//! *   [`DispatchEngine`]: runs one message through decode, handler and acknowledgment.

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

pub use binding::{DeliveryMode, SubscribeOptions, SubscriberBinding};
pub use binding_registry::{subject_matches, BindingRegistry};
pub use dispatch_error::DispatchError;
pub use dispatch_stats::{DispatchStats, DispatchStatsSnapshot};
pub use engine::{DispatchEngine, DispatchOutcome, DispatchState, Resolution};
pub use registration_error::RegistrationError;

mod binding;
mod binding_registry;
mod dispatch_error;
mod dispatch_stats;
/// The per-message dispatch state machine.
mod engine;
mod registration_error;
