//! Runtime assembly and the pieces shared across the crate.
//!
//! *   [`CourierApp`]: entry point that launches a [`CourierRuntime`] from [`CourierSettings`].
//! *   [`CourierRuntime`]: registers subscriptions, runs dispatch workers and shuts them down.
//! *   [`Publisher`]: the outbound path, from typed value to wrapped message.
//! *   [`CourierConfig`]: configuration loaded from XDG-compliant TOML files.
//! *   [`codec`]: payload type tokens, the type validator and the default JSON codec.

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

// --- Public Re-exports ---
pub use config::{CourierConfig, CONFIG};
pub use courier_app::{CourierApp, CourierSettings};
pub use courier_runtime::CourierRuntime;
pub use publisher::{EventAttributes, PublishError, Publisher};

// --- Crate-Internal Re-exports ---
pub use types::*;

// --- Submodules ---

/// Payload type tokens, validation and codecs.
pub mod codec;
/// Defines the configuration system for courier.
pub mod config;
/// Defines common type aliases for handlers.
mod types;

/// Defines the `CourierApp` entry point.
mod courier_app;
/// Defines the internal state (`CourierInner`) of the runtime.
mod courier_inner;
/// Defines the `CourierRuntime` handle.
mod courier_runtime;
/// Defines the outbound `Publisher`.
mod publisher;
