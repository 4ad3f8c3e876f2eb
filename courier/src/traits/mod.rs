//! The seams where applications plug into the courier runtime.
//!
//! *   [`Transport`]: the broker connection messages are received from, acknowledged on and
//!     published to.
//! *   [`PayloadCodec`]: turns payload bytes into typed values and back. One codec is active
//!     per runtime.
//! *   [`DispatchHook`]: optional observer of each message's dispatch lifecycle.

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

pub use dispatch_hook::DispatchHook;
pub use payload_codec::PayloadCodec;
pub use transport::{Transport, TransportError};

/// Defines the [`DispatchHook`] observer trait.
mod dispatch_hook;
/// Defines the [`PayloadCodec`] trait.
mod payload_codec;
/// Defines the [`Transport`] trait and its error type.
mod transport;
