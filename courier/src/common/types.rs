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

//! Type aliases shared by bindings, the dispatch engine and the runtime.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::common::codec::DecodedPayload;
use crate::message::{Acknowledger, EventEnvelope};

/// Error a handler returns to report failure.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Pinned, boxed future returned by every subscriber handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'static>>;

/// Crate-internal: what an invoker needs besides the decoded payload to build
/// a handler's argument.
pub(crate) struct Invocation {
    pub(crate) envelope: Arc<EventEnvelope>,
    pub(crate) acknowledger: Acknowledger,
}

/// Crate-internal: type-erased handler call.
///
/// Downcasts the decoded payload to the binding's target type and calls the
/// handler with it. Returns `None` without calling the handler when the
/// payload is of any other type.
pub(crate) type Invoker =
    Arc<dyn Fn(DecodedPayload, Invocation) -> Option<HandlerFuture> + Send + Sync + 'static>;
