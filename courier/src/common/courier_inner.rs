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
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::common::codec::CodecSlot;
use crate::common::CourierConfig;
use crate::dispatch::{BindingRegistry, DispatchStats};
use crate::traits::DispatchHook;

/// Shared state behind every clone of a [`CourierRuntime`](crate::common::CourierRuntime).
pub struct CourierInner {
    pub(crate) config: CourierConfig,

    pub(crate) codec: Arc<CodecSlot>,

    pub(crate) bindings: Arc<BindingRegistry>,

    pub(crate) hook: Option<Arc<dyn DispatchHook>>,

    pub(crate) stats: Arc<DispatchStats>,

    /// Stops the worker pool.
    pub(crate) cancellation_token: CancellationToken,

    /// Tracks worker tasks so shutdown can wait for in-flight dispatches.
    pub(crate) tracker: TaskTracker,
}

impl fmt::Debug for CourierInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CourierInner")
            .field("config", &self.config)
            .field("codec", &self.codec)
            .field("bindings", &self.bindings)
            .field("hook", &self.hook.is_some())
            .field("stats", &self.stats)
            .field("cancelled", &self.cancellation_token.is_cancelled())
            .field("workers", &self.tracker.len())
            .finish()
    }
}
