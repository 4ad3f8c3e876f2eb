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

use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::codec::JsonCodec;
use crate::traits::PayloadCodec;

/// Holds the runtime's active payload codec until shutdown tears it down.
#[derive(Debug)]
pub struct CodecSlot {
    codec: RwLock<Option<Arc<dyn PayloadCodec>>>,
    is_default: bool,
}

impl Default for CodecSlot {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CodecSlot {
    /// Installs `codec`, or the bundled [`JsonCodec`] when `None`.
    #[must_use]
    pub fn new(codec: Option<Arc<dyn PayloadCodec>>) -> Self {
        let is_default = codec.is_none();
        let codec = codec.unwrap_or_else(|| Arc::new(JsonCodec));
        Self {
            codec: RwLock::new(Some(codec)),
            is_default,
        }
    }

    /// The active codec, or `None` once the slot has been torn down.
    #[must_use]
    pub fn current(&self) -> Option<Arc<dyn PayloadCodec>> {
        self.codec.read().clone()
    }

    /// `true` when no custom codec was supplied.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.is_default
    }

    /// Empties the slot. Returns `false` if it was already empty.
    pub fn tear_down(&self) -> bool {
        self.codec.write().take().is_some()
    }

    /// `true` once [`CodecSlot::tear_down`] has run.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.codec.read().is_none()
    }
}
