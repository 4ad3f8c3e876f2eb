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

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::trace;

use crate::common::codec::CodecSlot;
use crate::common::courier_inner::CourierInner;
use crate::common::{CourierConfig, CourierRuntime};
use crate::dispatch::{BindingRegistry, DispatchStats};
use crate::traits::{DispatchHook, PayloadCodec};

/// Explicit runtime configuration.
///
/// Anything left unset falls back to the loaded configuration file, the
/// bundled [`JsonCodec`](crate::common::codec::JsonCodec), and no hook.
#[derive(Default)]
pub struct CourierSettings {
    /// Runtime configuration. `None` loads it from the XDG config file.
    pub config: Option<CourierConfig>,
    /// The payload codec. `None` selects the JSON codec.
    pub codec: Option<Arc<dyn PayloadCodec>>,
    /// Optional dispatch lifecycle observer.
    pub hook: Option<Arc<dyn DispatchHook>>,
}

impl std::fmt::Debug for CourierSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourierSettings")
            .field("config", &self.config)
            .field("codec", &self.codec)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl CourierSettings {
    /// Uses `config` instead of loading one.
    #[must_use]
    pub fn with_config(mut self, config: CourierConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the default JSON codec.
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn PayloadCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Installs a dispatch lifecycle hook.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn DispatchHook>) -> Self {
        self.hook = Some(hook);
        self
    }
}

/// Entry point for building a courier runtime.
///
/// ```rust,ignore
/// use courier::prelude::*;
///
/// let runtime = CourierApp::launch();
/// runtime.subscribe::<OrderData, _>("orders.created", |order| {
///     Box::pin(async move {
///         println!("{order:?}");
///         Ok(())
///     })
/// })?;
/// runtime.run(Arc::new(MemoryTransport::new())).await;
/// ```
#[derive(Default, Debug, Clone)]
pub struct CourierApp;

impl CourierApp {
    /// Launches a runtime with the loaded configuration and the JSON codec.
    #[must_use]
    pub fn launch() -> CourierRuntime {
        Self::launch_with(CourierSettings::default())
    }

    /// Launches a runtime from explicit settings.
    #[must_use]
    pub fn launch_with(settings: CourierSettings) -> CourierRuntime {
        trace!("Starting courier runtime initialization");

        let config = settings.config.unwrap_or_else(CourierConfig::load);
        trace!("Configuration loaded: {:?}", config);

        let codec = CodecSlot::new(settings.codec);
        trace!(default_codec = codec.is_default(), "Payload codec installed");

        CourierRuntime(Arc::new(CourierInner {
            config,
            codec: Arc::new(codec),
            bindings: Arc::new(BindingRegistry::new()),
            hook: settings.hook,
            stats: Arc::new(DispatchStats::new()),
            cancellation_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }))
    }
}
