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
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::common::courier_inner::CourierInner;
use crate::common::{CourierConfig, HandlerFuture, Publisher};
use crate::dispatch::{
    DispatchEngine, DispatchStatsSnapshot, RegistrationError, SubscribeOptions, SubscriberBinding,
};
use crate::message::Delivery;
use crate::traits::Transport;

/// Handle to a launched courier runtime.
///
/// Cheap to clone; clones share bindings, codec, workers and statistics.
/// Subscriptions are registered up front, then [`run`](Self::run) starts
/// workers against a transport, and [`shutdown`](Self::shutdown) stops them
/// and tears the codec down.
#[derive(Debug, Clone)]
pub struct CourierRuntime(pub(crate) Arc<CourierInner>);

impl CourierRuntime {
    /// Subscribes an Automatic-mode handler that acks on success.
    ///
    /// # Errors
    ///
    /// See [`RegistrationError`].
    pub fn subscribe<T, F>(&self, subject: &str, handler: F) -> Result<(), RegistrationError>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: Fn(T) -> HandlerFuture + Send + Sync + 'static,
    {
        self.subscribe_with(subject, SubscribeOptions::default(), handler)
    }

    /// Subscribes an Automatic-mode handler with explicit options.
    ///
    /// # Errors
    ///
    /// See [`RegistrationError`].
    pub fn subscribe_with<T, F>(
        &self,
        subject: &str,
        options: SubscribeOptions,
        handler: F,
    ) -> Result<(), RegistrationError>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: Fn(T) -> HandlerFuture + Send + Sync + 'static,
    {
        self.register(SubscriberBinding::automatic::<T, F>(subject, options, handler))
            .map(|_| ())
    }

    /// Subscribes an Explicit-mode handler. It receives a [`Delivery`] and is
    /// solely responsible for acknowledging.
    ///
    /// # Errors
    ///
    /// See [`RegistrationError`].
    pub fn subscribe_explicit<T, F>(&self, subject: &str, handler: F) -> Result<(), RegistrationError>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: Fn(Delivery<T>) -> HandlerFuture + Send + Sync + 'static,
    {
        self.register(SubscriberBinding::explicit::<T, F>(subject, handler))
            .map(|_| ())
    }

    /// Registers a prebuilt binding, e.g. one for an opaque payload type.
    ///
    /// # Errors
    ///
    /// See [`RegistrationError`].
    pub fn register(
        &self,
        binding: SubscriberBinding,
    ) -> Result<Arc<SubscriberBinding>, RegistrationError> {
        if self.0.cancellation_token.is_cancelled() {
            return Err(RegistrationError::ShutDown);
        }
        self.0.bindings.register(binding, &self.0.codec)
    }

    /// Registered subject patterns, sorted.
    #[must_use]
    pub fn subjects(&self) -> Vec<String> {
        self.0.bindings.subjects()
    }

    /// A dispatch engine over this runtime's bindings and codec, for callers
    /// that drive their own workers.
    #[must_use]
    pub fn engine(&self, transport: Arc<dyn Transport>) -> DispatchEngine {
        let engine = DispatchEngine::new(
            Arc::clone(&self.0.bindings),
            Arc::clone(&self.0.codec),
            transport,
        )
        .with_logging(self.0.config.logging.clone())
        .with_stats(Arc::clone(&self.0.stats));
        match &self.0.hook {
            Some(hook) => engine.with_hook(Arc::clone(hook)),
            None => engine,
        }
    }

    /// A publisher over this runtime's codec.
    #[must_use]
    pub fn publisher(&self, transport: Arc<dyn Transport>) -> Publisher {
        Publisher::new(
            Arc::clone(&self.0.codec),
            transport,
            self.0.config.publish.default_source.clone(),
        )
    }

    /// Starts `dispatch.max_in_flight` workers receiving from `transport`.
    ///
    /// Returns as soon as the workers are spawned. Workers stop on
    /// [`shutdown`](Self::shutdown) or when the transport reports it is closed.
    /// Returns the number of workers started, which is zero after shutdown.
    #[instrument(skip(self, transport))]
    pub async fn run(&self, transport: Arc<dyn Transport>) -> usize {
        if self.0.cancellation_token.is_cancelled() {
            warn!("Runtime has been shut down; not starting workers");
            return 0;
        }
        if self.0.bindings.is_empty() {
            warn!("Starting workers with no subscribers registered; every message will be naked");
        }

        let workers = self.0.config.dispatch.max_in_flight.max(1);
        let retry_delay = self.0.config.receive_retry_delay();
        let engine = self.engine(Arc::clone(&transport));
        for worker in 0..workers {
            self.0.tracker.spawn(worker_loop(
                worker,
                engine.clone(),
                Arc::clone(&transport),
                self.0.cancellation_token.child_token(),
                retry_delay,
            ));
        }
        info!(workers, subjects = ?self.0.bindings.subjects(), "Dispatch workers started");
        workers
    }

    /// Stops the workers, tears down the codec and waits for in-flight
    /// dispatches.
    ///
    /// Messages dispatched after this point, through any engine of this
    /// runtime, are naked without being decoded. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if workers are still running after
    /// `dispatch.shutdown_timeout_ms`.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        trace!("Shutting down courier runtime");
        self.0.cancellation_token.cancel();
        if self.0.codec.tear_down() {
            debug!("Payload codec torn down");
        }
        self.0.tracker.close();

        let timeout = self.0.config.shutdown_timeout();
        if tokio::time::timeout(timeout, self.0.tracker.wait()).await.is_err() {
            error!(
                "Shutdown timeout expired after {} ms with {} workers still running",
                timeout.as_millis(),
                self.0.tracker.len()
            );
            return Err(anyhow::anyhow!(
                "Timeout while waiting for dispatch workers to stop after {} ms",
                timeout.as_millis()
            ));
        }
        trace!("Courier runtime shutdown complete");
        Ok(())
    }

    /// `true` once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.0.cancellation_token.is_cancelled()
    }

    /// Current dispatch statistics.
    #[must_use]
    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.0.stats.snapshot()
    }

    /// The configuration the runtime was launched with.
    #[must_use]
    pub fn config(&self) -> &CourierConfig {
        &self.0.config
    }
}

async fn worker_loop(
    worker: usize,
    engine: DispatchEngine,
    transport: Arc<dyn Transport>,
    token: CancellationToken,
    retry_delay: Duration,
) {
    trace!(worker, "Dispatch worker started");
    loop {
        let received = tokio::select! {
            biased;
            () = token.cancelled() => break,
            received = transport.receive() => received,
        };
        match received {
            Ok(Some(message)) => {
                engine.dispatch(message).await;
            }
            Ok(None) => {
                debug!(worker, "Transport closed; worker stopping");
                break;
            }
            Err(e) => {
                warn!(worker, "Failed to receive from transport: {}", e);
                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(retry_delay) => {}
                }
            }
        }
    }
    trace!(worker, "Dispatch worker stopped");
}
