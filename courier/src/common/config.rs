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

use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Configuration for the courier runtime.
///
/// Loaded from TOML in XDG-compliant directories. Every field has a default,
/// so a file only needs to name the values it changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Worker pool and shutdown settings
    pub dispatch: DispatchConfig,
    /// What the dispatch engine writes to the log on failure
    pub logging: LoggingConfig,
    /// Outbound publish settings
    pub publish: PublishConfig,
    /// In-memory transport settings
    pub memory: MemoryTransportConfig,
}

/// Worker pool and shutdown settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Number of workers receiving and dispatching concurrently
    pub max_in_flight: usize,
    /// Pause after a failed `receive` before trying again, in milliseconds
    pub receive_retry_delay_ms: u64,
    /// How long shutdown waits for in-flight dispatches, in milliseconds
    pub shutdown_timeout_ms: u64,
}

/// Failure logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Include a preview of the raw body when a payload fails to decode
    pub log_payloads_on_error: bool,
    /// Maximum number of body bytes in that preview
    pub payload_preview_bytes: usize,
}

/// Outbound publish settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// `ce-source` used when a publish call does not name one
    pub default_source: String,
}

/// In-memory transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryTransportConfig {
    /// Capacity of the delivery queue
    pub channel_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            receive_retry_delay_ms: 250,
            shutdown_timeout_ms: 10_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_payloads_on_error: true,
            payload_preview_bytes: 500,
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            default_source: "courier".to_string(),
        }
    }
}

impl Default for MemoryTransportConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

impl CourierConfig {
    /// Shutdown wait as a `Duration`
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch.shutdown_timeout_ms)
    }

    /// Receive retry pause as a `Duration`
    #[must_use]
    pub const fn receive_retry_delay(&self) -> Duration {
        Duration::from_millis(self.dispatch.receive_retry_delay_ms)
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `courier/config.toml` under `$XDG_CONFIG_HOME` and then the
    /// XDG config search path. A missing file yields the defaults; an
    /// unreadable or malformed one is logged and also yields the defaults.
    #[must_use]
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix("courier") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        match xdg_dirs.find_config_file("config.toml") {
            Some(path) => Self::load_from_path(&path),
            None => {
                info!("No configuration file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file, falling back to defaults on error
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        info!("Loading configuration from: {}", path.display());
        match std::fs::read_to_string(path) {
            Ok(config_str) => match toml::from_str::<Self>(&config_str) {
                Ok(config) => {
                    info!("Successfully loaded configuration");
                    config
                }
                Err(e) => {
                    error!("Failed to parse configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: CourierConfig = CourierConfig::load();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_remaining_defaults() {
        let config: CourierConfig = toml::from_str(
            r#"
            [logging]
            log_payloads_on_error = false
            "#,
        )
        .expect("valid toml");
        assert!(!config.logging.log_payloads_on_error);
        assert_eq!(config.logging.payload_preview_bytes, 500);
        assert_eq!(config.dispatch, DispatchConfig::default());
    }

    #[test]
    fn durations() {
        let config = CourierConfig::default();
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(10));
        assert_eq!(config.receive_retry_delay(), Duration::from_millis(250));
    }
}
