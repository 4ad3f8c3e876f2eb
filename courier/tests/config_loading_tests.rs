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

use std::io::Write;
use std::time::Duration;

use courier::common::config::{DispatchConfig, LoggingConfig};
use courier::prelude::*;
use tempfile::NamedTempFile;

use crate::setup::capture_logs;

mod setup;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn a_full_file_overrides_every_section() {
    let file = config_file(
        r#"
        [dispatch]
        max_in_flight = 16
        receive_retry_delay_ms = 50
        shutdown_timeout_ms = 1500

        [logging]
        log_payloads_on_error = false
        payload_preview_bytes = 64

        [publish]
        default_source = "/billing"

        [memory]
        channel_capacity = 32
        "#,
    );

    let config = CourierConfig::load_from_path(file.path());
    assert_eq!(config.dispatch.max_in_flight, 16);
    assert_eq!(config.receive_retry_delay(), Duration::from_millis(50));
    assert_eq!(config.shutdown_timeout(), Duration::from_millis(1500));
    assert!(!config.logging.log_payloads_on_error);
    assert_eq!(config.logging.payload_preview_bytes, 64);
    assert_eq!(config.publish.default_source, "/billing");
    assert_eq!(config.memory.channel_capacity, 32);
}

#[test]
fn missing_sections_keep_their_defaults() {
    let file = config_file("[dispatch]\nmax_in_flight = 2\n");

    let config = CourierConfig::load_from_path(file.path());
    assert_eq!(config.dispatch.max_in_flight, 2);
    assert_eq!(config.dispatch.shutdown_timeout_ms, DispatchConfig::default().shutdown_timeout_ms);
    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.publish.default_source, "courier");
}

#[test]
fn malformed_files_fall_back_to_defaults_and_log_an_error() {
    let file = config_file("[dispatch\nmax_in_flight = \"many\"");
    let (logs, _guard) = capture_logs();

    let config = CourierConfig::load_from_path(file.path());
    assert_eq!(config, CourierConfig::default());
    assert!(logs.errors().iter().any(|line| line.contains("Failed to parse configuration file")));
}

#[test]
fn unreadable_paths_fall_back_to_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (logs, _guard) = capture_logs();

    let config = CourierConfig::load_from_path(&dir.path().join("absent.toml"));
    assert_eq!(config, CourierConfig::default());
    assert!(logs.errors().iter().any(|line| line.contains("Failed to read configuration file")));
}

#[tokio::test]
async fn loaded_settings_drive_the_runtime() -> anyhow::Result<()> {
    let file = config_file("[dispatch]\nmax_in_flight = 3\n\n[publish]\ndefault_source = \"/inventory\"\n");
    let config = CourierConfig::load_from_path(file.path());
    let runtime = CourierApp::launch_with(CourierSettings::default().with_config(config));
    runtime.subscribe::<setup::payloads::OrderData, _>("orders.created", |_| Box::pin(async { Ok(()) }))?;

    let transport = std::sync::Arc::new(MemoryTransport::with_capacity(8));
    assert_eq!(runtime.run(transport.clone()).await, 3);
    runtime
        .publisher(transport.clone())
        .publish(
            "orders.created",
            &setup::payloads::OrderData::new("o-1", 1),
            EventAttributes::new("order.created"),
        )
        .await?;

    let published = transport.published();
    assert_eq!(
        published[0].headers.get("ce-source").map(String::as_str),
        Some("/inventory")
    );
    runtime.shutdown().await?;
    Ok(())
}
