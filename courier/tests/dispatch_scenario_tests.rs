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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use courier::dispatch::DispatchState;
use courier::message::{HEADER_ID, HEADER_SPECVERSION, HEADER_TYPE};
use courier::prelude::*;

use crate::setup::payloads::{envelope_headers, inbound, order_message, OrderData};
use crate::setup::capture_logs;

mod setup;

fn runtime() -> CourierRuntime {
    CourierApp::launch_with(CourierSettings::default().with_config(CourierConfig::default()))
}

fn runtime_with(config: CourierConfig) -> CourierRuntime {
    CourierApp::launch_with(CourierSettings::default().with_config(config))
}

fn recording_handler(
    received: &Arc<Mutex<Vec<OrderData>>>,
) -> impl Fn(OrderData) -> HandlerFuture + Send + Sync + 'static {
    let received = Arc::clone(received);
    move |order| {
        received.lock().unwrap().push(order);
        Box::pin(async { Ok(()) })
    }
}

#[tokio::test]
async fn valid_message_is_handled_once_and_acked() -> anyhow::Result<()> {
    let runtime = runtime();
    let received = Arc::new(Mutex::new(Vec::new()));
    runtime.subscribe::<OrderData, _>("orders.created", recording_handler(&received))?;
    let transport = Arc::new(MemoryTransport::with_capacity(8));
    let engine = runtime.engine(transport.clone());

    let order = OrderData::new("o-1", 3);
    let outcome = engine.dispatch(order_message("orders.created", &order, 1)).await;

    assert_eq!(outcome.resolution(), Resolution::Acked);
    assert!(outcome.error().is_none());
    assert_eq!(*received.lock().unwrap(), vec![order]);
    assert_eq!(transport.decisions(1), vec![AckDecision::Ack]);
    Ok(())
}

#[tokio::test]
async fn missing_id_is_naked_and_logged_by_name() -> anyhow::Result<()> {
    let (logs, _guard) = capture_logs();
    let runtime = runtime();
    let received = Arc::new(Mutex::new(Vec::new()));
    runtime.subscribe::<OrderData, _>("orders.created", recording_handler(&received))?;
    let transport = Arc::new(MemoryTransport::with_capacity(8));
    let engine = runtime.engine(transport.clone());

    let mut headers = envelope_headers("order.created", "evt-1");
    headers.remove(HEADER_ID);
    let message = inbound("orders.created", headers, OrderData::new("o-1", 1).to_json(), 1);
    let outcome = engine.dispatch(message).await;

    assert_eq!(outcome.resolution(), Resolution::Naked);
    assert!(matches!(
        outcome.error(),
        Some(DispatchError::Envelope(e)) if e.attribute() == "ce-id"
    ));
    assert!(received.lock().unwrap().is_empty());
    assert_eq!(transport.decisions(1), vec![AckDecision::Nak(None)]);
    assert!(logs.errors().iter().any(|line| line.contains("ce-id")));
    Ok(())
}

#[tokio::test]
async fn each_missing_attribute_is_the_one_reported() -> anyhow::Result<()> {
    let runtime = runtime();
    runtime.subscribe::<OrderData, _>("orders.created", |_| Box::pin(async { Ok(()) }))?;
    let transport = Arc::new(MemoryTransport::with_capacity(8));
    let engine = runtime.engine(transport.clone());

    for (seq, attribute) in ["ce-specversion", "ce-type", "ce-source", "ce-id"]
        .into_iter()
        .enumerate()
    {
        let mut headers = envelope_headers("order.created", "evt");
        headers.remove(attribute);
        headers.insert("traceparent".to_string(), "00-abc-def-01".to_string());
        let outcome = engine
            .dispatch(inbound("orders.created", headers, b"{}".to_vec(), seq as u64 + 1))
            .await;
        match outcome.error() {
            Some(DispatchError::Envelope(e)) => assert_eq!(e.attribute(), attribute),
            other => panic!("expected envelope error for {attribute}, got {other:?}"),
        }
    }

    let mut headers = envelope_headers("order.created", "evt");
    headers.insert(HEADER_SPECVERSION.to_string(), "0.3".to_string());
    headers.remove(HEADER_TYPE);
    let outcome = engine
        .dispatch(inbound("orders.created", headers, b"{}".to_vec(), 10))
        .await;
    assert!(matches!(
        outcome.error(),
        Some(DispatchError::Envelope(e)) if e.attribute() == "ce-specversion"
    ));
    Ok(())
}

#[tokio::test]
async fn unparseable_payload_is_naked_with_type_and_preview() -> anyhow::Result<()> {
    let (logs, _guard) = capture_logs();
    let runtime = runtime();
    let received = Arc::new(Mutex::new(Vec::new()));
    runtime.subscribe::<OrderData, _>("orders.created", recording_handler(&received))?;
    let transport = Arc::new(MemoryTransport::with_capacity(8));
    let engine = runtime.engine(transport.clone());

    let body = format!("{{\"order_id\": 42, \"padding\": \"{}\"}}", "x".repeat(1000));
    let message = inbound(
        "orders.created",
        envelope_headers("order.created", "evt-1"),
        body.into_bytes(),
        1,
    );
    let outcome = engine.dispatch(message).await;

    assert_eq!(outcome.resolution(), Resolution::Naked);
    assert!(matches!(outcome.error(), Some(DispatchError::Deserialization(_))));
    assert!(!outcome.handler_invoked());
    assert!(received.lock().unwrap().is_empty());
    assert_eq!(transport.decisions(1), vec![AckDecision::Nak(None)]);

    let errors = logs.errors();
    let line = errors
        .iter()
        .find(|line| line.contains("Failed to deserialize payload"))
        .expect("decode failure logged");
    assert!(line.contains("OrderData"));
    assert!(line.contains("{\"order_id\": 42"));
    assert!(line.contains("bytes total"));
    assert!(!line.contains(&"x".repeat(600)));
    Ok(())
}

#[tokio::test]
async fn payload_logging_can_be_disabled() -> anyhow::Result<()> {
    let (logs, _guard) = capture_logs();
    let mut config = CourierConfig::default();
    config.logging.log_payloads_on_error = false;
    let runtime = runtime_with(config);
    runtime.subscribe::<OrderData, _>("orders.created", |_| Box::pin(async { Ok(()) }))?;
    let transport = Arc::new(MemoryTransport::with_capacity(8));
    let engine = runtime.engine(transport.clone());

    let message = inbound(
        "orders.created",
        envelope_headers("order.created", "evt-1"),
        b"secret-not-json".to_vec(),
        1,
    );
    engine.dispatch(message).await;

    let contents = logs.contents();
    assert!(contents.contains("<payload logging disabled>"));
    assert!(!contents.contains("secret-not-json"));
    Ok(())
}

#[tokio::test]
async fn explicit_nak_then_error_sends_only_the_handlers_nak() -> anyhow::Result<()> {
    let (logs, _guard) = capture_logs();
    let runtime = runtime();
    runtime.subscribe_explicit::<OrderData, _>("orders.created", |delivery| {
        Box::pin(async move {
            delivery.nak(Some(Duration::from_secs(5))).await?;
            Err::<(), _>(HandlerError::from("inventory service unavailable"))
        })
    })?;
    let transport = Arc::new(MemoryTransport::with_capacity(8));
    let engine = runtime.engine(transport.clone());

    let outcome = engine
        .dispatch(order_message("orders.created", &OrderData::new("o-1", 1), 1))
        .await;

    assert_eq!(outcome.resolution(), Resolution::HandedToHandler);
    assert!(matches!(outcome.error(), Some(DispatchError::Handler { .. })));
    assert_eq!(
        transport.decisions(1),
        vec![AckDecision::Nak(Some(Duration::from_secs(5)))]
    );
    assert!(logs
        .errors()
        .iter()
        .any(|line| line.contains("inventory service unavailable")));
    Ok(())
}

#[tokio::test]
async fn auto_ack_off_success_takes_no_action() -> anyhow::Result<()> {
    let runtime = runtime();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    runtime.subscribe_with::<OrderData, _>(
        "orders.created",
        SubscribeOptions { auto_ack: false },
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        },
    )?;
    let transport = Arc::new(MemoryTransport::with_capacity(8));
    let engine = runtime.engine(transport.clone());

    let outcome = engine
        .dispatch(order_message("orders.created", &OrderData::new("o-1", 1), 1))
        .await;

    assert_eq!(outcome.resolution(), Resolution::NoAction);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(transport.decisions(1).is_empty());
    Ok(())
}

#[tokio::test]
async fn auto_ack_off_failure_still_naks() -> anyhow::Result<()> {
    let runtime = runtime();
    runtime.subscribe_with::<OrderData, _>(
        "orders.created",
        SubscribeOptions { auto_ack: false },
        |_| Box::pin(async { Err::<(), _>(HandlerError::from("rejected")) }),
    )?;
    let transport = Arc::new(MemoryTransport::with_capacity(8));
    let engine = runtime.engine(transport.clone());

    let outcome = engine
        .dispatch(order_message("orders.created", &OrderData::new("o-1", 1), 1))
        .await;

    assert_eq!(outcome.resolution(), Resolution::Naked);
    assert_eq!(transport.decisions(1), vec![AckDecision::Nak(None)]);
    Ok(())
}

#[tokio::test]
async fn message_after_shutdown_is_naked_without_decoding() -> anyhow::Result<()> {
    let (logs, _guard) = capture_logs();
    let runtime = runtime();
    let received = Arc::new(Mutex::new(Vec::new()));
    runtime.subscribe::<OrderData, _>("orders.created", recording_handler(&received))?;
    let transport = Arc::new(MemoryTransport::with_capacity(8));
    let engine = runtime.engine(transport.clone());

    runtime.shutdown().await?;
    let outcome = engine
        .dispatch(order_message("orders.created", &OrderData::new("o-1", 1), 1))
        .await;

    assert_eq!(outcome.resolution(), Resolution::Naked);
    assert_eq!(outcome.error(), Some(&DispatchError::PostShutdown));
    assert_eq!(outcome.last_state(), DispatchState::Received);
    assert!(received.lock().unwrap().is_empty());
    assert_eq!(transport.decisions(1), vec![AckDecision::Nak(None)]);
    assert!(logs.errors().iter().any(|line| line.contains("after shutdown")));
    assert_eq!(runtime.stats().post_shutdown, 1);
    Ok(())
}

#[tokio::test]
async fn engine_issues_exactly_one_action_per_automatic_message() -> anyhow::Result<()> {
    let runtime = runtime();
    runtime.subscribe::<OrderData, _>("orders.ok", |_| Box::pin(async { Ok(()) }))?;
    runtime.subscribe::<OrderData, _>("orders.fail", |_| Box::pin(async { Err::<(), _>(HandlerError::from("no")) }))?;
    runtime.subscribe_explicit::<OrderData, _>("orders.explicit.ok", |_| Box::pin(async { Ok(()) }))?;
    runtime.subscribe_explicit::<OrderData, _>("orders.explicit.fail", |_| {
        Box::pin(async { Err::<(), _>(HandlerError::from("no")) })
    })?;
    let transport = Arc::new(MemoryTransport::with_capacity(8));
    let engine = runtime.engine(transport.clone());
    let order = OrderData::default();

    for (seq, subject) in ["orders.ok", "orders.fail", "orders.explicit.ok", "orders.explicit.fail"]
        .into_iter()
        .enumerate()
    {
        engine.dispatch(order_message(subject, &order, seq as u64 + 1)).await;
    }

    assert_eq!(transport.decisions(1), vec![AckDecision::Ack]);
    assert_eq!(transport.decisions(2), vec![AckDecision::Nak(None)]);
    assert!(transport.decisions(3).is_empty());
    assert!(transport.decisions(4).is_empty());

    let stats = runtime.stats();
    assert_eq!(stats.received, 4);
    assert_eq!(stats.acked, 1);
    assert_eq!(stats.naked, 1);
    assert_eq!(stats.handed_to_handler, 2);
    assert_eq!(stats.handler_errors, 2);
    Ok(())
}

#[tokio::test]
async fn wildcard_binding_receives_matching_subjects() -> anyhow::Result<()> {
    let runtime = runtime();
    let received = Arc::new(Mutex::new(Vec::new()));
    runtime.subscribe::<OrderData, _>("orders.>", recording_handler(&received))?;
    let transport = Arc::new(MemoryTransport::with_capacity(8));
    let engine = runtime.engine(transport.clone());

    let outcome = engine
        .dispatch(order_message("orders.created.eu", &OrderData::new("o-9", 9), 1))
        .await;

    assert_eq!(outcome.resolution(), Resolution::Acked);
    assert_eq!(received.lock().unwrap()[0].order_id, "o-9");
    Ok(())
}

#[derive(Default)]
struct RecordingHook {
    events: Mutex<Vec<String>>,
}

impl DispatchHook for RecordingHook {
    fn on_received(&self, message: &InboundMessage) {
        self.events
            .lock()
            .unwrap()
            .push(format!("received {}", message.subject()));
    }

    fn on_resolved(&self, message: &InboundMessage, outcome: &DispatchOutcome) {
        self.events
            .lock()
            .unwrap()
            .push(format!("resolved {} {}", message.subject(), outcome.resolution()));
    }
}

#[tokio::test]
async fn hook_sees_every_message_lifecycle() -> anyhow::Result<()> {
    let hook = Arc::new(RecordingHook::default());
    let runtime = CourierApp::launch_with(
        CourierSettings::default()
            .with_config(CourierConfig::default())
            .with_hook(hook.clone()),
    );
    runtime.subscribe::<OrderData, _>("orders.created", |_| Box::pin(async { Ok(()) }))?;
    let engine = runtime.engine(Arc::new(MemoryTransport::with_capacity(8)));

    engine
        .dispatch(order_message("orders.created", &OrderData::default(), 1))
        .await;
    engine
        .dispatch(inbound("orders.created", Default::default(), Vec::new(), 2))
        .await;

    assert_eq!(
        *hook.events.lock().unwrap(),
        vec![
            "received orders.created".to_string(),
            "resolved orders.created acked".to_string(),
            "received orders.created".to_string(),
            "resolved orders.created naked".to_string(),
        ]
    );
    Ok(())
}

