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

//! Order Events Example
//!
//! Publishes a handful of order events over the in-memory transport and
//! handles them with one automatic and one explicit subscriber.
//!
//! # Features
//!
//! - **Automatic acknowledgment**: `orders.created` is acked when the handler returns `Ok`
//! - **Explicit acknowledgment**: `orders.cancelled` decides per message whether to ack or term
//! - **Redelivery**: a failing handler is naked and the transport delivers the message again
//!
//! # Running This Example
//!
//! ```bash
//! cargo run --example order_events
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use courier::prelude::*;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Payload Definitions
// ============================================================================

/// A newly placed order.
#[courier_payload]
struct OrderCreated {
    order_id: String,
    quantity: u32,
}

/// A cancellation request. Cancellations without a reason are discarded.
#[courier_payload(camel_case)]
struct OrderCancelled {
    order_id: String,
    reason: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = CourierApp::launch();

    // The first attempt fails so the redelivery path is visible in the output.
    let failed_once = Arc::new(AtomicBool::new(false));
    runtime.subscribe::<OrderCreated, _>("orders.created", move |order| {
        let failed_once = Arc::clone(&failed_once);
        Box::pin(async move {
            if !failed_once.swap(true, Ordering::SeqCst) {
                println!("inventory busy, order {} will be redelivered", order.order_id);
                return Err(HandlerError::from("inventory busy"));
            }
            println!("reserved {} item(s) for order {}", order.quantity, order.order_id);
            Ok(())
        })
    })?;

    runtime.subscribe_explicit::<OrderCancelled, _>("orders.cancelled", |delivery| {
        Box::pin(async move {
            let cancelled = delivery.payload();
            match &cancelled.reason {
                Some(reason) => {
                    println!("cancelled order {}: {reason}", cancelled.order_id);
                    delivery.ack().await?;
                }
                None => {
                    println!("discarding cancellation for {} without a reason", cancelled.order_id);
                    delivery.term().await?;
                }
            }
            Ok::<(), HandlerError>(())
        })
    })?;

    let transport = Arc::new(MemoryTransport::new().with_redelivery(3));
    runtime.run(transport.clone()).await;

    let publisher = runtime.publisher(transport.clone());
    publisher
        .publish(
            "orders.created",
            &OrderCreated {
                order_id: "A-1001".to_string(),
                quantity: 2,
            },
            EventAttributes::new("com.example.order.created").with_source("/storefront"),
        )
        .await?;
    for (order_id, reason) in [("A-0990", Some("customer request")), ("A-0991", None)] {
        publisher
            .publish(
                "orders.cancelled",
                &OrderCancelled {
                    order_id: order_id.to_string(),
                    reason: reason.map(str::to_string),
                },
                EventAttributes::new("com.example.order.cancelled").with_source("/storefront"),
            )
            .await?;
    }

    tokio::time::sleep(Duration::from_millis(500)).await;
    runtime.shutdown().await?;

    let stats = runtime.stats();
    println!(
        "received {} message(s): {} acked, {} naked, {} left to handlers",
        stats.received, stats.acked, stats.naked, stats.handed_to_handler
    );
    Ok(())
}
