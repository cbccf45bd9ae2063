//! Integration tests for [`NatsEventBus`] against a real NATS server.
//!
//! # Running These Tests
//!
//! These tests are marked as `#[ignore]` by default because they need a
//! running NATS server:
//!
//! ```bash
//! docker run --rm -p 4222:4222 nats:2
//! NATS_URL=nats://localhost:4222 cargo test -p product-launch-nats --test integration_tests -- --ignored
//! ```

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use futures::StreamExt;
use product_launch_core::codec;
use product_launch_core::event_bus::EventBus;
use product_launch_core::events::ProspectSignedUpEvent;
use product_launch_core::message::Message;
use product_launch_core::prospect::{Country, Prospect, ProspectId, Role};
use product_launch_core::publisher::MessagePublisher;
use product_launch_core::Utc;
use product_launch_nats::NatsEventBus;
use std::sync::Arc;
use std::time::Duration;

fn nats_url() -> String {
    std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string())
}

fn signed_up(id: u64, email: &str) -> ProspectSignedUpEvent {
    ProspectSignedUpEvent::new(
        Prospect {
            prospect_id: ProspectId::from(id),
            first_name: "A".to_string(),
            last_name: "Prospect".to_string(),
            company_name: "Docker, Inc.".to_string(),
            email_address: email.to_string(),
            role: Role::new("DM", "Decision Maker"),
            country: Country::new("GBR", "United Kingdom"),
        },
        Utc::now(),
    )
}

#[tokio::test]
#[ignore = "requires a running NATS server"]
async fn publish_subscribe_round_trip() {
    let bus = NatsEventBus::new(nats_url());
    let mut stream = bus
        .subscribe(ProspectSignedUpEvent::SUBJECT)
        .await
        .expect("subscribe");

    let event = signed_up(42, "a@b.com");
    MessagePublisher::new(Arc::new(bus.clone()))
        .publish(&event)
        .await
        .expect("publish");

    let payload = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for payload")
        .expect("stream ended")
        .expect("transport error");

    let decoded: ProspectSignedUpEvent = codec::decode(&payload).unwrap();
    assert_eq!(decoded, event);
}

#[tokio::test]
#[ignore = "requires a running NATS server"]
async fn every_subscriber_gets_a_copy() {
    let bus = NatsEventBus::new(nats_url());
    let subject = "events.test.fanout";

    let mut first = bus.subscribe(subject).await.expect("subscribe");
    let mut second = bus.subscribe(subject).await.expect("subscribe");

    bus.publish(subject, b"hello").await.expect("publish");

    for stream in [&mut first, &mut second] {
        let payload = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out")
            .expect("stream ended")
            .expect("transport error");
        assert_eq!(payload, b"hello");
    }
}

#[tokio::test]
#[ignore = "requires a running NATS server"]
async fn payload_published_before_subscribing_is_lost() {
    let bus = NatsEventBus::new(nats_url());
    let subject = "events.test.late";

    bus.publish(subject, b"early").await.expect("publish");

    let mut stream = bus.subscribe(subject).await.expect("subscribe");
    let next = tokio::time::timeout(Duration::from_millis(500), stream.next()).await;

    assert!(next.is_err(), "late subscriber must not see earlier payloads");
}
