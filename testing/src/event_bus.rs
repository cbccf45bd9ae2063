//! In-memory event bus for fast, deterministic tests.
//!
//! Mirrors the delivery model of the production bus:
//! - Payloads go to every live subscriber of the exact subject
//! - Payloads published with no subscriber are dropped
//! - Each publish "opens" and "closes" a connection, tracked by counters
//!
//! It also lets tests break things on purpose: make the broker unreachable,
//! fail the next publishes, or push a transport error into live streams.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use product_launch_core::event_bus::{EventBus, EventBusError, PayloadStream, validate_subject};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type Delivery = Result<Vec<u8>, EventBusError>;

/// A simulated broker connection. Counted open until dropped.
#[derive(Debug)]
struct ConnectionGuard {
    open: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    fn open(opened: &AtomicUsize, open: &Arc<AtomicUsize>) -> Self {
        opened.fetch_add(1, Ordering::SeqCst);
        open.fetch_add(1, Ordering::SeqCst);
        Self {
            open: Arc::clone(open),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct Inner {
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Delivery>>>>,
    published: Mutex<Vec<(String, Vec<u8>)>>,
    reachable: AtomicBool,
    failing_publishes: AtomicUsize,
    connections_opened: AtomicUsize,
    open_connections: Arc<AtomicUsize>,
}

/// In-memory [`EventBus`].
///
/// Cloning shares the same broker.
///
/// # Example
///
/// ```
/// use product_launch_testing::InMemoryEventBus;
/// use product_launch_core::event_bus::EventBus;
/// use futures::StreamExt;
///
/// # tokio_test::block_on(async {
/// let bus = InMemoryEventBus::new();
/// let mut stream = bus.subscribe("events.test").await.unwrap();
///
/// bus.publish("events.test", b"hello").await.unwrap();
///
/// assert_eq!(stream.next().await.unwrap().unwrap(), b"hello");
/// assert_eq!(bus.open_connections(), 1); // the subscription
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryEventBus {
    inner: Arc<Inner>,
}

impl InMemoryEventBus {
    /// Create a reachable bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                subscribers: Mutex::new(HashMap::new()),
                published: Mutex::new(Vec::new()),
                reachable: AtomicBool::new(true),
                failing_publishes: AtomicUsize::new(0),
                connections_opened: AtomicUsize::new(0),
                open_connections: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    /// Make the broker reachable or unreachable.
    ///
    /// While unreachable, `publish` and `subscribe` fail with
    /// [`EventBusError::ConnectionFailed`] without opening a connection.
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Fail the next `n` publishes with [`EventBusError::PublishFailed`]
    /// after the connection has been opened.
    pub fn fail_next_publishes(&self, n: usize) {
        self.inner.failing_publishes.store(n, Ordering::SeqCst);
    }

    /// Push a transport error into every live stream for `subject`.
    pub fn inject_transport_error(&self, subject: &str, reason: &str) {
        self.deliver(
            subject,
            &Err(EventBusError::TransportError(reason.to_string())),
        );
    }

    /// End every live subscription stream.
    pub fn close(&self) {
        self.inner.subscribers.lock().unwrap().clear();
    }

    /// Every successfully published `(subject, payload)`, in order.
    #[must_use]
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.inner.published.lock().unwrap().clone()
    }

    /// Number of live subscriptions on `subject`.
    #[must_use]
    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .get(subject)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }

    /// Connections opened so far, including closed ones.
    #[must_use]
    pub fn connections_opened(&self) -> usize {
        self.inner.connections_opened.load(Ordering::SeqCst)
    }

    /// Connections currently open.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.inner.open_connections.load(Ordering::SeqCst)
    }

    fn connect(&self) -> Result<ConnectionGuard, EventBusError> {
        if !self.inner.reachable.load(Ordering::SeqCst) {
            return Err(EventBusError::ConnectionFailed(
                "in-memory broker is unreachable".to_string(),
            ));
        }
        Ok(ConnectionGuard::open(
            &self.inner.connections_opened,
            &self.inner.open_connections,
        ))
    }

    fn deliver(&self, subject: &str, delivery: &Delivery) {
        let mut subscribers = self.inner.subscribers.lock().unwrap();
        if let Some(senders) = subscribers.get_mut(subject) {
            senders.retain(|tx| tx.send(delivery.clone()).is_ok());
        }
    }

    fn take_publish_failure(&self) -> bool {
        self.inner
            .failing_publishes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        subject: &str,
        payload: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let subject = subject.to_string();
        let payload = payload.to_vec();

        Box::pin(async move {
            validate_subject(&subject)?;
            let _connection = self.connect()?;

            if self.take_publish_failure() {
                return Err(EventBusError::PublishFailed {
                    subject,
                    reason: "injected publish failure".to_string(),
                });
            }

            self.deliver(&subject, &Ok(payload.clone()));
            self.inner.published.lock().unwrap().push((subject, payload));
            Ok(())
        })
    }

    fn subscribe(
        &self,
        subject: &str,
    ) -> Pin<Box<dyn Future<Output = Result<PayloadStream, EventBusError>> + Send + '_>> {
        let subject = subject.to_string();

        Box::pin(async move {
            validate_subject(&subject)?;
            let connection = self.connect()?;

            let (tx, mut rx) = mpsc::unbounded_channel();
            self.inner
                .subscribers
                .lock()
                .unwrap()
                .entry(subject)
                .or_default()
                .push(tx);

            let stream = async_stream::stream! {
                let _connection = connection;
                while let Some(delivery) = rx.recv().await {
                    yield delivery;
                }
            };

            Ok(Box::pin(stream) as PayloadStream)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let bus = InMemoryEventBus::new();
        bus.publish("events.test", b"lost").await.unwrap();

        let mut stream = bus.subscribe("events.test").await.unwrap();
        bus.close();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn subjects_are_matched_exactly() {
        let bus = InMemoryEventBus::new();
        let mut other = bus.subscribe("events.other").await.unwrap();

        bus.publish("events.test", b"x").await.unwrap();
        bus.close();

        assert!(other.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_a_stream_closes_its_connection() {
        let bus = InMemoryEventBus::new();
        let stream = bus.subscribe("events.test").await.unwrap();
        assert_eq!(bus.open_connections(), 1);
        assert_eq!(bus.subscriber_count("events.test"), 1);

        drop(stream);

        assert_eq!(bus.open_connections(), 0);
        assert_eq!(bus.subscriber_count("events.test"), 0);
    }

    #[tokio::test]
    async fn injected_publish_failures_are_consumed() {
        let bus = InMemoryEventBus::new();
        bus.fail_next_publishes(1);

        assert!(bus.publish("events.test", b"1").await.is_err());
        assert!(bus.publish("events.test", b"2").await.is_ok());
        assert_eq!(bus.published().len(), 1);
    }
}
