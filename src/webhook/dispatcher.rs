//! Bounded fan-out of resolved events
//!
//! The pipeline acknowledges each HTTP delivery immediately; resolved
//! envelopes go through a bounded queue to a background loop that runs the
//! user handler, at most `max_concurrency` at a time. Handler outcomes are
//! logged and otherwise dropped: the platform redelivers on its own
//! schedule, and observability of handler failures is the embedding
//! application's concern.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use crate::webhook::event::EventEnvelope;

/// Default queue depth between the HTTP path and the handler loop.
pub const DEFAULT_QUEUE_DEPTH: usize = 1000;
/// Default cap on concurrently running handler invocations.
pub const DEFAULT_MAX_CONCURRENCY: usize = 64;

/// User-supplied callback receiving every resolved event.
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Handle one event. Errors are logged by the dispatch loop and never
    /// reach the HTTP response.
    async fn on_event(&self, event: EventEnvelope) -> anyhow::Result<()>;
}

/// Queue-backed event dispatcher; the sending half lives in the pipeline.
pub struct EventDispatcher {
    tx: mpsc::Sender<EventEnvelope>,
}

/// Receiving half of the dispatcher; run it as a background task.
pub struct DispatcherHandle {
    handler: Arc<dyn EventHandler>,
    rx: mpsc::Receiver<EventEnvelope>,
    permits: Arc<Semaphore>,
}

impl EventDispatcher {
    /// Create a dispatcher with default bounds.
    pub fn new(handler: Arc<dyn EventHandler>) -> (Self, DispatcherHandle) {
        Self::with_bounds(handler, DEFAULT_QUEUE_DEPTH, DEFAULT_MAX_CONCURRENCY)
    }

    /// Create a dispatcher with explicit queue depth and concurrency cap.
    pub fn with_bounds(
        handler: Arc<dyn EventHandler>,
        queue_depth: usize,
        max_concurrency: usize,
    ) -> (Self, DispatcherHandle) {
        let (tx, rx) = mpsc::channel(queue_depth);
        let dispatcher = Self { tx };
        let handle = DispatcherHandle {
            handler,
            rx,
            permits: Arc::new(Semaphore::new(max_concurrency)),
        };
        (dispatcher, handle)
    }

    /// Enqueue an envelope without waiting.
    ///
    /// Fire and forget: a full queue drops the event with a warning rather
    /// than delaying the HTTP acknowledgment.
    pub(crate) fn dispatch(&self, event: EventEnvelope) {
        if let Err(e) = self.tx.try_send(event) {
            warn!(error = %e, "Event queue full, dropping event");
        }
    }
}

impl DispatcherHandle {
    /// Run the dispatch loop.
    ///
    /// Spawn this as a background task:
    ///
    /// ```rust,ignore
    /// tokio::spawn(async move {
    ///     handle.run().await;
    /// });
    /// ```
    pub async fn run(mut self) {
        info!("Event dispatcher started");

        while let Some(event) = self.rx.recv().await {
            let permit = match self.permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let handler = self.handler.clone();

            tokio::spawn(async move {
                let event_id = event.header.event_id.clone();
                let event_type = event.header.event_type.clone();

                if let Err(err) = handler.on_event(event).await {
                    warn!(
                        event_id = %event_id,
                        event_type = %event_type,
                        error = %err,
                        "Event handler failed"
                    );
                }
                drop(permit);
            });
        }

        info!("Event dispatcher shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::event::{EventHeader, EventPayload, SchemaVersion};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct CountingHandler {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl EventHandler for CountingHandler {
        async fn on_event(&self, _event: EventEnvelope) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("simulated handler failure");
            }
            Ok(())
        }
    }

    fn envelope(event_id: &str) -> EventEnvelope {
        EventEnvelope {
            schema: SchemaVersion::V2,
            header: EventHeader {
                event_id: event_id.to_string(),
                token: String::new(),
                create_time: "1603977298000".to_string(),
                event_type: "demo.event".to_string(),
                tenant_key: String::new(),
                app_id: String::new(),
            },
            payload: EventPayload::Unknown(json!({})),
        }
    }

    #[tokio::test]
    async fn test_events_reach_handler() {
        let handler = Arc::new(CountingHandler { calls: AtomicU32::new(0), fail: false });
        let (dispatcher, handle) = EventDispatcher::new(handler.clone());
        let loop_task = tokio::spawn(handle.run());

        dispatcher.dispatch(envelope("e1"));
        dispatcher.dispatch(envelope("e2"));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        loop_task.abort();
    }

    #[tokio::test]
    async fn test_handler_failure_does_not_stop_loop() {
        let handler = Arc::new(CountingHandler { calls: AtomicU32::new(0), fail: true });
        let (dispatcher, handle) = EventDispatcher::new(handler.clone());
        let loop_task = tokio::spawn(handle.run());

        dispatcher.dispatch(envelope("e1"));
        dispatcher.dispatch(envelope("e2"));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        loop_task.abort();
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        let handler = Arc::new(CountingHandler { calls: AtomicU32::new(0), fail: false });
        // Depth 1 and nobody draining: the second dispatch must not block.
        let (dispatcher, _handle) = EventDispatcher::with_bounds(handler, 1, 1);

        dispatcher.dispatch(envelope("e1"));
        dispatcher.dispatch(envelope("e2"));
    }
}
