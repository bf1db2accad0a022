// src/live/subscribers.rs
//! Live event fanout. Sinks are registered, unregistered and broadcast to under one mutex; a
//! sink that fails a delivery is pruned in the same critical section.

use metrics::counter;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::error::PipelineError;
use crate::live::LiveEvent;

/// Per-connection outbound buffer.
pub const SINK_BUFFER: usize = 64;

/// Non-blocking delivery target for live events.
pub trait LiveSink: Send + Sync {
    /// Hand the event over without waiting. An error means the sink is gone or stuck.
    fn deliver(&self, event: &LiveEvent) -> anyhow::Result<()>;
}

/// Sink backed by a bounded channel; the receiving half lives in the WebSocket task.
pub struct ChannelSink {
    tx: mpsc::Sender<LiveEvent>,
    // dropped together with the sink, which wakes the paired `oneshot::Receiver`
    _alive: Option<oneshot::Sender<()>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<LiveEvent>) -> Self {
        Self { tx, _alive: None }
    }

    /// Another sender into the same channel (direct replies to one subscriber).
    pub fn clone_sender(&self) -> mpsc::Sender<LiveEvent> {
        self.tx.clone()
    }

    /// Sink plus the receiver it feeds.
    pub fn pair(buffer: usize) -> (Self, mpsc::Receiver<LiveEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    /// Like [`ChannelSink::pair`], plus a signal that resolves once the registry drops the
    /// sink (pruned or unregistered). Reply senders keep the event channel open, so the
    /// connection task watches this instead.
    pub fn watched(
        buffer: usize,
    ) -> (Self, mpsc::Receiver<LiveEvent>, oneshot::Receiver<()>) {
        let (mut sink, rx) = Self::pair(buffer);
        let (alive, gone) = oneshot::channel();
        sink._alive = Some(alive);
        (sink, rx, gone)
    }
}

impl LiveSink for ChannelSink {
    fn deliver(&self, event: &LiveEvent) -> anyhow::Result<()> {
        self.tx
            .try_send(event.clone())
            .map_err(|e| anyhow::anyhow!("channel sink: {e}"))
    }
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    sinks: Vec<(u64, Box<dyn LiveSink>)>,
}

#[derive(Default)]
pub struct SubscriberRegistry {
    inner: Mutex<Inner>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, sink: Box<dyn LiveSink>) -> u64 {
        let mut inner = self.inner.lock().expect("subscriber mutex poisoned");
        inner.next_id += 1;
        let id = inner.next_id;
        inner.sinks.push((id, sink));
        tracing::info!(target: "live", subscriber = id, total = inner.sinks.len(), "subscriber added");
        id
    }

    pub fn unregister(&self, id: u64) -> bool {
        let mut inner = self.inner.lock().expect("subscriber mutex poisoned");
        let before = inner.sinks.len();
        inner.sinks.retain(|(sid, _)| *sid != id);
        let removed = inner.sinks.len() != before;
        if removed {
            tracing::info!(target: "live", subscriber = id, total = inner.sinks.len(), "subscriber removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("subscriber mutex poisoned").sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver to every sink, pruning those that fail. Returns the number of successful deliveries.
    pub fn broadcast(&self, event: &LiveEvent) -> usize {
        let mut inner = self.inner.lock().expect("subscriber mutex poisoned");
        let mut delivered = 0usize;
        inner.sinks.retain(|(id, sink)| match sink.deliver(event) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(e) => {
                let err = PipelineError::SubscriberUnreachable(*id);
                tracing::debug!(target: "live", error = %err, cause = %e, "pruning subscriber");
                counter!("live_subscribers_pruned_total").increment(1);
                false
            }
        });
        delivered
    }
}
