//! Live event delivery to one subscriber
//!
//! Producers push [`Event`]s through an [`EventSender`]. A streamer task owns
//! the [`Coalescer`] and writes JSON frames to the subscriber sink in
//! generation order, holding back `progress` events for the coalescing
//! window.

mod coalesce;
mod events;

pub use coalesce::Coalescer;
pub use events::{DoneData, Event, IssueData, PageError};

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Handle producers use to emit events
///
/// Sending never fails: once the streamer is gone, events are dropped.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSender {
    pub fn send(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event stream closed, dropping event");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Starts a streamer writing JSON frames into `sink`
///
/// The task ends once every [`EventSender`] is dropped, after flushing any
/// pending progress event.
pub fn spawn_streamer(
    window: Duration,
    sink: mpsc::UnboundedSender<String>,
) -> (EventSender, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_streamer(rx, sink, window));
    (EventSender { tx }, handle)
}

async fn run_streamer(
    mut rx: mpsc::UnboundedReceiver<Event>,
    sink: mpsc::UnboundedSender<String>,
    window: Duration,
) {
    let mut coalescer = Coalescer::new(window);

    loop {
        let deadline = coalescer.deadline();
        // Only polled when a deadline exists
        let timer = sleep_until(deadline.unwrap_or_else(|| Instant::now() + window));

        tokio::select! {
            received = rx.recv() => match received {
                Some(event) => {
                    for ready in coalescer.push(event, Instant::now()) {
                        deliver(&sink, &ready);
                    }
                }
                None => {
                    if let Some(pending) = coalescer.flush() {
                        deliver(&sink, &pending);
                    }
                    break;
                }
            },
            _ = timer, if deadline.is_some() => {
                if let Some(pending) = coalescer.poll_expired(Instant::now()) {
                    deliver(&sink, &pending);
                }
            }
        }
    }

    tracing::trace!("Event streamer stopped");
}

fn deliver(sink: &mpsc::UnboundedSender<String>, event: &Event) {
    match event.to_json() {
        Ok(frame) => {
            if sink.send(frame).is_err() {
                tracing::trace!("Subscriber gone, dropping {} event", event.kind());
            }
        }
        Err(e) => tracing::warn!("Failed to serialize {} event: {}", event.kind(), e),
    }
}
