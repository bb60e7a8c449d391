//! Last-value buffer for progress events
//!
//! The first buffered progress event opens a window; later progress events
//! replace it without moving the deadline. Any other event flushes the
//! buffer first so the subscriber sees events in generation order.

use crate::stream::Event;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Coalescer {
    window: Duration,
    pending: Option<Event>,
    deadline: Option<Instant>,
}

impl Coalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
        }
    }

    /// Accepts an event and returns what must be sent immediately
    pub fn push(&mut self, event: Event, now: Instant) -> Vec<Event> {
        if event.is_progress() {
            if self.deadline.is_none() {
                self.deadline = Some(now + self.window);
            }
            self.pending = Some(event);
            return Vec::new();
        }

        let mut out = Vec::with_capacity(2);
        out.extend(self.flush());
        out.push(event);
        out
    }

    /// When the pending progress event is due, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Releases the pending event once its window has closed
    pub fn poll_expired(&mut self, now: Instant) -> Option<Event> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => None,
        }
    }

    /// Releases the pending event regardless of the window
    pub fn flush(&mut self) -> Option<Event> {
        self.deadline = None;
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
