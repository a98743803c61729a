// src/mainloop/debounce.rs
use std::time::{Duration, Instant};

/// One-shot timer that is cancelled and re-armed on every `schedule`.
///
/// The main loop polls it with the current instant; the payload is handed out
/// exactly once, and only for the most recent `schedule` call.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, now: Instant, payload: T) {
        self.pending = Some((now + self.delay, payload));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// When the pending payload falls due; the main loop sleeps until then.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((at, _)) if now >= *at => self.pending.take().map(|(_, payload)| payload),
            _ => None,
        }
    }
}
