// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clock-free debouncer used to coalesce resize bursts.
//!
//! The debouncer owns no timer. Callers pass a monotonic timestamp (any epoch) to
//! [`Debouncer::schedule`] on every signal and to [`Debouncer::poll`] whenever they
//! get a chance; [`Debouncer::deadline`] says when polling becomes useful.
//!
//! ```
//! use core::time::Duration;
//! use understory_viewport::debounce::Debouncer;
//!
//! let mut d = Debouncer::new(Duration::from_millis(100));
//! d.schedule(Duration::from_millis(0));
//! d.schedule(Duration::from_millis(40)); // rescheduled: deadline moves to 140ms
//! assert!(!d.poll(Duration::from_millis(120)));
//! assert!(d.poll(Duration::from_millis(140)));
//! assert!(!d.poll(Duration::from_millis(500))); // fires once per burst
//! ```

use core::time::Duration;

/// Cancel-and-reschedule timer state: the last signal of a burst wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Debouncer {
    settle: Duration,
    deadline: Option<Duration>,
}

impl Debouncer {
    /// Create an idle debouncer with the given quiet period.
    pub const fn new(settle: Duration) -> Self {
        Self {
            settle,
            deadline: None,
        }
    }

    /// Quiet period required before the pending action runs.
    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Cancel any pending action and schedule a new one `settle` after `now`.
    pub fn schedule(&mut self, now: Duration) {
        self.deadline = Some(now.saturating_add(self.settle));
    }

    /// Drop the pending action, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// When the pending action becomes due.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// An action is scheduled.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once per burst, when `now` reaches the deadline.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn idle_never_fires() {
        let mut d = Debouncer::new(ms(100));
        assert!(!d.is_pending());
        assert!(!d.poll(ms(1_000)));
    }

    #[test]
    fn burst_collapses_to_one_fire() {
        let mut d = Debouncer::new(ms(100));
        for t in [0, 20, 40, 60, 80] {
            d.schedule(ms(t));
            assert!(!d.poll(ms(t)));
        }
        assert_eq!(d.deadline(), Some(ms(180)));
        assert!(!d.poll(ms(179)));
        assert!(d.poll(ms(180)));
        assert!(!d.is_pending());
        assert!(!d.poll(ms(400)));
    }

    #[test]
    fn separate_bursts_fire_separately() {
        let mut d = Debouncer::new(ms(100));
        d.schedule(ms(0));
        assert!(d.poll(ms(150)));
        d.schedule(ms(300));
        assert!(d.poll(ms(400)));
    }

    #[test]
    fn cancel_discards_pending() {
        let mut d = Debouncer::new(ms(100));
        d.schedule(ms(0));
        d.cancel();
        assert!(!d.poll(ms(200)));
    }
}
