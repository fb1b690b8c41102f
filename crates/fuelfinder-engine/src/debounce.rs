//! Trailing-edge coalescing of viewport-move events.

use std::time::{Duration, Instant};

/// Fires once the viewport has been still for `delay`.
///
/// Pure state over caller-supplied instants: every [`notify`] restarts the
/// wait and [`ready`] reports (once) when it has elapsed.
///
/// [`notify`]: ViewportDebouncer::notify
/// [`ready`]: ViewportDebouncer::ready
#[derive(Debug, Clone)]
pub struct ViewportDebouncer {
    delay: Duration,
    pending_since: Option<Instant>,
}

impl ViewportDebouncer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending_since: None,
        }
    }

    #[must_use]
    pub const fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }

    pub fn notify(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    /// `true` exactly once per burst, when `delay` has passed since the
    /// last [`notify`](ViewportDebouncer::notify).
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.delay => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    /// Drop a pending burst without waiting, reporting whether one existed.
    pub fn flush(&mut self) -> bool {
        self.pending_since.take().is_some()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Instant at which a pending burst becomes ready.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending_since.map(|since| since + self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_debouncer_never_fires() {
        let mut debouncer = ViewportDebouncer::from_millis(150);
        assert!(!debouncer.ready(Instant::now()));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn fires_once_after_delay() {
        let start = Instant::now();
        let mut debouncer = ViewportDebouncer::from_millis(150);
        debouncer.notify(start);
        assert!(!debouncer.ready(start + Duration::from_millis(100)));
        assert!(debouncer.ready(start + Duration::from_millis(150)));
        assert!(!debouncer.ready(start + Duration::from_millis(400)));
    }

    #[test]
    fn new_events_push_the_deadline_back() {
        let start = Instant::now();
        let mut debouncer = ViewportDebouncer::from_millis(150);
        debouncer.notify(start);
        debouncer.notify(start + Duration::from_millis(100));
        assert_eq!(debouncer.deadline(), Some(start + Duration::from_millis(250)));
        assert!(!debouncer.ready(start + Duration::from_millis(200)));
        assert!(debouncer.ready(start + Duration::from_millis(250)));
    }

    #[test]
    fn flush_ends_a_pending_burst() {
        let start = Instant::now();
        let mut debouncer = ViewportDebouncer::from_millis(150);
        assert!(!debouncer.flush());
        debouncer.notify(start);
        assert!(debouncer.flush());
        assert!(!debouncer.is_pending());
        assert!(!debouncer.ready(start + Duration::from_secs(1)));
    }

    #[test]
    fn instant_before_notify_does_not_fire() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut debouncer = ViewportDebouncer::from_millis(50);
        debouncer.notify(start);
        assert!(!debouncer.ready(start - Duration::from_millis(10)));
        assert!(debouncer.is_pending());
    }
}
