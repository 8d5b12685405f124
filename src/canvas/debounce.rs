use std::time::{Duration, Instant};

/// Quiet period after the last stroke-extension event before an inference
/// trigger fires.
pub const QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Trailing-edge debounce over an owned optional deadline.
///
/// At most one deadline is ever pending: scheduling replaces it, cancelling
/// drops it, and `poll` consumes it. The timer never fires on the leading
/// edge. Callers pass `Instant`s explicitly so tests never sleep.
#[derive(Debug)]
pub struct DebounceTimer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::with_quiet_period(QUIET_PERIOD)
    }

    pub fn with_quiet_period(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// (Re)start the quiet period; a previously pending deadline is replaced.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    /// Drop any pending deadline. Used on stroke end (the trigger fires
    /// immediately instead) and on teardown, so nothing double-fires later.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time until the pending deadline elapses, if any. Zero when overdue.
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// Returns true exactly once when the quiet period has elapsed with no
    /// further activity.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for DebounceTimer {
    fn default() -> Self {
        Self::new()
    }
}
