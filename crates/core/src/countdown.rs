//! Second-granularity countdown used by timed quizzes.
//!
//! This is the pure bookkeeping half; the services crate drives it from a
//! tokio interval.

/// Result of advancing a countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time is still left.
    Running { remaining: u32 },
    /// The budget just ran out. Reported exactly once.
    Expired,
    /// The countdown had already expired; nothing changed.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    limit: u32,
    remaining: u32,
    expired: bool,
}

impl Countdown {
    #[must_use]
    pub fn new(limit_secs: u32) -> Self {
        Self {
            limit: limit_secs,
            remaining: limit_secs,
            expired: false,
        }
    }

    /// Resume a countdown with time already spent. `remaining` is capped at the limit.
    #[must_use]
    pub fn resume(limit_secs: u32, remaining_secs: u32) -> Self {
        Self {
            limit: limit_secs,
            remaining: remaining_secs.min(limit_secs),
            expired: false,
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.expired {
            return TickOutcome::Stopped;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            return TickOutcome::Expired;
        }
        TickOutcome::Running {
            remaining: self.remaining,
        }
    }

    /// Restore the full budget.
    pub fn reset(&mut self) {
        self.remaining = self.limit;
        self.expired = false;
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Seconds spent so far: `limit - remaining`.
    #[must_use]
    pub fn elapsed(&self) -> u32 {
        self.limit - self.remaining
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

/// Render seconds as `m:ss`.
#[must_use]
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
