//! Time-bounded execution scopes.

use std::time::Duration;
use tokio::time::{self, Instant};

/// A wall-clock point after which an operation must stop waiting and report
/// cancellation.
///
/// Deadlines form a hierarchy: each sub-operation derives its own deadline
/// from its parent with [`bounded`](Deadline::bounded), and a child can never
/// outlive its parent, so a parent that fires fires every child with it.
/// Values are `Copy`; nothing holds one beyond the call it was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// Derive a child deadline: at most `budget` from now, never later than
    /// the parent.
    pub fn bounded(self, budget: Duration) -> Self {
        Self {
            at: self.at.min(Instant::now() + budget),
        }
    }

    /// The instant this deadline fires, for `tokio::time::timeout_at`-style
    /// wrapping.
    pub fn instant(self) -> Instant {
        self.at
    }

    /// Time left before the deadline fires; zero once it has.
    pub fn remaining(self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_elapsed(self) -> bool {
        self.at <= Instant::now()
    }

    /// Completes once the deadline has fired. Meant for `tokio::select!`
    /// races against a completion signal.
    pub async fn expired(self) {
        time::sleep_until(self.at).await;
    }
}
