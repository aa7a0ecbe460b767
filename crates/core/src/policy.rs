//! When to (re)query a product code.
//!
//! Successful lookups are kept forever unless forced. Negative answers
//! expire after the retention window, and pending answers after half of it.

use chrono::{DateTime, Duration, Utc};

use crate::record::{Record, Status};

const SECS_PER_DAY: i64 = 24 * 3600;

/// Why a visit did not query the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A name is already cached.
    Cached,
    /// The code was reported unknown within the retention window.
    NotFound,
    /// The code was reported pending within half the retention window.
    Pending,
}

/// Outcome of [`decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Query,
    Skip(SkipReason),
}

/// Retention and force settings for one crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Days before a not-found answer is checked again.
    pub retention_days: u32,
    /// Re-query cached successes too.
    pub force: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self { retention_days: 90, force: false }
    }
}

impl Policy {
    fn not_found_window(&self) -> Duration {
        Duration::seconds(i64::from(self.retention_days) * SECS_PER_DAY)
    }

    fn pending_window(&self) -> Duration {
        Duration::seconds(i64::from(self.retention_days) * SECS_PER_DAY / 2)
    }

    /// Decide whether the code holding `prev` must be queried at `now`.
    pub fn decide(&self, prev: Option<&Record>, now: DateTime<Utc>) -> Decision {
        let Some(prev) = prev else {
            return Decision::Query;
        };

        match prev.status {
            Status::Ok if !self.force => Decision::Skip(SkipReason::Cached),
            Status::NotFound if now < prev.last_checked + self.not_found_window() => {
                Decision::Skip(SkipReason::NotFound)
            }
            Status::Pending if now < prev.last_checked + self.pending_window() => Decision::Skip(SkipReason::Pending),
            _ => Decision::Query,
        }
    }
}
