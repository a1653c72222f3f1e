//! Time source for the engine.
//!
//! Business rules never read the wall clock directly: the "current month"
//! used for progress bookkeeping comes from the [`Clock`] the engine was
//! built with, so month boundaries are reproducible in tests.

use std::fmt::Debug;

use chrono::{DateTime, Utc};

use crate::Month;

pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The billing month containing [`Clock::now`], in UTC.
    fn current_month(&self) -> Month {
        Month::from_datetime(self.now())
    }
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
