//! Live clock adapter.
//!
//! Phase deadlines and check durations are measured through this port;
//! in production they come from the system clock, in tests from a
//! stepping fake.

use chrono::{DateTime, Utc};

use crate::ports::clock::Clock;

/// Clock backed by the system's wall-clock time.
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
