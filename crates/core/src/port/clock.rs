// Clock Port (for testability)
//
// Availability is anchored at "today"; injecting the clock keeps the
// horizon deterministic in tests.

use chrono::NaiveDate;

/// Clock interface (allows mocking in tests)
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Current calendar day
    fn today(&self) -> NaiveDate;
}

/// System clock (production)
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}

/// Fixed clock pinned to one day (tests)
pub struct FixedClock {
    pub today: NaiveDate,
    pub now_millis: i64,
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now_millis
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}
