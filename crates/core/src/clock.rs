//! Injected clock abstraction.
//!
//! Every time-dependent guard in the workspace (signature timestamps,
//! token expiry, reminder cool-downs) reads time through [`Clock`], never
//! from the system clock directly, so tests can pin `now`.

use time::OffsetDateTime;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Production clock backed by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock frozen at a fixed instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn fixed_clock_returns_pinned_instant() {
        let clock = FixedClock(datetime!(2024-03-01 12:00 UTC));
        assert_eq!(clock.now(), datetime!(2024-03-01 12:00 UTC));
        assert_eq!(clock.now(), clock.now());
    }
}
