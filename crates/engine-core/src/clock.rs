//! Injected wall-clock capability: every timestamp in the engine flows
//! through a [`Clock`] the caller supplies, so tests can inject a fixed
//! time. The only place a real clock is acceptable is the outer
//! CLI/binary.

use chrono::{DateTime, Utc};

/// Supplies the current time as an ISO-8601 UTC string.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current instant, formatted as ISO-8601 UTC with millisecond
    /// precision, matching the canonical-JSON date rule.
    fn now_iso(&self) -> String {
        self.now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

/// Reads the real system clock. Only the outermost binary should use this.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pin the clock to a specific RFC-3339 timestamp.
    pub fn parse(iso: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self(DateTime::parse_from_rfc3339(iso)?.with_timezone(&Utc)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_returns_pinned_instant() {
        let clock = FixedClock::parse("2026-01-01T00:00:00.000Z").unwrap();
        assert_eq!(clock.now_iso(), "2026-01-01T00:00:00.000Z");
    }

    #[test]
    fn system_clock_advances() {
        let a = SystemClock.now();
        let b = SystemClock.now();
        assert!(b >= a);
    }
}
