use std::cell::Cell;

use time::OffsetDateTime;

/// Milliseconds since the unix epoch, as recorded on the `db/tx/time` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instant(pub u64);

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Instant(u64::try_from(millis).unwrap_or_default())
    }
}

/// Clock for tests. Every reading advances time by one tick.
#[derive(Default)]
pub struct MockClock {
    now: Cell<u64>,
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        let now = self.now.get();
        self.now.set(now + 1);
        Instant(now)
    }
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: u64) -> Self {
        Self {
            now: Cell::new(now),
        }
    }
}
