use crate::domain::Clock;
use std::time::Instant;

// Wall-clock adapter for the clock port.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
