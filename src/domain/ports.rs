use std::time::Instant;

// Port for reading the current time; tests swap in a manual clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}
