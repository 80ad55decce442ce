/// Source of wall-clock time, in seconds since the epoch.
///
/// Only the alert cooldown reads this clock. Restart windows are measured
/// with the timestamps reported by the runtime.
pub trait Clock {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}
