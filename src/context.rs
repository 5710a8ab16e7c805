use chrono::Utc;

/// Source of wall-clock time.
/// Decouples the service from `Utc::now()` so tests can pin timestamps.
pub trait TimeProvider: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock pinned to a fixed instant.
pub struct SimulatedTimeProvider {
    current_time_ms: i64,
}

impl SimulatedTimeProvider {
    pub fn new(current_time_ms: i64) -> Self {
        Self { current_time_ms }
    }
}

impl TimeProvider for SimulatedTimeProvider {
    fn now_millis(&self) -> i64 {
        self.current_time_ms
    }
}
