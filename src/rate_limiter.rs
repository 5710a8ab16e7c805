use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket guarding calls to a metered upstream API.
/// Clones share the same bucket.
#[derive(Clone)]
pub struct TokenBucket {
    capacity: f64,
    fill_rate_per_sec: f64,
    state: Arc<Mutex<BucketState>>,
}

impl TokenBucket {
    pub fn new(capacity: u32, fill_rate_per_sec: f64) -> Self {
        Self {
            capacity: capacity as f64,
            fill_rate_per_sec,
            state: Arc::new(Mutex::new(BucketState {
                tokens: capacity as f64,
                last_refill: Instant::now(),
            })),
        }
    }

    /// Full bucket of `per_minute` tokens, refilled evenly over a minute.
    pub fn per_minute(per_minute: u32) -> Self {
        Self::new(per_minute, per_minute as f64 / 60.0)
    }

    /// Takes `amount` tokens if available. Never waits.
    pub fn try_acquire(&self, amount: u32) -> bool {
        let mut state = self.state.lock();
        self.refill(&mut state);

        if state.tokens >= amount as f64 {
            state.tokens -= amount as f64;
            true
        } else {
            false
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        let new_tokens = elapsed * self.fill_rate_per_sec;
        if new_tokens > 0.0 {
            state.tokens = (state.tokens + new_tokens).min(self.capacity);
            state.last_refill = now;
        }
    }
}
