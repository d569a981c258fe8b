use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

/// Fixed-window per-key rate limiter, used to bound monitor creation per client IP.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, (Instant, u32)>>,
    limit: u32,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(limit: u32, window_secs: u64) -> Self {
        RateLimiter {
            windows: Mutex::new(HashMap::new()),
            limit,
            window_secs,
        }
    }

    pub fn check(&self, key: &str) -> bool {
        let mut windows = self.windows.lock().unwrap();
        let now = Instant::now();
        let entry = windows.entry(key.to_string()).or_insert((now, 0));
        if now.duration_since(entry.0).as_secs() >= self.window_secs {
            *entry = (now, 1);
            true
        } else if entry.1 < self.limit {
            entry.1 += 1;
            true
        } else {
            false
        }
    }
}
