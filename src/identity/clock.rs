use std::sync::atomic::{AtomicI64, Ordering};

/// Source of "now" in Unix seconds for token issuance and expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Settable clock for tests and tooling that need to move time by hand.
#[derive(Debug)]
pub struct ManualClock {
    secs: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self { Self { secs: AtomicI64::new(start) } }

    pub fn advance(&self, by_secs: i64) {
        self.secs.fetch_add(by_secs, Ordering::SeqCst);
    }

    pub fn set(&self, secs: i64) {
        self.secs.store(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.secs.load(Ordering::SeqCst)
    }
}
