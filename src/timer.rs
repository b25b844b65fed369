use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep; the stop flag is checked in between.
const SLEEP_SLICE_MS: u64 = 50;

/// Time source a typewriter's wake-ups are driven against, in ms since the
/// timer was created.
pub trait Timer {
    fn now_ms(&self) -> u64;

    /// Block until `deadline_ms`, returning early once `stop` is set.
    fn sleep_until(&mut self, deadline_ms: u64, stop: &AtomicBool);
}

/// Virtual time: sleeping jumps straight to the deadline.
#[derive(Debug, Default, Clone)]
pub struct ManualTimer {
    now: u64,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, ms: u64) {
        self.now = self.now.saturating_add(ms);
    }
}

impl Timer for ManualTimer {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn sleep_until(&mut self, deadline_ms: u64, _stop: &AtomicBool) {
        self.now = self.now.max(deadline_ms);
    }
}

/// Wall-clock time.
#[derive(Debug, Clone)]
pub struct RealTimer {
    start: Instant,
}

impl Default for RealTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RealTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Timer for RealTimer {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
    }

    fn sleep_until(&mut self, deadline_ms: u64, stop: &AtomicBool) {
        sleep_interruptible(stop, deadline_ms.saturating_sub(self.now_ms()));
    }
}

pub(crate) fn sleep_interruptible(stop: &AtomicBool, ms: u64) {
    let mut remaining = ms;
    while remaining > 0 {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let step = remaining.min(SLEEP_SLICE_MS);
        std::thread::sleep(Duration::from_millis(step));
        remaining -= step;
    }
}
