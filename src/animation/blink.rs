//! Periodic blink timer

/// Time between blinks in milliseconds
pub const BLINK_PERIOD_MS: u64 = 3500;

/// How long the eyes stay closed in milliseconds
pub const BLINK_DURATION_MS: u64 = 150;

/// Blink schedule driven by elapsed session time
///
/// Like an interval timer, the first blink fires one full period after the
/// timer starts, not at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkTimer {
    period_ms: u64,
    duration_ms: u64,
}

impl Default for BlinkTimer {
    fn default() -> Self {
        Self::new(BLINK_PERIOD_MS, BLINK_DURATION_MS)
    }
}

impl BlinkTimer {
    /// `duration_ms` is capped at `period_ms`; a zero period never blinks
    pub fn new(period_ms: u64, duration_ms: u64) -> Self {
        Self {
            period_ms,
            duration_ms: duration_ms.min(period_ms),
        }
    }

    /// Whether the eyes are closed `elapsed_ms` after the timer started
    pub fn is_blinking(&self, elapsed_ms: u64) -> bool {
        if self.period_ms == 0 || elapsed_ms < self.period_ms {
            return false;
        }
        elapsed_ms % self.period_ms < self.duration_ms
    }
}
