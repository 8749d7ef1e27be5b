//! Tick Clock
//!
//! Monotonic tick counter backed by the tokio clock. Ticks are a wrapping
//! `u32`, so elapsed time must always be computed with [`elapsed`].

use crate::error::KernelError;
use std::time::Duration;
use tokio::time::Instant;

/// Absolute tick count (wraps on overflow)
pub type Tick = u32;

/// A number of ticks (period, timeout, deadline)
pub type Ticks = u32;

/// Ticks elapsed between two samples, correct across counter wrap
pub fn elapsed(start: Tick, end: Tick) -> Ticks {
    end.wrapping_sub(start)
}

/// Monotonic tick source shared by every task
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    /// Instant corresponding to tick 0
    epoch: Instant,
    /// Length of a single tick in nanoseconds
    tick_nanos: u64,
}

impl TickClock {
    /// Create a clock ticking `tick_rate_hz` times per second, starting at tick 0 now
    pub fn new(tick_rate_hz: u32) -> Result<Self, KernelError> {
        if tick_rate_hz == 0 || tick_rate_hz > 1_000_000_000 {
            return Err(KernelError::InvalidTickRate(tick_rate_hz));
        }
        Ok(Self {
            epoch: Instant::now(),
            tick_nanos: 1_000_000_000 / u64::from(tick_rate_hz),
        })
    }

    /// Current tick
    pub fn now(&self) -> Tick {
        self.now_abs() as Tick
    }

    /// Duration of `ticks` ticks
    pub fn ticks_to_duration(&self, ticks: Ticks) -> Duration {
        Duration::from_nanos(self.tick_nanos.saturating_mul(u64::from(ticks)))
    }

    /// Block until `target` has been reached. Returns immediately if it already passed.
    pub async fn sleep_until(&self, target: Tick) {
        let now = self.now_abs();
        // Reinterpret the wrapped distance as signed: a target "behind" us is in the past.
        let ahead = target.wrapping_sub(now as Tick) as i32;
        if ahead <= 0 {
            return;
        }
        let deadline = self.instant_of(now + ahead as u64);
        tokio::time::sleep_until(deadline).await;
    }

    /// Block for `ticks` ticks from now
    pub async fn sleep_ticks(&self, ticks: Ticks) {
        self.sleep_until(self.now().wrapping_add(ticks)).await;
    }

    fn now_abs(&self) -> u64 {
        let nanos = Instant::now().duration_since(self.epoch).as_nanos();
        (nanos / u128::from(self.tick_nanos)) as u64
    }

    fn instant_of(&self, abs_tick: u64) -> Instant {
        self.epoch + Duration::from_nanos(self.tick_nanos.saturating_mul(abs_tick))
    }
}
