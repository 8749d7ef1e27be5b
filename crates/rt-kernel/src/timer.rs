//! Drift-Free Periodic Timer

use crate::clock::{Tick, TickClock, Ticks};

/// Absolute-wake periodic timer.
///
/// The wake tick advances by exactly one period per call regardless of how
/// long the cycle body took, so activations never accumulate drift. After an
/// overrun the next wait returns immediately; missed periods are not skipped.
#[derive(Debug, Clone)]
pub struct PeriodicTimer {
    clock: TickClock,
    next_wake: Tick,
    period: Ticks,
}

impl PeriodicTimer {
    /// Create a timer whose first activation is one period after the current tick
    pub fn new(clock: TickClock, period: Ticks) -> Self {
        Self {
            next_wake: clock.now(),
            clock,
            period,
        }
    }

    /// Advance the wake tick by one period and sleep until it. Returns the wake tick.
    pub async fn delay_until(&mut self) -> Tick {
        self.next_wake = self.next_wake.wrapping_add(self.period);
        self.clock.sleep_until(self.next_wake).await;
        self.next_wake
    }

    /// Tick of the most recent (or initial) activation
    pub fn last_wake(&self) -> Tick {
        self.next_wake
    }

    /// Timer period in ticks
    pub fn period(&self) -> Ticks {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_no_drift_under_variable_load() {
        let clock = TickClock::new(100).unwrap();
        let mut timer = PeriodicTimer::new(clock, 10);

        for (cycle, body_ticks) in [3u32, 0, 7, 1, 9].into_iter().enumerate() {
            let woke = timer.delay_until().await;
            assert_eq!(woke, 10 * (cycle as u32 + 1));
            assert_eq!(clock.now(), woke);
            clock.sleep_ticks(body_ticks).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrun_does_not_skip_periods() {
        let clock = TickClock::new(100).unwrap();
        let mut timer = PeriodicTimer::new(clock, 2);

        assert_eq!(timer.delay_until().await, 2);
        // Body overruns by two whole periods
        clock.sleep_ticks(5).await;
        assert_eq!(timer.delay_until().await, 4);
        assert_eq!(clock.now(), 7);
        assert_eq!(timer.delay_until().await, 6);
        assert_eq!(clock.now(), 7);
        assert_eq!(timer.delay_until().await, 8);
        assert_eq!(clock.now(), 8);
    }
}
