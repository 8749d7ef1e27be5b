//! Soft Deadline Monitoring
//!
//! Each cycle is bracketed by [`DeadlineMonitor::begin`] and
//! [`DeadlineMonitor::finish`]. A miss is reported and counted, never fatal.

use crate::clock::{elapsed, Tick, TickClock, Ticks};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of comparing a cycle's elapsed ticks to its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineOutcome {
    Met,
    Missed,
}

/// One cycle's timing measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineSample {
    pub start: Tick,
    pub end: Tick,
    pub limit: Ticks,
}

impl DeadlineSample {
    /// Ticks spent in the cycle
    pub fn elapsed(&self) -> Ticks {
        elapsed(self.start, self.end)
    }

    /// Met when elapsed does not exceed the limit
    pub fn outcome(&self) -> DeadlineOutcome {
        if self.elapsed() > self.limit {
            DeadlineOutcome::Missed
        } else {
            DeadlineOutcome::Met
        }
    }
}

/// Running counters for one task's cycles
#[derive(Debug, Default)]
pub struct CycleStats {
    cycles: AtomicU64,
    misses: AtomicU64,
    worst: AtomicU32,
}

impl CycleStats {
    fn record(&self, sample: &DeadlineSample) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        if sample.outcome() == DeadlineOutcome::Missed {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        self.worst.fetch_max(sample.elapsed(), Ordering::Relaxed);
    }

    /// Completed cycles
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Cycles that exceeded the deadline
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Longest cycle seen, in ticks
    pub fn worst_elapsed(&self) -> Ticks {
        self.worst.load(Ordering::Relaxed)
    }
}

/// Per-task deadline checker
#[derive(Debug, Clone)]
pub struct DeadlineMonitor {
    task: &'static str,
    clock: TickClock,
    limit: Ticks,
    stats: Arc<CycleStats>,
}

impl DeadlineMonitor {
    pub fn new(task: &'static str, clock: TickClock, limit: Ticks) -> Self {
        Self {
            task,
            clock,
            limit,
            stats: Arc::new(CycleStats::default()),
        }
    }

    /// Sample the start tick of a cycle
    pub fn begin(&self) -> Tick {
        self.clock.now()
    }

    /// Sample the end tick, report the outcome and fold it into the stats
    pub fn finish(&self, start: Tick) -> DeadlineSample {
        let sample = DeadlineSample {
            start,
            end: self.clock.now(),
            limit: self.limit,
        };
        match sample.outcome() {
            DeadlineOutcome::Met => info!("{}: took {} ticks", self.task, sample.elapsed()),
            DeadlineOutcome::Missed => warn!(
                "{}: MISSED DEADLINE (took {} ticks, limit {})",
                self.task,
                sample.elapsed(),
                self.limit
            ),
        }
        self.stats.record(&sample);
        sample
    }

    /// Shared handle to this task's counters
    pub fn stats(&self) -> Arc<CycleStats> {
        self.stats.clone()
    }

    pub fn limit(&self) -> Ticks {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_inclusive() {
        let at_limit = DeadlineSample { start: 10, end: 15, limit: 5 };
        let over = DeadlineSample { start: 10, end: 16, limit: 5 };
        assert_eq!(at_limit.outcome(), DeadlineOutcome::Met);
        assert_eq!(over.outcome(), DeadlineOutcome::Missed);
    }

    #[test]
    fn test_wrapped_sample() {
        let sample = DeadlineSample { start: u32::MAX - 1, end: 2, limit: 5 };
        assert_eq!(sample.elapsed(), 4);
        assert_eq!(sample.outcome(), DeadlineOutcome::Met);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_counts_misses() {
        let clock = TickClock::new(100).unwrap();
        let monitor = DeadlineMonitor::new("TestTask", clock, 5);

        let start = monitor.begin();
        clock.sleep_ticks(2).await;
        assert_eq!(monitor.finish(start).outcome(), DeadlineOutcome::Met);

        let start = monitor.begin();
        clock.sleep_ticks(6).await;
        let sample = monitor.finish(start);
        assert_eq!(sample.elapsed(), 6);
        assert_eq!(sample.outcome(), DeadlineOutcome::Missed);

        let stats = monitor.stats();
        assert_eq!(stats.cycles(), 2);
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.worst_elapsed(), 6);
    }
}
