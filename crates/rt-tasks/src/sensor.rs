//! Shared Sensor Cell and Sensor Task
//!
//! The sensor task periodically samples a hardware source and publishes the
//! reading into a lock-protected cell. The lock is held across the read and
//! the store only.

use crate::config::SensorTaskConfig;
use crate::error::TaskError;
use crate::sim::OverrunInjector;
use rt_kernel::{
    CycleStats, DeadlineMonitor, DeadlineSample, Kernel, KernelError, MutexGuard, PeriodicTimer,
    Tick, Ticks, TimedMutex,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

/// Task name used in status lines
pub const SENSOR_TASK: &str = "SensorTask";

/// Source of raw 16-bit sensor readings
pub trait SensorSource: Send {
    fn read(&mut self) -> u16;
}

/// Simulated hardware: returns 0, 1, 2, ... wrapping at `u16::MAX`
#[derive(Debug, Clone, Default)]
pub struct CounterSensor {
    next: u16,
}

impl CounterSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from `first`
    pub fn starting_at(first: u16) -> Self {
        Self { next: first }
    }
}

impl SensorSource for CounterSensor {
    fn read(&mut self) -> u16 {
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        value
    }
}

/// Single sensor value guarded by a timed mutex.
///
/// The lock is created lazily on first [`SharedSensorCell::init`] and lives
/// as long as the cell.
#[derive(Debug, Default)]
pub struct SharedSensorCell {
    lock: OnceCell<TimedMutex<u16>>,
}

impl SharedSensorCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the guarding lock if it does not exist yet
    pub async fn init(&self, kernel: &Kernel) -> Result<(), TaskError> {
        self.lock
            .get_or_try_init(|| async { kernel.create_mutex(0u16) })
            .await
            .map_err(TaskError::LockCreation)?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.lock.initialized()
    }

    /// Lock the cell, waiting at most `timeout` ticks
    pub async fn acquire(&self, timeout: Ticks) -> Result<MutexGuard<'_, u16>, TaskError> {
        let lock = self.lock.get().ok_or(TaskError::CellUninitialized)?;
        Ok(lock.acquire(timeout).await?)
    }

    /// Read the hardware and store the value under the lock. On timeout the
    /// previous value is left untouched.
    pub async fn update<S>(&self, source: &mut S, timeout: Ticks) -> Result<u16, TaskError>
    where
        S: SensorSource + ?Sized,
    {
        let mut guard = self.acquire(timeout).await?;
        let value = source.read();
        *guard = value;
        Ok(value)
    }

    /// Read the current value under the lock
    pub async fn read(&self, timeout: Ticks) -> Result<u16, TaskError> {
        Ok(*self.acquire(timeout).await?)
    }
}

/// Sensor-task specific counters
#[derive(Debug, Default)]
pub struct SensorStats {
    updates: AtomicU64,
    lock_timeouts: AtomicU64,
}

impl SensorStats {
    /// Cycles that stored a fresh value
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Cycles that gave up waiting for the lock
    pub fn lock_timeouts(&self) -> u64 {
        self.lock_timeouts.load(Ordering::Relaxed)
    }
}

/// What one sensor cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorCycle {
    /// Tick the cycle was released at
    pub wake: Tick,
    /// Whether a fresh value was stored
    pub updated: bool,
    /// Value the cell holds after the cycle, as last written by this task
    pub value: u16,
    pub sample: DeadlineSample,
}

/// Periodic producer for the shared sensor cell
pub struct SensorTask<S> {
    kernel: Kernel,
    config: SensorTaskConfig,
    source: S,
    cell: Arc<SharedSensorCell>,
    timer: PeriodicTimer,
    monitor: DeadlineMonitor,
    overrun: OverrunInjector,
    stats: Arc<SensorStats>,
    /// Last value this task stored (it is the only writer)
    last_value: u16,
}

impl<S: SensorSource> SensorTask<S> {
    pub fn new(
        kernel: Kernel,
        config: SensorTaskConfig,
        source: S,
        cell: Arc<SharedSensorCell>,
    ) -> Self {
        let clock = kernel.clock();
        Self {
            timer: PeriodicTimer::new(clock, config.period_ticks),
            monitor: DeadlineMonitor::new(SENSOR_TASK, clock, config.deadline_ticks),
            overrun: OverrunInjector::new(&config.overrun),
            stats: Arc::new(SensorStats::default()),
            last_value: 0,
            kernel,
            config,
            source,
            cell,
        }
    }

    /// Shared cell this task writes
    pub fn cell(&self) -> Arc<SharedSensorCell> {
        self.cell.clone()
    }

    pub fn stats(&self) -> Arc<SensorStats> {
        self.stats.clone()
    }

    pub fn cycle_stats(&self) -> Arc<CycleStats> {
        self.monitor.stats()
    }

    /// Create the cell's lock and re-anchor the period at the current tick.
    ///
    /// Failure to create the lock is the task's only fatal condition.
    pub async fn start(&mut self) -> Result<(), TaskError> {
        if let Err(e) = self.cell.init(&self.kernel).await {
            error!("{}: {}, terminating", SENSOR_TASK, e);
            return Err(e);
        }
        self.timer = PeriodicTimer::new(self.kernel.clock(), self.config.period_ticks);
        info!(
            "{}: started, period {} ticks, deadline {} ticks",
            SENSOR_TASK, self.config.period_ticks, self.config.deadline_ticks
        );
        Ok(())
    }

    /// Wait for the next release and run one cycle
    pub async fn run_cycle(&mut self) -> SensorCycle {
        let wake = self.timer.delay_until().await;
        let start = self.monitor.begin();

        let updated = match self
            .cell
            .update(&mut self.source, self.config.lock_timeout_ticks)
            .await
        {
            Ok(value) => {
                self.last_value = value;
                self.stats.updates.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                warn!("{}: update skipped: {}", SENSOR_TASK, e);
                if matches!(e, TaskError::Kernel(KernelError::LockTimeout(_))) {
                    self.stats.lock_timeouts.fetch_add(1, Ordering::Relaxed);
                }
                false
            }
        };

        info!("{}: sensor_data={}", SENSOR_TASK, self.last_value);

        if let Some(extra) = self.overrun.draw() {
            debug!("{}: injecting {} tick stall", SENSOR_TASK, extra);
            self.kernel.clock().sleep_ticks(extra).await;
        }

        let sample = self.monitor.finish(start);
        SensorCycle {
            wake,
            updated,
            value: self.last_value,
            sample,
        }
    }

    /// Task body: start, then cycle forever
    pub async fn run(mut self) -> Result<(), TaskError> {
        self.start().await?;
        loop {
            self.run_cycle().await;
        }
    }
}
