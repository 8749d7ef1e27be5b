//! Periodic Task Kernel
//!
//! Provides the scheduling and synchronisation primitives periodic tasks are
//! built on: a wrapping tick clock, drift-free periodic wake-ups, timed
//! mutexes drawn from a fixed object budget, and soft deadline monitoring.

mod clock;
mod deadline;
mod error;
mod hooks;
mod mutex;
mod scheduler;
mod timer;

pub use clock::{elapsed, Tick, TickClock, Ticks};
pub use deadline::{CycleStats, DeadlineMonitor, DeadlineOutcome, DeadlineSample};
pub use error::KernelError;
pub use hooks::{KernelEvent, KernelHooks};
pub use mutex::{KernelObjects, TimedMutex};
pub use scheduler::{BoxError, Kernel, KernelConfig, Scheduler, TaskExit, TaskSpec};
pub use timer::PeriodicTimer;

/// Guard returned by [`TimedMutex::acquire`]
pub use tokio::sync::MutexGuard;
