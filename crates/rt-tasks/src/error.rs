//! Task Error Types

use rt_kernel::KernelError;
use thiserror::Error;

/// Errors raised by the periodic tasks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The shared cell's lock could not be created (fatal for the sensor task)
    #[error("Failed to create sensor mutex: {0}")]
    LockCreation(#[source] KernelError),

    /// The shared cell was used before its lock existed
    #[error("Sensor cell used before initialisation")]
    CellUninitialized,

    /// A bounded kernel wait gave up
    #[error(transparent)]
    Kernel(#[from] KernelError),
}
