//! Kernel Error Types

use thiserror::Error;

/// Errors raised by kernel primitives
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    /// No kernel object slot left for a new primitive
    #[error("Out of kernel resources: {kind} budget of {capacity} exhausted")]
    OutOfResources { kind: &'static str, capacity: usize },

    /// Tick rate must be a positive number of ticks per second
    #[error("Invalid tick rate: {0} Hz")]
    InvalidTickRate(u32),

    /// Lock acquisition gave up after the bounded wait
    #[error("Lock acquisition timed out after {0} ticks")]
    LockTimeout(u32),
}
