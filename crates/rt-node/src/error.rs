//! Node Error Types

use rt_kernel::KernelError;
use thiserror::Error;

/// Errors that stop the node from starting
#[derive(Debug, Error)]
pub enum NodeError {
    /// Configuration file or environment could not be read
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration values violate a constraint
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Command line could not be parsed
    #[error("Usage error: {0}")]
    Usage(String),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}
