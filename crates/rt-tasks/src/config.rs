//! Task configuration

use rt_kernel::Ticks;
use serde::{Deserialize, Serialize};

/// Artificial load injected inside a task's measured window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrunConfig {
    /// Stall on average once every `one_in` cycles (0 disables injection)
    pub one_in: u32,
    /// Length of an injected stall
    pub extra_ticks: Ticks,
    /// Seed for the pseudo-random draw
    pub seed: u64,
}

impl Default for OverrunConfig {
    fn default() -> Self {
        Self {
            one_in: 0,
            extra_ticks: 6,
            seed: 1,
        }
    }
}

/// Sensor task configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorTaskConfig {
    /// Task priority (must be below the network task's)
    pub priority: u8,
    /// Activation period (default: 10 ticks = 100 ms at 100 Hz)
    pub period_ticks: Ticks,
    /// Longest wait for the shared cell's lock
    pub lock_timeout_ticks: Ticks,
    /// Soft deadline for one cycle
    pub deadline_ticks: Ticks,
    pub overrun: OverrunConfig,
}

impl Default for SensorTaskConfig {
    fn default() -> Self {
        Self {
            priority: 1,
            period_ticks: 10,
            lock_timeout_ticks: 5,
            deadline_ticks: 5,
            overrun: OverrunConfig {
                one_in: 50,
                ..Default::default()
            },
        }
    }
}

/// Where the network task gets its packets from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketSourceKind {
    /// The same 14-byte CONNECT-style frame every poll
    Connect,
    /// Random lengths and contents, sometimes larger than the buffer
    Fuzz,
    /// Never delivers anything
    Silent,
}

/// Network task configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkTaskConfig {
    /// Task priority (must be above the sensor task's)
    pub priority: u8,
    /// Activation period (default: 1 tick = 10 ms at 100 Hz)
    pub period_ticks: Ticks,
    /// Soft deadline for one cycle
    pub deadline_ticks: Ticks,
    pub overrun: OverrunConfig,
    pub source: PacketSourceKind,
}

impl Default for NetworkTaskConfig {
    fn default() -> Self {
        Self {
            priority: 2,
            period_ticks: 1,
            deadline_ticks: 5,
            overrun: OverrunConfig {
                one_in: 500,
                ..Default::default()
            },
            source: PacketSourceKind::Connect,
        }
    }
}
