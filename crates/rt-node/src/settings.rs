//! Node configuration
//!
//! Loaded from built-in defaults, an optional TOML file and `RT_NODE__*`
//! environment overrides, in that order.

use crate::error::NodeError;
use config::{Config, Environment, File};
use rt_kernel::KernelConfig;
use rt_tasks::{NetworkTaskConfig, SensorTaskConfig};
use serde::{Deserialize, Serialize};

/// Default configuration file, read if present
pub const DEFAULT_CONFIG_PATH: &str = "rt-node.toml";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "RT_NODE";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub kernel: KernelConfig,
    pub sensor: SensorTaskConfig,
    pub network: NetworkTaskConfig,
    pub logging: LoggingConfig,
    /// Stop after this many seconds; run until Ctrl-C when unset
    pub run_for_secs: Option<u64>,
}

impl NodeConfig {
    /// Load configuration from `path` (optional file) and the environment
    pub fn load(path: &str) -> Result<Self, NodeError> {
        let config: NodeConfig = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.kernel.tick_rate_hz == 0 {
            return Err(NodeError::InvalidConfig(
                "kernel.tick_rate_hz must be positive".to_string(),
            ));
        }
        if self.sensor.period_ticks == 0 || self.network.period_ticks == 0 {
            return Err(NodeError::InvalidConfig(
                "task periods must be at least one tick".to_string(),
            ));
        }
        if self.network.priority <= self.sensor.priority {
            return Err(NodeError::InvalidConfig(format!(
                "network priority ({}) must be above sensor priority ({})",
                self.network.priority, self.sensor.priority
            )));
        }
        if self.sensor.lock_timeout_ticks > self.sensor.period_ticks {
            return Err(NodeError::InvalidConfig(format!(
                "sensor lock timeout ({} ticks) exceeds its period ({} ticks)",
                self.sensor.lock_timeout_ticks, self.sensor.period_ticks
            )));
        }
        Ok(())
    }
}
