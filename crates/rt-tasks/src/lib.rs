//! Periodic Tasks
//!
//! The sensor task publishes a hardware reading into a lock-protected shared
//! cell; the network task polls for packets and classifies them. Both run on
//! a fixed, drift-free period and check each cycle against a soft deadline.

mod config;
mod error;
mod network;
mod sensor;
mod sim;
mod source;

pub use config::{NetworkTaskConfig, OverrunConfig, PacketSourceKind, SensorTaskConfig};
pub use error::TaskError;
pub use network::{NetworkCycle, NetworkStats, NetworkTask, NETWORK_TASK};
pub use sensor::{
    CounterSensor, SensorCycle, SensorSource, SensorStats, SensorTask, SharedSensorCell,
    SENSOR_TASK,
};
pub use sim::{OverrunInjector, SimRng};
pub use source::{
    packet_source, ConnectPacketSource, FuzzSource, PacketSource, ScriptedSource, SilentSource,
};
