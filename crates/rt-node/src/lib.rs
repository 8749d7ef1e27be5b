//! Periodic Task Node
//!
//! Wires the sensor and network tasks onto the kernel, runs them for a
//! configured duration (or until Ctrl-C) and summarises what happened.

mod error;
mod settings;

pub use error::NodeError;
pub use settings::{LoggingConfig, NodeConfig, DEFAULT_CONFIG_PATH, ENV_PREFIX};

use rt_kernel::{CycleStats, Kernel, KernelEvent, KernelHooks, Scheduler, TaskSpec, Ticks};
use rt_tasks::{
    packet_source, CounterSensor, NetworkTask, SensorTask, SharedSensorCell, NETWORK_TASK,
    SENSOR_TASK,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), NodeError> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| NodeError::InvalidConfig(format!("unknown log level: {}", config.level)))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| NodeError::InvalidConfig(format!("logging already initialised: {}", e)))
}

/// Timing counters for one task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingSummary {
    pub cycles: u64,
    pub misses: u64,
    pub worst_elapsed: Ticks,
}

impl TimingSummary {
    fn from_stats(stats: &CycleStats) -> Self {
        Self {
            cycles: stats.cycles(),
            misses: stats.misses(),
            worst_elapsed: stats.worst_elapsed(),
        }
    }
}

/// What the node did during one run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub sensor: TimingSummary,
    pub sensor_updates: u64,
    pub lock_timeouts: u64,
    /// Final value of the shared cell, if it was created
    pub last_sensor_value: Option<u16>,
    pub network: TimingSummary,
    pub packets: u64,
    pub envelopes_accepted: u64,
    pub envelopes_rejected: u64,
    pub frames_accepted: u64,
    pub frames_rejected: u64,
    /// Tasks that terminated, with their reason
    pub terminated: Vec<(String, String)>,
}

impl RunSummary {
    /// Write the summary to the log
    pub fn log(&self) {
        info!("=== Run Summary ===");
        info!(
            "{}: {} cycles, {} missed deadlines, worst {} ticks, {} updates, {} lock timeouts",
            SENSOR_TASK,
            self.sensor.cycles,
            self.sensor.misses,
            self.sensor.worst_elapsed,
            self.sensor_updates,
            self.lock_timeouts
        );
        match self.last_sensor_value {
            Some(value) => info!("{}: final sensor_data={}", SENSOR_TASK, value),
            None => info!("{}: sensor cell never initialised", SENSOR_TASK),
        }
        info!(
            "{}: {} cycles, {} missed deadlines, worst {} ticks, {} packets",
            NETWORK_TASK,
            self.network.cycles,
            self.network.misses,
            self.network.worst_elapsed,
            self.packets
        );
        info!(
            "{}: envelopes {} accepted / {} rejected, frames {} accepted / {} rejected",
            NETWORK_TASK,
            self.envelopes_accepted,
            self.envelopes_rejected,
            self.frames_accepted,
            self.frames_rejected
        );
        for (task, reason) in &self.terminated {
            warn!("{} terminated: {}", task, reason);
        }
    }
}

/// Run both tasks until the configured duration elapses or Ctrl-C arrives
pub async fn run(config: NodeConfig) -> Result<RunSummary, NodeError> {
    config.validate()?;

    let terminated = Arc::new(Mutex::new(Vec::new()));
    let sink = terminated.clone();
    let hooks = KernelHooks::new().on_event(move |event| match event {
        KernelEvent::ResourceExhausted { kind, capacity } => {
            error!("Kernel out of {} objects (capacity {})", kind, capacity);
        }
        KernelEvent::TaskExited {
            task,
            error: Some(reason),
        } => {
            if let Ok(mut exits) = sink.lock() {
                exits.push((task.to_string(), reason.clone()));
            }
        }
        KernelEvent::TaskExited { error: None, .. } => {}
    });
    let kernel = Kernel::new(&config.kernel, hooks)?;

    let cell = Arc::new(SharedSensorCell::new());
    let sensor = SensorTask::new(
        kernel.clone(),
        config.sensor.clone(),
        CounterSensor::new(),
        cell.clone(),
    );
    let network = NetworkTask::new(
        kernel.clone(),
        config.network.clone(),
        packet_source(config.network.source, config.network.overrun.seed),
    );

    let sensor_stats = sensor.stats();
    let sensor_cycles = sensor.cycle_stats();
    let network_stats = network.stats();
    let network_cycles = network.cycle_stats();

    let mut scheduler = Scheduler::new(kernel);
    scheduler.create_task(TaskSpec::new(SENSOR_TASK, config.sensor.priority), async move {
        sensor.run().await.map_err(Into::into)
    });
    scheduler.create_task(TaskSpec::new(NETWORK_TASK, config.network.priority), async move {
        network.run().await.map_err(Into::into)
    });

    tokio::select! {
        exits = scheduler.start() => {
            warn!("All {} tasks exited", exits.len());
        }
        _ = stop_signal(config.run_for_secs) => {
            info!("Stopping node");
        }
    }

    let last_sensor_value = if cell.is_initialized() {
        cell.read(config.sensor.lock_timeout_ticks).await.ok()
    } else {
        None
    };
    let terminated = terminated
        .lock()
        .map(|exits| exits.clone())
        .unwrap_or_default();

    Ok(RunSummary {
        sensor: TimingSummary::from_stats(&sensor_cycles),
        sensor_updates: sensor_stats.updates(),
        lock_timeouts: sensor_stats.lock_timeouts(),
        last_sensor_value,
        network: TimingSummary::from_stats(&network_cycles),
        packets: network_stats.packets(),
        envelopes_accepted: network_stats.envelopes_accepted(),
        envelopes_rejected: network_stats.envelopes_rejected(),
        frames_accepted: network_stats.frames_accepted(),
        frames_rejected: network_stats.frames_rejected(),
        terminated,
    })
}

async fn stop_signal(run_for_secs: Option<u64>) {
    match run_for_secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C ({}), running until killed", e);
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt_tasks::{OverrunConfig, PacketSourceKind};

    fn quiet_config(run_for_secs: u64) -> NodeConfig {
        let mut config = NodeConfig {
            run_for_secs: Some(run_for_secs),
            ..Default::default()
        };
        config.sensor.overrun = OverrunConfig::default();
        config.network.overrun = OverrunConfig::default();
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_for_one_second() {
        let summary = run(quiet_config(1)).await.unwrap();

        // 100 ms sensor period, 10 ms network period
        assert!((9..=10).contains(&summary.sensor.cycles), "{:?}", summary);
        assert!((99..=100).contains(&summary.network.cycles), "{:?}", summary);
        assert_eq!(summary.sensor.misses, 0);
        assert_eq!(summary.network.misses, 0);
        assert_eq!(summary.sensor_updates, summary.sensor.cycles);
        assert_eq!(
            summary.last_sensor_value,
            Some(summary.sensor.cycles as u16 - 1)
        );
        assert_eq!(summary.packets, summary.network.cycles);
        assert_eq!(summary.frames_accepted, summary.packets);
        assert_eq!(summary.envelopes_rejected, 0);
        assert!(summary.terminated.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_lock_terminates_only_sensor_task() {
        let mut config = quiet_config(1);
        config.kernel.max_mutexes = 0;
        config.network.source = PacketSourceKind::Silent;

        let summary = run(config).await.unwrap();

        assert_eq!(summary.sensor.cycles, 0);
        assert_eq!(summary.last_sensor_value, None);
        assert_eq!(summary.terminated.len(), 1);
        assert_eq!(summary.terminated[0].0, SENSOR_TASK);
        assert!(summary.network.cycles > 0);
        assert_eq!(summary.packets, 0);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = quiet_config(1);
        config.sensor.priority = 5;
        assert!(matches!(run(config).await, Err(NodeError::InvalidConfig(_))));
    }
}
