//! Network Task
//!
//! Polls a packet source every period and classifies whatever arrived with
//! the envelope and framing checks. The two checks run independently; a
//! rejection by one never suppresses the other.

use crate::config::NetworkTaskConfig;
use crate::error::TaskError;
use crate::sim::OverrunInjector;
use crate::source::PacketSource;
use packet_validator::{
    check_envelope, check_framing, Envelope, FrameDescriptor, PacketBuffer, ValidationError,
};
use rt_kernel::{CycleStats, DeadlineMonitor, DeadlineSample, Kernel, PeriodicTimer, Tick};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Task name used in status lines
pub const NETWORK_TASK: &str = "NetTask";

/// Network-task specific counters
#[derive(Debug, Default)]
pub struct NetworkStats {
    packets: AtomicU64,
    envelopes_accepted: AtomicU64,
    envelopes_rejected: AtomicU64,
    frames_accepted: AtomicU64,
    frames_rejected: AtomicU64,
}

impl NetworkStats {
    /// Polls that delivered at least one byte
    pub fn packets(&self) -> u64 {
        self.packets.load(Ordering::Relaxed)
    }

    pub fn envelopes_accepted(&self) -> u64 {
        self.envelopes_accepted.load(Ordering::Relaxed)
    }

    pub fn envelopes_rejected(&self) -> u64 {
        self.envelopes_rejected.load(Ordering::Relaxed)
    }

    pub fn frames_accepted(&self) -> u64 {
        self.frames_accepted.load(Ordering::Relaxed)
    }

    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected.load(Ordering::Relaxed)
    }
}

/// What one network cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkCycle {
    /// Tick the cycle was released at
    pub wake: Tick,
    /// Trusted packet length (0 when nothing arrived)
    pub received: usize,
    /// Envelope verdict; `None` when nothing arrived
    pub envelope: Option<Result<Envelope, ValidationError>>,
    /// Framing verdict; `None` when nothing arrived
    pub framing: Option<Result<FrameDescriptor, ValidationError>>,
    pub sample: DeadlineSample,
}

/// Periodic packet poller and classifier
pub struct NetworkTask<P> {
    kernel: Kernel,
    config: NetworkTaskConfig,
    source: P,
    buffer: PacketBuffer,
    timer: PeriodicTimer,
    monitor: DeadlineMonitor,
    overrun: OverrunInjector,
    stats: Arc<NetworkStats>,
}

impl<P: PacketSource> NetworkTask<P> {
    pub fn new(kernel: Kernel, config: NetworkTaskConfig, source: P) -> Self {
        let clock = kernel.clock();
        Self {
            timer: PeriodicTimer::new(clock, config.period_ticks),
            monitor: DeadlineMonitor::new(NETWORK_TASK, clock, config.deadline_ticks),
            overrun: OverrunInjector::new(&config.overrun),
            stats: Arc::new(NetworkStats::default()),
            buffer: PacketBuffer::new(),
            kernel,
            config,
            source,
        }
    }

    pub fn stats(&self) -> Arc<NetworkStats> {
        self.stats.clone()
    }

    pub fn cycle_stats(&self) -> Arc<CycleStats> {
        self.monitor.stats()
    }

    /// Wait for the next release and run one cycle
    pub async fn run_cycle(&mut self) -> NetworkCycle {
        let wake = self.timer.delay_until().await;
        let start = self.monitor.begin();

        let source = &mut self.source;
        let received = self.buffer.receive(|space| source.poll(space));
        let (envelope, framing) = if received > 0 {
            self.stats.packets.fetch_add(1, Ordering::Relaxed);
            let packet = self.buffer.as_slice();
            (Some(self.classify_envelope(packet)), Some(self.classify_frame(packet)))
        } else {
            (None, None)
        };

        if let Some(extra) = self.overrun.draw() {
            debug!("{}: injecting {} tick stall", NETWORK_TASK, extra);
            self.kernel.clock().sleep_ticks(extra).await;
        }

        let sample = self.monitor.finish(start);
        NetworkCycle {
            wake,
            received,
            envelope,
            framing,
            sample,
        }
    }

    fn classify_envelope(&self, packet: &[u8]) -> Result<Envelope, ValidationError> {
        let verdict = check_envelope(packet);
        match &verdict {
            Ok(envelope) => {
                self.stats.envelopes_accepted.fetch_add(1, Ordering::Relaxed);
                info!(
                    "{}: Got packetType={}, payloadLen={}",
                    NETWORK_TASK, envelope.packet_type, envelope.declared_len
                );
            }
            Err(e) => {
                self.stats.envelopes_rejected.fetch_add(1, Ordering::Relaxed);
                warn!("{}: envelope rejected: {}", NETWORK_TASK, e);
            }
        }
        verdict
    }

    fn classify_frame(&self, packet: &[u8]) -> Result<FrameDescriptor, ValidationError> {
        let verdict = check_framing(packet);
        match &verdict {
            Ok(frame) => {
                self.stats.frames_accepted.fetch_add(1, Ordering::Relaxed);
                info!(
                    "{}: valid frame type={}, remaining_length={}, header={} bytes",
                    NETWORK_TASK,
                    frame.type_code(),
                    frame.remaining_length,
                    frame.header_size
                );
            }
            Err(e) => {
                self.stats.frames_rejected.fetch_add(1, Ordering::Relaxed);
                debug!("{}: not a valid frame: {}", NETWORK_TASK, e);
            }
        }
        verdict
    }

    /// Task body: cycle forever
    pub async fn run(mut self) -> Result<(), TaskError> {
        self.timer = PeriodicTimer::new(self.kernel.clock(), self.config.period_ticks);
        info!(
            "{}: started, period {} ticks, deadline {} ticks",
            NETWORK_TASK, self.config.period_ticks, self.config.deadline_ticks
        );
        loop {
            self.run_cycle().await;
        }
    }
}
