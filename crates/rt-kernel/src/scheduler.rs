//! Task Scheduler Facade

use crate::clock::TickClock;
use crate::error::KernelError;
use crate::hooks::{KernelEvent, KernelHooks};
use crate::mutex::{KernelObjects, TimedMutex};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, error, info};

/// Error type a task body may return when it terminates itself
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type TaskBody = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;

/// Kernel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Ticks per second (default: 100, i.e. 10 ms per tick)
    pub tick_rate_hz: u32,
    /// Maximum number of live mutexes
    pub max_mutexes: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 100,
            max_mutexes: 8,
        }
    }
}

/// Handle to the clock, object pool and hooks shared by all tasks
#[derive(Debug, Clone)]
pub struct Kernel {
    clock: TickClock,
    objects: Arc<KernelObjects>,
    hooks: KernelHooks,
}

impl Kernel {
    /// Create a kernel; tick 0 is the moment of creation
    pub fn new(config: &KernelConfig, hooks: KernelHooks) -> Result<Self, KernelError> {
        let clock = TickClock::new(config.tick_rate_hz)?;
        info!(
            "Kernel created: {} Hz tick, {} mutex slots",
            config.tick_rate_hz, config.max_mutexes
        );
        Ok(Self {
            clock,
            objects: Arc::new(KernelObjects::new(config.max_mutexes)),
            hooks,
        })
    }

    pub fn clock(&self) -> TickClock {
        self.clock
    }

    pub fn objects(&self) -> &KernelObjects {
        &self.objects
    }

    pub fn hooks(&self) -> &KernelHooks {
        &self.hooks
    }

    /// Create a timed mutex guarding `value`, or fail when the budget is spent
    pub fn create_mutex<T>(&self, value: T) -> Result<TimedMutex<T>, KernelError> {
        if let Err(err) = self.objects.reserve_mutex() {
            if let KernelError::OutOfResources { kind, capacity } = err {
                self.hooks
                    .notify(&KernelEvent::ResourceExhausted { kind, capacity });
            }
            return Err(err);
        }
        Ok(TimedMutex::new(value, self.clock, self.objects.clone()))
    }
}

/// Static description of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    /// Task name used in logs
    pub name: &'static str,
    /// Priority (higher = more important)
    pub priority: u8,
}

impl TaskSpec {
    pub fn new(name: &'static str, priority: u8) -> Self {
        Self { name, priority }
    }
}

/// Final state of a task once its body returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskExit {
    pub name: &'static str,
    pub priority: u8,
    /// Reason for a fatal exit; `None` for a clean return
    pub error: Option<String>,
}

struct PendingTask {
    spec: TaskSpec,
    /// Registration order, to keep equal priorities stable
    seq: usize,
    body: TaskBody,
}

impl Eq for PendingTask {}

impl PartialEq for PendingTask {
    fn eq(&self, other: &Self) -> bool {
        self.spec.priority == other.spec.priority && self.seq == other.seq
    }
}

impl Ord for PendingTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first, then earliest registration
        self.spec
            .priority
            .cmp(&other.spec.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PendingTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Aborts the spawned task bodies when the scheduler is stopped
struct RunningTasks(Vec<AbortHandle>);

impl Drop for RunningTasks {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Collects tasks and starts them in priority order
pub struct Scheduler {
    kernel: Kernel,
    queue: BinaryHeap<PendingTask>,
}

impl Scheduler {
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            queue: BinaryHeap::new(),
        }
    }

    /// Register a task body to be started by [`Scheduler::start`]
    pub fn create_task<F>(&mut self, spec: TaskSpec, body: F)
    where
        F: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        debug!("Task {} registered at priority {}", spec.name, spec.priority);
        let seq = self.queue.len();
        self.queue.push(PendingTask {
            spec,
            seq,
            body: Box::pin(body),
        });
    }

    /// Number of registered tasks
    pub fn task_count(&self) -> usize {
        self.queue.len()
    }

    /// Spawn every task, highest priority first, and collect exits as they happen.
    ///
    /// Under normal operation tasks never return, so neither does this.
    /// Dropping the returned future stops every task it started.
    pub async fn start(mut self) -> Vec<TaskExit> {
        info!("Starting scheduler with {} tasks", self.queue.len());

        let mut running = RunningTasks(Vec::with_capacity(self.queue.len()));
        let mut watchers = JoinSet::new();
        while let Some(task) = self.queue.pop() {
            info!("Spawning {} (priority {})", task.spec.name, task.spec.priority);
            let handle = tokio::spawn(task.body);
            running.0.push(handle.abort_handle());
            let spec = task.spec;
            watchers.spawn(async move { (spec, handle.await) });
        }

        let mut exits = Vec::with_capacity(watchers.len());
        while let Some(joined) = watchers.join_next().await {
            let Ok((spec, outcome)) = joined else {
                continue;
            };
            let error = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(join) => Some(format!("task aborted: {}", join)),
            };
            match &error {
                Some(reason) => error!("{} terminated: {}", spec.name, reason),
                None => info!("{} returned", spec.name),
            }
            self.kernel.hooks.notify(&KernelEvent::TaskExited {
                task: spec.name,
                error: error.clone(),
            });
            exits.push(TaskExit {
                name: spec.name,
                priority: spec.priority,
                error,
            });
        }
        exits
    }
}
