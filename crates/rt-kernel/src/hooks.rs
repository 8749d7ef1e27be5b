//! Kernel notification hooks

use std::fmt;
use std::sync::Arc;

/// Events the kernel reports to registered hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelEvent {
    /// A primitive could not be created because its budget is spent
    ResourceExhausted { kind: &'static str, capacity: usize },
    /// A task returned from its body; `error` is set for fatal exits
    TaskExited {
        task: &'static str,
        error: Option<String>,
    },
}

type Hook = Arc<dyn Fn(&KernelEvent) + Send + Sync>;

/// Callbacks invoked on kernel events
#[derive(Clone, Default)]
pub struct KernelHooks {
    hooks: Vec<Hook>,
}

impl KernelHooks {
    /// Create an empty hook set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every kernel event
    pub fn on_event<F>(mut self, hook: F) -> Self
    where
        F: Fn(&KernelEvent) + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Deliver an event to all callbacks
    pub fn notify(&self, event: &KernelEvent) {
        for hook in &self.hooks {
            hook(event);
        }
    }
}

impl fmt::Debug for KernelHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelHooks")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_hooks_receive_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hooks = KernelHooks::new().on_event(move |e| sink.lock().unwrap().push(e.clone()));

        hooks.notify(&KernelEvent::ResourceExhausted { kind: "mutex", capacity: 1 });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(seen[0], KernelEvent::ResourceExhausted { capacity: 1, .. }));
    }
}
