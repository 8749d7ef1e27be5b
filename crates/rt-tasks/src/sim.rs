//! Deterministic pseudo-random draws for simulated load and traffic

use crate::config::OverrunConfig;
use rt_kernel::Ticks;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash-based generator; the same seed always yields the same sequence
#[derive(Debug, Clone)]
pub struct SimRng {
    seed: u64,
    counter: u64,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        self.counter.hash(&mut hasher);
        self.counter = self.counter.wrapping_add(1);
        hasher.finish()
    }

    /// Uniform-ish value in `0..bound`; `bound` must be non-zero
    pub fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }
}

/// Decides, per cycle, whether to stall the task to provoke a deadline miss
#[derive(Debug, Clone)]
pub struct OverrunInjector {
    one_in: u32,
    extra_ticks: Ticks,
    rng: SimRng,
}

impl OverrunInjector {
    pub fn new(config: &OverrunConfig) -> Self {
        Self {
            one_in: config.one_in,
            extra_ticks: config.extra_ticks,
            rng: SimRng::new(config.seed),
        }
    }

    /// Stall length for this cycle, if one should be injected
    pub fn draw(&mut self) -> Option<Ticks> {
        if self.one_in == 0 {
            return None;
        }
        (self.rng.below(u64::from(self.one_in)) == 0).then_some(self.extra_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_is_deterministic() {
        let a: Vec<_> = {
            let mut rng = SimRng::new(7);
            (0..5).map(|_| rng.next_u64()).collect()
        };
        let mut rng = SimRng::new(7);
        let b: Vec<_> = (0..5).map(|_| rng.next_u64()).collect();
        assert_eq!(a, b);
        assert_ne!(a[0], a[1]);
    }

    #[test]
    fn test_injector_modes() {
        let mut off = OverrunInjector::new(&OverrunConfig::default());
        assert!((0..100).all(|_| off.draw().is_none()));

        let always = OverrunConfig {
            one_in: 1,
            extra_ticks: 6,
            seed: 3,
        };
        let mut on = OverrunInjector::new(&always);
        assert!((0..100).all(|_| on.draw() == Some(6)));
    }

    #[test]
    fn test_injector_rate_is_plausible() {
        let config = OverrunConfig {
            one_in: 10,
            extra_ticks: 1,
            seed: 42,
        };
        let mut injector = OverrunInjector::new(&config);
        let hits = (0..10_000).filter(|_| injector.draw().is_some()).count();
        assert!((500..1500).contains(&hits), "hits = {}", hits);
    }
}
