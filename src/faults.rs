use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::time::Duration;

/// Uniform random source injected into every probabilistic decision.
///
/// Core logic never reaches for a global generator; tests substitute a
/// scripted source to make drop/jitter/duplicate/overload rolls
/// deterministic.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// Entropy-seeded random source used outside tests.
#[derive(Debug)]
pub struct EntropyRandom {
    rng: StdRng,
}

impl EntropyRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded constructor for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for EntropyRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropyRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Uniform sample in `[lo, hi)` derived from a unit roll.
pub fn sample_range(rng: &mut dyn RandomSource, lo: f64, hi: f64) -> f64 {
    lo + rng.next_unit() * (hi - lo)
}

/// Synthetic transport fault probabilities rolled by the sender before each
/// transmission.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FaultProfile {
    /// Chance the request never reaches the receiver (observed as a timeout).
    pub p_drop: f64,
    /// Chance of a random delay before the send.
    pub p_jitter: f64,
    pub max_jitter_seconds: f64,
    /// Chance the event is transmitted twice in immediate succession.
    pub p_duplicate: f64,
}

impl Default for FaultProfile {
    fn default() -> Self {
        Self {
            p_drop: 0.15,
            p_jitter: 0.20,
            max_jitter_seconds: 2.0,
            p_duplicate: 0.10,
        }
    }
}

impl FaultProfile {
    /// Profile with every fault disabled, for clean-channel runs and tests.
    pub fn none() -> Self {
        Self {
            p_drop: 0.0,
            p_jitter: 0.0,
            max_jitter_seconds: 0.0,
            p_duplicate: 0.0,
        }
    }

    pub fn should_drop(&self, rng: &mut dyn RandomSource) -> bool {
        rng.next_unit() < self.p_drop
    }

    /// Rolls for jitter; `Some(delay)` means the sender pauses before
    /// transmitting.
    pub fn jitter_delay(&self, rng: &mut dyn RandomSource) -> Option<Duration> {
        if rng.next_unit() >= self.p_jitter {
            return None;
        }
        let seconds = sample_range(rng, 0.0, self.max_jitter_seconds.max(0.0));
        Some(Duration::from_secs_f64(seconds))
    }

    pub fn should_duplicate(&self, rng: &mut dyn RandomSource) -> bool {
        rng.next_unit() < self.p_duplicate
    }
}

/// Receiver-side backpressure simulation: a probabilistic transient rejection
/// used to exercise sender retry logic without a real overload condition.
pub struct OverloadGate {
    probability: f64,
    rng: parking_lot::Mutex<Box<dyn RandomSource + Send>>,
}

impl OverloadGate {
    pub fn new(probability: f64, rng: Box<dyn RandomSource + Send>) -> Self {
        Self {
            probability,
            rng: parking_lot::Mutex::new(rng),
        }
    }

    /// Gate that never fires.
    pub fn disabled() -> Self {
        Self::new(0.0, Box::new(EntropyRandom::new()))
    }

    /// Rolls the gate for one inbound request.
    pub fn fires(&self) -> bool {
        if self.probability <= 0.0 {
            return false;
        }
        self.rng.lock().next_unit() < self.probability
    }
}

impl std::fmt::Debug for OverloadGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverloadGate")
            .field("probability", &self.probability)
            .finish()
    }
}
