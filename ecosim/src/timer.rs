//! Firing gates an agent composes.
//!
//! - `Schedule`: deterministic, fires every `duration` ticks (consumption)
//! - `Progress`: stochastic, fires when accumulated Gaussian draws cross 1 (production)

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::clock::WorldClock;
use crate::error::{EconError, Result};
use crate::types::Tick;

// === SCHEDULE ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    start: Tick,
    duration: Tick,
}

impl Schedule {
    pub fn new(duration: Tick, clock: &WorldClock) -> Self {
        Self {
            start: clock.now(),
            duration,
        }
    }

    /// Fire once `duration` ticks have passed since the last firing.
    /// Restarts from the current tick, so a late call neither drifts nor catches up.
    pub fn update(&mut self, clock: &WorldClock) -> bool {
        let now = clock.now();
        if now.saturating_sub(self.start) >= self.duration {
            self.start = now;
            true
        } else {
            false
        }
    }

    pub fn start(&self) -> Tick {
        self.start
    }

    pub fn duration(&self) -> Tick {
        self.duration
    }
}

// === PROGRESS ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    mu: f64,
    sigma: f64,
    tank: f64,
}

impl Progress {
    pub fn new(mu: f64, sigma: f64) -> Result<Self> {
        if !mu.is_finite() || !sigma.is_finite() || sigma < 0.0 {
            return Err(EconError::InvalidProgress { mu, sigma });
        }
        Ok(Self {
            mu,
            sigma,
            tank: 0.0,
        })
    }

    /// A gate that never fires, for agents with no stochastic production.
    pub fn idle() -> Self {
        Self {
            mu: 0.0,
            sigma: 0.0,
            tank: 0.0,
        }
    }

    /// Add one draw to the tank; fire when it reaches 1.
    ///
    /// Firing subtracts 1 rather than emptying the tank, so the overshoot
    /// carries over and the long-run firing rate tracks `mu` (for `mu <= 1`).
    pub fn update<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let z: f64 = StandardNormal.sample(rng);
        self.tank += self.mu + self.sigma * z;
        if self.tank >= 1.0 {
            self.tank -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn tank(&self) -> f64 {
        self.tank
    }
}
