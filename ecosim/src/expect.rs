//! Acquisition forecasting.
//!
//! Each agent keeps one `Expect` per needed good. Every accepted transfer of
//! that good feeds `estimate`, which maintains two running means with equal
//! per-sample weight:
//! - `forecast`: ticks between acquisitions
//! - `rate`: amount acquired per tick

use serde::{Deserialize, Serialize};

use crate::clock::WorldClock;
use crate::types::{Amount, Tick};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expect {
    forecast: f64,
    rate: f64,
    last_tick: Tick,
    count: u32,
}

impl Expect {
    pub fn new(now: Tick) -> Self {
        Self {
            forecast: 0.0,
            rate: 0.0,
            last_tick: now,
            count: 0,
        }
    }

    pub fn estimate(&mut self, amount: Amount, clock: &WorldClock) {
        let now = clock.now();
        let amount = amount as f64;

        // A cycle length needs two samples; the first only seeds the rate.
        if self.count == 0 {
            self.rate = amount;
            self.count = 1;
            self.last_tick = now;
            return;
        }

        let term = now.saturating_sub(self.last_tick);
        if term > 0 {
            self.count += 1;
            let n = self.count as f64;
            let term = term as f64;
            self.forecast = ((n - 1.0) * self.forecast + term) / n;
            self.rate = ((n - 1.0) * self.rate + amount / term) / n;
            self.last_tick = now;
        } else {
            // Same-tick repeat: fold into the rate, leave the cycle alone.
            let n = self.count as f64;
            self.rate = ((n - 1.0) * self.rate + amount) / n;
        }
    }

    pub fn forecast(&self) -> f64 {
        self.forecast
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn last_tick(&self) -> Tick {
        self.last_tick
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
