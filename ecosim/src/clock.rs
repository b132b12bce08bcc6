use serde::{Deserialize, Serialize};

use crate::types::Tick;

/// The single authoritative tick counter shared by every timer and estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldClock {
    tick: Tick,
}

impl WorldClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock positioned at an arbitrary tick. Mostly for tests.
    pub fn at(tick: Tick) -> Self {
        Self { tick }
    }

    pub fn now(&self) -> Tick {
        self.tick
    }

    pub fn advance(&mut self) -> Tick {
        self.tick += 1;
        self.tick
    }
}
