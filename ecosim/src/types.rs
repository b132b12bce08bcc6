use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

// ============================================================================
// IDs
// ============================================================================

new_key_type! {
    /// Interned handle for a good. Ordered by registration.
    pub struct GoodId;
}

/// Signed quantity of a good. Positive = held/acquired, negative = owed/consumed.
pub type Amount = i64;

/// Simulation time, in ticks.
pub type Tick = u64;

/// Position of an agent in the market roster.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position of a recipe in the world's recipe book.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

impl RecipeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Trait for converting SlotMap keys to u64 for trace and WASM boundaries
pub trait KeyToU64 {
    fn to_u64(self) -> u64;
}

impl KeyToU64 for GoodId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}
