use thiserror::Error;

use crate::types::{Amount, GoodId};

pub type Result<T, E = EconError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum EconError {
    /// A guarded debit would leave the good negative.
    #[error("insufficient stock of {good:?}: have {have}, change {delta}")]
    InsufficientStock {
        good: GoodId,
        have: Amount,
        delta: Amount,
    },

    #[error("no price listed for {good:?}")]
    MissingPrice { good: GoodId },

    #[error("price for {good:?} must be defined per unit, got {amount}")]
    UnitPriceViolation { good: GoodId, amount: Amount },

    #[error("price for {good:?} cannot be negative, got {amount}")]
    NegativePrice { good: GoodId, amount: Amount },

    /// Starting stock, needs, outputs and recipe terms are never negative.
    #[error("catalog holds negative {good:?}: {amount}")]
    NegativeCatalog { good: GoodId, amount: Amount },

    #[error("catalog has no entry for {good:?}")]
    MissingKey { good: GoodId },

    #[error("unknown good `{0}`")]
    UnknownGood(String),

    #[error("unknown recipe `{0}`")]
    UnknownRecipe(String),

    #[error("recipe `{0}` defined more than once")]
    DuplicateRecipe(String),

    #[error("agent `{0}` has a replica count of zero")]
    NoReplicas(String),

    /// A recipe that consumes nothing would convert forever.
    #[error("recipe `{0}` has no positive input")]
    EmptyRecipeInput(String),

    #[error("invalid progress parameters: mu={mu}, sigma={sigma}")]
    InvalidProgress { mu: f64, sigma: f64 },

    #[error("scenario config: {0}")]
    Config(#[from] serde_json::Error),
}

impl EconError {
    /// Expected economic failures that callers fold into "did not happen".
    /// Everything else is a configuration or contract defect.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EconError::InsufficientStock { .. })
    }
}
