//! Quantity accounting.
//!
//! `ItemCatalog` maps goods to signed amounts. Keys exist only once touched:
//! `get` on an untouched good is an error, not zero. The `_no_minus` variants
//! are the guarded paths and either apply completely or not at all.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EconError, Result};
use crate::types::{Amount, GoodId};

// === ITEM SET ===

/// A good paired with a signed amount: a quantity or a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemSet {
    pub good: GoodId,
    pub amount: Amount,
}

impl ItemSet {
    pub fn new(good: GoodId, amount: Amount) -> Self {
        Self { good, amount }
    }

    pub fn minus(&self) -> Self {
        Self {
            good: self.good,
            amount: -self.amount,
        }
    }
}

// === ITEM CATALOG ===

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCatalog {
    amounts: BTreeMap<GoodId, Amount>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sets(sets: impl IntoIterator<Item = ItemSet>) -> Self {
        let mut catalog = Self::new();
        catalog.put(sets);
        catalog
    }

    /// Accumulate `set` unconditionally, creating the key if needed.
    pub fn add(&mut self, set: ItemSet) {
        *self.amounts.entry(set.good).or_insert(0) += set.amount;
    }

    /// Accumulate `set` only if the resulting amount stays non-negative.
    pub fn add_no_minus(&mut self, set: ItemSet) -> Result<()> {
        let have = self.amount_or_zero(set.good);
        if have + set.amount < 0 {
            return Err(EconError::InsufficientStock {
                good: set.good,
                have,
                delta: set.amount,
            });
        }
        self.add(set);
        Ok(())
    }

    pub fn put(&mut self, sets: impl IntoIterator<Item = ItemSet>) {
        for set in sets {
            self.add(set);
        }
    }

    pub fn get(&self, good: GoodId) -> Result<Amount> {
        self.amounts
            .get(&good)
            .copied()
            .ok_or(EconError::MissingKey { good })
    }

    /// Amount held, treating an untouched good as zero.
    pub fn amount_or_zero(&self, good: GoodId) -> Amount {
        self.amounts.get(&good).copied().unwrap_or(0)
    }

    pub fn merge(&mut self, other: &ItemCatalog) -> &mut Self {
        for (&good, &amount) in &other.amounts {
            self.add(ItemSet::new(good, amount));
        }
        self
    }

    /// Merge `other` only if no good it touches would end up negative.
    ///
    /// The merge is tried on a copy first so a shortfall discovered on the
    /// third good cannot leave the first two applied.
    pub fn merge_no_minus(&mut self, other: &ItemCatalog) -> Result<&mut Self> {
        let mut trial = self.clone();
        trial.merge(other);
        for (&good, &delta) in &other.amounts {
            if trial.amount_or_zero(good) < 0 {
                return Err(EconError::InsufficientStock {
                    good,
                    have: self.amount_or_zero(good),
                    delta,
                });
            }
        }
        Ok(self.merge(other))
    }

    /// Pass the catalog through if every amount is non-negative.
    pub fn check_no_minus(self) -> Result<Self> {
        if let Some((&good, &amount)) = self.amounts.iter().find(|(_, a)| **a < 0) {
            return Err(EconError::NegativeCatalog { good, amount });
        }
        Ok(self)
    }

    pub fn minus(&self) -> ItemCatalog {
        ItemCatalog {
            amounts: self.amounts.iter().map(|(&g, &a)| (g, -a)).collect(),
        }
    }

    pub fn contains(&self, good: GoodId) -> bool {
        self.amounts.contains_key(&good)
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemSet> + '_ {
        self.amounts.iter().map(|(&g, &a)| ItemSet::new(g, a))
    }

    pub fn goods(&self) -> impl Iterator<Item = GoodId> + '_ {
        self.amounts.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

impl FromIterator<ItemSet> for ItemCatalog {
    fn from_iter<T: IntoIterator<Item = ItemSet>>(iter: T) -> Self {
        Self::from_sets(iter)
    }
}
