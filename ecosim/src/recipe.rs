// Recipe definitions for goods transformation

use crate::catalog::ItemCatalog;
use crate::error::{EconError, Result};

/// A fixed conversion: debit `src`, credit `dst`.
///
/// Recipes live in the world's recipe book and are shared by every agent that
/// runs them; nothing mutates a recipe after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    name: String,
    src: ItemCatalog,
    dst: ItemCatalog,
}

impl Recipe {
    pub fn new(name: impl Into<String>, src: ItemCatalog, dst: ItemCatalog) -> Result<Self> {
        let name = name.into();
        let src = src.check_no_minus()?;
        let dst = dst.check_no_minus()?;
        if !src.iter().any(|set| set.amount > 0) {
            return Err(EconError::EmptyRecipeInput(name));
        }
        Ok(Self { name, src, dst })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &ItemCatalog {
        &self.src
    }

    pub fn outputs(&self) -> &ItemCatalog {
        &self.dst
    }

    /// Run one batch against `properties`. Returns false, with no side
    /// effect, when the inputs are not covered.
    pub fn manufact(&self, properties: &mut ItemCatalog) -> bool {
        if properties.merge_no_minus(&self.src.minus()).is_err() {
            return false;
        }
        properties.merge(&self.dst);
        true
    }

    /// Run batches until the inputs run out. Returns the batch count.
    pub fn manufact_all(&self, properties: &mut ItemCatalog) -> u32 {
        let mut batches = 0;
        while self.manufact(properties) {
            batches += 1;
        }
        batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemSet;
    use crate::goods::GoodRegistry;
    use crate::types::GoodId;

    fn setup() -> (GoodId, GoodId, GoodId, Recipe) {
        let mut goods = GoodRegistry::new();
        let labor = goods.intern("LABOR");
        let money = goods.intern("MONEY");
        let meal = goods.intern("MEAL");
        // 2 labor -> 1 meal
        let recipe = Recipe::new(
            "Cooking",
            ItemCatalog::from_sets([ItemSet::new(labor, 2)]),
            ItemCatalog::from_sets([ItemSet::new(meal, 1)]),
        )
        .unwrap();
        (labor, money, meal, recipe)
    }

    #[test]
    fn test_rejects_negative_catalogs() {
        let mut goods = GoodRegistry::new();
        let labor = goods.intern("LABOR");
        let meal = goods.intern("MEAL");

        let bad_src = Recipe::new(
            "Bad",
            ItemCatalog::from_sets([ItemSet::new(labor, -1)]),
            ItemCatalog::from_sets([ItemSet::new(meal, 1)]),
        );
        assert!(bad_src.is_err());

        let bad_dst = Recipe::new(
            "Bad",
            ItemCatalog::from_sets([ItemSet::new(labor, 1)]),
            ItemCatalog::from_sets([ItemSet::new(meal, -1)]),
        );
        assert!(bad_dst.is_err());
    }

    #[test]
    fn test_rejects_free_recipe() {
        let mut goods = GoodRegistry::new();
        let none = goods.intern("NONE");
        let meal = goods.intern("MEAL");

        let free = Recipe::new(
            "Free Lunch",
            ItemCatalog::from_sets([ItemSet::new(none, 0)]),
            ItemCatalog::from_sets([ItemSet::new(meal, 1)]),
        );
        assert!(matches!(free, Err(EconError::EmptyRecipeInput(name)) if name == "Free Lunch"));
    }

    #[test]
    fn test_manufact_converts_one_batch() {
        let (labor, money, meal, recipe) = setup();
        let mut properties =
            ItemCatalog::from_sets([ItemSet::new(labor, 3), ItemSet::new(money, 1)]);

        assert!(recipe.manufact(&mut properties));
        assert_eq!(properties.get(labor).unwrap(), 1);
        assert_eq!(properties.get(meal).unwrap(), 1);
        assert_eq!(properties.get(money).unwrap(), 1);
    }

    #[test]
    fn test_manufact_without_inputs_has_no_side_effect() {
        let (labor, _, meal, recipe) = setup();
        let mut properties = ItemCatalog::from_sets([ItemSet::new(labor, 1)]);
        let before = properties.clone();

        assert!(!recipe.manufact(&mut properties));
        assert_eq!(properties, before);
        assert!(!properties.contains(meal));
    }

    #[test]
    fn test_manufact_all_runs_until_exhausted() {
        let (labor, _, meal, recipe) = setup();
        let mut properties = ItemCatalog::from_sets([ItemSet::new(labor, 7)]);

        assert_eq!(recipe.manufact_all(&mut properties), 3);
        assert_eq!(properties.get(labor).unwrap(), 1);
        assert_eq!(properties.get(meal).unwrap(), 3);

        // Next call converts nothing and changes nothing
        let before = properties.clone();
        assert!(!recipe.manufact(&mut properties));
        assert_eq!(recipe.manufact_all(&mut properties), 0);
        assert_eq!(properties, before);
    }
}
