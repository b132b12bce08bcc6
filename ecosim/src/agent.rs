use std::collections::BTreeMap;

use rand::Rng;

use crate::catalog::{ItemCatalog, ItemSet};
use crate::clock::WorldClock;
use crate::error::Result;
use crate::expect::Expect;
use crate::recipe::Recipe;
use crate::timer::{Progress, Schedule};
use crate::types::{AgentId, GoodId, RecipeId, Tick};

// === ORDER ===

/// What an agent would buy and sell right now. Rebuilt on every request.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub agent: AgentId,
    /// Shortfall per good after the next consumption
    pub buy_goods: ItemCatalog,
    /// Surplus per good after the next consumption
    pub sel_goods: ItemCatalog,
}

// === AGENT ===

/// A producer/consumer in the market.
///
/// Production credits `products` whenever the stochastic `progress` gate fires.
/// Consumption debits `necessities` whenever the periodic `schedule` fires, and
/// may drive a needed good negative; the next order asks the market to cover it.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    products: ItemCatalog,
    necessities: ItemCatalog,
    properties: ItemCatalog,
    schedule: Schedule,
    progress: Progress,
    expects: BTreeMap<GoodId, Expect>,
    /// Recipes run in the manufacturing pass
    recipes: Vec<RecipeId>,
}

impl Agent {
    /// Build an agent. All three catalogs must be non-negative. The agent
    /// takes its own schedule and progress; clone them to share parameters.
    pub fn new(
        name: impl Into<String>,
        products: ItemCatalog,
        necessities: ItemCatalog,
        properties: ItemCatalog,
        schedule: Schedule,
        progress: Progress,
        now: Tick,
    ) -> Result<Self> {
        let products = products.check_no_minus()?;
        let necessities = necessities.check_no_minus()?;
        let properties = properties.check_no_minus()?;
        let expects = necessities.goods().map(|g| (g, Expect::new(now))).collect();
        Ok(Self {
            id: AgentId::new(0),
            name: name.into(),
            products,
            necessities,
            properties,
            schedule,
            progress,
            expects,
            recipes: Vec::new(),
        })
    }

    pub fn with_recipe(mut self, recipe: RecipeId) -> Self {
        self.recipes.push(recipe);
        self
    }

    /// Credit one round of products if the production gate fires.
    pub fn produce<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.progress.update(rng) {
            return false;
        }
        self.properties.merge(&self.products);
        true
    }

    /// Debit one round of necessities if the schedule fires.
    pub fn consume(&mut self, clock: &WorldClock) -> bool {
        if !self.schedule.update(clock) {
            return false;
        }
        self.properties.merge(&self.necessities.minus());
        true
    }

    /// Take delivery of `set`, feeding the forecast for needed goods.
    pub fn accept(&mut self, set: ItemSet, clock: &WorldClock) {
        self.properties.add(set);
        if let Some(expect) = self.expects.get_mut(&set.good) {
            expect.estimate(set.amount, clock);
        }
    }

    /// Hand over `set`. Fails without effect if the agent cannot cover it.
    pub fn pay(&mut self, set: ItemSet) -> Result<()> {
        self.properties.add_no_minus(set.minus())
    }

    pub fn manufact(&mut self, recipe: &Recipe) -> bool {
        recipe.manufact(&mut self.properties)
    }

    pub fn manufact_all(&mut self, recipe: &Recipe) -> u32 {
        recipe.manufact_all(&mut self.properties)
    }

    /// Project properties past the next consumption and split the result
    /// into a shortfall (buy) side and a surplus (sell) side.
    pub fn make_order(&self) -> Order {
        let mut future_assets = self.necessities.minus();
        future_assets.merge(&self.properties);

        let buy_goods = future_assets
            .iter()
            .filter(|set| set.amount < 0)
            .map(|set| set.minus())
            .collect();
        let sel_goods = future_assets.iter().filter(|set| set.amount > 0).collect();

        Order {
            agent: self.id,
            buy_goods,
            sel_goods,
        }
    }

    pub fn products(&self) -> &ItemCatalog {
        &self.products
    }

    pub fn necessities(&self) -> &ItemCatalog {
        &self.necessities
    }

    pub fn properties(&self) -> &ItemCatalog {
        &self.properties
    }

    /// Direct ledger access for scenario setup; bypasses every guard.
    pub fn properties_mut(&mut self) -> &mut ItemCatalog {
        &mut self.properties
    }

    pub fn expect(&self, good: GoodId) -> Option<&Expect> {
        self.expects.get(&good)
    }

    pub fn expects(&self) -> impl Iterator<Item = (GoodId, &Expect)> {
        self.expects.iter().map(|(&g, e)| (g, e))
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn recipes(&self) -> &[RecipeId] {
        &self.recipes
    }
}
