//! Scenario configuration.
//!
//! A scenario is plain data (JSON via serde): the goods, the recipe book, the
//! agent roster and the price list. `build` turns it into a validated `World`;
//! every configuration defect surfaces here, before the first tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::catalog::{ItemCatalog, ItemSet};
use crate::error::{EconError, Result};
use crate::goods::GoodRegistry;
use crate::market::{Market, Price};
use crate::recipe::Recipe;
use crate::timer::{Progress, Schedule};
use crate::types::{Amount, Tick};
use crate::world::World;

fn one() -> u32 {
    1
}

fn unit() -> Amount {
    1
}

/// Good name -> amount.
pub type CatalogConfig = BTreeMap<String, Amount>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub seed: u64,
    pub goods: Vec<String>,
    #[serde(default)]
    pub recipes: Vec<RecipeConfig>,
    pub agents: Vec<AgentConfig>,
    pub prices: Vec<PriceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeConfig {
    pub name: String,
    pub inputs: CatalogConfig,
    pub outputs: CatalogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    /// Replicas to create; more than one numbers the names (`A1`, `A2`, ...).
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub products: CatalogConfig,
    #[serde(default)]
    pub necessities: CatalogConfig,
    #[serde(default)]
    pub properties: CatalogConfig,
    /// Consumption period in ticks
    pub schedule: Tick,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub recipes: Vec<String>,
}

/// Production gate parameters. The default never fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    pub mu: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceConfig {
    pub good: String,
    /// Quantity the tag refers to; must be 1.
    #[serde(default = "unit")]
    pub per: Amount,
    pub tag: String,
    pub amount: Amount,
}

impl ScenarioConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Intern goods, resolve names, and validate the whole scenario.
    pub fn build(&self) -> Result<World> {
        let goods = GoodRegistry::with_goods(self.goods.iter().cloned());

        let prices = self
            .prices
            .iter()
            .map(|p| {
                Price::new(
                    ItemSet::new(goods.lookup(&p.good)?, p.per),
                    ItemSet::new(goods.lookup(&p.tag)?, p.amount),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let mut world = World::new(goods, Market::new(prices), self.seed);

        for recipe in &self.recipes {
            if world.find_recipe(&recipe.name).is_some() {
                return Err(EconError::DuplicateRecipe(recipe.name.clone()));
            }
            let built = Recipe::new(
                recipe.name.clone(),
                catalog(&world.goods, &recipe.inputs)?,
                catalog(&world.goods, &recipe.outputs)?,
            )?;
            world.add_recipe(built);
        }

        for spec in &self.agents {
            if spec.count == 0 {
                return Err(EconError::NoReplicas(spec.name.clone()));
            }
            let recipe_ids = spec
                .recipes
                .iter()
                .map(|name| {
                    world
                        .find_recipe(name)
                        .ok_or_else(|| EconError::UnknownRecipe(name.clone()))
                })
                .collect::<Result<Vec<_>>>()?;

            let products = catalog(&world.goods, &spec.products)?;
            let necessities = catalog(&world.goods, &spec.necessities)?;
            let properties = catalog(&world.goods, &spec.properties)?;
            let schedule = Schedule::new(spec.schedule, &world.clock);
            let progress = Progress::new(spec.progress.mu, spec.progress.sigma)?;

            for replica in 1..=spec.count {
                let name = if spec.count > 1 {
                    format!("{}{}", spec.name, replica)
                } else {
                    spec.name.clone()
                };
                let mut agent = Agent::new(
                    name,
                    products.clone(),
                    necessities.clone(),
                    properties.clone(),
                    schedule.clone(),
                    progress.clone(),
                    world.clock.now(),
                )?;
                for &id in &recipe_ids {
                    agent = agent.with_recipe(id);
                }
                world.add_agent(agent);
            }
        }

        world.validate()?;
        Ok(world)
    }

    /// Three workers who sell labor and eat meals, and a plant that buys
    /// labor and cooks it into meals. The plant's labor need only drives its
    /// orders; it never eats, so every unit it buys goes into the pot.
    pub fn sample() -> Self {
        fn cat(entries: &[(&str, Amount)]) -> CatalogConfig {
            entries.iter().map(|(g, a)| (g.to_string(), *a)).collect()
        }

        Self {
            seed: 0,
            goods: ["NONE", "LABOR", "MONEY", "MEAL"]
                .map(String::from)
                .to_vec(),
            recipes: vec![RecipeConfig {
                name: "Cooking".to_string(),
                inputs: cat(&[("LABOR", 1)]),
                outputs: cat(&[("MEAL", 1)]),
            }],
            agents: vec![
                AgentConfig {
                    name: "A".to_string(),
                    count: 3,
                    products: cat(&[("LABOR", 1)]),
                    necessities: cat(&[("MEAL", 1)]),
                    properties: cat(&[("MONEY", 1)]),
                    schedule: 1,
                    progress: ProgressConfig { mu: 1.0, sigma: 0.0 },
                    recipes: Vec::new(),
                },
                AgentConfig {
                    name: "Plant".to_string(),
                    count: 1,
                    products: cat(&[("NONE", 0)]),
                    necessities: cat(&[("LABOR", 1)]),
                    properties: cat(&[("MONEY", 100)]),
                    schedule: Tick::MAX,
                    progress: ProgressConfig::default(),
                    recipes: vec!["Cooking".to_string()],
                },
            ],
            prices: vec![
                PriceConfig {
                    good: "LABOR".to_string(),
                    per: 1,
                    tag: "MONEY".to_string(),
                    amount: 1,
                },
                PriceConfig {
                    good: "MEAL".to_string(),
                    per: 1,
                    tag: "MONEY".to_string(),
                    amount: 1,
                },
            ],
        }
    }
}

fn catalog(goods: &GoodRegistry, entries: &CatalogConfig) -> Result<ItemCatalog> {
    entries
        .iter()
        .map(|(name, &amount)| Ok(ItemSet::new(goods.lookup(name)?, amount)))
        .collect::<Result<ItemCatalog>>()
}

impl World {
    pub fn from_config(config: &ScenarioConfig) -> Result<Self> {
        config.build()
    }
}
