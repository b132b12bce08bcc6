// World state and the tick loop

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::clock::WorldClock;
use crate::error::{EconError, Result};
use crate::goods::GoodRegistry;
use crate::market::{Market, MarketReport};
use crate::recipe::Recipe;
use crate::types::{AgentId, RecipeId, Tick};

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: Tick,
    pub produced: Vec<AgentId>,
    pub consumed: Vec<AgentId>,
    /// (agent, recipe, batches) for every recipe that converted at least once
    pub manufactured: Vec<(AgentId, RecipeId, u32)>,
    pub market: MarketReport,
}

/// Complete state of the simulation
#[derive(Debug, Clone)]
pub struct World {
    pub clock: WorldClock,
    pub goods: GoodRegistry,
    pub recipes: Vec<Recipe>,
    pub market: Market,
    rng: StdRng,
}

impl World {
    pub fn new(goods: GoodRegistry, market: Market, seed: u64) -> Self {
        Self {
            clock: WorldClock::new(),
            goods,
            recipes: Vec::new(),
            market,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn tick(&self) -> Tick {
        self.clock.now()
    }

    // === Setup ===

    pub fn add_recipe(&mut self, recipe: Recipe) -> RecipeId {
        let id = RecipeId::new(self.recipes.len() as u32);
        self.recipes.push(recipe);
        id
    }

    pub fn find_recipe(&self, name: &str) -> Option<RecipeId> {
        self.recipes
            .iter()
            .position(|r| r.name() == name)
            .map(|i| RecipeId::new(i as u32))
    }

    pub fn add_agent(&mut self, agent: Agent) -> AgentId {
        self.market.add_agent(agent)
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.market.agent(id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.market.agent_mut(id)
    }

    /// Check configuration before running: every recipe an agent names must
    /// exist, and every good an agent can come to need must be priced.
    pub fn validate(&self) -> Result<()> {
        for agent in self.market.agents() {
            for recipe in agent.recipes() {
                if recipe.index() >= self.recipes.len() {
                    return Err(EconError::UnknownRecipe(format!("#{}", recipe.0)));
                }
            }
            self.market.check_prices(agent.necessities().goods())?;
        }
        Ok(())
    }

    // === Tick ===

    /// Advance the simulation by one tick.
    ///
    /// Production, consumption and manufacturing passes over every agent,
    /// then the market pass, then the clock moves on.
    pub fn run_tick(&mut self) -> Result<TickReport> {
        let tick = self.clock.now();
        let mut report = TickReport {
            tick,
            ..Default::default()
        };

        // 1. Production
        for agent in self.market.agents_mut() {
            if agent.produce(&mut self.rng) {
                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "produce",
                    tick = tick,
                    agent_id = agent.id.0,
                    agent = agent.name.as_str(),
                );
                report.produced.push(agent.id);
            }
        }

        // 2. Consumption
        for agent in self.market.agents_mut() {
            if agent.consume(&self.clock) {
                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "consume",
                    tick = tick,
                    agent_id = agent.id.0,
                    agent = agent.name.as_str(),
                );
                report.consumed.push(agent.id);
            }
        }

        // 3. Manufacturing
        for agent in self.market.agents_mut() {
            let recipe_ids = agent.recipes().to_vec();
            for recipe_id in recipe_ids {
                let recipe = self
                    .recipes
                    .get(recipe_id.index())
                    .ok_or_else(|| EconError::UnknownRecipe(format!("#{}", recipe_id.0)))?;
                let batches = agent.manufact_all(recipe);
                if batches == 0 {
                    continue;
                }

                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "manufact",
                    tick = tick,
                    agent_id = agent.id.0,
                    agent = agent.name.as_str(),
                    recipe = recipe.name(),
                    batches = batches,
                );
                report.manufactured.push((agent.id, recipe_id, batches));
            }
        }

        // 4. Market
        report.market = self.market.on_market(&self.clock)?;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "tick",
            tick = tick,
            produced = report.produced.len() as u64,
            consumed = report.consumed.len() as u64,
            trades = report.market.trades.len() as u64,
            failures = report.market.failures.len() as u64,
        );

        // 5. Clock
        self.clock.advance();
        Ok(report)
    }

    /// Run `ticks` ticks, stopping at the first configuration error.
    pub fn run(&mut self, ticks: u64) -> Result<Vec<TickReport>> {
        (0..ticks).map(|_| self.run_tick()).collect()
    }
}
