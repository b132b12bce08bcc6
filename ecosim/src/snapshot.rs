use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::catalog::ItemSet;
use crate::goods::GoodRegistry;
use crate::market::Market;
use crate::types::AgentId;
use crate::world::{TickReport, World};

// ============================================================================
// Snapshots - name-resolved views for the WASM boundary
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct StateSnapshot {
    pub tick: u64,
    pub agents: Vec<AgentSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct AgentSnapshot {
    pub id: u32,
    pub name: String,
    pub properties: Vec<ItemSnapshot>,
    pub forecasts: Vec<ForecastSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct ItemSnapshot {
    pub good: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct ForecastSnapshot {
    pub good: String,
    pub forecast: f64,
    pub rate: f64,
    pub samples: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct TradeSnapshot {
    pub buyer: String,
    pub seller: String,
    pub bought: ItemSnapshot,
    pub price: ItemSnapshot,
    pub settled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct TickSnapshot {
    pub tick: u64,
    pub produced: Vec<String>,
    pub consumed: Vec<String>,
    pub manufactured: Vec<String>,
    /// Settled trades first, then payment failures
    pub trades: Vec<TradeSnapshot>,
}

impl ItemSnapshot {
    fn new(goods: &GoodRegistry, set: ItemSet) -> Self {
        Self {
            good: goods.name(set.good).to_string(),
            amount: set.amount,
        }
    }
}

fn agent_name(market: &Market, id: AgentId) -> String {
    market
        .agent(id)
        .map(|a| a.name.clone())
        .unwrap_or_else(|| format!("#{}", id.0))
}

impl StateSnapshot {
    pub fn capture(world: &World) -> Self {
        let agents = world
            .market
            .agents()
            .iter()
            .map(|agent| AgentSnapshot {
                id: agent.id.0,
                name: agent.name.clone(),
                properties: agent
                    .properties()
                    .iter()
                    .map(|set| ItemSnapshot::new(&world.goods, set))
                    .collect(),
                forecasts: agent
                    .expects()
                    .map(|(good, expect)| ForecastSnapshot {
                        good: world.goods.name(good).to_string(),
                        forecast: expect.forecast(),
                        rate: expect.rate(),
                        samples: expect.count(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            tick: world.tick(),
            agents,
        }
    }
}

impl TickSnapshot {
    pub fn capture(report: &TickReport, world: &World) -> Self {
        let market = &world.market;
        let names = |ids: &[AgentId]| -> Vec<String> {
            ids.iter().map(|&id| agent_name(market, id)).collect()
        };

        let settled = report.market.trades.iter().map(|t| TradeSnapshot {
            buyer: agent_name(market, t.buyer),
            seller: agent_name(market, t.seller),
            bought: ItemSnapshot::new(&world.goods, t.bought),
            price: ItemSnapshot::new(&world.goods, t.price),
            settled: true,
        });
        let failed = report.market.failures.iter().map(|f| TradeSnapshot {
            buyer: agent_name(market, f.buyer),
            seller: agent_name(market, f.seller),
            bought: ItemSnapshot::new(&world.goods, f.bought),
            price: ItemSnapshot::new(&world.goods, f.price),
            settled: false,
        });

        Self {
            tick: report.tick,
            produced: names(&report.produced),
            consumed: names(&report.consumed),
            manufactured: report
                .manufactured
                .iter()
                .map(|&(agent, recipe, batches)| {
                    let recipe = world
                        .recipes
                        .get(recipe.index())
                        .map(|r| r.name())
                        .unwrap_or("?");
                    format!("{} {}x{}", agent_name(market, agent), recipe, batches)
                })
                .collect(),
            trades: settled.chain(failed).collect(),
        }
    }
}
