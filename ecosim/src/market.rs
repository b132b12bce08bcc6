//! Pairwise matching market with fixed unit prices.
//!
//! Every tick, each agent visits every other agent in roster order. The buyer's
//! wants and the seller's offers are recomputed live at each step, so a trade
//! earlier in the pass shrinks what later pairings see. Roster order is the
//! tie-break: earlier agents buy first and sell first.

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::catalog::ItemSet;
use crate::clock::WorldClock;
use crate::error::{EconError, Result};
#[cfg(feature = "instrument")]
use crate::types::KeyToU64;
use crate::types::{AgentId, GoodId, Tick};

// === PRICE ===

/// Unit price: one unit of `goods` costs `tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    goods: ItemSet,
    tag: ItemSet,
}

impl Price {
    pub fn new(goods: ItemSet, tag: ItemSet) -> Result<Self> {
        if goods.amount != 1 {
            return Err(EconError::UnitPriceViolation {
                good: goods.good,
                amount: goods.amount,
            });
        }
        if tag.amount < 0 {
            return Err(EconError::NegativePrice {
                good: goods.good,
                amount: tag.amount,
            });
        }
        Ok(Self { goods, tag })
    }

    pub fn goods(&self) -> ItemSet {
        self.goods
    }

    pub fn tag(&self) -> ItemSet {
        self.tag
    }
}

// === TRADE RESULTS ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub tick: Tick,
    pub buyer: AgentId,
    pub seller: AgentId,
    pub bought: ItemSet,
    pub price: ItemSet,
}

/// A matched trade that did not settle because one side could not pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailure {
    pub tick: Tick,
    pub buyer: AgentId,
    pub seller: AgentId,
    pub bought: ItemSet,
    pub price: ItemSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketReport {
    pub trades: Vec<Trade>,
    pub failures: Vec<PaymentFailure>,
}

impl MarketReport {
    /// Total units of `good` that changed hands.
    pub fn volume(&self, good: GoodId) -> i64 {
        self.trades
            .iter()
            .filter(|t| t.bought.good == good)
            .map(|t| t.bought.amount)
            .sum()
    }
}

// === MARKET ===

#[derive(Debug, Clone, Default)]
pub struct Market {
    prices: Vec<Price>,
    roster: Vec<Agent>,
}

impl Market {
    pub fn new(prices: Vec<Price>) -> Self {
        Self {
            prices,
            roster: Vec::new(),
        }
    }

    /// Register an agent at the end of the roster.
    pub fn add_agent(&mut self, mut agent: Agent) -> AgentId {
        let id = AgentId::new(self.roster.len() as u32);
        agent.id = id;
        self.roster.push(agent);
        id
    }

    pub fn agents(&self) -> &[Agent] {
        &self.roster
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.roster
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.roster.get(id.index())
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.roster.get_mut(id.index())
    }

    pub fn find_agent(&self, name: &str) -> Option<&Agent> {
        self.roster.iter().find(|a| a.name == name)
    }

    pub fn prices(&self) -> &[Price] {
        &self.prices
    }

    /// Price of `set`: the listed tag scaled by the traded quantity.
    pub fn price_tag(&self, set: &ItemSet) -> Result<ItemSet> {
        let price = self
            .prices
            .iter()
            .find(|p| p.goods.good == set.good)
            .ok_or(EconError::MissingPrice { good: set.good })?;
        Ok(ItemSet::new(price.tag.good, price.tag.amount * set.amount))
    }

    /// Fail unless every good in `goods` has a listed price.
    pub fn check_prices(&self, goods: impl IntoIterator<Item = GoodId>) -> Result<()> {
        for good in goods {
            self.price_tag(&ItemSet::new(good, 0))?;
        }
        Ok(())
    }

    /// Run one matching pass over every (buyer, seller) pair.
    ///
    /// Payment shortfalls are reported and skipped. A missing price is a
    /// configuration defect and aborts the pass.
    pub fn on_market(&mut self, clock: &WorldClock) -> Result<MarketReport> {
        let mut report = MarketReport::default();
        let n = self.roster.len();

        for b in 0..n {
            for s in 0..n {
                if b == s {
                    continue;
                }
                let wants = self.roster[b].make_order().buy_goods;
                for want in wants.iter().filter(|w| w.amount > 0) {
                    let offers = self.roster[s].make_order().sel_goods;
                    let Ok(stock) = offers.get(want.good) else {
                        continue;
                    };
                    let bought = ItemSet::new(want.good, want.amount.min(stock));
                    let price = self.price_tag(&bought)?;

                    let (buyer, seller) = pair_mut(&mut self.roster, b, s);
                    settle(buyer, seller, bought, price, clock, &mut report);
                }
            }
        }

        Ok(report)
    }
}

/// Pay before accepting: the buyer's payment is the only step expected to
/// fail, and nothing has been delivered when it does.
fn settle(
    buyer: &mut Agent,
    seller: &mut Agent,
    bought: ItemSet,
    price: ItemSet,
    clock: &WorldClock,
    report: &mut MarketReport,
) {
    let tick = clock.now();
    let failure = PaymentFailure {
        tick,
        buyer: buyer.id,
        seller: seller.id,
        bought,
        price,
    };

    if buyer.pay(price).is_err() {
        trace_failure(buyer, seller, &failure, "buyer");
        report.failures.push(failure);
        return;
    }
    if seller.pay(bought).is_err() {
        // Offers come from the seller's own ledger, so this only trips on a
        // broken invariant. Undo the buyer's payment to keep the trade atomic.
        buyer.properties_mut().add(price);
        trace_failure(buyer, seller, &failure, "seller");
        report.failures.push(failure);
        return;
    }
    buyer.accept(bought, clock);
    seller.accept(price, clock);

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "trade",
        tick = tick,
        buyer_id = buyer.id.0,
        buyer = buyer.name.as_str(),
        seller_id = seller.id.0,
        seller = seller.name.as_str(),
        good_id = bought.good.to_u64(),
        quantity = bought.amount,
        price_good_id = price.good.to_u64(),
        price = price.amount,
    );

    report.trades.push(Trade {
        tick,
        buyer: buyer.id,
        seller: seller.id,
        bought,
        price,
    });
}

#[allow(unused_variables)]
fn trace_failure(buyer: &Agent, seller: &Agent, failure: &PaymentFailure, side: &str) {
    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "payment_failed",
        tick = failure.tick,
        buyer_id = buyer.id.0,
        buyer = buyer.name.as_str(),
        seller_id = seller.id.0,
        seller = seller.name.as_str(),
        side = side,
        good_id = failure.bought.good.to_u64(),
        quantity = failure.bought.amount,
        price_good_id = failure.price.good.to_u64(),
        price = failure.price.amount,
    );
}

fn pair_mut(agents: &mut [Agent], a: usize, b: usize) -> (&mut Agent, &mut Agent) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = agents.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = agents.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}
