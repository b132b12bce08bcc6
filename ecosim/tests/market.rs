//! Market settlement through the full tick pipeline.

use ecosim::{ScenarioConfig, TickSnapshot, World};

// === TEST FIXTURES ===

/// A buyer short 5 MEAL facing a seller holding 3, MEAL at 1 MONEY.
fn meal_scenario(buyer_money: i64) -> World {
    let json = format!(
        r#"{{
            "goods": ["MONEY", "MEAL"],
            "agents": [
                {{
                    "name": "Buyer",
                    "schedule": 100,
                    "necessities": {{ "MEAL": 5 }},
                    "properties": {{ "MONEY": {buyer_money} }}
                }},
                {{
                    "name": "Seller",
                    "schedule": 100,
                    "properties": {{ "MEAL": 3 }}
                }}
            ],
            "prices": [{{ "good": "MEAL", "tag": "MONEY", "amount": 1 }}]
        }}"#
    );
    ScenarioConfig::from_json(&json).unwrap().build().unwrap()
}

fn holding(world: &World, agent: &str, good: &str) -> i64 {
    let good = world.goods.lookup(good).unwrap();
    world
        .market
        .find_agent(agent)
        .unwrap()
        .properties()
        .amount_or_zero(good)
}

#[test]
fn trade_clears_available_stock() {
    let mut world = meal_scenario(10);

    let report = world.run_tick().unwrap();

    assert_eq!(report.market.trades.len(), 1);
    assert!(report.market.failures.is_empty());
    assert_eq!(holding(&world, "Buyer", "MEAL"), 3);
    assert_eq!(holding(&world, "Buyer", "MONEY"), 7);
    assert_eq!(holding(&world, "Seller", "MEAL"), 0);
    assert_eq!(holding(&world, "Seller", "MONEY"), 3);

    let snapshot = TickSnapshot::capture(&report, &world);
    assert_eq!(snapshot.trades.len(), 1);
    let trade = &snapshot.trades[0];
    assert!(trade.settled);
    assert_eq!((trade.buyer.as_str(), trade.seller.as_str()), ("Buyer", "Seller"));
    assert_eq!((trade.bought.good.as_str(), trade.bought.amount), ("MEAL", 3));
    assert_eq!((trade.price.good.as_str(), trade.price.amount), ("MONEY", 3));
}

#[test]
fn unaffordable_trade_leaves_both_sides_untouched() {
    let mut world = meal_scenario(2);

    let report = world.run_tick().unwrap();

    assert!(report.market.trades.is_empty());
    assert_eq!(report.market.failures.len(), 1, "failure should be reported");
    assert_eq!(holding(&world, "Buyer", "MEAL"), 0);
    assert_eq!(holding(&world, "Buyer", "MONEY"), 2);
    assert_eq!(holding(&world, "Seller", "MEAL"), 3);
    assert_eq!(holding(&world, "Seller", "MONEY"), 0);

    let snapshot = TickSnapshot::capture(&report, &world);
    assert_eq!(snapshot.trades.len(), 1);
    assert!(!snapshot.trades[0].settled);
}

#[test]
fn repeated_ticks_do_not_resell_sold_stock() {
    let mut world = meal_scenario(10);

    for _ in 0..5 {
        world.run_tick().unwrap();
    }

    // Seller has nothing left to offer after the first tick
    assert_eq!(holding(&world, "Buyer", "MEAL"), 3);
    assert_eq!(holding(&world, "Seller", "MONEY"), 3);
}

#[test]
fn purchases_feed_buyer_forecast() {
    let mut world = meal_scenario(10);
    world.run_tick().unwrap();

    let meal = world.goods.lookup("MEAL").unwrap();
    let buyer = world.market.find_agent("Buyer").unwrap();
    let expect = buyer.expect(meal).unwrap();
    assert_eq!(expect.count(), 1);
    assert_eq!(expect.rate(), 3.0);

    let seller = world.market.find_agent("Seller").unwrap();
    assert!(seller.expect(meal).is_none(), "seller does not need MEAL");
}
