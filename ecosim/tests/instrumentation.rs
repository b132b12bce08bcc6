//! Trace events recorded through the instrument subscriber.

#![cfg(feature = "instrument")]

use ecosim::instrument::{self, EventSubscriber};
use ecosim::types::KeyToU64;
use ecosim::{ScenarioConfig, TickReport};
use polars::prelude::*;
use tracing::subscriber::with_default;

fn run_sample(ticks: u64) -> (Vec<TickReport>, instrument::Recorder, u64) {
    instrument::clear();
    let mut world = ScenarioConfig::sample().build().unwrap();
    let labor = world.goods.lookup("LABOR").unwrap().to_u64();

    let reports = with_default(EventSubscriber::new(), || world.run(ticks).unwrap());
    (reports, instrument::drain(), labor)
}

#[test]
fn every_tick_and_trade_is_traced() {
    let (reports, recorder, _) = run_sample(20);

    let trades: usize = reports.iter().map(|r| r.market.trades.len()).sum();
    let failures: usize = reports.iter().map(|r| r.market.failures.len()).sum();
    let produced: usize = reports.iter().map(|r| r.produced.len()).sum();
    let consumed: usize = reports.iter().map(|r| r.consumed.len()).sum();

    assert_eq!(recorder.count("tick"), 20);
    assert_eq!(recorder.count("trade"), trades);
    assert_eq!(recorder.count("payment_failed"), failures);
    assert_eq!(recorder.count("produce"), produced);
    assert_eq!(recorder.count("consume"), consumed);
    assert!(trades > 0, "the plant should hire labor in the sample economy");
    assert!(recorder.count("manufact") > 0, "the plant should cook");

    let ticks = recorder.tables["tick"].u64s("tick");
    let expected: Vec<Option<u64>> = (0..20).map(Some).collect();
    assert_eq!(ticks, expected);
}

#[test]
fn trade_rows_name_both_sides() {
    let (_, recorder, _) = run_sample(5);

    let table = &recorder.tables["trade"];
    for (buyer, seller) in table.strs("buyer").into_iter().zip(table.strs("seller")) {
        let (buyer, seller) = (buyer.unwrap(), seller.unwrap());
        assert_ne!(buyer, seller);
        // Workers trade only with the plant: labor one way, meals the other
        if buyer == "Plant" {
            assert!(seller.starts_with('A'), "unexpected seller {seller}");
        } else {
            assert!(buyer.starts_with('A'), "unexpected buyer {buyer}");
            assert_eq!(seller, "Plant");
        }
    }
}

#[test]
fn traded_quantity_matches_report_volume() {
    let (reports, recorder, labor) = run_sample(30);
    let dfs = recorder.to_dataframes().unwrap();
    let trades = &dfs["trade"];
    assert_eq!(trades.height(), recorder.count("trade"));

    let labor_volume = trades
        .clone()
        .lazy()
        .filter(col("good_id").eq(lit(labor)))
        .select([col("quantity").sum()])
        .collect()
        .unwrap();
    let traced: i64 = labor_volume
        .column("quantity")
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .get(0)
        .unwrap_or(0);

    let labor_id = reports
        .iter()
        .flat_map(|r| r.market.trades.iter())
        .map(|t| t.bought.good)
        .find(|g| g.to_u64() == labor)
        .unwrap();
    let reported: i64 = reports.iter().map(|r| r.market.volume(labor_id)).sum();
    assert_eq!(traced, reported);
}
