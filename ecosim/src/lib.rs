use wasm_bindgen::prelude::*;

pub mod agent;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod expect;
pub mod goods;
pub mod market;
pub mod recipe;
pub mod snapshot;
pub mod timer;
pub mod types;
pub mod world;

pub use agent::{Agent, Order};
pub use catalog::{ItemCatalog, ItemSet};
pub use clock::WorldClock;
pub use config::{AgentConfig, PriceConfig, ProgressConfig, RecipeConfig, ScenarioConfig};
pub use error::{EconError, Result};
pub use expect::Expect;
pub use goods::GoodRegistry;
pub use market::{Market, MarketReport, PaymentFailure, Price, Trade};
pub use recipe::Recipe;
pub use snapshot::{StateSnapshot, TickSnapshot};
pub use timer::{Progress, Schedule};
pub use types::{AgentId, Amount, GoodId, RecipeId, Tick};
pub use world::{TickReport, World};

#[cfg(feature = "instrument")]
pub use instrument;

// ============================================================================
// WASM API - Simulation
// ============================================================================

#[wasm_bindgen]
pub struct Simulation {
    world: World,
    last_report: Option<TickReport>,
}

#[wasm_bindgen]
impl Simulation {
    /// Build a simulation from a JSON scenario
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> std::result::Result<Simulation, JsError> {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        let config = ScenarioConfig::from_json(config_json)?;
        Self::from_config(&config)
    }

    /// Build a simulation from a plain JS object shaped like the JSON scenario
    #[wasm_bindgen]
    pub fn from_object(config: JsValue) -> std::result::Result<Simulation, JsError> {
        console_error_panic_hook::set_once();

        let config: ScenarioConfig = serde_wasm_bindgen::from_value(config)?;
        Self::from_config(&config)
    }

    /// The three-workers-and-a-plant sample economy
    #[wasm_bindgen]
    pub fn with_sample_scenario() -> std::result::Result<Simulation, JsError> {
        console_error_panic_hook::set_once();

        Self::from_config(&ScenarioConfig::sample())
    }

    /// Advance the simulation by one tick
    #[wasm_bindgen]
    pub fn advance_tick(&mut self) -> std::result::Result<(), JsError> {
        let report = self.world.run_tick()?;
        self.last_report = Some(report);
        Ok(())
    }

    /// Get the current tick
    #[wasm_bindgen]
    pub fn get_tick(&self) -> u64 {
        self.world.tick()
    }

    /// Get a snapshot of every agent's ledger and forecasts
    #[wasm_bindgen]
    pub fn get_state_snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(&self.world)
    }

    /// What happened in the most recent tick; `null` before the first tick
    #[wasm_bindgen]
    pub fn get_last_report(&self) -> std::result::Result<JsValue, JsError> {
        let snapshot = self.last_report();
        Ok(serde_wasm_bindgen::to_value(&snapshot)?)
    }
}

impl Simulation {
    pub fn from_config(config: &ScenarioConfig) -> std::result::Result<Simulation, JsError> {
        Ok(Self {
            world: config.build()?,
            last_report: None,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn last_report(&self) -> Option<TickSnapshot> {
        self.last_report
            .as_ref()
            .map(|report| TickSnapshot::capture(report, &self.world))
    }
}
