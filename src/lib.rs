use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod game;
pub mod hex;
pub mod rng;

use game::equipment::{modules_view, ModuleKind, UpgradeKind};
use game::galaxy::{galaxy_json, GalaxyView, RegionView};
use game::market::emergency_recovery_cost;
use game::state::SaveState;
use game::tables::DataTables;
use game::{Game, Purchase, Refusal, Sale};
use hex::HexCoord;

/// Largest spiral a host may request in one call.
const MAX_SPIRAL_CELLS: u32 = 4_096;

#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            _ => web_sys::console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
static LOGGER: ConsoleLogger = ConsoleLogger;

/// Panic hook plus the console log sink. Native embedders bring their own logger.
fn init_host_hooks() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(target_arch = "wasm32")]
    {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
    }
}

fn millis(now: f64) -> u64 {
    now.max(0.0) as u64
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn applied<T>(result: Result<T, Refusal>) -> bool {
    match result {
        Ok(_) => true,
        Err(refusal) => {
            log::debug!("action refused: {refusal}");
            false
        }
    }
}

#[derive(Serialize)]
struct CollectionView<'a> {
    category: &'a str,
    count: usize,
    items: Vec<&'a str>,
}

/// A player session owned by the page. Every call either applies fully or
/// returns `false` with nothing changed.
#[wasm_bindgen]
pub struct Session {
    game: Game,
}

#[wasm_bindgen]
impl Session {
    /// Restore from a stored snapshot (or start fresh) with optional data tables.
    #[wasm_bindgen(constructor)]
    pub fn new(
        saved: Option<String>,
        resources: Option<String>,
        artefacts: Option<String>,
        now: f64,
    ) -> Session {
        init_host_hooks();
        let tables = DataTables::from_json_or_fallback(resources.as_deref(), artefacts.as_deref());
        let now = millis(now);
        let state = SaveState::load_or_default(saved.as_deref(), now);
        Session {
            game: Game::resume(state, tables, now),
        }
    }

    /// Returns true when an autosave is due.
    pub fn tick(&mut self, now: f64) -> bool {
        self.game.tick(millis(now)).save_due
    }

    pub fn travel(&mut self, region_id: &str, now: f64) -> bool {
        applied(self.game.travel(region_id, millis(now)))
    }

    pub fn harvest(&mut self, now: f64) -> bool {
        applied(self.game.harvest(millis(now)))
    }

    pub fn unlock_artefact(&mut self, now: f64) -> bool {
        applied(self.game.begin_artefact_unlock(millis(now)))
    }

    pub fn select_planet(&mut self, planet_id: &str) -> bool {
        applied(self.game.select_planet(planet_id))
    }

    pub fn select_region(&mut self, region_id: &str) -> bool {
        applied(self.game.select_region(region_id))
    }

    /// Jump onward; returns the new journal entry as JSON.
    pub fn jump_galaxy(&mut self, now: f64) -> String {
        to_json(&self.game.jump_galaxy(millis(now)))
    }

    pub fn upgrade(&mut self, module: &str, kind: &str) -> bool {
        match (module.parse::<ModuleKind>(), kind.parse::<UpgradeKind>()) {
            (Ok(module), Ok(kind)) => applied(self.game.upgrade(module, kind)),
            _ => false,
        }
    }

    pub fn buy(&mut self, kind: &str) -> bool {
        kind.parse::<Purchase>()
            .is_ok_and(|kind| applied(self.game.buy(kind)))
    }

    pub fn sell(&mut self, kind: &str) -> bool {
        kind.parse::<Sale>()
            .is_ok_and(|kind| applied(self.game.sell(kind)))
    }

    /// Snapshot for the host to store. Empty when serialisation fails.
    pub fn save_json(&mut self, now: f64) -> String {
        self.game.snapshot(millis(now)).unwrap_or_default()
    }

    pub fn reset(&mut self, now: f64) {
        self.game.restart(millis(now));
    }

    pub fn state_json(&self) -> String {
        to_json(self.game.state())
    }

    pub fn market_json(&self) -> String {
        to_json(self.game.market())
    }

    pub fn emergency_cost(&self) -> f64 {
        emergency_recovery_cost(&self.game.state().player) as f64
    }

    pub fn galaxy_view_json(&self) -> String {
        let state = self.game.state();
        to_json(&GalaxyView::new(
            &state.current_galaxy,
            state.player.upgrades.scanner_info_level,
        ))
    }

    pub fn region_view_json(&self, now: f64) -> String {
        match (self.game.planet(), self.game.selected_region()) {
            (Some(planet), Some(region)) => to_json(&RegionView::new(planet, region, millis(now))),
            _ => "{}".to_string(),
        }
    }

    pub fn modules_json(&self) -> String {
        to_json(&modules_view(&self.game.state().player.modules))
    }

    pub fn journal_json(&self) -> String {
        to_json(&self.game.state().journal)
    }

    pub fn collections_json(&self) -> String {
        let collections = &self.game.state().collections;
        let view: Vec<CollectionView> = self
            .game
            .tables()
            .artefacts
            .categories
            .iter()
            .map(|c| CollectionView {
                category: &c.id,
                count: collections.count(&c.id),
                items: collections.items(&c.id).map(String::as_str).collect(),
            })
            .collect();
        to_json(&view)
    }
}

#[wasm_bindgen]
pub fn generate_galaxy_json(base_seed: u64, galaxy_index: u32) -> String {
    galaxy_json(base_seed, galaxy_index)
}

#[wasm_bindgen]
pub fn hex_distance(q1: i32, r1: i32, q2: i32, r2: i32) -> u32 {
    hex::hex_distance(HexCoord::new(q1, r1), HexCoord::new(q2, r2))
}

#[wasm_bindgen]
pub fn hex_spiral_json(count: u32) -> String {
    hex::spiral_json(count.min(MAX_SPIRAL_CELLS) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_spiral_request_is_clamped() {
        let json = hex_spiral_json(u32::MAX);
        let view: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(view["cellCount"], MAX_SPIRAL_CELLS);
        assert_eq!(hex_spiral_json(3), hex::spiral_json(3));
    }

    #[test]
    fn session_resumes_without_offline_credit() {
        let mut first = Session::new(None, None, None, 1_000.0);
        let saved = first.save_json(1_000.0);
        assert!(!saved.is_empty());

        let resumed = Session::new(Some(saved), None, None, 7_201_000.0);
        let state = resumed.game.state();
        assert_eq!(state.runtime.last_tick, 7_201_000);
        assert_eq!(state.runtime.last_save, 1_000);
    }

    #[test]
    fn unknown_action_names_are_refused() {
        let mut session = Session::new(None, None, None, 0.0);
        assert!(!session.buy("fuel"));
        assert!(!session.sell("gold"));
        assert!(!session.upgrade("hull", "level"));
        assert!(session.buy("scannerInfo"));
        assert_eq!(session.game.state().player.upgrades.scanner_info_level, 1);
    }
}
