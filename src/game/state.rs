use crate::game::galaxy::{generate_galaxy, Galaxy};
use crate::game::player::{Player, RarityCounts};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub const SAVE_VERSION: &str = "1.0.0";
const CHAPTER_ONE_TARGET: u32 = 50;

/// Snapshot of a finished galaxy, written when the player jumps away.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub index: u32,
    pub completed_pct: u32,
    pub colonised: bool,
    pub artefacts: RarityCounts,
    pub total_extracted: u64,
}

/// Distinct artefact items ever found, per category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Collections(pub BTreeMap<String, BTreeSet<String>>);

impl Collections {
    /// Returns true when the item is new to the category.
    pub fn record(&mut self, category: &str, item: &str) -> bool {
        self.0
            .entry(category.to_string())
            .or_default()
            .insert(item.to_string())
    }

    pub fn items(&self, category: &str) -> impl Iterator<Item = &String> {
        self.0.get(category).into_iter().flat_map(|set| set.iter())
    }

    pub fn count(&self, category: &str) -> usize {
        self.0.get(category).map(|set| set.len()).unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterGoal {
    pub target: u32,
}

impl Default for ChapterGoal {
    fn default() -> Self {
        Self {
            target: CHAPTER_ONE_TARGET,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
    pub last_tick: u64,
    pub last_save: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    pub version: String,
    pub base_seed: u64,
    pub galaxy_index: u32,
    pub current_galaxy: Galaxy,
    pub current_planet_id: String,
    pub player: Player,
    pub journal: Vec<JournalEntry>,
    pub collections: Collections,
    #[serde(default)]
    pub chapter: ChapterGoal,
    pub runtime: Runtime,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save snapshot has no planets")]
    Empty,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl SaveState {
    pub fn new(base_seed: u64, now: u64) -> Self {
        let mut galaxy = generate_galaxy(base_seed, 1);
        galaxy.started_at = now;
        let current_planet_id = galaxy
            .planets
            .first()
            .map(|p| p.id.clone())
            .unwrap_or_default();
        Self {
            version: SAVE_VERSION.to_string(),
            base_seed,
            galaxy_index: 1,
            current_galaxy: galaxy,
            current_planet_id,
            player: Player::default(),
            journal: Vec::new(),
            collections: Collections::default(),
            chapter: ChapterGoal::default(),
            runtime: Runtime {
                last_tick: now,
                last_save: now,
            },
        }
    }

    /// Fresh save with an unpredictable base seed.
    pub fn new_default(now: u64) -> Self {
        let base_seed = rand::random::<u64>() % 1_000_000_000;
        log::info!("starting new save with base seed {base_seed}");
        Self::new(base_seed, now)
    }

    pub fn from_json(raw: &str) -> Result<Self, SaveError> {
        let state: SaveState = serde_json::from_str(raw)?;
        if state.current_galaxy.planets.is_empty() {
            return Err(SaveError::Empty);
        }
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored snapshot, or start over when it is missing or broken.
    pub fn load_or_default(raw: Option<&str>, now: u64) -> Self {
        match raw.map(SaveState::from_json) {
            Some(Ok(state)) => state,
            Some(Err(err)) => {
                log::warn!("discarding unreadable save: {err}");
                Self::new_default(now)
            }
            None => Self::new_default(now),
        }
    }

    pub fn colonised_count(&self) -> usize {
        self.journal.iter().filter(|j| j.colonised).count()
    }

    /// `(explored, target)` for the chapter banner.
    pub fn chapter_progress(&self) -> (u32, u32) {
        (self.current_galaxy.index, self.chapter.target)
    }
}

/// Where snapshots live. Implemented by the host (browser storage, files).
pub trait SaveStore {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&mut self, raw: &str) -> Result<(), StoreError>;
    fn reset(&mut self) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slot: Option<String>,
}

impl MemoryStore {
    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            slot: Some(raw.into()),
        }
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.slot.clone())
    }

    fn save(&mut self, raw: &str) -> Result<(), StoreError> {
        self.slot = Some(raw.to_string());
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.slot = None;
        Ok(())
    }
}

/// Load from a store, treating an unavailable store like an empty one.
pub fn load_from(store: &dyn SaveStore, now: u64) -> SaveState {
    let raw = match store.load() {
        Ok(raw) => raw,
        Err(err) => {
            log::warn!("save store failed to load: {err}");
            None
        }
    };
    SaveState::load_or_default(raw.as_deref(), now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_save_starts_on_first_planet() {
        let state = SaveState::new(42, 1_000);
        assert_eq!(state.version, SAVE_VERSION);
        assert_eq!(state.galaxy_index, 1);
        assert_eq!(state.current_planet_id, "planet-1");
        assert_eq!(state.current_galaxy.started_at, 1_000);
        assert_eq!(state.runtime.last_tick, 1_000);
        assert_eq!(state.chapter_progress(), (1, 50));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut state = SaveState::new(7, 0);
        state.collections.record("DNA", "Gene Thread");
        let raw = state.to_json().expect("serialise");
        let back = SaveState::from_json(&raw).expect("parse");
        assert_eq!(back, state);
    }

    #[test]
    fn corrupt_or_missing_save_regenerates() {
        let state = SaveState::load_or_default(Some("{\"version\":"), 5_000);
        assert_eq!(state.galaxy_index, 1);
        assert!(state.journal.is_empty());
        assert_eq!(state.runtime.last_tick, 5_000);

        let state = SaveState::load_or_default(None, 5_000);
        assert!(!state.current_galaxy.planets.is_empty());
    }

    #[test]
    fn collections_ignore_duplicates() {
        let mut c = Collections::default();
        assert!(c.record("Fossil", "Stone Rib"));
        assert!(!c.record("Fossil", "Stone Rib"));
        assert!(c.record("Fossil", "Bone Lattice"));
        assert_eq!(c.count("Fossil"), 2);
        assert_eq!(c.count("Life"), 0);
        assert_eq!(c.items("Fossil").count(), 2);
    }

    #[test]
    fn memory_store_round_trip() {
        let state = SaveState::new(3, 10);
        let mut store = MemoryStore::default();
        store.save(&state.to_json().unwrap()).unwrap();
        assert_eq!(load_from(&store, 99), state);
        store.reset().unwrap();
        assert_eq!(store.load().unwrap(), None);
        let garbage = MemoryStore::with_contents("not a save");
        assert_eq!(load_from(&garbage, 99).runtime.last_tick, 99);
    }
}
