use crate::game::equipment::Modules;
use crate::game::tables::{Rarity, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrades {
    pub fuel_cost_multiplier: f64,
    pub market_sell_bonus: f64,
    pub emergency_discount: f64,
    pub scanner_info_level: u32,
}

impl Default for Upgrades {
    fn default() -> Self {
        Self {
            fuel_cost_multiplier: 1.0,
            market_sell_bonus: 1.0,
            emergency_discount: 1.0,
            scanner_info_level: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtefactEntry {
    pub category: String,
    pub rarity: Rarity,
    pub item: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RarityCounts {
    pub common: u32,
    pub rare: u32,
    pub ultra: u32,
}

impl RarityCounts {
    pub fn add(&mut self, rarity: Rarity) {
        match rarity {
            Rarity::Common => self.common += 1,
            Rarity::Rare => self.rare += 1,
            Rarity::Ultra => self.ultra += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.common + self.rare + self.ultra
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub coins: f64,
    pub fuel: f64,
    pub max_fuel: u32,
    pub fuel_regen_base: f64,
    pub resources: BTreeMap<ResourceKind, u64>,
    pub upgrades: Upgrades,
    pub modules: Modules,
    /// Unsold artefacts, oldest first.
    pub artefacts: Vec<ArtefactEntry>,
    /// Every artefact ever revealed, sold or not.
    #[serde(default)]
    pub artefacts_found: RarityCounts,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            coins: 120.0,
            fuel: 60.0,
            max_fuel: 60,
            fuel_regen_base: 0.12,
            resources: ResourceKind::ALL.iter().map(|k| (*k, 0)).collect(),
            upgrades: Upgrades::default(),
            modules: Modules::default(),
            artefacts: Vec::new(),
            artefacts_found: RarityCounts::default(),
        }
    }
}

impl Player {
    pub fn stock(&self, kind: ResourceKind) -> u64 {
        self.resources.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_stock(&self) -> u64 {
        self.resources.values().sum()
    }

    pub fn add_fuel(&mut self, amount: f64) {
        self.fuel = (self.fuel + amount).min(self.max_fuel as f64);
    }

    /// Deduct coins if affordable. Returns false and leaves coins alone otherwise.
    pub fn spend(&mut self, cost: f64) -> bool {
        if self.coins < cost {
            return false;
        }
        self.coins -= cost;
        true
    }
}
