pub mod equipment;
pub mod galaxy;
pub mod hazard;
pub mod market;
pub mod player;
pub mod state;
pub mod tables;

use crate::hex::hex_distance;
use crate::rng::Mulberry32;
use equipment::{ModuleKind, UpgradeKind};
use galaxy::{generate_galaxy, Planet, Region};
use serde::de::{value, DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Serialize};
use market::{compute_market, emergency_recovery_cost, Market};
use player::ArtefactEntry;
use state::{load_from, JournalEntry, SaveState, SaveStore};
use std::str::FromStr;
use tables::{DataTables, Rarity, ResourceKind};
use thiserror::Error;

const HARVEST_COIN_RATE: f64 = 0.15;
const HARVEST_BASE_PCT: f64 = 8.0;
const HARVEST_LASER_PCT: f64 = 0.8;
const COMPLETION_FUEL_REFUND: f64 = 8.0;
const COLONY_COINS_PER_SECOND: f64 = 0.5;
const COLONY_FUEL_REGEN: f64 = 0.02;
const AUTOSAVE_INTERVAL_MS: u64 = 10_000;
const SCANNER_INFO_MAX: u32 = 2;

/// Why an action left the game untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Refusal {
    #[error("no planet `{0}` in this galaxy")]
    UnknownPlanet(String),
    #[error("no region `{0}` on this planet")]
    UnknownRegion(String),
    #[error("travel needs {needed} fuel, {available:.1} in the tank")]
    InsufficientFuel { needed: u64, available: f64 },
    #[error("shield level {level} is below the required {required}")]
    ShieldTooWeak { required: u32, level: u32 },
    #[error("region is already fully harvested")]
    AlreadyHarvested,
    #[error("time hazard active for {remaining_seconds}s")]
    HazardCooldown { remaining_seconds: u64 },
    #[error("region can be harvested again at {ready_at}")]
    HarvestCooldown { ready_at: u64 },
    #[error("no resource tier for {0:?}")]
    MissingTier(ResourceKind),
    #[error("no unrevealed artefact here")]
    NoArtefact,
    #[error("artefact unlock already started")]
    UnlockInProgress,
    #[error("costs {cost} coins, only {available:.0} available")]
    InsufficientCoins { cost: f64, available: f64 },
    #[error("scanner info is already at its highest level")]
    ScannerInfoMaxed,
    #[error("nothing to sell")]
    NothingToSell,
}

/// Read a unit enum variant from its serde name, e.g. `"scannerInfo"`.
pub(crate) fn from_name<T: DeserializeOwned>(name: &str) -> Result<T, value::Error> {
    let de: value::StrDeserializer<'_, value::Error> = name.into_deserializer();
    T::deserialize(de)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Purchase {
    #[serde(rename = "recovery")]
    Recovery,
    #[serde(rename = "tank")]
    FuelTank,
    #[serde(rename = "eff")]
    FuelEfficiency,
    #[serde(rename = "market")]
    MarketBonus,
    #[serde(rename = "scannerInfo")]
    ScannerInfo,
}

impl FromStr for Purchase {
    type Err = value::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_name(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sale {
    Resource(ResourceKind),
    /// The oldest artefact in the hold.
    Artefact,
}

impl FromStr for Sale {
    type Err = value::Error;

    /// `"artefacts"` or a resource name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "artefacts" => Ok(Sale::Artefact),
            _ => s.parse().map(Sale::Resource),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HarvestReport {
    pub resource: ResourceKind,
    pub tier_label: String,
    pub gained: u64,
    pub coins: u64,
    pub completed: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub elapsed_seconds: f64,
    pub revealed: Option<ArtefactEntry>,
    pub save_due: bool,
}

/// One player's session: the persisted aggregate plus what is derived from it.
pub struct Game {
    state: SaveState,
    tables: DataTables,
    market: Market,
    selected_region_id: Option<String>,
}

impl Game {
    pub fn new(state: SaveState, tables: DataTables) -> Self {
        let market = compute_market(&state.current_galaxy, state.player.upgrades.market_sell_bonus);
        let mut game = Self {
            state,
            tables,
            market,
            selected_region_id: None,
        };
        game.selected_region_id = game.planet().map(|p| p.current_region_id.clone());
        game
    }

    /// Continue a stored save. Time spent away is not credited: the tick
    /// clock restarts at `now`.
    pub fn resume(mut state: SaveState, tables: DataTables, now: u64) -> Self {
        state.runtime.last_tick = now;
        Self::new(state, tables)
    }

    pub fn load(store: &dyn SaveStore, tables: DataTables, now: u64) -> Self {
        Self::resume(load_from(store, now), tables, now)
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn tables(&self) -> &DataTables {
        &self.tables
    }

    /// Per-action stream keyed on galaxy seed, last tick and a tag.
    fn rng(&self, tag: &str) -> Mulberry32 {
        Mulberry32::seeded(&format!(
            "{}:{}:{}",
            self.state.current_galaxy.seed, self.state.runtime.last_tick, tag
        ))
    }

    fn refresh_market(&mut self) {
        self.market = compute_market(
            &self.state.current_galaxy,
            self.state.player.upgrades.market_sell_bonus,
        );
    }

    fn planet_idx(&self) -> Option<usize> {
        let planets = &self.state.current_galaxy.planets;
        planets
            .iter()
            .position(|p| p.id == self.state.current_planet_id)
            .or_else(|| (!planets.is_empty()).then_some(0))
    }

    fn region_idx(planet: &Planet, id: &str) -> Option<usize> {
        planet
            .regions
            .iter()
            .position(|r| r.id == id)
            .or_else(|| (!planet.regions.is_empty()).then_some(0))
    }

    /// The planet being explored; falls back to the first one.
    pub fn planet(&self) -> Option<&Planet> {
        self.planet_idx().map(|pi| &self.state.current_galaxy.planets[pi])
    }

    /// The region the host has highlighted, defaulting to where the ship is.
    pub fn selected_region(&self) -> Option<&Region> {
        let planet = self.planet()?;
        let id = self
            .selected_region_id
            .as_deref()
            .unwrap_or(&planet.current_region_id);
        let ri = Self::region_idx(planet, id)?;
        planet.regions.get(ri)
    }

    pub fn select_region(&mut self, id: &str) -> Result<(), Refusal> {
        let planet = self.planet().ok_or_else(|| Refusal::UnknownRegion(id.to_string()))?;
        if planet.region(id).is_none() {
            return Err(Refusal::UnknownRegion(id.to_string()));
        }
        self.selected_region_id = Some(id.to_string());
        Ok(())
    }

    /// Land on another planet. Each landing reseeds the market.
    pub fn select_planet(&mut self, id: &str) -> Result<(), Refusal> {
        let planet = self
            .state
            .current_galaxy
            .planet(id)
            .ok_or_else(|| Refusal::UnknownPlanet(id.to_string()))?;
        self.selected_region_id = Some(planet.current_region_id.clone());
        self.state.current_planet_id = id.to_string();
        self.state.current_galaxy.planet_visits_count += 1;
        self.refresh_market();
        Ok(())
    }

    pub fn travel(&mut self, to: &str, now: u64) -> Result<(), Refusal> {
        let pi = self.planet_idx().ok_or_else(|| Refusal::UnknownRegion(to.to_string()))?;
        let SaveState {
            current_galaxy,
            player,
            ..
        } = &mut self.state;
        let planet = &mut current_galaxy.planets[pi];
        let from = planet
            .current_region()
            .map(|r| r.coord)
            .ok_or_else(|| Refusal::UnknownRegion(planet.current_region_id.clone()))?;
        let dest = planet
            .region(to)
            .ok_or_else(|| Refusal::UnknownRegion(to.to_string()))?;

        let distance = hex_distance(from, dest.coord);
        let cost = ((1.0 + distance as f64 * 2.0) * player.upgrades.fuel_cost_multiplier).ceil();
        if player.fuel < cost {
            return Err(Refusal::InsufficientFuel {
                needed: cost as u64,
                available: player.fuel,
            });
        }
        let level = player.modules.shield.level;
        if !dest.hazard.admits_shield(level) {
            return Err(Refusal::ShieldTooWeak {
                required: dest.hazard.shield_requirement().unwrap_or_default(),
                level,
            });
        }

        player.fuel -= cost;
        player.modules.shield.decay(0.9 + distance as f64 * 0.25);
        player.modules.scanner.decay(0.35);
        planet.current_region_id = to.to_string();
        if let Some(region) = planet.region_mut(to) {
            region.discovered = true;
            // Entering an expired time hazard arms it again.
            if region.hazard.rearm(now) {
                player.modules.shield.decay(1.4);
            }
        }
        self.selected_region_id = Some(to.to_string());
        log::debug!("travelled {distance} hexes to {to} for {cost} fuel");
        Ok(())
    }

    pub fn harvest(&mut self, now: u64) -> Result<HarvestReport, Refusal> {
        let pi = self
            .planet_idx()
            .ok_or_else(|| Refusal::UnknownPlanet(self.state.current_planet_id.clone()))?;
        let galaxy_index = self.state.current_galaxy.index;
        let planet = &self.state.current_galaxy.planets[pi];
        let ri = Self::region_idx(planet, &planet.current_region_id)
            .ok_or_else(|| Refusal::UnknownRegion(planet.current_region_id.clone()))?;
        let region = &planet.regions[ri];

        if region.harvested {
            return Err(Refusal::AlreadyHarvested);
        }
        if region.hazard.cooldown_active(now) {
            return Err(Refusal::HazardCooldown {
                remaining_seconds: region.hazard.remaining_seconds(now),
            });
        }
        if let Some(ready_at) = region.next_harvest_at.filter(|at| now < *at) {
            return Err(Refusal::HarvestCooldown { ready_at });
        }

        let mut rng = self.rng("harvest");
        let resource = rng
            .pick(&region.resources)
            .copied()
            .unwrap_or(ResourceKind::Metal);
        let tier = self
            .tables
            .resources
            .tier_for(resource, galaxy_index)
            .ok_or(Refusal::MissingTier(resource))?
            .clone();

        let SaveState {
            current_galaxy,
            player,
            ..
        } = &mut self.state;
        let laser = player.modules.laser.level;
        let gained = u64::from(tier.base_yield + laser);
        let coins = (gained as f64 * HARVEST_COIN_RATE).floor() as u64;
        *player.resources.entry(resource).or_insert(0) += gained;
        player.coins += coins as f64;

        let planet = &mut current_galaxy.planets[pi];
        let region = &mut planet.regions[ri];
        region.harvested_pct =
            (region.harvested_pct + HARVEST_BASE_PCT + laser as f64 * HARVEST_LASER_PCT).min(100.0);
        region.next_harvest_at = Some(now + u64::from(tier.wait_seconds) * 1000);
        player.modules.laser.decay(1.4);
        player.modules.scanner.decay(0.7);

        let completed = region.harvested_pct >= 100.0;
        if completed {
            region.harvested = true;
            player.add_fuel(COMPLETION_FUEL_REFUND);
            log::info!("region {} fully harvested", region.id);
        }
        planet.recompute_completion();

        Ok(HarvestReport {
            resource,
            tier_label: tier.label,
            gained,
            coins,
            completed,
        })
    }

    /// Start the reveal timer on the selected region. Cannot be cancelled.
    pub fn begin_artefact_unlock(&mut self, now: u64) -> Result<(), Refusal> {
        let region = self.selected_region_mut().ok_or(Refusal::NoArtefact)?;
        if !region.artefact_pending() {
            return Err(Refusal::NoArtefact);
        }
        if region.artefact_unlock_start.is_some() {
            return Err(Refusal::UnlockInProgress);
        }
        region.artefact_unlock_start = Some(now);
        Ok(())
    }

    fn selected_region_mut(&mut self) -> Option<&mut Region> {
        let pi = self.planet_idx()?;
        let planet = &mut self.state.current_galaxy.planets[pi];
        let id = self
            .selected_region_id
            .clone()
            .unwrap_or_else(|| planet.current_region_id.clone());
        let ri = Self::region_idx(planet, &id)?;
        planet.regions.get_mut(ri)
    }

    /// Advance passive income, fuel regeneration and the selected region's
    /// unlock timer up to `now`.
    pub fn tick(&mut self, now: u64) -> TickReport {
        let elapsed_seconds = now.saturating_sub(self.state.runtime.last_tick) as f64 / 1000.0;
        self.state.runtime.last_tick = now;

        let colonised = self.state.colonised_count() as f64;
        let player = &mut self.state.player;
        player.coins += elapsed_seconds * colonised * COLONY_COINS_PER_SECOND;
        let regen = player.fuel_regen_base + colonised * COLONY_FUEL_REGEN;
        player.add_fuel(regen * elapsed_seconds);

        let unlock_done = self.selected_region().is_some_and(|r| {
            r.artefact_revealed.is_none()
                && r.artefact_unlock_start.is_some_and(|start| {
                    now.saturating_sub(start) / 1000 >= u64::from(r.artefact_unlock_seconds)
                })
        });
        let revealed = if unlock_done { self.finish_artefact() } else { None };

        TickReport {
            elapsed_seconds,
            revealed,
            save_due: now.saturating_sub(self.state.runtime.last_save) > AUTOSAVE_INTERVAL_MS,
        }
    }

    fn finish_artefact(&mut self) -> Option<ArtefactEntry> {
        let rarity = Rarity::from_roll(self.rng("rarity").next_f64());
        let Some(category) = self.tables.artefacts.for_rarity(rarity) else {
            log::warn!("no artefact category for {rarity:?}");
            return None;
        };
        let item = self.rng("artefact-item").pick(&category.items)?.clone();
        let entry = ArtefactEntry {
            category: category.id.clone(),
            rarity,
            item,
        };

        let region = self.selected_region_mut()?;
        region.artefact_revealed = Some(format!("{}:{}", entry.category, entry.item));
        let region_id = region.id.clone();

        let state = &mut self.state;
        state.player.artefacts.push(entry.clone());
        state.player.artefacts_found.add(rarity);
        state.collections.record(&entry.category, &entry.item);
        log::info!(
            "artefact revealed in {region_id}: {} {} ({:?})",
            entry.category,
            entry.item,
            rarity
        );
        Some(entry)
    }

    /// One-way jump: summarise this galaxy into the journal and generate the next.
    pub fn jump_galaxy(&mut self, now: u64) -> JournalEntry {
        let state = &mut self.state;
        let entry = JournalEntry {
            index: state.current_galaxy.index,
            completed_pct: state.current_galaxy.completion_pct(),
            colonised: state.current_galaxy.colonised(),
            artefacts: state.player.artefacts_found,
            total_extracted: state.player.total_stock(),
        };
        state.journal.push(entry.clone());

        state.galaxy_index += 1;
        let mut next = generate_galaxy(state.base_seed, state.galaxy_index);
        next.started_at = now;
        state.current_planet_id = next
            .planets
            .first()
            .map(|p| p.id.clone())
            .unwrap_or_default();
        self.selected_region_id = next
            .planets
            .first()
            .map(|p| p.current_region_id.clone());
        state.current_galaxy = next;
        self.refresh_market();

        log::info!(
            "jumped to galaxy {} (left {} at {}%, colonised: {})",
            self.state.galaxy_index,
            entry.index,
            entry.completed_pct,
            entry.colonised
        );
        entry
    }

    pub fn upgrade(&mut self, module: ModuleKind, kind: UpgradeKind) -> Result<(), Refusal> {
        let player = &mut self.state.player;
        let cost = player.modules.get(module).upgrade_cost(kind);
        if !player.spend(cost) {
            return Err(Refusal::InsufficientCoins {
                cost,
                available: player.coins,
            });
        }
        player.modules.get_mut(module).apply_upgrade(kind);
        Ok(())
    }

    pub fn purchase_cost(&self, kind: Purchase) -> f64 {
        match kind {
            Purchase::Recovery => emergency_recovery_cost(&self.state.player) as f64,
            Purchase::FuelTank => 150.0,
            Purchase::FuelEfficiency => 140.0,
            Purchase::MarketBonus => 170.0,
            Purchase::ScannerInfo => 120.0,
        }
    }

    pub fn buy(&mut self, kind: Purchase) -> Result<(), Refusal> {
        if kind == Purchase::ScannerInfo
            && self.state.player.upgrades.scanner_info_level >= SCANNER_INFO_MAX
        {
            return Err(Refusal::ScannerInfoMaxed);
        }
        let cost = self.purchase_cost(kind);
        let player = &mut self.state.player;
        if !player.spend(cost) {
            return Err(Refusal::InsufficientCoins {
                cost,
                available: player.coins,
            });
        }

        let upgrades = &mut player.upgrades;
        match kind {
            Purchase::Recovery => player.fuel = player.max_fuel as f64,
            Purchase::FuelTank => {
                player.max_fuel += 12;
                player.fuel = player.max_fuel as f64;
            }
            Purchase::FuelEfficiency => {
                upgrades.fuel_cost_multiplier = (upgrades.fuel_cost_multiplier - 0.08).max(0.6);
            }
            Purchase::MarketBonus => {
                upgrades.market_sell_bonus += 0.05;
                upgrades.emergency_discount = (upgrades.emergency_discount - 0.05).max(0.75);
            }
            Purchase::ScannerInfo => upgrades.scanner_info_level += 1,
        }
        if kind == Purchase::MarketBonus {
            self.refresh_market();
        }
        Ok(())
    }

    /// Sell at current quotes. Returns the coins earned.
    pub fn sell(&mut self, kind: Sale) -> Result<u64, Refusal> {
        let player = &mut self.state.player;
        let earned = match kind {
            Sale::Resource(resource) => {
                let qty = player.stock(resource);
                if qty == 0 {
                    return Err(Refusal::NothingToSell);
                }
                player.resources.insert(resource, 0);
                qty * self.market.price(resource)
            }
            Sale::Artefact => {
                if player.artefacts.is_empty() {
                    return Err(Refusal::NothingToSell);
                }
                let artefact = player.artefacts.remove(0);
                self.market.price(artefact.rarity)
            }
        };
        player.coins += earned as f64;
        Ok(earned)
    }

    /// Stamp the save time and serialise the aggregate.
    pub fn snapshot(&mut self, now: u64) -> Option<String> {
        self.state.runtime.last_save = now;
        match self.state.to_json() {
            Ok(raw) => Some(raw),
            Err(err) => {
                log::warn!("could not serialise save: {err}");
                None
            }
        }
    }

    /// Write the snapshot. Storage failures are logged, never fatal.
    pub fn persist(&mut self, store: &mut dyn SaveStore, now: u64) -> bool {
        let Some(raw) = self.snapshot(now) else {
            return false;
        };
        match store.save(&raw) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("could not write save: {err}");
                false
            }
        }
    }

    /// Throw the current save away and start over, keeping the data tables.
    pub fn restart(&mut self, now: u64) {
        let tables = std::mem::take(&mut self.tables);
        *self = Self::new(SaveState::new_default(now), tables);
    }

    /// Wipe the store and start a brand-new save.
    pub fn reset(&mut self, store: &mut dyn SaveStore, now: u64) {
        if let Err(err) = store.reset() {
            log::warn!("could not clear save store: {err}");
        }
        self.restart(now);
    }
}
