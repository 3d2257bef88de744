use crate::game::hazard::{hazard_label, Hazard};
use crate::game::tables::ResourceKind;
use crate::hex::{hex_spiral, HexCoord};
use crate::rng::{hash_seed, Mulberry32};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanetSize {
    Tiny,
    Small,
    Medium,
    Large,
    Massive,
}

#[derive(Clone, Copy, Debug)]
pub struct SizeRule {
    pub size: PlanetSize,
    pub min_regions: u32,
    pub max_regions: u32,
}

/// Ordered smallest to largest; galaxies unlock a longer prefix over time.
pub const PLANET_SIZE_RULES: [SizeRule; 5] = [
    SizeRule { size: PlanetSize::Tiny, min_regions: 2, max_regions: 4 },
    SizeRule { size: PlanetSize::Small, min_regions: 5, max_regions: 8 },
    SizeRule { size: PlanetSize::Medium, min_regions: 9, max_regions: 14 },
    SizeRule { size: PlanetSize::Large, min_regions: 15, max_regions: 20 },
    SizeRule { size: PlanetSize::Massive, min_regions: 21, max_regions: 24 },
];

const DIFFICULTY_RAMP: f64 = 49.0;
const GALAXIES_PER_SIZE_TIER: u32 = 12;
const RESOURCE_KEEP_ROLL: f64 = 0.2;
pub const ARTEFACTS_PER_GALAXY: (u32, u32) = (3, 5);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Difficulty {
    pub planet_min: u32,
    pub planet_max: u32,
    pub hazard_frequency: f64,
}

pub fn difficulty(index: u32) -> Difficulty {
    let t = (index.saturating_sub(1) as f64 / DIFFICULTY_RAMP).min(1.0);
    Difficulty {
        planet_min: 2 + (t * 2.0).floor() as u32,
        planet_max: 4 + (t * 3.0).floor() as u32,
        hazard_frequency: 0.15 + t * 0.35,
    }
}

/// Size rules a planet in this galaxy may roll.
pub fn allowed_sizes(index: u32) -> &'static [SizeRule] {
    let tier = (index.saturating_sub(1) / GALAXIES_PER_SIZE_TIER) as usize;
    let tier = tier.min(PLANET_SIZE_RULES.len() - 1);
    &PLANET_SIZE_RULES[..=tier]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub coord: HexCoord,
    pub harvested_pct: f64,
    pub harvested: bool,
    pub discovered: bool,
    pub resources: Vec<ResourceKind>,
    pub hazard: Hazard,
    pub has_artefact_unknown: bool,
    pub artefact_unlock_seconds: u32,
    pub artefact_unlock_start: Option<u64>,
    pub artefact_revealed: Option<String>,
    pub next_harvest_at: Option<u64>,
}

impl Region {
    pub fn artefact_pending(&self) -> bool {
        self.has_artefact_unknown && self.artefact_revealed.is_none()
    }

    pub fn unlock_remaining_seconds(&self, now: u64) -> Option<u64> {
        let start = self.artefact_unlock_start?;
        let elapsed = now.saturating_sub(start) / 1000;
        Some(u64::from(self.artefact_unlock_seconds).saturating_sub(elapsed))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planet {
    pub id: String,
    pub name: String,
    pub size: PlanetSize,
    pub region_count: u32,
    pub regions: Vec<Region>,
    pub current_region_id: String,
    pub completed_pct: u32,
}

impl Planet {
    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn region_mut(&mut self, id: &str) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    pub fn current_region(&self) -> Option<&Region> {
        self.region(&self.current_region_id)
    }

    pub fn recompute_completion(&mut self) {
        if self.regions.is_empty() {
            self.completed_pct = 0;
            return;
        }
        let sum: f64 = self.regions.iter().map(|r| r.harvested_pct).sum();
        self.completed_pct = (sum / self.regions.len() as f64).floor() as u32;
    }

    pub fn hazard_count(&self) -> usize {
        self.regions.iter().filter(|r| r.hazard.is_hazard()).count()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Galaxy {
    pub galaxy_id: String,
    pub index: u32,
    pub seed: u32,
    pub expected_artefact_count: (u32, u32),
    pub hazard_frequency: f64,
    pub planet_visits_count: u32,
    pub planets: Vec<Planet>,
    pub total_regions: u32,
    pub started_at: u64,
}

impl Galaxy {
    pub fn planet(&self, id: &str) -> Option<&Planet> {
        self.planets.iter().find(|p| p.id == id)
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.planets.iter().flat_map(|p| p.regions.iter())
    }

    /// Floored mean of every region's harvest percentage.
    pub fn completion_pct(&self) -> u32 {
        if self.total_regions == 0 {
            return 0;
        }
        let sum: f64 = self.regions().map(|r| r.harvested_pct).sum();
        (sum / self.total_regions as f64).floor() as u32
    }

    /// Fully harvested with every flagged artefact revealed.
    pub fn colonised(&self) -> bool {
        self.completion_pct() == 100
            && self
                .regions()
                .all(|r| !r.has_artefact_unknown || r.artefact_revealed.is_some())
    }

    pub fn artefact_sites(&self) -> usize {
        self.regions().filter(|r| r.has_artefact_unknown).count()
    }
}

/// Builds one galaxy from a single stream. Every roll happens in a fixed
/// order, so any change upstream reshuffles everything after it.
pub struct GalaxyGenerator {
    rng: Mulberry32,
    seed: u32,
    index: u32,
    difficulty: Difficulty,
}

impl GalaxyGenerator {
    pub fn new(base_seed: u64, index: u32) -> Self {
        let seed = hash_seed(&format!("{base_seed}:{index}"));
        Self {
            rng: Mulberry32::new(seed),
            seed,
            index,
            difficulty: difficulty(index),
        }
    }

    fn int_in_range(&mut self, lo: u32, hi: u32) -> u32 {
        self.rng.int_in_range(i64::from(lo), i64::from(hi)) as u32
    }

    pub fn generate(mut self) -> Galaxy {
        let planet_count = self.int_in_range(self.difficulty.planet_min, self.difficulty.planet_max);
        let mut planets = Vec::with_capacity(planet_count as usize);
        for p in 0..planet_count {
            planets.push(self.make_planet(p));
        }
        let total_regions: u32 = planets.iter().map(|p| p.region_count).sum();
        self.place_artefacts(&mut planets);

        log::debug!(
            "generated galaxy {} (seed {}): {} planets, {} regions",
            self.index,
            self.seed,
            planets.len(),
            total_regions
        );

        Galaxy {
            galaxy_id: format!("G-{}", self.index),
            index: self.index,
            seed: self.seed,
            expected_artefact_count: ARTEFACTS_PER_GALAXY,
            hazard_frequency: self.difficulty.hazard_frequency,
            planet_visits_count: 0,
            planets,
            total_regions,
            started_at: 0,
        }
    }

    fn make_planet(&mut self, p: u32) -> Planet {
        let rules = allowed_sizes(self.index);
        let rule = rules[self.rng.index(rules.len())];
        let region_count = self.int_in_range(rule.min_regions, rule.max_regions);
        let regions: Vec<Region> = hex_spiral(region_count as usize)
            .into_iter()
            .enumerate()
            .map(|(i, coord)| self.make_region(p, i, coord))
            .collect();
        let current_region_id = format!("P{}-R1", p + 1);

        Planet {
            id: format!("planet-{}", p + 1),
            name: format!("Planet {}", p + 1),
            size: rule.size,
            region_count,
            regions,
            current_region_id,
            completed_pct: 0,
        }
    }

    fn make_region(&mut self, p: u32, i: usize, coord: HexCoord) -> Region {
        let is_hazard = self.rng.next_f64() < self.difficulty.hazard_frequency;
        let is_time = is_hazard && self.rng.next_f64() < 0.5;
        let resources = ResourceKind::ALL
            .into_iter()
            .filter(|_| self.rng.next_f64() > RESOURCE_KEEP_ROLL)
            .collect();
        let hazard = match (is_hazard, is_time) {
            (false, _) => Hazard::None,
            (true, true) => Hazard::Time {
                seconds: self.int_in_range(60, 300),
                cooldown_end: 0,
            },
            (true, false) => Hazard::Shield {
                required: self.int_in_range(1, 5),
            },
        };

        Region {
            id: format!("P{}-R{}", p + 1, i + 1),
            coord,
            harvested_pct: 0.0,
            harvested: false,
            discovered: i == 0,
            resources,
            hazard,
            has_artefact_unknown: false,
            artefact_unlock_seconds: self.int_in_range(20, 75),
            artefact_unlock_start: None,
            artefact_revealed: None,
            next_harvest_at: None,
        }
    }

    /// Flag a galaxy-wide budget of distinct regions, sampled until the set is full.
    fn place_artefacts(&mut self, planets: &mut [Planet]) {
        let (lo, hi) = ARTEFACTS_PER_GALAXY;
        let wanted = self.int_in_range(lo, hi) as usize;
        let total: usize = planets.iter().map(|p| p.regions.len()).sum();
        if total == 0 {
            return;
        }
        let mut picks = BTreeSet::new();
        while picks.len() < wanted.min(total) {
            picks.insert(self.rng.int_in_range(0, total as i64 - 1) as usize);
        }

        let flat = planets.iter_mut().flat_map(|p| p.regions.iter_mut());
        for (idx, region) in flat.enumerate() {
            if picks.contains(&idx) {
                region.has_artefact_unknown = true;
            }
        }
    }
}

/// Pure generation entry point. `started_at` is left at 0 for the caller to stamp.
pub fn generate_galaxy(base_seed: u64, index: u32) -> Galaxy {
    GalaxyGenerator::new(base_seed, index.max(1)).generate()
}

pub fn galaxy_json(base_seed: u64, index: u32) -> String {
    let galaxy = generate_galaxy(base_seed, index);
    serde_json::to_string(&galaxy).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetView {
    pub id: String,
    pub name: String,
    pub size: Option<PlanetSize>,
    pub region_count: Option<u32>,
    pub hazard_count: Option<usize>,
    pub completed_pct: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalaxyView {
    pub index: u32,
    pub expected_artefacts: (u32, u32),
    pub completion_pct: u32,
    pub planets: Vec<PlanetView>,
}

impl GalaxyView {
    /// Planet detail is revealed by scanner info upgrades: size and region
    /// count at level 1, hazard counts at level 2.
    pub fn new(galaxy: &Galaxy, scanner_info_level: u32) -> Self {
        let planets = galaxy
            .planets
            .iter()
            .map(|p| PlanetView {
                id: p.id.clone(),
                name: p.name.clone(),
                size: (scanner_info_level > 0).then_some(p.size),
                region_count: (scanner_info_level > 0).then_some(p.region_count),
                hazard_count: (scanner_info_level > 1).then(|| p.hazard_count()),
                completed_pct: p.completed_pct,
            })
            .collect();
        Self {
            index: galaxy.index,
            expected_artefacts: galaxy.expected_artefact_count,
            completion_pct: galaxy.completion_pct(),
            planets,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionView {
    pub planet_name: String,
    pub id: String,
    pub harvested_pct: u32,
    pub hazard: String,
    pub resources: Vec<&'static str>,
    pub artefact_signal: bool,
    pub unlock_remaining: Option<u64>,
    pub artefact: Option<String>,
}

impl RegionView {
    pub fn new(planet: &Planet, region: &Region, now: u64) -> Self {
        Self {
            planet_name: planet.name.clone(),
            id: region.id.clone(),
            harvested_pct: region.harvested_pct.floor() as u32,
            hazard: hazard_label(&region.hazard, now),
            resources: region.resources.iter().map(|k| k.id()).collect(),
            artefact_signal: region.artefact_pending(),
            unlock_remaining: region.unlock_remaining_seconds(now),
            artefact: region.artefact_revealed.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        for seed in [0u64, 42, 123_456_789] {
            for index in [1, 7, 30, 80] {
                assert_eq!(generate_galaxy(seed, index), generate_galaxy(seed, index));
            }
        }
    }

    #[test]
    fn first_galaxy_for_seed_42_respects_bounds() {
        let galaxy = generate_galaxy(42, 1);
        assert_eq!(galaxy.galaxy_id, "G-1");
        assert!((2..=4).contains(&galaxy.planets.len()), "planets {}", galaxy.planets.len());
        for planet in &galaxy.planets {
            assert_eq!(planet.size, PlanetSize::Tiny);
            assert!((2..=4).contains(&planet.region_count));
            assert_eq!(planet.regions.len() as u32, planet.region_count);
            assert_eq!(planet.regions[0].coord, HexCoord::ORIGIN);
            assert_eq!(planet.current_region_id, planet.regions[0].id);
        }
        assert!((3..=5).contains(&galaxy.artefact_sites()));
        assert_eq!(galaxy.expected_artefact_count, (3, 5));
    }

    #[test]
    fn only_first_region_starts_discovered() {
        let galaxy = generate_galaxy(9, 20);
        for planet in &galaxy.planets {
            for (i, region) in planet.regions.iter().enumerate() {
                assert_eq!(region.discovered, i == 0, "{}", region.id);
                assert!(region.artefact_unlock_seconds >= 20 && region.artefact_unlock_seconds <= 75);
            }
        }
    }

    #[test]
    fn hazard_parameters_stay_in_range() {
        for index in 1..=60 {
            let galaxy = generate_galaxy(5, index);
            for region in galaxy.regions() {
                match region.hazard {
                    Hazard::None => {}
                    Hazard::Time { seconds, cooldown_end } => {
                        assert!((60..=300).contains(&seconds));
                        assert_eq!(cooldown_end, 0);
                    }
                    Hazard::Shield { required } => assert!((1..=5).contains(&required)),
                }
            }
        }
    }

    #[test]
    fn difficulty_ramps_and_caps() {
        let first = difficulty(1);
        assert_eq!((first.planet_min, first.planet_max), (2, 4));
        assert!((first.hazard_frequency - 0.15).abs() < 1e-12);
        let last = difficulty(50);
        assert_eq!((last.planet_min, last.planet_max), (4, 7));
        assert!((last.hazard_frequency - 0.5).abs() < 1e-12);
        assert_eq!(difficulty(500), last);
    }

    #[test]
    fn size_prefix_grows_every_twelve_galaxies() {
        assert_eq!(allowed_sizes(1).len(), 1);
        assert_eq!(allowed_sizes(12).len(), 1);
        assert_eq!(allowed_sizes(13).len(), 2);
        assert_eq!(allowed_sizes(49).len(), 5);
        assert_eq!(allowed_sizes(1000).len(), 5);
    }

    #[test]
    fn total_regions_matches_planets() {
        let galaxy = generate_galaxy(77, 40);
        let sum: u32 = galaxy.planets.iter().map(|p| p.regions.len() as u32).sum();
        assert_eq!(galaxy.total_regions, sum);
        assert_eq!(galaxy.completion_pct(), 0);
        assert!(!galaxy.colonised());
    }

    #[test]
    fn different_indices_get_different_seeds() {
        let a = generate_galaxy(42, 1);
        let b = generate_galaxy(42, 2);
        assert_ne!(a.seed, b.seed);
    }

    #[test]
    fn colonisation_needs_every_artefact_revealed() {
        let mut galaxy = generate_galaxy(3, 1);
        for planet in &mut galaxy.planets {
            for region in &mut planet.regions {
                region.harvested_pct = 100.0;
                region.harvested = true;
            }
        }
        assert_eq!(galaxy.completion_pct(), 100);
        assert!(!galaxy.colonised());
        for planet in &mut galaxy.planets {
            for region in &mut planet.regions {
                if region.has_artefact_unknown {
                    region.artefact_revealed = Some("DNA:Gene Thread".into());
                }
            }
        }
        assert!(galaxy.colonised());
    }

    #[test]
    fn view_hides_detail_without_scanner_info() {
        let galaxy = generate_galaxy(11, 1);
        let blind = GalaxyView::new(&galaxy, 0);
        assert!(blind.planets.iter().all(|p| p.size.is_none() && p.hazard_count.is_none()));
        let full = GalaxyView::new(&galaxy, 2);
        assert!(full.planets.iter().all(|p| p.region_count.is_some() && p.hazard_count.is_some()));
    }
}
