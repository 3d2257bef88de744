use crate::game::galaxy::Galaxy;
use crate::game::player::Player;
use crate::game::tables::{Rarity, ResourceKind};
use crate::rng::Mulberry32;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the market quotes, in stream order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceKey {
    Metal,
    Energy,
    Organic,
    Common,
    Rare,
    Ultra,
}

impl PriceKey {
    pub const ALL: [PriceKey; 6] = [
        PriceKey::Metal,
        PriceKey::Energy,
        PriceKey::Organic,
        PriceKey::Common,
        PriceKey::Rare,
        PriceKey::Ultra,
    ];

    pub fn base_price(&self) -> f64 {
        match self {
            PriceKey::Metal => 5.0,
            PriceKey::Energy => 6.0,
            PriceKey::Organic => 4.0,
            PriceKey::Common => 35.0,
            PriceKey::Rare => 90.0,
            PriceKey::Ultra => 240.0,
        }
    }

    /// `(floor, spread)` of the multiplier roll `floor + r × spread`.
    fn swing(&self) -> (f64, f64) {
        match self {
            PriceKey::Metal | PriceKey::Energy | PriceKey::Organic => (0.7, 1.1),
            PriceKey::Common => (0.8, 1.2),
            PriceKey::Rare => (0.8, 1.3),
            PriceKey::Ultra => (0.8, 1.4),
        }
    }
}

impl From<ResourceKind> for PriceKey {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Metal => PriceKey::Metal,
            ResourceKind::Energy => PriceKey::Energy,
            ResourceKind::Organic => PriceKey::Organic,
        }
    }
}

impl From<Rarity> for PriceKey {
    fn from(rarity: Rarity) -> Self {
        match rarity {
            Rarity::Common => PriceKey::Common,
            Rarity::Rare => PriceKey::Rare,
            Rarity::Ultra => PriceKey::Ultra,
        }
    }
}

const INSANE_BOOST_CHANCE: f64 = 0.12;
const INSANE_BOOST_FACTOR: f64 = 3.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub prices: BTreeMap<PriceKey, u64>,
    pub multipliers: BTreeMap<PriceKey, f64>,
    pub insane_boost: Option<PriceKey>,
}

impl Market {
    pub fn price(&self, key: impl Into<PriceKey>) -> u64 {
        self.prices.get(&key.into()).copied().unwrap_or(0)
    }
}

/// Quote prices for a galaxy at its current visit count.
///
/// Reseeded from `seed:visits:market`, so quotes only move when the player
/// lands on a planet or jumps. The spike roll is always the seventh draw.
pub fn compute_market(galaxy: &Galaxy, sell_bonus: f64) -> Market {
    let mut rng = Mulberry32::seeded(&format!(
        "{}:{}:market",
        galaxy.seed, galaxy.planet_visits_count
    ));

    let mut multipliers: BTreeMap<PriceKey, f64> = PriceKey::ALL
        .iter()
        .map(|key| {
            let (floor, spread) = key.swing();
            (*key, floor + rng.next_f64() * spread)
        })
        .collect();

    let mut insane_boost = None;
    if rng.next_f64() < INSANE_BOOST_CHANCE {
        if let Some(key) = rng.pick(&PriceKey::ALL) {
            if let Some(m) = multipliers.get_mut(key) {
                *m *= INSANE_BOOST_FACTOR;
            }
            insane_boost = Some(*key);
        }
    }

    let prices = multipliers
        .iter()
        .map(|(key, m)| (*key, (key.base_price() * m * sell_bonus).round() as u64))
        .collect();

    Market {
        prices,
        multipliers,
        insane_boost,
    }
}

/// Fixed-price full refuel for stranded ships.
pub fn emergency_recovery_cost(player: &Player) -> u64 {
    ((90.0 + player.max_fuel as f64 * 4.0) * player.upgrades.emergency_discount).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::galaxy::generate_galaxy;

    #[test]
    fn quotes_are_stable_for_a_visit() {
        let galaxy = generate_galaxy(42, 1);
        assert_eq!(compute_market(&galaxy, 1.0), compute_market(&galaxy, 1.0));
    }

    #[test]
    fn multipliers_stay_within_swing() {
        let mut galaxy = generate_galaxy(8, 3);
        for visits in 0..200 {
            galaxy.planet_visits_count = visits;
            let market = compute_market(&galaxy, 1.0);
            for key in PriceKey::ALL {
                let (floor, spread) = key.swing();
                let mut m = market.multipliers[&key];
                if market.insane_boost == Some(key) {
                    m /= INSANE_BOOST_FACTOR;
                }
                assert!(m >= floor && m < floor + spread, "{key:?} multiplier {m}");
            }
        }
    }

    #[test]
    fn spikes_happen_but_rarely() {
        let mut galaxy = generate_galaxy(1, 1);
        let boosted = (0..1000)
            .filter(|v| {
                galaxy.planet_visits_count = *v;
                compute_market(&galaxy, 1.0).insane_boost.is_some()
            })
            .count();
        assert!(boosted > 50 && boosted < 200, "boosted {boosted} of 1000");
    }

    #[test]
    fn sell_bonus_scales_prices() {
        let galaxy = generate_galaxy(42, 4);
        let base = compute_market(&galaxy, 1.0);
        let doubled = compute_market(&galaxy, 2.0);
        assert_eq!(base.multipliers, doubled.multipliers);
        for key in PriceKey::ALL {
            let expected = base.multipliers[&key] * key.base_price() * 2.0;
            let got = doubled.price(key) as f64;
            assert!((got - expected).abs() <= 0.5 + 1e-9, "{key:?}: {got} vs {expected}");
        }
    }

    #[test]
    fn new_visit_reshuffles_quotes() {
        let mut galaxy = generate_galaxy(42, 1);
        let first = compute_market(&galaxy, 1.0);
        galaxy.planet_visits_count += 1;
        assert_ne!(first.multipliers, compute_market(&galaxy, 1.0).multipliers);
    }

    #[test]
    fn emergency_cost_uses_tank_size_and_discount() {
        let mut player = Player::default();
        assert_eq!(emergency_recovery_cost(&player), 330);
        player.max_fuel = 72;
        player.upgrades.emergency_discount = 0.75;
        assert_eq!(emergency_recovery_cost(&player), 284);
    }
}
