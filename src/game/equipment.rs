use crate::game::from_name;
use serde::de::value;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Scanner,
    Shield,
    Laser,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 3] = [ModuleKind::Scanner, ModuleKind::Shield, ModuleKind::Laser];
}

impl FromStr for ModuleKind {
    type Err = value::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_name(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    Level,
    Durability,
    Decay,
}

impl FromStr for UpgradeKind {
    type Err = value::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_name(s)
    }
}

const DURABILITY_STEP: f64 = 20.0;
const DECAY_STEP: f64 = 0.08;
const DECAY_FLOOR: f64 = 0.35;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipModule {
    pub level: u32,
    pub durability: f64,
    pub durability_max: f64,
    pub decay_rate: f64,
}

impl Default for ShipModule {
    fn default() -> Self {
        Self {
            level: 1,
            durability: 100.0,
            durability_max: 100.0,
            decay_rate: 1.0,
        }
    }
}

impl ShipModule {
    /// Wear the module by `base × decay_rate`. Running out of durability
    /// costs one level (never below 1) and refills the gauge.
    pub fn decay(&mut self, base: f64) {
        self.durability -= base * self.decay_rate;
        if self.durability <= 0.0 {
            self.level = self.level.saturating_sub(1).max(1);
            self.durability = self.durability_max;
        }
    }

    pub fn upgrade_cost(&self, kind: UpgradeKind) -> f64 {
        match kind {
            UpgradeKind::Level => 80.0 * self.level as f64,
            UpgradeKind::Durability => 90.0,
            UpgradeKind::Decay => 70.0,
        }
    }

    pub fn apply_upgrade(&mut self, kind: UpgradeKind) {
        match kind {
            UpgradeKind::Level => self.level += 1,
            UpgradeKind::Durability => {
                self.durability_max += DURABILITY_STEP;
                self.durability = self.durability_max;
            }
            UpgradeKind::Decay => {
                self.decay_rate = (self.decay_rate - DECAY_STEP).max(DECAY_FLOOR);
            }
        }
    }

    pub fn durability_pct(&self) -> u32 {
        if self.durability_max <= 0.0 {
            return 0;
        }
        ((self.durability / self.durability_max) * 100.0).floor().max(0.0) as u32
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Modules {
    pub scanner: ShipModule,
    pub shield: ShipModule,
    pub laser: ShipModule,
}

impl Modules {
    pub fn get(&self, kind: ModuleKind) -> &ShipModule {
        match kind {
            ModuleKind::Scanner => &self.scanner,
            ModuleKind::Shield => &self.shield,
            ModuleKind::Laser => &self.laser,
        }
    }

    pub fn get_mut(&mut self, kind: ModuleKind) -> &mut ShipModule {
        match kind {
            ModuleKind::Scanner => &mut self.scanner,
            ModuleKind::Shield => &mut self.shield,
            ModuleKind::Laser => &mut self.laser,
        }
    }
}

/// One row of the ship panel, with the next upgrade prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleView {
    pub kind: ModuleKind,
    pub level: u32,
    pub durability_pct: u32,
    pub decay_rate: f64,
    pub level_cost: f64,
    pub durability_cost: f64,
    pub decay_cost: f64,
}

impl ModuleView {
    pub fn new(kind: ModuleKind, module: &ShipModule) -> Self {
        Self {
            kind,
            level: module.level,
            durability_pct: module.durability_pct(),
            decay_rate: module.decay_rate,
            level_cost: module.upgrade_cost(UpgradeKind::Level),
            durability_cost: module.upgrade_cost(UpgradeKind::Durability),
            decay_cost: module.upgrade_cost(UpgradeKind::Decay),
        }
    }
}

pub fn modules_view(modules: &Modules) -> Vec<ModuleView> {
    ModuleKind::ALL
        .iter()
        .map(|&kind| ModuleView::new(kind, modules.get(kind)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_scales_with_rate() {
        let mut m = ShipModule {
            decay_rate: 0.5,
            ..ShipModule::default()
        };
        m.decay(10.0);
        assert!((m.durability - 95.0).abs() < 1e-9);
        assert_eq!(m.level, 1);
    }

    #[test]
    fn depleted_module_loses_a_level_and_refills() {
        let mut m = ShipModule {
            level: 3,
            durability: 1.0,
            ..ShipModule::default()
        };
        m.decay(1.4);
        assert_eq!(m.level, 2);
        assert_eq!(m.durability, m.durability_max);

        let mut base = ShipModule {
            durability: 0.5,
            ..ShipModule::default()
        };
        base.decay(1.0);
        assert_eq!(base.level, 1, "level never drops below 1");
    }

    #[test]
    fn upgrades_follow_their_rules() {
        let mut m = ShipModule::default();
        assert_eq!(m.upgrade_cost(UpgradeKind::Level), 80.0);
        m.apply_upgrade(UpgradeKind::Level);
        assert_eq!(m.upgrade_cost(UpgradeKind::Level), 160.0);

        m.durability = 10.0;
        m.apply_upgrade(UpgradeKind::Durability);
        assert_eq!(m.durability_max, 120.0);
        assert_eq!(m.durability, 120.0);

        for _ in 0..20 {
            m.apply_upgrade(UpgradeKind::Decay);
        }
        assert_eq!(m.decay_rate, DECAY_FLOOR);
    }

    #[test]
    fn names_parse() {
        assert_eq!("laser".parse::<ModuleKind>().ok(), Some(ModuleKind::Laser));
        assert!("hull".parse::<ModuleKind>().is_err());
        assert_eq!("decay".parse::<UpgradeKind>().ok(), Some(UpgradeKind::Decay));
    }

    #[test]
    fn panel_reports_worn_modules() {
        let mut modules = Modules::default();
        modules.shield.durability = 37.6;
        modules.laser.apply_upgrade(UpgradeKind::Level);

        let rows = modules_view(&modules);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].kind, ModuleKind::Shield);
        assert_eq!(rows[1].durability_pct, 37);
        assert_eq!(rows[0].durability_pct, 100);
        assert_eq!(rows[2].level, 2);
        assert_eq!(rows[2].level_cost, 160.0);

        let json = serde_json::to_string(&rows[0]).unwrap();
        assert!(json.contains(r#""kind":"scanner""#));
        assert!(json.contains(r#""durabilityPct":100"#));
    }
}
