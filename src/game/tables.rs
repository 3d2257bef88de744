use crate::game::from_name;
use serde::de::value;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Metal,
    Energy,
    Organic,
}

impl ResourceKind {
    /// Generation order. Region resource lists are filtered from this.
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Metal, ResourceKind::Energy, ResourceKind::Organic];

    pub fn id(&self) -> &'static str {
        match self {
            ResourceKind::Metal => "metal",
            ResourceKind::Energy => "energy",
            ResourceKind::Organic => "organic",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = value::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_name(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Ultra,
}

impl Rarity {
    pub const ALL: [Rarity; 3] = [Rarity::Common, Rarity::Rare, Rarity::Ultra];

    /// `r < 1/20` is ultra, `r < 1/5` rare, anything else common.
    pub fn from_roll(r: f64) -> Rarity {
        if r < 1.0 / 20.0 {
            Rarity::Ultra
        } else if r < 1.0 / 5.0 {
            Rarity::Rare
        } else {
            Rarity::Common
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Ultra => "ultra",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTier {
    pub min_galaxy: u32,
    pub label: String,
    pub base_yield: u32,
    pub base_value: u32,
    pub wait_seconds: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceCategory {
    pub id: ResourceKind,
    pub name: String,
    pub tiers: Vec<ResourceTier>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceTable {
    pub categories: Vec<ResourceCategory>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtefactCategory {
    pub id: String,
    pub rarity: Rarity,
    pub items: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtefactTable {
    pub categories: Vec<ArtefactCategory>,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("table is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("resource category `{0}` is missing or has no tiers")]
    MissingResource(&'static str),
    #[error("no artefact category with items for rarity `{0}`")]
    MissingRarity(&'static str),
}

fn tier(min_galaxy: u32, label: &str, base_yield: u32, base_value: u32, wait_seconds: u32) -> ResourceTier {
    ResourceTier {
        min_galaxy,
        label: label.to_string(),
        base_yield,
        base_value,
        wait_seconds,
    }
}

impl ResourceTable {
    pub fn builtin() -> Self {
        let category = |id, name: &str, tiers| ResourceCategory {
            id,
            name: name.to_string(),
            tiers,
        };
        Self {
            categories: vec![
                category(
                    ResourceKind::Metal,
                    "Metal",
                    vec![
                        tier(1, "Scrap Iron", 8, 4, 1),
                        tier(15, "Dense Alloy", 6, 8, 2),
                        tier(35, "Voidsteel", 4, 14, 3),
                    ],
                ),
                category(
                    ResourceKind::Energy,
                    "Energy",
                    vec![
                        tier(1, "Ion Cells", 7, 5, 1),
                        tier(15, "Prism Cores", 5, 10, 2),
                        tier(35, "Singularity Charge", 3, 18, 3),
                    ],
                ),
                category(
                    ResourceKind::Organic,
                    "Organic",
                    vec![
                        tier(1, "Microflora", 9, 3, 1),
                        tier(15, "Bio-Weave", 6, 7, 2),
                        tier(35, "Proto-Life Gel", 4, 13, 3),
                    ],
                ),
            ],
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, TableError> {
        let table: ResourceTable = serde_json::from_str(raw)?;
        for kind in ResourceKind::ALL {
            let ok = table
                .category(kind)
                .map(|c| !c.tiers.is_empty())
                .unwrap_or(false);
            if !ok {
                return Err(TableError::MissingResource(kind.id()));
            }
        }
        Ok(table)
    }

    pub fn category(&self, kind: ResourceKind) -> Option<&ResourceCategory> {
        self.categories.iter().find(|c| c.id == kind)
    }

    /// Highest tier whose `min_galaxy` the galaxy index has reached.
    /// Falls back to the first tier when none qualify.
    pub fn tier_for(&self, kind: ResourceKind, galaxy_index: u32) -> Option<&ResourceTier> {
        let category = self.category(kind)?;
        category
            .tiers
            .iter()
            .rev()
            .find(|t| galaxy_index >= t.min_galaxy)
            .or_else(|| category.tiers.first())
    }
}

impl ArtefactTable {
    pub fn builtin() -> Self {
        fn category(id: &str, rarity: Rarity, items: &[&str]) -> ArtefactCategory {
            ArtefactCategory {
                id: id.to_string(),
                rarity,
                items: items.iter().map(|s| s.to_string()).collect(),
            }
        }
        Self {
            categories: vec![
                category(
                    "DNA",
                    Rarity::Common,
                    &["Helix Fragment", "Genome Coil", "Spiral Marker", "Gene Thread", "Chromo Bead"],
                ),
                category(
                    "Fossil",
                    Rarity::Rare,
                    &["Bone Lattice", "Amber Imprint", "Shell Archive", "Stone Rib"],
                ),
                category("Life", Rarity::Ultra, &["Living Spore", "Echo Seed", "Prime Cell"]),
            ],
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, TableError> {
        let table: ArtefactTable = serde_json::from_str(raw)?;
        for rarity in Rarity::ALL {
            if table.for_rarity(rarity).is_none() {
                return Err(TableError::MissingRarity(rarity.id()));
            }
        }
        Ok(table)
    }

    pub fn for_rarity(&self, rarity: Rarity) -> Option<&ArtefactCategory> {
        self.categories
            .iter()
            .find(|c| c.rarity == rarity && !c.items.is_empty())
    }
}

/// Resource and artefact tables the simulation reads from.
#[derive(Clone, Debug, PartialEq)]
pub struct DataTables {
    pub resources: ResourceTable,
    pub artefacts: ArtefactTable,
}

impl Default for DataTables {
    fn default() -> Self {
        Self {
            resources: ResourceTable::builtin(),
            artefacts: ArtefactTable::builtin(),
        }
    }
}

impl DataTables {
    /// Parse host-supplied tables; any table that is absent or broken is
    /// replaced with the built-in one.
    pub fn from_json_or_fallback(resources: Option<&str>, artefacts: Option<&str>) -> Self {
        let resources = match resources.map(ResourceTable::from_json) {
            Some(Ok(table)) => table,
            Some(Err(err)) => {
                log::warn!("resource table rejected, using built-in: {err}");
                ResourceTable::builtin()
            }
            None => ResourceTable::builtin(),
        };
        let artefacts = match artefacts.map(ArtefactTable::from_json) {
            Some(Ok(table)) => table,
            Some(Err(err)) => {
                log::warn!("artefact table rejected, using built-in: {err}");
                ArtefactTable::builtin()
            }
            None => ArtefactTable::builtin(),
        };
        Self {
            resources,
            artefacts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_resolution_picks_highest_reached_threshold() {
        let table = ResourceTable::builtin();
        let label = |idx| {
            table
                .tier_for(ResourceKind::Metal, idx)
                .map(|t| t.label.clone())
                .unwrap_or_default()
        };
        assert_eq!(label(1), "Scrap Iron");
        assert_eq!(label(14), "Scrap Iron");
        assert_eq!(label(15), "Dense Alloy");
        assert_eq!(label(35), "Voidsteel");
        assert_eq!(label(200), "Voidsteel");
    }

    #[test]
    fn tier_falls_back_to_first_when_none_reached() {
        let table = ResourceTable {
            categories: vec![ResourceCategory {
                id: ResourceKind::Energy,
                name: "Energy".into(),
                tiers: vec![tier(5, "Late", 1, 1, 1)],
            }],
        };
        let t = table.tier_for(ResourceKind::Energy, 1).map(|t| t.label.as_str());
        assert_eq!(t, Some("Late"));
        assert!(table.tier_for(ResourceKind::Metal, 1).is_none());
    }

    #[test]
    fn rarity_roll_thresholds() {
        assert_eq!(Rarity::from_roll(0.0), Rarity::Ultra);
        assert_eq!(Rarity::from_roll(0.049), Rarity::Ultra);
        assert_eq!(Rarity::from_roll(0.05), Rarity::Rare);
        assert_eq!(Rarity::from_roll(0.199), Rarity::Rare);
        assert_eq!(Rarity::from_roll(0.2), Rarity::Common);
        assert_eq!(Rarity::from_roll(0.99), Rarity::Common);
    }

    #[test]
    fn parses_host_resource_table() {
        let raw = r#"{"categories":[
            {"id":"metal","name":"Metal","tiers":[{"minGalaxy":1,"label":"Ore","baseYield":10,"baseValue":2,"waitSeconds":4}]},
            {"id":"energy","name":"Energy","tiers":[{"minGalaxy":1,"label":"Cell","baseYield":3,"baseValue":2,"waitSeconds":1}]},
            {"id":"organic","name":"Organic","tiers":[{"minGalaxy":1,"label":"Moss","baseYield":2,"baseValue":2,"waitSeconds":1}]}
        ]}"#;
        let table = ResourceTable::from_json(raw).expect("valid table");
        let metal = table.tier_for(ResourceKind::Metal, 3).expect("metal tier");
        assert_eq!(metal.base_yield, 10);
        assert_eq!(metal.wait_seconds, 4);
    }

    #[test]
    fn incomplete_tables_are_rejected() {
        let raw = r#"{"categories":[{"id":"metal","name":"Metal","tiers":[]}]}"#;
        assert!(matches!(
            ResourceTable::from_json(raw),
            Err(TableError::MissingResource("metal"))
        ));
        let raw = r#"{"categories":[{"id":"DNA","rarity":"common","items":["A"]}]}"#;
        assert!(matches!(
            ArtefactTable::from_json(raw),
            Err(TableError::MissingRarity("rare"))
        ));
    }

    #[test]
    fn broken_input_degrades_to_builtin() {
        let tables = DataTables::from_json_or_fallback(Some("{not json"), Some("[]"));
        assert_eq!(tables, DataTables::default());
        let tables = DataTables::from_json_or_fallback(None, None);
        assert_eq!(tables, DataTables::default());
    }
}
