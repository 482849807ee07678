//! Load a rules database from TOML
//!
//! Archetypes and promotions refer to unit combat classes, terrains,
//! features and other promotions by name. Vocabularies are declared up
//! front; promotion prerequisites are resolved once every promotion is known.

use std::collections::BTreeMap;
use std::path::Path;

use ahash::AHashMap;
use serde::Deserialize;

use crate::core::error::{AnalysisError, Result};
use crate::core::types::{Domain, FeatureId, TerrainId, UnitCombatId};
use crate::rules::archetype::{CollateralProfile, UnitArchetype};
use crate::rules::database::{RulesBuilder, RulesDatabase};
use crate::rules::modifiers::{Capabilities, CombatModifiers};
use crate::rules::promotion::PromotionDefinition;

/// Load rules from a TOML file
pub fn load_rules(path: &Path) -> Result<RulesDatabase> {
    let content = std::fs::read_to_string(path)?;
    parse_rules(&content)
}

/// Parse rules from a TOML string
pub fn parse_rules(content: &str) -> Result<RulesDatabase> {
    let toml_rules: TomlRules = toml::from_str(content)?;
    let mut builder = RulesDatabase::builder();

    for name in &toml_rules.unit_combats {
        builder.unit_combat(name)?;
    }
    for name in &toml_rules.terrains {
        builder.terrain(name)?;
    }
    for name in &toml_rules.features {
        builder.feature(name)?;
    }

    for archetype in toml_rules.archetypes {
        let archetype = archetype.into_archetype(&builder)?;
        builder.archetype(archetype)?;
    }

    // Register first, wire prerequisites second: promotions may name later ones
    let mut pending = Vec::with_capacity(toml_rules.promotions.len());
    for promotion in toml_rules.promotions {
        let (definition, prereq, prereq_or) = promotion.into_promotion(&builder)?;
        let id = builder.promotion(definition)?;
        pending.push((id, prereq, prereq_or));
    }

    for (id, prereq, prereq_or) in pending {
        let prereq = prereq
            .map(|name| resolve_promotion(&builder, &name))
            .transpose()?;
        let prereq_or = prereq_or
            .iter()
            .map(|name| resolve_promotion(&builder, name))
            .collect::<Result<Vec<_>>>()?;
        builder.set_prerequisites(id, prereq, prereq_or)?;
    }

    let db = builder.build()?;
    tracing::info!(
        "Loaded rules: {} archetypes, {} promotions, {} unit combat classes",
        db.archetype_count(),
        db.promotion_count(),
        db.unit_combat_count()
    );
    Ok(db)
}

fn resolve_promotion(builder: &RulesBuilder, name: &str) -> Result<crate::core::types::PromotionId> {
    builder
        .lookup_promotion(name)
        .ok_or_else(|| AnalysisError::UnknownPromotion(name.to_string()))
}

fn resolve_unit_combat(builder: &RulesBuilder, name: &str) -> Result<UnitCombatId> {
    builder
        .lookup_unit_combat(name)
        .ok_or_else(|| AnalysisError::UnknownUnitCombat(name.to_string()))
}

/// TOML representation of a rules file
#[derive(Debug, Deserialize)]
struct TomlRules {
    #[serde(default)]
    unit_combats: Vec<String>,
    #[serde(default)]
    terrains: Vec<String>,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    archetypes: Vec<TomlArchetype>,
    #[serde(default)]
    promotions: Vec<TomlPromotion>,
}

/// Name-keyed modifier block shared by archetypes and promotions
#[derive(Debug, Default, Deserialize)]
struct TomlModifiers {
    #[serde(default)]
    combat_pct: i32,
    #[serde(default)]
    city_attack_pct: i32,
    #[serde(default)]
    city_defense_pct: i32,
    #[serde(default)]
    hills_attack_pct: i32,
    #[serde(default)]
    hills_defense_pct: i32,
    #[serde(default)]
    first_strikes: i32,
    #[serde(default)]
    chance_first_strikes: i32,
    #[serde(default)]
    withdrawal_pct: i32,
    #[serde(default)]
    collateral_damage_pct: i32,
    #[serde(default)]
    animal_combat_pct: i32,
    #[serde(default)]
    unit_combat_pct: BTreeMap<String, i32>,
    #[serde(default)]
    terrain_attack_pct: BTreeMap<String, i32>,
    #[serde(default)]
    terrain_defense_pct: BTreeMap<String, i32>,
    #[serde(default)]
    feature_attack_pct: BTreeMap<String, i32>,
    #[serde(default)]
    feature_defense_pct: BTreeMap<String, i32>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlCapabilities {
    #[serde(default)]
    blitz: bool,
    #[serde(default)]
    amphibious: bool,
    #[serde(default)]
    river: bool,
    #[serde(default)]
    immune_to_first_strikes: bool,
    #[serde(default)]
    no_defensive_bonus: bool,
}

#[derive(Debug, Deserialize)]
struct TomlCollateral {
    damage_pct: i32,
    limit_pct: i32,
    max_units: u32,
    #[serde(default)]
    immune: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TomlArchetype {
    name: String,
    combat: i32,
    #[serde(default = "default_moves")]
    moves: i32,
    #[serde(default)]
    domain: Domain,
    #[serde(default)]
    unit_combat: Option<String>,
    #[serde(default)]
    combat_limit: Option<i32>,
    #[serde(default)]
    only_defensive: bool,
    #[serde(default)]
    animal: bool,
    #[serde(default)]
    collateral: Option<TomlCollateral>,
    #[serde(flatten)]
    modifiers: TomlModifiers,
    #[serde(flatten)]
    capabilities: TomlCapabilities,
}

#[derive(Debug, Deserialize)]
struct TomlPromotion {
    name: String,
    #[serde(default)]
    moves: i32,
    #[serde(default)]
    leader: bool,
    #[serde(default)]
    prereq: Option<String>,
    #[serde(default)]
    prereq_or: Vec<String>,
    #[serde(default)]
    unit_combats: Vec<String>,
    #[serde(flatten)]
    modifiers: TomlModifiers,
    #[serde(flatten)]
    capabilities: TomlCapabilities,
}

fn default_moves() -> i32 {
    1
}

fn resolve_map<K: Copy + std::hash::Hash + Eq>(
    map: &BTreeMap<String, i32>,
    lookup: impl Fn(&str) -> Result<K>,
) -> Result<AHashMap<K, i32>> {
    map.iter()
        .map(|(name, value)| Ok((lookup(name)?, *value)))
        .collect()
}

impl TomlModifiers {
    fn into_modifiers(self, moves: i32, builder: &RulesBuilder) -> Result<CombatModifiers> {
        let terrain = |name: &str| -> Result<TerrainId> {
            builder
                .lookup_terrain(name)
                .ok_or_else(|| AnalysisError::UnknownTerrain(name.to_string()))
        };
        let feature = |name: &str| -> Result<FeatureId> {
            builder
                .lookup_feature(name)
                .ok_or_else(|| AnalysisError::UnknownFeature(name.to_string()))
        };

        Ok(CombatModifiers {
            combat_pct: self.combat_pct,
            city_attack_pct: self.city_attack_pct,
            city_defense_pct: self.city_defense_pct,
            hills_attack_pct: self.hills_attack_pct,
            hills_defense_pct: self.hills_defense_pct,
            first_strikes: self.first_strikes,
            chance_first_strikes: self.chance_first_strikes,
            moves,
            withdrawal_pct: self.withdrawal_pct,
            collateral_damage_pct: self.collateral_damage_pct,
            animal_combat_pct: self.animal_combat_pct,
            unit_combat_pct: resolve_map(&self.unit_combat_pct, |n| resolve_unit_combat(builder, n))?,
            terrain_attack_pct: resolve_map(&self.terrain_attack_pct, terrain)?,
            terrain_defense_pct: resolve_map(&self.terrain_defense_pct, terrain)?,
            feature_attack_pct: resolve_map(&self.feature_attack_pct, feature)?,
            feature_defense_pct: resolve_map(&self.feature_defense_pct, feature)?,
        })
    }
}

impl From<TomlCapabilities> for Capabilities {
    fn from(caps: TomlCapabilities) -> Self {
        Capabilities {
            blitz: caps.blitz,
            amphibious: caps.amphibious,
            river: caps.river,
            immune_to_first_strikes: caps.immune_to_first_strikes,
            no_defensive_bonus: caps.no_defensive_bonus,
        }
    }
}

impl TomlArchetype {
    fn into_archetype(self, builder: &RulesBuilder) -> Result<UnitArchetype> {
        let unit_combat = self
            .unit_combat
            .as_deref()
            .map(|name| resolve_unit_combat(builder, name))
            .transpose()?;

        let collateral = self
            .collateral
            .map(|c| -> Result<CollateralProfile> {
                Ok(CollateralProfile {
                    damage_pct: c.damage_pct,
                    limit_pct: c.limit_pct,
                    max_units: c.max_units,
                    immune: c
                        .immune
                        .iter()
                        .map(|name| resolve_unit_combat(builder, name))
                        .collect::<Result<Vec<_>>>()?,
                })
            })
            .transpose()?;

        Ok(UnitArchetype {
            id: crate::core::types::ArchetypeId(0),
            name: self.name,
            domain: self.domain,
            unit_combat,
            combat: self.combat,
            combat_limit: self.combat_limit,
            modifiers: self.modifiers.into_modifiers(self.moves, builder)?,
            capabilities: self.capabilities.into(),
            collateral,
            only_defensive: self.only_defensive,
            is_animal: self.animal,
        })
    }
}

impl TomlPromotion {
    fn into_promotion(
        self,
        builder: &RulesBuilder,
    ) -> Result<(PromotionDefinition, Option<String>, Vec<String>)> {
        if self.prereq_or.len() > 2 {
            return Err(AnalysisError::TooManyPrerequisites(self.name));
        }

        let unit_combats = self
            .unit_combats
            .iter()
            .map(|name| resolve_unit_combat(builder, name))
            .collect::<Result<Vec<_>>>()?;

        let mut definition = PromotionDefinition::new(self.name);
        definition.modifiers = self.modifiers.into_modifiers(self.moves, builder)?;
        definition.capabilities = self.capabilities.into();
        definition.leader = self.leader;
        definition.unit_combats = unit_combats;

        Ok((definition, self.prereq, self.prereq_or))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_RULES: &str = r#"
unit_combats = ["melee", "archery"]
terrains = ["grassland"]
features = ["forest"]

[[archetypes]]
name = "Warrior"
combat = 1
unit_combat = "melee"

[[archetypes]]
name = "Archer"
combat = 3
unit_combat = "archery"
first_strikes = 1
city_defense_pct = 50
hills_defense_pct = 25

[[promotions]]
name = "Combat II"
combat_pct = 10
prereq = "Combat I"

[[promotions]]
name = "Combat I"
combat_pct = 10

[[promotions]]
name = "Woodsman I"
prereq_or = ["Combat I", "Combat II"]
unit_combats = ["melee"]
feature_defense_pct = { forest = 50 }
"#;

    #[test]
    fn test_parse_small_rules() {
        let db = parse_rules(SMALL_RULES).unwrap();

        assert_eq!(db.archetype_count(), 2);
        assert_eq!(db.promotion_count(), 3);

        let archer = db.archetype_by_name("Archer").unwrap();
        assert_eq!(archer.combat, 3);
        assert_eq!(archer.modifiers.first_strikes, 1);
        assert_eq!(archer.modifiers.city_defense_pct, 50);
        assert_eq!(archer.modifiers.moves, 1);
        assert_eq!(archer.combat_limit, None);
        assert_eq!(archer.unit_combat, db.unit_combat_by_name("archery"));
    }

    #[test]
    fn test_forward_prerequisites_resolve() {
        let db = parse_rules(SMALL_RULES).unwrap();
        let combat1 = db.promotion_by_name("Combat I").unwrap().id;
        let combat2 = db.promotion_by_name("Combat II").unwrap();
        assert_eq!(combat2.prereq, Some(combat1));

        let woodsman = db.promotion_by_name("Woodsman I").unwrap();
        assert_eq!(woodsman.prereq_or.len(), 2);
        let forest = db.feature_by_name("forest").unwrap();
        assert_eq!(woodsman.modifiers.feature_defense(forest), 50);
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let bad_class = r#"
[[archetypes]]
name = "Warrior"
combat = 1
unit_combat = "melee"
"#;
        assert!(matches!(
            parse_rules(bad_class),
            Err(AnalysisError::UnknownUnitCombat(_))
        ));

        let bad_prereq = r#"
[[promotions]]
name = "Combat II"
prereq = "Combat I"
"#;
        assert!(matches!(
            parse_rules(bad_prereq),
            Err(AnalysisError::UnknownPromotion(_))
        ));
    }

    #[test]
    fn test_three_alternatives_rejected() {
        let rules = r#"
[[promotions]]
name = "A"
[[promotions]]
name = "B"
[[promotions]]
name = "C"
[[promotions]]
name = "D"
prereq_or = ["A", "B", "C"]
"#;
        assert!(matches!(
            parse_rules(rules),
            Err(AnalysisError::TooManyPrerequisites(_))
        ));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            parse_rules("[[archetypes]\nname ="),
            Err(AnalysisError::RulesParse(_))
        ));
    }
}
