//! Stat deltas shared by archetypes and promotions
//!
//! An archetype carries a base `CombatModifiers` block and every promotion
//! carries a delta block of the same shape. A unit instance is the fold of
//! the archetype block with each applied promotion's block.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{FeatureId, TerrainId, UnitCombatId};

/// Additive stat block (percentages are whole-number modifiers)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatModifiers {
    pub combat_pct: i32,
    pub city_attack_pct: i32,
    pub city_defense_pct: i32,
    pub hills_attack_pct: i32,
    pub hills_defense_pct: i32,
    pub first_strikes: i32,
    pub chance_first_strikes: i32,
    pub moves: i32,
    pub withdrawal_pct: i32,
    pub collateral_damage_pct: i32,
    pub animal_combat_pct: i32,
    pub unit_combat_pct: AHashMap<UnitCombatId, i32>,
    pub terrain_attack_pct: AHashMap<TerrainId, i32>,
    pub terrain_defense_pct: AHashMap<TerrainId, i32>,
    pub feature_attack_pct: AHashMap<FeatureId, i32>,
    pub feature_defense_pct: AHashMap<FeatureId, i32>,
}

fn merge_into<K: std::hash::Hash + Eq + Copy>(target: &mut AHashMap<K, i32>, delta: &AHashMap<K, i32>) {
    for (key, value) in delta {
        *target.entry(*key).or_insert(0) += value;
    }
}

impl CombatModifiers {
    /// Fold another block into this one
    pub fn accumulate(&mut self, delta: &CombatModifiers) {
        self.combat_pct += delta.combat_pct;
        self.city_attack_pct += delta.city_attack_pct;
        self.city_defense_pct += delta.city_defense_pct;
        self.hills_attack_pct += delta.hills_attack_pct;
        self.hills_defense_pct += delta.hills_defense_pct;
        self.first_strikes += delta.first_strikes;
        self.chance_first_strikes += delta.chance_first_strikes;
        self.moves += delta.moves;
        self.withdrawal_pct += delta.withdrawal_pct;
        self.collateral_damage_pct += delta.collateral_damage_pct;
        self.animal_combat_pct += delta.animal_combat_pct;
        merge_into(&mut self.unit_combat_pct, &delta.unit_combat_pct);
        merge_into(&mut self.terrain_attack_pct, &delta.terrain_attack_pct);
        merge_into(&mut self.terrain_defense_pct, &delta.terrain_defense_pct);
        merge_into(&mut self.feature_attack_pct, &delta.feature_attack_pct);
        merge_into(&mut self.feature_defense_pct, &delta.feature_defense_pct);
    }

    pub fn unit_combat(&self, class: UnitCombatId) -> i32 {
        self.unit_combat_pct.get(&class).copied().unwrap_or(0)
    }

    pub fn terrain_attack(&self, terrain: TerrainId) -> i32 {
        self.terrain_attack_pct.get(&terrain).copied().unwrap_or(0)
    }

    pub fn terrain_defense(&self, terrain: TerrainId) -> i32 {
        self.terrain_defense_pct.get(&terrain).copied().unwrap_or(0)
    }

    pub fn feature_attack(&self, feature: FeatureId) -> i32 {
        self.feature_attack_pct.get(&feature).copied().unwrap_or(0)
    }

    pub fn feature_defense(&self, feature: FeatureId) -> i32 {
        self.feature_defense_pct.get(&feature).copied().unwrap_or(0)
    }
}

/// Boolean abilities; promotions can only grant them, never take them away
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    pub blitz: bool,
    pub amphibious: bool,
    pub river: bool,
    pub immune_to_first_strikes: bool,
    pub no_defensive_bonus: bool,
}

impl Capabilities {
    pub fn merge(&mut self, other: &Capabilities) {
        self.blitz |= other.blitz;
        self.amphibious |= other.amphibious;
        self.river |= other.river;
        self.immune_to_first_strikes |= other.immune_to_first_strikes;
        self.no_defensive_bonus |= other.no_defensive_bonus;
    }
}
