//! Situational modifiers of the plot being contested

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{ArchetypeId, Direction, DirectionSet, FeatureId, TerrainId};

/// Everything about the contested location that changes a defender's strength
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatContext {
    /// The defender sits in a city
    pub is_city_attack: bool,
    /// The defender is fortified
    pub fortified: bool,
    /// The plot is hills
    pub hills: bool,
    pub terrain: Option<TerrainId>,
    pub feature: Option<FeatureId>,
    /// Terrain/feature defense of the plot itself
    pub plot_defense_pct: i32,
    /// Culture and building defense of a city on the plot
    pub city_defense_pct: i32,
    /// Directions whose approach crosses a river
    pub river_crossings: DirectionSet,
    /// Directions whose approach is from the sea
    pub amphibious_crossings: DirectionSet,
    /// Direction attacks come from unless overridden
    pub attack_direction: Option<Direction>,
    /// Per-attacker direction, keyed by the attacking archetype
    pub direction_overrides: AHashMap<ArchetypeId, Direction>,
    pub attacker_is_barbarian: bool,
}

impl CombatContext {
    /// Flat open ground, no modifiers at all
    pub fn open_field() -> Self {
        Self::default()
    }

    /// A fortified city defender with the given culture/building defense
    pub fn city(city_defense_pct: i32) -> Self {
        Self {
            is_city_attack: true,
            fortified: true,
            city_defense_pct,
            ..Self::default()
        }
    }

    pub fn with_hills(mut self) -> Self {
        self.hills = true;
        self
    }

    pub fn with_fortified(mut self) -> Self {
        self.fortified = true;
        self
    }

    pub fn with_terrain(mut self, terrain: TerrainId) -> Self {
        self.terrain = Some(terrain);
        self
    }

    pub fn with_feature(mut self, feature: FeatureId, defense_pct: i32) -> Self {
        self.feature = Some(feature);
        self.plot_defense_pct += defense_pct;
        self
    }

    /// Attacks arrive from `direction`, across a river
    pub fn with_river_attack(mut self, direction: Direction) -> Self {
        self.river_crossings.insert(direction);
        self.attack_direction = Some(direction);
        self
    }

    /// Attacks arrive from `direction`, from the sea
    pub fn with_amphibious_attack(mut self, direction: Direction) -> Self {
        self.amphibious_crossings.insert(direction);
        self.attack_direction = Some(direction);
        self
    }

    pub fn override_direction(&mut self, attacker: ArchetypeId, direction: Direction) {
        self.direction_overrides.insert(attacker, direction);
    }

    pub fn direction_for(&self, attacker: ArchetypeId) -> Option<Direction> {
        self.direction_overrides
            .get(&attacker)
            .copied()
            .or(self.attack_direction)
    }

    pub fn crosses_river(&self, attacker: ArchetypeId) -> bool {
        self.direction_for(attacker)
            .is_some_and(|d| self.river_crossings.contains(d))
    }

    pub fn is_amphibious(&self, attacker: ArchetypeId) -> bool {
        self.direction_for(attacker)
            .is_some_and(|d| self.amphibious_crossings.contains(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_field_has_no_crossings() {
        let ctx = CombatContext::open_field();
        assert!(!ctx.crosses_river(ArchetypeId(0)));
        assert!(!ctx.is_amphibious(ArchetypeId(0)));
        assert!(!ctx.is_city_attack);
    }

    #[test]
    fn test_city_context_is_fortified() {
        let ctx = CombatContext::city(50);
        assert!(ctx.is_city_attack);
        assert!(ctx.fortified);
        assert_eq!(ctx.city_defense_pct, 50);
    }

    #[test]
    fn test_direction_override_changes_crossing() {
        let swordsman = ArchetypeId(1);
        let galley_borne = ArchetypeId(2);

        let mut ctx = CombatContext::open_field().with_river_attack(Direction::North);
        ctx.amphibious_crossings.insert(Direction::West);
        ctx.override_direction(galley_borne, Direction::West);

        assert!(ctx.crosses_river(swordsman));
        assert!(!ctx.is_amphibious(swordsman));

        assert!(!ctx.crosses_river(galley_borne));
        assert!(ctx.is_amphibious(galley_borne));
    }
}
