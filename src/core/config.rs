//! Analysis configuration with documented constants
//!
//! Every tunable the engine reads is collected here. Defaults mirror the
//! host's standard rules; a TOML table can override any subset of them.

use serde::{Deserialize, Serialize};

use crate::combat::constants::{
    AMPHIBIOUS_ATTACK_PCT, CITY_CULTURE_DEFENSE_PCT, COLLATERAL_COMBAT_DAMAGE, COMBAT_DAMAGE,
    COMBAT_DIE_SIDES, FORTIFY_BONUS_PCT, HILLS_EXTRA_DEFENSE_PCT, MAX_HIT_POINTS,
    MAX_PROMOTION_LEVEL, RIVER_ATTACK_PCT,
};
use crate::core::error::{AnalysisError, Result};

/// Configuration for odds computation and table construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // === TABLE CONSTRUCTION ===
    /// Highest promotion level budget analysed per archetype and role
    ///
    /// Tables hold `max_promotion_level + 1` entries (level 0 = unpromoted).
    /// Build cost grows linearly with this value. Capped at
    /// `MAX_PROMOTION_LEVEL`.
    pub max_promotion_level: u32,

    /// Odds (out of `combat_die_sides`) a matchup must reach to count
    /// towards a unit's value
    ///
    /// Matchups below the floor are kept in the tables but contribute
    /// nothing to `unit_value`.
    pub min_odds_floor: i32,

    /// Whether to build counter-to-unit-combat roles for every class
    pub counter_roles: bool,

    // === COMBAT RULES ===
    /// Hit points of a fully healthy unit
    pub max_hit_points: i32,

    /// Base damage per won round, scaled by relative firepower
    pub combat_damage: i32,

    /// Base damage per collateral hit, scaled by relative strength
    pub collateral_combat_damage: i32,

    /// Resolution of a single round roll (odds are expressed out of this)
    pub combat_die_sides: i32,

    // === POSITIONAL MODIFIERS ===
    /// Flat defense bonus of a fortified defender
    pub fortify_bonus_pct: i32,

    /// Modifier applied to attacks across a river (negative = penalty)
    pub river_attack_pct: i32,

    /// Modifier applied to attacks from the sea (negative = penalty)
    pub amphibious_attack_pct: i32,

    /// Plot defense granted by hills
    pub hills_extra_defense_pct: i32,

    /// Culture/building defense assumed for city roles in the tables
    pub city_culture_defense_pct: i32,

    /// Handicap modifier granted to defenders against barbarian attackers
    pub barbarian_combat_pct: i32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_promotion_level: 5,
            min_odds_floor: 500,
            counter_roles: true,

            max_hit_points: MAX_HIT_POINTS,
            combat_damage: COMBAT_DAMAGE,
            collateral_combat_damage: COLLATERAL_COMBAT_DAMAGE,
            combat_die_sides: COMBAT_DIE_SIDES,

            fortify_bonus_pct: FORTIFY_BONUS_PCT,
            river_attack_pct: RIVER_ATTACK_PCT,
            amphibious_attack_pct: AMPHIBIOUS_ATTACK_PCT,
            hills_extra_defense_pct: HILLS_EXTRA_DEFENSE_PCT,
            city_culture_defense_pct: CITY_CULTURE_DEFENSE_PCT,
            barbarian_combat_pct: 0,
        }
    }
}

impl AnalysisConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML override and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_hit_points <= 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "max_hit_points ({}) must be positive",
                self.max_hit_points
            )));
        }

        if self.combat_damage <= 0 || self.collateral_combat_damage < 0 {
            return Err(AnalysisError::InvalidConfig(
                "combat damage must be positive".into(),
            ));
        }

        if self.combat_die_sides <= 1 {
            return Err(AnalysisError::InvalidConfig(format!(
                "combat_die_sides ({}) must exceed 1",
                self.combat_die_sides
            )));
        }

        if self.max_promotion_level > MAX_PROMOTION_LEVEL {
            return Err(AnalysisError::InvalidConfig(format!(
                "max_promotion_level ({}) must be at most {}",
                self.max_promotion_level, MAX_PROMOTION_LEVEL
            )));
        }

        // The floor is compared against odds, so it has to live on the same scale
        if self.min_odds_floor < 0 || self.min_odds_floor > self.combat_die_sides {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_odds_floor ({}) must be within 0..={}",
                self.min_odds_floor, self.combat_die_sides
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str("max_promotion_level = 3\n").unwrap();
        assert_eq!(config.max_promotion_level, 3);
        assert_eq!(config.combat_damage, COMBAT_DAMAGE);
        assert_eq!(config.min_odds_floor, 500);
    }

    #[test]
    fn test_floor_outside_die_is_rejected() {
        let config = AnalysisConfig {
            min_odds_floor: 2000,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_promotion_level_is_capped() {
        let at_cap = AnalysisConfig {
            max_promotion_level: MAX_PROMOTION_LEVEL,
            ..AnalysisConfig::default()
        };
        assert!(at_cap.validate().is_ok());

        let huge = AnalysisConfig {
            max_promotion_level: u32::MAX,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
        assert!(AnalysisConfig::from_toml_str("max_promotion_level = 4000000000").is_err());
    }

    #[test]
    fn test_invalid_toml_override_is_rejected() {
        assert!(AnalysisConfig::from_toml_str("max_hit_points = 0").is_err());
        assert!(AnalysisConfig::from_toml_str("max_hit_points = \"lots\"").is_err());
    }
}
