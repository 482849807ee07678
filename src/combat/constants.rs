//! Combat rule constants - the host's defaults for every tunable in one place
//!
//! Percentages are whole-number modifiers fed through the asymmetric
//! strength scaling; strengths themselves are kept in hundredths.

// Hit points
pub const MAX_HIT_POINTS: i32 = 100;

// Round resolution
pub const COMBAT_DIE_SIDES: i32 = 1000;
pub const COMBAT_DAMAGE: i32 = 20;
pub const COLLATERAL_COMBAT_DAMAGE: i32 = 10;

// Positional modifiers (percent)
pub const FORTIFY_BONUS_PCT: i32 = 25;
pub const RIVER_ATTACK_PCT: i32 = -25;
pub const AMPHIBIOUS_ATTACK_PCT: i32 = -50;
pub const HILLS_EXTRA_DEFENSE_PCT: i32 = 25;
pub const CITY_CULTURE_DEFENSE_PCT: i32 = 50;

/// Bound on any accumulated modifier before scaling
pub const MAX_MODIFIER: i32 = 10_000;

/// Deepest promotion level an analysis may budget for
pub const MAX_PROMOTION_LEVEL: u32 = 32;

/// Strength multiplier: a base combat of 1 is 100 internal units
pub const STRENGTH_SCALE: i32 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_constants_reasonable() {
        assert!(COMBAT_DAMAGE > 0 && COMBAT_DAMAGE < MAX_HIT_POINTS);
        assert!(COLLATERAL_COMBAT_DAMAGE > 0 && COLLATERAL_COMBAT_DAMAGE <= COMBAT_DAMAGE);
    }

    #[test]
    fn test_crossing_penalties_are_penalties() {
        assert!(RIVER_ATTACK_PCT < 0);
        assert!(AMPHIBIOUS_ATTACK_PCT < RIVER_ATTACK_PCT);
        assert!(FORTIFY_BONUS_PCT > 0);
    }
}
