//! Oracle parameter set
//!
//! `CombatParams` is everything a round-probability oracle sees about one
//! engagement. The deterministic parts (damage per round, rounds needed by
//! each side, the defender's floor) live here so the oracle and the outcome
//! aggregator agree on them.

use serde::{Deserialize, Serialize};

use crate::combat::context::CombatContext;
use crate::combat::instance::{firepower, UnitInstance};
use crate::core::config::AnalysisConfig;

/// One side of an engagement, as the oracle sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantParams {
    /// Current strength (hundredths), already scaled by HP
    pub strength: i32,
    pub first_strikes: i32,
    pub chance_first_strikes: i32,
    pub immune_to_first_strikes: bool,
    pub firepower: i32,
    pub hp: i32,
    pub max_hp: i32,
}

/// The full parameter set of one attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatParams {
    pub attacker: CombatantParams,
    pub defender: CombatantParams,
    /// `None` when the attacker can destroy anything it beats
    pub attacker_combat_limit: Option<i32>,
    pub combat_damage: i32,
    pub die_sides: i32,
}

impl CombatParams {
    /// Assemble the parameters of `attacker` hitting `defender` in `ctx`
    pub fn between(
        attacker: &UnitInstance<'_>,
        defender: &UnitInstance<'_>,
        ctx: &CombatContext,
        config: &AnalysisConfig,
    ) -> Self {
        let att_max = attacker.attack_strength();
        let att_cur = attacker.current_attack_strength();
        let def_max = defender.defense_strength(Some(attacker), ctx, config);
        let def_cur = defender.current_defense_strength(Some(attacker), ctx, config);

        Self {
            attacker: CombatantParams {
                strength: att_cur,
                first_strikes: attacker.first_strikes(),
                chance_first_strikes: attacker.chance_first_strikes(),
                immune_to_first_strikes: attacker.immune_to_first_strikes(),
                firepower: firepower(att_max, att_cur),
                hp: attacker.hp(),
                max_hp: attacker.max_hp(),
            },
            defender: CombatantParams {
                strength: def_cur,
                first_strikes: defender.first_strikes(),
                chance_first_strikes: defender.chance_first_strikes(),
                immune_to_first_strikes: defender.immune_to_first_strikes(),
                firepower: firepower(def_max, def_cur),
                hp: defender.hp(),
                max_hp: defender.max_hp(),
            },
            attacker_combat_limit: attacker.combat_limit(),
            combat_damage: config.combat_damage,
            die_sides: config.combat_die_sides,
        }
    }

    fn strength_factor(&self) -> i32 {
        (self.attacker.firepower + self.defender.firepower + 1) / 2
    }

    /// HP the defender loses per round the attacker wins
    pub fn damage_to_defender(&self) -> i32 {
        let sf = self.strength_factor();
        let num = self.combat_damage as i64 * (self.attacker.firepower + sf) as i64;
        let den = ((self.defender.firepower + sf) as i64).max(1);
        ((num / den) as i32).max(1)
    }

    /// HP the attacker loses per round the defender wins
    pub fn damage_to_attacker(&self) -> i32 {
        let sf = self.strength_factor();
        let num = self.combat_damage as i64 * (self.defender.firepower + sf) as i64;
        let den = ((self.attacker.firepower + sf) as i64).max(1);
        ((num / den) as i32).max(1)
    }

    /// HP the attacker's combat limit leaves the defender with
    pub fn defender_floor(&self) -> i32 {
        self.attacker_combat_limit
            .map_or(0, |limit| (self.defender.max_hp - limit).max(0))
    }

    /// Whether a won fight destroys the defender rather than pulling out
    pub fn can_destroy_defender(&self) -> bool {
        self.defender_floor() == 0
    }

    /// Rounds the attacker must win to finish the fight
    pub fn rounds_to_beat_defender(&self) -> i32 {
        let to_remove = self.defender.hp - self.defender_floor();
        if to_remove <= 0 {
            return 0;
        }
        div_ceil(to_remove, self.damage_to_defender())
    }

    /// Rounds the defender must win to destroy the attacker
    pub fn rounds_to_beat_attacker(&self) -> i32 {
        if self.attacker.hp <= 0 {
            return 0;
        }
        div_ceil(self.attacker.hp, self.damage_to_attacker())
    }

    /// Whether any round will be fought at all
    pub fn can_engage(&self) -> bool {
        self.rounds_to_beat_defender() > 0 && self.rounds_to_beat_attacker() > 0
    }

    /// Chance (out of `die_sides`) that the attacker wins a single round
    pub fn attacker_round_odds(&self) -> i32 {
        let att = self.attacker.strength.max(0) as i64;
        let def = self.defender.strength.max(0) as i64;
        let die = self.die_sides as i64;
        if att + def == 0 {
            return 0;
        }
        (die - die * def / (att + def)) as i32
    }

    /// Same chance as a probability
    pub fn attacker_round_probability(&self) -> f64 {
        self.attacker_round_odds() as f64 / self.die_sides.max(1) as f64
    }

    /// Attacker first strikes that survive the defender's immunity
    pub fn effective_attacker_first_strikes(&self) -> (i32, i32) {
        if self.defender.immune_to_first_strikes {
            (0, 0)
        } else {
            (self.attacker.first_strikes, self.attacker.chance_first_strikes)
        }
    }

    /// Defender first strikes that survive the attacker's immunity
    pub fn effective_defender_first_strikes(&self) -> (i32, i32) {
        if self.attacker.immune_to_first_strikes {
            (0, 0)
        } else {
            (self.defender.first_strikes, self.defender.chance_first_strikes)
        }
    }

    /// HP left to the attacker after losing `hits` rounds
    pub fn attacker_hp_after(&self, hits: i32) -> i32 {
        (self.attacker.hp - hits * self.damage_to_attacker()).max(0)
    }

    /// HP left to the defender after losing `hits` rounds
    pub fn defender_hp_after(&self, hits: i32) -> i32 {
        (self.defender.hp - hits * self.damage_to_defender()).max(self.defender_floor())
    }
}

fn div_ceil(num: i32, den: i32) -> i32 {
    let den = den.max(1);
    (num + den - 1) / den
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::UnitArchetype;

    fn params(att: i32, def: i32) -> CombatParams {
        let config = AnalysisConfig::default();
        let a = UnitArchetype::new("A", att);
        let d = UnitArchetype::new("D", def);
        CombatParams::between(
            &UnitInstance::new(&a, 100),
            &UnitInstance::new(&d, 100),
            &CombatContext::open_field(),
            &config,
        )
    }

    #[test]
    fn test_even_matchup() {
        let p = params(1, 1);
        assert_eq!(p.damage_to_defender(), 20);
        assert_eq!(p.damage_to_attacker(), 20);
        assert_eq!(p.rounds_to_beat_defender(), 5);
        assert_eq!(p.rounds_to_beat_attacker(), 5);
        assert_eq!(p.attacker_round_odds(), 500);
        assert!(p.can_engage());
    }

    #[test]
    fn test_stronger_attacker_hits_harder() {
        let p = params(4, 2);
        assert!(p.damage_to_defender() > p.damage_to_attacker());
        assert!(p.rounds_to_beat_defender() < p.rounds_to_beat_attacker());
        assert_eq!(p.attacker_round_odds(), 667);
    }

    #[test]
    fn test_combat_limit_floor() {
        let config = AnalysisConfig::default();
        let mut cat = UnitArchetype::new("Catapult", 5);
        cat.combat_limit = Some(75);
        let d = UnitArchetype::new("Archer", 3);
        let p = CombatParams::between(
            &UnitInstance::new(&cat, 100),
            &UnitInstance::new(&d, 100),
            &CombatContext::open_field(),
            &config,
        );
        assert_eq!(p.defender_floor(), 25);
        assert!(!p.can_destroy_defender());
        assert_eq!(p.defender_hp_after(100), 25);

        let wounded = CombatParams::between(
            &UnitInstance::new(&cat, 100),
            &UnitInstance::new(&d, 100).with_hp(20),
            &CombatContext::open_field(),
            &config,
        );
        assert_eq!(wounded.rounds_to_beat_defender(), 0);
        assert!(!wounded.can_engage());
    }

    #[test]
    fn test_unlimited_attacker_destroys_at_any_max_hp() {
        let config = AnalysisConfig {
            max_hit_points: 200,
            ..AnalysisConfig::default()
        };
        let sword = UnitArchetype::new("Swordsman", 6);
        let mut cat = UnitArchetype::new("Catapult", 5);
        cat.combat_limit = Some(75);
        let d = UnitArchetype::new("Warrior", 2);

        let p = CombatParams::between(
            &UnitInstance::new(&sword, 200),
            &UnitInstance::new(&d, 200),
            &CombatContext::open_field(),
            &config,
        );
        assert_eq!(p.attacker_combat_limit, None);
        assert_eq!(p.defender_floor(), 0);
        assert!(p.can_destroy_defender());
        assert!(p.rounds_to_beat_defender() * p.damage_to_defender() >= 200);

        let limited = CombatParams::between(
            &UnitInstance::new(&cat, 200),
            &UnitInstance::new(&d, 200),
            &CombatContext::open_field(),
            &config,
        );
        assert_eq!(limited.defender_floor(), 125);
    }

    #[test]
    fn test_immunity_cancels_opponent_first_strikes() {
        let config = AnalysisConfig::default();
        let mut archer = UnitArchetype::new("Archer", 3);
        archer.modifiers.first_strikes = 1;
        archer.modifiers.chance_first_strikes = 1;
        let mut knight = UnitArchetype::new("Knight", 10);
        knight.capabilities.immune_to_first_strikes = true;

        let p = CombatParams::between(
            &UnitInstance::new(&knight, 100),
            &UnitInstance::new(&archer, 100),
            &CombatContext::open_field(),
            &config,
        );
        assert_eq!(p.effective_defender_first_strikes(), (0, 0));
        assert_eq!(p.defender.first_strikes, 1);
    }
}
