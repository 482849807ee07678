//! Round-probability oracle
//!
//! The oracle answers two questions about an engagement described by
//! [`CombatParams`]: the single-shot win odds, and the joint probability
//! that the fight ends with each side having lost a given number of rounds.
//! Hosts normally supply their own; [`StandardOracle`] is the reference
//! rule set used by the tools and tests.

use crate::combat::params::CombatParams;

/// Terminal distribution of an engagement
///
/// `attacker_wins[a]` is the probability the attacker finishes the defender
/// having lost exactly `a` rounds; `defender_wins[d]` is the probability the
/// defender destroys the attacker having lost exactly `d` rounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundDistribution {
    pub attacker_wins: Vec<f64>,
    pub defender_wins: Vec<f64>,
}

impl RoundDistribution {
    pub fn attacker_win_probability(&self) -> f64 {
        self.attacker_wins.iter().sum()
    }

    pub fn defender_win_probability(&self) -> f64 {
        self.defender_wins.iter().sum()
    }
}

/// Source of combat probabilities
pub trait CombatOracle {
    /// Single-shot win odds out of `params.die_sides`
    fn combat_odds(&self, params: &CombatParams) -> i32;

    /// Probability the fight ends with the attacker having lost
    /// `attacker_hits` rounds and the defender `defender_hits` rounds
    fn round_probability(&self, params: &CombatParams, attacker_hits: i32, defender_hits: i32) -> f64;

    /// Every terminal probability at once
    ///
    /// The default queries `round_probability` per terminal state; oracles
    /// that compute the whole grid anyway should override it.
    fn distribution(&self, params: &CombatParams) -> RoundDistribution {
        let need_def = params.rounds_to_beat_defender();
        let need_att = params.rounds_to_beat_attacker();
        if need_def == 0 || need_att == 0 {
            return RoundDistribution::default();
        }
        RoundDistribution {
            attacker_wins: (0..need_att)
                .map(|a| self.round_probability(params, a, need_def))
                .collect(),
            defender_wins: (0..need_def)
                .map(|d| self.round_probability(params, need_att, d))
                .collect(),
        }
    }
}

/// Reference oracle: one die roll per round, first strikes resolved first
///
/// Each side's first strikes are its fixed count plus a uniform draw over
/// `0..=chance`; the net difference becomes free rounds in which only the
/// side with the surplus can score. Regular rounds follow until one side
/// has won enough rounds. A fight against a combat-limit floor ends when
/// the floor is reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardOracle;

impl StandardOracle {
    pub fn new() -> Self {
        Self
    }

    fn compute(params: &CombatParams) -> RoundDistribution {
        let need_def = params.rounds_to_beat_defender() as usize;
        let need_att = params.rounds_to_beat_attacker() as usize;
        if need_def == 0 || need_att == 0 {
            return RoundDistribution::default();
        }

        let p = params.attacker_round_probability();
        let (att_fs, att_chance) = params.effective_attacker_first_strikes();
        let (def_fs, def_chance) = params.effective_defender_first_strikes();
        let weight = 1.0 / ((att_chance + 1) as f64 * (def_chance + 1) as f64);

        let mut result = RoundDistribution {
            attacker_wins: vec![0.0; need_att],
            defender_wins: vec![0.0; need_def],
        };

        for extra_att in 0..=att_chance {
            for extra_def in 0..=def_chance {
                let net = (att_fs + extra_att) - (def_fs + extra_def);
                let grid = Self::resolve_grid(p, net, need_att, need_def);
                for (total, part) in result.attacker_wins.iter_mut().zip(&grid.attacker_wins) {
                    *total += part * weight;
                }
                for (total, part) in result.defender_wins.iter_mut().zip(&grid.defender_wins) {
                    *total += part * weight;
                }
            }
        }
        result
    }

    /// Grid over (rounds lost by attacker, rounds lost by defender)
    fn resolve_grid(p: f64, net_first_strikes: i32, need_att: usize, need_def: usize) -> RoundDistribution {
        let q = 1.0 - p;
        let mut grid = vec![vec![0.0_f64; need_def + 1]; need_att + 1];
        grid[0][0] = 1.0;

        // Free rounds: attacker surplus walks row 0, defender surplus column 0
        for _ in 0..net_first_strikes.max(0) {
            for d in (0..need_def).rev() {
                let mass = grid[0][d];
                grid[0][d + 1] += mass * p;
                grid[0][d] = mass * q;
            }
        }
        for _ in 0..(-net_first_strikes).max(0) {
            for a in (0..need_att).rev() {
                let mass = grid[a][0];
                grid[a + 1][0] += mass * q;
                grid[a][0] = mass * p;
            }
        }

        for a in 0..need_att {
            for d in 0..need_def {
                let mass = grid[a][d];
                if mass == 0.0 {
                    continue;
                }
                grid[a][d + 1] += mass * p;
                grid[a + 1][d] += mass * q;
            }
        }

        RoundDistribution {
            attacker_wins: (0..need_att).map(|a| grid[a][need_def]).collect(),
            defender_wins: (0..need_def).map(|d| grid[need_att][d]).collect(),
        }
    }
}

impl CombatOracle for StandardOracle {
    fn combat_odds(&self, params: &CombatParams) -> i32 {
        let win = Self::compute(params).attacker_win_probability();
        (win * params.die_sides as f64).round() as i32
    }

    fn round_probability(&self, params: &CombatParams, attacker_hits: i32, defender_hits: i32) -> f64 {
        let need_def = params.rounds_to_beat_defender();
        let need_att = params.rounds_to_beat_attacker();
        if attacker_hits < 0 || defender_hits < 0 {
            return 0.0;
        }
        let dist = Self::compute(params);
        if defender_hits == need_def && attacker_hits < need_att {
            dist.attacker_wins.get(attacker_hits as usize).copied().unwrap_or(0.0)
        } else if attacker_hits == need_att && defender_hits < need_def {
            dist.defender_wins.get(defender_hits as usize).copied().unwrap_or(0.0)
        } else {
            0.0
        }
    }

    fn distribution(&self, params: &CombatParams) -> RoundDistribution {
        Self::compute(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::context::CombatContext;
    use crate::combat::instance::UnitInstance;
    use crate::core::config::AnalysisConfig;
    use crate::rules::UnitArchetype;

    fn params_for(att: &UnitArchetype, def: &UnitArchetype) -> CombatParams {
        CombatParams::between(
            &UnitInstance::new(att, 100),
            &UnitInstance::new(def, 100),
            &CombatContext::open_field(),
            &AnalysisConfig::default(),
        )
    }

    #[test]
    fn test_even_fight_is_a_coin_flip() {
        let warrior = UnitArchetype::new("Warrior", 1);
        let params = params_for(&warrior, &warrior);
        let odds = StandardOracle.combat_odds(&params);
        assert!((odds - 500).abs() <= 1, "odds = {odds}");
    }

    #[test]
    fn test_distribution_sums_to_one() {
        let axe = UnitArchetype::new("Axeman", 5);
        let mut archer = UnitArchetype::new("Archer", 3);
        archer.modifiers.first_strikes = 1;
        archer.modifiers.chance_first_strikes = 1;
        let dist = StandardOracle.distribution(&params_for(&axe, &archer));
        let total = dist.attacker_win_probability() + dist.defender_win_probability();
        assert!((total - 1.0).abs() < 1e-9, "total = {total}");
    }

    #[test]
    fn test_round_probability_matches_distribution() {
        let axe = UnitArchetype::new("Axeman", 5);
        let spear = UnitArchetype::new("Spearman", 4);
        let params = params_for(&axe, &spear);
        let dist = StandardOracle.distribution(&params);
        let need_def = params.rounds_to_beat_defender();
        let need_att = params.rounds_to_beat_attacker();

        for (a, expected) in dist.attacker_wins.iter().enumerate() {
            let got = StandardOracle.round_probability(&params, a as i32, need_def);
            assert!((got - expected).abs() < 1e-12);
        }
        assert_eq!(StandardOracle.round_probability(&params, need_att, need_def), 0.0);
        assert_eq!(StandardOracle.round_probability(&params, -1, 0), 0.0);
    }

    #[test]
    fn test_first_strikes_help_their_owner() {
        let plain = UnitArchetype::new("Archer", 3);
        let mut drilled = plain.clone();
        drilled.modifiers.first_strikes = 2;
        let axe = UnitArchetype::new("Axeman", 3);

        let base = StandardOracle.combat_odds(&params_for(&plain, &axe));
        let with_fs = StandardOracle.combat_odds(&params_for(&drilled, &axe));
        assert!(with_fs > base);
    }

    #[test]
    fn test_stronger_side_favoured() {
        let strong = UnitArchetype::new("Swordsman", 6);
        let weak = UnitArchetype::new("Warrior", 2);
        assert!(StandardOracle.combat_odds(&params_for(&strong, &weak)) > 900);
        assert!(StandardOracle.combat_odds(&params_for(&weak, &strong)) < 100);
    }

    #[test]
    fn test_no_engagement_gives_zero_odds() {
        let mut zero_limit = UnitArchetype::new("Bombard", 8);
        zero_limit.combat_limit = Some(0);
        let warrior = UnitArchetype::new("Warrior", 1);
        let params = params_for(&zero_limit, &warrior);
        assert_eq!(StandardOracle.combat_odds(&params), 0);
        assert!(StandardOracle.distribution(&params).attacker_wins.is_empty());
    }

    #[test]
    fn test_default_distribution_uses_round_probability() {
        struct Wrapped;
        impl CombatOracle for Wrapped {
            fn combat_odds(&self, params: &CombatParams) -> i32 {
                StandardOracle.combat_odds(params)
            }
            fn round_probability(&self, params: &CombatParams, a: i32, d: i32) -> f64 {
                StandardOracle.round_probability(params, a, d)
            }
        }

        let axe = UnitArchetype::new("Axeman", 5);
        let spear = UnitArchetype::new("Spearman", 4);
        let params = params_for(&axe, &spear);
        let wrapped = Wrapped.distribution(&params);
        let direct = StandardOracle.distribution(&params);
        for (x, y) in wrapped.attacker_wins.iter().zip(&direct.attacker_wins) {
            assert!((x - y).abs() < 1e-12);
        }
        assert_eq!(wrapped.defender_wins.len(), direct.defender_wins.len());
    }
}
