//! Combat outcome aggregation
//!
//! Turns an oracle's terminal distribution into the four outcome branches
//! with their probabilities and expected surviving hit points.

use serde::{Deserialize, Serialize};

use crate::combat::context::CombatContext;
use crate::combat::instance::UnitInstance;
use crate::combat::oracle::CombatOracle;
use crate::combat::params::CombatParams;
use crate::core::config::AnalysisConfig;

/// One branch of an engagement
///
/// HP values are conditional on the branch happening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchOutcome {
    pub probability: f64,
    pub attacker_hp: f64,
    pub defender_hp: f64,
}

impl BranchOutcome {
    fn add(&mut self, probability: f64, attacker_hp: i32, defender_hp: i32) {
        self.probability += probability;
        self.attacker_hp += probability * attacker_hp as f64;
        self.defender_hp += probability * defender_hp as f64;
    }

    /// Turn accumulated weighted sums into conditional expectations
    fn finish(mut self) -> Self {
        if self.probability > 0.0 {
            self.attacker_hp /= self.probability;
            self.defender_hp /= self.probability;
        } else {
            self.attacker_hp = 0.0;
            self.defender_hp = 0.0;
        }
        self
    }
}

/// Full probabilistic result of one attack
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatOutcome {
    /// Defender destroyed
    pub victory: BranchOutcome,
    /// Attacker's combat limit reached; defender left at its floor
    pub pull_out: BranchOutcome,
    /// Attacker withdrew instead of dying
    pub retreat: BranchOutcome,
    /// Attacker destroyed
    pub defeat: BranchOutcome,
    pub expected_attacker_hp: f64,
    pub expected_defender_hp: f64,
    /// Scale of `win_odds`
    pub die_sides: i32,
}

impl CombatOutcome {
    /// Outcome of an attack that never lands a round
    ///
    /// A live attacker backs off untouched; a dead one counts as defeated.
    fn no_contest(params: &CombatParams) -> Self {
        let attacker_hp = params.attacker.hp.max(0) as f64;
        let defender_hp = params.defender.hp as f64;
        let branch = BranchOutcome {
            probability: 1.0,
            attacker_hp,
            defender_hp,
        };
        let mut outcome = Self {
            expected_attacker_hp: attacker_hp,
            expected_defender_hp: defender_hp,
            die_sides: params.die_sides,
            ..Self::default()
        };
        if params.attacker.hp > 0 {
            outcome.retreat = branch;
        } else {
            outcome.defeat = branch;
        }
        outcome
    }

    /// Probability the attacker survives with the defender beaten or floored
    pub fn win_probability(&self) -> f64 {
        self.victory.probability + self.pull_out.probability
    }

    /// `win_probability` out of `die_sides`
    pub fn win_odds(&self) -> i32 {
        (self.win_probability() * self.die_sides as f64).round() as i32
    }

    /// Probability the attacker destroys the defender
    pub fn attacker_kill_probability(&self) -> f64 {
        self.victory.probability
    }

    /// Probability the defender destroys the attacker
    pub fn defender_kill_probability(&self) -> f64 {
        self.defeat.probability
    }

    pub fn pull_out_probability(&self) -> f64 {
        self.pull_out.probability
    }

    pub fn retreat_probability(&self) -> f64 {
        self.retreat.probability
    }

    /// Sum of every branch; 1 up to rounding for a well-behaved oracle
    pub fn total_probability(&self) -> f64 {
        self.victory.probability
            + self.pull_out.probability
            + self.retreat.probability
            + self.defeat.probability
    }
}

/// Win odds of `attacker` against `defender`
pub fn resolve<O: CombatOracle + ?Sized>(
    oracle: &O,
    attacker: &UnitInstance<'_>,
    defender: &UnitInstance<'_>,
    ctx: &CombatContext,
    config: &AnalysisConfig,
) -> i32 {
    let params = CombatParams::between(attacker, defender, ctx, config);
    let odds = oracle.combat_odds(&params);
    tracing::trace!(
        attacker = %attacker.archetype().name,
        defender = %defender.archetype().name,
        odds,
        "resolved odds"
    );
    odds
}

/// Branch-by-branch outcome of `attacker` against `defender`
pub fn resolve_detailed<O: CombatOracle + ?Sized>(
    oracle: &O,
    attacker: &UnitInstance<'_>,
    defender: &UnitInstance<'_>,
    ctx: &CombatContext,
    config: &AnalysisConfig,
) -> CombatOutcome {
    let params = CombatParams::between(attacker, defender, ctx, config);
    outcome_from_params(oracle, &params, attacker.withdrawal_pct())
}

/// Aggregate the oracle's terminal states into branches
pub fn outcome_from_params<O: CombatOracle + ?Sized>(
    oracle: &O,
    params: &CombatParams,
    withdrawal_pct: i32,
) -> CombatOutcome {
    if !params.can_engage() {
        return CombatOutcome::no_contest(params);
    }

    let need_att = params.rounds_to_beat_attacker();
    let dist = oracle.distribution(params);
    let withdrawal = withdrawal_pct.clamp(0, 100) as f64 / 100.0;

    let mut victory = BranchOutcome::default();
    let mut pull_out = BranchOutcome::default();
    let mut retreat = BranchOutcome::default();
    let mut defeat = BranchOutcome::default();

    let floor = params.defender_floor();
    for (a, &p) in dist.attacker_wins.iter().enumerate() {
        let attacker_hp = params.attacker_hp_after(a as i32);
        if params.can_destroy_defender() {
            victory.add(p, attacker_hp, 0);
        } else {
            pull_out.add(p, attacker_hp, floor);
        }
    }

    // The retreating attacker keeps the HP it had before the killing blow
    let retreat_hp = params.attacker_hp_after(need_att - 1);
    for (d, &p) in dist.defender_wins.iter().enumerate() {
        let defender_hp = params.defender_hp_after(d as i32);
        retreat.add(p * withdrawal, retreat_hp, defender_hp);
        defeat.add(p * (1.0 - withdrawal), 0, defender_hp);
    }

    let expected_attacker_hp =
        victory.attacker_hp + pull_out.attacker_hp + retreat.attacker_hp + defeat.attacker_hp;
    let expected_defender_hp =
        victory.defender_hp + pull_out.defender_hp + retreat.defender_hp + defeat.defender_hp;

    CombatOutcome {
        victory: victory.finish(),
        pull_out: pull_out.finish(),
        retreat: retreat.finish(),
        defeat: defeat.finish(),
        expected_attacker_hp,
        expected_defender_hp,
        die_sides: params.die_sides,
    }
}
