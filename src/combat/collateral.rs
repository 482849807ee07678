//! Collateral damage distribution
//!
//! Siege units splash damage onto the units stacked with their primary
//! target. Targets are drawn at random, weighted towards healthier units,
//! and damage never pushes a unit past the attacker's collateral limit or
//! heals one that is already worse off.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::constants::STRENGTH_SCALE;
use crate::combat::instance::UnitInstance;
use crate::core::config::AnalysisConfig;

/// Resulting damage per target, index-aligned with the input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralResult {
    /// Damage (max HP minus HP) of every target after the attack
    pub damage: Vec<i32>,
    /// Indices of the targets that were selected, in selection order
    pub hit: Vec<usize>,
}

impl CollateralResult {
    fn untouched(targets: &[UnitInstance<'_>]) -> Self {
        Self {
            damage: targets.iter().map(UnitInstance::damage).collect(),
            hit: Vec::new(),
        }
    }

    /// Total HP removed across all targets
    pub fn total_damage(&self, targets: &[UnitInstance<'_>]) -> i32 {
        self.damage
            .iter()
            .zip(targets)
            .map(|(after, target)| after - target.damage())
            .sum()
    }
}

/// Splash damage of `attacker` onto the secondary `targets`
///
/// `targets` excludes the primary defender. Ineligible targets (dead,
/// another domain, or immune to this attacker's collateral) are never hit.
pub fn collateral_damage<R: Rng + ?Sized>(
    attacker: &UnitInstance<'_>,
    targets: &[UnitInstance<'_>],
    config: &AnalysisConfig,
    rng: &mut R,
) -> CollateralResult {
    let mut result = CollateralResult::untouched(targets);
    let archetype = attacker.archetype();
    let Some(profile) = archetype.collateral.as_ref() else {
        return result;
    };

    let strength = archetype.combat.max(0) * STRENGTH_SCALE * profile.damage_pct / 100;
    if strength <= 0 || profile.max_units == 0 {
        return result;
    }

    let mut candidates: Vec<(i64, usize)> = targets
        .iter()
        .enumerate()
        .filter(|(_, t)| {
            t.hp() > 0
                && t.archetype().domain == archetype.domain
                && !t.archetype().is_collateral_immune_to(archetype)
        })
        .map(|(i, t)| ((1 + rng.gen_range(0..10_000)) as i64 * t.hp() as i64, i))
        .collect();
    // Highest key first; index breaks exact ties deterministically
    candidates.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    candidates.truncate(profile.max_units as usize);

    let extra = attacker.modifiers().collateral_damage_pct;
    let limit = profile.limit_pct * config.max_hit_points / 100;

    for (_, index) in candidates {
        let target = &targets[index];
        let theirs = target.archetype().combat.max(0) * STRENGTH_SCALE;
        let factor = (strength + theirs + 1) / 2;
        let ratio_num = (strength + factor) as i64;
        let ratio_den = ((theirs + factor) as i64).max(1);

        let damage = (config.collateral_combat_damage as i64 * ratio_num / ratio_den)
            * (100 + extra as i64)
            / 100;
        let damage = damage.max(0) as i32;
        let max_damage = (limit as i64).min(limit as i64 * ratio_num / ratio_den) as i32;

        let current = target.damage();
        let after = current.max((current + damage).min(max_damage));
        result.damage[index] = after;
        result.hit.push(index);
    }

    tracing::debug!(
        attacker = %archetype.name,
        hit = result.hit.len(),
        "collateral damage applied"
    );
    result
}
