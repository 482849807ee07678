//! Greedy promotion allocation
//!
//! Each step grants the candidate (plus any prerequisites it still needs)
//! with the largest gain in the pool's value function, charging one level
//! of budget per promotion granted. Commitments are never undone. Pools are
//! chained: whatever budget one pool leaves unspent is handed to the next.

use serde::{Deserialize, Serialize};

use crate::combat::instance::UnitInstance;
use crate::core::config::AnalysisConfig;
use crate::core::types::PromotionId;
use crate::optimizer::depth::PromotionDepths;
use crate::optimizer::value::{PromotionValue, ValuePool};
use crate::rules::{RulesDatabase, UnitArchetype};

/// Result of an allocation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionAllocation {
    /// Levels left unspent
    pub remaining_budget: u32,
    /// Promotions held afterwards, in the order granted
    pub promotions: Vec<PromotionId>,
}

impl PromotionAllocation {
    pub fn contains(&self, id: PromotionId) -> bool {
        self.promotions.contains(&id)
    }
}

/// A candidate and the promotions taking it would grant
struct Pick {
    gain: i32,
    rank: usize,
    grant: Vec<PromotionId>,
}

impl Pick {
    fn cost(&self) -> usize {
        self.grant.len()
    }

    fn beats(&self, other: &Pick) -> bool {
        (self.gain, std::cmp::Reverse(self.cost()), std::cmp::Reverse(self.rank))
            > (other.gain, std::cmp::Reverse(other.cost()), std::cmp::Reverse(other.rank))
    }
}

/// Greedy allocator over one rules database
pub struct PromotionAllocator<'a> {
    rules: &'a RulesDatabase,
    depths: &'a PromotionDepths,
    max_hp: i32,
}

impl<'a> PromotionAllocator<'a> {
    pub fn new(rules: &'a RulesDatabase, depths: &'a PromotionDepths, config: &AnalysisConfig) -> Self {
        Self {
            rules,
            depths,
            max_hp: config.max_hit_points,
        }
    }

    /// Spend up to `budget` levels on `pool` for a unit already holding `existing`
    pub fn allocate(
        &self,
        pool: &ValuePool,
        archetype: &UnitArchetype,
        budget: u32,
        existing: &[PromotionId],
    ) -> PromotionAllocation {
        let mut held: Vec<PromotionId> = Vec::with_capacity(existing.len() + budget as usize);
        for id in existing {
            if !held.contains(id) {
                held.push(*id);
            }
        }
        let mut remaining = budget;

        while remaining > 0 {
            let unit = UnitInstance::with_promotions(archetype, self.max_hp, self.rules, held.iter().copied());
            let current = pool.value.score(&unit);
            let mut best: Option<Pick> = None;

            for (rank, &candidate) in pool.candidates.iter().enumerate() {
                if held.contains(&candidate) {
                    continue;
                }
                // Too deep to reach with what is left
                match self.depths.depth(candidate) {
                    Some(depth) if (depth as usize) < remaining as usize + held.len() => {}
                    _ => continue,
                }
                let Some(grant) = self.acquisition(candidate, &held, archetype, pool.value) else {
                    continue;
                };
                if grant.len() > remaining as usize {
                    continue;
                }

                let mut trial = unit.clone();
                for id in &grant {
                    if let Some(promotion) = self.rules.promotion(*id) {
                        trial.apply_promotion(promotion);
                    }
                }
                let gain = pool.value.score(&trial) - current;
                if gain <= 0 {
                    continue;
                }

                let pick = Pick { gain, rank, grant };
                if best.as_ref().map_or(true, |b| pick.beats(b)) {
                    best = Some(pick);
                }
            }

            let Some(pick) = best else {
                break;
            };
            tracing::debug!(
                archetype = %archetype.name,
                value = ?pool.value,
                granted = ?pick.grant,
                gain = pick.gain,
                "allocator commit"
            );
            remaining -= pick.cost() as u32;
            held.extend(pick.grant);
        }

        PromotionAllocation {
            remaining_budget: remaining,
            promotions: held,
        }
    }

    /// Run `pools` in priority order, each inheriting the previous leftovers
    pub fn allocate_chain(
        &self,
        pools: &[ValuePool],
        archetype: &UnitArchetype,
        budget: u32,
        existing: &[PromotionId],
    ) -> PromotionAllocation {
        let start = PromotionAllocation {
            remaining_budget: budget,
            promotions: existing.to_vec(),
        };
        pools.iter().fold(start, |acc, pool| {
            if acc.remaining_budget == 0 {
                return acc;
            }
            self.allocate(pool, archetype, acc.remaining_budget, &acc.promotions)
        })
    }

    /// Promotions newly granted by taking `id`, prerequisites first
    ///
    /// `None` when `id` or a required prerequisite cannot be taken by this
    /// archetype.
    pub fn acquisition(
        &self,
        id: PromotionId,
        held: &[PromotionId],
        archetype: &UnitArchetype,
        value: PromotionValue,
    ) -> Option<Vec<PromotionId>> {
        let mut grant = Vec::new();
        self.acquire(id, held, archetype, value, &mut grant).then_some(grant)
    }

    fn acquire(
        &self,
        id: PromotionId,
        held: &[PromotionId],
        archetype: &UnitArchetype,
        value: PromotionValue,
        grant: &mut Vec<PromotionId>,
    ) -> bool {
        if held.contains(&id) || grant.contains(&id) {
            return true;
        }
        let Some(promotion) = self.rules.promotion(id) else {
            return false;
        };
        if !self.rules.promotion_applies(promotion, archetype) {
            return false;
        }
        if let Some(prereq) = promotion.prereq {
            if !self.acquire(prereq, held, archetype, value, grant) {
                return false;
            }
        }

        let satisfied = promotion.prereq_or.is_empty()
            || promotion
                .prereq_or
                .iter()
                .any(|p| held.contains(p) || grant.contains(p));
        if !satisfied {
            // Cheapest alternative; equal cost goes to the more valuable one
            let mut best: Option<(usize, i32, Vec<PromotionId>)> = None;
            for &alternative in &promotion.prereq_or {
                let mut trial = grant.clone();
                if !self.acquire(alternative, held, archetype, value, &mut trial) {
                    continue;
                }
                let raw = self.rules.promotion(alternative).map_or(0, |p| value.raw(p));
                let better = match &best {
                    None => true,
                    Some((cost, best_raw, _)) => {
                        trial.len() < *cost || (trial.len() == *cost && raw > *best_raw)
                    }
                };
                if better {
                    best = Some((trial.len(), raw, trial));
                }
            }
            match best {
                Some((_, _, trial)) => *grant = trial,
                None => return false,
            }
        }

        grant.push(id);
        true
    }
}
