//! Promotion dependency depths
//!
//! The depth of a promotion is the number of promotions a unit must take
//! before it: 0 with no prerequisites, `1 + and` with only a mandatory one,
//! and `1 + max(and, min(or))` when alternatives exist (a missing mandatory
//! prerequisite counts as 0).
//!
//! Depths are computed with an explicit work stack. A promotion reached
//! again while its own prerequisites are still being resolved closes a
//! cycle, which is reported instead of looped on.

use crate::core::error::{AnalysisError, Result};
use crate::core::types::PromotionId;
use crate::rules::{PromotionDefinition, RulesDatabase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done(u32),
}

/// Depth of every promotion, indexed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionDepths {
    depths: Vec<u32>,
}

impl PromotionDepths {
    /// Compute depths for every promotion in `rules`
    pub fn compute(rules: &RulesDatabase) -> Result<Self> {
        let promotions = rules.promotions();
        let mut state = vec![Visit::Unvisited; promotions.len()];
        // (promotion, prerequisites already pushed)
        let mut stack: Vec<(PromotionId, bool)> = Vec::new();

        for root in promotions {
            if state[root.id.index()] != Visit::Unvisited {
                continue;
            }
            stack.push((root.id, false));

            while let Some((id, expanded)) = stack.pop() {
                let index = id.index();
                let Some(promotion) = rules.promotion(id) else {
                    return Err(AnalysisError::UnknownPromotion(format!("{:?}", id)));
                };

                if expanded {
                    let depth = depth_from(promotion, &state);
                    state[index] = Visit::Done(depth);
                    continue;
                }
                if matches!(state[index], Visit::Done(_)) {
                    continue;
                }

                state[index] = Visit::InProgress;
                stack.push((id, true));
                for prereq in prerequisites(promotion) {
                    match state.get(prereq.index()) {
                        Some(Visit::InProgress) => {
                            return Err(AnalysisError::CyclicPromotionGraph(prereq));
                        }
                        Some(Visit::Unvisited) => stack.push((prereq, false)),
                        Some(Visit::Done(_)) => {}
                        None => {
                            return Err(AnalysisError::UnknownPromotion(format!(
                                "{:?} (prerequisite of {})",
                                prereq, promotion.name
                            )));
                        }
                    }
                }
            }
        }

        let depths = state
            .into_iter()
            .map(|visit| match visit {
                Visit::Done(depth) => depth,
                _ => 0,
            })
            .collect();
        Ok(Self { depths })
    }

    /// Depth of `id`, `None` for an unknown promotion
    pub fn depth(&self, id: PromotionId) -> Option<u32> {
        self.depths.get(id.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PromotionId, u32)> + '_ {
        self.depths
            .iter()
            .enumerate()
            .map(|(i, d)| (PromotionId(i as u16), *d))
    }

    /// Deepest promotion in the set
    pub fn max_depth(&self) -> u32 {
        self.depths.iter().copied().max().unwrap_or(0)
    }
}

fn prerequisites(promotion: &PromotionDefinition) -> impl Iterator<Item = PromotionId> + '_ {
    promotion.prereq.into_iter().chain(promotion.prereq_or.iter().copied())
}

/// Depth once every prerequisite is `Done`
fn depth_from(promotion: &PromotionDefinition, state: &[Visit]) -> u32 {
    let depth_of = |id: PromotionId| match state.get(id.index()) {
        Some(Visit::Done(depth)) => *depth,
        _ => 0,
    };

    if !promotion.has_prerequisites() {
        return 0;
    }
    let and_depth = promotion.prereq.map_or(0, depth_of);
    let or_depth = promotion.prereq_or.iter().map(|p| depth_of(*p)).min();
    match or_depth {
        Some(or_depth) => 1 + and_depth.max(or_depth),
        None => 1 + and_depth,
    }
}
