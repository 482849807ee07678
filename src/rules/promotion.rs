//! Promotion definitions and their prerequisite relation

use serde::{Deserialize, Serialize};

use crate::core::types::{PromotionId, UnitCombatId};
use crate::rules::modifiers::{Capabilities, CombatModifiers};

/// A stackable upgrade a unit can take once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionDefinition {
    pub id: PromotionId,
    pub name: String,
    pub modifiers: CombatModifiers,
    pub capabilities: Capabilities,
    /// Great-general promotions; never picked by the optimiser
    pub leader: bool,
    /// Mandatory prerequisite
    pub prereq: Option<PromotionId>,
    /// Alternatives, at least one of which must be held (at most two)
    pub prereq_or: Vec<PromotionId>,
    /// Unit combat classes allowed to take it (empty = any class)
    pub unit_combats: Vec<UnitCombatId>,
}

impl PromotionDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PromotionId(0),
            name: name.into(),
            modifiers: CombatModifiers::default(),
            capabilities: Capabilities::default(),
            leader: false,
            prereq: None,
            prereq_or: Vec::new(),
            unit_combats: Vec::new(),
        }
    }

    pub fn with_combat(mut self, pct: i32) -> Self {
        self.modifiers.combat_pct = pct;
        self
    }

    pub fn requires(mut self, prereq: PromotionId) -> Self {
        self.prereq = Some(prereq);
        self
    }

    pub fn requires_any(mut self, alternatives: &[PromotionId]) -> Self {
        self.prereq_or = alternatives.to_vec();
        self
    }

    pub fn for_classes(mut self, classes: &[UnitCombatId]) -> Self {
        self.unit_combats = classes.to_vec();
        self
    }

    pub fn has_prerequisites(&self) -> bool {
        self.prereq.is_some() || !self.prereq_or.is_empty()
    }

    /// Whether a unit of the given class may take this promotion
    pub fn allows_class(&self, class: Option<UnitCombatId>) -> bool {
        if self.unit_combats.is_empty() {
            return true;
        }
        class.is_some_and(|c| self.unit_combats.contains(&c))
    }

    /// Whether the prerequisites are met by the promotions `held` reports
    pub fn prerequisites_met(&self, held: impl Fn(PromotionId) -> bool) -> bool {
        let and_ok = self.prereq.map_or(true, &held);
        let or_ok = self.prereq_or.is_empty() || self.prereq_or.iter().any(|p| held(*p));
        and_ok && or_ok
    }
}
