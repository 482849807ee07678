//! Value functions and candidate pools

use serde::{Deserialize, Serialize};

use crate::combat::instance::UnitInstance;
use crate::core::types::{PromotionId, UnitCombatId};
use crate::rules::{CombatModifiers, PromotionDefinition, RulesDatabase, UnitArchetype};

/// What a promotion pass is trying to maximise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromotionValue {
    CityAttack,
    CityDefense,
    Combat,
    FirstStrike,
    Mobility,
    Withdrawal,
    /// Strength against one unit combat class
    Counter(UnitCombatId),
}

impl PromotionValue {
    fn score_modifiers(self, m: &CombatModifiers) -> i32 {
        match self {
            PromotionValue::CityAttack => m.combat_pct + m.city_attack_pct,
            PromotionValue::CityDefense => m.combat_pct + m.city_defense_pct,
            PromotionValue::Combat => m.combat_pct,
            // A sure first strike is worth two chances
            PromotionValue::FirstStrike => m.first_strikes * 2 + m.chance_first_strikes,
            PromotionValue::Mobility => m.moves,
            PromotionValue::Withdrawal => m.withdrawal_pct,
            PromotionValue::Counter(class) => m.combat_pct + m.unit_combat(class),
        }
    }

    /// Value of a whole unit
    pub fn score(self, unit: &UnitInstance<'_>) -> i32 {
        self.score_modifiers(unit.modifiers())
    }

    /// Value a promotion contributes on its own
    pub fn raw(self, promotion: &PromotionDefinition) -> i32 {
        self.score_modifiers(&promotion.modifiers)
    }
}

/// Candidates for one value function, best raw value first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePool {
    pub value: PromotionValue,
    pub candidates: Vec<PromotionId>,
}

impl ValuePool {
    /// Promotions `archetype` may take that raise `value` on their own
    pub fn for_archetype(value: PromotionValue, archetype: &UnitArchetype, rules: &RulesDatabase) -> Self {
        let mut ranked: Vec<(i32, PromotionId)> = rules
            .promotions()
            .iter()
            .filter(|p| rules.promotion_applies(p, archetype))
            .map(|p| (value.raw(p), p.id))
            .filter(|(raw, _)| *raw > 0)
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        Self {
            value,
            candidates: ranked.into_iter().map(|(_, id)| id).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
