//! Unit stat model
//!
//! A `UnitInstance` is an archetype plus the promotions folded onto it.
//! Instances are cheap, short-lived values: each hypothetical build is a
//! fresh fold over `(archetype, promotions)`, never a long-lived object
//! mutated across trials.
//!
//! Strengths are in hundredths (a base combat of 1 is 100) and every
//! accumulated percentage goes through [`scale_strength`].

use crate::combat::constants::{MAX_MODIFIER, STRENGTH_SCALE};
use crate::combat::context::CombatContext;
use crate::core::config::AnalysisConfig;
use crate::core::types::PromotionId;
use crate::rules::{Capabilities, CombatModifiers, PromotionDefinition, RulesDatabase, UnitArchetype};

/// Scale a strength by an accumulated modifier
///
/// Positive modifiers multiply by `100 + m`; negative ones divide by
/// `100 - m`, so a penalty can shrink a strength towards zero but never
/// flip its sign or divide by zero.
pub fn scale_strength(strength: i32, modifier: i32) -> i32 {
    let modifier = modifier.clamp(-MAX_MODIFIER, MAX_MODIFIER) as i64;
    let strength = strength as i64;
    let scaled = if modifier > 0 {
        strength * (100 + modifier)
    } else {
        strength * 10_000 / (100 - modifier)
    };
    (scaled / 100).clamp(0, i32::MAX as i64) as i32
}

/// Damage-scaling value fed to the round oracle
pub fn firepower(max_strength: i32, current_strength: i32) -> i32 {
    (1 + max_strength + current_strength) / 2
}

/// A concrete unit: archetype, applied promotions and hit points
#[derive(Debug, Clone, PartialEq)]
pub struct UnitInstance<'a> {
    archetype: &'a UnitArchetype,
    promotions: Vec<PromotionId>,
    modifiers: CombatModifiers,
    capabilities: Capabilities,
    hp: i32,
    max_hp: i32,
}

impl<'a> UnitInstance<'a> {
    /// An unpromoted, fully healthy instance
    pub fn new(archetype: &'a UnitArchetype, max_hp: i32) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            archetype,
            promotions: Vec::new(),
            modifiers: archetype.modifiers.clone(),
            capabilities: archetype.capabilities,
            hp: max_hp,
            max_hp,
        }
    }

    /// Pure fold of `promotions` onto a fresh instance
    ///
    /// Unknown ids are skipped; repeated ids apply once.
    pub fn with_promotions(
        archetype: &'a UnitArchetype,
        max_hp: i32,
        rules: &RulesDatabase,
        promotions: impl IntoIterator<Item = PromotionId>,
    ) -> Self {
        promotions
            .into_iter()
            .filter_map(|id| rules.promotion(id))
            .fold(Self::new(archetype, max_hp), |mut unit, promotion| {
                unit.apply_promotion(promotion);
                unit
            })
    }

    /// Fold one promotion in place; a no-op (returning false) if already held
    ///
    /// Taking a promotion also heals half of the missing hit points.
    pub fn apply_promotion(&mut self, promotion: &PromotionDefinition) -> bool {
        if self.has_promotion(promotion.id) {
            return false;
        }
        self.modifiers.accumulate(&promotion.modifiers);
        self.capabilities.merge(&promotion.capabilities);
        let missing = self.max_hp - self.hp;
        self.hp += missing / 2;
        self.promotions.push(promotion.id);
        true
    }

    /// A copy of this instance with one more promotion
    pub fn promoted(&self, promotion: &PromotionDefinition) -> Self {
        let mut next = self.clone();
        next.apply_promotion(promotion);
        next
    }

    pub fn archetype(&self) -> &'a UnitArchetype {
        self.archetype
    }

    pub fn promotions(&self) -> &[PromotionId] {
        &self.promotions
    }

    pub fn has_promotion(&self, id: PromotionId) -> bool {
        self.promotions.contains(&id)
    }

    pub fn modifiers(&self) -> &CombatModifiers {
        &self.modifiers
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn damage(&self) -> i32 {
        self.max_hp - self.hp
    }

    /// Set hit points, clamped to `[0, max_hp]`
    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp);
    }

    pub fn set_damage(&mut self, damage: i32) {
        self.set_hp(self.max_hp - damage);
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.set_hp(hp);
        self
    }

    pub fn combat_pct(&self) -> i32 {
        self.modifiers.combat_pct
    }

    pub fn first_strikes(&self) -> i32 {
        self.modifiers.first_strikes.max(0)
    }

    pub fn chance_first_strikes(&self) -> i32 {
        self.modifiers.chance_first_strikes.max(0)
    }

    pub fn immune_to_first_strikes(&self) -> bool {
        self.capabilities.immune_to_first_strikes
    }

    pub fn withdrawal_pct(&self) -> i32 {
        self.modifiers.withdrawal_pct.clamp(0, 100)
    }

    pub fn moves(&self) -> i32 {
        self.modifiers.moves
    }

    pub fn combat_limit(&self) -> Option<i32> {
        self.archetype.combat_limit
    }

    pub fn can_attack(&self) -> bool {
        self.archetype.can_attack()
    }

    fn base_strength(&self) -> i32 {
        self.archetype.combat.max(0) * STRENGTH_SCALE
    }

    fn current_of(&self, max_strength: i32) -> i32 {
        (max_strength as i64 * self.hp as i64 / self.max_hp as i64) as i32
    }

    /// Full-health attack strength
    pub fn attack_strength(&self) -> i32 {
        scale_strength(self.base_strength(), self.modifiers.combat_pct)
    }

    /// Attack strength scaled by remaining hit points
    pub fn current_attack_strength(&self) -> i32 {
        self.current_of(self.attack_strength())
    }

    /// Accumulated defense modifier against `attacker` in `ctx`
    ///
    /// Attack-side bonuses (city attack, terrain attack, class bonuses) are
    /// subtracted here rather than added to the attacker's strength.
    pub fn defense_modifier(
        &self,
        attacker: Option<&UnitInstance<'_>>,
        ctx: &CombatContext,
        config: &AnalysisConfig,
    ) -> i32 {
        let mut modifier = self.modifiers.combat_pct;
        let no_bonus = self.capabilities.no_defensive_bonus;

        if let Some(attacker) = attacker {
            if let Some(class) = attacker.archetype.unit_combat {
                modifier += self.modifiers.unit_combat(class);
            }
            if let Some(class) = self.archetype.unit_combat {
                modifier -= attacker.modifiers.unit_combat(class);
            }
            if attacker.archetype.is_animal {
                modifier += self.modifiers.animal_combat_pct;
            }
            if self.archetype.is_animal {
                modifier -= attacker.modifiers.animal_combat_pct;
            }
            if ctx.attacker_is_barbarian {
                modifier += config.barbarian_combat_pct;
            }
        }

        // Plot defense
        if !no_bonus {
            modifier += ctx.plot_defense_pct;
            if ctx.hills {
                modifier += config.hills_extra_defense_pct;
            }
        }
        if let Some(terrain) = ctx.terrain {
            modifier += self.modifiers.terrain_defense(terrain);
            if let Some(attacker) = attacker {
                modifier -= attacker.modifiers.terrain_attack(terrain);
            }
        }
        if let Some(feature) = ctx.feature {
            modifier += self.modifiers.feature_defense(feature);
            if let Some(attacker) = attacker {
                modifier -= attacker.modifiers.feature_attack(feature);
            }
        }
        if ctx.hills {
            modifier += self.modifiers.hills_defense_pct;
            if let Some(attacker) = attacker {
                modifier -= attacker.modifiers.hills_attack_pct;
            }
        }

        if ctx.is_city_attack {
            modifier += self.modifiers.city_defense_pct;
            if !no_bonus {
                modifier += ctx.city_defense_pct;
            }
            if let Some(attacker) = attacker {
                modifier -= attacker.modifiers.city_attack_pct;
            }
        }

        if ctx.fortified && !no_bonus {
            modifier += config.fortify_bonus_pct;
        }

        if let Some(attacker) = attacker {
            let id = attacker.archetype.id;
            if !attacker.capabilities.river && ctx.crosses_river(id) {
                modifier -= config.river_attack_pct;
            }
            if !attacker.capabilities.amphibious && ctx.is_amphibious(id) {
                modifier -= config.amphibious_attack_pct;
            }
        }

        modifier
    }

    /// Full-health defense strength against `attacker` in `ctx`
    pub fn defense_strength(
        &self,
        attacker: Option<&UnitInstance<'_>>,
        ctx: &CombatContext,
        config: &AnalysisConfig,
    ) -> i32 {
        scale_strength(self.base_strength(), self.defense_modifier(attacker, ctx, config))
    }

    /// Defense strength scaled by remaining hit points
    pub fn current_defense_strength(
        &self,
        attacker: Option<&UnitInstance<'_>>,
        ctx: &CombatContext,
        config: &AnalysisConfig,
    ) -> i32 {
        self.current_of(self.defense_strength(attacker, ctx, config))
    }
}
