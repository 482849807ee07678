//! Roles a unit is valued for

use serde::{Deserialize, Serialize};

use crate::combat::context::CombatContext;
use crate::core::config::AnalysisConfig;
use crate::core::types::UnitCombatId;
use crate::optimizer::PromotionValue;
use crate::rules::{RulesDatabase, UnitArchetype};

/// The job a unit is promoted and rated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitRole {
    /// Attacking units in the open
    Attack,
    /// Attacking units defending a city
    CityAttack,
    /// Defending a city against attackers
    CityDefense,
    /// Defending in the open
    Defense,
    /// Attacking units of one unit combat class
    Counter(UnitCombatId),
}

impl UnitRole {
    /// The fixed roles, without counters
    pub const BASE: [UnitRole; 4] = [
        UnitRole::Attack,
        UnitRole::CityAttack,
        UnitRole::CityDefense,
        UnitRole::Defense,
    ];

    /// Every role tables are built for under `config`
    pub fn catalogue(rules: &RulesDatabase, config: &AnalysisConfig) -> Vec<UnitRole> {
        let mut roles = Self::BASE.to_vec();
        if config.counter_roles {
            roles.extend(rules.unit_combat_ids().map(UnitRole::Counter));
        }
        roles
    }

    /// Value pools tried in order when promoting for this role
    pub fn pool_chain(self) -> Vec<PromotionValue> {
        match self {
            UnitRole::Attack | UnitRole::Defense => {
                vec![PromotionValue::Combat, PromotionValue::FirstStrike]
            }
            UnitRole::CityAttack => vec![
                PromotionValue::CityAttack,
                PromotionValue::Combat,
                PromotionValue::FirstStrike,
            ],
            UnitRole::CityDefense => vec![
                PromotionValue::CityDefense,
                PromotionValue::Combat,
                PromotionValue::FirstStrike,
            ],
            UnitRole::Counter(class) => vec![
                PromotionValue::Counter(class),
                PromotionValue::Combat,
                PromotionValue::FirstStrike,
            ],
        }
    }

    /// Whether the rated unit is the attacker in this role
    pub fn is_attacker(self) -> bool {
        matches!(self, UnitRole::Attack | UnitRole::CityAttack | UnitRole::Counter(_))
    }

    /// Where the fights of this role take place
    pub fn context(self, config: &AnalysisConfig) -> CombatContext {
        match self {
            UnitRole::CityAttack | UnitRole::CityDefense => {
                CombatContext::city(config.city_culture_defense_pct)
            }
            UnitRole::Attack | UnitRole::Defense | UnitRole::Counter(_) => CombatContext::open_field(),
        }
    }

    /// Whether `opponent` is one this role is measured against
    pub fn considers(self, opponent: &UnitArchetype) -> bool {
        match self {
            UnitRole::Counter(class) => opponent.unit_combat == Some(class),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_chain_falls_back_to_combat_then_first_strike() {
        let roles = [
            UnitRole::Attack,
            UnitRole::CityAttack,
            UnitRole::CityDefense,
            UnitRole::Defense,
            UnitRole::Counter(UnitCombatId(0)),
        ];
        for role in roles {
            let chain = role.pool_chain();
            assert_eq!(chain[chain.len() - 1], PromotionValue::FirstStrike);
            assert_eq!(chain[chain.len() - 2], PromotionValue::Combat);
        }
        assert_eq!(UnitRole::CityAttack.pool_chain()[0], PromotionValue::CityAttack);
    }

    #[test]
    fn test_catalogue_adds_counters() {
        let mut builder = RulesDatabase::builder();
        builder.unit_combat("melee").unwrap();
        builder.unit_combat("mounted").unwrap();
        let rules = builder.build().unwrap();

        let mut config = AnalysisConfig::default();
        assert_eq!(UnitRole::catalogue(&rules, &config).len(), 6);
        config.counter_roles = false;
        assert_eq!(UnitRole::catalogue(&rules, &config), UnitRole::BASE.to_vec());
    }

    #[test]
    fn test_city_roles_fight_in_cities() {
        let config = AnalysisConfig::default();
        assert!(UnitRole::CityDefense.context(&config).is_city_attack);
        assert!(!UnitRole::Defense.context(&config).is_city_attack);
        assert!(UnitRole::CityAttack.is_attacker());
        assert!(!UnitRole::CityDefense.is_attacker());
    }

    #[test]
    fn test_counter_considers_only_its_class() {
        let melee = UnitCombatId(0);
        let axe = UnitArchetype::new("Axeman", 5).with_unit_combat(melee);
        let horse = UnitArchetype::new("Horse Archer", 6).with_unit_combat(UnitCombatId(1));
        assert!(UnitRole::Counter(melee).considers(&axe));
        assert!(!UnitRole::Counter(melee).considers(&horse));
        assert!(UnitRole::Attack.considers(&horse));
    }
}
