//! Unit archetypes - the static templates units are built from

use serde::{Deserialize, Serialize};

use crate::core::types::{ArchetypeId, Domain, UnitCombatId};
use crate::rules::modifiers::{Capabilities, CombatModifiers};

/// Splash damage profile of a siege-style unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralProfile {
    /// Collateral strength as a percentage of base combat
    pub damage_pct: i32,
    /// Highest damage (percent of max HP) collateral can leave on a target
    pub limit_pct: i32,
    /// Most secondary targets hit per attack
    pub max_units: u32,
    /// Unit combat classes this attacker's collateral cannot touch
    pub immune: Vec<UnitCombatId>,
}

/// Static definition of a kind of combat unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitArchetype {
    pub id: ArchetypeId,
    pub name: String,
    pub domain: Domain,
    pub unit_combat: Option<UnitCombatId>,
    /// Base combat strength (whole units, scaled x100 internally)
    pub combat: i32,
    /// Most damage (HP) this unit can inflict before it must stop;
    /// below a target's max HP the target can never be destroyed.
    /// `None` means no limit.
    pub combat_limit: Option<i32>,
    /// Base stats; `modifiers.moves` is the move allowance
    pub modifiers: CombatModifiers,
    pub capabilities: Capabilities,
    pub collateral: Option<CollateralProfile>,
    pub only_defensive: bool,
    pub is_animal: bool,
}

impl UnitArchetype {
    /// A plain land archetype; id is assigned when registered
    pub fn new(name: impl Into<String>, combat: i32) -> Self {
        Self {
            id: ArchetypeId(0),
            name: name.into(),
            domain: Domain::Land,
            unit_combat: None,
            combat,
            combat_limit: None,
            modifiers: CombatModifiers {
                moves: 1,
                ..Default::default()
            },
            capabilities: Capabilities::default(),
            collateral: None,
            only_defensive: false,
            is_animal: false,
        }
    }

    pub fn with_unit_combat(mut self, class: UnitCombatId) -> Self {
        self.unit_combat = Some(class);
        self
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    /// Archetypes with no positive strength never enter analysis
    pub fn is_combat_unit(&self) -> bool {
        self.combat > 0
    }

    pub fn can_attack(&self) -> bool {
        self.is_combat_unit() && !self.only_defensive && self.combat_limit.map_or(true, |limit| limit > 0)
    }

    pub fn is_collateral_immune_to(&self, attacker: &UnitArchetype) -> bool {
        match (&attacker.collateral, self.unit_combat) {
            (Some(profile), Some(class)) => profile.immune.contains(&class),
            _ => false,
        }
    }
}
