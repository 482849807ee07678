//! Static rules data: unit archetypes and promotion definitions

pub mod archetype;
pub mod database;
pub mod modifiers;
pub mod promotion;
mod loader;

pub use archetype::{CollateralProfile, UnitArchetype};
pub use database::{RulesBuilder, RulesDatabase};
pub use loader::{load_rules, parse_rules};
pub use modifiers::{Capabilities, CombatModifiers};
pub use promotion::PromotionDefinition;
