//! Unit Analysis - combat odds and promotion optimisation
//!
//! Rates unit archetypes for a turn-based strategy AI. Units are built by
//! folding promotions onto archetypes, fights are scored through a
//! round-probability oracle, and a greedy allocator picks promotions per
//! role and level. Everything is cached in tables that a read-only facade
//! serves queries from.

pub mod analysis;
pub mod combat;
pub mod core;
pub mod optimizer;
pub mod rules;

pub use analysis::{UnitAnalysis, UnitRole};
pub use combat::{CombatContext, CombatOracle, CombatOutcome, StandardOracle, UnitInstance};
pub use core::{AnalysisConfig, AnalysisError, Result};
pub use rules::{load_rules, parse_rules, RulesDatabase};
