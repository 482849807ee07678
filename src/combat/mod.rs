//! Combat: unit stats, contexts, odds and outcomes

pub mod collateral;
pub mod constants;
pub mod context;
pub mod instance;
pub mod oracle;
pub mod outcome;
pub mod params;

pub use collateral::{collateral_damage, CollateralResult};
pub use context::CombatContext;
pub use instance::{firepower, scale_strength, UnitInstance};
pub use oracle::{CombatOracle, RoundDistribution, StandardOracle};
pub use outcome::{outcome_from_params, resolve, resolve_detailed, BranchOutcome, CombatOutcome};
pub use params::{CombatParams, CombatantParams};
