//! Matchup tables and the query facade built on them

pub mod facade;
pub mod role;
pub mod table;

pub use facade::UnitAnalysis;
pub use role::UnitRole;
pub use table::{
    rate_matchup, AnalysisTables, BaselineMatchup, BaselineMatrix, LevelAnalysis, Matchup, MatchupKey,
    TableBuilder, VALUE_SCALE,
};
