use thiserror::Error;

use crate::core::types::PromotionId;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Promotion prerequisites form a cycle through {0:?}")]
    CyclicPromotionGraph(PromotionId),

    #[error("Unknown unit archetype: {0}")]
    UnknownArchetype(String),

    #[error("Unknown promotion: {0}")]
    UnknownPromotion(String),

    #[error("Unknown unit combat class: {0}")]
    UnknownUnitCombat(String),

    #[error("Unknown terrain: {0}")]
    UnknownTerrain(String),

    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Too many {0} entries for a 16-bit id")]
    TooManyEntries(&'static str),

    #[error("Promotion {0} lists more than two alternative prerequisites")]
    TooManyPrerequisites(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Rules parse error: {0}")]
    RulesParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
