//! Read-only rules database shared by every analysis component
//!
//! Archetypes and promotions are stored densely by id. Names are interned
//! once at load time; after `RulesBuilder::build` nothing mutates.

use ahash::AHashMap;

use crate::core::error::{AnalysisError, Result};
use crate::core::types::{ArchetypeId, FeatureId, PromotionId, TerrainId, UnitCombatId};
use crate::rules::archetype::UnitArchetype;
use crate::rules::promotion::PromotionDefinition;

/// Interned name table for one id space
#[derive(Debug, Clone, Default)]
struct NameTable {
    names: Vec<String>,
    by_name: AHashMap<String, u16>,
}

impl NameTable {
    fn intern(&mut self, name: &str, kind: &'static str) -> Result<u16> {
        if let Some(raw) = self.by_name.get(name) {
            return Ok(*raw);
        }
        let raw = dense_index(self.names.len(), kind)?;
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), raw);
        Ok(raw)
    }

    fn lookup(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    fn name(&self, raw: u16) -> Option<&str> {
        self.names.get(raw as usize).map(String::as_str)
    }
}

/// Next dense id for a table holding `len` entries
fn dense_index(len: usize, kind: &'static str) -> Result<u16> {
    u16::try_from(len).map_err(|_| AnalysisError::TooManyEntries(kind))
}

/// Immutable rules: archetypes, promotions and the tag vocabularies
#[derive(Debug, Clone, Default)]
pub struct RulesDatabase {
    archetypes: Vec<UnitArchetype>,
    promotions: Vec<PromotionDefinition>,
    archetype_names: AHashMap<String, ArchetypeId>,
    promotion_names: AHashMap<String, PromotionId>,
    unit_combats: NameTable,
    terrains: NameTable,
    features: NameTable,
}

impl RulesDatabase {
    pub fn builder() -> RulesBuilder {
        RulesBuilder::default()
    }

    pub fn archetype(&self, id: ArchetypeId) -> Option<&UnitArchetype> {
        self.archetypes.get(id.index())
    }

    pub fn promotion(&self, id: PromotionId) -> Option<&PromotionDefinition> {
        self.promotions.get(id.index())
    }

    pub fn archetypes(&self) -> &[UnitArchetype] {
        &self.archetypes
    }

    pub fn promotions(&self) -> &[PromotionDefinition] {
        &self.promotions
    }

    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    pub fn promotion_count(&self) -> usize {
        self.promotions.len()
    }

    pub fn unit_combat_count(&self) -> usize {
        self.unit_combats.names.len()
    }

    pub fn archetype_by_name(&self, name: &str) -> Option<&UnitArchetype> {
        self.archetype_names
            .get(name)
            .and_then(|id| self.archetype(*id))
    }

    pub fn promotion_by_name(&self, name: &str) -> Option<&PromotionDefinition> {
        self.promotion_names
            .get(name)
            .and_then(|id| self.promotion(*id))
    }

    pub fn unit_combat_by_name(&self, name: &str) -> Option<UnitCombatId> {
        self.unit_combats.lookup(name).map(UnitCombatId)
    }

    pub fn terrain_by_name(&self, name: &str) -> Option<TerrainId> {
        self.terrains.lookup(name).map(TerrainId)
    }

    pub fn feature_by_name(&self, name: &str) -> Option<FeatureId> {
        self.features.lookup(name).map(FeatureId)
    }

    pub fn unit_combat_name(&self, id: UnitCombatId) -> Option<&str> {
        self.unit_combats.name(id.0)
    }

    pub fn unit_combat_ids(&self) -> impl Iterator<Item = UnitCombatId> + '_ {
        (0..self.unit_combats.names.len()).map(|raw| UnitCombatId(raw as u16))
    }

    /// Archetypes with positive strength, the only ones fit for odds queries
    pub fn combat_archetypes(&self) -> impl Iterator<Item = &UnitArchetype> {
        self.archetypes.iter().filter(|a| a.is_combat_unit())
    }

    /// Whether the optimiser may grant `promotion` to `archetype`
    pub fn promotion_applies(&self, promotion: &PromotionDefinition, archetype: &UnitArchetype) -> bool {
        !promotion.leader && promotion.allows_class(archetype.unit_combat)
    }
}

/// Incremental construction of a `RulesDatabase`
#[derive(Debug, Default)]
pub struct RulesBuilder {
    db: RulesDatabase,
}

impl RulesBuilder {
    pub fn unit_combat(&mut self, name: &str) -> Result<UnitCombatId> {
        self.db.unit_combats.intern(name, "unit combat").map(UnitCombatId)
    }

    pub fn terrain(&mut self, name: &str) -> Result<TerrainId> {
        self.db.terrains.intern(name, "terrain").map(TerrainId)
    }

    pub fn feature(&mut self, name: &str) -> Result<FeatureId> {
        self.db.features.intern(name, "feature").map(FeatureId)
    }

    pub fn lookup_unit_combat(&self, name: &str) -> Option<UnitCombatId> {
        self.db.unit_combat_by_name(name)
    }

    pub fn lookup_terrain(&self, name: &str) -> Option<TerrainId> {
        self.db.terrain_by_name(name)
    }

    pub fn lookup_feature(&self, name: &str) -> Option<FeatureId> {
        self.db.feature_by_name(name)
    }

    pub fn lookup_promotion(&self, name: &str) -> Option<PromotionId> {
        self.db.promotion_names.get(name).copied()
    }

    /// Register an archetype, assigning the next dense id
    pub fn archetype(&mut self, mut archetype: UnitArchetype) -> Result<ArchetypeId> {
        if self.db.archetype_names.contains_key(&archetype.name) {
            return Err(AnalysisError::DuplicateName {
                kind: "archetype",
                name: archetype.name,
            });
        }
        let id = ArchetypeId(dense_index(self.db.archetypes.len(), "archetype")?);
        archetype.id = id;
        self.db.archetype_names.insert(archetype.name.clone(), id);
        self.db.archetypes.push(archetype);
        Ok(id)
    }

    /// Register a promotion, assigning the next dense id
    pub fn promotion(&mut self, mut promotion: PromotionDefinition) -> Result<PromotionId> {
        if self.db.promotion_names.contains_key(&promotion.name) {
            return Err(AnalysisError::DuplicateName {
                kind: "promotion",
                name: promotion.name,
            });
        }
        if promotion.prereq_or.len() > 2 {
            return Err(AnalysisError::TooManyPrerequisites(promotion.name));
        }
        let id = PromotionId(dense_index(self.db.promotions.len(), "promotion")?);
        promotion.id = id;
        self.db.promotion_names.insert(promotion.name.clone(), id);
        self.db.promotions.push(promotion);
        Ok(id)
    }

    /// Attach prerequisites after the fact (used when they are named before defined)
    pub fn set_prerequisites(
        &mut self,
        id: PromotionId,
        prereq: Option<PromotionId>,
        prereq_or: Vec<PromotionId>,
    ) -> Result<()> {
        let promotion = self
            .db
            .promotions
            .get_mut(id.index())
            .ok_or_else(|| AnalysisError::UnknownPromotion(format!("{:?}", id)))?;
        if prereq_or.len() > 2 {
            return Err(AnalysisError::TooManyPrerequisites(promotion.name.clone()));
        }
        promotion.prereq = prereq;
        promotion.prereq_or = prereq_or;
        Ok(())
    }

    /// Finish; every prerequisite must name a registered promotion
    pub fn build(self) -> Result<RulesDatabase> {
        let count = self.db.promotions.len();
        for promotion in &self.db.promotions {
            let dangling = promotion
                .prereq
                .iter()
                .chain(promotion.prereq_or.iter())
                .find(|p| p.index() >= count);
            if let Some(p) = dangling {
                return Err(AnalysisError::UnknownPromotion(format!(
                    "{:?} (prerequisite of {})",
                    p, promotion.name
                )));
            }
        }
        Ok(self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_in_registration_order() {
        let mut builder = RulesDatabase::builder();
        let warrior = builder.archetype(UnitArchetype::new("Warrior", 1)).unwrap();
        let archer = builder.archetype(UnitArchetype::new("Archer", 3)).unwrap();
        let db = builder.build().unwrap();

        assert_eq!(warrior, ArchetypeId(0));
        assert_eq!(archer, ArchetypeId(1));
        assert_eq!(db.archetype(archer).unwrap().name, "Archer");
        assert_eq!(db.archetype_by_name("Warrior").unwrap().id, warrior);
    }

    #[test]
    fn test_unknown_ids_return_none() {
        let db = RulesDatabase::builder().build().unwrap();
        assert!(db.archetype(ArchetypeId(4)).is_none());
        assert!(db.promotion(PromotionId(0)).is_none());
        assert!(db.archetype_by_name("Warrior").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut builder = RulesDatabase::builder();
        builder.promotion(PromotionDefinition::new("Combat I")).unwrap();
        let err = builder.promotion(PromotionDefinition::new("Combat I"));
        assert!(matches!(err, Err(AnalysisError::DuplicateName { .. })));
    }

    #[test]
    fn test_interning_is_stable() {
        let mut builder = RulesDatabase::builder();
        let melee = builder.unit_combat("melee").unwrap();
        let archery = builder.unit_combat("archery").unwrap();
        assert_eq!(builder.unit_combat("melee").unwrap(), melee);
        assert_ne!(melee, archery);

        let db = builder.build().unwrap();
        assert_eq!(db.unit_combat_count(), 2);
        assert_eq!(db.unit_combat_name(archery), Some("archery"));
        assert_eq!(db.unit_combat_ids().count(), 2);
    }

    #[test]
    fn test_id_space_exhaustion_is_an_error() {
        let mut builder = RulesDatabase::builder();
        for i in 0..=u16::MAX as u32 {
            builder.terrain(&format!("t{i}")).unwrap();
        }
        assert_eq!(builder.terrain("t0").unwrap(), TerrainId(0));
        assert!(matches!(
            builder.terrain("one-too-many"),
            Err(AnalysisError::TooManyEntries("terrain"))
        ));
    }

    #[test]
    fn test_dangling_prerequisite_rejected() {
        let mut builder = RulesDatabase::builder();
        builder
            .promotion(PromotionDefinition::new("Combat II").requires(PromotionId(9)))
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(AnalysisError::UnknownPromotion(_))
        ));
    }

    #[test]
    fn test_leader_promotions_never_apply() {
        let mut builder = RulesDatabase::builder();
        let mut leadership = PromotionDefinition::new("Leadership");
        leadership.leader = true;
        builder.promotion(leadership).unwrap();
        builder.archetype(UnitArchetype::new("Warrior", 1)).unwrap();
        let db = builder.build().unwrap();

        assert!(!db.promotion_applies(&db.promotions()[0], &db.archetypes()[0]));
    }
}
