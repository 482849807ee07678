//! Read-only query surface over the analysis tables
//!
//! `UnitAnalysis` owns the rules handle, the configuration, the oracle and
//! the current tables. A rebuild constructs a complete new table set and
//! only then swaps it in, so every query sees one consistent snapshot.

use std::sync::Arc;

use rand::Rng;

use crate::analysis::role::UnitRole;
use crate::analysis::table::{rate_matchup, AnalysisTables, BaselineMatchup, MatchupKey, TableBuilder};
use crate::combat::collateral::{collateral_damage, CollateralResult};
use crate::combat::context::CombatContext;
use crate::combat::instance::UnitInstance;
use crate::combat::oracle::CombatOracle;
use crate::combat::outcome::{self, CombatOutcome};
use crate::core::config::AnalysisConfig;
use crate::core::error::Result;
use crate::core::types::{ArchetypeId, PromotionId, UnitCombatId};
use crate::optimizer::PromotionAllocation;
use crate::rules::RulesDatabase;

/// Combat-value service for one ruleset
pub struct UnitAnalysis<O: CombatOracle> {
    rules: Arc<RulesDatabase>,
    config: AnalysisConfig,
    oracle: O,
    tables: Arc<AnalysisTables>,
}

impl<O: CombatOracle> UnitAnalysis<O> {
    /// Validate `config` and build the first table set
    pub fn new(rules: Arc<RulesDatabase>, config: AnalysisConfig, oracle: O) -> Result<Self> {
        config.validate()?;
        let tables = TableBuilder::new(&rules, &config, &oracle).build()?;
        Ok(Self {
            rules,
            config,
            oracle,
            tables: Arc::new(tables),
        })
    }

    /// Rebuild every table for `rules`, replacing the current set on success
    ///
    /// On error the previous rules and tables stay in place.
    pub fn rebuild(&mut self, rules: Arc<RulesDatabase>) -> Result<()> {
        let tables = TableBuilder::new(&rules, &self.config, &self.oracle).build()?;
        self.rules = rules;
        self.tables = Arc::new(tables);
        Ok(())
    }

    /// The current table set; stays valid across later rebuilds
    pub fn snapshot(&self) -> Arc<AnalysisTables> {
        Arc::clone(&self.tables)
    }

    pub fn rules(&self) -> &Arc<RulesDatabase> {
        &self.rules
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    fn key(&self, archetype: ArchetypeId, role: UnitRole, level: u32) -> MatchupKey {
        MatchupKey {
            archetype,
            role,
            level: level.min(self.tables.max_level),
        }
    }

    /// Value of `archetype` in `role` at `level`, in `[1, 1000]`
    ///
    /// `None` for archetypes or roles without tables.
    pub fn unit_value(&self, archetype: ArchetypeId, role: UnitRole, level: u32) -> Option<i32> {
        self.tables
            .level(&self.key(archetype, role, level))
            .map(|analysis| analysis.value(self.config.min_odds_floor, self.config.combat_die_sides))
    }

    /// Promotions chosen for `archetype` in `role`; `level` is clamped to the
    /// analysed range
    pub fn promotions_for(&self, archetype: ArchetypeId, role: UnitRole, level: u32) -> Option<&PromotionAllocation> {
        self.tables
            .level(&self.key(archetype, role, level))
            .map(|analysis| &analysis.allocation)
    }

    /// `archetype` promoted as the tables would promote it
    pub fn instance(&self, archetype: ArchetypeId, role: UnitRole, level: u32) -> Option<UnitInstance<'_>> {
        let base = self.rules.archetype(archetype)?;
        let promotions = self
            .promotions_for(archetype, role, level)
            .map(|a| a.promotions.clone())
            .unwrap_or_default();
        Some(UnitInstance::with_promotions(
            base,
            self.config.max_hit_points,
            &self.rules,
            promotions,
        ))
    }

    /// Odds of `unit` against each of `opposition`, index-aligned
    ///
    /// Opponents are promoted for the opposite role at `level`. Pairs where
    /// the attacking side cannot attack get placeholder odds: 0 when `unit`
    /// cannot attack, the full die when it cannot be attacked. Unknown
    /// opponents score 0.
    pub fn odds(
        &self,
        unit: &UnitInstance<'_>,
        opposition: &[ArchetypeId],
        level: u32,
        ctx: &CombatContext,
        is_attacker: bool,
    ) -> Vec<i32> {
        let opposing_role = if is_attacker { UnitRole::Defense } else { UnitRole::Attack };
        opposition
            .iter()
            .map(|&id| match self.instance(id, opposing_role, level) {
                Some(opponent) => {
                    rate_matchup(&self.oracle, unit, &opponent, is_attacker, ctx, &self.config).odds
                }
                None => 0,
            })
            .collect()
    }

    /// Level-0 baseline of `ours` against `theirs`
    pub fn baseline(&self, ours: ArchetypeId, theirs: ArchetypeId) -> Option<BaselineMatchup> {
        self.tables.baseline.get(ours, theirs).copied()
    }

    /// Average combined baseline odds of our roster against theirs
    ///
    /// Pairs without a baseline (unknown or cross-domain) are skipped; 0
    /// when no pair qualifies.
    pub fn roster_value(&self, ours: &[ArchetypeId], theirs: &[ArchetypeId]) -> i32 {
        let (sum, count) = ours
            .iter()
            .flat_map(|a| theirs.iter().map(move |b| (*a, *b)))
            .filter_map(|(a, b)| self.tables.baseline.get(a, b))
            .fold((0i64, 0i64), |(sum, count), cell| (sum + cell.combined() as i64, count + 1));
        (sum / count.max(1)) as i32
    }

    /// Collateral damage of `attacker` onto `targets`
    pub fn collateral_damage<R: Rng + ?Sized>(
        &self,
        attacker: &UnitInstance<'_>,
        targets: &[UnitInstance<'_>],
        rng: &mut R,
    ) -> CollateralResult {
        collateral_damage(attacker, targets, &self.config, rng)
    }

    pub fn promotion_depth(&self, promotion: PromotionId) -> Option<u32> {
        self.tables.depths.depth(promotion)
    }

    pub fn resolve(&self, attacker: &UnitInstance<'_>, defender: &UnitInstance<'_>, ctx: &CombatContext) -> i32 {
        outcome::resolve(&self.oracle, attacker, defender, ctx, &self.config)
    }

    pub fn resolve_detailed(
        &self,
        attacker: &UnitInstance<'_>,
        defender: &UnitInstance<'_>,
        ctx: &CombatContext,
    ) -> CombatOutcome {
        outcome::resolve_detailed(&self.oracle, attacker, defender, ctx, &self.config)
    }

    /// Highest-valued archetype against `class` at `level`; ties go to the
    /// lower id
    pub fn best_counter(&self, class: UnitCombatId, level: u32) -> Option<ArchetypeId> {
        let role = UnitRole::Counter(class);
        self.rules
            .combat_archetypes()
            .filter_map(|a| {
                let analysis = self.tables.level(&self.key(a.id, role, level))?;
                if analysis.opponents_considered == 0 {
                    return None;
                }
                Some((analysis.value(self.config.min_odds_floor, self.config.combat_die_sides), a.id))
            })
            .max_by(|x, y| x.0.cmp(&y.0).then(y.1.cmp(&x.1)))
            .map(|(_, id)| id)
    }
}
