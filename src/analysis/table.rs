//! Matchup tables
//!
//! For every combat archetype, role and promotion level the builder
//! promotes the archetype for the role, then rates it against every
//! unpromoted opponent of the same domain. Results go into one flat map
//! keyed by `MatchupKey`. A level-0 archetype-by-archetype baseline matrix
//! is built alongside for quick roster comparisons.

use ahash::AHashMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::analysis::role::UnitRole;
use crate::combat::context::CombatContext;
use crate::combat::instance::UnitInstance;
use crate::combat::oracle::CombatOracle;
use crate::combat::outcome::{outcome_from_params, CombatOutcome};
use crate::combat::params::CombatParams;
use crate::core::config::AnalysisConfig;
use crate::core::error::Result;
use crate::core::types::ArchetypeId;
use crate::optimizer::{PromotionAllocation, PromotionAllocator, PromotionDepths, ValuePool};
use crate::rules::{RulesDatabase, UnitArchetype};

/// Scale of normalised unit values
pub const VALUE_SCALE: i32 = 1000;

/// Key of one table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchupKey {
    pub archetype: ArchetypeId,
    pub role: UnitRole,
    pub level: u32,
}

/// A rated unit against one opponent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub opponent: ArchetypeId,
    /// Odds of the rated unit coming out on top, out of the die sides
    pub odds: i32,
    /// Expected HP of the rated unit afterwards
    pub expected_hp: f64,
    /// `None` when one side cannot attack and the odds are a placeholder
    pub outcome: Option<CombatOutcome>,
}

/// Everything built for one `MatchupKey`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelAnalysis {
    pub allocation: PromotionAllocation,
    pub opponents_considered: usize,
    /// Best odds first, then best surviving HP
    pub matchups: Vec<Matchup>,
}

impl LevelAnalysis {
    /// Qualifying odds normalised to `[1, VALUE_SCALE]`
    ///
    /// Only matchups at or above `min_odds_floor` count.
    pub fn value(&self, min_odds_floor: i32, die_sides: i32) -> i32 {
        let qualifying: i64 = self
            .matchups
            .iter()
            .filter(|m| m.odds >= min_odds_floor)
            .map(|m| m.odds as i64)
            .sum();
        let maximum = (die_sides as i64 * self.opponents_considered as i64).max(1);
        let value = qualifying * VALUE_SCALE as i64 / maximum;
        (value as i32).clamp(1, VALUE_SCALE)
    }
}

/// Level-0 comparison of two archetypes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineMatchup {
    /// Odds of the row archetype attacking the column archetype
    pub attack_odds: i32,
    /// Odds of the row archetype surviving an attack by the column archetype
    pub defense_odds: i32,
    /// Base combat of the row archetype as a percentage of the column's
    pub city_strength_ratio: i32,
}

impl BaselineMatchup {
    /// Attack and inverse-defense odds averaged
    pub fn combined(&self) -> i32 {
        (self.attack_odds + self.defense_odds) / 2
    }
}

/// Dense `n x n` baseline cache, row = rated archetype
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselineMatrix {
    size: usize,
    cells: Vec<Option<BaselineMatchup>>,
}

impl BaselineMatrix {
    fn build<O: CombatOracle + ?Sized>(rules: &RulesDatabase, config: &AnalysisConfig, oracle: &O) -> Self {
        let size = rules.archetype_count();
        let mut cells = vec![None; size * size];
        let ctx = CombatContext::open_field();
        let combatants: Vec<&UnitArchetype> = rules.combat_archetypes().collect();

        for row in &combatants {
            let ours = UnitInstance::new(row, config.max_hit_points);
            for column in combatants.iter().filter(|c| c.domain == row.domain) {
                let theirs = UnitInstance::new(column, config.max_hit_points);
                let attack = rate_matchup(oracle, &ours, &theirs, true, &ctx, config);
                let defense = rate_matchup(oracle, &ours, &theirs, false, &ctx, config);
                cells[row.id.index() * size + column.id.index()] = Some(BaselineMatchup {
                    attack_odds: attack.odds,
                    defense_odds: defense.odds,
                    city_strength_ratio: row.combat * 100 / column.combat.max(1),
                });
            }
        }
        Self { size, cells }
    }

    /// Baseline of `ours` against `theirs`; `None` for unknown, non-combat
    /// or cross-domain pairs
    pub fn get(&self, ours: ArchetypeId, theirs: ArchetypeId) -> Option<&BaselineMatchup> {
        if ours.index() >= self.size || theirs.index() >= self.size {
            return None;
        }
        self.cells[ours.index() * self.size + theirs.index()].as_ref()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Rate `unit` against `opponent`, attacking or defending
///
/// When the attacking side cannot attack at all the odds are a placeholder:
/// 0 if `unit` cannot attack, the full die if `opponent` cannot attack it.
pub fn rate_matchup<O: CombatOracle + ?Sized>(
    oracle: &O,
    unit: &UnitInstance<'_>,
    opponent: &UnitInstance<'_>,
    attacking: bool,
    ctx: &CombatContext,
    config: &AnalysisConfig,
) -> Matchup {
    let id = opponent.archetype().id;
    let (attacker, defender) = if attacking { (unit, opponent) } else { (opponent, unit) };

    if !attacker.can_attack() {
        return Matchup {
            opponent: id,
            odds: if attacking { 0 } else { config.combat_die_sides },
            expected_hp: unit.hp() as f64,
            outcome: None,
        };
    }

    let params = CombatParams::between(attacker, defender, ctx, config);
    let attack_odds = oracle.combat_odds(&params);
    let outcome = outcome_from_params(oracle, &params, attacker.withdrawal_pct());
    tracing::trace!(
        unit = %unit.archetype().name,
        opponent = %opponent.archetype().name,
        attacking,
        attack_odds,
        "matchup rated"
    );

    if attacking {
        Matchup {
            opponent: id,
            odds: attack_odds,
            expected_hp: outcome.expected_attacker_hp,
            outcome: Some(outcome),
        }
    } else {
        Matchup {
            opponent: id,
            odds: config.combat_die_sides - attack_odds,
            expected_hp: outcome.expected_defender_hp,
            outcome: Some(outcome),
        }
    }
}

fn rank(matchups: &mut [Matchup]) {
    matchups.sort_by(|a, b| {
        b.odds
            .cmp(&a.odds)
            .then(OrderedFloat(b.expected_hp).cmp(&OrderedFloat(a.expected_hp)))
            .then(a.opponent.cmp(&b.opponent))
    });
}

/// Immutable result of one table build
#[derive(Debug, Clone, Default)]
pub struct AnalysisTables {
    pub depths: PromotionDepths,
    pub roles: Vec<UnitRole>,
    pub max_level: u32,
    pub baseline: BaselineMatrix,
    levels: AHashMap<MatchupKey, LevelAnalysis>,
}

impl AnalysisTables {
    pub fn level(&self, key: &MatchupKey) -> Option<&LevelAnalysis> {
        self.levels.get(key)
    }

    /// Number of `(archetype, role, level)` entries
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MatchupKey, &LevelAnalysis)> {
        self.levels.iter()
    }
}

/// Drives allocator and oracle over every archetype, role and level
pub struct TableBuilder<'a, O: CombatOracle + ?Sized> {
    rules: &'a RulesDatabase,
    config: &'a AnalysisConfig,
    oracle: &'a O,
}

impl<'a, O: CombatOracle + ?Sized> TableBuilder<'a, O> {
    pub fn new(rules: &'a RulesDatabase, config: &'a AnalysisConfig, oracle: &'a O) -> Self {
        Self { rules, config, oracle }
    }

    pub fn build(&self) -> Result<AnalysisTables> {
        let rules = self.rules;
        let config = self.config;
        tracing::info!(
            archetypes = rules.archetype_count(),
            promotions = rules.promotion_count(),
            max_level = config.max_promotion_level,
            "building unit analysis tables"
        );

        let depths = PromotionDepths::compute(rules)?;
        for (id, depth) in depths.iter() {
            if depth >= config.max_promotion_level {
                if let Some(promotion) = rules.promotion(id) {
                    tracing::warn!(promotion = %promotion.name, depth, "promotion unreachable within analysed levels");
                }
            }
        }
        for archetype in rules.archetypes().iter().filter(|a| !a.is_combat_unit()) {
            tracing::warn!(archetype = %archetype.name, "excluded from analysis: no combat strength");
        }

        let roles = UnitRole::catalogue(rules, config);
        let allocator = PromotionAllocator::new(rules, &depths, config);
        let combatants: Vec<&UnitArchetype> = rules.combat_archetypes().collect();
        let mut levels = AHashMap::new();

        for archetype in &combatants {
            let opponents: Vec<UnitInstance<'_>> = combatants
                .iter()
                .filter(|o| o.id != archetype.id && o.domain == archetype.domain)
                .map(|o| UnitInstance::new(o, config.max_hit_points))
                .collect();

            for &role in &roles {
                let pools: Vec<ValuePool> = role
                    .pool_chain()
                    .into_iter()
                    .map(|value| ValuePool::for_archetype(value, archetype, rules))
                    .collect();
                let ctx = role.context(config);
                let considered: Vec<&UnitInstance<'_>> = opponents
                    .iter()
                    .filter(|o| role.considers(o.archetype()))
                    .collect();

                for level in 0..=config.max_promotion_level {
                    let allocation = allocator.allocate_chain(&pools, archetype, level, &[]);
                    let unit = UnitInstance::with_promotions(
                        archetype,
                        config.max_hit_points,
                        rules,
                        allocation.promotions.iter().copied(),
                    );
                    let mut matchups: Vec<Matchup> = considered
                        .iter()
                        .map(|o| rate_matchup(self.oracle, &unit, o, role.is_attacker(), &ctx, config))
                        .collect();
                    rank(&mut matchups);

                    levels.insert(
                        MatchupKey {
                            archetype: archetype.id,
                            role,
                            level,
                        },
                        LevelAnalysis {
                            allocation,
                            opponents_considered: considered.len(),
                            matchups,
                        },
                    );
                }
                tracing::debug!(archetype = %archetype.name, ?role, opponents = considered.len(), "role tables built");
            }
        }

        let baseline = BaselineMatrix::build(rules, config, self.oracle);
        tracing::info!(entries = levels.len(), "unit analysis tables built");

        Ok(AnalysisTables {
            depths,
            roles,
            max_level: config.max_promotion_level,
            baseline,
            levels,
        })
    }
}
