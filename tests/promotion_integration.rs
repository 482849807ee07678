//! Promotion depth and allocation integration tests

use std::path::Path;

use proptest::prelude::*;

use unit_analysis::analysis::UnitRole;
use unit_analysis::combat::UnitInstance;
use unit_analysis::core::types::PromotionId;
use unit_analysis::optimizer::{PromotionAllocator, PromotionDepths, PromotionValue, ValuePool};
use unit_analysis::rules::{PromotionDefinition, UnitArchetype};
use unit_analysis::{load_rules, parse_rules, AnalysisConfig, AnalysisError, RulesDatabase};

fn standard_rules() -> RulesDatabase {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/rules/standard.toml");
    load_rules(&path).unwrap()
}

fn depth_of(rules: &RulesDatabase, depths: &PromotionDepths, name: &str) -> u32 {
    depths.depth(rules.promotion_by_name(name).unwrap().id).unwrap()
}

#[test]
fn test_standard_depths() {
    let rules = standard_rules();
    let depths = PromotionDepths::compute(&rules).unwrap();

    assert_eq!(depth_of(&rules, &depths, "Combat I"), 0);
    assert_eq!(depth_of(&rules, &depths, "Combat V"), 4);
    assert_eq!(depth_of(&rules, &depths, "Shock"), 1);
    assert_eq!(depth_of(&rules, &depths, "Formation"), 2);
    assert_eq!(depth_of(&rules, &depths, "Mobility"), 2);
    assert_eq!(depth_of(&rules, &depths, "Blitz"), 3);
    assert_eq!(depths.len(), rules.promotion_count());
}

#[test]
fn test_cyclic_rules_rejected() {
    let rules = parse_rules(
        r#"
[[promotions]]
name = "Ambush"
prereq = "Charge"

[[promotions]]
name = "Charge"
prereq_or = ["Pinch", "Ambush"]

[[promotions]]
name = "Pinch"
prereq = "Ambush"
"#,
    )
    .unwrap();
    assert!(matches!(
        PromotionDepths::compute(&rules),
        Err(AnalysisError::CyclicPromotionGraph(_))
    ));
}

#[test]
fn test_zero_budget_keeps_base_value() {
    let rules = standard_rules();
    let depths = PromotionDepths::compute(&rules).unwrap();
    let config = AnalysisConfig::default();
    let allocator = PromotionAllocator::new(&rules, &depths, &config);
    let axe = rules.archetype_by_name("Axeman").unwrap();

    let pool = ValuePool::for_archetype(PromotionValue::Combat, axe, &rules);
    let result = allocator.allocate(&pool, axe, 0, &[]);
    assert!(result.promotions.is_empty());
    assert_eq!(result.remaining_budget, 0);

    let unit = UnitInstance::with_promotions(axe, 100, &rules, result.promotions.iter().copied());
    assert_eq!(
        PromotionValue::Combat.score(&unit),
        PromotionValue::Combat.score(&UnitInstance::new(axe, 100))
    );
}

#[test]
fn test_single_plus_ten_promotion() {
    let mut builder = RulesDatabase::builder();
    let combat = builder
        .promotion(PromotionDefinition::new("Combat I").with_combat(10))
        .unwrap();
    builder.archetype(UnitArchetype::new("Warrior", 1)).unwrap();
    let rules = builder.build().unwrap();
    let depths = PromotionDepths::compute(&rules).unwrap();
    let config = AnalysisConfig::default();
    let warrior = rules.archetype_by_name("Warrior").unwrap();

    let pool = ValuePool::for_archetype(PromotionValue::Combat, warrior, &rules);
    let result = PromotionAllocator::new(&rules, &depths, &config).allocate(&pool, warrior, 1, &[]);
    assert_eq!(result.promotions, vec![combat]);
    assert_eq!(result.remaining_budget, 0);
}

#[test]
fn test_archer_city_defense_picks_garrison() {
    let rules = standard_rules();
    let depths = PromotionDepths::compute(&rules).unwrap();
    let config = AnalysisConfig::default();
    let archer = rules.archetype_by_name("Archer").unwrap();
    let pools: Vec<_> = UnitRole::CityDefense
        .pool_chain()
        .into_iter()
        .map(|v| ValuePool::for_archetype(v, archer, &rules))
        .collect();

    let result = PromotionAllocator::new(&rules, &depths, &config).allocate_chain(&pools, archer, 3, &[]);
    let garrison3 = rules.promotion_by_name("Garrison III").unwrap().id;
    assert!(result.contains(garrison3));
    assert_eq!(result.promotions.len(), 3);
}

#[test]
fn test_mobility_chain_for_mounted() {
    let rules = standard_rules();
    let depths = PromotionDepths::compute(&rules).unwrap();
    let config = AnalysisConfig::default();
    let knight = rules.archetype_by_name("Knight").unwrap();
    let pool = ValuePool::for_archetype(PromotionValue::Mobility, knight, &rules);

    let result = PromotionAllocator::new(&rules, &depths, &config).allocate(&pool, knight, 3, &[]);
    let names: Vec<_> = result
        .promotions
        .iter()
        .map(|id| rules.promotion(*id).unwrap().name.as_str())
        .collect();
    assert_eq!(names, vec!["Flanking I", "Flanking II", "Mobility"]);
}

fn prerequisites_respected(rules: &RulesDatabase, promotions: &[PromotionId]) -> bool {
    promotions.iter().enumerate().all(|(i, id)| {
        let earlier = &promotions[..i];
        rules
            .promotion(*id)
            .map_or(false, |p| p.prerequisites_met(|q| earlier.contains(&q)))
    })
}

/// Random acyclic graph: every prerequisite points at an earlier promotion
fn dag_strategy() -> impl Strategy<Value = Vec<(Option<usize>, Vec<usize>)>> {
    prop::collection::vec(
        (any::<Option<usize>>(), prop::collection::vec(any::<usize>(), 0..=2)),
        1..16,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (and, or))| {
                if i == 0 {
                    return (None, vec![]);
                }
                let and = and.map(|a| a % i);
                let mut or: Vec<usize> = or.into_iter().map(|o| o % i).collect();
                or.dedup();
                (and, or)
            })
            .collect()
    })
}

fn build_dag(edges: &[(Option<usize>, Vec<usize>)]) -> RulesDatabase {
    let mut builder = RulesDatabase::builder();
    let ids: Vec<PromotionId> = (0..edges.len())
        .map(|i| {
            builder
                .promotion(PromotionDefinition::new(format!("P{i}")).with_combat(5 + i as i32))
                .unwrap()
        })
        .collect();
    for (i, (and, or)) in edges.iter().enumerate() {
        builder
            .set_prerequisites(ids[i], and.map(|a| ids[a]), or.iter().map(|o| ids[*o]).collect())
            .unwrap();
    }
    builder.archetype(UnitArchetype::new("Warrior", 2)).unwrap();
    builder.build().unwrap()
}

proptest! {
    #[test]
    fn prop_depth_zero_iff_no_prerequisites(edges in dag_strategy()) {
        let rules = build_dag(&edges);
        let depths = PromotionDepths::compute(&rules).unwrap();

        for promotion in rules.promotions() {
            let depth = depths.depth(promotion.id).unwrap();
            prop_assert_eq!(depth == 0, !promotion.has_prerequisites());
            if let Some(and) = promotion.prereq {
                prop_assert!(depth > depths.depth(and).unwrap());
            }
            if let Some(min_or) = promotion.prereq_or.iter().map(|p| depths.depth(*p).unwrap()).min() {
                prop_assert!(depth > min_or);
            }
        }
    }

    #[test]
    fn prop_allocation_within_budget(edges in dag_strategy(), budget in 0..8u32) {
        let rules = build_dag(&edges);
        let depths = PromotionDepths::compute(&rules).unwrap();
        let config = AnalysisConfig::default();
        let warrior = rules.archetype_by_name("Warrior").unwrap();
        let pool = ValuePool::for_archetype(PromotionValue::Combat, warrior, &rules);

        let result = PromotionAllocator::new(&rules, &depths, &config).allocate(&pool, warrior, budget, &[]);
        prop_assert_eq!(result.promotions.len() as u32 + result.remaining_budget, budget);
        prop_assert!(prerequisites_respected(&rules, &result.promotions));

        let mut unique = result.promotions.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), result.promotions.len());
    }

    #[test]
    fn prop_standard_role_allocations_valid(archetype_index in 0..20usize, role_index in 0..4usize, budget in 0..6u32) {
        let rules = standard_rules();
        let depths = PromotionDepths::compute(&rules).unwrap();
        let config = AnalysisConfig::default();
        let combatants: Vec<_> = rules.combat_archetypes().collect();
        let archetype = combatants[archetype_index % combatants.len()];
        let role = UnitRole::BASE[role_index];
        let pools: Vec<_> = role
            .pool_chain()
            .into_iter()
            .map(|v| ValuePool::for_archetype(v, archetype, &rules))
            .collect();

        let result = PromotionAllocator::new(&rules, &depths, &config).allocate_chain(&pools, archetype, budget, &[]);
        prop_assert!(result.promotions.len() as u32 <= budget);
        prop_assert_eq!(result.promotions.len() as u32 + result.remaining_budget, budget);
        prop_assert!(prerequisites_respected(&rules, &result.promotions));
        for id in &result.promotions {
            prop_assert!(rules.promotion_applies(rules.promotion(*id).unwrap(), archetype));
        }
    }
}
