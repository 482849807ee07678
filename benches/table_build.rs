use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use unit_analysis::analysis::TableBuilder;
use unit_analysis::combat::{CombatOracle, CombatParams};
use unit_analysis::{load_rules, AnalysisConfig, CombatContext, StandardOracle, UnitInstance};

fn bench_table_build(c: &mut Criterion) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/rules/standard.toml");
    let rules = load_rules(&path).expect("standard rules");
    let config = AnalysisConfig::default();

    c.bench_function("unit-analysis/table_build(level=5)", |b| {
        b.iter(|| {
            let tables = TableBuilder::new(&rules, &config, &StandardOracle)
                .build()
                .expect("tables");
            black_box(tables.len());
        })
    });

    let knight = rules.archetype_by_name("Knight").expect("knight");
    let archer = rules.archetype_by_name("Longbowman").expect("longbowman");
    let params = CombatParams::between(
        &UnitInstance::new(knight, config.max_hit_points),
        &UnitInstance::new(archer, config.max_hit_points),
        &CombatContext::city(config.city_culture_defense_pct),
        &config,
    );

    c.bench_function("unit-analysis/oracle.distribution(knight,longbowman)", |b| {
        b.iter(|| black_box(StandardOracle.distribution(black_box(&params))))
    });
}

criterion_group!(benches, bench_table_build);
criterion_main!(benches);
