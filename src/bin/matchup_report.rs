//! Matchup Report
//!
//! Builds the unit analysis for a rules file and prints unit values,
//! promotion picks, detailed pairwise outcomes or seeded collateral
//! damage on a stack.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use unit_analysis::analysis::UnitRole;
use unit_analysis::combat::{collateral_damage, CombatContext, CombatOutcome, StandardOracle, UnitInstance};
use unit_analysis::core::types::ArchetypeId;
use unit_analysis::optimizer::{PromotionAllocator, PromotionValue, ValuePool};
use unit_analysis::{load_rules, AnalysisConfig, AnalysisError, Result, RulesDatabase, UnitAnalysis};

/// Matchup Report - unit values and combat odds for a ruleset
#[derive(Parser, Debug)]
#[command(name = "matchup_report")]
#[command(about = "Report unit values, promotion picks and combat odds for a ruleset")]
struct Args {
    /// Rules file to analyse
    #[arg(long, default_value = "data/rules/standard.toml")]
    rules: PathBuf,

    /// Optional TOML file overriding analysis settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Value and promotions of every archetype for one role
    Values {
        /// attack, city-attack, city-defense, defense or counter:<class>
        #[arg(long, default_value = "attack")]
        role: String,

        #[arg(long, default_value_t = 0)]
        level: u32,
    },
    /// Detailed outcome of one attack
    Matchup {
        #[arg(long)]
        attacker: String,

        #[arg(long)]
        defender: String,

        /// Promotion level of both sides (attack / defense roles)
        #[arg(long, default_value_t = 0)]
        level: u32,

        /// Defender is in a city with this culture defense
        #[arg(long)]
        city: Option<i32>,

        #[arg(long)]
        hills: bool,

        #[arg(long)]
        fortified: bool,
    },
    /// Run a custom chain of value pools for one archetype
    Allocate {
        #[arg(long)]
        archetype: String,

        /// Comma-separated values, highest priority first
        #[arg(long, default_value = "combat,first-strike")]
        values: String,

        #[arg(long, default_value_t = 3)]
        budget: u32,
    },
    /// Splash damage of one attacker onto a stack
    Collateral {
        #[arg(long)]
        attacker: String,

        /// Comma-separated archetypes stacked with the primary target
        #[arg(long)]
        targets: String,

        /// Seed for target selection
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(Serialize)]
struct ValueRow {
    archetype: String,
    value: i32,
    promotions: Vec<String>,
    remaining_budget: u32,
}

#[derive(Serialize)]
struct MatchupReport {
    attacker: String,
    defender: String,
    odds: i32,
    outcome: CombatOutcome,
}

#[derive(Serialize)]
struct CollateralRow {
    target: String,
    hit: bool,
    damage: i32,
}

#[derive(Serialize)]
struct AllocationReport {
    archetype: String,
    promotions: Vec<String>,
    remaining_budget: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("unit_analysis=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let rules = Arc::new(load_rules(&args.rules)?);
    let config = match &args.config {
        Some(path) => AnalysisConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };
    let json = args.format == "json";

    match args.command {
        Command::Values { role, level } => {
            let role = parse_role(&rules, &role)?;
            let analysis = UnitAnalysis::new(Arc::clone(&rules), config, StandardOracle)?;
            let rows: Vec<ValueRow> = rules
                .combat_archetypes()
                .filter_map(|a| {
                    let value = analysis.unit_value(a.id, role, level)?;
                    let allocation = analysis.promotions_for(a.id, role, level)?;
                    Some(ValueRow {
                        archetype: a.name.clone(),
                        value,
                        promotions: promotion_names(&rules, &allocation.promotions),
                        remaining_budget: allocation.remaining_budget,
                    })
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("Unit values: {:?} at level {}", role, level);
                println!("==========================================");
                for row in rows {
                    println!("{:<14} {:>5}  {}", row.archetype, row.value, row.promotions.join(", "));
                }
            }
        }
        Command::Matchup {
            attacker,
            defender,
            level,
            city,
            hills,
            fortified,
        } => {
            let attacker_id = archetype_id(&rules, &attacker)?;
            let defender_id = archetype_id(&rules, &defender)?;
            let analysis = UnitAnalysis::new(Arc::clone(&rules), config, StandardOracle)?;

            let mut ctx = match city {
                Some(culture) => CombatContext::city(culture),
                None => CombatContext::open_field(),
            };
            ctx.hills = hills;
            ctx.fortified |= fortified;

            let defender_role = if city.is_some() { UnitRole::CityDefense } else { UnitRole::Defense };
            let attacker_role = if city.is_some() { UnitRole::CityAttack } else { UnitRole::Attack };
            let (Some(att), Some(def)) = (
                analysis.instance(attacker_id, attacker_role, level),
                analysis.instance(defender_id, defender_role, level),
            ) else {
                return Err(AnalysisError::UnknownArchetype(attacker));
            };

            let report = MatchupReport {
                attacker: attacker.clone(),
                defender: defender.clone(),
                odds: analysis.resolve(&att, &def, &ctx),
                outcome: analysis.resolve_detailed(&att, &def, &ctx),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let o = &report.outcome;
                println!("{} attacks {} (level {})", report.attacker, report.defender, level);
                println!("==========================================");
                println!("Odds:          {}/{}", report.odds, o.die_sides);
                println!("Victory:       {:>6.1}%  attacker hp {:.1}", o.victory.probability * 100.0, o.victory.attacker_hp);
                println!("Pull out:      {:>6.1}%  defender hp {:.1}", o.pull_out.probability * 100.0, o.pull_out.defender_hp);
                println!("Retreat:       {:>6.1}%  attacker hp {:.1}", o.retreat.probability * 100.0, o.retreat.attacker_hp);
                println!("Defeat:        {:>6.1}%  defender hp {:.1}", o.defeat.probability * 100.0, o.defeat.defender_hp);
                println!("Expected hp:   attacker {:.1}, defender {:.1}", o.expected_attacker_hp, o.expected_defender_hp);
            }
        }
        Command::Allocate {
            archetype,
            values,
            budget,
        } => {
            let id = archetype_id(&rules, &archetype)?;
            let Some(base) = rules.archetype(id) else {
                return Err(AnalysisError::UnknownArchetype(archetype));
            };
            let depths = unit_analysis::optimizer::PromotionDepths::compute(&rules)?;
            let pools = values
                .split(',')
                .map(|v| parse_value(&rules, v.trim()).map(|value| ValuePool::for_archetype(value, base, &rules)))
                .collect::<Result<Vec<_>>>()?;
            let allocation = PromotionAllocator::new(&rules, &depths, &config).allocate_chain(&pools, base, budget, &[]);

            let report = AllocationReport {
                archetype: archetype.clone(),
                promotions: promotion_names(&rules, &allocation.promotions),
                remaining_budget: allocation.remaining_budget,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} with {} levels: {}", report.archetype, budget, report.promotions.join(", "));
                println!("Unspent: {}", report.remaining_budget);
            }
        }
        Command::Collateral {
            attacker,
            targets,
            seed,
        } => {
            let Some(base) = rules.archetype(archetype_id(&rules, &attacker)?) else {
                return Err(AnalysisError::UnknownArchetype(attacker));
            };
            let stack = targets
                .split(',')
                .map(|name| {
                    let id = archetype_id(&rules, name.trim())?;
                    rules
                        .archetype(id)
                        .map(|a| UnitInstance::new(a, config.max_hit_points))
                        .ok_or_else(|| AnalysisError::UnknownArchetype(name.to_string()))
                })
                .collect::<Result<Vec<_>>>()?;

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let result = collateral_damage(
                &UnitInstance::new(base, config.max_hit_points),
                &stack,
                &config,
                &mut rng,
            );
            let rows: Vec<CollateralRow> = stack
                .iter()
                .enumerate()
                .map(|(i, unit)| CollateralRow {
                    target: unit.archetype().name.clone(),
                    hit: result.hit.contains(&i),
                    damage: result.damage[i],
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{} collateral (seed {})", attacker, seed);
                println!("==========================================");
                for row in rows {
                    let mark = if row.hit { "*" } else { " " };
                    println!("{} {:<14} damage {:>3}", mark, row.target, row.damage);
                }
            }
        }
    }

    Ok(())
}

fn archetype_id(rules: &RulesDatabase, name: &str) -> Result<ArchetypeId> {
    rules
        .archetype_by_name(name)
        .map(|a| a.id)
        .ok_or_else(|| AnalysisError::UnknownArchetype(name.to_string()))
}

fn promotion_names(rules: &RulesDatabase, ids: &[unit_analysis::core::types::PromotionId]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| rules.promotion(*id))
        .map(|p| p.name.clone())
        .collect()
}

fn parse_class(rules: &RulesDatabase, name: &str) -> Result<unit_analysis::core::types::UnitCombatId> {
    rules
        .unit_combat_by_name(name)
        .ok_or_else(|| AnalysisError::UnknownUnitCombat(name.to_string()))
}

fn parse_role(rules: &RulesDatabase, role: &str) -> Result<UnitRole> {
    match role {
        "attack" => Ok(UnitRole::Attack),
        "city-attack" => Ok(UnitRole::CityAttack),
        "city-defense" => Ok(UnitRole::CityDefense),
        "defense" => Ok(UnitRole::Defense),
        other => match other.strip_prefix("counter:") {
            Some(class) => Ok(UnitRole::Counter(parse_class(rules, class)?)),
            None => Err(AnalysisError::InvalidConfig(format!("unknown role: {other}"))),
        },
    }
}

fn parse_value(rules: &RulesDatabase, value: &str) -> Result<PromotionValue> {
    match value {
        "city-attack" => Ok(PromotionValue::CityAttack),
        "city-defense" => Ok(PromotionValue::CityDefense),
        "combat" => Ok(PromotionValue::Combat),
        "first-strike" => Ok(PromotionValue::FirstStrike),
        "mobility" => Ok(PromotionValue::Mobility),
        "withdrawal" => Ok(PromotionValue::Withdrawal),
        other => match other.strip_prefix("counter:") {
            Some(class) => Ok(PromotionValue::Counter(parse_class(rules, class)?)),
            None => Err(AnalysisError::InvalidConfig(format!("unknown value: {other}"))),
        },
    }
}
