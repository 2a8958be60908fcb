//! Headless Duel Runner
//!
//! Pits a scripted player against pattern-driven agents and prints a summary.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use skirmish_core::combat::{CharacterStats, Combatant, SkillExecutionState, SkillType, WeaponData};
use skirmish_core::core::types::{direction, CombatantId, Faction, Vec2};
use skirmish_core::core::CombatConfig;
use skirmish_core::pattern::PatternDefinition;
use skirmish_core::simulation::{Simulation, SimulationSummary};

/// Headless Duel Runner - scripted player vs pattern agents
#[derive(Parser, Debug)]
#[command(name = "duel_sim")]
#[command(about = "Run a scripted player against pattern-driven agents")]
struct Args {
    /// Pattern file every agent runs
    #[arg(long, default_value = "data/patterns/brute.toml")]
    pattern: PathBuf,

    /// Optional combat config (TOML); defaults when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of agents to spawn
    #[arg(long, default_value_t = 1)]
    agents: usize,

    /// Agents allowed to attack at once
    #[arg(long, default_value_t = 1)]
    max_attackers: usize,

    /// Maximum ticks before the run stops
    #[arg(long, default_value_t = 1200)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.05)]
    dt: f32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skirmish_core=info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let config = match &args.config {
        Some(path) => match CombatConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Failed to load config '{}': {}", path.display(), err);
                std::process::exit(1);
            }
        },
        None => CombatConfig::default(),
    };

    let pattern = match PatternDefinition::load(&args.pattern) {
        Ok(pattern) => pattern,
        Err(err) => {
            eprintln!("Failed to load pattern '{}': {}", args.pattern.display(), err);
            std::process::exit(1);
        }
    };

    let mut sim = Simulation::new(config, seed, args.max_attackers);
    let player = sim.spawn(Combatant::new(
        "player",
        Faction::PLAYER,
        CharacterStats::default(),
        WeaponData::sword(),
    ));

    // Agents start on a ring around the player
    let count = args.agents.max(1);
    for i in 0..count {
        let angle = i as f32 / count as f32 * std::f32::consts::TAU;
        let position = Vec2::new(angle.cos(), angle.sin()) * 10.0;
        let agent = Combatant::new(
            &format!("{}-{}", pattern.name, i + 1),
            Faction::ENEMY,
            CharacterStats::default(),
            WeaponData::greatsword(),
        )
        .at(position);
        sim.spawn_agent(agent, pattern.clone());
    }

    while !sim.is_finished() && sim.tick_count() < args.ticks {
        drive_player(&mut sim, player);
        sim.tick(args.dt);
    }

    let summary = sim.summary();
    match args.format.as_str() {
        "text" => print_text(&summary, &pattern.name),
        "json" => print_json(&summary),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            print_json(&summary);
        }
    }
}

/// Walk at the nearest agent, swing when in reach
fn drive_player(sim: &mut Simulation, player: CombatantId) {
    let Some(me) = sim.arena.get(player) else {
        return;
    };
    if !me.is_alive() {
        return;
    }
    let Some((target, distance)) = sim.arena.nearest_hostile(player) else {
        sim.set_movement(player, Vec2::ZERO);
        return;
    };
    let reach = me.weapon().primary_range();
    let heading = sim
        .arena
        .get(target)
        .map_or(Vec2::ZERO, |t| direction(me.position, t.position));
    let state = me.skill_state();

    let input = if distance > reach * 0.9 { heading } else { Vec2::ZERO };
    sim.set_movement(player, input);

    match state {
        SkillExecutionState::Uncharged if distance <= reach * 2.0 => {
            if let Err(err) = sim.charge(player, SkillType::Attack) {
                tracing::debug!(%err, "player charge refused");
            }
        }
        SkillExecutionState::Charged if distance <= reach => {
            if let Err(err) = sim.execute(player) {
                tracing::debug!(%err, "player execute refused");
            }
        }
        _ => {}
    }
}

fn print_json(summary: &SimulationSummary) {
    match serde_json::to_string_pretty(summary) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("Failed to serialize summary: {}", err),
    }
}

fn print_text(summary: &SimulationSummary, pattern: &str) {
    println!("Duel Result");
    println!("===========");
    println!("Pattern: {}", pattern);
    println!("Ticks: {} ({:.2}s)", summary.ticks, summary.time);
    println!("Finished: {}", summary.finished);
    println!(
        "Hits: {}  Misses: {}  Interactions: {}  Deaths: {}  Telegraphs: {}",
        summary.hits, summary.misses, summary.interactions, summary.deaths, summary.telegraphs
    );
    println!();
    for c in &summary.combatants {
        println!(
            "  {:<12} faction={} health={:>6.1}/{:<6.1} alive={} node={} transitions={}",
            c.name,
            c.faction,
            c.health,
            c.max_health,
            c.alive,
            c.node.as_deref().unwrap_or("-"),
            c.transitions
        );
    }
    println!();
    println!("Seed: {}", summary.seed);
}
