//! Headless Battle Runner
//!
//! Runs AI vs AI battles from a composition on the command line and prints
//! the result as JSON or text.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use muster::battle::{
    deployment_slots, AiCommander, Archetype, ArmyStatus, BattleAI, BattleOutcome, BattleState,
    DecisionContext,
};
use muster::core::{BattleConfig, MusterError, Side};

/// Headless Battle Runner - AI vs AI battles
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run an AI vs AI battle and print the result")]
struct Args {
    /// Battle config (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Player 1 army, e.g. `foot=4,archer=2`
    #[arg(long, default_value = "foot=4,archer=2,horse=1,planner=1")]
    p1: String,

    /// Player 2 army
    #[arg(long, default_value = "foot=4,archer=2,horse=1,planner=1")]
    p2: String,

    /// Rounds before the battle is called undecided
    #[arg(long, default_value_t = 200)]
    max_rounds: u32,

    /// Let planners rally allies toward the nearest enemy each round
    #[arg(long)]
    auto_rally: bool,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

/// JSON output structure
#[derive(Serialize)]
struct BattleResult {
    outcome: BattleOutcome,
    winner: Option<u8>,
    rounds: u32,
    armies: [ArmyStatus; 2],
    seed: Option<u64>,
    log: Vec<String>,
}

/// Parse `foot=4,archer=2` into (archetype, count) pairs
fn parse_army(roster: &str) -> Result<Vec<(Archetype, u32)>, MusterError> {
    roster
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let (name, count) = part.split_once('=').unwrap_or((part, "1"));
            let archetype: Archetype = name.parse()?;
            let count = count
                .trim()
                .parse()
                .map_err(|_| MusterError::InvalidConfig(format!("bad unit count in '{part}'")))?;
            Ok((archetype, count))
        })
        .collect()
}

fn load_config(args: &Args) -> Result<BattleConfig, MusterError> {
    let mut config = match &args.config {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn compose(
    state: &mut BattleState,
    side: Side,
    army: &[(Archetype, u32)],
) -> Result<(), MusterError> {
    for &(archetype, count) in army {
        for _ in 0..count {
            state
                .add_unit(side, archetype)
                .map_err(|e| MusterError::InvalidConfig(format!("{side}: {e}")))?;
        }
    }
    state
        .lock_in(side)
        .map_err(|e| MusterError::InvalidConfig(format!("{side}: {e}")))
}

fn deploy(state: &mut BattleState) -> Result<(), MusterError> {
    while let Some(side) = state.deploying_side() {
        let slots = deployment_slots(side, state.deploy_remaining(), &state.config);
        if slots.len() < state.deploy_remaining() {
            return Err(MusterError::InvalidConfig(format!(
                "{side} has more units than deployment tiles"
            )));
        }
        for slot in slots {
            state
                .place_unit(slot.x, slot.y)
                .map_err(|e| MusterError::InvalidConfig(e.to_string()))?;
        }
    }
    Ok(())
}

/// Each of the active side's planners rallies its allies, if the AI has a target
fn auto_rally(state: &mut BattleState, planner_ai: &mut AiCommander) {
    let side = state.active_side;
    let planners: Vec<_> = state
        .alive_units(side)
        .filter(|u| u.archetype.can_command() && !u.has_acted)
        .map(|u| u.id)
        .collect();

    for id in planners {
        let Some(index) = state.units.iter().position(|u| u.id == id) else {
            continue;
        };
        let context = DecisionContext::new(&state.units, index, state.config.bounds());
        let Some(target) = planner_ai.plan_rally(&context) else {
            continue;
        };
        if state.select_command_unit(id).is_ok() {
            if let Err(e) = state.issue_rally_order(target.x, target.y) {
                tracing::debug!("Rally skipped: {}", e);
                if let Err(e) = state.clear_selection() {
                    tracing::debug!("Selection not cleared: {}", e);
                }
            }
        }
    }
}

fn run(args: &Args) -> Result<BattleResult, MusterError> {
    let config = load_config(args)?;
    let seed = config.seed;
    let mut state = BattleState::try_new(config)?;
    let mut planner_ai = AiCommander::new(seed.map(|s| s.wrapping_add(1)));

    compose(&mut state, Side::One, &parse_army(&args.p1)?)?;
    compose(&mut state, Side::Two, &parse_army(&args.p2)?)?;
    deploy(&mut state)?;

    while !state.is_finished() && state.round <= args.max_rounds {
        if args.auto_rally {
            auto_rally(&mut state, &mut planner_ai);
        }
        state
            .end_round()
            .map_err(|e| MusterError::InvalidConfig(e.to_string()))?;
    }

    Ok(BattleResult {
        outcome: state.outcome,
        winner: state.outcome.winner_code(),
        rounds: state.round.min(args.max_rounds),
        armies: Side::BOTH.map(|side| state.army_status(side)),
        seed,
        log: state.log.recent(state.config.log_capacity),
    })
}

fn print_text(result: &BattleResult) {
    println!("Battle Result");
    println!("=============");
    let outcome = match result.outcome {
        BattleOutcome::Victory(side) => format!("{side} wins"),
        BattleOutcome::Draw => "Draw".to_string(),
        BattleOutcome::Undecided => "Undecided (round limit)".to_string(),
    };
    println!("Outcome: {}", outcome);
    println!("Rounds: {}", result.rounds);
    for (side, army) in Side::BOTH.iter().zip(&result.armies) {
        println!("{}: {}/{} alive ({})", side, army.alive, army.total, army.breakdown());
    }
    if let Some(seed) = result.seed {
        println!("Seed: {}", seed);
    }
    println!();
    for line in result.log.iter().rev() {
        println!("  {}", line);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("muster=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let result = match run(&args) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match args.format.as_str() {
        "text" => print_text(&result),
        format => {
            if format != "json" {
                eprintln!("Unknown format '{}', defaulting to json", format);
            }
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_army() {
        let army = parse_army("foot=4, archer=2,P").unwrap();
        assert_eq!(
            army,
            vec![
                (Archetype::Foot, 4),
                (Archetype::Archer, 2),
                (Archetype::Planner, 1)
            ]
        );
        assert!(parse_army("dragon=1").is_err());
        assert!(parse_army("foot=many").is_err());
    }
}
