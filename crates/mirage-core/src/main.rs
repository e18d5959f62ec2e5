//! Mirage Simulation Runner
//!
//! Runs a population of scripted and oscillating agents (optionally joined by
//! a player on stdin) and prints what each of them decided every tick.

use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use mirage_core::{Agent, Config, Orchestrator, StdinInput, TickReport};
use mirage_types::Position;

/// Command line arguments for the runner
#[derive(Parser, Debug)]
#[command(name = "mirage_sim")]
#[command(about = "Agents that misremember, imagine, and argue about a drifting marker")]
struct Args {
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 100)]
    ticks: u64,

    /// Tuning file (falls back to tuning.toml, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of east-walking agents
    #[arg(long, default_value_t = 2)]
    scripted: usize,

    /// Number of north/south pacing agents
    #[arg(long, default_value_t = 2)]
    oscillating: usize,

    /// Add a player reading w/a/s/d/e/q from stdin
    #[arg(long)]
    human: bool,

    /// Milliseconds between ticks (overrides the tuning file)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Write one JSON tick report per line to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn spawn_agents(args: &Args, config: &Config) -> Vec<Agent> {
    let mid = config.world.height / 2;
    let mut agents = Vec::new();

    let half = i32::try_from(args.scripted / 2).unwrap_or(i32::MAX);
    for i in 0..args.scripted {
        let offset = i32::try_from(i).unwrap_or(i32::MAX);
        let row = mid.saturating_add(offset).saturating_sub(half);
        agents.push(Agent::scripted(format!("scripted-{}", i), config).at(Position::new(0, row)));
    }
    for i in 0..args.oscillating {
        let column = i32::try_from(i).unwrap_or(i32::MAX).saturating_mul(3).saturating_add(2);
        agents.push(Agent::oscillating(format!("pacer-{}", i), config).at(Position::new(column, mid)));
    }
    if args.human {
        agents.push(Agent::human("player", StdinInput, config).at(Position::new(1, mid)));
    }

    agents
}

fn print_report(report: &TickReport) {
    println!("Tick {} (marker at {})", report.tick, report.marker);
    for (id, decision) in &report.decisions {
        let mut notes = Vec::new();
        if decision.action != decision.intended {
            notes.push(format!("wanted {}", decision.intended));
        }
        if !decision.transferred.is_empty() {
            notes.push(format!("caught {} belief(s)", decision.transferred.len()));
        }
        if !decision.scarred.is_empty() {
            notes.push(format!("scarred {}", decision.scarred.len()));
        }
        if !decision.hallucinated.is_empty() {
            notes.push(format!("imagines {}", decision.hallucinated.len()));
        }
        println!(
            "  {:<12} {:<8} {:?}{}",
            id.as_str(),
            decision.action.to_string(),
            decision.band,
            if notes.is_empty() {
                String::new()
            } else {
                format!(" ({})", notes.join(", "))
            }
        );
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: could not load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::load_or_default(),
    };
    if let Some(ms) = args.interval_ms {
        config.runtime.tick_interval_ms = ms;
    }
    if args.human {
        // The player paces the session
        config.runtime.tick_interval_ms = 0;
    }

    println!("Mirage Simulation");
    println!("=================");
    println!("Grid: {}x{}", config.world.width, config.world.height);
    println!("Ticks: {}", args.ticks);
    println!(
        "Agents: {} scripted, {} oscillating{}",
        args.scripted,
        args.oscillating,
        if args.human { ", 1 player" } else { "" }
    );
    println!();

    let agents = spawn_agents(&args, &config);
    let mut orchestrator = match Orchestrator::new(config, agents) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut writer = match &args.output {
        Some(path) => match File::create(path) {
            Ok(file) => Some(BufWriter::new(file)),
            Err(e) => {
                eprintln!("Error: could not create {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let interval = orchestrator.config().runtime.tick_interval();
    for i in 0..args.ticks {
        let report = orchestrator.tick_once().await;
        print_report(&report);

        if let Some(out) = writer.as_mut() {
            let written = serde_json::to_string(&report)
                .map_err(std::io::Error::from)
                .and_then(|line| writeln!(out, "{}", line));
            if let Err(e) = written {
                eprintln!("Warning: Could not write report for tick {}: {}", report.tick, e);
            }
        }

        if report.quit {
            println!("Player quit.");
            break;
        }
        if !interval.is_zero() && i + 1 < args.ticks {
            tokio::time::sleep(interval).await;
        }
    }

    if let Some(mut out) = writer {
        if let Err(e) = out.flush() {
            eprintln!("Warning: Could not flush reports: {}", e);
        }
    }

    println!();
    println!("Simulation complete at tick {}.", orchestrator.tick());
    for agent in orchestrator.agents() {
        println!(
            "  {:<12} energy {:>3}, {} tiles remembered, {} scar(s)",
            agent.id().as_str(),
            agent.energy(),
            agent.memory().len(),
            agent.memory().total_scars()
        );
    }

    ExitCode::SUCCESS
}
