#![doc = include_str!("../README.md")]

mod cli;
mod demos;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use quartz_engine::{EngineConfig, ExplorationEngine, ExplorationReport};
use quartz_smt::quantum::{ExactConfig, QuantumStrategy};

use cli::{Cli, Commands};

const EXIT_PASS: i32 = 0;
const EXIT_FAIL: i32 = 1;
const EXIT_ERROR: i32 = 2;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::List => {
            for (name, blurb) in demos::catalog() {
                println!("{name:<12} {blurb}");
            }
            EXIT_PASS
        }
        Commands::Run {
            target,
            max_iterations,
            repeat,
            shots,
            quantum_strategy,
            solver_cmd,
            solver_timeout_secs,
            classical_timeout_secs,
            dump_smt,
            json_out,
            replay_diagnostics,
            seed,
        } => {
            let strategy = match quantum_strategy.as_str() {
                "random" => QuantumStrategy::Random,
                "exact" => {
                    let mut config =
                        ExactConfig::new(solver_cmd, Duration::from_secs(solver_timeout_secs));
                    config.dump_path = dump_smt;
                    QuantumStrategy::Exact(config)
                }
                other => {
                    error!("unknown quantum strategy `{other}` (use random or exact)");
                    std::process::exit(EXIT_ERROR);
                }
            };
            let config = EngineConfig {
                max_iterations,
                repeated_times: repeat,
                shots,
                quantum_strategy: strategy,
                replay_diagnostics,
                solver_timeout_secs: classical_timeout_secs,
                seed,
            };
            run_target(&target, config, json_out)
        }
    };
    std::process::exit(code);
}

fn run_target(target: &str, config: EngineConfig, json_out: Option<PathBuf>) -> i32 {
    let Some(program) = demos::lookup(target) else {
        error!("no built-in target named `{target}` (try `quartz list`)");
        return EXIT_ERROR;
    };

    match ExplorationEngine::new(program.as_ref(), config).run() {
        Ok(report) => {
            if let Err(e) = emit(&report, json_out) {
                error!("failed to write report: {e}");
                return EXIT_ERROR;
            }
            if report.passed() {
                EXIT_PASS
            } else {
                EXIT_FAIL
            }
        }
        Err(e) => {
            error!("exploration failed: {e}");
            EXIT_ERROR
        }
    }
}

fn emit(report: &ExplorationReport, json_out: Option<PathBuf>) -> std::io::Result<()> {
    println!("program:        {}", report.program);
    println!("iterations:     {}", report.iterations);
    println!("return values:  {:?}", report.return_values);
    println!("tree nodes:     {}", report.tree_nodes);
    println!("pending:        {}", report.pending_branches);
    println!(
        "verdict:        {}",
        if report.passed() { "pass" } else { "fail" }
    );
    if let Some(path) = json_out {
        let json = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
    }
    Ok(())
}
