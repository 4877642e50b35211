//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quartz")]
#[command(about = "Concolic tester for probabilistic and quantum-classical programs")]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Explore a built-in target program and judge the result
    Run {
        /// Built-in target name (see `quartz list`)
        target: String,

        /// Execution cap; 0 removes the limit
        #[arg(short = 'm', long, default_value_t = 0)]
        max_iterations: usize,

        /// Re-executions per input, so probabilistic output can surface
        #[arg(short = 'r', long, default_value_t = 10)]
        repeat: usize,

        /// Measurement shots per state check; 0 uses exact probabilities
        #[arg(long, default_value_t = 0)]
        shots: usize,

        /// Candidate-state strategy for circuit branches: random | exact
        #[arg(long, default_value = "random")]
        quantum_strategy: String,

        /// External nonlinear prover for the exact strategy
        #[arg(long, default_value = "dreal")]
        solver_cmd: String,

        /// Wall-clock timeout (seconds) per external prover call
        #[arg(long, default_value_t = 60)]
        solver_timeout_secs: u64,

        /// Timeout (seconds) for the classical solver; 0 disables it
        #[arg(long, default_value_t = 0)]
        classical_timeout_secs: u64,

        /// Keep a copy of the last emitted .smt2 problem at this path
        #[arg(long)]
        dump_smt: Option<PathBuf>,

        /// Write the full JSON report to this path
        #[arg(long)]
        json_out: Option<PathBuf>,

        /// Warn when a re-execution diverges from the solved branch
        #[arg(long, default_value_t = false)]
        replay_diagnostics: bool,

        /// RNG seed for candidate sampling and shot noise
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// List the built-in target programs
    List,
}
