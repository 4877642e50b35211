#![doc = include_str!("../README.md")]

pub mod backend;
pub mod explore;
pub mod program;
pub mod result;

pub use backend::{CircuitBackend, StateVectorSim};
pub use explore::{EngineConfig, ExplorationEngine};
pub use program::{ExecCtx, Expected, InputDecl, InputKind, TargetProgram};
pub use result::{ExplorationReport, RecordedValue, RunRecord, Verdict};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("target program contract violation: {0}")]
    Contract(String),
    #[error(transparent)]
    Sym(#[from] quartz_sym::SymError),
    #[error(transparent)]
    Solve(#[from] quartz_smt::SolveError),
}
