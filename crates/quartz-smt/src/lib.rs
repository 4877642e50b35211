#![doc = include_str!("../README.md")]

//! Solver backends: the in-process classical counterexample solver and
//! the quantum amplitude solver with its exact (external NRA prover)
//! and approximate (random normalized vector) strategies.

pub mod classical;
pub mod quantum;
pub mod smtlib;
pub mod sorts;
pub mod terms;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("gate applied after measurement in solver encoding")]
    GateAfterMeasurement,
    #[error("unsupported expression in classical constraint: {0}")]
    UnsupportedExpression(String),
    #[error("two-qubit gate repeats qubit {0}")]
    RepeatedGateOperand(usize),
    #[error("unsupported probability comparison for exact encoding: {0}")]
    UnsupportedComparison(&'static str),
    #[error("internal gate matrix has wrong shape: expected {expected}x{expected}, got {got}")]
    MatrixShape { expected: usize, got: usize },
    #[error("failed to write problem file: {0}")]
    Io(#[from] std::io::Error),
    #[error("external solver `{command}` failed: {reason}")]
    External { command: String, reason: String },
    #[error("failed to parse solver model: {0}")]
    ModelParse(String),
    #[error("z3 error: {0}")]
    Z3(String),
}
