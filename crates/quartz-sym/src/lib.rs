#![doc = include_str!("../README.md")]

//! Symbolic program state for concolic exploration.
//!
//! Every value a target program branches on carries both its concrete
//! payload and the expression that derived it. Comparisons produce
//! [`value::SymBool`]s whose conversion to `bool` goes through the
//! path recorder, which maintains the constraint tree of explored
//! branch prefixes.

pub mod circuit;
pub mod predicate;
pub mod recorder;
pub mod tree;
pub mod value;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SymError {
    #[error("division by zero in symbolic arithmetic")]
    DivisionByZero,
    #[error("duplicate predicate inserted under node {0}")]
    DuplicatePredicate(usize),
    #[error("qubit index {index} out of range for {qubits}-qubit circuit")]
    QubitOutOfRange { index: usize, qubits: usize },
    #[error("qubit {0} used twice in one gate")]
    RepeatedQubit(usize),
    #[error("amplitude vector of length {len} does not fit a {qubits}-qubit circuit")]
    BadStateLength { len: usize, qubits: usize },
}
