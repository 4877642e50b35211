//! The contract between the engine and an instrumented target program.
//!
//! A target program declares its inputs, computes over the symbolic
//! values bound to them, and routes every branch decision through the
//! execution context so the engine sees the comparison expression next
//! to the concrete outcome.

use std::collections::BTreeSet;

use quartz_sym::circuit::SymCircuit;
use quartz_sym::recorder::PathRecorder;
use quartz_sym::value::{Bindings, OpKind, SymBool};

use crate::backend::CircuitBackend;
use crate::EngineError;

/// Shape and seed of one declared input.
#[derive(Debug, Clone)]
pub enum InputKind {
    Scalar { seed: i64 },
    Circuit { qubits: usize },
}

#[derive(Debug, Clone)]
pub struct InputDecl {
    pub name: String,
    pub kind: InputKind,
}

impl InputDecl {
    pub fn scalar(name: impl Into<String>, seed: i64) -> Self {
        InputDecl {
            name: name.into(),
            kind: InputKind::Scalar { seed },
        }
    }

    pub fn circuit(name: impl Into<String>, qubits: usize) -> Self {
        InputDecl {
            name: name.into(),
            kind: InputKind::Circuit { qubits },
        }
    }
}

/// What the program's author claims exploration should find.
#[derive(Debug, Clone)]
pub enum Expected {
    /// Every value must show up; extra observations and repeats are fine.
    Set(BTreeSet<i64>),
    /// Observed return values must match with multiplicity.
    Bag(Vec<i64>),
}

impl Expected {
    pub fn set(values: impl IntoIterator<Item = i64>) -> Self {
        Expected::Set(values.into_iter().collect())
    }

    pub fn bag(values: impl IntoIterator<Item = i64>) -> Self {
        Expected::Bag(values.into_iter().collect())
    }

    /// The distinct values, used for the termination check.
    pub fn value_set(&self) -> BTreeSet<i64> {
        match self {
            Expected::Set(s) => s.clone(),
            Expected::Bag(b) => b.iter().copied().collect(),
        }
    }
}

/// An instrumented program the engine can explore.
pub trait TargetProgram {
    fn name(&self) -> &str;

    /// Declared inputs, in order. The engine builds the initial binding
    /// set from these and rebuilds individual entries from solver
    /// models between iterations.
    fn inputs(&self) -> Vec<InputDecl>;

    /// One concrete run over the given bindings. All control flow that
    /// depends on a symbolic value must go through `ctx`.
    fn invoke(&self, ctx: &mut ExecCtx<'_>, bindings: &mut Bindings) -> Result<i64, EngineError>;

    fn expected(&self) -> Expected;
}

/// Handed to the target program for the duration of one run.
pub struct ExecCtx<'a> {
    recorder: &'a mut PathRecorder,
    backend: &'a mut dyn CircuitBackend,
    shots: usize,
}

impl<'a> ExecCtx<'a> {
    pub(crate) fn new(
        recorder: &'a mut PathRecorder,
        backend: &'a mut dyn CircuitBackend,
        shots: usize,
    ) -> Self {
        ExecCtx {
            recorder,
            backend,
            shots,
        }
    }

    /// Record a branch condition and hand back its concrete outcome.
    /// The returned bool is what the program branches on.
    pub fn branch(&mut self, cond: SymBool) -> Result<bool, EngineError> {
        self.recorder.record_branch(cond.value, cond.expr)?;
        Ok(cond.value)
    }

    /// Does the circuit's measurement distribution match `target`
    /// within `tolerance`, elementwise? Records the comparison as a
    /// branch and logs a measurement after the expression snapshot.
    pub fn check_state_eq(
        &mut self,
        qc: &mut SymCircuit,
        target: &[f64],
        tolerance: f64,
    ) -> Result<bool, EngineError> {
        self.check_state(qc, OpKind::Eq, target, |p, t| (p - t).abs() <= tolerance)
    }

    /// Is every basis-state probability strictly above its target entry?
    pub fn check_state_gt(
        &mut self,
        qc: &mut SymCircuit,
        target: &[f64],
    ) -> Result<bool, EngineError> {
        self.check_state(qc, OpKind::Gt, target, |p, t| p > t)
    }

    /// Is every basis-state probability strictly below its target entry?
    pub fn check_state_lt(
        &mut self,
        qc: &mut SymCircuit,
        target: &[f64],
    ) -> Result<bool, EngineError> {
        self.check_state(qc, OpKind::Lt, target, |p, t| p < t)
    }

    fn check_state(
        &mut self,
        qc: &mut SymCircuit,
        op: OpKind,
        target: &[f64],
        accept: impl Fn(f64, f64) -> bool,
    ) -> Result<bool, EngineError> {
        let dim = 1usize << qc.qubits();
        if target.len() != dim {
            return Err(EngineError::Contract(format!(
                "target distribution has {} entries for {} qubit(s)",
                target.len(),
                qc.qubits()
            )));
        }
        let probs = self
            .backend
            .probabilities(qc.qubits(), &qc.state, &qc.gates, self.shots)?;
        let observed = probs.iter().zip(target).all(|(&p, &t)| accept(p, t));
        // Snapshot the gate log before the measurement marker lands.
        let cond = qc.compare_probs(op, target, observed);
        qc.measure();
        self.branch(cond)
    }
}
