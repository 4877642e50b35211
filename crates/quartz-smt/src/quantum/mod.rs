//! Candidate amplitude vectors for circuit-valued branch conditions.
//!
//! Two strategies. `Random` samples fresh unit states and leaves the
//! accept/reject decision to concrete re-execution. `Exact` encodes the
//! circuit's amplitude evolution over the reals and asks an external
//! nonlinear prover for an input whose final measurement distribution
//! relates to the target the way the negated branch demands. Only
//! equality and disequality targets have an exact encoding; anything
//! else falls back to sampling.

pub mod encoder;
pub mod gates;
pub mod prover;
pub mod random_state;

use std::path::PathBuf;
use std::time::Duration;

use num_complex::Complex64;
use rand::Rng;
use tracing::{debug, warn};

use quartz_sym::circuit::GateOp;
use quartz_sym::value::OpKind;

use crate::quantum::encoder::{encode, ProbCmp};
use crate::quantum::prover::{ExternalProver, ProverOutcome};
use crate::SolveError;

/// External-prover settings for the exact strategy.
#[derive(Debug, Clone)]
pub struct ExactConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    pub dump_path: Option<PathBuf>,
}

impl ExactConfig {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        ExactConfig {
            command: command.into(),
            args: Vec::new(),
            timeout,
            dump_path: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum QuantumStrategy {
    /// Sample random unit states and let re-execution judge them.
    #[default]
    Random,
    /// Encode the amplitude evolution and call an external prover.
    Exact(ExactConfig),
}

/// Produces candidate input states that should drive a circuit-valued
/// branch down its unexplored side.
#[derive(Debug, Clone, Default)]
pub struct QuantumSolver {
    strategy: QuantumStrategy,
}

impl QuantumSolver {
    pub fn new(strategy: QuantumStrategy) -> Self {
        QuantumSolver { strategy }
    }

    /// Find an input state for the branch's flipped side. The caller
    /// passes the comparison as observed; the negation happens here.
    /// `None` means the prover refuted the branch or gave up.
    pub fn solve<R: Rng + ?Sized>(
        &self,
        qubits: usize,
        gate_log: &[GateOp],
        op: OpKind,
        observed: bool,
        target: &[f64],
        unaccepted: &[Vec<Complex64>],
        rng: &mut R,
    ) -> Result<Option<Vec<Complex64>>, SolveError> {
        if !op.is_comparison() {
            return Err(SolveError::UnsupportedComparison(op.symbol()));
        }
        // Solving for the branch we have not taken yet.
        let flipped = if observed { op.negated() } else { op };

        let exact = match &self.strategy {
            QuantumStrategy::Random => None,
            QuantumStrategy::Exact(config) => match flipped {
                OpKind::Eq => Some((ProbCmp::Eq, config)),
                OpKind::Ne => Some((ProbCmp::Ne, config)),
                other => {
                    warn!(
                        op = other.symbol(),
                        "no exact encoding for this comparison, sampling instead"
                    );
                    None
                }
            },
        };

        match exact {
            Some((cmp, config)) => {
                let problem = encode(qubits, gate_log, cmp, target, unaccepted)?;
                debug!(
                    steps = problem.steps,
                    assertions = problem.assertions.len(),
                    "encoded amplitude problem"
                );
                let prover = ExternalProver {
                    command: config.command.clone(),
                    args: config.args.clone(),
                    timeout: config.timeout,
                    dump_path: config.dump_path.clone(),
                };
                match prover.solve(&problem)? {
                    ProverOutcome::Model(state) => Ok(Some(state)),
                    ProverOutcome::Unsat => Ok(None),
                    ProverOutcome::Timeout => Ok(None),
                }
            }
            None => {
                // Measurement ordering still binds the sampling path.
                encode(qubits, gate_log, ProbCmp::Eq, target, unaccepted)?;
                let dim = 1usize << qubits;
                Ok(Some(random_state::sample_state(dim, rng)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_strategy_always_returns_a_unit_state() {
        let solver = QuantumSolver::default();
        let mut rng = StdRng::seed_from_u64(3);
        let state = solver
            .solve(2, &[GateOp::H(0)], OpKind::Eq, true, &[0.25; 4], &[], &mut rng)
            .unwrap()
            .unwrap();
        let norm: f64 = state.iter().map(|a| a.norm_sqr()).sum();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn random_strategy_still_rejects_bad_gate_logs() {
        let solver = QuantumSolver::default();
        let mut rng = StdRng::seed_from_u64(3);
        let log = vec![GateOp::Measure, GateOp::X(0)];
        assert!(matches!(
            solver.solve(1, &log, OpKind::Eq, true, &[0.5, 0.5], &[], &mut rng),
            Err(SolveError::GateAfterMeasurement)
        ));
    }

    #[test]
    fn non_comparison_operator_is_rejected() {
        let solver = QuantumSolver::default();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            solver.solve(1, &[], OpKind::Add, true, &[1.0, 0.0], &[], &mut rng),
            Err(SolveError::UnsupportedComparison("+"))
        ));
    }
}
