//! QF_NRA encoding of a circuit's amplitude evolution.
//!
//! Each step `k` of the gate log gets a fresh vector of real pairs
//! `psi_{k}_{i}_re` / `psi_{k}_{i}_im`; step 0 is the unknown input the
//! prover solves for, constrained to unit L2 norm. The final step is
//! tied to the target probability vector element-wise.

use num_complex::Complex64;

use quartz_sym::circuit::GateOp;

use crate::quantum::gates;
use crate::sorts::SmtSort;
use crate::terms::SmtTerm;
use crate::SolveError;

/// How the final distribution is tied to the target vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbCmp {
    /// Every basis-state probability equals its target entry.
    Eq,
    /// Every basis-state probability differs from its target entry.
    Ne,
}

/// A rendered-ready constraint problem.
#[derive(Debug)]
pub struct QuantumProblem {
    pub declarations: Vec<(String, SmtSort)>,
    pub assertions: Vec<SmtTerm>,
    pub qubits: usize,
    /// Number of unitary steps encoded; the solved input lives at step 0.
    pub steps: usize,
}

fn re_var(step: usize, index: usize) -> String {
    format!("psi_{step}_{index}_re")
}

fn im_var(step: usize, index: usize) -> String {
    format!("psi_{step}_{index}_im")
}

/// Unitary prefix of the gate log. A trailing run of measurements is
/// dropped; any gate after a measurement is an encoding error.
fn unitary_prefix(gates: &[GateOp]) -> Result<&[GateOp], SolveError> {
    match gates.iter().position(|g| matches!(g, GateOp::Measure)) {
        None => Ok(gates),
        Some(first) => {
            if gates[first..].iter().any(|g| !matches!(g, GateOp::Measure)) {
                return Err(SolveError::GateAfterMeasurement);
            }
            Ok(&gates[..first])
        }
    }
}

/// Encode the full problem: unit input, per-gate evolution, target
/// comparison, and disequalities excluding already rejected inputs.
pub fn encode(
    qubits: usize,
    gate_log: &[GateOp],
    cmp: ProbCmp,
    target: &[f64],
    unaccepted: &[Vec<Complex64>],
) -> Result<QuantumProblem, SolveError> {
    let dim = 1usize << qubits;
    if target.len() != dim {
        return Err(SolveError::UnsupportedExpression(format!(
            "target distribution has {} entries for {qubits} qubit(s)",
            target.len()
        )));
    }
    let unitaries = unitary_prefix(gate_log)?;
    let steps = unitaries.len();

    let mut declarations = Vec::with_capacity(2 * dim * (steps + 1));
    for k in 0..=steps {
        for i in 0..dim {
            declarations.push((re_var(k, i), SmtSort::Real));
            declarations.push((im_var(k, i), SmtSort::Real));
        }
    }

    let mut assertions = Vec::new();

    // The input is a valid quantum state: sum of squared moduli is 1.
    let norm = SmtTerm::sum((0..dim).flat_map(|i| {
        [
            SmtTerm::var(re_var(0, i)).squared(),
            SmtTerm::var(im_var(0, i)).squared(),
        ]
    }));
    assertions.push(norm.eq(SmtTerm::real(1.0)));

    // psi_{k+1} = M_k * psi_k, expanded into real and imaginary parts.
    // Zero matrix entries produce no terms.
    for (k, gate) in unitaries.iter().enumerate() {
        let matrix = gates::full_matrix(gate, qubits)?;
        for (i, row) in matrix.iter().enumerate() {
            let mut re_terms = Vec::new();
            let mut im_terms = Vec::new();
            for (j, m) in row.iter().enumerate() {
                if m.norm() < 1e-12 {
                    continue;
                }
                let rj = SmtTerm::var(re_var(k, j));
                let ij = SmtTerm::var(im_var(k, j));
                if m.re.abs() > 1e-12 {
                    re_terms.push(SmtTerm::real(m.re).mul(rj.clone()));
                    im_terms.push(SmtTerm::real(m.re).mul(ij.clone()));
                }
                if m.im.abs() > 1e-12 {
                    re_terms.push(SmtTerm::real(m.im).mul(ij).neg());
                    im_terms.push(SmtTerm::real(m.im).mul(rj));
                }
            }
            assertions.push(SmtTerm::var(re_var(k + 1, i)).eq(SmtTerm::sum(re_terms)));
            assertions.push(SmtTerm::var(im_var(k + 1, i)).eq(SmtTerm::sum(im_terms)));
        }
    }

    // Measurement statistics of the final step against the target.
    for (i, &p) in target.iter().enumerate() {
        let prob = SmtTerm::var(re_var(steps, i))
            .squared()
            .add(SmtTerm::var(im_var(steps, i)).squared());
        let tied = prob.eq(SmtTerm::real(p));
        assertions.push(match cmp {
            ProbCmp::Eq => tied,
            ProbCmp::Ne => tied.not(),
        });
    }

    // Exclude inputs the engine already tried and rejected.
    for state in unaccepted {
        let differs = (0..dim.min(state.len()))
            .flat_map(|i| {
                [
                    SmtTerm::var(re_var(0, i)).eq(SmtTerm::real(state[i].re)).not(),
                    SmtTerm::var(im_var(0, i)).eq(SmtTerm::real(state[i].im)).not(),
                ]
            })
            .collect();
        assertions.push(SmtTerm::or(differs));
    }

    Ok(QuantumProblem {
        declarations,
        assertions,
        qubits,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smtlib::render_problem;

    #[test]
    fn trailing_measurements_are_dropped() {
        let log = vec![GateOp::H(0), GateOp::Measure, GateOp::Measure];
        let problem = encode(1, &log, ProbCmp::Eq, &[0.5, 0.5], &[]).unwrap();
        assert_eq!(problem.steps, 1);
    }

    #[test]
    fn gate_after_measurement_is_fatal() {
        let log = vec![GateOp::H(0), GateOp::Measure, GateOp::X(0)];
        assert!(matches!(
            encode(1, &log, ProbCmp::Eq, &[0.5, 0.5], &[]),
            Err(SolveError::GateAfterMeasurement)
        ));
    }

    #[test]
    fn target_length_must_match_register() {
        assert!(encode(2, &[], ProbCmp::Eq, &[1.0, 0.0], &[]).is_err());
    }

    #[test]
    fn declares_a_pair_per_amplitude_per_step() {
        let log = vec![GateOp::H(0), GateOp::Z(0)];
        let problem = encode(1, &log, ProbCmp::Eq, &[0.5, 0.5], &[]).unwrap();
        // 3 steps (input + 2 gates) x 2 amplitudes x (re, im).
        assert_eq!(problem.declarations.len(), 12);
        assert!(problem
            .declarations
            .iter()
            .any(|(name, sort)| name == "psi_2_1_im" && *sort == SmtSort::Real));
    }

    #[test]
    fn renders_a_complete_nra_problem() {
        let log = vec![GateOp::H(0)];
        let problem = encode(1, &log, ProbCmp::Eq, &[0.25, 0.75], &[]).unwrap();
        let text = render_problem("QF_NRA", &problem.declarations, &problem.assertions);
        assert!(text.starts_with("(set-logic QF_NRA)"));
        assert!(text.contains("(declare-const psi_0_0_re Real)"));
        assert!(text.contains("(check-sat)"));
        assert!(text.contains("(get-model)"));
    }

    #[test]
    fn unaccepted_states_become_disequalities() {
        let reject = vec![vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
        ]];
        let with = encode(1, &[], ProbCmp::Eq, &[1.0, 0.0], &reject).unwrap();
        let without = encode(1, &[], ProbCmp::Eq, &[1.0, 0.0], &[]).unwrap();
        assert_eq!(with.assertions.len(), without.assertions.len() + 1);
    }
}
