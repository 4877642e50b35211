//! Concrete circuit execution.
//!
//! The engine never interprets amplitudes itself; it hands the input
//! state and the recorded gate log to a backend and consumes the
//! per-basis-state measurement statistics. Backends sit on the concrete
//! side of the run only, never on the solving path.

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use quartz_sym::circuit::GateOp;
use quartz_smt::quantum::gates;

use crate::EngineError;

/// Measurement statistics for a circuit run.
pub trait CircuitBackend {
    /// Probability per basis string after applying `gate_log` to
    /// `state`. `shots == 0` means exact probabilities; otherwise the
    /// distribution is estimated from that many sampled measurements.
    fn probabilities(
        &mut self,
        qubits: usize,
        state: &[Complex64],
        gate_log: &[GateOp],
        shots: usize,
    ) -> Result<Vec<f64>, EngineError>;
}

/// Dense state-vector simulator with a seeded RNG for shot sampling.
pub struct StateVectorSim {
    rng: StdRng,
}

impl StateVectorSim {
    pub fn seeded(seed: u64) -> Self {
        StateVectorSim {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl CircuitBackend for StateVectorSim {
    fn probabilities(
        &mut self,
        qubits: usize,
        state: &[Complex64],
        gate_log: &[GateOp],
        shots: usize,
    ) -> Result<Vec<f64>, EngineError> {
        let dim = 1usize << qubits;
        if state.len() != dim {
            return Err(EngineError::Contract(format!(
                "state has {} amplitudes for {qubits} qubit(s)",
                state.len()
            )));
        }

        let mut psi = state.to_vec();
        for gate in gate_log {
            // Measurement markers carry no unitary.
            if matches!(gate, GateOp::Measure) {
                continue;
            }
            let matrix = gates::full_matrix(gate, qubits)?;
            psi = gates::apply(&matrix, &psi);
        }

        let exact: Vec<f64> = psi.iter().map(|a| a.norm_sqr()).collect();
        if shots == 0 {
            return Ok(exact);
        }

        // Finite-shot estimate: sample basis states from the exact
        // distribution and report observed frequencies.
        let total: f64 = exact.iter().sum();
        let mut counts = vec![0usize; dim];
        for _ in 0..shots {
            let mut draw = self.rng.gen_range(0.0..total.max(f64::MIN_POSITIVE));
            let mut picked = dim - 1;
            for (i, p) in exact.iter().enumerate() {
                if draw < *p {
                    picked = i;
                    break;
                }
                draw -= p;
            }
            counts[picked] += 1;
        }
        Ok(counts.iter().map(|&c| c as f64 / shots as f64).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed(qubits: usize) -> Vec<Complex64> {
        let mut s = vec![Complex64::new(0.0, 0.0); 1 << qubits];
        s[0] = Complex64::new(1.0, 0.0);
        s
    }

    #[test]
    fn hadamard_gives_an_even_split() {
        let mut sim = StateVectorSim::seeded(0);
        let probs = sim
            .probabilities(1, &zeroed(1), &[GateOp::H(0)], 0)
            .unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-9);
        assert!((probs[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn bell_pair_concentrates_on_matching_strings() {
        let mut sim = StateVectorSim::seeded(0);
        let log = vec![GateOp::H(0), GateOp::Cx(0, 1)];
        let probs = sim.probabilities(2, &zeroed(2), &log, 0).unwrap();
        assert!((probs[0b00] - 0.5).abs() < 1e-9);
        assert!((probs[0b11] - 0.5).abs() < 1e-9);
        assert!(probs[0b01].abs() < 1e-9);
        assert!(probs[0b10].abs() < 1e-9);
    }

    #[test]
    fn shot_estimates_track_the_exact_distribution() {
        let mut sim = StateVectorSim::seeded(42);
        let probs = sim
            .probabilities(1, &zeroed(1), &[GateOp::H(0)], 10_000)
            .unwrap();
        assert!((probs[0] - 0.5).abs() < 0.05, "got {probs:?}");
        assert!(((probs[0] + probs[1]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn measurement_markers_are_inert() {
        let mut sim = StateVectorSim::seeded(0);
        let log = vec![GateOp::X(0), GateOp::Measure];
        let probs = sim.probabilities(1, &zeroed(1), &log, 0).unwrap();
        assert!((probs[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn wrong_state_length_is_a_contract_error() {
        let mut sim = StateVectorSim::seeded(0);
        let short = vec![Complex64::new(1.0, 0.0)];
        assert!(matches!(
            sim.probabilities(2, &short, &[], 0),
            Err(EngineError::Contract(_))
        ));
    }
}
