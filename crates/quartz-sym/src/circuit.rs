//! The circuit-amplitude input: a concrete state vector plus the
//! ordered log of gates the target program has applied this execution.
//!
//! The gate log is the symbolic side of the value. When the program
//! compares measurement statistics against a target distribution, the
//! captured expression embeds the log as applied so far; the engine
//! clears the log between sub-executions so one sample's circuit
//! history never leaks into the next.

use std::fmt;
use std::rc::Rc;

use num_complex::Complex64;

use crate::value::{Expr, OpKind, SymBool};
use crate::SymError;

/// A single recorded circuit operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOp {
    H(usize),
    X(usize),
    Y(usize),
    Z(usize),
    S(usize),
    T(usize),
    Cx(usize, usize),
    Cz(usize, usize),
    Swap(usize, usize),
    /// Full-register measurement. Any gate recorded after one of these
    /// is rejected by the solver encoding.
    Measure,
}

impl GateOp {
    /// Qubit operands, in application order.
    pub fn operands(&self) -> Vec<usize> {
        match self {
            GateOp::H(q) | GateOp::X(q) | GateOp::Y(q) | GateOp::Z(q) | GateOp::S(q)
            | GateOp::T(q) => vec![*q],
            GateOp::Cx(a, b) | GateOp::Cz(a, b) | GateOp::Swap(a, b) => vec![*a, *b],
            GateOp::Measure => vec![],
        }
    }
}

impl fmt::Display for GateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateOp::H(q) => write!(f, "h({q})"),
            GateOp::X(q) => write!(f, "x({q})"),
            GateOp::Y(q) => write!(f, "y({q})"),
            GateOp::Z(q) => write!(f, "z({q})"),
            GateOp::S(q) => write!(f, "s({q})"),
            GateOp::T(q) => write!(f, "t({q})"),
            GateOp::Cx(a, b) => write!(f, "cx({a},{b})"),
            GateOp::Cz(a, b) => write!(f, "cz({a},{b})"),
            GateOp::Swap(a, b) => write!(f, "swap({a},{b})"),
            GateOp::Measure => write!(f, "measure"),
        }
    }
}

/// The circuit-amplitude input value.
#[derive(Debug, Clone)]
pub struct SymCircuit {
    name: String,
    qubits: usize,
    /// Initial per-basis-state amplitudes: this is the concrete input
    /// the solver backends produce new candidates for.
    pub state: Vec<Complex64>,
    /// Gates applied so far in the current execution.
    pub gates: Vec<GateOp>,
}

impl SymCircuit {
    /// A circuit input seeded with an explicit amplitude vector.
    pub fn input(
        name: impl Into<String>,
        qubits: usize,
        state: Vec<Complex64>,
    ) -> Result<Self, SymError> {
        if state.len() != 1 << qubits {
            return Err(SymError::BadStateLength {
                len: state.len(),
                qubits,
            });
        }
        Ok(SymCircuit {
            name: name.into(),
            qubits,
            state,
            gates: Vec::new(),
        })
    }

    /// A circuit input seeded with the all-zeros basis state.
    pub fn zeroed(name: impl Into<String>, qubits: usize) -> Self {
        let mut state = vec![Complex64::new(0.0, 0.0); 1 << qubits];
        state[0] = Complex64::new(1.0, 0.0);
        SymCircuit {
            name: name.into(),
            qubits,
            state,
            gates: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qubits(&self) -> usize {
        self.qubits
    }

    /// Drop the recorded gate log; called between sub-executions.
    pub fn clear_gates(&mut self) {
        self.gates.clear();
    }

    fn check_qubit(&self, q: usize) -> Result<(), SymError> {
        if q >= self.qubits {
            return Err(SymError::QubitOutOfRange {
                index: q,
                qubits: self.qubits,
            });
        }
        Ok(())
    }

    fn record(&mut self, gate: GateOp) -> Result<(), SymError> {
        let operands = gate.operands();
        for &q in &operands {
            self.check_qubit(q)?;
        }
        // Two-qubit gates need distinct wires.
        if let [a, b] = operands[..] {
            if a == b {
                return Err(SymError::RepeatedQubit(a));
            }
        }
        self.gates.push(gate);
        Ok(())
    }

    pub fn h(&mut self, q: usize) -> Result<(), SymError> {
        self.record(GateOp::H(q))
    }

    pub fn x(&mut self, q: usize) -> Result<(), SymError> {
        self.record(GateOp::X(q))
    }

    pub fn y(&mut self, q: usize) -> Result<(), SymError> {
        self.record(GateOp::Y(q))
    }

    pub fn z(&mut self, q: usize) -> Result<(), SymError> {
        self.record(GateOp::Z(q))
    }

    pub fn s(&mut self, q: usize) -> Result<(), SymError> {
        self.record(GateOp::S(q))
    }

    pub fn t(&mut self, q: usize) -> Result<(), SymError> {
        self.record(GateOp::T(q))
    }

    pub fn cx(&mut self, control: usize, target: usize) -> Result<(), SymError> {
        self.record(GateOp::Cx(control, target))
    }

    pub fn cz(&mut self, a: usize, b: usize) -> Result<(), SymError> {
        self.record(GateOp::Cz(a, b))
    }

    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), SymError> {
        self.record(GateOp::Swap(a, b))
    }

    /// Record a full-register measurement into the gate log.
    pub fn measure(&mut self) {
        self.gates.push(GateOp::Measure);
    }

    /// Build the symbolic comparison between this circuit's measurement
    /// distribution and a target probability vector. The expression
    /// snapshots the gate log as applied so far; `outcome` is the
    /// concretely observed result supplied by the execution context.
    pub fn compare_probs(&self, op: OpKind, target: &[f64], outcome: bool) -> SymBool {
        SymBool {
            value: outcome,
            expr: Rc::new(Expr::Op {
                op,
                args: vec![
                    Rc::new(Expr::Circuit {
                        input: self.name.clone(),
                        gates: self.gates.clone(),
                    }),
                    Rc::new(Expr::Probs(target.to_vec())),
                ],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_log_records_in_order() {
        let mut qc = SymCircuit::zeroed("qc", 2);
        qc.h(0).unwrap();
        qc.z(0).unwrap();
        qc.cx(0, 1).unwrap();
        assert_eq!(
            qc.gates,
            vec![GateOp::H(0), GateOp::Z(0), GateOp::Cx(0, 1)]
        );
        qc.clear_gates();
        assert!(qc.gates.is_empty());
    }

    #[test]
    fn out_of_range_qubit_rejected() {
        let mut qc = SymCircuit::zeroed("qc", 2);
        assert!(matches!(
            qc.h(2),
            Err(SymError::QubitOutOfRange { index: 2, qubits: 2 })
        ));
        assert!(qc.cx(0, 5).is_err());
    }

    #[test]
    fn two_qubit_gate_rejects_repeated_wire() {
        let mut qc = SymCircuit::zeroed("qc", 2);
        assert!(matches!(qc.cx(0, 0), Err(SymError::RepeatedQubit(0))));
        assert!(matches!(qc.cz(1, 1), Err(SymError::RepeatedQubit(1))));
        assert!(matches!(qc.swap(0, 0), Err(SymError::RepeatedQubit(0))));
        assert!(qc.gates.is_empty());
    }

    #[test]
    fn compare_probs_snapshots_gate_log() {
        let mut qc = SymCircuit::zeroed("qc", 1);
        qc.h(0).unwrap();
        let cond = qc.compare_probs(OpKind::Eq, &[0.5, 0.5], true);
        qc.x(0).unwrap();
        match cond.expr.as_ref() {
            Expr::Op { op, args } => {
                assert_eq!(*op, OpKind::Eq);
                match args[0].as_ref() {
                    Expr::Circuit { input, gates } => {
                        assert_eq!(input, "qc");
                        assert_eq!(gates, &vec![GateOp::H(0)]);
                    }
                    other => panic!("expected Circuit leaf, got {other:?}"),
                }
            }
            other => panic!("expected Op node, got {other:?}"),
        }
    }

    #[test]
    fn bad_state_length_rejected() {
        let state = vec![Complex64::new(1.0, 0.0); 3];
        assert!(SymCircuit::input("qc", 2, state).is_err());
    }
}
