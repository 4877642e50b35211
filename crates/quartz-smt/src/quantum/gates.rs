//! Dense gate matrices over complex amplitudes.
//!
//! Qubit 0 is the most significant bit of a basis-state index, so a
//! gate on contiguous qubits starting at position `p` of an `n`-qubit
//! register is `I(2^p) ⊗ G ⊗ I(2^(n-p-k))`. Multi-qubit gates with
//! reversed or non-adjacent operands are conjugated through a chain of
//! adjacent SWAPs before the dense matrix is built; a wrongly shaped
//! result is reported as a solver bug, never used.

use std::f64::consts::FRAC_1_SQRT_2;

use num_complex::Complex64;

use quartz_sym::circuit::GateOp;

use crate::SolveError;

pub type CMat = Vec<Vec<Complex64>>;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

pub fn identity(dim: usize) -> CMat {
    (0..dim)
        .map(|i| (0..dim).map(|j| c((i == j) as u8 as f64, 0.0)).collect())
        .collect()
}

pub fn mat_mul(a: &CMat, b: &CMat) -> CMat {
    let n = a.len();
    let mut out = vec![vec![c(0.0, 0.0); n]; n];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            let mut acc = c(0.0, 0.0);
            for k in 0..n {
                acc += a[i][k] * b[k][j];
            }
            *cell = acc;
        }
    }
    out
}

pub fn kron(a: &CMat, b: &CMat) -> CMat {
    let (ra, rb) = (a.len(), b.len());
    let mut out = vec![vec![c(0.0, 0.0); ra * rb]; ra * rb];
    for i in 0..ra {
        for j in 0..ra {
            for k in 0..rb {
                for l in 0..rb {
                    out[i * rb + k][j * rb + l] = a[i][j] * b[k][l];
                }
            }
        }
    }
    out
}

fn swap_matrix() -> CMat {
    vec![
        vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)],
        vec![c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)],
        vec![c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)],
        vec![c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0)],
    ]
}

/// The gate's base matrix with operands in declaration order.
fn base_matrix(op: &GateOp) -> Option<CMat> {
    let h = FRAC_1_SQRT_2;
    Some(match op {
        GateOp::H(_) => vec![vec![c(h, 0.0), c(h, 0.0)], vec![c(h, 0.0), c(-h, 0.0)]],
        GateOp::X(_) => vec![vec![c(0.0, 0.0), c(1.0, 0.0)], vec![c(1.0, 0.0), c(0.0, 0.0)]],
        GateOp::Y(_) => vec![vec![c(0.0, 0.0), c(0.0, -1.0)], vec![c(0.0, 1.0), c(0.0, 0.0)]],
        GateOp::Z(_) => vec![vec![c(1.0, 0.0), c(0.0, 0.0)], vec![c(0.0, 0.0), c(-1.0, 0.0)]],
        GateOp::S(_) => vec![vec![c(1.0, 0.0), c(0.0, 0.0)], vec![c(0.0, 0.0), c(0.0, 1.0)]],
        GateOp::T(_) => vec![
            vec![c(1.0, 0.0), c(0.0, 0.0)],
            vec![c(0.0, 0.0), c(FRAC_1_SQRT_2, FRAC_1_SQRT_2)],
        ],
        GateOp::Cx(_, _) => vec![
            vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)],
            vec![c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)],
            vec![c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0)],
            vec![c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)],
        ],
        GateOp::Cz(_, _) => vec![
            vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)],
            vec![c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)],
            vec![c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)],
            vec![c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)],
        ],
        GateOp::Swap(_, _) => swap_matrix(),
        GateOp::Measure => return None,
    })
}

/// `I(2^position) ⊗ gate ⊗ I(rest)` for a gate on contiguous qubits
/// starting at `position`.
pub fn identity_pad(gate: &CMat, position: usize, qubits: usize) -> CMat {
    let gate_qubits = gate.len().trailing_zeros() as usize;
    let left = identity(1 << position);
    let right = identity(1 << (qubits - position - gate_qubits));
    kron(&kron(&left, gate), &right)
}

/// Full `2^n` matrix for one gate, conjugating through adjacent SWAPs
/// when the operands are reversed or non-adjacent.
pub fn full_matrix(op: &GateOp, qubits: usize) -> Result<CMat, SolveError> {
    let dim = 1usize << qubits;
    let base = base_matrix(op).ok_or(SolveError::GateAfterMeasurement)?;

    let operands = op.operands();
    let full = match operands.as_slice() {
        [q] => identity_pad(&base, *q, qubits),
        // A repeated wire would make the bubbling loop below walk the
        // swap cursor off the end of the order permutation.
        [a, b] if a == b => return Err(SolveError::RepeatedGateOperand(*a)),
        [a, b] if *b == *a + 1 => identity_pad(&base, *a, qubits),
        [a, b] => {
            // Bubble wire `b` next to wire `a` with adjacent swaps,
            // apply the padded gate there, then undo the swaps.
            let mut order: Vec<usize> = (0..qubits).collect();
            let mut swaps: Vec<usize> = Vec::new();
            let pos_of = |order: &[usize], wire: usize| {
                order.iter().position(|&w| w == wire).unwrap_or(0)
            };
            while pos_of(&order, *b) != pos_of(&order, *a) + 1 {
                let pb = pos_of(&order, *b);
                let pa = pos_of(&order, *a);
                let at = if pb > pa + 1 { pb - 1 } else { pb };
                order.swap(at, at + 1);
                swaps.push(at);
            }
            let swap_full: Vec<CMat> = swaps
                .iter()
                .map(|&at| identity_pad(&swap_matrix(), at, qubits))
                .collect();
            let mut network = identity(dim);
            for s in &swap_full {
                network = mat_mul(s, &network);
            }
            let padded = identity_pad(&base, pos_of(&order, *a), qubits);
            let mut out = mat_mul(&padded, &network);
            // Adjacent swaps are self-inverse; undo in reverse order.
            for s in swap_full.iter().rev() {
                out = mat_mul(s, &out);
            }
            out
        }
        _ => return Err(SolveError::GateAfterMeasurement),
    };

    if full.len() != dim || full.iter().any(|row| row.len() != dim) {
        return Err(SolveError::MatrixShape {
            expected: dim,
            got: full.len(),
        });
    }
    Ok(full)
}

/// Apply a full matrix to a state vector.
pub fn apply(matrix: &CMat, state: &[Complex64]) -> Vec<Complex64> {
    matrix
        .iter()
        .map(|row| row.iter().zip(state).map(|(m, s)| m * s).sum())
        .collect()
}
