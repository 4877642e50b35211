//! The externally visible outcome of an exploration run.

use std::collections::BTreeSet;

use num_complex::Complex64;
use serde::Serialize;

use crate::program::Expected;

/// A concrete input value as recorded in the run log.
#[derive(Debug, Clone, Serialize)]
pub enum RecordedValue {
    #[serde(rename = "int")]
    Int(i64),
    #[serde(rename = "state")]
    State(Vec<Complex64>),
}

/// One accepted execution: the input snapshot that drove it and the
/// return value it produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub inputs: Vec<(String, RecordedValue)>,
    pub return_value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "pass")]
    Pass,
    #[serde(rename = "fail")]
    Fail,
}

/// Full report for one exploration.
#[derive(Debug, Serialize)]
pub struct ExplorationReport {
    pub program: String,
    pub iterations: usize,
    pub runs: Vec<RunRecord>,
    pub return_values: Vec<i64>,
    pub verdict: Verdict,
    /// Nodes in the final constraint tree, root included.
    pub tree_nodes: usize,
    /// Branches still queued when exploration stopped.
    pub pending_branches: usize,
}

impl ExplorationReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// Judge observed return values against the declared expectation: bag
/// expectations compare with multiplicity, set expectations by distinct
/// values only.
pub fn judge(observed: &[i64], expected: &Expected) -> Verdict {
    let ok = match expected {
        Expected::Bag(bag) => {
            let mut got = observed.to_vec();
            let mut want = bag.clone();
            got.sort_unstable();
            want.sort_unstable();
            got == want
        }
        Expected::Set(set) => {
            let got: BTreeSet<i64> = observed.iter().copied().collect();
            got == *set
        }
    };
    if ok {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_verdict_counts_multiplicity() {
        let expected = Expected::bag([0, 1, 2]);
        assert_eq!(judge(&[0, 0, 1], &expected), Verdict::Fail);
        assert_eq!(judge(&[0, 1, 1], &expected), Verdict::Fail);
        assert_eq!(judge(&[2, 0, 1], &expected), Verdict::Pass);
    }

    #[test]
    fn set_verdict_ignores_repeats_and_order() {
        let expected = Expected::set([0, 1]);
        assert_eq!(judge(&[0, 1, 1], &expected), Verdict::Pass);
        assert_eq!(judge(&[1, 0], &expected), Verdict::Pass);
        assert_eq!(judge(&[0], &expected), Verdict::Fail);
        assert_eq!(judge(&[0, 1, 2], &expected), Verdict::Fail);
    }
}
