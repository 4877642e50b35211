//! External-prover driver for the nonlinear amplitude problems.
//!
//! The problem is serialized to a temporary `.smt2` file and handed to
//! a prover binary (dreal or z3) as its single argument. The child is
//! polled against a wall-clock deadline and killed when it overruns;
//! a timeout is reported as its own outcome so the caller can abandon
//! the branch instead of treating it as an error.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use num_complex::Complex64;
use tracing::{debug, warn};

use crate::quantum::encoder::QuantumProblem;
use crate::smtlib::render_problem;
use crate::SolveError;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// What the prover said about one problem.
#[derive(Debug, Clone, PartialEq)]
pub enum ProverOutcome {
    /// Satisfiable, with the decoded step-0 amplitude vector.
    Model(Vec<Complex64>),
    Unsat,
    /// The deadline elapsed before the prover answered.
    Timeout,
}

/// Configuration for one external prover invocation.
#[derive(Debug, Clone)]
pub struct ExternalProver {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Keep a copy of every emitted problem here for inspection.
    pub dump_path: Option<PathBuf>,
}

impl ExternalProver {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        ExternalProver {
            command: command.into(),
            args: Vec::new(),
            timeout,
            dump_path: None,
        }
    }

    pub fn solve(&self, problem: &QuantumProblem) -> Result<ProverOutcome, SolveError> {
        let text = render_problem("QF_NRA", &problem.declarations, &problem.assertions);

        let mut file = tempfile::Builder::new()
            .prefix("quartz-")
            .suffix(".smt2")
            .tempfile()?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        if let Some(dump) = &self.dump_path {
            std::fs::write(dump, &text)?;
            debug!(path = %dump.display(), "dumped amplitude problem");
        }

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg(file.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SolveError::External {
                command: self.command.clone(),
                reason: e.to_string(),
            })?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait()? {
                Some(_) => break,
                None if Instant::now() >= deadline => {
                    warn!(command = %self.command, timeout = ?self.timeout, "prover timed out");
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok(ProverOutcome::Timeout);
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        }

        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let verdict = stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default();

        if verdict.contains("unsat") {
            return Ok(ProverOutcome::Unsat);
        }
        // "sat", or dreal's "delta-sat with delta = ...".
        if !(verdict.starts_with("sat") || verdict.starts_with("delta-sat")) {
            return Err(SolveError::External {
                command: self.command.clone(),
                reason: format!(
                    "unexpected verdict `{verdict}`: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let dim = 1usize << problem.qubits;
        let model = parse_model(&stdout);
        let state = (0..dim)
            .map(|i| {
                let re = lookup(&model, &format!("psi_0_{i}_re"));
                let im = lookup(&model, &format!("psi_0_{i}_im"));
                Complex64::new(re, im)
            })
            .collect();
        Ok(ProverOutcome::Model(state))
    }
}

/// Unconstrained variables may be absent from the model; they can take
/// any value, zero included.
fn lookup(model: &[(String, f64)], name: &str) -> f64 {
    model
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| *v)
        .unwrap_or(0.0)
}

/// Pull `(define-fun name () Real value)` entries out of z3-style model
/// output, and `name : [lo, hi]` interval lines out of dreal's.
pub fn parse_model(stdout: &str) -> Vec<(String, f64)> {
    let mut out = Vec::new();
    let flat: String = stdout.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut rest = flat.as_str();
    while let Some(at) = rest.find("(define-fun ") {
        rest = &rest[at + "(define-fun ".len()..];
        let Some(name_end) = rest.find(' ') else { break };
        let name = rest[..name_end].to_string();
        rest = &rest[name_end..];
        // Skip the empty parameter list and the sort.
        let Some(sort_at) = rest.find("Real ") else { continue };
        rest = &rest[sort_at + "Real ".len()..];
        let (value, tail) = take_sexpr(rest);
        rest = tail;
        if let Some(v) = parse_real(value) {
            out.push((name, v));
        }
    }

    // dreal model lines: `psi_0_0_re : [ -0.5, -0.5 ]`.
    for line in stdout.lines() {
        let Some((name, range)) = line.split_once(" : ") else {
            continue;
        };
        let name = name.trim().trim_start_matches('|').trim_end_matches('|');
        let range = range.trim().trim_start_matches('[').trim_end_matches(']');
        let bounds: Vec<f64> = range
            .split(',')
            .filter_map(|b| b.trim().parse::<f64>().ok())
            .collect();
        if let (false, Some(&lo)) = (name.contains(' '), bounds.first()) {
            let hi = *bounds.last().unwrap_or(&lo);
            out.push((name.to_string(), (lo + hi) / 2.0));
        }
    }

    out
}

/// Split off one balanced s-expression (or one atom) from the front.
fn take_sexpr(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    if !text.starts_with('(') {
        let end = text
            .find(|c: char| c.is_whitespace() || c == ')')
            .unwrap_or(text.len());
        return (&text[..end], &text[end..]);
    }
    let mut depth = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return (&text[..=i], &text[i + 1..]);
                }
            }
            _ => {}
        }
    }
    (text, "")
}

/// Model values arrive as plain decimals, `(- x)` negations, or
/// `(/ num den)` rationals, possibly nested.
fn parse_real(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix("(- ").and_then(|t| t.strip_suffix(')')) {
        return parse_real(inner).map(|v| -v);
    }
    if let Some(inner) = text.strip_prefix("(/ ").and_then(|t| t.strip_suffix(')')) {
        let (num, den) = take_sexpr(inner);
        let num = parse_real(num)?;
        let den = parse_real(den.trim())?;
        return Some(num / den);
    }
    text.trim_end_matches('?').parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_z3_style_models() {
        let stdout = "sat\n(\n  (define-fun psi_0_0_re () Real 0.5)\n  (define-fun psi_0_0_im () Real (- 0.25))\n  (define-fun psi_0_1_re () Real (/ 3.0 4.0))\n)\n";
        let model = parse_model(stdout);
        assert_eq!(lookup(&model, "psi_0_0_re"), 0.5);
        assert_eq!(lookup(&model, "psi_0_0_im"), -0.25);
        assert_eq!(lookup(&model, "psi_0_1_re"), 0.75);
    }

    #[test]
    fn parses_nested_negated_rationals() {
        assert_eq!(parse_real("(- (/ 1.0 2.0))"), Some(-0.5));
        assert_eq!(parse_real("(/ (- 1.0) 4.0)"), Some(-0.25));
    }

    #[test]
    fn parses_dreal_interval_lines() {
        let stdout = "delta-sat with delta = 0.001\npsi_0_0_re : [ 0.70710, 0.70711 ]\npsi_0_0_im : [ -0.0001, 0.0001 ]\n";
        let model = parse_model(stdout);
        let re = lookup(&model, "psi_0_0_re");
        assert!((re - 0.707105).abs() < 1e-6);
        assert!(lookup(&model, "psi_0_0_im").abs() < 1e-3);
    }

    #[test]
    fn missing_variables_default_to_zero() {
        assert_eq!(lookup(&[], "psi_0_3_im"), 0.0);
    }

    #[test]
    fn balanced_sexpr_splitting() {
        let (head, tail) = take_sexpr("(- (/ 1 2)) rest");
        assert_eq!(head, "(- (/ 1 2))");
        assert_eq!(tail.trim(), "rest");
        let (head, _) = take_sexpr("42) trailing");
        assert_eq!(head, "42");
    }

    // Needs a dreal or z3 binary on PATH.
    #[test]
    #[ignore]
    fn solves_a_hadamard_problem_with_a_real_prover() {
        use crate::quantum::encoder::{encode, ProbCmp};
        use quartz_sym::circuit::GateOp;

        let problem = encode(1, &[GateOp::H(0)], ProbCmp::Eq, &[0.5, 0.5], &[]).unwrap();
        let prover = ExternalProver::new("z3", Duration::from_secs(30));
        match prover.solve(&problem).unwrap() {
            ProverOutcome::Model(state) => {
                let norm: f64 = state.iter().map(|a| a.norm_sqr()).sum();
                assert!((norm - 1.0).abs() < 1e-6);
            }
            other => panic!("expected a model, got {other:?}"),
        }
    }
}
