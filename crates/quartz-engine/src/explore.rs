//! The exploration loop: execute, drain, solve, re-execute.

use std::collections::VecDeque;

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use quartz_sym::circuit::SymCircuit;
use quartz_sym::predicate::Predicate;
use quartz_sym::recorder::PathRecorder;
use quartz_sym::tree::NodeId;
use quartz_sym::value::{Bindings, Expr, SymInt, SymValue};
use quartz_smt::classical::ClassicalSolver;
use quartz_smt::quantum::{QuantumSolver, QuantumStrategy};

use crate::backend::{CircuitBackend, StateVectorSim};
use crate::program::{ExecCtx, InputDecl, InputKind, TargetProgram};
use crate::result::{judge, ExplorationReport, RecordedValue, RunRecord};
use crate::EngineError;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard cap on executions; 0 means unlimited.
    pub max_iterations: usize,
    /// How many times one input is re-run to let probabilistic output
    /// surface; the run stops early once a new return value appears.
    pub repeated_times: usize,
    /// Measurement shots per state check; 0 uses exact probabilities.
    pub shots: usize,
    pub quantum_strategy: QuantumStrategy,
    /// Warn when a re-execution diverges from the branch it was solved
    /// to reach.
    pub replay_diagnostics: bool,
    /// Classical solver timeout; 0 disables it.
    pub solver_timeout_secs: u64,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_iterations: 0,
            repeated_times: 10,
            shots: 0,
            quantum_strategy: QuantumStrategy::Random,
            replay_diagnostics: false,
            solver_timeout_secs: 0,
            seed: 0,
        }
    }
}

/// Drives one target program to completion.
pub struct ExplorationEngine<'p> {
    program: &'p dyn TargetProgram,
    config: EngineConfig,
    recorder: PathRecorder,
    backend: Box<dyn CircuitBackend>,
    classical: ClassicalSolver,
    quantum: QuantumSolver,
    rng: StdRng,
    queue: VecDeque<NodeId>,
    observed: Vec<i64>,
    runs: Vec<RunRecord>,
}

impl<'p> ExplorationEngine<'p> {
    pub fn new(program: &'p dyn TargetProgram, config: EngineConfig) -> Self {
        let backend = Box::new(StateVectorSim::seeded(config.seed));
        Self::with_backend(program, config, backend)
    }

    pub fn with_backend(
        program: &'p dyn TargetProgram,
        config: EngineConfig,
        backend: Box<dyn CircuitBackend>,
    ) -> Self {
        let classical = if config.solver_timeout_secs > 0 {
            ClassicalSolver::with_timeout_secs(config.solver_timeout_secs)
        } else {
            ClassicalSolver::new()
        };
        ExplorationEngine {
            program,
            recorder: PathRecorder::new(config.replay_diagnostics),
            backend,
            classical,
            quantum: QuantumSolver::new(config.quantum_strategy.clone()),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            queue: VecDeque::new(),
            observed: Vec::new(),
            runs: Vec::new(),
        }
    }

    /// Run to a termination condition and report.
    pub fn run(&mut self) -> Result<ExplorationReport, EngineError> {
        let decls = self.program.inputs();
        if decls.is_empty() {
            return Err(EngineError::Config(
                "target program declares no inputs".into(),
            ));
        }
        let circuit_input = circuit_input_name(&decls)?;
        let expected_values = self.program.expected().value_set();
        let started = std::time::Instant::now();

        let mut iterations = 1usize;
        self.one_execution(initial_bindings(&decls)?, None)?;

        loop {
            if self.capped(iterations) || self.covered(&expected_values) {
                break;
            }
            let Some(id) = self.queue.pop_front() else {
                break;
            };
            if self.recorder.tree().node(id).processed {
                continue;
            }
            self.recorder.tree_mut().node_mut(id).processed = true;

            let Some(mut bindings) = self.recorder.tree().node(id).inputs.clone() else {
                continue;
            };
            let asserts = self.recorder.tree().ancestors_predicates(id);
            let Some(query) = self.recorder.tree().node(id).predicate.clone() else {
                continue;
            };

            let vars = query.variables();
            for v in &vars {
                if !decls.iter().any(|d| d.name == *v) {
                    return Err(EngineError::Contract(format!(
                        "branch condition references undeclared input `{v}`"
                    )));
                }
            }

            let quantum_query =
                vars.len() == 1 && circuit_input.as_ref() == Some(&vars[0]);
            let solved = if quantum_query {
                self.solve_quantum(id, &query, &mut bindings)?
            } else {
                self.solve_classical(&asserts, &query, &mut bindings)?
            };
            if !solved {
                // Unsatisfiable flip under the current ancestors.
                debug!(node = id.0, "branch refuted, dropping");
                continue;
            }

            self.one_execution(bindings, Some(id))?;
            iterations += 1;
        }

        let verdict = judge(&self.observed, &self.program.expected());
        info!(
            program = self.program.name(),
            iterations,
            solved_branches = iterations - 1,
            returns = ?self.observed,
            ?verdict,
            elapsed = ?started.elapsed(),
            "exploration finished"
        );
        Ok(ExplorationReport {
            program: self.program.name().to_string(),
            iterations,
            runs: std::mem::take(&mut self.runs),
            return_values: self.observed.clone(),
            verdict,
            tree_nodes: self.recorder.tree().len(),
            pending_branches: self.queue.len(),
        })
    }

    fn capped(&self, iterations: usize) -> bool {
        self.config.max_iterations != 0 && iterations >= self.config.max_iterations
    }

    fn covered(&self, expected: &std::collections::BTreeSet<i64>) -> bool {
        expected.iter().all(|v| self.observed.contains(v))
    }

    /// Execute once (repeating for probabilistic programs), feeding new
    /// branch nodes into the queue.
    fn one_execution(
        &mut self,
        bindings: Bindings,
        expected_node: Option<NodeId>,
    ) -> Result<(), EngineError> {
        let reps = self.config.repeated_times.max(1);
        let mut last_return = 0i64;
        let mut recorded: Bindings = bindings.clone();

        for rep in 0..reps {
            let mut run = bindings.clone();
            for value in run.values_mut() {
                if let Some(qc) = value.as_circuit_mut() {
                    qc.clear_gates();
                }
            }
            // Replay diagnostics only make sense against the first run.
            let target = if rep == 0 { expected_node } else { None };
            self.recorder.reset(run.clone(), target);

            let mut ctx = ExecCtx::new(&mut self.recorder, self.backend.as_mut(), self.config.shots);
            last_return = self.program.invoke(&mut ctx, &mut run)?;
            self.queue.extend(self.recorder.take_created());
            recorded = run;

            if !self.observed.contains(&last_return) {
                // A value no earlier run produced: the candidate input
                // did something new, so stop resampling and forget the
                // states this node previously rejected.
                if let Some(node) = expected_node {
                    self.recorder.tree_mut().node_mut(node).unaccepted_results.clear();
                }
                break;
            }
        }

        self.observed.push(last_return);
        self.runs.push(RunRecord {
            inputs: recorded
                .iter()
                .map(|(name, value)| (name.clone(), record_value(value)))
                .collect(),
            return_value: last_return,
        });
        Ok(())
    }

    fn solve_classical(
        &mut self,
        asserts: &[Predicate],
        query: &Predicate,
        bindings: &mut Bindings,
    ) -> Result<bool, EngineError> {
        let Some(model) = self.classical.find_counterexample(asserts, query)? else {
            return Ok(false);
        };
        for (name, value) in model {
            bindings.insert(name.clone(), SymValue::Int(SymInt::input(name, value)));
        }
        Ok(true)
    }

    fn solve_quantum(
        &mut self,
        id: NodeId,
        query: &Predicate,
        bindings: &mut Bindings,
    ) -> Result<bool, EngineError> {
        let (name, qubits, gates, op, target) = match query.expr.as_ref() {
            Expr::Op { op, args } if args.len() == 2 => {
                match (args[0].as_ref(), args[1].as_ref()) {
                    (Expr::Circuit { input, gates }, Expr::Probs(target)) => {
                        let qubits = bindings
                            .get(input)
                            .and_then(|v| v.as_circuit())
                            .map(|qc| qc.qubits())
                            .ok_or_else(|| {
                                EngineError::Contract(format!(
                                    "circuit input `{input}` missing from binding snapshot"
                                ))
                            })?;
                        (input.clone(), qubits, gates.clone(), *op, target.clone())
                    }
                    _ => {
                        return Err(EngineError::Contract(format!(
                            "malformed circuit comparison: {}",
                            query.expr
                        )))
                    }
                }
            }
            other => {
                return Err(EngineError::Contract(format!(
                    "malformed circuit comparison: {other}"
                )))
            }
        };

        let unaccepted = self.recorder.tree().node(id).unaccepted_results.clone();
        let Some(state) = self.quantum.solve(
            qubits,
            &gates,
            op,
            query.outcome,
            &target,
            &unaccepted,
            &mut self.rng,
        )?
        else {
            return Ok(false);
        };

        // Remember the candidate so a later visit to this node asks for
        // a different one.
        self.recorder
            .tree_mut()
            .node_mut(id)
            .unaccepted_results
            .push(state.clone());
        if state.iter().map(|a| a.norm_sqr()).sum::<f64>() < 1e-12 {
            warn!(node = id.0, "solver produced a zero state, skipping");
            return Ok(false);
        }
        bindings.insert(
            name.clone(),
            SymValue::Circuit(SymCircuit::input(name, qubits, state)?),
        );
        Ok(true)
    }
}

fn circuit_input_name(decls: &[InputDecl]) -> Result<Option<String>, EngineError> {
    let mut found = None;
    for d in decls {
        if let InputKind::Circuit { .. } = d.kind {
            if found.is_some() {
                return Err(EngineError::Config(
                    "at most one circuit input is supported".into(),
                ));
            }
            found = Some(d.name.clone());
        }
    }
    Ok(found)
}

fn initial_bindings(decls: &[InputDecl]) -> Result<Bindings, EngineError> {
    let mut bindings = Bindings::new();
    for d in decls {
        let value = match &d.kind {
            InputKind::Scalar { seed } => SymValue::Int(SymInt::input(&d.name, *seed)),
            InputKind::Circuit { qubits } => {
                SymValue::Circuit(SymCircuit::zeroed(&d.name, *qubits))
            }
        };
        if bindings.insert(d.name.clone(), value).is_some() {
            return Err(EngineError::Config(format!(
                "duplicate input declaration `{}`",
                d.name
            )));
        }
    }
    Ok(bindings)
}

fn record_value(value: &SymValue) -> RecordedValue {
    match value {
        SymValue::Int(v) => RecordedValue::Int(v.value),
        SymValue::Circuit(qc) => RecordedValue::State(qc.state.clone()),
    }
}
