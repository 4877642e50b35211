//! End-to-end exploration over small instrumented programs.

use quartz_engine::{
    EngineConfig, EngineError, ExecCtx, Expected, ExplorationEngine, InputDecl, TargetProgram,
    Verdict,
};
use quartz_sym::value::{Bindings, SymInt};

fn int(bindings: &Bindings, name: &str) -> SymInt {
    bindings
        .get(name)
        .and_then(|v| v.as_int())
        .cloned()
        .unwrap_or_else(|| panic!("missing int input {name}"))
}

/// Four paths over two scalar inputs, returning 0..=3.
struct FourPaths;

impl TargetProgram for FourPaths {
    fn name(&self) -> &str {
        "four_paths"
    }

    fn inputs(&self) -> Vec<InputDecl> {
        vec![InputDecl::scalar("in1", 0), InputDecl::scalar("in2", 0)]
    }

    fn invoke(&self, ctx: &mut ExecCtx<'_>, bindings: &mut Bindings) -> Result<i64, EngineError> {
        let in1 = int(bindings, "in1");
        let in2 = int(bindings, "in2");
        let high = ctx.branch(in1.gt(&SymInt::literal(10)))?;
        let wide = ctx.branch(in2.gt(&SymInt::literal(20)))?;
        Ok(match (high, wide) {
            (true, true) => 3,
            (true, false) => 2,
            (false, true) => 1,
            (false, false) => 0,
        })
    }

    fn expected(&self) -> Expected {
        Expected::set([0, 1, 2, 3])
    }
}

/// One branch over a derived expression: (x + 7) * 2 == 20.
struct Derived;

impl TargetProgram for Derived {
    fn name(&self) -> &str {
        "derived"
    }

    fn inputs(&self) -> Vec<InputDecl> {
        vec![InputDecl::scalar("x", 0)]
    }

    fn invoke(&self, ctx: &mut ExecCtx<'_>, bindings: &mut Bindings) -> Result<i64, EngineError> {
        let x = int(bindings, "x");
        let lhs = x.add(&SymInt::literal(7))?.mul(&SymInt::literal(2))?;
        if ctx.branch(lhs.eq(&SymInt::literal(20)))? {
            Ok(1)
        } else {
            Ok(0)
        }
    }

    fn expected(&self) -> Expected {
        Expected::set([0, 1])
    }
}

/// Branches on an input it never declared.
struct Undeclared;

impl TargetProgram for Undeclared {
    fn name(&self) -> &str {
        "undeclared"
    }

    fn inputs(&self) -> Vec<InputDecl> {
        vec![InputDecl::scalar("x", 0)]
    }

    fn invoke(&self, ctx: &mut ExecCtx<'_>, _bindings: &mut Bindings) -> Result<i64, EngineError> {
        let ghost = SymInt::input("ghost", 0);
        if ctx.branch(ghost.gt(&SymInt::literal(5)))? {
            Ok(1)
        } else {
            Ok(0)
        }
    }

    fn expected(&self) -> Expected {
        Expected::set([0, 1])
    }
}

/// A scalar branch feeding into a measurement-statistics check on a
/// two-qubit circuit input.
struct Mixed;

impl TargetProgram for Mixed {
    fn name(&self) -> &str {
        "mixed"
    }

    fn inputs(&self) -> Vec<InputDecl> {
        vec![InputDecl::scalar("x", 0), InputDecl::circuit("qc", 2)]
    }

    fn invoke(&self, ctx: &mut ExecCtx<'_>, bindings: &mut Bindings) -> Result<i64, EngineError> {
        let x = int(bindings, "x");
        let qc = bindings
            .get_mut("qc")
            .and_then(|v| v.as_circuit_mut())
            .expect("circuit input");
        let mut a = 0i64;
        qc.h(0)?;
        qc.z(0)?;
        if ctx.branch(x.gt(&SymInt::literal(50)))? {
            qc.h(1)?;
            qc.cx(0, 1)?;
            a += 1;
        }
        if ctx.check_state_eq(qc, &[0.25, 0.2, 0.2, 0.35], 0.01)? {
            Ok(a)
        } else {
            Ok(a + 2)
        }
    }

    fn expected(&self) -> Expected {
        // The zeroed seed state misses the target distribution on both
        // sides of the scalar branch.
        Expected::set([2, 3])
    }
}

fn quick_config() -> EngineConfig {
    EngineConfig {
        max_iterations: 50,
        repeated_times: 1,
        ..EngineConfig::default()
    }
}

#[test]
fn four_paths_are_all_discovered() {
    let program = FourPaths;
    let report = ExplorationEngine::new(&program, quick_config())
        .run()
        .expect("exploration");
    assert_eq!(report.verdict, Verdict::Pass);
    for v in 0..4 {
        assert!(report.return_values.contains(&v), "missing {v}");
    }
    // Root plus both sides of both decisions along discovered paths.
    assert!(report.tree_nodes >= 5);
    assert_eq!(report.runs.len(), report.return_values.len());
}

#[test]
fn termination_does_not_require_an_empty_queue() {
    let program = FourPaths;
    let report = ExplorationEngine::new(&program, quick_config())
        .run()
        .expect("exploration");
    // Coverage of the expected set stops the drain; sibling nodes may
    // still be waiting.
    assert_eq!(report.verdict, Verdict::Pass);
    assert!(report.iterations <= 5);
}

#[test]
fn solver_handles_derived_expressions() {
    let program = Derived;
    let report = ExplorationEngine::new(&program, quick_config())
        .run()
        .expect("exploration");
    assert_eq!(report.verdict, Verdict::Pass);
    // The flipped branch needs x == 3 exactly.
    let hit = report
        .runs
        .iter()
        .find(|r| r.return_value == 1)
        .expect("equality path");
    let x = hit
        .inputs
        .iter()
        .find(|(name, _)| name == "x")
        .map(|(_, v)| v);
    match x {
        Some(quartz_engine::RecordedValue::Int(3)) => {}
        other => panic!("expected x == 3 on the equality path, got {other:?}"),
    }
}

#[test]
fn iteration_cap_cuts_exploration_short() {
    let program = FourPaths;
    let config = EngineConfig {
        max_iterations: 1,
        ..quick_config()
    };
    let report = ExplorationEngine::new(&program, config)
        .run()
        .expect("exploration");
    assert_eq!(report.iterations, 1);
    assert_eq!(report.verdict, Verdict::Fail);
    assert_eq!(report.return_values, vec![0]);
}

#[test]
fn undeclared_branch_variable_is_a_contract_error() {
    let program = Undeclared;
    let err = ExplorationEngine::new(&program, quick_config())
        .run()
        .expect_err("contract violation");
    assert!(matches!(err, EngineError::Contract(_)), "got {err}");
}

#[test]
fn mixed_program_covers_both_scalar_sides() {
    let program = Mixed;
    let report = ExplorationEngine::new(&program, quick_config())
        .run()
        .expect("exploration");
    assert_eq!(report.verdict, Verdict::Pass);
    assert!(report.return_values.contains(&2));
    assert!(report.return_values.contains(&3));
    // Input snapshots carry the amplitude vector alongside the scalar.
    let first = &report.runs[0];
    assert!(first
        .inputs
        .iter()
        .any(|(name, v)| name == "qc" && matches!(v, quartz_engine::RecordedValue::State(_))));
}

#[test]
fn reports_serialize_to_json() {
    let program = FourPaths;
    let report = ExplorationEngine::new(&program, quick_config())
        .run()
        .expect("exploration");
    let json = serde_json::to_string_pretty(&report).expect("serialize");
    assert!(json.contains("\"verdict\": \"pass\""));
    assert!(json.contains("\"return_values\""));
}
