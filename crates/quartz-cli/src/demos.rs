//! Built-in target programs.

use quartz_engine::{EngineError, ExecCtx, Expected, InputDecl, TargetProgram};
use quartz_sym::value::{Bindings, SymInt};

/// Two scalar branch decisions, one return value per path.
pub(crate) struct FourPaths;

impl TargetProgram for FourPaths {
    fn name(&self) -> &str {
        "four-paths"
    }

    fn inputs(&self) -> Vec<InputDecl> {
        vec![InputDecl::scalar("in1", 0), InputDecl::scalar("in2", 0)]
    }

    fn invoke(&self, ctx: &mut ExecCtx<'_>, bindings: &mut Bindings) -> Result<i64, EngineError> {
        let in1 = scalar(bindings, "in1")?;
        let in2 = scalar(bindings, "in2")?;
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

/// A scalar branch steering circuit construction, then a
/// measurement-statistics check that decides the return value.
///
/// Covering the `0` and `1` returns needs an input state whose final
/// distribution matches the target within 0.01; the exact strategy can
/// find one, random sampling almost never will.
pub(crate) struct Mixed;

impl TargetProgram for Mixed {
    fn name(&self) -> &str {
        "mixed"
    }

    fn inputs(&self) -> Vec<InputDecl> {
        vec![InputDecl::scalar("x", 0), InputDecl::circuit("qc", 2)]
    }

    fn invoke(&self, ctx: &mut ExecCtx<'_>, bindings: &mut Bindings) -> Result<i64, EngineError> {
        let x = scalar(bindings, "x")?;
        let qc = bindings
            .get_mut("qc")
            .and_then(|v| v.as_circuit_mut())
            .ok_or_else(|| EngineError::Contract("circuit input `qc` missing".into()))?;

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
        Expected::set([0, 1, 2, 3])
    }
}

fn scalar(bindings: &Bindings, name: &str) -> Result<SymInt, EngineError> {
    bindings
        .get(name)
        .and_then(|v| v.as_int())
        .cloned()
        .ok_or_else(|| EngineError::Contract(format!("scalar input `{name}` missing")))
}

pub(crate) fn lookup(name: &str) -> Option<Box<dyn TargetProgram>> {
    match name {
        "four-paths" => Some(Box::new(FourPaths)),
        "mixed" => Some(Box::new(Mixed)),
        _ => None,
    }
}

pub(crate) fn catalog() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "four-paths",
            "two scalar branches, four reachable return values",
        ),
        (
            "mixed",
            "scalar branch into a 2-qubit circuit with a distribution check",
        ),
    ]
}
