//! The classical counterexample backend.
//!
//! Given the ancestor constraints of a tree node ("asserts") and the
//! node's own predicate ("query"), find integer inputs that keep every
//! assert at its observed outcome while flipping the query to the side
//! concrete execution has not taken yet. Runs Z3 in-process.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};
use z3::SatResult as Z3SatResult;

use quartz_sym::predicate::Predicate;
use quartz_sym::value::{Expr, OpKind};

use crate::SolveError;

/// A classical model: solved value per named integer input.
pub type ClassicalModel = BTreeMap<String, i64>;

pub struct ClassicalSolver {
    solver: z3::Solver,
    vars: HashMap<String, z3::ast::Int>,
}

impl ClassicalSolver {
    pub fn new() -> Self {
        ClassicalSolver {
            solver: z3::Solver::new(),
            vars: HashMap::new(),
        }
    }

    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        let solver = z3::Solver::new();
        if timeout_secs > 0 {
            let mut params = z3::Params::new();
            params.set_u32("timeout", timeout_secs.saturating_mul(1000) as u32);
            solver.set_params(&params);
        }
        ClassicalSolver {
            solver,
            vars: HashMap::new(),
        }
    }

    /// Find values satisfying every assert at its observed outcome and
    /// the query at the *negation* of its observed outcome. `None`
    /// means the flipped branch is unreachable under the asserts.
    pub fn find_counterexample(
        &mut self,
        asserts: &[Predicate],
        query: &Predicate,
    ) -> Result<Option<ClassicalModel>, SolveError> {
        self.solver.reset();
        self.vars.clear();

        for p in asserts {
            let cond = self.translate_bool(&p.expr)?;
            self.solver
                .assert(&if p.outcome { cond } else { cond.not() });
        }
        let q = self.translate_bool(&query.expr)?;
        self.solver.assert(&if query.outcome { q.not() } else { q });

        match self.solver.check() {
            Z3SatResult::Sat => {
                let model = self
                    .solver
                    .get_model()
                    .ok_or_else(|| SolveError::Z3("sat but no model available".into()))?;
                let mut values = ClassicalModel::new();
                for (name, var) in &self.vars {
                    if let Some(val) = model.eval::<z3::ast::Int>(var, true) {
                        if let Some(n) = val.as_i64() {
                            values.insert(name.clone(), n);
                        }
                    }
                }
                debug!(?values, "classical counterexample found");
                Ok(Some(values))
            }
            Z3SatResult::Unsat => Ok(None),
            Z3SatResult::Unknown => {
                // Usually an in-process timeout. The branch is abandoned
                // like an unsat one, so coverage quietly shrinks unless
                // the operator is told.
                warn!(query = %query.expr, "z3 returned unknown; abandoning branch");
                Ok(None)
            }
        }
    }

    fn lookup_var(&mut self, name: &str) -> z3::ast::Int {
        self.vars
            .entry(name.to_string())
            .or_insert_with(|| z3::ast::Int::new_const(name))
            .clone()
    }

    fn translate_bool(&mut self, expr: &Expr) -> Result<z3::ast::Bool, SolveError> {
        match expr {
            Expr::Op { op, args } if op.is_comparison() && args.len() == 2 => {
                let l = self.translate_int(&args[0])?;
                let r = self.translate_int(&args[1])?;
                Ok(match op {
                    OpKind::Eq => l.eq(&r),
                    OpKind::Ne => l.eq(&r).not(),
                    OpKind::Lt => l.lt(&r),
                    OpKind::Le => l.le(&r),
                    OpKind::Gt => l.gt(&r),
                    OpKind::Ge => l.ge(&r),
                    _ => unreachable!("is_comparison checked above"),
                })
            }
            other => Err(SolveError::UnsupportedExpression(format!(
                "expected comparison at predicate root, got {other}"
            ))),
        }
    }

    fn translate_int(&mut self, expr: &Expr) -> Result<z3::ast::Int, SolveError> {
        match expr {
            Expr::Var(name) => Ok(self.lookup_var(name)),
            Expr::Int(v) => Ok(z3::ast::Int::from_i64(*v)),
            Expr::Op { op, args } if args.len() == 2 => {
                if op.is_comparison() {
                    // A comparison used as an arithmetic operand.
                    let b = self.translate_bool(expr)?;
                    return Ok(b.ite(&z3::ast::Int::from_i64(1), &z3::ast::Int::from_i64(0)));
                }
                let l = self.translate_int(&args[0])?;
                let r = self.translate_int(&args[1])?;
                Ok(match op {
                    OpKind::Add => &l + &r,
                    OpKind::Sub => &l - &r,
                    OpKind::Mul => &l * &r,
                    OpKind::Div => truncating_div(&l, &r),
                    OpKind::Rem => {
                        let d = truncating_div(&l, &r);
                        &l - &(&r * &d)
                    }
                    OpKind::BitAnd | OpKind::BitOr | OpKind::BitXor | OpKind::Shl
                    | OpKind::Shr => {
                        let lb = z3::ast::BV::from_int(&l, 64);
                        let rb = z3::ast::BV::from_int(&r, 64);
                        let bv = match op {
                            OpKind::BitAnd => lb.bvand(&rb),
                            OpKind::BitOr => lb.bvor(&rb),
                            OpKind::BitXor => lb.bvxor(&rb),
                            OpKind::Shl => lb.bvshl(&rb),
                            OpKind::Shr => lb.bvashr(&rb),
                            _ => unreachable!(),
                        };
                        bv.to_int(true)
                    }
                    _ => unreachable!("comparisons handled above"),
                })
            }
            Expr::Circuit { .. } | Expr::Probs(_) => Err(SolveError::UnsupportedExpression(
                "circuit term dispatched to the classical backend".into(),
            )),
            other => Err(SolveError::UnsupportedExpression(format!("{other}"))),
        }
    }
}

/// Z3's integer division is Euclidean while `i64` truncates toward
/// zero. They agree for a non-negative dividend or an exact quotient;
/// otherwise the Euclidean quotient is one step further from zero.
fn truncating_div(l: &z3::ast::Int, r: &z3::ast::Int) -> z3::ast::Int {
    let zero = z3::ast::Int::from_i64(0);
    let one = z3::ast::Int::from_i64(1);
    let e = l / r;
    let m = l % r;
    let bumped = r.gt(&zero).ite(&(&e + &one), &(&e - &one));
    l.ge(&zero).ite(&e, &m.eq(&zero).ite(&e, &bumped))
}

impl Default for ClassicalSolver {
    fn default() -> Self {
        Self::new()
    }
}
