//! Tagged concrete+symbolic values and the expression trees behind them.
//!
//! A [`SymInt`] is composition, not coercion: a concrete `i64` payload
//! next to the [`Expr`] that produced it. Arithmetic combinators keep
//! the two in lockstep — the concrete field of a derived value is
//! always the operator applied to the operands' concrete fields.
//! Expression subtrees are immutable and shared via `Rc` once built.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::circuit::{GateOp, SymCircuit};
use crate::SymError;

/// Operator tags for derived expressions.
///
/// One static table instead of generated methods: each tag knows its
/// concrete evaluation and its printable symbol, and dispatch is a
/// plain `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl OpKind {
    pub fn symbol(self) -> &'static str {
        match self {
            OpKind::Add => "+",
            OpKind::Sub => "-",
            OpKind::Mul => "*",
            OpKind::Div => "/",
            OpKind::Rem => "%",
            OpKind::BitAnd => "&",
            OpKind::BitOr => "|",
            OpKind::BitXor => "^",
            OpKind::Shl => "<<",
            OpKind::Shr => ">>",
            OpKind::Eq => "==",
            OpKind::Ne => "!=",
            OpKind::Lt => "<",
            OpKind::Le => "<=",
            OpKind::Gt => ">",
            OpKind::Ge => ">=",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            OpKind::Eq | OpKind::Ne | OpKind::Lt | OpKind::Le | OpKind::Gt | OpKind::Ge
        )
    }

    /// The comparison taking the opposite side of a branch.
    pub fn negated(self) -> OpKind {
        match self {
            OpKind::Eq => OpKind::Ne,
            OpKind::Ne => OpKind::Eq,
            OpKind::Lt => OpKind::Ge,
            OpKind::Ge => OpKind::Lt,
            OpKind::Gt => OpKind::Le,
            OpKind::Le => OpKind::Gt,
            other => other,
        }
    }

    /// Concrete evaluation for arithmetic/bitwise tags.
    pub fn eval(self, lhs: i64, rhs: i64) -> Result<i64, SymError> {
        match self {
            OpKind::Add => Ok(lhs.wrapping_add(rhs)),
            OpKind::Sub => Ok(lhs.wrapping_sub(rhs)),
            OpKind::Mul => Ok(lhs.wrapping_mul(rhs)),
            OpKind::Div => lhs.checked_div(rhs).ok_or(SymError::DivisionByZero),
            OpKind::Rem => lhs.checked_rem(rhs).ok_or(SymError::DivisionByZero),
            OpKind::BitAnd => Ok(lhs & rhs),
            OpKind::BitOr => Ok(lhs | rhs),
            OpKind::BitXor => Ok(lhs ^ rhs),
            OpKind::Shl => Ok(lhs.wrapping_shl(rhs as u32)),
            OpKind::Shr => Ok(lhs.wrapping_shr(rhs as u32)),
            // Comparisons go through `test`, not `eval`.
            _ => Ok((self.test(lhs, rhs)) as i64),
        }
    }

    /// Concrete evaluation for comparison tags.
    pub fn test(self, lhs: i64, rhs: i64) -> bool {
        match self {
            OpKind::Eq => lhs == rhs,
            OpKind::Ne => lhs != rhs,
            OpKind::Lt => lhs < rhs,
            OpKind::Le => lhs <= rhs,
            OpKind::Gt => lhs > rhs,
            OpKind::Ge => lhs >= rhs,
            _ => false,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An expression tree: how a value was derived from the declared inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A named input variable. The concrete seed lives on the owning
    /// value, never on the leaf, so equality is purely by name.
    Var(String),
    /// An integer literal.
    Int(i64),
    /// The circuit-amplitude input with the ordered gate log applied
    /// at the moment the expression was captured.
    Circuit { input: String, gates: Vec<GateOp> },
    /// A literal per-basis-state probability vector.
    Probs(Vec<f64>),
    /// A derived node: operator applied to operand expressions.
    Op { op: OpKind, args: Vec<Rc<Expr>> },
}

impl Expr {
    /// Structural equivalence: operator and shape, names for variables,
    /// values for literals.
    pub fn structural_eq(&self, other: &Expr) -> bool {
        match (self, other) {
            (Expr::Var(a), Expr::Var(b)) => a == b,
            (Expr::Int(a), Expr::Int(b)) => a == b,
            (
                Expr::Circuit { input: a, gates: ga },
                Expr::Circuit { input: b, gates: gb },
            ) => a == b && ga == gb,
            (Expr::Probs(a), Expr::Probs(b)) => a == b,
            (Expr::Op { op: oa, args: aa }, Expr::Op { op: ob, args: ab }) => {
                oa == ob
                    && aa.len() == ab.len()
                    && aa.iter().zip(ab).all(|(x, y)| x.structural_eq(y))
            }
            _ => false,
        }
    }

    /// Free variable names referenced anywhere in the tree.
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match self {
            Expr::Var(name) | Expr::Circuit { input: name, .. } => {
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
            Expr::Op { args, .. } => {
                for a in args {
                    a.collect_variables(names);
                }
            }
            Expr::Int(_) | Expr::Probs(_) => {}
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(name) => f.write_str(name),
            Expr::Int(v) => write!(f, "{v}"),
            Expr::Circuit { input, gates } => {
                write!(f, "{input}[")?;
                for (i, g) in gates.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{g}")?;
                }
                f.write_str("]")
            }
            Expr::Probs(ps) => {
                f.write_str("[")?;
                for (i, p) in ps.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{p}")?;
                }
                f.write_str("]")
            }
            Expr::Op { op, args } => {
                write!(f, "({op}")?;
                for a in args {
                    write!(f, " {a}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A concrete `i64` together with the expression that derived it.
#[derive(Debug, Clone)]
pub struct SymInt {
    pub value: i64,
    pub expr: Rc<Expr>,
}

#[allow(clippy::should_implement_trait)]
impl SymInt {
    /// A named input leaf seeded with a concrete value.
    pub fn input(name: impl Into<String>, value: i64) -> Self {
        SymInt {
            value,
            expr: Rc::new(Expr::Var(name.into())),
        }
    }

    /// A plain literal, compared by value in predicates.
    pub fn literal(value: i64) -> Self {
        SymInt {
            value,
            expr: Rc::new(Expr::Int(value)),
        }
    }

    /// Combine two values under an arithmetic/bitwise operator. The
    /// derived concrete value is the real operator applied to the
    /// operands' concrete values; the expression records the shape.
    pub fn apply(op: OpKind, lhs: &SymInt, rhs: &SymInt) -> Result<SymInt, SymError> {
        debug_assert!(!op.is_comparison());
        Ok(SymInt {
            value: op.eval(lhs.value, rhs.value)?,
            expr: Rc::new(Expr::Op {
                op,
                args: vec![Rc::clone(&lhs.expr), Rc::clone(&rhs.expr)],
            }),
        })
    }

    /// Combine under a comparison operator. Does not fire the branch
    /// hook: only converting the result through `ExecCtx::branch` does.
    pub fn compare(op: OpKind, lhs: &SymInt, rhs: &SymInt) -> SymBool {
        debug_assert!(op.is_comparison());
        SymBool {
            value: op.test(lhs.value, rhs.value),
            expr: Rc::new(Expr::Op {
                op,
                args: vec![Rc::clone(&lhs.expr), Rc::clone(&rhs.expr)],
            }),
        }
    }

    pub fn add(&self, other: &SymInt) -> Result<SymInt, SymError> {
        SymInt::apply(OpKind::Add, self, other)
    }

    pub fn sub(&self, other: &SymInt) -> Result<SymInt, SymError> {
        SymInt::apply(OpKind::Sub, self, other)
    }

    pub fn mul(&self, other: &SymInt) -> Result<SymInt, SymError> {
        SymInt::apply(OpKind::Mul, self, other)
    }

    pub fn eq(&self, other: &SymInt) -> SymBool {
        SymInt::compare(OpKind::Eq, self, other)
    }

    pub fn ne(&self, other: &SymInt) -> SymBool {
        SymInt::compare(OpKind::Ne, self, other)
    }

    pub fn lt(&self, other: &SymInt) -> SymBool {
        SymInt::compare(OpKind::Lt, self, other)
    }

    pub fn le(&self, other: &SymInt) -> SymBool {
        SymInt::compare(OpKind::Le, self, other)
    }

    pub fn gt(&self, other: &SymInt) -> SymBool {
        SymInt::compare(OpKind::Gt, self, other)
    }

    pub fn ge(&self, other: &SymInt) -> SymBool {
        SymInt::compare(OpKind::Ge, self, other)
    }
}

/// A branch condition: concrete boolean plus the comparison expression.
///
/// Converting one of these to `bool` is the sole integration point with
/// the path recorder; the conversion lives on the engine's execution
/// context, never here, so no branch can slip through unrecorded.
#[derive(Debug, Clone)]
pub struct SymBool {
    pub value: bool,
    pub expr: Rc<Expr>,
}

/// One declared input's current concrete+symbolic state.
#[derive(Debug, Clone)]
pub enum SymValue {
    Int(SymInt),
    Circuit(SymCircuit),
}

impl SymValue {
    pub fn as_int(&self) -> Option<&SymInt> {
        match self {
            SymValue::Int(v) => Some(v),
            SymValue::Circuit(_) => None,
        }
    }

    pub fn as_circuit(&self) -> Option<&SymCircuit> {
        match self {
            SymValue::Circuit(c) => Some(c),
            SymValue::Int(_) => None,
        }
    }

    pub fn as_circuit_mut(&mut self) -> Option<&mut SymCircuit> {
        match self {
            SymValue::Circuit(c) => Some(c),
            SymValue::Int(_) => None,
        }
    }
}

/// The authoritative binding set driving one execution: declared input
/// name to its current value. `BTreeMap` keeps iteration order stable
/// so logs and solver inputs are deterministic.
pub type Bindings = BTreeMap<String, SymValue>;
