//! A captured branch condition: the comparison expression plus the
//! boolean outcome observed when it was concretely evaluated.

use std::fmt;
use std::rc::Rc;

use crate::value::Expr;

#[derive(Debug, Clone)]
pub struct Predicate {
    pub expr: Rc<Expr>,
    pub outcome: bool,
}

impl Predicate {
    pub fn new(expr: Rc<Expr>, outcome: bool) -> Self {
        Predicate { expr, outcome }
    }

    /// A flipped copy for sibling lookup. Stored predicates are never
    /// mutated; only this private copy carries the negated outcome.
    pub fn negated(&self) -> Predicate {
        Predicate {
            expr: Rc::clone(&self.expr),
            outcome: !self.outcome,
        }
    }

    /// Free variable names referenced by the condition.
    pub fn variables(&self) -> Vec<String> {
        self.expr.variables()
    }
}

/// Equality is structural: outcomes match and expressions are
/// structurally equivalent (names for variables, values for literals).
impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.outcome == other.outcome && self.expr.structural_eq(&other.expr)
    }
}

impl Eq for Predicate {}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.expr, self.outcome)
    }
}
