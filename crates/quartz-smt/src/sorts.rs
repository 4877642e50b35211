use std::fmt;

/// SMT sorts used by the Quartz encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtSort {
    Bool,
    Int,
    Real,
}

impl fmt::Display for SmtSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmtSort::Bool => write!(f, "Bool"),
            SmtSort::Int => write!(f, "Int"),
            SmtSort::Real => write!(f, "Real"),
        }
    }
}
