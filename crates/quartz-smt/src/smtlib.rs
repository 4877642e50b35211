//! SMT-LIB2 printing for terms, declarations, and whole problems.

use std::fmt::Write as _;

use crate::sorts::SmtSort;
use crate::terms::SmtTerm;

/// Print a real literal as an SMT-LIB2 decimal. `f64`'s `Display`
/// never uses exponent notation, so only the missing decimal point
/// needs patching up.
fn real_to_smtlib(v: f64) -> String {
    if v < 0.0 {
        return format!("(- {})", real_to_smtlib(-v));
    }
    let s = v.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

/// Print an SmtTerm as SMT-LIB2 format.
pub fn to_smtlib(term: &SmtTerm) -> String {
    match term {
        SmtTerm::Var(name) => name.clone(),
        SmtTerm::IntLit(n) => {
            if *n < 0 {
                format!("(- {})", -n)
            } else {
                n.to_string()
            }
        }
        SmtTerm::RealLit(v) => real_to_smtlib(*v),
        SmtTerm::Add(lhs, rhs) => format!("(+ {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Sub(lhs, rhs) => format!("(- {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Mul(lhs, rhs) => format!("(* {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Neg(inner) => format!("(- {})", to_smtlib(inner)),
        SmtTerm::Eq(lhs, rhs) => format!("(= {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Lt(lhs, rhs) => format!("(< {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Le(lhs, rhs) => format!("(<= {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Gt(lhs, rhs) => format!("(> {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Ge(lhs, rhs) => format!("(>= {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::And(terms) => {
            if terms.is_empty() {
                "true".to_string()
            } else if terms.len() == 1 {
                to_smtlib(&terms[0])
            } else {
                let inner: Vec<String> = terms.iter().map(to_smtlib).collect();
                format!("(and {})", inner.join(" "))
            }
        }
        SmtTerm::Or(terms) => {
            if terms.is_empty() {
                "false".to_string()
            } else if terms.len() == 1 {
                to_smtlib(&terms[0])
            } else {
                let inner: Vec<String> = terms.iter().map(to_smtlib).collect();
                format!("(or {})", inner.join(" "))
            }
        }
        SmtTerm::Not(inner) => format!("(not {})", to_smtlib(inner)),
    }
}

/// Render a complete problem: logic, declarations, assertions, and the
/// `(check-sat)`/`(get-model)` directives the external prover expects.
pub fn render_problem(
    logic: &str,
    declarations: &[(String, SmtSort)],
    assertions: &[SmtTerm],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "(set-logic {logic})");
    for (name, sort) in declarations {
        let _ = writeln!(out, "(declare-const {name} {sort})");
    }
    for term in assertions {
        let _ = writeln!(out, "(assert {})", to_smtlib(term));
    }
    let _ = writeln!(out, "(check-sat)");
    let _ = writeln!(out, "(get-model)");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_real_literals_with_decimal_point() {
        assert_eq!(to_smtlib(&SmtTerm::real(0.25)), "0.25");
        assert_eq!(to_smtlib(&SmtTerm::real(1.0)), "1.0");
        assert_eq!(to_smtlib(&SmtTerm::real(-0.5)), "(- 0.5)");
    }

    #[test]
    fn prints_nested_arithmetic() {
        let t = SmtTerm::var("a").mul(SmtTerm::var("a")).add(
            SmtTerm::var("b").mul(SmtTerm::var("b")),
        );
        assert_eq!(to_smtlib(&t), "(+ (* a a) (* b b))");
    }

    #[test]
    fn renders_a_full_problem() {
        let decls = vec![("x".to_string(), crate::sorts::SmtSort::Real)];
        let asserts = vec![SmtTerm::var("x").squared().eq(SmtTerm::real(0.25))];
        let text = render_problem("QF_NRA", &decls, &asserts);
        assert!(text.starts_with("(set-logic QF_NRA)\n"));
        assert!(text.contains("(declare-const x Real)"));
        assert!(text.contains("(assert (= (* x x) 0.25))"));
        assert!(text.ends_with("(check-sat)\n(get-model)\n"));
    }

    #[test]
    fn empty_conjunction_and_disjunction() {
        assert_eq!(to_smtlib(&SmtTerm::and(vec![])), "true");
        assert_eq!(to_smtlib(&SmtTerm::or(vec![])), "false");
    }
}
