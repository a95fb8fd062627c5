//! Diagnostics: a single structured error plus the breadcrumb trail that
//! was active when it was raised.
//!
//! This checker is fail-fast: there is at most one `TypeError` per
//! `checkProg` call, so there is no collection type here, only the single
//! error plus its context.

pub mod error;

pub use error::ErrorCase;

use std::fmt;

/// `Result<unit, TypeError>` is the return type of every checking
/// operation.
pub type CheckResult<T> = Result<T, TypeError>;

/// A structured failure: the offending `ErrorCase` paired with a snapshot
/// of the breadcrumb stack as it stood at the raise site, outermost
/// breadcrumb first.
#[derive(Clone, Debug, thiserror::Error)]
pub struct TypeError {
    pub breadcrumbs: Vec<String>,
    pub case: ErrorCase,
}

impl TypeError {
    pub fn new(breadcrumbs: Vec<String>, case: ErrorCase) -> Self {
        Self { breadcrumbs, case }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for crumb in &self.breadcrumbs {
            writeln!(f, "In {crumb}:")?;
        }
        write!(f, "{}", self.case)
    }
}

#[cfg(test)]
mod mod_tests {
    use super::*;

    #[test]
    fn rendering_interleaves_breadcrumbs_outermost_first() {
        let err = TypeError::new(
            vec!["function `f`".into(), "let binding `x`".into()],
            ErrorCase::TypeError("boom".into()),
        );
        let rendered = err.to_string();
        let fn_pos = rendered.find("function `f`").unwrap();
        let let_pos = rendered.find("let binding `x`").unwrap();
        let case_pos = rendered.find("boom").unwrap();
        assert!(fn_pos < let_pos);
        assert!(let_pos < case_pos);
    }

    #[test]
    fn full_rendering_snapshot() {
        let err = TypeError::new(
            vec!["function `f`".into(), "let binding `x`".into()],
            ErrorCase::TypeError("boom".into()),
        );
        insta::assert_snapshot!(err.to_string(), @r"
        In function `f`:
        In let binding `x`:
        boom
        ");
    }
}
