//! Closed error taxonomy. Each case carries a structured payload and
//! `thiserror` gives it a canonical `Display` rendering. There is no
//! parse-time source range to interleave here, only the breadcrumb trail
//! `TypeError` attaches separately (see `super::TypeError`).

use crate::ir::{ExtType, FName, Type, VName};

/// Exhaustive sum of every way a program can fail to check.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ErrorCase {
    #[error("{0}")]
    TypeError(String),

    #[error("`{e1}` has type `{t1}` but `{e2}` has type `{t2}`; they must match")]
    UnifyError {
        e1: String,
        t1: Type,
        e2: String,
        t2: Type,
    },

    #[error("`{expr}` has type `{actual}`, but one of {allowed:?} was required")]
    UnexpectedType {
        expr: String,
        actual: Type,
        allowed: Vec<Type>,
    },

    #[error(
        "function `{fname}` declares return type `{declared:?}` but its body has type `{actual:?}`"
    )]
    ReturnTypeError {
        fname: FName,
        declared: Vec<ExtType>,
        actual: Vec<Type>,
    },

    #[error("function `{0}` is defined more than once")]
    DupDefinitionError(FName),

    #[error("function `{fname}` has a duplicate parameter `{pname}`")]
    DupParamError { fname: FName, pname: VName },

    #[error("pattern binds `{0}` more than once")]
    DupPatternError(VName),

    #[error("pattern `{pat}` does not match result type `{ts:?}`{}", note.as_ref().map(|n| format!(": {n}")).unwrap_or_default())]
    InvalidPatternError {
        pat: String,
        ts: Vec<ExtType>,
        note: Option<String>,
    },

    #[error("unknown variable `{0}`")]
    UnknownVariableError(VName),

    #[error("unknown function `{0}`")]
    UnknownFunctionError(FName),

    #[error("call to `{fname}` expected {expected:?}, got {got:?}")]
    ParameterMismatch {
        fname: FName,
        expected: Vec<Type>,
        got: Vec<Type>,
    },

    #[error("`{0}` used after being consumed")]
    UseAfterConsume(VName),

    #[error("array of rank {rank} indexed with {got} indices")]
    IndexingError { rank: usize, got: usize },

    #[error("{desc}: expected `{expected}`, got `{got}`")]
    BadAnnotation {
        desc: String,
        expected: String,
        got: String,
    },

    #[error("unique return of `{fname}` aliases non-consumed parameter `{vname}`")]
    ReturnAliased { fname: FName, vname: VName },

    #[error("a unique return position of `{0}` aliases another return position")]
    UniqueReturnAliased(FName),

    #[error("`{0}` has type `{1}`, expected an array")]
    NotAnArray(VName, Type),

    #[error("permutation {perm:?} is not a bijection on [0, {rank}) for `{arr}`")]
    PermutationError {
        perm: Vec<usize>,
        rank: usize,
        arr: VName,
    },
}
