//! shapecheck: a type, shape, and uniqueness checker for a purely
//! functional, array-oriented intermediate representation.
//!
//! # Example
//!
//! ```
//! use indexmap::IndexMap;
//! use shapecheck::ir::{
//!     Body, CoreLore, Diet, Expr, ExtType, FName, FunBinding, FunDef, Param, Program, PrimType,
//!     Type, VName,
//! };
//! use shapecheck::checker::{Checkable, Env};
//! use shapecheck::diagnostics::CheckResult;
//!
//! struct NoOps;
//! impl Checkable<CoreLore> for NoOps {
//!     fn check_op(
//!         &self,
//!         _env: &mut Env<CoreLore>,
//!         op: &std::convert::Infallible,
//!         _attr: &(),
//!     ) -> CheckResult<(Vec<Type>, shapecheck::checker::occurrence::Occurrences)> {
//!         match *op {}
//!     }
//! }
//!
//! let a = VName::new("a");
//! let identity = FunDef {
//!     name: FName::new("identity"),
//!     ret_type: vec![ExtType::Prim(PrimType::i32())],
//!     ret_attr: (),
//!     params: vec![Param::new(a.clone(), Type::Prim(PrimType::i32()), Diet::Observe)],
//!     body: Body::just(vec![Expr::Var(a)]),
//! };
//! let prog = Program { funs: vec![identity] };
//! let builtins: IndexMap<FName, FunBinding<CoreLore>> = IndexMap::new();
//! assert!(shapecheck::checker::check_prog_strict(&NoOps, &builtins, &prog).is_ok());
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod checker;
pub mod diagnostics;
pub mod ir;

pub use checker::{check_prog, check_prog_no_uniqueness, check_prog_strict, primary_fun_name};
pub use diagnostics::{CheckResult, ErrorCase, TypeError};
