//! The data model the checker operates over.
//!
//! This crate does not parse source text into this representation — that
//! is the surface parser's job, explicitly out of scope. What
//! lives here is only the shape of an already-parsed, already
//! alias-annotated program.

pub mod expr;
pub mod func;
pub mod lore;
pub mod name;
pub mod types;

pub use expr::{
    BinOp, Body, CmpOp, Diet, DoLoop, Expr, Lambda, LetBinding, LoopForm, Param, PatElem, Pattern,
    UnOp,
};
pub use func::{FunBinding, FunDef, Program};
pub use lore::{CoreLore, Lore};
pub use name::{FName, Name, VName};
pub use types::{Dim, ExtType, FloatSize, IntSize, PrimType, Shape, Type, Uniqueness};
