//! Top-level function definitions and the function table.

use super::expr::{Body, Param};
use super::lore::Lore;
use super::name::FName;
use super::types::ExtType;

/// A whole function/entry point: name, declared return type(s), named
/// parameters, and body.
#[derive(Clone, Debug)]
pub struct FunDef<L: Lore> {
    pub name: FName,
    pub ret_type: Vec<ExtType>,
    pub ret_attr: L::RetTypeAttr,
    pub params: Vec<Param<L>>,
    pub body: Body<L>,
}

/// `(returnType, parameterList)` — what's known about a function from its
/// signature alone, without its body.
#[derive(Clone, Debug)]
pub struct FunBinding<L: Lore> {
    pub ret_type: Vec<ExtType>,
    pub params: Vec<Param<L>>,
}

impl<L: Lore> FunBinding<L> {
    pub fn of(def: &FunDef<L>) -> Self {
        Self {
            ret_type: def.ret_type.clone(),
            params: def.params.clone(),
        }
    }
}

/// A whole program: a flat list of function definitions.
#[derive(Clone, Debug, Default)]
pub struct Program<L: Lore> {
    pub funs: Vec<FunDef<L>>,
}
