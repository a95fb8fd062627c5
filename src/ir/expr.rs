//! Expression IR.
//!
//! `Expr<L>` covers every construct the expression checker must
//! handle. It is generic over a `Lore` so the same tree shape serves every
//! IR stage; lore-specific annotations live in the `attr` fields and are
//! only ever inspected through `Checkable`.

use std::collections::BTreeSet;

use super::lore::Lore;
use super::name::{FName, VName};
use super::types::{ExtType, PrimType, Type};

/// Arithmetic/bitwise binary operator. Operand and result primitive type
/// are carried on the node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnOp {
    Neg,
    Not,
    Abs,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CmpOp {
    Eq,
    Lt,
    Le,
}

/// A binding pattern element: the name being bound, its (possibly
/// existentially-quantified) type, and the alias set the upstream
/// alias-annotation pass attached to it.
#[derive(Clone, Debug)]
pub struct PatElem<L: Lore> {
    pub name: VName,
    pub ty: ExtType,
    pub aliases: BTreeSet<VName>,
    pub attr: L::LetAttr,
}

/// A (possibly multi-name) binding pattern, e.g. the left side of
/// `let (x, y) = ...`.
#[derive(Clone, Debug, Default)]
pub struct Pattern<L: Lore> {
    pub elems: Vec<PatElem<L>>,
}

impl<L: Lore> Pattern<L> {
    pub fn single(name: VName, ty: ExtType, aliases: BTreeSet<VName>) -> Self {
        Self {
            elems: vec![PatElem {
                name,
                ty,
                aliases,
                attr: L::LetAttr::default(),
            }],
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &VName> {
        self.elems.iter().map(|e| &e.name)
    }
}

/// A sequence of let-bindings followed by a trailing result: the unit of
/// control flow composed by `seq`/`alt`.
#[derive(Clone, Debug)]
pub struct Body<L: Lore> {
    pub bindings: Vec<LetBinding<L>>,
    pub result: Vec<Expr<L>>,
    pub attr: L::BodyAttr,
}

impl<L: Lore> Body<L> {
    pub fn just(result: Vec<Expr<L>>) -> Self {
        Self {
            bindings: Vec::new(),
            result,
            attr: L::BodyAttr::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LetBinding<L: Lore> {
    pub pat: Pattern<L>,
    pub value: Box<Expr<L>>,
}

/// Calling convention for a function/lambda parameter: whether an
/// application consumes (destructively uses) the argument.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Diet {
    Observe,
    Consume,
}

#[derive(Clone, Debug)]
pub struct Param<L: Lore> {
    pub name: VName,
    pub ty: Type,
    pub diet: Diet,
    pub attr: L::FParamAttr,
}

impl<L: Lore> Param<L> {
    pub fn new(name: VName, ty: Type, diet: Diet) -> Self {
        Self {
            name,
            ty,
            diet,
            attr: L::FParamAttr::default(),
        }
    }
}

/// An anonymous lambda, e.g. the function argument to a second-order
/// array combinator such as `map` or `reduce`.
#[derive(Clone, Debug)]
pub struct Lambda<L: Lore> {
    pub params: Vec<Param<L>>,
    pub ret: Vec<ExtType>,
    pub body: Body<L>,
}

/// `for i < bound` vs `while cond`, the two `DoLoop` forms.
#[derive(Clone, Debug)]
pub enum LoopForm<L: Lore> {
    ForLoop { var: VName, bound: Box<Expr<L>> },
    WhileLoop { cond_name: VName },
}

#[derive(Clone, Debug)]
pub struct DoLoop<L: Lore> {
    pub form: LoopForm<L>,
    /// Merge pattern: loop-carried variables with their initial values.
    pub merge: Vec<(Param<L>, Expr<L>)>,
    pub body: Body<L>,
}

/// Every construct the expression checker recurses over.
#[derive(Clone, Debug)]
pub enum Expr<L: Lore> {
    Literal(PrimType, String),
    Var(VName),
    BinOp {
        op: BinOp,
        ty: PrimType,
        left: Box<Expr<L>>,
        right: Box<Expr<L>>,
    },
    UnOp {
        op: UnOp,
        ty: PrimType,
        operand: Box<Expr<L>>,
    },
    CmpOp {
        op: CmpOp,
        ty: PrimType,
        left: Box<Expr<L>>,
        right: Box<Expr<L>>,
    },
    Convert {
        target: PrimType,
        operand: Box<Expr<L>>,
    },
    ArrayLit {
        elem_type: PrimType,
        elems: Vec<Expr<L>>,
    },
    Index {
        array: VName,
        indices: Vec<Expr<L>>,
        cert: Option<VName>,
    },
    Iota {
        n: Box<Expr<L>>,
        elem_type: PrimType,
    },
    Replicate {
        shape: Vec<Expr<L>>,
        value: Box<Expr<L>>,
    },
    Scratch {
        elem_type: PrimType,
        shape: Vec<Expr<L>>,
    },
    Reshape {
        new_shape: Vec<Expr<L>>,
        array: VName,
    },
    Rearrange {
        perm: Vec<usize>,
        array: VName,
    },
    Split {
        sizes: Vec<Expr<L>>,
        array: VName,
    },
    Concat {
        arrays: Vec<VName>,
    },
    Copy {
        array: VName,
    },
    Assert {
        cond: Box<Expr<L>>,
        message: String,
    },
    Partition {
        num_classes: usize,
        array: VName,
        classify: Box<Lambda<L>>,
    },
    If {
        cond: Box<Expr<L>>,
        then_branch: Box<Body<L>>,
        else_branch: Box<Body<L>>,
        /// Declared result type(s), checked against the generalized
        /// branch types.
        result_type: Vec<ExtType>,
    },
    Apply {
        fname: FName,
        args: Vec<Expr<L>>,
        /// Declared instantiated return type, checked against the derived
        /// type.
        ret: Vec<Type>,
    },
    DoLoop(Box<DoLoop<L>>),
    /// Backend-specific operator, delegated to `Checkable::check_op`.
    Op(L::Op, L::ExpAttr),
}

impl<L: Lore> Expr<L> {
    pub fn var(name: VName) -> Self {
        Expr::Var(name)
    }
}
