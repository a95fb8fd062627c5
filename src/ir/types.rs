//! Core type definitions for the checker.

use std::fmt;

use super::name::VName;

/// Scalar base types.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum PrimType {
    Bool,
    SignedInt(IntSize),
    UnsignedInt(IntSize),
    Float(FloatSize),
    Cert,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum IntSize {
    B8,
    B16,
    B32,
    B64,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum FloatSize {
    F32,
    F64,
}

impl PrimType {
    pub fn i32() -> Self {
        PrimType::SignedInt(IntSize::B32)
    }

    pub fn is_cert(self) -> bool {
        matches!(self, PrimType::Cert)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimType::SignedInt(_) | PrimType::UnsignedInt(_) | PrimType::Float(_)
        )
    }
}

impl fmt::Display for PrimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimType::Bool => write!(f, "bool"),
            PrimType::SignedInt(s) => write!(f, "i{}", s.bits()),
            PrimType::UnsignedInt(s) => write!(f, "u{}", s.bits()),
            PrimType::Float(s) => write!(f, "f{}", s.bits()),
            PrimType::Cert => write!(f, "cert"),
        }
    }
}

impl IntSize {
    pub fn bits(self) -> u32 {
        match self {
            IntSize::B8 => 8,
            IntSize::B16 => 16,
            IntSize::B32 => 32,
            IntSize::B64 => 64,
        }
    }
}

impl FloatSize {
    pub fn bits(self) -> u32 {
        match self {
            FloatSize::F32 => 32,
            FloatSize::F64 => 64,
        }
    }
}

/// A single dimension of a shape. Either a concrete size (constant or a
/// bound variable) or an existential placeholder bound at a pattern
/// position.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Dim {
    Const(u64),
    Var(VName),
    /// `Ext i`: an existential dimension, indexed by binding-site position.
    Ext(usize),
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Const(n) => write!(f, "{n}"),
            Dim::Var(v) => write!(f, "{v}"),
            Dim::Ext(i) => write!(f, "?{i}"),
        }
    }
}

/// Ordered list of dimensions. Rank is `dims.len()`.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Shape {
    pub dims: Vec<Dim>,
}

impl Shape {
    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    pub fn new(dims: Vec<Dim>) -> Self {
        Self { dims }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn has_existentials(&self) -> bool {
        self.dims.iter().any(|d| matches!(d, Dim::Ext(_)))
    }
}

/// `Unique` or `Nonunique`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Uniqueness {
    Unique,
    #[default]
    Nonunique,
}

impl Uniqueness {
    pub fn is_unique(self) -> bool {
        matches!(self, Uniqueness::Unique)
    }

    /// Combine two uniqueness tags as seen across alternative control-flow
    /// paths (e.g. generalizing an `if`'s two branches): the result is
    /// unique only if both sides are.
    pub fn combine(self, other: Self) -> Self {
        if self.is_unique() && other.is_unique() {
            Uniqueness::Unique
        } else {
            Uniqueness::Nonunique
        }
    }
}

/// A plain (fully instantiated) type: no existential dimensions remain.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Type {
    Prim(PrimType),
    Array {
        elem: PrimType,
        shape: Shape,
        uniqueness: Uniqueness,
    },
}

impl Type {
    pub fn prim(p: PrimType) -> Self {
        Type::Prim(p)
    }

    pub fn array(elem: PrimType, shape: Shape, uniqueness: Uniqueness) -> Self {
        Type::Array {
            elem,
            shape,
            uniqueness,
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            Type::Prim(_) => 0,
            Type::Array { shape, .. } => shape.rank(),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    pub fn uniqueness(&self) -> Uniqueness {
        match self {
            Type::Prim(_) => Uniqueness::Nonunique,
            Type::Array { uniqueness, .. } => *uniqueness,
        }
    }

    pub fn elem_type(&self) -> PrimType {
        match self {
            Type::Prim(p) => *p,
            Type::Array { elem, .. } => *elem,
        }
    }

    /// Rank-shaped type: all concrete dimensions erased to bare rank,
    /// used for subtype comparison at return boundaries.
    pub fn rank_shaped(&self) -> Type {
        match self {
            Type::Prim(p) => Type::Prim(*p),
            Type::Array {
                elem, uniqueness, ..
            } => Type::Array {
                elem: *elem,
                shape: Shape::new(vec![Dim::Ext(0); self.rank()]),
                uniqueness: *uniqueness,
            },
        }
    }

    /// Structural subtype check used throughout the checker: `self` may
    /// stand in for `other` wherever `other` is expected. Primitives and array
    /// element types/ranks must match exactly; a `Unique` actual may
    /// satisfy a `Nonunique` expectation but not vice versa.
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Prim(a), Type::Prim(b)) => a == b,
            (
                Type::Array {
                    elem: e1,
                    shape: s1,
                    uniqueness: u1,
                },
                Type::Array {
                    elem: e2,
                    shape: s2,
                    uniqueness: u2,
                },
            ) => e1 == e2 && s1.dims == s2.dims && (u1.is_unique() || !u2.is_unique()),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Prim(p) => write!(f, "{p}"),
            Type::Array {
                elem,
                shape,
                uniqueness,
            } => {
                if uniqueness.is_unique() {
                    write!(f, "*")?;
                }
                for d in &shape.dims {
                    write!(f, "[{d}]")?;
                }
                write!(f, "{elem}")
            }
        }
    }
}

/// Same as `Type` but existential dimensions are allowed; instantiated to a
/// plain `Type` at pattern-binding sites.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ExtType {
    Prim(PrimType),
    Array {
        elem: PrimType,
        shape: Shape,
        uniqueness: Uniqueness,
    },
}

impl ExtType {
    pub fn from_type(t: &Type) -> Self {
        match t {
            Type::Prim(p) => ExtType::Prim(*p),
            Type::Array {
                elem,
                shape,
                uniqueness,
            } => ExtType::Array {
                elem: *elem,
                shape: shape.clone(),
                uniqueness: *uniqueness,
            },
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            ExtType::Prim(_) => 0,
            ExtType::Array { shape, .. } => shape.rank(),
        }
    }

    pub fn uniqueness(&self) -> Uniqueness {
        match self {
            ExtType::Prim(_) => Uniqueness::Nonunique,
            ExtType::Array { uniqueness, .. } => *uniqueness,
        }
    }

    /// Instantiate existential dimensions using `resolve`, which maps an
    /// `Ext` index to a concrete `Dim` (typically derived from actual
    /// argument shapes at an `Apply`, via `applyRetType`).
    pub fn instantiate(&self, resolve: impl Fn(usize) -> Dim) -> Type {
        match self {
            ExtType::Prim(p) => Type::Prim(*p),
            ExtType::Array {
                elem,
                shape,
                uniqueness,
            } => {
                let dims = shape
                    .dims
                    .iter()
                    .map(|d| match d {
                        Dim::Ext(i) => resolve(*i),
                        other => other.clone(),
                    })
                    .collect();
                Type::Array {
                    elem: *elem,
                    shape: Shape::new(dims),
                    uniqueness: *uniqueness,
                }
            }
        }
    }

    /// Pointwise least-upper-bound of two extended-type lists: disagreeing concrete dimensions
    /// are replaced with a fresh existential; agreeing dimensions are kept.
    pub fn generalize(a: &ExtType, b: &ExtType, next_ext: &mut usize) -> Option<ExtType> {
        match (a, b) {
            (ExtType::Prim(p1), ExtType::Prim(p2)) if p1 == p2 => Some(ExtType::Prim(*p1)),
            (
                ExtType::Array {
                    elem: e1,
                    shape: s1,
                    uniqueness: u1,
                },
                ExtType::Array {
                    elem: e2,
                    shape: s2,
                    uniqueness: u2,
                },
            ) if e1 == e2 && s1.rank() == s2.rank() => {
                let dims = s1
                    .dims
                    .iter()
                    .zip(&s2.dims)
                    .map(|(d1, d2)| {
                        if d1 == d2 {
                            d1.clone()
                        } else {
                            let ext = Dim::Ext(*next_ext);
                            *next_ext += 1;
                            ext
                        }
                    })
                    .collect();
                Some(ExtType::Array {
                    elem: *e1,
                    shape: Shape::new(dims),
                    uniqueness: u1.combine(*u2),
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for ExtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtType::Prim(p) => write!(f, "{p}"),
            ExtType::Array {
                elem,
                shape,
                uniqueness,
            } => {
                if uniqueness.is_unique() {
                    write!(f, "*")?;
                }
                for d in &shape.dims {
                    write!(f, "[{d}]")?;
                }
                write!(f, "{elem}")
            }
        }
    }
}
