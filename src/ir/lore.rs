//! The "lore" (per-pass annotation flavor) the checker is parameterized
//! over.
//!
//! Every IR node that might carry pass-specific information is generic
//! over a `Lore` implementation. The checker body only ever touches lore
//! attributes through the `Checkable` capability (see `checker::checkable`);
//! it never pattern-matches on a concrete lore type.

use std::fmt::Debug;

/// A family of associated attribute types, one per IR position that a
/// compiler pass might want to annotate, plus the type of custom
/// (backend-specific) operators that pass introduces.
pub trait Lore: Sized + Clone + Debug {
    type ExpAttr: Clone + Debug + Default;
    type LetAttr: Clone + Debug + Default;
    type BodyAttr: Clone + Debug + Default;
    type FParamAttr: Clone + Debug + Default;
    type LParamAttr: Clone + Debug + Default;
    type RetTypeAttr: Clone + Debug + Default;
    /// Backend-specific operators this lore introduces beyond the core
    /// primitive operations every lore shares. The core lore (`CoreLore`)
    /// has none.
    type Op: Clone + Debug;
}

/// The base IR flavor: no custom operators, no extra annotations anywhere.
/// Analogous to checking a program before any backend-specific lowering
/// pass has attached its own information.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoreLore;

impl Lore for CoreLore {
    type ExpAttr = ();
    type LetAttr = ();
    type BodyAttr = ();
    type FParamAttr = ();
    type LParamAttr = ();
    type RetTypeAttr = ();
    /// Core programs have no custom operators to check.
    type Op = std::convert::Infallible;
}
