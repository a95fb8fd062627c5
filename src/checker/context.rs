//! Checking context: variable table, function table, breadcrumb stack, and
//! the `check_occurrences` toggle.
//!
//! A central registry threaded by `&mut` reference through the whole
//! traversal, with scoped extension/restoration for bindings instead of a
//! persistent functional map.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::diagnostics::{CheckResult, ErrorCase, TypeError};
use crate::ir::{FName, FunBinding, Lore, Type, VName};

/// Per-variable binding info.
///
/// Only the alias/attribute payload is intrinsic to each binding kind;
/// a variable's `Type` is not spelled out as living anywhere explicit, but
/// `lookupVar` and the expression checker's `Var` case both
/// need one to come from somewhere, so each variant also carries the type
/// it was bound at (an Open Question decision, recorded in DESIGN.md).
#[derive(Clone, Debug)]
pub enum NameInfo<L: Lore> {
    /// Locally let-bound: carries its current alias set and pass-specific
    /// attributes.
    Let {
        ty: Type,
        aliases: BTreeSet<VName>,
        attr: L::LetAttr,
    },
    /// Function parameter.
    FParam { ty: Type, attr: L::FParamAttr },
    /// Lambda parameter.
    LParam { ty: Type, attr: L::LParamAttr },
    /// Loop index (`for i < n`): never aliased, never consumable.
    Index { ty: Type },
}

impl<L: Lore> NameInfo<L> {
    pub fn aliases(&self) -> BTreeSet<VName> {
        match self {
            NameInfo::Let { aliases, .. } => aliases.clone(),
            NameInfo::FParam { .. } | NameInfo::LParam { .. } | NameInfo::Index { .. } => {
                BTreeSet::new()
            }
        }
    }

    pub fn ty(&self) -> &Type {
        match self {
            NameInfo::Let { ty, .. }
            | NameInfo::FParam { ty, .. }
            | NameInfo::LParam { ty, .. }
            | NameInfo::Index { ty } => ty,
        }
    }
}

/// The checking context threaded through the whole traversal.
///
/// Invariant: every name in `vars` is bound exactly
/// once in its scope — `bind` below enforces this by requiring callers to
/// check for shadowing themselves (the expression checker raises a type
/// error rather than silently permitting re-binding, see
/// `checker::expr::check_let`).
pub struct Env<'f, L: Lore> {
    vars: IndexMap<VName, NameInfo<L>>,
    funs: &'f IndexMap<FName, FunBinding<L>>,
    /// When false, consumption violations are tracked but not raised.
    pub check_occurrences: bool,
    /// Most recent breadcrumb first, matching push/pop (LIFO) discipline;
    /// snapshots taken at raise time are reversed to outermost-first.
    breadcrumbs: Vec<String>,
}

impl<'f, L: Lore> Env<'f, L> {
    pub fn new(funs: &'f IndexMap<FName, FunBinding<L>>, check_occurrences: bool) -> Self {
        Self {
            vars: IndexMap::new(),
            funs,
            check_occurrences,
            breadcrumbs: Vec::new(),
        }
    }

    pub fn lookup_var(&self, name: &VName) -> CheckResult<&NameInfo<L>> {
        self.vars
            .get(name)
            .ok_or_else(|| self.bad(ErrorCase::UnknownVariableError(name.clone())))
    }

    pub fn lookup_fun(&self, name: &FName) -> CheckResult<&FunBinding<L>> {
        self.funs
            .get(name)
            .ok_or_else(|| self.bad(ErrorCase::UnknownFunctionError(name.clone())))
    }

    pub fn is_bound(&self, name: &VName) -> bool {
        self.vars.contains_key(name)
    }

    /// Bind `name` for the remainder of the enclosing scope. Callers are
    /// responsible for rejecting shadowing before calling this; `Env` itself just records the binding.
    pub fn insert(&mut self, name: VName, info: NameInfo<L>) {
        self.vars.insert(name, info);
    }

    pub fn remove(&mut self, name: &VName) -> Option<NameInfo<L>> {
        self.vars.shift_remove(name)
    }

    pub fn get_mut(&mut self, name: &VName) -> Option<&mut NameInfo<L>> {
        self.vars.get_mut(name)
    }

    /// Run `action` with `label` pushed onto the breadcrumb stack,
    /// guaranteeing the label is popped on every exit path.
    pub fn context<T>(
        &mut self,
        label: impl Into<String>,
        action: impl FnOnce(&mut Self) -> CheckResult<T>,
    ) -> CheckResult<T> {
        self.breadcrumbs.push(label.into());
        let result = action(self);
        self.breadcrumbs.pop();
        result
    }

    /// Fail with the current breadcrumb stack, outermost first.
    pub fn bad(&self, case: ErrorCase) -> TypeError {
        let mut crumbs = self.breadcrumbs.clone();
        crumbs.reverse();
        TypeError::new(crumbs, case)
    }

    /// Look up aliases of `name`, expanded transitively. Delegates to `super::alias`.
    pub fn aliases_of(&self, name: &VName) -> BTreeSet<VName> {
        super::alias::expand_aliases(self, std::iter::once(name.clone()).collect())
    }

    pub(crate) fn vars_iter(&self) -> impl Iterator<Item = (&VName, &NameInfo<L>)> {
        self.vars.iter()
    }
}
