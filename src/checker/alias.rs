//! Aliasing operations: `observe`, `consume`, `expandAliases`, and the
//! symmetric alias update performed when a `let` is bound.
//!
//! Binding a name merges its alias set into every name it touches, and
//! symmetrically updates those names' own alias sets to include the new
//! name — both sides of the relation are kept in sync at insertion time.

use crate::ir::{Lore, VName};

use super::context::{Env, NameInfo};
use super::occurrence::{Names, Occurrence};

/// Transitive closure of `names` over the current alias relation.
pub fn expand_aliases<L: Lore>(env: &Env<L>, names: Names) -> Names {
    let mut result = names;
    loop {
        let mut next = result.clone();
        for n in &result {
            next.insert(n.clone());
            if let Ok(info) = env.lookup_var(n) {
                next.extend(info.aliases());
            }
        }
        if next == result {
            return result;
        }
        result = next;
    }
}

/// Look up `v` and record an occurrence observing it. Primitives carry no
/// aliases, so observing one yields the null occurrence.
pub fn observe<L: Lore>(env: &Env<L>, v: &VName) -> crate::diagnostics::CheckResult<Occurrence> {
    let info = env.lookup_var(v)?;
    if info.ty().is_array() {
        let mut observed = expand_aliases(env, std::iter::once(v.clone()).collect());
        observed.insert(v.clone());
        Ok(Occurrence::observed(observed))
    } else {
        Ok(Occurrence::default())
    }
}

/// Record a consumption of `alias_set`.
pub fn consume(alias_set: Names) -> Occurrence {
    Occurrence::consumed(alias_set)
}

/// Bind a let pattern element: expand its declared alias set against the
/// current environment, insert the new binding, then update every
/// already-in-scope name the new binding now aliases so the relation stays
/// symmetric.
pub fn bind_let<L: Lore>(
    env: &mut Env<L>,
    name: VName,
    ty: crate::ir::Type,
    declared_aliases: Names,
    attr: L::LetAttr,
) {
    let expanded = expand_aliases(env, declared_aliases);

    let affected: Vec<VName> = env
        .vars_iter()
        .filter(|(n, _)| expanded.contains(n))
        .map(|(n, _)| n.clone())
        .collect();

    env.insert(
        name.clone(),
        NameInfo::Let {
            ty,
            aliases: expanded,
            attr,
        },
    );

    // Symmetrize: every name the new binding aliases gains `name` back in
    // its own alias set. Only `Let`-bound names
    // carry a mutable alias set; parameters/indices are never aliased by
    // a later let, so there is nothing to update on them.
    for other in affected {
        if let Some(NameInfo::Let { aliases, .. }) = env.get_mut(&other) {
            aliases.insert(name.clone());
        }
    }
}

#[cfg(test)]
mod alias_tests {
    use super::*;
    use crate::ir::{CoreLore, FName, FunBinding, PrimType, Shape, Type, Uniqueness};
    use indexmap::IndexMap;

    fn empty_funs() -> IndexMap<FName, FunBinding<CoreLore>> {
        IndexMap::new()
    }

    fn arr_ty() -> Type {
        Type::array(PrimType::i32(), Shape::new(vec![]), Uniqueness::Nonunique)
    }

    #[test]
    fn expand_aliases_is_reflexive() {
        let funs = empty_funs();
        let env: Env<CoreLore> = Env::new(&funs, true);
        let v = VName::new("v");
        let expanded = expand_aliases(&env, std::iter::once(v.clone()).collect());
        assert!(expanded.contains(&v));
    }

    #[test]
    fn observe_primitive_yields_null_occurrence() {
        let funs = empty_funs();
        let mut env: Env<CoreLore> = Env::new(&funs, true);
        let v = VName::new("v");
        env.insert(
            v.clone(),
            NameInfo::FParam {
                ty: Type::Prim(PrimType::i32()),
                attr: (),
            },
        );
        let occ = observe(&env, &v).unwrap();
        assert!(occ.is_null());
    }

    #[test]
    fn observe_array_includes_self_and_aliases() {
        let funs = empty_funs();
        let mut env: Env<CoreLore> = Env::new(&funs, true);
        let a = VName::new("a");
        env.insert(
            a.clone(),
            NameInfo::FParam {
                ty: arr_ty(),
                attr: (),
            },
        );
        let occ = observe(&env, &a).unwrap();
        assert!(occ.observed.contains(&a));
    }
}
