//! The `Checkable` capability: hook points an IR flavor supplies to check
//! its own lore-specific annotations and custom operators.
//!
//! A set of default no-op hook methods per construct, with callers
//! overriding only the ones their pass actually cares about. `check_op`
//! has no sensible universal default — it is delegated entirely to the
//! capability supplied by the IR flavor — so it is the one hook with no
//! default body.

use crate::diagnostics::{CheckResult, ErrorCase};
use crate::ir::{Dim, ExtType, FName, Lore, Pattern, Shape, Type};

use super::context::Env;
use super::occurrence::Occurrences;

/// Per-flavor hooks into the checker. No dynamic dispatch is required on
/// hot paths — a flavor fixes one `Checkable` implementor for the whole
/// top-level invocation.
pub trait Checkable<L: Lore> {
    fn check_exp_attr(&self, _env: &mut Env<L>, _attr: &L::ExpAttr) -> CheckResult<()> {
        Ok(())
    }

    fn check_body_attr(&self, _env: &mut Env<L>, _attr: &L::BodyAttr) -> CheckResult<()> {
        Ok(())
    }

    fn check_fparam_attr(&self, _env: &mut Env<L>, _attr: &L::FParamAttr) -> CheckResult<()> {
        Ok(())
    }

    fn check_lparam_attr(&self, _env: &mut Env<L>, _attr: &L::LParamAttr) -> CheckResult<()> {
        Ok(())
    }

    fn check_let_attr(&self, _env: &mut Env<L>, _attr: &L::LetAttr) -> CheckResult<()> {
        Ok(())
    }

    fn check_ret_type_attr(&self, _env: &mut Env<L>, _attr: &L::RetTypeAttr) -> CheckResult<()> {
        Ok(())
    }

    /// Bind `pat` against the actual result types computed for its
    /// right-hand side.
    fn match_pattern(
        &self,
        env: &Env<L>,
        pat: &Pattern<L>,
        actual: &[Type],
    ) -> CheckResult<Vec<Type>> {
        default_match_pattern(env, pat, actual)
    }

    /// Verify a function's declared return type against the type actually
    /// derived for its body.
    fn match_return_type(
        &self,
        env: &Env<L>,
        fname: &FName,
        declared: &[ExtType],
        actual: &[Type],
    ) -> CheckResult<()> {
        default_match_return_type(env, fname, declared, actual)
    }

    /// Check a backend-specific operator. No default: every flavor that
    /// introduces custom operators must supply its own semantics,
    /// including whatever it observes/consumes.
    fn check_op(
        &self,
        env: &mut Env<L>,
        op: &L::Op,
        attr: &L::ExpAttr,
    ) -> CheckResult<(Vec<Type>, Occurrences)>;
}

/// Instantiate `declared`'s existential dims positionally from `actual`'s
/// concrete dims at the same shape position (the simplest consistent
/// reading of `applyRetType`'s semantics — see DESIGN.md).
pub(crate) fn instantiate_against(declared: &ExtType, actual: &Type) -> Type {
    match (declared, actual) {
        (ExtType::Prim(p), _) => Type::Prim(*p),
        (
            ExtType::Array {
                elem, shape, uniqueness,
            },
            Type::Array {
                shape: actual_shape,
                ..
            },
        ) => {
            let dims = shape
                .dims
                .iter()
                .enumerate()
                .map(|(i, d)| match d {
                    Dim::Ext(_) => actual_shape.dims.get(i).cloned().unwrap_or(Dim::Const(0)),
                    other => other.clone(),
                })
                .collect();
            Type::Array {
                elem: *elem,
                shape: Shape::new(dims),
                uniqueness: *uniqueness,
            }
        }
        (ExtType::Array { elem, uniqueness, .. }, _) => Type::Array {
            elem: *elem,
            shape: Shape::scalar(),
            uniqueness: *uniqueness,
        },
    }
}

fn pattern_string<L: Lore>(pat: &Pattern<L>) -> String {
    let names: Vec<String> = pat.names().map(|n| n.to_string()).collect();
    format!("({})", names.join(", "))
}

pub fn default_match_pattern<L: Lore>(
    env: &Env<L>,
    pat: &Pattern<L>,
    actual: &[Type],
) -> CheckResult<Vec<Type>> {
    if pat.elems.len() != actual.len() {
        return Err(env.bad(ErrorCase::InvalidPatternError {
            pat: pattern_string(pat),
            ts: actual.iter().map(ExtType::from_type).collect(),
            note: Some(format!(
                "pattern binds {} name(s) but the expression yields {}",
                pat.elems.len(),
                actual.len()
            )),
        }));
    }

    let mut seen = std::collections::BTreeSet::new();
    for elem in &pat.elems {
        if !seen.insert(elem.name.clone()) {
            return Err(env.bad(ErrorCase::DupPatternError(elem.name.clone())));
        }
    }

    let mut result = Vec::with_capacity(actual.len());
    for (elem, actual_ty) in pat.elems.iter().zip(actual) {
        let instantiated = instantiate_against(&elem.ty, actual_ty);
        if instantiated.rank() != actual_ty.rank() || instantiated.elem_type() != actual_ty.elem_type()
        {
            return Err(env.bad(ErrorCase::InvalidPatternError {
                pat: pattern_string(pat),
                ts: actual.iter().map(ExtType::from_type).collect(),
                note: Some(format!(
                    "`{}` declared as `{}` does not match derived type `{}`",
                    elem.name, elem.ty, actual_ty
                )),
            }));
        }
        result.push(instantiated);
    }
    Ok(result)
}

pub fn default_match_return_type<L: Lore>(
    env: &Env<L>,
    fname: &FName,
    declared: &[ExtType],
    actual: &[Type],
) -> CheckResult<()> {
    if declared.len() != actual.len() {
        return Err(env.bad(ErrorCase::ReturnTypeError {
            fname: fname.clone(),
            declared: declared.to_vec(),
            actual: actual.to_vec(),
        }));
    }
    for (d, a) in declared.iter().zip(actual) {
        let instantiated = instantiate_against(d, a);
        if !a.is_subtype_of(&instantiated) {
            return Err(env.bad(ErrorCase::ReturnTypeError {
                fname: fname.clone(),
                declared: declared.to_vec(),
                actual: actual.to_vec(),
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod checkable_tests {
    use super::*;
    use crate::ir::{CoreLore, FunBinding, PatElem, PrimType, Uniqueness, VName};
    use indexmap::IndexMap;

    fn env() -> (IndexMap<FName, FunBinding<CoreLore>>,) {
        (IndexMap::new(),)
    }

    fn scalar_i32() -> Type {
        Type::Prim(PrimType::i32())
    }

    #[test]
    fn match_pattern_rejects_arity_mismatch() {
        let (funs,) = env();
        let e: Env<CoreLore> = Env::new(&funs, true);
        let pat = Pattern::<CoreLore>::single(
            VName::new("x"),
            ExtType::Prim(PrimType::i32()),
            Default::default(),
        );
        let err = default_match_pattern(&e, &pat, &[]).unwrap_err();
        assert!(matches!(err.case, ErrorCase::InvalidPatternError { .. }));
    }

    #[test]
    fn match_pattern_rejects_duplicate_names() {
        let (funs,) = env();
        let e: Env<CoreLore> = Env::new(&funs, true);
        let pat = Pattern::<CoreLore> {
            elems: vec![
                PatElem {
                    name: VName::new("x"),
                    ty: ExtType::Prim(PrimType::i32()),
                    aliases: Default::default(),
                    attr: (),
                },
                PatElem {
                    name: VName::new("x"),
                    ty: ExtType::Prim(PrimType::i32()),
                    aliases: Default::default(),
                    attr: (),
                },
            ],
        };
        let err = default_match_pattern(&e, &pat, &[scalar_i32(), scalar_i32()]).unwrap_err();
        assert!(matches!(err.case, ErrorCase::DupPatternError(_)));
    }

    #[test]
    fn match_pattern_accepts_matching_scalar() {
        let (funs,) = env();
        let e: Env<CoreLore> = Env::new(&funs, true);
        let pat = Pattern::<CoreLore>::single(
            VName::new("x"),
            ExtType::Prim(PrimType::i32()),
            Default::default(),
        );
        let result = default_match_pattern(&e, &pat, &[scalar_i32()]).unwrap();
        assert_eq!(result, vec![scalar_i32()]);
    }

    #[test]
    fn match_return_type_rejects_rank_mismatch() {
        let (funs,) = env();
        let e: Env<CoreLore> = Env::new(&funs, true);
        let fname = FName::new("f");
        let declared = vec![ExtType::Array {
            elem: PrimType::i32(),
            shape: Shape::new(vec![Dim::Const(1)]),
            uniqueness: Uniqueness::Nonunique,
        }];
        let actual = vec![scalar_i32()];
        let err = default_match_return_type(&e, &fname, &declared, &actual).unwrap_err();
        assert!(matches!(err.case, ErrorCase::ReturnTypeError { .. }));
    }
}
