//! The function/loop/lambda harness: `checkFun'` and the unique-return
//! alias fold.
//!
//! A thin per-definition driver: reject duplicate parameter names, bind
//! parameters, run the body check, then verify the result against the
//! declared signature.

use std::collections::BTreeSet;

use crate::diagnostics::{CheckResult, ErrorCase};
use crate::ir::{ExtType, FName, Lore, Param};

use super::checkable::Checkable;
use super::context::{Env, NameInfo};
use super::expr::check_body;
use super::occurrence::{Names, Occurrence, Occurrences};

/// Rewrite consumptions recorded inside a callable's body: a consumption
/// of a name declared `consumable` is replaced by a consumption of that
/// name's current alias set (so it propagates to whatever the consumable
/// was bound from at entry); any other consumption is a type error.
pub fn consume_only_params<L: Lore>(
    env: &Env<L>,
    consumable: &Names,
    occ: Occurrences,
) -> CheckResult<Occurrences> {
    let list = match occ {
        Occurrences::Error(name) => return Ok(Occurrences::Error(name)),
        Occurrences::List(list) => list,
    };

    let mut rewritten = Vec::with_capacity(list.len());
    for o in list {
        if o.consumed.is_empty() {
            rewritten.push(o);
            continue;
        }
        let mut new_consumed = Names::new();
        for name in &o.consumed {
            if consumable.contains(name) {
                new_consumed.extend(env.aliases_of(name));
            } else {
                return Err(env.bad(ErrorCase::TypeError(format!(
                    "`{name}` is consumed but is not declared consumable in this scope"
                ))));
            }
        }
        rewritten.push(Occurrence {
            observed: o.observed,
            consumed: new_consumed,
        });
    }
    Ok(Occurrences::List(rewritten))
}

/// `checkFun'(name, returnTypes, namedParams, body, consumable, inner)`,
/// specialized to the one caller that matters at program level: a whole
/// function definition, where `inner` is always "check the body".
pub fn check_fun_prime<L: Lore, C: Checkable<L>>(
    cap: &C,
    env: &mut Env<L>,
    fname: &FName,
    return_types: &[ExtType],
    ret_attr: &L::RetTypeAttr,
    named_params: &[Param<L>],
    body: &crate::ir::Body<L>,
) -> CheckResult<()> {
    // 1. Reject duplicate parameter names.
    let mut seen = BTreeSet::new();
    for p in named_params {
        if !seen.insert(p.name.clone()) {
            return Err(env.bad(ErrorCase::DupParamError {
                fname: fname.clone(),
                pname: p.name.clone(),
            }));
        }
    }

    // 2. Bind all parameters in the environment.
    for p in named_params {
        cap.check_fparam_attr(env, &p.attr)?;
        env.insert(
            p.name.clone(),
            NameInfo::FParam {
                ty: p.ty.clone(),
                attr: p.attr.clone(),
            },
        );
    }

    let consumable: Names = named_params
        .iter()
        .filter(|p| p.ty.uniqueness().is_unique())
        .map(|p| p.name.clone())
        .collect();

    // 3. Run the body check under `consumeOnlyParams(consumable)`.
    let (body_tys, body_aliases, body_occ) =
        env.context(format!("function `{fname}`"), |env| check_body(cap, env, body))?;
    let body_occ = consume_only_params(env, &consumable, body_occ)?;
    body_occ.into_checked(env)?;

    cap.check_ret_type_attr(env, ret_attr)?;
    cap.match_return_type(env, fname, return_types, &body_tys)?;

    // 4. Unique return positions must not alias a non-consumed parameter
    //.
    check_unique_return_aliases(env, fname, return_types, &body_aliases, named_params)?;

    for p in named_params {
        env.remove(&p.name);
    }

    Ok(())
}

/// Fold across the result list, tagging each position with its declared
/// uniqueness:
/// * `Unique` — record its alias names as unique-tagged; if any was
///   already seen under any tag, raise `UniqueReturnAliased`.
/// * `Nonunique` — if any alias name was previously seen unique-tagged,
///   raise `UniqueReturnAliased`.
///
/// This runs to completion before the separate parameter-aliasing check
/// below: a conflict between two return positions is diagnosed as
/// `UniqueReturnAliased` even when one of the shared names also happens to
/// trace back to a non-consumed parameter, so that diagnostic takes
/// precedence over the parameter-level one.
fn check_unique_return_aliases<L: Lore>(
    env: &Env<L>,
    fname: &FName,
    declared: &[ExtType],
    body_aliases: &[Names],
    params: &[Param<L>],
) -> CheckResult<()> {
    let mut unique_tagged: Names = Names::new();
    let mut seen_any: Names = Names::new();

    for (d, aliases) in declared.iter().zip(body_aliases) {
        if d.uniqueness().is_unique() {
            if seen_any.intersection(aliases).next().is_some() {
                return Err(env.bad(ErrorCase::UniqueReturnAliased(fname.clone())));
            }
            unique_tagged.extend(aliases.iter().cloned());
        } else if unique_tagged.intersection(aliases).next().is_some() {
            return Err(env.bad(ErrorCase::UniqueReturnAliased(fname.clone())));
        }
        seen_any.extend(aliases.iter().cloned());
    }

    // A unique return position may not alias a parameter that the
    // function's signature never consumes (invariant: every name in a
    // unique return's alias set must either be locally produced or a
    // parameter declared `Diet::Consume`).
    let observe_params: Names = params
        .iter()
        .filter(|p| p.diet == crate::ir::Diet::Observe)
        .map(|p| p.name.clone())
        .collect();

    for (d, aliases) in declared.iter().zip(body_aliases) {
        if !d.uniqueness().is_unique() {
            continue;
        }
        for name in &observe_params {
            if aliases.contains(name) {
                return Err(env.bad(ErrorCase::ReturnAliased {
                    fname: fname.clone(),
                    vname: name.clone(),
                }));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod function_tests {
    use super::*;
    use crate::ir::{
        Body, CoreLore, Diet, FunBinding, PrimType, Shape, Type, Uniqueness, VName,
    };
    use indexmap::IndexMap;

    struct NoOp;
    impl Checkable<CoreLore> for NoOp {
        fn check_op(
            &self,
            _env: &mut Env<CoreLore>,
            op: &std::convert::Infallible,
            _attr: &(),
        ) -> CheckResult<(Vec<Type>, Occurrences)> {
            match *op {}
        }
    }

    fn funs() -> IndexMap<FName, FunBinding<CoreLore>> {
        IndexMap::new()
    }

    fn unique_arr() -> Type {
        Type::array(PrimType::i32(), Shape::new(vec![]), Uniqueness::Unique)
    }

    /// S1: `f(a: *[]i32) = a` — accept: the return aliases `a`, but `a` is
    /// itself declared unique, so there is no non-consumed-parameter
    /// violation.
    #[test]
    fn unique_return_of_unique_param_is_accepted() {
        let funs = funs();
        let mut env: Env<CoreLore> = Env::new(&funs, true);
        let cap = NoOp;
        let a = VName::new("a");
        let param = Param::new(a.clone(), unique_arr(), Diet::Consume);
        let body = Body::just(vec![crate::ir::Expr::Var(a.clone())]);
        let fname = FName::new("f");
        let ret = vec![ExtType::from_type(&unique_arr())];
        let result = check_fun_prime(&cap, &mut env, &fname, &ret, &(), &[param], &body);
        assert!(result.is_ok(), "{result:?}");
    }

    /// S3: `f(a: []i32) = let x = a in (x, x)` with declared return
    /// `(*[]i32, []i32)` — reject with `UniqueReturnAliased`.
    #[test]
    fn tuple_return_aliasing_itself_uniquely_is_rejected() {
        let funs = funs();
        let mut env: Env<CoreLore> = Env::new(&funs, true);
        let cap = NoOp;
        let a = VName::new("a");
        let x = VName::new("x");
        let nonunique_arr = Type::array(PrimType::i32(), Shape::new(vec![]), Uniqueness::Nonunique);
        let param = Param::new(a.clone(), nonunique_arr.clone(), Diet::Observe);

        let pat = crate::ir::Pattern::<CoreLore>::single(
            x.clone(),
            ExtType::from_type(&nonunique_arr),
            std::iter::once(a.clone()).collect(),
        );
        let body = crate::ir::Body {
            bindings: vec![crate::ir::LetBinding {
                pat,
                value: Box::new(crate::ir::Expr::Var(a.clone())),
            }],
            result: vec![crate::ir::Expr::Var(x.clone()), crate::ir::Expr::Var(x.clone())],
            attr: (),
        };
        let fname = FName::new("f");
        let ret = vec![
            ExtType::from_type(&unique_arr()),
            ExtType::from_type(&nonunique_arr),
        ];
        let err =
            check_fun_prime(&cap, &mut env, &fname, &ret, &(), &[param], &body).unwrap_err();
        assert!(matches!(err.case, ErrorCase::UniqueReturnAliased(_)));
    }
}
