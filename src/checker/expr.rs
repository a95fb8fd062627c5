//! Per-construct expression checker.
//!
//! One match arm per construct, each arm both deriving a result type and
//! threading the occurrence log alongside the recursion.

use crate::diagnostics::{CheckResult, ErrorCase};
use crate::ir::{
    BinOp, Body, CmpOp, Dim, Diet, DoLoop, Expr, ExtType, Lambda, LoopForm, Lore, Param, PrimType,
    Shape, Type, UnOp, VName,
};

use super::alias;
use super::checkable::Checkable;
use super::context::{Env, NameInfo};
use super::function::consume_only_params;
use super::occurrence::{Names, Occurrences};

/// What checking an expression yields: its result type(s) and the
/// occurrences it recorded.
type ExprResult = CheckResult<(Vec<Type>, Occurrences)>;

fn single(ty: Type, occ: Occurrences) -> ExprResult {
    Ok((vec![ty], occ))
}

fn expect_one(env: &Env<impl Lore>, types: &[Type], what: &str) -> CheckResult<Type> {
    match types {
        [t] => Ok(t.clone()),
        _ => Err(env.bad(ErrorCase::TypeError(format!(
            "{what} must yield exactly one value, got {}",
            types.len()
        )))),
    }
}

fn expect_prim(env: &Env<impl Lore>, ty: &Type, expected: PrimType, what: &str) -> CheckResult<()> {
    match ty {
        Type::Prim(p) if *p == expected => Ok(()),
        other => Err(env.bad(ErrorCase::UnifyError {
            e1: what.to_string(),
            t1: other.clone(),
            e2: "declared operand type".to_string(),
            t2: Type::Prim(expected),
        })),
    }
}

fn expect_array<'t>(env: &Env<impl Lore>, v: &VName, ty: &'t Type) -> CheckResult<&'t Type> {
    if ty.is_array() {
        Ok(ty)
    } else {
        Err(env.bad(ErrorCase::NotAnArray(v.clone(), ty.clone())))
    }
}

fn is_permutation(perm: &[usize], rank: usize) -> bool {
    if perm.len() != rank {
        return false;
    }
    let mut seen = vec![false; rank];
    for &p in perm {
        if p >= rank || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

/// Pointwise least-upper-bound of two concrete types, materializing any
/// fresh existential the generalization introduces as a fresh dimension
/// variable.
fn generalize_concrete(a: &Type, b: &Type, env: &Env<impl Lore>) -> CheckResult<Type> {
    let mut next_ext = 0usize;
    let ea = ExtType::from_type(a);
    let eb = ExtType::from_type(b);
    let generalized = ExtType::generalize(&ea, &eb, &mut next_ext).ok_or_else(|| {
        env.bad(ErrorCase::UnifyError {
            e1: "then-branch".to_string(),
            t1: a.clone(),
            e2: "else-branch".to_string(),
            t2: b.clone(),
        })
    })?;
    Ok(generalized.instantiate(|_| Dim::Var(VName::fresh("if"))))
}

/// Best-effort conversion of a shape-sized expression to a `Dim`: a
/// literal integer or a variable reference becomes a concrete dimension;
/// anything else becomes a fresh dimension variable, since the checker
/// does not evaluate expressions.
fn expr_to_dim<L: Lore>(e: &Expr<L>) -> Dim {
    match e {
        Expr::Literal(PrimType::SignedInt(_), text) | Expr::Literal(PrimType::UnsignedInt(_), text) => {
            text.parse::<u64>().map(Dim::Const).unwrap_or_else(|_| Dim::Var(VName::fresh("n")))
        }
        Expr::Var(v) => Dim::Var(v.clone()),
        _ => Dim::Var(VName::fresh("n")),
    }
}

pub fn check_expr<L: Lore, C: Checkable<L>>(
    cap: &C,
    env: &mut Env<L>,
    expr: &Expr<L>,
) -> ExprResult {
    match expr {
        Expr::Literal(p, _) => single(Type::Prim(*p), Occurrences::default()),

        Expr::Var(v) => {
            let ty = env.lookup_var(v)?.ty().clone();
            let occ = alias::observe(env, v)?;
            single(ty, Occurrences::single(occ))
        }

        Expr::BinOp { op: _, ty, left, right } => {
            let (lt, locc) = check_expr(cap, env, left)?;
            let lt = expect_one(env, &lt, "binary operand")?;
            expect_prim(env, &lt, *ty, "left operand")?;
            let (rt, rocc) = check_expr(cap, env, right)?;
            let rt = expect_one(env, &rt, "binary operand")?;
            expect_prim(env, &rt, *ty, "right operand")?;
            single(Type::Prim(*ty), locc.seq(rocc))
        }

        Expr::UnOp { op: _, ty, operand } => {
            let (ot, occ) = check_expr(cap, env, operand)?;
            let ot = expect_one(env, &ot, "unary operand")?;
            expect_prim(env, &ot, *ty, "operand")?;
            single(Type::Prim(*ty), occ)
        }

        Expr::CmpOp { op: _, ty, left, right } => {
            let (lt, locc) = check_expr(cap, env, left)?;
            let lt = expect_one(env, &lt, "comparison operand")?;
            expect_prim(env, &lt, *ty, "left operand")?;
            let (rt, rocc) = check_expr(cap, env, right)?;
            let rt = expect_one(env, &rt, "comparison operand")?;
            expect_prim(env, &rt, *ty, "right operand")?;
            single(Type::Prim(PrimType::Bool), locc.seq(rocc))
        }

        Expr::Convert { target, operand } => {
            let (ot, occ) = check_expr(cap, env, operand)?;
            let ot = expect_one(env, &ot, "convert operand")?;
            match ot {
                Type::Prim(p) if p.is_numeric() || p == PrimType::Bool => {}
                other => {
                    return Err(env.bad(ErrorCase::UnexpectedType {
                        expr: "convert operand".to_string(),
                        actual: other,
                        allowed: vec![],
                    }));
                }
            }
            single(Type::Prim(*target), occ)
        }

        Expr::ArrayLit { elem_type, elems } => {
            let mut occ = Occurrences::default();
            for e in elems {
                let (et, eocc) = check_expr(cap, env, e)?;
                let et = expect_one(env, &et, "array literal element")?;
                expect_prim(env, &et, *elem_type, "array literal element")?;
                occ = occ.seq(eocc);
            }
            single(
                Type::array(
                    *elem_type,
                    Shape::new(vec![Dim::Const(elems.len() as u64)]),
                    crate::ir::Uniqueness::Nonunique,
                ),
                occ,
            )
        }

        Expr::Index { array, indices, cert } => {
            let arr_ty = env.lookup_var(array)?.ty().clone();
            let arr_ty = expect_array(env, array, &arr_ty)?.clone();
            let rank = arr_ty.rank();
            if indices.len() > rank {
                return Err(env.bad(ErrorCase::IndexingError {
                    rank,
                    got: indices.len(),
                }));
            }
            let mut occ = Occurrences::single(alias::observe(env, array)?);
            for idx in indices {
                let (it, iocc) = check_expr(cap, env, idx)?;
                let it = expect_one(env, &it, "index")?;
                expect_prim(env, &it, PrimType::i32(), "index")?;
                occ = occ.seq(iocc);
            }
            if let Some(c) = cert {
                let cty = env.lookup_var(c)?.ty().clone();
                if matches!(cty, Type::Prim(p) if p.is_cert()) {
                    occ = occ.seq(Occurrences::single(alias::observe(env, c)?));
                } else {
                    return Err(env.bad(ErrorCase::BadAnnotation {
                        desc: "index certificate".to_string(),
                        expected: "cert".to_string(),
                        got: cty.to_string(),
                    }));
                }
            }
            let elem = arr_ty.elem_type();
            let result = if indices.len() == rank {
                Type::Prim(elem)
            } else {
                let dims = match &arr_ty {
                    Type::Array { shape, .. } => shape.dims[indices.len()..].to_vec(),
                    _ => unreachable!("checked above"),
                };
                Type::array(elem, Shape::new(dims), crate::ir::Uniqueness::Nonunique)
            };
            single(result, occ)
        }

        Expr::Iota { n, elem_type } => {
            let (nt, occ) = check_expr(cap, env, n)?;
            let nt = expect_one(env, &nt, "iota bound")?;
            expect_prim(env, &nt, PrimType::i32(), "iota bound")?;
            let dim = expr_to_dim(n);
            single(
                Type::array(*elem_type, Shape::new(vec![dim]), crate::ir::Uniqueness::Unique),
                occ,
            )
        }

        Expr::Replicate { shape, value } => {
            let mut occ = Occurrences::default();
            let mut dims = Vec::new();
            for s in shape {
                let (st, socc) = check_expr(cap, env, s)?;
                let st = expect_one(env, &st, "replicate shape")?;
                expect_prim(env, &st, PrimType::i32(), "replicate shape")?;
                dims.push(expr_to_dim(s));
                occ = occ.seq(socc);
            }
            let (vt, vocc) = check_expr(cap, env, value)?;
            let vt = expect_one(env, &vt, "replicate value")?;
            occ = occ.seq(vocc);
            match vt {
                Type::Prim(p) => single(
                    Type::array(p, Shape::new(dims), crate::ir::Uniqueness::Unique),
                    occ,
                ),
                Type::Array { elem, shape: inner, .. } => {
                    dims.extend(inner.dims);
                    single(
                        Type::array(elem, Shape::new(dims), crate::ir::Uniqueness::Unique),
                        occ,
                    )
                }
            }
        }

        Expr::Scratch { elem_type, shape } => {
            let mut occ = Occurrences::default();
            let mut dims = Vec::new();
            for s in shape {
                let (st, socc) = check_expr(cap, env, s)?;
                let st = expect_one(env, &st, "scratch shape")?;
                expect_prim(env, &st, PrimType::i32(), "scratch shape")?;
                dims.push(expr_to_dim(s));
                occ = occ.seq(socc);
            }
            single(
                Type::array(*elem_type, Shape::new(dims), crate::ir::Uniqueness::Unique),
                occ,
            )
        }

        Expr::Reshape { new_shape, array } => {
            let arr_ty = env.lookup_var(array)?.ty().clone();
            let arr_ty = expect_array(env, array, &arr_ty)?.clone();
            let mut occ = Occurrences::single(alias::observe(env, array)?);
            let mut dims = Vec::new();
            for s in new_shape {
                let (st, socc) = check_expr(cap, env, s)?;
                let st = expect_one(env, &st, "reshape dimension")?;
                expect_prim(env, &st, PrimType::i32(), "reshape dimension")?;
                dims.push(expr_to_dim(s));
                occ = occ.seq(socc);
            }
            single(
                Type::array(arr_ty.elem_type(), Shape::new(dims), arr_ty.uniqueness()),
                occ,
            )
        }

        Expr::Rearrange { perm, array } => {
            let arr_ty = env.lookup_var(array)?.ty().clone();
            let arr_ty = expect_array(env, array, &arr_ty)?.clone();
            let rank = arr_ty.rank();
            if !is_permutation(perm, rank) {
                return Err(env.bad(ErrorCase::PermutationError {
                    perm: perm.clone(),
                    rank,
                    arr: array.clone(),
                }));
            }
            let occ = Occurrences::single(alias::observe(env, array)?);
            let dims = match &arr_ty {
                Type::Array { shape, .. } => perm.iter().map(|&i| shape.dims[i].clone()).collect(),
                _ => unreachable!("checked above"),
            };
            single(
                Type::array(arr_ty.elem_type(), Shape::new(dims), arr_ty.uniqueness()),
                occ,
            )
        }

        Expr::Split { sizes, array } => {
            let arr_ty = env.lookup_var(array)?.ty().clone();
            let arr_ty = expect_array(env, array, &arr_ty)?.clone();
            let mut occ = Occurrences::single(alias::observe(env, array)?);
            let mut results = Vec::new();
            // The sum of `sizes` is not checked against the outer dimension
            // here, matching the upstream checker.
            for s in sizes {
                let (st, socc) = check_expr(cap, env, s)?;
                let st = expect_one(env, &st, "split size")?;
                expect_prim(env, &st, PrimType::i32(), "split size")?;
                occ = occ.seq(socc);
                let mut dims = match &arr_ty {
                    Type::Array { shape, .. } => shape.dims.clone(),
                    _ => unreachable!("checked above"),
                };
                dims[0] = expr_to_dim(s);
                results.push(Type::array(
                    arr_ty.elem_type(),
                    Shape::new(dims),
                    arr_ty.uniqueness(),
                ));
            }
            Ok((results, occ))
        }

        Expr::Concat { arrays } => {
            let mut occ = Occurrences::default();
            let mut tys = Vec::new();
            for a in arrays {
                let ty = env.lookup_var(a)?.ty().clone();
                let ty = expect_array(env, a, &ty)?.clone();
                occ = occ.seq(Occurrences::single(alias::observe(env, a)?));
                tys.push((a.clone(), ty));
            }
            let (first_name, first_ty) = tys.first().ok_or_else(|| {
                env.bad(ErrorCase::TypeError("concat requires at least one array".into()))
            })?;
            let first_inner: &[Dim] = match first_ty {
                Type::Array { shape, .. } if !shape.dims.is_empty() => &shape.dims[1..],
                _ => {
                    return Err(env.bad(ErrorCase::NotAnArray(first_name.clone(), first_ty.clone())));
                }
            };
            for (name, ty) in &tys[1..] {
                let inner = match ty {
                    Type::Array { shape, .. } if !shape.dims.is_empty() => &shape.dims[1..],
                    _ => return Err(env.bad(ErrorCase::NotAnArray(name.clone(), ty.clone()))),
                };
                if inner != first_inner || ty.elem_type() != first_ty.elem_type() {
                    return Err(env.bad(ErrorCase::TypeError(format!(
                        "`{name}`'s inner shape does not match the other arrays being concatenated"
                    ))));
                }
            }
            let mut dims = vec![Dim::Var(VName::fresh("concat"))];
            dims.extend_from_slice(first_inner);
            single(
                Type::array(first_ty.elem_type(), Shape::new(dims), crate::ir::Uniqueness::Nonunique),
                occ,
            )
        }

        Expr::Copy { array } => {
            let ty = env.lookup_var(array)?.ty().clone();
            let occ = Occurrences::single(alias::observe(env, array)?);
            let unique_ty = match ty {
                Type::Prim(p) => Type::Prim(p),
                Type::Array { elem, shape, .. } => Type::array(elem, shape, crate::ir::Uniqueness::Unique),
            };
            single(unique_ty, occ)
        }

        Expr::Assert { cond, message: _ } => {
            let (ct, occ) = check_expr(cap, env, cond)?;
            let ct = expect_one(env, &ct, "assert condition")?;
            expect_prim(env, &ct, PrimType::Bool, "assert condition")?;
            single(Type::Prim(PrimType::Cert), occ)
        }

        Expr::Partition { num_classes, array, classify } => {
            let arr_ty = env.lookup_var(array)?.ty().clone();
            let arr_ty = expect_array(env, array, &arr_ty)?.clone();
            let mut occ = Occurrences::single(alias::observe(env, array)?);
            let (lambda_ret, lambda_occ) =
                check_lambda(cap, env, classify, &[Type::Prim(arr_ty.elem_type())])?;
            match lambda_ret.as_slice() {
                [Type::Prim(p)] if p.is_numeric() => {}
                _ => {
                    return Err(env.bad(ErrorCase::TypeError(
                        "partition classifier must return a single integer class id".into(),
                    )));
                }
            }
            let mut results = Vec::with_capacity(*num_classes);
            for _ in 0..*num_classes {
                results.push(arr_ty.clone());
            }
            occ = occ.seq(lambda_occ);
            Ok((results, occ))
        }

        Expr::If { cond, then_branch, else_branch, result_type } => {
            let (ct, cond_occ) = check_expr(cap, env, cond)?;
            let ct = expect_one(env, &ct, "if condition")?;
            expect_prim(env, &ct, PrimType::Bool, "if condition")?;

            let (then_tys, _, then_occ) =
                env.context("then branch", |env| check_body(cap, env, then_branch))?;
            let (else_tys, _, else_occ) =
                env.context("else branch", |env| check_body(cap, env, else_branch))?;

            if then_tys.len() != else_tys.len() || then_tys.len() != result_type.len() {
                return Err(env.bad(ErrorCase::TypeError(
                    "if-expression branches disagree on result arity".into(),
                )));
            }

            let mut results = Vec::with_capacity(then_tys.len());
            for ((t, e), declared) in then_tys.iter().zip(&else_tys).zip(result_type) {
                let generalized = generalize_concrete(t, e, env)?;
                if !generalized.is_subtype_of(&super::checkable::instantiate_against(declared, &generalized)) {
                    return Err(env.bad(ErrorCase::TypeError(format!(
                        "if-expression result `{generalized}` does not match annotated type `{declared}`"
                    ))));
                }
                results.push(generalized);
            }

            let occ = cond_occ.seq(then_occ.alt(else_occ));
            Ok((results, occ))
        }

        Expr::Apply { fname, args, ret } => {
            let binding = env.lookup_fun(fname)?.clone();
            let mut arg_tys = Vec::with_capacity(args.len());
            let mut occ = Occurrences::default();
            for a in args {
                let (at, aocc) = check_expr(cap, env, a)?;
                let at = expect_one(env, &at, "call argument")?;
                arg_tys.push(at);
                occ = occ.seq(aocc);
            }
            if arg_tys.len() != binding.params.len() {
                return Err(env.bad(ErrorCase::ParameterMismatch {
                    fname: fname.clone(),
                    expected: binding.params.iter().map(|p| p.ty.clone()).collect(),
                    got: arg_tys,
                }));
            }
            for (at, p) in arg_tys.iter().zip(&binding.params) {
                if !at.is_subtype_of(&p.ty) {
                    return Err(env.bad(ErrorCase::ParameterMismatch {
                        fname: fname.clone(),
                        expected: binding.params.iter().map(|p| p.ty.clone()).collect(),
                        got: arg_tys.clone(),
                    }));
                }
            }
            for (a, p) in args.iter().zip(&binding.params) {
                if p.diet == Diet::Consume {
                    let consumed = match a {
                        Expr::Var(v) => env.aliases_of(v),
                        _ => Names::new(),
                    };
                    occ = occ.seq(Occurrences::single(alias::consume(consumed)));
                }
            }
            let anchor = arg_tys.first().cloned();
            let derived: Vec<Type> = binding
                .ret_type
                .iter()
                .map(|ext| match &anchor {
                    Some(a) => super::checkable::instantiate_against(ext, a),
                    None => ext.instantiate(|_| Dim::Var(VName::fresh("ret"))),
                })
                .collect();
            if &derived != ret {
                return Err(env.bad(ErrorCase::BadAnnotation {
                    desc: format!("return type of call to `{fname}`"),
                    expected: derived.iter().map(Type::to_string).collect::<Vec<_>>().join(", "),
                    got: ret.iter().map(Type::to_string).collect::<Vec<_>>().join(", "),
                }));
            }
            Ok((ret.clone(), occ))
        }

        Expr::DoLoop(doloop) => check_do_loop(cap, env, doloop),

        Expr::Op(op, attr) => {
            cap.check_exp_attr(env, attr)?;
            cap.check_op(env, op, attr)
        }
    }
}

pub fn check_lambda<L: Lore, C: Checkable<L>>(
    cap: &C,
    env: &mut Env<L>,
    lambda: &Lambda<L>,
    arg_types: &[Type],
) -> CheckResult<(Vec<Type>, Occurrences)> {
    if lambda.params.len() != arg_types.len() {
        return Err(env.bad(ErrorCase::ParameterMismatch {
            fname: crate::ir::FName::new("<lambda>"),
            expected: lambda.params.iter().map(|p| p.ty.clone()).collect(),
            got: arg_types.to_vec(),
        }));
    }
    env.context("lambda", |env| {
        let mut bound = Vec::new();
        for (p, at) in lambda.params.iter().zip(arg_types) {
            cap.check_fparam_attr(env, &p.attr)?;
            if !at.is_subtype_of(&p.ty) {
                return Err(env.bad(ErrorCase::ParameterMismatch {
                    fname: crate::ir::FName::new("<lambda>"),
                    expected: lambda.params.iter().map(|p| p.ty.clone()).collect(),
                    got: arg_types.to_vec(),
                }));
            }
            env.insert(
                p.name.clone(),
                NameInfo::LParam {
                    ty: p.ty.clone(),
                    attr: p.attr.clone(),
                },
            );
            bound.push(p.name.clone());
        }
        let (tys, _, occ) = check_body(cap, env, &lambda.body)?;
        for name in &bound {
            env.remove(name);
        }
        let occ = occ.unoccur(&bound.into_iter().collect());
        Ok((tys, occ))
    })
}

/// Check a body, returning its result type(s), the alias set each result
/// position carries at the point of return (needed by the unique-return
/// fold), and the accumulated occurrences.
pub fn check_body<L: Lore, C: Checkable<L>>(
    cap: &C,
    env: &mut Env<L>,
    body: &Body<L>,
) -> CheckResult<(Vec<Type>, Vec<Names>, Occurrences)> {
    cap.check_body_attr(env, &body.attr)?;
    let mut occ = Occurrences::default();
    let mut bound: Vec<VName> = Vec::new();

    for binding in &body.bindings {
        let (rhs_tys, rhs_occ) =
            env.context(format!("let binding `{}`", pattern_label(&binding.pat)), |env| {
                check_expr(cap, env, &binding.value)
            })?;
        occ = occ.seq(rhs_occ);

        let instantiated = cap.match_pattern(env, &binding.pat, &rhs_tys)?;
        for (elem, ty) in binding.pat.elems.iter().zip(instantiated) {
            if env.is_bound(&elem.name) {
                return Err(env.bad(ErrorCase::TypeError(format!(
                    "`{}` is already bound in this scope; shadowing is not permitted",
                    elem.name
                ))));
            }
            cap.check_let_attr(env, &elem.attr)?;
            alias::bind_let(env, elem.name.clone(), ty, elem.aliases.clone(), elem.attr.clone());
            bound.push(elem.name.clone());
        }
    }

    let mut result_tys = Vec::new();
    let mut result_aliases = Vec::new();
    for r in &body.result {
        let (rt, rocc) = check_expr(cap, env, r)?;
        result_aliases.push(result_alias_set(env, r));
        result_tys.extend(rt);
        occ = occ.seq(rocc);
    }

    for name in &bound {
        env.remove(name);
    }
    let occ = occ.unoccur(&bound.into_iter().collect());
    Ok((result_tys, result_aliases, occ))
}

/// The alias set a result expression contributes at a function's return
/// boundary. A bare variable reference contributes its (expanded) alias
/// set; any other expression produces a fresh value with no aliases.
fn result_alias_set<L: Lore>(env: &Env<L>, e: &Expr<L>) -> Names {
    match e {
        Expr::Var(v) => env.aliases_of(v),
        _ => Names::new(),
    }
}

fn pattern_label<L: Lore>(pat: &crate::ir::Pattern<L>) -> String {
    let names: Vec<String> = pat.names().map(|n| n.to_string()).collect();
    names.join(", ")
}

fn check_do_loop<L: Lore, C: Checkable<L>>(
    cap: &C,
    env: &mut Env<L>,
    doloop: &DoLoop<L>,
) -> ExprResult {
    let (mut params, mut args): (Vec<Param<L>>, Vec<Expr<L>>) = (Vec::new(), Vec::new());
    match &doloop.form {
        LoopForm::ForLoop { var, bound } => {
            params.push(Param::new(var.clone(), Type::Prim(PrimType::i32()), Diet::Observe));
            args.push((**bound).clone());
        }
        LoopForm::WhileLoop { cond_name } => {
            let is_bool_merge = doloop
                .merge
                .iter()
                .any(|(p, _)| &p.name == cond_name && p.ty == Type::Prim(PrimType::Bool));
            if !is_bool_merge {
                return Err(env.bad(ErrorCase::TypeError(format!(
                    "`{cond_name}` is not a boolean merge parameter of this loop"
                ))));
            }
        }
    }
    for (p, e) in &doloop.merge {
        params.push(p.clone());
        args.push(e.clone());
    }

    let mut init_occ = Occurrences::default();
    let mut arg_tys = Vec::with_capacity(args.len());
    for a in &args {
        let (at, aocc) = check_expr(cap, env, a)?;
        let at = expect_one(env, &at, "loop argument")?;
        arg_tys.push(at);
        init_occ = init_occ.seq(aocc);
    }
    for (at, p) in arg_tys.iter().zip(&params) {
        if !at.is_subtype_of(&p.ty) {
            return Err(env.bad(ErrorCase::ParameterMismatch {
                fname: crate::ir::FName::new("<loop>"),
                expected: params.iter().map(|p| p.ty.clone()).collect(),
                got: arg_tys.clone(),
            }));
        }
    }

    let consumable: Names = params
        .iter()
        .filter(|p| p.ty.uniqueness().is_unique())
        .map(|p| p.name.clone())
        .collect();

    let (body_tys, body_occ) = env.context("loop body", |env| {
        let mut bound = Vec::new();
        for p in &params {
            cap.check_fparam_attr(env, &p.attr)?;
            env.insert(
                p.name.clone(),
                NameInfo::FParam {
                    ty: p.ty.clone(),
                    attr: p.attr.clone(),
                },
            );
            bound.push(p.name.clone());
        }
        let (tys, _, occ) = check_body(cap, env, &doloop.body)?;
        let occ = consume_only_params(env, &consumable, occ)?;
        for name in &bound {
            env.remove(name);
        }
        let occ = occ.unoccur(&bound.into_iter().collect());
        Ok((tys, occ))
    })?;

    let merge_tys: Vec<Type> = doloop.merge.iter().map(|(p, _)| p.ty.clone()).collect();
    if body_tys.len() != merge_tys.len() {
        return Err(env.bad(ErrorCase::TypeError(
            "loop body does not return one value per merge parameter".into(),
        )));
    }
    for (bt, mt) in body_tys.iter().zip(&merge_tys) {
        if !bt.rank_shaped().is_subtype_of(&mt.rank_shaped()) {
            return Err(env.bad(ErrorCase::TypeError(format!(
                "loop body result `{bt}` is not compatible with merge type `{mt}`"
            ))));
        }
    }

    Ok((merge_tys, init_occ.seq(body_occ)))
}
