//! End-to-end scenarios S1-S6, each built as a
//! small hand-constructed program or expression and checked against the
//! public entry points.

use indexmap::IndexMap;
use pretty_assertions::assert_eq;

use shapecheck::checker::checkable::Checkable;
use shapecheck::checker::context::{Env, NameInfo};
use shapecheck::checker::occurrence::Occurrences;
use shapecheck::checker::{check_body, check_expr, check_prog_strict};
use shapecheck::diagnostics::{CheckResult, ErrorCase};
use shapecheck::ir::{
    Body, CoreLore, Diet, Expr, ExtType, FName, FunBinding, FunDef, LetBinding, Param, Pattern,
    PrimType, Program, Shape, Type, Uniqueness, VName,
};

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

fn unique_i32_array() -> Type {
    Type::array(PrimType::i32(), Shape::scalar(), Uniqueness::Unique)
}

fn nonunique_i32_array() -> Type {
    Type::array(PrimType::i32(), Shape::scalar(), Uniqueness::Nonunique)
}

fn no_builtins() -> IndexMap<FName, FunBinding<CoreLore>> {
    IndexMap::new()
}

/// A one-argument builtin that consumes its (unique) array argument and
/// hands back a scalar. Stands in for an abstract `consume(x)` builtin.
fn consuming_builtin() -> (FName, FunBinding<CoreLore>) {
    let name = FName::new("consume_builtin");
    let binding = FunBinding {
        ret_type: vec![ExtType::Prim(PrimType::i32())],
        params: vec![Param::new(VName::new("v"), unique_i32_array(), Diet::Consume)],
    };
    (name, binding)
}

/// S1: `f(a: *[]i32) = a` with declared unique return — accept: the return
/// aliases `a`, but `a` is itself declared unique, so there is no
/// non-consumed-parameter violation.
#[test]
fn s1_unique_return_of_its_own_unique_parameter_is_accepted() {
    let a = VName::new("a");
    let f = FunDef {
        name: FName::new("f"),
        ret_type: vec![ExtType::from_type(&unique_i32_array())],
        ret_attr: (),
        params: vec![Param::new(a.clone(), unique_i32_array(), Diet::Consume)],
        body: Body::just(vec![Expr::Var(a)]),
    };
    let prog = Program { funs: vec![f] };
    let result = check_prog_strict(&NoOp, &no_builtins(), &prog);
    assert!(result.is_ok(), "{result:?}");
}

/// S2: `f(a: []i32, b: *[]i32) = let b' = copy b in b'` — accept.
#[test]
fn s2_copy_before_unique_return_is_accepted() {
    let a = VName::new("a");
    let b = VName::new("b");
    let b_prime = VName::new("b_prime");
    let f = FunDef {
        name: FName::new("f"),
        ret_type: vec![ExtType::from_type(&unique_i32_array())],
        ret_attr: (),
        params: vec![
            Param::new(a, nonunique_i32_array(), Diet::Observe),
            Param::new(b.clone(), unique_i32_array(), Diet::Consume),
        ],
        body: Body {
            bindings: vec![LetBinding {
                pat: Pattern::single(
                    b_prime.clone(),
                    ExtType::from_type(&unique_i32_array()),
                    Default::default(),
                ),
                value: Box::new(Expr::Copy { array: b }),
            }],
            result: vec![Expr::Var(b_prime)],
            attr: (),
        },
    };
    let prog = Program { funs: vec![f] };
    let result = check_prog_strict(&NoOp, &no_builtins(), &prog);
    assert!(result.is_ok(), "{result:?}");
}

/// S3: `f(a: []i32) = let x = a in (x, x)` with declared return
/// `(*[]i32, []i32)` — reject with `UniqueReturnAliased`.
#[test]
fn s3_tuple_return_reusing_one_unique_alias_twice_is_rejected() {
    let a = VName::new("a");
    let x = VName::new("x");
    let f = FunDef {
        name: FName::new("f"),
        ret_type: vec![
            ExtType::from_type(&unique_i32_array()),
            ExtType::from_type(&nonunique_i32_array()),
        ],
        ret_attr: (),
        params: vec![Param::new(a.clone(), nonunique_i32_array(), Diet::Observe)],
        body: Body {
            bindings: vec![LetBinding {
                pat: Pattern::single(
                    x.clone(),
                    ExtType::from_type(&nonunique_i32_array()),
                    std::iter::once(a.clone()).collect(),
                ),
                value: Box::new(Expr::Var(a)),
            }],
            result: vec![Expr::Var(x.clone()), Expr::Var(x)],
            attr: (),
        },
    };
    let prog = Program { funs: vec![f] };
    let err = check_prog_strict(&NoOp, &no_builtins(), &prog).unwrap_err();
    assert!(matches!(err.case, ErrorCase::UniqueReturnAliased(_)));
}

/// S4: `let x = a in let _ = consume(x) in x` (where `a: *[]i32`) — reject
/// with `UseAfterConsume`.
#[test]
fn s4_referencing_a_name_after_its_alias_set_was_consumed_is_rejected() {
    let (consume_name, consume_binding) = consuming_builtin();
    let mut funs = IndexMap::new();
    funs.insert(consume_name.clone(), consume_binding);

    let a = VName::new("a");
    let x = VName::new("x");
    let discard = VName::new("_discard");

    let mut env: Env<CoreLore> = Env::new(&funs, true);
    env.insert(
        a.clone(),
        NameInfo::FParam {
            ty: unique_i32_array(),
            attr: (),
        },
    );

    let body = Body {
        bindings: vec![
            LetBinding {
                pat: Pattern::single(
                    x.clone(),
                    ExtType::from_type(&unique_i32_array()),
                    std::iter::once(a.clone()).collect(),
                ),
                value: Box::new(Expr::Var(a)),
            },
            LetBinding {
                pat: Pattern::single(discard, ExtType::Prim(PrimType::i32()), Default::default()),
                value: Box::new(Expr::Apply {
                    fname: consume_name,
                    args: vec![Expr::Var(x.clone())],
                    ret: vec![Type::Prim(PrimType::i32())],
                }),
            },
        ],
        result: vec![Expr::Var(x)],
        attr: (),
    };

    let (_, _, occ) = check_body(&NoOp, &mut env, &body).unwrap();
    let err = occ.into_checked(&env).unwrap_err();
    assert!(matches!(err.case, ErrorCase::UseAfterConsume(_)));
}

/// S5: `if c then consume(x); 0 else observe(x); 1` followed by
/// `observe(x)` — reject: the `then` branch's consumption makes the
/// trailing observation invalid.
#[test]
fn s5_observing_after_an_if_that_consumed_on_one_branch_is_rejected() {
    let (consume_name, consume_binding) = consuming_builtin();
    let mut funs = IndexMap::new();
    funs.insert(consume_name.clone(), consume_binding);

    let c = VName::new("c");
    let x = VName::new("x");
    let discard_then = VName::new("_t");
    let discard_else = VName::new("_e");
    let if_result = VName::new("_if_result");

    let mut env: Env<CoreLore> = Env::new(&funs, true);
    env.insert(
        c.clone(),
        NameInfo::FParam {
            ty: Type::Prim(PrimType::Bool),
            attr: (),
        },
    );
    env.insert(
        x.clone(),
        NameInfo::FParam {
            ty: unique_i32_array(),
            attr: (),
        },
    );

    let then_branch = Body {
        bindings: vec![LetBinding {
            pat: Pattern::single(discard_then, ExtType::Prim(PrimType::i32()), Default::default()),
            value: Box::new(Expr::Apply {
                fname: consume_name,
                args: vec![Expr::Var(x.clone())],
                ret: vec![Type::Prim(PrimType::i32())],
            }),
        }],
        result: vec![Expr::Literal(PrimType::i32(), "0".into())],
        attr: (),
    };
    let else_branch = Body {
        bindings: vec![LetBinding {
            pat: Pattern::single(discard_else, ExtType::Prim(PrimType::i32()), Default::default()),
            value: Box::new(Expr::Var(x.clone())),
        }],
        result: vec![Expr::Literal(PrimType::i32(), "1".into())],
        attr: (),
    };

    let body = Body {
        bindings: vec![LetBinding {
            pat: Pattern::single(if_result, ExtType::Prim(PrimType::i32()), Default::default()),
            value: Box::new(Expr::If {
                cond: Box::new(Expr::Var(c)),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
                result_type: vec![ExtType::Prim(PrimType::i32())],
            }),
        }],
        result: vec![Expr::Var(x)],
        attr: (),
    };

    let (_, _, occ) = check_body(&NoOp, &mut env, &body).unwrap();
    let err = occ.into_checked(&env).unwrap_err();
    assert!(matches!(err.case, ErrorCase::UseAfterConsume(_)));
}

/// S6: `concat [[1,2,3], [4,5]]` (inner shapes equal, outer sizes differ)
/// — accept types: the outer dimension is not checked structurally, only
/// the element shape.
#[test]
fn s6_concat_with_differing_outer_dimension_is_accepted() {
    let arr1 = VName::new("arr1");
    let arr2 = VName::new("arr2");

    let funs: IndexMap<FName, FunBinding<CoreLore>> = IndexMap::new();
    let mut env: Env<CoreLore> = Env::new(&funs, true);
    env.insert(
        arr1.clone(),
        NameInfo::FParam {
            ty: Type::array(
                PrimType::i32(),
                Shape::new(vec![shapecheck::ir::Dim::Const(3)]),
                Uniqueness::Nonunique,
            ),
            attr: (),
        },
    );
    env.insert(
        arr2.clone(),
        NameInfo::FParam {
            ty: Type::array(
                PrimType::i32(),
                Shape::new(vec![shapecheck::ir::Dim::Const(2)]),
                Uniqueness::Nonunique,
            ),
            attr: (),
        },
    );

    let expr = Expr::Concat { arrays: vec![arr1, arr2] };
    let (tys, _occ) = check_expr(&NoOp, &mut env, &expr).unwrap();
    assert_eq!(tys.len(), 1);
    assert!(tys[0].is_array());
}

/// S7: `f(a: [5]i32) = take_three(a)` where `take_three` declares a `[3]i32`
/// parameter — reject with `ParameterMismatch` even though both arguments
/// are rank-1 arrays of the same element type.
#[test]
fn s7_wrong_sized_array_argument_is_rejected() {
    let callee = FName::new("take_three");
    let a = VName::new("a");

    let mut funs: IndexMap<FName, FunBinding<CoreLore>> = IndexMap::new();
    let three = Type::array(
        PrimType::i32(),
        Shape::new(vec![shapecheck::ir::Dim::Const(3)]),
        Uniqueness::Nonunique,
    );
    funs.insert(
        callee.clone(),
        FunBinding {
            ret_type: vec![ExtType::Prim(PrimType::i32())],
            params: vec![Param::new(VName::new("v"), three.clone(), Diet::Observe)],
        },
    );

    let five = Type::array(
        PrimType::i32(),
        Shape::new(vec![shapecheck::ir::Dim::Const(5)]),
        Uniqueness::Nonunique,
    );
    let f = FunDef {
        name: FName::new("f"),
        ret_type: vec![ExtType::Prim(PrimType::i32())],
        ret_attr: (),
        params: vec![Param::new(a.clone(), five.clone(), Diet::Observe)],
        body: Body::just(vec![Expr::Apply {
            fname: callee,
            args: vec![Expr::Var(a)],
            ret: vec![Type::Prim(PrimType::i32())],
        }]),
    };
    let prog = Program { funs: vec![f] };
    let err = check_prog_strict(&NoOp, &funs, &prog).unwrap_err();

    match err.case {
        ErrorCase::ParameterMismatch { expected, got, .. } => {
            assert_eq!(expected, vec![three]);
            assert_eq!(got, vec![five]);
        }
        other => panic!("expected ParameterMismatch, got {other:?}"),
    }
}
