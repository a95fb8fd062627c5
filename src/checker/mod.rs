//! Program-level entry points.
//!
//! A thin driver: build a duplicate-rejecting function lookup table once,
//! then run one fresh-context check per function. Functions may be
//! checked in any order since the table is built up front.

pub mod alias;
pub mod checkable;
pub mod context;
pub mod expr;
pub mod function;
pub mod occurrence;

pub use checkable::Checkable;
pub use context::Env;
pub use expr::{check_body, check_expr, check_lambda};

use indexmap::IndexMap;

use crate::diagnostics::{CheckResult, ErrorCase};
use crate::ir::{FName, FunBinding, Lore, Program};

/// Build the function table: builtins seeded first, then user definitions,
/// rejecting a user definition that collides with anything already present
///.
fn build_fun_table<L: Lore>(
    builtins: &IndexMap<FName, FunBinding<L>>,
    prog: &Program<L>,
) -> CheckResult<IndexMap<FName, FunBinding<L>>> {
    let mut funs = builtins.clone();
    for def in &prog.funs {
        if funs.contains_key(&def.name) {
            return Err(crate::diagnostics::TypeError::new(
                Vec::new(),
                ErrorCase::DupDefinitionError(def.name.clone()),
            ));
        }
        funs.insert(def.name.clone(), FunBinding::of(def));
    }
    Ok(funs)
}

/// `checkProg(prog, checkOccurrences)`: check every function in
/// `prog` under its own fresh, occurrence-isolated context. `builtins` is the
/// initial function table contributed by whatever prelude the caller's IR
/// flavor defines — this crate does not hardcode one,
/// since which functions are builtin is an IR-flavor concern.
pub fn check_prog<L: Lore, C: Checkable<L>>(
    cap: &C,
    builtins: &IndexMap<FName, FunBinding<L>>,
    prog: &Program<L>,
    check_occurrences: bool,
) -> CheckResult<()> {
    let funs = build_fun_table(builtins, prog)?;
    for def in &prog.funs {
        let mut env = Env::new(&funs, check_occurrences);
        function::check_fun_prime(
            cap,
            &mut env,
            &def.name,
            &def.ret_type,
            &def.ret_attr,
            &def.params,
            &def.body,
        )?;
    }
    Ok(())
}

/// `checkProg(p) → Result<unit, TypeError>`: strict uniqueness check.
pub fn check_prog_strict<L: Lore, C: Checkable<L>>(
    cap: &C,
    builtins: &IndexMap<FName, FunBinding<L>>,
    prog: &Program<L>,
) -> CheckResult<()> {
    check_prog(cap, builtins, prog, true)
}

/// `checkProgNoUniqueness(p) → Result<unit, TypeError>`: types only, with
/// consumption violations downgraded to silently-ignored.
pub fn check_prog_no_uniqueness<L: Lore, C: Checkable<L>>(
    cap: &C,
    builtins: &IndexMap<FName, FunBinding<L>>,
    prog: &Program<L>,
) -> CheckResult<()> {
    check_prog(cap, builtins, prog, false)
}

/// Pick a reportable function name when no call-site context is available
/// (e.g. an error arising before any per-function breadcrumb is pushed) —
/// analogous to `primary_def_name`.
pub fn primary_fun_name<L: Lore>(prog: &Program<L>) -> Option<&FName> {
    prog.funs.first().map(|f| &f.name)
}

#[cfg(test)]
mod mod_tests {
    use super::*;
    use crate::ir::{Body, CoreLore, Diet, Expr, ExtType, FunDef, Param, PrimType, Type};

    struct NoOp;
    impl Checkable<CoreLore> for NoOp {
        fn check_op(
            &self,
            _env: &mut Env<CoreLore>,
            op: &std::convert::Infallible,
            _attr: &(),
        ) -> CheckResult<(Vec<Type>, occurrence::Occurrences)> {
            match *op {}
        }
    }

    fn empty_builtins() -> IndexMap<FName, FunBinding<CoreLore>> {
        IndexMap::new()
    }

    fn identity_fn(name: &str) -> FunDef<CoreLore> {
        let a = crate::ir::VName::new("a");
        FunDef {
            name: FName::new(name),
            ret_type: vec![ExtType::Prim(PrimType::i32())],
            ret_attr: (),
            params: vec![Param::new(a.clone(), Type::Prim(PrimType::i32()), Diet::Observe)],
            body: Body::just(vec![Expr::Var(a)]),
        }
    }

    #[test]
    fn accepts_a_trivial_identity_function() {
        let prog = Program { funs: vec![identity_fn("f")] };
        let result = check_prog_strict(&NoOp, &empty_builtins(), &prog);
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn rejects_duplicate_function_definitions() {
        let prog = Program {
            funs: vec![identity_fn("f"), identity_fn("f")],
        };
        let err = check_prog_strict(&NoOp, &empty_builtins(), &prog).unwrap_err();
        assert!(matches!(err.case, ErrorCase::DupDefinitionError(_)));
    }

    #[test]
    fn primary_fun_name_picks_the_first_definition() {
        let prog = Program {
            funs: vec![identity_fn("main"), identity_fn("helper")],
        };
        assert_eq!(primary_fun_name(&prog).unwrap().to_string(), "main");
    }
}
