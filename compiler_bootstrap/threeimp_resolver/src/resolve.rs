//! The recursive scope walk (component C5). Grounded on
//! `ss-core/rewrite.cc`'s `Scoper`, reworked as a single verifiably-correct
//! recursive `refer` rather than a literal port -- see `DESIGN.md` for why
//! (the original's multi-level free-variable index into
//! `inuse_nonlocal_defs` did not survive a closer reading).

use std::collections::HashSet;

use threeimp_common::ThreeImpError;
use threeimp_intern::SymbolId;
use threeimp_value::Object;
use threeimp_vcode::GlobalTable;

use crate::form::{self, Form};
use crate::ir::{FreeCapture, LambdaInfo, RelScope, ResolvedExpr};

struct Scope {
    locals: Vec<SymbolId>,
    locals_boxed: Vec<bool>,
    free: Vec<(SymbolId, FreeCapture)>,
}

/// Resolve a whole top-level program (one [`Object`] datum per form). Every
/// top-level `define` is registered before any form's body is resolved, so
/// forward and mutually-recursive global references resolve structurally;
/// whether the reference was *actually* initialized when used is a runtime
/// concern (`ThreeImpError::RuntimeLookup`), not a scope error.
pub fn resolve_program(globals: &mut GlobalTable, program: &[Object]) -> Result<Vec<ResolvedExpr>, ThreeImpError> {
    log::debug!("resolver: resolving {} top-level form(s)", program.len());
    let forms = program.iter().map(|&datum| form::parse(datum)).collect::<Result<Vec<_>, _>>()?;

    for top in &forms {
        if let Form::Define(name, _) = top {
            if globals.lookup(*name).is_some() {
                return Err(ThreeImpError::scope(
                    format!(
                        "redefinition of global `{}`; use set! to update an existing binding",
                        threeimp_intern::name(*name)
                    ),
                    None,
                ));
            }
            globals.define(*name, None, None, None);
        }
    }

    forms.into_iter().map(|top| resolve_top_level(globals, top)).collect()
}

fn resolve_top_level(globals: &mut GlobalTable, top: Form) -> Result<ResolvedExpr, ThreeImpError> {
    match top {
        Form::Define(name, val) => {
            let mut scopes = Vec::new();
            let resolved_val = resolve_expr(&mut scopes, globals, &val)?;
            let id = globals.lookup(name).expect("resolve_program pre-registers every top-level define");
            Ok(ResolvedExpr::Define(id, Box::new(resolved_val)))
        }
        other => resolve_expr(&mut Vec::new(), globals, &other),
    }
}

fn resolve_expr(scopes: &mut Vec<Scope>, globals: &mut GlobalTable, form: &Form) -> Result<ResolvedExpr, ThreeImpError> {
    match form {
        Form::Const(obj) => Ok(ResolvedExpr::Const(*obj)),
        Form::Quote(obj) => Ok(ResolvedExpr::Quote(*obj)),
        Form::Symbol(sym) => {
            let (scope, idx) = refer(scopes, globals, *sym, false)?;
            Ok(ResolvedExpr::Refer(scope, idx, *sym))
        }
        Form::If(c, t, e) => Ok(ResolvedExpr::If(
            Box::new(resolve_expr(scopes, globals, c)?),
            Box::new(resolve_expr(scopes, globals, t)?),
            Box::new(resolve_expr(scopes, globals, e)?),
        )),
        Form::Set(sym, val) => {
            let resolved_val = resolve_expr(scopes, globals, val)?;
            let (scope, idx) = refer(scopes, globals, *sym, true)?;
            Ok(ResolvedExpr::Assign(scope, idx, *sym, Box::new(resolved_val)))
        }
        Form::Lambda(formals, body) => resolve_lambda(scopes, globals, formals, body),
        Form::Begin(forms) => Ok(ResolvedExpr::Begin(
            forms.iter().map(|f| resolve_expr(scopes, globals, f)).collect::<Result<_, _>>()?,
        )),
        Form::CallCc(f) => Ok(ResolvedExpr::CallCc(Box::new(resolve_expr(scopes, globals, f)?))),
        Form::Define(..) => Err(ThreeImpError::scope("define: only allowed at the top level", None)),
        Form::PInvoke(name, args) => Ok(ResolvedExpr::PInvoke(
            *name,
            args.iter().map(|a| resolve_expr(scopes, globals, a)).collect::<Result<_, _>>()?,
        )),
        Form::App(fun, args) => Ok(ResolvedExpr::App(
            Box::new(resolve_expr(scopes, globals, fun)?),
            args.iter().map(|a| resolve_expr(scopes, globals, a)).collect::<Result<_, _>>()?,
        )),
    }
}

fn resolve_lambda(
    scopes: &mut Vec<Scope>,
    globals: &mut GlobalTable,
    formals: &[SymbolId],
    body: &Form,
) -> Result<ResolvedExpr, ThreeImpError> {
    let mut seen = HashSet::new();
    for f in formals {
        if !seen.insert(*f) {
            return Err(ThreeImpError::scope(
                format!("duplicate formal parameter: {}", threeimp_intern::name(*f)),
                None,
            ));
        }
    }

    let mut mutated = HashSet::new();
    collect_set_targets(body, &mut mutated);
    let locals_boxed: Vec<bool> = formals.iter().map(|s| mutated.contains(s)).collect();

    scopes.push(Scope { locals: formals.to_vec(), locals_boxed: locals_boxed.clone(), free: Vec::new() });
    let resolved_body = resolve_expr(scopes, globals, body)?;
    let scope = scopes.pop().expect("resolve_lambda: scope stack underflow");

    Ok(ResolvedExpr::Lambda(std::rc::Rc::new(LambdaInfo {
        n_params: formals.len(),
        locals_boxed,
        free: scope.free.into_iter().map(|(_, capture)| capture).collect(),
        body: resolved_body,
    })))
}

/// Symbols that are the target of `set!` anywhere within `form`, not
/// counting occurrences shadowed by a nested lambda that rebinds the same
/// name. The `Box` instruction exists precisely to convert such a local
/// into a shared mutable cell at lambda entry -- see
/// `LambdaInfo::locals_boxed`.
fn collect_set_targets(form: &Form, out: &mut HashSet<SymbolId>) {
    match form {
        Form::Const(_) | Form::Symbol(_) | Form::Quote(_) => {}
        Form::Set(sym, val) => {
            out.insert(*sym);
            collect_set_targets(val, out);
        }
        Form::If(c, t, e) => {
            collect_set_targets(c, out);
            collect_set_targets(t, out);
            collect_set_targets(e, out);
        }
        Form::Lambda(formals, body) => {
            let mut inner = HashSet::new();
            collect_set_targets(body, &mut inner);
            let shadowed: HashSet<_> = formals.iter().copied().collect();
            out.extend(inner.into_iter().filter(|s| !shadowed.contains(s)));
        }
        Form::Begin(forms) => forms.iter().for_each(|f| collect_set_targets(f, out)),
        Form::CallCc(f) => collect_set_targets(f, out),
        Form::Define(_, val) => collect_set_targets(val, out),
        Form::PInvoke(_, args) => args.iter().for_each(|a| collect_set_targets(a, out)),
        Form::App(fun, args) => {
            collect_set_targets(fun, out);
            args.iter().for_each(|a| collect_set_targets(a, out));
        }
    }
}

/// Classify `sym` as local, free or global relative to `scopes` (innermost
/// last), threading a free-variable capture chain through every
/// intervening scope when it is found in some enclosing-but-not-innermost
/// scope. `is_assign` only affects the global case, where it marks the
/// slot mutated.
fn refer(
    scopes: &mut [Scope],
    globals: &mut GlobalTable,
    sym: SymbolId,
    is_assign: bool,
) -> Result<(RelScope, usize), ThreeImpError> {
    if scopes.is_empty() {
        return Ok((RelScope::Global, refer_global(globals, sym, is_assign)));
    }

    let last = scopes.len() - 1;
    if let Some(idx) = scopes[last].locals.iter().position(|&s| s == sym) {
        return Ok((RelScope::Local, idx));
    }

    let owner = (0..last).rev().find(|&i| scopes[i].locals.contains(&sym));
    let Some(owner) = owner else {
        return Ok((RelScope::Global, refer_global(globals, sym, is_assign)));
    };

    if let Some(pos) = scopes[last].free.iter().position(|(s, _)| *s == sym) {
        return Ok((RelScope::Free, pos));
    }

    let owner_idx = scopes[owner].locals.iter().position(|&s| s == sym).unwrap();
    let mut capture = FreeCapture {
        scope: RelScope::Local,
        index: owner_idx,
        boxed: scopes[owner].locals_boxed[owner_idx],
    };
    for j in (owner + 1)..=last {
        if let Some(pos) = scopes[j].free.iter().position(|(s, _)| *s == sym) {
            let boxed = scopes[j].free[pos].1.boxed;
            capture = FreeCapture { scope: RelScope::Free, index: pos, boxed };
        } else {
            let boxed = capture.boxed;
            let pos = scopes[j].free.len();
            scopes[j].free.push((sym, capture));
            capture = FreeCapture { scope: RelScope::Free, index: pos, boxed };
        }
    }
    Ok((RelScope::Free, capture.index))
}

fn refer_global(globals: &mut GlobalTable, sym: SymbolId, is_assign: bool) -> usize {
    let id = globals.define(sym, None, None, None);
    if is_assign {
        globals.mark_mutated(id);
    }
    id
}

/// Whether `scope`/`index` on a [`ResolvedExpr::Refer`]/`Assign` inside the
/// lambda owning `info` must go through a boxed cell. Local slots consult
/// `info.locals_boxed` directly; free slots consult the capture's own
/// `boxed` flag, which was propagated from the variable's original local
/// binding site through every intervening free-variable pass-through
/// (`FreeCapture::boxed`) -- a free variable that is never `set!` anywhere
/// is captured by raw value and must not be indirected.
pub fn is_boxed(info: &LambdaInfo, scope: RelScope, index: usize) -> bool {
    match scope {
        RelScope::Local => info.locals_boxed[index],
        RelScope::Free => info.free[index].boxed,
        RelScope::Global => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threeimp_intern::intern;
    use threeimp_memory::Heap;

    fn sym(s: &str) -> Object {
        Object::symbol(intern(s))
    }

    fn list(heap: &Heap, items: &[Object]) -> Object {
        threeimp_value::list(heap, items).unwrap()
    }

    #[test]
    fn plain_reference_resolves_to_global() {
        let mut globals = GlobalTable::new();
        let program = [sym("undefined-name-for-test")];
        let resolved = resolve_program(&mut globals, &program).unwrap();
        match &resolved[0] {
            ResolvedExpr::Refer(RelScope::Global, ..) => {}
            other => panic!("expected a global reference, got {other:?}"),
        }
    }

    #[test]
    fn lambda_formal_is_local() {
        let mut globals = GlobalTable::new();
        let heap = Heap::new(64);
        let x = sym("x");
        let datum = list(&heap, &[sym("lambda"), list(&heap, &[x]), x]);
        let resolved = resolve_program(&mut globals, &[datum]).unwrap();
        match &resolved[0] {
            ResolvedExpr::Lambda(info) => match &info.body {
                ResolvedExpr::Refer(RelScope::Local, 0, _) => {}
                other => panic!("expected local ref, got {other:?}"),
            },
            other => panic!("expected a lambda, got {other:?}"),
        }
    }

    #[test]
    fn nested_lambda_captures_enclosing_formal_as_free() {
        let mut globals = GlobalTable::new();
        let heap = Heap::new(64);
        let x = sym("x");
        let inner = list(&heap, &[sym("lambda"), Object::NULL, x]);
        let outer = list(&heap, &[sym("lambda"), list(&heap, &[x]), inner]);
        let resolved = resolve_program(&mut globals, &[outer]).unwrap();
        let ResolvedExpr::Lambda(outer_info) = &resolved[0] else { panic!("expected lambda") };
        let ResolvedExpr::Lambda(inner_info) = &outer_info.body else { panic!("expected nested lambda") };
        assert_eq!(inner_info.free.len(), 1);
        match inner_info.free[0] {
            FreeCapture { scope: RelScope::Local, index: 0, boxed: false } => {}
            other => panic!("expected capture of outer local 0, got {other:?}"),
        }
        match &inner_info.body {
            ResolvedExpr::Refer(RelScope::Free, 0, _) => {}
            other => panic!("expected free ref, got {other:?}"),
        }
    }

    #[test]
    fn mutated_captured_local_is_boxed_only_when_set() {
        let mut globals = GlobalTable::new();
        let heap = Heap::new(64);
        let x = sym("x");
        let y = sym("y");
        let set_x = list(&heap, &[sym("set!"), x, Object::integer(1).unwrap()]);
        let body = list(&heap, &[sym("begin"), set_x, x]);
        let outer = list(&heap, &[sym("lambda"), list(&heap, &[x, y]), body]);
        let resolved = resolve_program(&mut globals, &[outer]).unwrap();
        let ResolvedExpr::Lambda(info) = &resolved[0] else { panic!("expected lambda") };
        assert_eq!(info.locals_boxed, vec![true, false]);
    }

    #[test]
    fn free_capture_is_boxed_only_when_the_source_local_is_mutated() {
        let mut globals = GlobalTable::new();
        let heap = Heap::new(64);
        let x = sym("x");
        let y = sym("y");
        // (lambda (x y) (begin (set! x 1) (lambda () (begin x y))))
        // x is set! in the outer scope and read by the inner closure; y is
        // only ever read. Both escape into the same free list, but only
        // x's capture may be safely indirected.
        let set_x = list(&heap, &[sym("set!"), x, Object::integer(1).unwrap()]);
        let inner = list(&heap, &[sym("lambda"), Object::NULL, list(&heap, &[sym("begin"), x, y])]);
        let outer_body = list(&heap, &[sym("begin"), set_x, inner]);
        let outer = list(&heap, &[sym("lambda"), list(&heap, &[x, y]), outer_body]);
        let resolved = resolve_program(&mut globals, &[outer]).unwrap();
        let ResolvedExpr::Lambda(outer_info) = &resolved[0] else { panic!("expected lambda") };
        let ResolvedExpr::Begin(stmts) = &outer_info.body else { panic!("expected begin") };
        let ResolvedExpr::Lambda(inner_info) = &stmts[1] else { panic!("expected nested lambda") };
        assert_eq!(inner_info.free.len(), 2);
        assert!(inner_info.free[0].boxed, "capture of x (set!-mutated) must be boxed");
        assert!(!inner_info.free[1].boxed, "capture of y (never set!) must not be boxed");
    }

    #[test]
    fn duplicate_formal_parameters_are_rejected() {
        let mut globals = GlobalTable::new();
        let heap = Heap::new(64);
        let x = sym("x");
        let datum = list(&heap, &[sym("lambda"), list(&heap, &[x, x]), x]);
        assert!(resolve_program(&mut globals, &[datum]).is_err());
    }

    #[test]
    fn top_level_define_then_forward_reference_both_resolve() {
        let mut globals = GlobalTable::new();
        let heap = Heap::new(64);
        let a = sym("forward-a");
        let b = sym("forward-b");
        let def_a = list(&heap, &[sym("define"), a, b]);
        let def_b = list(&heap, &[sym("define"), b, Object::integer(1).unwrap()]);
        let resolved = resolve_program(&mut globals, &[def_a, def_b]).unwrap();
        assert_eq!(resolved.len(), 2);
        assert!(matches!(resolved[0], ResolvedExpr::Define(..)));
    }

    #[test]
    fn redefining_a_global_with_define_is_rejected() {
        let mut globals = GlobalTable::new();
        let heap = Heap::new(64);
        let name = sym("dup-global-for-test");
        let def1 = list(&heap, &[sym("define"), name, Object::integer(1).unwrap()]);
        let def2 = list(&heap, &[sym("define"), name, Object::integer(2).unwrap()]);
        assert!(resolve_program(&mut globals, &[def1, def2]).is_err());
    }

    #[test]
    fn internal_define_is_rejected() {
        let mut globals = GlobalTable::new();
        let heap = Heap::new(64);
        let x = sym("x");
        let inner_define = list(&heap, &[sym("define"), x, Object::integer(1).unwrap()]);
        let datum = list(&heap, &[sym("lambda"), Object::NULL, inner_define]);
        assert!(resolve_program(&mut globals, &[datum]).is_err());
    }
}
