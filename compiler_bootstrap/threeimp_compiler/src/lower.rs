//! The lowering pass itself.
//!
//! Every `compile_*` helper is the mirror image of `ss-core/compiler.cc`'s
//! `compile_exp`/`compile_list_exp`, but simplified: this repo's resolver
//! (C5) has already done `compiler.cc`'s `find_free`/`find_sets`/
//! `compile_lookup` work ahead of time, so there is no scope analysis left
//! to do here, only structural lowering of an already-resolved tree.
//!
//! Two argument-push conventions coexist on purpose:
//!
//! - Ordinary application arguments and `Close`'s free-variable captures are
//!   pushed in the order `ss-core/compiler.cc`'s `collect_free`/generic
//!   application path pushes them: the *last* argument is evaluated first
//!   and ends up deepest on the stack, so that the *first* argument (the
//!   one most recently pushed) lands on top, where `ReferLocal 0` /
//!   `Close`'s `index(s, 0)` expect it. This is forced by `ReferLocal`'s
//!   fixed top-of-frame indexing; it cannot be changed independently.
//! - `p/invoke` arguments are not read through `ReferLocal`'s positional
//!   frame at all -- a native callback reads them through `ArgView`, a
//!   plain forward slice. `p/invoke` arguments get genuine left-to-right
//!   evaluation, so those are pushed in the opposite order (first argument
//!   evaluated and pushed first, landing at the bottom of the k-slot
//!   window, where `ArgView[0]` reads it). See `DESIGN.md` for the full
//!   account of this split.

use std::rc::Rc;

use threeimp_common::ThreeImpError;
use threeimp_resolver::{LambdaInfo, RelScope, ResolvedExpr};
use threeimp_value::Object;
use threeimp_vcode::{GlobalTable, PlatformProcTable, VCode, VSubr, VmExp, VmExpId};

/// Per-lambda boxed-ness lookup threaded down through compilation. Top-level
/// forms compile against [`Ctx::top`]: a top-level expression can only ever
/// contain `Global` references, so the (empty) local/free slices are never
/// indexed.
struct Ctx {
    locals_boxed: Vec<bool>,
    free_boxed: Vec<bool>,
}

impl Ctx {
    fn top() -> Ctx {
        Ctx { locals_boxed: Vec::new(), free_boxed: Vec::new() }
    }

    fn for_lambda(info: &LambdaInfo) -> Ctx {
        Ctx {
            locals_boxed: info.locals_boxed.clone(),
            free_boxed: info.free.iter().map(|c| c.boxed).collect(),
        }
    }

    fn boxed(&self, scope: RelScope, index: usize) -> bool {
        match scope {
            RelScope::Local => self.locals_boxed[index],
            RelScope::Free => self.free_boxed[index],
            RelScope::Global => false,
        }
    }
}

/// If `next` is a `Return`, this expression is in tail position; returns its
/// arity.
fn tail_return_arity(code: &VCode, next: VmExpId) -> Option<usize> {
    match code.get(next) {
        VmExp::Return { n } => Some(*n),
        _ => None,
    }
}

fn compile_refer(code: &mut VCode, ctx: &Ctx, scope: RelScope, index: usize, next: VmExpId) -> VmExpId {
    let after_indirect = if ctx.boxed(scope, index) { code.new_vmx_indirect(next) } else { next };
    match scope {
        RelScope::Local => code.new_vmx_refer_local(index, after_indirect),
        RelScope::Free => code.new_vmx_refer_free(index, after_indirect),
        RelScope::Global => code.new_vmx_refer_global(index, after_indirect),
    }
}

fn compile_assign(code: &mut VCode, ctx: &Ctx, procs: &PlatformProcTable, scope: RelScope, index: usize, val: &ResolvedExpr, next: VmExpId) -> Result<VmExpId, ThreeImpError> {
    let assign_id = match scope {
        RelScope::Local => code.new_vmx_assign_local(index, next),
        RelScope::Free => code.new_vmx_assign_free(index, next),
        RelScope::Global => code.new_vmx_assign_global(index, next),
    };
    compile_expr(code, procs, ctx, val, assign_id)
}

/// Emit the `Box n` preamble for every mutated formal. Order among the boxed slots is immaterial -- each `Box`
/// instruction only touches its own stack slot -- so this simply walks
/// `locals_boxed` ascending.
fn wrap_box_preamble(code: &mut VCode, locals_boxed: &[bool], body_entry: VmExpId) -> VmExpId {
    let mut entry = body_entry;
    for (n, &boxed) in locals_boxed.iter().enumerate() {
        if boxed {
            entry = code.new_vmx_box(n, entry);
        }
    }
    entry
}

/// Emit the free-variable-capture chain around an already-built `Close`
/// instruction. Built ascending over `info.free` (index
/// 0..n): each step wraps the current target with `Argument` then a raw
/// (never-indirected) `refer` for that capture. Captures are always raw
/// pushes regardless of `FreeCapture::boxed` -- only use-site reads inside
/// the lambda's own body are indirected; a capture just copies whatever
/// word (box pointer or plain value) lives in the source slot. Built this
/// way, capture 0 ends up evaluated last and lands on top of the k-slot
/// window, matching `Close`'s "slots 1..n <- top n of stack" / `index(s,
/// 0)` = capture 0.
fn close_with_captures(code: &mut VCode, info: &LambdaInfo, body_entry: VmExpId, next: VmExpId) -> VmExpId {
    let close_id = code.new_vmx_close(info.free.len(), body_entry, next);
    let mut entry = close_id;
    for capture in &info.free {
        let arg_id = code.new_vmx_argument(entry);
        entry = match capture.scope {
            RelScope::Local => code.new_vmx_refer_local(capture.index, arg_id),
            RelScope::Free => code.new_vmx_refer_free(capture.index, arg_id),
            RelScope::Global => unreachable!("FreeCapture is never Global; a global needs no capture"),
        };
    }
    entry
}

fn compile_if(code: &mut VCode, procs: &PlatformProcTable, ctx: &Ctx, c: &ResolvedExpr, t: &ResolvedExpr, e: &ResolvedExpr, next: VmExpId) -> Result<VmExpId, ThreeImpError> {
    let t_id = compile_expr(code, procs, ctx, t, next)?;
    let e_id = compile_expr(code, procs, ctx, e, next)?;
    let test_id = code.new_vmx_test(t_id, e_id);
    compile_expr(code, procs, ctx, c, test_id)
}

fn compile_begin(code: &mut VCode, procs: &PlatformProcTable, ctx: &Ctx, exprs: &[ResolvedExpr], next: VmExpId) -> Result<VmExpId, ThreeImpError> {
    let mut cur = next;
    for e in exprs.iter().rev() {
        cur = compile_expr(code, procs, ctx, e, cur)?;
    }
    Ok(cur)
}

/// `(call/cc f)`. Non-tail: `Frame next (Conti (Argument
/// (compile f, Apply)))`. In tail position the `Frame` is elided entirely
/// and `f`'s own application is lowered as a tail call (`Shift 1 m Apply`),
/// sharing the caller's existing frame instead of pushing a new one -- the
/// same tail-call discipline an ordinary application gets.
fn compile_call_cc(code: &mut VCode, procs: &PlatformProcTable, ctx: &Ctx, f: &ResolvedExpr, next: VmExpId) -> Result<VmExpId, ThreeImpError> {
    let tail_arity = tail_return_arity(code, next);
    let apply_id = code.new_vmx_apply();
    let f_target = match tail_arity {
        Some(m) => code.new_vmx_shift(1, m, apply_id),
        None => apply_id,
    };
    let f_entry = compile_expr(code, procs, ctx, f, f_target)?;
    let arg_id = code.new_vmx_argument(f_entry);
    let conti_id = code.new_vmx_conti(arg_id);
    Ok(match tail_arity {
        Some(_) => conti_id,
        None => code.new_vmx_frame(conti_id, next),
    })
}

fn compile_pinvoke(
    code: &mut VCode,
    procs: &PlatformProcTable,
    ctx: &Ctx,
    name: threeimp_intern::SymbolId,
    args: &[ResolvedExpr],
    next: VmExpId,
) -> Result<VmExpId, ThreeImpError> {
    let proc_id = procs.lookup(name).ok_or_else(|| {
        ThreeImpError::compile(format!("p/invoke: unknown platform procedure `{}`", threeimp_intern::name(name)), None)
    })?;
    let pinvoke_id = code.new_vmx_pinvoke(args.len(), proc_id, next);
    // Reversed relative to ordinary application/Close argument order: see
    // module doc. This gives genuine left-to-right evaluation, matching the
    // forward-indexed `ArgView` (`ArgView[0]` = first source argument).
    let mut cur = pinvoke_id;
    for a in args.iter().rev() {
        let arg_wrap = code.new_vmx_argument(cur);
        cur = compile_expr(code, procs, ctx, a, arg_wrap)?;
    }
    Ok(cur)
}

fn compile_app(
    code: &mut VCode,
    procs: &PlatformProcTable,
    ctx: &Ctx,
    fun: &ResolvedExpr,
    args: &[ResolvedExpr],
    next: VmExpId,
) -> Result<VmExpId, ThreeImpError> {
    let apply_id = code.new_vmx_apply();
    let is_tail = tail_return_arity(code, next);
    let fn_target = match is_tail {
        Some(m) => code.new_vmx_shift(args.len(), m, apply_id),
        None => apply_id,
    };

    // `fun` is evaluated last, immediately before `Apply`/`Shift` -- its
    // value has nowhere to live but the accumulator, so no argument
    // evaluation may run between loading it and `Apply` reading it back out.
    let fun_entry = compile_expr(code, procs, ctx, fun, fn_target)?;

    // Natural forward order, matching `ss-core/compiler.cc`'s generic
    // application path: the last argument processed here ends up outermost
    // (evaluated first, pushed deepest), so the first argument -- pushed
    // last -- lands on top, where `ReferLocal 0` (the first formal) expects
    // it.
    let mut args_entry = fun_entry;
    for a in args.iter() {
        let arg_wrap = code.new_vmx_argument(args_entry);
        args_entry = compile_expr(code, procs, ctx, a, arg_wrap)?;
    }

    Ok(match is_tail {
        Some(_) => args_entry,
        None => code.new_vmx_frame(args_entry, next),
    })
}

/// Lower `expr` given the instruction that should run immediately
/// afterward, returning the id of the instruction that should run first.
fn compile_expr(code: &mut VCode, procs: &PlatformProcTable, ctx: &Ctx, expr: &ResolvedExpr, next: VmExpId) -> Result<VmExpId, ThreeImpError> {
    match expr {
        ResolvedExpr::Const(v) | ResolvedExpr::Quote(v) => Ok(code.new_vmx_constant(*v, next)),
        ResolvedExpr::Refer(scope, index, _sym) => Ok(compile_refer(code, ctx, *scope, *index, next)),
        ResolvedExpr::If(c, t, e) => compile_if(code, procs, ctx, c, t, e, next),
        ResolvedExpr::Assign(scope, index, _sym, val) => compile_assign(code, ctx, procs, *scope, *index, val, next),
        ResolvedExpr::Lambda(info) => {
            let (body_entry, _) = compile_lambda_body(code, procs, info)?;
            Ok(close_with_captures(code, info, body_entry, next))
        }
        ResolvedExpr::Begin(exprs) => compile_begin(code, procs, ctx, exprs, next),
        ResolvedExpr::CallCc(f) => compile_call_cc(code, procs, ctx, f, next),
        ResolvedExpr::PInvoke(name, args) => compile_pinvoke(code, procs, ctx, *name, args, next),
        ResolvedExpr::App(fun, args) => compile_app(code, procs, ctx, fun, args, next),
        ResolvedExpr::Define(gdef_id, val) => {
            let assign_id = code.new_vmx_assign_global(*gdef_id, next);
            compile_expr(code, procs, ctx, val, assign_id)
        }
    }
}

/// Lower a lambda's own body (entry after the `Box` preamble, before its
/// enclosing `Close`). Returns `(body_entry, raw_body_entry)` where
/// `raw_body_entry` is the id before the `Box` preamble was wrapped around
/// it -- callers outside this module only ever want `body_entry`, the
/// second element exists so the top-level `Define` special case below can
/// record the post-preamble entry as `GlobalDef::code`.
fn compile_lambda_body(code: &mut VCode, procs: &PlatformProcTable, info: &Rc<LambdaInfo>) -> Result<(VmExpId, VmExpId), ThreeImpError> {
    let inner_ctx = Ctx::for_lambda(info);
    let return_id = code.new_vmx_return(info.n_params);
    let raw_body_entry = compile_expr(code, procs, &inner_ctx, &info.body, return_id)?;
    let body_entry = wrap_box_preamble(code, &info.locals_boxed, raw_body_entry);
    Ok((body_entry, raw_body_entry))
}

/// Lower a whole resolved program into a [`VSubr`], appending instructions
/// into `code` and recording entry points into `globals`. `datums` are the original top-level forms, kept
/// only for `dump`/diagnostics -- one per entry in `resolved`.
pub fn compile_program(
    code: &mut VCode,
    globals: &mut GlobalTable,
    procs: &PlatformProcTable,
    name: impl Into<String>,
    datums: Vec<Object>,
    resolved: &[ResolvedExpr],
) -> Result<VSubr, ThreeImpError> {
    debug_assert_eq!(datums.len(), resolved.len());
    let mut entry_ids = Vec::with_capacity(resolved.len());
    for expr in resolved {
        let halt = code.new_vmx_halt();
        if let ResolvedExpr::Define(gdef_id, val) = expr {
            if let ResolvedExpr::Lambda(info) = val.as_ref() {
                let (body_entry, _) = compile_lambda_body(code, procs, info)?;
                let assign_id = code.new_vmx_assign_global(*gdef_id, halt);
                let close_entry = close_with_captures(code, info, body_entry, assign_id);
                globals.set_code(*gdef_id, body_entry);
                entry_ids.push(close_entry);
                continue;
            }
        }
        let entry = compile_expr(code, procs, &Ctx::top(), expr, halt)?;
        entry_ids.push(entry);
    }
    Ok(VSubr::new(name, datums, entry_ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use threeimp_intern::intern;
    use threeimp_memory::Heap;
    use threeimp_resolver::resolve_program;

    fn sym(s: &str) -> Object {
        Object::symbol(intern(s))
    }

    fn list(heap: &Heap, items: &[Object]) -> Object {
        threeimp_value::list(heap, items).unwrap()
    }

    fn compile_one(datum: Object) -> (VCode, VmExpId) {
        let mut globals = GlobalTable::new();
        let procs = PlatformProcTable::new();
        let resolved = resolve_program(&mut globals, &[datum]).unwrap();
        let mut code = VCode::new();
        let subr = compile_program(&mut code, &mut globals, &procs, "test", vec![datum], &resolved).unwrap();
        (code, subr.entry_ids[0])
    }

    #[test]
    fn constant_compiles_to_a_single_constant_instruction() {
        let (code, entry) = compile_one(Object::integer(42).unwrap());
        match code.get(entry) {
            VmExp::Constant { value, .. } => assert_eq!(value.as_integer(), Some(42)),
            other => panic!("expected Constant, got {other:?}"),
        }
    }

    #[test]
    fn if_compiles_to_test_wrapping_both_branches() {
        let heap = Heap::new(64);
        let datum = list(
            &heap,
            &[sym("if"), Object::TRUE, Object::integer(1).unwrap(), Object::integer(2).unwrap()],
        );
        let (code, entry) = compile_one(datum);
        match code.get(entry) {
            VmExp::Constant { value, next } => {
                assert_eq!(*value, Object::TRUE);
                match code.get(*next) {
                    VmExp::Test { if_true, if_false } => {
                        assert!(matches!(code.get(*if_true), VmExp::Constant { .. }));
                        assert!(matches!(code.get(*if_false), VmExp::Constant { .. }));
                    }
                    other => panic!("expected Test, got {other:?}"),
                }
            }
            other => panic!("expected Constant (the condition), got {other:?}"),
        }
    }

    #[test]
    fn non_capturing_lambda_compiles_to_a_zero_free_close() {
        let heap = Heap::new(64);
        let x = sym("x");
        let datum = list(&heap, &[sym("lambda"), list(&heap, &[x]), x]);
        let (code, entry) = compile_one(datum);
        match code.get(entry) {
            VmExp::Close { n_free, body, .. } => {
                assert_eq!(*n_free, 0);
                match code.get(*body) {
                    VmExp::ReferLocal { n, next } => {
                        assert_eq!(*n, 0);
                        assert!(matches!(code.get(*next), VmExp::Return { n } if *n == 1));
                    }
                    other => panic!("expected ReferLocal, got {other:?}"),
                }
            }
            other => panic!("expected Close, got {other:?}"),
        }
    }

    #[test]
    fn capturing_lambda_pushes_one_argument_per_free_slot_before_close() {
        let heap = Heap::new(64);
        let x = sym("x");
        let inner = list(&heap, &[sym("lambda"), Object::NULL, x]);
        let outer = list(&heap, &[sym("lambda"), list(&heap, &[x]), inner]);
        let (code, entry) = compile_one(outer);
        // entry: Close(outer, 0 free) -> body -> Return 1
        let VmExp::Close { body: outer_body, .. } = code.get(entry) else { panic!("expected outer Close") };
        // outer body, before Box preamble (x is never set!), is directly
        // the inner lambda's compiled form: Argument(Close) <- ReferLocal 0
        match code.get(*outer_body) {
            VmExp::ReferLocal { n, next } => {
                assert_eq!(*n, 0);
                match code.get(*next) {
                    VmExp::Argument { next } => {
                        assert!(matches!(code.get(*next), VmExp::Close { n_free: 1, .. }));
                    }
                    other => panic!("expected Argument, got {other:?}"),
                }
            }
            other => panic!("expected ReferLocal (free-capture push), got {other:?}"),
        }
    }

    #[test]
    fn mutated_local_gets_a_box_preamble() {
        let heap = Heap::new(64);
        let x = sym("x");
        let set_x = list(&heap, &[sym("set!"), x, Object::integer(9).unwrap()]);
        let body = list(&heap, &[sym("begin"), set_x, x]);
        let datum = list(&heap, &[sym("lambda"), list(&heap, &[x]), body]);
        let (code, entry) = compile_one(datum);
        let VmExp::Close { body, .. } = code.get(entry) else { panic!("expected Close") };
        match code.get(*body) {
            VmExp::Box { n, .. } => assert_eq!(*n, 0),
            other => panic!("expected Box preamble, got {other:?}"),
        }
    }

    #[test]
    fn referencing_a_mutated_local_goes_through_indirect() {
        let heap = Heap::new(64);
        let x = sym("x");
        let set_x = list(&heap, &[sym("set!"), x, Object::integer(9).unwrap()]);
        let body = list(&heap, &[sym("begin"), set_x, x]);
        let datum = list(&heap, &[sym("lambda"), list(&heap, &[x]), body]);
        let (code, entry) = compile_one(datum);
        let VmExp::Close { body, .. } = code.get(entry) else { panic!("expected Close") };
        let VmExp::Box { next, .. } = code.get(*body) else { panic!("expected Box") };
        // next: AssignLocal 0 (the set!) -> ReferLocal 0 -> Indirect -> Return
        match code.get(*next) {
            VmExp::AssignLocal { next, .. } => match code.get(*next) {
                VmExp::ReferLocal { next, .. } => {
                    assert!(matches!(code.get(*next), VmExp::Indirect { .. }), "expected Indirect after ReferLocal of a boxed slot");
                }
                other => panic!("expected ReferLocal, got {other:?}"),
            },
            other => panic!("expected AssignLocal, got {other:?}"),
        }
    }

    #[test]
    fn tail_application_emits_shift_then_apply_no_frame() {
        let heap = Heap::new(64);
        // ((lambda (x) x) 5) -- application in tail (top-level) position.
        let x = sym("x");
        let f = list(&heap, &[sym("lambda"), list(&heap, &[x]), x]);
        let datum = list(&heap, &[f, Object::integer(5).unwrap()]);
        let (code, entry) = compile_one(datum);
        // Top-level forms compile with `next = Halt`, which is never a
        // `Return`, so this is a non-tail call: expect a `Frame`.
        assert!(matches!(code.get(entry), VmExp::Frame { .. }));
    }

    #[test]
    fn application_evaluates_arguments_before_the_callee() {
        let heap = Heap::new(64);
        // ((lambda (x) x) 5) -- the accumulator must hold the closure, not
        // the last-evaluated argument, when Apply runs, so the callee has
        // to be compiled last: Constant 5, Argument, then the callee's
        // Close, then Apply.
        let x = sym("x");
        let f = list(&heap, &[sym("lambda"), list(&heap, &[x]), x]);
        let datum = list(&heap, &[f, Object::integer(5).unwrap()]);
        let (code, entry) = compile_one(datum);
        let VmExp::Frame { body, .. } = code.get(entry) else { panic!("expected Frame") };
        match code.get(*body) {
            VmExp::Constant { value, next } => {
                assert_eq!(value.as_integer(), Some(5));
                match code.get(*next) {
                    VmExp::Argument { next } => {
                        assert!(matches!(code.get(*next), VmExp::Close { .. }), "callee must be compiled after the argument, immediately before Apply");
                    }
                    other => panic!("expected Argument, got {other:?}"),
                }
            }
            other => panic!("expected Constant 5 (the argument) first, got {other:?}"),
        }
    }

    #[test]
    fn tail_call_inside_a_lambda_body_elides_the_frame() {
        let heap = Heap::new(64);
        // (lambda () ((lambda (x) x) 5)) -- the inner application is in
        // tail position relative to the outer lambda's own Return.
        let x = sym("x");
        let inner_f = list(&heap, &[sym("lambda"), list(&heap, &[x]), x]);
        let inner_app = list(&heap, &[inner_f, Object::integer(5).unwrap()]);
        let outer = list(&heap, &[sym("lambda"), Object::NULL, inner_app]);
        let (code, entry) = compile_one(outer);
        let VmExp::Close { body, .. } = code.get(entry) else { panic!("expected Close") };
        // body of the outer lambda is the compiled application, which in
        // tail position must NOT be a Frame -- it chains straight into the
        // argument pushes and the function expression.
        assert!(!matches!(code.get(*body), VmExp::Frame { .. }));
    }

    #[test]
    fn pinvoke_unknown_procedure_is_a_compile_error() {
        let heap = Heap::new(64);
        let datum = list(&heap, &[sym("p/invoke"), sym("totally-unbound-proc"), Object::integer(1).unwrap()]);
        let mut globals = GlobalTable::new();
        let procs = PlatformProcTable::new();
        let resolved = resolve_program(&mut globals, &[datum]).unwrap();
        let mut code = VCode::new();
        assert!(compile_program(&mut code, &mut globals, &procs, "test", vec![datum], &resolved).is_err());
    }

    #[test]
    fn pinvoke_pushes_arguments_left_to_right_for_arg_view() {
        let heap = Heap::new(64);
        let mut procs = PlatformProcTable::new();
        let name = intern("threeimp-compiler-test-two-arg");
        procs.define(name, vec![intern("a"), intern("b")], false, "test", Box::new(|args, _heap| args.get(0)));
        let datum = list(
            &heap,
            &[sym("p/invoke"), sym("threeimp-compiler-test-two-arg"), Object::integer(1).unwrap(), Object::integer(2).unwrap()],
        );
        let mut globals = GlobalTable::new();
        let resolved = resolve_program(&mut globals, &[datum]).unwrap();
        let mut code = VCode::new();
        let subr = compile_program(&mut code, &mut globals, &procs, "test", vec![datum], &resolved).unwrap();
        let entry = subr.entry_ids[0];
        // entry must evaluate the *first* source argument (1) first.
        match code.get(entry) {
            VmExp::Constant { value, next } => {
                assert_eq!(value.as_integer(), Some(1));
                match code.get(*next) {
                    VmExp::Argument { next } => match code.get(*next) {
                        VmExp::Constant { value, next } => {
                            assert_eq!(value.as_integer(), Some(2));
                            match code.get(*next) {
                                VmExp::Argument { next } => {
                                    assert!(matches!(code.get(*next), VmExp::PInvoke { arg_count: 2, .. }));
                                }
                                other => panic!("expected Argument, got {other:?}"),
                            }
                        }
                        other => panic!("expected Constant 2, got {other:?}"),
                    },
                    other => panic!("expected Argument, got {other:?}"),
                }
            }
            other => panic!("expected Constant 1 first, got {other:?}"),
        }
    }
}
