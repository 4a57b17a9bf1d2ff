//! The fixed-arity/variadic split every other module in this crate binds
//! through.
//!
//! The register machine has no rest-arg application: `Apply`/`Close`
//! always move exactly as many stack slots as the callee's compiled arity.
//! A platform procedure that is to be callable as an ordinary first-class
//! Scheme value -- passed around, stored in a variable, applied indirectly
//! -- therefore needs a *fixed-arity* synthesized closure body wrapping its
//! native callback. [`bind_fixed`] builds exactly that: a small
//! `ReferLocal`/`Argument` chain feeding a `PInvoke`, stored as a global's
//! initializer.
//!
//! A handful of standard procedures (`list`, `vector`) are genuinely
//! variadic in `ss-core/std.cc`. Those are registered in the platform-proc
//! table only, via [`register_variadic`], and invoked directly through the
//! `p/invoke` special form -- `threeimp_compiler::lower::compile_pinvoke`
//! already lowers an arbitrary argument count straight into one `PInvoke`
//! instruction, so they never need the fixed-arity closure wrapper.

use threeimp_common::ThreeImpError;
use threeimp_intern::intern;
use threeimp_memory::Heap;
use threeimp_value::{make_closure, Object};
use threeimp_vcode::{GDefId, GlobalTable, PlatformProcCb, PlatformProcId, PlatformProcTable, VCode};

/// Build the body of a fixed-arity primitive: push the `n` formals in
/// descending order so that `ArgView[i]` (which reads top-down via
/// `VmStack::index`) lands on formal `i`, then a `PInvoke`, then `Return`.
fn wrap_primitive_body(code: &mut VCode, arity: usize, proc_id: PlatformProcId) -> usize {
    let return_id = code.new_vmx_return(arity);
    let pinvoke_id = code.new_vmx_pinvoke(arity, proc_id, return_id);
    let mut entry = pinvoke_id;
    for i in 0..arity {
        let arg = code.new_vmx_argument(entry);
        entry = code.new_vmx_refer_local(i, arg);
    }
    entry
}

/// Register `name` as a platform procedure and as a global bound to a
/// synthesized closure of arity `arg_names.len()` over it -- an ordinary,
/// first-class Scheme procedure value.
#[allow(clippy::too_many_arguments)]
pub(crate) fn bind_fixed(
    heap: &Heap,
    code: &mut VCode,
    globals: &mut GlobalTable,
    procs: &mut PlatformProcTable,
    name: &str,
    arg_names: &[&str],
    docstring: &str,
    cb: PlatformProcCb,
) -> Result<GDefId, ThreeImpError> {
    let sym = intern(name);
    let arity = arg_names.len();
    let arg_syms = arg_names.iter().map(|a| intern(a)).collect();
    let proc_id = procs.define(sym, arg_syms, false, docstring, cb);
    let entry = wrap_primitive_body(code, arity, proc_id);
    let closure = make_closure(heap, Object::integer(entry as i64)?, Vec::new())?;
    Ok(globals.define(sym, Some(closure), Some(docstring.to_string()), None))
}

/// Register `name` as a variadic platform procedure only -- no global
/// closure. Callable from compiled code exclusively via `p/invoke`.
/// `required_names` names the minimum arguments (its length is the minimum
/// arity); any further arguments are accepted without a formal name.
pub(crate) fn register_variadic(
    procs: &mut PlatformProcTable,
    name: &str,
    required_names: &[&str],
    docstring: &str,
    cb: PlatformProcCb,
) -> PlatformProcId {
    let sym = intern(name);
    let arg_syms = required_names.iter().map(|a| intern(a)).collect();
    procs.define(sym, arg_syms, true, docstring, cb)
}
