//! The `threeimp` binary's library half: wires together this
//! interpreter's three pipeline stages -- resolve, compile, execute.
//! `main.rs` is a thin `clap` front end over [`execute`]/[`dump`].

pub mod demos;

use threeimp_common::ThreeImpError;
use threeimp_value::Object;
use threeimp_vcode::{GlobalTable, PlatformProcTable, VCode};
use threeimp_vm::{Vm, VmConfig};

/// Register the standard library, resolve and compile `demo`'s datums,
/// then run every top-level form to completion, in order.
pub fn execute(demo: &demos::Demo, config: VmConfig) -> Result<Vec<Object>, ThreeImpError> {
    let mut vm = Vm::new(config);
    let mut code = VCode::new();
    let mut globals = GlobalTable::new();
    let mut procs = PlatformProcTable::new();
    threeimp_stdlib::install(&vm.heap, &mut code, &mut globals, &mut procs)?;

    let datums = (demo.build)(&vm.heap)?;
    let resolved = threeimp_resolver::resolve_program(&mut globals, &datums)?;
    vm.initialize_platform_globals(&globals);
    let subr = threeimp_compiler::compile_program(&mut code, &mut globals, &procs, demo.name, datums, &resolved)?;

    vm.execute_subr(&mut code, &procs, &subr)
}

/// Register, resolve and compile `demo` the same way [`execute`] does,
/// but return `dump_instructions`'s textual listing instead of running it.
pub fn dump(demo: &demos::Demo) -> Result<String, ThreeImpError> {
    let vm = Vm::new(VmConfig::default());
    let mut code = VCode::new();
    let mut globals = GlobalTable::new();
    let mut procs = PlatformProcTable::new();
    threeimp_stdlib::install(&vm.heap, &mut code, &mut globals, &mut procs)?;

    let datums = (demo.build)(&vm.heap)?;
    let resolved = threeimp_resolver::resolve_program(&mut globals, &datums)?;
    threeimp_compiler::compile_program(&mut code, &mut globals, &procs, demo.name, datums, &resolved)?;

    Ok(code.dump_instructions())
}

/// Render every result of a demo run the way `display` would.
pub fn render_results(results: &[Object]) -> String {
    let mut out = String::new();
    for (i, &r) in results.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        threeimp_stdlib::write_object(&mut out, r);
    }
    out
}
