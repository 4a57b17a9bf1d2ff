//! Standard-procedure bindings.
//!
//! Registers the primitive procedures a dynamically-typed Scheme core
//! needs before it can run any nontrivial program: `cons`/`car`/`cdr`,
//! kind predicates, the `eq?`/`eqv?`/`equal?` lattice, list and vector
//! constructors, binary arithmetic and comparisons, `display`/`displayln`/
//! `newline`, and `and`/`or`/`not` -- plus the further pair/list/vector
//! completions of those same categories (`set-car!`, `set-cdr!`, `member`,
//! `append`, `reverse`, `list?`, `vector-length`, `make-vector`,
//! `vector-set!`). Grounded throughout on `ss-core/std.cc`'s
//! `bind_standard_procedures` and its constituent `bind_standard_*`
//! functions, one submodule per such function; the handful with no direct
//! counterpart there follow the same dispatch/predicate-table shape as
//! their siblings in the same category.
//!
//! [`install`] is the single entry point, invoked once at VM construction:
//! it registers each primitive's native callback in the platform-procedure
//! table and, for every non-variadic one, synthesizes a fixed-arity
//! closure body and stores it as the matching global's initializer, so
//! ordinary Scheme code can reference `car`, `+`, `cons`, and so on as
//! first-class procedure values.

mod arithmetic;
mod bind;
mod comparisons;
mod equality;
mod io;
mod lists;
mod logical;
mod pairs;
mod predicates;
mod vectors;

pub use io::write_object;

use threeimp_common::ThreeImpError;
use threeimp_memory::Heap;
use threeimp_vcode::{GlobalTable, PlatformProcTable, VCode};

/// Register every standard procedure against `code`/`globals`/`procs`.
/// `heap` backs the closures synthesized for fixed-arity primitives.
pub fn install(heap: &Heap, code: &mut VCode, globals: &mut GlobalTable, procs: &mut PlatformProcTable) -> Result<(), ThreeImpError> {
    predicates::bind(heap, code, globals, procs)?;
    pairs::bind(heap, code, globals, procs)?;
    equality::bind(heap, code, globals, procs)?;
    lists::bind(heap, code, globals, procs)?;
    vectors::bind(heap, code, globals, procs)?;
    logical::bind(heap, code, globals, procs)?;
    arithmetic::bind(heap, code, globals, procs)?;
    comparisons::bind(heap, code, globals, procs)?;
    io::bind(heap, code, globals, procs)?;
    Ok(())
}
