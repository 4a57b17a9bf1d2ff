//! `length` and the variadic `list` constructor, plus `append` and
//! `reverse` as the natural completion of the same list-procedure
//! category. Grounded on `ss-core/std.cc`'s `bind_standard_list_procedures`.

use threeimp_common::ThreeImpError;
use threeimp_memory::Heap;
use threeimp_value::{cons, length as list_length, to_vec, Object};
use threeimp_vcode::{GlobalTable, PlatformProcTable, VCode};

use crate::bind::{bind_fixed, register_variadic};

pub(crate) fn bind(heap: &Heap, code: &mut VCode, globals: &mut GlobalTable, procs: &mut PlatformProcTable) -> Result<(), ThreeImpError> {
    bind_fixed(heap, code, globals, procs, "length", &["lst"], "the number of elements in a (possibly improper) list", Box::new(|args, _heap| {
        Object::integer(list_length(args.get(0)?) as i64)
    }))?;

    bind_fixed(heap, code, globals, procs, "append", &["front", "back"], "a new list holding front's elements followed by back", Box::new(|args, heap| {
        let front = to_vec(args.get(0)?);
        let mut result = args.get(1)?;
        for item in front.into_iter().rev() {
            result = cons(heap, item, result)?;
        }
        Ok(result)
    }))?;

    bind_fixed(heap, code, globals, procs, "reverse", &["lst"], "a new list holding lst's elements in reverse order", Box::new(|args, heap| {
        let mut result = Object::NULL;
        for item in to_vec(args.get(0)?) {
            result = cons(heap, item, result)?;
        }
        Ok(result)
    }))?;

    // Genuinely variadic: builds an n-item list from whatever `p/invoke`
    // pushes, right-folding `cons` over the arguments in reverse so the
    // result preserves source order.
    register_variadic(procs, "list", &[], "constructs a list from a sequence of items", Box::new(|args, heap| {
        let mut result = Object::NULL;
        for item in (0..args.size()).rev().map(|i| args.get(i)).collect::<Result<Vec<_>, _>>()? {
            result = cons(heap, item, result)?;
        }
        Ok(result)
    }));
    Ok(())
}
