//! Vector constructors and accessors. Grounded on `ss-core/std.cc`'s
//! `bind_standard_vector_procedures`.

use threeimp_common::ThreeImpError;
use threeimp_memory::Heap;
use threeimp_value::{make_vector, vector_len, vector_ref, vector_set, Object};
use threeimp_vcode::{GlobalTable, PlatformProcTable, VCode};

use crate::bind::{bind_fixed, register_variadic};

fn expect_vector(obj: Object, who: &str) -> Result<Object, ThreeImpError> {
    if obj.is_vector() {
        Ok(obj)
    } else {
        Err(ThreeImpError::runtime_type(format!("{who}: expected vector argument, found a {}", obj.kind())))
    }
}

fn expect_index(obj: Object, who: &str) -> Result<usize, ThreeImpError> {
    obj.as_integer()
        .filter(|n| *n >= 0)
        .map(|n| n as usize)
        .ok_or_else(|| ThreeImpError::runtime_type(format!("{who}: expected a non-negative fixnum index, found a {}", obj.kind())))
}

pub(crate) fn bind(heap: &Heap, code: &mut VCode, globals: &mut GlobalTable, procs: &mut PlatformProcTable) -> Result<(), ThreeImpError> {
    bind_fixed(heap, code, globals, procs, "vector-length", &["vec"], "the number of slots in a vector", Box::new(|args, _heap| {
        let v = expect_vector(args.get(0)?, "vector-length")?;
        Object::integer(vector_len(v) as i64)
    }))?;
    bind_fixed(heap, code, globals, procs, "vector-ref", &["vec", "pos"], "the element of vec at pos, first slot at index 0", Box::new(|args, _heap| {
        let v = expect_vector(args.get(0)?, "vector-ref")?;
        let i = expect_index(args.get(1)?, "vector-ref")?;
        if i >= vector_len(v) {
            return Err(ThreeImpError::runtime_lookup(format!("vector-ref: index {i} out of range")));
        }
        Ok(vector_ref(v, i))
    }))?;
    bind_fixed(heap, code, globals, procs, "vector-set!", &["vec", "pos", "v"], "mutates the element of vec at pos", Box::new(|args, _heap| {
        let v = expect_vector(args.get(0)?, "vector-set!")?;
        let i = expect_index(args.get(1)?, "vector-set!")?;
        if i >= vector_len(v) {
            return Err(ThreeImpError::runtime_lookup(format!("vector-set!: index {i} out of range")));
        }
        vector_set(v, i, args.get(2)?);
        Ok(Object::UNDEFINED)
    }))?;

    bind_fixed(heap, code, globals, procs, "make-vector", &["len", "fill"], "a fresh vector of len slots, each initialized to fill", Box::new(|args, heap| {
        let n = expect_index(args.get(0)?, "make-vector")?;
        make_vector(heap, vec![args.get(1)?; n])
    }))?;

    register_variadic(procs, "vector", &[], "constructs a vector from a sequence of items", Box::new(|args, heap| {
        make_vector(heap, args.iter().collect())
    }));
    Ok(())
}
