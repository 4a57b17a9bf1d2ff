//! `eq?`/`eqv?`/`equal?` and numeric `=`. Grounded on `ss-core/std.cc`'s `bind_standard_equality_procedures`.

use threeimp_common::ThreeImpError;
use threeimp_memory::Heap;
use threeimp_value::{eq, equal, eqv, Object};
use threeimp_vcode::{GlobalTable, PlatformProcTable, VCode};

use crate::bind::bind_fixed;

pub(crate) fn bind(heap: &Heap, code: &mut VCode, globals: &mut GlobalTable, procs: &mut PlatformProcTable) -> Result<(), ThreeImpError> {
    bind_fixed(heap, code, globals, procs, "eq?", &["lt-arg", "rt-arg"], "identity comparison", Box::new(|args, _heap| {
        Ok(Object::boolean(eq(args.get(0)?, args.get(1)?)))
    }))?;
    bind_fixed(heap, code, globals, procs, "eqv?", &["lt-arg", "rt-arg"], "identity plus numeric content comparison", Box::new(|args, _heap| {
        Ok(Object::boolean(eqv(args.get(0)?, args.get(1)?)))
    }))?;
    bind_fixed(heap, code, globals, procs, "equal?", &["lt-arg", "rt-arg"], "structural comparison", Box::new(|args, _heap| {
        Ok(Object::boolean(equal(args.get(0)?, args.get(1)?)))
    }))?;
    bind_fixed(heap, code, globals, procs, "=", &["lt-arg", "rt-arg"], "numeric equality", Box::new(|args, _heap| {
        let (a, b) = (args.get(0)?, args.get(1)?);
        let (da, db) = (a.to_double(), b.to_double());
        match (da, db) {
            (Some(x), Some(y)) => Ok(Object::boolean(x == y)),
            _ => Err(ThreeImpError::runtime_type(format!("=: expected two numbers, found a {} and a {}", a.kind(), b.kind()))),
        }
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use threeimp_intern::intern;
    use threeimp_vcode::ArgView;

    #[test]
    fn eq_distinguishes_fresh_pairs_from_equal() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        let p1 = threeimp_value::cons(&heap, Object::integer(1).unwrap(), Object::integer(2).unwrap()).unwrap();
        let p2 = threeimp_value::cons(&heap, Object::integer(1).unwrap(), Object::integer(2).unwrap()).unwrap();

        let eq_id = procs.lookup(intern("eq?")).unwrap();
        let equal_id = procs.lookup(intern("equal?")).unwrap();
        let args = [p1, p2];
        assert_eq!(procs.call(eq_id, ArgView::new(&args), &heap).unwrap(), Object::FALSE);
        assert_eq!(procs.call(equal_id, ArgView::new(&args), &heap).unwrap(), Object::TRUE);
    }

    #[test]
    fn numeric_equality_crosses_fixnum_float_boundary() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        let id = procs.lookup(intern("=")).unwrap();
        let args = [Object::integer(2).unwrap(), Object::float32(2.0)];
        assert_eq!(procs.call(id, ArgView::new(&args), &heap).unwrap(), Object::TRUE);
    }
}
