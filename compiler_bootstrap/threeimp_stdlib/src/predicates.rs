//! Kind predicates. Grounded on
//! `ss-core/std.cc`'s `bind_standard_kind_predicates`.

use threeimp_common::ThreeImpError;
use threeimp_memory::Heap;
use threeimp_value::{cdr, Object};
use threeimp_vcode::{GlobalTable, PlatformProcTable, VCode};

use crate::bind::bind_fixed;

fn is_number(obj: Object) -> bool {
    obj.is_integer() || obj.is_float32() || obj.is_float64()
}

/// True iff `obj` is a proper, finite list: a chain of pairs terminated by
/// the empty list. The register machine never builds cyclic structure
/// through `cons`, so an acyclic walk (no cycle-detection) suffices.
fn is_proper_list(mut obj: Object) -> bool {
    loop {
        if obj.is_null() {
            return true;
        }
        if !obj.is_pair() {
            return false;
        }
        obj = cdr(obj);
    }
}

pub(crate) fn bind(heap: &Heap, code: &mut VCode, globals: &mut GlobalTable, procs: &mut PlatformProcTable) -> Result<(), ThreeImpError> {
    let unary: &[(&str, fn(Object) -> bool, &str)] = &[
        ("null?", |o| o.is_null(), "true iff obj is the empty list"),
        ("boolean?", |o| o.is_boolean(), "true iff obj is a boolean"),
        ("pair?", |o| o.is_pair(), "true iff obj is a pair"),
        ("list?", is_proper_list, "true iff obj is a proper, finite list"),
        ("procedure?", |o| o.is_closure(), "true iff obj is a procedure"),
        ("integer?", |o| o.is_integer(), "true iff obj is a fixnum"),
        ("real?", |o| o.is_float32() || o.is_float64(), "true iff obj is a float32 or float64"),
        ("number?", is_number, "true iff obj is a fixnum, float32 or float64"),
        ("symbol?", |o| o.is_symbol(), "true iff obj is an interned symbol"),
        ("string?", |o| o.is_string(), "true iff obj is a string"),
        ("vector?", |o| o.is_vector(), "true iff obj is a vector"),
    ];
    for &(name, pred, doc) in unary {
        bind_fixed(heap, code, globals, procs, name, &["obj"], doc, Box::new(move |args, _heap| Ok(Object::boolean(pred(args.get(0)?)))))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use threeimp_intern::intern;
    use threeimp_vcode::ArgView;

    #[test]
    fn null_predicate_only_matches_the_empty_list() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        let id = procs.lookup(intern("null?")).unwrap();
        let args = [Object::NULL];
        assert_eq!(procs.call(id, ArgView::new(&args), &heap).unwrap(), Object::TRUE);
        let args = [Object::integer(0).unwrap()];
        assert_eq!(procs.call(id, ArgView::new(&args), &heap).unwrap(), Object::FALSE);
    }

    #[test]
    fn list_predicate_rejects_improper_lists() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        let id = procs.lookup(intern("list?")).unwrap();
        let proper = threeimp_value::list(&heap, &[Object::integer(1).unwrap()]).unwrap();
        assert_eq!(procs.call(id, ArgView::new(&[proper]), &heap).unwrap(), Object::TRUE);
        let improper = threeimp_value::cons(&heap, Object::integer(1).unwrap(), Object::integer(2).unwrap()).unwrap();
        assert_eq!(procs.call(id, ArgView::new(&[improper]), &heap).unwrap(), Object::FALSE);
    }

    #[test]
    fn every_predicate_is_bound_as_a_global_closure() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        for name in ["null?", "boolean?", "pair?", "list?", "procedure?", "integer?", "real?", "number?", "symbol?", "string?", "vector?"] {
            let id = globals.lookup(intern(name)).unwrap_or_else(|| panic!("{name} not bound"));
            assert!(globals.get(id).initializer.unwrap().is_closure());
        }
    }
}
