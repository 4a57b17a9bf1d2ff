//! `and`/`or`. Grounded on
//! `ss-core/std.cc`'s `bind_standard_logical_operators`: ordinary, eagerly
//! evaluated platform procedures rather than resolver-level syntactic
//! keywords -- `threeimp_intern::well_known` does not list either, so both
//! operands are evaluated before the call the same as any other
//! application, with no short-circuiting. The original hard-codes exactly
//! two operands (`for (size_t i = 0; i < 2; i++)`); this crate keeps that
//! binary arity.

use threeimp_common::ThreeImpError;
use threeimp_memory::Heap;
use threeimp_value::Object;
use threeimp_vcode::{GlobalTable, PlatformProcTable, VCode};

use crate::bind::bind_fixed;

fn expect_boolean(obj: Object, who: &str) -> Result<bool, ThreeImpError> {
    obj.as_boolean().ok_or_else(|| ThreeImpError::runtime_type(format!("{who}: expected boolean, found a {}", obj.kind())))
}

pub(crate) fn bind(heap: &Heap, code: &mut VCode, globals: &mut GlobalTable, procs: &mut PlatformProcTable) -> Result<(), ThreeImpError> {
    bind_fixed(heap, code, globals, procs, "and", &["lt-arg", "rt-arg"], "true iff both arguments are true", Box::new(|args, _heap| {
        let a = expect_boolean(args.get(0)?, "and")?;
        let b = expect_boolean(args.get(1)?, "and")?;
        Ok(Object::boolean(a && b))
    }))?;
    bind_fixed(heap, code, globals, procs, "or", &["lt-arg", "rt-arg"], "true iff either argument is true", Box::new(|args, _heap| {
        let a = expect_boolean(args.get(0)?, "or")?;
        let b = expect_boolean(args.get(1)?, "or")?;
        Ok(Object::boolean(a || b))
    }))?;
    // `not` follows ordinary Scheme truthiness (only `#f` is false), unlike
    // `and`/`or`, which the original restricts to boolean operands.
    bind_fixed(heap, code, globals, procs, "not", &["obj"], "true iff obj is #f", Box::new(|args, _heap| {
        Ok(Object::boolean(!args.get(0)?.is_truthy()))
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use threeimp_intern::intern;
    use threeimp_vcode::ArgView;

    #[test]
    fn and_is_false_if_either_argument_is_false() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        let id = procs.lookup(intern("and")).unwrap();
        let args = [Object::TRUE, Object::FALSE];
        assert_eq!(procs.call(id, ArgView::new(&args), &heap).unwrap(), Object::FALSE);
    }

    #[test]
    fn not_treats_only_false_as_false() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        let id = procs.lookup(intern("not")).unwrap();
        assert_eq!(procs.call(id, ArgView::new(&[Object::FALSE]), &heap).unwrap(), Object::TRUE);
        assert_eq!(procs.call(id, ArgView::new(&[Object::integer(0).unwrap()]), &heap).unwrap(), Object::FALSE);
    }

    #[test]
    fn non_boolean_argument_is_a_runtime_type_error() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        let id = procs.lookup(intern("or")).unwrap();
        let args = [Object::integer(1).unwrap(), Object::FALSE];
        assert!(procs.call(id, ArgView::new(&args), &heap).is_err());
    }
}
