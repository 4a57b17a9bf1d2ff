//! Numeric comparisons `< > <= >=`, completing the arithmetic category
//! alongside `=`, which [`crate::equality`] already binds. Dispatches on
//! argument kinds the same way [`crate::arithmetic`] does, promoting to
//! the widest float kind present among the two operands before comparing.

use threeimp_common::ThreeImpError;
use threeimp_memory::Heap;
use threeimp_value::Object;
use threeimp_vcode::{ArgView, GlobalTable, PlatformProcTable, VCode};

use crate::bind::bind_fixed;

fn widen(a: Object, b: Object, name: &str) -> Result<(f64, f64), ThreeImpError> {
    if a.is_integer() && b.is_integer() {
        return Ok((a.as_integer().unwrap() as f64, b.as_integer().unwrap() as f64));
    }
    match (a.to_double(), b.to_double()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(ThreeImpError::runtime_type(format!("{name}: expected two numbers, found a {} and a {}", a.kind(), b.kind()))),
    }
}

fn dispatch(name: &str, args: ArgView<'_>, cmp: fn(f64, f64) -> bool) -> Result<Object, ThreeImpError> {
    let (a, b) = (args.get(0)?, args.get(1)?);
    let (x, y) = widen(a, b, name)?;
    Ok(Object::boolean(cmp(x, y)))
}

pub(crate) fn bind(heap: &Heap, code: &mut VCode, globals: &mut GlobalTable, procs: &mut PlatformProcTable) -> Result<(), ThreeImpError> {
    let ops: &[(&str, fn(f64, f64) -> bool)] = &[
        ("<", |a, b| a < b),
        (">", |a, b| a > b),
        ("<=", |a, b| a <= b),
        (">=", |a, b| a >= b),
    ];
    for &(name, cmp) in ops {
        bind_fixed(heap, code, globals, procs, name, &["lt-arg", "rt-arg"], "binary numeric comparison", Box::new(move |args, _heap| {
            dispatch(name, args, cmp)
        }))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use threeimp_intern::intern;

    fn call(procs: &PlatformProcTable, heap: &Heap, name: &str, a: Object, b: Object) -> Result<Object, ThreeImpError> {
        let id = procs.lookup(intern(name)).unwrap();
        let args = [a, b];
        procs.call(id, ArgView::new(&args), heap)
    }

    #[test]
    fn less_than_crosses_the_fixnum_float_boundary() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        let f = threeimp_value::make_float64(&heap, 2.5).unwrap();
        assert_eq!(call(&procs, &heap, "<", Object::integer(2).unwrap(), f).unwrap(), Object::TRUE);
    }

    #[test]
    fn greater_or_equal_is_reflexive() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        assert_eq!(call(&procs, &heap, ">=", Object::integer(4).unwrap(), Object::integer(4).unwrap()).unwrap(), Object::TRUE);
    }

    #[test]
    fn non_numeric_operand_is_a_runtime_type_error() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        assert!(call(&procs, &heap, ">", Object::TRUE, Object::integer(1).unwrap()).is_err());
    }
}
