//! `cons`/`car`/`cdr` and the pair mutators. Grounded on `ss-core/std.cc`'s
//! `bind_standard_pair_procedures` and `bind_standard_list_procedures`'s
//! `set-car!`/`set-cdr!`/`member`.

use threeimp_common::ThreeImpError;
use threeimp_memory::Heap;
use threeimp_value::{car, cdr, cons, equal, set_car, set_cdr, Object};
use threeimp_vcode::{GlobalTable, PlatformProcTable, VCode};

use crate::bind::bind_fixed;

fn expect_pair(obj: Object, who: &str) -> Result<Object, ThreeImpError> {
    if obj.is_pair() {
        Ok(obj)
    } else {
        Err(ThreeImpError::runtime_type(format!("{who}: expected pair argument, found a {}", obj.kind())))
    }
}

pub(crate) fn bind(heap: &Heap, code: &mut VCode, globals: &mut GlobalTable, procs: &mut PlatformProcTable) -> Result<(), ThreeImpError> {
    bind_fixed(heap, code, globals, procs, "cons", &["ar", "dr"], "allocates a new pair", Box::new(|args, heap| {
        cons(heap, args.get(0)?, args.get(1)?)
    }))?;
    bind_fixed(heap, code, globals, procs, "car", &["pair"], "the first element of a pair", Box::new(|args, _heap| {
        Ok(car(expect_pair(args.get(0)?, "car")?))
    }))?;
    bind_fixed(heap, code, globals, procs, "cdr", &["pair"], "the second element of a pair", Box::new(|args, _heap| {
        Ok(cdr(expect_pair(args.get(0)?, "cdr")?))
    }))?;
    bind_fixed(heap, code, globals, procs, "set-car!", &["pair", "v"], "mutates a pair's first element", Box::new(|args, _heap| {
        let pair = expect_pair(args.get(0)?, "set-car!")?;
        set_car(pair, args.get(1)?);
        Ok(Object::UNDEFINED)
    }))?;
    bind_fixed(heap, code, globals, procs, "set-cdr!", &["pair", "v"], "mutates a pair's second element", Box::new(|args, _heap| {
        let pair = expect_pair(args.get(0)?, "set-cdr!")?;
        set_cdr(pair, args.get(1)?);
        Ok(Object::UNDEFINED)
    }))?;
    bind_fixed(heap, code, globals, procs, "member", &["x", "lst"], "the sublist starting with the first pair whose car is equal? to x, or #f", Box::new(|args, _heap| {
        let x = args.get(0)?;
        let mut rest = args.get(1)?;
        while rest.is_pair() {
            if equal(car(rest), x) {
                return Ok(rest);
            }
            rest = cdr(rest);
        }
        Ok(Object::FALSE)
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use threeimp_intern::intern;
    use threeimp_vcode::ArgView;

    #[test]
    fn cons_car_cdr_round_trip() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        let cons_id = procs.lookup(intern("cons")).unwrap();
        let args = [Object::integer(1).unwrap(), Object::integer(2).unwrap()];
        let pair = procs.call(cons_id, ArgView::new(&args), &heap).unwrap();

        let car_id = procs.lookup(intern("car")).unwrap();
        let cdr_id = procs.lookup(intern("cdr")).unwrap();
        let args = [pair];
        assert_eq!(procs.call(car_id, ArgView::new(&args), &heap).unwrap().as_integer(), Some(1));
        assert_eq!(procs.call(cdr_id, ArgView::new(&args), &heap).unwrap().as_integer(), Some(2));
    }

    #[test]
    fn car_of_non_pair_is_a_runtime_type_error() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        let car_id = procs.lookup(intern("car")).unwrap();
        let args = [Object::integer(5).unwrap()];
        assert!(procs.call(car_id, ArgView::new(&args), &heap).is_err());
    }

    #[test]
    fn set_car_mutates_in_place() {
        let heap = Heap::new(64);
        let mut code = VCode::new();
        let mut globals = GlobalTable::new();
        let mut procs = PlatformProcTable::new();
        bind(&heap, &mut code, &mut globals, &mut procs).unwrap();

        let pair = cons(&heap, Object::integer(1).unwrap(), Object::integer(2).unwrap()).unwrap();
        let set_car_id = procs.lookup(intern("set-car!")).unwrap();
        let args = [pair, Object::integer(9).unwrap()];
        procs.call(set_car_id, ArgView::new(&args), &heap).unwrap();
        assert_eq!(car(pair).as_integer(), Some(9));
    }
}
