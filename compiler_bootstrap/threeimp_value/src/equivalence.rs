//! `eq?`/`eqv?`/`equal?`.

use crate::boxed::{car, cdr, string_value, vector_slots};
use crate::object::Object;

/// Raw-word identity: equality of booleans is equality of raw words.
pub fn eq(a: Object, b: Object) -> bool {
    a.raw() == b.raw()
}

/// `eq?` plus content-equality for numbers (fixnum/float32/float64 compare
/// by numeric value, crossing the boxed/unboxed float64 boundary).
pub fn eqv(a: Object, b: Object) -> bool {
    if eq(a, b) {
        return true;
    }
    match (a.as_integer(), b.as_integer()) {
        (Some(x), Some(y)) => return x == y,
        _ => {}
    }
    if (a.is_float32() || a.is_float64()) && (b.is_float32() || b.is_float64()) {
        return a.to_double() == b.to_double();
    }
    false
}

/// Recursively descends pairs and vectors; byte-compares strings.
pub fn equal(a: Object, b: Object) -> bool {
    if eqv(a, b) {
        return true;
    }
    if a.is_pair() && b.is_pair() {
        return equal(car(a), car(b)) && equal(cdr(a), cdr(b));
    }
    if a.is_string() && b.is_string() {
        return string_value(a) == string_value(b);
    }
    if a.is_vector() && b.is_vector() {
        let (sa, sb) = (vector_slots(a), vector_slots(b));
        return sa.len() == sb.len() && sa.iter().zip(sb).all(|(&x, &y)| equal(x, y));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxed::{cons, make_string, make_vector};
    use threeimp_memory::Heap;

    #[test]
    fn eq_implies_eqv_implies_equal_for_fixnums() {
        let a = Object::integer(7).unwrap();
        let b = Object::integer(7).unwrap();
        assert!(eq(a, b));
        assert!(eqv(a, b));
        assert!(equal(a, b));
    }

    #[test]
    fn fresh_pairs_are_equal_but_not_eq() {
        let heap = Heap::new(64);
        let p1 = cons(&heap, Object::integer(1).unwrap(), Object::integer(2).unwrap()).unwrap();
        let p2 = cons(&heap, Object::integer(1).unwrap(), Object::integer(2).unwrap()).unwrap();
        assert!(!eq(p1, p2));
        assert!(equal(p1, p2));
    }

    #[test]
    fn strings_compare_by_content() {
        let heap = Heap::new(64);
        let s1 = make_string(&heap, "hello").unwrap();
        let s2 = make_string(&heap, "hello").unwrap();
        assert!(!eq(s1, s2));
        assert!(equal(s1, s2));
    }

    #[test]
    fn vectors_compare_elementwise() {
        let heap = Heap::new(64);
        let v1 = make_vector(&heap, vec![Object::integer(1).unwrap(), Object::integer(2).unwrap()]).unwrap();
        let v2 = make_vector(&heap, vec![Object::integer(1).unwrap(), Object::integer(2).unwrap()]).unwrap();
        assert!(equal(v1, v2));
    }
}
