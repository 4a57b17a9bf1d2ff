//! Proper-list helpers built on [`crate::boxed::cons`]. Used by the
//! compiler (to build instruction-argument data) and by `threeimp_cli`'s
//! demo programs, which construct datum trees directly rather than through
//! a parser.

use crate::boxed::{car, cdr, cons};
use crate::object::Object;
use threeimp_common::ThreeImpError;
use threeimp_memory::Heap;

/// Build a proper list `(items[0] items[1] ... items[n-1])`.
pub fn list(heap: &Heap, items: &[Object]) -> Result<Object, ThreeImpError> {
    let mut tail = Object::NULL;
    for &item in items.iter().rev() {
        tail = cons(heap, item, tail)?;
    }
    Ok(tail)
}

/// List length: `length(list(x1, ..., xn)) = n`.
pub fn length(mut obj: Object) -> usize {
    let mut n = 0;
    while obj.is_pair() {
        n += 1;
        obj = cdr(obj);
    }
    n
}

/// Walk a proper list into a `Vec`, in order. Stops at the first non-pair
/// (which should be `Object::NULL` for a well-formed list).
pub fn to_vec(mut obj: Object) -> Vec<Object> {
    let mut out = Vec::new();
    while obj.is_pair() {
        out.push(car(obj));
        obj = cdr(obj);
    }
    out
}
