//! Binary arithmetic. Grounded on `ss-core/std.cc`'s
//! `bind_standard_binary_arithmetic_procedure`, which the original already
//! restricts to two operands (the variadic `bind_standard_variadic_*`
//! sibling in `ss-jit/std.cc` predates it); this crate keeps the same
//! binary convention, which also matches the register machine's
//! fixed-arity calling convention -- there is no rest-arg mechanism to
//! fold a longer argument list over.

use threeimp_common::ThreeImpError;
use threeimp_memory::Heap;
use threeimp_value::Object;
use threeimp_vcode::{ArgView, GlobalTable, PlatformProcTable, VCode};

use crate::bind::bind_fixed;

/// Dispatch on the two operands' kinds, promoting to the widest float kind
/// present (int < float32 < float64), exactly as `ss-core/std.cc` does.
fn dispatch(
    name: &str,
    args: ArgView<'_>,
    heap: &Heap,
    int_op: fn(i64, i64) -> Result<i64, ThreeImpError>,
    f32_op: fn(f32, f32) -> f32,
    f64_op: fn(f64, f64) -> f64,
) -> Result<Object, ThreeImpError> {
    let (a, b) = (args.get(0)?, args.get(1)?);
    if a.is_integer() && b.is_integer() {
        return Object::integer(int_op(a.as_integer().unwrap(), b.as_integer().unwrap())?);
    }
    if (a.is_integer() || a.is_float32()) && (b.is_integer() || b.is_float32()) && !(a.is_integer() && b.is_integer()) {
        let lhs = a.as_float32().unwrap_or_else(|| a.as_integer().unwrap() as f32);
        let rhs = b.as_float32().unwrap_or_else(|| b.as_integer().unwrap() as f32);
        return Ok(Object::float32(f32_op(lhs, rhs)));
    }
    match (a.to_double(), b.to_double()) {
        (Some(x), Some(y)) => threeimp_value::make_float64(heap, f64_op(x, y)),
        _ => Err(ThreeImpError::runtime_type(format!(
            "{name}: expected two numbers, found a {} and a {}",
            a.kind(),
            b.kind()
        ))),
    }
}

fn checked_div(a: i64, b: i64) -> Result<i64, ThreeImpError> {
    if b == 0 {
        return Err(ThreeImpError::runtime_type("/: division by zero"));
    }
    Ok(a / b)
}

fn checked_rem(a: i64, b: i64) -> Result<i64, ThreeImpError> {
    if b == 0 {
        return Err(ThreeImpError::runtime_type("%: division by zero"));
    }
    Ok(a % b)
}

pub(crate) fn bind(heap: &Heap, code: &mut VCode, globals: &mut GlobalTable, procs: &mut PlatformProcTable) -> Result<(), ThreeImpError> {
    let ops: &[(&str, fn(i64, i64) -> Result<i64, ThreeImpError>, fn(f32, f32) -> f32, fn(f64, f64) -> f64)] = &[
        ("+", |a, b| Ok(a.wrapping_add(b)), |a, b| a + b, |a, b| a + b),
        ("-", |a, b| Ok(a.wrapping_sub(b)), |a, b| a - b, |a, b| a - b),
        ("*", |a, b| Ok(a.wrapping_mul(b)), |a, b| a * b, |a, b| a * b),
        ("/", checked_div, |a, b| a / b, |a, b| a / b),
        ("%", checked_rem, |a, b| a % b, |a, b| a % b),
    ];
    for &(name, int_op, f32_op, f64_op) in ops {
        bind_fixed(heap, code, globals, procs, name, &["lt-arg", "rt-arg"], "binary arithmetic", Box::new(move |args, heap| {
            dispatch(name, args, heap, int_op, f32_op, f64_op)
        }))?;
    }
    Ok(())
}
