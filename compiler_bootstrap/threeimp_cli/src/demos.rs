//! Demo Scheme programs, built directly as `Object` datum trees rather
//! than read from source text.
//!
//! Each [`Demo`] is a named sequence of top-level datums, built with a
//! tiny `form`/`sym` helper pair rather than spelled out as raw nested
//! `cons` calls.

use threeimp_common::ThreeImpError;
use threeimp_intern::intern;
use threeimp_memory::Heap;
use threeimp_value::{list, Object};

fn sym(name: &str) -> Object {
    Object::symbol(intern(name))
}

fn form(heap: &Heap, items: &[Object]) -> Result<Object, ThreeImpError> {
    list(heap, items)
}

/// One named demo program: a builder over a fresh [`Heap`] rather than a
/// precomputed `Object` tree, since datums are heap-allocated pairs and a
/// `Heap` is only available once a [`crate::Vm`](threeimp_vm::Vm) exists.
pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn(&Heap) -> Result<Vec<Object>, ThreeImpError>,
}

pub const DEMOS: &[Demo] = &[
    Demo {
        name: "factorial",
        description: "recursive factorial of 10 via a self-referencing global define",
        build: factorial,
    },
    Demo {
        name: "list-ops",
        description: "builds a list through p/invoke, then reverses and appends it to itself",
        build: list_ops,
    },
    Demo {
        name: "counter",
        description: "a closure capturing a mutable free variable across two calls",
        build: counter,
    },
    Demo {
        name: "escaping-continuation",
        description: "call/cc stashes its continuation in a global, invoked from a later top-level form",
        build: escaping_continuation,
    },
];

pub fn find(name: &str) -> Option<&'static Demo> {
    DEMOS.iter().find(|d| d.name == name)
}

/// `(define fact (lambda (n) (if (= n 0) 1 (* n (fact (- n 1)))))) (fact 10)`
fn factorial(heap: &Heap) -> Result<Vec<Object>, ThreeImpError> {
    let n = sym("n");
    let cond = form(heap, &[sym("="), n, Object::integer(0)?])?;
    let rec_arg = form(heap, &[sym("-"), n, Object::integer(1)?])?;
    let rec_call = form(heap, &[sym("fact"), rec_arg])?;
    let step = form(heap, &[sym("*"), n, rec_call])?;
    let body = form(heap, &[sym("if"), cond, Object::integer(1)?, step])?;
    let formals = form(heap, &[n])?;
    let lambda = form(heap, &[sym("lambda"), formals, body])?;
    let define = form(heap, &[sym("define"), sym("fact"), lambda])?;
    let call = form(heap, &[sym("fact"), Object::integer(10)?])?;
    Ok(vec![define, call])
}

/// `(define xs (p/invoke list 1 2 3 4 5)) (append (reverse xs) xs)`
fn list_ops(heap: &Heap) -> Result<Vec<Object>, ThreeImpError> {
    let mut pinvoke_items = vec![sym("p/invoke"), sym("list")];
    for i in 1..=5i64 {
        pinvoke_items.push(Object::integer(i)?);
    }
    let build_list = form(heap, &pinvoke_items)?;
    let define_xs = form(heap, &[sym("define"), sym("xs"), build_list])?;
    let reversed = form(heap, &[sym("reverse"), sym("xs")])?;
    let appended = form(heap, &[sym("append"), reversed, sym("xs")])?;
    Ok(vec![define_xs, appended])
}

/// ```scheme
/// (define make-counter
///   (lambda (start) (lambda (step) (begin (set! start (+ start step)) start))))
/// (define counter (make-counter 0))
/// (counter 5)
/// (counter 10)
/// ```
/// `start` is a local of `make-counter` captured and mutated by the inner
/// lambda, exercising the resolver's `locals_boxed` classification
/// and the compiler's `Box`/`ReferFree` lowering (§4.6).
fn counter(heap: &Heap) -> Result<Vec<Object>, ThreeImpError> {
    let start = sym("start");
    let step = sym("step");
    let add = form(heap, &[sym("+"), start, step])?;
    let set_start = form(heap, &[sym("set!"), start, add])?;
    let inner_body = form(heap, &[sym("begin"), set_start, start])?;
    let inner_formals = form(heap, &[step])?;
    let inner_lambda = form(heap, &[sym("lambda"), inner_formals, inner_body])?;
    let outer_formals = form(heap, &[start])?;
    let outer_lambda = form(heap, &[sym("lambda"), outer_formals, inner_lambda])?;
    let define_make_counter = form(heap, &[sym("define"), sym("make-counter"), outer_lambda])?;
    let make_call = form(heap, &[sym("make-counter"), Object::integer(0)?])?;
    let define_counter = form(heap, &[sym("define"), sym("counter"), make_call])?;
    let call1 = form(heap, &[sym("counter"), Object::integer(5)?])?;
    let call2 = form(heap, &[sym("counter"), Object::integer(10)?])?;
    Ok(vec![define_make_counter, define_counter, call1, call2])
}

/// ```scheme
/// (define c #f)
/// (+ 1 (call/cc (lambda (k) (set! c k) 10)))
/// (c 100)
/// ```
/// The third top-level form reinvokes a continuation captured (and
/// escaped into a global) by the second: `((call/cc ...) 10)` first
/// returns `11`, then invoking `c` with `100` resumes the very same `(+ 1
/// ...)` computation and returns `101`, exercising call/cc's ability to
/// re-enter a computation from a later, independent top-level form.
fn escaping_continuation(heap: &Heap) -> Result<Vec<Object>, ThreeImpError> {
    let k = sym("k");
    let c = sym("c");
    let define_c = form(heap, &[sym("define"), c, Object::boolean(false)])?;

    let set_c = form(heap, &[sym("set!"), c, k])?;
    let lambda_formals = form(heap, &[k])?;
    let lambda_body = form(heap, &[sym("begin"), set_c, Object::integer(10)?])?;
    let handler = form(heap, &[sym("lambda"), lambda_formals, lambda_body])?;
    let capture = form(heap, &[sym("call/cc"), handler])?;
    let plus_one = form(heap, &[sym("+"), Object::integer(1)?, capture])?;

    let invoke_c = form(heap, &[c, Object::integer(100)?])?;
    Ok(vec![define_c, plus_one, invoke_c])
}
