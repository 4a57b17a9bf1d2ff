//! Boxed-object layout.
//!
//! Every heap object begins with a header of `(size-class index,
//! allocator-thread index, kind tag)`. This crate's heap objects are
//! allocated through [`threeimp_memory::Heap`], which already chooses the
//! size class from `sizeof(T)`; the header additionally records that
//! choice inline so `Object::boxed_kind` can read it back through a raw
//! pointer without going through the allocator.
//!
//! Payloads with a variable length (string bytes, vector/closure slots)
//! are owned by ordinary Rust collections (`Box<str>`, `Vec<Object>`)
//! nested inside the fixed-size boxed record; only that fixed-size record
//! itself is carved out of a size class, so the record's `sci` always
//! reflects `size_of::<PairObj>()` et al, not the payload length. This is
//! noted as a deliberate simplification in `DESIGN.md`.

use crate::object::Object;
use threeimp_common::Span;
use threeimp_memory::{class_for_size, Heap};
use threeimp_common::ThreeImpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjectKind {
    Box = 0,
    Pair,
    Float64,
    String,
    Vector,
    Syntax,
    Closure,
}

#[repr(C)]
pub struct BoxedHeader {
    pub sci: u8,
    /// Index of the allocating thread's front-end cache. The VM this crate
    /// serves has exactly one; kept as a field so a future
    /// multi-threaded front end has somewhere to record it.
    pub alloc_thread: u8,
    pub kind: ObjectKind,
}

impl BoxedHeader {
    fn new<T>(kind: ObjectKind) -> Self {
        let sci = class_for_size(std::mem::size_of::<T>()).map(|c| c.sci as u8).unwrap_or(0);
        Self { sci, alloc_thread: 0, kind }
    }
}

#[repr(C)]
pub struct PairObj {
    pub header: BoxedHeader,
    pub car: Object,
    pub cdr: Object,
}

#[repr(C)]
pub struct BoxObjInner {
    pub header: BoxedHeader,
    pub slot: Object,
}

#[repr(C)]
pub struct Float64Obj {
    pub header: BoxedHeader,
    pub value: f64,
}

#[repr(C)]
pub struct StringObj {
    pub header: BoxedHeader,
    pub bytes: Box<str>,
}

/// Shared representation for both `Vector` and `Closure` kinds: closures
/// are represented as vectors whose first slot is the entry
/// instruction-pointer. Only `header.kind` distinguishes them.
#[repr(C)]
pub struct VectorObj {
    pub header: BoxedHeader,
    pub slots: Vec<Object>,
}

#[repr(C)]
pub struct SyntaxObj {
    pub header: BoxedHeader,
    pub datum: Object,
    pub span: Span,
}

fn boxed_ptr<T>(typed: std::ptr::NonNull<T>) -> Object {
    Object::ptr(typed.as_ptr().cast())
}

/// # Safety
/// `obj` must be a live pointer produced by one of this file's
/// constructors and must actually carry a `T` at its head (callers check
/// `obj.is_pair()`/`is_box()`/etc first).
unsafe fn deref<'a, T>(obj: Object) -> &'a T {
    &*(obj.as_ptr().expect("boxed accessor on a non-pointer Object").cast::<T>())
}

#[allow(clippy::mut_from_ref)]
unsafe fn deref_mut<'a, T>(obj: Object) -> &'a mut T {
    &mut *(obj.as_ptr().expect("boxed accessor on a non-pointer Object").cast::<T>())
}

// -- Pair -----------------------------------------------------------------

pub fn cons(heap: &Heap, car: Object, cdr: Object) -> Result<Object, ThreeImpError> {
    let ptr = heap.alloc(PairObj { header: BoxedHeader::new::<PairObj>(ObjectKind::Pair), car, cdr })?;
    Ok(boxed_ptr(ptr))
}

pub fn car(obj: Object) -> Object {
    // SAFETY: callers check `is_pair()` first (stdlib raises RuntimeType otherwise).
    unsafe { deref::<PairObj>(obj) }.car
}

pub fn cdr(obj: Object) -> Object {
    unsafe { deref::<PairObj>(obj) }.cdr
}

pub fn set_car(obj: Object, v: Object) {
    unsafe { deref_mut::<PairObj>(obj) }.car = v;
}

pub fn set_cdr(obj: Object, v: Object) {
    unsafe { deref_mut::<PairObj>(obj) }.cdr = v;
}

// -- Box (mutable cell for captured, `set!`-assigned variables) -----------

pub fn make_box(heap: &Heap, initial: Object) -> Result<Object, ThreeImpError> {
    let ptr = heap.alloc(BoxObjInner { header: BoxedHeader::new::<BoxObjInner>(ObjectKind::Box), slot: initial })?;
    Ok(boxed_ptr(ptr))
}

pub fn unbox(obj: Object) -> Object {
    unsafe { deref::<BoxObjInner>(obj) }.slot
}

pub fn set_box(obj: Object, v: Object) {
    unsafe { deref_mut::<BoxObjInner>(obj) }.slot = v;
}

// -- Float64 ---------------------------------------------------------------

pub fn make_float64(heap: &Heap, value: f64) -> Result<Object, ThreeImpError> {
    let ptr = heap.alloc(Float64Obj { header: BoxedHeader::new::<Float64Obj>(ObjectKind::Float64), value })?;
    Ok(boxed_ptr(ptr))
}

/// # Safety
/// `obj.is_float64()` must hold.
pub unsafe fn float64_value(obj: Object) -> f64 {
    deref::<Float64Obj>(obj).value
}

// -- String (immutable in the core) ----------------------------------------

pub fn make_string(heap: &Heap, s: &str) -> Result<Object, ThreeImpError> {
    let ptr = heap.alloc(StringObj {
        header: BoxedHeader::new::<StringObj>(ObjectKind::String),
        bytes: s.into(),
    })?;
    Ok(boxed_ptr(ptr))
}

pub fn string_value(obj: Object) -> &'static str {
    &unsafe { deref::<StringObj>(obj) }.bytes
}

pub fn string_len(obj: Object) -> usize {
    string_value(obj).chars().count()
}

// -- Vector / Closure --------------------------------------------------------

pub fn make_vector(heap: &Heap, slots: Vec<Object>) -> Result<Object, ThreeImpError> {
    let ptr = heap.alloc(VectorObj { header: BoxedHeader::new::<VectorObj>(ObjectKind::Vector), slots })?;
    Ok(boxed_ptr(ptr))
}

/// `n_free + 1` slots: slot 0 is the entry instruction id (wrapped as a
/// fixnum), slots `1..` are the captured free-variable cells, in the order
/// the `Close` instruction pushed them.
pub fn make_closure(heap: &Heap, entry: Object, captured: Vec<Object>) -> Result<Object, ThreeImpError> {
    let mut slots = Vec::with_capacity(captured.len() + 1);
    slots.push(entry);
    slots.extend(captured);
    let ptr = heap.alloc(VectorObj { header: BoxedHeader::new::<VectorObj>(ObjectKind::Closure), slots })?;
    Ok(boxed_ptr(ptr))
}

pub fn vector_slots(obj: Object) -> &'static [Object] {
    &unsafe { deref::<VectorObj>(obj) }.slots
}

pub fn vector_slots_mut(obj: Object) -> &'static mut [Object] {
    &mut unsafe { deref_mut::<VectorObj>(obj) }.slots
}

pub fn vector_len(obj: Object) -> usize {
    vector_slots(obj).len()
}

pub fn vector_ref(obj: Object, i: usize) -> Object {
    vector_slots(obj)[i]
}

pub fn vector_set(obj: Object, i: usize, v: Object) {
    vector_slots_mut(obj)[i] = v;
}

/// The closure's body entry instruction id (slot 0, unwrapped from its
/// fixnum encoding).
pub fn closure_entry(obj: Object) -> i64 {
    vector_slots(obj)[0].as_integer().expect("closure slot 0 must hold the entry instruction id")
}

/// The closure's captured free-variable cells (slots `1..`).
pub fn closure_free(obj: Object) -> &'static [Object] {
    &vector_slots(obj)[1..]
}

// -- Syntax -----------------------------------------------------------------

pub fn make_syntax(heap: &Heap, datum: Object, span: Span) -> Result<Object, ThreeImpError> {
    let ptr = heap.alloc(SyntaxObj { header: BoxedHeader::new::<SyntaxObj>(ObjectKind::Syntax), datum, span })?;
    Ok(boxed_ptr(ptr))
}

pub fn syntax_datum(obj: Object) -> Object {
    unsafe { deref::<SyntaxObj>(obj) }.datum
}

pub fn syntax_span(obj: Object) -> Span {
    unsafe { deref::<SyntaxObj>(obj) }.span
}

/// Strip a `Syntax` wrapper down to its datum, recursively, the way the
/// compiler's front door reduces parser output to a plain datum before
/// lowering.
pub fn strip_syntax(obj: Object) -> Object {
    if obj.is_syntax() {
        strip_syntax(syntax_datum(obj))
    } else {
        obj
    }
}
