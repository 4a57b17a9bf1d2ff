//! The tagged machine-word value.
//!
//! ```text
//! 000          heap pointer, 8-byte aligned (61-bit pointer)
//! xx1          signed fixnum (63-bit two's complement)
//! x10          interned symbol (62-bit id)
//! 000 100      float32 (32-bit IEEE-754 in the high half)
//! 001 100      unicode codepoint (58-bit scalar)
//! 010 100      boolean (low bit of the payload = truth)
//! 011 100      eof singleton
//! 100 100      undefined singleton
//! ```
//! The zero word is reserved for the empty list / null.

use crate::boxed::{BoxedHeader, ObjectKind};
use threeimp_common::ThreeImpError;
use threeimp_intern::SymbolId;

const FIXNUM_TAG: u64 = 0b1;
const SYMBOL_TAG: u64 = 0b10;
const HALFWORD_TAG: u64 = 0b100;
const FLOAT32_TAG: u64 = (0b000 << 3) | HALFWORD_TAG;
const RUNE_TAG: u64 = (0b001 << 3) | HALFWORD_TAG;
const BOOL_TAG: u64 = (0b010 << 3) | HALFWORD_TAG;
const EOF_TAG: u64 = (0b011 << 3) | HALFWORD_TAG;
const UNDEF_TAG: u64 = (0b100 << 3) | HALFWORD_TAG;

/// Fixnums are a 63-bit signed range: one bit of the word pays for the tag.
pub const FIXNUM_MIN: i64 = -(1i64 << 62);
pub const FIXNUM_MAX: i64 = (1i64 << 62) - 1;

/// A single tagged machine word -- the monotype every compiled expression
/// and every stack/register slot carries.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Object(u64);

impl Object {
    /// The empty-list / null singleton. Also the `Default` value.
    pub const NULL: Object = Object(0);

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Reconstruct an `Object` from a raw word produced by [`Object::raw`]
    /// (or restored from a `call/cc` stack snapshot). Not validated:
    /// callers must only feed back words this module itself produced.
    #[inline]
    pub const fn from_raw(word: u64) -> Object {
        Object(word)
    }

    // -- atomic constructors -------------------------------------------

    pub fn boolean(v: bool) -> Object {
        Object((u64::from(v) << 6) | BOOL_TAG)
    }

    pub const TRUE: Object = Object((1u64 << 6) | BOOL_TAG);
    pub const FALSE: Object = Object(BOOL_TAG);
    pub const EOF: Object = Object(EOF_TAG);
    pub const UNDEFINED: Object = Object(UNDEF_TAG);

    /// `make_integer(n)` succeeds iff `-2^62 <= n < 2^62`.
    pub fn integer(n: i64) -> Result<Object, ThreeImpError> {
        if !(FIXNUM_MIN..=FIXNUM_MAX).contains(&n) {
            return Err(ThreeImpError::runtime_type(format!(
                "fixnum out of range: {n} (expected {FIXNUM_MIN}..={FIXNUM_MAX})"
            )));
        }
        Ok(Object(((n as u64) << 1) | FIXNUM_TAG))
    }

    pub fn symbol(id: SymbolId) -> Object {
        Object(((id.index() as u64) << 2) | SYMBOL_TAG)
    }

    pub fn float32(v: f32) -> Object {
        Object(((v.to_bits() as u64) << 32) | FLOAT32_TAG)
    }

    pub fn rune(codepoint: char) -> Object {
        Object(((codepoint as u64) << 6) | RUNE_TAG)
    }

    pub fn ptr(ptr: *mut u8) -> Object {
        let word = ptr as u64;
        debug_assert_eq!(word & 0b111, 0, "boxed objects must be 8-byte aligned");
        Object(word)
    }

    // -- predicates ------------------------------------------------------

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        self.0 & 0b1 == FIXNUM_TAG
    }

    #[inline]
    pub const fn is_symbol(self) -> bool {
        self.0 & 0b11 == SYMBOL_TAG
    }

    #[inline]
    fn halfword_tag(self) -> Option<u64> {
        if self.0 & 0b111 == HALFWORD_TAG {
            Some(self.0 & 0b111_111)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_float32(self) -> bool {
        self.halfword_tag() == Some(FLOAT32_TAG)
    }

    #[inline]
    pub fn is_rune(self) -> bool {
        self.halfword_tag() == Some(RUNE_TAG)
    }

    #[inline]
    pub fn is_boolean(self) -> bool {
        self.halfword_tag() == Some(BOOL_TAG)
    }

    #[inline]
    pub fn is_eof(self) -> bool {
        self.halfword_tag() == Some(EOF_TAG)
    }

    #[inline]
    pub fn is_undef(self) -> bool {
        self.halfword_tag() == Some(UNDEF_TAG)
    }

    #[inline]
    pub fn is_ptr(self) -> bool {
        !self.is_null() && self.0 & 0b111 == 0
    }

    /// Any value other than the boolean-false singleton is truthy, per
    /// `Test`'s branch semantics.
    #[inline]
    pub fn is_truthy(self) -> bool {
        self != Object::FALSE
    }

    // -- atomic accessors --------------------------------------------------

    pub fn as_integer(self) -> Option<i64> {
        self.is_integer().then(|| (self.0 as i64) >> 1)
    }

    pub fn as_symbol(self) -> Option<SymbolId> {
        self.is_symbol().then(|| SymbolId::from_index((self.0 >> 2) as u32))
    }

    pub fn as_float32(self) -> Option<f32> {
        self.is_float32().then(|| f32::from_bits((self.0 >> 32) as u32))
    }

    pub fn as_rune(self) -> Option<char> {
        if !self.is_rune() {
            return None;
        }
        char::from_u32((self.0 >> 6) as u32)
    }

    pub fn as_boolean(self) -> Option<bool> {
        self.is_boolean().then(|| self == Object::TRUE)
    }

    pub fn as_ptr(self) -> Option<*mut u8> {
        self.is_ptr().then_some(self.0 as *mut u8)
    }

    /// # Safety
    /// `self` must be `is_ptr()` and must point at a live boxed object
    /// allocated by this crate.
    unsafe fn header(self) -> &'static BoxedHeader {
        &*(self.0 as *const BoxedHeader)
    }

    fn boxed_kind(self) -> Option<ObjectKind> {
        if !self.is_ptr() {
            return None;
        }
        // SAFETY: `is_ptr()` just verified this is a tagged pointer to a
        // live boxed object; every constructor in `boxed.rs` writes a
        // `BoxedHeader` as the first field.
        Some(unsafe { self.header() }.kind)
    }

    pub fn is_pair(self) -> bool {
        self.boxed_kind() == Some(ObjectKind::Pair)
    }

    pub fn is_box(self) -> bool {
        self.boxed_kind() == Some(ObjectKind::Box)
    }

    pub fn is_float64(self) -> bool {
        self.boxed_kind() == Some(ObjectKind::Float64)
    }

    pub fn is_string(self) -> bool {
        self.boxed_kind() == Some(ObjectKind::String)
    }

    pub fn is_vector(self) -> bool {
        self.boxed_kind() == Some(ObjectKind::Vector)
    }

    pub fn is_closure(self) -> bool {
        self.boxed_kind() == Some(ObjectKind::Closure)
    }

    pub fn is_syntax(self) -> bool {
        self.boxed_kind() == Some(ObjectKind::Syntax)
    }

    pub fn kind(self) -> &'static str {
        if self.is_null() {
            "null"
        } else if self.is_integer() {
            "fixnum"
        } else if self.is_symbol() {
            "symbol"
        } else if self.is_float32() {
            "float32"
        } else if self.is_rune() {
            "rune"
        } else if self.is_boolean() {
            "boolean"
        } else if self.is_eof() {
            "eof"
        } else if self.is_undef() {
            "undefined"
        } else {
            match self.boxed_kind() {
                Some(ObjectKind::Box) => "box",
                Some(ObjectKind::Pair) => "pair",
                Some(ObjectKind::Float64) => "float64",
                Some(ObjectKind::String) => "string",
                Some(ObjectKind::Vector) => "vector",
                Some(ObjectKind::Closure) => "closure",
                Some(ObjectKind::Syntax) => "syntax",
                None => "unknown",
            }
        }
    }

    /// Numeric coercion: integer/float32/float64 all widen to `f64`. Mixed-
    /// type arithmetic on any float64 operand produces float64, otherwise
    /// fixnum-preserving; the stdlib arithmetic dispatch calls this when
    /// either operand is not a plain fixnum.
    pub fn to_double(self) -> Option<f64> {
        if let Some(n) = self.as_integer() {
            Some(n as f64)
        } else if let Some(f) = self.as_float32() {
            Some(f as f64)
        } else if self.is_float64() {
            // SAFETY: is_float64() guarantees a live Float64Obj.
            Some(unsafe { crate::boxed::float64_value(self) })
        } else {
            None
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Object::NULL
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#<{}:{:#x}>", self.kind(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_the_zero_word() {
        assert_eq!(Object::NULL.raw(), 0);
        assert!(Object::NULL.is_null());
    }

    #[test]
    fn fixnum_round_trips() {
        for n in [-5i64, 0, 5, FIXNUM_MIN, FIXNUM_MAX] {
            let obj = Object::integer(n).unwrap();
            assert!(obj.is_integer());
            assert_eq!(obj.as_integer(), Some(n));
        }
    }

    #[test]
    fn fixnum_out_of_range_is_rejected() {
        assert!(Object::integer(FIXNUM_MAX + 1).is_err());
        assert!(Object::integer(FIXNUM_MIN - 1).is_err());
    }

    #[test]
    fn predicates_are_mutually_exclusive() {
        let values = vec![
            Object::NULL,
            Object::integer(42).unwrap(),
            Object::symbol(SymbolId::from_index(3)),
            Object::float32(1.5),
            Object::boolean(true),
            Object::boolean(false),
            Object::EOF,
            Object::UNDEFINED,
        ];
        for v in &values {
            let flags = [
                v.is_null(),
                v.is_integer(),
                v.is_symbol(),
                v.is_float32(),
                v.is_boolean(),
                v.is_eof(),
                v.is_undef(),
            ];
            assert_eq!(flags.iter().filter(|&&b| b).count(), 1, "{v:?} matched {flags:?}");
        }
    }

    #[test]
    fn booleans_have_two_canonical_words_and_compare_raw() {
        assert_ne!(Object::TRUE.raw(), Object::FALSE.raw());
        assert_eq!(Object::boolean(true), Object::TRUE);
        assert_eq!(Object::boolean(false), Object::FALSE);
    }

    #[test]
    fn non_false_is_truthy() {
        assert!(!Object::FALSE.is_truthy());
        assert!(Object::TRUE.is_truthy());
        assert!(Object::integer(0).unwrap().is_truthy());
        assert!(Object::NULL.is_truthy());
    }
}
