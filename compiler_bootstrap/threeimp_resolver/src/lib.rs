//! Lexical scope resolver (component C5).
//!
//! Takes the datum tree a (conceptually external) reader or a `threeimp_cli`
//! demo program hands in and produces [`ir::ResolvedExpr`] -- every
//! variable reference already classified local/free/global and reduced to
//! a positional index, every lambda already carrying the `locals_boxed`
//! and `free`-capture metadata its `Close`/`Box` instructions need.
//! `threeimp_compiler` (C6) consumes this crate's output directly; it never
//! sees a raw `Object` datum.

pub mod form;
pub mod ir;
pub mod resolve;

pub use form::{parse, Form};
pub use ir::{FreeCapture, LambdaInfo, RelScope, ResolvedExpr};
pub use resolve::{is_boxed, resolve_program};
