//! CPS-lowering compiler (component C6).
//!
//! Consumes `threeimp_resolver`'s [`ResolvedExpr`](threeimp_resolver::ResolvedExpr)
//! tree -- every reference already classified local/free/global, every
//! lambda already carrying its `locals_boxed`/`free`-capture metadata --
//! and lowers it into `threeimp_vcode`'s flat [`VmExp`](threeimp_vcode::VmExp)
//! pool. This crate never walks a raw `Object` datum or a symbol name; that
//! work is `threeimp_resolver`'s.
//!
//! Lowering is a structural recursion that threads a "next" instruction id
//! and emits instructions in reverse order (tail first): every `compile_*`
//! helper takes the instruction that should run *after* the one it is
//! about to build, and returns the id of the instruction to run *first*.

mod lower;

pub use lower::compile_program;
