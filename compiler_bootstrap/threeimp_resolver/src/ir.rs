//! The resolved intermediate form the compiler (C6) lowers to `VmExp`.
//!
//! Every variable reference here has already been classified as local,
//! free or global and reduced to a positional index -- the compiler never
//! walks a name back to a binding site.

use std::rc::Rc;
use threeimp_intern::SymbolId;
use threeimp_value::Object;
use threeimp_vcode::GDefId;

/// Which frame a resolved reference's index is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelScope {
    Local,
    Free,
    Global,
}

/// How a lambda's free slot `i` is populated at its `Close` site, expressed
/// relative to the *enclosing* scope: either the enclosing scope's own
/// local slot, or (when the enclosing scope itself only has this variable
/// as one of *its* free slots) a pass-through of the enclosing scope's free
/// slot.
#[derive(Debug, Clone, Copy)]
pub struct FreeCapture {
    pub scope: RelScope, // Local or Free -- never Global, a global needs no capture
    pub index: usize,
    /// Whether the *source* slot this capture reads from is itself boxed.
    /// Boxed-ness is a property of a variable's original local binding site
    /// (`LambdaInfo::locals_boxed`) that is carried unchanged through every
    /// further free-variable pass-through, since each hop only ever copies
    /// the box pointer, never its contents.
    pub boxed: bool,
}

/// A fully scope-resolved lambda body plus the bookkeeping the compiler
/// needs to emit its entry sequence and its enclosing `Close` instruction.
#[derive(Debug)]
pub struct LambdaInfo {
    pub n_params: usize,
    /// Per formal-parameter-slot: whether this local is ever the target of
    /// `set!` anywhere in its lexical extent (including inside nested
    /// lambdas). The compiler emits a `Box` instruction for each such slot
    /// right after entry, and every later `ReferLocal`/`AssignLocal` on it
    /// goes through the boxed cell rather than the raw stack slot -- this
    /// is what lets a closure that captures the variable observe later
    /// mutations. See `DESIGN.md` for why this crate boxes on *mutation*
    /// alone rather than mutation-and-capture.
    pub locals_boxed: Vec<bool>,
    /// In free-slot order: how to fetch each captured variable from the
    /// enclosing scope when this lambda's `Close` instruction runs.
    pub free: Vec<FreeCapture>,
    pub body: ResolvedExpr,
}

#[derive(Debug, Clone)]
pub enum ResolvedExpr {
    Const(Object),
    Quote(Object),
    Refer(RelScope, usize, SymbolId),
    If(Box<ResolvedExpr>, Box<ResolvedExpr>, Box<ResolvedExpr>),
    Assign(RelScope, usize, SymbolId, Box<ResolvedExpr>),
    Lambda(Rc<LambdaInfo>),
    Begin(Vec<ResolvedExpr>),
    CallCc(Box<ResolvedExpr>),
    /// `name` is resolved against the `PlatformProcTable` at compile time,
    /// not here -- the table is owned alongside `VCode`, a layer below this
    /// crate.
    PInvoke(SymbolId, Vec<ResolvedExpr>),
    App(Box<ResolvedExpr>, Vec<ResolvedExpr>),
    /// Top-level only, subject to the global-redefinition rule `resolve`
    /// enforces. Never appears nested inside another `ResolvedExpr`.
    Define(GDefId, Box<ResolvedExpr>),
}
