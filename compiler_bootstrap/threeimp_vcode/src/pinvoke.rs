//! Platform-procedure table and the `ArgView`
//! window a platform callback reads its arguments through.
//!
//! Grounded on `ss-core/pinvoke.hh`'s `ArgView`/`PlatformProcTable`: a
//! thin bounds-checked view over a slice of the live stack, and an
//! append-only table of `(name, arity, variadic, arg-names, docstring,
//! callback)` records. One deliberate redesign here: variadic-ness is an
//! explicit `variadic: bool` alongside a `usize` minimum arity, rather
//! than an `arity < 0` encoding.

use hashbrown::HashMap;
use threeimp_common::ThreeImpError;
use threeimp_intern::SymbolId;
use threeimp_memory::Heap;
use threeimp_value::Object;

/// A bounds-checked, borrowed window over a contiguous run of stack slots.
/// The borrow enforces at compile time that no allocation can occur
/// through this view while it is held -- there is no way to obtain a
/// second mutable reference to the stack while an `ArgView` is alive, so
/// a callback that reads all its arguments into locals before allocating
/// is automatically safe.
pub struct ArgView<'a> {
    slice: &'a [Object],
}

impl<'a> ArgView<'a> {
    pub fn new(slice: &'a [Object]) -> Self {
        Self { slice }
    }

    pub fn size(&self) -> usize {
        self.slice.len()
    }

    pub fn get(&self, idx: usize) -> Result<Object, ThreeImpError> {
        self.slice
            .get(idx)
            .copied()
            .ok_or_else(|| ThreeImpError::runtime_lookup(format!("out-of-bounds stack access: arg {idx}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = Object> + '_ {
        self.slice.iter().copied()
    }
}

impl<'a> std::ops::Index<usize> for ArgView<'a> {
    type Output = Object;
    fn index(&self, idx: usize) -> &Object {
        &self.slice[idx]
    }
}

/// A platform procedure's native implementation. Takes the borrowed
/// argument window and the heap (primitives like `cons` allocate).
pub type PlatformProcCb = Box<dyn for<'a> Fn(ArgView<'a>, &Heap) -> Result<Object, ThreeImpError>>;

pub type PlatformProcId = usize;

pub struct PlatformProcMetadata {
    pub name: SymbolId,
    /// Minimum argument count.
    pub arity: usize,
    pub variadic: bool,
    pub arg_names: Vec<SymbolId>,
    pub docstring: String,
}

pub struct PlatformProcTable {
    metadata: Vec<PlatformProcMetadata>,
    callbacks: Vec<PlatformProcCb>,
    by_name: HashMap<SymbolId, PlatformProcId>,
}

impl Default for PlatformProcTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProcTable {
    pub fn new() -> Self {
        Self { metadata: Vec::new(), callbacks: Vec::new(), by_name: HashMap::new() }
    }

    /// Register a platform procedure, pairing a callback with a symbolic
    /// name and formal-parameter list.
    pub fn define(
        &mut self,
        name: SymbolId,
        arg_names: Vec<SymbolId>,
        variadic: bool,
        docstring: impl Into<String>,
        cb: PlatformProcCb,
    ) -> PlatformProcId {
        let arity = arg_names.len();
        let id = self.metadata.len();
        self.metadata.push(PlatformProcMetadata { name, arity, variadic, arg_names, docstring: docstring.into() });
        self.callbacks.push(cb);
        self.by_name.insert(name, id);
        id
    }

    pub fn lookup(&self, name: SymbolId) -> Option<PlatformProcId> {
        self.by_name.get(&name).copied()
    }

    pub fn metadata(&self, id: PlatformProcId) -> &PlatformProcMetadata {
        &self.metadata[id]
    }

    pub fn call(&self, id: PlatformProcId, args: ArgView<'_>, heap: &Heap) -> Result<Object, ThreeImpError> {
        let meta = &self.metadata[id];
        let ok = if meta.variadic { args.size() >= meta.arity } else { args.size() == meta.arity };
        if !ok {
            return Err(ThreeImpError::runtime_type(format!(
                "platform procedure arity mismatch: expected {}{} args, got {}",
                if meta.variadic { "at least " } else { "" },
                meta.arity,
                args.size()
            )));
        }
        (self.callbacks[id])(args, heap)
    }

    pub fn count(&self) -> usize {
        self.metadata.len()
    }
}
