//! Interned-symbol table (component C1).
//!
//! A bijection between strings and small, dense integer ids. `intern` is
//! idempotent and ids are stable for the life of the process: this is a
//! process-wide, append-only table, initialized lazily behind a one-shot
//! initializer and then treated as `const`.
//!
//! A small fixed set of well-known symbol ids (`quote`, `lambda`, `if`, ...)
//! is resolved once via [`well_known`] and cached for hot comparisons in the
//! scope resolver and compiler.

use hashbrown::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

/// A dense, process-stable id for an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Raw index into the table. Exposed so other crates can use it as a
    /// compact key (e.g. the global-definitions side table in `threeimp_vcode`).
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Reconstruct a `SymbolId` from a raw index, e.g. one unpacked from a
    /// tagged `Object` word in `threeimp_value`. Only valid for indices
    /// previously produced by `intern`.
    pub fn from_index(index: u32) -> SymbolId {
        SymbolId(index)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<sym:{}>", self.0)
    }
}

#[derive(Default)]
struct SymbolTable {
    ids: HashMap<String, SymbolId>,
    names: Vec<String>,
}

impl SymbolTable {
    fn intern(&mut self, s: &str) -> SymbolId {
        if let Some(&id) = self.ids.get(s) {
            return id;
        }
        let id = SymbolId(self.names.len() as u32);
        self.names.push(s.to_owned());
        self.ids.insert(s.to_owned(), id);
        id
    }

    fn name(&self, id: SymbolId) -> &str {
        &self.names[id.index()]
    }
}

fn table() -> &'static Mutex<SymbolTable> {
    static TABLE: OnceLock<Mutex<SymbolTable>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(SymbolTable::default()))
}

/// Intern `s`, returning its (possibly newly assigned) id. Idempotent.
pub fn intern(s: &str) -> SymbolId {
    table().lock().expect("symbol table poisoned").intern(s)
}

/// Look up the string behind `id`. Panics if `id` was not produced by
/// [`intern`] in this process -- ids are never rewritten.
pub fn name(id: SymbolId) -> String {
    table().lock().expect("symbol table poisoned").name(id).to_owned()
}

/// The number of distinct symbols interned so far.
pub fn count() -> usize {
    table().lock().expect("symbol table poisoned").names.len()
}

/// The syntactic keywords and scope tags the scope resolver and compiler
/// compare against on every form; resolved once and cached.
#[derive(Debug, Clone, Copy)]
pub struct WellKnown {
    pub quote: SymbolId,
    pub lambda: SymbolId,
    pub if_: SymbolId,
    pub set: SymbolId,
    pub call_cc: SymbolId,
    pub define: SymbolId,
    pub begin: SymbolId,
    pub p_invoke: SymbolId,
    pub reference: SymbolId,
    pub mutation: SymbolId,
    pub local: SymbolId,
    pub free: SymbolId,
    pub global: SymbolId,
}

/// Returns the process-wide cache of well-known symbol ids, interning each
/// one on first use.
pub fn well_known() -> &'static WellKnown {
    static CACHE: OnceLock<WellKnown> = OnceLock::new();
    CACHE.get_or_init(|| WellKnown {
        quote: intern("quote"),
        lambda: intern("lambda"),
        if_: intern("if"),
        set: intern("set!"),
        call_cc: intern("call/cc"),
        define: intern("define"),
        begin: intern("begin"),
        p_invoke: intern("p/invoke"),
        reference: intern("reference"),
        mutation: intern("mutation"),
        local: intern("local"),
        free: intern("free"),
        global: intern("global"),
    })
}
