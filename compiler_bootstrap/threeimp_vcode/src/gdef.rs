//! Global-definitions table.
//!
//! Append-only, indexed by [`GDefId`]. Grounded on `ss-core/defn.hh`, which
//! keeps separate local/global vectors with a name-to-id side map *only*
//! for globals -- local slot numbers are purely positional after scope
//! resolution and are never looked up by name again.

use hashbrown::HashMap;
use threeimp_common::Span;
use threeimp_intern::SymbolId;
use threeimp_value::Object;

use crate::vmexp::VmExpId;

pub type GDefId = usize;

#[derive(Debug, Clone)]
pub struct GlobalDef {
    pub name: SymbolId,
    /// Entry instruction id, if this global is bound to a compiled
    /// procedure body rather than a plain value.
    pub code: Option<VmExpId>,
    pub initializer: Option<Object>,
    pub docstring: Option<String>,
    pub span: Option<Span>,
    /// Set once a `set!` targets this global.
    pub mutated: bool,
}

#[derive(Debug, Default)]
pub struct GlobalTable {
    defs: Vec<GlobalDef>,
    by_name: HashMap<SymbolId, GDefId>,
}

impl GlobalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a new global, or return the existing id if `name` is already
    /// bound. The scope resolver is responsible for deciding whether a
    /// redefinition is an error, reporting both source locations.
    pub fn define(
        &mut self,
        name: SymbolId,
        initializer: Option<Object>,
        docstring: Option<String>,
        span: Option<Span>,
    ) -> GDefId {
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let id = self.defs.len();
        self.defs.push(GlobalDef { name, code: None, initializer, docstring, span, mutated: false });
        self.by_name.insert(name, id);
        id
    }

    pub fn lookup(&self, name: SymbolId) -> Option<GDefId> {
        self.by_name.get(&name).copied()
    }

    pub fn get(&self, id: GDefId) -> &GlobalDef {
        &self.defs[id]
    }

    pub fn set_code(&mut self, id: GDefId, entry: VmExpId) {
        self.defs[id].code = Some(entry);
    }

    pub fn mark_mutated(&mut self, id: GDefId) {
        self.defs[id].mutated = true;
    }

    pub fn count(&self) -> usize {
        self.defs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GDefId, &GlobalDef)> {
        self.defs.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threeimp_common::{Position, Span};

    #[test]
    fn define_is_idempotent_by_name() {
        let mut table = GlobalTable::new();
        let name = threeimp_intern::intern("threeimp-vcode-test-global");
        let id1 = table.define(name, None, None, None);
        let id2 = table.define(name, None, None, None);
        assert_eq!(id1, id2);
        assert_eq!(table.count(), 1);
    }

    #[test]
    fn lookup_finds_defined_globals() {
        let mut table = GlobalTable::new();
        let name = threeimp_intern::intern("threeimp-vcode-test-lookup");
        let id = table.define(
            name,
            None,
            Some("doc".to_string()),
            Some(Span::single(Position::start(), 0)),
        );
        assert_eq!(table.lookup(name), Some(id));
    }
}
