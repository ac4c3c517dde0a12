//! Read-only symbol lookup consulted by the constant scanner.

use super::basic::BasicKind;
use super::value::ConstValue;
use crate::syntax::ast::NodeId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Const,
    TypeName,
}

/// Resolved information for a name-defining identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Name of the symbol's type: a package type (`Color`), a predeclared
    /// type (`uint8`) or an untyped kind (`untyped int`).
    pub type_name: String,
    /// Underlying basic kind of that type.
    pub basic: BasicKind,
    /// Constant value; `None` for type names and for constants whose value
    /// depends on other packages.
    pub value: Option<ConstValue>,
}

/// Maps defining identifiers to their resolved symbols.
///
/// The scanner never infers types itself; whatever produced the syntax
/// must also provide an oracle that agrees with it.
pub trait SymbolOracle {
    fn lookup(&self, id: NodeId) -> Option<&Symbol>;
}

/// Symbol table produced by the checker for one package.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    defs: HashMap<NodeId, Symbol>,
}

impl TypeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NodeId, symbol: Symbol) {
        self.defs.insert(id, symbol);
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// All constant symbols, in no particular order.
    pub fn constants(&self) -> impl Iterator<Item = &Symbol> {
        self.defs.values().filter(|s| s.kind == SymbolKind::Const)
    }
}

impl SymbolOracle for TypeInfo {
    fn lookup(&self, id: NodeId) -> Option<&Symbol> {
        self.defs.get(&id)
    }
}

impl SymbolOracle for HashMap<NodeId, Symbol> {
    fn lookup(&self, id: NodeId) -> Option<&Symbol> {
        self.get(&id)
    }
}
