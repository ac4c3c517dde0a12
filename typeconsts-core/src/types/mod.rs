//! Constant evaluation and the symbol table consulted by the scanner.

pub mod basic;
pub mod checker;
pub mod oracle;
pub mod value;

pub use basic::BasicKind;
pub use checker::{check_package, CheckError};
pub use oracle::{Symbol, SymbolKind, SymbolOracle, TypeInfo};
pub use value::{ConstValue, ValueKind};
