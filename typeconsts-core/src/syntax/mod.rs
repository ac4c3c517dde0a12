//! Go source front end: lexer, literal decoding and a declaration-level parser.
//!
//! Only package-scope declarations are modelled in detail. Function bodies,
//! composite types and `var` initializers are skipped with balanced-bracket
//! matching so that any well-formed Go file can be read.

pub mod ast;
pub mod lexer;
pub mod literal;
pub mod parser;

pub use ast::{DeclGroup, DeclKind, Expr, File, Ident, NodeId, Pos, TypeExpr, ValueSpec};
pub use lexer::{tokenize, LexError};
pub use parser::{parse_file, SyntaxError};
