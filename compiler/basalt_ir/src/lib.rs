//! Shared front-end data model for Basalt.
//!
//! Tokens, interned names, AST node families, and the flat node arena the
//! parser allocates into. Downstream tooling (indexers, linters, IDE
//! services) walks the structures defined here.

pub mod arena;
pub mod ast;
mod interner;
mod loc;
mod name;
pub mod token;

pub use arena::{ArenaMark, ArenaNode, Id, NodeArena};
pub use ast::*;
pub use interner::StringInterner;
pub use loc::Loc;
pub use name::Name;
pub use token::{Token, TokenIdx, TokenKind, TokenList};
