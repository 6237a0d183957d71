//! Parser test suites.
//!
//! Organized by grammar family, plus recovery/property suites:
//! - `expr`: the operator-precedence cascade and primaries
//! - `stmt`: statement forms, foreach, try, asm
//! - `decl`: declarations, attributes, conditionals, comments
//! - `recovery`: error recovery, bookmarks, diagnostics

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

pub(crate) mod lex;

mod recovery;
mod stmt;

use basalt_ir::{
    BodyKind, Decl, DeclKind, Expr, ExprId, Initializer, Module, NodeArena, StmtId, StmtKind,
    StringInterner,
};

use crate::{parse_module, ParseConfig, ParseOutput};

/// Parse with default config (bodies minimized).
pub(crate) fn parse_source(source: &str) -> (ParseOutput, StringInterner) {
    let interner = StringInterner::new();
    let tokens = lex::lex(source, &interner);
    let output = parse_module(&tokens, "test.bst", &interner, ParseConfig::default());
    (output, interner)
}

/// Parse with function bodies retained, for statement-level assertions.
pub(crate) fn parse_retained(source: &str) -> (ParseOutput, StringInterner) {
    let interner = StringInterner::new();
    let tokens = lex::lex(source, &interner);
    let config = ParseConfig {
        retain_bodies: true,
        ..ParseConfig::default()
    };
    let output = parse_module(&tokens, "test.bst", &interner, config);
    (output, interner)
}

pub(crate) fn first_decl<'a>(module: &Module, arena: &'a NodeArena) -> &'a Decl {
    arena.get(module.declarations[0])
}

/// The statements of the first declaration's function body, which must
/// have been parsed with `parse_retained`.
pub(crate) fn first_body_stmts(output: &ParseOutput) -> Vec<StmtId> {
    let decl = first_decl(&output.module, &output.arena);
    let DeclKind::Function(func) = &decl.kind else {
        panic!("expected function declaration, got {:?}", decl.kind)
    };
    let BodyKind::Block { stmts: Some(block) } = &func.body.kind else {
        panic!("expected retained block body")
    };
    let StmtKind::Block { stmts } = &output.arena.get(*block).kind else {
        panic!("expected block statement")
    };
    stmts.to_vec()
}

/// The initializer expression of `int x = ...;`-style first declaration.
pub(crate) fn first_initializer(output: &ParseOutput) -> ExprId {
    let decl = first_decl(&output.module, &output.arena);
    let DeclKind::Variable(var) = &decl.kind else {
        panic!("expected variable declaration, got {:?}", decl.kind)
    };
    match var.declarators[0].initializer.as_ref().expect("initializer") {
        Initializer::Expr(expr) => *expr,
        other => panic!("expected expression initializer, got {other:?}"),
    }
}

pub(crate) fn expr<'a>(output: &'a ParseOutput, id: ExprId) -> &'a Expr {
    output.arena.get(id)
}
