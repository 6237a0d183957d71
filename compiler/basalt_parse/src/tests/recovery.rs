//! Recovery, bookmark, and diagnostic-plumbing tests.

use std::cell::RefCell;

use basalt_ir::{DeclKind, Name, NodeArena, StringInterner, TokenKind};
use basalt_diagnostic::DiagnosticSink;
use rustc_hash::FxHashMap;

use super::{lex, parse_source};
use crate::cursor::Cursor;
use crate::{parse_module, ParseConfig, Parser};

fn make_parser<'a>(
    tokens: &'a basalt_ir::TokenList,
    interner: &'a StringInterner,
) -> Parser<'a> {
    Parser {
        cursor: Cursor::new(tokens),
        arena: NodeArena::new(),
        sink: DiagnosticSink::new("test.bst", None),
        interner,
        retain_bodies: false,
        token_source: None,
        pending_comment: Name::EMPTY,
        supplemental: Name::EMPTY,
        aa_memo: FxHashMap::default(),
    }
}

#[test]
fn errors_still_yield_a_partial_tree() {
    let (output, interner) = parse_source("int x = ;\nint y = 2;");
    assert!(output.has_errors());
    // The broken declaration is dropped; the next one survives.
    let survived: Vec<_> = output
        .module
        .declarations
        .iter()
        .filter_map(|&id| match &output.arena.get(id).kind {
            DeclKind::Variable(var) => Some(interner.lookup(var.declarators[0].name)),
            _ => None,
        })
        .collect();
    assert!(survived.contains(&"y"));
}

#[test]
fn garbage_input_terminates_with_errors() {
    let (output, _interner) = parse_source(") ] } ; ( [ { + - * ??? !!!");
    assert!(output.has_errors());
    // No assertion on the tree shape; termination and a well-formed
    // (possibly empty) module are the property.
    let _ = output.module;
}

#[test]
fn unbalanced_braces_terminate() {
    let (output, _interner) = parse_source("struct S { int x;");
    assert!(output.has_errors());

    let (output, _interner) = parse_source("void f() { { { }");
    assert!(output.has_errors());
}

#[test]
fn diagnostics_reach_the_callback_in_line_format() {
    let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let interner = StringInterner::new();
    let tokens = lex::lex("int x = ;", &interner);
    let config = ParseConfig {
        on_message: Some(Box::new(|file, line, column, message, is_error| {
            let tag = if is_error { "error" } else { "warn" };
            lines
                .borrow_mut()
                .push(format!("{file}({line}:{column})[{tag}]: {message}"));
        })),
        ..ParseConfig::default()
    };
    let output = parse_module(&tokens, "m.bst", &interner, config);
    assert!(output.has_errors());
    let lines = lines.into_inner();
    assert!(!lines.is_empty());
    assert!(lines[0].starts_with("m.bst(1:"));
    assert!(lines[0].contains(")[error]: "));

    // Published diagnostics render identically.
    assert_eq!(output.diagnostics.len() as u32, output.error_count);
    assert_eq!(lines[0], output.diagnostics[0].render("m.bst"));
}

#[test]
fn bookmark_restores_cursor_exactly() {
    let interner = StringInterner::new();
    let tokens = lex::lex("a + b * c", &interner);
    let mut parser = make_parser(&tokens, &interner);

    parser.cursor.advance();
    let before = parser.cursor.position();
    let bookmark = parser.set_bookmark();
    parser.cursor.advance();
    parser.cursor.advance();
    assert_ne!(parser.cursor.position(), before);
    parser.go_to_bookmark(bookmark);
    assert_eq!(parser.cursor.position(), before);
    assert!(!parser.sink.is_suppressed());
}

#[test]
fn abandoned_bookmark_keeps_position() {
    let interner = StringInterner::new();
    let tokens = lex::lex("a + b * c", &interner);
    let mut parser = make_parser(&tokens, &interner);

    let bookmark = parser.set_bookmark();
    parser.cursor.advance();
    parser.cursor.advance();
    let advanced = parser.cursor.position();
    parser.abandon_bookmark(bookmark);
    assert_eq!(parser.cursor.position(), advanced);
    assert!(!parser.sink.is_suppressed());
}

#[test]
fn nested_bookmarks_resolve_in_lifo_order() {
    let interner = StringInterner::new();
    let tokens = lex::lex("a b c d e", &interner);
    let mut parser = make_parser(&tokens, &interner);

    let outer = parser.set_bookmark();
    parser.cursor.advance();
    let inner = parser.set_bookmark();
    parser.cursor.advance();
    parser.cursor.advance();
    parser.abandon_bookmark(inner);
    assert!(parser.sink.is_suppressed(), "outer scope still active");
    parser.go_to_bookmark(outer);
    assert_eq!(parser.cursor.position(), 0);
    assert!(!parser.sink.is_suppressed());
}

#[test]
fn speculation_discards_arena_nodes() {
    let interner = StringInterner::new();
    let tokens = lex::lex("1 + 2", &interner);
    let mut parser = make_parser(&tokens, &interner);

    let before = parser.arena.len::<basalt_ir::Expr>();
    let bookmark = parser.set_bookmark();
    parser.parse_expression().expect("expression parses");
    assert!(parser.arena.len::<basalt_ir::Expr>() > before);
    parser.go_to_bookmark(bookmark);
    assert_eq!(parser.arena.len::<basalt_ir::Expr>(), before);
}

#[test]
fn speculative_diagnostics_are_never_published() {
    let interner = StringInterner::new();
    let tokens = lex::lex("+ + +", &interner);
    let mut parser = make_parser(&tokens, &interner);

    let bookmark = parser.set_bookmark();
    assert!(parser.parse_expression().is_err());
    parser.go_to_bookmark(bookmark);
    assert_eq!(parser.sink.error_count(), 0);
    assert!(parser.sink.suppressed_count() > 0);
}

#[test]
fn classifier_predicates_do_not_move_the_cursor() {
    let interner = StringInterner::new();
    // Ambiguous prefix: needs a full speculative declaration parse.
    let tokens = lex::lex("Foo!(int) bar = baz;", &interner);
    let mut parser = make_parser(&tokens, &interner);

    let before = parser.cursor.position();
    assert!(parser.is_declaration());
    assert_eq!(parser.cursor.position(), before);
    assert!(!parser.sink.is_suppressed());
}

#[test]
fn is_attribute_resolves_spec_ambiguities() {
    let interner = StringInterner::new();
    let check = |source: &str, expected: bool| {
        let tokens = lex::lex(source, &interner);
        let parser = make_parser(&tokens, &interner);
        assert_eq!(parser.is_attribute(), expected, "source: {source}");
    };
    // Type constructors only count without `(`.
    check("shared int x;", true);
    check("shared(int) x;", false);
    check("const int x;", true);
    check("const(int) x;", false);
    check("scope x = y;", true);
    check("scope(exit) x();", false);
    // `static` exceptions.
    check("static int x;", true);
    check("static if (x) {}", false);
    check("static assert(x);", false);
    check("static this() {}", false);
    check("static ~this() {}", false);
    check("shared static this() {}", false);
    // `pragma` declaration vs. attribute.
    check("pragma(lib, \"x\");", false);
    check("pragma(inline) int f;", true);
}

#[test]
fn is_cast_qualifier_accepts_the_admitted_sequences() {
    let interner = StringInterner::new();
    let check = |source: &str, expected: bool| {
        let tokens = lex::lex(source, &interner);
        let parser = make_parser(&tokens, &interner);
        assert_eq!(parser.is_cast_qualifier(), expected, "source: {source}");
    };
    check("const)", true);
    check("const shared)", true);
    check("shared)", true);
    check("shared const)", true);
    check("inout shared)", true);
    check("immutable)", true);
    check("const int)", false);
    check("immutable shared)", false);
}

#[test]
fn associative_array_oracle_is_memoized() {
    let interner = StringInterner::new();
    let tokens = lex::lex("[1: 2]", &interner);
    let mut parser = make_parser(&tokens, &interner);

    assert!(parser.is_associative_array_literal());
    assert_eq!(parser.aa_memo.len(), 1);
    // Second query hits the memo and agrees.
    assert!(parser.is_associative_array_literal());
    assert_eq!(parser.aa_memo.len(), 1);
    assert_eq!(parser.cursor.position(), 0);
}

#[test]
fn expect_holds_position_on_recovery_anchors() {
    let interner = StringInterner::new();
    let tokens = lex::lex("; x", &interner);
    let mut parser = make_parser(&tokens, &interner);

    // Current token is `;`, a recovery anchor: report but do not skip.
    assert!(parser.expect(TokenKind::Identifier).is_err());
    assert_eq!(parser.cursor.position(), 0);
    assert_eq!(parser.sink.error_count(), 1);

    // On a non-anchor token the cursor advances once.
    let tokens = lex::lex("x y", &interner);
    let mut parser = make_parser(&tokens, &interner);
    assert!(parser.expect(TokenKind::Module).is_err());
    assert_eq!(parser.cursor.position(), 1);
}

#[test]
fn counters_are_reported_in_the_output() {
    let (output, _interner) = parse_source("int x = ;\nint y[2];\n");
    assert!(output.error_count >= 1);
    assert_eq!(output.warning_count, 1);
    assert_eq!(
        output.diagnostics.len() as u32,
        output.error_count + output.warning_count
    );
}
