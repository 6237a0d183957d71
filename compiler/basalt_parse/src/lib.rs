//! Recoverable recursive descent parser for Basalt.
//!
//! Consumes a pre-lexed `TokenList` and produces a concrete AST in a
//! `NodeArena`. Errors never abort the parse: diagnostics stream to the
//! `DiagnosticSink` and recovery resumes at the next safe boundary, so a
//! file with errors still yields a partial tree.
//!
//! Grammar ambiguities (declaration vs. expression, template instance
//! vs. comparison, `(type).member` vs. parenthesized expression) are
//! resolved by speculative parsing under nested bookmarks; diagnostics
//! raised while speculating are counted but never published.

mod classify;
pub mod cursor;
mod grammar;
pub mod recovery;

#[cfg(test)]
mod tests;

pub use recovery::{synchronize, TokenSet, DECL_BOUNDARY, RECOVERY_ANCHORS, STMT_BOUNDARY};

use rustc_hash::FxHashMap;

use basalt_diagnostic::{Diagnostic, DiagnosticSink, ErrorCode, MessageCallback};
use basalt_ir::{
    ArenaMark, Attribute, Decl, DeclKind, Loc, Module, Name, NodeArena, StringInterner, Token,
    TokenKind, TokenList,
};

use cursor::Cursor;

/// Marker for a parse function that failed after reporting (or, under
/// suppression, counting) its diagnostic.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ParseFailed;

pub type ParseResult<T> = Result<T, ParseFailed>;

/// Collaborator able to tokenize a byte buffer, used to re-parse the
/// contents of token-string literals fed to string mixins.
///
/// The returned list must live at least as long as the source itself;
/// implementations typically arena-allocate per call.
pub trait TokenSource {
    fn tokenize(&self, text: &str, line_offset: u32) -> &TokenList;
}

/// Optional knobs for a parse. The defaults match IDE usage: function
/// bodies dropped after matching, no mixin re-tokenization.
#[derive(Default)]
pub struct ParseConfig<'a> {
    /// Callback invoked for every published diagnostic:
    /// `(file_name, line, column, message, is_error)`.
    pub on_message: Option<MessageCallback<'a>>,
    /// Keep function-body statement trees instead of recording only that
    /// a body was present.
    pub retain_bodies: bool,
    /// Tokenizer for `q{ ... }` string-mixin re-parsing.
    pub token_source: Option<&'a dyn TokenSource>,
}

/// Everything produced by one parse: the tree, its arena, and the
/// diagnostic totals. `error_count > 0` signals an incomplete tree that
/// is still safe to walk.
pub struct ParseOutput {
    pub module: Module,
    pub arena: NodeArena,
    pub diagnostics: Vec<Diagnostic>,
    pub error_count: u32,
    pub warning_count: u32,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

/// Parse a token stream into a `Module`.
///
/// `file_name` is used verbatim in diagnostics. The interner must be the
/// one the tokens' `Name`s were produced with.
pub fn parse_module(
    tokens: &TokenList,
    file_name: &str,
    interner: &StringInterner,
    config: ParseConfig<'_>,
) -> ParseOutput {
    let sink = DiagnosticSink::new(file_name, config.on_message);
    let mut parser = Parser {
        cursor: Cursor::new(tokens),
        arena: NodeArena::new(),
        sink,
        interner,
        retain_bodies: config.retain_bodies,
        token_source: config.token_source,
        pending_comment: Name::EMPTY,
        supplemental: Name::EMPTY,
        aa_memo: FxHashMap::default(),
    };
    let module = parser.parse_module_root();
    let error_count = parser.sink.error_count();
    let warning_count = parser.sink.warning_count();
    ParseOutput {
        module,
        arena: parser.arena,
        diagnostics: parser.sink.into_published(),
        error_count,
        warning_count,
    }
}

/// Opaque speculative-parsing handle.
///
/// Captures cursor position, arena mark, and the pending doc comment;
/// setting one opens a diagnostic suppression scope. Bookmarks nest and
/// must be resolved in LIFO order by exactly one of `go_to_bookmark`
/// (rewind) or `abandon_bookmark` (commit).
pub(crate) struct Bookmark {
    pos: usize,
    mark: ArenaMark,
    pending_comment: Name,
}

/// Parser state for one module.
pub(crate) struct Parser<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) arena: NodeArena,
    pub(crate) sink: DiagnosticSink<'a>,
    pub(crate) interner: &'a StringInterner,
    pub(crate) retain_bodies: bool,
    pub(crate) token_source: Option<&'a dyn TokenSource>,
    /// Doc comment awaiting its first claimant; cleared on consumption
    /// so no comment string is attached twice.
    pub(crate) pending_comment: Name,
    /// Comment of the enclosing conditional-compilation construct,
    /// copied onto declarations produced in its true branch.
    pub(crate) supplemental: Name,
    /// Memo for the associative-array-literal oracle, keyed by the `[`
    /// token's byte index.
    pub(crate) aa_memo: FxHashMap<u32, bool>,
}

impl<'a> Parser<'a> {
    // --- Bookmarks ---

    pub(crate) fn set_bookmark(&mut self) -> Bookmark {
        self.sink.push_suppress();
        Bookmark {
            pos: self.cursor.position(),
            mark: self.arena.mark(),
            pending_comment: self.pending_comment,
        }
    }

    /// Rewind to the bookmark: cursor, arena, and pending comment are
    /// restored exactly; the suppression scope closes.
    pub(crate) fn go_to_bookmark(&mut self, bookmark: Bookmark) {
        self.sink.pop_suppress();
        self.cursor.set_position(bookmark.pos);
        self.arena.reset_to(bookmark.mark);
        self.pending_comment = bookmark.pending_comment;
    }

    /// Keep the advanced position and everything allocated; the
    /// suppression scope closes.
    pub(crate) fn abandon_bookmark(&mut self, bookmark: Bookmark) {
        self.sink.pop_suppress();
        let _ = bookmark;
    }

    /// Run `f` speculatively; on `Ok` commit and return the value, on
    /// `Err` rewind and return `None`.
    pub(crate) fn try_parse<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> Option<T> {
        let bookmark = self.set_bookmark();
        match f(self) {
            Ok(value) => {
                self.abandon_bookmark(bookmark);
                Some(value)
            }
            Err(ParseFailed) => {
                self.go_to_bookmark(bookmark);
                None
            }
        }
    }

    /// Run `f` and rewind unconditionally, returning its result. Used by
    /// the classifier predicates, which must not move the cursor.
    pub(crate) fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let bookmark = self.set_bookmark();
        let result = f(self);
        self.go_to_bookmark(bookmark);
        result
    }

    /// Speculation fuse: true once the suppressed-error cap is exceeded
    /// while inside a bookmark. Recursive productions fail fast on it.
    pub(crate) fn speculation_overflowed(&self) -> bool {
        self.sink.is_suppressed() && self.sink.at_error_cap()
    }

    // --- Diagnostics ---

    pub(crate) fn loc(&self) -> Loc {
        let token = self.cursor.current();
        Loc::new(
            token.line,
            token.column,
            u32::try_from(self.cursor.position()).unwrap_or(u32::MAX),
        )
    }

    /// Report an error at the current token and return the failure
    /// marker. Does not advance.
    #[cold]
    pub(crate) fn error(&mut self, code: ErrorCode, message: impl Into<String>) -> ParseFailed {
        let token = self.cursor.current();
        self.sink
            .report(Diagnostic::error(code, message, token.line, token.column));
        ParseFailed
    }

    pub(crate) fn warn_at(&mut self, code: ErrorCode, message: impl Into<String>, token: &Token) {
        self.sink
            .report(Diagnostic::warning(code, message, token.line, token.column));
    }

    /// If the current token is `kind`, advance and return it. Otherwise
    /// report a diagnostic and, unless positioned on a recovery anchor,
    /// advance one token to avoid loops.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<&'a Token> {
        if self.cursor.current_is(kind) {
            return Ok(self.cursor.advance());
        }
        self.expect_failed(kind);
        Err(ParseFailed)
    }

    #[cold]
    fn expect_failed(&mut self, kind: TokenKind) {
        let current = self.cursor.current_kind();
        self.error(
            ErrorCode::E1001,
            format!(
                "expected {}, found {}",
                kind.display_name(),
                current.display_name()
            ),
        );
        if !RECOVERY_ANCHORS.contains(current) {
            self.cursor.advance();
        }
    }

    /// Expect an identifier, returning its interned text.
    pub(crate) fn expect_ident(&mut self) -> ParseResult<Name> {
        if self.cursor.current_is(TokenKind::Identifier) {
            return Ok(self.cursor.advance().text);
        }
        self.expect_failed(TokenKind::Identifier);
        Err(ParseFailed)
    }

    pub(crate) fn text(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    // --- Doc comments ---

    /// Capture the current token's doc comment into the pending slot,
    /// unless a comment is already pending.
    pub(crate) fn capture_comment(&mut self) {
        if !self.pending_comment.is_some() {
            self.pending_comment = self.cursor.current().comment;
        }
    }

    /// Consume the pending comment; the slot is cleared so the same
    /// string cannot be claimed twice.
    pub(crate) fn take_comment(&mut self) -> Name {
        std::mem::take(&mut self.pending_comment)
    }

    /// Allocate a declaration node with its claimed comment and the
    /// active supplemental comment.
    pub(crate) fn finish_decl(
        &mut self,
        kind: DeclKind,
        loc: Loc,
        attrs: Vec<Attribute>,
        comment: Name,
    ) -> basalt_ir::DeclId {
        let supplemental_comment = self.supplemental;
        self.arena.alloc(Decl {
            kind,
            loc,
            attrs: attrs.into_boxed_slice(),
            comment,
            supplemental_comment,
        })
    }
}
