//! Classifier predicates: bounded-lookahead grammar oracles.
//!
//! These answer questions that cannot be decided from one token. None of
//! them moves the cursor observably; ambiguous cases run a speculative
//! parse under a bookmark and rewind.

use basalt_ir::TokenKind;
use tracing::trace;

use crate::{ParseFailed, Parser};

/// Tokens that unambiguously begin a statement, never a declaration.
const STATEMENT_STARTERS: &[TokenKind] = &[
    TokenKind::Asm,
    TokenKind::Assert,
    TokenKind::Break,
    TokenKind::Case,
    TokenKind::Continue,
    TokenKind::Default,
    TokenKind::Do,
    TokenKind::For,
    TokenKind::Foreach,
    TokenKind::ForeachReverse,
    TokenKind::Goto,
    TokenKind::If,
    TokenKind::Return,
    TokenKind::Switch,
    TokenKind::Throw,
    TokenKind::Try,
    TokenKind::While,
    TokenKind::With,
    TokenKind::LBrace,
];

impl Parser<'_> {
    /// True iff the current token begins an attribute: storage class,
    /// protection, linkage, `@x(...)`, pragma, alignment, or deprecation.
    ///
    /// `shared`, `const`, `immutable`, `inout`, and `scope` count only
    /// when not immediately followed by `(` (that form is a type
    /// constructor or scope guard). `pragma` counts only when its
    /// parenthesized form is not followed by `;`. `static` does not
    /// count before `assert`, `this`, `if`, or `~`, nor does `shared`
    /// before `static this` / `static ~this`.
    pub(crate) fn is_attribute(&self) -> bool {
        use TokenKind::*;
        let kind = self.cursor.current_kind();
        match kind {
            Const | Immutable | Inout | Scope => !self.cursor.peek_is(LParen),
            Shared => {
                if self.cursor.peek_is(LParen) {
                    return false;
                }
                // `shared static this` / `shared static ~this`
                !(self.cursor.peek_is(Static)
                    && matches!(self.cursor.peek_kind(2), This | Tilde))
            }
            Static => !matches!(self.cursor.peek_kind(1), Assert | This | If | Tilde),
            Pragma => {
                // Attribute form prefixes a declaration; the declaration
                // form `pragma(...);` ends the construct itself.
                if !self.cursor.peek_is(LParen) {
                    return false;
                }
                let mut depth = 0usize;
                let mut n = 1usize;
                loop {
                    match self.cursor.peek_kind(n) {
                        LParen => depth += 1,
                        RParen => {
                            depth -= 1;
                            if depth == 0 {
                                return self.cursor.peek_kind(n + 1) != Semicolon;
                            }
                        }
                        Eof => return false,
                        _ => {}
                    }
                    n += 1;
                }
            }
            At | Align | Deprecated | Extern | Final | Override | Synchronized | Abstract
            | Auto | Gshared | Pure | Nothrow | Ref => true,
            kind if kind.is_protection() => true,
            _ => false,
        }
    }

    /// Subset of `is_attribute` restricted to storage-class tokens.
    pub(crate) fn is_storage_class(&self) -> bool {
        use TokenKind::*;
        matches!(
            self.cursor.current_kind(),
            Abstract
                | Auto
                | Const
                | Deprecated
                | Extern
                | Final
                | Gshared
                | Immutable
                | Inout
                | Lazy
                | Nothrow
                | Override
                | Pure
                | Ref
                | Scope
                | Shared
                | Static
                | Synchronized
        ) && self.is_attribute()
    }

    /// True iff the tokens from the current position form one of the
    /// qualifier sequences admitted inside `cast(...)`:
    /// `const`, `const shared`, `immutable`, `inout`, `inout shared`,
    /// `shared`, `shared const`, `shared inout` — each before `)`.
    pub(crate) fn is_cast_qualifier(&self) -> bool {
        use TokenKind::*;
        match self.cursor.current_kind() {
            Const => {
                self.cursor.peek_is(RParen)
                    || (self.cursor.peek_is(Shared) && self.cursor.peek_kind(2) == RParen)
            }
            Immutable => self.cursor.peek_is(RParen),
            Inout => {
                self.cursor.peek_is(RParen)
                    || (self.cursor.peek_is(Shared) && self.cursor.peek_kind(2) == RParen)
            }
            Shared => {
                self.cursor.peek_is(RParen)
                    || (matches!(self.cursor.peek_kind(1), Const | Inout)
                        && self.cursor.peek_kind(2) == RParen)
            }
            _ => false,
        }
    }

    /// True iff the `[` at the current position opens an associative
    /// array literal (first element followed by `:`). Memoized by the
    /// start token's byte index, since the expression statement path and
    /// the primary-expression path both consult it.
    pub(crate) fn is_associative_array_literal(&mut self) -> bool {
        debug_assert!(self.cursor.current_is(TokenKind::LBracket));
        let key = self.cursor.current().index;
        if let Some(&cached) = self.aa_memo.get(&key) {
            return cached;
        }
        let verdict = self.look_ahead(|p| {
            p.cursor.advance();
            if p.cursor.current_is(TokenKind::RBracket) {
                return false;
            }
            p.parse_assign_expr().is_ok() && p.cursor.current_is(TokenKind::Colon)
        });
        self.aa_memo.insert(key, verdict);
        trace!(byte = key, verdict, "aa-literal oracle");
        verdict
    }

    /// The pivotal oracle: does a declaration start here?
    ///
    /// Fast paths cover tokens that can only start a declaration or only
    /// a statement; everything else runs a full speculative
    /// `parse_declaration` and reports whether it succeeded.
    pub(crate) fn is_declaration(&mut self) -> bool {
        use TokenKind::*;
        let kind = self.cursor.current_kind();
        match kind {
            Alias | Class | Enum | Import | Interface | Invariant | Struct | Template | Union
            | Unittest | At => true,
            // `this(` starts a constructor; `this.x` is an expression.
            This => self.cursor.peek_is(LParen),
            Tilde => self.cursor.peek_is(This),
            Final => !self.cursor.peek_is(Switch),
            Synchronized => !self.cursor.peek_is(LParen),
            Scope => !self.cursor.peek_is(LParen),
            Debug | Version => {
                // `debug = x;` / `version = x;` are specifications;
                // the parenthesized forms are conditionals either way.
                self.cursor.peek_is(Assign)
            }
            Static => {
                if matches!(
                    self.cursor.peek_kind(1),
                    If | Foreach | ForeachReverse
                ) {
                    false
                } else {
                    self.speculative_declaration()
                }
            }
            Mixin => {
                // `mixin(...)` may be an expression statement; the other
                // mixin forms are declarations.
                !self.cursor.peek_is(LParen) || self.speculative_declaration()
            }
            kind if kind.is_basic_type() => {
                // A builtin type followed by `.` or `(` is an expression
                // (`int.max`, `int(3)`).
                !matches!(self.cursor.peek_kind(1), Dot | LParen)
            }
            kind if STATEMENT_STARTERS.contains(&kind) => false,
            _ if self.is_attribute() => true,
            _ => self.speculative_declaration(),
        }
    }

    fn speculative_declaration(&mut self) -> bool {
        let verdict = self.look_ahead(|p| p.parse_declaration().is_ok());
        trace!(pos = self.cursor.position(), verdict, "decl oracle");
        verdict
    }

    /// Only valid while parsing template parameters: speculatively parse
    /// a type and require it to be followed by `,`, `)`, or `=`.
    pub(crate) fn is_type(&mut self) -> bool {
        self.look_ahead(|p| {
            if p.parse_type().is_err() {
                return false;
            }
            matches!(
                p.cursor.current_kind(),
                TokenKind::Comma | TokenKind::RParen | TokenKind::Assign
            )
        })
    }

    /// Shared fail-fast check for recursive productions: trips once the
    /// suppressed-error cap is exceeded during speculation.
    pub(crate) fn check_speculation_fuse(&mut self) -> Result<(), ParseFailed> {
        if self.speculation_overflowed() {
            return Err(ParseFailed);
        }
        Ok(())
    }
}
