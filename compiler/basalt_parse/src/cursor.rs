//! Token cursor for navigating the token stream.
//!
//! Low-level access, lookahead, and bracket-balanced skips. The cursor
//! never reports diagnostics; `expect` lives on the parser, which owns
//! the sink.

use basalt_ir::{Token, TokenKind, TokenList};

/// Cursor over an immutable token stream.
///
/// Position is always within bounds: the list ends with an `Eof` token
/// and grammar rules check the current kind before advancing.
pub struct Cursor<'a> {
    tokens: &'a TokenList,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a TokenList) -> Self {
        Cursor { tokens, pos: 0 }
    }

    /// Current position in the token stream.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Set the position directly. Used by bookmark restore.
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(pos < self.tokens.len(), "cursor position out of bounds");
        self.pos = pos;
    }

    #[inline]
    pub fn current(&self) -> &'a Token {
        &self.tokens[self.pos]
    }

    #[inline]
    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Token `n` positions ahead, clamped to the `Eof` terminator.
    #[inline]
    pub fn peek(&self, n: usize) -> &'a Token {
        self.tokens.at_or_eof(self.pos + n)
    }

    #[inline]
    pub fn peek_kind(&self, n: usize) -> TokenKind {
        self.peek(n).kind
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    #[inline]
    pub fn current_is(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    #[inline]
    pub fn current_is_one_of(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current_kind())
    }

    #[inline]
    pub fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek_kind(1) == kind
    }

    #[inline]
    pub fn peek_is_one_of(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek_kind(1))
    }

    /// True when the stream continues with exactly `kinds` from the
    /// current position.
    pub fn starts_with(&self, kinds: &[TokenKind]) -> bool {
        kinds
            .iter()
            .enumerate()
            .all(|(i, &kind)| self.peek_kind(i) == kind)
    }

    /// Advance one token, returning the token that was current.
    ///
    /// The terminator invariant means this can never move past the end:
    /// callers check the current kind first and `Eof` is never consumed.
    #[inline]
    pub fn advance(&mut self) -> &'a Token {
        let current = self.pos;
        debug_assert!(
            current + 1 < self.tokens.len() || self.tokens[current].kind == TokenKind::Eof,
            "advance past end of token stream"
        );
        if self.tokens[current].kind != TokenKind::Eof {
            self.pos += 1;
        }
        &self.tokens[current]
    }

    /// Advance past a balanced `{ ... }` region starting at the current
    /// `{`. Stops after the matching `}`, or at `Eof` when unbalanced.
    pub fn skip_braces(&mut self) {
        self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
    }

    /// Advance past a balanced `( ... )` region.
    pub fn skip_parens(&mut self) {
        self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
    }

    /// Advance past a balanced `[ ... ]` region.
    pub fn skip_brackets(&mut self) {
        self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket);
    }

    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) {
        debug_assert!(self.current_is(open), "skip must start at the opener");
        let mut depth = 0usize;
        while !self.is_at_end() {
            let kind = self.current_kind();
            self.advance();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Token immediately following the balanced `{ ... }` region starting
    /// at the current token, without moving the cursor. `None` when the
    /// current token is not `{` or the region is unbalanced.
    pub fn peek_past_braces(&self) -> Option<&'a Token> {
        self.peek_past_balanced(TokenKind::LBrace, TokenKind::RBrace)
    }

    pub fn peek_past_parens(&self) -> Option<&'a Token> {
        self.peek_past_balanced(TokenKind::LParen, TokenKind::RParen)
    }

    pub fn peek_past_brackets(&self) -> Option<&'a Token> {
        self.peek_past_balanced(TokenKind::LBracket, TokenKind::RBracket)
    }

    fn peek_past_balanced(&self, open: TokenKind, close: TokenKind) -> Option<&'a Token> {
        if !self.current_is(open) {
            return None;
        }
        let mut depth = 0usize;
        let mut idx = self.pos;
        loop {
            let token = self.tokens.at_or_eof(idx);
            match token.kind {
                TokenKind::Eof => return None,
                kind if kind == open => depth += 1,
                kind if kind == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(self.tokens.at_or_eof(idx + 1));
                    }
                }
                _ => {}
            }
            idx += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_ir::Token;

    fn toks(kinds: &[TokenKind]) -> TokenList {
        kinds.iter().map(|&k| Token::dummy(k)).collect()
    }

    #[test]
    fn navigation_and_peeks() {
        use TokenKind::*;
        let list = toks(&[Module, Identifier, Semicolon]);
        let mut cursor = Cursor::new(&list);
        assert!(cursor.current_is(Module));
        assert!(cursor.peek_is(Identifier));
        assert!(cursor.starts_with(&[Module, Identifier, Semicolon]));
        cursor.advance();
        cursor.advance();
        cursor.advance();
        assert!(cursor.is_at_end());
        // Advancing at Eof holds position.
        cursor.advance();
        assert!(cursor.is_at_end());
    }

    #[test]
    fn skip_parens_counts_nesting() {
        use TokenKind::*;
        let list = toks(&[LParen, LParen, Identifier, RParen, RParen, Semicolon]);
        let mut cursor = Cursor::new(&list);
        cursor.skip_parens();
        assert!(cursor.current_is(Semicolon));
    }

    #[test]
    fn peek_past_braces_does_not_move() {
        use TokenKind::*;
        let list = toks(&[LBrace, Identifier, LBrace, RBrace, RBrace, Return]);
        let cursor = Cursor::new(&list);
        let after = cursor.peek_past_braces().map(|t| t.kind);
        assert_eq!(after, Some(Return));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn peek_past_unbalanced_is_none() {
        use TokenKind::*;
        let list = toks(&[LBracket, Identifier]);
        let cursor = Cursor::new(&list);
        assert!(cursor.peek_past_brackets().is_none());
        assert!(Cursor::new(&toks(&[Identifier])).peek_past_parens().is_none());
    }
}
