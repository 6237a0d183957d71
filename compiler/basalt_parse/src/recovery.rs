//! Error recovery for the parser.
//!
//! Token sets with O(1) membership plus synchronization sweeps for
//! continuing after an error.

use basalt_ir::TokenKind;

use crate::cursor::Cursor;

const WORDS: usize = (TokenKind::COUNT + 63) / 64;

/// A set of token kinds as a bitset over discriminant indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenSet([u64; WORDS]);

impl TokenSet {
    #[inline]
    pub const fn new() -> Self {
        Self([0; WORDS])
    }

    /// Add a token kind (builder pattern, usable in const contexts).
    #[inline]
    #[must_use]
    pub const fn with(self, kind: TokenKind) -> Self {
        let mut words = self.0;
        let idx = kind.index() as usize;
        words[idx / 64] |= 1u64 << (idx % 64);
        Self(words)
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        let mut words = self.0;
        let mut i = 0;
        while i < WORDS {
            words[i] |= other.0[i];
            i += 1;
        }
        Self(words)
    }

    #[inline]
    pub const fn contains(&self, kind: TokenKind) -> bool {
        let idx = kind.index() as usize;
        (self.0[idx / 64] & (1u64 << (idx % 64))) != 0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        let mut i = 0;
        while i < WORDS {
            if self.0[i] != 0 {
                return false;
            }
            i += 1;
        }
        true
    }

    #[inline]
    pub const fn count(&self) -> u32 {
        let mut total = 0;
        let mut i = 0;
        while i < WORDS {
            total += self.0[i].count_ones();
            i += 1;
        }
        total
    }
}

impl Default for TokenSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Recovery anchors: tokens at which `expect` holds position after a
/// diagnostic instead of advancing.
pub const RECOVERY_ANCHORS: TokenSet = TokenSet::new()
    .with(TokenKind::Semicolon)
    .with(TokenKind::RParen)
    .with(TokenKind::RBracket)
    .with(TokenKind::RBrace)
    .with(TokenKind::Eof);

/// Recovery set for top-level and aggregate-body declaration boundaries.
pub const DECL_BOUNDARY: TokenSet = TokenSet::new()
    .with(TokenKind::Semicolon)
    .with(TokenKind::RBrace)
    .with(TokenKind::Module)
    .with(TokenKind::Import)
    .with(TokenKind::Class)
    .with(TokenKind::Struct)
    .with(TokenKind::Union)
    .with(TokenKind::Interface)
    .with(TokenKind::Enum)
    .with(TokenKind::Template)
    .with(TokenKind::Unittest)
    .with(TokenKind::Eof);

/// Recovery set inside statement lists.
pub const STMT_BOUNDARY: TokenSet = TokenSet::new()
    .with(TokenKind::Semicolon)
    .with(TokenKind::RBrace)
    .with(TokenKind::Case)
    .with(TokenKind::Default)
    .with(TokenKind::Eof);

/// Advance the cursor until reaching a token in `recovery` or `Eof`.
///
/// Returns `true` if a recovery token was found before the end.
pub fn synchronize(cursor: &mut Cursor<'_>, recovery: TokenSet) -> bool {
    while !cursor.is_at_end() {
        if recovery.contains(cursor.current_kind()) {
            return true;
        }
        cursor.advance();
    }
    false
}
