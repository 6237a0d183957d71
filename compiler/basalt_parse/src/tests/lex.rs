//! Minimal lexer for tests.
//!
//! The production pipeline feeds the parser from a separate lexer; tests
//! need the same token shape without that dependency, so this module
//! tokenizes just enough of the language for the suites to read as
//! `parse_source("int x = 1;")`. Doc comments (`///` and `/** */`)
//! attach to the following token.

use basalt_ir::{Name, StringInterner, Token, TokenKind, TokenList};

pub(crate) fn lex(source: &str, interner: &StringInterner) -> TokenList {
    lex_with_offset(source, interner, 0)
}

/// Lex with every token's line shifted by `line_offset`, matching the
/// contract of the mixin re-tokenization collaborator.
pub(crate) fn lex_with_offset(
    source: &str,
    interner: &StringInterner,
    line_offset: u32,
) -> TokenList {
    Lexer {
        bytes: source.as_bytes(),
        source,
        interner,
        pos: 0,
        line: 1 + line_offset,
        column: 1,
        pending_doc: String::new(),
        tokens: Vec::new(),
    }
    .run()
}

struct Lexer<'a> {
    bytes: &'a [u8],
    source: &'a str,
    interner: &'a StringInterner,
    pos: usize,
    line: u32,
    column: u32,
    pending_doc: String,
    tokens: Vec<Token>,
}

impl Lexer<'_> {
    fn run(mut self) -> TokenList {
        if self.source.starts_with("#!") {
            let end = self.line_end();
            self.push_text(TokenKind::ScriptLine, 0, end);
            self.advance_to(end);
        }
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.bump(),
                b'/' if self.peek(1) == Some(b'/') => self.line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.block_comment(),
                b'"' => self.string_literal(),
                b'\'' => self.char_literal(),
                b'q' if self.peek(1) == Some(b'{') => self.token_string(),
                b'0'..=b'9' => self.number(),
                b'_' | b'a'..=b'z' | b'A'..=b'Z' => self.identifier(),
                _ => self.punctuation(),
            }
        }
        TokenList::from_vec(self.tokens)
    }

    fn peek(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn bump(&mut self) {
        if self.bytes[self.pos] == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += 1;
    }

    fn advance_to(&mut self, end: usize) {
        while self.pos < end {
            self.bump();
        }
    }

    fn line_end(&self) -> usize {
        self.source[self.pos..]
            .find('\n')
            .map(|n| self.pos + n)
            .unwrap_or(self.bytes.len())
    }

    fn push(&mut self, kind: TokenKind, text: Name, start: usize, line: u32, column: u32) {
        let mut token = Token::new(
            kind,
            text,
            u32::try_from(start).unwrap_or(u32::MAX),
            line,
            column,
        );
        if !self.pending_doc.is_empty() {
            token.comment = self.interner.intern(&self.pending_doc);
            self.pending_doc.clear();
        }
        self.tokens.push(token);
    }

    fn push_text(&mut self, kind: TokenKind, start: usize, end: usize) {
        let text = self.interner.intern(&self.source[start..end]);
        let (line, column) = (self.line, self.column);
        self.push(kind, text, start, line, column);
    }

    fn line_comment(&mut self) {
        let start = self.pos;
        let end = self.line_end();
        let text = &self.source[start..end];
        if let Some(doc) = text.strip_prefix("///") {
            if !self.pending_doc.is_empty() {
                self.pending_doc.push('\n');
            }
            self.pending_doc.push_str(doc.trim());
        }
        self.advance_to(end);
    }

    fn block_comment(&mut self) {
        let start = self.pos;
        let end = self.source[self.pos + 2..]
            .find("*/")
            .map(|n| self.pos + 2 + n + 2)
            .unwrap_or(self.bytes.len());
        let text = &self.source[start..end];
        if let Some(doc) = text
            .strip_prefix("/**")
            .and_then(|t| t.strip_suffix("*/"))
        {
            let trimmed = doc.trim();
            if !trimmed.is_empty() {
                if !self.pending_doc.is_empty() {
                    self.pending_doc.push('\n');
                }
                self.pending_doc.push_str(trimmed);
            }
        }
        self.advance_to(end);
    }

    fn string_literal(&mut self) {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        self.bump();
        let content_start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'"' {
            if self.bytes[self.pos] == b'\\' {
                self.bump();
            }
            if self.pos < self.bytes.len() {
                self.bump();
            }
        }
        let content_end = self.pos;
        if self.pos < self.bytes.len() {
            self.bump();
        }
        let kind = match self.peek(0) {
            Some(b'w') => {
                self.bump();
                TokenKind::WstringLiteral
            }
            Some(b'd') => {
                self.bump();
                TokenKind::DstringLiteral
            }
            Some(b'c') => {
                self.bump();
                TokenKind::StringLiteral
            }
            _ => TokenKind::StringLiteral,
        };
        let text = self
            .interner
            .intern(&self.source[content_start..content_end]);
        self.push(kind, text, start, line, column);
    }

    fn char_literal(&mut self) {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        self.bump();
        let content_start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\'' {
            if self.bytes[self.pos] == b'\\' {
                self.bump();
            }
            self.bump();
        }
        let content_end = self.pos;
        if self.pos < self.bytes.len() {
            self.bump();
        }
        let text = self
            .interner
            .intern(&self.source[content_start..content_end]);
        self.push(TokenKind::CharLiteral, text, start, line, column);
    }

    /// `q{ ... }` token string; the raw text including delimiters is kept
    /// so the parser can recognize and strip the form.
    fn token_string(&mut self) {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        self.bump();
        self.bump();
        let mut depth = 1usize;
        while self.pos < self.bytes.len() && depth > 0 {
            match self.bytes[self.pos] {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
            self.bump();
        }
        let text = self.interner.intern(&self.source[start..self.pos]);
        self.push(TokenKind::StringLiteral, text, start, line, column);
    }

    fn number(&mut self) {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        while matches!(self.peek(0), Some(b'0'..=b'9' | b'_')) {
            self.bump();
        }
        let mut is_float = false;
        if self.peek(0) == Some(b'.') && matches!(self.peek(1), Some(b'0'..=b'9')) {
            is_float = true;
            self.bump();
            while matches!(self.peek(0), Some(b'0'..=b'9' | b'_')) {
                self.bump();
            }
        }
        if matches!(self.peek(0), Some(b'e' | b'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(0), Some(b'+' | b'-')) {
                self.bump();
            }
            while matches!(self.peek(0), Some(b'0'..=b'9')) {
                self.bump();
            }
        }
        let text_end = self.pos;
        let kind = if is_float {
            let base = match self.peek(0) {
                Some(b'f' | b'F') => {
                    self.bump();
                    TokenKind::FloatLiteral
                }
                Some(b'L') => {
                    self.bump();
                    TokenKind::RealLiteral
                }
                _ => TokenKind::DoubleLiteral,
            };
            if self.peek(0) == Some(b'i') {
                self.bump();
                match base {
                    TokenKind::FloatLiteral => TokenKind::IfloatLiteral,
                    TokenKind::RealLiteral => TokenKind::IrealLiteral,
                    _ => TokenKind::IdoubleLiteral,
                }
            } else {
                base
            }
        } else {
            let mut unsigned = false;
            let mut long = false;
            loop {
                match self.peek(0) {
                    Some(b'u' | b'U') if !unsigned => {
                        unsigned = true;
                        self.bump();
                    }
                    Some(b'L') if !long => {
                        long = true;
                        self.bump();
                    }
                    _ => break,
                }
            }
            match (unsigned, long) {
                (true, true) => TokenKind::UlongLiteral,
                (true, false) => TokenKind::UintLiteral,
                (false, true) => TokenKind::LongLiteral,
                (false, false) => TokenKind::IntLiteral,
            }
        };
        let text = self.interner.intern(&self.source[start..text_end]);
        self.push(kind, text, start, line, column);
    }

    fn identifier(&mut self) {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        while matches!(
            self.peek(0),
            Some(b'_' | b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9')
        ) {
            self.bump();
        }
        let text = &self.source[start..self.pos];
        match TokenKind::keyword(text) {
            Some(kind) => self.push(kind, Name::EMPTY, start, line, column),
            None => {
                let name = self.interner.intern(text);
                self.push(TokenKind::Identifier, name, start, line, column);
            }
        }
    }

    fn punctuation(&mut self) {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let rest = &self.source[self.pos..];
        let (kind, len) = match_punct(rest).unwrap_or_else(|| {
            panic!(
                "test lexer: unrecognized input at {}:{}: {:?}",
                line,
                column,
                &rest[..rest.len().min(4)]
            )
        });
        for _ in 0..len {
            self.bump();
        }
        self.push(kind, Name::EMPTY, start, line, column);
    }
}

fn match_punct(rest: &str) -> Option<(TokenKind, usize)> {
    use TokenKind::*;
    const TABLE: &[(&str, TokenKind)] = &[
        (">>>=", UnsignedShiftRightEq),
        ("!<>=", BangLessGreaterEq),
        (">>>", UnsignedShiftRight),
        (">>=", ShiftRightEq),
        ("<<=", ShiftLeftEq),
        ("^^=", CaretCaretEq),
        ("!<>", BangLessGreater),
        ("<>=", LessGreaterEq),
        ("!<=", BangLessEq),
        ("!>=", BangGreaterEq),
        ("...", Ellipsis),
        ("==", EqEq),
        ("=>", GoesTo),
        ("!=", BangEq),
        ("<=", LessEq),
        (">=", GreaterEq),
        ("<<", ShiftLeft),
        (">>", ShiftRight),
        ("<>", LessGreater),
        ("!<", BangLess),
        ("!>", BangGreater),
        ("&&", AmpAmp),
        ("||", PipePipe),
        ("++", PlusPlus),
        ("--", MinusMinus),
        ("+=", PlusEq),
        ("-=", MinusEq),
        ("*=", StarEq),
        ("/=", SlashEq),
        ("%=", PercentEq),
        ("&=", AmpEq),
        ("|=", PipeEq),
        ("^=", CaretEq),
        ("^^", CaretCaret),
        ("~=", TildeEq),
        ("..", DotDot),
        (",", Comma),
        (";", Semicolon),
        (":", Colon),
        (".", Dot),
        ("(", LParen),
        (")", RParen),
        ("[", LBracket),
        ("]", RBracket),
        ("{", LBrace),
        ("}", RBrace),
        ("=", Assign),
        ("!", Bang),
        ("<", Less),
        (">", Greater),
        ("+", Plus),
        ("-", Minus),
        ("*", Star),
        ("/", Slash),
        ("%", Percent),
        ("&", Amp),
        ("|", Pipe),
        ("^", Caret),
        ("~", Tilde),
        ("$", Dollar),
        ("@", At),
        ("?", Question),
    ];
    TABLE
        .iter()
        .find(|(pat, _)| rest.starts_with(pat))
        .map(|&(pat, kind)| (kind, pat.len()))
}

#[cfg(test)]
mod sanity {
    use super::*;

    #[test]
    fn keywords_and_idents() {
        let interner = StringInterner::new();
        let tokens = lex("module foo;", &interner);
        assert_eq!(tokens[0].kind, TokenKind::Module);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(interner.lookup(tokens[1].text), "foo");
        assert_eq!(tokens[2].kind, TokenKind::Semicolon);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn maximal_munch() {
        let interner = StringInterner::new();
        let tokens = lex("a >>>= b >>> c >> d > e", &interner);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::UnsignedShiftRightEq,
                TokenKind::Identifier,
                TokenKind::UnsignedShiftRight,
                TokenKind::Identifier,
                TokenKind::ShiftRight,
                TokenKind::Identifier,
                TokenKind::Greater,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn doc_comment_attaches_to_next_token() {
        let interner = StringInterner::new();
        let tokens = lex("/// docs here\nint x;", &interner);
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(interner.lookup(tokens[0].comment), "docs here");
        assert_eq!(tokens[1].comment, Name::EMPTY);
    }

    #[test]
    fn number_suffixes() {
        let interner = StringInterner::new();
        let tokens = lex("1 2u 3L 4uL 1.5 1.5f 2.5L 3.5i", &interner);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds[..8],
            [
                TokenKind::IntLiteral,
                TokenKind::UintLiteral,
                TokenKind::LongLiteral,
                TokenKind::UlongLiteral,
                TokenKind::DoubleLiteral,
                TokenKind::FloatLiteral,
                TokenKind::RealLiteral,
                TokenKind::IdoubleLiteral,
            ]
        );
    }

    #[test]
    fn token_string_keeps_delimiters() {
        let interner = StringInterner::new();
        let tokens = lex("mixin(q{int x;});", &interner);
        let lit = tokens
            .iter()
            .find(|t| t.kind == TokenKind::StringLiteral)
            .expect("token string");
        assert_eq!(interner.lookup(lit.text), "q{int x;}");
    }

    #[test]
    fn lines_and_columns_are_one_based() {
        let interner = StringInterner::new();
        let tokens = lex("a\n  b", &interner);
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }
}
