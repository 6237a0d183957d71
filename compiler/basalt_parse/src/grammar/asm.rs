//! Inline assembly parsing.
//!
//! The asm grammar has its own operator-precedence cascade and its own
//! addressing-mode forms. Register names are recognized by binary search
//! over a sorted table.

use basalt_diagnostic::ErrorCode;
use basalt_ir::{
    AsmBlock, AsmExpr, AsmExprId, AsmExprKind, AsmInstr, AsmInstrKind, AsmTypePrefix, BinOp, Loc,
    Name, PrefixOp, StmtId, StmtKind, TokenKind,
};

use crate::{ParseResult, Parser};

/// x86 register names, sorted for binary search.
const REGISTERS: &[&str] = &[
    "AH", "AL", "AX", "BH", "BL", "BP", "BPL", "BX", "CH", "CL", "CR0", "CR2", "CR3", "CR4",
    "CS", "CX", "DH", "DI", "DIL", "DL", "DR0", "DR1", "DR2", "DR3", "DR6", "DR7", "DS", "DX",
    "EAX", "EBP", "EBX", "ECX", "EDI", "EDX", "ES", "ESI", "ESP", "FS", "GS", "MM0", "MM1",
    "MM2", "MM3", "MM4", "MM5", "MM6", "MM7", "R10", "R10B", "R10D", "R10W", "R11", "R11B",
    "R11D", "R11W", "R12", "R12B", "R12D", "R12W", "R13", "R13B", "R13D", "R13W", "R14", "R14B",
    "R14D", "R14W", "R15", "R15B", "R15D", "R15W", "R8", "R8B", "R8D", "R8W", "R9", "R9B",
    "R9D", "R9W", "RAX", "RBP", "RBX", "RCX", "RDI", "RDX", "RSI", "RSP", "SI", "SIL", "SP",
    "SPL", "SS", "ST", "TR3", "TR4", "TR5", "TR6", "TR7", "XMM0", "XMM1", "XMM10", "XMM11",
    "XMM12", "XMM13", "XMM14", "XMM15", "XMM2", "XMM3", "XMM4", "XMM5", "XMM6", "XMM7", "XMM8",
    "XMM9", "YMM0", "YMM1", "YMM10", "YMM11", "YMM12", "YMM13", "YMM14", "YMM15", "YMM2",
    "YMM3", "YMM4", "YMM5", "YMM6", "YMM7", "YMM8", "YMM9",
];

fn is_register(text: &str) -> bool {
    REGISTERS.binary_search(&text).is_ok()
}

impl Parser<'_> {
    fn alloc_asm(&mut self, kind: AsmExprKind, loc: Loc) -> AsmExprId {
        self.arena.alloc(AsmExpr { kind, loc })
    }

    /// `asm FunctionAttribute* { Instruction* }`
    pub(crate) fn parse_asm_statement(&mut self) -> ParseResult<StmtId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(Asm)?;
        let attrs = self.parse_member_function_attrs()?;
        self.expect(LBrace)?;
        let mut instructions = Vec::new();
        while !self.cursor.current_is(RBrace) && !self.cursor.is_at_end() {
            let instr = self.parse_asm_instruction()?;
            instructions.push(instr);
            if self.cursor.current_is(Semicolon) {
                self.cursor.advance();
            }
        }
        self.expect(RBrace)?;
        Ok(self.alloc_stmt(
            StmtKind::Asm(Box::new(AsmBlock {
                attrs,
                instructions: instructions.into_boxed_slice(),
            })),
            loc,
        ))
    }

    fn parse_asm_instruction(&mut self) -> ParseResult<AsmInstr> {
        use TokenKind::*;
        let loc = self.loc();
        if self.cursor.current_is(Semicolon) {
            return Ok(AsmInstr {
                label: Name::EMPTY,
                kind: AsmInstrKind::Empty,
                loc,
            });
        }
        if self.cursor.current_is(Align) {
            self.cursor.advance();
            let value = self.parse_asm_primary()?;
            return Ok(AsmInstr {
                label: Name::EMPTY,
                kind: AsmInstrKind::Align { value },
                loc,
            });
        }
        // `label : instruction`
        if self.cursor.current_is(Identifier) && self.cursor.peek_is(Colon) {
            let label = self.cursor.advance().text;
            self.cursor.advance();
            let inner = self.parse_asm_instruction()?;
            return Ok(AsmInstr {
                label,
                kind: inner.kind,
                loc,
            });
        }
        let opcode = self.expect_ident()?;
        if matches!(self.cursor.current_kind(), Semicolon | RBrace) {
            return Ok(AsmInstr {
                label: Name::EMPTY,
                kind: AsmInstrKind::Bare { opcode },
                loc,
            });
        }
        let mut operands = vec![self.parse_asm_expr()?];
        while self.cursor.current_is(Comma) {
            self.cursor.advance();
            operands.push(self.parse_asm_expr()?);
        }
        Ok(AsmInstr {
            label: Name::EMPTY,
            kind: AsmInstrKind::Op {
                opcode,
                operands: operands.into_boxed_slice(),
            },
            loc,
        })
    }

    fn asm_chain(
        &mut self,
        next: fn(&mut Self) -> ParseResult<AsmExprId>,
        match_op: fn(TokenKind) -> Option<BinOp>,
    ) -> ParseResult<AsmExprId> {
        let loc = self.loc();
        let mut lhs = next(self)?;
        while let Some(op) = match_op(self.cursor.current_kind()) {
            self.cursor.advance();
            let rhs = next(self)?;
            lhs = self.alloc_asm(AsmExprKind::Binary { op, lhs, rhs }, loc);
        }
        Ok(lhs)
    }

    /// Full asm expression: logical-or with an optional ternary tail.
    fn parse_asm_expr(&mut self) -> ParseResult<AsmExprId> {
        let loc = self.loc();
        let cond = self.parse_asm_log_or()?;
        if !self.cursor.current_is(TokenKind::Question) {
            return Ok(cond);
        }
        self.cursor.advance();
        let then = self.parse_asm_expr()?;
        self.expect(TokenKind::Colon)?;
        let otherwise = self.parse_asm_expr()?;
        Ok(self.alloc_asm(
            AsmExprKind::Ternary {
                cond,
                then,
                otherwise,
            },
            loc,
        ))
    }

    fn parse_asm_log_or(&mut self) -> ParseResult<AsmExprId> {
        self.asm_chain(Self::parse_asm_log_and, |k| {
            (k == TokenKind::PipePipe).then_some(BinOp::OrOr)
        })
    }

    fn parse_asm_log_and(&mut self) -> ParseResult<AsmExprId> {
        self.asm_chain(Self::parse_asm_or, |k| {
            (k == TokenKind::AmpAmp).then_some(BinOp::AndAnd)
        })
    }

    fn parse_asm_or(&mut self) -> ParseResult<AsmExprId> {
        self.asm_chain(Self::parse_asm_xor, |k| {
            (k == TokenKind::Pipe).then_some(BinOp::BitOr)
        })
    }

    fn parse_asm_xor(&mut self) -> ParseResult<AsmExprId> {
        self.asm_chain(Self::parse_asm_and, |k| {
            (k == TokenKind::Caret).then_some(BinOp::BitXor)
        })
    }

    fn parse_asm_and(&mut self) -> ParseResult<AsmExprId> {
        self.asm_chain(Self::parse_asm_eq, |k| {
            (k == TokenKind::Amp).then_some(BinOp::BitAnd)
        })
    }

    fn parse_asm_eq(&mut self) -> ParseResult<AsmExprId> {
        self.asm_chain(Self::parse_asm_rel, |k| match k {
            TokenKind::EqEq => Some(BinOp::Equal),
            TokenKind::BangEq => Some(BinOp::NotEqual),
            _ => None,
        })
    }

    fn parse_asm_rel(&mut self) -> ParseResult<AsmExprId> {
        self.asm_chain(Self::parse_asm_shift, |k| match k {
            TokenKind::Less => Some(BinOp::Less),
            TokenKind::LessEq => Some(BinOp::LessEq),
            TokenKind::Greater => Some(BinOp::Greater),
            TokenKind::GreaterEq => Some(BinOp::GreaterEq),
            _ => None,
        })
    }

    fn parse_asm_shift(&mut self) -> ParseResult<AsmExprId> {
        self.asm_chain(Self::parse_asm_add, |k| match k {
            TokenKind::ShiftLeft => Some(BinOp::Shl),
            TokenKind::ShiftRight => Some(BinOp::Shr),
            TokenKind::UnsignedShiftRight => Some(BinOp::Ushr),
            _ => None,
        })
    }

    fn parse_asm_add(&mut self) -> ParseResult<AsmExprId> {
        self.asm_chain(Self::parse_asm_mul, |k| match k {
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            _ => None,
        })
    }

    fn parse_asm_mul(&mut self) -> ParseResult<AsmExprId> {
        self.asm_chain(Self::parse_asm_br, |k| match k {
            TokenKind::Star => Some(BinOp::Mul),
            TokenKind::Slash => Some(BinOp::Div),
            TokenKind::Percent => Some(BinOp::Mod),
            _ => None,
        })
    }

    /// Bracketed indexing: `base [ index ]`, left-associative.
    fn parse_asm_br(&mut self) -> ParseResult<AsmExprId> {
        use TokenKind::*;
        let loc = self.loc();
        let mut base = self.parse_asm_una()?;
        while self.cursor.current_is(LBracket) {
            self.cursor.advance();
            let index = self.parse_asm_expr()?;
            self.expect(RBracket)?;
            base = self.alloc_asm(AsmExprKind::Indexed { base, index }, loc);
        }
        Ok(base)
    }

    fn parse_asm_una(&mut self) -> ParseResult<AsmExprId> {
        use TokenKind::*;
        let loc = self.loc();
        let prefix_op = match self.cursor.current_kind() {
            Plus => Some(PrefixOp::Plus),
            Minus => Some(PrefixOp::Minus),
            Bang => Some(PrefixOp::Not),
            Tilde => Some(PrefixOp::Complement),
            _ => None,
        };
        if let Some(op) = prefix_op {
            self.cursor.advance();
            let operand = self.parse_asm_una()?;
            return Ok(self.alloc_asm(AsmExprKind::Unary { op, operand }, loc));
        }
        if let Some(prefix) = self.asm_type_prefix() {
            return self.parse_asm_type_prefixed(prefix, loc);
        }
        self.parse_asm_primary()
    }

    /// Recognize a type prefix at the current token: `near`, `far`,
    /// `word`, `dword`, `qword` on identifiers, plus the `byte`,
    /// `short`, `int`, `float`, `double`, `real` keywords.
    fn asm_type_prefix(&self) -> Option<AsmTypePrefix> {
        use TokenKind::*;
        let token = self.cursor.current();
        let prefix = match token.kind {
            Byte => AsmTypePrefix::Byte,
            Short => AsmTypePrefix::Short,
            Int => AsmTypePrefix::Int,
            Float => AsmTypePrefix::Float,
            Double => AsmTypePrefix::Double,
            Real => AsmTypePrefix::Real,
            Identifier => {
                let prefix = AsmTypePrefix::from_str(self.text(token.text))?;
                // Identifier prefixes only count when an operand clearly
                // follows; a lone `word` is a symbol.
                if !(self.peek_is_ptr_ident() || self.cursor.peek_is(LBracket)) {
                    return None;
                }
                prefix
            }
            _ => return None,
        };
        Some(prefix)
    }

    fn peek_is_ptr_ident(&self) -> bool {
        let next = self.cursor.peek(1);
        next.kind == TokenKind::Identifier && self.text(next.text) == "ptr"
    }

    fn parse_asm_type_prefixed(
        &mut self,
        prefix: AsmTypePrefix,
        loc: Loc,
    ) -> ParseResult<AsmExprId> {
        self.cursor.advance();
        let has_ptr = if self.peek_is_ptr_ident_at_current() {
            self.cursor.advance();
            true
        } else {
            false
        };
        let operand = self.parse_asm_expr()?;
        Ok(self.alloc_asm(
            AsmExprKind::TypePrefix {
                prefix,
                has_ptr,
                operand,
            },
            loc,
        ))
    }

    fn peek_is_ptr_ident_at_current(&self) -> bool {
        let current = self.cursor.current();
        current.kind == TokenKind::Identifier && self.text(current.text) == "ptr"
    }

    fn parse_asm_primary(&mut self) -> ParseResult<AsmExprId> {
        use TokenKind::*;
        let loc = self.loc();
        let token = self.cursor.current();
        let kind = token.kind;
        if kind.is_integer_literal() || kind.is_float_literal() || kind.is_string_literal() {
            let text = token.text;
            self.cursor.advance();
            return Ok(self.alloc_asm(AsmExprKind::Literal { text, kind }, loc));
        }
        match kind {
            LBracket => {
                self.cursor.advance();
                let inner = self.parse_asm_expr()?;
                self.expect(RBracket)?;
                Ok(self.alloc_asm(AsmExprKind::MemRef { inner }, loc))
            }
            Dollar => {
                self.cursor.advance();
                Ok(self.alloc_asm(AsmExprKind::Dollar, loc))
            }
            This => {
                self.cursor.advance();
                Ok(self.alloc_asm(AsmExprKind::This, loc))
            }
            Identifier => {
                let text = token.text;
                if is_register(self.text(text)) {
                    self.cursor.advance();
                    // `ST(0)` style index is folded into the register.
                    if self.text(text) == "ST" && self.cursor.current_is(LParen) {
                        self.cursor.skip_parens();
                    }
                    let segment = if self.cursor.current_is(Colon) {
                        self.cursor.advance();
                        Some(self.parse_asm_expr()?)
                    } else {
                        None
                    };
                    return Ok(self.alloc_asm(
                        AsmExprKind::Register {
                            name: text,
                            segment,
                        },
                        loc,
                    ));
                }
                let mut parts = vec![text];
                self.cursor.advance();
                while self.cursor.current_is(Dot) {
                    self.cursor.advance();
                    parts.push(self.expect_ident()?);
                }
                Ok(self.alloc_asm(
                    AsmExprKind::IdentChain {
                        parts: parts.into_boxed_slice(),
                    },
                    loc,
                ))
            }
            found => Err(self.error(
                ErrorCode::E1002,
                format!(
                    "expected asm operand, found {}",
                    found.display_name()
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_table_is_sorted() {
        let mut sorted = REGISTERS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, REGISTERS, "REGISTERS must stay sorted for binary search");
    }

    #[test]
    fn register_lookup() {
        assert!(is_register("EAX"));
        assert!(is_register("XMM15"));
        assert!(!is_register("foo"));
        assert!(!is_register("eax"));
    }
}
