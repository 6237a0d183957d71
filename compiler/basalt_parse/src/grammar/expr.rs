//! Expression parsing: the full operator-precedence cascade.
//!
//! Every binary level is a left-associative chain to the next-tighter
//! level, so `a OP b OP c` nests as `(a OP b) OP c` structurally.

use basalt_diagnostic::ErrorCode;
use basalt_ir::{
    AnonClassExpr, AssignOp, BinOp, CastExpr, Expr, ExprId, ExprKind, FnLitKind, FunctionLit,
    IsComparison, IsExpr, IsTarget, KeyValue, LambdaExpr, LambdaParams, Loc, PrefixOp,
    TemplateArg, TokenKind, TypeCtorCall, TypeOrExpr,
};
use tracing::trace;

use crate::{ParseFailed, ParseResult, Parser};

/// Keywords accepted as a bare `is(...)` specialization target.
const IS_TARGET_KEYWORDS: &[TokenKind] = &[
    TokenKind::Struct,
    TokenKind::Union,
    TokenKind::Class,
    TokenKind::Interface,
    TokenKind::Enum,
    TokenKind::Function,
    TokenKind::Delegate,
    TokenKind::Super,
    TokenKind::Const,
    TokenKind::Immutable,
    TokenKind::Inout,
    TokenKind::Shared,
    TokenKind::Return,
    TokenKind::Parameters,
];

fn match_or_op(kind: TokenKind) -> Option<BinOp> {
    (kind == TokenKind::Pipe).then_some(BinOp::BitOr)
}

fn match_xor_op(kind: TokenKind) -> Option<BinOp> {
    (kind == TokenKind::Caret).then_some(BinOp::BitXor)
}

fn match_and_op(kind: TokenKind) -> Option<BinOp> {
    (kind == TokenKind::Amp).then_some(BinOp::BitAnd)
}

fn match_shift_op(kind: TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::ShiftLeft => Some(BinOp::Shl),
        TokenKind::ShiftRight => Some(BinOp::Shr),
        TokenKind::UnsignedShiftRight => Some(BinOp::Ushr),
        _ => None,
    }
}

fn match_add_op(kind: TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Plus => Some(BinOp::Add),
        TokenKind::Minus => Some(BinOp::Sub),
        TokenKind::Tilde => Some(BinOp::Concat),
        _ => None,
    }
}

fn match_mul_op(kind: TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Star => Some(BinOp::Mul),
        TokenKind::Slash => Some(BinOp::Div),
        TokenKind::Percent => Some(BinOp::Mod),
        _ => None,
    }
}

fn match_pow_op(kind: TokenKind) -> Option<BinOp> {
    (kind == TokenKind::CaretCaret).then_some(BinOp::Pow)
}

impl Parser<'_> {
    pub(crate) fn alloc_expr(&mut self, kind: ExprKind, loc: Loc) -> ExprId {
        self.arena.alloc(Expr { kind, loc })
    }

    /// Expression: comma-separated assign expressions.
    pub(crate) fn parse_expression(&mut self) -> ParseResult<ExprId> {
        self.check_speculation_fuse()?;
        let loc = self.loc();
        let first = self.parse_assign_expr()?;
        if !self.cursor.current_is(TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.cursor.current_is(TokenKind::Comma) {
            self.cursor.advance();
            items.push(self.parse_assign_expr()?);
        }
        Ok(self.alloc_expr(ExprKind::Seq(items.into_boxed_slice()), loc))
    }

    /// AssignExpression: ternary, optionally followed by an assignment
    /// operator and a full expression.
    pub(crate) fn parse_assign_expr(&mut self) -> ParseResult<ExprId> {
        self.check_speculation_fuse()?;
        let loc = self.loc();
        let lhs = self.parse_ternary()?;
        if let Some(op) = AssignOp::from_token(self.cursor.current_kind()) {
            self.cursor.advance();
            let rhs = self.parse_expression()?;
            return Ok(self.alloc_expr(ExprKind::Assign { op, lhs, rhs }, loc));
        }
        Ok(lhs)
    }

    pub(crate) fn parse_ternary(&mut self) -> ParseResult<ExprId> {
        let loc = self.loc();
        let cond = self.parse_or_or()?;
        if !self.cursor.current_is(TokenKind::Question) {
            return Ok(cond);
        }
        self.cursor.advance();
        let then = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        let otherwise = self.parse_ternary()?;
        Ok(self.alloc_expr(
            ExprKind::Ternary {
                cond,
                then,
                otherwise,
            },
            loc,
        ))
    }

    fn binary_chain(
        &mut self,
        next: fn(&mut Self) -> ParseResult<ExprId>,
        match_op: fn(TokenKind) -> Option<BinOp>,
    ) -> ParseResult<ExprId> {
        let loc = self.loc();
        let mut lhs = next(self)?;
        while let Some(op) = match_op(self.cursor.current_kind()) {
            self.cursor.advance();
            let rhs = next(self)?;
            lhs = self.alloc_expr(ExprKind::Binary { op, lhs, rhs }, loc);
        }
        Ok(lhs)
    }

    fn parse_or_or(&mut self) -> ParseResult<ExprId> {
        self.binary_chain(Self::parse_and_and, |k| {
            (k == TokenKind::PipePipe).then_some(BinOp::OrOr)
        })
    }

    fn parse_and_and(&mut self) -> ParseResult<ExprId> {
        self.binary_chain(Self::parse_bit_or, |k| {
            (k == TokenKind::AmpAmp).then_some(BinOp::AndAnd)
        })
    }

    fn parse_bit_or(&mut self) -> ParseResult<ExprId> {
        self.binary_chain(Self::parse_bit_xor, match_or_op)
    }

    fn parse_bit_xor(&mut self) -> ParseResult<ExprId> {
        self.binary_chain(Self::parse_bit_and, match_xor_op)
    }

    fn parse_bit_and(&mut self) -> ParseResult<ExprId> {
        self.binary_chain(Self::parse_cmp, match_and_op)
    }

    /// CmpExpression: a shift expression followed by at most one of the
    /// equality / identity / membership / relational families. The
    /// comparison level does not chain: in `a < b < c` the trailing
    /// `< c` is left for the caller, which reports it.
    fn parse_cmp(&mut self) -> ParseResult<ExprId> {
        use TokenKind::*;
        let loc = self.loc();
        let lhs = self.parse_shift()?;
        let kind = self.cursor.current_kind();

        if let Some(op) = BinOp::from_rel_token(kind) {
            self.cursor.advance();
            let rhs = self.parse_shift()?;
            return Ok(self.alloc_expr(ExprKind::Binary { op, lhs, rhs }, loc));
        }

        let op = match kind {
            EqEq => Some(BinOp::Equal),
            BangEq => Some(BinOp::NotEqual),
            Is => Some(BinOp::Identity),
            In => Some(BinOp::In),
            Bang if self.cursor.peek_is(Is) => Some(BinOp::NotIdentity),
            Bang if self.cursor.peek_is(In) => Some(BinOp::NotIn),
            _ => None,
        };
        let Some(op) = op else { return Ok(lhs) };
        self.cursor.advance();
        if matches!(op, BinOp::NotIdentity | BinOp::NotIn) {
            self.cursor.advance();
        }
        let rhs = self.parse_shift()?;
        Ok(self.alloc_expr(ExprKind::Binary { op, lhs, rhs }, loc))
    }

    fn parse_shift(&mut self) -> ParseResult<ExprId> {
        self.binary_chain(Self::parse_add, match_shift_op)
    }

    fn parse_add(&mut self) -> ParseResult<ExprId> {
        self.binary_chain(Self::parse_mul, match_add_op)
    }

    fn parse_mul(&mut self) -> ParseResult<ExprId> {
        self.binary_chain(Self::parse_pow, match_mul_op)
    }

    fn parse_pow(&mut self) -> ParseResult<ExprId> {
        self.binary_chain(Self::parse_unary, match_pow_op)
    }

    // --- Unary and postfix ---

    pub(crate) fn parse_unary(&mut self) -> ParseResult<ExprId> {
        use TokenKind::*;
        self.check_speculation_fuse()?;
        let loc = self.loc();
        let prefix = match self.cursor.current_kind() {
            Amp => Some(PrefixOp::Addr),
            Bang => Some(PrefixOp::Not),
            Star => Some(PrefixOp::Deref),
            Plus => Some(PrefixOp::Plus),
            Minus => Some(PrefixOp::Minus),
            Tilde => Some(PrefixOp::Complement),
            PlusPlus => Some(PrefixOp::Inc),
            MinusMinus => Some(PrefixOp::Dec),
            _ => None,
        };
        if let Some(op) = prefix {
            self.cursor.advance();
            let operand = self.parse_unary()?;
            return Ok(self.alloc_expr(ExprKind::Prefix { op, operand }, loc));
        }

        let node = match self.cursor.current_kind() {
            New => self.parse_new_expr()?,
            Delete => {
                self.cursor.advance();
                let operand = self.parse_unary()?;
                self.alloc_expr(ExprKind::Delete { operand }, loc)
            }
            Cast => self.parse_cast_expr()?,
            Assert => self.parse_assert_expr()?,
            Const | Immutable | Inout | Shared | Scope | Pure | Nothrow => {
                self.parse_type_ctor_call()?
            }
            LParen => {
                // `(type).member` needs a bookmark: `(expr)` shares the
                // same first token.
                let qualified = self.try_parse(|p| {
                    p.cursor.advance();
                    let ty = p.parse_type()?;
                    if !p.cursor.current_is(RParen) || !p.cursor.peek_is(Dot) {
                        return Err(ParseFailed);
                    }
                    p.cursor.advance();
                    p.cursor.advance();
                    let member = p.expect_ident()?;
                    Ok(p.alloc_expr(ExprKind::TypeDotId { ty, member }, loc))
                });
                match qualified {
                    Some(node) => node,
                    None => self.parse_primary()?,
                }
            }
            _ => self.parse_primary()?,
        };
        self.parse_postfix(node, loc)
    }

    fn parse_postfix(&mut self, mut node: ExprId, loc: Loc) -> ParseResult<ExprId> {
        use TokenKind::*;
        loop {
            match self.cursor.current_kind() {
                Bang if self.cursor.peek_is(LParen) => {
                    self.cursor.advance();
                    let template_args = self.parse_template_args_after_bang()?;
                    let args = if self.cursor.current_is(LParen) {
                        self.parse_arguments()?
                    } else {
                        Box::default()
                    };
                    node = self.alloc_expr(
                        ExprKind::TemplatedCall {
                            target: node,
                            template_args,
                            args,
                        },
                        loc,
                    );
                }
                LParen => {
                    let args = self.parse_arguments()?;
                    node = self.alloc_expr(ExprKind::Call { callee: node, args }, loc);
                }
                LBracket => node = self.parse_index_or_slice(node, loc)?,
                PlusPlus => {
                    self.cursor.advance();
                    node = self.alloc_expr(
                        ExprKind::PostIncDec {
                            inc: true,
                            operand: node,
                        },
                        loc,
                    );
                }
                MinusMinus => {
                    self.cursor.advance();
                    node = self.alloc_expr(
                        ExprKind::PostIncDec {
                            inc: false,
                            operand: node,
                        },
                        loc,
                    );
                }
                Dot => {
                    self.cursor.advance();
                    let member = match self.cursor.current_kind() {
                        Identifier => self.parse_ident_or_template_instance()?,
                        New => self.parse_new_expr()?,
                        This => {
                            let member_loc = self.loc();
                            self.cursor.advance();
                            self.alloc_expr(ExprKind::This, member_loc)
                        }
                        found => {
                            return Err(self.error(
                                ErrorCode::E1001,
                                format!(
                                    "expected identifier after `.`, found {}",
                                    found.display_name()
                                ),
                            ))
                        }
                    };
                    node = self.alloc_expr(ExprKind::Member { target: node, member }, loc);
                }
                _ => return Ok(node),
            }
        }
    }

    fn parse_index_or_slice(&mut self, target: ExprId, loc: Loc) -> ParseResult<ExprId> {
        use TokenKind::*;
        self.expect(LBracket)?;
        if self.cursor.current_is(RBracket) {
            self.cursor.advance();
            return Ok(self.alloc_expr(
                ExprKind::Slice {
                    target,
                    low: None,
                    high: None,
                },
                loc,
            ));
        }
        let first = self.parse_assign_expr()?;
        if self.cursor.current_is(DotDot) {
            self.cursor.advance();
            let high = self.parse_assign_expr()?;
            self.expect(RBracket)?;
            return Ok(self.alloc_expr(
                ExprKind::Slice {
                    target,
                    low: Some(first),
                    high: Some(high),
                },
                loc,
            ));
        }
        let mut args = vec![first];
        while self.cursor.current_is(Comma) {
            self.cursor.advance();
            if self.cursor.current_is(RBracket) {
                break;
            }
            args.push(self.parse_assign_expr()?);
        }
        self.expect(RBracket)?;
        Ok(self.alloc_expr(
            ExprKind::Index {
                target,
                args: args.into_boxed_slice(),
            },
            loc,
        ))
    }

    /// `( ArgumentList? )` with trailing comma tolerated.
    pub(crate) fn parse_arguments(&mut self) -> ParseResult<Box<[ExprId]>> {
        use TokenKind::*;
        self.expect(LParen)?;
        let mut args = Vec::new();
        while !self.cursor.current_is(RParen) && !self.cursor.is_at_end() {
            args.push(self.parse_assign_expr()?);
            if self.cursor.current_is(Comma) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.expect(RParen)?;
        Ok(args.into_boxed_slice())
    }

    // --- Primary ---

    pub(crate) fn parse_primary(&mut self) -> ParseResult<ExprId> {
        use TokenKind::*;
        let loc = self.loc();
        let kind = self.cursor.current_kind();
        trace!(?kind, "primary dispatch");

        if kind.is_basic_type() {
            return self.parse_builtin_primary(loc);
        }
        if kind.is_integer_literal() {
            let token = self.cursor.advance();
            return Ok(self.alloc_expr(
                ExprKind::IntLit {
                    text: token.text,
                    kind,
                },
                loc,
            ));
        }
        if kind.is_float_literal() {
            let token = self.cursor.advance();
            return Ok(self.alloc_expr(
                ExprKind::FloatLit {
                    text: token.text,
                    kind,
                },
                loc,
            ));
        }
        if kind.is_string_literal() {
            return self.parse_string_primary(loc);
        }
        if kind.is_special_intrinsic() {
            self.cursor.advance();
            return Ok(self.alloc_expr(ExprKind::Intrinsic(kind), loc));
        }

        match kind {
            Dot => {
                self.cursor.advance();
                let inner = self.parse_ident_or_template_instance()?;
                Ok(self.alloc_expr(ExprKind::ModuleScoped { inner }, loc))
            }
            Identifier if self.cursor.peek_is(GoesTo) => {
                let name = self.cursor.advance().text;
                self.cursor.advance();
                let body = self.parse_assign_expr()?;
                Ok(self.alloc_expr(
                    ExprKind::Lambda(Box::new(LambdaExpr {
                        keyword: None,
                        return_type: None,
                        params: LambdaParams::Single(name),
                        attrs: Box::default(),
                        body,
                    })),
                    loc,
                ))
            }
            Identifier => self.parse_ident_or_template_instance(),
            CharLiteral => {
                let token = self.cursor.advance();
                Ok(self.alloc_expr(ExprKind::CharLit { text: token.text }, loc))
            }
            Function | Delegate => self.parse_function_literal(loc),
            LBrace => {
                let body = self.parse_block_statement()?;
                Ok(self.alloc_expr(
                    ExprKind::FunctionLit(Box::new(FunctionLit {
                        keyword: None,
                        return_type: None,
                        params: None,
                        attrs: Box::default(),
                        body,
                    })),
                    loc,
                ))
            }
            Typeof => {
                let base = self.parse_typeof_type()?;
                Ok(self.alloc_expr(ExprKind::TypeExpr { ty: base }, loc))
            }
            Typeid => self.parse_typeid_expr(loc),
            Vector => {
                let ty = self.parse_type()?;
                Ok(self.alloc_expr(ExprKind::TypeExpr { ty }, loc))
            }
            LBracket => self.parse_array_or_aa_literal(loc),
            LParen => self.parse_paren_primary(loc),
            Is => self.parse_is_expr(loc),
            Traits => self.parse_traits_expr(loc),
            Mixin => {
                self.cursor.advance();
                self.expect(LParen)?;
                let operand = self.parse_expression()?;
                self.expect(RParen)?;
                Ok(self.alloc_expr(ExprKind::MixinExpr { operand }, loc))
            }
            Import => {
                self.cursor.advance();
                self.expect(LParen)?;
                let operand = self.parse_assign_expr()?;
                self.expect(RParen)?;
                Ok(self.alloc_expr(ExprKind::ImportExpr { operand }, loc))
            }
            Dollar => {
                self.cursor.advance();
                Ok(self.alloc_expr(ExprKind::Dollar, loc))
            }
            This => {
                self.cursor.advance();
                Ok(self.alloc_expr(ExprKind::This, loc))
            }
            Super => {
                self.cursor.advance();
                Ok(self.alloc_expr(ExprKind::Super, loc))
            }
            Null => {
                self.cursor.advance();
                Ok(self.alloc_expr(ExprKind::Null, loc))
            }
            True => {
                self.cursor.advance();
                Ok(self.alloc_expr(ExprKind::True, loc))
            }
            False => {
                self.cursor.advance();
                Ok(self.alloc_expr(ExprKind::False, loc))
            }
            found => Err(self.error(
                ErrorCode::E1002,
                format!("expected expression, found {}", found.display_name()),
            )),
        }
    }

    /// Builtin-type primary: `int.max` property or `int(3)` construction.
    fn parse_builtin_primary(&mut self, loc: Loc) -> ParseResult<ExprId> {
        use TokenKind::*;
        let kind = self.cursor.advance().kind;
        let ty = self.alloc_type(basalt_ir::Type {
            ctors: Box::default(),
            kind: basalt_ir::TypeKind::Builtin(kind),
            suffixes: Box::default(),
            loc,
        });
        match self.cursor.current_kind() {
            Dot => {
                self.cursor.advance();
                let member = self.expect_ident()?;
                Ok(self.alloc_expr(ExprKind::TypeDotId { ty, member }, loc))
            }
            LParen => {
                let args = self.parse_arguments()?;
                Ok(self.alloc_expr(
                    ExprKind::TypeCtorCall(Box::new(TypeCtorCall {
                        qualifiers: Box::default(),
                        ty,
                        args,
                    })),
                    loc,
                ))
            }
            found => Err(self.error(
                ErrorCode::E1001,
                format!(
                    "expected `.` or `(` after builtin type, found {}",
                    found.display_name()
                ),
            )),
        }
    }

    /// Adjacent string literals concatenate into one primary, warning
    /// once per chain.
    fn parse_string_primary(&mut self, loc: Loc) -> ParseResult<ExprId> {
        let first = self.cursor.advance();
        let kind = first.kind;
        if !self.cursor.current_kind().is_string_literal() {
            return Ok(self.alloc_expr(
                ExprKind::StringLit {
                    text: first.text,
                    kind,
                },
                loc,
            ));
        }
        let second = self.cursor.current();
        self.warn_at(
            ErrorCode::W1001,
            "implicit concatenation of adjacent string literals; use `~`",
            second,
        );
        let mut combined = String::from(self.text(first.text));
        while self.cursor.current_kind().is_string_literal() {
            let token = self.cursor.advance();
            combined.push_str(self.text(token.text));
        }
        let text = self.interner.intern(&combined);
        Ok(self.alloc_expr(ExprKind::StringLit { text, kind }, loc))
    }

    pub(crate) fn parse_ident_or_template_instance(&mut self) -> ParseResult<ExprId> {
        use TokenKind::*;
        let loc = self.loc();
        let name = self.expect_ident()?;
        // `!` opens a template argument list unless it negates an
        // identity or membership test.
        if self.cursor.current_is(Bang) && !matches!(self.cursor.peek_kind(1), Is | In) {
            self.cursor.advance();
            let args = self.parse_template_args_after_bang()?;
            return Ok(self.alloc_expr(ExprKind::TemplateInstance { name, args }, loc));
        }
        Ok(self.alloc_expr(ExprKind::Ident(name), loc))
    }

    /// `(` in primary position: a parenthesized lambda, a parameterized
    /// function literal, or a parenthesized expression.
    fn parse_paren_primary(&mut self, loc: Loc) -> ParseResult<ExprId> {
        use TokenKind::*;
        let after = self.cursor.peek_past_parens().map(|t| t.kind);
        match after {
            Some(GoesTo) => {
                let params = self.parse_parameters()?;
                let attrs = self.parse_member_function_attrs()?;
                self.expect(GoesTo)?;
                let body = self.parse_assign_expr()?;
                Ok(self.alloc_expr(
                    ExprKind::Lambda(Box::new(LambdaExpr {
                        keyword: None,
                        return_type: None,
                        params: LambdaParams::List(params),
                        attrs,
                        body,
                    })),
                    loc,
                ))
            }
            Some(LBrace) => {
                let params = self.parse_parameters()?;
                let attrs = self.parse_member_function_attrs()?;
                let body = self.parse_block_statement()?;
                Ok(self.alloc_expr(
                    ExprKind::FunctionLit(Box::new(FunctionLit {
                        keyword: None,
                        return_type: None,
                        params: Some(params),
                        attrs,
                        body,
                    })),
                    loc,
                ))
            }
            _ => {
                self.cursor.advance();
                let inner = self.parse_expression()?;
                self.expect(RParen)?;
                Ok(self.alloc_expr(ExprKind::Paren { inner }, loc))
            }
        }
    }

    /// `function` / `delegate` literal. A `=>` after the parameter list
    /// selects the typed-lambda form instead of a block literal.
    fn parse_function_literal(&mut self, loc: Loc) -> ParseResult<ExprId> {
        use TokenKind::*;
        let keyword = if self.cursor.advance().kind == Function {
            FnLitKind::Function
        } else {
            FnLitKind::Delegate
        };
        let return_type = if !matches!(self.cursor.current_kind(), LParen | LBrace | GoesTo) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let params = if self.cursor.current_is(LParen) {
            Some(self.parse_parameters()?)
        } else {
            None
        };
        let attrs = self.parse_member_function_attrs()?;
        if self.cursor.current_is(GoesTo) {
            self.cursor.advance();
            let body = self.parse_assign_expr()?;
            return Ok(self.alloc_expr(
                ExprKind::Lambda(Box::new(LambdaExpr {
                    keyword: Some(keyword),
                    return_type,
                    params: LambdaParams::List(params.unwrap_or_default()),
                    attrs,
                    body,
                })),
                loc,
            ));
        }
        let body = self.parse_block_statement()?;
        Ok(self.alloc_expr(
            ExprKind::FunctionLit(Box::new(FunctionLit {
                keyword: Some(keyword),
                return_type,
                params,
                attrs,
                body,
            })),
            loc,
        ))
    }

    fn parse_array_or_aa_literal(&mut self, loc: Loc) -> ParseResult<ExprId> {
        use TokenKind::*;
        if self.is_associative_array_literal() {
            self.cursor.advance();
            let mut entries = Vec::new();
            while !self.cursor.current_is(RBracket) && !self.cursor.is_at_end() {
                let key = self.parse_assign_expr()?;
                self.expect(Colon)?;
                let value = self.parse_assign_expr()?;
                entries.push(KeyValue { key, value });
                if self.cursor.current_is(Comma) {
                    self.cursor.advance();
                } else {
                    break;
                }
            }
            self.expect(RBracket)?;
            return Ok(self.alloc_expr(
                ExprKind::AssocArrayLit {
                    entries: entries.into_boxed_slice(),
                },
                loc,
            ));
        }
        self.cursor.advance();
        let mut elements = Vec::new();
        while !self.cursor.current_is(RBracket) && !self.cursor.is_at_end() {
            elements.push(self.parse_assign_expr()?);
            if self.cursor.current_is(Comma) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.expect(RBracket)?;
        Ok(self.alloc_expr(
            ExprKind::ArrayLit {
                elements: elements.into_boxed_slice(),
            },
            loc,
        ))
    }

    fn parse_typeid_expr(&mut self, loc: Loc) -> ParseResult<ExprId> {
        use TokenKind::*;
        self.expect(Typeid)?;
        self.expect(LParen)?;
        let argument = match self.try_parse(|p| {
            let ty = p.parse_type()?;
            if p.cursor.current_is(RParen) {
                Ok(ty)
            } else {
                Err(ParseFailed)
            }
        }) {
            Some(ty) => TypeOrExpr::Type(ty),
            None => TypeOrExpr::Expr(self.parse_expression()?),
        };
        self.expect(RParen)?;
        Ok(self.alloc_expr(ExprKind::Typeid { argument }, loc))
    }

    fn parse_is_expr(&mut self, loc: Loc) -> ParseResult<ExprId> {
        use TokenKind::*;
        self.expect(Is)?;
        self.expect(LParen)?;
        let ty = self.parse_type()?;
        let ident = if self.cursor.current_is(Identifier) {
            self.cursor.advance().text
        } else {
            basalt_ir::Name::EMPTY
        };
        let comparison = if matches!(self.cursor.current_kind(), Colon | EqEq) {
            let exact = self.cursor.advance().kind == EqEq;
            let kind = self.cursor.current_kind();
            let target = if IS_TARGET_KEYWORDS.contains(&kind)
                && matches!(self.cursor.peek_kind(1), RParen | Comma)
            {
                self.cursor.advance();
                IsTarget::Keyword(kind)
            } else {
                IsTarget::Type(self.parse_type()?)
            };
            Some(IsComparison { exact, target })
        } else {
            None
        };
        let mut template_params = Vec::new();
        if self.cursor.current_is(Comma) {
            self.cursor.advance();
            while !self.cursor.current_is(RParen) && !self.cursor.is_at_end() {
                template_params.push(self.parse_template_parameter()?);
                if self.cursor.current_is(Comma) {
                    self.cursor.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(RParen)?;
        Ok(self.alloc_expr(
            ExprKind::IsExpr(Box::new(IsExpr {
                ty,
                ident,
                comparison,
                template_params: template_params.into_boxed_slice(),
            })),
            loc,
        ))
    }

    fn parse_traits_expr(&mut self, loc: Loc) -> ParseResult<ExprId> {
        use TokenKind::*;
        self.expect(Traits)?;
        self.expect(LParen)?;
        let name = self.expect_ident()?;
        let mut args: Vec<TemplateArg> = Vec::new();
        while self.cursor.current_is(Comma) {
            self.cursor.advance();
            if self.cursor.current_is(RParen) {
                break;
            }
            args.push(self.parse_template_arg()?);
        }
        self.expect(RParen)?;
        Ok(self.alloc_expr(
            ExprKind::TraitsExpr {
                name,
                args: args.into_boxed_slice(),
            },
            loc,
        ))
    }

    fn parse_assert_expr(&mut self) -> ParseResult<ExprId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(Assert)?;
        self.expect(LParen)?;
        let condition = self.parse_assign_expr()?;
        let message = if self.cursor.current_is(Comma) {
            self.cursor.advance();
            if self.cursor.current_is(RParen) {
                None
            } else {
                Some(self.parse_assign_expr()?)
            }
        } else {
            None
        };
        self.expect(RParen)?;
        Ok(self.alloc_expr(ExprKind::Assert { condition, message }, loc))
    }

    /// Type-qualified construction call: a qualifier run, a type, and an
    /// argument list (`const(int)(3)`, `pure T(x)`), or a qualified
    /// property access (`const(int).max`).
    fn parse_type_ctor_call(&mut self) -> ParseResult<ExprId> {
        use TokenKind::*;
        let loc = self.loc();
        let mut qualifiers = Vec::new();
        while matches!(
            self.cursor.current_kind(),
            Const | Immutable | Inout | Shared | Scope | Pure | Nothrow
        ) {
            // Stop when the qualifier itself opens the type (`const(T)`).
            if self.cursor.current_kind().is_type_constructor() && self.cursor.peek_is(LParen) {
                break;
            }
            qualifiers.push(self.cursor.advance().kind);
        }
        let ty = self.parse_type()?;
        if self.cursor.current_is(Dot) {
            self.cursor.advance();
            let member = self.expect_ident()?;
            return Ok(self.alloc_expr(ExprKind::TypeDotId { ty, member }, loc));
        }
        let args = self.parse_arguments()?;
        Ok(self.alloc_expr(
            ExprKind::TypeCtorCall(Box::new(TypeCtorCall {
                qualifiers: qualifiers.into_boxed_slice(),
                ty,
                args,
            })),
            loc,
        ))
    }

    fn parse_new_expr(&mut self) -> ParseResult<ExprId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(New)?;
        if self.cursor.current_is(Class) {
            return self.parse_anon_class_expr(loc);
        }
        let ty = self.parse_type()?;
        let mut ctor_args = None;
        let mut array_size = None;
        if self.cursor.current_is(LParen) {
            ctor_args = Some(self.parse_arguments()?);
        } else if self.cursor.current_is(LBracket) {
            // The type parser left this `[` behind; in `new` context it
            // is the allocation-size bracket.
            self.cursor.advance();
            array_size = Some(self.parse_assign_expr()?);
            self.expect(RBracket)?;
        }
        Ok(self.alloc_expr(
            ExprKind::New(Box::new(basalt_ir::NewExpr {
                ty,
                ctor_args,
                array_size,
            })),
            loc,
        ))
    }

    fn parse_anon_class_expr(&mut self, loc: Loc) -> ParseResult<ExprId> {
        use TokenKind::*;
        self.expect(Class)?;
        let ctor_args = if self.cursor.current_is(LParen) {
            self.parse_arguments()?
        } else {
            Box::default()
        };
        let mut base_classes = Vec::new();
        while !self.cursor.current_is(LBrace) && !self.cursor.is_at_end() {
            base_classes.push(self.parse_type()?);
            if self.cursor.current_is(Comma) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.expect(LBrace)?;
        let mut members = Vec::new();
        while !self.cursor.current_is(RBrace) && !self.cursor.is_at_end() {
            match self.parse_declaration() {
                Ok(decl) => members.push(decl),
                Err(ParseFailed) => self.recover_in_decl_list(),
            }
        }
        self.expect(RBrace)?;
        Ok(self.alloc_expr(
            ExprKind::NewAnonClass(Box::new(AnonClassExpr {
                ctor_args,
                base_classes: base_classes.into_boxed_slice(),
                members: members.into_boxed_slice(),
            })),
            loc,
        ))
    }

    fn parse_cast_expr(&mut self) -> ParseResult<ExprId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(Cast)?;
        self.expect(LParen)?;
        let mut qualifiers = Vec::new();
        let ty = if self.cursor.current_is(RParen) {
            None
        } else if self.is_cast_qualifier() {
            while !self.cursor.current_is(RParen) && !self.cursor.is_at_end() {
                qualifiers.push(self.cursor.advance().kind);
            }
            None
        } else {
            Some(self.parse_type()?)
        };
        self.expect(RParen)?;
        let operand = self.parse_unary()?;
        Ok(self.alloc_expr(
            ExprKind::Cast(Box::new(CastExpr {
                ty,
                qualifiers: qualifiers.into_boxed_slice(),
                operand,
            })),
            loc,
        ))
    }

    /// `typeof(...)` as a type usable in expression position; further
    /// member access goes through the postfix loop.
    fn parse_typeof_type(&mut self) -> ParseResult<basalt_ir::TypeId> {
        self.parse_type()
    }
}
