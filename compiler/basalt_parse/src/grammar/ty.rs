//! Type parsing: constructor runs, base types, suffixes, template
//! parameters and arguments, and parameter lists.

use basalt_diagnostic::ErrorCode;
use basalt_ir::{
    MemberFunctionAttr, Param, ParamList, SymbolPart, TemplateArg, TemplateParamKind,
    TemplateParameter, Type, TypeId, TypeKind, TypeSuffix,
};
use basalt_ir::TokenKind;

use crate::{ParseFailed, ParseResult, Parser};

impl Parser<'_> {
    pub(crate) fn alloc_type(&mut self, ty: Type) -> TypeId {
        self.arena.alloc(ty)
    }

    /// Parse a full type: constructor run, base, suffix run.
    pub(crate) fn parse_type(&mut self) -> ParseResult<TypeId> {
        self.check_speculation_fuse()?;
        let loc = self.loc();
        let mut ctors = Vec::new();
        while self.cursor.current_kind().is_type_constructor()
            && !self.cursor.peek_is(TokenKind::LParen)
        {
            ctors.push(self.cursor.advance().kind);
        }
        let kind = self.parse_type_base()?;
        let suffixes = self.parse_type_suffixes()?;
        Ok(self.alloc_type(Type {
            ctors: ctors.into_boxed_slice(),
            kind,
            suffixes: suffixes.into_boxed_slice(),
            loc,
        }))
    }

    fn parse_type_base(&mut self) -> ParseResult<TypeKind> {
        use TokenKind::*;
        let kind = self.cursor.current_kind();
        if kind.is_basic_type() {
            self.cursor.advance();
            return Ok(TypeKind::Builtin(kind));
        }
        match kind {
            Identifier | Dot => {
                let leading_dot = kind == Dot;
                if leading_dot {
                    self.cursor.advance();
                }
                let parts = self.parse_symbol_parts()?;
                Ok(TypeKind::Symbol {
                    leading_dot,
                    parts,
                })
            }
            Typeof => self.parse_typeof_base(),
            Const | Immutable | Inout | Shared => {
                // The constructor run stopped here, so `(` follows.
                self.cursor.advance();
                self.expect(LParen)?;
                let inner = self.parse_type()?;
                self.expect(RParen)?;
                Ok(TypeKind::Qualified {
                    qualifier: kind,
                    inner,
                })
            }
            Vector => {
                self.cursor.advance();
                self.expect(LParen)?;
                let element = self.parse_type()?;
                self.expect(RParen)?;
                Ok(TypeKind::Vector { element })
            }
            Traits => {
                // The contents are not interpreted in type position; the
                // token range is recorded for downstream tooling.
                let start = u32::try_from(self.cursor.position()).unwrap_or(u32::MAX);
                self.cursor.advance();
                if !self.cursor.current_is(LParen) {
                    return Err(self.error(ErrorCode::E1001, "expected `(` after `__traits`"));
                }
                self.cursor.skip_parens();
                let end = u32::try_from(self.cursor.position()).unwrap_or(u32::MAX);
                Ok(TypeKind::Traits { start, end })
            }
            _ => Err(self.error(
                ErrorCode::E1002,
                format!("expected type, found {}", kind.display_name()),
            )),
        }
    }

    fn parse_typeof_base(&mut self) -> ParseResult<TypeKind> {
        use TokenKind::*;
        self.expect(Typeof)?;
        self.expect(LParen)?;
        let (expr, is_return) = if self.cursor.current_is(Return) {
            self.cursor.advance();
            (None, true)
        } else {
            (Some(self.parse_expression()?), false)
        };
        self.expect(RParen)?;
        let mut chain = Vec::new();
        while self.cursor.current_is(Dot) && self.cursor.peek_is(Identifier) {
            self.cursor.advance();
            chain.push(self.parse_symbol_part()?);
        }
        Ok(TypeKind::Typeof {
            expr,
            is_return,
            chain: chain.into_boxed_slice(),
        })
    }

    /// Dot-separated chain of identifier-or-template-instance parts.
    pub(crate) fn parse_symbol_parts(&mut self) -> ParseResult<Box<[SymbolPart]>> {
        let mut parts = vec![self.parse_symbol_part()?];
        while self.cursor.current_is(TokenKind::Dot)
            && self.cursor.peek_is(TokenKind::Identifier)
        {
            self.cursor.advance();
            parts.push(self.parse_symbol_part()?);
        }
        Ok(parts.into_boxed_slice())
    }

    pub(crate) fn parse_symbol_part(&mut self) -> ParseResult<SymbolPart> {
        let name = self.expect_ident()?;
        let template_args = if self.cursor.current_is(TokenKind::Bang)
            && !matches!(self.cursor.peek_kind(1), TokenKind::Is | TokenKind::In)
        {
            self.cursor.advance();
            Some(self.parse_template_args_after_bang()?)
        } else {
            None
        };
        Ok(SymbolPart {
            name,
            template_args,
        })
    }

    fn parse_type_suffixes(&mut self) -> ParseResult<Vec<TypeSuffix>> {
        use TokenKind::*;
        let mut suffixes = Vec::new();
        loop {
            match self.cursor.current_kind() {
                Star => {
                    self.cursor.advance();
                    suffixes.push(TypeSuffix::Pointer);
                }
                LBracket => suffixes.push(self.parse_bracket_suffix()?),
                Delegate | Function => {
                    let is_delegate = self.cursor.advance().kind == Delegate;
                    let params = self.parse_parameters()?;
                    let attrs = self.parse_member_function_attrs()?;
                    suffixes.push(if is_delegate {
                        TypeSuffix::Delegate { params, attrs }
                    } else {
                        TypeSuffix::Function { params, attrs }
                    });
                }
                _ => break,
            }
        }
        Ok(suffixes)
    }

    /// `[]`, `[Type]`, `[expr]`, or `[low .. high]`. A bookmark decides
    /// between a type and an expression inside the brackets.
    fn parse_bracket_suffix(&mut self) -> ParseResult<TypeSuffix> {
        use TokenKind::*;
        if self.cursor.peek_is(RBracket) {
            self.cursor.advance();
            self.cursor.advance();
            return Ok(TypeSuffix::Array {
                ty: None,
                low: None,
                high: None,
            });
        }
        if let Some(ty) = self.try_parse(|p| {
            p.cursor.advance();
            let ty = p.parse_type()?;
            if !p.cursor.current_is(RBracket) {
                return Err(ParseFailed);
            }
            p.cursor.advance();
            Ok(ty)
        }) {
            return Ok(TypeSuffix::Array {
                ty: Some(ty),
                low: None,
                high: None,
            });
        }
        self.cursor.advance();
        let low = self.parse_assign_expr()?;
        let high = if self.cursor.current_is(DotDot) {
            self.cursor.advance();
            Some(self.parse_assign_expr()?)
        } else {
            None
        };
        self.expect(RBracket)?;
        Ok(TypeSuffix::Array {
            ty: None,
            low: Some(low),
            high,
        })
    }

    // --- Template arguments ---

    /// Arguments after a consumed `!`: either `( list )` or a single
    /// token (identifier, builtin type, or literal).
    pub(crate) fn parse_template_args_after_bang(&mut self) -> ParseResult<Box<[TemplateArg]>> {
        use TokenKind::*;
        if self.cursor.current_is(LParen) {
            self.cursor.advance();
            let mut args = Vec::new();
            while !self.cursor.current_is(RParen) && !self.cursor.is_at_end() {
                args.push(self.parse_template_arg()?);
                if self.cursor.current_is(Comma) {
                    self.cursor.advance();
                } else {
                    break;
                }
            }
            self.expect(RParen)?;
            return Ok(args.into_boxed_slice());
        }
        // Single-token argument.
        let loc = self.loc();
        let token = self.cursor.current();
        let kind = token.kind;
        let arg = if kind == Identifier {
            let part = SymbolPart {
                name: token.text,
                template_args: None,
            };
            self.cursor.advance();
            let ty = self.alloc_type(Type {
                ctors: Box::default(),
                kind: TypeKind::Symbol {
                    leading_dot: false,
                    parts: vec![part].into_boxed_slice(),
                },
                suffixes: Box::default(),
                loc,
            });
            TemplateArg::Type(ty)
        } else if kind.is_basic_type() {
            self.cursor.advance();
            let ty = self.alloc_type(Type {
                ctors: Box::default(),
                kind: TypeKind::Builtin(kind),
                suffixes: Box::default(),
                loc,
            });
            TemplateArg::Type(ty)
        } else if kind.is_literal()
            || kind.is_special_intrinsic()
            || matches!(kind, This | True | False | Null)
        {
            let expr = self.parse_primary()?;
            TemplateArg::Expr(expr)
        } else {
            return Err(self.error(
                ErrorCode::E1002,
                format!(
                    "expected template argument, found {}",
                    kind.display_name()
                ),
            ));
        };
        Ok(vec![arg].into_boxed_slice())
    }

    /// One argument inside `!( ... )`: a type when a speculative type
    /// parse ends at `,` or `)`, otherwise an assign expression.
    pub(crate) fn parse_template_arg(&mut self) -> ParseResult<TemplateArg> {
        if let Some(ty) = self.try_parse(|p| {
            let ty = p.parse_type()?;
            if matches!(
                p.cursor.current_kind(),
                TokenKind::Comma | TokenKind::RParen
            ) {
                Ok(ty)
            } else {
                Err(ParseFailed)
            }
        }) {
            return Ok(TemplateArg::Type(ty));
        }
        Ok(TemplateArg::Expr(self.parse_assign_expr()?))
    }

    // --- Template parameters ---

    /// `( TemplateParameterList? )`
    pub(crate) fn parse_template_parameters(&mut self) -> ParseResult<Box<[TemplateParameter]>> {
        use TokenKind::*;
        self.expect(LParen)?;
        let mut params = Vec::new();
        while !self.cursor.current_is(RParen) && !self.cursor.is_at_end() {
            params.push(self.parse_template_parameter()?);
            if self.cursor.current_is(Comma) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.expect(RParen)?;
        Ok(params.into_boxed_slice())
    }

    pub(crate) fn parse_template_parameter(&mut self) -> ParseResult<TemplateParameter> {
        use TokenKind::*;
        let loc = self.loc();
        let kind = match self.cursor.current_kind() {
            Alias => {
                self.cursor.advance();
                let name = self.expect_ident()?;
                let specialization = if self.cursor.current_is(Colon) {
                    self.cursor.advance();
                    Some(self.parse_type_or_ternary()?)
                } else {
                    None
                };
                let default = if self.cursor.current_is(Assign) {
                    self.cursor.advance();
                    Some(self.parse_type_or_ternary()?)
                } else {
                    None
                };
                TemplateParamKind::Alias {
                    name,
                    specialization,
                    default,
                }
            }
            This => {
                self.cursor.advance();
                let name = self.expect_ident()?;
                TemplateParamKind::This { name }
            }
            Identifier if self.cursor.peek_is(Ellipsis) => {
                let name = self.cursor.advance().text;
                self.cursor.advance();
                TemplateParamKind::Tuple { name }
            }
            Identifier
                if matches!(
                    self.cursor.peek_kind(1),
                    Comma | RParen | Colon | Assign
                ) =>
            {
                let name = self.cursor.advance().text;
                let specialization = if self.cursor.current_is(Colon) {
                    self.cursor.advance();
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let default = if self.cursor.current_is(Assign) {
                    self.cursor.advance();
                    Some(self.parse_type()?)
                } else {
                    None
                };
                TemplateParamKind::Type {
                    name,
                    specialization,
                    default,
                }
            }
            _ => {
                let ty = self.parse_type()?;
                let name = self.expect_ident()?;
                let specialization = if self.cursor.current_is(Colon) {
                    self.cursor.advance();
                    // Ternary, not assign: `=` introduces the default.
                    Some(self.parse_ternary()?)
                } else {
                    None
                };
                let default = if self.cursor.current_is(Assign) {
                    self.cursor.advance();
                    Some(self.parse_assign_expr()?)
                } else {
                    None
                };
                TemplateParamKind::Value {
                    ty,
                    name,
                    specialization,
                    default,
                }
            }
        };
        Ok(TemplateParameter { kind, loc })
    }

    /// Alias template parameters admit either a type or an expression in
    /// specialization and default position; the `is_type` oracle decides.
    fn parse_type_or_ternary(&mut self) -> ParseResult<basalt_ir::TypeOrExpr> {
        if self.is_type() {
            Ok(basalt_ir::TypeOrExpr::Type(self.parse_type()?))
        } else {
            Ok(basalt_ir::TypeOrExpr::Expr(self.parse_ternary()?))
        }
    }

    // --- Parameters ---

    /// `( ParameterList? )`, including `...` variadics.
    pub(crate) fn parse_parameters(&mut self) -> ParseResult<ParamList> {
        use TokenKind::*;
        self.expect(LParen)?;
        let mut params = Vec::new();
        let mut varargs = false;
        while !self.cursor.current_is(RParen) && !self.cursor.is_at_end() {
            if self.cursor.current_is(Ellipsis) {
                self.cursor.advance();
                varargs = true;
                break;
            }
            params.push(self.parse_parameter()?);
            if self.cursor.current_is(Comma) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.expect(RParen)?;
        Ok(ParamList {
            params: params.into_boxed_slice(),
            varargs,
        })
    }

    fn parse_parameter(&mut self) -> ParseResult<Param> {
        use TokenKind::*;
        let loc = self.loc();
        let mut storage = Vec::new();
        loop {
            let kind = self.cursor.current_kind();
            let is_storage = matches!(
                kind,
                In | Out | Ref | Lazy | Scope | Final | Return | Auto
            ) || (kind.is_type_constructor() && !self.cursor.peek_is(LParen));
            if !is_storage {
                break;
            }
            storage.push(self.cursor.advance().kind);
        }
        // Untyped parameter (lambda shorthand): a lone identifier before
        // `,` / `)` / `=` / `...`.
        if self.cursor.current_is(Identifier)
            && matches!(
                self.cursor.peek_kind(1),
                Comma | RParen | Assign | Ellipsis
            )
        {
            let name = self.cursor.advance().text;
            let (default, vararg) = self.parse_parameter_tail()?;
            return Ok(Param {
                storage: storage.into_boxed_slice(),
                ty: None,
                name,
                default,
                vararg,
                loc,
            });
        }
        let ty = self.parse_type()?;
        let name = if self.cursor.current_is(Identifier) {
            self.cursor.advance().text
        } else {
            basalt_ir::Name::EMPTY
        };
        let (default, vararg) = self.parse_parameter_tail()?;
        Ok(Param {
            storage: storage.into_boxed_slice(),
            ty: Some(ty),
            name,
            default,
            vararg,
            loc,
        })
    }

    fn parse_parameter_tail(
        &mut self,
    ) -> ParseResult<(Option<basalt_ir::ExprId>, bool)> {
        use TokenKind::*;
        let mut vararg = false;
        if self.cursor.current_is(Ellipsis) {
            self.cursor.advance();
            vararg = true;
        }
        let default = if self.cursor.current_is(Assign) {
            self.cursor.advance();
            Some(self.parse_assign_expr()?)
        } else {
            None
        };
        Ok((default, vararg))
    }

    /// Zero or more member function attributes after a parameter list.
    pub(crate) fn parse_member_function_attrs(
        &mut self,
    ) -> ParseResult<Box<[MemberFunctionAttr]>> {
        use TokenKind::*;
        let mut attrs = Vec::new();
        loop {
            match self.cursor.current_kind() {
                Const | Immutable | Inout | Shared | Pure | Nothrow | Return | Scope => {
                    attrs.push(MemberFunctionAttr::Simple(self.cursor.advance().kind));
                }
                At => {
                    let at = self.parse_at_attribute()?;
                    attrs.push(MemberFunctionAttr::At(Box::new(at)));
                }
                _ => break,
            }
        }
        Ok(attrs.into_boxed_slice())
    }
}
