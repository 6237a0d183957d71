//! Declaration parsing.
//!
//! The flow: collect an attribute prefix (which may terminate as an
//! attribute declaration on `:`), then dispatch on the current token to
//! the declaration variants. The generic `Type name ...` tail branches
//! into function vs. variable.

use basalt_diagnostic::ErrorCode;
use basalt_ir::{
    AggregateDecl, AliasDecl, AliasInitializer, AnonEnumDecl, AtAttribute, AttrKind, Attribute,
    BodyKind, ConditionalDecl, ConstructorDecl, DeclId, DeclKind, Declarator,
    DestructorDecl, EnumDecl, EnumMember, EponymousTemplateDecl, ExprKind, FunctionBody,
    FunctionDecl, ImportBind, ImportBindings, ImportDecl, InContract, Initializer, InvariantDecl,
    MixinStringDecl, Name, OutContract, PostblitDecl, PragmaDecl, StaticCtorDecl,
    StaticForeachDecl, StructMemberInit, TemplateDecl, TemplateMixinDecl, TokenKind, TypeId,
    TypeKind, TypeSuffix, UnittestDecl, VarDecl,
};
use tracing::debug;

use super::stmt::CompileConditionStart;
use crate::{recovery, ParseFailed, ParseResult, Parser};

impl Parser<'_> {
    /// Parse one declaration. On failure the caller owns recovery.
    pub(crate) fn parse_declaration(&mut self) -> ParseResult<DeclId> {
        use TokenKind::*;
        self.check_speculation_fuse()?;
        // Claim the doc comment of the first token now; children parsed
        // below capture their own.
        self.capture_comment();
        let comment = self.take_comment();
        let loc = self.loc();

        let mut attrs = Vec::new();
        while self.is_attribute() {
            attrs.push(self.parse_attribute()?);
            // An attribute prefix terminated by `:` scopes the attribute
            // to the rest of the enclosing body.
            if self.cursor.current_is(Colon) {
                self.cursor.advance();
                let attribute = attrs.pop().unwrap_or(Attribute {
                    kind: AttrKind::Storage(Static),
                    loc,
                });
                return Ok(self.finish_decl(
                    DeclKind::AttributeDecl { attribute },
                    loc,
                    attrs,
                    comment,
                ));
            }
        }

        let kind = self.cursor.current_kind();
        debug!(?kind, "declaration dispatch");
        let decl_kind = match kind {
            Semicolon => {
                self.cursor.advance();
                DeclKind::Empty
            }
            Alias => self.parse_alias_decl()?,
            Class => DeclKind::Class(Box::new(self.parse_aggregate_decl(Class)?)),
            Interface => DeclKind::Interface(Box::new(self.parse_aggregate_decl(Interface)?)),
            Struct => DeclKind::Struct(Box::new(self.parse_aggregate_decl(Struct)?)),
            Union => DeclKind::Union(Box::new(self.parse_aggregate_decl(Union)?)),
            Enum => self.parse_enum_family(&mut attrs)?,
            This => self.parse_constructor_or_postblit()?,
            Tilde => self.parse_destructor()?,
            Import => self.parse_import_decl()?,
            Mixin => self.parse_mixin_family()?,
            Pragma => {
                let (name, args) = self.parse_pragma_head()?;
                self.expect(Semicolon)?;
                DeclKind::Pragma(Box::new(PragmaDecl { name, args }))
            }
            Shared if self.cursor.peek_is(Static) => {
                self.cursor.advance();
                self.parse_static_ctor_dtor(true)?
            }
            Static if matches!(self.cursor.peek_kind(1), This | Tilde) => {
                self.parse_static_ctor_dtor(false)?
            }
            Static if self.cursor.peek_is(If) => {
                self.cursor.advance();
                self.parse_conditional_decl(CompileConditionStart::StaticIf, comment)?
            }
            Static if matches!(self.cursor.peek_kind(1), Foreach | ForeachReverse) => {
                self.cursor.advance();
                self.parse_static_foreach_decl()?
            }
            Static if self.cursor.peek_is(Assert) => self.parse_static_assert_decl()?,
            Version if self.cursor.peek_is(LParen) => {
                self.parse_conditional_decl(CompileConditionStart::Version, comment)?
            }
            Version if self.cursor.peek_is(Assign) => {
                self.cursor.advance();
                self.cursor.advance();
                let target = self.parse_version_target()?;
                self.expect(Semicolon)?;
                DeclKind::VersionSpec { target }
            }
            Debug if self.cursor.peek_is(Assign) => {
                self.cursor.advance();
                self.cursor.advance();
                let target = self.parse_version_target()?;
                self.expect(Semicolon)?;
                DeclKind::DebugSpec { target }
            }
            Debug => self.parse_conditional_decl(CompileConditionStart::Debug, comment)?,
            Template => DeclKind::Template(Box::new(self.parse_template_decl()?)),
            Invariant => self.parse_invariant_decl()?,
            Unittest => self.parse_unittest_decl()?,
            LBrace if !attrs.is_empty() => {
                // Attribute block: `private { ... }`.
                let decls = self.parse_decl_block()?;
                DeclKind::Attributed {
                    decls: decls.into_boxed_slice(),
                }
            }
            Identifier if !attrs.is_empty() && self.cursor.peek_is(Assign) => {
                // Storage-class-typed variable: `auto x = ...;`
                self.parse_variable_rest(None)?
            }
            Identifier if !attrs.is_empty() && self.cursor.peek_is(LParen) => {
                // Storage-class-typed function: `auto f() { ... }`
                self.parse_function_rest(None)?
            }
            _ => {
                let ty = self.parse_type()?;
                self.parse_typed_tail(ty)?
            }
        };
        Ok(self.finish_decl(decl_kind, loc, attrs, comment))
    }

    /// After a parsed type: function or variable declaration. A `(`
    /// after the name whose balanced region is followed by `=` selects
    /// the legacy variable path.
    fn parse_typed_tail(&mut self, ty: TypeId) -> ParseResult<DeclKind> {
        use TokenKind::*;
        if !self.cursor.current_is(Identifier) {
            return Err(self.error(
                ErrorCode::E1002,
                format!(
                    "expected identifier after type, found {}",
                    self.cursor.current_kind().display_name()
                ),
            ));
        }
        if self.cursor.peek_is(LParen) {
            let past = self.look_ahead(|p| {
                p.cursor.advance();
                p.cursor.peek_past_parens().map(|t| t.kind)
            });
            if past != Some(Assign) {
                return self.parse_function_rest(Some(ty));
            }
        }
        self.parse_variable_rest(Some(ty))
    }

    // --- Attributes ---

    pub(crate) fn parse_attribute(&mut self) -> ParseResult<Attribute> {
        use TokenKind::*;
        let loc = self.loc();
        let kind = self.cursor.current_kind();
        let attr_kind = if kind.is_protection() {
            self.cursor.advance();
            AttrKind::Protection(kind)
        } else {
            match kind {
                At => AttrKind::At(Box::new(self.parse_at_attribute()?)),
                Extern => self.parse_linkage_attribute()?,
                Align => {
                    self.cursor.advance();
                    let value = if self.cursor.current_is(LParen) {
                        self.cursor.advance();
                        let value = self.parse_assign_expr()?;
                        self.expect(RParen)?;
                        Some(value)
                    } else {
                        None
                    };
                    AttrKind::Align { value }
                }
                Deprecated => {
                    self.cursor.advance();
                    let message = if self.cursor.current_is(LParen) {
                        self.cursor.advance();
                        let message = self.parse_assign_expr()?;
                        self.expect(RParen)?;
                        Some(message)
                    } else {
                        None
                    };
                    AttrKind::Deprecated { message }
                }
                Pragma => {
                    let (name, args) = self.parse_pragma_head()?;
                    AttrKind::Pragma { name, args }
                }
                _ => {
                    self.cursor.advance();
                    AttrKind::Storage(kind)
                }
            }
        };
        Ok(Attribute {
            kind: attr_kind,
            loc,
        })
    }

    /// `@name`, `@name(args)`, `@(args)`, or `@` with a bare unary
    /// expression (covers `@Template!Args`).
    pub(crate) fn parse_at_attribute(&mut self) -> ParseResult<AtAttribute> {
        use TokenKind::*;
        self.expect(At)?;
        if self.cursor.current_is(Identifier) && !self.cursor.peek_is(Bang) {
            let name = self.cursor.advance().text;
            let args = if self.cursor.current_is(LParen) {
                Some(self.parse_arguments()?)
            } else {
                None
            };
            return Ok(AtAttribute {
                name,
                args,
                expr: None,
            });
        }
        if self.cursor.current_is(LParen) {
            let args = self.parse_arguments()?;
            return Ok(AtAttribute {
                name: Name::EMPTY,
                args: Some(args),
                expr: None,
            });
        }
        let expr = self.parse_unary()?;
        Ok(AtAttribute {
            name: Name::EMPTY,
            args: None,
            expr: Some(expr),
        })
    }

    fn parse_linkage_attribute(&mut self) -> ParseResult<AttrKind> {
        use TokenKind::*;
        self.expect(Extern)?;
        if !self.cursor.current_is(LParen) {
            return Ok(AttrKind::Storage(Extern));
        }
        self.cursor.advance();
        let name = self.expect_ident()?;
        let plus_plus = if self.cursor.current_is(PlusPlus) {
            self.cursor.advance();
            true
        } else {
            false
        };
        let mut namespaces = Vec::new();
        if self.cursor.current_is(Comma) {
            self.cursor.advance();
            namespaces.push(self.expect_ident()?);
            while self.cursor.current_is(Dot) {
                self.cursor.advance();
                namespaces.push(self.expect_ident()?);
            }
        }
        self.expect(RParen)?;
        Ok(AttrKind::Linkage {
            name,
            plus_plus,
            namespaces: namespaces.into_boxed_slice(),
        })
    }

    fn parse_pragma_head(&mut self) -> ParseResult<(Name, Box<[basalt_ir::ExprId]>)> {
        use TokenKind::*;
        self.expect(Pragma)?;
        self.expect(LParen)?;
        let name = self.expect_ident()?;
        let mut args = Vec::new();
        while self.cursor.current_is(Comma) {
            self.cursor.advance();
            if self.cursor.current_is(RParen) {
                break;
            }
            args.push(self.parse_assign_expr()?);
        }
        self.expect(RParen)?;
        Ok((name, args.into_boxed_slice()))
    }

    // --- Alias ---

    /// `alias ident = ...` / `alias ident(` start the new-style
    /// initializer list; `alias ident this;` rebinds `this`; anything
    /// else is the old-style form.
    fn parse_alias_decl(&mut self) -> ParseResult<DeclKind> {
        use TokenKind::*;
        self.expect(Alias)?;
        if self.cursor.current_is(Identifier) && self.cursor.peek_is(This) {
            let name = self.cursor.advance().text;
            self.cursor.advance();
            self.expect(Semicolon)?;
            return Ok(DeclKind::AliasThis { name });
        }
        if self.cursor.current_is(Identifier)
            && matches!(self.cursor.peek_kind(1), Assign | LParen)
        {
            let mut initializers = vec![self.parse_alias_initializer()?];
            while self.cursor.current_is(Comma) {
                self.cursor.advance();
                initializers.push(self.parse_alias_initializer()?);
            }
            self.expect(Semicolon)?;
            return Ok(DeclKind::Alias(Box::new(AliasDecl {
                initializers: initializers.into_boxed_slice(),
                storage: Box::default(),
                ty: None,
                names: Box::default(),
            })));
        }
        // Old style: `alias storage* Type name (, name)* ;`
        let mut storage = Vec::new();
        while self.is_storage_class() {
            storage.push(self.cursor.advance().kind);
        }
        let ty = self.parse_type()?;
        let mut names = vec![self.expect_ident()?];
        // Legacy function-alias tolerance: `alias int f() @attr;` is
        // accepted with a warning by discarding up to the semicolon.
        if self.cursor.current_is(LParen) {
            const ALIAS_SYNC: recovery::TokenSet = recovery::TokenSet::new()
                .with(TokenKind::Semicolon)
                .with(TokenKind::RBrace);
            let token = self.cursor.current();
            self.warn_at(
                ErrorCode::W1004,
                "legacy alias function syntax; use `alias f = ...` instead",
                token,
            );
            recovery::synchronize(&mut self.cursor, ALIAS_SYNC);
        } else {
            while self.cursor.current_is(Comma) {
                self.cursor.advance();
                names.push(self.expect_ident()?);
            }
        }
        self.expect(Semicolon)?;
        Ok(DeclKind::Alias(Box::new(AliasDecl {
            initializers: Box::default(),
            storage: storage.into_boxed_slice(),
            ty: Some(ty),
            names: names.into_boxed_slice(),
        })))
    }

    /// `name (TemplateParameters)? = storage* Type`
    fn parse_alias_initializer(&mut self) -> ParseResult<AliasInitializer> {
        use TokenKind::*;
        let loc = self.loc();
        let name = self.expect_ident()?;
        let template_params = if self.cursor.current_is(LParen) {
            Some(self.parse_template_parameters()?)
        } else {
            None
        };
        self.expect(Assign)?;
        let mut storage = Vec::new();
        while self.is_storage_class() {
            storage.push(self.cursor.advance().kind);
        }
        let ty = self.parse_type()?;
        Ok(AliasInitializer {
            name,
            template_params,
            storage: storage.into_boxed_slice(),
            ty,
            loc,
        })
    }

    // --- Aggregates ---

    fn parse_aggregate_decl(&mut self, keyword: TokenKind) -> ParseResult<AggregateDecl> {
        use TokenKind::*;
        self.expect(keyword)?;
        // Anonymous structs and unions have no name.
        let name = if self.cursor.current_is(Identifier) {
            self.cursor.advance().text
        } else {
            Name::EMPTY
        };
        let template_params = if self.cursor.current_is(LParen) {
            Some(self.parse_template_parameters()?)
        } else {
            None
        };
        let mut constraint = None;
        if self.cursor.current_is(If) {
            constraint = Some(self.parse_constraint()?);
        }
        let base_classes = if self.cursor.current_is(Colon) {
            self.cursor.advance();
            self.parse_base_classes()?
        } else {
            Box::default()
        };
        // A constraint may also follow the base class list.
        if constraint.is_none() && self.cursor.current_is(If) {
            constraint = Some(self.parse_constraint()?);
        }
        let members = if self.cursor.current_is(Semicolon) {
            self.cursor.advance();
            None
        } else {
            Some(self.parse_decl_block()?.into_boxed_slice())
        };
        Ok(AggregateDecl {
            name,
            template_params,
            constraint,
            base_classes,
            members,
        })
    }

    /// Base class list; a leading protection attribute is deprecated and
    /// dropped with a warning.
    fn parse_base_classes(&mut self) -> ParseResult<Box<[TypeId]>> {
        use TokenKind::*;
        let mut bases = Vec::new();
        loop {
            if self.cursor.current_kind().is_protection() {
                let token = self.cursor.current();
                self.warn_at(
                    ErrorCode::W1002,
                    "protection attribute on a base class is ignored",
                    token,
                );
                self.cursor.advance();
            }
            bases.push(self.parse_type()?);
            if self.cursor.current_is(Comma) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        Ok(bases.into_boxed_slice())
    }

    fn parse_constraint(&mut self) -> ParseResult<basalt_ir::ExprId> {
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let constraint = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        Ok(constraint)
    }

    /// `{ Declaration* }`, with per-declaration recovery.
    pub(crate) fn parse_decl_block(&mut self) -> ParseResult<Vec<DeclId>> {
        use TokenKind::*;
        self.expect(LBrace)?;
        let mut decls = Vec::new();
        while !self.cursor.current_is(RBrace) && !self.cursor.is_at_end() {
            match self.parse_declaration() {
                Ok(decl) => decls.push(decl),
                Err(ParseFailed) => self.recover_in_decl_list(),
            }
        }
        self.expect(RBrace)?;
        Ok(decls)
    }

    /// Skip the offending declaration and resynchronize, guaranteeing
    /// progress.
    pub(crate) fn recover_in_decl_list(&mut self) {
        let before = self.cursor.position();
        recovery::synchronize(&mut self.cursor, recovery::DECL_BOUNDARY);
        if self.cursor.current_is(TokenKind::Semicolon) {
            self.cursor.advance();
        } else if self.cursor.position() == before && !self.cursor.is_at_end() {
            self.cursor.advance();
        }
    }

    // --- Enums ---

    /// After `enum`, the next tokens select among: anonymous enum, named
    /// enum, eponymous template, or an enum-storage variable/function.
    fn parse_enum_family(&mut self, attrs: &mut Vec<Attribute>) -> ParseResult<DeclKind> {
        use TokenKind::*;
        let enum_loc = self.loc();
        self.expect(Enum)?;
        match self.cursor.current_kind() {
            Colon | LBrace => {
                let base_type = if self.cursor.current_is(Colon) {
                    self.cursor.advance();
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let members = self.parse_enum_body()?;
                Ok(DeclKind::AnonEnum(Box::new(AnonEnumDecl {
                    base_type,
                    members,
                })))
            }
            Identifier => match self.cursor.peek_kind(1) {
                LParen => {
                    let name = self.cursor.advance().text;
                    let template_params = self.parse_template_parameters()?;
                    self.expect(Assign)?;
                    let value = Some(self.parse_assign_expr()?);
                    self.expect(Semicolon)?;
                    Ok(DeclKind::EponymousTemplate(Box::new(
                        EponymousTemplateDecl {
                            name,
                            template_params,
                            value,
                            ty: None,
                        },
                    )))
                }
                Colon | LBrace | Semicolon => {
                    let name = self.cursor.advance().text;
                    let base_type = if self.cursor.current_is(Colon) {
                        self.cursor.advance();
                        Some(self.parse_type()?)
                    } else {
                        None
                    };
                    if self.cursor.current_is(Semicolon) {
                        self.cursor.advance();
                        return Ok(DeclKind::Enum(Box::new(EnumDecl {
                            name,
                            base_type,
                            members: Box::default(),
                            has_body: false,
                        })));
                    }
                    let members = self.parse_enum_body()?;
                    Ok(DeclKind::Enum(Box::new(EnumDecl {
                        name,
                        base_type,
                        members,
                        has_body: true,
                    })))
                }
                // `enum x = 3;` and `enum int x = 3;` are manifest
                // constants: `enum` becomes a storage attribute.
                _ => {
                    attrs.push(Attribute {
                        kind: AttrKind::Storage(Enum),
                        loc: enum_loc,
                    });
                    if self.cursor.peek_is(Assign) {
                        self.parse_variable_rest(None)
                    } else {
                        let ty = self.parse_type()?;
                        self.parse_typed_tail(ty)
                    }
                }
            },
            _ => {
                attrs.push(Attribute {
                    kind: AttrKind::Storage(Enum),
                    loc: enum_loc,
                });
                let ty = self.parse_type()?;
                self.parse_typed_tail(ty)
            }
        }
    }

    /// `{ EnumMember (, EnumMember)* ,? }` — each member claims the doc
    /// comment of its own first token.
    fn parse_enum_body(&mut self) -> ParseResult<Box<[EnumMember]>> {
        use TokenKind::*;
        self.expect(LBrace)?;
        let mut members = Vec::new();
        while !self.cursor.current_is(RBrace) && !self.cursor.is_at_end() {
            let loc = self.loc();
            let comment = self.cursor.current().comment;
            let (ty, name) = if self.cursor.current_is(Identifier) {
                (None, self.cursor.advance().text)
            } else {
                let ty = self.parse_type()?;
                (Some(ty), self.expect_ident()?)
            };
            let value = if self.cursor.current_is(Assign) {
                self.cursor.advance();
                Some(self.parse_assign_expr()?)
            } else {
                None
            };
            members.push(EnumMember {
                name,
                ty,
                value,
                comment,
                loc,
            });
            if self.cursor.current_is(Comma) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.expect(RBrace)?;
        Ok(members.into_boxed_slice())
    }

    // --- Constructors, destructors, postblits ---

    /// `this(this)` is a postblit; otherwise a constructor, possibly
    /// templated (detected by a second `(` after the first group).
    fn parse_constructor_or_postblit(&mut self) -> ParseResult<DeclKind> {
        use TokenKind::*;
        self.expect(This)?;
        if self.cursor.current_is(LParen)
            && self.cursor.peek_is(This)
            && self.cursor.peek_kind(2) == RParen
        {
            self.cursor.advance();
            self.cursor.advance();
            self.cursor.advance();
            let member_attrs = self.parse_member_function_attrs()?;
            let body = self.parse_function_body()?;
            return Ok(DeclKind::Postblit(Box::new(PostblitDecl {
                member_attrs,
                body,
            })));
        }
        let templated = self.cursor.peek_past_parens().map(|t| t.kind) == Some(LParen);
        let template_params = if templated {
            Some(self.parse_template_parameters()?)
        } else {
            None
        };
        let params = self.parse_parameters()?;
        let member_attrs = self.parse_member_function_attrs()?;
        let constraint = if self.cursor.current_is(If) {
            Some(self.parse_constraint()?)
        } else {
            None
        };
        let body = self.parse_function_body()?;
        Ok(DeclKind::Constructor(Box::new(ConstructorDecl {
            template_params,
            params,
            member_attrs,
            constraint,
            body,
        })))
    }

    fn parse_destructor(&mut self) -> ParseResult<DeclKind> {
        use TokenKind::*;
        self.expect(Tilde)?;
        self.expect(This)?;
        self.expect(LParen)?;
        self.expect(RParen)?;
        let member_attrs = self.parse_member_function_attrs()?;
        let body = self.parse_function_body()?;
        Ok(DeclKind::Destructor(Box::new(DestructorDecl {
            member_attrs,
            body,
        })))
    }

    /// `static this()` / `static ~this()`; `is_shared` when the `shared`
    /// prefix was consumed by the caller.
    fn parse_static_ctor_dtor(&mut self, is_shared: bool) -> ParseResult<DeclKind> {
        use TokenKind::*;
        self.expect(Static)?;
        let is_destructor = if self.cursor.current_is(Tilde) {
            self.cursor.advance();
            true
        } else {
            false
        };
        self.expect(This)?;
        self.expect(LParen)?;
        self.expect(RParen)?;
        let member_attrs = self.parse_member_function_attrs()?;
        let body = self.parse_function_body()?;
        Ok(DeclKind::StaticConstructor(Box::new(StaticCtorDecl {
            is_shared,
            is_destructor,
            member_attrs,
            body,
        })))
    }

    // --- Functions and variables ---

    /// Function declaration after its (optional) return type, starting
    /// at the name.
    fn parse_function_rest(&mut self, return_type: Option<TypeId>) -> ParseResult<DeclKind> {
        use TokenKind::*;
        let name = self.expect_ident()?;
        let templated = self.cursor.current_is(LParen)
            && self.cursor.peek_past_parens().map(|t| t.kind) == Some(LParen);
        let template_params = if templated {
            Some(self.parse_template_parameters()?)
        } else {
            None
        };
        let params = self.parse_parameters()?;
        let member_attrs = self.parse_member_function_attrs()?;
        let constraint = if self.cursor.current_is(If) {
            Some(self.parse_constraint()?)
        } else {
            None
        };
        let body = self.parse_function_body()?;
        Ok(DeclKind::Function(Box::new(FunctionDecl {
            return_type,
            name,
            template_params,
            params,
            member_attrs,
            constraint,
            body,
        })))
    }

    /// Declarator list of a variable declaration, starting at the first
    /// name. `ty` is `None` for storage-class-typed declarations.
    fn parse_variable_rest(&mut self, ty: Option<TypeId>) -> ParseResult<DeclKind> {
        use TokenKind::*;
        let mut declarators = Vec::new();
        loop {
            let loc = self.loc();
            let comment = self.cursor.current().comment;
            let name = self.expect_ident()?;
            let mut c_style = Vec::new();
            while self.cursor.current_is(LBracket) {
                let token = self.cursor.current();
                self.warn_at(
                    ErrorCode::W1003,
                    "C-style array declarator; write the brackets on the type",
                    token,
                );
                self.cursor.advance();
                if self.cursor.current_is(RBracket) {
                    self.cursor.advance();
                    c_style.push(TypeSuffix::Array {
                        ty: None,
                        low: None,
                        high: None,
                    });
                } else {
                    let dim = self.parse_assign_expr()?;
                    self.expect(RBracket)?;
                    c_style.push(TypeSuffix::Array {
                        ty: None,
                        low: Some(dim),
                        high: None,
                    });
                }
            }
            // Legacy `name(...) = init` tolerance from the typed tail.
            if self.cursor.current_is(LParen) {
                self.cursor.skip_parens();
            }
            let initializer = if self.cursor.current_is(Assign) {
                self.cursor.advance();
                Some(self.parse_initializer()?)
            } else {
                None
            };
            declarators.push(Declarator {
                name,
                c_style_suffixes: c_style.into_boxed_slice(),
                initializer,
                comment,
                loc,
            });
            if self.cursor.current_is(Comma) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.expect(Semicolon)?;
        Ok(DeclKind::Variable(Box::new(VarDecl {
            ty,
            declarators: declarators.into_boxed_slice(),
        })))
    }

    /// `void`, an expression, or a struct initializer. A brace opens a
    /// struct initializer only when the balanced region is followed by
    /// `;`, `,`, or `}` — otherwise it is a function-literal expression.
    fn parse_initializer(&mut self) -> ParseResult<Initializer> {
        use TokenKind::*;
        if self.cursor.current_is(Void)
            && matches!(self.cursor.peek_kind(1), Semicolon | Comma)
        {
            self.cursor.advance();
            return Ok(Initializer::Void);
        }
        if self.cursor.current_is(LBrace) {
            let past = self.cursor.peek_past_braces().map(|t| t.kind);
            if matches!(past, Some(Semicolon | Comma | RBrace)) {
                return self.parse_struct_initializer();
            }
        }
        Ok(Initializer::Expr(self.parse_assign_expr()?))
    }

    fn parse_struct_initializer(&mut self) -> ParseResult<Initializer> {
        use TokenKind::*;
        self.expect(LBrace)?;
        let mut members = Vec::new();
        while !self.cursor.current_is(RBrace) && !self.cursor.is_at_end() {
            let field = if self.cursor.current_is(Identifier) && self.cursor.peek_is(Colon) {
                let field = self.cursor.advance().text;
                self.cursor.advance();
                field
            } else {
                Name::EMPTY
            };
            let value = self.parse_initializer()?;
            members.push(StructMemberInit {
                field,
                value: Box::new(value),
            });
            if self.cursor.current_is(Comma) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.expect(RBrace)?;
        Ok(Initializer::Struct(members.into_boxed_slice()))
    }

    // --- Function bodies and contracts ---

    /// `;`, `{ ... }`, `=> expr ;`, or a contract sequence introduced by
    /// `in` / `out` and closed by `do` (or the legacy `body`) and a
    /// block. In the default memory-minimizing mode the block's
    /// statements are parsed for diagnostics, then dropped; only
    /// `had_body` survives.
    pub(crate) fn parse_function_body(&mut self) -> ParseResult<FunctionBody> {
        use TokenKind::*;
        match self.cursor.current_kind() {
            Semicolon => {
                self.cursor.advance();
                Ok(FunctionBody::none())
            }
            GoesTo => {
                self.cursor.advance();
                let value = self.parse_assign_expr()?;
                self.expect(Semicolon)?;
                Ok(FunctionBody {
                    kind: BodyKind::Shorthand { value },
                    in_contracts: Box::default(),
                    out_contract: None,
                    had_body: true,
                })
            }
            LBrace => {
                let stmts = self.parse_body_block()?;
                Ok(FunctionBody {
                    kind: BodyKind::Block { stmts },
                    in_contracts: Box::default(),
                    out_contract: None,
                    had_body: true,
                })
            }
            In | Out => self.parse_contract_body(),
            found => Err(self.error(
                ErrorCode::E1002,
                format!("expected function body, found {}", found.display_name()),
            )),
        }
    }

    /// Parse a `{ ... }` body; returns `None` when minimized away.
    fn parse_body_block(&mut self) -> ParseResult<Option<basalt_ir::StmtId>> {
        let block = self.parse_block_statement()?;
        if self.retain_bodies {
            Ok(Some(block))
        } else {
            self.arena.release(block);
            Ok(None)
        }
    }

    fn parse_contract_body(&mut self) -> ParseResult<FunctionBody> {
        use TokenKind::*;
        let mut in_contracts = Vec::new();
        let mut out_contract = None;
        loop {
            match self.cursor.current_kind() {
                In => {
                    self.cursor.advance();
                    if self.cursor.current_is(LParen) {
                        self.cursor.advance();
                        let expr = self.parse_assign_expr()?;
                        // `in (expr, "message")` keeps only the condition.
                        if self.cursor.current_is(Comma) {
                            self.cursor.advance();
                            if !self.cursor.current_is(RParen) {
                                self.parse_assign_expr()?;
                            }
                        }
                        self.expect(RParen)?;
                        in_contracts.push(InContract {
                            expr: Some(expr),
                            block: None,
                        });
                    } else {
                        let block = self.parse_block_statement()?;
                        in_contracts.push(InContract {
                            expr: None,
                            block: Some(block),
                        });
                    }
                }
                Out if out_contract.is_none() => {
                    self.cursor.advance();
                    let mut ident = Name::EMPTY;
                    let mut expr = None;
                    if self.cursor.current_is(LParen) {
                        self.cursor.advance();
                        if self.cursor.current_is(Identifier) {
                            ident = self.cursor.advance().text;
                        }
                        if self.cursor.current_is(Semicolon) {
                            self.cursor.advance();
                            expr = Some(self.parse_assign_expr()?);
                            self.expect(RParen)?;
                            out_contract = Some(OutContract {
                                ident,
                                expr,
                                block: None,
                            });
                            continue;
                        }
                        self.expect(RParen)?;
                    }
                    let block = self.parse_block_statement()?;
                    out_contract = Some(OutContract {
                        ident,
                        expr,
                        block: Some(block),
                    });
                }
                _ => break,
            }
        }
        // The actual body is introduced by `do` or the legacy `body`.
        let (kind, had_body) = match self.cursor.current_kind() {
            Do | Body => {
                self.cursor.advance();
                let stmts = self.parse_body_block()?;
                (BodyKind::Block { stmts }, true)
            }
            Semicolon => {
                self.cursor.advance();
                (BodyKind::None, false)
            }
            found => {
                return Err(self.error(
                    ErrorCode::E1002,
                    format!(
                        "expected `do` or `body` after contracts, found {}",
                        found.display_name()
                    ),
                ))
            }
        };
        Ok(FunctionBody {
            kind,
            in_contracts: in_contracts.into_boxed_slice(),
            out_contract,
            had_body,
        })
    }

    // --- Imports ---

    fn parse_import_decl(&mut self) -> ParseResult<DeclKind> {
        use TokenKind::*;
        self.expect(Import)?;
        let mut imports = Vec::new();
        let mut bindings = None;
        loop {
            let import = self.parse_single_import()?;
            if self.cursor.current_is(Colon) {
                self.cursor.advance();
                let mut binds = vec![self.parse_import_bind()?];
                while self.cursor.current_is(Comma) {
                    self.cursor.advance();
                    binds.push(self.parse_import_bind()?);
                }
                bindings = Some(ImportBindings {
                    import,
                    binds: binds.into_boxed_slice(),
                });
                break;
            }
            imports.push(import);
            if self.cursor.current_is(Comma) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.expect(Semicolon)?;
        Ok(DeclKind::Import(Box::new(ImportDecl {
            imports: imports.into_boxed_slice(),
            bindings,
        })))
    }

    fn parse_single_import(&mut self) -> ParseResult<basalt_ir::SingleImport> {
        use TokenKind::*;
        let loc = self.loc();
        let rename = if self.cursor.current_is(Identifier) && self.cursor.peek_is(Assign) {
            let rename = self.cursor.advance().text;
            self.cursor.advance();
            rename
        } else {
            Name::EMPTY
        };
        let mut chain = vec![self.expect_ident()?];
        while self.cursor.current_is(Dot) {
            self.cursor.advance();
            chain.push(self.expect_ident()?);
        }
        Ok(basalt_ir::SingleImport {
            rename,
            chain: chain.into_boxed_slice(),
            loc,
        })
    }

    fn parse_import_bind(&mut self) -> ParseResult<ImportBind> {
        use TokenKind::*;
        let first = self.expect_ident()?;
        if self.cursor.current_is(Assign) {
            self.cursor.advance();
            let name = self.expect_ident()?;
            return Ok(ImportBind {
                name,
                rename: first,
            });
        }
        Ok(ImportBind {
            name: first,
            rename: Name::EMPTY,
        })
    }

    // --- Mixins ---

    fn parse_mixin_family(&mut self) -> ParseResult<DeclKind> {
        use TokenKind::*;
        self.expect(Mixin)?;
        match self.cursor.current_kind() {
            LParen => {
                self.cursor.advance();
                let operand = self.parse_expression()?;
                self.expect(RParen)?;
                self.expect(Semicolon)?;
                let trivial = self.reparse_token_string(operand);
                Ok(DeclKind::MixinString(Box::new(MixinStringDecl {
                    operand,
                    trivial_declarations: trivial.into_boxed_slice(),
                })))
            }
            Template => {
                let template = self.parse_template_decl_after_keyword()?;
                Ok(DeclKind::MixinTemplate(Box::new(template)))
            }
            _ => {
                // `mixin a.b.Tmpl!(args) name? ;`
                let loc = self.loc();
                let parts = self.parse_symbol_parts()?;
                let ty = self.alloc_type(basalt_ir::Type {
                    ctors: Box::default(),
                    kind: TypeKind::Symbol {
                        leading_dot: false,
                        parts,
                    },
                    suffixes: Box::default(),
                    loc,
                });
                let name = if self.cursor.current_is(Identifier) {
                    self.cursor.advance().text
                } else {
                    Name::EMPTY
                };
                self.expect(Semicolon)?;
                Ok(DeclKind::TemplateMixin(Box::new(TemplateMixinDecl {
                    ty,
                    name,
                })))
            }
        }
    }

    /// When the mixed-in operand is a token-string literal (`q{ ... }`)
    /// and a token source is configured, re-tokenize the inner text with
    /// the literal's line offset and parse it as a sub-module.
    fn reparse_token_string(&mut self, operand: basalt_ir::ExprId) -> Vec<DeclId> {
        let Some(source) = self.token_source else {
            return Vec::new();
        };
        let expr = self.arena.get(operand);
        let ExprKind::StringLit { text, .. } = expr.kind else {
            return Vec::new();
        };
        let literal_line = expr.loc.line;
        let raw = self.text(text);
        let Some(inner) = raw.strip_prefix("q{").and_then(|r| r.strip_suffix('}')) else {
            return Vec::new();
        };
        let tokens = source.tokenize(inner, literal_line.saturating_sub(1));
        let saved = std::mem::replace(&mut self.cursor, crate::cursor::Cursor::new(tokens));
        let mut decls = Vec::new();
        while !self.cursor.is_at_end() {
            match self.parse_declaration() {
                Ok(decl) => decls.push(decl),
                Err(ParseFailed) => self.recover_in_decl_list(),
            }
        }
        self.cursor = saved;
        decls
    }

    // --- Conditional compilation ---

    /// Both branches are recorded structurally; the condition is never
    /// evaluated. The construct's own doc comment is copied onto every
    /// declaration of the true branch as a supplemental comment.
    fn parse_conditional_decl(
        &mut self,
        start: CompileConditionStart,
        construct_comment: Name,
    ) -> ParseResult<DeclKind> {
        use TokenKind::*;
        let condition = self.parse_compile_condition(start)?;

        let saved = self.supplemental;
        if construct_comment.is_some() {
            self.supplemental = construct_comment;
        }
        let true_decls = self.parse_conditional_branch()?;
        self.supplemental = saved;

        let false_decls = if self.cursor.current_is(Else) {
            self.cursor.advance();
            self.parse_conditional_branch()?
        } else {
            Vec::new()
        };
        Ok(DeclKind::Conditional(Box::new(ConditionalDecl {
            condition,
            true_decls: true_decls.into_boxed_slice(),
            false_decls: false_decls.into_boxed_slice(),
        })))
    }

    /// `{ decls }`, `: decls-to-end-of-scope`, or a single declaration.
    fn parse_conditional_branch(&mut self) -> ParseResult<Vec<DeclId>> {
        use TokenKind::*;
        match self.cursor.current_kind() {
            LBrace => self.parse_decl_block(),
            Colon => {
                self.cursor.advance();
                let mut decls = Vec::new();
                while !self.cursor.current_is(RBrace) && !self.cursor.is_at_end() {
                    match self.parse_declaration() {
                        Ok(decl) => decls.push(decl),
                        Err(ParseFailed) => self.recover_in_decl_list(),
                    }
                }
                Ok(decls)
            }
            _ => Ok(vec![self.parse_declaration()?]),
        }
    }

    fn parse_static_assert_decl(&mut self) -> ParseResult<DeclKind> {
        use TokenKind::*;
        self.expect(Static)?;
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
        self.expect(Semicolon)?;
        Ok(DeclKind::StaticAssert { condition, message })
    }

    /// `static foreach (...) { decls }` — the leading `static` has been
    /// consumed by the dispatcher.
    fn parse_static_foreach_decl(&mut self) -> ParseResult<DeclKind> {
        let (reverse, vars, low, high) = self.parse_foreach_header()?;
        let decls = self.parse_conditional_branch()?;
        Ok(DeclKind::StaticForeach(Box::new(StaticForeachDecl {
            reverse,
            vars,
            low,
            high,
            decls: decls.into_boxed_slice(),
        })))
    }

    // --- Templates, invariants, unittests ---

    fn parse_template_decl(&mut self) -> ParseResult<TemplateDecl> {
        self.expect(TokenKind::Template)?;
        self.parse_template_decl_after_keyword()
    }

    /// Shared by `template` and `mixin template`; assumes the caller
    /// consumed everything up to (and including, for the mixin form, the
    /// `mixin` keyword before) `template`.
    fn parse_template_decl_after_keyword(&mut self) -> ParseResult<TemplateDecl> {
        use TokenKind::*;
        if self.cursor.current_is(Template) {
            self.cursor.advance();
        }
        let name = self.expect_ident()?;
        let template_params = self.parse_template_parameters()?;
        let constraint = if self.cursor.current_is(If) {
            Some(self.parse_constraint()?)
        } else {
            None
        };
        let decls = self.parse_decl_block()?;
        Ok(TemplateDecl {
            name,
            template_params,
            constraint,
            decls: decls.into_boxed_slice(),
        })
    }

    fn parse_invariant_decl(&mut self) -> ParseResult<DeclKind> {
        use TokenKind::*;
        self.expect(Invariant)?;
        if self.cursor.current_is(LParen) {
            self.cursor.advance();
            if self.cursor.current_is(RParen) {
                // `invariant () { ... }` classic form.
                self.cursor.advance();
                let block = self.parse_block_statement()?;
                return Ok(DeclKind::Invariant(Box::new(InvariantDecl {
                    expr: None,
                    block: Some(block),
                })));
            }
            let expr = self.parse_assign_expr()?;
            self.expect(RParen)?;
            self.expect(Semicolon)?;
            return Ok(DeclKind::Invariant(Box::new(InvariantDecl {
                expr: Some(expr),
                block: None,
            })));
        }
        let block = self.parse_block_statement()?;
        Ok(DeclKind::Invariant(Box::new(InvariantDecl {
            expr: None,
            block: Some(block),
        })))
    }

    fn parse_unittest_decl(&mut self) -> ParseResult<DeclKind> {
        self.expect(TokenKind::Unittest)?;
        let block = self.parse_block_statement()?;
        let (block, had_body) = if self.retain_bodies {
            (Some(block), true)
        } else {
            self.arena.release(block);
            (None, true)
        };
        Ok(DeclKind::Unittest(Box::new(UnittestDecl {
            block,
            had_body,
        })))
    }
}
