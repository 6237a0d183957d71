//! Statement parsing.
//!
//! `parse_statement` handles `case`/`default` labels; everything else
//! goes through `parse_statement_no_case_no_default`. The declaration vs.
//! statement ambiguity is resolved by the `is_declaration` oracle.

use basalt_diagnostic::ErrorCode;
use basalt_ir::{
    CatchClause, CompileCondition, ConditionalStmt, ForStmt, ForeachStmt, ForeachVar, GotoTarget,
    IfCondition, IfStmt, Loc, Name, ScopeGuardKind, Stmt, StmtId, StmtKind, TokenKind, TryStmt,
    TypeOrExpr, VersionTarget,
};

use crate::{recovery, ParseFailed, ParseResult, Parser};

impl Parser<'_> {
    pub(crate) fn alloc_stmt(&mut self, kind: StmtKind, loc: Loc) -> StmtId {
        self.arena.alloc(Stmt { kind, loc })
    }

    pub(crate) fn parse_statement(&mut self) -> ParseResult<StmtId> {
        use TokenKind::*;
        self.check_speculation_fuse()?;
        match self.cursor.current_kind() {
            Case => self.parse_case_statement(),
            Default => self.parse_default_statement(),
            _ => self.parse_statement_no_case_no_default(),
        }
    }

    fn parse_case_statement(&mut self) -> ParseResult<StmtId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(Case)?;
        let first = self.parse_assign_expr()?;
        // `case low: .. case high:` range form.
        if self.cursor.current_is(Colon) && self.cursor.peek_is(DotDot) {
            self.cursor.advance();
            self.cursor.advance();
            self.expect(Case)?;
            let high = self.parse_assign_expr()?;
            self.expect(Colon)?;
            let body = self.parse_case_body()?;
            return Ok(self.alloc_stmt(
                StmtKind::CaseRange {
                    low: first,
                    high,
                    body,
                },
                loc,
            ));
        }
        let mut exprs = vec![first];
        while self.cursor.current_is(Comma) {
            self.cursor.advance();
            exprs.push(self.parse_assign_expr()?);
        }
        self.expect(Colon)?;
        let body = self.parse_case_body()?;
        Ok(self.alloc_stmt(
            StmtKind::Case {
                exprs: exprs.into_boxed_slice(),
                body,
            },
            loc,
        ))
    }

    fn parse_default_statement(&mut self) -> ParseResult<StmtId> {
        let loc = self.loc();
        self.expect(TokenKind::Default)?;
        self.expect(TokenKind::Colon)?;
        let body = self.parse_case_body()?;
        Ok(self.alloc_stmt(StmtKind::Default { body }, loc))
    }

    /// Statements until the next `case`, `default`, or `}`.
    fn parse_case_body(&mut self) -> ParseResult<Box<[StmtId]>> {
        use TokenKind::*;
        let mut stmts = Vec::new();
        while !matches!(self.cursor.current_kind(), Case | Default | RBrace | Eof) {
            match self.parse_decl_or_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(ParseFailed) => self.recover_in_stmt_list(),
            }
        }
        Ok(stmts.into_boxed_slice())
    }

    pub(crate) fn parse_statement_no_case_no_default(&mut self) -> ParseResult<StmtId> {
        use TokenKind::*;
        let loc = self.loc();
        match self.cursor.current_kind() {
            LBrace => self.parse_block_statement(),
            Semicolon => {
                self.cursor.advance();
                Ok(self.alloc_stmt(StmtKind::Empty, loc))
            }
            If => self.parse_if_statement(),
            While => {
                self.cursor.advance();
                self.expect(LParen)?;
                let cond = self.parse_expression()?;
                self.expect(RParen)?;
                let body = self.parse_statement_no_case_no_default()?;
                Ok(self.alloc_stmt(StmtKind::While { cond, body }, loc))
            }
            Do => {
                self.cursor.advance();
                let body = self.parse_statement_no_case_no_default()?;
                self.expect(While)?;
                self.expect(LParen)?;
                let cond = self.parse_expression()?;
                self.expect(RParen)?;
                self.expect(Semicolon)?;
                Ok(self.alloc_stmt(StmtKind::DoWhile { body, cond }, loc))
            }
            For => self.parse_for_statement(),
            Foreach | ForeachReverse => {
                let stmt = self.parse_foreach_statement()?;
                Ok(self.alloc_stmt(StmtKind::Foreach(Box::new(stmt)), loc))
            }
            Switch => self.parse_switch_statement(false),
            Final if self.cursor.peek_is(Switch) => {
                self.cursor.advance();
                self.parse_switch_statement(true)
            }
            Break => {
                self.cursor.advance();
                let label = self.take_optional_label();
                self.expect(Semicolon)?;
                Ok(self.alloc_stmt(StmtKind::Break { label }, loc))
            }
            Continue => {
                self.cursor.advance();
                let label = self.take_optional_label();
                self.expect(Semicolon)?;
                Ok(self.alloc_stmt(StmtKind::Continue { label }, loc))
            }
            Return => {
                self.cursor.advance();
                let value = if self.cursor.current_is(Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect(Semicolon)?;
                Ok(self.alloc_stmt(StmtKind::Return { value }, loc))
            }
            Goto => self.parse_goto_statement(),
            With => {
                self.cursor.advance();
                self.expect(LParen)?;
                let subject = TypeOrExpr::Expr(self.parse_expression()?);
                self.expect(RParen)?;
                let body = self.parse_statement_no_case_no_default()?;
                Ok(self.alloc_stmt(StmtKind::With { subject, body }, loc))
            }
            Synchronized => {
                self.cursor.advance();
                let subject = if self.cursor.current_is(LParen) {
                    self.cursor.advance();
                    let expr = self.parse_expression()?;
                    self.expect(RParen)?;
                    Some(expr)
                } else {
                    None
                };
                let body = self.parse_statement_no_case_no_default()?;
                Ok(self.alloc_stmt(StmtKind::Synchronized { subject, body }, loc))
            }
            Try => self.parse_try_statement(),
            Throw => {
                self.cursor.advance();
                let value = self.parse_expression()?;
                self.expect(Semicolon)?;
                Ok(self.alloc_stmt(StmtKind::Throw { value }, loc))
            }
            Scope if self.cursor.peek_is(LParen) => self.parse_scope_guard(),
            Asm => self.parse_asm_statement(),
            Static if self.cursor.peek_is(If) => {
                self.cursor.advance();
                self.parse_conditional_statement(CompileConditionStart::StaticIf)
            }
            Static if self.cursor.peek_is(Assert) => {
                self.cursor.advance();
                self.cursor.advance();
                self.expect(LParen)?;
                let condition = self.parse_assign_expr()?;
                let message = if self.cursor.current_is(Comma) {
                    self.cursor.advance();
                    Some(self.parse_assign_expr()?)
                } else {
                    None
                };
                self.expect(RParen)?;
                self.expect(Semicolon)?;
                Ok(self.alloc_stmt(StmtKind::StaticAssert { condition, message }, loc))
            }
            Static
                if matches!(self.cursor.peek_kind(1), Foreach | ForeachReverse) =>
            {
                self.cursor.advance();
                let stmt = self.parse_foreach_statement()?;
                Ok(self.alloc_stmt(StmtKind::StaticForeach(Box::new(stmt)), loc))
            }
            Version if self.cursor.peek_is(LParen) => {
                self.parse_conditional_statement(CompileConditionStart::Version)
            }
            Debug if !self.cursor.peek_is(Assign) => {
                self.parse_conditional_statement(CompileConditionStart::Debug)
            }
            Identifier if self.cursor.peek_is(Colon) => {
                let label = self.cursor.advance().text;
                self.cursor.advance();
                let stmt = if matches!(
                    self.cursor.current_kind(),
                    RBrace | Case | Default | Eof
                ) {
                    None
                } else {
                    Some(self.parse_decl_or_statement()?)
                };
                Ok(self.alloc_stmt(StmtKind::Labeled { label, stmt }, loc))
            }
            _ => {
                if self.is_declaration() {
                    let decl = self.parse_declaration()?;
                    Ok(self.alloc_stmt(StmtKind::Decl { decl }, loc))
                } else {
                    let expr = self.parse_expression()?;
                    self.expect(Semicolon)?;
                    Ok(self.alloc_stmt(StmtKind::Expr { expr }, loc))
                }
            }
        }
    }

    fn take_optional_label(&mut self) -> Name {
        if self.cursor.current_is(TokenKind::Identifier) {
            self.cursor.advance().text
        } else {
            Name::EMPTY
        }
    }

    /// `{ DeclarationsAndStatements }`
    pub(crate) fn parse_block_statement(&mut self) -> ParseResult<StmtId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(LBrace)?;
        let mut stmts = Vec::new();
        while !self.cursor.current_is(RBrace) && !self.cursor.is_at_end() {
            match self.parse_decl_or_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(ParseFailed) => self.recover_in_stmt_list(),
            }
        }
        self.expect(RBrace)?;
        Ok(self.alloc_stmt(
            StmtKind::Block {
                stmts: stmts.into_boxed_slice(),
            },
            loc,
        ))
    }

    /// One item of a declarations-and-statements list.
    pub(crate) fn parse_decl_or_statement(&mut self) -> ParseResult<StmtId> {
        if self.is_declaration() {
            let loc = self.loc();
            let decl = self.parse_declaration()?;
            Ok(self.alloc_stmt(StmtKind::Decl { decl }, loc))
        } else {
            self.parse_statement()
        }
    }

    /// Best-effort recovery inside a statement list: drop the current
    /// statement, resynchronize, guarantee progress.
    pub(crate) fn recover_in_stmt_list(&mut self) {
        let before = self.cursor.position();
        recovery::synchronize(&mut self.cursor, recovery::STMT_BOUNDARY);
        if self.cursor.current_is(TokenKind::Semicolon) {
            self.cursor.advance();
        } else if self.cursor.position() == before && !self.cursor.is_at_end() {
            self.cursor.advance();
        }
    }

    fn parse_if_statement(&mut self) -> ParseResult<StmtId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(If)?;
        self.expect(LParen)?;
        let condition = self.parse_if_condition()?;
        self.expect(RParen)?;
        let then_branch = self.parse_statement_no_case_no_default()?;
        let else_branch = if self.cursor.current_is(Else) {
            self.cursor.advance();
            Some(self.parse_statement_no_case_no_default()?)
        } else {
            None
        };
        Ok(self.alloc_stmt(
            StmtKind::If(Box::new(IfStmt {
                condition,
                then_branch,
                else_branch,
            })),
            loc,
        ))
    }

    /// `if` condition: `auto`/type-constructor run with a declared
    /// variable, a typed declared variable, or a bare expression. A
    /// bookmark decides.
    fn parse_if_condition(&mut self) -> ParseResult<IfCondition> {
        use TokenKind::*;
        if let Some(cond) = self.try_parse(|p| {
            let mut storage = Vec::new();
            loop {
                let kind = p.cursor.current_kind();
                let is_storage = kind == Auto
                    || kind == Scope
                    || (kind.is_type_constructor() && !p.cursor.peek_is(LParen));
                if !is_storage {
                    break;
                }
                storage.push(p.cursor.advance().kind);
            }
            if storage.is_empty()
                || !p.cursor.current_is(Identifier)
                || !p.cursor.peek_is(Assign)
            {
                return Err(ParseFailed);
            }
            let name = p.cursor.advance().text;
            p.cursor.advance();
            let value = p.parse_expression()?;
            Ok(IfCondition::Auto {
                storage: storage.into_boxed_slice(),
                name,
                value,
            })
        }) {
            return Ok(cond);
        }
        if let Some(cond) = self.try_parse(|p| {
            let ty = p.parse_type()?;
            if !p.cursor.current_is(Identifier) || !p.cursor.peek_is(Assign) {
                return Err(ParseFailed);
            }
            let name = p.cursor.advance().text;
            p.cursor.advance();
            let value = p.parse_expression()?;
            Ok(IfCondition::Typed { ty, name, value })
        }) {
            return Ok(cond);
        }
        Ok(IfCondition::Expr(self.parse_expression()?))
    }

    fn parse_for_statement(&mut self) -> ParseResult<StmtId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(For)?;
        self.expect(LParen)?;
        let init = if self.cursor.current_is(Semicolon) {
            self.cursor.advance();
            None
        } else {
            // The initializer owns its terminating `;`.
            Some(self.parse_decl_or_statement()?)
        };
        let cond = if self.cursor.current_is(Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Semicolon)?;
        let increment = if self.cursor.current_is(RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(RParen)?;
        let body = self.parse_statement_no_case_no_default()?;
        Ok(self.alloc_stmt(
            StmtKind::For(Box::new(ForStmt {
                init,
                cond,
                increment,
                body,
            })),
            loc,
        ))
    }

    /// Shared by `foreach`, `foreach_reverse`, and `static foreach`.
    pub(crate) fn parse_foreach_statement(&mut self) -> ParseResult<ForeachStmt> {
        let (reverse, vars, low, high) = self.parse_foreach_header()?;
        let body = self.parse_statement_no_case_no_default()?;
        Ok(ForeachStmt {
            reverse,
            vars,
            low,
            high,
            body,
        })
    }

    /// `foreach (vars; low [.. high])` — the parenthesized part.
    pub(crate) fn parse_foreach_header(
        &mut self,
    ) -> ParseResult<(bool, Box<[ForeachVar]>, basalt_ir::ExprId, Option<basalt_ir::ExprId>)>
    {
        use TokenKind::*;
        let reverse = self.cursor.current_is(ForeachReverse);
        if !reverse {
            self.expect(Foreach)?;
        } else {
            self.cursor.advance();
        }
        self.expect(LParen)?;
        let mut vars = vec![self.parse_foreach_var()?];
        while self.cursor.current_is(Comma) {
            self.cursor.advance();
            vars.push(self.parse_foreach_var()?);
        }
        self.expect(Semicolon)?;
        let low = self.parse_expression()?;
        let high = if self.cursor.current_is(DotDot) {
            self.cursor.advance();
            if vars.len() != 1 {
                self.error(
                    ErrorCode::E1003,
                    "foreach over a range takes exactly one loop variable",
                );
            }
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(RParen)?;
        Ok((reverse, vars.into_boxed_slice(), low, high))
    }

    /// One foreach variable: storage run, then either `Type name` or a
    /// bare name (decided by what follows the identifier).
    fn parse_foreach_var(&mut self) -> ParseResult<ForeachVar> {
        use TokenKind::*;
        let loc = self.loc();
        let mut storage = Vec::new();
        loop {
            let kind = self.cursor.current_kind();
            let is_storage = matches!(kind, Ref | Alias | Enum | Scope)
                || (kind.is_type_constructor() && !self.cursor.peek_is(LParen));
            if !is_storage {
                break;
            }
            storage.push(self.cursor.advance().kind);
        }
        if self.cursor.current_is(Identifier)
            && matches!(self.cursor.peek_kind(1), Comma | Semicolon)
        {
            let name = self.cursor.advance().text;
            return Ok(ForeachVar {
                storage: storage.into_boxed_slice(),
                ty: None,
                name,
                loc,
            });
        }
        let ty = self.parse_type()?;
        let name = self.expect_ident()?;
        Ok(ForeachVar {
            storage: storage.into_boxed_slice(),
            ty: Some(ty),
            name,
            loc,
        })
    }

    fn parse_switch_statement(&mut self, is_final: bool) -> ParseResult<StmtId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(Switch)?;
        self.expect(LParen)?;
        let cond = self.parse_expression()?;
        self.expect(RParen)?;
        let body = self.parse_statement_no_case_no_default()?;
        Ok(self.alloc_stmt(
            StmtKind::Switch {
                cond,
                body,
                is_final,
            },
            loc,
        ))
    }

    fn parse_goto_statement(&mut self) -> ParseResult<StmtId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(Goto)?;
        let target = match self.cursor.current_kind() {
            Default => {
                self.cursor.advance();
                GotoTarget::Default
            }
            Case => {
                self.cursor.advance();
                if self.cursor.current_is(Semicolon) {
                    GotoTarget::Case(None)
                } else {
                    GotoTarget::Case(Some(self.parse_expression()?))
                }
            }
            _ => GotoTarget::Label(self.expect_ident()?),
        };
        self.expect(Semicolon)?;
        Ok(self.alloc_stmt(StmtKind::Goto { target }, loc))
    }

    /// `try` requires at least one `catch` or `finally`. Typed catches
    /// collect greedily; a parameterless catch terminates the list.
    fn parse_try_statement(&mut self) -> ParseResult<StmtId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(Try)?;
        let body = self.parse_decl_or_statement()?;
        let mut catches = Vec::new();
        let mut last_catch = None;
        while self.cursor.current_is(Catch) {
            let catch_loc = self.loc();
            self.cursor.advance();
            if !self.cursor.current_is(LParen) {
                last_catch = Some(self.parse_statement_no_case_no_default()?);
                break;
            }
            self.cursor.advance();
            let ty = self.parse_type()?;
            let name = if self.cursor.current_is(Identifier) {
                self.cursor.advance().text
            } else {
                Name::EMPTY
            };
            self.expect(RParen)?;
            let catch_body = self.parse_statement_no_case_no_default()?;
            catches.push(CatchClause {
                ty,
                name,
                body: catch_body,
                loc: catch_loc,
            });
        }
        let finally_block = if self.cursor.current_is(Finally) {
            self.cursor.advance();
            Some(self.parse_statement_no_case_no_default()?)
        } else {
            None
        };
        if catches.is_empty() && last_catch.is_none() && finally_block.is_none() {
            self.error(
                ErrorCode::E1003,
                "`try` requires at least one `catch` or `finally`",
            );
        }
        Ok(self.alloc_stmt(
            StmtKind::Try(Box::new(TryStmt {
                body,
                catches: catches.into_boxed_slice(),
                last_catch,
                finally_block,
            })),
            loc,
        ))
    }

    fn parse_scope_guard(&mut self) -> ParseResult<StmtId> {
        use TokenKind::*;
        let loc = self.loc();
        self.expect(Scope)?;
        self.expect(LParen)?;
        let name = self.expect_ident()?;
        let kind = match self.text(name) {
            "exit" => ScopeGuardKind::Exit,
            "success" => ScopeGuardKind::Success,
            "failure" => ScopeGuardKind::Failure,
            other => {
                return Err(self.error(
                    ErrorCode::E1003,
                    format!("unknown scope guard `{other}`; expected `exit`, `success`, or `failure`"),
                ))
            }
        };
        self.expect(RParen)?;
        let body = self.parse_statement_no_case_no_default()?;
        Ok(self.alloc_stmt(StmtKind::ScopeGuard { kind, body }, loc))
    }

    fn parse_conditional_statement(
        &mut self,
        start: CompileConditionStart,
    ) -> ParseResult<StmtId> {
        use TokenKind::*;
        let loc = self.loc();
        let condition = self.parse_compile_condition(start)?;
        let then_branch = self.parse_statement_no_case_no_default()?;
        let else_branch = if self.cursor.current_is(Else) {
            self.cursor.advance();
            Some(self.parse_statement_no_case_no_default()?)
        } else {
            None
        };
        Ok(self.alloc_stmt(
            StmtKind::Conditional(Box::new(ConditionalStmt {
                condition,
                then_branch,
                else_branch,
            })),
            loc,
        ))
    }

    /// Parse a compile-time condition. For `StaticIf` the leading
    /// `static` has already been consumed.
    pub(crate) fn parse_compile_condition(
        &mut self,
        start: CompileConditionStart,
    ) -> ParseResult<CompileCondition> {
        use TokenKind::*;
        match start {
            CompileConditionStart::StaticIf => {
                self.expect(If)?;
                self.expect(LParen)?;
                let condition = self.parse_assign_expr()?;
                self.expect(RParen)?;
                Ok(CompileCondition::StaticIf { condition })
            }
            CompileConditionStart::Version => {
                self.expect(Version)?;
                self.expect(LParen)?;
                let target = self.parse_version_target()?;
                self.expect(RParen)?;
                Ok(CompileCondition::Version { target })
            }
            CompileConditionStart::Debug => {
                self.expect(Debug)?;
                let target = if self.cursor.current_is(LParen) {
                    self.cursor.advance();
                    let target = self.parse_version_target()?;
                    self.expect(RParen)?;
                    Some(target)
                } else {
                    None
                };
                Ok(CompileCondition::Debug { target })
            }
        }
    }

    pub(crate) fn parse_version_target(&mut self) -> ParseResult<VersionTarget> {
        use TokenKind::*;
        let token = self.cursor.current();
        let target = match token.kind {
            Identifier => VersionTarget::Ident(token.text),
            Unittest => VersionTarget::Unittest,
            Assert => VersionTarget::Assert,
            kind if kind.is_integer_literal() => VersionTarget::Int(token.text),
            found => {
                return Err(self.error(
                    ErrorCode::E1001,
                    format!(
                        "expected version identifier or integer, found {}",
                        found.display_name()
                    ),
                ))
            }
        };
        self.cursor.advance();
        Ok(target)
    }
}

/// Which conditional-compilation keyword introduced the condition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum CompileConditionStart {
    StaticIf,
    Version,
    Debug,
}
