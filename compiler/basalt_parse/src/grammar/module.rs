//! Module entry: top-level composition producing the `Module` node.

use basalt_ir::{
    DeprecatedInfo, Module, ModuleDeclaration, Name, TokenKind,
};
use tracing::debug;

use crate::{ParseFailed, Parser};

impl Parser<'_> {
    /// Parse the whole token stream: optional script line, optional
    /// (possibly deprecated) module declaration, then top-level
    /// declarations to exhaustion. Failed declarations are skipped after
    /// recovery, so the returned module is complete as far as the input
    /// allowed.
    pub(crate) fn parse_module_root(&mut self) -> Module {
        use TokenKind::*;
        let mut module = basalt_ir::Module::default();

        if self.cursor.current_is(ScriptLine) {
            module.script_line =
                Some(u32::try_from(self.cursor.position()).unwrap_or(u32::MAX));
            self.cursor.advance();
        }

        // `deprecated ( ... ) module` needs lookahead: `deprecated` may
        // equally begin an attributed declaration.
        let deprecated_module = self.cursor.current_is(Deprecated)
            && self.look_ahead(|p| {
                p.cursor.advance();
                if p.cursor.current_is(LParen) {
                    p.cursor.skip_parens();
                }
                p.cursor.current_is(Module)
            });

        if deprecated_module || self.cursor.current_is(Module) {
            if let Ok(declaration) = self.parse_module_declaration(deprecated_module) {
                module.declaration = Some(declaration);
            } else {
                self.recover_in_decl_list();
            }
        }

        while !self.cursor.is_at_end() {
            match self.parse_declaration() {
                Ok(decl) => module.declarations.push(decl),
                Err(ParseFailed) => {
                    debug!(pos = self.cursor.position(), "skipping top-level declaration");
                    self.recover_in_decl_list();
                }
            }
        }
        module
    }

    fn parse_module_declaration(
        &mut self,
        deprecated: bool,
    ) -> Result<ModuleDeclaration, ParseFailed> {
        use TokenKind::*;
        let loc = self.loc();
        self.capture_comment();
        let deprecated = if deprecated {
            self.cursor.advance();
            let message = if self.cursor.current_is(LParen) {
                self.cursor.advance();
                let message = self.parse_assign_expr()?;
                self.expect(RParen)?;
                Some(message)
            } else {
                None
            };
            Some(DeprecatedInfo { message })
        } else {
            None
        };
        self.expect(Module)?;
        let mut parts: Vec<Name> = vec![self.expect_ident()?];
        while self.cursor.current_is(Dot) {
            self.cursor.advance();
            parts.push(self.expect_ident()?);
        }
        self.expect(Semicolon)?;
        let comment = self.take_comment();
        Ok(ModuleDeclaration {
            deprecated,
            parts: parts.into_boxed_slice(),
            comment,
            loc,
        })
    }
}
