//! Type nodes.

use crate::token::{TokenIdx, TokenKind};
use crate::{Loc, Name};

use super::{ExprId, MemberFunctionAttr, ParamList, TemplateArg, TypeId};

/// A parsed type: optional type-constructor run, a base, and a run of
/// suffixes applied left to right (`int*[3]` is pointer-to-int, then
/// static array of that).
#[derive(Debug)]
pub struct Type {
    pub ctors: Box<[TokenKind]>,
    pub kind: TypeKind,
    pub suffixes: Box<[TypeSuffix]>,
    pub loc: Loc,
}

#[derive(Debug)]
pub enum TypeKind {
    Builtin(TokenKind),
    /// Identifier chain, each part optionally template-instantiated;
    /// `leading_dot` for module-scoped lookup (`.a.b`).
    Symbol {
        leading_dot: bool,
        parts: Box<[SymbolPart]>,
    },
    /// `typeof(expr)` / `typeof(return)`, optionally followed by a
    /// `.`-chain.
    Typeof {
        expr: Option<ExprId>,
        is_return: bool,
        chain: Box<[SymbolPart]>,
    },
    /// `const(T)`, `immutable(T)`, `inout(T)`, `shared(T)`.
    Qualified {
        qualifier: TokenKind,
        inner: TypeId,
    },
    /// `__vector(T)`
    Vector { element: TypeId },
    /// `__traits(...)` in type position; the token range is recorded and
    /// the contents left uninterpreted.
    Traits { start: TokenIdx, end: TokenIdx },
}

#[derive(Debug)]
pub struct SymbolPart {
    pub name: Name,
    pub template_args: Option<Box<[TemplateArg]>>,
}

#[derive(Debug)]
pub enum TypeSuffix {
    /// `*`
    Pointer,
    /// `[]`, `[T]`, `[expr]`, or `[low .. high]`.
    Array {
        ty: Option<TypeId>,
        low: Option<ExprId>,
        high: Option<ExprId>,
    },
    /// `delegate Parameters MemberFunctionAttribute*`
    Delegate {
        params: ParamList,
        attrs: Box<[MemberFunctionAttr]>,
    },
    /// `function Parameters MemberFunctionAttribute*`
    Function {
        params: ParamList,
        attrs: Box<[MemberFunctionAttr]>,
    },
}
