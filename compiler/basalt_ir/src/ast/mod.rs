//! AST node families.
//!
//! A closed set of node kinds grouped into families: expressions,
//! statements, declarations, types, asm constructs, and the root `Module`.
//! Parent-to-child links are arena ids (or inline boxed slices for
//! fixed-shape payload runs); the result is a tree with no back-pointers
//! and no shared subtrees.

mod asm;
mod decl;
mod expr;
mod stmt;
mod ty;

pub use asm::*;
pub use decl::*;
pub use expr::*;
pub use stmt::*;
pub use ty::*;

use crate::arena::Id;
use crate::token::{TokenIdx, TokenKind};
use crate::{Loc, Name};

pub type ExprId = Id<Expr>;
pub type StmtId = Id<Stmt>;
pub type DeclId = Id<Decl>;
pub type TypeId = Id<Type>;
pub type AsmExprId = Id<AsmExpr>;

/// Either a type or an expression, for positions that admit both
/// (`typeid`, `with`, alias template parameters, template arguments).
#[derive(Clone, Debug)]
pub enum TypeOrExpr {
    Type(TypeId),
    Expr(ExprId),
}

/// Root of a parsed file.
#[derive(Debug, Default)]
pub struct Module {
    /// Index of the leading `#!` token, when the file starts with one.
    pub script_line: Option<TokenIdx>,
    pub declaration: Option<ModuleDeclaration>,
    /// Top-level declarations in source order.
    pub declarations: Vec<DeclId>,
}

#[derive(Debug)]
pub struct ModuleDeclaration {
    /// `deprecated` / `deprecated("message")` preceding `module`.
    pub deprecated: Option<DeprecatedInfo>,
    /// Dot-separated name parts: `module a.b.c;` yields `["a","b","c"]`.
    pub parts: Box<[Name]>,
    pub comment: Name,
    pub loc: Loc,
}

#[derive(Debug)]
pub struct DeprecatedInfo {
    pub message: Option<ExprId>,
}

/// Condition of a conditional-compilation construct.
///
/// Recorded structurally; the parser never evaluates it.
#[derive(Debug)]
pub enum CompileCondition {
    StaticIf { condition: ExprId },
    Version { target: VersionTarget },
    Debug { target: Option<VersionTarget> },
}

#[derive(Copy, Clone, Debug)]
pub enum VersionTarget {
    Ident(Name),
    /// Integer level; the lexeme is kept verbatim.
    Int(Name),
    Unittest,
    Assert,
}

/// A template parameter in a parameter list.
#[derive(Debug)]
pub struct TemplateParameter {
    pub kind: TemplateParamKind,
    pub loc: Loc,
}

#[derive(Debug)]
pub enum TemplateParamKind {
    /// `T`, `T : Spec`, `T = Default`
    Type {
        name: Name,
        specialization: Option<TypeId>,
        default: Option<TypeId>,
    },
    /// `int n`, `int n : 3`, `int n = 3`
    Value {
        ty: TypeId,
        name: Name,
        specialization: Option<ExprId>,
        default: Option<ExprId>,
    },
    /// `alias a`, with optional specialization/default of either sort
    Alias {
        name: Name,
        specialization: Option<TypeOrExpr>,
        default: Option<TypeOrExpr>,
    },
    /// `Args...`
    Tuple { name: Name },
    /// `this T`
    This { name: Name },
}

/// One argument of a template instantiation: a type or an expression.
#[derive(Debug)]
pub enum TemplateArg {
    Type(TypeId),
    Expr(ExprId),
}

/// Parameter list of a function, delegate, or function literal.
#[derive(Debug, Default)]
pub struct ParamList {
    pub params: Box<[Param]>,
    /// Trailing `...` after the last parameter (or alone).
    pub varargs: bool,
}

#[derive(Debug)]
pub struct Param {
    /// Parameter storage keywords: `in out ref lazy scope return` and the
    /// type constructors when they qualify the parameter as a whole.
    pub storage: Box<[TokenKind]>,
    pub ty: Option<TypeId>,
    pub name: Name,
    pub default: Option<ExprId>,
    /// `T args...` member variadic.
    pub vararg: bool,
    pub loc: Loc,
}

/// Attribute attached to a declaration (storage class, protection,
/// linkage, `@x(...)`, alignment, deprecation, pragma).
#[derive(Debug)]
pub struct Attribute {
    pub kind: AttrKind,
    pub loc: Loc,
}

#[derive(Debug)]
pub enum AttrKind {
    /// Single storage-class keyword (`static`, `final`, `__gshared`, ...).
    Storage(TokenKind),
    Protection(TokenKind),
    /// `extern(C)`, `extern(C++, a.b)`
    Linkage {
        name: Name,
        plus_plus: bool,
        namespaces: Box<[Name]>,
    },
    At(Box<AtAttribute>),
    /// `align` / `align(n)`
    Align { value: Option<ExprId> },
    /// `deprecated` / `deprecated("why")`
    Deprecated { message: Option<ExprId> },
    /// `pragma(name, args)` used in attribute position.
    Pragma { name: Name, args: Box<[ExprId]> },
}

/// `@`-attribute. Exactly one of the three shapes is populated:
/// `@name`, `@name(args)` / `@(args)`, or `@ <unary-expression>`.
#[derive(Debug)]
pub struct AtAttribute {
    pub name: Name,
    pub args: Option<Box<[ExprId]>>,
    pub expr: Option<ExprId>,
}

/// Member function attribute (`const`, `nothrow`, `@safe`, ...) appearing
/// after a parameter list.
#[derive(Debug)]
pub enum MemberFunctionAttr {
    Simple(TokenKind),
    At(Box<AtAttribute>),
}
