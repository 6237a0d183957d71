//! Expression nodes.

use crate::token::TokenKind;
use crate::{Loc, Name};

use super::{
    ExprId, MemberFunctionAttr, ParamList, StmtId, TemplateArg, TemplateParameter, TypeId,
    TypeOrExpr,
};

#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Loc,
}

#[derive(Debug)]
pub enum ExprKind {
    /// Comma expression; only produced when at least two operands exist.
    Seq(Box<[ExprId]>),
    Assign {
        op: AssignOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Ternary {
        cond: ExprId,
        then: ExprId,
        otherwise: ExprId,
    },
    Binary {
        op: BinOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Prefix {
        op: PrefixOp,
        operand: ExprId,
    },
    PostIncDec {
        inc: bool,
        operand: ExprId,
    },
    New(Box<NewExpr>),
    NewAnonClass(Box<AnonClassExpr>),
    Delete {
        operand: ExprId,
    },
    Cast(Box<CastExpr>),
    Assert {
        condition: ExprId,
        message: Option<ExprId>,
    },
    /// Type-qualified construction call: `const(T)(args)`, `pure T(args)`.
    TypeCtorCall(Box<TypeCtorCall>),
    /// `(Type).member` and builtin-type property access `int.max`.
    TypeDotId {
        ty: TypeId,
        member: Name,
    },
    Call {
        callee: ExprId,
        args: Box<[ExprId]>,
    },
    /// Postfix templated call on a non-identifier target: `(e)!(T)(args)`.
    TemplatedCall {
        target: ExprId,
        template_args: Box<[TemplateArg]>,
        args: Box<[ExprId]>,
    },
    Index {
        target: ExprId,
        args: Box<[ExprId]>,
    },
    Slice {
        target: ExprId,
        low: Option<ExprId>,
        high: Option<ExprId>,
    },
    /// Dotted member access; `member` is an identifier, template
    /// instance, or `new` expression node.
    Member {
        target: ExprId,
        member: ExprId,
    },
    Ident(Name),
    TemplateInstance {
        name: Name,
        args: Box<[TemplateArg]>,
    },
    /// Leading-dot lookup from module scope: `.foo`.
    ModuleScoped {
        inner: ExprId,
    },
    Dollar,
    This,
    Super,
    Null,
    True,
    False,
    /// `__FILE__`, `__LINE__`, and the rest of the `__*__` family.
    Intrinsic(TokenKind),
    IntLit {
        text: Name,
        kind: TokenKind,
    },
    FloatLit {
        text: Name,
        kind: TokenKind,
    },
    CharLit {
        text: Name,
    },
    /// String literal; adjacent literal tokens are concatenated into one
    /// node during parsing.
    StringLit {
        text: Name,
        kind: TokenKind,
    },
    ArrayLit {
        elements: Box<[ExprId]>,
    },
    AssocArrayLit {
        entries: Box<[KeyValue]>,
    },
    Paren {
        inner: ExprId,
    },
    FunctionLit(Box<FunctionLit>),
    Lambda(Box<LambdaExpr>),
    /// `typeof(...)` (optionally dotted further via `Member`).
    TypeExpr {
        ty: TypeId,
    },
    Typeid {
        argument: TypeOrExpr,
    },
    IsExpr(Box<IsExpr>),
    TraitsExpr {
        name: Name,
        args: Box<[TemplateArg]>,
    },
    MixinExpr {
        operand: ExprId,
    },
    ImportExpr {
        operand: ExprId,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    CatAssign,
    ShlAssign,
    ShrAssign,
    UshrAssign,
    PowAssign,
}

impl AssignOp {
    /// Map an assignment token to its operator, `None` for other tokens.
    pub fn from_token(kind: TokenKind) -> Option<AssignOp> {
        use TokenKind::*;
        Some(match kind {
            Assign => AssignOp::Assign,
            PlusEq => AssignOp::AddAssign,
            MinusEq => AssignOp::SubAssign,
            StarEq => AssignOp::MulAssign,
            SlashEq => AssignOp::DivAssign,
            PercentEq => AssignOp::ModAssign,
            AmpEq => AssignOp::AndAssign,
            PipeEq => AssignOp::OrAssign,
            CaretEq => AssignOp::XorAssign,
            TildeEq => AssignOp::CatAssign,
            ShiftLeftEq => AssignOp::ShlAssign,
            ShiftRightEq => AssignOp::ShrAssign,
            UnsignedShiftRightEq => AssignOp::UshrAssign,
            CaretCaretEq => AssignOp::PowAssign,
            _ => return None,
        })
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BinOp {
    OrOr,
    AndAnd,
    BitOr,
    BitXor,
    BitAnd,
    Equal,
    NotEqual,
    Identity,
    NotIdentity,
    In,
    NotIn,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    LessGreater,
    LessGreaterEq,
    NotLess,
    NotLessEq,
    NotGreater,
    NotGreaterEq,
    NotLessGreater,
    NotLessGreaterEq,
    Shl,
    Shr,
    Ushr,
    Add,
    Sub,
    Concat,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinOp {
    /// Map a relational token to its operator.
    pub fn from_rel_token(kind: TokenKind) -> Option<BinOp> {
        use TokenKind::*;
        Some(match kind {
            Less => BinOp::Less,
            LessEq => BinOp::LessEq,
            Greater => BinOp::Greater,
            GreaterEq => BinOp::GreaterEq,
            LessGreater => BinOp::LessGreater,
            LessGreaterEq => BinOp::LessGreaterEq,
            BangLess => BinOp::NotLess,
            BangLessEq => BinOp::NotLessEq,
            BangGreater => BinOp::NotGreater,
            BangGreaterEq => BinOp::NotGreaterEq,
            BangLessGreater => BinOp::NotLessGreater,
            BangLessGreaterEq => BinOp::NotLessGreaterEq,
            _ => return None,
        })
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PrefixOp {
    Addr,
    Not,
    Deref,
    Plus,
    Minus,
    Complement,
    Inc,
    Dec,
}

#[derive(Debug)]
pub struct KeyValue {
    pub key: ExprId,
    pub value: ExprId,
}

#[derive(Debug)]
pub struct NewExpr {
    pub ty: TypeId,
    /// `new T(args)`; `None` when no parenthesized argument list.
    pub ctor_args: Option<Box<[ExprId]>>,
    /// `new T[size]` allocation-size bracket.
    pub array_size: Option<ExprId>,
}

/// `new class (args) BaseList { members }`
#[derive(Debug)]
pub struct AnonClassExpr {
    pub ctor_args: Box<[ExprId]>,
    pub base_classes: Box<[TypeId]>,
    pub members: Box<[super::DeclId]>,
}

#[derive(Debug)]
pub struct CastExpr {
    /// `cast(T)`; `None` for qualifier-only or empty casts.
    pub ty: Option<TypeId>,
    /// Qualifier run admitted inside `cast(...)`, e.g. `cast(shared const)`.
    pub qualifiers: Box<[TokenKind]>,
    pub operand: ExprId,
}

#[derive(Debug)]
pub struct TypeCtorCall {
    pub qualifiers: Box<[TokenKind]>,
    pub ty: TypeId,
    pub args: Box<[ExprId]>,
}

/// `function` / `delegate` literal, or a bare `{ ... }` block literal.
#[derive(Debug)]
pub struct FunctionLit {
    pub keyword: Option<FnLitKind>,
    pub return_type: Option<TypeId>,
    pub params: Option<ParamList>,
    pub attrs: Box<[MemberFunctionAttr]>,
    /// Block body; always retained, even in body-minimizing mode, since
    /// literals are expressions rather than droppable declarations.
    pub body: StmtId,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FnLitKind {
    Function,
    Delegate,
}

/// `x => e`, `(a, b) => e`, `function int (x) => e`.
#[derive(Debug)]
pub struct LambdaExpr {
    pub keyword: Option<FnLitKind>,
    pub return_type: Option<TypeId>,
    pub params: LambdaParams,
    pub attrs: Box<[MemberFunctionAttr]>,
    pub body: ExprId,
}

#[derive(Debug)]
pub enum LambdaParams {
    Single(Name),
    List(ParamList),
}

/// `is(...)` in any of its shapes.
#[derive(Debug)]
pub struct IsExpr {
    pub ty: TypeId,
    /// Optional introduced identifier: `is(T U : ...)`.
    pub ident: Name,
    /// `:` (implicit conversion) vs `==` (exact) comparison.
    pub comparison: Option<IsComparison>,
    /// Trailing template parameter list after the specialization.
    pub template_params: Box<[TemplateParameter]>,
}

#[derive(Debug)]
pub struct IsComparison {
    pub exact: bool,
    pub target: IsTarget,
}

#[derive(Debug)]
pub enum IsTarget {
    Type(TypeId),
    /// Specialization keywords: `struct`, `union`, `class`, `interface`,
    /// `enum`, `function`, `delegate`, `super`, `const`, `immutable`,
    /// `inout`, `shared`, `return`, `__parameters`.
    Keyword(TokenKind),
}
