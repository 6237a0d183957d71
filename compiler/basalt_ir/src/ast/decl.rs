//! Declaration nodes.
//!
//! Declaration-level nodes carry a `comment` (the doc comment attached to
//! their first token, claimed exactly once) and a `supplemental_comment`
//! (a parent conditional-compilation construct's comment copied into its
//! branches so documentation context survives `static if`/`version`).

use crate::token::TokenKind;
use crate::{Loc, Name};

use super::{
    Attribute, CompileCondition, DeclId, ExprId, ForeachVar, MemberFunctionAttr, ParamList, StmtId,
    TemplateParameter, TypeId, TypeSuffix, VersionTarget,
};

#[derive(Debug)]
pub struct Decl {
    pub kind: DeclKind,
    pub loc: Loc,
    /// Attribute prefix (storage classes, protection, linkage, `@attrs`).
    pub attrs: Box<[Attribute]>,
    pub comment: Name,
    pub supplemental_comment: Name,
}

#[derive(Debug)]
pub enum DeclKind {
    Alias(Box<AliasDecl>),
    AliasThis { name: Name },
    Class(Box<AggregateDecl>),
    Interface(Box<AggregateDecl>),
    Struct(Box<AggregateDecl>),
    Union(Box<AggregateDecl>),
    Enum(Box<EnumDecl>),
    AnonEnum(Box<AnonEnumDecl>),
    /// `enum ident(TParams) = expr;`
    EponymousTemplate(Box<EponymousTemplateDecl>),
    Function(Box<FunctionDecl>),
    Constructor(Box<ConstructorDecl>),
    Destructor(Box<DestructorDecl>),
    /// `this(this)`
    Postblit(Box<PostblitDecl>),
    StaticConstructor(Box<StaticCtorDecl>),
    Variable(Box<VarDecl>),
    Import(Box<ImportDecl>),
    /// `mixin(expr);` string mixin.
    MixinString(Box<MixinStringDecl>),
    /// `mixin a.b.Tmpl!(args) name;`
    TemplateMixin(Box<TemplateMixinDecl>),
    /// `mixin template Name(TParams) { ... }`
    MixinTemplate(Box<TemplateDecl>),
    Pragma(Box<PragmaDecl>),
    Conditional(Box<ConditionalDecl>),
    StaticAssert { condition: ExprId, message: Option<ExprId> },
    StaticForeach(Box<StaticForeachDecl>),
    Template(Box<TemplateDecl>),
    Invariant(Box<InvariantDecl>),
    Unittest(Box<UnittestDecl>),
    /// Attribute prefix terminated by `:` — applies to the rest of scope.
    AttributeDecl { attribute: Attribute },
    /// `version = ident;` / `version = 7;`
    VersionSpec { target: VersionTarget },
    /// `debug = ident;` / `debug = 7;`
    DebugSpec { target: VersionTarget },
    /// Attribute block: `private { ... }` or `static: decl decl`.
    /// The attributes live on the wrapping `Decl`.
    Attributed { decls: Box<[DeclId]> },
    Empty,
}

#[derive(Debug)]
pub struct AliasDecl {
    /// New-style initializers: `alias a = T, b = U;`. Empty for the
    /// old-style form.
    pub initializers: Box<[AliasInitializer]>,
    /// Old-style pieces: `alias storage* Type names;`.
    pub storage: Box<[TokenKind]>,
    pub ty: Option<TypeId>,
    pub names: Box<[Name]>,
}

#[derive(Debug)]
pub struct AliasInitializer {
    pub name: Name,
    pub template_params: Option<Box<[TemplateParameter]>>,
    pub storage: Box<[TokenKind]>,
    pub ty: TypeId,
    pub loc: Loc,
}

/// `class` / `interface` / `struct` / `union` declaration.
#[derive(Debug)]
pub struct AggregateDecl {
    /// `Name::EMPTY` for anonymous aggregates.
    pub name: Name,
    pub template_params: Option<Box<[TemplateParameter]>>,
    pub constraint: Option<ExprId>,
    pub base_classes: Box<[TypeId]>,
    /// `None` for forward declarations terminated by `;`.
    pub members: Option<Box<[DeclId]>>,
}

#[derive(Debug)]
pub struct EnumDecl {
    pub name: Name,
    pub base_type: Option<TypeId>,
    pub members: Box<[EnumMember]>,
    /// False for opaque `enum E;` forward declarations.
    pub has_body: bool,
}

#[derive(Debug)]
pub struct AnonEnumDecl {
    pub base_type: Option<TypeId>,
    pub members: Box<[EnumMember]>,
}

#[derive(Debug)]
pub struct EnumMember {
    pub name: Name,
    /// Typed member inside an anonymous enum: `{ int x = 1 }`.
    pub ty: Option<TypeId>,
    pub value: Option<ExprId>,
    pub comment: Name,
    pub loc: Loc,
}

#[derive(Debug)]
pub struct EponymousTemplateDecl {
    pub name: Name,
    pub template_params: Box<[TemplateParameter]>,
    pub value: Option<ExprId>,
    pub ty: Option<TypeId>,
}

#[derive(Debug)]
pub struct FunctionDecl {
    /// `None` for `auto`/storage-class-typed functions.
    pub return_type: Option<TypeId>,
    pub name: Name,
    pub template_params: Option<Box<[TemplateParameter]>>,
    pub params: ParamList,
    pub member_attrs: Box<[MemberFunctionAttr]>,
    pub constraint: Option<ExprId>,
    pub body: FunctionBody,
}

#[derive(Debug)]
pub struct ConstructorDecl {
    pub template_params: Option<Box<[TemplateParameter]>>,
    pub params: ParamList,
    pub member_attrs: Box<[MemberFunctionAttr]>,
    pub constraint: Option<ExprId>,
    pub body: FunctionBody,
}

#[derive(Debug)]
pub struct DestructorDecl {
    pub member_attrs: Box<[MemberFunctionAttr]>,
    pub body: FunctionBody,
}

#[derive(Debug)]
pub struct PostblitDecl {
    pub member_attrs: Box<[MemberFunctionAttr]>,
    pub body: FunctionBody,
}

/// `static this()` / `static ~this()` and the `shared` variants.
#[derive(Debug)]
pub struct StaticCtorDecl {
    pub is_shared: bool,
    pub is_destructor: bool,
    pub member_attrs: Box<[MemberFunctionAttr]>,
    pub body: FunctionBody,
}

#[derive(Debug)]
pub struct VarDecl {
    /// `None` for storage-class-only declarations (`auto x = ...`).
    pub ty: Option<TypeId>,
    pub declarators: Box<[Declarator]>,
}

#[derive(Debug)]
pub struct Declarator {
    pub name: Name,
    /// C-style array suffixes after the name (`int x[3]`); parsed with a
    /// deprecation warning.
    pub c_style_suffixes: Box<[TypeSuffix]>,
    pub initializer: Option<Initializer>,
    pub comment: Name,
    pub loc: Loc,
}

#[derive(Debug)]
pub enum Initializer {
    /// `= void`
    Void,
    Expr(ExprId),
    /// `= { field: value, ... }`
    Struct(Box<[StructMemberInit]>),
}

#[derive(Debug)]
pub struct StructMemberInit {
    /// `Name::EMPTY` for positional initializers.
    pub field: Name,
    pub value: Box<Initializer>,
}

#[derive(Debug)]
pub struct ImportDecl {
    pub imports: Box<[SingleImport]>,
    /// Selective bindings: `import m : a, b = c;` — at most one, last.
    pub bindings: Option<ImportBindings>,
}

#[derive(Debug)]
pub struct SingleImport {
    /// `rename = a.b.c` rebinding; `Name::EMPTY` when absent.
    pub rename: Name,
    pub chain: Box<[Name]>,
    pub loc: Loc,
}

#[derive(Debug)]
pub struct ImportBindings {
    pub import: SingleImport,
    pub binds: Box<[ImportBind]>,
}

#[derive(Debug)]
pub struct ImportBind {
    pub name: Name,
    pub rename: Name,
}

#[derive(Debug)]
pub struct MixinStringDecl {
    pub operand: ExprId,
    /// Declarations recovered by re-tokenizing a `q{ ... }` token-string
    /// argument; empty when no token source is configured.
    pub trivial_declarations: Box<[DeclId]>,
}

#[derive(Debug)]
pub struct TemplateMixinDecl {
    /// The mixed-in symbol, possibly dotted and template-instantiated.
    pub ty: TypeId,
    /// Optional instance name before `;`.
    pub name: Name,
}

#[derive(Debug)]
pub struct PragmaDecl {
    pub name: Name,
    pub args: Box<[ExprId]>,
}

#[derive(Debug)]
pub struct ConditionalDecl {
    pub condition: CompileCondition,
    pub true_decls: Box<[DeclId]>,
    pub false_decls: Box<[DeclId]>,
}

#[derive(Debug)]
pub struct StaticForeachDecl {
    pub reverse: bool,
    pub vars: Box<[ForeachVar]>,
    pub low: ExprId,
    pub high: Option<ExprId>,
    pub decls: Box<[DeclId]>,
}

#[derive(Debug)]
pub struct TemplateDecl {
    pub name: Name,
    pub template_params: Box<[TemplateParameter]>,
    pub constraint: Option<ExprId>,
    pub decls: Box<[DeclId]>,
}

/// `invariant { ... }` or `invariant(expr);`
#[derive(Debug)]
pub struct InvariantDecl {
    pub expr: Option<ExprId>,
    pub block: Option<StmtId>,
}

#[derive(Debug)]
pub struct UnittestDecl {
    /// `None` when the body was dropped in body-minimizing mode.
    pub block: Option<StmtId>,
    pub had_body: bool,
}

/// Body of a function-like declaration.
#[derive(Debug)]
pub struct FunctionBody {
    pub kind: BodyKind,
    pub in_contracts: Box<[InContract]>,
    pub out_contract: Option<OutContract>,
    /// True whenever a brace block was matched, even if its statements
    /// were discarded.
    pub had_body: bool,
}

#[derive(Debug)]
pub enum BodyKind {
    /// Declaration only, terminated by `;`.
    None,
    /// Brace block; `stmts` is `None` in body-minimizing mode.
    Block { stmts: Option<StmtId> },
    /// `=> expr ;`
    Shorthand { value: ExprId },
}

impl FunctionBody {
    pub fn none() -> Self {
        FunctionBody {
            kind: BodyKind::None,
            in_contracts: Box::default(),
            out_contract: None,
            had_body: false,
        }
    }
}

/// `in { ... }` or `in (expr)`.
#[derive(Debug)]
pub struct InContract {
    pub expr: Option<ExprId>,
    pub block: Option<StmtId>,
}

/// `out { ... }`, `out (ident) { ... }`, or `out (ident; expr)`.
#[derive(Debug)]
pub struct OutContract {
    pub ident: Name,
    pub expr: Option<ExprId>,
    pub block: Option<StmtId>,
}
