//! Syntax tree for the subset of Go that matters for constant enumeration.
//!
//! Only package-level declarations are modelled in detail. Function bodies
//! and non-trivial type literals are recognised and skipped, and `var`
//! initializers are kept opaque.

use std::fmt;

/// Identity of a syntax node that introduces or mentions a name.
///
/// Unique within one package: `file` is the index of the file in load
/// order and `index` counts identifiers within that file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub file: u32,
    pub index: u32,
}

/// 1-indexed source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An identifier occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub id: NodeId,
    pub name: String,
    pub pos: Pos,
}

impl Ident {
    /// The blank identifier `_` never declares anything.
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    /// Imaginary, `2i` or `1.5i`.
    Imag,
    Rune,
    String,
}

/// A literal as written, including quotes and prefixes.
#[derive(Debug, Clone, PartialEq)]
pub struct Lit {
    pub kind: LitKind,
    pub text: String,
    pub pos: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Neg => "-",
            Self::Not => "!",
            Self::BitNot => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    AndNot,
    Shl,
    Shr,
    LogAnd,
    LogOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Go operator precedence, 5 binds tightest.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Mul | Self::Div | Self::Rem | Self::Shl | Self::Shr | Self::And | Self::AndNot => 5,
            Self::Add | Self::Sub | Self::Or | Self::Xor => 4,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge => 3,
            Self::LogAnd => 2,
            Self::LogOr => 1,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    pub fn is_shift(self) -> bool {
        matches!(self, Self::Shl | Self::Shr)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::AndNot => "&^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::LogAnd => "&&",
            Self::LogOr => "||",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    /// `pkg.Name`
    Selector {
        base: Ident,
        name: Ident,
    },
    Lit(Lit),
    Paren(Box<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        pos: Pos,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        pos: Pos,
    },
    /// Call or conversion, `func(args)`
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        pos: Pos,
    },
    /// An initializer the parser skipped (only produced for `var` lines).
    Opaque { pos: Pos },
}

impl Expr {
    pub fn pos(&self) -> Pos {
        match self {
            Self::Ident(ident) => ident.pos,
            Self::Selector { base, .. } => base.pos,
            Self::Lit(lit) => lit.pos,
            Self::Paren(inner) => inner.pos(),
            Self::Unary { pos, .. }
            | Self::Binary { pos, .. }
            | Self::Call { pos, .. }
            | Self::Opaque { pos } => *pos,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let Self::Paren(inner) = expr {
            expr = inner;
        }
        expr
    }
}

/// A type as written in a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `T`
    Ident(Ident),
    /// `pkg.T`
    Qualified { package: Ident, name: Ident },
    /// `(T)`
    Paren { inner: Box<TypeExpr>, pos: Pos },
    /// Pointers, slices, maps, structs, instantiated generics and the like.
    Other { pos: Pos },
}

impl TypeExpr {
    pub fn pos(&self) -> Pos {
        match self {
            Self::Ident(ident) => ident.pos,
            Self::Qualified { package, .. } => package.pos,
            Self::Paren { pos, .. } | Self::Other { pos } => *pos,
        }
    }

    /// The type with any enclosing parentheses removed.
    pub fn unparen(&self) -> &TypeExpr {
        match self {
            Self::Paren { inner, .. } => inner.unparen(),
            other => other,
        }
    }
}

/// One line of a `const` or `var` declaration: `a, b T = x, y`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Ident,
    /// `type A = B`
    pub alias: bool,
    /// Declared with type parameters, `type List[T any] ...`
    pub generic: bool,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub name: Option<Ident>,
    pub path: String,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

/// Syntactic kind of a top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Import,
    Const,
    Var,
    Type,
    Func,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Import => "import",
            Self::Const => "const",
            Self::Var => "var",
            Self::Type => "type",
            Self::Func => "func",
        })
    }
}

/// An `import`, `const`, `var` or `type` declaration, grouped or not.
///
/// A single `const X = 1` statement is a group with one spec.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclGroup {
    pub kind: DeclKind,
    pub specs: Vec<Spec>,
    pub grouped: bool,
    pub pos: Pos,
}

impl DeclGroup {
    /// The `const`/`var` lines of this group, in source order.
    pub fn value_specs(&self) -> impl Iterator<Item = &ValueSpec> {
        self.specs.iter().filter_map(|spec| match spec {
            Spec::Value(v) => Some(v),
            _ => None,
        })
    }

    pub fn type_specs(&self) -> impl Iterator<Item = &TypeSpec> {
        self.specs.iter().filter_map(|spec| match spec {
            Spec::Type(t) => Some(t),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: Ident,
    /// Methods are not package-scope names.
    pub is_method: bool,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Group(DeclGroup),
    Func(FuncDecl),
}

impl Decl {
    pub fn kind(&self) -> DeclKind {
        match self {
            Self::Group(group) => group.kind,
            Self::Func(_) => DeclKind::Func,
        }
    }
}

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub package: Ident,
    pub decls: Vec<Decl>,
}

impl File {
    /// Top-level `const` groups in source order.
    pub fn const_groups(&self) -> impl Iterator<Item = &DeclGroup> {
        self.groups_of(DeclKind::Const)
    }

    pub fn groups_of(&self, kind: DeclKind) -> impl Iterator<Item = &DeclGroup> {
        self.decls.iter().filter_map(move |decl| match decl {
            Decl::Group(group) if group.kind == kind => Some(group),
            _ => None,
        })
    }

    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Func(func) => Some(func),
            _ => None,
        })
    }
}
