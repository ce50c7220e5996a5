pub mod pretty;

use crate::span::{Span, Spanned};

pub type SpannedExpr = Spanned<Expr>;
pub type SpannedStmt = Spanned<Stmt>;

/// A parsed source file.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub body: Vec<SpannedStmt>,
}

/// Statements.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Expression evaluated for its effect (calls, docstrings).
    Expr(SpannedExpr),
    /// `a = b = value`
    Assign {
        targets: Vec<SpannedExpr>,
        value: SpannedExpr,
    },
    /// `x += value`
    AugAssign {
        target: SpannedExpr,
        op: BinOp,
        value: SpannedExpr,
    },
    /// `x: int = value`; the annotation is not kept.
    AnnAssign {
        target: SpannedExpr,
        value: Option<SpannedExpr>,
    },
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Return(Option<SpannedExpr>),
    Delete(Vec<SpannedExpr>),
    Pass,
    Break,
    Continue,
    If {
        test: SpannedExpr,
        body: Vec<SpannedStmt>,
        orelse: Vec<SpannedStmt>,
    },
    While {
        test: SpannedExpr,
        body: Vec<SpannedStmt>,
        orelse: Vec<SpannedStmt>,
    },
    For {
        target: SpannedExpr,
        iter: SpannedExpr,
        body: Vec<SpannedStmt>,
        orelse: Vec<SpannedStmt>,
    },
    Try {
        body: Vec<SpannedStmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<SpannedStmt>,
        finalbody: Vec<SpannedStmt>,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<SpannedStmt>,
    },
    Raise {
        exc: Option<SpannedExpr>,
        cause: Option<SpannedExpr>,
    },
    Assert {
        test: SpannedExpr,
        msg: Option<SpannedExpr>,
    },
    /// `import a.b as c, d`
    Import(Vec<Alias>),
    /// `from m import a, b as c`; a single `*` alias for star imports.
    ImportFrom {
        module: String,
        names: Vec<Alias>,
    },
    Global(Vec<String>),
    Nonlocal(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: Spanned<String>,
    pub args: Arguments,
    pub body: Vec<SpannedStmt>,
    pub decorators: Vec<SpannedExpr>,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: Spanned<String>,
    pub bases: Vec<SpannedExpr>,
    pub keywords: Vec<Keyword>,
    pub body: Vec<SpannedStmt>,
    pub decorators: Vec<SpannedExpr>,
}

/// Parameter list of a `def` or `lambda`.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    pub args: Vec<Param>,
    pub vararg: Option<Spanned<String>>,
    pub kwonly: Vec<Param>,
    pub kwarg: Option<Spanned<String>>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Spanned<String>,
    pub default: Option<SpannedExpr>,
}

#[derive(Debug, Clone)]
pub struct ExceptHandler {
    pub typ: Option<SpannedExpr>,
    pub name: Option<Spanned<String>>,
    pub body: Vec<SpannedStmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WithItem {
    pub context: SpannedExpr,
    pub target: Option<SpannedExpr>,
}

/// `name as asname` in an import; `name` may be dotted.
#[derive(Debug, Clone)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
    pub span: Span,
}

/// `arg=value` in a call or class header; `arg` is `None` for `**value`.
#[derive(Debug, Clone)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: SpannedExpr,
}

/// One `for target in iter if cond...` clause of a comprehension.
#[derive(Debug, Clone)]
pub struct Comprehension {
    pub target: SpannedExpr,
    pub iter: SpannedExpr,
    pub ifs: Vec<SpannedExpr>,
}

/// Expressions.
#[derive(Debug, Clone)]
pub enum Expr {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    FString(Vec<FStringPart>),
    Constant(Constant),
    Ellipsis,

    // Variable reference
    Name(String),

    // Displays
    List(Vec<SpannedExpr>),
    Tuple(Vec<SpannedExpr>),
    Dict(Vec<(SpannedExpr, SpannedExpr)>),
    Set(Vec<SpannedExpr>),

    // Operators
    BinOp {
        op: BinOp,
        left: Box<SpannedExpr>,
        right: Box<SpannedExpr>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<SpannedExpr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<SpannedExpr>,
    },
    /// `left ops[0] comparators[0] ops[1] comparators[1] ...`
    Compare {
        left: Box<SpannedExpr>,
        ops: Vec<CmpOp>,
        comparators: Vec<SpannedExpr>,
    },

    Call {
        func: Box<SpannedExpr>,
        args: Vec<SpannedExpr>,
        keywords: Vec<Keyword>,
    },
    Attribute {
        value: Box<SpannedExpr>,
        attr: String,
    },
    Subscript {
        value: Box<SpannedExpr>,
        index: Box<SpannedExpr>,
    },
    Slice {
        lower: Option<Box<SpannedExpr>>,
        upper: Option<Box<SpannedExpr>>,
        step: Option<Box<SpannedExpr>>,
    },
    Starred(Box<SpannedExpr>),

    // `body if test else orelse`
    IfExp {
        test: Box<SpannedExpr>,
        body: Box<SpannedExpr>,
        orelse: Box<SpannedExpr>,
    },
    Lambda {
        args: Box<Arguments>,
        body: Box<SpannedExpr>,
    },

    // Comprehensions
    ListComp {
        elt: Box<SpannedExpr>,
        generators: Vec<Comprehension>,
    },
    SetComp {
        elt: Box<SpannedExpr>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<SpannedExpr>,
        value: Box<SpannedExpr>,
        generators: Vec<Comprehension>,
    },
    GeneratorExp {
        elt: Box<SpannedExpr>,
        generators: Vec<Comprehension>,
    },

    Yield {
        value: Option<Box<SpannedExpr>>,
        from: bool,
    },
    /// `target := value`
    NamedExpr {
        target: Box<SpannedExpr>,
        value: Box<SpannedExpr>,
    },
}

impl Expr {
    /// Short human-readable name of the expression kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Int(_) | Expr::Float(_) => "number literal",
            Expr::Str(_) | Expr::Bytes(_) | Expr::FString(_) => "string literal",
            Expr::Constant(_) => "constant",
            Expr::Ellipsis => "ellipsis",
            Expr::Name(_) => "name",
            Expr::List(_) => "list display",
            Expr::Tuple(_) => "tuple",
            Expr::Dict(_) => "dict display",
            Expr::Set(_) => "set display",
            Expr::BinOp { .. } => "binary operation",
            Expr::BoolOp { .. } => "boolean operation",
            Expr::UnaryOp { .. } => "unary operation",
            Expr::Compare { .. } => "comparison",
            Expr::Call { .. } => "function call",
            Expr::Attribute { .. } => "attribute",
            Expr::Subscript { .. } => "subscript",
            Expr::Slice { .. } => "slice",
            Expr::Starred(_) => "starred expression",
            Expr::IfExp { .. } => "conditional expression",
            Expr::Lambda { .. } => "lambda",
            Expr::ListComp { .. } => "list comprehension",
            Expr::SetComp { .. } => "set comprehension",
            Expr::DictComp { .. } => "dict comprehension",
            Expr::GeneratorExp { .. } => "generator expression",
            Expr::Yield { .. } => "yield expression",
            Expr::NamedExpr { .. } => "assignment expression",
        }
    }
}

/// Part of an f-string.
#[derive(Debug, Clone)]
pub enum FStringPart {
    Literal(String),
    Expr(SpannedExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    True,
    False,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
}

impl BinOp {
    pub const ALL: [BinOp; 13] = [
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mult,
        BinOp::MatMult,
        BinOp::Div,
        BinOp::Mod,
        BinOp::Pow,
        BinOp::LShift,
        BinOp::RShift,
        BinOp::BitOr,
        BinOp::BitXor,
        BinOp::BitAnd,
        BinOp::FloorDiv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mult => "*",
            BinOp::MatMult => "@",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::BitAnd => "&",
            BinOp::FloorDiv => "//",
        }
    }

    /// The operator of an augmented assignment token (`+=` carries `"+"`).
    pub fn from_aug(text: &str) -> Option<BinOp> {
        BinOp::ALL.into_iter().find(|op| op.as_str() == text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CmpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Invert,
    Not,
    UAdd,
    USub,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Invert => "~",
            UnaryOp::Not => "not ",
            UnaryOp::UAdd => "+",
            UnaryOp::USub => "-",
        }
    }
}
