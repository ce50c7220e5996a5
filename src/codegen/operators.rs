//! Operator and constant tables.
//!
//! Every operator maps to a symbol plus a rendering form. The matches are
//! exhaustive, so adding an operator to the AST fails to build until it has a
//! row here.

use crate::ast::{BinOp, BoolOp, CmpOp, Constant, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// `left op right`
    Infix,
    /// `math.floor(left op right)` style: an infix form inside a call.
    WrappedInfix(&'static str),
    /// `op(left, right)` or `op(value)`
    Call,
    /// `not op(left, right)`
    NegatedCall,
    /// `op value`, e.g. `-x`
    Prefix,
    /// Prefix keyword separated by a space, e.g. `not x`
    PrefixWord,
    /// The operand unchanged (unary `+`).
    Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorDesc {
    pub symbol: &'static str,
    pub form: Form,
}

impl OperatorDesc {
    const fn new(symbol: &'static str, form: Form) -> Self {
        OperatorDesc { symbol, form }
    }

    /// Render a two-operand use. Infix forms are left unparenthesised.
    pub fn binary(&self, left: &str, right: &str) -> String {
        match self.form {
            Form::Infix => format!("{} {} {}", left, self.symbol, right),
            Form::WrappedInfix(wrapper) => {
                format!("{}({} {} {})", wrapper, left, self.symbol, right)
            }
            Form::Call => format!("{}({}, {})", self.symbol, left, right),
            Form::NegatedCall => format!("not {}({}, {})", self.symbol, left, right),
            Form::Prefix | Form::PrefixWord | Form::Identity => {
                format!("{} {} {}", left, self.symbol, right)
            }
        }
    }

    pub fn unary(&self, value: &str) -> String {
        match self.form {
            // `- -x` rather than `--x`, which would start a comment
            Form::Prefix if value.starts_with(self.symbol) => {
                format!("{} {}", self.symbol, value)
            }
            Form::Prefix => format!("{}{}", self.symbol, value),
            Form::PrefixWord => format!("{} {}", self.symbol, value),
            Form::Call => format!("{}({})", self.symbol, value),
            Form::NegatedCall => format!("not {}({})", self.symbol, value),
            Form::Identity => value.to_string(),
            Form::Infix | Form::WrappedInfix(_) => format!("{}{}", self.symbol, value),
        }
    }
}

/// `None` for operators with no Lua rendering.
pub fn binop(op: BinOp) -> Option<OperatorDesc> {
    let desc = match op {
        BinOp::Add => OperatorDesc::new("+", Form::Infix),
        BinOp::Sub => OperatorDesc::new("-", Form::Infix),
        BinOp::Mult => OperatorDesc::new("*", Form::Infix),
        BinOp::Div => OperatorDesc::new("/", Form::Infix),
        BinOp::Mod => OperatorDesc::new("math.fmod", Form::Call),
        BinOp::Pow => OperatorDesc::new("math.pow", Form::Call),
        BinOp::FloorDiv => OperatorDesc::new("/", Form::WrappedInfix("math.floor")),
        BinOp::LShift => OperatorDesc::new("bit32.lshift", Form::Call),
        BinOp::RShift => OperatorDesc::new("bit32.rshift", Form::Call),
        BinOp::BitOr => OperatorDesc::new("bit32.bor", Form::Call),
        BinOp::BitAnd => OperatorDesc::new("bit32.band", Form::Call),
        BinOp::BitXor => OperatorDesc::new("bit32.bxor", Form::Call),
        BinOp::MatMult => return None,
    };
    Some(desc)
}

/// Separator placed between the operands of a boolean operation.
pub fn boolop(op: BoolOp) -> &'static str {
    match op {
        BoolOp::And => " and ",
        BoolOp::Or => " or ",
    }
}

/// Identity comparisons degrade to value equality.
pub fn cmpop(op: CmpOp) -> OperatorDesc {
    match op {
        CmpOp::Eq => OperatorDesc::new("==", Form::Infix),
        CmpOp::NotEq => OperatorDesc::new("~=", Form::Infix),
        CmpOp::Lt => OperatorDesc::new("<", Form::Infix),
        CmpOp::LtE => OperatorDesc::new("<=", Form::Infix),
        CmpOp::Gt => OperatorDesc::new(">", Form::Infix),
        CmpOp::GtE => OperatorDesc::new(">=", Form::Infix),
        CmpOp::In => OperatorDesc::new("operator_in", Form::Call),
        CmpOp::NotIn => OperatorDesc::new("operator_in", Form::NegatedCall),
        CmpOp::Is => OperatorDesc::new("==", Form::Infix),
        CmpOp::IsNot => OperatorDesc::new("~=", Form::Infix),
    }
}

pub fn unaryop(op: UnaryOp) -> OperatorDesc {
    match op {
        UnaryOp::USub => OperatorDesc::new("-", Form::Prefix),
        UnaryOp::UAdd => OperatorDesc::new("", Form::Identity),
        UnaryOp::Not => OperatorDesc::new("not", Form::PrefixWord),
        UnaryOp::Invert => OperatorDesc::new("bit32.bnot", Form::Call),
    }
}

pub fn constant(c: Constant) -> &'static str {
    match c {
        Constant::True => "true",
        Constant::False => "false",
        Constant::None => "nil",
    }
}

/// Lua metamethod installed for a dunder method defined in a class body.
pub fn metamethod(dunder: &str) -> Option<&'static str> {
    let name = match dunder {
        "__add__" => "__add",
        "__sub__" => "__sub",
        "__mul__" => "__mul",
        "__truediv__" | "__div__" => "__div",
        "__mod__" => "__mod",
        "__pow__" => "__pow",
        "__eq__" => "__eq",
        "__ne__" => "__ne",
        "__lt__" => "__lt",
        "__le__" => "__le",
        "__gt__" => "__gt",
        "__ge__" => "__ge",
        "__len__" => "__len",
        "__str__" => "__tostring",
        "__contains__" => "__in",
        "__gc__" => "__gc",
        "__neg__" => "__unm",
        "__call__" => "__call",
        _ => return None,
    };
    Some(name)
}
