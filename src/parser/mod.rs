pub mod expr;
pub mod stmt;

use crate::ast::*;
use crate::error::PyLuaError;
use crate::lexer::token::{Token, TokenKind};
use crate::span::{Span, Spanned};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    pub fn parse_module(&mut self) -> Result<Module, PyLuaError> {
        let mut body = Vec::new();
        loop {
            while self.match_token(&TokenKind::Newline) {}
            if self.is_at_end() {
                break;
            }
            self.parse_statement_into(&mut body)?;
        }
        Ok(Module { body })
    }

    // ── Token navigation ──

    pub(crate) fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    pub(crate) fn peek_token(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub(crate) fn peek_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::default()
        }
    }

    pub(crate) fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos];
        if !matches!(tok.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> Result<&Token, PyLuaError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<Spanned<String>, PyLuaError> {
        let tok = self.peek_token().clone();
        match tok.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Spanned::new(name, tok.span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> PyLuaError {
        PyLuaError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.peek().describe().to_string(),
            span: self.peek_span(),
        }
    }
}

/// Binding power for infix arithmetic and bitwise operators (left_bp, right_bp).
/// Boolean operators and comparisons sit below this ladder and are parsed separately.
pub(crate) fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::Pipe => Some((1, 2)),
        TokenKind::Caret => Some((3, 4)),
        TokenKind::Amp => Some((5, 6)),
        TokenKind::LShift | TokenKind::RShift => Some((7, 8)),
        TokenKind::Plus | TokenKind::Minus => Some((9, 10)),
        TokenKind::Star
        | TokenKind::At
        | TokenKind::Slash
        | TokenKind::DoubleSlash
        | TokenKind::Percent => Some((11, 12)),
        _ => None,
    }
}

/// Binding power of the operand of a prefix `-`, `+` or `~`.
pub(crate) const UNARY_BP: u8 = 13;

pub(crate) fn token_to_binop(kind: &TokenKind) -> Option<BinOp> {
    let op = match kind {
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mult,
        TokenKind::At => BinOp::MatMult,
        TokenKind::Slash => BinOp::Div,
        TokenKind::DoubleSlash => BinOp::FloorDiv,
        TokenKind::Percent => BinOp::Mod,
        TokenKind::DoubleStar => BinOp::Pow,
        TokenKind::LShift => BinOp::LShift,
        TokenKind::RShift => BinOp::RShift,
        TokenKind::Pipe => BinOp::BitOr,
        TokenKind::Caret => BinOp::BitXor,
        TokenKind::Amp => BinOp::BitAnd,
        _ => return None,
    };
    Some(op)
}

pub fn parse(tokens: Vec<Token>) -> Result<Module, PyLuaError> {
    Parser::new(tokens).parse_module()
}
