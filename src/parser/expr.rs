use crate::ast::*;
use crate::error::PyLuaError;
use crate::lexer::token::{InterpPart, Token, TokenKind};
use crate::span::{Span, Spanned};

use super::{infix_binding_power, token_to_binop, Parser, UNARY_BP};

impl Parser {
    /// Parse a single expression: lambda, conditional expression or walrus.
    pub fn parse_expr(&mut self) -> Result<SpannedExpr, PyLuaError> {
        if matches!(self.peek(), TokenKind::Lambda) {
            return self.parse_lambda();
        }

        let body = self.parse_or()?;

        if matches!(self.peek(), TokenKind::If) {
            self.advance(); // consume 'if'
            let test = self.parse_or()?;
            self.expect(&TokenKind::Else)?;
            let orelse = self.parse_expr()?;
            let span = body.span.merge(orelse.span);
            return Ok(Spanned::new(
                Expr::IfExp {
                    test: Box::new(test),
                    body: Box::new(body),
                    orelse: Box::new(orelse),
                },
                span,
            ));
        }

        if matches!(self.peek(), TokenKind::Walrus) {
            if !matches!(body.node, Expr::Name(_)) {
                return Err(PyLuaError::InvalidTarget {
                    target: body.node.kind_name().to_string(),
                    span: body.span,
                });
            }
            self.advance(); // consume ':='
            let value = self.parse_expr()?;
            let span = body.span.merge(value.span);
            return Ok(Spanned::new(
                Expr::NamedExpr {
                    target: Box::new(body),
                    value: Box::new(value),
                },
                span,
            ));
        }

        Ok(body)
    }

    /// Parse a comma-separated expression list; more than one element (or a
    /// trailing comma) makes a tuple. Starred elements are allowed.
    pub fn parse_expr_list(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let first = self.parse_star_or_expr()?;
        if !matches!(self.peek(), TokenKind::Comma) {
            return Ok(first);
        }

        let start = first.span;
        let mut elems = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if !self.starts_expression() {
                break;
            }
            elems.push(self.parse_star_or_expr()?);
        }
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(Expr::Tuple(elems), span))
    }

    /// Parse assignment targets up to (not including) `in`, as in `for k, v in ...`.
    pub(crate) fn parse_target_list(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let first = self.parse_target_item()?;
        if !matches!(self.peek(), TokenKind::Comma) {
            return Ok(first);
        }
        let start = first.span;
        let mut elems = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if matches!(self.peek(), TokenKind::In | TokenKind::Eq) {
                break;
            }
            elems.push(self.parse_target_item()?);
        }
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(Expr::Tuple(elems), span))
    }

    fn parse_target_item(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let target = if matches!(self.peek(), TokenKind::Star) {
            let start = self.peek_span();
            self.advance();
            let inner = self.parse_expr_bp(0)?;
            let span = start.merge(inner.span);
            Spanned::new(Expr::Starred(Box::new(inner)), span)
        } else {
            self.parse_expr_bp(0)?
        };
        self.check_target(&target)?;
        Ok(target)
    }

    /// Reject expressions that cannot be assigned to.
    pub(crate) fn check_target(&self, target: &SpannedExpr) -> Result<(), PyLuaError> {
        match &target.node {
            Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. } => Ok(()),
            Expr::Tuple(elems) | Expr::List(elems) => {
                elems.iter().try_for_each(|e| self.check_target(e))
            }
            Expr::Starred(inner) => self.check_target(inner),
            other => Err(PyLuaError::InvalidTarget {
                target: other.kind_name().to_string(),
                span: target.span,
            }),
        }
    }

    pub(crate) fn starts_expression(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::IntLit(_)
                | TokenKind::FloatLit(_)
                | TokenKind::StringLit(_)
                | TokenKind::BytesLit(_)
                | TokenKind::FString(_)
                | TokenKind::Ident(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::None
                | TokenKind::Ellipsis
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Tilde
                | TokenKind::Not
                | TokenKind::Lambda
                | TokenKind::Star
                | TokenKind::Yield
        )
    }

    fn parse_star_or_expr(&mut self) -> Result<SpannedExpr, PyLuaError> {
        if matches!(self.peek(), TokenKind::Star) {
            let start = self.peek_span();
            self.advance(); // consume '*'
            let inner = self.parse_or()?;
            let span = start.merge(inner.span);
            return Ok(Spanned::new(Expr::Starred(Box::new(inner)), span));
        }
        self.parse_expr()
    }

    pub(crate) fn parse_or(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let first = self.parse_and()?;
        if !matches!(self.peek(), TokenKind::Or) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.match_token(&TokenKind::Or) {
            values.push(self.parse_and()?);
        }
        Ok(bool_op(BoolOp::Or, values))
    }

    fn parse_and(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let first = self.parse_not()?;
        if !matches!(self.peek(), TokenKind::And) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.match_token(&TokenKind::And) {
            values.push(self.parse_not()?);
        }
        Ok(bool_op(BoolOp::And, values))
    }

    fn parse_not(&mut self) -> Result<SpannedExpr, PyLuaError> {
        if matches!(self.peek(), TokenKind::Not) {
            let start = self.peek_span();
            self.advance(); // consume 'not'
            let operand = self.parse_not()?;
            let span = start.merge(operand.span);
            return Ok(Spanned::new(
                Expr::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let left = self.parse_expr_bp(0)?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();

        loop {
            let op = match self.peek() {
                TokenKind::EqEq => CmpOp::Eq,
                TokenKind::NotEq => CmpOp::NotEq,
                TokenKind::Lt => CmpOp::Lt,
                TokenKind::Le => CmpOp::LtE,
                TokenKind::Gt => CmpOp::Gt,
                TokenKind::Ge => CmpOp::GtE,
                TokenKind::In => CmpOp::In,
                TokenKind::Not if matches!(self.peek_nth(1), TokenKind::In) => {
                    self.advance(); // consume 'not'
                    CmpOp::NotIn
                }
                TokenKind::Is => {
                    if matches!(self.peek_nth(1), TokenKind::Not) {
                        self.advance(); // consume 'is'
                        CmpOp::IsNot
                    } else {
                        CmpOp::Is
                    }
                }
                _ => break,
            };
            self.advance();
            ops.push(op);
            comparators.push(self.parse_expr_bp(0)?);
        }

        if ops.is_empty() {
            return Ok(left);
        }
        let span = comparators
            .last()
            .map(|c| left.span.merge(c.span))
            .unwrap_or(left.span);
        Ok(Spanned::new(
            Expr::Compare {
                left: Box::new(left),
                ops,
                comparators,
            },
            span,
        ))
    }

    /// Parse arithmetic and bitwise operators with Pratt binding power.
    pub(crate) fn parse_expr_bp(&mut self, min_bp: u8) -> Result<SpannedExpr, PyLuaError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let op_kind = self.peek().clone();
            let Some((l_bp, r_bp)) = infix_binding_power(&op_kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            let Some(op) = token_to_binop(&op_kind) else {
                break;
            };
            self.advance(); // consume operator
            let rhs = self.parse_expr_bp(r_bp)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::BinOp {
                    op,
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                },
                span,
            );
        }

        Ok(lhs)
    }

    /// Parse prefix operators, then a power expression.
    fn parse_prefix(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::USub,
            TokenKind::Plus => UnaryOp::UAdd,
            TokenKind::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        let start = self.peek_span();
        self.advance();
        let operand = self.parse_expr_bp(UNARY_BP)?;
        let span = start.merge(operand.span);
        Ok(Spanned::new(
            Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `primary ** u_expr`; right-associative and tighter than a unary on its left.
    fn parse_power(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let base = self.parse_atom()?;
        let base = self.parse_postfix(base)?;
        if matches!(self.peek(), TokenKind::DoubleStar) {
            self.advance(); // consume '**'
            let exponent = self.parse_expr_bp(UNARY_BP)?;
            let span = base.span.merge(exponent.span);
            return Ok(Spanned::new(
                Expr::BinOp {
                    op: BinOp::Pow,
                    left: Box::new(base),
                    right: Box::new(exponent),
                },
                span,
            ));
        }
        Ok(base)
    }

    /// Attribute access, calls and subscripts.
    fn parse_postfix(&mut self, mut expr: SpannedExpr) -> Result<SpannedExpr, PyLuaError> {
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance(); // consume '.'
                    let attr = self.expect_ident()?;
                    let span = expr.span.merge(attr.span);
                    expr = Spanned::new(
                        Expr::Attribute {
                            value: Box::new(expr),
                            attr: attr.node,
                        },
                        span,
                    );
                }
                TokenKind::LParen => expr = self.parse_call(expr)?,
                TokenKind::LBracket => {
                    self.advance(); // consume '['
                    let index = self.parse_subscript()?;
                    self.expect(&TokenKind::RBracket)?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Spanned::new(
                        Expr::Subscript {
                            value: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    pub(crate) fn parse_call(&mut self, func: SpannedExpr) -> Result<SpannedExpr, PyLuaError> {
        self.advance(); // consume '('
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        while !matches!(self.peek(), TokenKind::RParen) {
            match self.peek() {
                TokenKind::Star => args.push(self.parse_star_or_expr()?),
                TokenKind::DoubleStar => {
                    self.advance(); // consume '**'
                    let value = self.parse_expr()?;
                    keywords.push(Keyword { arg: None, value });
                }
                TokenKind::Ident(_) if matches!(self.peek_nth(1), TokenKind::Eq) => {
                    let name = self.expect_ident()?;
                    self.advance(); // consume '='
                    let value = self.parse_expr()?;
                    keywords.push(Keyword {
                        arg: Some(name.node),
                        value,
                    });
                }
                _ => {
                    let arg = self.parse_expr()?;
                    if matches!(self.peek(), TokenKind::For) {
                        // Sole generator argument: f(x for x in xs)
                        let generators = self.parse_comprehension_clauses()?;
                        let span = arg.span.merge(self.previous_span());
                        args.push(Spanned::new(
                            Expr::GeneratorExp {
                                elt: Box::new(arg),
                                generators,
                            },
                            span,
                        ));
                    } else {
                        args.push(arg);
                    }
                }
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RParen)?;
        let span = func.span.merge(self.previous_span());
        Ok(Spanned::new(
            Expr::Call {
                func: Box::new(func),
                args,
                keywords,
            },
            span,
        ))
    }

    /// The inside of `[...]` after a primary: an index, a slice or a tuple of them.
    fn parse_subscript(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let first = self.parse_slice_item()?;
        if !matches!(self.peek(), TokenKind::Comma) {
            return Ok(first);
        }
        let start = first.span;
        let mut elems = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if matches!(self.peek(), TokenKind::RBracket) {
                break;
            }
            elems.push(self.parse_slice_item()?);
        }
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(Expr::Tuple(elems), span))
    }

    fn parse_slice_item(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let start = self.peek_span();
        let lower = if matches!(self.peek(), TokenKind::Colon) {
            None
        } else {
            let expr = self.parse_expr()?;
            if !matches!(self.peek(), TokenKind::Colon) {
                return Ok(expr);
            }
            Some(Box::new(expr))
        };

        self.expect(&TokenKind::Colon)?;
        let upper = if self.slice_bound_follows() {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        let step = if self.match_token(&TokenKind::Colon) && self.slice_bound_follows() {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        let span = start.merge(self.previous_span());
        Ok(Spanned::new(Expr::Slice { lower, upper, step }, span))
    }

    fn slice_bound_follows(&self) -> bool {
        !matches!(
            self.peek(),
            TokenKind::Colon | TokenKind::Comma | TokenKind::RBracket
        )
    }

    /// Parse literals, names and bracketed displays.
    fn parse_atom(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let tok = self.peek_token().clone();
        match &tok.kind {
            TokenKind::IntLit(n) => {
                let n = *n;
                self.advance();
                Ok(Spanned::new(Expr::Int(n), tok.span))
            }
            TokenKind::FloatLit(n) => {
                let n = *n;
                self.advance();
                Ok(Spanned::new(Expr::Float(n), tok.span))
            }
            TokenKind::StringLit(_) | TokenKind::FString(_) => self.parse_strings(),
            TokenKind::BytesLit(_) => {
                let mut bytes = Vec::new();
                let start = tok.span;
                while let TokenKind::BytesLit(b) = self.peek() {
                    bytes.extend_from_slice(b);
                    self.advance();
                }
                let span = start.merge(self.previous_span());
                Ok(Spanned::new(Expr::Bytes(bytes), span))
            }
            TokenKind::True => {
                self.advance();
                Ok(Spanned::new(Expr::Constant(Constant::True), tok.span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Spanned::new(Expr::Constant(Constant::False), tok.span))
            }
            TokenKind::None => {
                self.advance();
                Ok(Spanned::new(Expr::Constant(Constant::None), tok.span))
            }
            TokenKind::Ellipsis => {
                self.advance();
                Ok(Spanned::new(Expr::Ellipsis, tok.span))
            }
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(Spanned::new(Expr::Name(name), tok.span))
            }

            TokenKind::LParen => self.parse_paren_expr(),
            TokenKind::LBracket => self.parse_list_display(),
            TokenKind::LBrace => self.parse_brace_display(),

            _ => Err(PyLuaError::ExpectedExpression {
                found: tok.kind.describe().to_string(),
                span: tok.span,
            }),
        }
    }

    /// Adjacent string literals concatenate; any f-string piece makes the result an f-string.
    fn parse_strings(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let start = self.peek_span();
        let mut parts: Vec<FStringPart> = Vec::new();
        let mut formatted = false;

        loop {
            let tok = self.peek_token().clone();
            match tok.kind {
                TokenKind::StringLit(s) => push_literal(&mut parts, s),
                TokenKind::FString(pieces) => {
                    formatted = true;
                    for piece in pieces {
                        match piece {
                            InterpPart::Literal(s) => push_literal(&mut parts, s),
                            InterpPart::Tokens(tokens) => {
                                parts.push(FStringPart::Expr(self.parse_fstring_field(
                                    tokens, tok.span,
                                )?));
                            }
                        }
                    }
                }
                _ => break,
            }
            self.advance();
        }

        let span = start.merge(self.previous_span());
        if formatted {
            parts.retain(|p| !matches!(p, FStringPart::Literal(s) if s.is_empty()));
            return Ok(Spanned::new(Expr::FString(parts), span));
        }
        let text = match parts.pop() {
            Some(FStringPart::Literal(s)) => s,
            _ => String::new(),
        };
        Ok(Spanned::new(Expr::Str(text), span))
    }

    fn parse_fstring_field(
        &mut self,
        tokens: Vec<Token>,
        span: Span,
    ) -> Result<SpannedExpr, PyLuaError> {
        let end = tokens.last().map(|t| t.span.end).unwrap_or(span.end);
        // Add an Eof token so the sub-parser knows when to stop
        let mut tokens_with_eof = tokens;
        tokens_with_eof.push(Token::new(TokenKind::Eof, Span::new(end, end)));
        let mut sub_parser = Parser::new(tokens_with_eof);
        if sub_parser.is_at_end() {
            return Err(PyLuaError::ExpectedExpression {
                found: "'}'".to_string(),
                span,
            });
        }
        let expr = sub_parser.parse_expr_list()?;
        if !sub_parser.is_at_end() {
            return Err(sub_parser.unexpected("'}'"));
        }
        Ok(expr)
    }

    fn parse_paren_expr(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let start = self.peek_span();
        self.advance(); // consume '('

        // Empty tuple: ()
        if matches!(self.peek(), TokenKind::RParen) {
            self.advance();
            let span = start.merge(self.previous_span());
            return Ok(Spanned::new(Expr::Tuple(Vec::new()), span));
        }

        if matches!(self.peek(), TokenKind::Yield) {
            let expr = self.parse_yield()?;
            self.expect(&TokenKind::RParen)?;
            return Ok(expr);
        }

        let first = self.parse_star_or_expr()?;

        // Generator expression: (x for x in xs)
        if matches!(self.peek(), TokenKind::For) {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(&TokenKind::RParen)?;
            let span = start.merge(self.previous_span());
            return Ok(Spanned::new(
                Expr::GeneratorExp {
                    elt: Box::new(first),
                    generators,
                },
                span,
            ));
        }

        // Tuple: (a, b, ...)
        if matches!(self.peek(), TokenKind::Comma) {
            let mut elems = vec![first];
            while self.match_token(&TokenKind::Comma) {
                if matches!(self.peek(), TokenKind::RParen) {
                    break;
                }
                elems.push(self.parse_star_or_expr()?);
            }
            self.expect(&TokenKind::RParen)?;
            let span = start.merge(self.previous_span());
            return Ok(Spanned::new(Expr::Tuple(elems), span));
        }

        // Parenthesized expression
        self.expect(&TokenKind::RParen)?;
        Ok(first)
    }

    fn parse_list_display(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let start = self.peek_span();
        self.advance(); // consume '['

        let mut elems = Vec::new();
        if !matches!(self.peek(), TokenKind::RBracket) {
            let first = self.parse_star_or_expr()?;
            if matches!(self.peek(), TokenKind::For) {
                let generators = self.parse_comprehension_clauses()?;
                self.expect(&TokenKind::RBracket)?;
                let span = start.merge(self.previous_span());
                return Ok(Spanned::new(
                    Expr::ListComp {
                        elt: Box::new(first),
                        generators,
                    },
                    span,
                ));
            }
            elems.push(first);
            while self.match_token(&TokenKind::Comma) {
                if matches!(self.peek(), TokenKind::RBracket) {
                    break; // allow trailing comma
                }
                elems.push(self.parse_star_or_expr()?);
            }
        }

        self.expect(&TokenKind::RBracket)?;
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(Expr::List(elems), span))
    }

    /// `{}` dict, `{k: v}` dict, `{a, b}` set, or a dict/set comprehension.
    fn parse_brace_display(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let start = self.peek_span();
        self.advance(); // consume '{'

        if self.match_token(&TokenKind::RBrace) {
            let span = start.merge(self.previous_span());
            return Ok(Spanned::new(Expr::Dict(Vec::new()), span));
        }
        if matches!(self.peek(), TokenKind::DoubleStar) {
            return Err(self.unexpected("dict entry"));
        }

        let first = self.parse_star_or_expr()?;

        if self.match_token(&TokenKind::Colon) {
            let value = self.parse_expr()?;
            if matches!(self.peek(), TokenKind::For) {
                let generators = self.parse_comprehension_clauses()?;
                self.expect(&TokenKind::RBrace)?;
                let span = start.merge(self.previous_span());
                return Ok(Spanned::new(
                    Expr::DictComp {
                        key: Box::new(first),
                        value: Box::new(value),
                        generators,
                    },
                    span,
                ));
            }
            let mut pairs = vec![(first, value)];
            while self.match_token(&TokenKind::Comma) {
                if matches!(self.peek(), TokenKind::RBrace) {
                    break;
                }
                if matches!(self.peek(), TokenKind::DoubleStar) {
                    return Err(self.unexpected("dict entry"));
                }
                let key = self.parse_expr()?;
                self.expect(&TokenKind::Colon)?;
                let value = self.parse_expr()?;
                pairs.push((key, value));
            }
            self.expect(&TokenKind::RBrace)?;
            let span = start.merge(self.previous_span());
            return Ok(Spanned::new(Expr::Dict(pairs), span));
        }

        if matches!(self.peek(), TokenKind::For) {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(&TokenKind::RBrace)?;
            let span = start.merge(self.previous_span());
            return Ok(Spanned::new(
                Expr::SetComp {
                    elt: Box::new(first),
                    generators,
                },
                span,
            ));
        }

        let mut elems = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if matches!(self.peek(), TokenKind::RBrace) {
                break;
            }
            elems.push(self.parse_star_or_expr()?);
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(Expr::Set(elems), span))
    }

    /// One or more `for target in iter [if cond]...` clauses.
    fn parse_comprehension_clauses(&mut self) -> Result<Vec<Comprehension>, PyLuaError> {
        let mut generators = Vec::new();
        while self.match_token(&TokenKind::For) {
            let target = self.parse_target_list()?;
            self.expect(&TokenKind::In)?;
            let iter = self.parse_or()?;
            let mut ifs = Vec::new();
            while self.match_token(&TokenKind::If) {
                ifs.push(self.parse_or()?);
            }
            generators.push(Comprehension { target, iter, ifs });
        }
        Ok(generators)
    }

    fn parse_lambda(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let start = self.peek_span();
        self.advance(); // consume 'lambda'

        let args = self.parse_parameters(&TokenKind::Colon, false)?;
        self.expect(&TokenKind::Colon)?;

        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        Ok(Spanned::new(
            Expr::Lambda {
                args: Box::new(args),
                body: Box::new(body),
            },
            span,
        ))
    }

    /// Parse a parameter list up to `closing` (not consumed).
    pub(crate) fn parse_parameters(
        &mut self,
        closing: &TokenKind,
        annotations: bool,
    ) -> Result<Arguments, PyLuaError> {
        let mut args = Arguments::default();
        let mut keyword_only = false;

        while !self.check(closing) {
            match self.peek() {
                TokenKind::Slash => {
                    // Positional-only marker
                    self.advance();
                }
                TokenKind::Star => {
                    self.advance(); // consume '*'
                    keyword_only = true;
                    if matches!(self.peek(), TokenKind::Ident(_)) {
                        let name = self.expect_ident()?;
                        self.skip_annotation(annotations)?;
                        args.vararg = Some(name);
                    }
                }
                TokenKind::DoubleStar => {
                    self.advance(); // consume '**'
                    let name = self.expect_ident()?;
                    self.skip_annotation(annotations)?;
                    args.kwarg = Some(name);
                }
                _ => {
                    let name = self.expect_ident()?;
                    self.skip_annotation(annotations)?;
                    let default = if self.match_token(&TokenKind::Eq) {
                        Some(self.parse_expr()?)
                    } else {
                        None
                    };
                    let param = Param { name, default };
                    if keyword_only {
                        args.kwonly.push(param);
                    } else {
                        args.args.push(param);
                    }
                }
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn skip_annotation(&mut self, annotations: bool) -> Result<(), PyLuaError> {
        if annotations && self.match_token(&TokenKind::Colon) {
            self.parse_expr()?;
        }
        Ok(())
    }

    /// `yield [expr_list]` or `yield from expr`.
    pub(crate) fn parse_yield(&mut self) -> Result<SpannedExpr, PyLuaError> {
        let start = self.peek_span();
        self.advance(); // consume 'yield'
        let from = self.match_token(&TokenKind::From);
        let value = if from {
            Some(Box::new(self.parse_expr()?))
        } else if self.starts_expression() {
            Some(Box::new(self.parse_expr_list()?))
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(Expr::Yield { value, from }, span))
    }
}

fn bool_op(op: BoolOp, values: Vec<SpannedExpr>) -> SpannedExpr {
    let span = match (values.first(), values.last()) {
        (Some(first), Some(last)) => first.span.merge(last.span),
        _ => Span::default(),
    };
    Spanned::new(Expr::BoolOp { op, values }, span)
}

fn push_literal(parts: &mut Vec<FStringPart>, s: String) {
    if let Some(FStringPart::Literal(last)) = parts.last_mut() {
        last.push_str(&s);
    } else {
        parts.push(FStringPart::Literal(s));
    }
}
