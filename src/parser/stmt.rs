use crate::ast::*;
use crate::error::PyLuaError;
use crate::lexer::token::TokenKind;
use crate::span::{Span, Spanned};

use super::Parser;

impl Parser {
    /// Parse one logical line or compound statement, appending to `out`.
    /// A line of `;`-separated simple statements yields several statements.
    pub(crate) fn parse_statement_into(
        &mut self,
        out: &mut Vec<SpannedStmt>,
    ) -> Result<(), PyLuaError> {
        match self.peek() {
            TokenKind::If => out.push(self.parse_if()?),
            TokenKind::While => out.push(self.parse_while()?),
            TokenKind::For => out.push(self.parse_for()?),
            TokenKind::Try => out.push(self.parse_try()?),
            TokenKind::With => out.push(self.parse_with()?),
            TokenKind::Def => out.push(self.parse_def(Vec::new())?),
            TokenKind::Class => out.push(self.parse_class(Vec::new())?),
            TokenKind::At => out.push(self.parse_decorated()?),
            TokenKind::Indent => return Err(self.indentation_error("unexpected indent")),
            _ => self.parse_simple_line(out)?,
        }
        Ok(())
    }

    fn indentation_error(&self, message: &str) -> PyLuaError {
        PyLuaError::IndentationError {
            message: message.to_string(),
            span: self.peek_span(),
        }
    }

    /// Simple statements separated by `;`, terminated by a newline.
    fn parse_simple_line(&mut self, out: &mut Vec<SpannedStmt>) -> Result<(), PyLuaError> {
        loop {
            out.push(self.parse_simple_statement()?);
            if !self.match_token(&TokenKind::Semicolon) {
                break;
            }
            if matches!(self.peek(), TokenKind::Newline | TokenKind::Eof) {
                break;
            }
        }
        if !self.is_at_end() {
            self.expect(&TokenKind::Newline)?;
        }
        Ok(())
    }

    /// The body after a `:`; either an indented block or simple statements on the same line.
    fn parse_block(&mut self) -> Result<Vec<SpannedStmt>, PyLuaError> {
        self.expect(&TokenKind::Colon)?;
        let mut body = Vec::new();

        if !self.match_token(&TokenKind::Newline) {
            self.parse_simple_line(&mut body)?;
            return Ok(body);
        }

        if !matches!(self.peek(), TokenKind::Indent) {
            return Err(self.indentation_error("expected an indented block"));
        }
        self.advance(); // consume indent

        while !matches!(self.peek(), TokenKind::Dedent | TokenKind::Eof) {
            if self.match_token(&TokenKind::Newline) {
                continue;
            }
            self.parse_statement_into(&mut body)?;
        }
        self.match_token(&TokenKind::Dedent);
        Ok(body)
    }

    fn parse_simple_statement(&mut self) -> Result<SpannedStmt, PyLuaError> {
        let start = self.peek_span();
        let stmt = match self.peek() {
            TokenKind::Pass => {
                self.advance();
                Stmt::Pass
            }
            TokenKind::Break => {
                self.advance();
                Stmt::Break
            }
            TokenKind::Continue => {
                self.advance();
                Stmt::Continue
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.starts_expression() {
                    Some(self.parse_expr_list()?)
                } else {
                    None
                };
                Stmt::Return(value)
            }
            TokenKind::Del => {
                self.advance();
                let targets = match self.parse_expr_list()? {
                    Spanned {
                        node: Expr::Tuple(elems),
                        ..
                    } => elems,
                    single => vec![single],
                };
                for target in &targets {
                    self.check_target(target)?;
                }
                Stmt::Delete(targets)
            }
            TokenKind::Raise => {
                self.advance();
                let exc = if self.starts_expression() {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                let cause = if exc.is_some() && self.match_token(&TokenKind::From) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Stmt::Raise { exc, cause }
            }
            TokenKind::Assert => {
                self.advance();
                let test = self.parse_expr()?;
                let msg = if self.match_token(&TokenKind::Comma) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Stmt::Assert { test, msg }
            }
            TokenKind::Import => self.parse_import()?,
            TokenKind::From => self.parse_from_import()?,
            TokenKind::Global | TokenKind::Nonlocal => {
                let global = matches!(self.peek(), TokenKind::Global);
                self.advance();
                let mut names = vec![self.expect_ident()?.node];
                while self.match_token(&TokenKind::Comma) {
                    names.push(self.expect_ident()?.node);
                }
                if global {
                    Stmt::Global(names)
                } else {
                    Stmt::Nonlocal(names)
                }
            }
            _ => self.parse_expr_statement()?,
        };
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(stmt, span))
    }

    /// Expression statements and every form of assignment.
    fn parse_expr_statement(&mut self) -> Result<Stmt, PyLuaError> {
        let first = self.parse_rhs()?;

        match self.peek().clone() {
            TokenKind::Eq => {
                let mut exprs = vec![first];
                while self.match_token(&TokenKind::Eq) {
                    exprs.push(self.parse_rhs()?);
                }
                let value = exprs.pop().ok_or(PyLuaError::ExpectedExpression {
                    found: "'='".to_string(),
                    span: self.previous_span(),
                })?;
                for target in &exprs {
                    self.check_target(target)?;
                }
                Ok(Stmt::Assign {
                    targets: exprs,
                    value,
                })
            }
            TokenKind::AugAssign(text) => {
                let op_span = self.peek_span();
                self.advance();
                if !matches!(
                    first.node,
                    Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. }
                ) {
                    return Err(PyLuaError::InvalidTarget {
                        target: first.node.kind_name().to_string(),
                        span: first.span,
                    });
                }
                let op = BinOp::from_aug(text).ok_or(PyLuaError::UnexpectedToken {
                    expected: "assignment operator".to_string(),
                    found: format!("'{}='", text),
                    span: op_span,
                })?;
                let value = self.parse_rhs()?;
                Ok(Stmt::AugAssign {
                    target: first,
                    op,
                    value,
                })
            }
            TokenKind::Colon => {
                self.advance(); // consume ':'
                self.check_target(&first)?;
                self.parse_expr()?; // annotation, discarded
                let value = if self.match_token(&TokenKind::Eq) {
                    Some(self.parse_rhs()?)
                } else {
                    None
                };
                Ok(Stmt::AnnAssign {
                    target: first,
                    value,
                })
            }
            _ => Ok(Stmt::Expr(first)),
        }
    }

    /// An expression list or a `yield` expression.
    fn parse_rhs(&mut self) -> Result<SpannedExpr, PyLuaError> {
        if matches!(self.peek(), TokenKind::Yield) {
            self.parse_yield()
        } else {
            self.parse_expr_list()
        }
    }

    fn parse_import(&mut self) -> Result<Stmt, PyLuaError> {
        self.advance(); // consume 'import'
        let mut names = vec![self.parse_alias(true)?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.parse_alias(true)?);
        }
        Ok(Stmt::Import(names))
    }

    fn parse_from_import(&mut self) -> Result<Stmt, PyLuaError> {
        self.advance(); // consume 'from'
        if matches!(self.peek(), TokenKind::Dot | TokenKind::Ellipsis) {
            return Err(self.unexpected("absolute module name"));
        }
        let module = self.parse_dotted_name()?.node;
        self.expect(&TokenKind::Import)?;

        if matches!(self.peek(), TokenKind::Star) {
            let span = self.peek_span();
            self.advance();
            return Ok(Stmt::ImportFrom {
                module,
                names: vec![Alias {
                    name: "*".to_string(),
                    asname: None,
                    span,
                }],
            });
        }

        let parenthesized = self.match_token(&TokenKind::LParen);
        let mut names = vec![self.parse_alias(false)?];
        while self.match_token(&TokenKind::Comma) {
            if parenthesized && matches!(self.peek(), TokenKind::RParen) {
                break;
            }
            names.push(self.parse_alias(false)?);
        }
        if parenthesized {
            self.expect(&TokenKind::RParen)?;
        }
        Ok(Stmt::ImportFrom { module, names })
    }

    fn parse_alias(&mut self, dotted: bool) -> Result<Alias, PyLuaError> {
        let name = if dotted {
            self.parse_dotted_name()?
        } else {
            self.expect_ident()?
        };
        let asname = if self.match_token(&TokenKind::As) {
            Some(self.expect_ident()?.node)
        } else {
            None
        };
        Ok(Alias {
            name: name.node,
            asname,
            span: name.span.merge(self.previous_span()),
        })
    }

    fn parse_dotted_name(&mut self) -> Result<Spanned<String>, PyLuaError> {
        let first = self.expect_ident()?;
        let mut name = first.node;
        let mut span = first.span;
        while self.match_token(&TokenKind::Dot) {
            let part = self.expect_ident()?;
            name.push('.');
            name.push_str(&part.node);
            span = span.merge(part.span);
        }
        Ok(Spanned::new(name, span))
    }

    fn parse_if(&mut self) -> Result<SpannedStmt, PyLuaError> {
        let start = self.peek_span();
        self.advance(); // consume 'if' or 'elif'
        let test = self.parse_expr()?;
        let body = self.parse_block()?;

        let orelse = match self.peek() {
            TokenKind::Elif => vec![self.parse_if()?],
            TokenKind::Else => {
                self.advance();
                self.parse_block()?
            }
            _ => Vec::new(),
        };

        let span = start.merge(self.previous_span());
        Ok(Spanned::new(Stmt::If { test, body, orelse }, span))
    }

    fn parse_else_block(&mut self) -> Result<Vec<SpannedStmt>, PyLuaError> {
        if self.match_token(&TokenKind::Else) {
            self.parse_block()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_while(&mut self) -> Result<SpannedStmt, PyLuaError> {
        let start = self.peek_span();
        self.advance(); // consume 'while'
        let test = self.parse_expr()?;
        let body = self.parse_block()?;
        let orelse = self.parse_else_block()?;
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(Stmt::While { test, body, orelse }, span))
    }

    fn parse_for(&mut self) -> Result<SpannedStmt, PyLuaError> {
        let start = self.peek_span();
        self.advance(); // consume 'for'
        let target = self.parse_target_list()?;
        self.expect(&TokenKind::In)?;
        let iter = self.parse_expr_list()?;
        let body = self.parse_block()?;
        let orelse = self.parse_else_block()?;
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(
            Stmt::For {
                target,
                iter,
                body,
                orelse,
            },
            span,
        ))
    }

    fn parse_try(&mut self) -> Result<SpannedStmt, PyLuaError> {
        let start = self.peek_span();
        self.advance(); // consume 'try'
        let body = self.parse_block()?;

        let mut handlers = Vec::new();
        while matches!(self.peek(), TokenKind::Except) {
            let handler_start = self.peek_span();
            self.advance();
            let (typ, name) = if matches!(self.peek(), TokenKind::Colon) {
                (None, None)
            } else {
                let typ = self.parse_expr()?;
                let name = if self.match_token(&TokenKind::As) {
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                (Some(typ), name)
            };
            let handler_span = handler_start.merge(self.previous_span());
            let body = self.parse_block()?;
            handlers.push(ExceptHandler {
                typ,
                name,
                body,
                span: handler_span,
            });
        }

        let orelse = self.parse_else_block()?;
        let finalbody = if self.match_token(&TokenKind::Finally) {
            self.parse_block()?
        } else {
            Vec::new()
        };

        if handlers.is_empty() && finalbody.is_empty() {
            return Err(self.unexpected("'except' or 'finally'"));
        }

        let span = start.merge(self.previous_span());
        Ok(Spanned::new(
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            },
            span,
        ))
    }

    fn parse_with(&mut self) -> Result<SpannedStmt, PyLuaError> {
        let start = self.peek_span();
        self.advance(); // consume 'with'

        let mut items = Vec::new();
        loop {
            let context = self.parse_expr()?;
            let target = if self.match_token(&TokenKind::As) {
                let target = self.parse_expr_bp(0)?;
                self.check_target(&target)?;
                Some(target)
            } else {
                None
            };
            items.push(WithItem { context, target });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        let body = self.parse_block()?;
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(Stmt::With { items, body }, span))
    }

    fn parse_decorated(&mut self) -> Result<SpannedStmt, PyLuaError> {
        let mut decorators = Vec::new();
        while self.match_token(&TokenKind::At) {
            decorators.push(self.parse_expr()?);
            self.expect(&TokenKind::Newline)?;
            while self.match_token(&TokenKind::Newline) {}
        }
        match self.peek() {
            TokenKind::Def => self.parse_def(decorators),
            TokenKind::Class => self.parse_class(decorators),
            _ => Err(self.unexpected("'def' or 'class'")),
        }
    }

    fn parse_def(&mut self, decorators: Vec<SpannedExpr>) -> Result<SpannedStmt, PyLuaError> {
        let start = decorators.first().map(|d| d.span).unwrap_or(self.peek_span());
        self.advance(); // consume 'def'
        let name = self.expect_ident()?;

        self.expect(&TokenKind::LParen)?;
        let args = self.parse_parameters(&TokenKind::RParen, true)?;
        self.expect(&TokenKind::RParen)?;
        if self.match_token(&TokenKind::Arrow) {
            self.parse_expr()?; // return annotation, discarded
        }

        let body = self.parse_block()?;
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(
            Stmt::FunctionDef(FunctionDef {
                name,
                args,
                body,
                decorators,
            }),
            span,
        ))
    }

    fn parse_class(&mut self, decorators: Vec<SpannedExpr>) -> Result<SpannedStmt, PyLuaError> {
        let start: Span = decorators.first().map(|d| d.span).unwrap_or(self.peek_span());
        self.advance(); // consume 'class'
        let name = self.expect_ident()?;

        let (bases, keywords) = if matches!(self.peek(), TokenKind::LParen) {
            let header = Spanned::new(Expr::Name(name.node.clone()), name.span);
            match self.parse_call(header)? {
                Spanned {
                    node: Expr::Call { args, keywords, .. },
                    ..
                } => (args, keywords),
                _ => (Vec::new(), Vec::new()),
            }
        } else {
            (Vec::new(), Vec::new())
        };

        let body = self.parse_block()?;
        let span = start.merge(self.previous_span());
        Ok(Spanned::new(
            Stmt::ClassDef(ClassDef {
                name,
                bases,
                keywords,
                body,
                decorators,
            }),
            span,
        ))
    }
}
