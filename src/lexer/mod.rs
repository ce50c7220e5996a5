pub mod token;

use crate::error::PyLuaError;
use crate::span::Span;
use token::{InterpPart, Token, TokenKind};

/// String literal prefix flags (`r`, `b`, `f`; `u` is accepted and ignored).
#[derive(Debug, Clone, Copy, Default)]
struct StrPrefix {
    raw: bool,
    bytes: bool,
    format: bool,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    start: usize,
    /// Added to every span; non-zero when lexing an f-string replacement field.
    offset: usize,
    /// Whether to emit `Newline`/`Indent`/`Dedent`.
    layout: bool,
    indents: Vec<usize>,
    bracket_depth: usize,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            start: 0,
            offset: 0,
            layout: true,
            indents: vec![0],
            bracket_depth: 0,
            at_line_start: true,
        }
    }

    /// A lexer for a bare expression, with no layout tokens.
    fn for_expression(source: &str, offset: usize) -> Self {
        let mut lexer = Lexer::new(source);
        lexer.offset = offset;
        lexer.layout = false;
        lexer.bracket_depth = 1;
        lexer.at_line_start = false;
        lexer
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, Vec<PyLuaError>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            if self.at_line_start && self.bracket_depth == 0 {
                self.at_line_start = false;
                match self.scan_indentation(&mut tokens) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        errors.push(e);
                        break;
                    }
                }
            }

            self.skip_whitespace_and_comments();
            if self.is_at_end() {
                break;
            }

            self.start = self.pos;
            let result = match self.advance() {
                '\n' => {
                    if self.bracket_depth == 0 {
                        self.at_line_start = true;
                        Ok(Some(self.make_token(TokenKind::Newline)))
                    } else {
                        Ok(None)
                    }
                }
                '(' => Ok(Some(self.open(TokenKind::LParen))),
                '[' => Ok(Some(self.open(TokenKind::LBracket))),
                '{' => Ok(Some(self.open(TokenKind::LBrace))),
                ')' => Ok(Some(self.close(TokenKind::RParen))),
                ']' => Ok(Some(self.close(TokenKind::RBracket))),
                '}' => Ok(Some(self.close(TokenKind::RBrace))),
                ',' => Ok(Some(self.make_token(TokenKind::Comma))),
                ';' => Ok(Some(self.make_token(TokenKind::Semicolon))),
                '~' => Ok(Some(self.make_token(TokenKind::Tilde))),

                '.' => {
                    if self.peek().is_ascii_digit() {
                        self.scan_number('.').map(Some)
                    } else if self.peek() == '.' && self.peek_next() == '.' {
                        self.pos += 2;
                        Ok(Some(self.make_token(TokenKind::Ellipsis)))
                    } else {
                        Ok(Some(self.make_token(TokenKind::Dot)))
                    }
                }

                ':' => {
                    if self.match_char('=') {
                        Ok(Some(self.make_token(TokenKind::Walrus)))
                    } else {
                        Ok(Some(self.make_token(TokenKind::Colon)))
                    }
                }

                '-' => {
                    if self.match_char('>') {
                        Ok(Some(self.make_token(TokenKind::Arrow)))
                    } else {
                        Ok(Some(self.operator("-", TokenKind::Minus)))
                    }
                }
                '+' => Ok(Some(self.operator("+", TokenKind::Plus))),
                '%' => Ok(Some(self.operator("%", TokenKind::Percent))),
                '@' => Ok(Some(self.operator("@", TokenKind::At))),
                '&' => Ok(Some(self.operator("&", TokenKind::Amp))),
                '|' => Ok(Some(self.operator("|", TokenKind::Pipe))),
                '^' => Ok(Some(self.operator("^", TokenKind::Caret))),

                '*' => {
                    if self.match_char('*') {
                        Ok(Some(self.operator("**", TokenKind::DoubleStar)))
                    } else {
                        Ok(Some(self.operator("*", TokenKind::Star)))
                    }
                }
                '/' => {
                    if self.match_char('/') {
                        Ok(Some(self.operator("//", TokenKind::DoubleSlash)))
                    } else {
                        Ok(Some(self.operator("/", TokenKind::Slash)))
                    }
                }

                '<' => {
                    if self.match_char('<') {
                        Ok(Some(self.operator("<<", TokenKind::LShift)))
                    } else if self.match_char('=') {
                        Ok(Some(self.make_token(TokenKind::Le)))
                    } else {
                        Ok(Some(self.make_token(TokenKind::Lt)))
                    }
                }
                '>' => {
                    if self.match_char('>') {
                        Ok(Some(self.operator(">>", TokenKind::RShift)))
                    } else if self.match_char('=') {
                        Ok(Some(self.make_token(TokenKind::Ge)))
                    } else {
                        Ok(Some(self.make_token(TokenKind::Gt)))
                    }
                }

                '=' => {
                    if self.match_char('=') {
                        Ok(Some(self.make_token(TokenKind::EqEq)))
                    } else {
                        Ok(Some(self.make_token(TokenKind::Eq)))
                    }
                }

                '!' => {
                    if self.match_char('=') {
                        Ok(Some(self.make_token(TokenKind::NotEq)))
                    } else {
                        Err(PyLuaError::UnexpectedChar {
                            ch: '!',
                            span: self.current_span(),
                        })
                    }
                }

                quote @ ('"' | '\'') => self.scan_string(quote, StrPrefix::default()).map(Some),

                c if c.is_ascii_digit() => self.scan_number(c).map(Some),

                c if c.is_alphabetic() || c == '_' => self.scan_identifier(c).map(Some),

                c => Err(PyLuaError::UnexpectedChar {
                    ch: c,
                    span: self.current_span(),
                }),
            };

            match result {
                Ok(Some(tok)) => tokens.push(tok),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if self.layout {
            self.finish_layout(&mut tokens);
        }
        tokens.push(self.token_at(TokenKind::Eof, self.pos, self.pos));

        if errors.is_empty() {
            Ok(tokens)
        } else {
            Err(errors)
        }
    }

    /// Measure the indentation of a new logical line and emit `Indent`/`Dedent`.
    /// Blank and comment-only lines are skipped. Returns `false` at end of input.
    fn scan_indentation(&mut self, tokens: &mut Vec<Token>) -> Result<bool, PyLuaError> {
        loop {
            let line_start = self.pos;
            let mut width = 0;
            while !self.is_at_end() {
                match self.peek() {
                    ' ' => width += 1,
                    '\t' => width = (width / 8 + 1) * 8,
                    '\x0c' => width = 0,
                    _ => break,
                }
                self.advance();
            }

            if self.is_at_end() {
                return Ok(false);
            }
            match self.peek() {
                '\r' | '\n' | '#' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                    if self.is_at_end() {
                        return Ok(false);
                    }
                    self.advance();
                    continue;
                }
                _ => {}
            }

            let current = self.indents.last().copied().unwrap_or(0);
            if width > current {
                self.indents.push(width);
                tokens.push(self.token_at(TokenKind::Indent, line_start, self.pos));
            } else if width < current {
                while self.indents.last().copied().unwrap_or(0) > width {
                    self.indents.pop();
                    tokens.push(self.token_at(TokenKind::Dedent, self.pos, self.pos));
                }
                if self.indents.last().copied().unwrap_or(0) != width {
                    return Err(PyLuaError::IndentationError {
                        message: "unindent does not match any outer indentation level"
                            .to_string(),
                        span: Span::new(line_start + self.offset, self.pos + self.offset),
                    });
                }
            }
            return Ok(true);
        }
    }

    /// Close the last logical line and every open indentation level.
    fn finish_layout(&mut self, tokens: &mut Vec<Token>) {
        let needs_newline = tokens
            .last()
            .is_some_and(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Dedent));
        if needs_newline {
            tokens.push(self.token_at(TokenKind::Newline, self.pos, self.pos));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            tokens.push(self.token_at(TokenKind::Dedent, self.pos, self.pos));
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.pos]
        }
    }

    fn peek_next(&self) -> char {
        if self.pos + 1 >= self.chars.len() {
            '\0'
        } else {
            self.chars[self.pos + 1]
        }
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        ch
    }

    fn match_char(&mut self, expected: char) -> bool {
        if !self.is_at_end() && self.chars[self.pos] == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            if self.is_at_end() {
                break;
            }
            match self.peek() {
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.advance();
                }
                '\n' if self.bracket_depth > 0 => {
                    self.advance();
                }
                '\\' if self.peek_next() == '\n' => {
                    // Explicit line joining
                    self.pos += 2;
                }
                '\\' if self.peek_next() == '\r' => {
                    self.pos += 2;
                    self.match_char('\n');
                }
                '#' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn token_at(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        Token::new(kind, Span::new(start + self.offset, end + self.offset))
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        self.token_at(kind, self.start, self.pos)
    }

    fn current_span(&self) -> Span {
        Span::new(self.start + self.offset, self.pos + self.offset)
    }

    fn open(&mut self, kind: TokenKind) -> Token {
        self.bracket_depth += 1;
        self.make_token(kind)
    }

    fn close(&mut self, kind: TokenKind) -> Token {
        self.bracket_depth = self.bracket_depth.saturating_sub(1);
        self.make_token(kind)
    }

    /// An operator that may be followed by `=` to form an augmented assignment.
    fn operator(&mut self, text: &'static str, kind: TokenKind) -> Token {
        if self.match_char('=') {
            self.make_token(TokenKind::AugAssign(text))
        } else {
            self.make_token(kind)
        }
    }

    fn scan_string(&mut self, quote: char, prefix: StrPrefix) -> Result<Token, PyLuaError> {
        let triple = self.peek() == quote && self.peek_next() == quote;
        if triple {
            self.pos += 2;
        }

        let mut current_lit = String::new();
        let mut parts: Vec<InterpPart> = Vec::new();

        loop {
            if self.is_at_end() {
                return Err(PyLuaError::UnterminatedString {
                    span: self.current_span(),
                });
            }
            let ch = self.advance();
            if ch == quote {
                if !triple {
                    break;
                }
                if self.peek() == quote && self.peek_next() == quote {
                    self.pos += 2;
                    break;
                }
                current_lit.push(ch);
            } else if ch == '\n' && !triple {
                return Err(PyLuaError::UnterminatedString {
                    span: self.current_span(),
                });
            } else if ch == '\\' {
                if self.is_at_end() {
                    return Err(PyLuaError::UnterminatedString {
                        span: self.current_span(),
                    });
                }
                if prefix.raw {
                    current_lit.push('\\');
                    current_lit.push(self.advance());
                } else {
                    self.scan_escape(&mut current_lit)?;
                }
            } else if prefix.format && ch == '{' {
                if self.match_char('{') {
                    current_lit.push('{');
                    continue;
                }
                if !current_lit.is_empty() {
                    parts.push(InterpPart::Literal(std::mem::take(&mut current_lit)));
                }
                parts.push(InterpPart::Tokens(self.scan_replacement_field(quote)?));
            } else if prefix.format && ch == '}' {
                // A lone `}` is only valid doubled
                self.match_char('}');
                current_lit.push('}');
            } else {
                current_lit.push(ch);
            }
        }

        if prefix.format {
            if !current_lit.is_empty() || parts.is_empty() {
                parts.push(InterpPart::Literal(current_lit));
            }
            return Ok(self.make_token(TokenKind::FString(parts)));
        }
        if prefix.bytes {
            let mut bytes = Vec::with_capacity(current_lit.len());
            for c in current_lit.chars() {
                match u8::try_from(u32::from(c)) {
                    Ok(b) => bytes.push(b),
                    Err(_) => {
                        return Err(PyLuaError::UnexpectedChar {
                            ch: c,
                            span: self.current_span(),
                        })
                    }
                }
            }
            return Ok(self.make_token(TokenKind::BytesLit(bytes)));
        }
        Ok(self.make_token(TokenKind::StringLit(current_lit)))
    }

    fn scan_escape(&mut self, out: &mut String) -> Result<(), PyLuaError> {
        let escaped = self.advance();
        match escaped {
            '\n' => {}
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '0'..='7' => {
                let mut value = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().to_digit(8) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.advance();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            'x' | 'u' | 'U' => {
                let digits = match escaped {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut value = 0u32;
                for _ in 0..digits {
                    match self.peek().to_digit(16) {
                        Some(d) => {
                            value = value * 16 + d;
                            self.advance();
                        }
                        None => {
                            return Err(PyLuaError::UnexpectedChar {
                                ch: self.peek(),
                                span: Span::new(self.pos + self.offset, self.pos + self.offset + 1),
                            })
                        }
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    /// Scan `{expr}` inside an f-string, returning the expression's tokens.
    fn scan_replacement_field(&mut self, quote: char) -> Result<Vec<Token>, PyLuaError> {
        let field_start = self.pos;
        let mut depth = 0usize;
        let mut expr_src = String::new();

        loop {
            if self.is_at_end() || self.peek() == quote {
                return Err(PyLuaError::UnterminatedString {
                    span: self.current_span(),
                });
            }
            let c = self.advance();
            match c {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                '}' if depth == 0 => break,
                '}' => depth -= 1,
                '!' if depth == 0 && self.peek() != '=' => {
                    return Err(PyLuaError::unsupported(
                        "f-string conversion",
                        Span::new(self.pos - 1 + self.offset, self.pos + self.offset),
                    ));
                }
                ':' if depth == 0 => {
                    return Err(PyLuaError::unsupported(
                        "f-string format specification",
                        Span::new(self.pos - 1 + self.offset, self.pos + self.offset),
                    ));
                }
                _ => {}
            }
            expr_src.push(c);
        }

        let field_span = Span::new(field_start + self.offset, self.pos + self.offset);
        let mut inner = Lexer::for_expression(&expr_src, field_start + self.offset);
        let inner_tokens = inner.tokenize().map_err(|errs| {
            errs.into_iter()
                .next()
                .unwrap_or(PyLuaError::UnterminatedString { span: field_span })
        })?;
        Ok(inner_tokens
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::Eof))
            .collect())
    }

    fn scan_number(&mut self, first: char) -> Result<Token, PyLuaError> {
        if first == '0' && matches!(self.peek(), 'x' | 'X' | 'o' | 'O' | 'b' | 'B') {
            let radix = match self.advance() {
                'x' | 'X' => 16,
                'o' | 'O' => 8,
                _ => 2,
            };
            let mut digits = String::new();
            while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
                let c = self.advance();
                if c != '_' {
                    digits.push(c);
                }
            }
            return match i64::from_str_radix(&digits, radix) {
                Ok(val) => Ok(self.make_token(TokenKind::IntLit(val))),
                Err(_) => Err(self.invalid_number()),
            };
        }

        let mut num_str = String::new();
        let mut is_float = first == '.';
        if is_float {
            num_str.push('0');
        }
        num_str.push(first);

        self.scan_digits(&mut num_str);

        if !is_float && self.peek() == '.' && self.peek_next() != '.' {
            is_float = true;
            num_str.push(self.advance());
            self.scan_digits(&mut num_str);
        }

        if matches!(self.peek(), 'e' | 'E')
            && (self.peek_next().is_ascii_digit()
                || (matches!(self.peek_next(), '+' | '-')
                    && self
                        .chars
                        .get(self.pos + 2)
                        .is_some_and(|c| c.is_ascii_digit())))
        {
            is_float = true;
            num_str.push(self.advance());
            if matches!(self.peek(), '+' | '-') {
                num_str.push(self.advance());
            }
            self.scan_digits(&mut num_str);
        }

        if self.peek().is_alphanumeric() {
            // Imaginary literals and stray suffixes
            while self.peek().is_alphanumeric() {
                self.advance();
            }
            return Err(self.invalid_number());
        }

        if is_float {
            match num_str.parse::<f64>() {
                Ok(val) => Ok(self.make_token(TokenKind::FloatLit(val))),
                Err(_) => Err(self.invalid_number()),
            }
        } else {
            match num_str.parse::<i64>() {
                Ok(val) => Ok(self.make_token(TokenKind::IntLit(val))),
                Err(_) => Err(self.invalid_number()),
            }
        }
    }

    fn scan_digits(&mut self, out: &mut String) {
        while self.peek().is_ascii_digit() || (self.peek() == '_' && self.peek_next().is_ascii_digit())
        {
            let c = self.advance();
            if c != '_' {
                out.push(c);
            }
        }
    }

    fn invalid_number(&self) -> PyLuaError {
        PyLuaError::InvalidNumber {
            literal: self.chars[self.start..self.pos].iter().collect(),
            span: self.current_span(),
        }
    }

    fn scan_identifier(&mut self, first: char) -> Result<Token, PyLuaError> {
        let mut ident = String::from(first);
        while !self.is_at_end() && (self.peek().is_alphanumeric() || self.peek() == '_') {
            ident.push(self.advance());
        }

        if matches!(self.peek(), '"' | '\'') {
            if let Some(prefix) = string_prefix(&ident) {
                let quote = self.advance();
                return self.scan_string(quote, prefix);
            }
        }

        let kind = TokenKind::keyword(&ident).unwrap_or(TokenKind::Ident(ident));
        Ok(self.make_token(kind))
    }
}

fn string_prefix(ident: &str) -> Option<StrPrefix> {
    if ident.len() > 2 {
        return None;
    }
    let mut prefix = StrPrefix::default();
    for c in ident.chars() {
        match c.to_ascii_lowercase() {
            'r' if !prefix.raw => prefix.raw = true,
            'b' if !prefix.bytes && !prefix.format => prefix.bytes = true,
            'f' if !prefix.format && !prefix.bytes => prefix.format = true,
            'u' if ident.len() == 1 => {}
            _ => return None,
        }
    }
    Some(prefix)
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, Vec<PyLuaError>> {
    Lexer::new(source).tokenize()
}
