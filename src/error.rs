use std::fmt;

use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum PyLuaError {
    // Lexer errors
    UnexpectedChar { ch: char, span: Span },
    UnterminatedString { span: Span },
    InvalidNumber { literal: String, span: Span },
    IndentationError { message: String, span: Span },

    // Parser errors
    UnexpectedToken { expected: String, found: String, span: Span },
    ExpectedExpression { found: String, span: Span },
    InvalidTarget { target: String, span: Span },

    // Translation errors
    UnsupportedConstruct { construct: String, span: Span },
    ContinueOutsideLoop { span: Span },
    BreakOutsideLoop { span: Span },
    ScopeUnderflow,

    // Configuration and IO errors
    Config { path: String, message: String },
    FileNotFound { path: String },
    IoError { msg: String },
}

impl PyLuaError {
    pub fn unsupported(construct: impl Into<String>, span: Span) -> Self {
        PyLuaError::UnsupportedConstruct {
            construct: construct.into(),
            span,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            PyLuaError::UnexpectedChar { span, .. }
            | PyLuaError::UnterminatedString { span, .. }
            | PyLuaError::InvalidNumber { span, .. }
            | PyLuaError::IndentationError { span, .. }
            | PyLuaError::UnexpectedToken { span, .. }
            | PyLuaError::ExpectedExpression { span, .. }
            | PyLuaError::InvalidTarget { span, .. }
            | PyLuaError::UnsupportedConstruct { span, .. }
            | PyLuaError::ContinueOutsideLoop { span, .. }
            | PyLuaError::BreakOutsideLoop { span, .. } => Some(*span),
            PyLuaError::ScopeUnderflow
            | PyLuaError::Config { .. }
            | PyLuaError::FileNotFound { .. }
            | PyLuaError::IoError { .. } => None,
        }
    }

    fn message(&self) -> String {
        match self {
            PyLuaError::UnexpectedChar { ch, .. } => {
                format!("unexpected character '{}'", ch)
            }
            PyLuaError::UnterminatedString { .. } => "unterminated string literal".to_string(),
            PyLuaError::InvalidNumber { literal, .. } => {
                format!("invalid number literal '{}'", literal)
            }
            PyLuaError::IndentationError { message, .. } => message.clone(),
            PyLuaError::UnexpectedToken {
                expected, found, ..
            } => {
                format!("expected {}, found {}", expected, found)
            }
            PyLuaError::ExpectedExpression { found, .. } => {
                format!("expected expression, found {}", found)
            }
            PyLuaError::InvalidTarget { target, .. } => {
                format!("cannot assign to {}", target)
            }
            PyLuaError::UnsupportedConstruct { construct, .. } => {
                format!("{} cannot be translated to Lua", construct)
            }
            PyLuaError::ContinueOutsideLoop { .. } => "'continue' not properly in loop".to_string(),
            PyLuaError::BreakOutsideLoop { .. } => "'break' outside loop".to_string(),
            PyLuaError::ScopeUnderflow => "cannot pop the outermost scope frame".to_string(),
            PyLuaError::Config { path, message } => {
                format!("invalid configuration in {}: {}", path, message)
            }
            PyLuaError::FileNotFound { path } => format!("file not found: {}", path),
            PyLuaError::IoError { msg } => format!("IO error: {}", msg),
        }
    }

    fn label(&self) -> String {
        match self {
            PyLuaError::UnexpectedToken { expected, .. } => format!("expected {} here", expected),
            PyLuaError::UnsupportedConstruct { .. } => "no Lua equivalent".to_string(),
            _ => self.message(),
        }
    }

    fn kind_str(&self) -> &'static str {
        match self {
            PyLuaError::UnexpectedChar { .. }
            | PyLuaError::UnterminatedString { .. }
            | PyLuaError::InvalidNumber { .. } => "syntax error",
            PyLuaError::IndentationError { .. } => "indentation error",
            PyLuaError::UnexpectedToken { .. }
            | PyLuaError::ExpectedExpression { .. }
            | PyLuaError::InvalidTarget { .. } => "parse error",
            PyLuaError::UnsupportedConstruct { .. }
            | PyLuaError::ContinueOutsideLoop { .. }
            | PyLuaError::BreakOutsideLoop { .. }
            | PyLuaError::ScopeUnderflow => "translation error",
            PyLuaError::Config { .. } => "config error",
            PyLuaError::FileNotFound { .. } | PyLuaError::IoError { .. } => "io error",
        }
    }

    /// Render error with source snippet and caret pointing to the span.
    pub fn render(&self, source: &str, filename: &str) -> String {
        let msg = self.message();
        let kind = self.kind_str();

        let span = match self.span() {
            Some(s) => s,
            None => return format!("\x1b[1;31m{}\x1b[0m: {}", kind, msg),
        };

        let (line_num, col, line_text) = locate_in_source(source, span);
        let width = line_num.to_string().len();
        let line_len = line_text.chars().count();
        let caret_len = span
            .len()
            .max(1)
            .min(line_len.saturating_sub(col.saturating_sub(1)));
        let label = self.label();

        format!(
            "\x1b[1;31m{kind}\x1b[0m: {msg}\n \x1b[1;34m-->\x1b[0m {file}:{line}:{col}\n{pad} \x1b[1;34m|\x1b[0m\n\x1b[1;34m{line_num:>width$}\x1b[0m \x1b[1;34m|\x1b[0m {line_text}\n{pad} \x1b[1;34m|\x1b[0m {spaces}\x1b[1;31m{carets} {label}\x1b[0m",
            kind = kind,
            msg = msg,
            file = filename,
            line = line_num,
            col = col,
            pad = " ".repeat(width),
            width = width,
            line_text = line_text,
            spaces = " ".repeat(col.saturating_sub(1)),
            carets = "^".repeat(caret_len.max(1)),
            label = label,
        )
    }
}

/// Find the 1-based line and column of a char-offset span, plus that line's text.
fn locate_in_source(source: &str, span: Span) -> (usize, usize, String) {
    let mut line_num = 1;
    let mut line_start = 0;

    for (i, ch) in source.chars().enumerate() {
        if i >= span.start {
            break;
        }
        if ch == '\n' {
            line_num += 1;
            line_start = i + 1;
        }
    }

    let col = span.start.saturating_sub(line_start) + 1;
    let line_text: String = source
        .chars()
        .skip(line_start)
        .take_while(|c| *c != '\n')
        .collect();

    (line_num, col, line_text)
}

impl fmt::Display for PyLuaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind_str(), self.message())
    }
}

impl std::error::Error for PyLuaError {}

impl From<std::io::Error> for PyLuaError {
    fn from(err: std::io::Error) -> Self {
        PyLuaError::IoError {
            msg: err.to_string(),
        }
    }
}

/// Levenshtein edit distance between two strings.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];
    for (i, ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// Find the closest match to `name` in `candidates` by edit distance.
pub fn suggest_similar(name: &str, candidates: &[&str]) -> Option<String> {
    let threshold = match name.len() {
        0..=2 => 1,
        3..=5 => 2,
        _ => 3,
    };
    candidates
        .iter()
        .filter(|c| {
            let dist = levenshtein(name, c);
            dist > 0 && dist <= threshold
        })
        .min_by_key(|c| levenshtein(name, c))
        .map(|c| c.to_string())
}
