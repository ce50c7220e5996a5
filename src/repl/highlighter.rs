use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::Context;
use rustyline::Helper;
use std::borrow::Cow;

use crate::lexer::token::KEYWORDS;

pub struct PyLuaHelper;

impl Helper for PyLuaHelper {}

impl Completer for PyLuaHelper {
    type Candidate = Pair;

    /// Completes source keywords at the end of the line.
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(|c: char| !(c.is_alphanumeric() || c == '_'))
            .map_or(0, |i| i + 1);
        let word = &prefix[start..];
        if word.is_empty() {
            return Ok((pos, vec![]));
        }
        let candidates = KEYWORDS
            .iter()
            .filter(|kw| kw.starts_with(word) && **kw != word)
            .map(|kw| Pair {
                display: kw.to_string(),
                replacement: kw.to_string(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for PyLuaHelper {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for PyLuaHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(highlight_source(line))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Validator for PyLuaHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

/// ANSI-colour one line of Python source.
pub fn highlight_source(line: &str) -> String {
    let mut result = String::with_capacity(line.len() + 64);
    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        let ch = chars[i];

        // Comments
        if ch == '#' {
            result.push_str("\x1b[90m");
            result.extend(&chars[i..]);
            result.push_str("\x1b[0m");
            break;
        }

        // String literals, either quote
        if ch == '"' || ch == '\'' {
            result.push_str("\x1b[32m");
            result.push(ch);
            i += 1;
            while i < len && chars[i] != ch {
                if chars[i] == '\\' && i + 1 < len {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push(chars[i]);
                i += 1;
            }
            if i < len {
                result.push(chars[i]);
                i += 1;
            }
            result.push_str("\x1b[0m");
            continue;
        }

        if ch.is_ascii_digit() {
            result.push_str("\x1b[36m");
            while i < len && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_') {
                result.push(chars[i]);
                i += 1;
            }
            result.push_str("\x1b[0m");
            continue;
        }

        // Identifiers / keywords
        if ch.is_alphabetic() || ch == '_' {
            let mut word = String::new();
            while i < len && (chars[i].is_alphanumeric() || chars[i] == '_') {
                word.push(chars[i]);
                i += 1;
            }
            if KEYWORDS.contains(&word.as_str()) {
                result.push_str("\x1b[1;34m");
                result.push_str(&word);
                result.push_str("\x1b[0m");
            } else if word.starts_with(|c: char| c.is_uppercase()) {
                result.push_str("\x1b[33m");
                result.push_str(&word);
                result.push_str("\x1b[0m");
            } else {
                result.push_str(&word);
            }
            continue;
        }

        // Decorators
        if ch == '@' && result.trim().is_empty() {
            result.push_str("\x1b[35m@\x1b[0m");
            i += 1;
            continue;
        }

        result.push(ch);
        i += 1;
    }

    result
}
