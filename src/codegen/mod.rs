pub mod expr;
pub mod labels;
pub mod operators;
pub mod output;
pub mod scope;
pub mod stmt;
pub mod symbols;

use std::borrow::Cow;
use std::collections::HashSet;

use tracing::trace;

use crate::ast::*;
use crate::config::Config;
use crate::error::PyLuaError;

use labels::LabelAllocator;
use output::Output;
use scope::ScopeContext;

/// Lua reserved words; names that collide get a `_` suffix.
const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Translates one module's AST into an output tree.
pub struct Generator<'a> {
    config: &'a Config,
    labels: &'a LabelAllocator,
    scope: &'a mut ScopeContext,
    /// Loop labels targeted by at least one `continue`.
    continued: HashSet<String>,
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a Config, labels: &'a LabelAllocator, scope: &'a mut ScopeContext) -> Self {
        Generator {
            config,
            labels,
            scope,
            continued: HashSet::new(),
        }
    }

    /// Generate a whole module. Module-level bindings are recorded in the
    /// scope's root tables, so a later call with the same scope sees them.
    pub fn module(&mut self, module: &Module) -> Result<Output, PyLuaError> {
        trace!(statements = module.body.len(), "generating module");
        self.statements(&module.body)
    }

    fn statements(&mut self, stmts: &[SpannedStmt]) -> Result<Output, PyLuaError> {
        let mut out = Output::new();
        for (i, stmt) in stmts.iter().enumerate() {
            // Lua only allows `return` as the last statement of a block
            if matches!(stmt.node, Stmt::Return(_)) && i + 1 < stmts.len() {
                let mut inner = Output::new();
                self.stmt(stmt, &mut inner)?;
                out.line(format!("do {} end", inner.render()));
                continue;
            }
            self.stmt(stmt, &mut out)?;
        }
        Ok(out)
    }

    /// Generate a nested block. `seeds` are bound in the block before its body
    /// (loop targets, parameters) and never receive `local`.
    fn block(&mut self, stmts: &[SpannedStmt], seeds: &[String]) -> Result<Output, PyLuaError> {
        self.scope.locals_mut().push();
        for seed in seeds {
            self.scope.locals_mut().add(seed.as_str());
        }
        let result = self.statements(stmts);
        self.scope.locals_mut().pop();
        result
    }

    /// Run `f` inside a frame pushed with `overrides`, popping it afterwards.
    fn framed<T>(
        &mut self,
        isolated: bool,
        overrides: impl FnOnce(&mut scope::ScopeFrame),
        f: impl FnOnce(&mut Self) -> Result<T, PyLuaError>,
    ) -> Result<T, PyLuaError> {
        if isolated {
            self.scope.push_isolated(overrides);
        } else {
            self.scope.push(overrides);
        }
        let result = f(self);
        self.scope.pop()?;
        result
    }

    /// Record a write to `name` in the current scope. Returns `true` when the
    /// write is the binding's first and must be declared `local`.
    fn declare(&mut self, name: &str) -> bool {
        if self.scope.is_bound(name) {
            return false;
        }
        self.scope.locals_mut().add(name);
        !(self.scope.current().module_level && !self.config.top_locals)
    }

    fn local_keyword(declared: bool) -> &'static str {
        if declared {
            "local "
        } else {
            ""
        }
    }
}

/// A source identifier as a valid Lua name.
pub fn lua_name(name: &str) -> Cow<'_, str> {
    if LUA_KEYWORDS.contains(&name) {
        Cow::Owned(format!("{}_", name))
    } else {
        Cow::Borrowed(name)
    }
}

/// Smallest long-bracket level whose closing bracket cannot appear in `text`.
fn long_bracket_level(text: &str) -> usize {
    (0..)
        .find(|&level| {
            let close = format!("]{}", "=".repeat(level));
            !text.contains(&format!("{}]", close)) && !text.ends_with(&close)
        })
        .unwrap_or(0)
}

/// `[==[text]==]`. Lua drops a newline directly after the opening bracket, so
/// a leading newline is doubled.
pub fn long_string(text: &str) -> String {
    let eq = "=".repeat(long_bracket_level(text));
    let lead = if text.starts_with('\n') { "\n" } else { "" };
    format!("[{eq}[{lead}{text}]{eq}]", eq = eq, lead = lead, text = text)
}

/// `--[[ text ]]`, levelled so `text` cannot close the comment early.
pub fn block_comment(text: &str) -> String {
    let eq = "=".repeat(long_bracket_level(&format!(" {} ", text)));
    format!("--[{eq}[ {text} ]{eq}]", eq = eq, text = text)
}

/// A double-quoted Lua string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\{:03}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A Lua string literal holding raw bytes.
pub fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\{:03}", b)),
        }
    }
    out.push('"');
    out
}

/// Names bound by an assignment or loop target (flattening tuples).
fn target_names(target: &Expr, names: &mut Vec<String>) {
    match target {
        Expr::Name(name) => names.push(lua_name(name).into_owned()),
        Expr::Tuple(elems) | Expr::List(elems) => {
            for elem in elems {
                target_names(&elem.node, names);
            }
        }
        Expr::Starred(inner) => target_names(&inner.node, names),
        _ => {}
    }
}

/// Whether a statement list ends with `return`, so nothing may follow it in Lua.
fn ends_with_return(stmts: &[SpannedStmt]) -> bool {
    matches!(stmts.last().map(|s| &s.node), Some(Stmt::Return(_)))
}
