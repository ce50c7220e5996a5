use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::ast::*;
use crate::error::PyLuaError;

use super::operators;
use super::{block_comment, long_string, lua_name, quote, quote_bytes, Generator};

/// Library tables whose functions are called with `.`, never `:`.
const NAMESPACES: &[&str] = &["math", "os", "coroutine", "table", "string"];

/// `[[luacode]]` or `[[luacode=path]]` at the start of a string literal.
fn pragma() -> Option<&'static Regex> {
    static PRAGMA: OnceLock<Option<Regex>> = OnceLock::new();
    PRAGMA
        .get_or_init(|| Regex::new(r"^\[\[luacode(?:=([^\]]+))?\]\]").ok())
        .as_ref()
}

impl Generator<'_> {
    pub(crate) fn expr(&self, expr: &SpannedExpr) -> Result<String, PyLuaError> {
        let text = match &expr.node {
            Expr::Int(value) => value.to_string(),
            Expr::Float(value) if value.is_nan() => String::from("(0/0)"),
            Expr::Float(value) if value.is_infinite() => String::from("math.huge"),
            Expr::Float(value) => format!("{:?}", value),
            Expr::Str(text) => self.string(text),
            Expr::Bytes(bytes) => quote_bytes(bytes),
            Expr::FString(parts) => self.fstring(parts)?,
            Expr::Constant(c) => operators::constant(*c).to_string(),
            Expr::Ellipsis => String::from("..."),
            Expr::Name(name) => lua_name(name).into_owned(),

            Expr::List(elems) => match elems.last() {
                // A trailing nil would not count towards the table's length
                Some(last) if may_be_nil(&last.node) => {
                    format!("list {{{}, n = {}}}", self.expr_list(elems)?, elems.len())
                }
                _ => format!("list {{{}}}", self.expr_list(elems)?),
            },
            Expr::Tuple(elems) if elems.is_empty() => String::from("list {}"),
            Expr::Tuple(elems) => self.expr_list(elems)?,
            Expr::Dict(entries) => {
                let entries = entries
                    .iter()
                    .map(|(k, v)| Ok(format!("[{}] = {}", self.expr(k)?, self.expr(v)?)))
                    .collect::<Result<Vec<_>, PyLuaError>>()?;
                format!("dict {{{}}}", entries.join(", "))
            }
            Expr::Set(_) | Expr::SetComp { .. } => {
                return Err(PyLuaError::unsupported(expr.node.kind_name(), expr.span))
            }

            Expr::BinOp { op, left, right } => {
                let left = self.expr(left)?;
                let right = self.expr(right)?;
                self.binary(*op, &left, &right, expr.span)?
            }
            Expr::BoolOp { op, values } => {
                let values = values
                    .iter()
                    .map(|v| self.expr(v))
                    .collect::<Result<Vec<_>, _>>()?;
                format!("({})", values.join(operators::boolop(*op)))
            }
            Expr::UnaryOp { op, operand } => operators::unaryop(*op).unary(&self.expr(operand)?),
            Expr::Compare {
                left,
                ops,
                comparators,
            } => {
                let mut previous = self.expr(left)?;
                let mut parts = Vec::with_capacity(ops.len());
                for (op, comparator) in ops.iter().zip(comparators) {
                    let current = self.expr(comparator)?;
                    parts.push(operators::cmpop(*op).binary(&previous, &current));
                    previous = current;
                }
                format!("({})", parts.join(" and "))
            }

            Expr::Call {
                func,
                args,
                keywords,
            } => {
                if let Some(keyword) = keywords.first() {
                    return Err(PyLuaError::unsupported(
                        "keyword arguments",
                        keyword.value.span,
                    ));
                }
                let args = self.expr_list(args)?;
                let callee = match &func.node {
                    Expr::Attribute { value, attr } => {
                        let receiver = self.receiver(value)?;
                        let separator = if self.is_namespace(&receiver) { "." } else { ":" };
                        format!("{}{}{}", receiver, separator, lua_name(attr))
                    }
                    Expr::Lambda { .. } => format!("({})", self.expr(func)?),
                    _ => self.receiver(func)?,
                };
                format!("{}({})", callee, args)
            }
            Expr::Attribute { value, attr } => {
                format!("{}.{}", self.receiver(value)?, lua_name(attr))
            }
            Expr::Subscript { value, index } => {
                if let Expr::Tuple(_) = index.node {
                    return Err(PyLuaError::unsupported("tuple subscript", index.span));
                }
                format!("{}[{}]", self.receiver(value)?, self.expr(index)?)
            }
            Expr::Slice { lower, upper, step } => {
                let part = |bound: &Option<Box<SpannedExpr>>| match bound {
                    Some(bound) => self.expr(bound),
                    None => Ok(String::from("nil")),
                };
                format!("Slice({}, {}, {})", part(lower)?, part(upper)?, part(step)?)
            }
            Expr::Starred(value) => format!("unpack({})", self.expr(value)?),

            Expr::IfExp { test, body, orelse } => format!(
                "({} and {} or {})",
                self.expr(test)?,
                self.expr(body)?,
                self.expr(orelse)?
            ),
            Expr::Lambda { args, body } => {
                let params = self.parameters(args)?;
                let mut text = format!("function({}) ", params.join(", "));
                for line in self.prologue(args)? {
                    text.push_str(&line);
                    text.push(' ');
                }
                text.push_str(&format!("return {} end", self.expr(body)?));
                text
            }

            Expr::ListComp { elt, generators } | Expr::GeneratorExp { elt, generators } => {
                let result = self.labels.accumulator();
                let append = format!("{}:append({})", result, self.expr(elt)?);
                self.comprehension(&result, "list {}", &append, generators)?
            }
            Expr::DictComp {
                key,
                value,
                generators,
            } => {
                let result = self.labels.accumulator();
                let store = format!("{}[{}] = {}", result, self.expr(key)?, self.expr(value)?);
                self.comprehension(&result, "dict {}", &store, generators)?
            }

            Expr::Yield { .. } | Expr::NamedExpr { .. } => {
                return Err(PyLuaError::unsupported(expr.node.kind_name(), expr.span))
            }
        };
        Ok(text)
    }

    fn expr_list(&self, elems: &[SpannedExpr]) -> Result<String, PyLuaError> {
        let parts = elems
            .iter()
            .map(|e| self.expr(e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(", "))
    }

    /// An expression in receiver position (`x.y`, `x:y()`, `x[i]`, `x()`).
    /// Anything but a name, attribute, subscript or call is parenthesised.
    fn receiver(&self, expr: &SpannedExpr) -> Result<String, PyLuaError> {
        let text = self.expr(expr)?;
        Ok(match expr.node {
            Expr::Name(_) | Expr::Attribute { .. } | Expr::Subscript { .. } | Expr::Call { .. } => {
                text
            }
            _ => format!("({})", text),
        })
    }

    fn is_namespace(&self, receiver: &str) -> bool {
        NAMESPACES.contains(&receiver)
            || self.scope.current().static_identifier.as_deref() == Some(receiver)
    }

    fn string(&self, text: &str) -> String {
        if let Some(captures) = pragma().and_then(|re| re.captures(text)) {
            let code = &text[captures.get(0).map_or(0, |m| m.end())..];
            return match captures.get(1) {
                Some(path) => match std::fs::read_to_string(path.as_str()) {
                    Ok(contents) => format!("{}\n{}", contents.trim_end_matches('\n'), code),
                    Err(err) => {
                        warn!(path = path.as_str(), error = %err, "luacode file could not be read");
                        code.to_string()
                    }
                },
                None => code.to_string(),
            };
        }
        if self.scope.current().docstring {
            return block_comment(text);
        }
        let plain = !text.chars().any(|c| c.is_control() && c != '\n');
        if text.contains('\n') && plain {
            long_string(text)
        } else {
            quote(text)
        }
    }

    fn fstring(&self, parts: &[FStringPart]) -> Result<String, PyLuaError> {
        if parts.is_empty() {
            return Ok(String::from("\"\""));
        }
        let pieces = parts
            .iter()
            .map(|part| match part {
                FStringPart::Literal(text) => Ok(quote(text)),
                FStringPart::Expr(expr) => Ok(format!("str({})", self.expr(expr)?)),
            })
            .collect::<Result<Vec<_>, PyLuaError>>()?;
        Ok(format!("({})", pieces.join(" .. ")))
    }

    /// An immediately invoked function that fills the accumulator `result_N`
    /// from nested loops.
    fn comprehension(
        &self,
        result: &str,
        init: &str,
        store: &str,
        generators: &[Comprehension],
    ) -> Result<String, PyLuaError> {
        let mut text = format!("(function() local {} = {} ", result, init);
        let mut ends = 0;
        for generator in generators {
            text.push_str(&format!(
                "{} do ",
                self.for_header(&generator.target, &generator.iter)?
            ));
            ends += 1;
            for condition in &generator.ifs {
                text.push_str(&format!("if {} then ", self.expr(condition)?));
                ends += 1;
            }
        }
        text.push_str(store);
        text.push(' ');
        text.push_str(&"end ".repeat(ends));
        text.push_str(&format!("return {} end)()", result));
        Ok(text)
    }
}

/// Whether an expression can evaluate to `nil` in Lua.
fn may_be_nil(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Constant(Constant::None)
            | Expr::Name(_)
            | Expr::Call { .. }
            | Expr::Attribute { .. }
            | Expr::Subscript { .. }
            | Expr::BoolOp { .. }
            | Expr::IfExp { .. }
    )
}
