use std::fmt;

use crate::ast::*;

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[SpannedExpr], sep: &str) -> fmt::Result {
    for (i, e) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", e.node)?;
    }
    Ok(())
}

fn write_generators(f: &mut fmt::Formatter<'_>, generators: &[Comprehension]) -> fmt::Result {
    for gen in generators {
        write!(f, " for {} in {}", gen.target.node, gen.iter.node)?;
        for cond in &gen.ifs {
            write!(f, " if {}", cond.node)?;
        }
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Float(n) => write!(f, "{:?}", n),
            Expr::Str(s) => write!(f, "{:?}", s),
            Expr::Bytes(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
            Expr::FString(parts) => {
                write!(f, "f\"")?;
                for part in parts {
                    match part {
                        FStringPart::Literal(s) => write!(f, "{}", s)?,
                        FStringPart::Expr(e) => write!(f, "{{{}}}", e.node)?,
                    }
                }
                write!(f, "\"")
            }
            Expr::Constant(Constant::True) => write!(f, "True"),
            Expr::Constant(Constant::False) => write!(f, "False"),
            Expr::Constant(Constant::None) => write!(f, "None"),
            Expr::Ellipsis => write!(f, "..."),
            Expr::Name(name) => write!(f, "{}", name),
            Expr::List(elems) => {
                write!(f, "[")?;
                write_joined(f, elems, ", ")?;
                write!(f, "]")
            }
            Expr::Tuple(elems) => {
                write!(f, "(")?;
                write_joined(f, elems, ", ")?;
                if elems.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Expr::Set(elems) => {
                write!(f, "{{")?;
                write_joined(f, elems, ", ")?;
                write!(f, "}}")
            }
            Expr::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k.node, v.node)?;
                }
                write!(f, "}}")
            }
            Expr::BinOp { op, left, right } => {
                write!(f, "({} {} {})", left.node, op.as_str(), right.node)
            }
            Expr::BoolOp { op, values } => {
                write!(f, "(")?;
                write_joined(f, values, &format!(" {} ", op.as_str()))?;
                write!(f, ")")
            }
            Expr::UnaryOp { op, operand } => write!(f, "({}{})", op.as_str(), operand.node),
            Expr::Compare {
                left,
                ops,
                comparators,
            } => {
                write!(f, "({}", left.node)?;
                for (op, right) in ops.iter().zip(comparators) {
                    write!(f, " {} {}", op.as_str(), right.node)?;
                }
                write!(f, ")")
            }
            Expr::Call {
                func,
                args,
                keywords,
            } => {
                write!(f, "{}(", func.node)?;
                write_joined(f, args, ", ")?;
                for (i, kw) in keywords.iter().enumerate() {
                    if i > 0 || !args.is_empty() {
                        write!(f, ", ")?;
                    }
                    match &kw.arg {
                        Some(name) => write!(f, "{}={}", name, kw.value.node)?,
                        None => write!(f, "**{}", kw.value.node)?,
                    }
                }
                write!(f, ")")
            }
            Expr::Attribute { value, attr } => write!(f, "{}.{}", value.node, attr),
            Expr::Subscript { value, index } => write!(f, "{}[{}]", value.node, index.node),
            Expr::Slice { lower, upper, step } => {
                if let Some(lower) = lower {
                    write!(f, "{}", lower.node)?;
                }
                write!(f, ":")?;
                if let Some(upper) = upper {
                    write!(f, "{}", upper.node)?;
                }
                if let Some(step) = step {
                    write!(f, ":{}", step.node)?;
                }
                Ok(())
            }
            Expr::Starred(inner) => write!(f, "*{}", inner.node),
            Expr::IfExp { test, body, orelse } => {
                write!(f, "({} if {} else {})", body.node, test.node, orelse.node)
            }
            Expr::Lambda { args, body } => {
                if args.is_empty() {
                    write!(f, "(lambda: {})", body.node)
                } else {
                    write!(f, "(lambda {}: {})", args, body.node)
                }
            }
            Expr::ListComp { elt, generators } => {
                write!(f, "[{}", elt.node)?;
                write_generators(f, generators)?;
                write!(f, "]")
            }
            Expr::SetComp { elt, generators } => {
                write!(f, "{{{}", elt.node)?;
                write_generators(f, generators)?;
                write!(f, "}}")
            }
            Expr::DictComp {
                key,
                value,
                generators,
            } => {
                write!(f, "{{{}: {}", key.node, value.node)?;
                write_generators(f, generators)?;
                write!(f, "}}")
            }
            Expr::GeneratorExp { elt, generators } => {
                write!(f, "({}", elt.node)?;
                write_generators(f, generators)?;
                write!(f, ")")
            }
            Expr::Yield { value, from } => {
                write!(f, "(yield")?;
                if *from {
                    write!(f, " from")?;
                }
                if let Some(value) = value {
                    write!(f, " {}", value.node)?;
                }
                write!(f, ")")
            }
            Expr::NamedExpr { target, value } => {
                write!(f, "({} := {})", target.node, value.node)
            }
        }
    }
}

impl Arguments {
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
            && self.vararg.is_none()
            && self.kwonly.is_empty()
            && self.kwarg.is_none()
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let param = |p: &Param| match &p.default {
            Some(d) => format!("{}={}", p.name.node, d.node),
            None => p.name.node.clone(),
        };
        parts.extend(self.args.iter().map(param));
        if let Some(vararg) = &self.vararg {
            parts.push(format!("*{}", vararg.node));
        } else if !self.kwonly.is_empty() {
            parts.push("*".to_string());
        }
        parts.extend(self.kwonly.iter().map(param));
        if let Some(kwarg) = &self.kwarg {
            parts.push(format!("**{}", kwarg.node));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Render a module as an indented statement tree, one node per line.
pub fn dump(module: &Module) -> String {
    let mut out = String::from("Module\n");
    dump_block(&module.body, 1, &mut out);
    out
}

fn line(out: &mut String, depth: usize, text: impl fmt::Display) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&text.to_string());
    out.push('\n');
}

fn dump_block(stmts: &[SpannedStmt], depth: usize, out: &mut String) {
    for stmt in stmts {
        dump_stmt(&stmt.node, depth, out);
    }
}

fn dump_branch(label: &str, stmts: &[SpannedStmt], depth: usize, out: &mut String) {
    if !stmts.is_empty() {
        line(out, depth, label);
        dump_block(stmts, depth + 1, out);
    }
}

fn dump_stmt(stmt: &Stmt, depth: usize, out: &mut String) {
    match stmt {
        Stmt::Expr(e) => line(out, depth, format_args!("Expr {}", e.node)),
        Stmt::Assign { targets, value } => {
            let targets: Vec<String> = targets.iter().map(|t| t.node.to_string()).collect();
            line(
                out,
                depth,
                format_args!("Assign {} = {}", targets.join(" = "), value.node),
            );
        }
        Stmt::AugAssign { target, op, value } => line(
            out,
            depth,
            format_args!("AugAssign {} {}= {}", target.node, op.as_str(), value.node),
        ),
        Stmt::AnnAssign { target, value } => match value {
            Some(v) => line(out, depth, format_args!("AnnAssign {} = {}", target.node, v.node)),
            None => line(out, depth, format_args!("AnnAssign {}", target.node)),
        },
        Stmt::FunctionDef(def) => {
            for dec in &def.decorators {
                line(out, depth, format_args!("@{}", dec.node));
            }
            line(
                out,
                depth,
                format_args!("FunctionDef {}({})", def.name.node, def.args),
            );
            dump_block(&def.body, depth + 1, out);
        }
        Stmt::ClassDef(class) => {
            for dec in &class.decorators {
                line(out, depth, format_args!("@{}", dec.node));
            }
            let bases: Vec<String> = class.bases.iter().map(|b| b.node.to_string()).collect();
            line(
                out,
                depth,
                format_args!("ClassDef {}({})", class.name.node, bases.join(", ")),
            );
            dump_block(&class.body, depth + 1, out);
        }
        Stmt::Return(Some(v)) => line(out, depth, format_args!("Return {}", v.node)),
        Stmt::Return(None) => line(out, depth, "Return"),
        Stmt::Delete(targets) => {
            let targets: Vec<String> = targets.iter().map(|t| t.node.to_string()).collect();
            line(out, depth, format_args!("Delete {}", targets.join(", ")));
        }
        Stmt::Pass => line(out, depth, "Pass"),
        Stmt::Break => line(out, depth, "Break"),
        Stmt::Continue => line(out, depth, "Continue"),
        Stmt::If { test, body, orelse } => {
            line(out, depth, format_args!("If {}", test.node));
            dump_block(body, depth + 1, out);
            dump_branch("Else", orelse, depth, out);
        }
        Stmt::While { test, body, orelse } => {
            line(out, depth, format_args!("While {}", test.node));
            dump_block(body, depth + 1, out);
            dump_branch("Else", orelse, depth, out);
        }
        Stmt::For {
            target,
            iter,
            body,
            orelse,
        } => {
            line(out, depth, format_args!("For {} in {}", target.node, iter.node));
            dump_block(body, depth + 1, out);
            dump_branch("Else", orelse, depth, out);
        }
        Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            line(out, depth, "Try");
            dump_block(body, depth + 1, out);
            for handler in handlers {
                let mut header = String::from("Except");
                if let Some(typ) = &handler.typ {
                    header.push_str(&format!(" {}", typ.node));
                }
                if let Some(name) = &handler.name {
                    header.push_str(&format!(" as {}", name.node));
                }
                line(out, depth, header);
                dump_block(&handler.body, depth + 1, out);
            }
            dump_branch("Else", orelse, depth, out);
            dump_branch("Finally", finalbody, depth, out);
        }
        Stmt::With { items, body } => {
            let items: Vec<String> = items
                .iter()
                .map(|item| match &item.target {
                    Some(t) => format!("{} as {}", item.context.node, t.node),
                    None => item.context.node.to_string(),
                })
                .collect();
            line(out, depth, format_args!("With {}", items.join(", ")));
            dump_block(body, depth + 1, out);
        }
        Stmt::Raise { exc, cause } => {
            let mut text = String::from("Raise");
            if let Some(exc) = exc {
                text.push_str(&format!(" {}", exc.node));
            }
            if let Some(cause) = cause {
                text.push_str(&format!(" from {}", cause.node));
            }
            line(out, depth, text);
        }
        Stmt::Assert { test, msg } => match msg {
            Some(m) => line(out, depth, format_args!("Assert {}, {}", test.node, m.node)),
            None => line(out, depth, format_args!("Assert {}", test.node)),
        },
        Stmt::Import(names) => line(out, depth, format_args!("Import {}", aliases(names))),
        Stmt::ImportFrom { module, names } => line(
            out,
            depth,
            format_args!("ImportFrom {} import {}", module, aliases(names)),
        ),
        Stmt::Global(names) => line(out, depth, format_args!("Global {}", names.join(", "))),
        Stmt::Nonlocal(names) => line(out, depth, format_args!("Nonlocal {}", names.join(", "))),
    }
}

fn aliases(names: &[Alias]) -> String {
    names
        .iter()
        .map(|a| match &a.asname {
            Some(asname) => format!("{} as {}", a.name, asname),
            None => a.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
