use tracing::trace;

use crate::ast::*;
use crate::error::PyLuaError;
use crate::span::{Span, Spanned};

use super::operators;
use super::output::Output;
use super::{ends_with_return, lua_name, target_names, Generator};

impl Generator<'_> {
    pub(crate) fn stmt(&mut self, stmt: &SpannedStmt, out: &mut Output) -> Result<(), PyLuaError> {
        match &stmt.node {
            Stmt::Expr(expr) => self.expr_stmt(expr, out)?,
            Stmt::Assign { targets, value } => self.assign(targets, value, out)?,
            Stmt::AugAssign { target, op, value } => {
                let target_text = match &target.node {
                    Expr::Name(name) => self.qualify(name),
                    Expr::Attribute { .. } | Expr::Subscript { .. } => self.expr(target)?,
                    other => return Err(PyLuaError::unsupported(other.kind_name(), target.span)),
                };
                let value = self.expr(value)?;
                let text = self.binary(*op, &target_text, &value, stmt.span)?;
                out.line(format!("{} = {}", target_text, text));
            }
            Stmt::AnnAssign { target, value } => {
                if let Some(value) = value {
                    self.assign(std::slice::from_ref(target), value, out)?;
                }
            }
            Stmt::FunctionDef(def) => self.function_def(def, out)?,
            Stmt::ClassDef(def) => self.class_def(def, out)?,
            Stmt::Return(value) => match value {
                Some(value) => out.line(format!("return {}", self.expr(value)?)),
                None => out.line("return"),
            },
            Stmt::Delete(targets) => {
                let names = targets
                    .iter()
                    .map(|t| self.expr(t))
                    .collect::<Result<Vec<_>, _>>()?;
                let nils = vec!["nil"; names.len()];
                out.line(format!("{} = {}", names.join(", "), nils.join(", ")));
            }
            Stmt::Pass => {}
            Stmt::Break => {
                let frame = self.scope.current();
                if frame.loop_label.is_none() {
                    return Err(PyLuaError::BreakOutsideLoop { span: stmt.span });
                }
                if frame.protected {
                    return Err(PyLuaError::unsupported("break inside try", stmt.span));
                }
                out.line("break");
            }
            Stmt::Continue => {
                let frame = self.scope.current();
                let label = frame
                    .loop_label
                    .clone()
                    .ok_or(PyLuaError::ContinueOutsideLoop { span: stmt.span })?;
                if frame.protected {
                    return Err(PyLuaError::unsupported("continue inside try", stmt.span));
                }
                out.line(format!("goto {}", label));
                self.continued.insert(label);
            }
            Stmt::If { test, body, orelse } => self.if_chain(test, body, orelse, out)?,
            Stmt::While { test, body, orelse } => {
                if let Some(first) = orelse.first() {
                    return Err(PyLuaError::unsupported("while-else", first.span));
                }
                let test = self.expr(test)?;
                out.line(format!("while {} do", test));
                let body = self.loop_body(body, &[])?;
                out.block(body);
                out.line("end");
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
            } => {
                if let Some(first) = orelse.first() {
                    return Err(PyLuaError::unsupported("for-else", first.span));
                }
                out.line(format!("{} do", self.for_header(target, iter)?));
                let mut seeds = Vec::new();
                target_names(&target.node, &mut seeds);
                let body = self.loop_body(body, &seeds)?;
                out.block(body);
                out.line("end");
            }
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                if let Some(first) = orelse.first() {
                    return Err(PyLuaError::unsupported("try-else", first.span));
                }
                self.try_stmt(body, handlers, out)?;
                let finally = self.statements(finalbody)?;
                out.append(finally);
            }
            Stmt::With { items, body } => self.with_stmt(items, body, out)?,
            Stmt::Raise { exc, .. } => match exc {
                Some(exc) => out.line(format!("error({})", self.expr(exc)?)),
                None => out.line("error(Error)"),
            },
            Stmt::Assert { test, msg } => {
                let test = self.expr(test)?;
                match msg {
                    Some(msg) => out.line(format!("assert({}, {})", test, self.expr(msg)?)),
                    None => out.line(format!("assert({})", test)),
                }
            }
            Stmt::Import(aliases) => {
                for alias in aliases {
                    let bind = alias
                        .asname
                        .as_deref()
                        .unwrap_or_else(|| alias.name.rsplit('.').next().unwrap_or(&alias.name));
                    let target = self.bind(bind);
                    out.line(format!("{} = require({})", target, super::quote(&alias.name)));
                }
            }
            Stmt::ImportFrom { module, names } => {
                let require = format!("require({})", super::quote(module));
                for alias in names {
                    if alias.name == "*" {
                        out.line(require.clone());
                        continue;
                    }
                    let target = self.bind(alias.asname.as_deref().unwrap_or(&alias.name));
                    out.line(format!("{} = {}.{}", target, require, lua_name(&alias.name)));
                }
            }
            Stmt::Global(names) | Stmt::Nonlocal(names) => {
                for name in names {
                    self.scope.globals_mut().add(lua_name(name).into_owned());
                }
            }
        }
        Ok(())
    }

    /// The left-hand side for a write to a plain name: `Class.name` in a
    /// class body, `local name` on first write, otherwise `name`.
    fn bind(&mut self, name: &str) -> String {
        let name = lua_name(name).into_owned();
        if let Some(class) = &self.scope.current().class_name {
            return format!("{}.{}", class, name);
        }
        let declared = self.declare(&name);
        format!("{}{}", Self::local_keyword(declared), name)
    }

    /// A name as read or updated in place, qualified inside a class body.
    fn qualify(&self, name: &str) -> String {
        match &self.scope.current().class_name {
            Some(class) => format!("{}.{}", class, lua_name(name)),
            None => lua_name(name).into_owned(),
        }
    }

    fn expr_stmt(&mut self, expr: &SpannedExpr, out: &mut Output) -> Result<(), PyLuaError> {
        match &expr.node {
            Expr::Str(_) => {
                let text = self.framed(false, |f| f.docstring = true, |g| g.expr(expr))?;
                out.line(text);
            }
            Expr::Call { .. } => out.line(self.expr(expr)?),
            Expr::Ellipsis => {}
            _ => out.line(format!("local _ = {}", self.expr(expr)?)),
        }
        Ok(())
    }

    /// `a = b = value`: the first target takes the value, the rest copy it.
    fn assign(
        &mut self,
        targets: &[SpannedExpr],
        value: &SpannedExpr,
        out: &mut Output,
    ) -> Result<(), PyLuaError> {
        let value = self.expr(value)?;
        let mut source = value;
        for (i, target) in targets.iter().enumerate() {
            let written = self.assign_target(target, &source, out)?;
            if i == 0 {
                source = written;
            }
        }
        Ok(())
    }

    /// Emit one assignment and return the target as it reads back.
    fn assign_target(
        &mut self,
        target: &SpannedExpr,
        value: &str,
        out: &mut Output,
    ) -> Result<String, PyLuaError> {
        match &target.node {
            Expr::Name(name) => {
                let lhs = self.bind(name);
                out.line(format!("{} = {}", lhs, value));
                Ok(self.qualify(name))
            }
            Expr::Tuple(elems) | Expr::List(elems) => {
                let mut names = Vec::with_capacity(elems.len());
                for elem in elems {
                    match &elem.node {
                        Expr::Name(name) => names.push(name.as_str()),
                        other => {
                            return Err(PyLuaError::unsupported(
                                format!("{} in a tuple target", other.kind_name()),
                                elem.span,
                            ))
                        }
                    }
                }
                let text = if self.scope.current().class_name.is_some() {
                    let qualified: Vec<String> = names.iter().map(|n| self.qualify(n)).collect();
                    let text = qualified.join(", ");
                    out.line(format!("{} = {}", text, value));
                    text
                } else {
                    let lua: Vec<String> = names.iter().map(|n| lua_name(n).into_owned()).collect();
                    let fresh: Vec<&String> = lua.iter().filter(|n| self.declare(n)).collect();
                    let text = lua.join(", ");
                    if fresh.len() == lua.len() {
                        out.line(format!("local {} = {}", text, value));
                    } else {
                        if !fresh.is_empty() {
                            let fresh: Vec<&str> = fresh.iter().map(|n| n.as_str()).collect();
                            out.line(format!("local {}", fresh.join(", ")));
                        }
                        out.line(format!("{} = {}", text, value));
                    }
                    text
                };
                Ok(text)
            }
            Expr::Attribute { .. } | Expr::Subscript { .. } => {
                let text = self.expr(target)?;
                out.line(format!("{} = {}", text, value));
                Ok(text)
            }
            other => Err(PyLuaError::unsupported(
                format!("assignment to {}", other.kind_name()),
                target.span,
            )),
        }
    }

    /// `for _, x in iterate(xs)`. The leading marker keeps `None` elements
    /// from ending the loop, and `iterate` gives each loop its own position.
    pub(crate) fn for_header(
        &self,
        target: &SpannedExpr,
        iter: &SpannedExpr,
    ) -> Result<String, PyLuaError> {
        Ok(format!(
            "for _, {} in iterate({})",
            self.loop_target(target)?,
            self.expr(iter)?
        ))
    }

    /// A `for` target: a name or a flat tuple of names.
    pub(crate) fn loop_target(&self, target: &SpannedExpr) -> Result<String, PyLuaError> {
        match &target.node {
            Expr::Name(name) => Ok(lua_name(name).into_owned()),
            Expr::Tuple(elems) => {
                let mut names = Vec::with_capacity(elems.len());
                for elem in elems {
                    match &elem.node {
                        Expr::Name(name) => names.push(lua_name(name).into_owned()),
                        other => {
                            return Err(PyLuaError::unsupported(
                                format!("{} in a loop target", other.kind_name()),
                                elem.span,
                            ))
                        }
                    }
                }
                Ok(names.join(", "))
            }
            other => Err(PyLuaError::unsupported(
                format!("{} as a loop target", other.kind_name()),
                target.span,
            )),
        }
    }

    /// Generate a loop body ending in its continue label.
    fn loop_body(&mut self, body: &[SpannedStmt], seeds: &[String]) -> Result<Output, PyLuaError> {
        let label = self.labels.next();
        trace!(label = %label, "entering loop");
        let loop_label = label.clone();
        let inner = self.framed(
            false,
            |f| {
                f.loop_label = Some(loop_label);
                f.protected = false;
            },
            |g| g.block(body, seeds),
        )?;

        let mut out = if self.continued.contains(&label) || ends_with_return(body) {
            let mut wrapped = Output::new();
            wrapped.line("do");
            wrapped.block(inner);
            wrapped.line("end");
            wrapped
        } else {
            inner
        };
        out.line(format!("::{}::", label));
        Ok(out)
    }

    fn if_chain(
        &mut self,
        test: &SpannedExpr,
        body: &[SpannedStmt],
        orelse: &[SpannedStmt],
        out: &mut Output,
    ) -> Result<(), PyLuaError> {
        let mut keyword = "if";
        let (mut test, mut body, mut orelse) = (test, body, orelse);
        loop {
            out.line(format!("{} {} then", keyword, self.expr(test)?));
            out.block(self.block(body, &[])?);
            match orelse {
                [] => break,
                [Spanned {
                    node:
                        Stmt::If {
                            test: next_test,
                            body: next_body,
                            orelse: next_orelse,
                        },
                    ..
                }] => {
                    keyword = "elseif";
                    test = next_test;
                    body = next_body;
                    orelse = next_orelse;
                }
                rest => {
                    out.line("else");
                    out.block(self.block(rest, &[])?);
                    break;
                }
            }
        }
        out.line("end");
        Ok(())
    }

    fn try_stmt(
        &mut self,
        body: &[SpannedStmt],
        handlers: &[ExceptHandler],
        out: &mut Output,
    ) -> Result<(), PyLuaError> {
        let protected = self.framed(false, |f| f.protected = true, |g| g.block(body, &[]))?;

        let mut recovery = Output::new();
        for handler in handlers {
            let mut seeds = Vec::new();
            let mut handler_out = Output::new();
            if let Some(name) = &handler.name {
                let name = lua_name(&name.node).into_owned();
                handler_out.line(format!("local {} = Error", name));
                seeds.push(name);
            }
            let handler_body = self.framed(
                false,
                |f| f.protected = true,
                |g| g.block(&handler.body, &seeds),
            )?;
            handler_out.append(handler_body);

            if handlers.len() > 1 {
                recovery.line("do");
                recovery.block(handler_out);
                recovery.line("end");
            } else {
                recovery.append(handler_out);
            }
        }

        out.line("xpcall(function()");
        out.block(protected);
        out.line("end, function(Error)");
        out.block(recovery);
        out.line("end)");
        Ok(())
    }

    fn with_stmt(
        &mut self,
        items: &[WithItem],
        body: &[SpannedStmt],
        out: &mut Output,
    ) -> Result<(), PyLuaError> {
        let mut inner = Output::new();
        let mut seeds = Vec::new();
        for item in items {
            let context = self.expr(&item.context)?;
            match &item.target {
                Some(Spanned {
                    node: Expr::Name(name),
                    ..
                }) => {
                    let name = lua_name(name).into_owned();
                    inner.line(format!("local {} = {}", name, context));
                    seeds.push(name);
                }
                Some(target) => {
                    let target = self.expr(target)?;
                    inner.line(format!("{} = {}", target, context));
                }
                None if matches!(item.context.node, Expr::Call { .. }) => inner.line(context),
                None => inner.line(format!("local _ = {}", context)),
            }
        }
        inner.append(self.block(body, &seeds)?);

        out.line("do");
        out.block(inner);
        out.line("end");
        Ok(())
    }

    fn function_def(&mut self, def: &FunctionDef, out: &mut Output) -> Result<(), PyLuaError> {
        let class_name = self.scope.current().class_name.clone();
        let params = self.parameters(&def.args)?;

        let mut head = format!("function({})", params.join(", "));
        let mut tail = String::from("end");
        for decorator in def.decorators.iter().rev() {
            let mut name = self.expr(decorator)?;
            if let Some(class) = &class_name {
                let first = name.split('.').next().unwrap_or_default();
                if self.scope.methods().exists(first) {
                    name = match name.rsplit_once('.') {
                        Some((receiver, method)) => format!("{}.{}:{}", class, receiver, method),
                        None => format!("{}.{}", class, name),
                    };
                }
            }
            head = format!("{}({}", name, head);
            tail.push(')');
        }

        let name = lua_name(&def.name.node).into_owned();
        let (local, name) = match &class_name {
            Some(class) => {
                self.scope.methods_mut().add(name.as_str());
                ("", format!("{}.{}", class, name))
            }
            None => (Self::local_keyword(self.declare(&name)), name),
        };

        if def.decorators.is_empty() {
            out.line(format!("{}function {}({})", local, name, params.join(", ")));
        } else {
            out.line(format!("{}{} = {}", local, name, head));
        }

        let body = self.framed(
            true,
            |f| {
                f.class_name = None;
                f.static_identifier = class_name;
                f.loop_label = None;
                f.protected = false;
                f.docstring = false;
            },
            |g| g.function_body(&def.args, &def.body),
        )?;
        out.block(body);
        out.line(tail);
        Ok(())
    }

    /// Parameter names as they appear in the Lua signature.
    pub(crate) fn parameters(&self, args: &Arguments) -> Result<Vec<String>, PyLuaError> {
        if let Some(param) = args.kwonly.first() {
            return Err(PyLuaError::unsupported(
                "keyword-only parameters",
                param.name.span,
            ));
        }
        let mut params: Vec<String> = args
            .args
            .iter()
            .map(|p| lua_name(&p.name.node).into_owned())
            .collect();
        if args.vararg.is_some() {
            params.push(String::from("..."));
        }
        Ok(params)
    }

    /// Lines placed before a function body: default guards, then the packed
    /// `*args` and `**kwargs` containers.
    pub(crate) fn prologue(&self, args: &Arguments) -> Result<Vec<String>, PyLuaError> {
        let mut lines = Vec::new();
        for param in &args.args {
            if let Some(default) = &param.default {
                let name = lua_name(&param.name.node);
                lines.push(format!("{name} = {name} or {}", self.expr(default)?, name = name));
            }
        }
        if let Some(vararg) = &args.vararg {
            lines.push(format!("local {} = list(table.pack(...))", lua_name(&vararg.node)));
        }
        if let Some(kwarg) = &args.kwarg {
            lines.push(format!("local {} = dict {{}}", lua_name(&kwarg.node)));
        }
        Ok(lines)
    }

    fn function_body(
        &mut self,
        args: &Arguments,
        body: &[SpannedStmt],
    ) -> Result<Output, PyLuaError> {
        let mut seeds: Vec<String> = args
            .args
            .iter()
            .map(|p| lua_name(&p.name.node).into_owned())
            .collect();
        seeds.extend(
            args.vararg
                .iter()
                .chain(args.kwarg.iter())
                .map(|n| lua_name(&n.node).into_owned()),
        );

        let mut out = Output::new();
        for line in self.prologue(args)? {
            out.line(line);
        }
        out.append(self.block(body, &seeds)?);
        Ok(out)
    }

    fn class_def(&mut self, def: &ClassDef, out: &mut Output) -> Result<(), PyLuaError> {
        if let Some(decorator) = def.decorators.first() {
            return Err(PyLuaError::unsupported("class decorators", decorator.span));
        }
        if let Some(keyword) = def.keywords.first() {
            return Err(PyLuaError::unsupported(
                "keyword arguments in a class header",
                keyword.value.span,
            ));
        }

        let outer = self.scope.current().class_name.clone();
        let node_name = lua_name(&def.name.node).into_owned();
        let (local, name) = match &outer {
            Some(class) => ("", format!("{}.{}", class, node_name)),
            None => (Self::local_keyword(self.declare(&node_name)), node_name.clone()),
        };

        let bases = def
            .bases
            .iter()
            .map(|b| self.expr(b))
            .collect::<Result<Vec<_>, _>>()?;
        let (metamethods, properties) = class_tables(&def.body, &name);

        out.line(format!("{}{} = class(function({})", local, name, node_name));
        let class_ident = node_name.clone();
        let body = self.framed(
            true,
            |f| {
                f.class_name = Some(class_ident.clone());
                f.static_identifier = Some(class_ident);
                f.loop_label = None;
                f.protected = false;
            },
            |g| g.block(&def.body, &[]),
        )?;
        let mut inner = body;
        inner.line(format!("return {}", node_name));
        out.block(inner);
        out.line(format!(
            "end, {}, {{{}}}, {{{}}}, {{{}}})",
            super::quote(&node_name),
            bases.join(", "),
            metamethods.join(", "),
            properties.join(", "),
        ));

        if self.config.class.return_at_the_end && outer.is_none() {
            out.line(format!("return {}", name));
        }
        trace!(class = %name, span = ?def.name.span, "generated class");
        Ok(())
    }

    /// Render `a op b` for statement-level updates and expressions alike.
    pub(crate) fn binary(
        &self,
        op: BinOp,
        left: &str,
        right: &str,
        span: Span,
    ) -> Result<String, PyLuaError> {
        let desc = operators::binop(op)
            .ok_or_else(|| PyLuaError::unsupported(format!("operator '{}'", op.as_str()), span))?;
        let text = desc.binary(left, right);
        Ok(match desc.form {
            operators::Form::Infix => format!("({})", text),
            _ => text,
        })
    }
}

/// Metamethod and property table entries for a class body, in body order.
fn class_tables(body: &[SpannedStmt], class: &str) -> (Vec<String>, Vec<String>) {
    let mut metamethods: Vec<String> = Vec::new();
    let mut seen = Vec::new();
    let mut properties = Vec::new();
    for stmt in body {
        let Stmt::FunctionDef(def) = &stmt.node else {
            continue;
        };
        if let Some(meta) = operators::metamethod(&def.name.node) {
            if !seen.contains(&meta) {
                seen.push(meta);
                metamethods.push(format!("{} = {}", meta, super::quote(&def.name.node)));
            }
        }
        let is_property = def
            .decorators
            .iter()
            .any(|d| matches!(&d.node, Expr::Name(n) if n == "property"));
        if is_property {
            let name = lua_name(&def.name.node);
            properties.push(format!(
                "{} = {}",
                name,
                super::quote(&format!("{}.{}", class, name))
            ));
        }
    }
    (metamethods, properties)
}
