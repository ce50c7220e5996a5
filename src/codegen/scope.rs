use crate::error::PyLuaError;

use super::symbols::SymbolTable;

/// Binding tables of one Lua-visible scope (a module, function or class body).
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub locals: SymbolTable,
    pub globals: SymbolTable,
    /// Method names declared in a class body.
    pub methods: SymbolTable,
}

/// One layer of the scope context.
#[derive(Debug, Clone, Default)]
pub struct ScopeFrame {
    /// Continue target of the innermost loop; `None` outside loops.
    pub loop_label: Option<String>,
    /// Name of the class whose body is being generated.
    pub class_name: Option<String>,
    /// Prefix that is called with `.` rather than `:` (the enclosing class).
    pub static_identifier: Option<String>,
    /// A string expression statement here is rendered as a comment.
    pub docstring: bool,
    pub module_level: bool,
    /// Inside a `try` closure, which `goto` and `break` cannot leave.
    pub protected: bool,
    bindings: usize,
    owns_bindings: bool,
}

/// Stack of scope frames threaded through code generation.
///
/// Frames pushed with [`push`](ScopeContext::push) share their parent's
/// binding tables; [`push_isolated`](ScopeContext::push_isolated) starts fresh
/// ones, for function and class bodies.
#[derive(Debug, Clone)]
pub struct ScopeContext {
    frames: Vec<ScopeFrame>,
    bindings: Vec<Bindings>,
}

impl ScopeContext {
    pub fn new() -> Self {
        ScopeContext {
            frames: vec![ScopeFrame {
                module_level: true,
                owns_bindings: true,
                ..ScopeFrame::default()
            }],
            bindings: vec![Bindings::default()],
        }
    }

    pub fn current(&self) -> &ScopeFrame {
        // The root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Duplicate the active frame, apply `overrides`, and make it active.
    pub fn push(&mut self, overrides: impl FnOnce(&mut ScopeFrame)) {
        let mut frame = self.current().clone();
        frame.owns_bindings = false;
        overrides(&mut frame);
        self.frames.push(frame);
    }

    /// Like [`push`](ScopeContext::push), with empty binding tables.
    pub fn push_isolated(&mut self, overrides: impl FnOnce(&mut ScopeFrame)) {
        self.bindings.push(Bindings::default());
        let mut frame = self.current().clone();
        frame.bindings = self.bindings.len() - 1;
        frame.owns_bindings = true;
        frame.module_level = false;
        overrides(&mut frame);
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Result<ScopeFrame, PyLuaError> {
        if self.frames.len() <= 1 {
            return Err(PyLuaError::ScopeUnderflow);
        }
        let frame = self.frames.pop().ok_or(PyLuaError::ScopeUnderflow)?;
        if frame.owns_bindings {
            self.bindings.pop();
        }
        Ok(frame)
    }

    fn bindings(&self) -> &Bindings {
        &self.bindings[self.current().bindings]
    }

    fn bindings_mut(&mut self) -> &mut Bindings {
        let idx = self.current().bindings;
        &mut self.bindings[idx]
    }

    pub fn locals(&self) -> &SymbolTable {
        &self.bindings().locals
    }

    pub fn locals_mut(&mut self) -> &mut SymbolTable {
        &mut self.bindings_mut().locals
    }

    pub fn globals(&self) -> &SymbolTable {
        &self.bindings().globals
    }

    pub fn globals_mut(&mut self) -> &mut SymbolTable {
        &mut self.bindings_mut().globals
    }

    pub fn methods(&self) -> &SymbolTable {
        &self.bindings().methods
    }

    pub fn methods_mut(&mut self) -> &mut SymbolTable {
        &mut self.bindings_mut().methods
    }

    /// Whether `name` is already bound here, as a local or a declared global.
    pub fn is_bound(&self, name: &str) -> bool {
        self.locals().exists(name) || self.globals().exists(name)
    }
}

impl Default for ScopeContext {
    fn default() -> Self {
        ScopeContext::new()
    }
}
