pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod prelude;
pub mod repl;
pub mod span;

use std::path::Path;

use tracing::{debug, trace};

use ast::Module;
use codegen::labels::LabelAllocator;
use codegen::scope::ScopeContext;
use codegen::Generator;
use config::Config;
use error::PyLuaError;

/// Python to Lua translator. Owns the configuration and the loop label
/// allocator, so labels stay unique across every module it translates.
#[derive(Debug, Default)]
pub struct Translator {
    config: Config,
    labels: LabelAllocator,
}

impl Translator {
    pub fn new(config: Config) -> Self {
        Translator {
            config,
            labels: LabelAllocator::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse and translate a complete source file.
    pub fn translate(&self, source: &str) -> Result<String, PyLuaError> {
        let module = parse_source(source)?;
        self.translate_module(&module)
    }

    pub fn translate_module(&self, module: &Module) -> Result<String, PyLuaError> {
        let mut scope = ScopeContext::new();
        self.translate_in(module, &mut scope)
    }

    /// Translate with a caller-owned scope, so bindings made by earlier
    /// modules are visible (the REPL feeds every chunk through one scope).
    pub fn translate_in(
        &self,
        module: &Module,
        scope: &mut ScopeContext,
    ) -> Result<String, PyLuaError> {
        let mut generator = Generator::new(&self.config, &self.labels, scope);
        let output = generator.module(module)?;
        let lua = output.render();
        debug!(statements = module.body.len(), bytes = lua.len(), "translated module");
        Ok(lua)
    }
}

/// Lex and parse Python source into a module.
pub fn parse_source(source: &str) -> Result<Module, PyLuaError> {
    let tokens = lexer::tokenize(source).map_err(|errs| {
        errs.into_iter().next().unwrap_or(PyLuaError::IoError {
            msg: String::from("lexer reported failure without a diagnostic"),
        })
    })?;
    trace!(tokens = tokens.len(), "lexed source");
    parser::parse(tokens)
}

/// Translate with the default configuration.
pub fn translate(source: &str) -> Result<String, PyLuaError> {
    Translator::default().translate(source)
}

pub fn translate_file(path: &Path, config: Config) -> Result<String, PyLuaError> {
    if !path.exists() {
        return Err(PyLuaError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let source = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), "translating file");
    Translator::new(config).translate(&source)
}

/// Runtime support code that translated modules expect to be loaded first.
pub fn prelude() -> &'static str {
    prelude::LUA_INIT
}
