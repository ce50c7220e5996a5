use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use pylua::ast::pretty;
use pylua::config::{Config, DEFAULT_CONFIG_PATH};
use pylua::error::PyLuaError;
use pylua::{logging, parse_source, prelude, Translator};

const USAGE: &str = "\
Usage: pylua [OPTIONS] [INPUT] [CONFIG]

Translate a Python file to Lua. Without INPUT, starts an interactive session.

Arguments:
  INPUT               Python source file
  CONFIG              JSON config file (default: .pyluaconf.json)

Options:
  --no-lua-init       Do not emit the Lua prelude before the translation
  --only-lua-init     Emit only the Lua prelude
  --show-ast          Print the syntax tree to stderr before translating
  -o, --output FILE   Write the Lua to FILE instead of stdout
  -v, --verbose       Log translation progress to stderr
  -h, --help          Show this message";

#[derive(Debug, Default)]
struct Options {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    no_lua_init: bool,
    only_lua_init: bool,
    show_ast: bool,
    verbose: bool,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            "--no-lua-init" => options.no_lua_init = true,
            "--only-lua-init" => options.only_lua_init = true,
            "--show-ast" => options.show_ast = true,
            "-v" | "--verbose" => options.verbose = true,
            "-o" | "--output" => {
                let file = iter
                    .next()
                    .ok_or_else(|| format!("option '{}' needs a file name", arg))?;
                options.output = Some(PathBuf::from(file));
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("unknown option '{}'", flag));
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }
    let mut positional = positional.into_iter();
    options.input = positional.next();
    options.config = positional.next();
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument '{}'", extra.display()));
    }
    Ok(options)
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("\x1b[1;31merror\x1b[0m: {}\n\n{}", message, USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = logging::init(options.verbose) {
        eprintln!("Error: {}", e);
    }

    let config_path = options
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.render("", &config_path.display().to_string()));
            process::exit(1);
        }
    };

    if options.only_lua_init {
        emit(&options, prelude().to_string());
        return;
    }

    let Some(input) = options.input.clone() else {
        // No input: launch REPL
        if let Err(e) = pylua::repl::run_repl(config) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        return;
    };

    let source = match read_input(&input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}", e.render("", &input.display().to_string()));
            process::exit(1);
        }
    };

    match translate(&options, &source, config) {
        Ok(lua) => emit(&options, lua),
        Err(e) => {
            eprintln!("{}", e.render(&source, &input.display().to_string()));
            process::exit(1);
        }
    }
}

fn read_input(path: &Path) -> Result<String, PyLuaError> {
    if !path.is_file() {
        return Err(PyLuaError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let source = fs::read_to_string(path)?;
    if source.trim().is_empty() {
        return Err(PyLuaError::IoError {
            msg: format!("{} is empty", path.display()),
        });
    }
    Ok(source)
}

fn translate(options: &Options, source: &str, config: Config) -> Result<String, PyLuaError> {
    let module = parse_source(source)?;
    if options.show_ast {
        eprint!("{}", pretty::dump(&module));
    }
    let lua = Translator::new(config).translate_module(&module)?;
    if options.no_lua_init {
        Ok(lua)
    } else {
        Ok(format!("{}\n{}", prelude(), lua))
    }
}

fn emit(options: &Options, mut text: String) {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    match &options.output {
        Some(path) => {
            if let Err(e) = fs::write(path, text) {
                eprintln!("\x1b[1;31merror\x1b[0m: cannot write {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", text),
    }
}
