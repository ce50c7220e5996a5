pub mod highlighter;

use rustyline::error::ReadlineError;
use rustyline::Editor;
use tracing::debug;

use crate::ast::pretty;
use crate::codegen::scope::ScopeContext;
use crate::config::Config;
use crate::error::PyLuaError;
use crate::{parse_source, prelude, Translator};

use highlighter::PyLuaHelper;

pub fn run_repl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let rl_config = rustyline::Config::builder()
        .auto_add_history(true)
        .build();

    let mut rl = Editor::with_config(rl_config)?;
    rl.set_helper(Some(PyLuaHelper));

    let history_path = history_file().unwrap_or_default();
    let _ = rl.load_history(&history_path);

    // One translator and scope for the whole session, so labels stay unique
    // and names bound in earlier chunks are not redeclared.
    let translator = Translator::new(config);
    let mut scope = ScopeContext::new();

    println!(
        "\x1b[1;35mpylua\x1b[0m v{} (Python to Lua)",
        env!("CARGO_PKG_VERSION")
    );
    println!("Type \x1b[1m:help\x1b[0m for help, \x1b[1m:quit\x1b[0m to exit\n");

    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() {
            "\x1b[1;35m>>>\x1b[0m "
        } else {
            "\x1b[1;35m...\x1b[0m "
        };

        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim_end();

                if buffer.is_empty() && line.is_empty() {
                    continue;
                }

                // Commands are only recognised on the first line of a chunk
                if buffer.is_empty() && line.starts_with(':') {
                    match line {
                        ":quit" | ":q" => break,
                        ":help" | ":h" => print_help(),
                        ":prelude" => println!("{}", prelude()),
                        ":reset" => {
                            scope = ScopeContext::new();
                            println!("  \x1b[33m(scope cleared)\x1b[0m");
                        }
                        _ if line.starts_with(":ast ") => {
                            let source = &line[5..];
                            match parse_source(source) {
                                Ok(module) => print!("{}", pretty::dump(&module)),
                                Err(e) => eprintln!("{}", e.render(source, "<repl>")),
                            }
                        }
                        _ if line.starts_with(":load ") => {
                            let path = line[6..].trim();
                            match std::fs::read_to_string(path) {
                                Ok(source) => {
                                    if let Err(e) =
                                        translate_chunk(&translator, &mut scope, &source)
                                    {
                                        eprintln!("{}", e.render(&source, path));
                                    }
                                }
                                Err(e) => eprintln!("\x1b[1;31merror\x1b[0m: {}: {}", path, e),
                            }
                        }
                        _ => eprintln!(
                            "\x1b[1;31merror\x1b[0m: unknown command '{}' (try :help)",
                            line
                        ),
                    }
                    continue;
                }

                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(line);

                if !is_complete(&buffer, line.is_empty()) {
                    continue;
                }

                let source = std::mem::take(&mut buffer);
                if let Err(e) = translate_chunk(&translator, &mut scope, &source) {
                    eprintln!("{}", e.render(&source, "<repl>"));
                }
            }
            Err(ReadlineError::Interrupted) => {
                if !buffer.is_empty() {
                    buffer.clear();
                    println!("  \x1b[33m(input cancelled)\x1b[0m");
                } else {
                    println!("^C");
                }
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    println!("Goodbye!");
    Ok(())
}

/// Translate one chunk and print the Lua. A failed chunk leaves the scope as
/// it was before the chunk.
fn translate_chunk(
    translator: &Translator,
    scope: &mut ScopeContext,
    source: &str,
) -> Result<(), PyLuaError> {
    let module = parse_source(source)?;
    let snapshot = scope.clone();
    match translator.translate_in(&module, scope) {
        Ok(lua) => {
            if !lua.is_empty() {
                println!("\x1b[36m{}\x1b[0m", lua);
            }
            Ok(())
        }
        Err(e) => {
            debug!(error = %e, "restoring scope after failed chunk");
            *scope = snapshot;
            Err(e)
        }
    }
}

/// Whether the buffered input can be translated. Input continues while a
/// bracket or triple-quoted string is open, and an indented block (a line
/// ending in `:`) runs until a blank line.
pub fn is_complete(source: &str, blank_line: bool) -> bool {
    let chars: Vec<char> = source.chars().collect();
    let at = |i: usize, pat: &str| pat.chars().enumerate().all(|(k, c)| chars.get(i + k) == Some(&c));
    let mut depth = 0i32;
    let mut quote: Option<&str> = None;
    let mut i = 0;

    while i < chars.len() {
        if let Some(q) = quote {
            if chars[i] == '\\' {
                i += 2;
                continue;
            }
            if at(i, q) {
                quote = None;
                i += q.len();
                continue;
            }
            if chars[i] == '\n' && q.len() == 1 {
                quote = None;
            }
            i += 1;
            continue;
        }
        match chars[i] {
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '"' | '\'' => {
                let q = if at(i, "\"\"\"") {
                    "\"\"\""
                } else if at(i, "'''") {
                    "'''"
                } else if chars[i] == '"' {
                    "\""
                } else {
                    "'"
                };
                quote = Some(q);
                i += q.len();
                continue;
            }
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
        i += 1;
    }

    if depth > 0 || quote.is_some() || source.trim_end().ends_with('\\') {
        return false;
    }

    let opens_block = source
        .lines()
        .any(|l| l.split('#').next().unwrap_or("").trim_end().ends_with(':'));
    !opens_block || blank_line
}

fn print_help() {
    println!("\x1b[1mpylua REPL Commands:\x1b[0m");
    println!("  :help, :h          Show this help message");
    println!("  :quit, :q          Exit the REPL");
    println!("  :prelude           Print the Lua runtime prelude");
    println!("  :ast <code>        Show the syntax tree of a line of Python");
    println!("  :reset             Forget every name bound so far");
    println!("  :load <file>       Translate a Python file in this session");
    println!();
    println!("\x1b[1mInput:\x1b[0m");
    println!("  Each Python statement is translated to Lua and printed.");
    println!("  Names bound earlier in the session are not declared local again.");
    println!();
    println!("\x1b[1mMulti-line Input:\x1b[0m");
    println!("  Open brackets continue to the next line; a line ending in ':'");
    println!("  starts a block that ends at the first blank line");
}

fn history_file() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME").map(|h| std::path::PathBuf::from(h).join(".pylua_history"))
}
