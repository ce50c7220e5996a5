use pretty_assertions::assert_eq;

use pylua::codegen::scope::ScopeContext;
use pylua::config::Config;
use pylua::repl::is_complete;
use pylua::{parse_source, Translator};

fn chunk(translator: &Translator, scope: &mut ScopeContext, source: &str) -> String {
    let module = parse_source(source).expect("parse should succeed");
    translator
        .translate_in(&module, scope)
        .expect("translation should succeed")
}

// ── Input continuation ──

#[test]
fn simple_statement_is_complete() {
    assert!(is_complete("x = 1", false));
}

#[test]
fn open_brackets_continue() {
    assert!(!is_complete("f(1,", false));
    assert!(!is_complete("xs = [1,\n 2", false));
    assert!(is_complete("xs = [1,\n 2]", false));
}

#[test]
fn brackets_inside_strings_and_comments_are_ignored() {
    assert!(is_complete("s = '('", false));
    assert!(is_complete("x = 1  # (", false));
}

#[test]
fn triple_quoted_string_continues() {
    assert!(!is_complete("s = \"\"\"one", false));
    assert!(is_complete("s = \"\"\"one\ntwo\"\"\"", false));
}

#[test]
fn block_runs_until_blank_line() {
    let source = "def f():\n    return 1";
    assert!(!is_complete(source, false));
    assert!(is_complete(source, true));
}

#[test]
fn backslash_continues() {
    assert!(!is_complete("x = 1 + \\", false));
}

// ── Session state ──

#[test]
fn names_persist_across_chunks() {
    let translator = Translator::new(Config::default());
    let mut scope = ScopeContext::new();
    assert_eq!(chunk(&translator, &mut scope, "x = 1\n"), "local x = 1");
    assert_eq!(chunk(&translator, &mut scope, "x = 2\n"), "x = 2");
}

#[test]
fn labels_stay_unique_across_chunks() {
    let translator = Translator::new(Config::default());
    let mut scope = ScopeContext::new();
    let first = chunk(&translator, &mut scope, "while x:\n    continue\n");
    let second = chunk(&translator, &mut scope, "while x:\n    continue\n");
    assert!(first.contains("goto loop_label_1"));
    assert!(second.contains("goto loop_label_2"));
}

#[test]
fn fresh_scope_forgets_names() {
    let translator = Translator::new(Config::default());
    let mut scope = ScopeContext::new();
    chunk(&translator, &mut scope, "x = 1\n");
    let mut reset = ScopeContext::new();
    assert_eq!(chunk(&translator, &mut reset, "x = 2\n"), "local x = 2");
}
