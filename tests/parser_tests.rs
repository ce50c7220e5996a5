use pylua::ast::*;
use pylua::error::PyLuaError;
use pylua::lexer::tokenize;
use pylua::parser::parse;

fn parse_source(source: &str) -> Vec<SpannedStmt> {
    let tokens = tokenize(source).expect("lexer should succeed");
    parse(tokens).expect("parser should succeed").body
}

fn parse_error(source: &str) -> PyLuaError {
    let tokens = tokenize(source).expect("lexer should succeed");
    parse(tokens).expect_err("parser should fail")
}

fn single_expr(source: &str) -> Expr {
    let stmts = parse_source(source);
    assert_eq!(stmts.len(), 1);
    match &stmts[0].node {
        Stmt::Expr(e) => e.node.clone(),
        other => panic!("expected expression statement, got {:?}", other),
    }
}

fn name_of(expr: &SpannedExpr) -> &str {
    match &expr.node {
        Expr::Name(n) => n,
        other => panic!("expected Name, got {:?}", other),
    }
}

#[test]
fn parse_integer_expression() {
    match single_expr("42") {
        Expr::Int(42) => {}
        other => panic!("expected Int(42), got {:?}", other),
    }
}

#[test]
fn parse_simple_assignment() {
    let stmts = parse_source("x = 1\n");
    match &stmts[0].node {
        Stmt::Assign { targets, value } => {
            assert_eq!(targets.len(), 1);
            assert_eq!(name_of(&targets[0]), "x");
            assert!(matches!(value.node, Expr::Int(1)));
        }
        other => panic!("expected Assign, got {:?}", other),
    }
}

#[test]
fn parse_chained_assignment() {
    let stmts = parse_source("a = b = 0\n");
    match &stmts[0].node {
        Stmt::Assign { targets, .. } => {
            let names: Vec<&str> = targets.iter().map(name_of).collect();
            assert_eq!(names, vec!["a", "b"]);
        }
        other => panic!("expected Assign, got {:?}", other),
    }
}

#[test]
fn parse_tuple_assignment() {
    let stmts = parse_source("a, b = b, a\n");
    match &stmts[0].node {
        Stmt::Assign { targets, value } => {
            assert!(matches!(&targets[0].node, Expr::Tuple(elems) if elems.len() == 2));
            assert!(matches!(&value.node, Expr::Tuple(elems) if elems.len() == 2));
        }
        other => panic!("expected Assign, got {:?}", other),
    }
}

#[test]
fn parse_augmented_assignment() {
    let stmts = parse_source("total += 1\n");
    match &stmts[0].node {
        Stmt::AugAssign { target, op, .. } => {
            assert_eq!(name_of(target), "total");
            assert_eq!(*op, BinOp::Add);
        }
        other => panic!("expected AugAssign, got {:?}", other),
    }
}

#[test]
fn parse_annotated_assignment_drops_annotation() {
    let stmts = parse_source("count: int = 3\nlabel: str\n");
    match &stmts[0].node {
        Stmt::AnnAssign { target, value } => {
            assert_eq!(name_of(target), "count");
            assert!(matches!(value.as_ref().map(|v| &v.node), Some(Expr::Int(3))));
        }
        other => panic!("expected AnnAssign, got {:?}", other),
    }
    assert!(matches!(&stmts[1].node, Stmt::AnnAssign { value: None, .. }));
}

#[test]
fn parse_semicolon_separated_statements() {
    let stmts = parse_source("a = 1; b = 2\n");
    assert_eq!(stmts.len(), 2);
}

#[test]
fn parse_binary_precedence() {
    match single_expr("1 + 2 * 3") {
        Expr::BinOp { op: BinOp::Add, right, .. } => {
            assert!(matches!(right.node, Expr::BinOp { op: BinOp::Mult, .. }));
        }
        other => panic!("expected Add at the root, got {:?}", other),
    }
}

#[test]
fn parse_power_is_right_associative_and_binds_tighter_than_negation() {
    match single_expr("-2 ** 3 ** 2") {
        Expr::UnaryOp { op: UnaryOp::USub, operand } => match &operand.node {
            Expr::BinOp { op: BinOp::Pow, right, .. } => {
                assert!(matches!(right.node, Expr::BinOp { op: BinOp::Pow, .. }));
            }
            other => panic!("expected Pow, got {:?}", other),
        },
        other => panic!("expected USub at the root, got {:?}", other),
    }
}

#[test]
fn parse_boolean_operators() {
    match single_expr("a or b and not c") {
        Expr::BoolOp { op: BoolOp::Or, values } => {
            assert_eq!(values.len(), 2);
            match &values[1].node {
                Expr::BoolOp { op: BoolOp::And, values } => {
                    assert!(matches!(values[1].node, Expr::UnaryOp { op: UnaryOp::Not, .. }));
                }
                other => panic!("expected And, got {:?}", other),
            }
        }
        other => panic!("expected Or, got {:?}", other),
    }
}

#[test]
fn parse_chained_comparison() {
    match single_expr("a < b <= c not in d is not e") {
        Expr::Compare { ops, comparators, .. } => {
            assert_eq!(ops, vec![CmpOp::Lt, CmpOp::LtE, CmpOp::NotIn, CmpOp::IsNot]);
            assert_eq!(comparators.len(), 4);
        }
        other => panic!("expected Compare, got {:?}", other),
    }
}

#[test]
fn parse_call_attribute_subscript_chain() {
    match single_expr("obj.items[0](1, 2)") {
        Expr::Call { func, args, keywords } => {
            assert_eq!(args.len(), 2);
            assert!(keywords.is_empty());
            match &func.node {
                Expr::Subscript { value, .. } => {
                    assert!(matches!(&value.node, Expr::Attribute { attr, .. } if attr == "items"));
                }
                other => panic!("expected Subscript, got {:?}", other),
            }
        }
        other => panic!("expected Call, got {:?}", other),
    }
}

#[test]
fn parse_keyword_arguments() {
    match single_expr("f(1, sep=\"\")") {
        Expr::Call { args, keywords, .. } => {
            assert_eq!(args.len(), 1);
            assert_eq!(keywords[0].arg.as_deref(), Some("sep"));
        }
        other => panic!("expected Call, got {:?}", other),
    }
}

#[test]
fn parse_slice() {
    match single_expr("xs[1:-1:2]") {
        Expr::Subscript { index, .. } => match &index.node {
            Expr::Slice { lower, upper, step } => {
                assert!(lower.is_some() && upper.is_some() && step.is_some());
            }
            other => panic!("expected Slice, got {:?}", other),
        },
        other => panic!("expected Subscript, got {:?}", other),
    }
}

#[test]
fn parse_open_slice() {
    match single_expr("xs[:]") {
        Expr::Subscript { index, .. } => {
            assert!(matches!(
                index.node,
                Expr::Slice { lower: None, upper: None, step: None }
            ));
        }
        other => panic!("expected Subscript, got {:?}", other),
    }
}

#[test]
fn parse_displays() {
    assert!(matches!(single_expr("[1, 2, 3]"), Expr::List(e) if e.len() == 3));
    assert!(matches!(single_expr("()"), Expr::Tuple(e) if e.is_empty()));
    assert!(matches!(single_expr("(1,)"), Expr::Tuple(e) if e.len() == 1));
    assert!(matches!(single_expr("(1)"), Expr::Int(1)));
    assert!(matches!(single_expr("{\"a\": 1, \"b\": 2}"), Expr::Dict(e) if e.len() == 2));
    assert!(matches!(single_expr("{}"), Expr::Dict(e) if e.is_empty()));
    assert!(matches!(single_expr("{1, 2}"), Expr::Set(e) if e.len() == 2));
}

#[test]
fn parse_list_comprehension() {
    match single_expr("[x * 2 for x in xs if x > 0 if x < 9]") {
        Expr::ListComp { generators, .. } => {
            assert_eq!(generators.len(), 1);
            assert_eq!(name_of(&generators[0].target), "x");
            assert_eq!(generators[0].ifs.len(), 2);
        }
        other => panic!("expected ListComp, got {:?}", other),
    }
}

#[test]
fn parse_dict_comprehension() {
    assert!(matches!(
        single_expr("{k: v for k, v in pairs}"),
        Expr::DictComp { .. }
    ));
}

#[test]
fn parse_generator_argument() {
    match single_expr("sum(x for x in xs)") {
        Expr::Call { args, .. } => {
            assert!(matches!(args[0].node, Expr::GeneratorExp { .. }));
        }
        other => panic!("expected Call, got {:?}", other),
    }
}

#[test]
fn parse_conditional_expression() {
    match single_expr("a if cond else b") {
        Expr::IfExp { test, body, orelse } => {
            assert_eq!(name_of(&test), "cond");
            assert_eq!(name_of(&body), "a");
            assert_eq!(name_of(&orelse), "b");
        }
        other => panic!("expected IfExp, got {:?}", other),
    }
}

#[test]
fn parse_lambda() {
    match single_expr("lambda a, b=2, *rest: a") {
        Expr::Lambda { args, .. } => {
            assert_eq!(args.args.len(), 2);
            assert!(args.args[1].default.is_some());
            assert_eq!(args.vararg.as_ref().map(|v| v.node.as_str()), Some("rest"));
        }
        other => panic!("expected Lambda, got {:?}", other),
    }
}

#[test]
fn parse_adjacent_strings_concatenate() {
    match single_expr("\"ab\" 'cd'") {
        Expr::Str(s) => assert_eq!(s, "abcd"),
        other => panic!("expected Str, got {:?}", other),
    }
}

#[test]
fn parse_fstring_fields() {
    match single_expr("f\"{a} and {b.c}\"") {
        Expr::FString(parts) => {
            assert_eq!(parts.len(), 3);
            assert!(matches!(&parts[0], FStringPart::Expr(e) if matches!(e.node, Expr::Name(_))));
            assert!(matches!(&parts[1], FStringPart::Literal(s) if s == " and "));
            assert!(matches!(&parts[2], FStringPart::Expr(e) if matches!(e.node, Expr::Attribute { .. })));
        }
        other => panic!("expected FString, got {:?}", other),
    }
}

#[test]
fn parse_if_elif_else_nests() {
    let stmts = parse_source("if a:\n    pass\nelif b:\n    pass\nelse:\n    x = 1\n");
    match &stmts[0].node {
        Stmt::If { orelse, .. } => {
            assert_eq!(orelse.len(), 1);
            match &orelse[0].node {
                Stmt::If { test, orelse, .. } => {
                    assert_eq!(name_of(test), "b");
                    assert!(matches!(orelse[0].node, Stmt::Assign { .. }));
                }
                other => panic!("expected nested If, got {:?}", other),
            }
        }
        other => panic!("expected If, got {:?}", other),
    }
}

#[test]
fn parse_for_with_tuple_target() {
    let stmts = parse_source("for i, v in enumerate(xs):\n    print(i)\n");
    match &stmts[0].node {
        Stmt::For { target, iter, body, orelse } => {
            assert!(matches!(&target.node, Expr::Tuple(elems) if elems.len() == 2));
            assert!(matches!(iter.node, Expr::Call { .. }));
            assert_eq!(body.len(), 1);
            assert!(orelse.is_empty());
        }
        other => panic!("expected For, got {:?}", other),
    }
}

#[test]
fn parse_while_else() {
    let stmts = parse_source("while x:\n    break\nelse:\n    pass\n");
    match &stmts[0].node {
        Stmt::While { body, orelse, .. } => {
            assert!(matches!(body[0].node, Stmt::Break));
            assert!(matches!(orelse[0].node, Stmt::Pass));
        }
        other => panic!("expected While, got {:?}", other),
    }
}

#[test]
fn parse_function_definition() {
    let source = "def add(a, b=1, *args, **kwargs) -> int:\n    return a + b\n";
    let stmts = parse_source(source);
    match &stmts[0].node {
        Stmt::FunctionDef(def) => {
            assert_eq!(def.name.node, "add");
            assert_eq!(def.args.args.len(), 2);
            assert!(def.args.args[0].default.is_none());
            assert!(def.args.args[1].default.is_some());
            assert_eq!(def.args.vararg.as_ref().map(|v| v.node.as_str()), Some("args"));
            assert_eq!(def.args.kwarg.as_ref().map(|v| v.node.as_str()), Some("kwargs"));
            assert!(matches!(def.body[0].node, Stmt::Return(Some(_))));
        }
        other => panic!("expected FunctionDef, got {:?}", other),
    }
}

#[test]
fn parse_keyword_only_parameters() {
    let stmts = parse_source("def f(a, *, key):\n    pass\n");
    match &stmts[0].node {
        Stmt::FunctionDef(def) => {
            assert!(def.args.vararg.is_none());
            assert_eq!(def.args.kwonly.len(), 1);
        }
        other => panic!("expected FunctionDef, got {:?}", other),
    }
}

#[test]
fn parse_decorators_in_source_order() {
    let stmts = parse_source("@first\n@second.attr\ndef f():\n    pass\n");
    match &stmts[0].node {
        Stmt::FunctionDef(def) => {
            assert_eq!(def.decorators.len(), 2);
            assert_eq!(name_of(&def.decorators[0]), "first");
            assert!(matches!(def.decorators[1].node, Expr::Attribute { .. }));
        }
        other => panic!("expected FunctionDef, got {:?}", other),
    }
}

#[test]
fn parse_class_with_bases() {
    let stmts = parse_source("class Dog(Animal, Pet):\n    legs = 4\n    def bark(self):\n        pass\n");
    match &stmts[0].node {
        Stmt::ClassDef(def) => {
            assert_eq!(def.name.node, "Dog");
            let bases: Vec<&str> = def.bases.iter().map(name_of).collect();
            assert_eq!(bases, vec!["Animal", "Pet"]);
            assert_eq!(def.body.len(), 2);
            assert!(matches!(def.body[1].node, Stmt::FunctionDef(_)));
        }
        other => panic!("expected ClassDef, got {:?}", other),
    }
}

#[test]
fn parse_try_except_finally() {
    let source = "try:\n    f()\nexcept ValueError as e:\n    pass\nexcept:\n    pass\nfinally:\n    g()\n";
    let stmts = parse_source(source);
    match &stmts[0].node {
        Stmt::Try { body, handlers, orelse, finalbody } => {
            assert_eq!(body.len(), 1);
            assert_eq!(handlers.len(), 2);
            assert_eq!(handlers[0].name.as_ref().map(|n| n.node.as_str()), Some("e"));
            assert!(handlers[1].typ.is_none());
            assert!(orelse.is_empty());
            assert_eq!(finalbody.len(), 1);
        }
        other => panic!("expected Try, got {:?}", other),
    }
}

#[test]
fn parse_with_items() {
    let stmts = parse_source("with open(p) as fh, lock:\n    pass\n");
    match &stmts[0].node {
        Stmt::With { items, .. } => {
            assert_eq!(items.len(), 2);
            assert!(items[0].target.is_some());
            assert!(items[1].target.is_none());
        }
        other => panic!("expected With, got {:?}", other),
    }
}

#[test]
fn parse_imports() {
    let stmts = parse_source("import os.path as p, sys\nfrom pkg.mod import a, b as c\nfrom m import *\n");
    match &stmts[0].node {
        Stmt::Import(aliases) => {
            assert_eq!(aliases[0].name, "os.path");
            assert_eq!(aliases[0].asname.as_deref(), Some("p"));
            assert_eq!(aliases[1].name, "sys");
        }
        other => panic!("expected Import, got {:?}", other),
    }
    match &stmts[1].node {
        Stmt::ImportFrom { module, names } => {
            assert_eq!(module, "pkg.mod");
            assert_eq!(names[1].name, "b");
            assert_eq!(names[1].asname.as_deref(), Some("c"));
        }
        other => panic!("expected ImportFrom, got {:?}", other),
    }
    match &stmts[2].node {
        Stmt::ImportFrom { names, .. } => assert_eq!(names[0].name, "*"),
        other => panic!("expected ImportFrom, got {:?}", other),
    }
}

#[test]
fn parse_simple_statements() {
    let stmts = parse_source("del a, b\nraise E from err\nassert x, \"msg\"\nglobal g, h\n");
    assert!(matches!(&stmts[0].node, Stmt::Delete(t) if t.len() == 2));
    assert!(matches!(&stmts[1].node, Stmt::Raise { exc: Some(_), cause: Some(_) }));
    assert!(matches!(&stmts[2].node, Stmt::Assert { msg: Some(_), .. }));
    assert!(matches!(&stmts[3].node, Stmt::Global(names) if names.len() == 2));
}

#[test]
fn parse_statement_spans_cover_source() {
    let source = "value = 10\n";
    let stmts = parse_source(source);
    let span = stmts[0].span;
    assert_eq!(&source[span.start..span.end], "value = 10");
}

#[test]
fn parse_error_on_missing_colon() {
    assert!(matches!(
        parse_error("if x\n    pass\n"),
        PyLuaError::UnexpectedToken { .. }
    ));
}

#[test]
fn parse_error_on_invalid_target() {
    assert!(matches!(
        parse_error("f() = 1\n"),
        PyLuaError::InvalidTarget { .. }
    ));
}

#[test]
fn parse_error_on_missing_block() {
    assert!(matches!(
        parse_error("def f():\npass\n"),
        PyLuaError::IndentationError { .. }
    ));
}

#[test]
fn parse_error_on_try_without_handlers() {
    assert!(matches!(
        parse_error("try:\n    pass\nx = 1\n"),
        PyLuaError::UnexpectedToken { .. }
    ));
}

#[test]
fn parse_error_on_missing_expression() {
    assert!(matches!(
        parse_error("x = \n"),
        PyLuaError::ExpectedExpression { .. }
    ));
}
