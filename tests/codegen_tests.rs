use pretty_assertions::assert_eq;

use pylua::config::Config;
use pylua::error::PyLuaError;
use pylua::{translate, Translator};

fn lua(source: &str) -> String {
    translate(source).expect("translation should succeed")
}

fn lua_with(config: Config, source: &str) -> String {
    Translator::new(config)
        .translate(source)
        .expect("translation should succeed")
}

fn translation_error(source: &str) -> PyLuaError {
    translate(source).expect_err("translation should fail")
}

fn unsupported(source: &str) -> String {
    match translation_error(source) {
        PyLuaError::UnsupportedConstruct { construct, .. } => construct,
        other => panic!("expected UnsupportedConstruct, got {:?}", other),
    }
}

// Bindings

#[test]
fn first_write_is_declared_local() {
    assert_eq!(lua("x = 1\nx = 2\n"), "local x = 1\nx = 2");
}

#[test]
fn module_level_locals_can_be_disabled() {
    let config = Config {
        top_locals: false,
        ..Config::default()
    };
    assert_eq!(
        lua_with(config, "x = 1\ndef f():\n    y = 1\n"),
        "x = 1\nfunction f()\n    local y = 1\nend"
    );
}

#[test]
fn nested_block_binding_does_not_leak() {
    let source = "def f(a):\n    if a:\n        y = 1\n    y = 2\n";
    assert_eq!(
        lua(source),
        "local function f(a)\n    if a then\n        local y = 1\n    end\n    local y = 2\nend"
    );
}

#[test]
fn parameters_are_never_redeclared() {
    assert_eq!(
        lua("def f(a):\n    a = 5\n    return a\n"),
        "local function f(a)\n    a = 5\n    return a\nend"
    );
}

#[test]
fn function_bodies_start_with_fresh_bindings() {
    assert_eq!(
        lua("x = 1\ndef f():\n    x = 2\n"),
        "local x = 1\nlocal function f()\n    local x = 2\nend"
    );
}

#[test]
fn global_declaration_suppresses_local() {
    assert_eq!(
        lua("def f():\n    global counter\n    counter = 1\n"),
        "local function f()\n    counter = 1\nend"
    );
}

#[test]
fn tuple_assignment_declares_only_fresh_names() {
    assert_eq!(
        lua("a, b = 1, 2\na, c = 3, 4\n"),
        "local a, b = 1, 2\nlocal c\na, c = 3, 4"
    );
}

#[test]
fn chained_assignment_copies_first_target() {
    assert_eq!(lua("a = b = 0\n"), "local a = 0\nlocal b = a");
}

#[test]
fn augmented_assignment_rewrites_to_binary() {
    assert_eq!(
        lua("x = 1\nx += 2\nx //= 2\nitems[0] -= 1\n"),
        "local x = 1\nx = (x + 2)\nx = math.floor(x / 2)\nitems[0] = (items[0] - 1)"
    );
}

#[test]
fn lua_keywords_are_renamed() {
    assert_eq!(lua("end = 1\nprint(end)\n"), "local end_ = 1\nprint(end_)");
}

#[test]
fn delete_assigns_nil() {
    assert_eq!(lua("del a, b\n"), "a, b = nil, nil");
}

#[test]
fn annotated_assignment_without_value_emits_nothing() {
    assert_eq!(lua("n: int = 3\nm: int\n"), "local n = 3");
}

// Loops

#[test]
fn loop_labels_are_unique() {
    assert_eq!(
        lua("for i in range(3):\n    pass\nwhile True:\n    break\n"),
        "for _, i in iterate(range(3)) do\n    ::loop_label_1::\nend\nwhile true do\n    break\n    ::loop_label_2::\nend"
    );
}

#[test]
fn loop_labels_stay_unique_across_modules() {
    let translator = Translator::default();
    let first = translator
        .translate("for i in xs:\n    pass\n")
        .expect("translation should succeed");
    let second = translator
        .translate("for i in xs:\n    pass\n")
        .expect("translation should succeed");
    assert!(first.contains("::loop_label_1::"));
    assert!(second.contains("::loop_label_2::"));
}

#[test]
fn continue_jumps_to_loop_label() {
    let source = "for i in range(2):\n    for j in range(2):\n        continue\n";
    assert_eq!(
        lua(source),
        "\
for _, i in iterate(range(2)) do
    for _, j in iterate(range(2)) do
        do
            goto loop_label_2
        end
        ::loop_label_2::
    end
    ::loop_label_1::
end"
    );
}

#[test]
fn loop_body_ending_in_return_is_wrapped() {
    let source = "def first(xs):\n    for x in xs:\n        return x\n";
    assert_eq!(
        lua(source),
        "\
local function first(xs)
    for _, x in iterate(xs) do
        do
            return x
        end
        ::loop_label_1::
    end
end"
    );
}

#[test]
fn return_before_more_statements_is_wrapped() {
    let source = "def f():\n    return 1\n    print(2)\n";
    assert_eq!(
        lua(source),
        "local function f()\n    do return 1 end\n    print(2)\nend"
    );
}

#[test]
fn loop_target_is_not_redeclared_in_body() {
    assert_eq!(
        lua("for k, v in pairs:\n    v = k\n"),
        "for _, k, v in iterate(pairs) do\n    v = k\n    ::loop_label_1::\nend"
    );
}

// Control flow

#[test]
fn elif_chain_is_flattened() {
    let source = "if a:\n    print(1)\nelif b:\n    print(2)\nelif c:\n    print(3)\nelse:\n    print(4)\n";
    assert_eq!(
        lua(source),
        "\
if a then
    print(1)
elseif b then
    print(2)
elseif c then
    print(3)
else
    print(4)
end"
    );
}

#[test]
fn try_except_finally() {
    let source = "try:\n    f()\nexcept ValueError as e:\n    print(e)\nfinally:\n    done()\n";
    assert_eq!(
        lua(source),
        "\
xpcall(function()
    f()
end, function(Error)
    local e = Error
    print(e)
end)
done()"
    );
}

#[test]
fn multiple_handlers_get_their_own_blocks() {
    let source = "try:\n    f()\nexcept ValueError:\n    g()\nexcept KeyError as e:\n    h(e)\n";
    assert_eq!(
        lua(source),
        "\
xpcall(function()
    f()
end, function(Error)
    do
        g()
    end
    do
        local e = Error
        h(e)
    end
end)"
    );
}

#[test]
fn with_statement_binds_in_a_block() {
    assert_eq!(
        lua("with open(\"f\") as fh:\n    fh.read()\n"),
        "do\n    local fh = open(\"f\")\n    fh:read()\nend"
    );
}

#[test]
fn raise_and_assert() {
    assert_eq!(
        lua("raise ValueError(\"bad\")\nraise\nassert x > 0, \"negative\"\n"),
        "error(ValueError(\"bad\"))\nerror(Error)\nassert((x > 0), \"negative\")"
    );
}

#[test]
fn imports_become_require() {
    let source = "import os.path\nimport json as j\nfrom m import a, b as c\nfrom n import *\n";
    assert_eq!(
        lua(source),
        "\
local path = require(\"os.path\")
local j = require(\"json\")
local a = require(\"m\").a
local c = require(\"m\").b
require(\"n\")"
    );
}

#[test]
fn bare_expression_statements() {
    assert_eq!(lua("x\n...\nf()\n"), "local _ = x\nf()");
}

// Functions

#[test]
fn recursive_function() {
    let source = "def factorial(value):\n    return 1 if value == 0 else value * factorial(value - 1)\n";
    assert_eq!(
        lua(source),
        "\
local function factorial(value)
    return ((value == 0) and 1 or (value * factorial((value - 1))))
end"
    );
}

#[test]
fn default_and_variadic_parameters() {
    assert_eq!(
        lua("def f(a, b=1, *args, **kwargs):\n    return b\n"),
        "\
local function f(a, b, ...)
    b = b or 1
    local args = list(table.pack(...))
    local kwargs = dict {}
    return b
end"
    );
}

#[test]
fn decorator_chain_applies_innermost_first() {
    let source = "@italic\n@strong\ndef hello(name):\n    return \"Hello, \" + name + \"!\"\n";
    assert_eq!(
        lua(source),
        "\
local hello = italic(strong(function(name)
    return ((\"Hello, \" + name) + \"!\")
end))"
    );
}

#[test]
fn docstring_becomes_comment() {
    assert_eq!(
        lua("def f():\n    \"\"\"Doc.\"\"\"\n    return 1\n"),
        "local function f()\n    --[[ Doc. ]]\n    return 1\nend"
    );
}

#[test]
fn luacode_pragma_prepends_file_contents() {
    let path = std::env::temp_dir().join(format!("pylua-pragma-{}.lua", std::process::id()));
    std::fs::write(&path, "local helper = 1\n").expect("write temp file");
    let source = format!("\"[[luacode={}]]return helper\"\n", path.display());
    let result = lua(&source);
    std::fs::remove_file(&path).ok();
    assert_eq!(result, "local helper = 1\nreturn helper");
}

#[test]
fn luacode_pragma_with_missing_file_keeps_the_code() {
    let source = "\"[[luacode=definitely/not/here.lua]]return 1\"\n";
    assert_eq!(lua(source), "return 1");
}

#[test]
fn luacode_pragma_is_emitted_verbatim() {
    assert_eq!(lua("\"[[luacode]]return 42\"\n"), "return 42");
    assert_eq!(
        lua("def f():\n    \"[[luacode]]return select('#', ...)\"\n"),
        "local function f()\n    return select('#', ...)\nend"
    );
}

#[test]
fn lambda_with_default() {
    assert_eq!(
        lua("f = lambda a, b=2: a + b\n"),
        "local f = function(a, b) b = b or 2 return (a + b) end"
    );
}

// Classes

#[test]
fn class_with_metamethods() {
    let source = "\
class V:
    def __add__(self, other):
        return other
    def __str__(self):
        return \"v\"
    def helper(self):
        pass
";
    assert_eq!(
        lua(source),
        "\
local V = class(function(V)
    function V.__add__(self, other)
        return other
    end
    function V.__str__(self)
        return \"v\"
    end
    function V.helper(self)
    end
    return V
end, \"V\", {}, {__add = \"__add__\", __tostring = \"__str__\"}, {})"
    );
}

#[test]
fn class_attributes_and_bases() {
    let source = "class Dog(Animal):\n    legs = 4\n    a, b = 1, 2\n";
    assert_eq!(
        lua(source),
        "\
local Dog = class(function(Dog)
    Dog.legs = 4
    Dog.a, Dog.b = 1, 2
    return Dog
end, \"Dog\", {Animal}, {}, {})"
    );
}

#[test]
fn class_properties_and_setters() {
    let source = "\
class P:
    @property
    def size(self):
        return self._size
    @size.setter
    def size(self, value):
        self._size = value
";
    assert_eq!(
        lua(source),
        "\
local P = class(function(P)
    P.size = property(function(self)
        return self._size
    end)
    P.size = P.size:setter(function(self, value)
        self._size = value
    end)
    return P
end, \"P\", {}, {}, {size = \"P.size\"})"
    );
}

#[test]
fn class_name_receiver_uses_dot_call() {
    let source = "class A:\n    def f(self):\n        return A.g(self.h(1))\n";
    assert_eq!(
        lua(source),
        "\
local A = class(function(A)
    function A.f(self)
        return A.g(self:h(1))
    end
    return A
end, \"A\", {}, {}, {})"
    );
}

#[test]
fn nested_class_is_qualified() {
    let source = "class Outer:\n    class Inner:\n        pass\n";
    assert_eq!(
        lua(source),
        "\
local Outer = class(function(Outer)
    Outer.Inner = class(function(Inner)
        return Inner
    end, \"Inner\", {}, {}, {})
    return Outer
end, \"Outer\", {}, {}, {})"
    );
}

#[test]
fn class_return_at_the_end() {
    let mut config = Config::default();
    config.class.return_at_the_end = true;
    assert_eq!(
        lua_with(config, "class A:\n    pass\n"),
        "local A = class(function(A)\n    return A\nend, \"A\", {}, {}, {})\nreturn A"
    );
}

// Expressions

#[test]
fn arithmetic_operators() {
    assert_eq!(
        lua("y = 7 // 2 + 2 ** 3 % 5\n"),
        "local y = (math.floor(7 / 2) + math.fmod(math.pow(2, 3), 5))"
    );
    assert_eq!(
        lua("z = a | b & ~c\n"),
        "local z = bit32.bor(a, bit32.band(b, bit32.bnot(c)))"
    );
}

#[test]
fn comparisons_and_membership() {
    assert_eq!(
        lua("ok = 0 < x <= 10\nfound = k in d\nmissing = k not in d\nsame = a is None\n"),
        "\
local ok = (0 < x and x <= 10)
local found = (operator_in(k, d))
local missing = (not operator_in(k, d))
local same = (a == nil)"
    );
}

#[test]
fn boolean_and_unary_operators() {
    assert_eq!(lua("r = a and not b or c\n"), "local r = ((a and not b) or c)");
    assert_eq!(lua("n = - -x\n"), "local n = - -x");
    assert_eq!(lua("p = +x\n"), "local p = x");
}

#[test]
fn conditional_expression() {
    assert_eq!(lua("v = a if c else b\n"), "local v = (c and a or b)");
}

#[test]
fn calls_choose_dot_or_colon() {
    assert_eq!(
        lua("x = math.floor(1.5)\ns.append(1)\na.b().c()\nf(*args)\n(lambda: 1)()\n"),
        "\
local x = math.floor(1.5)
s:append(1)
a:b():c()
f(unpack(args))
(function() return 1 end)()"
    );
}

#[test]
fn literals() {
    assert_eq!(
        lua("a = 1.5\nb = True\nc = None\nd = 2.0\n"),
        "local a = 1.5\nlocal b = true\nlocal c = nil\nlocal d = 2.0"
    );
}

#[test]
fn string_literals() {
    assert_eq!(lua("s = 'say \"hi\"'\n"), "local s = \"say \\\"hi\\\"\"");
    assert_eq!(lua("t = \"tab\\there\"\n"), "local t = \"tab\\there\"");
    assert_eq!(lua("u = \"a\\nb\"\n"), "local u = [[a\nb]]");
    assert_eq!(lua("v = \"a]]\\nb\"\n"), "local v = [=[a]]\nb]=]");
}

#[test]
fn fstring_concatenates_parts() {
    assert_eq!(
        lua("msg = f\"x={x}!\"\n"),
        "local msg = (\"x=\" .. str(x) .. \"!\")"
    );
}

#[test]
fn containers() {
    assert_eq!(
        lua("xs = [1, 2]\nt = ()\nd = {\"a\": 1, b: 2}\n"),
        "local xs = list {1, 2}\nlocal t = list {}\nlocal d = dict {[\"a\"] = 1, [b] = 2}"
    );
}

#[test]
fn subscripts_and_slices() {
    assert_eq!(
        lua("y = xs[1:]\nz = xs[-1]\nw = xs[::2]\n"),
        "\
local y = xs[Slice(1, nil, nil)]
local z = xs[-1]
local w = xs[Slice(nil, nil, 2)]"
    );
}

#[test]
fn list_literal_ending_in_possible_nil_records_its_length() {
    assert_eq!(
        lua("xs = [1, None]\nys = [a, 2]\nzs = [2, a]\n"),
        "local xs = list {1, nil, n = 2}\nlocal ys = list {a, 2}\nlocal zs = list {2, a, n = 2}"
    );
}

#[test]
fn comprehension_accumulators_do_not_capture_user_names() {
    let lua_text = lua("result = 1\nxs = [[result for y in b] for x in a]\n");
    assert!(lua_text.contains("local result_1 = list {}"), "{}", lua_text);
    assert!(lua_text.contains("local result_2 = list {}"), "{}", lua_text);
    assert!(lua_text.contains("result_2:append(result)"), "{}", lua_text);
    assert!(lua_text.contains("return result_1 end)()"), "{}", lua_text);
}

#[test]
fn comprehensions() {
    assert_eq!(
        lua("evens = [x for x in range(10) if x % 2 == 0]\n"),
        "local evens = (function() local result_1 = list {} for _, x in iterate(range(10)) do \
         if (math.fmod(x, 2) == 0) then result_1:append(x) end end return result_1 end)()"
    );
    assert_eq!(
        lua("sq = {k: k * k for k in ks}\n"),
        "local sq = (function() local result_1 = dict {} for _, k in iterate(ks) do \
         result_1[k] = (k * k) end return result_1 end)()"
    );
}

// Errors

#[test]
fn continue_outside_loop() {
    assert!(matches!(
        translation_error("continue\n"),
        PyLuaError::ContinueOutsideLoop { .. }
    ));
}

#[test]
fn break_outside_loop() {
    assert!(matches!(
        translation_error("break\n"),
        PyLuaError::BreakOutsideLoop { .. }
    ));
}

#[test]
fn function_body_does_not_see_enclosing_loop() {
    assert!(matches!(
        translation_error("for x in y:\n    def f():\n        continue\n"),
        PyLuaError::ContinueOutsideLoop { .. }
    ));
}

#[test]
fn unsupported_constructs_are_named() {
    assert_eq!(unsupported("s = {1, 2}\n"), "set display");
    assert_eq!(unsupported("f(a=1)\n"), "keyword arguments");
    assert_eq!(unsupported("x = a @ b\n"), "operator '@'");
    assert_eq!(unsupported("while x:\n    pass\nelse:\n    pass\n"), "while-else");
    assert_eq!(unsupported("for x in y:\n    pass\nelse:\n    pass\n"), "for-else");
    assert_eq!(unsupported("def f(*, k):\n    pass\n"), "keyword-only parameters");
    assert_eq!(unsupported("def g():\n    yield 1\n"), "yield expression");
    assert_eq!(unsupported("@dec\nclass A:\n    pass\n"), "class decorators");
    assert_eq!(unsupported("x[1, 2] = 3\n"), "tuple subscript");
    assert_eq!(unsupported("a.b, c = 1, 2\n"), "attribute in a tuple target");
}

#[test]
fn error_render_points_at_source() {
    let source = "if x:\n    continue\n";
    let err = translation_error(source);
    let rendered = err.render(source, "main.py");
    assert!(rendered.contains("'continue' not properly in loop"));
    assert!(rendered.contains("main.py:2:5"));
}

#[test]
fn loop_control_inside_try_is_unsupported() {
    let source = "for x in xs:\n    try:\n        f(x)\n    except:\n        continue\n";
    assert_eq!(unsupported(source), "continue inside try");
    let source = "while True:\n    try:\n        break\n    except:\n        pass\n";
    assert_eq!(unsupported(source), "break inside try");
}

#[test]
fn loop_inside_try_may_continue() {
    let source = "try:\n    for x in xs:\n        continue\nexcept:\n    pass\n";
    assert!(lua(source).contains("goto loop_label_1"));
}
