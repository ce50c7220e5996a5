//! Run translated programs on an embedded Lua 5.4 and compare what they print.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::{Lua, Variadic};
use pretty_assertions::assert_eq;

fn run_lua(lua_source: &str) -> String {
    let lua = Lua::new();
    let printed = Rc::new(RefCell::new(Vec::<String>::new()));

    let sink = Rc::clone(&printed);
    let print = lua
        .create_function(move |_, parts: Variadic<String>| {
            sink.borrow_mut().push(parts.join("\t"));
            Ok(())
        })
        .expect("create print");
    lua.globals().set("print", print).expect("install print");

    lua.load(pylua::prelude())
        .set_name("luainit")
        .exec()
        .expect("prelude should load");
    if let Err(e) = lua.load(lua_source).set_name("translated").exec() {
        panic!("translated code failed: {}\n\n{}", e, lua_source);
    }

    let lines = printed.borrow().join("\n");
    lines
}

fn run_python(source: &str) -> String {
    let lua_source = pylua::translate(source).expect("translation should succeed");
    run_lua(&lua_source)
}

fn run_fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    let source = std::fs::read_to_string(&path).expect("fixture should exist");
    run_python(&source)
}

// ── Fixtures ──

#[test]
fn factorial_program() {
    assert_eq!(run_fixture("factorial.py"), "120\n3628800\n6\n1");
}

#[test]
fn class_program() {
    assert_eq!(
        run_fixture("class.py"),
        "\
Hello, my name is: Sparky!
Hello, my name is: Barky!
Bark! Bark! Bark!
Bark! Bark! Bark!
Animal.PLANET =  Earth
sparky.PLANET =  Earth
barky.PLANET =  Earth
Animal.PLANET =  Mars
sparky.PLANET =  Mars"
    );
}

#[test]
fn operator_overloading_program() {
    assert_eq!(
        run_fixture("class_extended.py"),
        "11\n-1\n30\n0.8333333333333334\n5\n5\n6\nyes\ninit\ninit\nTrue"
    );
}

#[test]
fn decorator_program() {
    assert_eq!(
        run_fixture("decorator.py"),
        "<em><strong>Hello, John!</strong></em>"
    );
}

// ── Snippets ──

#[test]
fn list_comprehension_with_filter() {
    assert_eq!(run_python("print([x for x in range(3) if x != 1])\n"), "[0, 2]");
}

#[test]
fn exception_is_caught_by_handler() {
    let source = "\
try:
    raise ValueError(\"bad\")
except ValueError as e:
    print(\"caught\", e)
";
    assert_eq!(run_python(source), "caught bad");
}

#[test]
fn finally_runs_after_handler() {
    let source = "\
try:
    raise ValueError(\"x\")
except ValueError:
    print(\"handled\")
finally:
    print(\"cleanup\")
";
    assert_eq!(run_python(source), "handled\ncleanup");
}

#[test]
fn continue_skips_rest_of_body() {
    let source = "\
total = 0
for i in range(5):
    if i == 2:
        continue
    total += i
print(total)
";
    assert_eq!(run_python(source), "8");
}

#[test]
fn break_leaves_while_loop() {
    let source = "\
n = 0
while True:
    n += 1
    if n == 4:
        break
print(n)
";
    assert_eq!(run_python(source), "4");
}

#[test]
fn dict_iterates_in_insertion_order() {
    let source = "\
d = {}
d[\"a\"] = 1
d[\"b\"] = 2
for k in d:
    print(k, d[k])
";
    assert_eq!(run_python(source), "a 1\nb 2");
}

#[test]
fn string_repetition_and_concatenation() {
    assert_eq!(run_python("print(\"ab\" * 2 + \"!\")\n"), "abab!");
}

#[test]
fn fstring_formats_values() {
    let source = "name = \"x\"\nn = 2\nprint(f\"hi {name}! {n + 1}\")\n";
    assert_eq!(run_python(source), "hi x! 3");
}

#[test]
fn list_slicing_and_negative_index() {
    let source = "xs = [1, 2, 3, 4]\nprint(xs[1:3], xs[-1], xs[::-1])\n";
    assert_eq!(run_python(source), "[2, 3] 4 [4, 3, 2, 1]");
}

#[test]
fn lambda_default_argument() {
    let source = "f = lambda a, b=2: a + b\nprint(f(1), f(1, 5))\n";
    assert_eq!(run_python(source), "3 6");
}

#[test]
fn arithmetic_operators() {
    assert_eq!(run_python("print(7 // 2, 2 ** 10, 7 % 3, 7 / 2)\n"), "3 1024 1 3.5");
}

#[test]
fn membership_tests() {
    let source = "xs = [1, 2]\nprint(2 in xs, 5 not in xs, \"ell\" in \"hello\")\n";
    assert_eq!(run_python(source), "True True True");
}

#[test]
fn property_getter_and_setter() {
    let source = "\
class Box:
    def __init__(self):
        self._size = 1

    @property
    def size(self):
        return self._size

    @size.setter
    def size(self, value):
        self._size = value * 2

b = Box()
b.size = 5
print(b.size)
";
    assert_eq!(run_python(source), "10");
}

#[test]
fn inherited_method_overrides() {
    let source = "\
class Base:
    def name(self):
        return \"base\"

    def greet(self):
        return \"I am \" + self.name()

class Child(Base):
    def name(self):
        return \"child\"

print(Base().greet(), Child().greet())
print(isinstance(Child(), Base), isinstance(Base(), Child))
";
    assert_eq!(run_python(source), "I am base I am child\nTrue False");
}

#[test]
fn enumerate_and_list_methods() {
    let source = "\
items = []
for i, word in enumerate([\"a\", \"b\"]):
    items.append(word * (i + 1))
print(items, len(items))
";
    assert_eq!(run_python(source), "['a', 'bb'] 2");
}

#[test]
fn nested_loops_over_one_list() {
    let source = "\
xs = [1, 2]
for a in xs:
    for b in xs:
        print(a, b)
";
    assert_eq!(run_python(source), "1 1\n1 2\n2 1\n2 2");
}

#[test]
fn nested_loops_over_one_dict() {
    let source = "\
d = {}
d[\"a\"] = 1
d[\"b\"] = 2
for k in d:
    for j in d:
        print(k, j)
";
    assert_eq!(run_python(source), "a a\na b\nb a\nb b");
}

#[test]
fn list_holding_none_keeps_its_length() {
    let source = "\
xs = [1, None, 3]
print(len(xs))
for x in xs:
    print(x)
print(xs)
";
    assert_eq!(run_python(source), "3\n1\nNone\n3\n[1, None, 3]");
}

#[test]
fn trailing_none_survives_append() {
    let source = "ys = [1, None]\nys.append(2)\nprint(len(ys), ys)\n";
    assert_eq!(run_python(source), "3 [1, None, 2]");
}

#[test]
fn varargs_count_none_arguments() {
    let source = "def f(*args):\n    return len(args)\nprint(f(1, None), f())\n";
    assert_eq!(run_python(source), "2 0");
}

#[test]
fn early_return_skips_rest_of_function() {
    let source = "def f():\n    return 1\n    print(2)\nprint(f())\n";
    assert_eq!(run_python(source), "1");
}

#[test]
fn comprehension_reads_outer_result_name() {
    let source = "result = 10\nprint([result + x for x in range(2)], result)\n";
    assert_eq!(run_python(source), "[10, 11] 10");
}
