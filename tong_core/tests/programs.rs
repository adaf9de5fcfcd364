use std::sync::Arc;
use tong_core::{Error, ErrorKind, Interpreter, Output, ThreadPoolRunner, Value, parse};

fn interpreter() -> (Interpreter, tong_core::CapturedOutput) {
    let (output, captured) = Output::capture();
    (Interpreter::new().with_output(output), captured)
}

fn run(source: &str) -> Vec<String> {
    let (interpreter, captured) = interpreter();
    if let Err(e) = interpreter.run_source(source) {
        panic!("program failed: {}\n{}", e, source);
    }
    captured.lines()
}

fn run_err(source: &str) -> Error {
    let (interpreter, _) = interpreter();
    match interpreter.run_source(source) {
        Ok(()) => panic!("program unexpectedly succeeded:\n{}", source),
        Err(e) => e,
    }
}

#[test]
fn function_call_prints_result() {
    assert_eq!(run("fn add(a, b) { return a + b } print(add(2, 3))"), vec!["5"]);
}

#[test]
fn sum_builtin() {
    assert_eq!(run("let arr = [1, 2, 3] print(sum(arr))"), vec!["6"]);
}

#[test]
fn lambda_call() {
    assert_eq!(run("let f = |x| x * x; print(f(4))"), vec!["16"]);
}

#[test]
fn division_produces_floats() {
    assert_eq!(run("print(4 / 2)\nprint(7 / 2)"), vec!["2.0", "3.5"]);
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    for source in ["print(1 / 0)", "print(1 % 0)", "print(2.5 / 0.0)"] {
        let error = run_err(source);
        assert_eq!(error.kind, ErrorKind::Runtime);
        assert_eq!(error.message, "Division by zero");
    }
}

#[test]
fn modulo_is_floored() {
    assert_eq!(run("print(-7 % 3)\nprint(7 % -3)"), vec!["2", "-2"]);
}

#[test]
fn values_print_in_display_form() {
    assert_eq!(
        run(r#"print(true, None, [1, "a", 2.5], 3.0)"#),
        vec!["true None [1, a, 2.5] 3.0"]
    );
}

#[test]
fn loop_bodies_do_not_open_a_scope() {
    let source = "
var i = 0
while i < 3 {
    let x = i
    i = i + 1
}
print(x)
";
    assert_eq!(run(source), vec!["2"]);
}

#[test]
fn failed_statement_leaves_environment_intact() {
    let (interpreter, captured) = interpreter();
    interpreter.run_source("let a = 1\nlet items = [1]").unwrap();

    let error = interpreter.run_source("print(b)").unwrap_err();
    assert_eq!(error.message, "Undefined variable: b");
    let error = interpreter.run_source("print(items[5])").unwrap_err();
    assert_eq!(error.message, "Array index out of bounds");

    interpreter.run_source("print(a, items)").unwrap();
    assert_eq!(captured.lines(), vec!["1 [1]"]);
}

#[test]
fn closures_outlive_their_defining_call() {
    let source = "
fn make_counter() {
    var count = 0
    fn next() {
        count = count + 1
        return count
    }
    return next
}
let counter = make_counter()
counter()
counter()
print(counter())

fn adder(n) { return |x| x + n }
let add5 = adder(5)
print(add5(10))
";
    assert_eq!(run(source), vec!["3", "15"]);
}

#[test]
fn return_inside_if_inside_while_leaves_the_function() {
    let source = "
fn find(items, target) {
    var i = 0
    while i < len(items) {
        if items[i] == target {
            return i
        }
        i = i + 1
    }
    return -1
}
print(find([5, 7, 9], 9))
print(find([5, 7, 9], 4))
";
    assert_eq!(run(source), vec!["2", "-1"]);
}

#[test]
fn break_and_continue_inside_nested_blocks() {
    let source = "
var n = 0
loop {
    n = n + 1
    if n >= 5 { break }
}
print(n)

var total = 0
for x in [1, 2, 3, 4, 5, 6] {
    if x % 2 == 0 { continue }
    total = total + x
}
print(total)
";
    assert_eq!(run(source), vec!["5", "9"]);
}

#[test]
fn break_cannot_escape_a_function() {
    let error = run_err("fn f() { break }\nwhile true { f() }");
    assert_eq!(error.message, "'break' outside of a loop in function 'f'");
}

#[test]
fn recursion() {
    let source = "
fn fib(n) {
    if n < 2 { return n }
    return fib(n - 1) + fib(n - 2)
}
print(fib(15))
";
    assert_eq!(run(source), vec!["610"]);
}

#[test]
fn match_selects_first_accepted_arm() {
    let source = r#"
fn classify(n) {
    return match n {
        _ if n < 0 => "negative",
        _ if n == 0 => "zero",
        _ => "positive",
    }
}
print(classify(-3), classify(0), classify(8))
"#;
    assert_eq!(run(source), vec!["negative zero positive"]);
}

#[test]
fn if_expressions_produce_values() {
    let source = r#"
let label = if 3 > 2 { "yes" } else { "no" }
let missing = if false { 1 }
print(label, missing)
"#;
    assert_eq!(run(source), vec!["yes None"]);
}

#[test]
fn higher_order_builtins() {
    let source = "
let nums = [1, 2, 3, 4]
print(map(nums, |x| x * 10))
print(filter(nums, |x| x % 2 == 0))
print(reduce(nums, |acc, x| acc + x, 100))
print(sum([]))
";
    assert_eq!(run(source), vec!["[10, 20, 30, 40]", "[2, 4]", "110", "0"]);
}

#[test]
fn strings_index_by_character() {
    assert_eq!(
        run(r#"let s = "hello" print(len(s), s[1], s + " world")"#),
        vec!["5 e hello world"]
    );
    assert_eq!(run_err(r#""abc"[3]"#).message, "String index out of bounds");
}

#[test]
fn default_and_missing_arguments() {
    let source = r#"
fn greet(name, greeting = "hi") { return greeting + " " + name }
print(greet("bob"))
print(greet("amy", "yo", "ignored"))
"#;
    assert_eq!(run(source), vec!["hi bob", "yo amy"]);
    assert_eq!(
        run_err("fn f(a) { return a }\nf()").message,
        "Missing argument for parameter a"
    );
}

#[test]
fn runtime_error_messages() {
    assert_eq!(run_err("let x = 1\nx()").message, "Cannot call non-function value: i64");
    assert_eq!(run_err("let a = [1]\na[0] = 2").message, "Invalid assignment target");
    assert_eq!(run_err(r#"print(1 < "a")"#).message, "Cannot compare i64 and String");
    assert_eq!(run_err(r#"print("a" + 1)"#).message, "Cannot add String and i64");
    assert_eq!(run_err("for c in 3 { }").message, "Cannot iterate over i64");
    assert_eq!(run_err("undefined_name = 1").message, "Undefined variable: undefined_name");
    assert_eq!(run_err("let x = 1\nprint(&x)").message, "Unsupported unary operator: &");
    assert_eq!(run_err(r#"print("a" - 1)"#).message, "Cannot subtract String and i64");
    assert_eq!(run_err(r#"print(true * 2)"#).message, "Cannot multiply bool and i64");
    assert_eq!(run_err(r#"print("a" / 2)"#).message, "Cannot divide String and i64");
    assert_eq!(run_err("print(1.5 % 1)").message, "Cannot perform modulo on f64 and i64");
    assert_eq!(run_err("print([1] + [2])").message, "Cannot add Array<i64> and Array<i64>");
}

#[test]
fn length_field_on_arrays_and_strings() {
    let source = r#"
let a = [1, 2, 3]
let s = "héllo"
print(a.length, s.length, [].length, "".length)
"#;
    assert_eq!(run(source), vec!["3 5 0 0"]);
    assert_eq!(run_err("let n = 3\nn.length").message, "No field 'length' on type i64");
}

#[test]
fn power_operator_is_a_parse_error() {
    let error = parse("2 ** 3").unwrap_err();
    assert_eq!(error.kind, ErrorKind::Parser);
    assert_eq!(error.line, Some(1));
}

#[test]
fn linalg_module_through_field_access() {
    let source = "
import linalg
let a = linalg.tensor([[1, 2], [3, 4]], [2, 2])
let b = linalg.transpose(a)
print(linalg.to_array(linalg.matmul(a, b)))
print(linalg.shape(b), linalg.get(a, [1, 0]))
";
    assert_eq!(run(source), vec!["[5.0, 11.0, 11.0, 25.0]", "[2, 2] 3.0"]);
}

#[test]
fn import_items_and_aliases() {
    let source = "
import linalg::{ones, dot}
let v = ones([3])
print(dot(v, v))
import linalg as la
print(la.rank(la.zeros([2, 3])))
let dynamic = import(\"linalg\")
print(dynamic.rank(v))
";
    assert_eq!(run(source), vec!["3.0", "2", "1"]);
}

#[test]
fn module_errors() {
    assert_eq!(run_err("import nope").message, "Unknown module: nope");
    assert_eq!(
        run_err("import linalg::{inverse}").message,
        "Module 'linalg' has no export 'inverse'"
    );
    assert_eq!(
        run_err("import linalg\nlinalg.inverse(1)").message,
        "Module 'linalg' has no export 'inverse'"
    );
    assert_eq!(run_err("let x = 1\nx.y").message, "No field 'y' on type i64");
}

#[test]
fn module_declarations_export_their_bindings() {
    let source = "
module geometry {
    let unit = 1
    fn square(x) { return x * x }
}
print(geometry.square(4), geometry.unit)
";
    assert_eq!(run(source), vec!["16 1"]);
}

#[test]
fn parallel_block_yields_last_non_none_value() {
    let source = "
let result = parallel {
    1 + 1
    2 * 3
    None
}
let scoped = parallel {
    let hidden = 5
}
print(result, scoped)
";
    assert_eq!(run(source), vec!["6 None"]);
    assert!(run_err("parallel { let hidden = 5 }\nprint(hidden)").message.contains("hidden"));
}

#[test]
fn loop_control_cannot_leave_a_parallel_block() {
    let error = run_err("while true { parallel { break } }");
    assert_eq!(error.message, "'break' cannot leave a parallel block");
}

#[test]
fn async_and_gpu_kernel_functions_run_inline() {
    let source = "
async fn fetch() { return 7 }
gpu_kernel fn scale(x) { return x * 2 }
print(await fetch())
print(gpu_kernel scale(21))
let d = distributed { fetch() }
print(d)
";
    assert_eq!(run(source), vec!["7", "42", "7"]);
}

#[test]
fn thread_pool_runner_gives_the_same_results() {
    let (output, captured) = Output::capture();
    let runner = Arc::new(ThreadPoolRunner::new(4).unwrap());
    let interpreter = Interpreter::new().with_output(output).with_runner(runner);
    interpreter.globals().define("xs", Value::array((0..2000).map(Value::Integer).collect()));

    let source = "
print(sum(xs))
let doubled = map(xs, |x| x * 2)
print(len(doubled), doubled[1999])
let r = parallel {
    sum([1, 2, 3])
    map([1, 2], |x| x + 1)
}
print(r)
";
    interpreter.run_source(source).unwrap();
    assert_eq!(captured.lines(), vec!["1999000", "2000 3998", "[2, 3]"]);
}

#[test]
fn library_api_evaluates_against_an_environment() {
    let interpreter = Interpreter::new();
    interpreter.run_source("let base = 40").unwrap();

    let program = parse("base + 2").unwrap();
    let tong_core::language::ast::Statement::Expression(expr) = &program.statements[0] else {
        panic!("expected an expression statement");
    };
    let value = interpreter.evaluate_expression(expr, interpreter.globals()).unwrap();
    assert_eq!(value, Value::Integer(42));
}
