use std::{fs, path::Path};

use super::*;

macro_rules! testlist {
    ($($name:ident,)*) => {
    $(
        #[test]
        fn $name() {
            run_test(stringify!($name))
        }
    )*
    }
}

testlist! {
    add_then_multiply,
    chained_exponent,
    chained_subtract,
    constant_float,
    constant_leading_dot,
    equality_lowest,
    modulo_below_add,
    modulo_then_mul_add,
    multiply_then_add,
    mixed_precedence,
    variable_dotted_path,
    variable_hyphenated,
    error_empty,
    error_operator_first,
    error_trailing_operator,
    error_two_values,
    error_unknown_operator,
}

fn run_test(name: &str) {
    let rootdir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let test_data_dir = rootdir.join("src/parser/formula_parser/tests/testdata");

    let test_file = test_data_dir.join(format!("tests/{}.txt", name));
    let expected_file = test_data_dir.join(format!("expected/{}.txt", name));
    let actual_dir = test_data_dir.join("actual");
    let actual_file = actual_dir.join(format!("{}.txt", name));

    let test = fs::read_to_string(test_file).unwrap();

    let parser = FormulaParser::new();
    let result = parser.parse(test.trim());
    let actual = format_result(result);

    fs::create_dir_all(actual_dir).unwrap();
    fs::write(actual_file, &actual).unwrap();

    let expected = fs::read_to_string(expected_file).unwrap();
    pretty_assertions::assert_eq!(expected, actual);
}

fn format_result(result: Result<Expr, TemplateError>) -> String {
    let mut string = String::new();

    string.push_str("ERROR: ");

    let expr = match result {
        Ok(expr) => expr,
        Err(err) => {
            string.push_str(&err.to_string());
            string.push('\n');
            return string;
        }
    };

    string.push_str("<None>\n");
    string.push_str("OUT:\n");
    fomat_expr(&mut string, &expr);
    string.push('\n');

    string
}

fn fomat_expr(string: &mut String, expr: &Expr) {
    match expr {
        Expr::Variable(var) => string.push_str(&format!("${}", var)),
        Expr::Constant(constant) => string.push_str(&constant.value),
        Expr::Binary(binary_op) => fomat_binary_op(string, binary_op),
    }
}

fn fomat_binary_op(string: &mut String, binary_op: &ExprOpBinary) {
    string.push('(');
    fomat_expr(string, &binary_op.left);
    string.push(')');
    string.push_str(binary_op.op.symbol());
    string.push('(');
    fomat_expr(string, &binary_op.right);
    string.push(')');
}

#[test]
fn parentheses_are_rejected() {
    let parser = FormulaParser::new();
    let err = parser.parse("(2 + 3) * 4").unwrap_err();
    assert!(matches!(err, TemplateError::Expression { .. }));
}

#[test]
fn whitespace_is_optional() {
    let parser = FormulaParser::new();
    assert_eq!(parser.parse("2+3*4").unwrap(), parser.parse("2 + 3 * 4").unwrap());
}
