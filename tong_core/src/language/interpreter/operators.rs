use std::cmp::Ordering;
use crate::language::ast::{BinaryOperator, UnaryOperator};
use crate::language::error::Result;
use crate::runtime_error;
use super::value::Value;

pub fn binary(operator: BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
    match operator {
        BinaryOperator::Add => add(left, right),
        BinaryOperator::Subtract => arithmetic(operator, "subtract", left, right, i64::checked_sub, |a, b| a - b),
        BinaryOperator::Multiply => arithmetic(operator, "multiply", left, right, i64::checked_mul, |a, b| a * b),
        BinaryOperator::Divide => divide(left, right),
        BinaryOperator::Modulo => modulo(left, right),
        BinaryOperator::Equal => Ok(Value::Boolean(left == right)),
        BinaryOperator::NotEqual => Ok(Value::Boolean(left != right)),
        BinaryOperator::Less => compare(left, right, Ordering::is_lt),
        BinaryOperator::LessEqual => compare(left, right, Ordering::is_le),
        BinaryOperator::Greater => compare(left, right, Ordering::is_gt),
        BinaryOperator::GreaterEqual => compare(left, right, Ordering::is_ge),
        BinaryOperator::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
        BinaryOperator::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
    }
}

/// `+` on numbers and strings. Shared with the `sum` builtin.
pub fn add(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        _ => arithmetic(BinaryOperator::Add, "add", left, right, i64::checked_add, |a, b| a + b),
    }
}

fn arithmetic(
    operator: BinaryOperator,
    verb: &str,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => match int_op(*a, *b) {
            Some(result) => Ok(Value::Integer(result)),
            None => runtime_error!("Integer overflow in {} {} {}", a, operator, b),
        },
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Float(float_op(*a as f64, *b))),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Float(float_op(*a, *b as f64))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(*a, *b))),
        _ => runtime_error!("Cannot {} {} and {}", verb, left.type_name(), right.type_name()),
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Integer(n) => *n == 0,
        Value::Float(n) => *n == 0.0,
        _ => false,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        _ => None,
    }
}

fn divide(left: &Value, right: &Value) -> Result<Value> {
    if is_zero(right) {
        return runtime_error!("Division by zero");
    }
    match (as_float(left), as_float(right)) {
        (Some(a), Some(b)) => Ok(Value::Float(a / b)),
        _ => runtime_error!("Cannot divide {} and {}", left.type_name(), right.type_name()),
    }
}

/// Integer remainder taking the sign of the divisor.
fn modulo(left: &Value, right: &Value) -> Result<Value> {
    if is_zero(right) {
        return runtime_error!("Division by zero");
    }
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => {
            let Some(remainder) = a.checked_rem(*b) else {
                return runtime_error!("Integer overflow in {} % {}", a, b);
            };
            if remainder != 0 && (remainder < 0) != (*b < 0) {
                Ok(Value::Integer(remainder + b))
            } else {
                Ok(Value::Integer(remainder))
            }
        }
        _ => runtime_error!("Cannot perform modulo on {} and {}", left.type_name(), right.type_name()),
    }
}

fn compare(left: &Value, right: &Value, accept: fn(Ordering) -> bool) -> Result<Value> {
    match left.compare(right) {
        Some(ordering) => Ok(Value::Boolean(accept(ordering))),
        // NaN operands
        None if as_float(left).is_some() && as_float(right).is_some() => Ok(Value::Boolean(false)),
        None => runtime_error!("Cannot compare {} and {}", left.type_name(), right.type_name()),
    }
}

pub fn unary(operator: UnaryOperator, operand: &Value) -> Result<Value> {
    match (operator, operand) {
        (UnaryOperator::Negate, Value::Integer(n)) => match n.checked_neg() {
            Some(negated) => Ok(Value::Integer(negated)),
            None => runtime_error!("Integer overflow in -{}", n),
        },
        (UnaryOperator::Negate, Value::Float(n)) => Ok(Value::Float(-n)),
        (UnaryOperator::Negate, other) => runtime_error!("Cannot negate {}", other.type_name()),
        (UnaryOperator::Not, value) => Ok(Value::Boolean(!value.is_truthy())),
        (UnaryOperator::Reference | UnaryOperator::Dereference, _) => {
            runtime_error!("Unsupported unary operator: {}", operator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    fn text(s: &str) -> Value {
        Value::String(s.to_string())
    }

    fn message(result: Result<Value>) -> String {
        result.unwrap_err().message
    }

    #[test]
    fn integer_arithmetic_stays_integral() {
        assert_eq!(binary(BinaryOperator::Add, &int(2), &int(3)).unwrap(), int(5));
        assert!(matches!(binary(BinaryOperator::Multiply, &int(4), &int(3)).unwrap(), Value::Integer(12)));
        assert!(matches!(binary(BinaryOperator::Add, &int(1), &Value::Float(0.5)).unwrap(), Value::Float(f) if f == 1.5));
    }

    #[test]
    fn division_always_produces_float() {
        assert!(matches!(binary(BinaryOperator::Divide, &int(7), &int(2)).unwrap(), Value::Float(f) if f == 3.5));
        assert!(matches!(binary(BinaryOperator::Divide, &int(6), &int(3)).unwrap(), Value::Float(f) if f == 2.0));
        assert_eq!(message(binary(BinaryOperator::Divide, &int(1), &int(0))), "Division by zero");
        assert_eq!(message(binary(BinaryOperator::Divide, &int(1), &Value::Float(0.0))), "Division by zero");
        assert_eq!(message(binary(BinaryOperator::Modulo, &int(1), &int(0))), "Division by zero");
    }

    #[test]
    fn modulo_takes_sign_of_divisor() {
        assert_eq!(binary(BinaryOperator::Modulo, &int(7), &int(3)).unwrap(), int(1));
        assert_eq!(binary(BinaryOperator::Modulo, &int(-7), &int(3)).unwrap(), int(2));
        assert_eq!(binary(BinaryOperator::Modulo, &int(7), &int(-3)).unwrap(), int(-2));
        assert!(binary(BinaryOperator::Modulo, &Value::Float(1.5), &int(1)).is_err());
    }

    #[test]
    fn overflow_is_reported() {
        assert!(message(binary(BinaryOperator::Add, &int(i64::MAX), &int(1))).starts_with("Integer overflow"));
        assert!(unary(UnaryOperator::Negate, &int(i64::MIN)).is_err());
    }

    #[test]
    fn only_strings_concatenate() {
        assert_eq!(binary(BinaryOperator::Add, &text("ab"), &text("cd")).unwrap(), text("abcd"));
        assert_eq!(message(add(&text("a"), &int(1))), "Cannot add String and i64");
        assert_eq!(
            message(add(&Value::array(vec![int(1)]), &Value::array(vec![int(2)]))),
            "Cannot add Array<i64> and Array<i64>"
        );
    }

    #[test]
    fn mismatched_operands_name_the_operation() {
        let cases = [
            (BinaryOperator::Subtract, "Cannot subtract String and i64"),
            (BinaryOperator::Multiply, "Cannot multiply String and i64"),
            (BinaryOperator::Divide, "Cannot divide String and i64"),
            (BinaryOperator::Modulo, "Cannot perform modulo on String and i64"),
        ];
        for (operator, expected) in cases {
            assert_eq!(message(binary(operator, &text("a"), &int(1))), expected);
        }
        assert_eq!(
            message(binary(BinaryOperator::Modulo, &Value::Float(1.5), &int(1))),
            "Cannot perform modulo on f64 and i64"
        );
    }

    #[test]
    fn comparisons() {
        assert_eq!(binary(BinaryOperator::Less, &int(1), &Value::Float(1.5)).unwrap(), Value::Boolean(true));
        assert_eq!(binary(BinaryOperator::GreaterEqual, &text("b"), &text("a")).unwrap(), Value::Boolean(true));
        assert_eq!(binary(BinaryOperator::Equal, &int(1), &text("1")).unwrap(), Value::Boolean(false));
        assert_eq!(message(binary(BinaryOperator::Less, &int(1), &text("1"))), "Cannot compare i64 and String");
    }

    #[test]
    fn logical_operators_yield_booleans() {
        assert_eq!(binary(BinaryOperator::And, &int(1), &text("x")).unwrap(), Value::Boolean(true));
        assert_eq!(binary(BinaryOperator::Or, &Value::None, &int(0)).unwrap(), Value::Boolean(false));
        assert_eq!(unary(UnaryOperator::Not, &Value::array(vec![])).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn reference_operators_are_rejected() {
        assert_eq!(message(unary(UnaryOperator::Reference, &int(1))), "Unsupported unary operator: &");
        assert_eq!(message(unary(UnaryOperator::Negate, &text("x"))), "Cannot negate String");
    }
}
