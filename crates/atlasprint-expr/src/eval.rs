// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Expression evaluator with SQL-style three-valued logic.
//
// NULL propagates through comparisons and arithmetic; AND/OR short-circuit on
// a decisive operand even when the other side is NULL.  Unknown columns and
// unbound variables evaluate to NULL rather than failing.

use regex::RegexBuilder;
use serde_json::{Number, Value};
use std::cmp::Ordering;

use crate::ast::{BinaryOp, Node, UnaryOp};

/// Data an expression is evaluated against.
pub trait EvalContext {
    /// Row identifier (`$id`).
    fn feature_id(&self) -> Option<i64>;

    /// Attribute value by column name.
    fn attribute(&self, name: &str) -> Option<&Value>;

    /// Context variable (`@name`).
    fn variable(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Evaluate a node.
pub fn evaluate(node: &Node, ctx: &dyn EvalContext) -> Value {
    match node {
        Node::Literal(v) => v.clone(),
        Node::Column(name) => ctx.attribute(name).cloned().unwrap_or(Value::Null),
        Node::FeatureVariable(name) => {
            if name.eq_ignore_ascii_case("id") {
                ctx.feature_id().map_or(Value::Null, Value::from)
            } else {
                Value::Null
            }
        }
        Node::ContextVariable(name) => ctx.variable(name).unwrap_or(Value::Null),
        Node::Unary { op, operand } => {
            let v = evaluate(operand, ctx);
            match op {
                UnaryOp::Not => to_bool(&v).map_or(Value::Null, |b| Value::Bool(!b)),
                UnaryOp::Neg => to_f64(&v).map_or(Value::Null, |f| number(-f)),
            }
        }
        Node::Binary { op, left, right } => eval_binary(*op, left, right, ctx),
        Node::InList {
            operand,
            list,
            negated,
        } => {
            let v = evaluate(operand, ctx);
            if v.is_null() {
                return Value::Null;
            }
            let mut saw_null = false;
            for item in list {
                let candidate = evaluate(item, ctx);
                if candidate.is_null() {
                    saw_null = true;
                } else if values_equal(&v, &candidate) {
                    return Value::Bool(!negated);
                }
            }
            if saw_null {
                Value::Null
            } else {
                Value::Bool(*negated)
            }
        }
        Node::IsNull { operand, negated } => {
            Value::Bool(evaluate(operand, ctx).is_null() != *negated)
        }
        Node::Like {
            operand,
            pattern,
            case_insensitive,
            negated,
        } => {
            let v = evaluate(operand, ctx);
            let p = evaluate(pattern, ctx);
            if v.is_null() || p.is_null() {
                return Value::Null;
            }
            match like(&display(&v), &display(&p), *case_insensitive) {
                Some(m) => Value::Bool(m != *negated),
                None => Value::Null,
            }
        }
        Node::Function { name, args } => call(name, args, ctx),
    }
}

fn eval_binary(op: BinaryOp, left: &Node, right: &Node, ctx: &dyn EvalContext) -> Value {
    match op {
        BinaryOp::And => {
            let l = to_bool(&evaluate(left, ctx));
            if l == Some(false) {
                return Value::Bool(false);
            }
            let r = to_bool(&evaluate(right, ctx));
            match (l, r) {
                (_, Some(false)) => Value::Bool(false),
                (Some(true), Some(true)) => Value::Bool(true),
                _ => Value::Null,
            }
        }
        BinaryOp::Or => {
            let l = to_bool(&evaluate(left, ctx));
            if l == Some(true) {
                return Value::Bool(true);
            }
            let r = to_bool(&evaluate(right, ctx));
            match (l, r) {
                (_, Some(true)) => Value::Bool(true),
                (Some(false), Some(false)) => Value::Bool(false),
                _ => Value::Null,
            }
        }
        _ => {
            let l = evaluate(left, ctx);
            let r = evaluate(right, ctx);
            if l.is_null() || r.is_null() {
                return Value::Null;
            }
            match op {
                BinaryOp::Eq => Value::Bool(values_equal(&l, &r)),
                BinaryOp::Ne => Value::Bool(!values_equal(&l, &r)),
                BinaryOp::Lt => ordering_is(&l, &r, |o| o == Ordering::Less),
                BinaryOp::Le => ordering_is(&l, &r, |o| o != Ordering::Greater),
                BinaryOp::Gt => ordering_is(&l, &r, |o| o == Ordering::Greater),
                BinaryOp::Ge => ordering_is(&l, &r, |o| o != Ordering::Less),
                BinaryOp::Concat => Value::String(format!("{}{}", display(&l), display(&r))),
                BinaryOp::Add => arithmetic(&l, &r, |a, b| a.checked_add(b), |a, b| a + b),
                BinaryOp::Sub => arithmetic(&l, &r, |a, b| a.checked_sub(b), |a, b| a - b),
                BinaryOp::Mul => arithmetic(&l, &r, |a, b| a.checked_mul(b), |a, b| a * b),
                BinaryOp::Div => match (to_f64(&l), to_f64(&r)) {
                    (Some(_), Some(b)) if b == 0.0 => Value::Null,
                    (Some(a), Some(b)) => number(a / b),
                    _ => Value::Null,
                },
                BinaryOp::Mod => match (to_f64(&l), to_f64(&r)) {
                    (Some(_), Some(b)) if b == 0.0 => Value::Null,
                    _ => arithmetic(&l, &r, |a, b| a.checked_rem(b), |a, b| a % b),
                },
                BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
            }
        }
    }
}

fn call(name: &str, args: &[Node], ctx: &dyn EvalContext) -> Value {
    let mut values = args.iter().map(|a| evaluate(a, ctx));
    match name {
        "coalesce" => values.find(|v| !v.is_null()).unwrap_or(Value::Null),
        _ => {
            let arg = values.next().unwrap_or(Value::Null);
            if arg.is_null() {
                return Value::Null;
            }
            match name {
                "upper" => Value::String(display(&arg).to_uppercase()),
                "lower" => Value::String(display(&arg).to_lowercase()),
                "length" => Value::from(display(&arg).chars().count() as i64),
                "to_string" => Value::String(display(&arg)),
                "to_int" => to_f64(&arg).map_or(Value::Null, |f| Value::from(f.trunc() as i64)),
                _ => Value::Null,
            }
        }
    }
}

/// Interpret a value as a boolean; `None` means NULL / not convertible.
pub fn to_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "" | "false" | "0" => Some(false),
            _ => Some(true),
        },
        Value::Array(a) => Some(!a.is_empty()),
        Value::Object(o) => Some(!o.is_empty()),
    }
}

fn to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn display(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn number(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// Integer arithmetic when both sides are integers, float otherwise.
fn arithmetic(
    l: &Value,
    r: &Value,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Value {
    if let (Some(a), Some(b)) = (l.as_i64(), r.as_i64()) {
        if let Some(result) = int_op(a, b) {
            return Value::from(result);
        }
    }
    match (to_f64(l), to_f64(r)) {
        (Some(a), Some(b)) => number(float_op(a, b)),
        _ => Value::Null,
    }
}

/// Equality with numeric coercion: `'42' = 42` holds.
fn values_equal(l: &Value, r: &Value) -> bool {
    if l == r {
        return true;
    }
    match (l, r) {
        (Value::Number(_), _) | (_, Value::Number(_)) => match (to_f64(l), to_f64(r)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        (Value::Bool(b), other) | (other, Value::Bool(b)) => to_bool(other) == Some(*b),
        _ => display(l) == display(r),
    }
}

fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    let numeric = matches!(l, Value::Number(_)) || matches!(r, Value::Number(_));
    if numeric {
        if let (Some(a), Some(b)) = (to_f64(l), to_f64(r)) {
            return a.partial_cmp(&b);
        }
    }
    Some(display(l).cmp(&display(r)))
}

fn ordering_is(l: &Value, r: &Value, pred: impl Fn(Ordering) -> bool) -> Value {
    compare(l, r).map_or(Value::Null, |o| Value::Bool(pred(o)))
}

/// SQL `LIKE`: `%` matches any run, `_` any single character.
fn like(text: &str, pattern: &str, case_insensitive: bool) -> Option<bool> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            other => re.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    re.push('$');

    RegexBuilder::new(&re)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .ok()
        .map(|re| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Expression;
    use serde_json::{Map, json};

    struct Row {
        id: i64,
        attrs: Map<String, Value>,
    }

    impl EvalContext for Row {
        fn feature_id(&self) -> Option<i64> {
            Some(self.id)
        }

        fn attribute(&self, name: &str) -> Option<&Value> {
            self.attrs.get(name)
        }

        fn variable(&self, name: &str) -> Option<Value> {
            (name == "layer_name").then(|| json!("parcels"))
        }
    }

    fn row(id: i64, attrs: Value) -> Row {
        let Value::Object(attrs) = attrs else {
            panic!("attrs must be an object");
        };
        Row { id, attrs }
    }

    fn eval(src: &str, r: &Row) -> Value {
        Expression::parse(src).unwrap().evaluate(r)
    }

    #[test]
    fn feature_id_filter() {
        let r = row(42, json!({}));
        assert_eq!(eval("$id = 42", &r), json!(true));
        assert_eq!(eval("$id IN (1, 2)", &r), json!(false));
    }

    #[test]
    fn column_comparisons_with_coercion() {
        let r = row(1, json!({"gid": 42, "code": "42", "name": "Lyon"}));
        assert_eq!(eval("\"gid\" = '42'", &r), json!(true));
        assert_eq!(eval("\"code\" = 42", &r), json!(true));
        assert_eq!(eval("\"gid\" >= 40 AND \"gid\" < 50", &r), json!(true));
        assert_eq!(eval("\"name\" > 'Amiens'", &r), json!(true));
    }

    #[test]
    fn null_propagation() {
        let r = row(1, json!({"a": null}));
        assert_eq!(eval("\"a\" = 1", &r), Value::Null);
        assert_eq!(eval("\"missing\" = 1", &r), Value::Null);
        assert_eq!(eval("\"a\" = 1 OR TRUE", &r), json!(true));
        assert_eq!(eval("\"a\" = 1 AND FALSE", &r), json!(false));
        assert_eq!(eval("NOT (\"a\" = 1)", &r), Value::Null);
        assert_eq!(eval("\"a\" IS NULL", &r), json!(true));
        assert_eq!(eval("\"a\" IS NOT NULL", &r), json!(false));
    }

    #[test]
    fn in_list_with_null_member() {
        let r = row(1, json!({"a": 3}));
        assert_eq!(eval("\"a\" IN (1, NULL)", &r), Value::Null);
        assert_eq!(eval("\"a\" IN (3, NULL)", &r), json!(true));
        assert_eq!(eval("\"a\" NOT IN (1, 2)", &r), json!(true));
    }

    #[test]
    fn like_patterns() {
        let r = row(1, json!({"name": "Saint-Étienne"}));
        assert_eq!(eval("\"name\" LIKE 'Saint-%'", &r), json!(true));
        assert_eq!(eval("\"name\" LIKE 'saint-%'", &r), json!(false));
        assert_eq!(eval("\"name\" ILIKE 'saint-%'", &r), json!(true));
        assert_eq!(eval("\"name\" LIKE 'Saint_Étienne'", &r), json!(true));
        assert_eq!(eval("\"name\" NOT LIKE '%.%'", &r), json!(true));
    }

    #[test]
    fn arithmetic_and_concat() {
        let r = row(7, json!({"w": 3, "h": 2.5}));
        assert_eq!(eval("\"w\" * 2 + 1", &r), json!(7));
        assert_eq!(eval("\"w\" * \"h\"", &r), json!(7.5));
        assert_eq!(eval("\"w\" / 0", &r), Value::Null);
        assert_eq!(eval("'page ' || $id", &r), json!("page 7"));
        assert_eq!(eval("-\"w\"", &r), json!(-3.0));
    }

    #[test]
    fn functions() {
        let r = row(1, json!({"name": "lyon", "n": null}));
        assert_eq!(eval("upper(\"name\")", &r), json!("LYON"));
        assert_eq!(eval("length(\"name\")", &r), json!(4));
        assert_eq!(eval("coalesce(\"n\", 'x')", &r), json!("x"));
        assert_eq!(eval("to_int('12.9')", &r), json!(12));
        assert_eq!(eval("lower(\"n\")", &r), Value::Null);
    }

    #[test]
    fn context_variables() {
        let r = row(1, json!({}));
        assert_eq!(eval("@layer_name", &r), json!("parcels"));
        assert_eq!(eval("@unbound", &r), Value::Null);
    }

    #[test]
    fn matches_requires_true() {
        let r = row(1, json!({"a": null}));
        let expr = Expression::parse("\"a\" = 1").unwrap();
        assert!(!expr.matches(&r));
        assert!(!Expression::parse("").unwrap().matches(&r));
        assert!(Expression::parse("1").unwrap().matches(&r));
    }
}
