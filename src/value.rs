//! Dynamic values held by cells and passed through listeners.
//!
//! Cells box a [`serde_json::Value`]; this module holds the text conversions
//! used when a value lands in the document.

pub use serde_json::{json, Value};

/// Render a value as node text.
///
/// Strings are emitted without quotes, `null` renders empty, whole floats drop
/// their fraction, arrays are comma-joined, objects serialize as JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Value::Array(items) => items.iter().map(to_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Render a value as an attribute value. Arrays are joined with spaces.
pub fn to_attribute(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(to_text).collect::<Vec<_>>().join(" "),
        other => to_text(other),
    }
}

/// Anything that is not an object or an array.
pub fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

/// Strict equality for primitives. Numbers compare by magnitude so `1` and
/// `1.0` are the same value; containers never compare equal.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => false,
        _ => a == b,
    }
}

/// JavaScript-style truthiness.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Convert `CamelCase` to `kebab-case`.
///
/// A hyphen is inserted before every non-lowercase character once at least
/// two characters have been written, so `TodoList` becomes `todo-list` while
/// `AB` stays `ab`.
pub fn kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut written = 0usize;
    for c in name.chars() {
        if !c.is_lowercase() && written > 1 {
            out.push('-');
            written += 1;
        }
        for lower in c.to_lowercase() {
            out.push(lower);
            written += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_of_primitives() {
        assert_eq!(to_text(&json!("hi")), "hi");
        assert_eq!(to_text(&json!(null)), "");
        assert_eq!(to_text(&json!(true)), "true");
        assert_eq!(to_text(&json!(3)), "3");
        assert_eq!(to_text(&json!(1.0)), "1");
        assert_eq!(to_text(&json!(1.5)), "1.5");
        assert_eq!(to_text(&json!(-2)), "-2");
    }

    #[test]
    fn text_of_containers() {
        assert_eq!(to_text(&json!([1, "a", null])), "1,a,");
        assert_eq!(to_text(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn attribute_arrays_join_with_spaces() {
        assert_eq!(to_attribute(&json!(["btn", "btn-primary"])), "btn btn-primary");
        assert_eq!(to_attribute(&json!(2)), "2");
    }

    #[test]
    fn primitives() {
        assert!(is_primitive(&json!(1)));
        assert!(is_primitive(&json!(null)));
        assert!(!is_primitive(&json!([])));
        assert!(!is_primitive(&json!({})));
    }

    #[test]
    fn strict_equality() {
        assert!(strict_eq(&json!(1), &json!(1.0)));
        assert!(strict_eq(&json!("a"), &json!("a")));
        assert!(!strict_eq(&json!("1"), &json!(1)));
        assert!(!strict_eq(&json!([]), &json!([])));
        assert!(!strict_eq(&json!({}), &json!({})));
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(true)));
    }

    #[test]
    fn kebab_case() {
        assert_eq!(kebab("Counter"), "counter");
        assert_eq!(kebab("TodoList"), "todo-list");
        assert_eq!(kebab("MyTodoApp"), "my-todo-app");
        assert_eq!(kebab("AB"), "ab");
        assert_eq!(kebab("Anonym3"), "anonym-3");
        assert_eq!(kebab("a-b"), "a-b");
        assert_eq!(kebab("Item2"), "item-2");
    }
}
