//! Node ordering, deep equality and truthiness.

use std::cmp::Ordering;

use crate::model::{Json, Kind};

/// Typed comparison selector for callers that know what they are sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareBy {
    /// Kind-paired comparison, see [`compare`].
    #[default]
    Auto,
    /// Compare display strings lexicographically.
    Text,
    /// Compare at full decimal precision; non-numbers sort last.
    Number,
    /// Compare truthiness, `false` before `true`.
    Boolean,
}

/// Order two nodes.
///
/// Nodes of a shared comparable kind order by value: arrays by length,
/// objects by size, strings lexicographically, numbers by decimal value,
/// booleans with `false` first. Null sorts before everything else.
/// Incomparable pairs report [`Ordering::Equal`] so that sorting a
/// mixed-kind array stays stable instead of failing.
pub fn compare<N: Json>(a: &N, b: &N) -> Ordering {
    match (a.kind(), b.kind()) {
        (Kind::Array, Kind::Array) | (Kind::Object, Kind::Object) => a.len().cmp(&b.len()),
        (Kind::String, Kind::String) => a.as_str().cmp(&b.as_str()),
        (Kind::Number, Kind::Number) => match (a.as_big_decimal(), b.as_big_decimal()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => Ordering::Equal,
        },
        (Kind::Bool, Kind::Bool) => a.as_bool().cmp(&b.as_bool()),
        (Kind::Null, Kind::Null) => Ordering::Equal,
        (Kind::Null, _) => Ordering::Less,
        (_, Kind::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Order two nodes under an explicit [`CompareBy`] mode.
pub fn compare_as<N: Json>(by: CompareBy, a: &N, b: &N) -> Ordering {
    match by {
        CompareBy::Auto => compare(a, b),
        CompareBy::Text => a.to_display_string().cmp(&b.to_display_string()),
        CompareBy::Number => match (a.as_big_decimal(), b.as_big_decimal()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        CompareBy::Boolean => truthy(a).cmp(&truthy(b)),
    }
}

/// Structural deep equality.
///
/// Arrays are equal when pairwise equal in order; objects when their key
/// sets match and values are equal per key, regardless of insertion
/// order; numbers compare numerically at full precision, so `1.0` equals
/// `1.00`.
pub fn deep_eq<N: Json>(a: &N, b: &N) -> bool {
    match (a.kind(), b.kind()) {
        (Kind::Null, Kind::Null) => true,
        (Kind::Bool, Kind::Bool) => a.as_bool() == b.as_bool(),
        (Kind::Number, Kind::Number) => a.as_big_decimal() == b.as_big_decimal(),
        (Kind::String, Kind::String) => a.as_str() == b.as_str(),
        (Kind::Array, Kind::Array) => {
            a.len() == b.len() && a.elements().zip(b.elements()).all(|(x, y)| deep_eq(x, y))
        }
        (Kind::Object, Kind::Object) => {
            a.len() == b.len()
                && a.entries()
                    .all(|(key, x)| b.get(key).is_some_and(|y| deep_eq(x, y)))
        }
        _ => false,
    }
}

/// JavaScript-style truthiness: non-empty containers and strings,
/// non-zero numbers and `true` are truthy; null is not.
pub fn truthy<N: Json>(node: &N) -> bool {
    match node.kind() {
        Kind::Null => false,
        Kind::Bool => node.as_bool().unwrap_or(false),
        Kind::Number => node
            .as_big_decimal()
            .is_some_and(|d| d != bigdecimal::BigDecimal::from(0)),
        Kind::String => node.as_str().is_some_and(|s| !s.is_empty()),
        Kind::Array | Kind::Object => node.len() > 0,
    }
}

/// Strict truthiness: like [`truthy`] except strings are truthy only
/// when they spell `true`, case-insensitively.
pub fn truthy_strict<N: Json>(node: &N) -> bool {
    match node.kind() {
        Kind::String => node.as_str().is_some_and(|s| s.eq_ignore_ascii_case("true")),
        _ => truthy(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn null_sorts_first() {
        assert_eq!(compare(&json!(null), &json!(0)), Ordering::Less);
        assert_eq!(compare(&json!("a"), &json!(null)), Ordering::Greater);
        assert_eq!(compare(&json!(null), &json!(null)), Ordering::Equal);
    }

    #[test]
    fn incomparable_kinds_are_equal() {
        assert_eq!(compare(&json!("a"), &json!(1)), Ordering::Equal);
        assert_eq!(compare(&json!([1]), &json!({"a": 1})), Ordering::Equal);
    }

    #[test]
    fn sorting_comparable_kinds_is_total() {
        let mut items = vec![json!(3), json!(null), json!(1), json!(null), json!(2)];
        items.sort_by(compare);
        assert_eq!(
            items,
            vec![json!(null), json!(null), json!(1), json!(2), json!(3)]
        );

        let mut texts = vec![json!("pear"), json!("apple"), json!("fig")];
        texts.sort_by(compare);
        assert_eq!(texts, vec![json!("apple"), json!("fig"), json!("pear")]);
    }

    #[test]
    fn numbers_compare_at_full_precision() {
        let a: Value = serde_json::from_str("0.10000000000000000000000001").unwrap();
        let b: Value = serde_json::from_str("0.10000000000000000000000002").unwrap();
        assert_eq!(compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn typed_comparators() {
        assert_eq!(compare_as(CompareBy::Text, &json!(10), &json!(9)), Ordering::Less);
        assert_eq!(
            compare_as(CompareBy::Number, &json!(10), &json!(9)),
            Ordering::Greater
        );
        assert_eq!(
            compare_as(CompareBy::Number, &json!("x"), &json!(9)),
            Ordering::Greater
        );
        assert_eq!(
            compare_as(CompareBy::Boolean, &json!(""), &json!("x")),
            Ordering::Less
        );
    }

    #[test]
    fn deep_equality() {
        let a: Value = serde_json::from_str(r#"{"x": 1.0, "y": [1, 2]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y": [1, 2], "x": 1.00}"#).unwrap();
        assert!(deep_eq(&a, &b));
        assert!(!deep_eq(&a, &json!({"x": 1.0, "y": [2, 1]})));
        assert!(!deep_eq(&json!({"a": null}), &json!({})));
    }

    #[test]
    fn javascript_truthiness() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!([])));
        assert!(!truthy(&json!({})));
        assert!(truthy(&json!(-1)));
        assert!(truthy(&json!("false")));
        assert!(truthy(&json!([0])));
    }

    #[test]
    fn strict_truthiness_parses_booleans() {
        assert!(truthy_strict(&json!("TRUE")));
        assert!(!truthy_strict(&json!("yes")));
        assert!(truthy_strict(&json!(1)));
    }
}
