//! Path-addressed deep merge.
//!
//! [`merge_into`] walks a tokenized path from the front, creating missing
//! intermediate objects, appending into arrays and promoting scalars to
//! arrays on collision. When the walk ends on an object and the incoming
//! value is an object, their keys are united shallowly; nesting comes
//! from the path walk, not from recursing into both trees.

use crate::compare::deep_eq;
use crate::model::{Json, Kind};
use crate::path::{tokenize, Segment};

/// Merge `value` into `root` at `path`.
///
/// A null `value` or null `root` leaves `root` untouched, as does a root
/// that is not an object.
pub fn merge_into<N: Json>(root: &mut N, value: N, path: &str) {
    if value.is_null() || root.is_null() {
        return;
    }
    if !root.is_object() {
        tracing::debug!(path, "merge root is not an object, leaving it untouched");
        return;
    }

    let segments = tokenize(path);
    let mut object: &mut N = root;
    let mut idx = 0;
    loop {
        if idx == segments.len() {
            // the walk ended on an object: shallow key union
            if value.is_object() {
                let incoming: Vec<(String, N)> = value
                    .entries()
                    .map(|(key, node)| (key.to_owned(), node.clone()))
                    .collect();
                for (key, node) in incoming {
                    object.set(&key, node);
                }
            }
            return;
        }

        let key = segments[idx].key().to_owned();
        let remaining = &segments[idx + 1..];

        let Some(child) = object.get(&key) else {
            let wrapped = wrap_remaining(value, remaining);
            if !wrapped.is_null() {
                object.set(&key, wrapped);
            }
            return;
        };

        if remaining.is_empty() && deep_eq(child, &value) {
            // identical re-assignment keeps the binding as-is
            return;
        }

        match child.kind() {
            Kind::Object if !remaining.is_empty() || value.is_object() => {
                object = match Json::get_mut(object, &key) {
                    Some(next) => next,
                    None => return,
                };
                idx += 1;
            }
            Kind::Array => {
                if let Some(array) = object.get_mut(&key) {
                    array.push(wrap_remaining(value, remaining));
                }
                return;
            }
            _ => {
                let existing = child.clone();
                let mut promoted = N::new_array();
                promoted.push(existing);
                promoted.push(wrap_remaining(value, remaining));
                object.set(&key, promoted);
                return;
            }
        }
    }
}

/// Wrap `value` in one object per segment, innermost last.
fn wrap_remaining<N: Json>(value: N, segments: &[Segment]) -> N {
    let mut current = value;
    for segment in segments.iter().rev() {
        let mut wrapper = N::new_object();
        wrapper.set(segment.key(), current);
        current = wrapper;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn creates_nested_objects() {
        let mut doc = json!({});
        merge_into(&mut doc, json!("V"), "a.b.c");
        assert_eq!(doc, json!({"a": {"b": {"c": "V"}}}));
    }

    #[test]
    fn scalar_collision_promotes_to_array() {
        let mut doc = json!({"a": 1});
        merge_into(&mut doc, json!(2), "a");
        assert_eq!(doc, json!({"a": [1, 2]}));
    }

    #[test]
    fn identical_reassignment_does_not_promote() {
        let mut doc = json!({});
        merge_into(&mut doc, json!("v"), "a.b");
        merge_into(&mut doc, json!("v"), "a.b");
        assert_eq!(doc, json!({"a": {"b": "v"}}));
    }

    #[test]
    fn existing_array_appends() {
        let mut doc = json!({"a": [1, 2]});
        merge_into(&mut doc, json!(3), "a");
        assert_eq!(doc, json!({"a": [1, 2, 3]}));
    }

    #[test]
    fn mid_path_scalar_promotes_with_wrapper() {
        let mut doc = json!({"a": 1});
        merge_into(&mut doc, json!("deep"), "a.b");
        assert_eq!(doc, json!({"a": [1, {"b": "deep"}]}));
    }

    #[test]
    fn mid_path_array_appends_wrapper() {
        let mut doc = json!({"a": [{"b": 1}]});
        merge_into(&mut doc, json!(2), "a.b");
        assert_eq!(doc, json!({"a": [{"b": 1}, {"b": 2}]}));
    }

    #[test]
    fn terminal_object_union_is_shallow() {
        let mut doc = json!({"cfg": {"keep": 1, "nested": {"x": 1, "y": 2}}});
        merge_into(&mut doc, json!({"nested": {"x": 9}, "added": true}), "cfg");
        // "nested" is replaced wholesale, not merged key-by-key
        assert_eq!(
            doc,
            json!({"cfg": {"keep": 1, "nested": {"x": 9}, "added": true}})
        );
    }

    #[test]
    fn object_value_at_fresh_path() {
        let mut doc = json!({});
        merge_into(&mut doc, json!({"x": 1}), "a.b");
        assert_eq!(doc, json!({"a": {"b": {"x": 1}}}));
    }

    #[test]
    fn null_value_is_a_no_op() {
        let mut doc = json!({"a": 1});
        merge_into(&mut doc, json!(null), "a");
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn non_object_root_is_untouched() {
        let mut doc = json!([1, 2]);
        merge_into(&mut doc, json!("x"), "a");
        assert_eq!(doc, json!([1, 2]));
    }

    #[test]
    fn bracket_segments_bind_their_unquoted_key() {
        let mut doc = json!({});
        merge_into(&mut doc, json!(1), "a['dotted.key']");
        assert_eq!(doc, json!({"a": {"dotted.key": 1}}));
    }

    #[test]
    fn root_path_unions_objects() {
        let mut doc = json!({"a": 1});
        merge_into(&mut doc, json!({"b": 2}), "");
        assert_eq!(doc, json!({"a": 1, "b": 2}));
        merge_into(&mut doc, json!({"b": 2}), "$");
        assert_eq!(doc, json!({"a": 1, "b": 2}));
    }
}
