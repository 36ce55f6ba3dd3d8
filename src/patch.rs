//! [JSON Patch (RFC 6902)](https://tools.ietf.org/html/rfc6902)
//! application against the document model.
//!
//! A [`Patch`] is an ordered list of operations applied atomically: when
//! any operation fails, everything already applied is reverted and the
//! document is indistinguishable from the input.

use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::compare::deep_eq;
use crate::model::Json;

/// Representation of a JSON Patch (list of patch operations).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Patch(pub Vec<PatchOperation>);

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = if f.alternate() {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
        .map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// JSON Patch 'add' operation representation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AddOperation {
    /// JSON-Pointer value [RFC6901](https://tools.ietf.org/html/rfc6901) that references a location
    /// within the target document where the operation is performed.
    pub path: String,
    /// Value to add to the target location.
    pub value: Value,
}

/// JSON Patch 'remove' operation representation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RemoveOperation {
    /// JSON-Pointer value [RFC6901](https://tools.ietf.org/html/rfc6901) that references a location
    /// within the target document where the operation is performed.
    pub path: String,
}

/// JSON Patch 'replace' operation representation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReplaceOperation {
    /// JSON-Pointer value [RFC6901](https://tools.ietf.org/html/rfc6901) that references a location
    /// within the target document where the operation is performed.
    pub path: String,
    /// Value to replace with.
    pub value: Value,
}

/// JSON Patch 'move' operation representation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MoveOperation {
    /// JSON-Pointer value [RFC6901](https://tools.ietf.org/html/rfc6901) that references a location
    /// to move value from.
    pub from: String,
    /// JSON-Pointer value [RFC6901](https://tools.ietf.org/html/rfc6901) that references a location
    /// within the target document where the operation is performed.
    pub path: String,
}

/// JSON Patch 'copy' operation representation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CopyOperation {
    /// JSON-Pointer value [RFC6901](https://tools.ietf.org/html/rfc6901) that references a location
    /// to copy value from.
    pub from: String,
    /// JSON-Pointer value [RFC6901](https://tools.ietf.org/html/rfc6901) that references a location
    /// within the target document where the operation is performed.
    pub path: String,
}

/// JSON Patch 'test' operation representation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TestOperation {
    /// JSON-Pointer value [RFC6901](https://tools.ietf.org/html/rfc6901) that references a location
    /// within the target document where the operation is performed.
    pub path: String,
    /// Value to test against.
    pub value: Value,
}

/// JSON Patch single patch operation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "op")]
#[serde(rename_all = "lowercase")]
pub enum PatchOperation {
    /// 'add' operation
    Add(AddOperation),
    /// 'remove' operation
    Remove(RemoveOperation),
    /// 'replace' operation
    Replace(ReplaceOperation),
    /// 'move' operation
    Move(MoveOperation),
    /// 'copy' operation
    Copy(CopyOperation),
    /// 'test' operation
    Test(TestOperation),
}

impl fmt::Display for PatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = if f.alternate() {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
        .map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// What went wrong while applying a single patch operation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PatchErrorKind {
    /// The pointer is not valid RFC 6901 syntax.
    #[error("invalid pointer syntax")]
    PathSyntax,
    /// The addressed location does not exist.
    #[error("target location does not exist")]
    TargetMissing,
    /// An array index fell outside the addressable range.
    #[error("array index out of bounds")]
    IndexOutOfBounds,
    /// The pointer traverses through a value that is not a container.
    #[error("cannot traverse a non-container value")]
    TypeMismatch,
    /// A 'test' operation found a different value.
    #[error("test failed")]
    TestFailed,
    /// A 'move' operation tried to move a value below itself.
    #[error("cannot move a value below itself")]
    IllegalMove,
}

/// This type represents all possible errors that can occur when applying
/// a JSON patch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("operation {operation} failed at '{path}': {kind}")]
pub struct PatchError {
    /// Zero-based index of the operation that failed.
    pub operation: usize,
    /// The pointer the failing operation addressed.
    pub path: String,
    /// What went wrong.
    pub kind: PatchErrorKind,
}

fn fail(operation: usize, path: &str, kind: PatchErrorKind) -> PatchError {
    PatchError {
        operation,
        path: path.to_owned(),
        kind,
    }
}

fn parse_index(str: &str, len: usize) -> Result<usize, PatchErrorKind> {
    // RFC 6901 prohibits leading zeroes in index
    if str.starts_with('0') && str.len() != 1 {
        return Err(PatchErrorKind::PathSyntax);
    }
    let idx = str.parse::<usize>().map_err(|_| PatchErrorKind::PathSyntax)?;
    if idx < len {
        Ok(idx)
    } else {
        Err(PatchErrorKind::IndexOutOfBounds)
    }
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn split_pointer(pointer: &str) -> Result<(&str, String), PatchErrorKind> {
    pointer
        .rfind('/')
        .ok_or(PatchErrorKind::PathSyntax)
        .map(|idx| (&pointer[0..idx], unescape(&pointer[idx + 1..])))
}

fn locate<'a, N: Json>(doc: &'a N, pointer: &str) -> Result<&'a N, PatchErrorKind> {
    if pointer.is_empty() {
        return Ok(doc);
    }
    if !pointer.starts_with('/') {
        return Err(PatchErrorKind::PathSyntax);
    }
    let mut target = doc;
    for token in pointer[1..].split('/') {
        let token = unescape(token);
        target = if target.is_object() {
            target.get(&token).ok_or(PatchErrorKind::TargetMissing)?
        } else if target.is_array() {
            let idx = parse_index(&token, target.len())?;
            target.at(idx).ok_or(PatchErrorKind::TargetMissing)?
        } else {
            return Err(PatchErrorKind::TypeMismatch);
        };
    }
    Ok(target)
}

fn locate_mut<'a, N: Json>(doc: &'a mut N, pointer: &str) -> Result<&'a mut N, PatchErrorKind> {
    if pointer.is_empty() {
        return Ok(doc);
    }
    if !pointer.starts_with('/') {
        return Err(PatchErrorKind::PathSyntax);
    }
    let mut target = doc;
    for token in pointer[1..].split('/') {
        let token = unescape(token);
        target = if target.is_object() {
            match Json::get_mut(target, &token) {
                Some(child) => child,
                None => return Err(PatchErrorKind::TargetMissing),
            }
        } else if target.is_array() {
            let idx = parse_index(&token, target.len())?;
            match Json::at_mut(target, idx) {
                Some(child) => child,
                None => return Err(PatchErrorKind::TargetMissing),
            }
        } else {
            return Err(PatchErrorKind::TypeMismatch);
        };
    }
    Ok(target)
}

fn add<N: Json>(doc: &mut N, path: &str, value: N) -> Result<Option<N>, PatchErrorKind> {
    if path.is_empty() {
        return Ok(Some(mem::replace(doc, value)));
    }

    let (parent, last) = split_pointer(path)?;
    let parent = locate_mut(doc, parent)?;

    if parent.is_object() {
        Ok(parent.set(&last, value))
    } else if parent.is_array() {
        if last == "-" {
            parent.push(value);
            Ok(None)
        } else {
            let idx = parse_index(&last, parent.len() + 1)?;
            parent.insert_at(idx, value);
            Ok(None)
        }
    } else {
        Err(PatchErrorKind::TypeMismatch)
    }
}

fn remove<N: Json>(doc: &mut N, path: &str, allow_last: bool) -> Result<N, PatchErrorKind> {
    let (parent, last) = split_pointer(path)?;
    let parent = locate_mut(doc, parent)?;

    if parent.is_object() {
        parent.remove_key(&last).ok_or(PatchErrorKind::TargetMissing)
    } else if parent.is_array() {
        if allow_last && last == "-" {
            let len = parent.len();
            if len == 0 {
                return Err(PatchErrorKind::TargetMissing);
            }
            parent.remove_at(len - 1).ok_or(PatchErrorKind::TargetMissing)
        } else {
            let idx = parse_index(&last, parent.len())?;
            parent.remove_at(idx).ok_or(PatchErrorKind::TargetMissing)
        }
    } else {
        Err(PatchErrorKind::TypeMismatch)
    }
}

fn replace<N: Json>(doc: &mut N, path: &str, value: N) -> Result<N, PatchErrorKind> {
    let target = locate_mut(doc, path)?;
    Ok(mem::replace(target, value))
}

fn mov<N: Json>(
    doc: &mut N,
    from: &str,
    path: &str,
    allow_last: bool,
) -> Result<Option<N>, PatchErrorKind> {
    // Check we are not moving inside own child
    if path.starts_with(from) && path[from.len()..].starts_with('/') {
        return Err(PatchErrorKind::IllegalMove);
    }
    let val = remove(doc, from, allow_last)?;
    let restore = val.clone();
    add(doc, path, val).map_err(|kind| {
        // the add target was invalid: put the removed value back
        add(doc, from, restore).unwrap();
        kind
    })
}

fn copy<N: Json>(doc: &mut N, from: &str, path: &str) -> Result<Option<N>, PatchErrorKind> {
    let source = locate(doc, from)?.clone();
    add(doc, path, source)
}

fn test<N: Json>(doc: &N, path: &str, expected: &N) -> Result<(), PatchErrorKind> {
    let target = locate(doc, path)?;
    if deep_eq(target, expected) {
        Ok(())
    } else {
        Err(PatchErrorKind::TestFailed)
    }
}

/// Create JSON Patch from JSON Value
/// # Examples
///
/// Create patch from `serde_json::Value`:
///
/// ```rust
/// use json_transform::{from_value, Patch};
/// use serde_json::json;
///
/// # pub fn main() {
/// let patch_value = json!([
///   { "op": "test", "path": "/0/name", "value": "Andrew" },
///   { "op": "add", "path": "/0/happy", "value": true }
/// ]);
/// let patch: Patch = from_value(patch_value).unwrap();
/// # }
/// ```
pub fn from_value(value: Value) -> Result<Patch, serde_json::Error> {
    let patch = serde_json::from_value::<Vec<PatchOperation>>(value)?;
    Ok(Patch(patch))
}

/// Patch provided JSON document in-place. If any of the patch operations
/// fails, all previous operations are reverted. In case of internal error
/// resulting in panic, document might be left in inconsistent state.
///
/// # Example
/// Create and patch document:
///
/// ```rust
/// use json_transform::patch;
/// use serde_json::{from_str, json};
///
/// # pub fn main() {
/// let mut doc = json!([
///     { "name": "Andrew" },
///     { "name": "Maxim" }
/// ]);
///
/// let p = from_str(r#"[
///   { "op": "test", "path": "/0/name", "value": "Andrew" },
///   { "op": "add", "path": "/0/happy", "value": true }
/// ]"#).unwrap();
///
/// patch(&mut doc, &p).unwrap();
/// assert_eq!(doc, json!([
///   { "name": "Andrew", "happy": true },
///   { "name": "Maxim" }
/// ]));
///
/// # }
/// ```
pub fn patch<N: Json>(doc: &mut N, patch: &Patch) -> Result<(), PatchError> {
    apply_patches(doc, 0, &patch.0)
}

// Apply patches while tracking all the changes being made so they can be
// reverted back in case subsequent patches fail. Uses stack recursion to
// keep the state.
fn apply_patches<N: Json>(
    doc: &mut N,
    operation: usize,
    patches: &[PatchOperation],
) -> Result<(), PatchError> {
    let (patch, tail) = match patches.split_first() {
        None => return Ok(()),
        Some((patch, tail)) => (patch, tail),
    };
    tracing::trace!(operation, op = %patch, "applying patch operation");

    match *patch {
        PatchOperation::Add(ref op) => {
            let prev = add(doc, &op.path, N::from_json(op.value.clone()))
                .map_err(|kind| fail(operation, &op.path, kind))?;
            apply_patches(doc, operation + 1, tail).map_err(move |e| {
                match prev {
                    None => {
                        remove(doc, &op.path, true).unwrap();
                    }
                    Some(v) => {
                        add(doc, &op.path, v).unwrap().unwrap();
                    }
                };
                e
            })
        }
        PatchOperation::Remove(ref op) => {
            let prev = remove(doc, &op.path, false).map_err(|kind| fail(operation, &op.path, kind))?;
            apply_patches(doc, operation + 1, tail).map_err(move |e| {
                assert!(add(doc, &op.path, prev).unwrap().is_none());
                e
            })
        }
        PatchOperation::Replace(ref op) => {
            let prev = replace(doc, &op.path, N::from_json(op.value.clone()))
                .map_err(|kind| fail(operation, &op.path, kind))?;
            apply_patches(doc, operation + 1, tail).map_err(move |e| {
                replace(doc, &op.path, prev).unwrap();
                e
            })
        }
        PatchOperation::Move(ref op) => {
            let prev = mov(doc, &op.from, &op.path, false)
                .map_err(|kind| fail(operation, &op.path, kind))?;
            apply_patches(doc, operation + 1, tail).map_err(move |e| {
                mov(doc, &op.path, &op.from, true).unwrap();
                if let Some(prev) = prev {
                    assert!(add(doc, &op.path, prev).unwrap().is_none());
                }
                e
            })
        }
        PatchOperation::Copy(ref op) => {
            let prev = copy(doc, &op.from, &op.path)
                .map_err(|kind| fail(operation, &op.path, kind))?;
            apply_patches(doc, operation + 1, tail).map_err(move |e| {
                match prev {
                    None => {
                        remove(doc, &op.path, true).unwrap();
                    }
                    Some(v) => {
                        add(doc, &op.path, v).unwrap().unwrap();
                    }
                };
                e
            })
        }
        PatchOperation::Test(ref op) => {
            test(doc, &op.path, &N::from_json(op.value.clone()))
                .map_err(|kind| fail(operation, &op.path, kind))?;
            apply_patches(doc, operation + 1, tail)
        }
    }
}

/// Patch provided JSON document in place. Operations are applied in an
/// unsafe manner: if any of the operations fails, all previous operations
/// are not reverted.
pub fn patch_unsafe<N: Json>(doc: &mut N, patch: &Patch) -> Result<(), PatchError> {
    for (operation, op) in patch.0.iter().enumerate() {
        match *op {
            PatchOperation::Add(ref op) => {
                add(doc, &op.path, N::from_json(op.value.clone()))
                    .map_err(|kind| fail(operation, &op.path, kind))?;
            }
            PatchOperation::Remove(ref op) => {
                remove(doc, &op.path, false).map_err(|kind| fail(operation, &op.path, kind))?;
            }
            PatchOperation::Replace(ref op) => {
                replace(doc, &op.path, N::from_json(op.value.clone()))
                    .map_err(|kind| fail(operation, &op.path, kind))?;
            }
            PatchOperation::Move(ref op) => {
                mov(doc, &op.from, &op.path, false)
                    .map_err(|kind| fail(operation, &op.path, kind))?;
            }
            PatchOperation::Copy(ref op) => {
                copy(doc, &op.from, &op.path).map_err(|kind| fail(operation, &op.path, kind))?;
            }
            PatchOperation::Test(ref op) => {
                test(doc, &op.path, &N::from_json(op.value.clone()))
                    .map_err(|kind| fail(operation, &op.path, kind))?;
            }
        };
    }
    Ok(())
}
