//! A JSON transformation toolkit: a document-model abstraction, a
//! path-addressed deep-merge engine, a parameter resolver for embedded
//! references, and a [JSON Patch (RFC 6902)](https://tools.ietf.org/html/rfc6902)
//! applier.
//!
//! # Usage
//!
//! Add this to your *Cargo.toml*:
//! ```toml
//! [dependencies]
//! json-transform = "*"
//! ```
//!
//! # Examples
//! Apply a JSON Patch atomically:
//!
//! ```rust
//! use json_transform::patch;
//! use serde_json::{from_str, json};
//!
//! # pub fn main() {
//! let mut doc = json!({ "foo": "bar" });
//!
//! let p = from_str(r#"[
//!   { "op": "add", "path": "/baz", "value": "qux" }
//! ]"#).unwrap();
//!
//! patch(&mut doc, &p).unwrap();
//! assert_eq!(doc, json!({ "foo": "bar", "baz": "qux" }));
//! # }
//! ```
//!
//! Merge a value deep into a document, creating structure on the way:
//!
//! ```rust
//! use json_transform::merge_into;
//! use serde_json::json;
//!
//! # pub fn main() {
//! let mut doc = json!({});
//! merge_into(&mut doc, json!("V"), "a.b.c");
//! assert_eq!(doc, json!({ "a": { "b": { "c": "V" } } }));
//!
//! // colliding scalars promote to an array
//! merge_into(&mut doc, json!("W"), "a.b.c");
//! assert_eq!(doc, json!({ "a": { "b": { "c": ["V", "W"] } } }));
//! # }
//! ```
//!
//! Resolve embedded references against primary and secondary documents:
//!
//! ```rust
//! use json_transform::Resolver;
//! use serde_json::json;
//!
//! # pub fn main() {
//! let doc = json!({ "user": { "name": "Ada" } });
//! let resolver = Resolver::new(&doc)
//!     .with_document("#env", json!({ "region": "eu" }));
//!
//! assert_eq!(resolver.resolve("$.user.name").unwrap(), json!("Ada"));
//! assert_eq!(resolver.resolve("#env.region").unwrap(), json!("eu"));
//! assert_eq!(resolver.resolve("#null").unwrap(), json!(null));
//! assert_eq!(resolver.resolve("\\$verbatim").unwrap(), json!("$verbatim"));
//! # }
//! ```
#![warn(missing_docs)]

pub mod compare;
pub mod jsonpath;
pub mod merge;
pub mod model;
pub mod patch;
pub mod path;
pub mod resolve;

pub use compare::{compare, compare_as, deep_eq, truthy, truthy_strict, CompareBy};
pub use jsonpath::{JsonPathError, PathContext};
pub use merge::merge_into;
pub use model::{Json, Kind, ParseError};
pub use patch::{
    from_value, patch, patch_unsafe, AddOperation, CopyOperation, MoveOperation, Patch,
    PatchError, PatchErrorKind, PatchOperation, RemoveOperation, ReplaceOperation, TestOperation,
};
pub use path::{tokenize, Segment};
pub use resolve::{Resolver, ResolveError, SecondaryDoc};
