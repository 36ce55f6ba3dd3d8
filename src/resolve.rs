//! Reference-string resolution.
//!
//! A [`Resolver`] expands embedded references against a primary document
//! and any number of named secondary documents: `$…` is a JSONPath read
//! of the primary, `#<name>…` reads a registered secondary, `#uuid`,
//! `#null` and `#now` are intrinsic macros, and `\$…`/`\#…` escape to
//! literals. Anything else comes back unchanged.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::jsonpath::{self, JsonPathError, PathContext};
use crate::model::{Json, ParseError};

/// Error raised while resolving a reference.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The reference carried a path expression the engine rejects.
    #[error("invalid path expression: {0}")]
    Path(#[from] JsonPathError),
    /// A lazily registered secondary document failed to parse.
    #[error("failed to materialize document '{name}': {source}")]
    Materialize {
        /// Registered name of the offending document.
        name: String,
        /// The underlying parse failure.
        source: ParseError,
    },
}

/// A named secondary document in one of its three lifecycle states.
#[derive(Debug)]
pub enum SecondaryDoc<N> {
    /// A scalar registered as-is; lookups return it whole.
    Literal(N),
    /// Unparsed JSON text, parsed and memoized on first touch.
    Lazy(String),
    /// A parsed document ready for path reads.
    Materialized(PathContext<N>),
}

/// Resolves reference strings against a primary document and registered
/// secondary documents.
///
/// A resolver is a per-task object: secondary materialization memoizes
/// through a [`RefCell`], so share nothing and build one resolver per
/// worker instead.
#[derive(Debug)]
pub struct Resolver<'a, N = serde_json::Value> {
    primary: &'a N,
    secondaries: RefCell<HashMap<String, SecondaryDoc<N>>>,
    reduce_big_decimals: bool,
}

impl<'a, N: Json> Resolver<'a, N> {
    /// Create a resolver over a primary document.
    pub fn new(primary: &'a N) -> Self {
        Resolver {
            primary,
            secondaries: RefCell::new(HashMap::new()),
            reduce_big_decimals: false,
        }
    }

    /// Narrow resolved numbers to native precision before returning
    /// them. Off by default; meant for user-facing boundaries.
    pub fn reduce_big_decimals(mut self, reduce: bool) -> Self {
        self.reduce_big_decimals = reduce;
        self
    }

    /// Register a secondary document under `name` (including its `$` or
    /// `#` prefix). Scalars are kept whole; containers become path
    /// contexts immediately.
    pub fn with_document(mut self, name: impl Into<String>, node: N) -> Self {
        let entry = if node.is_object() || node.is_array() {
            SecondaryDoc::Materialized(PathContext::new(node))
        } else {
            SecondaryDoc::Literal(node)
        };
        self.secondaries.get_mut().insert(name.into(), entry);
        self
    }

    /// Register a secondary document from unparsed JSON text. The text
    /// is parsed on first reference, not here.
    pub fn with_json_text(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.secondaries
            .get_mut()
            .insert(name.into(), SecondaryDoc::Lazy(text.into()));
        self
    }

    /// Expand one reference string.
    pub fn resolve(&self, name: &str) -> Result<N, ResolveError> {
        let node = self.resolve_node(name)?;
        Ok(node.reduced(self.reduce_big_decimals))
    }

    fn resolve_node(&self, name: &str) -> Result<N, ResolveError> {
        // blank names pass through
        if name.trim().is_empty() {
            return Ok(N::from_string(name));
        }

        if !name.starts_with('$') && !name.starts_with('#') {
            if let Some(stripped) = name.strip_prefix('\\') {
                if stripped.starts_with('$') || stripped.starts_with('#') {
                    return Ok(N::from_string(stripped));
                }
            }
            return Ok(N::from_string(name));
        }

        if name.starts_with('#') && name.len() <= 5 {
            match name.to_ascii_lowercase().as_str() {
                "#uuid" => return Ok(N::from_string(Uuid::new_v4().to_string())),
                "#null" => return Ok(N::null()),
                "#now" => {
                    return Ok(N::from_string(
                        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                    ))
                }
                // unknown short names fall through to document lookup
                _ => {}
            }
        }

        // regex backreference shapes ($$name, $0) are not references
        if let Some(second) = name[1..].chars().next() {
            if second == '$' || second.is_ascii_digit() {
                return Ok(N::from_string(name));
            }
        }

        let root_key_end = name.find(['.', '[']).unwrap_or(name.len());
        let root_key = &name[..root_key_end];

        {
            let mut docs = self.secondaries.borrow_mut();
            if let Some(entry) = docs.get_mut(root_key) {
                if let SecondaryDoc::Lazy(text) = entry {
                    tracing::debug!(name = root_key, "materializing secondary document");
                    let parsed = N::parse(text).map_err(|source| ResolveError::Materialize {
                        name: root_key.to_owned(),
                        source,
                    })?;
                    *entry = SecondaryDoc::Materialized(PathContext::new(parsed));
                }
                return match entry {
                    SecondaryDoc::Literal(node) => Ok(node.clone()),
                    SecondaryDoc::Materialized(context) => {
                        Ok(context.read(&format!("${}", &name[root_key.len()..]))?)
                    }
                    // materialized just above
                    SecondaryDoc::Lazy(_) => Ok(N::null()),
                };
            }
        }

        if root_key != "$" {
            tracing::debug!(name, "unrecognized reference root, returning name unchanged");
            return Ok(N::from_string(name));
        }

        Ok(jsonpath::read(self.primary, name)?)
    }
}
