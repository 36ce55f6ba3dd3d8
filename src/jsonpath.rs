//! JSONPath evaluation over the document model.
//!
//! This is the subset the parameter resolver emits: member access,
//! bracketed quoted names, (possibly negative) integer indexes, the `*`
//! wildcard and comma unions. A path containing a wildcard or union is
//! *indefinite* and reads as an array of every match; a definite path
//! reads as the single addressed node, or null when nothing is there.

use thiserror::Error;

use crate::model::Json;
use crate::path::{tokenize, Segment};

/// Error raised for a selector the engine cannot interpret.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JsonPathError {
    /// A quoted name in a bracket selector was never closed.
    #[error("unclosed quote in selector [{0}]")]
    UnclosedQuote(String),
    /// A bracket selector that is neither a quoted name, an integer
    /// index, a wildcard nor a union of those.
    #[error("unsupported selector [{0}]")]
    UnsupportedSelector(String),
}

#[derive(Debug, Clone)]
enum Step {
    Key(String),
    Index(i64),
    Wild,
    Union(Vec<Step>),
}

/// A document wrapped for repeated JSONPath reads.
#[derive(Debug, Clone)]
pub struct PathContext<N> {
    root: N,
}

impl<N: Json> PathContext<N> {
    /// Wrap a root node.
    pub fn new(root: N) -> Self {
        PathContext { root }
    }

    /// The wrapped root.
    pub fn root(&self) -> &N {
        &self.root
    }

    /// Evaluate `path` against the wrapped root.
    pub fn read(&self, path: &str) -> Result<N, JsonPathError> {
        read(&self.root, path)
    }
}

/// Evaluate a JSONPath against a root node.
pub fn read<N: Json>(root: &N, path: &str) -> Result<N, JsonPathError> {
    let steps = compile(path)?;
    let indefinite = steps
        .iter()
        .any(|step| matches!(step, Step::Wild | Step::Union(_)));

    let mut matches = Vec::new();
    collect(root, &steps, &mut matches);

    if indefinite {
        let mut all = N::new_array();
        for found in matches {
            all.push(found.clone());
        }
        Ok(all)
    } else {
        Ok(matches.first().map(|found| (*found).clone()).unwrap_or_else(N::null))
    }
}

fn compile(path: &str) -> Result<Vec<Step>, JsonPathError> {
    tokenize(path)
        .into_iter()
        .map(|segment| match segment {
            Segment::Member(name) => Ok(Step::Key(name)),
            Segment::Selector(body) => parse_selector(&body),
        })
        .collect()
}

fn parse_selector(body: &str) -> Result<Step, JsonPathError> {
    let mut steps = split_union(body)?
        .into_iter()
        .map(|item| parse_item(&item, body))
        .collect::<Result<Vec<_>, _>>()?;
    match steps.len() {
        0 => Err(JsonPathError::UnsupportedSelector(body.to_owned())),
        1 => Ok(steps.remove(0)),
        _ => Ok(Step::Union(steps)),
    }
}

fn parse_item(item: &str, body: &str) -> Result<Step, JsonPathError> {
    if item == "*" {
        return Ok(Step::Wild);
    }
    let bytes = item.as_bytes();
    if bytes[0] == b'\'' || bytes[0] == b'"' {
        if bytes.len() >= 2 && bytes[bytes.len() - 1] == bytes[0] {
            return Ok(Step::Key(item[1..item.len() - 1].to_owned()));
        }
        return Err(JsonPathError::UnclosedQuote(body.to_owned()));
    }
    item.parse::<i64>()
        .map(Step::Index)
        .map_err(|_| JsonPathError::UnsupportedSelector(body.to_owned()))
}

fn split_union(body: &str) -> Result<Vec<String>, JsonPathError> {
    let mut items = Vec::new();
    let mut buf = String::new();
    let mut quote: Option<char> = None;
    for c in body.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                buf.push(c);
            }
            Some(_) => buf.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                buf.push(c);
            }
            None if c == ',' => items.push(std::mem::take(&mut buf)),
            None => buf.push(c),
        }
    }
    if quote.is_some() {
        return Err(JsonPathError::UnclosedQuote(body.to_owned()));
    }
    items.push(buf);
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_owned())
        .filter(|item| !item.is_empty())
        .collect())
}

fn collect<'a, N: Json>(node: &'a N, steps: &[Step], out: &mut Vec<&'a N>) {
    match steps.split_first() {
        None => out.push(node),
        Some((step, rest)) => apply(node, step, rest, out),
    }
}

fn apply<'a, N: Json>(node: &'a N, step: &Step, rest: &[Step], out: &mut Vec<&'a N>) {
    match step {
        Step::Key(key) => {
            if let Some(child) = node.get(key) {
                collect(child, rest, out);
            }
        }
        Step::Index(index) => {
            if node.is_array() {
                let len = node.len() as i64;
                let at = if *index < 0 { len + *index } else { *index };
                if (0..len).contains(&at) {
                    if let Some(child) = node.at(at as usize) {
                        collect(child, rest, out);
                    }
                }
            }
        }
        Step::Wild => {
            if node.is_object() {
                for (_, child) in node.entries() {
                    collect(child, rest, out);
                }
            } else {
                for child in node.elements() {
                    collect(child, rest, out);
                }
            }
        }
        Step::Union(parts) => {
            for part in parts {
                apply(node, part, rest, out);
            }
        }
    }
}
