//! # contract: seams between the traversal engine and its collaborators
//!
//! The traversal only talks to the outside world through two traits:
//! - [`NodeFetcher`] retrieves a node payload from the remote hierarchy API.
//! - [`NodeStore`] persists payloads and answers "is this node already done?".
//!
//! Both traits are annotated for `mockall`, so tests can drive the traversal
//! without a network or (for the store) a filesystem.

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;
use std::path::PathBuf;

use crate::error::{ApiError, StoreError};

/// Name of the payload field that lists sub-concept references.
pub const CHILD_FIELD: &str = "child";

/// One node of the classification hierarchy, as returned by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    pub id: String,
    pub payload: Value,
    pub children: Vec<String>,
}

impl HierarchyNode {
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        let children = child_ids(&payload);
        Self {
            id: id.into(),
            payload,
            children,
        }
    }
}

/// Extracts child identifiers from a payload's `child` array.
///
/// Each entry is a URL such as `http://id.who.int/icd/release/10/2010/A00.1`;
/// the identifier is its last path segment, percent-decoded. Entries that are
/// not strings are ignored.
pub fn child_ids(payload: &Value) -> Vec<String> {
    payload
        .get(CHILD_FIELD)
        .and_then(|v| v.as_array())
        .map(|refs| {
            refs.iter()
                .filter_map(|r| r.as_str())
                .map(id_from_reference)
                .filter(|id| !id.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn id_from_reference(reference: &str) -> String {
    let segment = reference
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(reference);
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => segment.to_string(),
    }
}

/// Retrieves node payloads from the remote hierarchy API.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait NodeFetcher: Send + Sync {
    /// Fetch the JSON payload for one node. Non-2xx answers are errors.
    async fn fetch(&self, node_id: &str) -> Result<Value, ApiError>;
}

/// Persists node payloads; a stored node is a completed node.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait NodeStore: Send + Sync {
    fn exists(&self, node_id: &str) -> bool;

    /// Write the payload and return the path it was written to.
    fn save(&self, node_id: &str, payload: &Value) -> Result<PathBuf, StoreError>;

    /// Read back a previously saved payload.
    fn load(&self, node_id: &str) -> Result<Value, StoreError>;
}
