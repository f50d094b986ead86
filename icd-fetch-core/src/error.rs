//! Error taxonomy for the fetch pipeline.
//!
//! Startup failures ([`ConfigError`]) are fatal and abort the run before any
//! node is requested. [`ApiError`] and [`StoreError`] belong to a single node:
//! the traversal logs them, records the node as failed and moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Missing or invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API token: pass --token, set `token` in the config file, or provide `client_id` and `client_secret`")]
    MissingToken,

    #[error("invalid value for `{key}`: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("failed to read config file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid INI.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },

    #[error("token exchange failed: {0}")]
    TokenExchange(String),
}

/// A single node request failed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API returned {status} for node {node_id:?}: {body}")]
    Status {
        node_id: String,
        status: u16,
        body: String,
    },

    #[error("request for node {node_id:?} failed: {source}")]
    Transport {
        node_id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response for node {node_id:?} is not valid JSON: {source}")]
    Decode {
        node_id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Persisting or reloading a node payload failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize payload for node {node_id:?}: {source}")]
    Serialize {
        node_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored payload {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
