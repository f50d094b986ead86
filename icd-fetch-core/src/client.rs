//! Authenticated client for the WHO ICD release API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::EffectiveConfig;
use crate::contract::NodeFetcher;
use crate::error::{ApiError, ConfigError};

pub const API_VERSION: &str = "v2";

/// Issues one GET per node against `<base_url>/<node id>`. Never retries.
#[derive(Debug, Clone)]
pub struct IcdClient {
    http: Client,
    base_url: String,
}

impl IcdClient {
    pub fn new(base_url: &str, token: &str, language: &str) -> Result<Self, ConfigError> {
        let invalid = |key: &str, value: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| invalid("token", "<redacted>"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("api-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(language).map_err(|_| invalid("language", language))?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "http client".to_string(),
                value: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &EffectiveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(&config.base_url, &config.token, &config.language)
    }

    pub fn url_for(&self, node_id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(node_id))
    }
}

#[async_trait]
impl NodeFetcher for IcdClient {
    async fn fetch(&self, node_id: &str) -> Result<Value, ApiError> {
        let url = self.url_for(node_id);
        debug!(url = %url, node_id, "Fetching node");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %url, "Request failed");
                ApiError::Transport {
                    node_id: node_id.to_string(),
                    source: e,
                }
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ApiError::Transport {
            node_id: node_id.to_string(),
            source: e,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                node_id: node_id.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            node_id: node_id.to_string(),
            source: e,
        })
    }
}
