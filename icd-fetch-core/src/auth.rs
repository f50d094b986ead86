//! OAuth2 client-credentials exchange for the ICD access-management endpoint.

use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use crate::error::ConfigError;

pub const TOKEN_SCOPE: &str = "icdapi_access";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client id and secret used to obtain a bearer token when none is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
}

impl ClientCredentials {
    /// POSTs the client-credentials grant and returns the access token.
    pub async fn request_token(&self) -> Result<String, ConfigError> {
        info!(token_url = %self.token_url, client_id = %self.client_id, "Requesting API token");

        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", TOKEN_SCOPE),
            ("grant_type", "client_credentials"),
        ];

        let resp = Client::new()
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, token_url = %self.token_url, "Token request failed");
                ConfigError::TokenExchange(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            error!(status = %status, "Token endpoint returned error. Response body: {body}");
            return Err(ConfigError::TokenExchange(format!("status {status}: {body}")));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ConfigError::TokenExchange(format!("unexpected token response: {e}")))?;

        if token.access_token.trim().is_empty() {
            return Err(ConfigError::TokenExchange(
                "token endpoint returned an empty access_token".to_string(),
            ));
        }
        info!("API token obtained");
        Ok(token.access_token)
    }
}
