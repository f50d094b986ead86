/// `load_config` module: merges command-line flags and an optional INI config
/// file into the run configuration.
///
/// # Precedence
/// CLI flag > `[DEFAULT]` key in the config file > built-in default. The token
/// has no default: without a token, and without `client_id` + `client_secret`
/// to obtain one, resolution fails before any request is made.
///
/// # Config file
/// ```ini
/// [DEFAULT]
/// token = ...
/// output_dir = icd_data
/// delay = 0.5
/// log_file = icd_api.log
/// ```
/// Other sections and unknown keys are ignored. Keys match regardless of case,
/// and values are taken literally: quotes and backslashes are kept as written.
use icd_fetch_core::auth::ClientCredentials;
use icd_fetch_core::config::{
    parse_delay, EffectiveConfig, DEFAULT_BASE_URL, DEFAULT_DELAY_SECS, DEFAULT_LANGUAGE,
    DEFAULT_LOG_FILE, DEFAULT_OUTPUT_DIR, DEFAULT_TOKEN_URL,
};
use icd_fetch_core::error::ConfigError;
use ini::{Ini, ParseOption};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use crate::cli::Cli;

pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Values read from the `[DEFAULT]` section of a config file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSettings {
    pub token: Option<String>,
    pub output_dir: Option<String>,
    pub delay: Option<String>,
    pub log_file: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: Option<String>,
    pub base_url: Option<String>,
    pub language: Option<String>,
    pub root: Option<String>,
}

/// Parses config-file text. `path` is only used for error messages.
pub fn parse_config_str(text: &str, path: &Path) -> Result<FileSettings, ConfigError> {
    let opt = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    };
    let ini = Ini::load_from_str_opt(text, opt).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let Some(section) = ini.section(Some(DEFAULT_SECTION)) else {
        return Ok(FileSettings::default());
    };
    let get = |key: &str| {
        section
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.to_string())
    };

    Ok(FileSettings {
        token: get("token"),
        output_dir: get("output_dir"),
        delay: get("delay"),
        log_file: get("log_file"),
        client_id: get("client_id"),
        client_secret: get("client_secret"),
        token_url: get("token_url"),
        base_url: get("base_url"),
        language: get("language"),
        root: get("root"),
    })
}

pub fn read_config_file(path: &Path) -> Result<FileSettings, ConfigError> {
    info!(config_path = ?path, "Loading configuration from file");

    let text = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(ConfigError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    match parse_config_str(&text, path) {
        Ok(settings) => {
            info!(config_path = ?path, "Parsed config file successfully");
            Ok(settings)
        }
        Err(e) => {
            error!(error = %e, config_path = ?path, "Failed to parse config file");
            Err(e)
        }
    }
}

/// How the bearer token will be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Client(ClientCredentials),
}

/// Configuration after merging, before any network access.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub credentials: Credentials,
    pub output_dir: PathBuf,
    pub delay: Duration,
    pub log_file: PathBuf,
    pub base_url: String,
    pub language: String,
    pub root: String,
}

impl ResolvedConfig {
    /// Exchanges client credentials for a token if needed and returns the final configuration.
    pub async fn into_effective(self) -> Result<EffectiveConfig, ConfigError> {
        let token = match self.credentials {
            Credentials::Token(token) => token,
            Credentials::Client(creds) => creds.request_token().await?,
        };
        let config = EffectiveConfig {
            token,
            output_dir: self.output_dir,
            delay: self.delay,
            log_file: self.log_file,
            base_url: self.base_url,
            language: self.language,
            root: self.root,
        };
        config.validate()?;
        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Merges CLI flags with the config file named by `--config-file`, if any.
pub fn load_config(cli: &Cli) -> Result<ResolvedConfig, ConfigError> {
    let file = match &cli.config_file {
        Some(path) => read_config_file(path)?,
        None => FileSettings::default(),
    };
    resolve(cli, file)
}

/// Pure merge of CLI flags over file settings over defaults.
pub fn resolve(cli: &Cli, file: FileSettings) -> Result<ResolvedConfig, ConfigError> {
    let credentials = match non_empty(cli.token.clone()).or(non_empty(file.token)) {
        Some(token) => Credentials::Token(token),
        None => match (non_empty(file.client_id), non_empty(file.client_secret)) {
            (Some(client_id), Some(client_secret)) => Credentials::Client(ClientCredentials {
                client_id,
                client_secret,
                token_url: non_empty(file.token_url)
                    .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            }),
            _ => {
                error!("No API token in arguments or config file");
                return Err(ConfigError::MissingToken);
            }
        },
    };

    let delay = match (cli.delay, non_empty(file.delay)) {
        (Some(delay), _) => delay,
        (None, Some(raw)) => parse_delay(&raw)?,
        (None, None) => Duration::from_secs_f64(DEFAULT_DELAY_SECS),
    };

    let output_dir = cli
        .output_dir
        .clone()
        .or(non_empty(file.output_dir).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let log_file = cli
        .log_file
        .clone()
        .or(non_empty(file.log_file).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let base_url = non_empty(cli.base_url.clone())
        .or(non_empty(file.base_url))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let language = non_empty(cli.language.clone())
        .or(non_empty(file.language))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    // Not passed through `non_empty`: `--root ""` names the release root.
    let root = cli.root.clone().or(file.root).unwrap_or_default();

    Ok(ResolvedConfig {
        credentials,
        output_dir,
        delay,
        log_file,
        base_url,
        language,
        root,
    })
}
