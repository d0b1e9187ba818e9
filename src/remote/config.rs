// SPDX-License-Identifier: MIT

//! Remote store configuration

use std::env;
use url::Url;

use super::{SessionId, SubmitError};

pub const DEFAULT_SUBMIT_PATH: &str = "categories/{session}/evaluation/";
pub const DEFAULT_CLEAR_PATH: &str = "categories/{session}/clear-evaluation/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how completed walks are sent
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub base_url: Url,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    /// Path template relative to `base_url`; `{session}` is substituted
    pub submit_path: String,
    pub clear_path: String,
}

impl RemoteConfig {
    pub fn new(base_url: &str) -> Result<Self, SubmitError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            submit_path: DEFAULT_SUBMIT_PATH.to_string(),
            clear_path: DEFAULT_CLEAR_PATH.to_string(),
        })
    }

    /// Read configuration from `PATHWALK_*` environment variables
    pub fn from_env() -> Result<Self, SubmitError> {
        let base_url = env::var("PATHWALK_BASE_URL")
            .map_err(|_| SubmitError::Config("PATHWALK_BASE_URL must be set".into()))?;
        let mut config = Self::new(&base_url)?;

        config.api_token = env::var("PATHWALK_API_TOKEN").ok().filter(|t| !t.is_empty());
        if let Ok(timeout) = env::var("PATHWALK_TIMEOUT_SECS") {
            config.timeout_secs = timeout.parse().map_err(|_| {
                SubmitError::Config(format!("PATHWALK_TIMEOUT_SECS is not a number: {}", timeout))
            })?;
        }
        if let Ok(path) = env::var("PATHWALK_SUBMIT_PATH") {
            config.submit_path = path;
        }
        if let Ok(path) = env::var("PATHWALK_CLEAR_PATH") {
            config.clear_path = path;
        }

        log::info!(
            "Remote store: base_url={}, timeout={}s, has_token={}",
            config.base_url,
            config.timeout_secs,
            config.api_token.is_some()
        );
        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn submit_url(&self, session_id: &SessionId) -> Result<Url, SubmitError> {
        self.endpoint(&self.submit_path, session_id)
    }

    pub fn clear_url(&self, session_id: &SessionId) -> Result<Url, SubmitError> {
        self.endpoint(&self.clear_path, session_id)
    }

    fn endpoint(&self, template: &str, session_id: &SessionId) -> Result<Url, SubmitError> {
        let path = template.replace("{session}", session_id.as_str());
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| SubmitError::Config(format!("invalid endpoint '{}': {}", path, e)))
    }
}

/// Parse a base URL, making sure relative joins keep its path
fn parse_base_url(raw: &str) -> Result<Url, SubmitError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized)
        .map_err(|e| SubmitError::Config(format!("invalid base url '{}': {}", raw, e)))
}
