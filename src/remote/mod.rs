// SPDX-License-Identifier: MIT

//! Persistence of completed walks
//!
//! The engine only depends on [`PersistenceAdapter`]. `HttpPersistence`
//! talks to the category-scoped endpoints; `MemoryPersistence` keeps
//! submissions in process.

pub mod config;
pub mod http;
pub mod memory;

pub use config::RemoteConfig;
pub use http::HttpPersistence;
pub use memory::MemoryPersistence;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::flow::Payload;

/// Opaque category/session identifier supplied by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Acknowledgement returned by the store
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Ack {
    pub status: u16,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

/// Submission failures
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Network-level failure (connect, timeout, broken body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The store answered with a non-success status
    #[error("Store rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// An attachment the store can never accept as sent
    #[error("Invalid attachment: {0}")]
    InvalidAttachment(String),
}

impl SubmitError {
    /// Whether the same request may succeed if sent again
    pub fn is_retryable(&self) -> bool {
        match self {
            SubmitError::Transport(_) => true,
            SubmitError::Rejected { status, .. } => *status >= 500 || *status == 429,
            SubmitError::Encode(_)
            | SubmitError::Config(_)
            | SubmitError::InvalidAttachment(_) => false,
        }
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            SubmitError::Rejected {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            SubmitError::Transport(err.to_string())
        }
    }
}

/// Remote store for completed walks
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Store the completion payload of a session
    async fn submit(&self, session_id: &SessionId, payload: &Payload) -> Result<Ack, SubmitError>;

    /// Discard the stored evaluation of a session so it can start over
    async fn clear_and_restart(&self, session_id: &SessionId) -> Result<Ack, SubmitError>;
}
