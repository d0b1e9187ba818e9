// SPDX-License-Identifier: MIT

//! HTTP persistence against the category-scoped endpoints

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use url::Url;

use super::config::RemoteConfig;
use super::{Ack, PersistenceAdapter, SessionId, SubmitError};
use crate::flow::Payload;

/// Multipart field carrying the JSON body when attachments are present
pub const PAYLOAD_FIELD: &str = "payload";

/// Sends completion payloads over HTTP
#[derive(Debug, Clone)]
pub struct HttpPersistence {
    client: Client,
    config: RemoteConfig,
}

impl HttpPersistence {
    pub fn new(config: RemoteConfig) -> Result<Self, SubmitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SubmitError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, SubmitError> {
        Self::new(RemoteConfig::from_env()?)
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn post(&self, url: Url) -> RequestBuilder {
        let req = self
            .client
            .post(url)
            .header("Accept", "application/json");
        match &self.config.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Multipart form: the JSON body plus one part per attachment
    fn build_form(payload: &Payload) -> Result<Form, SubmitError> {
        let body = serde_json::to_string(payload)?;
        let mut form = Form::new().text(PAYLOAD_FIELD, body);

        for attachment in &payload.attachments {
            let part = Part::bytes(attachment.data.clone())
                .file_name(attachment.handle.clone())
                .mime_str(&attachment.content_type)
                .map_err(|e| {
                    SubmitError::InvalidAttachment(format!(
                        "invalid content type '{}': {}",
                        attachment.content_type, e
                    ))
                })?;
            form = form.part(attachment.part.clone(), part);
        }
        Ok(form)
    }

    async fn into_ack(resp: Response) -> Result<Ack, SubmitError> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(Ack {
            status: status.as_u16(),
            body: serde_json::from_str(&text).ok(),
        })
    }
}

#[async_trait]
impl PersistenceAdapter for HttpPersistence {
    async fn submit(&self, session_id: &SessionId, payload: &Payload) -> Result<Ack, SubmitError> {
        let url = self.config.submit_url(session_id)?;
        log::info!(
            "Submitting {} responses ({} attachments) to {}",
            payload.responses.len(),
            payload.attachments.len(),
            url
        );

        let req = if payload.has_attachments() {
            self.post(url).multipart(Self::build_form(payload)?)
        } else {
            self.post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(payload.to_json_vec()?)
        };

        let result = Self::into_ack(req.send().await?).await;
        if let Err(e) = &result {
            log::warn!("Submission for session {} failed: {}", session_id, e);
        }
        result
    }

    async fn clear_and_restart(&self, session_id: &SessionId) -> Result<Ack, SubmitError> {
        let url = self.config.clear_url(session_id)?;
        log::info!("Clearing stored evaluation at {}", url);
        Self::into_ack(self.post(url).send().await?).await
    }
}
