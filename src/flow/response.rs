// SPDX-License-Identifier: MIT

//! Normalized responses and the per-session response set

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::node::{NodeId, NodeKind};

/// Schema version of the formatting logic, stamped on every response
pub const RESPONSE_SCHEMA_VERSION: u32 = 1;

/// Envelope metadata attached to each response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResponseMetadata {
    pub version: u32,
}

impl Default for ResponseMetadata {
    fn default() -> Self {
        Self {
            version: RESPONSE_SCHEMA_VERSION,
        }
    }
}

/// An image attached to a response, sent out-of-band on submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Multipart part name carrying the bytes
    pub part: String,
    pub handle: String,
    pub content_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// Kind-specific answer value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    #[serde(rename_all = "camelCase")]
    SingleChoice { selected_option: usize, option: String },
    #[serde(rename_all = "camelCase")]
    MultipleChoice {
        selected_options: Vec<usize>,
        options: Vec<String>,
    },
    Text { answer: String },
    Scale { value: f64 },
    Image { attachments: Vec<Attachment> },
    /// Display nodes: acknowledged, optionally through a button
    Acknowledged {
        #[serde(skip_serializing_if = "Option::is_none")]
        button: Option<usize>,
    },
}

/// The normalized answer recorded for one node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub captured_at: DateTime<Utc>,
    pub payload: ResponsePayload,
    pub metadata: ResponseMetadata,
}

impl Response {
    /// Button chosen when this response left a display node
    pub fn button(&self) -> Option<usize> {
        match self.payload {
            ResponsePayload::Acknowledged { button } => button,
            _ => None,
        }
    }
}

/// Responses keyed by node id; re-answering a node replaces its response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSet {
    entries: HashMap<NodeId, Response>,
}

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the response for its node, returning the old one
    pub fn upsert(&mut self, response: Response) -> Option<Response> {
        self.entries.insert(response.node_id, response)
    }

    pub fn remove(&mut self, node_id: NodeId) -> Option<Response> {
        self.entries.remove(&node_id)
    }

    pub fn get(&self, node_id: NodeId) -> Option<&Response> {
        self.entries.get(&node_id)
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.entries.contains_key(&node_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Response> {
        self.entries.values()
    }
}
