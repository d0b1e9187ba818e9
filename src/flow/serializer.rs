// SPDX-License-Identifier: MIT

//! Completion serializer
//!
//! Converts the responses of a finished walk into the wire payload.
//! Image bytes are moved out of the JSON body into attachment parts so
//! the adapter can send a multipart request.

use serde::Serialize;
use std::collections::BTreeMap;

use super::error::FlowError;
use super::graph::Graph;
use super::navigator::NavigationState;
use super::node::{NodeId, NodeKind};
use super::response::{ResponseMetadata, ResponsePayload};

/// One response as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub kind: NodeKind,
    #[serde(flatten)]
    pub payload: ResponsePayload,
    pub metadata: ResponseMetadata,
}

/// Binary part that travels next to the JSON body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPart {
    pub node_id: NodeId,
    pub part: String,
    pub handle: String,
    pub content_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// Completion payload: responses keyed by stringified node id plus the
/// attachment manifest
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Payload {
    pub responses: BTreeMap<String, ResponseEnvelope>,
    pub attachments: Vec<AttachmentPart>,
}

impl Payload {
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// JSON body; deterministic for identical answers
    pub fn to_json_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Build the payload for the nodes actually traversed in `state`
///
/// Every traversed node that takes an answer must have a response. A gap
/// means the navigator broke its own invariant.
pub fn serialize(graph: &Graph, state: &NavigationState) -> Result<Payload, FlowError> {
    let mut payload = Payload::default();

    for &node_id in state.history() {
        let node = graph.node(node_id)?;
        let Some(response) = state.response_for(node_id) else {
            if node.kind().requires_response() {
                log::error!(
                    "Traversed node {} ({}) has no response; navigator invariant broken",
                    node_id,
                    node.kind()
                );
                debug_assert!(false, "missing response for traversed node {}", node_id);
                return Err(FlowError::IncompleteResponse { node_id });
            }
            continue;
        };

        if let ResponsePayload::Image { attachments } = &response.payload {
            payload
                .attachments
                .extend(attachments.iter().map(|a| AttachmentPart {
                    node_id,
                    part: a.part.clone(),
                    handle: a.handle.clone(),
                    content_type: a.content_type.clone(),
                    data: a.data.clone(),
                }));
        }

        payload.responses.insert(
            node_id.to_string(),
            ResponseEnvelope {
                kind: response.kind,
                payload: response.payload.clone(),
                metadata: response.metadata,
            },
        );
    }

    Ok(payload)
}
