// SPDX-License-Identifier: MIT

//! Workflow engine
//!
//! This module provides:
//! - `Node`/`Graph` - typed steps and successor resolution
//! - `GraphLoader` - graph documents from the category definition
//! - `formatter` - raw answer normalization per node kind
//! - `Navigator` - position, history and responses of one walk
//! - `serializer` - the completion payload

pub mod answer;
pub mod error;
pub mod formatter;
pub mod graph;
pub mod loader;
pub mod navigator;
pub mod node;
pub mod response;
pub mod serializer;

pub use answer::{CapturedImage, RawAnswer};
pub use error::{FlowError, LoadError, Severity};
pub use graph::{Graph, GraphFlavor};
pub use loader::GraphLoader;
pub use navigator::{
    transition, NavEvent, NavigationState, Navigator, Progress, SubmissionStatus, WalkStatus,
};
pub use node::{Button, Node, NodeBody, NodeId, NodeKind, PlanDay};
pub use response::{Attachment, Response, ResponsePayload, ResponseSet, RESPONSE_SCHEMA_VERSION};
pub use serializer::{AttachmentPart, Payload, ResponseEnvelope};
