// SPDX-License-Identifier: MIT

//! Node type definitions
//!
//! A node is one step of a walk. Its kind-specific data lives in the
//! closed [`NodeBody`] union so every consumer matches exhaustively.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node identifier, unique within a graph
pub type NodeId = u32;

/// A single workflow step
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,
    /// Display text, opaque to the engine
    #[serde(default)]
    pub prompt: String,
    /// Explicit successor; absent means graph order
    #[serde(default, alias = "next_node_id")]
    pub next_node_id: Option<NodeId>,
    /// Kind tag plus kind-specific fields
    #[serde(flatten)]
    pub body: NodeBody,
}

/// Kind-specific node data, tagged by `type`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeBody {
    SingleChoice {
        options: Vec<String>,
    },
    MultipleChoice {
        options: Vec<String>,
        /// Whether submitting no selection at all is a valid answer
        #[serde(default, alias = "allow_empty", rename = "allowEmpty")]
        allow_empty: bool,
    },
    Text {},
    Scale {
        min: f64,
        max: f64,
        #[serde(default = "default_step")]
        step: f64,
    },
    Image {
        /// Enforced by the capturing host, not by the engine
        #[serde(default, alias = "max_images", rename = "maxImages")]
        max_images: Option<usize>,
    },
    Description {
        #[serde(default)]
        buttons: Vec<Button>,
    },
    Video {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        buttons: Vec<Button>,
    },
    ImageDisplay {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        buttons: Vec<Button>,
    },
    TextDisplay {
        #[serde(default)]
        buttons: Vec<Button>,
    },
    WeeklyPlan {
        #[serde(default)]
        days: Vec<PlanDay>,
    },
    Result {},
}

fn default_step() -> f64 {
    1.0
}

/// A labelled exit from a display node
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub label: String,
    /// Target of this button; `None` ends the walk
    #[serde(default, alias = "next_node_id")]
    pub next_node_id: Option<NodeId>,
}

/// One entry of a weekly plan step
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PlanDay {
    pub day: String,
    #[serde(default)]
    pub activities: Vec<String>,
}

/// Flat kind tag, used in responses and envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    SingleChoice,
    MultipleChoice,
    Text,
    Scale,
    Image,
    Description,
    Video,
    ImageDisplay,
    TextDisplay,
    WeeklyPlan,
    Result,
}

impl NodeKind {
    /// Kinds that only need to be acknowledged
    pub fn is_display(self) -> bool {
        matches!(
            self,
            NodeKind::Description
                | NodeKind::Video
                | NodeKind::ImageDisplay
                | NodeKind::TextDisplay
                | NodeKind::WeeklyPlan
        )
    }

    /// Kinds whose response must be present in a completion payload
    pub fn requires_response(self) -> bool {
        !self.is_display() && self != NodeKind::Result
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::SingleChoice => "SINGLE_CHOICE",
            NodeKind::MultipleChoice => "MULTIPLE_CHOICE",
            NodeKind::Text => "TEXT",
            NodeKind::Scale => "SCALE",
            NodeKind::Image => "IMAGE",
            NodeKind::Description => "DESCRIPTION",
            NodeKind::Video => "VIDEO",
            NodeKind::ImageDisplay => "IMAGE_DISPLAY",
            NodeKind::TextDisplay => "TEXT_DISPLAY",
            NodeKind::WeeklyPlan => "WEEKLY_PLAN",
            NodeKind::Result => "RESULT",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Node {
    pub fn new(id: NodeId, prompt: impl Into<String>, body: NodeBody) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            next_node_id: None,
            body,
        }
    }

    /// Set an explicit successor
    pub fn with_next(mut self, next: NodeId) -> Self {
        self.next_node_id = Some(next);
        self
    }

    pub fn kind(&self) -> NodeKind {
        match &self.body {
            NodeBody::SingleChoice { .. } => NodeKind::SingleChoice,
            NodeBody::MultipleChoice { .. } => NodeKind::MultipleChoice,
            NodeBody::Text {} => NodeKind::Text,
            NodeBody::Scale { .. } => NodeKind::Scale,
            NodeBody::Image { .. } => NodeKind::Image,
            NodeBody::Description { .. } => NodeKind::Description,
            NodeBody::Video { .. } => NodeKind::Video,
            NodeBody::ImageDisplay { .. } => NodeKind::ImageDisplay,
            NodeBody::TextDisplay { .. } => NodeKind::TextDisplay,
            NodeBody::WeeklyPlan { .. } => NodeKind::WeeklyPlan,
            NodeBody::Result {} => NodeKind::Result,
        }
    }

    /// Choice options, empty for non-choice kinds
    pub fn options(&self) -> &[String] {
        match &self.body {
            NodeBody::SingleChoice { options } | NodeBody::MultipleChoice { options, .. } => {
                options
            }
            _ => &[],
        }
    }

    /// Buttons declared by a display node, empty otherwise
    pub fn buttons(&self) -> &[Button] {
        match &self.body {
            NodeBody::Description { buttons }
            | NodeBody::Video { buttons, .. }
            | NodeBody::ImageDisplay { buttons, .. }
            | NodeBody::TextDisplay { buttons } => buttons,
            _ => &[],
        }
    }

    pub fn is_terminal_kind(&self) -> bool {
        self.kind() == NodeKind::Result
    }
}
