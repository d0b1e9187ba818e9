// SPDX-License-Identifier: MIT

//! Typed errors for the navigator and its collaborators

use thiserror::Error;

use super::node::NodeId;

/// How the host should react to a [`FlowError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user can fix it: keep the current node on screen and re-prompt
    Correctable,
    /// The graph or session is unusable: abort the session
    Fatal,
    /// An engine invariant was broken
    Internal,
}

/// Errors raised by graph loading, formatting and navigation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    /// A node id was referenced that the graph does not contain
    #[error("Node {node_id} does not exist in the graph")]
    UnknownNode { node_id: NodeId },

    /// The answer does not fit the node it was given for
    #[error("Invalid answer for node {node_id}: {reason}")]
    InvalidAnswer { node_id: NodeId, reason: String },

    /// The answer was blank; the node must not be left
    #[error("Node {node_id} requires an answer")]
    MissingAnswer { node_id: NodeId },

    /// The graph has no node to start from
    #[error("Graph has no initial node")]
    EmptyGraph,

    /// A traversed node has no recorded response at completion time
    #[error("No response recorded for traversed node {node_id}")]
    IncompleteResponse { node_id: NodeId },

    /// The graph document is structurally invalid
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// No walk has been started
    #[error("Workflow has not been started")]
    NotStarted,

    /// The walk is already complete
    #[error("Workflow is already completed")]
    AlreadyCompleted,

    /// The walk has not been completed yet
    #[error("Workflow is not completed yet")]
    NotCompleted,

    /// Forward transition out of a RESULT node
    #[error("Node {node_id} is a result node and cannot be advanced")]
    TerminalNode { node_id: NodeId },

    /// A completion submission is outstanding
    #[error("A submission is already in flight")]
    SubmissionInFlight,

    /// The completed walk has already been acknowledged by the store
    #[error("Workflow has already been persisted")]
    AlreadyPersisted,
}

impl FlowError {
    pub fn invalid_answer(node_id: NodeId, reason: impl Into<String>) -> Self {
        Self::InvalidAnswer {
            node_id,
            reason: reason.into(),
        }
    }

    pub fn invalid_graph(message: impl Into<String>) -> Self {
        Self::InvalidGraph(message.into())
    }

    pub fn severity(&self) -> Severity {
        match self {
            FlowError::InvalidAnswer { .. }
            | FlowError::MissingAnswer { .. }
            | FlowError::NotStarted
            | FlowError::AlreadyCompleted
            | FlowError::NotCompleted
            | FlowError::TerminalNode { .. }
            | FlowError::SubmissionInFlight
            | FlowError::AlreadyPersisted => Severity::Correctable,
            FlowError::UnknownNode { .. } | FlowError::EmptyGraph | FlowError::InvalidGraph(_) => {
                Severity::Fatal
            }
            FlowError::IncompleteResponse { .. } => Severity::Internal,
        }
    }

    /// True when the rejected transition can be retried after re-prompting
    pub fn is_correctable(&self) -> bool {
        self.severity() == Severity::Correctable
    }
}

/// Errors raised while reading a graph document
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported graph document extension: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Graph(#[from] FlowError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_classification() {
        assert_eq!(
            FlowError::invalid_answer(1, "out of range").severity(),
            Severity::Correctable
        );
        assert_eq!(FlowError::MissingAnswer { node_id: 2 }.severity(), Severity::Correctable);
        assert_eq!(FlowError::UnknownNode { node_id: 9 }.severity(), Severity::Fatal);
        assert_eq!(FlowError::EmptyGraph.severity(), Severity::Fatal);
        assert_eq!(
            FlowError::IncompleteResponse { node_id: 3 }.severity(),
            Severity::Internal
        );
        assert!(FlowError::SubmissionInFlight.is_correctable());
        assert!(!FlowError::EmptyGraph.is_correctable());
    }

    #[test]
    fn test_error_messages() {
        let err = FlowError::invalid_answer(4, "option 3 out of range");
        assert_eq!(
            err.to_string(),
            "Invalid answer for node 4: option 3 out of range"
        );
        assert_eq!(
            FlowError::UnknownNode { node_id: 12 }.to_string(),
            "Node 12 does not exist in the graph"
        );
    }
}
