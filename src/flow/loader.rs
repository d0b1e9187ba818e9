// SPDX-License-Identifier: MIT

//! Graph loader - JSON/YAML graph document parsing
//!
//! Documents come from the remote category definition and carry either
//! `question_nodes` (evaluations) or `training_nodes` (trainings).

use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::error::{FlowError, LoadError};
use super::graph::{Graph, GraphFlavor};
use super::node::{Node, NodeId};

/// Raw graph document as served by the category endpoint
#[derive(Debug, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    question_nodes: Option<Vec<Node>>,
    #[serde(default)]
    training_nodes: Option<Vec<Node>>,
    #[serde(default)]
    initial_node_id: Option<NodeId>,
}

impl GraphDocument {
    fn into_graph(self) -> Result<Graph, LoadError> {
        let (flavor, nodes) = match (self.question_nodes, self.training_nodes) {
            (Some(nodes), None) => (GraphFlavor::Evaluation, nodes),
            (None, Some(nodes)) => (GraphFlavor::Training, nodes),
            (Some(_), Some(_)) => {
                return Err(FlowError::invalid_graph(
                    "document has both question_nodes and training_nodes",
                )
                .into())
            }
            (None, None) => {
                return Err(FlowError::invalid_graph(
                    "document has neither question_nodes nor training_nodes",
                )
                .into())
            }
        };

        let initial = self.initial_node_id.or_else(|| nodes.first().map(|n| n.id));
        let graph = Graph::with_initial(flavor, nodes, initial)?;
        log::debug!(
            "Loaded {:?} graph with {} nodes (initial: {:?})",
            graph.flavor(),
            graph.len(),
            graph.initial_node_id()
        );
        Ok(graph)
    }
}

/// Loads graph documents from strings or files
pub struct GraphLoader;

impl GraphLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a graph file, choosing the parser by extension
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Graph, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::parse_json(&content),
            Some("yaml") | Some("yml") => Self::parse_yaml(&content),
            other => Err(LoadError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn parse_json(content: &str) -> Result<Graph, LoadError> {
        let doc: GraphDocument = serde_json::from_str(content)?;
        doc.into_graph()
    }

    pub fn parse_yaml(content: &str) -> Result<Graph, LoadError> {
        let doc: GraphDocument = serde_yaml::from_str(content)?;
        doc.into_graph()
    }
}

impl Default for GraphLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::node::NodeKind;

    #[test]
    fn test_parse_question_nodes_json() {
        let json = r#"{
            "question_nodes": [
                {"id": 10, "type": "SINGLE_CHOICE", "prompt": "Q1", "options": ["A", "B"]},
                {"id": 11, "type": "TEXT", "prompt": "Q2"},
                {"id": 12, "type": "RESULT"}
            ]
        }"#;
        let graph = GraphLoader::parse_json(json).unwrap();
        assert_eq!(graph.flavor(), GraphFlavor::Evaluation);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.initial_node_id(), Some(10));
        assert_eq!(graph.node(12).unwrap().kind(), NodeKind::Result);
    }

    #[test]
    fn test_parse_training_nodes_yaml() {
        let yaml = r#"
training_nodes:
  - id: 1
    type: VIDEO
    url: "https://cdn.example.com/warmup.mp4"
  - id: 2
    type: WEEKLY_PLAN
    days:
      - day: monday
        activities: ["walk"]
"#;
        let graph = GraphLoader::parse_yaml(yaml).unwrap();
        assert_eq!(graph.flavor(), GraphFlavor::Training);
        assert_eq!(graph.node(2).unwrap().kind(), NodeKind::WeeklyPlan);
    }

    #[test]
    fn test_explicit_initial_node() {
        let json = r#"{
            "initial_node_id": 2,
            "question_nodes": [
                {"id": 1, "type": "TEXT"},
                {"id": 2, "type": "TEXT"}
            ]
        }"#;
        let graph = GraphLoader::parse_json(json).unwrap();
        assert_eq!(graph.initial_node_id(), Some(2));
    }

    #[test]
    fn test_empty_document_has_no_initial_node() {
        let graph = GraphLoader::parse_json(r#"{"question_nodes": []}"#).unwrap();
        assert!(graph.initial_node_id().is_none());
    }

    #[test]
    fn test_invalid_graph_surfaces_as_graph_error() {
        let json = r#"{"question_nodes": [{"id": 1, "type": "TEXT", "nextNodeId": 9}]}"#;
        let err = GraphLoader::parse_json(json).unwrap_err();
        assert!(matches!(err, LoadError::Graph(FlowError::InvalidGraph(_))));
    }

    #[test]
    fn test_missing_node_list_rejected() {
        let err = GraphLoader::parse_json(r#"{"nodes": []}"#).unwrap_err();
        assert!(matches!(err, LoadError::Graph(FlowError::InvalidGraph(_))));
    }

    #[test]
    fn test_both_node_lists_rejected() {
        let doc = r#"{"question_nodes": [], "training_nodes": []}"#;
        let err = GraphLoader::parse_json(doc).unwrap_err();
        assert!(matches!(err, LoadError::Graph(FlowError::InvalidGraph(_))));
    }

    #[test]
    fn test_node_error_is_reported_as_is() {
        let err = GraphLoader::parse_json(
            r#"{"question_nodes": [{"id": 1, "type": "SLIDER", "prompt": "?"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
        let message = err.to_string();
        assert!(message.contains("SLIDER"), "got: {}", message);
        assert!(!message.contains("did not match any variant"));

        let doc = "question_nodes:\n  - id: 1\n    type: SCALE\n    min: 0\n";
        let err = GraphLoader::parse_yaml(doc).unwrap_err();
        assert!(matches!(err, LoadError::Yaml(_)));
        assert!(err.to_string().contains("max"), "got: {}", err);
    }
}
