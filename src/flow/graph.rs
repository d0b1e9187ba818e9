// SPDX-License-Identifier: MIT

//! Immutable node graphs and successor resolution

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::FlowError;
use super::node::{Node, NodeBody, NodeId};

/// Which remote definition a graph was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GraphFlavor {
    /// `question_nodes`: self or professional evaluation
    #[default]
    Evaluation,
    /// `training_nodes`: training sequence
    Training,
}

/// An ordered sequence of nodes with an entry point
///
/// Graphs are validated on construction and never mutated afterwards.
/// A new evaluation gets a new `Graph`.
#[derive(Debug, Clone)]
pub struct Graph {
    flavor: GraphFlavor,
    nodes: Vec<Node>,
    initial_node_id: Option<NodeId>,
    positions: HashMap<NodeId, usize>,
}

impl Graph {
    /// Build a graph whose entry point is the first node
    pub fn new(flavor: GraphFlavor, nodes: Vec<Node>) -> Result<Self, FlowError> {
        let initial = nodes.first().map(|n| n.id);
        Self::with_initial(flavor, nodes, initial)
    }

    /// Build a graph with an explicit entry point
    pub fn with_initial(
        flavor: GraphFlavor,
        nodes: Vec<Node>,
        initial_node_id: Option<NodeId>,
    ) -> Result<Self, FlowError> {
        let mut positions = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if positions.insert(node.id, idx).is_some() {
                return Err(FlowError::invalid_graph(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
        }

        let graph = Self {
            flavor,
            nodes,
            initial_node_id,
            positions,
        };
        graph.validate()?;
        Ok(graph)
    }

    fn validate(&self) -> Result<(), FlowError> {
        if let Some(initial) = self.initial_node_id {
            if !self.positions.contains_key(&initial) {
                return Err(FlowError::UnknownNode { node_id: initial });
            }
        }

        for node in &self.nodes {
            if let Some(next) = node.next_node_id {
                self.ensure_target(node.id, next)?;
            }
            for button in node.buttons() {
                if let Some(next) = button.next_node_id {
                    self.ensure_target(node.id, next)?;
                }
            }

            match &node.body {
                NodeBody::SingleChoice { options } | NodeBody::MultipleChoice { options, .. }
                    if options.is_empty() =>
                {
                    return Err(FlowError::invalid_graph(format!(
                        "choice node {} declares no options",
                        node.id
                    )));
                }
                NodeBody::Scale { min, max, step } if !(min < max) || !(*step > 0.0) => {
                    return Err(FlowError::invalid_graph(format!(
                        "scale node {} has invalid bounds [{}, {}] step {}",
                        node.id, min, max, step
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn ensure_target(&self, from: NodeId, target: NodeId) -> Result<(), FlowError> {
        if self.positions.contains_key(&target) {
            Ok(())
        } else {
            Err(FlowError::invalid_graph(format!(
                "node {} points to missing node {}",
                from, target
            )))
        }
    }

    pub fn flavor(&self) -> GraphFlavor {
        self.flavor
    }

    pub fn initial_node_id(&self) -> Option<NodeId> {
        self.initial_node_id
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node, failing on unknown ids
    pub fn node(&self, node_id: NodeId) -> Result<&Node, FlowError> {
        self.positions
            .get(&node_id)
            .map(|&idx| &self.nodes[idx])
            .ok_or(FlowError::UnknownNode { node_id })
    }

    /// Position of a node in graph order
    pub fn position(&self, node_id: NodeId) -> Result<usize, FlowError> {
        self.positions
            .get(&node_id)
            .copied()
            .ok_or(FlowError::UnknownNode { node_id })
    }

    /// Successor of a node: the explicit pointer if declared, otherwise the
    /// next node in graph order. RESULT nodes and the last node have none.
    pub fn resolve_successor(&self, node_id: NodeId) -> Result<Option<NodeId>, FlowError> {
        let idx = self.position(node_id)?;
        let node = &self.nodes[idx];
        if node.is_terminal_kind() {
            return Ok(None);
        }
        if let Some(next) = node.next_node_id {
            return Ok(Some(next));
        }
        Ok(self.nodes.get(idx + 1).map(|n| n.id))
    }

    /// Successor after leaving a node through `button`
    ///
    /// Nodes that declare buttons route exclusively through the chosen
    /// button; a button without a target ends the walk.
    pub fn resolve_branch(
        &self,
        node_id: NodeId,
        button: Option<usize>,
    ) -> Result<Option<NodeId>, FlowError> {
        let node = self.node(node_id)?;
        let buttons = node.buttons();
        if buttons.is_empty() {
            return self.resolve_successor(node_id);
        }

        let choice = button.ok_or_else(|| {
            FlowError::invalid_answer(node_id, "a button must be chosen to leave this node")
        })?;
        let target = buttons.get(choice).ok_or_else(|| {
            FlowError::invalid_answer(
                node_id,
                format!("button {} out of range ({} buttons)", choice, buttons.len()),
            )
        })?;
        Ok(target.next_node_id)
    }

    /// Number of nodes after `node_id` in graph order
    pub fn remaining_after(&self, node_id: NodeId) -> Result<usize, FlowError> {
        let idx = self.position(node_id)?;
        Ok(self.nodes.len() - idx - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::node::Button;

    fn choice(id: NodeId) -> Node {
        Node::new(
            id,
            "pick",
            NodeBody::SingleChoice {
                options: vec!["A".into(), "B".into()],
            },
        )
    }

    fn text(id: NodeId) -> Node {
        Node::new(id, "say", NodeBody::Text {})
    }

    fn result(id: NodeId) -> Node {
        Node::new(id, "done", NodeBody::Result {})
    }

    #[test]
    fn test_positional_successor() {
        let graph =
            Graph::new(GraphFlavor::Evaluation, vec![choice(1), text(2), result(3)]).unwrap();
        assert_eq!(graph.initial_node_id(), Some(1));
        assert_eq!(graph.resolve_successor(1).unwrap(), Some(2));
        assert_eq!(graph.resolve_successor(2).unwrap(), Some(3));
        assert_eq!(graph.resolve_successor(3).unwrap(), None);
    }

    #[test]
    fn test_explicit_successor_wins() {
        let graph = Graph::new(
            GraphFlavor::Evaluation,
            vec![choice(1).with_next(3), text(2), result(3)],
        )
        .unwrap();
        assert_eq!(graph.resolve_successor(1).unwrap(), Some(3));
    }

    #[test]
    fn test_last_node_has_no_successor() {
        let graph = Graph::new(GraphFlavor::Training, vec![choice(1), text(2)]).unwrap();
        assert_eq!(graph.resolve_successor(2).unwrap(), None);
    }

    #[test]
    fn test_unknown_node_is_error() {
        let graph = Graph::new(GraphFlavor::Evaluation, vec![choice(1)]).unwrap();
        assert_eq!(
            graph.resolve_successor(42),
            Err(FlowError::UnknownNode { node_id: 42 })
        );
    }

    #[test]
    fn test_button_branching() {
        let intro = Node::new(
            1,
            "Which path?",
            NodeBody::Description {
                buttons: vec![
                    Button {
                        label: "Short".into(),
                        next_node_id: Some(3),
                    },
                    Button {
                        label: "Stop".into(),
                        next_node_id: None,
                    },
                ],
            },
        );
        let graph = Graph::new(GraphFlavor::Training, vec![intro, text(2), text(3)]).unwrap();

        assert_eq!(graph.resolve_branch(1, Some(0)).unwrap(), Some(3));
        assert_eq!(graph.resolve_branch(1, Some(1)).unwrap(), None);
        assert!(matches!(
            graph.resolve_branch(1, Some(2)),
            Err(FlowError::InvalidAnswer { node_id: 1, .. })
        ));
        assert!(matches!(
            graph.resolve_branch(1, None),
            Err(FlowError::InvalidAnswer { node_id: 1, .. })
        ));
        // No buttons: plain successor
        assert_eq!(graph.resolve_branch(2, None).unwrap(), Some(3));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Graph::new(GraphFlavor::Evaluation, vec![choice(1), text(1)]).unwrap_err();
        assert!(matches!(err, FlowError::InvalidGraph(_)));
    }

    #[test]
    fn test_dangling_pointer_rejected() {
        let err = Graph::new(GraphFlavor::Evaluation, vec![choice(1).with_next(8)]).unwrap_err();
        assert!(matches!(err, FlowError::InvalidGraph(_)));
    }

    #[test]
    fn test_unknown_initial_node_rejected() {
        let err =
            Graph::with_initial(GraphFlavor::Evaluation, vec![choice(1)], Some(5)).unwrap_err();
        assert_eq!(err, FlowError::UnknownNode { node_id: 5 });
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let scale = Node::new(
            1,
            "rate",
            NodeBody::Scale {
                min: 5.0,
                max: 1.0,
                step: 1.0,
            },
        );
        assert!(Graph::new(GraphFlavor::Evaluation, vec![scale]).is_err());
    }

    #[test]
    fn test_choice_without_options_rejected() {
        let empty = Node::new(1, "pick", NodeBody::SingleChoice { options: vec![] });
        assert!(Graph::new(GraphFlavor::Evaluation, vec![empty]).is_err());
    }

    #[test]
    fn test_empty_graph_has_no_initial_node() {
        let graph = Graph::new(GraphFlavor::Evaluation, vec![]).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.initial_node_id(), None);
    }
}
