// SPDX-License-Identifier: MIT

//! Navigator engine
//!
//! [`transition`] is the pure state function: it never mutates its input
//! and returns the next [`NavigationState`] or the reason the event was
//! rejected. [`Navigator`] owns one state, applies events through
//! `transition` and gates completion submissions.

use std::sync::Arc;

use super::answer::RawAnswer;
use super::error::FlowError;
use super::formatter;
use super::graph::Graph;
use super::node::{Node, NodeId, NodeKind};
use super::response::{Response, ResponseSet};
use super::serializer::{self, Payload};

/// Lifecycle of a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Position, history and collected responses of one walk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationState {
    pub(crate) current_node_id: Option<NodeId>,
    pub(crate) history: Vec<NodeId>,
    pub(crate) responses: ResponseSet,
    pub(crate) completed: bool,
}

impl NavigationState {
    pub fn current_node_id(&self) -> Option<NodeId> {
        self.current_node_id
    }

    /// Nodes left going forward, oldest first
    pub fn history(&self) -> &[NodeId] {
        &self.history
    }

    pub fn responses(&self) -> &ResponseSet {
        &self.responses
    }

    pub fn response_for(&self, node_id: NodeId) -> Option<&Response> {
        self.responses.get(node_id)
    }

    /// Whether the walk has reached its end at least once
    ///
    /// Stays set when the user steps back from the end; use [`status`] to
    /// tell whether a payload can be built right now.
    ///
    /// [`status`]: NavigationState::status
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn status(&self) -> WalkStatus {
        match (self.current_node_id, self.completed) {
            (Some(_), _) => WalkStatus::InProgress,
            (None, true) => WalkStatus::Completed,
            (None, false) => WalkStatus::NotStarted,
        }
    }
}

/// Events accepted by [`transition`]
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    Advance(RawAnswer),
    Retreat,
    Restart,
}

/// Compute the state that follows `event`
pub fn transition(
    graph: &Graph,
    state: &NavigationState,
    event: NavEvent,
) -> Result<NavigationState, FlowError> {
    match event {
        NavEvent::Advance(raw) => advance(graph, state, &raw),
        NavEvent::Retreat => retreat(state),
        NavEvent::Restart => initial_state(graph),
    }
}

/// Fresh state positioned on the graph's initial node
pub fn initial_state(graph: &Graph) -> Result<NavigationState, FlowError> {
    let initial = graph.initial_node_id().ok_or(FlowError::EmptyGraph)?;
    let node = graph.node(initial)?;

    let mut state = NavigationState::default();
    if node.is_terminal_kind() {
        // Nothing to answer
        state.completed = true;
    } else {
        state.current_node_id = Some(initial);
    }
    Ok(state)
}

fn advance(
    graph: &Graph,
    state: &NavigationState,
    raw: &RawAnswer,
) -> Result<NavigationState, FlowError> {
    let current = match state.current_node_id {
        Some(id) => id,
        None if state.completed => return Err(FlowError::AlreadyCompleted),
        None => return Err(FlowError::NotStarted),
    };
    let node = graph.node(current)?;
    if node.is_terminal_kind() {
        return Err(FlowError::TerminalNode { node_id: current });
    }

    let response = formatter::format(node, raw)?;
    let successor = match graph.resolve_branch(current, response.button())? {
        Some(next) if graph.node(next)?.kind() == NodeKind::Result => None,
        other => other,
    };

    let mut next = state.clone();
    next.responses.upsert(response);
    next.history.push(current);
    match successor {
        Some(id) => next.current_node_id = Some(id),
        None => {
            next.current_node_id = None;
            next.completed = true;
        }
    }
    Ok(next)
}

fn retreat(state: &NavigationState) -> Result<NavigationState, FlowError> {
    let mut next = state.clone();
    let Some(previous) = next.history.pop() else {
        return Ok(next);
    };

    // Both the node being left and the one returned to must be answered again
    if let Some(left) = next.current_node_id {
        next.responses.remove(left);
    }
    next.responses.remove(previous);
    next.current_node_id = Some(previous);
    Ok(next)
}

/// Where a completion submission stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    InFlight,
    Persisted,
}

/// Coarse position within the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Steps left going forward so far
    pub answered: usize,
    /// Nodes after the current one in graph order; branches may skip some
    pub remaining: usize,
}

/// Owner of one walk over one graph
#[derive(Debug, Clone)]
pub struct Navigator {
    graph: Arc<Graph>,
    state: NavigationState,
    submission: SubmissionStatus,
}

impl Navigator {
    /// Start a walk on `graph`
    pub fn start(graph: Arc<Graph>) -> Result<Self, FlowError> {
        let state = initial_state(&graph)?;
        log::info!(
            "Started {:?} walk at node {:?}",
            graph.flavor(),
            state.current_node_id
        );
        Ok(Self {
            graph,
            state,
            submission: SubmissionStatus::Idle,
        })
    }

    /// Replace the graph, discarding the current walk
    pub fn load(&mut self, graph: Arc<Graph>) -> Result<(), FlowError> {
        self.ensure_not_in_flight()?;
        let state = initial_state(&graph)?;
        self.graph = graph;
        self.state = state;
        self.submission = SubmissionStatus::Idle;
        Ok(())
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    /// Read-only view of the current state
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn current_node(&self) -> Option<&Node> {
        self.state
            .current_node_id
            .and_then(|id| self.graph.node(id).ok())
    }

    pub fn is_complete(&self) -> bool {
        self.state.completed
    }

    pub fn submission_status(&self) -> SubmissionStatus {
        self.submission
    }

    pub fn is_persisted(&self) -> bool {
        self.submission == SubmissionStatus::Persisted
    }

    pub fn progress(&self) -> Progress {
        let remaining = self
            .state
            .current_node_id
            .and_then(|id| self.graph.remaining_after(id).ok())
            .unwrap_or(0);
        Progress {
            answered: self.state.history.len(),
            remaining,
        }
    }

    /// Answer the current node and move to its successor
    pub fn advance(&mut self, raw: RawAnswer) -> Result<&NavigationState, FlowError> {
        self.ensure_not_in_flight()?;
        let from = self.state.current_node_id;
        match transition(&self.graph, &self.state, NavEvent::Advance(raw)) {
            Ok(next) => {
                self.state = next;
                log::debug!(
                    "Advanced from {:?} to {:?} (history: {})",
                    from,
                    self.state.current_node_id,
                    self.state.history.len()
                );
                if self.state.status() == WalkStatus::Completed {
                    log::info!("Walk completed after {} steps", self.state.history.len());
                }
                Ok(&self.state)
            }
            Err(e) => {
                log::warn!("Rejected answer at node {:?}: {}", from, e);
                Err(e)
            }
        }
    }

    /// Step back one node, returning the response that was discarded for it
    ///
    /// Stepping back from a persisted walk reopens it for another submission.
    pub fn retreat(&mut self) -> Result<Option<Response>, FlowError> {
        self.ensure_not_in_flight()?;
        let returning_to = self.state.history.last().copied();
        let next = transition(&self.graph, &self.state, NavEvent::Retreat)?;
        let discarded = returning_to.and_then(|id| self.state.responses.get(id).cloned());
        if returning_to.is_some() && self.submission == SubmissionStatus::Persisted {
            log::info!("Persisted walk reopened by stepping back");
            self.submission = SubmissionStatus::Idle;
        }
        self.state = next;
        log::debug!("Retreated to {:?}", self.state.current_node_id);
        Ok(discarded)
    }

    /// Discard all answers and start over on the same graph
    pub fn restart(&mut self) -> Result<(), FlowError> {
        self.ensure_not_in_flight()?;
        self.state = transition(&self.graph, &self.state, NavEvent::Restart)?;
        self.submission = SubmissionStatus::Idle;
        log::info!("Restarted walk at node {:?}", self.state.current_node_id);
        Ok(())
    }

    /// Completion payload for the current walk
    pub fn payload(&self) -> Result<Payload, FlowError> {
        if self.state.status() != WalkStatus::Completed {
            return Err(FlowError::NotCompleted);
        }
        serializer::serialize(&self.graph, &self.state)
    }

    /// Build the payload and mark a submission as in flight
    pub fn begin_submission(&mut self) -> Result<Payload, FlowError> {
        match self.submission {
            SubmissionStatus::InFlight => return Err(FlowError::SubmissionInFlight),
            SubmissionStatus::Persisted => return Err(FlowError::AlreadyPersisted),
            SubmissionStatus::Idle => {}
        }
        let payload = self.payload()?;
        self.submission = SubmissionStatus::InFlight;
        Ok(payload)
    }

    /// Settle the in-flight submission; a failure keeps every response
    pub fn finish_submission(&mut self, persisted: bool) {
        if self.submission != SubmissionStatus::InFlight {
            log::warn!("finish_submission called with no submission in flight");
            return;
        }
        self.submission = if persisted {
            SubmissionStatus::Persisted
        } else {
            SubmissionStatus::Idle
        };
    }

    fn ensure_not_in_flight(&self) -> Result<(), FlowError> {
        if self.submission == SubmissionStatus::InFlight {
            Err(FlowError::SubmissionInFlight)
        } else {
            Ok(())
        }
    }
}
