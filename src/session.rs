// SPDX-License-Identifier: MIT

//! Workflow sessions
//!
//! A session binds one navigator to a host-supplied session id and a
//! persistence adapter. Completion is only considered persisted once the
//! adapter acknowledges it; a failed or abandoned submission leaves every
//! collected response in place.

use std::sync::Arc;
use thiserror::Error;

use crate::flow::{
    FlowError, Graph, NavigationState, Navigator, Node, Progress, RawAnswer, Response,
    SubmissionStatus, WalkStatus,
};
use crate::remote::{Ack, PersistenceAdapter, SessionId, SubmitError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl SessionError {
    /// True when the host should offer a retry without re-answering
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Submit(e) => e.is_retryable(),
            SessionError::Flow(_) => false,
        }
    }
}

/// Owned, read-only snapshot of a session for secondary views
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session_id: SessionId,
    pub current_node: Option<Node>,
    pub state: NavigationState,
    pub status: WalkStatus,
    pub progress: Progress,
    pub persisted: bool,
}

/// Releases the submission gate if the submit future is dropped mid-flight
struct InFlight<'a> {
    navigator: &'a mut Navigator,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, persisted: bool) {
        self.navigator.finish_submission(persisted);
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            log::debug!("Submission abandoned before it resolved");
            self.navigator.finish_submission(false);
        }
    }
}

/// One user's walk through one graph
pub struct WorkflowSession {
    session_id: SessionId,
    navigator: Navigator,
    adapter: Arc<dyn PersistenceAdapter>,
    last_ack: Option<Ack>,
}

impl WorkflowSession {
    pub fn start(
        session_id: SessionId,
        graph: Arc<Graph>,
        adapter: Arc<dyn PersistenceAdapter>,
    ) -> Result<Self, SessionError> {
        let navigator = Navigator::start(graph)?;
        log::info!("Session {} started", session_id);
        Ok(Self {
            session_id,
            navigator,
            adapter,
            last_ack: None,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn current_node(&self) -> Option<&Node> {
        self.navigator.current_node()
    }

    pub fn is_complete(&self) -> bool {
        self.navigator.is_complete()
    }

    pub fn is_persisted(&self) -> bool {
        self.navigator.is_persisted()
    }

    pub fn advance(&mut self, raw: RawAnswer) -> Result<&NavigationState, SessionError> {
        Ok(self.navigator.advance(raw)?)
    }

    pub fn retreat(&mut self) -> Result<Option<Response>, SessionError> {
        let discarded = self.navigator.retreat()?;
        if !self.navigator.is_persisted() {
            self.last_ack = None;
        }
        Ok(discarded)
    }

    /// Switch to a new graph snapshot for the same session
    pub fn load(&mut self, graph: Arc<Graph>) -> Result<(), SessionError> {
        self.navigator.load(graph)?;
        self.last_ack = None;
        Ok(())
    }

    /// Submit the completed walk
    ///
    /// Calling this again after a successful submission returns the first
    /// acknowledgement without contacting the store.
    pub async fn submit(&mut self) -> Result<Ack, SessionError> {
        if let (true, Some(ack)) = (self.navigator.is_persisted(), &self.last_ack) {
            return Ok(ack.clone());
        }

        let payload = self.navigator.begin_submission()?;
        let gate = InFlight {
            navigator: &mut self.navigator,
            settled: false,
        };

        match self.adapter.submit(&self.session_id, &payload).await {
            Ok(ack) => {
                gate.settle(true);
                log::info!(
                    "Session {} persisted (status {})",
                    self.session_id,
                    ack.status
                );
                self.last_ack = Some(ack.clone());
                Ok(ack)
            }
            Err(e) => {
                gate.settle(false);
                log::warn!(
                    "Session {} submission failed (retryable: {}): {}",
                    self.session_id,
                    e.is_retryable(),
                    e
                );
                Err(e.into())
            }
        }
    }

    /// Clear the stored evaluation remotely, then start over locally
    pub async fn restart(&mut self) -> Result<(), SessionError> {
        if self.navigator.submission_status() == SubmissionStatus::InFlight {
            return Err(FlowError::SubmissionInFlight.into());
        }
        self.adapter.clear_and_restart(&self.session_id).await?;
        self.navigator.restart()?;
        self.last_ack = None;
        log::info!("Session {} restarted", self.session_id);
        Ok(())
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.session_id.clone(),
            current_node: self.navigator.current_node().cloned(),
            state: self.navigator.state().clone(),
            status: self.navigator.state().status(),
            progress: self.navigator.progress(),
            persisted: self.navigator.is_persisted(),
        }
    }
}
