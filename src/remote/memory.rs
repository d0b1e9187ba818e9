// SPDX-License-Identifier: MIT

//! In-process persistence, used for dry runs and tests

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Ack, PersistenceAdapter, SessionId, SubmitError};
use crate::flow::Payload;

#[derive(Default)]
struct Inner {
    stored: HashMap<SessionId, Payload>,
    submissions: usize,
    clears: usize,
    /// Failures handed out before the next successful call
    queued_failures: VecDeque<SubmitError>,
}

/// Keeps the latest payload per session in memory
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `error`
    pub async fn fail_next(&self, error: SubmitError) {
        self.inner.write().await.queued_failures.push_back(error);
    }

    pub async fn stored(&self, session_id: &SessionId) -> Option<Payload> {
        self.inner.read().await.stored.get(session_id).cloned()
    }

    /// Successful submissions so far
    pub async fn submissions(&self) -> usize {
        self.inner.read().await.submissions
    }

    pub async fn clears(&self) -> usize {
        self.inner.read().await.clears
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryPersistence {
    async fn submit(&self, session_id: &SessionId, payload: &Payload) -> Result<Ack, SubmitError> {
        let mut inner = self.inner.write().await;
        if let Some(err) = inner.queued_failures.pop_front() {
            return Err(err);
        }
        inner.stored.insert(session_id.clone(), payload.clone());
        inner.submissions += 1;
        Ok(Ack {
            status: 201,
            body: None,
        })
    }

    async fn clear_and_restart(&self, session_id: &SessionId) -> Result<Ack, SubmitError> {
        let mut inner = self.inner.write().await;
        if let Some(err) = inner.queued_failures.pop_front() {
            return Err(err);
        }
        inner.stored.remove(session_id);
        inner.clears += 1;
        Ok(Ack {
            status: 200,
            body: None,
        })
    }
}
