//! In-crate fakes for the ports, used by the unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, CommitReceipt, Session, UpdateRequest};
use crate::ports::{ChatModel, ModelReply, PortError, PortResult, SessionStore, UpdatePublisher};
use crate::tools::ToolSpec;

#[derive(Default)]
pub struct FakeStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl FakeStore {
    pub async fn snapshot(&self, user_id: &str) -> Option<Session> {
        self.sessions.lock().await.get(user_id).cloned()
    }

    pub async fn seed(&self, session: Session) {
        self.sessions
            .lock()
            .await
            .insert(session.user_id.clone(), session);
    }
}

#[async_trait]
impl SessionStore for FakeStore {
    async fn get(&self, user_id: &str) -> PortResult<Option<Session>> {
        Ok(self.sessions.lock().await.get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, session: &Session) -> PortResult<()> {
        self.sessions
            .lock()
            .await
            .insert(user_id.to_string(), session.clone());
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> PortResult<()> {
        self.sessions.lock().await.remove(user_id);
        Ok(())
    }
}

pub struct FakePublisher {
    fail: bool,
    published: Mutex<Vec<UpdateRequest>>,
}

impl FakePublisher {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            published: Mutex::new(Vec::new()),
        }
    }

    pub async fn published(&self) -> Vec<UpdateRequest> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl UpdatePublisher for FakePublisher {
    async fn publish(&self, update: &UpdateRequest) -> PortResult<CommitReceipt> {
        if self.fail {
            return Err(PortError::Conflict("index.html changed".into()));
        }
        self.published.lock().await.push(update.clone());
        Ok(CommitReceipt {
            section: update.section(),
            commit_sha: "abc123".into(),
            commit_url: Some("https://example.test/commit/abc123".into()),
        })
    }
}

/// Replays canned replies and records what it was sent.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ModelReply>>,
    calls: Mutex<Vec<(Vec<ChatMessage>, usize)>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<ModelReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Each call's transcript and the number of tools offered.
    pub async fn calls(&self) -> Vec<(Vec<ChatMessage>, usize)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> PortResult<ModelReply> {
        self.calls.lock().await.push((messages.to_vec(), tools.len()));
        self.replies
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| PortError::Unexpected("script exhausted".into()))
    }
}
