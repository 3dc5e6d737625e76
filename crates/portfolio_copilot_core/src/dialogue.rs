//! crates/portfolio_copilot_core/src/dialogue.rs
//!
//! The guided question-and-answer flow. A session walks its workflow's steps
//! one inbound message at a time; reaching the sentinel step assembles the
//! collected answers and hands them to the publisher.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::assembler::assemble;
use crate::domain::{CommitReceipt, Session, StepId};
use crate::error::CopilotError;
use crate::ports::{PortError, SessionStore, UpdatePublisher};
use crate::workflow::{match_trigger, PromptFields, TriggerMatching, GUIDANCE_MESSAGE};

/// When a session that reached its final step is removed from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    /// Delete as soon as the final answer arrives, before publishing.
    #[default]
    OnCompletion,
    /// Delete only once the publisher confirms the commit. A failed publish
    /// keeps the session so the final answer can be sent again.
    OnPublishSuccess,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DialogueSettings {
    pub matching: TriggerMatching,
    pub cleanup: CleanupPolicy,
}

/// Result of moving a session forward by one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Prompt(String),
    Complete,
}

/// What the engine tells the caller after handling one message.
#[derive(Debug)]
pub enum DialogueReply {
    Guidance(String),
    Prompt(String),
    Published(CommitReceipt),
    PublishFailed(PortError),
}

/// Starts a workflow on an idle session if `text` contains a trigger phrase,
/// returning the first prompt.
pub fn start(session: &mut Session, text: &str, matching: TriggerMatching) -> Option<String> {
    let workflow = match_trigger(text, matching)?;
    let first = workflow.first_step();
    session.workflow = Some(workflow);
    session.step = Some(first.id);
    session.name = None;
    session.answers.clear();
    let prompt = first.prompt.unwrap_or_default();
    Some(PromptFields::from_session(session).render(prompt))
}

/// Records `text` as the answer to the current step and moves to the next one.
pub fn advance(session: &mut Session, text: &str) -> Result<Advance, CopilotError> {
    let corrupt = || CopilotError::CorruptSession {
        workflow: session.workflow,
        step: session.step,
    };
    let (Some(workflow), Some(current)) = (session.workflow, session.step) else {
        return Err(corrupt());
    };
    if workflow.position(current).is_none() {
        return Err(corrupt());
    }
    if current == StepId::GenerateContent {
        return Ok(Advance::Complete);
    }

    // The name only feeds the greeting; it is not part of the update.
    if current == StepId::AskName {
        session.name = Some(text.to_string());
    } else {
        session.answers.insert(current, text.to_string());
    }

    match workflow.step_after(current) {
        Some(next) => match next.prompt {
            Some(template) => {
                session.step = Some(next.id);
                Ok(Advance::Prompt(PromptFields::from_session(session).render(template)))
            }
            None => Ok(Advance::Complete),
        },
        None => Ok(Advance::Complete),
    }
}

//=========================================================================================
// The Engine
//=========================================================================================

/// Drives the guided dialogue against a session store and a publisher.
#[derive(Clone)]
pub struct DialogueEngine {
    store: Arc<dyn SessionStore>,
    publisher: Arc<dyn UpdatePublisher>,
    settings: DialogueSettings,
}

impl DialogueEngine {
    pub fn new(
        store: Arc<dyn SessionStore>,
        publisher: Arc<dyn UpdatePublisher>,
        settings: DialogueSettings,
    ) -> Self {
        Self {
            store,
            publisher,
            settings,
        }
    }

    /// Handles one inbound message for `user_id`.
    pub async fn handle(&self, user_id: &str, text: &str) -> Result<DialogueReply, CopilotError> {
        let mut session = self
            .store
            .get(user_id)
            .await?
            .unwrap_or_else(|| Session::new(user_id));

        if session.is_idle() {
            return self.begin(user_id, session, text).await;
        }

        let advanced = match advance(&mut session, text) {
            Err(CopilotError::CorruptSession { workflow, step }) => {
                warn!(user_id, ?workflow, ?step, "Discarding session whose step is outside its workflow.");
                self.store.delete(user_id).await?;
                return self.begin(user_id, Session::new(user_id), text).await;
            }
            other => other?,
        };
        match advanced {
            Advance::Prompt(prompt) => {
                session.touch();
                self.store.put(user_id, &session).await?;
                info!(user_id, step = ?session.step, "Dialogue advanced.");
                Ok(DialogueReply::Prompt(prompt))
            }
            Advance::Complete => self.finish(user_id, session).await,
        }
    }

    async fn begin(&self, user_id: &str, mut session: Session, text: &str) -> Result<DialogueReply, CopilotError> {
        let Some(prompt) = start(&mut session, text, self.settings.matching) else {
            info!(user_id, "No workflow trigger in message; sending guidance.");
            return Ok(DialogueReply::Guidance(GUIDANCE_MESSAGE.to_string()));
        };
        session.touch();
        self.store.put(user_id, &session).await?;
        info!(
            user_id,
            workflow = ?session.workflow,
            "Started dialogue."
        );
        Ok(DialogueReply::Prompt(prompt))
    }

    async fn finish(&self, user_id: &str, mut session: Session) -> Result<DialogueReply, CopilotError> {
        info!(user_id, workflow = ?session.workflow, "All answers collected.");
        let update = match assemble(&session) {
            Ok(update) => update,
            Err(e) => {
                error!(user_id, "Completed session could not be assembled: {}", e);
                self.store.delete(user_id).await?;
                return Err(e.into());
            }
        };

        if self.settings.cleanup == CleanupPolicy::OnCompletion {
            self.store.delete(user_id).await?;
        }

        match self.publisher.publish(&update).await {
            Ok(receipt) => {
                if self.settings.cleanup == CleanupPolicy::OnPublishSuccess {
                    self.store.delete(user_id).await?;
                }
                info!(user_id, sha = %receipt.commit_sha, "Published portfolio update.");
                Ok(DialogueReply::Published(receipt))
            }
            Err(e) => {
                warn!(user_id, code = e.code(), "Publishing failed: {}", e);
                if self.settings.cleanup == CleanupPolicy::OnPublishSuccess {
                    session.touch();
                    self.store.put(user_id, &session).await?;
                }
                Ok(DialogueReply::PublishFailed(e))
            }
        }
    }
}
