//! crates/portfolio_copilot_core/src/tool_loop.rs
//!
//! The model-driven mode: the whole transcript goes to the chat model together
//! with the declared tools, and a tool call is executed locally before a second
//! model call produces the reply.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::{ChatMessage, Session};
use crate::error::CopilotError;
use crate::ports::{ChatModel, ModelReply, PortError, SessionStore};
use crate::tools::{tool_specs, ToolHandlers, ToolInvocation};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a portfolio assistant. You help the user add \
projects and work experience to their personal website. Ask for any required details that are \
missing, then call the matching function. After a function runs, tell the user plainly whether \
the update succeeded.";

/// Runs one conversation turn per inbound message.
#[derive(Clone)]
pub struct ToolCallingLoop {
    store: Arc<dyn SessionStore>,
    model: Arc<dyn ChatModel>,
    handlers: ToolHandlers,
    system_prompt: String,
}

impl ToolCallingLoop {
    pub fn new(
        store: Arc<dyn SessionStore>,
        model: Arc<dyn ChatModel>,
        handlers: ToolHandlers,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            store,
            model,
            handlers,
            system_prompt: system_prompt.into(),
        }
    }

    /// Handles `message` for `user_id` and returns the model's reply.
    pub async fn run_turn(&self, user_id: &str, message: &str) -> Result<String, CopilotError> {
        let mut session = self
            .store
            .get(user_id)
            .await?
            .unwrap_or_else(|| Session::new(user_id));
        if session.history.is_empty() {
            session
                .history
                .push(ChatMessage::system(self.system_prompt.clone()));
        }
        session.history.push(ChatMessage::user(message));

        let specs = tool_specs();
        let first = self.model.complete(&session.history, &specs).await;
        let first = match first {
            Ok(reply) => reply,
            Err(e) => {
                self.save(user_id, &mut session).await?;
                return Err(e.into());
            }
        };

        let (name, arguments) = match first {
            ModelReply::Content(reply) => {
                session.history.push(ChatMessage::assistant(reply.clone()));
                self.save(user_id, &mut session).await?;
                return Ok(reply);
            }
            ModelReply::ToolCall { name, arguments } => (name, arguments),
        };

        session
            .history
            .push(ChatMessage::assistant_call(name.clone(), arguments.clone()));
        let invocation = match ToolInvocation::parse(&name, &arguments, user_id) {
            Ok(invocation) => invocation,
            Err(e) => {
                error!(user_id, tool = %name, "Rejected tool call: {}", e);
                self.save(user_id, &mut session).await?;
                return Err(e.into());
            }
        };

        info!(user_id, tool = invocation.kind().name(), "Dispatching tool call.");
        let outcome = self.handlers.execute(invocation).await;
        session
            .history
            .push(ChatMessage::function(name, outcome.to_message_content()));

        let reply = match self.model.complete(&session.history, &[]).await {
            Ok(ModelReply::Content(reply)) if !reply.trim().is_empty() => reply,
            Ok(ModelReply::Content(_)) => {
                warn!(user_id, "Model gave an empty summary; replying from the tool result.");
                outcome.summary()
            }
            Ok(ModelReply::ToolCall { name, .. }) => {
                warn!(user_id, tool = %name, "Model asked for a tool on the summary call; replying from the tool result.");
                outcome.summary()
            }
            Err(e) => {
                warn!(user_id, "Summary call failed, replying from the tool result: {}", e);
                outcome.summary()
            }
        };
        session.history.push(ChatMessage::assistant(reply.clone()));
        self.finish(user_id, &mut session, outcome.success).await?;
        Ok(reply)
    }

    async fn finish(&self, user_id: &str, session: &mut Session, success: bool) -> Result<(), PortError> {
        if success {
            info!(user_id, "Tool reported success; clearing session.");
            self.store.delete(user_id).await
        } else {
            self.save(user_id, session).await
        }
    }

    async fn save(&self, user_id: &str, session: &mut Session) -> Result<(), PortError> {
        session.touch();
        self.store.put(user_id, session).await
    }
}
