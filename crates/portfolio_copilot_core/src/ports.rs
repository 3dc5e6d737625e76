//! crates/portfolio_copilot_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;

use crate::domain::{ChatMessage, CommitReceipt, Session, UpdateRequest, WorkEntry};
use crate::tools::ToolSpec;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The document changed since it was read; the write was refused.
    #[error("Write conflict: {0}")]
    Conflict(String),
    /// The structural marker for the target section is missing from the document.
    #[error("Section not found: {0}")]
    SectionNotFound(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    /// A remote service answered with a failure status.
    #[error("Upstream service error: {0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// A stable, machine-readable code for error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            PortError::NotFound(_) => "not_found",
            PortError::Conflict(_) => "conflict",
            PortError::SectionNotFound(_) => "section_not_found",
            PortError::Timeout(_) => "timeout",
            PortError::Upstream(_) => "upstream_error",
            PortError::Unexpected(_) => "internal_error",
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Key-value persistence of one session object per user.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the stored session, or `None` when the user has none.
    async fn get(&self, user_id: &str) -> PortResult<Option<Session>>;

    /// Inserts or replaces the user's session.
    async fn put(&self, user_id: &str, session: &Session) -> PortResult<()>;

    /// Removes the user's session. Deleting a missing session is not an error.
    async fn delete(&self, user_id: &str) -> PortResult<()>;
}

/// What the chat model answered for one completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// Free-text content for the user.
    Content(String),
    /// A request to invoke a declared tool; `arguments` is the raw JSON text.
    ToolCall { name: String, arguments: String },
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends the transcript to the hosted model. When `tools` is non-empty the
    /// model chooses automatically between answering and calling one of them.
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec])
        -> PortResult<ModelReply>;
}

#[async_trait]
pub trait UpdatePublisher: Send + Sync {
    /// Renders the update and commits it into the live portfolio document.
    async fn publish(&self, update: &UpdateRequest) -> PortResult<CommitReceipt>;
}

#[async_trait]
pub trait DescriptionWriter: Send + Sync {
    /// Writes a short job description for a work entry that arrived without one.
    async fn write_job_description(&self, entry: &WorkEntry) -> PortResult<String>;
}
