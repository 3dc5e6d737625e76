pub mod assembler;
pub mod dialogue;
pub mod domain;
pub mod error;
pub mod ports;
pub mod tool_loop;
pub mod tools;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use assembler::{assemble, AssembleError};
pub use dialogue::{CleanupPolicy, DialogueEngine, DialogueReply, DialogueSettings};
pub use domain::{
    ChatMessage, ChatRole, CommitReceipt, FunctionCallRecord, PortfolioSection, ProjectEntry,
    Session, StepId, UpdateRequest, WorkEntry, WorkflowKind,
};
pub use error::CopilotError;
pub use ports::{
    ChatModel, DescriptionWriter, ModelReply, PortError, PortResult, SessionStore, UpdatePublisher,
};
pub use tool_loop::{ToolCallingLoop, DEFAULT_SYSTEM_PROMPT};
pub use tools::{tool_specs, ToolError, ToolHandlers, ToolSpec};
pub use workflow::{TriggerMatching, GUIDANCE_MESSAGE};
