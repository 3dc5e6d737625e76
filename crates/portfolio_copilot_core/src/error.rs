//! crates/portfolio_copilot_core/src/error.rs
//!
//! The error returned by the conversation services (dialogue engine and tool loop).

use crate::assembler::AssembleError;
use crate::domain::{StepId, WorkflowKind};
use crate::ports::PortError;
use crate::tools::ToolError;

#[derive(Debug, thiserror::Error)]
pub enum CopilotError {
    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    #[error("Could not assemble update: {0}")]
    Assemble(#[from] AssembleError),

    #[error("Tool dispatch failed: {0}")]
    Tool(#[from] ToolError),

    /// A stored session whose step does not belong to its workflow.
    #[error("Stored session is inconsistent: step {step:?} in workflow {workflow:?}")]
    CorruptSession {
        workflow: Option<WorkflowKind>,
        step: Option<StepId>,
    },
}
