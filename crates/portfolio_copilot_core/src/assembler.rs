//! crates/portfolio_copilot_core/src/assembler.rs
//!
//! Maps the flat answers of a completed dialogue into an `UpdateRequest`.

use crate::domain::{ProjectEntry, Session, StepId, UpdateRequest, WorkEntry, WorkflowKind};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("Session has no active workflow")]
    NoWorkflow,
    #[error("Missing answer for step '{step}' of the {workflow} workflow")]
    MissingAnswer {
        workflow: WorkflowKind,
        step: StepId,
    },
}

/// Builds the update request for the session's workflow. Answers are copied
/// verbatim; only the active workflow's fields are read.
pub fn assemble(session: &Session) -> Result<UpdateRequest, AssembleError> {
    let workflow = session.workflow.ok_or(AssembleError::NoWorkflow)?;
    let field = |step: StepId| {
        session
            .answer(step)
            .map(str::to_string)
            .ok_or(AssembleError::MissingAnswer { workflow, step })
    };

    let request = match workflow {
        WorkflowKind::Project => UpdateRequest::Project(ProjectEntry {
            title: field(StepId::AskProjectName)?,
            description: field(StepId::AskProjectDescription)?,
            technologies: field(StepId::AskTechnologies)?,
            link: None,
        }),
        WorkflowKind::Work => UpdateRequest::Work(WorkEntry {
            title: field(StepId::AskTitleName)?,
            company: field(StepId::AskCompanyName)?,
            team_name: Some(field(StepId::AskTeamName)?),
            year_range: field(StepId::AskYears)?,
            technologies: Some(field(StepId::AskTechnologies)?),
            company_url: None,
            description: None,
        }),
    };
    Ok(request)
}
