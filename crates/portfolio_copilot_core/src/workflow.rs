//! crates/portfolio_copilot_core/src/workflow.rs
//!
//! The static question sequences for each workflow, trigger-phrase matching,
//! and the placeholder rendering used for prompts.

use crate::domain::{Session, StepId, WorkflowKind};

/// One entry of a workflow: the step and the prompt asked when entering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub id: StepId,
    pub prompt: Option<&'static str>,
}

const fn ask(id: StepId, prompt: &'static str) -> Step {
    Step {
        id,
        prompt: Some(prompt),
    }
}

const DONE: Step = Step {
    id: StepId::GenerateContent,
    prompt: None,
};

const PROJECT_STEPS: &[Step] = &[
    ask(StepId::AskName, "What is your name?"),
    ask(
        StepId::AskProjectName,
        "Nice to meet you, {name}! What is the name of your project?",
    ),
    ask(
        StepId::AskProjectDescription,
        "Great! Can you give me a short description of your project?",
    ),
    ask(
        StepId::AskTechnologies,
        "What technologies does this project use?",
    ),
    DONE,
];

const WORK_STEPS: &[Step] = &[
    ask(StepId::AskName, "What is your name?"),
    ask(
        StepId::AskCompanyName,
        "Nice to meet you, {name}! What company do you work at?",
    ),
    ask(StepId::AskTitleName, "What is your role at {company_name}?"),
    ask(
        StepId::AskTeamName,
        "Which team did you work with at {company_name}?",
    ),
    ask(
        StepId::AskYears,
        "How long did you work there? (Format: YYYY - YYYY)",
    ),
    ask(
        StepId::AskTechnologies,
        "What technologies did you use in this role?",
    ),
    DONE,
];

/// Reply sent when no dialogue is active and the message names no workflow.
pub const GUIDANCE_MESSAGE: &str = "I can help add projects or work experience! Try asking me.";

impl WorkflowKind {
    /// The ordered steps of this workflow; the last one is the sentinel.
    pub fn steps(&self) -> &'static [Step] {
        match self {
            WorkflowKind::Project => PROJECT_STEPS,
            WorkflowKind::Work => WORK_STEPS,
        }
    }

    pub fn first_step(&self) -> Step {
        self.steps()[0]
    }

    pub fn position(&self, step: StepId) -> Option<usize> {
        self.steps().iter().position(|s| s.id == step)
    }

    /// The step after `step`, or `None` if `step` is the sentinel or not part
    /// of this workflow.
    pub fn step_after(&self, step: StepId) -> Option<Step> {
        let index = self.position(step)?;
        self.steps().get(index + 1).copied()
    }
}

//=========================================================================================
// Trigger Phrases
//=========================================================================================

/// How trigger phrases are compared against the incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMatching {
    #[default]
    CaseInsensitive,
    CaseSensitive,
}

const WORK_TRIGGER: &str = "add work experience";
const PROJECT_TRIGGER: &str = "add project";

/// Picks the workflow named in `text`, if any. Work experience is checked
/// first.
pub fn match_trigger(text: &str, matching: TriggerMatching) -> Option<WorkflowKind> {
    let haystack = match matching {
        TriggerMatching::CaseInsensitive => text.to_lowercase(),
        TriggerMatching::CaseSensitive => text.to_string(),
    };
    if haystack.contains(WORK_TRIGGER) {
        Some(WorkflowKind::Work)
    } else if haystack.contains(PROJECT_TRIGGER) {
        Some(WorkflowKind::Project)
    } else {
        None
    }
}

//=========================================================================================
// Prompt Rendering
//=========================================================================================

/// The fixed set of values prompt templates may reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFields<'a> {
    pub name: &'a str,
    pub company_name: &'a str,
    pub team_name: &'a str,
}

impl<'a> PromptFields<'a> {
    pub const DEFAULT_NAME: &'static str = "User";
    pub const DEFAULT_COMPANY: &'static str = "Company";
    pub const DEFAULT_TEAM: &'static str = "Team";

    /// Resolves each field from the session, falling back to its default.
    pub fn from_session(session: &'a Session) -> Self {
        Self {
            name: session.name.as_deref().unwrap_or(Self::DEFAULT_NAME),
            company_name: session
                .answer(StepId::AskCompanyName)
                .unwrap_or(Self::DEFAULT_COMPANY),
            team_name: session
                .answer(StepId::AskTeamName)
                .unwrap_or(Self::DEFAULT_TEAM),
        }
    }

    pub fn render(&self, template: &str) -> String {
        template
            .replace("{name}", self.name)
            .replace("{company_name}", self.company_name)
            .replace("{team_name}", self.team_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_workflow_ends_with_a_single_promptless_sentinel() {
        for kind in [WorkflowKind::Project, WorkflowKind::Work] {
            let steps = kind.steps();
            let last = steps.last().unwrap();
            assert_eq!(last.id, StepId::GenerateContent);
            assert!(last.prompt.is_none());
            assert!(steps[..steps.len() - 1].iter().all(|s| s.prompt.is_some()));
            assert_eq!(kind.first_step().id, StepId::AskName);
        }
    }

    #[test]
    fn work_trigger_wins_over_project_trigger() {
        assert_eq!(
            match_trigger("please add work experience and add project", TriggerMatching::CaseInsensitive),
            Some(WorkflowKind::Work)
        );
        assert_eq!(
            match_trigger("I want to add project Foo", TriggerMatching::CaseInsensitive),
            Some(WorkflowKind::Project)
        );
        assert_eq!(match_trigger("hello", TriggerMatching::CaseInsensitive), None);
    }

    #[test]
    fn case_sensitivity_is_configurable() {
        assert_eq!(
            match_trigger("Add Project", TriggerMatching::CaseInsensitive),
            Some(WorkflowKind::Project)
        );
        assert_eq!(match_trigger("Add Project", TriggerMatching::CaseSensitive), None);
        assert_eq!(
            match_trigger("add project", TriggerMatching::CaseSensitive),
            Some(WorkflowKind::Project)
        );
    }

    #[test]
    fn missing_placeholders_fall_back_to_defaults() {
        let session = Session::new("u1");
        let fields = PromptFields::from_session(&session);
        assert_eq!(
            fields.render("Hi {name}, at {company_name} in {team_name}?"),
            "Hi User, at Company in Team?"
        );
    }

    #[test]
    fn placeholders_resolve_from_collected_answers() {
        let mut session = Session::new("u1");
        session.name = Some("Ada".into());
        session
            .answers
            .insert(StepId::AskCompanyName, "Initech".into());
        let fields = PromptFields::from_session(&session);
        assert_eq!(
            fields.render("What is your role at {company_name}, {name}?"),
            "What is your role at Initech, Ada?"
        );
    }

    #[test]
    fn step_after_walks_the_table() {
        assert_eq!(
            WorkflowKind::Project.step_after(StepId::AskTechnologies).map(|s| s.id),
            Some(StepId::GenerateContent)
        );
        assert_eq!(WorkflowKind::Project.step_after(StepId::GenerateContent), None);
        assert_eq!(WorkflowKind::Project.step_after(StepId::AskYears), None);
    }
}
