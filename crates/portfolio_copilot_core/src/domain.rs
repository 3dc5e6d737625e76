//! crates/portfolio_copilot_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or HTTP transport; the only
//! format they commit to is the JSON blob stored per user by a session store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The two content kinds a user can add to the portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    Project,
    Work,
}

impl WorkflowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowKind::Project => "project",
            WorkflowKind::Work => "work",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one question in a workflow. `GenerateContent` is the terminal
/// sentinel and never carries a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    AskName,
    AskProjectName,
    AskProjectDescription,
    AskCompanyName,
    AskTitleName,
    AskTeamName,
    AskYears,
    AskTechnologies,
    GenerateContent,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::AskName => "ask_name",
            StepId::AskProjectName => "ask_project_name",
            StepId::AskProjectDescription => "ask_project_description",
            StepId::AskCompanyName => "ask_company_name",
            StepId::AskTitleName => "ask_title_name",
            StepId::AskTeamName => "ask_team_name",
            StepId::AskYears => "ask_years",
            StepId::AskTechnologies => "ask_technologies",
            StepId::GenerateContent => "generate_content",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user conversational state, persisted as one JSON object per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<StepId>,
    /// The display name given at the `ask_name` step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub answers: BTreeMap<StepId, String>,
    /// Only populated by the tool-calling loop.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            workflow: None,
            step: None,
            name: None,
            answers: BTreeMap::new(),
            history: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// True when no guided dialogue is in progress.
    pub fn is_idle(&self) -> bool {
        self.workflow.is_none()
    }

    pub fn answer(&self, step: StepId) -> Option<&str> {
        self.answers.get(&step).map(String::as_str)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Function,
}

/// A function invocation requested by the chat model, kept in the transcript
/// so the follow-up call sees which tool produced the function-role result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallRecord {
    pub name: String,
    pub arguments: String,
}

/// A single role-tagged message of the tool-calling transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
    /// Function name, set on function-role messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallRecord>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::Assistant, content)
    }

    pub fn assistant_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: String::new(),
            name: None,
            function_call: Some(FunctionCallRecord {
                name: name.into(),
                arguments: arguments.into(),
            }),
        }
    }

    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Function,
            content: content.into(),
            name: Some(name.into()),
            function_call: None,
        }
    }

    fn plain(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            function_call: None,
        }
    }
}

/// A project entry for the "projects" section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub title: String,
    pub description: String,
    pub technologies: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A work-experience entry for the "experience" section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkEntry {
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub year_range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A write-once record handed to the publisher exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UpdateRequest {
    Project(ProjectEntry),
    Work(WorkEntry),
}

impl UpdateRequest {
    pub fn section(&self) -> PortfolioSection {
        match self {
            UpdateRequest::Project(_) => PortfolioSection::Projects,
            UpdateRequest::Work(_) => PortfolioSection::Experience,
        }
    }

    /// Names of required fields that are blank, for input validation at the
    /// HTTP boundary. Work entries built by the agent tools may leave team and
    /// technologies out; direct updates may not.
    pub fn blank_required_fields(&self) -> Vec<&'static str> {
        let fields: Vec<(&'static str, &str)> = match self {
            UpdateRequest::Project(p) => vec![
                ("title", p.title.as_str()),
                ("description", p.description.as_str()),
                ("technologies", p.technologies.as_str()),
            ],
            UpdateRequest::Work(w) => vec![
                ("title", w.title.as_str()),
                ("company", w.company.as_str()),
                ("team_name", w.team_name.as_deref().unwrap_or_default()),
                ("year_range", w.year_range.as_str()),
                ("technologies", w.technologies.as_deref().unwrap_or_default()),
            ],
        };
        fields
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect()
    }
}

/// The part of the portfolio page an entry is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortfolioSection {
    Projects,
    Experience,
}

impl PortfolioSection {
    /// The `id` attribute of the section element in the page.
    pub fn anchor_id(&self) -> &'static str {
        match self {
            PortfolioSection::Projects => "projects",
            PortfolioSection::Experience => "experience",
        }
    }
}

impl fmt::Display for PortfolioSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.anchor_id())
    }
}

/// What the publisher reports after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub section: PortfolioSection,
    pub commit_sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_request_serializes_without_absent_link() {
        let request = UpdateRequest::Project(ProjectEntry {
            title: "X".into(),
            description: "Y".into(),
            technologies: "React, Node".into(),
            link: None,
        });
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "project",
                "title": "X",
                "description": "Y",
                "technologies": "React, Node"
            })
        );
    }

    #[test]
    fn session_answers_use_step_names_as_keys() {
        let mut session = Session::new("u1");
        session.workflow = Some(WorkflowKind::Work);
        session.step = Some(StepId::AskYears);
        session
            .answers
            .insert(StepId::AskCompanyName, "Acme".to_string());
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["answers"]["ask_company_name"], "Acme");
        assert_eq!(json["step"], "ask_years");
        assert_eq!(json["workflow"], "work");
        assert!(json.get("history").is_none());
    }

    #[test]
    fn blank_required_fields_reports_only_blank_ones() {
        let request = UpdateRequest::Work(WorkEntry {
            title: "Engineer".into(),
            company: "  ".into(),
            team_name: None,
            year_range: String::new(),
            technologies: None,
            company_url: None,
            description: None,
        });
        assert_eq!(
            request.blank_required_fields(),
            vec!["company", "team_name", "year_range", "technologies"]
        );
    }

    #[test]
    fn update_request_rejects_unknown_type() {
        let result = serde_json::from_str::<UpdateRequest>(r#"{"type": "blog", "title": "t"}"#);
        assert!(result.is_err());
    }
}
