//! crates/portfolio_copilot_core/src/tools.rs
//!
//! The closed set of local tools the chat model may invoke, their declared
//! signatures, argument parsing and the handlers that execute them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::{ProjectEntry, UpdateRequest, WorkEntry};
use crate::ports::UpdatePublisher;

/// A tool signature as declared to the chat model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema of the argument object.
    pub parameters: Value,
}

/// Every tool the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    AddProject,
    AddExperience,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::AddProject, ToolKind::AddExperience];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::AddProject => "add_project",
            ToolKind::AddExperience => "add_experience",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ToolError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn spec(&self) -> ToolSpec {
        match self {
            ToolKind::AddProject => ToolSpec {
                name: self.name(),
                description: "Add a new project entry to the portfolio's Projects section.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "project": {
                            "type": "object",
                            "properties": {
                                "title":        {"type": "string"},
                                "description":  {"type": "string"},
                                "technologies": {"type": "string"},
                                "link":         {"type": "string"}
                            },
                            "required": ["title", "description"]
                        }
                    },
                    "required": ["project"]
                }),
            },
            ToolKind::AddExperience => ToolSpec {
                name: self.name(),
                description: "Add a new work-experience entry to the portfolio's Experience section.",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "experience": {
                            "type": "object",
                            "properties": {
                                "role":         {"type": "string"},
                                "company":      {"type": "string"},
                                "team":         {"type": "string"},
                                "start_date":   {"type": "string"},
                                "end_date":     {"type": "string"},
                                "technologies": {"type": "string"},
                                "description":  {"type": "string"}
                            },
                            "required": ["role", "company", "start_date", "description"]
                        }
                    },
                    "required": ["experience"]
                }),
            },
        }
    }
}

/// The signatures offered to the model on a tool-enabled call.
pub fn tool_specs() -> Vec<ToolSpec> {
    ToolKind::ALL.iter().map(ToolKind::spec).collect()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Model requested unknown tool '{0}'")]
    UnknownTool(String),
    #[error("Malformed arguments for tool '{tool}': {reason}")]
    MalformedArguments { tool: &'static str, reason: String },
}

//=========================================================================================
// Arguments
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceDraft {
    pub role: String,
    pub company: String,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddProjectArgs {
    pub project: ProjectDraft,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddExperienceArgs {
    pub experience: ExperienceDraft,
    pub user_id: String,
}

/// A fully parsed tool call, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    AddProject(AddProjectArgs),
    AddExperience(AddExperienceArgs),
}

impl ToolInvocation {
    /// Resolves `name` and parses `arguments`, injecting `user_id` when the
    /// model left it out. Nothing is executed on failure.
    pub fn parse(name: &str, arguments: &str, user_id: &str) -> Result<Self, ToolError> {
        let kind = ToolKind::from_name(name)?;
        let malformed = |reason: String| ToolError::MalformedArguments {
            tool: kind.name(),
            reason,
        };

        let mut value: Value = serde_json::from_str(arguments).map_err(|e| malformed(e.to_string()))?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| malformed("arguments must be a JSON object".to_string()))?;
        object
            .entry("user_id")
            .or_insert_with(|| Value::String(user_id.to_string()));

        let invocation = match kind {
            ToolKind::AddProject => {
                ToolInvocation::AddProject(serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?)
            }
            ToolKind::AddExperience => {
                ToolInvocation::AddExperience(serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?)
            }
        };
        Ok(invocation)
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInvocation::AddProject(_) => ToolKind::AddProject,
            ToolInvocation::AddExperience(_) => ToolKind::AddExperience,
        }
    }
}

impl From<ProjectDraft> for UpdateRequest {
    fn from(draft: ProjectDraft) -> Self {
        UpdateRequest::Project(ProjectEntry {
            title: draft.title,
            description: draft.description,
            technologies: draft.technologies.unwrap_or_default(),
            link: draft.link,
        })
    }
}

impl From<ExperienceDraft> for UpdateRequest {
    fn from(draft: ExperienceDraft) -> Self {
        let end = draft.end_date.unwrap_or_else(|| "Present".to_string());
        UpdateRequest::Work(WorkEntry {
            title: draft.role,
            company: draft.company,
            team_name: draft.team,
            year_range: format!("{} - {}", draft.start_date, end),
            technologies: draft.technologies,
            company_url: None,
            description: Some(draft.description),
        })
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// The result of executing a tool, fed back to the model as a function message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub success: bool,
    pub payload: Value,
}

impl ToolOutcome {
    pub fn to_message_content(&self) -> String {
        self.payload.to_string()
    }

    /// Plain-language reply built from the payload, for when the model gives none.
    pub fn summary(&self) -> String {
        let field = |key: &str| self.payload.get(key).and_then(Value::as_str);
        if !self.success {
            return format!(
                "The update could not be published: {}",
                field("error").unwrap_or("unknown error")
            );
        }
        let section = field("section").unwrap_or("portfolio");
        match field("commit_url") {
            Some(url) => format!(
                "Your {} section has been updated! You can see the change here: {}",
                section, url
            ),
            None => format!("Your {} section has been updated!", section),
        }
    }
}

/// Executes parsed tool invocations against the publisher.
#[derive(Clone)]
pub struct ToolHandlers {
    publisher: Arc<dyn UpdatePublisher>,
}

impl ToolHandlers {
    pub fn new(publisher: Arc<dyn UpdatePublisher>) -> Self {
        Self { publisher }
    }

    pub async fn execute(&self, invocation: ToolInvocation) -> ToolOutcome {
        match invocation {
            ToolInvocation::AddProject(args) => {
                let entry = serde_json::to_value(&args.project).unwrap_or(Value::Null);
                self.publish(&args.user_id, "project", entry, args.project.into())
                    .await
            }
            ToolInvocation::AddExperience(args) => {
                let entry = serde_json::to_value(&args.experience).unwrap_or(Value::Null);
                self.publish(&args.user_id, "experience", entry, args.experience.into())
                    .await
            }
        }
    }

    async fn publish(
        &self,
        user_id: &str,
        entry_key: &str,
        entry: Value,
        update: UpdateRequest,
    ) -> ToolOutcome {
        let section = update.section();
        match self.publisher.publish(&update).await {
            Ok(receipt) => {
                info!(user_id, %section, sha = %receipt.commit_sha, "Tool commit succeeded.");
                let mut payload = json!({
                    "status": "success",
                    "section": section,
                    "commit_url": receipt.commit_url,
                });
                payload[entry_key] = entry;
                ToolOutcome {
                    success: true,
                    payload,
                }
            }
            Err(e) => {
                error!(user_id, %section, "Tool commit failed: {}", e);
                ToolOutcome {
                    success: false,
                    payload: json!({
                        "status": "error",
                        "code": e.code(),
                        "error": e.to_string(),
                    }),
                }
            }
        }
    }
}
