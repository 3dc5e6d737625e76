//! services/api/src/web/protocol.rs
//!
//! Defines the JSON request and response bodies exchanged with REST clients.

use portfolio_copilot_core::domain::{PortfolioSection, ProjectEntry, UpdateRequest, WorkEntry};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Conversation Endpoints
//=========================================================================================

/// One chat message from the user, for both `/copilot` and `/agent`.
#[derive(Deserialize, Debug, ToSchema)]
pub struct CopilotRequest {
    /// Conversation owner; the configured default user when absent.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct CopilotResponse {
    pub response: String,
}

//=========================================================================================
// Content Update Endpoint
//=========================================================================================

/// A portfolio entry to publish directly, tagged by `type`.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UpdateContentRequest {
    Project {
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        technologies: String,
        #[serde(default)]
        link: Option<String>,
    },
    Work {
        #[serde(default)]
        title: String,
        #[serde(default)]
        company: String,
        #[serde(default)]
        team_name: Option<String>,
        #[serde(default)]
        year_range: String,
        #[serde(default)]
        technologies: Option<String>,
        #[serde(default)]
        company_url: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

fn trimmed_opt(value: Option<String>) -> Option<String> {
    value.map(trimmed).filter(|v| !v.is_empty())
}

impl From<UpdateContentRequest> for UpdateRequest {
    fn from(request: UpdateContentRequest) -> Self {
        match request {
            UpdateContentRequest::Project {
                title,
                description,
                technologies,
                link,
            } => UpdateRequest::Project(ProjectEntry {
                title: trimmed(title),
                description: trimmed(description),
                technologies: trimmed(technologies),
                link: trimmed_opt(link),
            }),
            UpdateContentRequest::Work {
                title,
                company,
                team_name,
                year_range,
                technologies,
                company_url,
                description,
            } => UpdateRequest::Work(WorkEntry {
                title: trimmed(title),
                company: trimmed(company),
                team_name: trimmed_opt(team_name),
                year_range: trimmed(year_range),
                technologies: trimmed_opt(technologies),
                company_url: trimmed_opt(company_url),
                description: trimmed_opt(description),
            }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct UpdateContentResponse {
    /// Always `success`.
    pub status: String,
    #[schema(value_type = String, example = "projects")]
    pub section: PortfolioSection,
    pub commit_sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_url: Option<String>,
}

//=========================================================================================
// Shared Bodies
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable failure code for publish errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
        }
    }

    pub fn with_code(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
