//! services/api/src/adapters/github.rs
//!
//! A small client for the GitHub repository contents API: read a file with
//! its blob SHA, and write it back conditioned on that SHA.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use portfolio_copilot_core::ports::{PortError, PortResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Where the portfolio repository lives and how to reach it.
#[derive(Clone, Debug)]
pub struct GitHubSettings {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

/// A file's decoded text and the revision token needed to overwrite it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    pub content: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    pub commit_sha: String,
    pub commit_url: Option<String>,
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    sha: &'a str,
}

#[derive(Deserialize)]
struct PutContentsResponse {
    commit: CommitInfo,
    #[serde(default)]
    content: Option<FileInfo>,
}

#[derive(Deserialize)]
struct CommitInfo {
    sha: String,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct FileInfo {
    #[serde(default)]
    html_url: Option<String>,
}

//=========================================================================================
// The Client
//=========================================================================================

#[derive(Clone)]
pub struct GitHubContentsClient {
    client: reqwest::Client,
    settings: GitHubSettings,
}

impl GitHubContentsClient {
    pub fn new(settings: GitHubSettings) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("portfolio-copilot"));
        if let Some(token) = settings.token.as_deref() {
            match HeaderValue::from_str(&format!("token {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("GITHUB_TOKEN is not a valid header value; requests will be anonymous."),
            }
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { client, settings })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.settings.api_base,
            self.settings.owner,
            self.settings.repo,
            path.trim_start_matches('/')
        )
    }

    pub fn branch(&self) -> &str {
        &self.settings.branch
    }

    /// Reads `path` on the configured branch. A missing file is `None`.
    pub async fn fetch(&self, path: &str) -> PortResult<Option<RepoFile>> {
        let response = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", self.settings.branch.as_str())])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        debug!(%status, path, "Fetched repository file.");
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Upstream(format!("GitHub returned {}: {}", status, body)));
        }

        let file: ContentsResponse = response
            .json()
            .await
            .map_err(|e| PortError::Upstream(format!("Unreadable contents response: {}", e)))?;
        let packed: String = file.content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(packed)
            .map_err(|e| PortError::Upstream(format!("File content is not base64: {}", e)))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| PortError::Upstream(format!("File content is not UTF-8: {}", e)))?;
        Ok(Some(RepoFile {
            content,
            sha: file.sha,
        }))
    }

    /// Overwrites `path` if its blob is still `sha`.
    pub async fn commit(&self, path: &str, content: &str, message: &str, sha: &str) -> PortResult<CommitResult> {
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(content.as_bytes()),
            branch: &self.settings.branch,
            sha,
        };
        let response = self
            .client
            .put(self.contents_url(path))
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_write_status(status, text));
        }

        let written: PutContentsResponse = response
            .json()
            .await
            .map_err(|e| PortError::Upstream(format!("Unreadable commit response: {}", e)))?;
        Ok(CommitResult {
            commit_sha: written.commit.sha,
            commit_url: written
                .commit
                .html_url
                .or_else(|| written.content.and_then(|c| c.html_url)),
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Timeout(e.to_string())
    } else {
        PortError::Upstream(e.to_string())
    }
}

/// A stale SHA comes back as 409, or as 422 naming the sha.
fn map_write_status(status: StatusCode, body: String) -> PortError {
    let stale = status == StatusCode::CONFLICT
        || (status == StatusCode::UNPROCESSABLE_ENTITY && body.to_lowercase().contains("sha"));
    if stale {
        PortError::Conflict(format!("The document changed since it was read: {}", body))
    } else {
        PortError::Upstream(format!("GitHub returned {}: {}", status, body))
    }
}
