//! services/api/src/adapters/publisher.rs
//!
//! The `UpdatePublisher` implementation: render the entry, splice it into the
//! portfolio page read from GitHub, and commit the page back against the SHA
//! it was read at.

use async_trait::async_trait;
use portfolio_copilot_core::domain::{CommitReceipt, UpdateRequest};
use portfolio_copilot_core::ports::{DescriptionWriter, PortError, PortResult, UpdatePublisher};
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::github::GitHubContentsClient;
use crate::adapters::html;

#[derive(Clone)]
pub struct PortfolioPublisher {
    github: GitHubContentsClient,
    path: String,
    describer: Option<Arc<dyn DescriptionWriter>>,
}

impl PortfolioPublisher {
    pub fn new(github: GitHubContentsClient, path: impl Into<String>) -> Self {
        Self {
            github,
            path: path.into(),
            describer: None,
        }
    }

    /// Work entries without a description get one from `describer`.
    pub fn with_describer(mut self, describer: Arc<dyn DescriptionWriter>) -> Self {
        self.describer = Some(describer);
        self
    }

    async fn fill_description(&self, update: &mut UpdateRequest) {
        let (UpdateRequest::Work(entry), Some(describer)) = (update, self.describer.as_ref()) else {
            return;
        };
        if entry.description.as_deref().is_some_and(|d| !d.trim().is_empty()) {
            return;
        }
        match describer.write_job_description(entry).await {
            Ok(text) => entry.description = Some(text),
            Err(e) => warn!(company = %entry.company, "Publishing without a generated description: {}", e),
        }
    }
}

#[async_trait]
impl UpdatePublisher for PortfolioPublisher {
    async fn publish(&self, update: &UpdateRequest) -> PortResult<CommitReceipt> {
        let mut update = update.clone();
        self.fill_description(&mut update).await;
        let section = update.section();
        let fragment = html::render(&update);

        let file = self.github.fetch(&self.path).await?.ok_or_else(|| {
            PortError::NotFound(format!(
                "{} does not exist on branch {}",
                self.path,
                self.github.branch()
            ))
        })?;
        let updated = html::splice_into_section(&file.content, section, &fragment)?;

        let message = format!("Agent update to {} section", section);
        let result = self
            .github
            .commit(&self.path, &updated, &message, &file.sha)
            .await?;
        info!(%section, sha = %result.commit_sha, "Committed portfolio update.");

        Ok(CommitReceipt {
            section,
            commit_sha: result.commit_sha,
            commit_url: result.commit_url,
        })
    }
}
