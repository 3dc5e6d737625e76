//! services/api/src/adapters/description_llm.rs
//!
//! This module contains the adapter for the job-description LLM.
//! It implements the `DescriptionWriter` port from the `core` crate.

use async_openai::{
    config::Config,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use portfolio_copilot_core::{
    domain::WorkEntry,
    ports::{DescriptionWriter, PortError, PortResult},
};

use crate::adapters::chat_llm::map_openai_error;

const SYSTEM_PROMPT: &str = "You write portfolio copy. Given a role, a company, a team and the \
technologies used, write a two or three sentence first-person description of the work. Respond \
with the description only, without a heading, quotes or bullet points.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `DescriptionWriter` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiDescriptionAdapter<C: Config> {
    client: Client<C>,
    model: String,
}

impl<C: Config> OpenAiDescriptionAdapter<C> {
    /// Creates a new `OpenAiDescriptionAdapter`.
    pub fn new(client: Client<C>, model: String) -> Self {
        Self { client, model }
    }
}

/// The user turn describing the entry.
pub fn describe_entry(entry: &WorkEntry) -> String {
    let mut prompt = format!("ROLE: {}\nCOMPANY: {}", entry.title, entry.company);
    if let Some(team) = entry.team_name.as_deref().filter(|t| !t.trim().is_empty()) {
        prompt.push_str(&format!("\nTEAM: {}", team));
    }
    if let Some(tech) = entry.technologies.as_deref().filter(|t| !t.trim().is_empty()) {
        prompt.push_str(&format!("\nTECHNOLOGIES: {}", tech));
    }
    prompt
}

//=========================================================================================
// `DescriptionWriter` Trait Implementation
//=========================================================================================

#[async_trait]
impl<C: Config> DescriptionWriter for OpenAiDescriptionAdapter<C> {
    async fn write_job_description(&self, entry: &WorkEntry) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(describe_entry(entry))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        // Extract the text content from the first choice in the response.
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(PortError::Upstream(
                "Description LLM response contained no text content.".to_string(),
            ));
        }
        Ok(content)
    }
}
