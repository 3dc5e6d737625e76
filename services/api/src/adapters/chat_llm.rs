//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the function-calling chat model.
//! It implements the `ChatModel` port from the `core` crate against either the
//! OpenAI or the Azure OpenAI chat-completions endpoint.

// The legacy `functions` / `function_call` fields are what this conversation
// format records, so the deprecated request and response fields are used on purpose.
#![allow(deprecated)]

use async_openai::{
    config::Config,
    error::OpenAIError,
    types::chat::{
        ChatCompletionFunctionCall, ChatCompletionFunctions,
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestFunctionMessage, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest, FunctionCall,
    },
    Client,
};
use async_trait::async_trait;
use portfolio_copilot_core::{
    domain::{ChatMessage, ChatRole},
    ports::{ChatModel, ModelReply, PortError, PortResult},
    tools::ToolSpec,
};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatModel` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter<C: Config> {
    client: Client<C>,
    model: String,
}

impl<C: Config> OpenAiChatAdapter<C> {
    /// Creates a new `OpenAiChatAdapter`. For Azure the deployment in the client
    /// config decides the model; `model` is still sent in the request body.
    pub fn new(client: Client<C>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// Conversions between the core transcript and the wire types
//=========================================================================================

fn to_request_message(message: &ChatMessage) -> ChatCompletionRequestMessage {
    match message.role {
        ChatRole::System => ChatCompletionRequestSystemMessage::from(message.content.clone()).into(),
        ChatRole::User => ChatCompletionRequestUserMessage::from(message.content.clone()).into(),
        ChatRole::Assistant => {
            let content = (!message.content.is_empty())
                .then(|| ChatCompletionRequestAssistantMessageContent::Text(message.content.clone()));
            ChatCompletionRequestAssistantMessage {
                content,
                function_call: message.function_call.as_ref().map(|call| FunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                }),
                ..Default::default()
            }
            .into()
        }
        ChatRole::Function => ChatCompletionRequestFunctionMessage {
            content: Some(message.content.clone()),
            name: message.name.clone().unwrap_or_default(),
        }
        .into(),
    }
}

fn to_function(spec: &ToolSpec) -> ChatCompletionFunctions {
    ChatCompletionFunctions {
        name: spec.name.to_string(),
        description: Some(spec.description.to_string()),
        parameters: spec.parameters.clone(),
    }
}

/// Builds the request body. Tools are declared with automatic selection only
/// when there are any.
pub fn build_request(model: &str, messages: &[ChatMessage], tools: &[ToolSpec]) -> CreateChatCompletionRequest {
    let (functions, function_call) = if tools.is_empty() {
        (None, None)
    } else {
        (
            Some(tools.iter().map(to_function).collect()),
            Some(ChatCompletionFunctionCall::Auto),
        )
    };
    CreateChatCompletionRequest {
        model: model.to_string(),
        messages: messages.iter().map(to_request_message).collect(),
        functions,
        function_call,
        ..Default::default()
    }
}

//=========================================================================================
// `ChatModel` Trait Implementation
//=========================================================================================

#[async_trait]
impl<C: Config> ChatModel for OpenAiChatAdapter<C> {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> PortResult<ModelReply> {
        let request = build_request(&self.model, messages, tools);
        debug!(messages = messages.len(), tools = tools.len(), "Sending chat completion.");

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            PortError::Upstream("Chat model returned no choices in its response.".to_string())
        })?;

        if let Some(call) = choice.message.function_call {
            return Ok(ModelReply::ToolCall {
                name: call.name,
                arguments: call.arguments,
            });
        }
        Ok(ModelReply::Content(choice.message.content.unwrap_or_default()))
    }
}

/// Distinguishes timeouts from other client failures.
pub fn map_openai_error(e: OpenAIError) -> PortError {
    match e {
        OpenAIError::Reqwest(ref inner) if inner.is_timeout() => PortError::Timeout(e.to_string()),
        OpenAIError::ApiError(_) | OpenAIError::Reqwest(_) => PortError::Upstream(e.to_string()),
        other => PortError::Unexpected(other.to_string()),
    }
}
