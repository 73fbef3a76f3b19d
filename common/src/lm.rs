use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;

use crate::error::AppError;

/// The LM adapter collaborator (spec.md §6): `chat(messages) -> text`.
/// Even-indexed messages are user turns, odd-indexed are assistant turns.
/// Errors are opaque and retryable at the core level.
#[async_trait]
pub trait LmClient: Send + Sync {
    async fn chat(&self, messages: &[String]) -> Result<String, AppError>;
}

/// `async-openai`-backed implementation, following the template's
/// `DefaultPipelineServices::perform_analysis` pattern: build a request from
/// alternating messages, call `chat().create()`, and read the first
/// choice's content.
pub struct OpenAiLmClient {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
}

impl OpenAiLmClient {
    #[must_use]
    pub fn new(client: async_openai::Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl LmClient for OpenAiLmClient {
    async fn chat(&self, messages: &[String]) -> Result<String, AppError> {
        let mut request_messages = Vec::with_capacity(messages.len());
        for (idx, message) in messages.iter().enumerate() {
            if idx % 2 == 0 {
                request_messages.push(ChatCompletionRequestUserMessage::from(message.as_str()).into());
            } else {
                request_messages
                    .push(ChatCompletionRequestAssistantMessage::from(message.as_str()).into());
            }
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(request_messages)
            .build()
            .map_err(AppError::OpenAi)?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::Lm("no content found in LM response".to_string()))
    }
}
