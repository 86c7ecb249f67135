pub mod groq;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;
use super::LlmConfig;
use self::groq::GroqChatClient;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<PromptMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionResponse {
    /// `choices[0].message.content`, if the provider sent one.
    pub content: Option<String>,
}

/// Failures of a single completion call, classified by what the caller can act on.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider rejected the credentials")]
    Unauthorized,
    #[error("provider rate limit exceeded")]
    RateLimited,
    #[error("provider returned HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider response could not be decoded: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => ProviderError::Unauthorized,
            429 => ProviderError::RateLimited,
            _ => ProviderError::Status { status, body },
        }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest
    ) -> Result<CompletionResponse, ProviderError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let specific_client = GroqChatClient::from_config(config)?;
    Ok(Arc::new(specific_client))
}
