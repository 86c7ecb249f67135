use crate::cli::Args;
use crate::config::prompt::persona_messages;
use crate::llm::LlmConfig;
use crate::llm::chat::{ ChatClient, CompletionRequest, ProviderError, new_client as new_chat_client };
use crate::models::chat::{ AIModel, ChatRequest, ChatResponse };
use crate::utils::{ is_blank, sanitize_text, truncate };

use axum::http::StatusCode;
use log::{ debug, error, info, warn };
use serde_json::Value;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

const TEMPERATURE: f32 = 0.8;
const MAX_TOKENS: u32 = 8192;
const LOG_PREVIEW_LEN: usize = 80;

const KNOWN_MODELS: [(&str, &str, &str); 4] = [
    ("llama-3.1-70b-versatile", "Llama 3.1 70B", "Big brain mode, best for deep dives"),
    ("llama-3.1-8b-instant", "Llama 3.1 8B", "Lightning fast for quick questions"),
    ("mixtral-8x7b-32768", "Mixtral 8x7B", "Long context, handles big pastes"),
    ("gemma2-9b-it", "Gemma 2 9B", "Compact and chill all-rounder"),
];

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no provider credential configured")]
    ConfigurationMissing,
    #[error("message is empty")]
    InvalidInput,
    #[error("request body is not a valid chat request: {0}")]
    MalformedBody(String),
    #[error("provider authentication failed")]
    UpstreamAuthFailure,
    #[error("provider rate limited the request")]
    UpstreamRateLimited,
    #[error("provider returned no content")]
    UpstreamEmptyResponse,
    #[error("provider call failed: {0}")]
    UpstreamUnknownFailure(String),
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::ConfigurationMissing => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::InvalidInput => StatusCode::BAD_REQUEST,
            ChatError::UpstreamAuthFailure => StatusCode::UNAUTHORIZED,
            ChatError::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            ChatError::MalformedBody(_)
            | ChatError::UpstreamEmptyResponse
            | ChatError::UpstreamUnknownFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the person chatting.
    pub fn user_message(&self) -> &'static str {
        match self {
            ChatError::ConfigurationMissing =>
                "AI service is currently unavailable. Please check environment configuration.",
            ChatError::InvalidInput => "Bruh, you gotta actually say something! 💫",
            ChatError::UpstreamAuthFailure => "API authentication failed. Please check your API key.",
            ChatError::UpstreamRateLimited => "Hold up Bruh, too many requests! Slow down a bit ⏰",
            ChatError::UpstreamEmptyResponse => "Oops, something went wrong on my end! Try again? 🙏",
            ChatError::MalformedBody(_) | ChatError::UpstreamUnknownFailure(_) =>
                "Something went sideways on my end. Mind trying that again? 😅",
        }
    }
}

impl From<ProviderError> for ChatError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unauthorized => ChatError::UpstreamAuthFailure,
            ProviderError::RateLimited => ChatError::UpstreamRateLimited,
            other @ (ProviderError::Status { .. }
            | ProviderError::Transport(_)
            | ProviderError::Decode(_)) => ChatError::UpstreamUnknownFailure(other.to_string()),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn optional_string(value: Option<Value>, field: &str) -> Result<Option<String>, ChatError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) =>
            Err(
                ChatError::MalformedBody(
                    format!("`{}` must be a string, got {}", field, json_kind(&other))
                )
            ),
    }
}

/// Reads a chat request the way a destructuring client would: any JSON value except
/// `null` is accepted, and values without a `message` field come out empty.
fn parse_request(body: &[u8]) -> Result<ChatRequest, ChatError> {
    let value: Value = serde_json
        ::from_slice(body)
        .map_err(|e| ChatError::MalformedBody(e.to_string()))?;

    let mut fields = match value {
        Value::Object(fields) => fields,
        Value::Null => {
            return Err(ChatError::MalformedBody("body is null".to_string()));
        }
        _ => {
            return Ok(ChatRequest::default());
        }
    };

    let message = optional_string(fields.remove("message"), "message")?;
    if message.as_deref().map_or(true, is_blank) {
        return Ok(ChatRequest::default());
    }

    Ok(ChatRequest {
        message,
        model: optional_string(fields.remove("model"), "model")?,
        history: fields.remove("history"),
    })
}

#[derive(Clone)]
pub struct ChatAgent {
    chat_client: Option<Arc<dyn ChatClient>>,
    default_model: String,
}

impl ChatAgent {
    pub fn new(chat_client: Option<Arc<dyn ChatClient>>, default_model: String) -> Self {
        Self { chat_client, default_model }
    }

    pub fn from_args(args: &Args) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_client = match args.api_key() {
            Some(api_key) => {
                let chat_config = LlmConfig {
                    api_key: Some(api_key),
                    completion_model: Some(args.chat_model.clone()),
                    base_url: args.chat_base_url.clone(),
                };
                let client = new_chat_client(&chat_config)?;
                info!(
                    "Chat client configured: Model={}, BaseURL={:?}",
                    client.get_model(),
                    client.get_base_url().as_deref().unwrap_or("adapter default")
                );
                Some(client)
            }
            None => {
                warn!("GROQ_API_KEY is not set. Chat requests will be answered with 503.");
                None
            }
        };

        Ok(Self::new(chat_client, args.chat_model.clone()))
    }

    pub fn is_configured(&self) -> bool {
        self.chat_client.is_some()
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Models offered to the client, default first.
    pub fn available_models(&self) -> Vec<AIModel> {
        let mut models: Vec<AIModel> = KNOWN_MODELS.iter()
            .map(|(id, name, description)| AIModel {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
            })
            .collect();

        match models.iter().position(|m| m.id == self.default_model) {
            Some(idx) => {
                let default = models.remove(idx);
                models.insert(0, default);
            }
            None => {
                models.insert(0, AIModel {
                    id: self.default_model.clone(),
                    name: self.default_model.clone(),
                    description: "Configured default".to_string(),
                });
            }
        }
        models
    }

    /// Handles a raw request body. The credential is checked before the body is parsed.
    pub async fn respond(&self, body: &[u8]) -> Result<ChatResponse, ChatError> {
        let client = self.client()?;
        let request = parse_request(body)?;
        self.complete_with(client, request).await
    }

    pub async fn process_message(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let client = self.client()?;
        self.complete_with(client, request).await
    }

    fn client(&self) -> Result<&Arc<dyn ChatClient>, ChatError> {
        self.chat_client.as_ref().ok_or(ChatError::ConfigurationMissing)
    }

    async fn complete_with(
        &self,
        client: &Arc<dyn ChatClient>,
        request: ChatRequest
    ) -> Result<ChatResponse, ChatError> {
        let message = match &request.message {
            Some(m) if !is_blank(m) => m.clone(),
            _ => {
                return Err(ChatError::InvalidInput);
            }
        };
        if request.history.is_some() {
            debug!("Ignoring {} readable history entries", request.history_entries().len());
        }
        // A null model means "use the default" rather than an upstream failure.
        let model = request.model.unwrap_or_else(|| self.default_model.clone());

        info!(
            "Chat request: model={}, message=\"{}\"",
            model,
            truncate(&sanitize_text(&message), LOG_PREVIEW_LEN)
        );

        let completion = CompletionRequest {
            model,
            messages: persona_messages(&message),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = client.complete(&completion).await.map_err(|e| {
            match &e {
                ProviderError::Unauthorized | ProviderError::RateLimited => {
                    warn!("Provider refused request: {}", e);
                }
                _ => error!("Provider call failed: {}", e),
            }
            ChatError::from(e)
        })?;

        match response.content {
            Some(content) if !content.is_empty() => Ok(ChatResponse { response: content }),
            _ => {
                error!("Provider returned an empty completion for model {}", completion.model);
                Err(ChatError::UpstreamEmptyResponse)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::{ CompletionResponse, Role };
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Reply = Box<dyn Fn() -> Result<CompletionResponse, ProviderError> + Send + Sync>;

    struct FakeChatClient {
        reply: Reply,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl FakeChatClient {
        fn new(reply: impl Fn() -> Result<CompletionResponse, ProviderError> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self { reply: Box::new(reply), seen: Mutex::new(Vec::new()) })
        }

        fn content(text: &'static str) -> Arc<Self> {
            Self::new(move || Ok(CompletionResponse { content: Some(text.to_string()) }))
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatClient for FakeChatClient {
        async fn complete(
            &self,
            request: &CompletionRequest
        ) -> Result<CompletionResponse, ProviderError> {
            self.seen.lock().unwrap().push(request.clone());
            (self.reply)()
        }

        fn get_model(&self) -> String {
            "fake-model".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    fn agent_with(client: Arc<FakeChatClient>) -> ChatAgent {
        ChatAgent::new(Some(client as Arc<dyn ChatClient>), "llama-3.1-70b-versatile".into())
    }

    fn request(message: &str) -> ChatRequest {
        ChatRequest { message: Some(message.into()), ..Default::default() }
    }

    #[tokio::test]
    async fn missing_credential_short_circuits_before_parsing() {
        let agent = ChatAgent::new(None, "llama-3.1-70b-versatile".into());
        assert!(!agent.is_configured());

        let bodies: [&[u8]; 3] = [b"{\"message\":\"hi\"}", b"", b"not json"];
        for body in bodies {
            let err = agent.respond(body).await.unwrap_err();
            assert!(matches!(err, ChatError::ConfigurationMissing));
            assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[tokio::test]
    async fn blank_messages_are_rejected_without_calling_provider() {
        let client = FakeChatClient::content("unused");
        let agent = agent_with(client.clone());

        for message in ["", "   ", "\n\t"] {
            let err = agent.process_message(request(message)).await.unwrap_err();
            assert!(matches!(err, ChatError::InvalidInput));
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
        let err = agent.process_message(ChatRequest::default()).await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidInput));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn forwards_persona_and_fixed_parameters() {
        let client = FakeChatClient::content("X");
        let agent = agent_with(client.clone());

        let reply = agent.process_message(request("  why is the sky blue?")).await.unwrap();
        assert_eq!(reply, ChatResponse { response: "X".into() });

        let sent = client.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].model, "llama-3.1-70b-versatile");
        assert_eq!(sent[0].temperature, 0.8);
        assert_eq!(sent[0].max_tokens, 8192);
        assert_eq!(sent[0].messages.len(), 2);
        assert_eq!(sent[0].messages[0].role, Role::System);
        assert_eq!(sent[0].messages[1].content, "  why is the sky blue?");
    }

    #[tokio::test]
    async fn request_model_overrides_default() {
        let client = FakeChatClient::content("ok");
        let agent = agent_with(client.clone());

        let mut req = request("hi");
        req.model = Some("gemma2-9b-it".into());
        agent.process_message(req).await.unwrap();
        assert_eq!(client.requests()[0].model, "gemma2-9b-it");
    }

    #[tokio::test]
    async fn provider_failures_map_to_taxonomy() {
        let cases: Vec<(Arc<FakeChatClient>, StatusCode)> = vec![
            (FakeChatClient::new(|| Err(ProviderError::Unauthorized)), StatusCode::UNAUTHORIZED),
            (FakeChatClient::new(|| Err(ProviderError::RateLimited)), StatusCode::TOO_MANY_REQUESTS),
            (
                FakeChatClient::new(|| Err(ProviderError::Status { status: 503, body: "down".into() })),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                FakeChatClient::new(|| Err(ProviderError::Transport("reset".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (client, expected) in cases {
            let err = agent_with(client).process_message(request("hi")).await.unwrap_err();
            assert_eq!(err.status(), expected);
        }
    }

    #[tokio::test]
    async fn empty_completion_is_an_internal_error() {
        for content in [None, Some(String::new())] {
            let client = FakeChatClient::new(move || Ok(CompletionResponse { content: content.clone() }));
            let err = agent_with(client).process_message(request("hi")).await.unwrap_err();
            assert!(matches!(err, ChatError::UpstreamEmptyResponse));
            assert_eq!(err.user_message(), "Oops, something went wrong on my end! Try again? 🙏");
        }
    }

    #[tokio::test]
    async fn malformed_body_gets_generic_message() {
        let agent = agent_with(FakeChatClient::content("unused"));
        let err = agent.respond(b"{\"message\": 12}").await.unwrap_err();
        assert!(matches!(err, ChatError::MalformedBody(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Something went sideways on my end. Mind trying that again? 😅");
    }

    #[tokio::test]
    async fn history_in_any_shape_does_not_block_the_message() {
        let client = FakeChatClient::content("still here");
        let agent = agent_with(client.clone());

        let bodies: [&[u8]; 4] = [
            br#"{"message":"hi","history":[{"timestamp":1700000000000}]}"#,
            br#"{"message":"hi","history":[{"id":7}]}"#,
            br#"{"message":"hi","history":"x"}"#,
            br#"{"message":"hi","history":[{"content":"earlier","isUser":true}]}"#,
        ];
        for body in bodies {
            let reply = agent.respond(body).await.unwrap();
            assert_eq!(reply.response, "still here");
        }
        assert_eq!(client.requests().len(), 4);
        assert!(client.requests().iter().all(|r| r.messages.len() == 2));
    }

    #[tokio::test]
    async fn non_object_bodies_follow_destructuring_rules() {
        let agent = agent_with(FakeChatClient::content("unused"));

        let empty_bodies: [&[u8]; 5] = [br#""hi""#, b"123", b"true", b"[]", br#"["hi"]"#];
        for body in empty_bodies {
            let err = agent.respond(body).await.unwrap_err();
            assert!(matches!(err, ChatError::InvalidInput), "body {:?}", String::from_utf8_lossy(body));
        }

        let broken_bodies: [&[u8]; 5] = [
            b"null",
            br#"{"message":12}"#,
            br#"{"message":true}"#,
            br#"{"message":"hi","model":5}"#,
            br#"{"message":"hi","model":["x"]}"#,
        ];
        for body in broken_bodies {
            let err = agent.respond(body).await.unwrap_err();
            assert!(matches!(err, ChatError::MalformedBody(_)), "body {:?}", String::from_utf8_lossy(body));
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[tokio::test]
    async fn blank_message_wins_over_bad_model() {
        let agent = agent_with(FakeChatClient::content("unused"));
        let err = agent.respond(br#"{"message":"  ","model":5}"#).await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidInput));
    }

    #[tokio::test]
    async fn null_model_uses_default() {
        let client = FakeChatClient::content("ok");
        let agent = agent_with(client.clone());
        agent.respond(br#"{"message":"hi","model":null}"#).await.unwrap();
        assert_eq!(client.requests()[0].model, "llama-3.1-70b-versatile");
    }

    #[tokio::test]
    async fn repeated_requests_are_independent() {
        let client = FakeChatClient::content("same");
        let agent = agent_with(client.clone());

        let first = agent.respond(b"{\"message\":\"ping\"}").await.unwrap();
        let second = agent.respond(b"{\"message\":\"ping\"}").await.unwrap();
        assert_eq!(first, second);

        let sent = client.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }

    #[test]
    fn default_model_leads_the_catalogue() {
        let agent = ChatAgent::new(None, "gemma2-9b-it".into());
        let models = agent.available_models();
        assert_eq!(models[0].id, "gemma2-9b-it");
        assert_eq!(models.len(), KNOWN_MODELS.len());

        let agent = ChatAgent::new(None, "custom-model".into());
        let models = agent.available_models();
        assert_eq!(models[0].id, "custom-model");
        assert_eq!(models.len(), KNOWN_MODELS.len() + 1);
    }
}
