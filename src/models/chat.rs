use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use serde_json::Value;

/// One rendered turn of a conversation, as the browser client keeps it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animate: Option<bool>,
}

/// A history entry sent by the client; every field may be missing.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartialChatMessage {
    pub id: Option<String>,
    pub content: Option<String>,
    pub is_user: Option<bool>,
    pub timestamp: Option<DateTime<Utc>>,
    pub animate: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Accepted in any shape; never forwarded to the provider.
    #[serde(default)]
    pub history: Option<Value>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ChatRequest {
    /// History entries that read as partial chat messages. Anything else is skipped.
    pub fn history_entries(&self) -> Vec<PartialChatMessage> {
        match &self.history {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Declared request-budget record. Nothing enforces it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitData {
    pub count: u32,
    pub reset_time: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AIModel {
    pub id: String,
    pub name: String,
    pub description: String,
}
