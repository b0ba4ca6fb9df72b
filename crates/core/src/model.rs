//! Model invocation types and chat-completions wire format.

use serde::{Deserialize, Serialize};

/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// A single-prompt completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Model identifier, e.g. `gpt-4-turbo-preview`.
    pub model: String,
    /// The filled prompt, sent as the only user message.
    pub prompt: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of a `POST /chat/completions` request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub n: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl From<&ModelRequest> for ChatCompletionRequest {
    fn from(request: &ModelRequest) -> Self {
        Self {
            model: request.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            temperature: request.temperature,
            n: 1,
        }
    }
}

/// Text of the first completion, if the response carries one.
pub fn first_completion_text(response: ChatCompletionResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
}
