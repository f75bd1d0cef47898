use async_trait::async_trait;
use scholar_http::HttpError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Response blocked: {0}")]
    Blocked(String),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A text generation backend.
///
/// One client is bound to one model; callers that need several models hold
/// several clients.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with an optional system prompt.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse, LlmError>;

    fn model_name(&self) -> &str;
}
