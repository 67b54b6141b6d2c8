//! Optional AI collaborator. Absent AI means AI-backed tool handlers return
//! `McpError::Unavailable` but the server otherwise continues normally —
//! the corpus's null-object capability-trait convention.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI capability unavailable")]
    Unavailable,
    #[error("AI call failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait AiCapability: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, AiError>;
}

/// Default capability: no AI is configured.
pub struct NullAi;

#[async_trait]
impl AiCapability for NullAi {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, AiError> {
        Err(AiError::Unavailable)
    }
}
