//! Agent seams used by the story and background generators.

use crate::error::AgentError;
use async_trait::async_trait;

/// A text-in, text-out model.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Short description for logs.
    fn expertise(&self) -> &str;

    async fn execute(&self, prompt: &str) -> Result<String, AgentError>;
}

/// A text-to-image model. Returns the base64 encoded image.
#[async_trait]
pub trait ImageAgent: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<String, AgentError>;
}
