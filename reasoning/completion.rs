use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{sleep, Duration};

/// Errors emitted while calling a completion provider.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Provider failure.
    #[error("provider error: {0}")]
    Provider(String),
}

/// Abstract client for an external LLM completion service.
///
/// Only ever invoked to supply prose (proof sketches, pattern
/// explanations); no control flow depends on its output.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns a completion for the prompt.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Deterministic loopback client for tests and offline operation.
#[derive(Debug, Default)]
pub struct LoopbackCompletionClient;

#[async_trait]
impl CompletionClient for LoopbackCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        sleep(Duration::from_millis(5)).await;
        let head: String = prompt.chars().take(80).collect();
        Ok(format!("[loopback] {head}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loopback_echoes_prompt_head() {
        let client = LoopbackCompletionClient;
        let text = client.complete("sketch a proof").await.unwrap();
        assert!(text.starts_with("[loopback]"));
        assert!(text.contains("sketch a proof"));
    }
}
