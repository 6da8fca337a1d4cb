use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

use crate::project::Role;

/// One prior turn of the conversation as the provider sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

/// Binary part sent alongside the new user turn. `data` is raw base64,
/// without the data-URI prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub data: String,
    pub mime_type: String,
}

/// Everything a completion call needs except the credential, which is passed
/// separately so it never ends up in request logs.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub model: String,
    pub system_instruction: String,
    pub history: Vec<ChatTurn>,
    pub message: String,
    pub images: Vec<InlineImage>,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Missing API Key. Please add your Gemini API Key in Settings.")]
    MissingApiKey,
    #[error("Invalid API Key. Please check your settings.")]
    InvalidApiKey,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Cumulative text received so far, one item per chunk.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Start a streamed completion. Each item of the returned stream is the
    /// whole response text received so far, not a delta.
    async fn stream_chat(&self, api_key: &str, request: ChatRequest) -> Result<SnapshotStream, LlmError>;
}

/// Fold a stream of text deltas into cumulative snapshots.
pub fn into_snapshots<S>(deltas: S) -> SnapshotStream
where
    S: Stream<Item = Result<String, LlmError>> + Send + 'static,
{
    let stream = deltas.scan(String::new(), |full, delta| {
        let item = delta.map(|text| {
            full.push_str(&text);
            full.clone()
        });
        futures::future::ready(Some(item))
    });
    Box::pin(stream)
}

pub mod file_utils;
pub mod gemini;

#[cfg(test)]
pub mod testing;
