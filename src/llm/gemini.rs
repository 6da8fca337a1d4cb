use super::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiBlob,
    },
    // Anything else the model may emit (thoughts, function calls) is ignored.
    Other(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

/// Append `parts` as a turn for `role`. Gemini wants user and model turns to
/// alternate, so consecutive turns with the same role share one content.
fn push_turn(contents: &mut Vec<GeminiContent>, role: &str, parts: Vec<GeminiPart>) {
    if let Some(last) = contents.last_mut() {
        if last.role.as_deref() == Some(role) {
            last.parts.extend(parts);
            return;
        }
    }
    contents.push(GeminiContent {
        role: Some(role.to_string()),
        parts,
    });
}

impl GeminiRequest {
    fn from_chat(request: ChatRequest) -> Self {
        let mut contents: Vec<GeminiContent> = Vec::new();
        for turn in request.history {
            push_turn(&mut contents, role_name(turn.role), vec![GeminiPart::Text { text: turn.text }]);
        }

        // Images lead, the typed text follows.
        let mut parts: Vec<GeminiPart> = request
            .images
            .into_iter()
            .map(|image| GeminiPart::InlineData {
                inline_data: GeminiBlob {
                    mime_type: image.mime_type,
                    data: image.data,
                },
            })
            .collect();
        parts.push(GeminiPart::Text { text: request.message });
        push_turn(&mut contents, role_name(Role::User), parts);

        let system_instruction = if request.system_instruction.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart::Text { text: request.system_instruction }],
            })
        };

        Self {
            system_instruction,
            contents,
        }
    }
}

/// Splits a byte stream into SSE `data:` payloads. Lines may straddle chunk
/// boundaries, so incomplete tails stay buffered until the next push.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);
            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
        }

        payloads
    }
}

/// Text carried by one streamed `GenerateContentResponse`.
fn parse_payload(payload: &str) -> Result<String, LlmError> {
    if let Ok(envelope) = serde_json::from_str::<GeminiErrorEnvelope>(payload) {
        return Err(classify_error(&envelope.error.message));
    }

    let response: GeminiResponse = serde_json::from_str(payload)
        .map_err(|e| LlmError::InvalidResponse(format!("{}: {}", e, payload)))?;

    let mut text = String::new();
    if let Some(content) = response.candidates.first().and_then(|c| c.content.as_ref()) {
        for part in &content.parts {
            if let GeminiPart::Text { text: chunk } = part {
                text.push_str(chunk);
            }
        }
    }
    Ok(text)
}

fn classify_error(message: &str) -> LlmError {
    if message.contains("API key") {
        LlmError::InvalidApiKey
    } else {
        LlmError::Api(message.to_string())
    }
}

pub struct GeminiClient {
    client: Client,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent",
            self.endpoint.trim_end_matches('/'),
            model.trim()
        )
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl ChatClient for GeminiClient {
    async fn stream_chat(&self, api_key: &str, request: ChatRequest) -> Result<SnapshotStream, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let url = self.stream_url(&request.model);
        let body = GeminiRequest::from_chat(request);
        debug!(
            "📤 Gemini request: {} turns, {} parts in new turn",
            body.contents.len(),
            body.contents.last().map(|c| c.parts.len()).unwrap_or(0)
        );

        let response = self
            .client
            .post(&url)
            .query(&[("alt", "sse"), ("key", api_key.trim())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, error_text);
            let message = serde_json::from_str::<GeminiErrorEnvelope>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(match classify_error(&message) {
                LlmError::Api(message) => LlmError::Api(format!("Gemini API error ({}): {}", status, message)),
                other => other,
            });
        }

        let deltas = response
            .bytes_stream()
            .scan(SseDecoder::default(), |decoder, chunk| {
                let item = chunk.map_err(LlmError::Http).and_then(|bytes| {
                    decoder
                        .push(&bytes)
                        .iter()
                        .map(|payload| parse_payload(payload))
                        .collect::<Result<String, LlmError>>()
                });
                futures::future::ready(Some(item))
            })
            .filter(|item| futures::future::ready(!matches!(item, Ok(text) if text.is_empty())));

        Ok(into_snapshots(deltas))
    }
}
