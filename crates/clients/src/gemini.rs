//! Generative extraction over the Gemini `generateContent` API.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tally_core::ingest::{ExtractError, ExtractionInput, ExtractionRequest, Extractor, extraction_prompt};
use tracing::debug;

use crate::error::extract_transport;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Extraction service backed by a Gemini model.
#[derive(Debug, Clone)]
pub struct GeminiExtractor {
    client: Client,
    api_base_url: String,
    api_key: String,
    model: String,
}

impl GeminiExtractor {
    /// Creates an extractor for `model` at `api_base_url`.
    #[must_use]
    pub fn new(client: Client, api_base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

/// Request body: instructions first, then the content to read.
pub(crate) fn request_body(request: &ExtractionRequest) -> Value {
    let prompt = extraction_prompt(&request.categories, request.reference_time);
    let content = match &request.input {
        ExtractionInput::Text(text) => json!({ "text": text }),
        ExtractionInput::Image { mime_type, data } => json!({
            "inline_data": { "mime_type": mime_type, "data": STANDARD.encode(data) }
        }),
    };

    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }, content] }],
        "generationConfig": { "temperature": 0, "responseMimeType": "application/json" }
    })
}

fn reply_text(response: GenerateResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

#[async_trait]
impl Extractor for GeminiExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ExtractError> {
        let url = format!("{}/models/{}:generateContent", self.api_base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()
            .await
            .map_err(|e| extract_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Service(format!("{status}: {body}")));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Service(format!("undecodable reply: {e}")))?;
        let text = reply_text(body).ok_or(ExtractError::EmptyResponse)?;
        debug!(model = %self.model, chars = text.len(), "Extraction reply received");
        Ok(text)
    }
}
