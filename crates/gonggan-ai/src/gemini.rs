//! Gemini provider for text streaming and image generation

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::StreamExt;
use gonggan_models::{ImageData, PNG_MIME};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::aspect_ratio::normalize_aspect_ratio;
use crate::error::{AiError, Result};
use crate::generation::{
    Citation, DEFAULT_IMAGE_MODEL, FragmentStream, ImageGenerator, ImageRequest,
    ResponseFragment, TextGenerator, TextRequest,
};
use crate::http_client::build_http_client;
use crate::prompt::{PromptPart, SYSTEM_INSTRUCTION, build_prompt_parts};
use crate::sse::SseDecoder;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const PROVIDER: &str = "gemini";

const HARM_CATEGORIES: [&str; 5] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_CIVIC_INTEGRITY",
];

/// Gemini client (auth via GEMINI_API_KEY or explicit key)
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: build_http_client(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set custom base URL (for proxies and tests)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    fn text_body(request: &TextRequest) -> Value {
        let parts = build_prompt_parts(request);
        let tools: Vec<Value> = if request.web_search_enabled {
            vec![json!({ "googleSearch": {} })]
        } else {
            Vec::new()
        };

        json!({
            "contents": [{ "role": "user", "parts": parts_to_json(&parts) }],
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "tools": tools,
            "safetySettings": safety_settings(),
            "generationConfig": { "thinkingConfig": { "thinkingBudget": 0 } }
        })
    }

    fn image_body(request: &ImageRequest) -> Value {
        let mut parts: Vec<Value> = request
            .reference_images
            .iter()
            .map(|image| inline_part(&image.mime_type, &image.bytes))
            .collect();
        parts.push(json!({ "text": request.prompt }));

        let ratio = normalize_aspect_ratio(&request.aspect_ratio);
        let mut image_config = json!({ "aspectRatio": ratio });
        if request.model == DEFAULT_IMAGE_MODEL {
            image_config["imageSize"] = json!(request.quality);
        }

        json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "imageConfig": image_config },
            "safetySettings": safety_settings()
        })
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new(std::env::var("GEMINI_API_KEY").ok())
    }
}

impl TextGenerator for GeminiClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn stream_text(&self, request: TextRequest) -> FragmentStream {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let url = format!("{}?alt=sse", self.endpoint(&request.model, "streamGenerateContent"));

        Box::pin(async_stream::stream! {
            let Some(api_key) = api_key else {
                yield Err(AiError::MissingApiKey);
                return;
            };

            let body = Self::text_body(&request);
            debug!(model = %request.model, "Gemini stream request");

            let response = match client
                .post(&url)
                .header(API_KEY_HEADER, api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(AiError::Llm(format!("Request failed: {}", e)));
                    return;
                }
            };

            if !response.status().is_success() {
                yield Err(response_to_error(response).await);
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(AiError::Llm(format!("Stream error: {}", e)));
                        return;
                    }
                };

                for payload in decoder.push(&chunk) {
                    match parse_stream_payload(&payload) {
                        Ok(Some(fragment)) => yield Ok(fragment),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            if let Some(payload) = decoder.finish() {
                match parse_stream_payload(&payload) {
                    Ok(Some(fragment)) => yield Ok(fragment),
                    Ok(None) => {}
                    Err(e) => yield Err(e),
                }
            }
        })
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<Option<ImageData>> {
        let api_key = self.api_key.as_deref().ok_or(AiError::MissingApiKey)?;
        let body = Self::image_body(&request);
        debug!(
            model = %request.model,
            references = request.reference_images.len(),
            "Gemini image request"
        );

        let response = self
            .client
            .post(self.endpoint(&request.model, "generateContent"))
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response).await);
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let inline = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .into_iter()
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data);

        let Some(inline) = inline else {
            warn!(model = %request.model, "Gemini returned no image part");
            return Ok(None);
        };

        let bytes = STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| AiError::InvalidFormat(format!("image payload: {e}")))?;
        let mime_type = inline.mime_type.unwrap_or_else(|| PNG_MIME.to_string());
        Ok(Some(ImageData::new(mime_type, bytes)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Turn one SSE payload into a fragment; payloads without a candidate are skipped.
fn parse_stream_payload(payload: &str) -> Result<Option<ResponseFragment>> {
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }

    let response: GenerateContentResponse = serde_json::from_str(payload)?;
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(None);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    let citations: Vec<Citation> = candidate
        .grounding_metadata
        .map(|m| m.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .map(|chunk| match chunk.web {
            Some(web) => Citation {
                title: web.title,
                url: web.uri,
            },
            None => Citation::default(),
        })
        .collect();

    Ok(Some(ResponseFragment {
        text: text.replace("**", ""),
        citations: (!citations.is_empty()).then_some(citations),
    }))
}

fn parts_to_json(parts: &[PromptPart<'_>]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| match part {
            PromptPart::Text(text) => json!({ "text": text }),
            PromptPart::Inline { mime_type, data } => inline_part(mime_type, data),
        })
        .collect()
}

fn inline_part(mime_type: &str, data: &[u8]) -> Value {
    json!({ "inlineData": { "mimeType": mime_type, "data": STANDARD.encode(data) } })
}

fn safety_settings() -> Vec<Value> {
    HARM_CATEGORIES
        .iter()
        .map(|category| json!({ "category": category, "threshold": "BLOCK_NONE" }))
        .collect()
}

async fn response_to_error(response: Response) -> AiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    // Truncate error body to prevent leaking large or sensitive responses.
    const MAX_ERROR_BODY: usize = 512;
    let message = match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}... [truncated]", &body[..idx]),
        None => body,
    };

    AiError::LlmHttp {
        provider: PROVIDER.to_string(),
        status,
        message,
    }
}
