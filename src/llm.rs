//! Text generation backend
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint (Ollama,
//! OpenAI, vLLM, ...). Every responder, the router, and the vision detector
//! go through the [`TextGeneration`] seam so tests can swap in a fake.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::{Error, Result};

/// Image attached to a generation request
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Raw encoded image bytes
    pub data: Vec<u8>,
    /// MIME type of `data`
    pub mime_type: String,
}

/// A single-turn generation request
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// User prompt
    pub prompt: String,
    /// Ask the backend to constrain output to a JSON object
    pub json: bool,
    /// Optional image for vision-capable models
    pub image: Option<ImageInput>,
}

impl GenerationRequest {
    /// Plain text request
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Constrain the output to JSON
    #[must_use]
    pub const fn json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Attach an image
    #[must_use]
    pub fn with_image(mut self, data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        self.image = Some(ImageInput {
            data,
            mime_type: mime_type.into(),
        });
        self
    }
}

/// Anything that turns a prompt into text
#[async_trait]
pub trait TextGeneration: Send + Sync {
    /// Generate a completion for `request`
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable or answers with garbage
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Chat completion request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// A message in the request
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: MessageContent<'a>,
}

/// Either a bare string or a list of parts (for images)
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

/// Content part (text or image)
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl LlmClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base URL or model is missing
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::Config("llm base url required".to_string()));
        }
        if config.model.is_empty() {
            return Err(Error::Config("llm model required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key: config.api_key.clone(),
        })
    }

    /// Create with a specific model
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// The model this client talks to
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl TextGeneration for LlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let content = match &request.image {
            Some(image) => MessageContent::Parts(vec![
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: data_uri(image),
                    },
                },
                ContentPart::Text {
                    text: &request.prompt,
                },
            ]),
            None => MessageContent::Text(&request.prompt),
        };

        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            stream: false,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            response_format: request.json.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        tracing::debug!(
            model = %self.model,
            json = request.json,
            image = request.image.is_some(),
            prompt_len = request.prompt.len(),
            "sending completion request"
        );

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "completion request failed");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error {status}: {body}")));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Parse error: {e}")))?;

        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Llm("No response from LLM".to_string()))?;

        tracing::debug!(response_len = text.len(), "completion received");
        Ok(text)
    }
}

/// Encode an image as a `data:` URI
fn data_uri(image: &ImageInput) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(&image.data);
    format!("data:{};base64,{encoded}", normalize_mime_type(&image.mime_type))
}

/// Normalize MIME type for vision endpoints
fn normalize_mime_type(mime_type: &str) -> &'static str {
    match mime_type.to_lowercase().as_str() {
        "image/png" => "image/png",
        "image/gif" => "image/gif",
        "image/webp" => "image/webp",
        // jpeg, jpg, and any unknown type default to jpeg
        _ => "image/jpeg",
    }
}

/// Pull the JSON object out of a model reply
///
/// Small local models like to wrap JSON in prose or markdown fences, so
/// this slices from the first `{` to the last `}`.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
