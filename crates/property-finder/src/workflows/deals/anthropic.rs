use std::time::Instant;

use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::narrative::{GenerationError, NarrativeGenerator};
use crate::config::{HttpConfig, NarrativeConfig};

const MESSAGES_PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Blocking client for the Anthropic Messages API.
pub struct AnthropicClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    pub fn new(config: NarrativeConfig, http: HttpConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(http.timeout).build()?;
        Ok(Self {
            http: client,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            max_tokens: config.max_tokens,
        })
    }
}

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl NarrativeGenerator for AnthropicClient {
    fn explain(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = MessageRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let started = Instant::now();
        let response = self
            .http
            .post(format!("{}{}", self.base_url, MESSAGES_PATH))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .map_err(|err| {
                warn!(error = %err, "narrative request failed");
                GenerationError::from(err)
            })?;

        let status = response.status().as_u16();
        let body = response.text()?;
        debug!(
            status,
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "narrative response received"
        );
        parse_message_response(status, &body)
    }
}

/// Concatenate the text blocks of a Messages API response.
pub fn parse_message_response(status: u16, body: &str) -> Result<String, GenerationError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|err| err.error.message)
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(GenerationError::Upstream { status, message });
    }

    let response: MessageResponse = serde_json::from_str(body)
        .map_err(|err| GenerationError::DataShape(err.to_string()))?;

    let text = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    let text = text.trim();
    if text.is_empty() {
        Err(GenerationError::Empty)
    } else {
        Ok(text.to_string())
    }
}
