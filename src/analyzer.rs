//! The external vision collaborator. A decoded canvas snapshot goes out to a
//! multimodal model along with any variables already assigned on the canvas;
//! whatever structured items the model emits come back verbatim.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::canvas::CanvasImage;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const ANALYSIS_PROMPT: &str = "You are given an image containing handwritten \
mathematical expressions, equations, or graphical math problems. Solve what you \
see. Use PEMDAS order of operations. Answer with a JSON array only, no prose and \
no markdown: each element is an object with an \"expr\" key holding the \
expression you read, a \"result\" key holding its value, and, when the \
expression assigns a variable, an \"assign\" key set to true.";

/// One interpreted expression as emitted by the model. The shape is the
/// model's business; it passes through this service untouched.
pub type ResultItem = Value;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("image analysis is not configured on this deployment")]
    Disabled,

    #[error("model request failed: {0}")]
    Transport(reqwest::Error),

    #[error("model returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("model output was unusable: {0}")]
    BadOutput(String),
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(err: reqwest::Error) -> Self {
        // request errors print their URL, and ours carries the credential
        AnalyzerError::Transport(err.without_url())
    }
}

/// The analysis collaborator as seen by the HTTP layer. One call per request,
/// no retries; a model that has nothing to say yields an empty sequence.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        image: &CanvasImage,
        variables: &HashMap<String, Value>,
    ) -> Result<Vec<ResultItem>, AnalyzerError>;
}

/// Gemini `generateContent` client
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiAnalyzer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Analyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        image: &CanvasImage,
        variables: &HashMap<String, Value>,
    ) -> Result<Vec<ResultItem>, AnalyzerError> {
        let body = json!({
            "contents": [{ "parts": [
                { "text": build_prompt(variables) },
                { "inlineData": {
                    "mimeType": image.mime_type(),
                    "data": general_purpose::STANDARD.encode(image.as_bytes()),
                }}
            ]}]
        });

        debug!(model = %self.model, "sending canvas snapshot for analysis");

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent?key={}",
                self.base_url, self.model, self.api_key
            ))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("model returned {status}: {body}");
            return Err(AnalyzerError::Status(status));
        }

        let response: Value = response.json().await?;
        normalize_output(&response)
    }
}

/// Stand-in installed when no model credential is configured. Keeps the
/// process serving its health routes while `/calculate` reports a server
/// error on every call.
pub struct DisabledAnalyzer;

#[async_trait]
impl Analyzer for DisabledAnalyzer {
    async fn analyze(
        &self,
        _image: &CanvasImage,
        _variables: &HashMap<String, Value>,
    ) -> Result<Vec<ResultItem>, AnalyzerError> {
        Err(AnalyzerError::Disabled)
    }
}

fn build_prompt(variables: &HashMap<String, Value>) -> String {
    let mut prompt = ANALYSIS_PROMPT.to_string();
    if !variables.is_empty() {
        let rendered = serde_json::to_string(variables).unwrap_or_else(|_| "{}".to_string());
        prompt.push_str(
            "\nThe following variables already hold values from earlier \
             expressions on the canvas: ",
        );
        prompt.push_str(&rendered);
        prompt.push_str(". Substitute these values wherever the expressions reference them.");
    }
    prompt
}

/// Pull the model's text out of a `generateContent` response and normalize it
/// into an ordered sequence of result items. A response with no text at all is
/// an empty sequence, never an error; text that is present but not JSON is.
fn normalize_output(response: &Value) -> Result<Vec<ResultItem>, AnalyzerError> {
    let text = match response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
    {
        Some(text) => text,
        None => {
            debug!("model response carried no text part");
            return Ok(Vec::new());
        }
    };

    let text = strip_code_fence(text);
    if text.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(Value::Null) => Ok(Vec::new()),
        Ok(single) => Ok(vec![single]),
        Err(err) => Err(AnalyzerError::BadOutput(err.to_string())),
    }
}

/// Models wrap JSON in markdown fences more often than not
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}
