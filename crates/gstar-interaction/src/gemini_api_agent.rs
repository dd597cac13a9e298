//! GeminiApiAgent - REST client for the Gemini `generateContent` endpoint.
//!
//! One instance talks to one model. The bootstrap builds a text instance
//! for story and keyword prompts and an image instance (with a request
//! timeout) for backgrounds.

use crate::agent::{Agent, ImageAgent};
use crate::error::AgentError;
use async_trait::async_trait;
use gstar_core::config::GeminiSettings;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Agent implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiApiAgent {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    /// Text agent for `settings.model`. Text calls have no timeout.
    pub fn text_from_settings(settings: &GeminiSettings) -> Self {
        Self::new(&settings.api_key, &settings.model, &settings.base_url)
    }

    /// Image agent for `settings.image_model`, bounded by
    /// `settings.image_timeout_secs`.
    pub fn image_from_settings(settings: &GeminiSettings) -> Result<Self, AgentError> {
        Self::new(&settings.api_key, &settings.image_model, &settings.base_url)
            .with_timeout(Duration::from_secs(settings.image_timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, AgentError> {
        self.client = Client::builder().timeout(timeout).build().map_err(|err| {
            AgentError::ExecutionFailed(format!("Failed to build HTTP client: {err}"))
        })?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn text_request(prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: None,
        }
    }

    async fn send_request(
        &self,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AgentError> {
        let url = format!(
            "{base}/{model}:generateContent",
            base = self.base_url.trim_end_matches('/'),
            model = self.model,
        );

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|err| AgentError::ProcessError {
                status_code: None,
                message: if err.is_timeout() {
                    format!("Gemini API request to {} timed out", self.model)
                } else {
                    format!("Gemini API request failed: {err}")
                },
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        response
            .json()
            .await
            .map_err(|err| AgentError::parse(format!("Failed to parse Gemini response: {err}")))
    }
}

#[async_trait]
impl Agent for GeminiApiAgent {
    fn expertise(&self) -> &str {
        "Gemini API agent for story generation"
    }

    async fn execute(&self, prompt: &str) -> Result<String, AgentError> {
        tracing::debug!(model = %self.model, "Sending text prompt ({} chars)", prompt.len());
        let response = self.send_request(&Self::text_request(prompt)).await?;
        extract_text_response(response)
    }
}

#[async_trait]
impl ImageAgent for GeminiApiAgent {
    async fn generate_image(&self, prompt: &str) -> Result<String, AgentError> {
        let mut request = Self::text_request(prompt);
        request.generation_config = Some(GenerationConfig {
            response_modalities: vec!["IMAGE".to_string()],
        });

        tracing::debug!(model = %self.model, "Requesting image");
        let response = self.send_request(&request).await.inspect_err(|err| {
            if err.is_auth_failure() {
                tracing::error!("Gemini image authentication failed, check the API key: {err}");
            }
        })?;
        extract_image_response(response)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineDataResponse>,
}

#[derive(Deserialize)]
struct InlineDataResponse {
    data: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn first_parts(response: GenerateContentResponse) -> Option<Vec<PartResponse>> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, AgentError> {
    first_parts(response)
        .and_then(|parts| parts.into_iter().find_map(|part| part.text))
        .map(|text| text.trim().to_string())
        .ok_or_else(|| {
            AgentError::ExecutionFailed(
                "Gemini API returned no text in the response candidates".into(),
            )
        })
}

fn extract_image_response(response: GenerateContentResponse) -> Result<String, AgentError> {
    first_parts(response)
        .and_then(|parts| {
            parts
                .into_iter()
                .find_map(|part| part.inline_data.and_then(|inline| inline.data))
        })
        .ok_or_else(|| {
            AgentError::ExecutionFailed("Gemini API returned no image data".into())
        })
}

fn map_http_error(status: StatusCode, body: String) -> AgentError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    AgentError::ProcessError {
        status_code: Some(status.as_u16()),
        message: format!("Gemini API error (HTTP {}): {message}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_takes_first_text_part() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "  rainy street \n" }] } }]
        }))
        .unwrap();
        assert_eq!(extract_text_response(response).unwrap(), "rainy street");
    }

    #[test]
    fn test_extract_image_skips_text_parts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here is your image" },
                { "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } }
            ] } }]
        }))
        .unwrap();
        assert_eq!(extract_image_response(response).unwrap(), "aGVsbG8=");
    }

    #[test]
    fn test_missing_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(
            extract_image_response(response),
            Err(AgentError::ExecutionFailed(_))
        ));
    }

    #[test]
    fn test_map_http_error_reads_error_body() {
        let body = r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#;
        let err = map_http_error(StatusCode::FORBIDDEN, body.to_string());
        assert!(err.is_auth_failure());
        assert!(err.to_string().contains("PERMISSION_DENIED: API key not valid"));
    }

    #[test]
    fn test_image_request_shape() {
        let mut request = GeminiApiAgent::text_request("night park");
        request.generation_config = Some(GenerationConfig {
            response_modalities: vec!["IMAGE".to_string()],
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "night park");
        assert_eq!(value["generationConfig"]["responseModalities"][0], "IMAGE");
    }
}
