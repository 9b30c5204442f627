//! Plan generator client
//!
//! Talks to the Claude messages API to draft and revise training plans.
//! Responses come back as raw text; validation lives in `plan_parser`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const API_VERSION: &str = "2023-06-01";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum LlmError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),
}

impl From<reqwest::Error> for LlmError {
  fn from(e: reqwest::Error) -> Self {
    LlmError::Request(e.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Claude API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ClaudeRequest {
  model: String,
  max_tokens: u32,
  system: String,
  messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
  role: String,
  content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
  content: Vec<ContentBlock>,
  #[serde(default)]
  stop_reason: Option<String>,
  usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
  #[serde(rename = "type")]
  content_type: String,
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
  input_tokens: u32,
  output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorResponse {
  error: ClaudeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Claude Client
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ClaudeClient {
  client: Client,
  api_key: String,
  api_url: String,
  model: String,
  max_tokens: u32,
}

impl ClaudeClient {
  pub fn new(
    api_key: impl Into<String>,
    api_url: impl Into<String>,
    model: impl Into<String>,
    max_tokens: u32,
  ) -> Self {
    Self {
      client: Client::new(),
      api_key: api_key.into(),
      api_url: api_url.into(),
      model: model.into(),
      max_tokens,
    }
  }

  /// Build a client from engine configuration; fails without an API key
  pub fn from_config(config: &EngineConfig) -> Result<Self, LlmError> {
    let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;
    Ok(Self::new(
      api_key,
      config.api_url.clone(),
      config.model.clone(),
      config.max_tokens,
    ))
  }

  /// Call Claude with a system prompt and user message
  pub async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, LlmError> {
    let request = ClaudeRequest {
      model: self.model.clone(),
      max_tokens: self.max_tokens,
      system: system_prompt.to_string(),
      messages: vec![ClaudeMessage {
        role: "user".to_string(),
        content: user_message.to_string(),
      }],
    };

    let response = self
      .client
      .post(&self.api_url)
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", API_VERSION)
      .header("content-type", "application/json")
      .json(&request)
      .send()
      .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      // Try to parse error response
      if let Ok(error_resp) = serde_json::from_str::<ClaudeErrorResponse>(&body) {
        return Err(LlmError::Api(error_resp.error.message));
      }
      return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
    }

    let claude_response: ClaudeResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    tracing::debug!(
      input_tokens = claude_response.usage.input_tokens,
      output_tokens = claude_response.usage.output_tokens,
      stop_reason = ?claude_response.stop_reason,
      "plan generator responded"
    );

    // Extract text from the first text content block
    claude_response
      .content
      .iter()
      .find(|c| c.content_type == "text")
      .and_then(|c| c.text.clone())
      .ok_or_else(|| LlmError::Parse("No text content in response".to_string()))
  }

  /// Draft a complete multi-phase plan from the goal context
  pub async fn generate_plan(&self, context_json: &str) -> Result<String, LlmError> {
    let system_prompt = include_str!("prompts/plan_system.txt");

    let user_message = format!(
      r#"Create a complete training plan for this athlete.

PROGRAM CONTEXT:
{}

Respond with valid JSON matching the OUTPUT FORMAT specified in your instructions."#,
      context_json
    );

    self.complete(system_prompt, &user_message).await
  }

  /// Propose changes to an existing plan from a free-text request
  pub async fn propose_update(
    &self,
    context_json: &str,
    request_text: &str,
  ) -> Result<String, LlmError> {
    let system_prompt = include_str!("prompts/plan_system.txt");

    let user_message = format!(
      r#"The athlete wants to change their current plan.

CURRENT PROGRAM:
{}

REQUEST:
{}

Only include sessions that should be added or changed, keeping the same phase order.
List every change in "changes" and any advice in "recommendations".
Respond with valid JSON matching the OUTPUT FORMAT specified in your instructions."#,
      context_json, request_text
    );

    self.complete(system_prompt, &user_message).await
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  fn client_for(server: &mockito::Server) -> ClaudeClient {
    ClaudeClient::new(
      "test-key",
      format!("{}/v1/messages", server.url()),
      "test-model",
      512,
    )
  }

  #[test]
  fn test_from_config_requires_key() {
    let config = EngineConfig::default();
    assert!(matches!(
      ClaudeClient::from_config(&config),
      Err(LlmError::MissingApiKey)
    ));

    let config = EngineConfig {
      api_key: Some("sk".to_string()),
      ..EngineConfig::default()
    };
    assert!(ClaudeClient::from_config(&config).is_ok());
  }

  #[tokio::test]
  async fn test_generate_plan_returns_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/v1/messages")
      .match_header("x-api-key", "test-key")
      .match_header("anthropic-version", API_VERSION)
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(
        r#"{"content":[{"type":"text","text":"{\"phases\":[]}"}],
            "model":"test-model","stop_reason":"end_turn",
            "usage":{"input_tokens":10,"output_tokens":5}}"#,
      )
      .create_async()
      .await;

    let text = client_for(&server).generate_plan("{}").await.unwrap();
    assert_eq!(text, r#"{"phases":[]}"#);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_api_error_message_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/v1/messages")
      .with_status(529)
      .with_body(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#)
      .create_async()
      .await;

    let err = client_for(&server)
      .propose_update("{}", "more rest")
      .await
      .unwrap_err();
    assert!(matches!(err, LlmError::Api(ref msg) if msg == "Overloaded"));
  }

  #[tokio::test]
  async fn test_missing_text_block_is_parse_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/v1/messages")
      .with_status(200)
      .with_body(r#"{"content":[],"usage":{"input_tokens":1,"output_tokens":0}}"#)
      .create_async()
      .await;

    let err = client_for(&server).generate_plan("{}").await.unwrap_err();
    assert!(matches!(err, LlmError::Parse(_)));
  }

  #[test]
  fn test_error_serializes_tagged() {
    let json = serde_json::to_value(LlmError::Api("boom".to_string())).unwrap();
    assert_eq!(json["type"], "Api");
    assert_eq!(json["message"], "boom");
  }
}
