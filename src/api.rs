use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
   config::CommitConfig,
   error::{CommitGenError, Result},
   types::Provider,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One text-generation call: prompts plus sampling settings
#[derive(Debug, Clone)]
pub struct GenerationRequest {
   pub api_key:           String,
   pub model:             String,
   pub system_prompt:     String,
   pub user_prompt:       String,
   pub max_output_tokens: u32,
   pub temperature:       f32,
}

/// Anything that turns a prompt pair into raw text
pub trait TextGenerator {
   /// Provider the requests go to, used when reporting a rejected key
   fn provider(&self) -> Provider;

   /// Send the request and return the concatenated text of the response
   fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Blocking HTTP client for the hosted generation APIs
pub struct HttpGenerator {
   provider: Provider,
   base_url: String,
   client:   reqwest::blocking::Client,
}

impl HttpGenerator {
   /// Build a client with the timeouts and endpoint from config
   pub fn from_config(config: &CommitConfig) -> Result<Self> {
      let client = reqwest::blocking::Client::builder()
         .timeout(Duration::from_secs(config.request_timeout_secs))
         .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
         .build()?;
      Ok(Self { provider: config.provider, base_url: config.base_url().to_string(), client })
   }

   fn send_anthropic(&self, request: &GenerationRequest) -> Result<String> {
      let body = AnthropicRequest {
         model:       &request.model,
         max_tokens:  request.max_output_tokens,
         temperature: request.temperature,
         system:      &request.system_prompt,
         messages:    vec![AnthropicMessage { role: "user", content: &request.user_prompt }],
      };

      let response = self
         .client
         .post(format!("{}/v1/messages", self.base_url))
         .header("content-type", "application/json")
         .header("x-api-key", &request.api_key)
         .header("anthropic-version", ANTHROPIC_VERSION)
         .json(&body)
         .send()?;

      decode_anthropic(&read_success_body(response)?)
   }

   fn send_openai(&self, request: &GenerationRequest) -> Result<String> {
      let body = OpenAiRequest {
         model:             &request.model,
         instructions:      &request.system_prompt,
         input:             &request.user_prompt,
         max_output_tokens: request.max_output_tokens,
         temperature:       request.temperature,
      };

      let response = self
         .client
         .post(format!("{}/v1/responses", self.base_url))
         .header("content-type", "application/json")
         .header("Authorization", format!("Bearer {}", request.api_key))
         .json(&body)
         .send()?;

      decode_openai(&read_success_body(response)?)
   }
}

impl TextGenerator for HttpGenerator {
   fn provider(&self) -> Provider {
      self.provider
   }

   fn generate(&self, request: &GenerationRequest) -> Result<String> {
      match self.provider {
         Provider::Anthropic => self.send_anthropic(request),
         Provider::OpenAi => self.send_openai(request),
      }
   }
}

/// Return the body of a 2xx response; anything else becomes `ApiError` with
/// the raw body
fn read_success_body(response: reqwest::blocking::Response) -> Result<String> {
   let status = response.status();
   if !status.is_success() {
      let error_text = response
         .text()
         .unwrap_or_else(|_| "Unknown error".to_string());
      return Err(CommitGenError::ApiError { status: status.as_u16(), body: error_text });
   }
   Ok(response.text()?)
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
   role:    &'a str,
   content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
   model:       &'a str,
   max_tokens:  u32,
   temperature: f32,
   system:      &'a str,
   messages:    Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
   content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicBlock {
   Text {
      text: String,
   },
   #[serde(other)]
   Unknown,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
   model:             &'a str,
   instructions:      &'a str,
   input:             &'a str,
   max_output_tokens: u32,
   temperature:       f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
   output: Vec<OpenAiItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAiItem {
   Message {
      #[serde(default)]
      content: Vec<OpenAiPart>,
   },
   #[serde(other)]
   Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAiPart {
   OutputText {
      text: String,
   },
   #[serde(other)]
   Unknown,
}

/// Extract the text of an Anthropic Messages response body
pub fn decode_anthropic(body: &str) -> Result<String> {
   let response: AnthropicResponse = serde_json::from_str(body).map_err(|e| {
      CommitGenError::UnrecognizedResponse { provider: Provider::Anthropic, detail: e.to_string() }
   })?;

   let segments = response.content.into_iter().filter_map(|block| match block {
      AnthropicBlock::Text { text } => Some(text),
      AnthropicBlock::Unknown => None,
   });
   join_segments(segments)
}

/// Extract the text of an OpenAI Responses response body
pub fn decode_openai(body: &str) -> Result<String> {
   let response: OpenAiResponse = serde_json::from_str(body).map_err(|e| {
      CommitGenError::UnrecognizedResponse { provider: Provider::OpenAi, detail: e.to_string() }
   })?;

   let segments = response
      .output
      .into_iter()
      .flat_map(|item| match item {
         OpenAiItem::Message { content } => content,
         OpenAiItem::Unknown => Vec::new(),
      })
      .filter_map(|part| match part {
         OpenAiPart::OutputText { text } => Some(text),
         OpenAiPart::Unknown => None,
      });
   join_segments(segments)
}

fn join_segments(segments: impl Iterator<Item = String>) -> Result<String> {
   let text: String = segments.collect();
   if text.trim().is_empty() {
      return Err(CommitGenError::EmptyResponse);
   }
   Ok(text)
}
