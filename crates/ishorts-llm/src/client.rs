//! OpenAI-compatible chat completions client with structured outputs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use ishorts_models::{Series, VideoScene};

use crate::error::{LlmError, LlmResult};
use crate::generator::ContentGenerator;
use crate::prompts;
use crate::schema::strict_schema;
use crate::types::{PromptGeneration, SceneBreakdown, SceneOutline, ScriptResponse, TitleResponse};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAiConfig {
    /// Load from environment. `OPENAI_API_KEY` is required.
    pub fn from_env() -> LlmResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let defaults = Self::default();
        Ok(Self {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.model),
            timeout: std::env::var("OPENAI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    description: &'a str,
    schema: Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> LlmResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        info!(model = %config.model, base_url = %config.base_url, "Created generation client");
        Ok(Self { config, client })
    }

    pub fn from_env() -> LlmResult<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one user prompt and parse the structured answer as `T`.
    pub async fn structured<T>(&self, name: &str, description: &str, prompt: &str) -> LlmResult<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name,
                    description,
                    schema: strict_schema::<T>(),
                    strict: true,
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, schema = name, "Generation request rejected");
            return Err(LlmError::Api { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::empty("no choices in response"))?;

        let content = choice.message.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(LlmError::empty(format!(
                "empty content, finish reason: {}",
                choice.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        debug!(schema = name, content = %content, "Generation response");

        serde_json::from_str(strip_code_fence(&content)).map_err(|e| {
            LlmError::invalid(format!("failed to parse {} response: {}; raw: {}", name, e, content))
        })
    }
}

/// Remove a surrounding ```json fence if the model added one.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn non_blank(value: String, what: &str) -> LlmResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LlmError::empty(format!("model returned an empty {}", what)));
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl ContentGenerator for OpenAiClient {
    async fn generate_title(
        &self,
        series: &Series,
        existing_titles: &[String],
    ) -> LlmResult<String> {
        let prompt = prompts::title_prompt(series, existing_titles);
        let response: TitleResponse = self
            .structured("video_title", "A unique title for a video in a series", &prompt)
            .await?;
        non_blank(response.title, "title")
    }

    async fn generate_scene_breakdown(
        &self,
        series: &Series,
        title: &str,
    ) -> LlmResult<Vec<SceneOutline>> {
        let prompt = prompts::scene_breakdown_prompt(series, title);
        let response: SceneBreakdown = self
            .structured("scene_breakdown", "Visual scene breakdown of a short video", &prompt)
            .await?;
        if response.scenes.is_empty() {
            return Err(LlmError::empty("model returned no scenes"));
        }
        Ok(response.scenes)
    }

    async fn generate_scene_prompt(
        &self,
        series: &Series,
        style: &str,
        outline: &SceneOutline,
    ) -> LlmResult<String> {
        let prompt = prompts::scene_prompt(series, style, &outline.description);
        let response: PromptGeneration = self
            .structured("scene_prompt", "Text-to-video prompt for one scene", &prompt)
            .await?;
        non_blank(response.prompt, "scene prompt")
    }

    async fn generate_script(
        &self,
        series: &Series,
        title: &str,
        scenes: &[VideoScene],
    ) -> LlmResult<String> {
        let prompt = prompts::script_prompt(series, title, scenes);
        let response: ScriptResponse = self
            .structured("video_script", "Narrator voiceover for a short video", &prompt)
            .await?;
        non_blank(response.script, "script")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_new_rejects_blank_key() {
        let config = OpenAiConfig {
            api_key: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(OpenAiClient::new(config), Err(LlmError::MissingApiKey)));
    }
}
