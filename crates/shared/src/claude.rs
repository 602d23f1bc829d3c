use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{BriefError, Result};

const SERVICE: &str = "Claude";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const WEB_SEARCH_TOOL: &str = "web_search_20250305";

/// A single-turn prompt for the generation API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    /// Declare the web search tool, capped at this many uses.
    pub web_search_max_uses: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: String, max_tokens: u32) -> Self {
        Self {
            prompt,
            max_tokens,
            web_search_max_uses: None,
        }
    }

    pub fn with_web_search(mut self, max_uses: u32) -> Self {
        self.web_search_max_uses = Some(max_uses);
        self
    }
}

/// Anything that can turn a prompt into text.
#[allow(async_fn_in_trait)]
pub trait LanguageModel {
    /// Returns the concatenated text of every text block in the reply.
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'static str,
    max_uses: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

fn collect_text(blocks: Vec<ContentBlock>) -> String {
    blocks
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect()
}

pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl ClaudeClient {
    pub fn new(api_key: String, model: String, endpoint: String) -> Result<Self> {
        // Search-augmented calls can run well past a minute
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|source| BriefError::Http {
                service: SERVICE,
                source,
            })?;

        Ok(Self {
            client,
            api_key,
            model,
            endpoint,
        })
    }

    fn build_request<'a>(&'a self, request: &'a GenerationRequest) -> ClaudeRequest<'a> {
        let tools = request
            .web_search_max_uses
            .map(|max_uses| Tool {
                kind: WEB_SEARCH_TOOL,
                name: "web_search",
                max_uses,
            })
            .into_iter()
            .collect();

        ClaudeRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            tools,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        }
    }
}

impl LanguageModel for ClaudeClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.model, max_tokens = request.max_tokens))]
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let body = self.build_request(&request);
        let http_error = |source| BriefError::Http {
            service: SERVICE,
            source,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(BriefError::upstream(SERVICE, status.as_u16(), &error_text));
        }

        let claude_response = response
            .json::<ClaudeResponse>()
            .await
            .map_err(http_error)?;

        let text = collect_text(claude_response.content);
        debug!(chars = text.len(), "generation complete");
        Ok(text)
    }
}
