//! Remote answer generation through a chat-completion API.
//!
//! Every call is a single round trip. There is no retry and no caching; a
//! failed call is reported to the caller as [`GeneratorError`] after being
//! logged.

mod wire;

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use wire::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

/// Returned in place of an answer when no API key is configured.
pub const DISABLED_MESSAGE: &str =
    "AI features are disabled. Please set your OpenAI API key in the .env file.";

/// Value shipped in the sample `.env`; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const ANSWER_INSTRUCTION: &str = "You are a helpful study assistant. Provide concise and accurate answers to academic questions.";
const SUGGEST_INSTRUCTION: &str =
    "You are a helpful study assistant. Generate relevant academic questions.";
const ANSWER_MAX_TOKENS: u32 = 150;
const SUGGEST_MAX_TOKENS: u32 = 200;
const TEMPERATURE: f32 = 0.7;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("completion service returned no content")]
    EmptyResponse,
}

/// Connection settings for the completion service.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Outcome of a successful [`AnswerGenerator::generate_answer`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Generated(String),
    /// No credential configured. Carries [`DISABLED_MESSAGE`] as its text.
    Disabled,
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Generated(text) => text,
            Answer::Disabled => DISABLED_MESSAGE,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Answer::Generated(text) => text,
            Answer::Disabled => DISABLED_MESSAGE.to_string(),
        }
    }
}

pub struct AnswerGenerator {
    http: reqwest::Client,
    api_key: Option<String>,
    completions_url: String,
    model: String,
}

impl AnswerGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        let api_key = config
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY);

        if api_key.is_none() {
            warn!("OpenAI API key not set. AI features will be disabled.");
        } else {
            info!(model = %config.model, "Answer generator enabled");
        }

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            api_key,
            completions_url: format!(
                "{}/v1/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.model,
        })
    }

    /// A generator that never contacts the network.
    pub fn disabled() -> Result<Self, GeneratorError> {
        Self::new(GeneratorConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Ask the service to answer `question`.
    pub async fn generate_answer(&self, question: &str) -> Result<Answer, GeneratorError> {
        let Some(api_key) = &self.api_key else {
            return Ok(Answer::Disabled);
        };

        let messages = vec![
            ChatMessage::system(ANSWER_INSTRUCTION),
            ChatMessage::user(question),
        ];
        match self.complete(api_key, messages, ANSWER_MAX_TOKENS).await {
            Ok(content) => Ok(Answer::Generated(content)),
            Err(e) => {
                warn!("Error generating answer: {}", e);
                Err(e)
            }
        }
    }

    /// Ask the service for study questions about `topic` within `subject`.
    ///
    /// Lines of the reply are trimmed and blank ones dropped. In disabled
    /// mode the single element is [`DISABLED_MESSAGE`].
    pub async fn suggest_questions(
        &self,
        subject: &str,
        topic: &str,
    ) -> Result<Vec<String>, GeneratorError> {
        let Some(api_key) = &self.api_key else {
            return Ok(vec![DISABLED_MESSAGE.to_string()]);
        };

        let prompt = format!(
            "Generate 5 important questions about {} in {}. Format each question on a new line.",
            topic, subject
        );
        let messages = vec![
            ChatMessage::system(SUGGEST_INSTRUCTION),
            ChatMessage::user(&prompt),
        ];
        match self.complete(api_key, messages, SUGGEST_MAX_TOKENS).await {
            Ok(content) => Ok(split_lines(&content)),
            Err(e) => {
                warn!("Error suggesting questions: {}", e);
                Err(e)
            }
        }
    }

    async fn complete(
        &self,
        api_key: &str,
        messages: Vec<ChatMessage<'_>>,
        max_tokens: u32,
    ) -> Result<String, GeneratorError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature: TEMPERATURE,
        };
        debug!(url = %self.completions_url, max_tokens, "Sending chat completion request");

        let response = self
            .http
            .post(&self.completions_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Status { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .into_content()
            .filter(|content| !content.trim().is_empty())
            .ok_or(GeneratorError::EmptyResponse)
    }
}

fn split_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
