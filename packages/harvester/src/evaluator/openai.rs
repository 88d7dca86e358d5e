//! OpenAI-compatible implementation of the evaluator transport.
//!
//! A reference implementation speaking the chat-completions JSON API.
//! Works against any compatible endpoint via `with_base_url`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};
use crate::evaluator::prompts;
use crate::traits::evaluator::{EvaluatorTransport, ReviewReply, ScreenReply, TriageReply};
use crate::types::conversation::Conversation;

/// Evaluator transport backed by an OpenAI-compatible chat endpoint.
#[derive(Clone)]
pub struct OpenAiTransport {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiTransport {
    /// Create a transport with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> EvalResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| EvalError::Config("OPENAI_API_KEY not set".to_string()))?;
        Ok(Self::new(api_key))
    }

    /// Set the chat model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Make a chat completion request.
    async fn chat(&self, system: &str, user: &str) -> EvalResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: Some(0.0),
            max_tokens: Some(512),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EvalError::Transport(e.to_string().into()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EvalError::Transport(
                format!("evaluator API error: {}", error_text).into(),
            ));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| EvalError::Malformed(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(EvalError::Empty)
    }
}

#[async_trait]
impl EvaluatorTransport for OpenAiTransport {
    async fn triage_call(
        &self,
        summary: &str,
        criteria: &str,
        conversation: &Conversation,
    ) -> EvalResult<TriageReply> {
        let user = prompts::format_triage_user(criteria, summary, conversation);
        let response = self.chat(prompts::TRIAGE_SYSTEM, &user).await?;
        prompts::parse_triage_reply(&response)
    }

    async fn review_call(
        &self,
        detail: &str,
        criteria: &str,
        conversation: &Conversation,
    ) -> EvalResult<ReviewReply> {
        let user = prompts::format_review_user(criteria, detail, conversation);
        let response = self.chat(prompts::REVIEW_SYSTEM, &user).await?;
        prompts::parse_review_reply(&response)
    }

    async fn screen_call(
        &self,
        summary: &str,
        criteria: &str,
        conversation: &Conversation,
    ) -> EvalResult<ScreenReply> {
        let user = prompts::format_screen_user(criteria, summary, conversation);
        let response = self.chat(prompts::SCREEN_SYSTEM, &user).await?;
        prompts::parse_screen_reply(&response)
    }
}

// Request/Response types

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}
