//! The downstream generation step and its LLM-backed implementation.

use std::sync::Arc;

use async_trait::async_trait;

use super::context::build_context_message;
use crate::config::LlmConfig;
use crate::llm::accumulator::StreamAccumulator;
use crate::llm::error::LlmError;
use crate::llm::message::Message;
use crate::llm::provider::ProviderAdapter;
use crate::llm::providers::openai::{OpenAiAdapter, OpenAiConfig};
use crate::llm::types::RequestOptions;
use crate::models::{JobSummary, SuggestedQuestion};
use crate::prompts::{RECRUITER_SYSTEM_PROMPT, summary_request};
use crate::tools::{
    GENERATE_SUMMARY, SUGGEST_QUESTION, generate_summary_tool, parse_suggestion, parse_summary,
    suggest_question_tool,
};

/// One earlier request/response pair, replayed as chat history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// The context message that was sent.
    pub prompt: String,
    /// The surfaced question, or a marker when there was none.
    pub reply: String,
}

/// Everything the generator sees for one turn. Built at dispatch, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Rendered recent transcript.
    pub transcript_window: String,
    /// Every question surfaced so far, in asked order.
    pub asked: Vec<String>,
    /// The merged driving-party speech this turn responds to.
    pub new_text: String,
    /// The speech answers the question currently on screen.
    pub is_answer: bool,
    /// Pruned prior exchanges, oldest first.
    pub history: Vec<Exchange>,
    pub driving_label: String,
}

impl GenerationRequest {
    pub fn context_message(&self) -> String {
        build_context_message(
            &self.transcript_window,
            &self.asked,
            &self.new_text,
            self.is_answer,
            &self.driving_label,
        )
    }
}

/// Produces suggestions and summaries. Shared read-only across sessions.
#[async_trait]
pub trait Generator: Send + Sync {
    /// At most one question for this turn. `Ok(None)` means the model chose
    /// not to ask anything.
    async fn suggest_question(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<SuggestedQuestion>, LlmError>;

    /// Structured summary of the whole call.
    async fn summarize(&self, full_transcript: &str) -> Result<Option<JobSummary>, LlmError>;
}

/// [`Generator`] backed by a streaming chat model with tool calls.
pub struct LlmGenerator {
    provider: Arc<dyn ProviderAdapter>,
    options: RequestOptions,
    summary_options: RequestOptions,
}

impl LlmGenerator {
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        options: RequestOptions,
        summary_options: RequestOptions,
    ) -> Self {
        Self {
            provider,
            options,
            summary_options,
        }
    }

    /// Build an OpenAI-compatible generator from configuration.
    pub fn from_config(config: &LlmConfig) -> Self {
        let adapter = OpenAiAdapter::new(
            OpenAiConfig::new(config.api_key.clone(), config.model.clone())
                .with_base_url(config.api_url.clone()),
        );
        let options = RequestOptions::new()
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature);
        let summary_options = RequestOptions::new()
            .with_max_tokens(config.summary_max_tokens)
            .with_temperature(config.temperature)
            .with_forced_tool(GENERATE_SUMMARY);
        Self::new(Arc::new(adapter), options, summary_options)
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn suggest_question(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<SuggestedQuestion>, LlmError> {
        let mut messages = Vec::with_capacity(request.history.len() * 2 + 2);
        messages.push(Message::system(RECRUITER_SYSTEM_PROMPT));
        for exchange in &request.history {
            messages.push(Message::user(exchange.prompt.clone()));
            messages.push(Message::assistant(exchange.reply.clone()));
        }
        messages.push(Message::user(request.context_message()));

        let stream = self
            .provider
            .send(&messages, &self.options, &[suggest_question_tool()])
            .await?;
        let turn = StreamAccumulator::collect(stream).await;
        if let Some(error) = turn.error {
            return Err(LlmError::StreamError(error));
        }

        if turn.tool_calls.len() > 1 {
            tracing::debug!(
                calls = turn.tool_calls.len(),
                "model returned several tool calls, using the first suggestion"
            );
        }
        match turn.first_call(SUGGEST_QUESTION) {
            Some(call) => parse_suggestion(&call.arguments_json).map(Some),
            None => {
                tracing::debug!(text_len = turn.text.len(), "model answered without a question");
                Ok(None)
            }
        }
    }

    async fn summarize(&self, full_transcript: &str) -> Result<Option<JobSummary>, LlmError> {
        let messages = vec![
            Message::system(RECRUITER_SYSTEM_PROMPT),
            Message::user(summary_request(full_transcript)),
        ];
        let stream = self
            .provider
            .send(&messages, &self.summary_options, &[generate_summary_tool()])
            .await?;
        let turn = StreamAccumulator::collect(stream).await;
        if let Some(error) = turn.error {
            return Err(LlmError::StreamError(error));
        }
        turn.first_call(GENERATE_SUMMARY)
            .map(|call| parse_summary(&call.arguments_json))
            .transpose()
    }
}
