//! Adapter for OpenAI-compatible Chat Completions endpoints.
//!
//! Groq, OpenAI and most hosted inference services accept the same
//! `/v1/chat/completions` body with `stream: true` and answer with
//! `data: {...}` SSE chunks. This adapter turns those chunks into
//! [`LlmEvent`]s.
//!
//! ```rust,no_run
//! use recruiter_copilot::llm::message::Message;
//! use recruiter_copilot::llm::provider::ProviderAdapter;
//! use recruiter_copilot::llm::providers::openai::{OpenAiAdapter, OpenAiConfig};
//! use recruiter_copilot::llm::types::RequestOptions;
//!
//! # async fn example() -> Result<(), recruiter_copilot::llm::error::LlmError> {
//! let config = OpenAiConfig::new("gsk-...", "openai/gpt-oss-120b")
//!     .with_base_url("https://api.groq.com/openai");
//! let adapter = OpenAiAdapter::new(config);
//! let stream = adapter
//!     .send(&[Message::user("Hello")], &RequestOptions::new(), &[])
//!     .await?;
//! # drop(stream);
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use super::sse::SseLineParser;
use crate::llm::error::LlmError;
use crate::llm::events::{FinishReason, LlmEvent};
use crate::llm::message::Message;
use crate::llm::provider::{LlmEventStream, ProviderAdapter, ToolDefinition};
use crate::llm::types::RequestOptions;

// ── Configuration ─────────────────────────────────────────────

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Scheme and host, plus any path prefix before `/v1`.
    pub base_url: String,
    pub model: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com".into(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

// ── Request Builder ───────────────────────────────────────────

/// Build the JSON body for a Chat Completions request.
pub fn build_completions_request(
    model: &str,
    messages: &[Message],
    options: &RequestOptions,
    tools: &[ToolDefinition],
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": model,
        "messages": messages
            .iter()
            .map(|m| serde_json::json!({"role": m.role.to_string(), "content": m.content}))
            .collect::<Vec<_>>(),
        "stream": options.stream,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(max_tokens) = options.max_tokens {
            obj.insert("max_tokens".into(), serde_json::json!(max_tokens));
        }
        if let Some(temperature) = options.temperature {
            obj.insert("temperature".into(), serde_json::json!(temperature));
        }
        if !tools.is_empty() {
            let tools_json: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            obj.insert("tools".into(), serde_json::json!(tools_json));
        }
        if let Some(forced) = &options.tool_choice {
            obj.insert(
                "tool_choice".into(),
                serde_json::json!({"type": "function", "function": {"name": forced}}),
            );
        }
    }

    body
}

// ── Streaming Tool Calls ──────────────────────────────────────

/// Reassembles tool calls that OpenAI streams as indexed fragments.
///
/// The first fragment for an index carries the id and function name;
/// later ones only carry argument text.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    active: BTreeMap<u64, ActiveCall>,
}

#[derive(Debug)]
struct ActiveCall {
    call_id: String,
    function_name: String,
    started: bool,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one `delta.tool_calls[]` entry.
    pub fn process_chunk(
        &mut self,
        index: u64,
        id: Option<&str>,
        function_name: Option<&str>,
        args_fragment: Option<&str>,
    ) -> Vec<LlmEvent> {
        let call = self.active.entry(index).or_insert_with(|| ActiveCall {
            call_id: format!("call_{index}"),
            function_name: String::new(),
            started: false,
        });

        if let Some(id) = id.filter(|s| !s.is_empty()) {
            call.call_id = id.to_string();
        }
        if let Some(name) = function_name.filter(|s| !s.is_empty()) {
            call.function_name = name.to_string();
        }

        let mut events = Vec::new();
        if !call.started {
            call.started = true;
            events.push(LlmEvent::ToolCallStart {
                call_id: call.call_id.clone(),
                function_name: call.function_name.clone(),
            });
        }
        if let Some(args) = args_fragment.filter(|s| !s.is_empty()) {
            events.push(LlmEvent::ToolCallArgsDelta {
                call_id: call.call_id.clone(),
                args_fragment: args.to_string(),
            });
        }
        events
    }

    /// Close every open call, in index order.
    pub fn finish_all(&mut self) -> Vec<LlmEvent> {
        std::mem::take(&mut self.active)
            .into_values()
            .filter(|call| call.started)
            .map(|call| LlmEvent::ToolCallEnd {
                call_id: call.call_id,
            })
            .collect()
    }

    pub fn has_active_calls(&self) -> bool {
        !self.active.is_empty()
    }
}

/// Translate one Chat Completions chunk into events.
///
/// Unparseable chunks yield nothing; providers occasionally interleave
/// keep-alive payloads that are not JSON.
pub fn parse_completions_chunk(data: &str, calls: &mut ToolCallAccumulator) -> Vec<LlmEvent> {
    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(data) else {
        return Vec::new();
    };

    if let Some(message) = parsed
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return vec![LlmEvent::StreamError {
            error: message.to_string(),
        }];
    }

    let mut events = Vec::new();
    let Some(choices) = parsed.get("choices").and_then(|c| c.as_array()) else {
        return events;
    };

    for choice in choices {
        if let Some(delta) = choice.get("delta") {
            if let Some(text) = delta.get("content").and_then(|c| c.as_str())
                && !text.is_empty()
            {
                events.push(LlmEvent::TextDelta {
                    text: text.to_string(),
                });
            }

            for tc in delta
                .get("tool_calls")
                .and_then(|t| t.as_array())
                .into_iter()
                .flatten()
            {
                let index = tc.get("index").and_then(|i| i.as_u64()).unwrap_or(0);
                let function = tc.get("function");
                events.extend(calls.process_chunk(
                    index,
                    tc.get("id").and_then(|i| i.as_str()),
                    function.and_then(|f| f.get("name")).and_then(|n| n.as_str()),
                    function
                        .and_then(|f| f.get("arguments"))
                        .and_then(|a| a.as_str()),
                ));
            }
        }

        if let Some(reason) = choice.get("finish_reason").and_then(|f| f.as_str()) {
            events.extend(calls.finish_all());
            events.push(LlmEvent::StreamEnd {
                finish_reason: FinishReason::from_wire(reason),
            });
        }
    }

    events
}

// ── Adapter ───────────────────────────────────────────────────

/// Streaming client for one OpenAI-compatible endpoint.
pub struct OpenAiAdapter {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiAdapter")
            .field("config", &self.config)
            .finish()
    }
}

impl OpenAiAdapter {
    pub fn new(config: OpenAiConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Share an existing connection pool.
    pub fn with_client(config: OpenAiConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn map_http_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        let message = extract_error_message(body);
        match status.as_u16() {
            401 => LlmError::AuthError(format!("authentication failed: {message}")),
            429 => LlmError::RequestError(format!("rate limited: {message}")),
            code => LlmError::ProviderError(format!("HTTP {code}: {message}")),
        }
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn send(
        &self,
        messages: &[Message],
        options: &RequestOptions,
        tools: &[ToolDefinition],
    ) -> Result<LlmEventStream, LlmError> {
        if self.config.api_key.is_empty() {
            return Err(LlmError::ConfigError("API key is not set".into()));
        }

        let url = self.config.completions_url();
        let body = build_completions_request(&self.config.model, messages, options, tools);
        tracing::debug!(%url, model = %self.config.model, tools = tools.len(), "sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestError(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::map_http_error(status, &text));
        }

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("completion")
            .to_string();

        Ok(Box::pin(create_event_stream(
            response.bytes_stream(),
            request_id,
            self.config.model.clone(),
        )))
    }
}

struct StreamState {
    bytes: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    sse: SseLineParser,
    calls: ToolCallAccumulator,
    queued: VecDeque<LlmEvent>,
    start: Option<LlmEvent>,
    finished: bool,
}

impl StreamState {
    fn absorb(&mut self, data: &str) {
        self.queued.extend(parse_completions_chunk(data, &mut self.calls));
    }
}

fn create_event_stream(
    bytes: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    request_id: String,
    model: String,
) -> impl Stream<Item = LlmEvent> + Send {
    let state = StreamState {
        bytes: Box::pin(bytes),
        sse: SseLineParser::new(),
        calls: ToolCallAccumulator::new(),
        queued: VecDeque::new(),
        start: Some(LlmEvent::StreamStart { request_id, model }),
        finished: false,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        if let Some(start) = state.start.take() {
            return Some((start, state));
        }
        loop {
            if let Some(event) = state.queued.pop_front() {
                return Some((event, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for event in state.sse.push(&chunk) {
                        if !event.is_done() {
                            state.absorb(&event.data);
                        }
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state.queued.push_back(LlmEvent::StreamError {
                        error: format!("stream read error: {e}"),
                    });
                }
                None => {
                    state.finished = true;
                    if let Some(event) = state.sse.flush()
                        && !event.is_done()
                    {
                        state.absorb(&event.data);
                    }
                    let dangling = state.calls.finish_all();
                    state.queued.extend(dangling);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_chunks(chunks: &[&str]) -> Vec<LlmEvent> {
        let mut calls = ToolCallAccumulator::new();
        chunks
            .iter()
            .flat_map(|c| parse_completions_chunk(c, &mut calls))
            .collect()
    }

    // ── Config ────────────────────────────────────────────────

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = OpenAiConfig::new("k", "m").with_base_url("https://api.groq.com/openai/");
        assert_eq!(
            config.completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = OpenAiConfig::new("gsk-secret", "m");
        let shown = format!("{config:?}");
        assert!(!shown.contains("gsk-secret"));
    }

    // ── Request Builder ───────────────────────────────────────

    #[test]
    fn request_carries_messages_and_options() {
        let body = build_completions_request(
            "openai/gpt-oss-120b",
            &[Message::system("rules"), Message::user("hello")],
            &RequestOptions::new().with_max_tokens(1024).with_temperature(0.7),
            &[],
        );
        assert_eq!(body["model"], "openai/gpt-oss-120b");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn request_with_forced_tool() {
        let tool = ToolDefinition::new("generate_summary", "d", serde_json::json!({"type": "object"}));
        let body = build_completions_request(
            "m",
            &[Message::user("x")],
            &RequestOptions::new().with_forced_tool("generate_summary"),
            &[tool],
        );
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "generate_summary");
        assert_eq!(body["tool_choice"]["function"]["name"], "generate_summary");
    }

    // ── Chunk Parsing ─────────────────────────────────────────

    #[test]
    fn text_deltas_and_stop() {
        let events = run_chunks(&[
            r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"index":0,"delta":{"content":"Hi"}}]}"#,
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
        ]);
        assert_eq!(
            events,
            vec![
                LlmEvent::TextDelta { text: "Hi".into() },
                LlmEvent::StreamEnd {
                    finish_reason: FinishReason::Stop
                },
            ]
        );
    }

    #[test]
    fn tool_call_fragments_are_reassembled() {
        let events = run_chunks(&[
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_a","function":{"name":"suggest_question","arguments":""}}]}}]}"#,
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"question\":"}}]}}]}"#,
            r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"Why?\"}"}}]}}]}"#,
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#,
        ]);

        assert!(matches!(
            &events[0],
            LlmEvent::ToolCallStart { call_id, function_name }
                if call_id == "call_a" && function_name == "suggest_question"
        ));
        let args: String = events
            .iter()
            .filter_map(|e| match e {
                LlmEvent::ToolCallArgsDelta { args_fragment, .. } => Some(args_fragment.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(args, r#"{"question":"Why?"}"#);
        assert_eq!(
            &events[events.len() - 2..],
            &[
                LlmEvent::ToolCallEnd {
                    call_id: "call_a".into()
                },
                LlmEvent::StreamEnd {
                    finish_reason: FinishReason::ToolCalls
                },
            ]
        );
    }

    #[test]
    fn missing_call_id_gets_index_placeholder() {
        let mut calls = ToolCallAccumulator::new();
        let events = calls.process_chunk(2, None, Some("f"), None);
        assert_eq!(
            events,
            vec![LlmEvent::ToolCallStart {
                call_id: "call_2".into(),
                function_name: "f".into()
            }]
        );
        assert!(calls.has_active_calls());
        assert_eq!(calls.finish_all().len(), 1);
        assert!(!calls.has_active_calls());
    }

    #[test]
    fn inline_error_payload_becomes_stream_error() {
        let events = run_chunks(&[r#"{"error":{"message":"overloaded"}}"#]);
        assert_eq!(
            events,
            vec![LlmEvent::StreamError {
                error: "overloaded".into()
            }]
        );
    }

    #[test]
    fn garbage_chunk_is_ignored() {
        assert!(run_chunks(&["not json", r#"{"choices":[]}"#]).is_empty());
    }

    // ── HTTP Errors ───────────────────────────────────────────

    #[test]
    fn http_status_mapping() {
        let auth = OpenAiAdapter::map_http_error(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Invalid API Key"}}"#,
        );
        assert!(matches!(auth, LlmError::AuthError(_)));
        assert!(auth.message().contains("Invalid API Key"));

        let limited =
            OpenAiAdapter::map_http_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(limited, LlmError::RequestError(_)));

        let server =
            OpenAiAdapter::map_http_error(reqwest::StatusCode::BAD_GATEWAY, "upstream");
        assert!(matches!(server, LlmError::ProviderError(_)));
        assert!(server.message().contains("502"));
    }
}
