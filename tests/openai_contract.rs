//! OpenAI-compatible provider contract tests.
//!
//! These tests verify the HTTP request shape and the streaming response
//! handling against a mock server:
//! - Request body carries model, messages, stream flag, tools and tool_choice
//! - Bearer authentication
//! - SSE text and tool-call streams are normalized into `LlmEvent`s
//! - HTTP errors map onto `LlmError` variants

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use futures_util::StreamExt;
use recruiter_copilot::conversation::generator::{GenerationRequest, Generator, LlmGenerator};
use recruiter_copilot::llm::error::LlmError;
use recruiter_copilot::llm::events::{FinishReason, LlmEvent};
use recruiter_copilot::llm::message::Message;
use recruiter_copilot::llm::provider::ProviderAdapter;
use recruiter_copilot::llm::providers::openai::{OpenAiAdapter, OpenAiConfig};
use recruiter_copilot::llm::types::RequestOptions;
use recruiter_copilot::models::QuestionCategory;
use recruiter_copilot::tools::{GENERATE_SUMMARY, generate_summary_tool, suggest_question_tool};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(chunks: &[serde_json::Value]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str("data: ");
        body.push_str(&chunk.to_string());
        body.push_str("\n\n");
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn text_stream(text: &str) -> String {
    sse(&[
        json!({"choices": [{"index": 0, "delta": {"role": "assistant"}, "finish_reason": null}]}),
        json!({"choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]}),
        json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]}),
    ])
}

fn tool_stream(name: &str, arguments: &str) -> String {
    let (head, tail) = arguments.split_at(arguments.len() / 2);
    sse(&[
        json!({"choices": [{"index": 0, "delta": {"tool_calls": [{
            "index": 0, "id": "call_abc", "type": "function",
            "function": {"name": name, "arguments": ""}
        }]}, "finish_reason": null}]}),
        json!({"choices": [{"index": 0, "delta": {"tool_calls": [{
            "index": 0, "function": {"arguments": head}
        }]}, "finish_reason": null}]}),
        json!({"choices": [{"index": 0, "delta": {"tool_calls": [{
            "index": 0, "function": {"arguments": tail}
        }]}, "finish_reason": null}]}),
        json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "tool_calls"}]}),
    ])
}

fn adapter(server: &MockServer) -> OpenAiAdapter {
    OpenAiAdapter::new(OpenAiConfig::new("test-key", "test-model").with_base_url(server.uri()))
}

async fn collect(adapter: &OpenAiAdapter, options: &RequestOptions) -> Vec<LlmEvent> {
    let Ok(stream) = adapter.send(&[Message::user("Hello")], options, &[]).await else {
        unreachable!("request should succeed");
    };
    stream.collect().await
}

// ────────────────────────────────────────────────────────────────────────────
// Request format
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn request_carries_model_messages_and_sampling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [{"role": "user", "content": "Hello"}],
            "stream": true,
            "max_tokens": 256,
            "temperature": 0.2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: [DONE]\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::new()
        .with_max_tokens(256)
        .with_temperature(0.2);
    let events = collect(&adapter(&server), &options).await;
    assert!(matches!(events.first(), Some(LlmEvent::StreamStart { .. })));
}

#[tokio::test]
async fn tools_and_forced_choice_are_serialized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "tools": [{"type": "function", "function": {"name": "generate_summary"}}],
            "tool_choice": {"type": "function", "function": {"name": "generate_summary"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: [DONE]\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::new().with_forced_tool(GENERATE_SUMMARY);
    let result = adapter(&server)
        .send(&[Message::user("Hello")], &options, &[generate_summary_tool()])
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn missing_api_key_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(OpenAiConfig::new("", "m").with_base_url(server.uri()));
    let result = adapter
        .send(&[Message::user("Hello")], &RequestOptions::new(), &[])
        .await;
    assert!(matches!(result, Err(LlmError::ConfigError(_))));
}

// ────────────────────────────────────────────────────────────────────────────
// Streaming responses
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_stream_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(text_stream("Hi there")))
        .mount(&server)
        .await;

    let events = collect(&adapter(&server), &RequestOptions::new()).await;
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            LlmEvent::TextDelta { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "Hi there");
    assert_eq!(
        events.last(),
        Some(&LlmEvent::StreamEnd {
            finish_reason: FinishReason::Stop
        })
    );
}

#[tokio::test]
async fn tool_call_arguments_are_reassembled() {
    let server = MockServer::start().await;
    let arguments = r#"{"role_title":"Backend Engineer","completeness_score":55}"#;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(tool_stream("generate_summary", arguments)),
        )
        .mount(&server)
        .await;

    let events = collect(&adapter(&server), &RequestOptions::new()).await;
    assert!(events.contains(&LlmEvent::ToolCallStart {
        call_id: "call_abc".into(),
        function_name: "generate_summary".into(),
    }));
    let args: String = events
        .iter()
        .filter_map(|e| match e {
            LlmEvent::ToolCallArgsDelta { args_fragment, .. } => Some(args_fragment.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(args, arguments);

    let end = events
        .iter()
        .position(|e| matches!(e, LlmEvent::ToolCallEnd { .. }))
        .unwrap();
    let stream_end = events
        .iter()
        .position(|e| matches!(e, LlmEvent::StreamEnd { .. }))
        .unwrap();
    assert!(end < stream_end);
}

// ────────────────────────────────────────────────────────────────────────────
// Error mapping
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid API Key", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let result = adapter(&server)
        .send(&[Message::user("Hello")], &RequestOptions::new(), &[])
        .await;
    let Err(LlmError::AuthError(message)) = result else {
        unreachable!("expected auth error");
    };
    assert!(message.contains("Invalid API Key"));
}

#[tokio::test]
async fn rate_limit_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let Err(err) = adapter(&server)
        .send(&[Message::user("Hello")], &RequestOptions::new(), &[])
        .await
    else {
        unreachable!("expected rate limit error");
    };
    assert!(matches!(err, LlmError::RequestError(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn server_error_maps_to_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let Err(LlmError::ProviderError(message)) = adapter(&server)
        .send(&[Message::user("Hello")], &RequestOptions::new(), &[])
        .await
    else {
        unreachable!("expected provider error");
    };
    assert!(message.contains("503"));
}

// ────────────────────────────────────────────────────────────────────────────
// Generator over the wire
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn generator_decodes_suggestion_from_wire() {
    let server = MockServer::start().await;
    let arguments = json!({
        "question": "Is this role on-call?",
        "options": [
            {"label": "Yes", "description": "Weekly rotation"},
            {"label": "No", "description": "Business hours only"}
        ],
        "category": "logistics"
    })
    .to_string();
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "tools": [{"type": "function", "function": {"name": "suggest_question"}}]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(tool_stream("suggest_question", &arguments)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let generator = LlmGenerator::new(
        Arc::new(adapter(&server)),
        RequestOptions::new(),
        RequestOptions::new(),
    );
    let request = GenerationRequest {
        transcript_window: "[hiring_manager]: Pager duty is shared".into(),
        asked: vec![],
        new_text: "Pager duty is shared".into(),
        is_answer: false,
        history: vec![],
        driving_label: "hiring_manager".into(),
    };
    let question = generator.suggest_question(&request).await.unwrap().unwrap();
    assert_eq!(question.question, "Is this role on-call?");
    assert_eq!(question.category, QuestionCategory::Logistics);
    assert_eq!(question.options.len(), 2);
}

#[test]
fn tool_definitions_are_named() {
    assert_eq!(suggest_question_tool().name, "suggest_question");
    assert_eq!(generate_summary_tool().name, GENERATE_SUMMARY);
}
