//! Tool schemas offered to the model and decoding of its tool calls.

use serde_json::{Value, json};

use crate::llm::error::LlmError;
use crate::llm::provider::ToolDefinition;
use crate::models::{JobSummary, QuestionCategory, SuggestedQuestion};

pub const SUGGEST_QUESTION: &str = "suggest_question";
pub const GENERATE_SUMMARY: &str = "generate_summary";

const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 4;

fn string_list(description: &str) -> Value {
    json!({"type": "array", "items": {"type": "string"}, "description": description})
}

fn text(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

/// `suggest_question`: one clarifying question with answer options.
pub fn suggest_question_tool() -> ToolDefinition {
    let categories: Vec<&str> = QuestionCategory::ALL.iter().map(|c| c.as_str()).collect();
    ToolDefinition::new(
        SUGGEST_QUESTION,
        "Suggest one clarifying question for the recruiter to ask the hiring manager. \
         Use it when the requirements have a gap or an unclear statement.",
        json!({
            "type": "object",
            "properties": {
                "question": text("The question to ask the hiring manager"),
                "options": {
                    "type": "array",
                    "minItems": MIN_OPTIONS,
                    "maxItems": MAX_OPTIONS,
                    "items": {
                        "type": "object",
                        "properties": {
                            "label": text("Short label for the option"),
                            "description": text("What this option means")
                        },
                        "required": ["label", "description"]
                    },
                    "description": "Plausible answers that guide the conversation"
                },
                "context": text("Why this question matters given what was just said"),
                "priority": {
                    "type": "string",
                    "enum": ["urgent", "high", "medium", "low"],
                    "description": "urgent: critical gap; high: vague statement; medium: strengthens the job description; low: nice to know"
                },
                "category": {
                    "type": "string",
                    "enum": categories,
                    "description": "Coverage area this question addresses"
                },
                "timing_hint": {
                    "type": "string",
                    "enum": ["ask_now", "ask_soon", "save_for_later"],
                    "description": "ask_now: topic is live; ask_soon: adjacent topic; save_for_later: different topic"
                }
            },
            "required": ["question", "options", "context", "priority", "category", "timing_hint"]
        }),
    )
}

/// `generate_summary`: the structured end-of-call job summary.
pub fn generate_summary_tool() -> ToolDefinition {
    ToolDefinition::new(
        GENERATE_SUMMARY,
        "Produce the structured summary of the job requirements gathered on the call, \
         noting every area that remains unclear.",
        json!({
            "type": "object",
            "properties": {
                "role_title": text("Job title"),
                "department": text("Department or team name"),
                "reporting_to": text("Who the role reports to"),
                "skills": {
                    "type": "object",
                    "properties": {
                        "required": string_list("Must-have skills"),
                        "preferred": string_list("Nice-to-have skills")
                    }
                },
                "experience": {
                    "type": "object",
                    "properties": {
                        "min_years": {"type": "integer"},
                        "max_years": {"type": "integer"},
                        "notes": text("Context on the experience requirement")
                    }
                },
                "responsibilities": string_list("Key responsibilities"),
                "location": text("Office location"),
                "remote_policy": text("Remote, hybrid or onsite policy"),
                "compensation": {
                    "type": "object",
                    "properties": {
                        "salary_min": {"type": "integer"},
                        "salary_max": {"type": "integer"},
                        "currency": {"type": "string"},
                        "equity": {"type": "string"},
                        "benefits": string_list("Benefits mentioned")
                    }
                },
                "candidate_persona": {
                    "type": "object",
                    "properties": {
                        "must_haves": string_list("Non-negotiable qualities"),
                        "nice_to_haves": string_list("Preferred qualities"),
                        "cultural_fit": string_list("Cultural fit indicators"),
                        "red_flags": string_list("Warning signs")
                    }
                },
                "team_context": {
                    "type": "object",
                    "properties": {
                        "team_size": text("Size and shape of the team"),
                        "project_description": text("What the hire will work on"),
                        "tech_stack": string_list("Technologies in use"),
                        "growth_plans": text("Roadmap context"),
                        "collaboration_style": text("How the team works together")
                    }
                },
                "unclear_points": string_list("Topics not discussed or still unclear"),
                "additional_notes": text("Anything else relevant"),
                "completeness_score": {
                    "type": "integer",
                    "minimum": 0,
                    "maximum": 100,
                    "description": "How complete the gathered requirements are"
                }
            },
            "required": ["role_title", "completeness_score"]
        }),
    )
}

/// Decode and validate `suggest_question` arguments.
///
/// # Errors
///
/// [`LlmError::ToolError`] when the JSON does not match the schema, the
/// question is blank, or the option count is outside 2..=4.
pub fn parse_suggestion(arguments_json: &str) -> Result<SuggestedQuestion, LlmError> {
    let question: SuggestedQuestion = serde_json::from_str(arguments_json)
        .map_err(|e| LlmError::ToolError(format!("invalid {SUGGEST_QUESTION} arguments: {e}")))?;

    if question.question.trim().is_empty() {
        return Err(LlmError::ToolError("suggested question is empty".into()));
    }
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&question.options.len()) {
        return Err(LlmError::ToolError(format!(
            "suggested question has {} options, expected {MIN_OPTIONS}-{MAX_OPTIONS}",
            question.options.len()
        )));
    }
    Ok(question)
}

/// Decode `generate_summary` arguments, clamping the score to 100.
///
/// # Errors
///
/// [`LlmError::ToolError`] when the JSON does not match the schema.
pub fn parse_summary(arguments_json: &str) -> Result<JobSummary, LlmError> {
    let mut summary: JobSummary = serde_json::from_str(arguments_json)
        .map_err(|e| LlmError::ToolError(format!("invalid {GENERATE_SUMMARY} arguments: {e}")))?;
    summary.completeness_score = summary.completeness_score.min(100);
    Ok(summary)
}
