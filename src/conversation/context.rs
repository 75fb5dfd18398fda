//! Per-turn context message and the memory of questions already asked.

use crate::models::{QuestionCategory, SuggestedQuestion};

/// Render the single user message sent for one turn.
///
/// `transcript_window` is the already-rendered recent transcript; `asked`
/// is every question surfaced so far, in the order it was asked.
pub fn build_context_message(
    transcript_window: &str,
    asked: &[String],
    new_text: &str,
    is_answer: bool,
    driving_label: &str,
) -> String {
    let mut parts: Vec<String> = vec![
        "## CONVERSATION CONTEXT".into(),
        String::new(),
        "**Live Transcript:**".into(),
        "```".into(),
        transcript_window.to_string(),
        "```".into(),
        String::new(),
    ];

    if !asked.is_empty() {
        parts.push("**Questions Already Asked (DO NOT repeat):**".into());
        parts.extend(
            asked
                .iter()
                .enumerate()
                .map(|(i, q)| format!("{}. {q}", i + 1)),
        );
        parts.push(String::new());
    }

    let (heading, task) = if is_answer {
        (
            "## HIRING MANAGER ANSWERED THE PREVIOUS QUESTION",
            "**Your task:** Treat this as the answer to your last question. Build on the \
             specifics they gave and ask ONE follow-up that goes deeper or moves to an \
             uncovered area.",
        )
    } else {
        (
            "## HIRING MANAGER JUST SAID",
            "**Your task:** Build on what they just said. Reference their specific words. \
             Extract work-reality details and ask ONE conversational question.",
        )
    };
    parts.push(heading.into());
    parts.push(format!("[{driving_label}]: {new_text}"));
    parts.push(String::new());
    parts.push(task.into());

    parts.join("\n")
}

/// Lower-case, collapse whitespace and drop trailing punctuation.
pub fn normalize_question(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string()
}

/// Append-only list of surfaced questions.
#[derive(Debug, Default)]
pub struct AskedQuestions {
    texts: Vec<String>,
    categories: Vec<QuestionCategory>,
}

impl AskedQuestions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an equivalent question was already surfaced.
    pub fn contains(&self, question: &str) -> bool {
        let needle = normalize_question(question);
        self.texts.iter().any(|q| normalize_question(q) == needle)
    }

    pub fn remember(&mut self, question: &SuggestedQuestion) {
        self.texts.push(question.question.clone());
        self.categories.push(question.category);
    }

    /// Question texts in asked order.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn categories(&self) -> &[QuestionCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn clear(&mut self) {
        self.texts.clear();
        self.categories.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, QuestionOption, TimingHint};

    fn question(text: &str, category: QuestionCategory) -> SuggestedQuestion {
        SuggestedQuestion {
            question: text.into(),
            options: vec![
                QuestionOption {
                    label: "a".into(),
                    description: "a".into(),
                },
                QuestionOption {
                    label: "b".into(),
                    description: "b".into(),
                },
            ],
            context: String::new(),
            priority: Priority::Medium,
            category,
            timing_hint: TimingHint::AskNow,
        }
    }

    #[test]
    fn fresh_statement_layout() {
        let msg = build_context_message(
            "[hiring_manager]: We are hiring",
            &[],
            "We are hiring",
            false,
            "hiring_manager",
        );
        assert!(msg.starts_with("## CONVERSATION CONTEXT\n\n**Live Transcript:**\n```\n"));
        assert!(msg.contains("## HIRING MANAGER JUST SAID\n[hiring_manager]: We are hiring"));
        assert!(!msg.contains("Questions Already Asked"));
        assert!(!msg.contains("ANSWERED"));
    }

    #[test]
    fn answer_layout_lists_asked_in_order() {
        let asked = vec!["First?".to_string(), "Second?".to_string()];
        let msg = build_context_message("t", &asked, "About five people", true, "hiring_manager");
        let first = msg.find("1. First?");
        let second = msg.find("2. Second?");
        assert!(first.is_some() && second.is_some() && first < second);
        assert!(msg.contains("## HIRING MANAGER ANSWERED THE PREVIOUS QUESTION"));
        assert!(msg.contains("[hiring_manager]: About five people"));
    }

    #[test]
    fn normalization_ignores_case_spacing_and_trailing_punctuation() {
        assert_eq!(
            normalize_question("  What   is the BUDGET?! "),
            "what is the budget"
        );
    }

    #[test]
    fn duplicates_are_detected_after_normalization() {
        let mut asked = AskedQuestions::new();
        asked.remember(&question("How big is the team?", QuestionCategory::TeamContext));
        assert!(asked.contains("how big is the team"));
        assert!(asked.contains("How  big is the team ?"));
        assert!(!asked.contains("How big will the team get?"));
        assert_eq!(asked.categories(), &[QuestionCategory::TeamContext]);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut asked = AskedQuestions::new();
        asked.remember(&question("Q?", QuestionCategory::Logistics));
        asked.clear();
        assert!(asked.is_empty());
        assert_eq!(asked.len(), 0);
        assert!(!asked.contains("Q?"));
    }
}
