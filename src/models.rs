//! Structured outputs the copilot hands to the recruiter.
//!
//! [`SuggestedQuestion`] and [`JobSummary`] are decoded from tool-call
//! arguments and serialized unchanged into outbound frames, so their serde
//! shape is the wire shape.

use serde::{Deserialize, Serialize};

use crate::conversation::state::ConversationState;

// ── Suggested question ────────────────────────────────────────

/// One selectable answer for a suggested question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Short label, e.g. "Entry-level (0-2 years)".
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

/// Coverage area a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    TechnicalRequirements,
    ExperienceLevel,
    #[default]
    RoleSpecifics,
    CultureSoftSkills,
    Logistics,
    Compensation,
    TeamContext,
}

impl QuestionCategory {
    /// Every coverage area, in reporting order.
    pub const ALL: [QuestionCategory; 7] = [
        Self::TechnicalRequirements,
        Self::ExperienceLevel,
        Self::RoleSpecifics,
        Self::CultureSoftSkills,
        Self::Logistics,
        Self::Compensation,
        Self::TeamContext,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TechnicalRequirements => "technical_requirements",
            Self::ExperienceLevel => "experience_level",
            Self::RoleSpecifics => "role_specifics",
            Self::CultureSoftSkills => "culture_soft_skills",
            Self::Logistics => "logistics",
            Self::Compensation => "compensation",
            Self::TeamContext => "team_context",
        }
    }
}

impl std::fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingHint {
    #[default]
    AskNow,
    AskSoon,
    SaveForLater,
}

/// A clarifying question for the recruiter to ask next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedQuestion {
    pub question: String,
    /// Two to four possible answers.
    pub options: Vec<QuestionOption>,
    /// Why the question matters given the conversation so far.
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: QuestionCategory,
    #[serde(default)]
    pub timing_hint: TimingHint,
}

// ── Job summary ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub required: Vec<String>,
    pub preferred: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceLevel {
    pub min_years: Option<u32>,
    pub max_years: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compensation {
    pub salary_min: Option<u64>,
    pub salary_max: Option<u64>,
    pub currency: Option<String>,
    pub equity: Option<String>,
    pub benefits: Vec<String>,
}

impl Default for Compensation {
    fn default() -> Self {
        Self {
            salary_min: None,
            salary_max: None,
            currency: Some("USD".into()),
            equity: None,
            benefits: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidatePersona {
    pub must_haves: Vec<String>,
    pub nice_to_haves: Vec<String>,
    pub cultural_fit: Vec<String>,
    pub red_flags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamContext {
    pub team_size: Option<String>,
    pub project_description: Option<String>,
    pub tech_stack: Vec<String>,
    pub growth_plans: Option<String>,
    pub collaboration_style: Option<String>,
}

/// End-of-call structured summary of the role discussed.
///
/// Only `role_title` is required; every other section defaults to empty so
/// a sparse call still yields a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub role_title: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub reporting_to: Option<String>,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default)]
    pub experience: ExperienceLevel,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote_policy: Option<String>,
    #[serde(default)]
    pub compensation: Compensation,
    #[serde(default)]
    pub candidate_persona: CandidatePersona,
    #[serde(default)]
    pub team_context: TeamContext,
    #[serde(default)]
    pub unclear_points: Vec<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
    /// 0–100.
    #[serde(default)]
    pub completeness_score: u8,
}

// ── Completion status ─────────────────────────────────────────

/// Progress snapshot for the running call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStatus {
    pub questions_asked: usize,
    pub transcript_entries: usize,
    pub covered_categories: Vec<QuestionCategory>,
    pub missing_categories: Vec<QuestionCategory>,
    /// Covered share of the seven categories, rounded down.
    pub coverage_percent: u8,
    pub state: ConversationState,
}

impl CompletionStatus {
    /// Build a status from the categories of every question asked so far.
    pub fn from_categories(
        asked: &[QuestionCategory],
        transcript_entries: usize,
        state: ConversationState,
    ) -> Self {
        let (covered, missing): (Vec<_>, Vec<_>) = QuestionCategory::ALL
            .into_iter()
            .partition(|c| asked.contains(c));
        let coverage_percent = (covered.len() * 100 / QuestionCategory::ALL.len()) as u8;
        Self {
            questions_asked: asked.len(),
            transcript_entries,
            covered_categories: covered,
            missing_categories: missing,
            coverage_percent,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn question_defaults_fill_optional_fields() {
        let q: SuggestedQuestion = serde_json::from_value(serde_json::json!({
            "question": "How senior is the role?",
            "options": [
                {"label": "Junior", "description": "0-2 years"},
                {"label": "Senior", "description": "5+ years"}
            ]
        }))
        .unwrap();
        assert_eq!(q.priority, Priority::Medium);
        assert_eq!(q.category, QuestionCategory::RoleSpecifics);
        assert_eq!(q.timing_hint, TimingHint::AskNow);
        assert!(q.context.is_empty());
    }

    #[test]
    fn category_wire_names() {
        for category in QuestionCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{category}\""));
        }
    }

    #[test]
    fn sparse_summary_decodes() {
        let summary: JobSummary =
            serde_json::from_value(serde_json::json!({"role_title": "Backend Engineer"})).unwrap();
        assert_eq!(summary.role_title, "Backend Engineer");
        assert_eq!(summary.compensation.currency.as_deref(), Some("USD"));
        assert!(summary.skills.required.is_empty());
        assert_eq!(summary.completeness_score, 0);
    }

    #[test]
    fn summary_without_title_is_rejected() {
        let result: Result<JobSummary, _> =
            serde_json::from_value(serde_json::json!({"department": "Platform"}));
        assert!(result.is_err());
    }

    #[test]
    fn coverage_rounds_down() {
        let status = CompletionStatus::from_categories(
            &[
                QuestionCategory::Compensation,
                QuestionCategory::Compensation,
                QuestionCategory::Logistics,
            ],
            12,
            ConversationState::Listening,
        );
        assert_eq!(status.questions_asked, 3);
        assert_eq!(status.covered_categories.len(), 2);
        assert_eq!(status.missing_categories.len(), 5);
        // 2 / 7 = 28.57%
        assert_eq!(status.coverage_percent, 28);
    }

    #[test]
    fn full_coverage_is_one_hundred() {
        let status = CompletionStatus::from_categories(
            &QuestionCategory::ALL,
            0,
            ConversationState::QuestionShown,
        );
        assert_eq!(status.coverage_percent, 100);
        assert!(status.missing_categories.is_empty());
    }
}
