use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use survey_spec::{AnswerState, Locale, QuestionId, Step, StepCheck};
use uuid::Uuid;

/// State of one respondent's pass through the survey. Replaced wholesale
/// on every reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSession {
    pub id: Uuid,
    /// Random value presentation hosts use to pick decoration per session.
    pub cosmetic_seed: u32,
    pub step: Step,
    pub locale: Locale,
    pub answers: AnswerState,
}

impl WizardSession {
    pub fn new(locale: Locale) -> Self {
        Self::with_id(Uuid::new_v4(), locale)
    }

    pub fn with_id(id: Uuid, locale: Locale) -> Self {
        let bytes = id.as_bytes();
        let cosmetic_seed = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Self {
            id,
            cosmetic_seed,
            step: Step::GATE,
            locale,
            answers: AnswerState::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Answering,
    /// A respondent-confirmed submission is awaiting the transport.
    Submitting,
    /// Thank-you screen; resets on its own shortly after.
    Submitted,
}

/// Auto-advance countdown as shown to the respondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Countdown {
    pub remaining_ms: u64,
    pub total_ms: u64,
    pub seconds_left: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionView {
    pub id: QuestionId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Choices in display order; empty for free-text questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected: Vec<String>,
}

/// Everything a presentation layer needs to render the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub cosmetic_seed: u32,
    pub step: Step,
    pub locale: Locale,
    pub phase: Phase,
    pub answers: AnswerState,
    pub check: StepCheck,
    pub rental_pickup_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown: Option<Countdown>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<QuestionView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
