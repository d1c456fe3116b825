use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::selection::SelectionSet;
use crate::spec::QuestionId;

/// Answers collected so far, as labels in the display locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerState {
    #[serde(default)]
    pub nationality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(default)]
    pub discovery: SelectionSet,
    #[serde(default)]
    pub social_media: SelectionSet,
    #[serde(default)]
    pub transport: SelectionSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rental_pickup: Option<String>,
    #[serde(default)]
    pub lacking: SelectionSet,
    #[serde(default)]
    pub manners_source: SelectionSet,
}

impl AnswerState {
    pub fn selection(&self, question: QuestionId) -> Option<&SelectionSet> {
        match question {
            QuestionId::Discovery => Some(&self.discovery),
            QuestionId::SocialMedia => Some(&self.social_media),
            QuestionId::Transport => Some(&self.transport),
            QuestionId::Lacking => Some(&self.lacking),
            QuestionId::MannersSource => Some(&self.manners_source),
            QuestionId::Nationality | QuestionId::AgeGroup | QuestionId::RentalPickup => None,
        }
    }

    pub fn selection_mut(&mut self, question: QuestionId) -> Option<&mut SelectionSet> {
        match question {
            QuestionId::Discovery => Some(&mut self.discovery),
            QuestionId::SocialMedia => Some(&mut self.social_media),
            QuestionId::Transport => Some(&mut self.transport),
            QuestionId::Lacking => Some(&mut self.lacking),
            QuestionId::MannersSource => Some(&mut self.manners_source),
            QuestionId::Nationality | QuestionId::AgeGroup | QuestionId::RentalPickup => None,
        }
    }

    /// Value of a single-answer slot (free text or single choice).
    pub fn single(&self, question: QuestionId) -> Option<&str> {
        match question {
            QuestionId::Nationality => Some(self.nationality.as_str()).filter(|v| !v.is_empty()),
            QuestionId::AgeGroup => self.age_group.as_deref(),
            QuestionId::RentalPickup => self.rental_pickup.as_deref(),
            _ => None,
        }
    }

    /// Writes a single-answer slot. Returns false for multi-select questions.
    pub fn set_single(&mut self, question: QuestionId, value: Option<String>) -> bool {
        match question {
            QuestionId::Nationality => self.nationality = value.unwrap_or_default(),
            QuestionId::AgeGroup => self.age_group = value,
            QuestionId::RentalPickup => self.rental_pickup = value,
            _ => return false,
        }
        true
    }

    /// Chosen labels of any slot, in selection order.
    pub fn labels(&self, question: QuestionId) -> Vec<&str> {
        match self.selection(question) {
            Some(set) => set.iter().collect(),
            None => self.single(question).into_iter().collect(),
        }
    }

    pub fn is_pristine(&self) -> bool {
        self == &AnswerState::default()
    }
}
