use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Stable identifiers for every answer slot in the survey.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum QuestionId {
    Nationality,
    AgeGroup,
    Discovery,
    SocialMedia,
    Transport,
    RentalPickup,
    Lacking,
    MannersSource,
}

impl QuestionId {
    pub const ALL: [QuestionId; 8] = [
        QuestionId::Nationality,
        QuestionId::AgeGroup,
        QuestionId::Discovery,
        QuestionId::SocialMedia,
        QuestionId::Transport,
        QuestionId::RentalPickup,
        QuestionId::Lacking,
        QuestionId::MannersSource,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionId::Nationality => "nationality",
            QuestionId::AgeGroup => "age_group",
            QuestionId::Discovery => "discovery",
            QuestionId::SocialMedia => "social_media",
            QuestionId::Transport => "transport",
            QuestionId::RentalPickup => "rental_pickup",
            QuestionId::Lacking => "lacking",
            QuestionId::MannersSource => "manners_source",
        }
    }

    /// Step on which this slot is answered. The rental pickup sub-question
    /// shares the transport step.
    pub fn step(self) -> Step {
        match self {
            QuestionId::Nationality => Step(1),
            QuestionId::AgeGroup => Step(2),
            QuestionId::Discovery => Step(3),
            QuestionId::SocialMedia => Step(4),
            QuestionId::Transport | QuestionId::RentalPickup => Step(5),
            QuestionId::Lacking => Step(6),
            QuestionId::MannersSource => Step(7),
        }
    }

    pub fn spec(self) -> &'static QuestionSpec {
        // SURVEY_QUESTIONS is declared in enum order.
        &SURVEY_QUESTIONS[self as usize]
    }

    pub fn cardinality(self) -> Cardinality {
        self.spec().cardinality
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many answers a question accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    FreeText,
    Single,
    MultiFree,
    /// Multi-select where a "none" choice excludes every other choice.
    MultiExclusive,
}

impl Cardinality {
    pub fn is_multi(self) -> bool {
        matches!(self, Cardinality::MultiFree | Cardinality::MultiExclusive)
    }
}

/// Position in the wizard: 0 is the locale gate, 1..=7 are the questions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct Step(u8);

impl Step {
    pub const GATE: Step = Step(0);
    pub const FIRST_QUESTION: Step = Step(1);
    pub const LAST_QUESTION: Step = Step(7);

    pub fn new(number: u8) -> Option<Step> {
        (number <= Self::LAST_QUESTION.0).then_some(Step(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn is_gate(self) -> bool {
        self == Self::GATE
    }

    pub fn is_last(self) -> bool {
        self == Self::LAST_QUESTION
    }

    pub fn next(self) -> Option<Step> {
        Step::new(self.0 + 1)
    }

    pub fn prev(self) -> Option<Step> {
        self.0.checked_sub(1).map(Step)
    }

    /// Main question asked on this step, if any.
    pub fn question(self) -> Option<QuestionId> {
        survey_questions()
            .iter()
            .find(|spec| spec.id.step() == self && spec.parent.is_none())
            .map(|spec| spec.id)
    }

    /// Every answer slot shown on this step, main question first.
    pub fn questions(self) -> impl Iterator<Item = QuestionId> {
        survey_questions()
            .iter()
            .filter(move |spec| spec.id.step() == self)
            .map(|spec| spec.id)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static definition of one survey question.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct QuestionSpec {
    pub id: QuestionId,
    pub cardinality: Cardinality,
    pub required: bool,
    /// Parent question whose answer makes this one mandatory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<QuestionId>,
    pub title_key: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint_key: Option<&'static str>,
}

const SURVEY_QUESTIONS: [QuestionSpec; 8] = [
    QuestionSpec {
        id: QuestionId::Nationality,
        cardinality: Cardinality::FreeText,
        required: true,
        parent: None,
        title_key: "question.nationality.title",
        hint_key: Some("question.nationality.hint"),
    },
    QuestionSpec {
        id: QuestionId::AgeGroup,
        cardinality: Cardinality::Single,
        required: true,
        parent: None,
        title_key: "question.age_group.title",
        hint_key: None,
    },
    QuestionSpec {
        id: QuestionId::Discovery,
        cardinality: Cardinality::MultiFree,
        required: true,
        parent: None,
        title_key: "question.discovery.title",
        hint_key: None,
    },
    QuestionSpec {
        id: QuestionId::SocialMedia,
        cardinality: Cardinality::MultiExclusive,
        required: true,
        parent: None,
        title_key: "question.social_media.title",
        hint_key: None,
    },
    QuestionSpec {
        id: QuestionId::Transport,
        cardinality: Cardinality::MultiFree,
        required: true,
        parent: None,
        title_key: "question.transport.title",
        hint_key: None,
    },
    QuestionSpec {
        id: QuestionId::RentalPickup,
        cardinality: Cardinality::Single,
        required: false,
        parent: Some(QuestionId::Transport),
        title_key: "question.rental_pickup.title",
        hint_key: None,
    },
    QuestionSpec {
        id: QuestionId::Lacking,
        cardinality: Cardinality::MultiExclusive,
        required: true,
        parent: None,
        title_key: "question.lacking.title",
        hint_key: None,
    },
    QuestionSpec {
        id: QuestionId::MannersSource,
        cardinality: Cardinality::MultiExclusive,
        required: true,
        parent: None,
        title_key: "question.manners_source.title",
        hint_key: None,
    },
];

/// All questions in presentation order.
pub fn survey_questions() -> &'static [QuestionSpec] {
    &SURVEY_QUESTIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_question_step_has_one_main_question() {
        for number in 1..=7 {
            let step = Step::new(number).unwrap();
            assert!(step.question().is_some(), "step {number} has no question");
        }
        assert_eq!(Step::GATE.question(), None);
    }

    #[test]
    fn transport_step_carries_rental_pickup() {
        let slots: Vec<_> = Step::new(5).unwrap().questions().collect();
        assert_eq!(slots, vec![QuestionId::Transport, QuestionId::RentalPickup]);
        assert_eq!(Step::new(5).unwrap().question(), Some(QuestionId::Transport));
    }

    #[test]
    fn question_table_matches_enum_order() {
        for id in QuestionId::ALL {
            assert_eq!(id.spec().id, id);
        }
    }

    #[test]
    fn steps_are_bounded() {
        assert_eq!(Step::new(8), None);
        assert_eq!(Step::LAST_QUESTION.next(), None);
        assert_eq!(Step::GATE.prev(), None);
        assert_eq!(Step::FIRST_QUESTION.prev(), Some(Step::GATE));
    }
}
