use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::AnswerState;
use crate::catalog::SurveyCatalog;
use crate::spec::{QuestionId, Step};

/// Outcome of checking one step's required answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StepCheck {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<QuestionId>,
}

impl StepCheck {
    fn from_missing(missing_required: Vec<QuestionId>) -> Self {
        Self {
            valid: missing_required.is_empty(),
            missing_required,
        }
    }
}

/// True when the current step's required-answer condition holds.
pub fn is_step_satisfied(step: Step, answers: &AnswerState, catalog: &SurveyCatalog) -> bool {
    check_step(step, answers, catalog).valid
}

pub fn check_step(step: Step, answers: &AnswerState, catalog: &SurveyCatalog) -> StepCheck {
    let mut missing = Vec::new();
    for question in step.questions() {
        if !is_answered(question, answers) && is_required(question, answers, catalog) {
            missing.push(question);
        }
    }
    StepCheck::from_missing(missing)
}

/// Rental pickup becomes mandatory as soon as any transport label resolves
/// to a rental-car option, whatever locale produced it.
pub fn rental_pickup_required(answers: &AnswerState, catalog: &SurveyCatalog) -> bool {
    answers
        .transport
        .iter()
        .any(|label| catalog.is_rental(label))
}

fn is_required(question: QuestionId, answers: &AnswerState, catalog: &SurveyCatalog) -> bool {
    match question {
        QuestionId::RentalPickup => rental_pickup_required(answers, catalog),
        other => other.spec().required,
    }
}

fn is_answered(question: QuestionId, answers: &AnswerState) -> bool {
    match question {
        QuestionId::Nationality => !answers.nationality.trim().is_empty(),
        QuestionId::AgeGroup => has_value(answers.age_group.as_deref()),
        QuestionId::RentalPickup => has_value(answers.rental_pickup.as_deref()),
        other => answers
            .selection(other)
            .is_some_and(|selection| !selection.is_empty()),
    }
}

fn has_value(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}
