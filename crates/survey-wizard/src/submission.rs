use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use survey_spec::{Locale, QuestionId, SurveyCatalog, UNKNOWN_ID};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::error::TransportError;
use crate::session::WizardSession;

/// Separator used for every multi-value column.
pub const LIST_DELIMITER: &str = ", ";

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Respondent confirmed the last step (or its countdown ran out).
    Complete,
    /// Forced by the idle monitor; answers may be partial.
    Timeout,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Complete => "complete",
            SubmissionStatus::Timeout => "timeout",
        }
    }
}

/// Flat answer record: display labels next to their canonical ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SubmissionPayload {
    pub status: SubmissionStatus,
    pub progress_step: u8,
    pub lang: Locale,
    pub nationality: String,
    pub age_group: String,
    pub age_group_id: String,
    pub discovery: String,
    pub discovery_ids: String,
    pub sns_used: String,
    pub sns_ids: String,
    pub transport: String,
    pub transport_ids: String,
    pub rental_pickup: String,
    pub rental_pickup_id: String,
    pub lacking_items: String,
    pub lacking_ids: String,
    pub manners_sources: String,
    pub manners_ids: String,
}

/// What actually goes over the wire: the payload plus delivery metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SubmissionRecord {
    pub timestamp_jst: String,
    #[serde(flatten)]
    pub payload: SubmissionPayload,
    pub user_agent: String,
}

/// Builds a payload against the compiled-in catalog.
pub fn build(session: &WizardSession, status: SubmissionStatus) -> SubmissionPayload {
    SubmissionBuilder::new(SurveyCatalog::builtin()).build(session, status)
}

#[derive(Debug, Clone, Copy)]
pub struct SubmissionBuilder<'a> {
    catalog: &'a SurveyCatalog,
}

impl<'a> SubmissionBuilder<'a> {
    pub fn new(catalog: &'a SurveyCatalog) -> Self {
        Self { catalog }
    }

    /// Pure mapping of the session onto payload columns. Labels with no
    /// matching option resolve to the unknown id; nothing here fails.
    pub fn build(&self, session: &WizardSession, status: SubmissionStatus) -> SubmissionPayload {
        let (age_group, age_group_id) = self.single(session, QuestionId::AgeGroup, UNKNOWN_ID);
        let (discovery, discovery_ids) = self.multi(session, QuestionId::Discovery);
        let (sns_used, sns_ids) = self.multi(session, QuestionId::SocialMedia);
        let (transport, transport_ids) = self.multi(session, QuestionId::Transport);
        let (rental_pickup, rental_pickup_id) = self.single(session, QuestionId::RentalPickup, "");
        let (lacking_items, lacking_ids) = self.multi(session, QuestionId::Lacking);
        let (manners_sources, manners_ids) = self.multi(session, QuestionId::MannersSource);

        SubmissionPayload {
            status,
            progress_step: session.step.number(),
            lang: session.locale,
            nationality: session.answers.nationality.clone(),
            age_group,
            age_group_id,
            discovery,
            discovery_ids,
            sns_used,
            sns_ids,
            transport,
            transport_ids,
            rental_pickup,
            rental_pickup_id,
            lacking_items,
            lacking_ids,
            manners_sources,
            manners_ids,
        }
    }

    /// `blank_id` fills the id column when nothing was chosen: the sheet
    /// expects `unknown` for a skipped age group but an empty pickup cell
    /// for respondents who never saw that question.
    fn single(
        &self,
        session: &WizardSession,
        question: QuestionId,
        blank_id: &str,
    ) -> (String, String) {
        match session.answers.single(question) {
            Some(label) if !label.is_empty() => (
                label.to_string(),
                self.catalog.id_for(question, label).to_string(),
            ),
            _ => (String::new(), blank_id.to_string()),
        }
    }

    fn multi(&self, session: &WizardSession, question: QuestionId) -> (String, String) {
        let labels = session.answers.labels(question);
        let ids: Vec<&str> = labels
            .iter()
            .map(|label| self.catalog.id_for(question, label))
            .collect();
        (labels.join(LIST_DELIMITER), ids.join(LIST_DELIMITER))
    }
}

impl SubmissionRecord {
    /// Attaches the delivery timestamp, rendered in `offset`, and the client id.
    pub fn stamp(
        payload: SubmissionPayload,
        at: OffsetDateTime,
        offset: UtcOffset,
        client_id: &str,
    ) -> Result<Self, TransportError> {
        let timestamp_jst = at.to_offset(offset).format(TIMESTAMP_FORMAT)?;
        Ok(Self {
            timestamp_jst,
            payload,
            user_agent: client_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_spec::{AnswerState, SelectionSet, Step};
    use time::macros::datetime;
    use uuid::Uuid;

    fn session(step: u8, locale: Locale, answers: AnswerState) -> WizardSession {
        let mut session = WizardSession::with_id(Uuid::nil(), locale);
        session.step = Step::new(step).unwrap();
        session.answers = answers;
        session
    }

    #[test]
    fn empty_session_has_blank_labels_and_an_unknown_age_id() {
        let payload = build(
            &session(0, Locale::Ja, AnswerState::default()),
            SubmissionStatus::Timeout,
        );
        assert_eq!(payload.progress_step, 0);
        assert_eq!(payload.age_group, "");
        assert_eq!(payload.age_group_id, UNKNOWN_ID);
        assert_eq!(payload.rental_pickup_id, "");
        assert_eq!(payload.discovery_ids, "");
    }

    #[test]
    fn joins_labels_and_ids_in_selection_order() {
        let answers = AnswerState {
            transport: SelectionSet::from_labels(["Rental car", "Bus"]),
            ..AnswerState::default()
        };
        let payload = build(&session(5, Locale::En, answers), SubmissionStatus::Complete);
        assert_eq!(payload.transport, "Rental car, Bus");
        assert_eq!(payload.transport_ids, "transport_rental, transport_bus");
    }

    #[test]
    fn timestamp_is_rendered_in_configured_offset() {
        let payload = build(
            &session(1, Locale::Ja, AnswerState::default()),
            SubmissionStatus::Timeout,
        );
        let record = SubmissionRecord::stamp(
            payload,
            datetime!(2025-03-01 15:30:05 UTC),
            UtcOffset::from_hms(9, 0, 0).unwrap(),
            "kiosk-a",
        )
        .unwrap();
        assert_eq!(record.timestamp_jst, "2025-03-02 00:30:05");
        assert_eq!(record.user_agent, "kiosk-a");
    }

    #[test]
    fn record_serializes_flat() {
        let payload = build(
            &session(2, Locale::Ko, AnswerState::default()),
            SubmissionStatus::Complete,
        );
        let record = SubmissionRecord::stamp(
            payload,
            OffsetDateTime::UNIX_EPOCH,
            UtcOffset::UTC,
            "kiosk",
        )
        .unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "complete");
        assert_eq!(value["lang"], "ko");
        assert_eq!(value["progress_step"], 2);
        assert_eq!(value["timestamp_jst"], "1970-01-01 00:00:00");
    }
}
