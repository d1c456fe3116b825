use std::sync::Arc;

use survey_spec::{Locale, QuestionId, Step};
use survey_wizard::{
    Clock, DeliveryOutcome, KioskConfig, ManualClock, MemoryTransport, Phase, SubmissionStatus,
    TickOutcome, WizardController, WizardError,
};
use time::Duration;

struct Harness {
    controller: WizardController,
    clock: Arc<ManualClock>,
    transport: Arc<MemoryTransport>,
}

impl Harness {
    /// Sends every queued delivery and feeds the reports back.
    async fn flush(&mut self) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::new();
        for delivery in self.controller.take_deliveries() {
            let report = delivery.send().await;
            outcomes.push(self.controller.complete_delivery(report));
        }
        outcomes
    }
}

fn harness_with(transport: MemoryTransport) -> Harness {
    let clock = Arc::new(ManualClock::at_epoch());
    let transport = Arc::new(transport);
    let controller = WizardController::new(
        KioskConfig::default(),
        clock.clone(),
        transport.clone(),
    )
    .expect("default config is valid");
    Harness {
        controller,
        clock,
        transport,
    }
}

fn harness() -> Harness {
    harness_with(MemoryTransport::new())
}

fn answer(controller: &mut WizardController, step: u8) {
    let result = match step {
        1 => controller.set_free_text(QuestionId::Nationality, "France"),
        2 => controller.select_option(QuestionId::AgeGroup, "Under 18"),
        3 => controller.select_option(QuestionId::Discovery, "SNS"),
        4 => controller.select_option(QuestionId::SocialMedia, "Instagram"),
        5 => controller.select_option(QuestionId::Transport, "Bus"),
        6 => controller.select_option(QuestionId::Lacking, "Free Wi-Fi"),
        7 => controller.select_option(QuestionId::MannersSource, "SNS posts"),
        other => panic!("no question on step {other}"),
    };
    result.expect("answer accepted");
}

/// Chooses English on the gate and answers every step before `target`.
fn reach(controller: &mut WizardController, target: u8) {
    controller.select_locale(Locale::En).expect("gate accepts locale");
    for step in 1..target {
        answer(controller, step);
        controller.go_next().expect("answered step advances");
    }
    assert_eq!(controller.session().step.number(), target);
}

#[test]
fn satisfied_step_auto_advances_after_its_delay() {
    let mut h = harness();
    reach(&mut h.controller, 1);
    answer(&mut h.controller, 1);
    assert!(h.controller.has_deadline());

    h.clock.advance(Duration::milliseconds(500));
    let countdown = h.controller.snapshot().countdown.expect("countdown shown");
    assert!(countdown.remaining_ms > 6_000 && countdown.remaining_ms <= 7_000);
    assert_eq!(countdown.total_ms, 7_000);
    assert_eq!(countdown.seconds_left, 7);

    h.clock.advance(Duration::milliseconds(6_000));
    assert_eq!(h.controller.tick(), None);
    assert_eq!(h.controller.session().step, Step::FIRST_QUESTION);

    h.clock.advance(Duration::milliseconds(500));
    assert_eq!(
        h.controller.tick(),
        Some(TickOutcome::Advanced(Step::new(2).unwrap()))
    );
    assert!(!h.controller.has_deadline());
}

#[test]
fn deselecting_everything_cancels_the_countdown() {
    let mut h = harness();
    reach(&mut h.controller, 3);
    h.controller
        .select_option(QuestionId::Discovery, "SNS")
        .unwrap();
    assert!(h.controller.has_deadline());
    h.controller
        .select_option(QuestionId::Discovery, "SNS")
        .unwrap();
    assert!(!h.controller.has_deadline());

    h.clock.advance(Duration::seconds(10));
    assert_eq!(h.controller.tick(), None);
    assert_eq!(h.controller.session().step.number(), 3);
}

#[test]
fn changing_step_drops_the_old_deadline() {
    let mut h = harness();
    reach(&mut h.controller, 3);
    answer(&mut h.controller, 3);
    h.controller.go_back().unwrap();
    assert!(!h.controller.has_deadline());
    assert_eq!(h.controller.session().step.number(), 2);

    h.clock.advance(Duration::seconds(8));
    assert_eq!(h.controller.tick(), None);
    assert_eq!(h.controller.session().step.number(), 2);
}

#[test]
fn back_is_never_gated_and_stops_at_the_gate() {
    let mut h = harness();
    reach(&mut h.controller, 2);
    h.controller.go_back().unwrap();
    h.controller.go_back().unwrap();
    h.controller.go_back().unwrap();
    assert_eq!(h.controller.session().step, Step::GATE);
    assert_eq!(h.controller.session().answers.nationality, "France");
}

#[test]
fn next_is_blocked_until_the_step_is_answered() {
    let mut h = harness();
    reach(&mut h.controller, 1);
    h.controller
        .set_free_text(QuestionId::Nationality, "   ")
        .unwrap();

    let err = h.controller.go_next().unwrap_err();
    assert!(matches!(
        err,
        WizardError::Validation { ref missing, .. } if missing == &[QuestionId::Nationality]
    ));
    assert_eq!(h.controller.session().step, Step::FIRST_QUESTION);
    assert_eq!(
        h.controller.last_error(),
        Some("This question is required.")
    );

    answer(&mut h.controller, 1);
    assert_eq!(h.controller.last_error(), None);
    h.controller.go_next().unwrap();
    assert_eq!(h.controller.session().step.number(), 2);
}

#[test]
fn rental_car_requires_a_pickup_location() {
    let mut h = harness();
    reach(&mut h.controller, 5);
    h.controller
        .select_option(QuestionId::Transport, "Rental car")
        .unwrap();
    assert!(!h.controller.has_deadline());

    let snapshot = h.controller.snapshot();
    assert!(snapshot.rental_pickup_required);
    assert_eq!(snapshot.check.missing_required, vec![QuestionId::RentalPickup]);
    let pickup = snapshot
        .questions
        .iter()
        .find(|view| view.id == QuestionId::RentalPickup)
        .expect("pickup question shown");
    assert!(pickup.choices.iter().any(|label| label == "Gifu - Takayama City"));
    assert!(h.controller.go_next().is_err());

    h.controller
        .select_option(QuestionId::RentalPickup, "Gifu - Takayama City")
        .unwrap();
    assert!(h.controller.has_deadline());
    h.controller.go_next().unwrap();
    assert_eq!(h.controller.session().step.number(), 6);
}

#[test]
fn sentinel_replaces_other_choices() {
    let mut h = harness();
    reach(&mut h.controller, 4);
    h.controller
        .select_option(QuestionId::SocialMedia, "Instagram")
        .unwrap();
    h.controller
        .select_option(QuestionId::SocialMedia, "(None)")
        .unwrap();
    let labels = h.controller.session().answers.labels(QuestionId::SocialMedia);
    assert_eq!(labels, vec!["(None)"]);
}

#[test]
fn input_for_other_steps_is_rejected_without_mutation() {
    let mut h = harness();
    reach(&mut h.controller, 1);
    let before = h.controller.session().clone();

    assert!(matches!(
        h.controller.select_option(QuestionId::Discovery, "SNS"),
        Err(WizardError::QuestionNotActive { .. })
    ));
    assert!(matches!(
        h.controller.select_locale(Locale::Ko),
        Err(WizardError::LocaleLocked(_))
    ));
    assert!(matches!(
        h.controller.select_option(QuestionId::Nationality, "France"),
        Err(WizardError::UnsupportedInput { .. })
    ));
    assert_eq!(h.controller.session(), &before);
}

#[tokio::test]
async fn confirming_the_last_step_submits_then_resets() {
    let mut h = harness();
    reach(&mut h.controller, 7);
    answer(&mut h.controller, 7);
    let first_session = h.controller.session().id;

    h.controller.go_next().unwrap();
    assert_eq!(h.controller.phase(), Phase::Submitting);
    assert!(!h.controller.has_deadline());
    assert!(h.transport.delivered().is_empty());
    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Submitting);
    assert_eq!(snapshot.notice.as_deref(), Some("Sending…"));

    assert_eq!(h.flush().await, vec![DeliveryOutcome::Submitted]);
    assert_eq!(h.controller.phase(), Phase::Submitted);
    assert_eq!(h.controller.snapshot().notice.as_deref(), Some("Submitted!"));

    let delivered = h.transport.delivered();
    assert_eq!(delivered.len(), 1);
    let payload = &delivered[0].payload;
    assert_eq!(payload.status, SubmissionStatus::Complete);
    assert_eq!(payload.progress_step, 7);
    assert_eq!(payload.lang, Locale::En);
    assert_eq!(payload.manners_ids, "manners_sns");

    assert!(matches!(
        h.controller.go_back(),
        Err(WizardError::Busy(_))
    ));

    h.clock.advance(Duration::seconds(2));
    assert_eq!(h.controller.tick(), None);
    h.clock.advance(Duration::seconds(1));
    assert_eq!(h.controller.tick(), Some(TickOutcome::Reset));
    assert_eq!(h.controller.phase(), Phase::Answering);
    assert_eq!(h.controller.session().step, Step::GATE);
    assert_eq!(h.controller.session().locale, Locale::Ja);
    assert!(h.controller.session().answers.is_pristine());
    assert_ne!(h.controller.session().id, first_session);
}

#[test]
fn input_while_submitting_is_rejected() {
    let mut h = harness();
    reach(&mut h.controller, 7);
    answer(&mut h.controller, 7);
    h.controller.go_next().unwrap();
    let before = h.controller.session().clone();

    assert!(matches!(
        h.controller.go_next(),
        Err(WizardError::SubmissionInFlight)
    ));
    assert!(matches!(
        h.controller.select_option(QuestionId::MannersSource, "SNS posts"),
        Err(WizardError::SubmissionInFlight)
    ));
    assert_eq!(h.controller.session(), &before);
    assert_eq!(h.controller.take_deliveries().len(), 1);
    assert!(h.controller.take_deliveries().is_empty());
}

#[tokio::test]
async fn last_step_countdown_queues_a_complete_submission() {
    let mut h = harness();
    reach(&mut h.controller, 7);
    answer(&mut h.controller, 7);

    h.clock.advance(Duration::seconds(19));
    assert_eq!(h.controller.tick(), None);
    h.clock.advance(Duration::seconds(1));
    assert_eq!(h.controller.tick(), Some(TickOutcome::Submitting));
    assert_eq!(h.controller.tick(), None);

    assert_eq!(h.flush().await, vec![DeliveryOutcome::Submitted]);
    assert_eq!(h.transport.delivered().len(), 1);
}

#[tokio::test]
async fn failed_submission_stays_on_the_last_step() {
    let mut h = harness_with(MemoryTransport::failing());
    reach(&mut h.controller, 7);
    answer(&mut h.controller, 7);

    h.controller.go_next().unwrap();
    assert_eq!(h.flush().await, vec![DeliveryOutcome::SubmitFailed]);
    assert_eq!(h.controller.phase(), Phase::Answering);
    assert_eq!(h.controller.session().step, Step::LAST_QUESTION);
    assert_eq!(
        h.controller.last_error(),
        Some("Network error: HTTP 503")
    );
    assert_eq!(h.transport.attempts(), 1);

    h.transport.set_failing(false);
    h.controller.go_next().unwrap();
    assert_eq!(h.flush().await, vec![DeliveryOutcome::Submitted]);
    assert_eq!(h.controller.phase(), Phase::Submitted);
    assert_eq!(h.transport.attempts(), 2);
}

#[tokio::test]
async fn idle_on_the_gate_still_forces_a_timeout_submission() {
    let mut h = harness();
    h.clock.advance(Duration::seconds(39));
    assert_eq!(h.controller.tick(), None);
    h.clock.advance(Duration::seconds(1));
    assert_eq!(
        h.controller.tick(),
        Some(TickOutcome::TimedOut { queued: true })
    );
    assert_eq!(
        h.flush().await,
        vec![DeliveryOutcome::TimeoutSettled { delivered: true }]
    );

    let delivered = h.transport.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].payload.status, SubmissionStatus::Timeout);
    assert_eq!(delivered[0].payload.progress_step, 0);

    assert_eq!(h.controller.tick(), None);
    assert!(h.flush().await.is_empty());
    assert_eq!(h.transport.attempts(), 1);
}

#[tokio::test]
async fn idle_mid_survey_submits_partial_answers_and_resets() {
    let mut h = harness();
    reach(&mut h.controller, 3);
    answer(&mut h.controller, 3);
    let started = h.clock.now();

    h.clock.advance(Duration::seconds(40));
    assert_eq!(
        h.controller.tick(),
        Some(TickOutcome::TimedOut { queued: true })
    );
    assert!(h.clock.now() - started >= Duration::seconds(40));
    assert_eq!(h.controller.session().step, Step::GATE);
    assert!(!h.controller.has_deadline());
    h.flush().await;

    let payload = &h.transport.delivered()[0].payload;
    assert_eq!(payload.status, SubmissionStatus::Timeout);
    assert_eq!(payload.progress_step, 3);
    assert_eq!(payload.discovery_ids, "discovery_sns");
    assert_eq!(payload.sns_ids, "");
}

#[tokio::test]
async fn idle_timeout_resets_even_when_delivery_fails() {
    let mut h = harness_with(MemoryTransport::failing());
    reach(&mut h.controller, 2);
    h.clock.advance(Duration::seconds(45));
    assert_eq!(
        h.controller.tick(),
        Some(TickOutcome::TimedOut { queued: true })
    );
    assert_eq!(
        h.flush().await,
        vec![DeliveryOutcome::TimeoutSettled { delivered: false }]
    );
    assert_eq!(h.controller.session().step, Step::GATE);
    assert_eq!(h.controller.phase(), Phase::Answering);
    assert_eq!(h.controller.last_error(), None);
}

#[tokio::test]
async fn idle_during_a_stalled_submission_resets_without_a_second_record() {
    let mut h = harness();
    reach(&mut h.controller, 7);
    answer(&mut h.controller, 7);
    h.controller.go_next().unwrap();
    let stalled = h.controller.take_deliveries();
    assert_eq!(stalled.len(), 1);

    h.clock.advance(Duration::seconds(40));
    assert_eq!(
        h.controller.tick(),
        Some(TickOutcome::TimedOut { queued: false })
    );
    assert!(h.controller.take_deliveries().is_empty());
    assert_eq!(h.controller.session().step, Step::GATE);
    assert_eq!(h.controller.phase(), Phase::Answering);

    // The old request finally lands; the fresh session is left alone.
    for delivery in stalled {
        let report = delivery.send().await;
        assert_eq!(h.controller.complete_delivery(report), DeliveryOutcome::Stale);
    }
    assert_eq!(h.controller.phase(), Phase::Answering);
    assert_eq!(h.transport.delivered().len(), 1);
}

#[tokio::test]
async fn countdown_and_idle_due_together_send_one_record() {
    let mut h = harness();
    reach(&mut h.controller, 7);
    answer(&mut h.controller, 7);

    h.clock.advance(Duration::seconds(45));
    assert_eq!(
        h.controller.tick(),
        Some(TickOutcome::TimedOut { queued: true })
    );
    assert_eq!(h.controller.tick(), None);
    h.flush().await;

    let delivered = h.transport.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].payload.status, SubmissionStatus::Timeout);
    assert_eq!(delivered[0].payload.progress_step, 7);
}

#[test]
fn activity_postpones_the_idle_timeout() {
    let mut h = harness();
    h.clock.advance(Duration::seconds(30));
    h.controller
        .record_activity(survey_wizard::InteractionKind::Pointer);
    h.clock.advance(Duration::seconds(30));
    assert_eq!(h.controller.tick(), None);
    assert!(h.controller.take_deliveries().is_empty());
}
