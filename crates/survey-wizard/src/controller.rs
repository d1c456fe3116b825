use std::sync::Arc;

use survey_spec::{
    Cardinality, Locale, LocalizedContent, QuestionId, Step, SurveyCatalog, check_step,
    rental_pickup_required, tr, tr_args,
};
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::KioskConfig;
use crate::error::{ConfigError, TransportError, WizardError};
use crate::idle::{IdleMonitor, InteractionKind};
use crate::session::{Countdown, Phase, QuestionView, SessionSnapshot, WizardSession};
use crate::submission::{SubmissionBuilder, SubmissionRecord, SubmissionStatus};
use crate::timer::AutoAdvanceTimer;
use crate::transport::{Delivery, DeliveryReport, Transport};

/// What a [`WizardController::tick`] did, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown moved the wizard to this step.
    Advanced(Step),
    /// The countdown on the last step queued the complete submission.
    Submitting,
    /// Idle timeout reset the session. `queued` is false when no timeout
    /// record went out, because a confirmed one was already in flight.
    TimedOut { queued: bool },
    /// The thank-you screen expired and a fresh session started.
    Reset,
}

/// What [`WizardController::complete_delivery`] made of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The confirmed submission landed; the thank-you screen is up.
    Submitted,
    /// The confirmed submission failed; the respondent is back on the last step.
    SubmitFailed,
    /// A forced timeout record settled. It never touches the session.
    TimeoutSettled { delivered: bool },
    /// The session the report belongs to is gone.
    Stale,
}

/// Owns the session and applies every intent, countdown expiry and idle
/// check to it. Nothing here awaits the network: submissions are queued as
/// [`Delivery`] values for the host to send, and their reports come back
/// through [`WizardController::complete_delivery`].
pub struct WizardController {
    clock: Arc<dyn Clock>,
    transport: Arc<dyn Transport>,
    catalog: Arc<SurveyCatalog>,
    config: KioskConfig,
    offset: UtcOffset,
    session: WizardSession,
    phase: Phase,
    reset_at: Option<OffsetDateTime>,
    timer: AutoAdvanceTimer,
    idle: IdleMonitor,
    notice: Option<String>,
    last_error: Option<String>,
    outbox: Vec<Delivery>,
    /// Session whose confirmed submission is in flight.
    awaiting: Option<Uuid>,
}

impl std::fmt::Debug for WizardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardController")
            .field("session", &self.session)
            .field("phase", &self.phase)
            .field("timer", &self.timer)
            .field("idle", &self.idle)
            .field("outbox", &self.outbox)
            .field("awaiting", &self.awaiting)
            .finish_non_exhaustive()
    }
}

impl WizardController {
    pub fn new(
        config: KioskConfig,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        Self::with_catalog(config, clock, transport, SurveyCatalog::shared())
    }

    pub fn with_catalog(
        config: KioskConfig,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn Transport>,
        catalog: Arc<SurveyCatalog>,
    ) -> Result<Self, ConfigError> {
        let offset = config.timestamp_offset()?;
        let now = clock.now();
        let session = WizardSession::new(config.default_locale);
        let idle = IdleMonitor::new(config.timing.idle_timeout(), now);
        info!(session = %session.id, locale = %session.locale, "wizard session started");
        Ok(Self {
            clock,
            transport,
            catalog,
            config,
            offset,
            session,
            phase: Phase::Answering,
            reset_at: None,
            timer: AutoAdvanceTimer::default(),
            idle,
            notice: None,
            last_error: None,
            outbox: Vec::new(),
            awaiting: None,
        })
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &KioskConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SurveyCatalog {
        &self.catalog
    }

    /// True while an auto-advance deadline is live.
    pub fn has_deadline(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn deadline(&self) -> Option<OffsetDateTime> {
        self.timer.deadline()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Chooses the display locale on the gate and moves to the first question.
    pub fn select_locale(&mut self, locale: Locale) -> Result<(), WizardError> {
        self.ensure_answering()?;
        if !self.session.step.is_gate() {
            return Err(WizardError::LocaleLocked(self.session.step));
        }
        self.session.locale = locale;
        info!(session = %self.session.id, %locale, "locale selected");
        self.go_to_step(Step::FIRST_QUESTION);
        Ok(())
    }

    /// Picks (single choice) or toggles (multi choice) `label` on `question`.
    pub fn select_option(&mut self, question: QuestionId, label: &str) -> Result<(), WizardError> {
        self.ensure_answering()?;
        self.ensure_active(question)?;
        let catalog = Arc::clone(&self.catalog);
        let answers = &mut self.session.answers;
        match question.cardinality() {
            Cardinality::FreeText => {
                return Err(WizardError::UnsupportedInput {
                    question,
                    expected: "a choice",
                });
            }
            Cardinality::Single => {
                answers.set_single(question, Some(label.to_string()));
            }
            cardinality => {
                let Some(selection) = answers.selection_mut(question) else {
                    return Err(WizardError::UnsupportedInput {
                        question,
                        expected: "a choice",
                    });
                };
                *selection = if cardinality == Cardinality::MultiExclusive {
                    selection.toggle(label, |candidate| catalog.is_exclusive(question, candidate))
                } else {
                    selection.toggle_free(label)
                };
            }
        }
        debug!(session = %self.session.id, %question, label, "option selected");
        self.after_answer();
        Ok(())
    }

    pub fn set_free_text(&mut self, question: QuestionId, value: &str) -> Result<(), WizardError> {
        self.ensure_answering()?;
        self.ensure_active(question)?;
        if question.cardinality() != Cardinality::FreeText {
            return Err(WizardError::UnsupportedInput {
                question,
                expected: "free text",
            });
        }
        self.session
            .answers
            .set_single(question, Some(value.to_string()));
        self.after_answer();
        Ok(())
    }

    /// Manual "Next" / "Submit". Blocked while the current step is unmet.
    /// On the last step this queues the complete submission.
    pub fn go_next(&mut self) -> Result<(), WizardError> {
        self.ensure_answering()?;
        self.idle.touch(self.clock.now());
        let step = self.session.step;
        let check = check_step(step, &self.session.answers, &self.catalog);
        if !check.valid {
            self.last_error = Some(tr(self.session.locale, "notice.required"));
            warn!(session = %self.session.id, %step, missing = ?check.missing_required, "step incomplete");
            return Err(WizardError::Validation {
                step,
                missing: check.missing_required,
            });
        }
        if step.is_last() {
            return self.begin_submit();
        }
        if let Some(next) = step.next() {
            self.go_to_step(next);
        }
        Ok(())
    }

    /// Backward navigation is never gated.
    pub fn go_back(&mut self) -> Result<(), WizardError> {
        self.ensure_answering()?;
        self.idle.touch(self.clock.now());
        if let Some(prev) = self.session.step.prev() {
            self.go_to_step(prev);
        }
        Ok(())
    }

    /// The only way the step changes. Always drops the live deadline first.
    pub fn go_to_step(&mut self, step: Step) {
        self.clear_timer();
        let from = self.session.step;
        self.session.step = step;
        self.last_error = None;
        self.idle.touch(self.clock.now());
        info!(session = %self.session.id, %from, to = %step, "step changed");
    }

    pub fn record_activity(&mut self, kind: InteractionKind) {
        self.idle.touch(self.clock.now());
        debug!(session = %self.session.id, ?kind, "activity");
    }

    /// Runs the periodic checks: thank-you reset, idle timeout, then
    /// countdown expiry.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        let now = self.clock.now();
        if self.phase == Phase::Submitted {
            if self.reset_at.is_some_and(|at| now >= at) {
                self.reset();
                return Some(TickOutcome::Reset);
            }
            return None;
        }

        if self.idle.is_idle(now) {
            return self.expire_idle(now);
        }
        if self.phase == Phase::Submitting {
            return None;
        }

        let expired = self.timer.poll(now)?;
        let step = self.session.step;
        if expired.step != step {
            return None;
        }
        if !check_step(step, &self.session.answers, &self.catalog).valid {
            debug!(session = %self.session.id, %step, "countdown expired on incomplete step");
            return None;
        }
        if step.is_last() {
            self.begin_submit().ok()?;
            return Some(TickOutcome::Submitting);
        }
        let next = step.next()?;
        info!(session = %self.session.id, %step, "countdown advanced");
        self.go_to_step(next);
        Some(TickOutcome::Advanced(next))
    }

    /// Discards the session and starts over on the gate.
    pub fn reset(&mut self) {
        self.clear_timer();
        let previous = self.session.id;
        self.session = WizardSession::new(self.config.default_locale);
        self.phase = Phase::Answering;
        self.reset_at = None;
        self.notice = None;
        self.last_error = None;
        self.awaiting = None;
        self.idle.touch(self.clock.now());
        info!(session = %self.session.id, %previous, "session reset");
    }

    /// Drains the records waiting to be sent. The host runs each
    /// [`Delivery::send`] and hands the report back.
    pub fn take_deliveries(&mut self) -> Vec<Delivery> {
        std::mem::take(&mut self.outbox)
    }

    /// Applies the result of a [`Delivery`]. Only the confirmed submission of
    /// the current session moves the phase; everything else is logged.
    pub fn complete_delivery(&mut self, report: DeliveryReport) -> DeliveryOutcome {
        let DeliveryReport {
            session,
            status,
            result,
        } = report;
        if status == SubmissionStatus::Timeout {
            match &result {
                Ok(()) => info!(%session, status = status.as_str(), "submission delivered"),
                Err(err) => {
                    warn!(%session, status = status.as_str(), error = %err, "timeout submission dropped")
                }
            }
            return DeliveryOutcome::TimeoutSettled {
                delivered: result.is_ok(),
            };
        }
        if self.phase != Phase::Submitting || self.awaiting != Some(session) {
            info!(%session, delivered = result.is_ok(), "submission settled after reset");
            return DeliveryOutcome::Stale;
        }
        self.awaiting = None;
        match result {
            Ok(()) => {
                let now = self.clock.now();
                self.phase = Phase::Submitted;
                self.reset_at = Some(now + self.config.timing.submitted_reset());
                self.notice = Some(tr(self.session.locale, "notice.success"));
                self.idle.touch(now);
                info!(%session, status = status.as_str(), "submission delivered");
                DeliveryOutcome::Submitted
            }
            Err(err) => {
                self.fail_submission(&err);
                DeliveryOutcome::SubmitFailed
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let now = self.clock.now();
        let session = &self.session;
        let locale = session.locale;
        let step = session.step;
        let answers = &session.answers;
        let rental_required = rental_pickup_required(answers, &self.catalog);
        let content = LocalizedContent::new(&self.catalog);

        let countdown = self
            .timer
            .remaining(now)
            .zip(self.timer.total())
            .map(|(remaining, total)| Countdown {
                remaining_ms: remaining.whole_milliseconds().max(0) as u64,
                total_ms: total.whole_milliseconds().max(0) as u64,
                seconds_left: self.timer.seconds_left(now).unwrap_or(0),
            });

        let questions = step
            .questions()
            .filter(|question| *question != QuestionId::RentalPickup || rental_required)
            .map(|question| QuestionView {
                id: question,
                title: content.question_title(locale, question),
                hint: question.spec().hint_key.map(|key| tr(locale, key)),
                choices: content
                    .choices(locale, question)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                selected: answers
                    .labels(question)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
            .collect();

        SessionSnapshot {
            session_id: session.id.to_string(),
            cosmetic_seed: session.cosmetic_seed,
            step,
            locale,
            phase: self.phase,
            answers: answers.clone(),
            check: check_step(step, answers, &self.catalog),
            rental_pickup_required: rental_required,
            countdown,
            questions,
            notice: self.notice.clone(),
            last_error: self.last_error.clone(),
        }
    }

    fn ensure_answering(&self) -> Result<(), WizardError> {
        match self.phase {
            Phase::Answering => Ok(()),
            Phase::Submitting => Err(WizardError::SubmissionInFlight),
            Phase::Submitted => Err(WizardError::Busy("submitted")),
        }
    }

    fn ensure_active(&self, question: QuestionId) -> Result<(), WizardError> {
        let current = self.session.step;
        if question.step() != current {
            return Err(WizardError::QuestionNotActive { question, current });
        }
        Ok(())
    }

    /// Re-arms the countdown when the step is satisfied, clears it otherwise.
    fn after_answer(&mut self) {
        let now = self.clock.now();
        self.idle.touch(now);
        let step = self.session.step;
        if !check_step(step, &self.session.answers, &self.catalog).valid {
            self.clear_timer();
            return;
        }
        self.last_error = None;
        match self.config.timing.auto_advance.for_step(step) {
            Some(after) => {
                self.timer.schedule(step, now, after);
                debug!(session = %self.session.id, %step, secs = after.whole_seconds(), "countdown armed");
            }
            None => self.clear_timer(),
        }
    }

    fn clear_timer(&mut self) {
        if self.timer.is_armed() {
            debug!(session = %self.session.id, step = %self.session.step, "countdown cleared");
        }
        self.timer.clear();
    }

    /// Enters `Submitting` and queues the complete record.
    fn begin_submit(&mut self) -> Result<(), WizardError> {
        self.clear_timer();
        let delivery = match self.prepare(SubmissionStatus::Complete) {
            Ok(delivery) => delivery,
            Err(err) => {
                self.fail_submission(&err);
                return Err(err.into());
            }
        };
        self.phase = Phase::Submitting;
        self.awaiting = Some(self.session.id);
        self.last_error = None;
        self.notice = Some(tr(self.session.locale, "notice.sending"));
        self.outbox.push(delivery);
        info!(session = %self.session.id, status = "complete", "submission queued");
        Ok(())
    }

    /// Back to answering on the last step with the error shown.
    fn fail_submission(&mut self, err: &TransportError) {
        let message = err.to_string();
        self.phase = Phase::Answering;
        self.notice = None;
        self.last_error = Some(tr_args(
            self.session.locale,
            "notice.error",
            &[("message", message.as_str())],
        ));
        self.idle.touch(self.clock.now());
        warn!(session = %self.session.id, status = "complete", error = %err, "submission failed");
    }

    /// Queues a best-effort partial submission and resets unconditionally.
    /// The idle monitor's in-flight flag keeps it to one run at a time, and a
    /// session whose confirmed record is already out gets no second one.
    fn expire_idle(&mut self, now: OffsetDateTime) -> Option<TickOutcome> {
        if !self.idle.try_begin(now) {
            return None;
        }
        self.clear_timer();
        let step = self.session.step;
        let queued = if self.awaiting.take().is_some() {
            info!(session = %self.session.id, %step, "idle timeout while submitting");
            false
        } else {
            info!(session = %self.session.id, %step, "idle timeout");
            match self.prepare(SubmissionStatus::Timeout) {
                Ok(delivery) => {
                    self.outbox.push(delivery);
                    true
                }
                Err(err) => {
                    warn!(session = %self.session.id, status = "timeout", error = %err, "timeout submission dropped");
                    false
                }
            }
        };
        self.reset();
        self.idle.finish(self.clock.now());
        Some(TickOutcome::TimedOut { queued })
    }

    fn prepare(&self, status: SubmissionStatus) -> Result<Delivery, TransportError> {
        let payload = SubmissionBuilder::new(&self.catalog).build(&self.session, status);
        let record =
            SubmissionRecord::stamp(payload, self.clock.now(), self.offset, &self.config.client_id)?;
        Ok(Delivery::new(self.session.id, record, Arc::clone(&self.transport)))
    }
}
