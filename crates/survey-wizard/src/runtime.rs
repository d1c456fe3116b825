use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use survey_spec::{Locale, QuestionId};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::controller::WizardController;
use crate::error::WizardError;
use crate::idle::InteractionKind;
use crate::session::SessionSnapshot;
use crate::transport::DeliveryReport;

/// One respondent action, as sent by a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    SelectLocale { locale: Locale },
    SelectOption { question: QuestionId, label: String },
    SetFreeText { question: QuestionId, value: String },
    GoNext,
    GoBack,
    Activity { kind: InteractionKind },
}

/// Applies one intent to the controller.
pub fn apply(controller: &mut WizardController, intent: Intent) -> Result<(), WizardError> {
    match intent {
        Intent::SelectLocale { locale } => controller.select_locale(locale),
        Intent::SelectOption { question, label } => controller.select_option(question, &label),
        Intent::SetFreeText { question, value } => controller.set_free_text(question, &value),
        Intent::GoNext => controller.go_next(),
        Intent::GoBack => controller.go_back(),
        Intent::Activity { kind } => {
            controller.record_activity(kind);
            Ok(())
        }
    }
}

/// Cooperative event loop around a [`WizardController`].
///
/// Intents, the idle cadence, the countdown cadence and finished deliveries
/// are multiplexed on one task, so every mutation runs to completion before
/// the next starts. Transport calls run on their own tasks and never hold
/// up the cadences. The countdown cadence is only polled while a deadline
/// is armed. Errors are logged and never end the loop; it stops once the
/// intent sender is dropped and the deliveries still in flight settle, and
/// hands the controller back.
pub struct WizardRuntime {
    controller: WizardController,
    intents: mpsc::Receiver<Intent>,
    snapshots: mpsc::UnboundedSender<SessionSnapshot>,
    deliveries: JoinSet<DeliveryReport>,
}

impl WizardRuntime {
    pub fn new(
        controller: WizardController,
        intents: mpsc::Receiver<Intent>,
        snapshots: mpsc::UnboundedSender<SessionSnapshot>,
    ) -> Self {
        Self {
            controller,
            intents,
            snapshots,
            deliveries: JoinSet::new(),
        }
    }

    pub async fn run(mut self) -> WizardController {
        let timing = self.controller.config().timing.clone();
        let mut idle_tick = interval(timing.idle_poll());
        idle_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut countdown_tick = interval(timing.countdown_poll());
        countdown_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last = self.publish(None);
        loop {
            self.dispatch();
            let armed = self.controller.has_deadline();
            let sending = !self.deliveries.is_empty();
            tokio::select! {
                intent = self.intents.recv() => {
                    let Some(intent) = intent else {
                        debug!("intent channel closed");
                        break;
                    };
                    if let Err(err) = apply(&mut self.controller, intent) {
                        warn!(error = %err, "intent rejected");
                    }
                    last = self.publish(None);
                }
                _ = idle_tick.tick() => {
                    if let Some(outcome) = self.controller.tick() {
                        debug!(?outcome, "idle cadence");
                    }
                    last = self.publish(Some(&last));
                }
                _ = countdown_tick.tick(), if armed => {
                    if let Some(outcome) = self.controller.tick() {
                        debug!(?outcome, "countdown cadence");
                    }
                    last = self.publish(Some(&last));
                }
                Some(joined) = self.deliveries.join_next(), if sending => {
                    self.settle(joined);
                    last = self.publish(Some(&last));
                }
            }
        }

        self.dispatch();
        while let Some(joined) = self.deliveries.join_next().await {
            self.settle(joined);
            last = self.publish(Some(&last));
        }
        self.controller
    }

    /// Spawns every delivery the controller has queued.
    fn dispatch(&mut self) {
        for delivery in self.controller.take_deliveries() {
            debug!(session = %delivery.session(), status = delivery.status().as_str(), "sending submission");
            self.deliveries.spawn(delivery.send());
        }
    }

    fn settle(&mut self, joined: Result<DeliveryReport, JoinError>) {
        match joined {
            Ok(report) => {
                let outcome = self.controller.complete_delivery(report);
                debug!(?outcome, "delivery settled");
            }
            Err(err) => warn!(error = %err, "delivery task failed"),
        }
    }

    /// Sends a snapshot unless it matches `previous`.
    fn publish(&self, previous: Option<&SessionSnapshot>) -> SessionSnapshot {
        let snapshot = self.controller.snapshot();
        if previous != Some(&snapshot) && self.snapshots.send(snapshot.clone()).is_err() {
            debug!("snapshot receiver dropped");
        }
        snapshot
    }
}
