#![allow(missing_docs)]

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod idle;
pub mod runtime;
pub mod session;
pub mod submission;
pub mod timer;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AutoAdvancePolicy, KioskConfig, TimingConfig};
pub use controller::{DeliveryOutcome, TickOutcome, WizardController};
pub use error::{ConfigError, TransportError, WizardError};
pub use idle::{IdleMonitor, InteractionKind};
pub use runtime::{Intent, WizardRuntime, apply};
pub use session::{Countdown, Phase, QuestionView, SessionSnapshot, WizardSession};
pub use submission::{
    SubmissionBuilder, SubmissionPayload, SubmissionRecord, SubmissionStatus, build,
};
pub use timer::{AutoAdvanceTimer, Expired};
pub use transport::{
    Delivery, DeliveryReport, HttpTransport, LogTransport, MemoryTransport, Transport,
    transport_for,
};
