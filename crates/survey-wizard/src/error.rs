use std::path::PathBuf;

use survey_spec::{QuestionId, Step};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("step {step} is missing required answers: {missing:?}")]
    Validation {
        step: Step,
        missing: Vec<QuestionId>,
    },
    #[error("question '{question}' is not shown on step {current}")]
    QuestionNotActive { question: QuestionId, current: Step },
    #[error("question '{question}' does not accept {expected}")]
    UnsupportedInput {
        question: QuestionId,
        expected: &'static str,
    },
    #[error("locale can only be chosen on the gate step (current step {0})")]
    LocaleLocked(Step),
    #[error("the wizard is {0} and does not accept input")]
    Busy(&'static str),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("failed to encode submission: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to format submission timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid endpoint '{value}': {source}")]
    Endpoint {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Locale(#[from] survey_spec::UnsupportedLocale),
    #[error("{0}")]
    Invalid(String),
}
