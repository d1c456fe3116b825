use std::io;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "survey_kiosk=info,survey_wizard=info";

/// Installs the global subscriber. Logs go to stderr so stdout carries
/// only snapshots.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(err) = result {
        eprintln!("survey-kiosk: tracing initialization failed: {err}");
    }
}
