use std::env;

use survey_spec::{Locale, UnsupportedLocale};
use unic_langid::LanguageIdentifier;

/// `--locale auto` asks the host environment instead of naming a locale.
pub const AUTO: &str = "auto";

fn detect_env_locale() -> Option<String> {
    for key in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        if let Ok(val) = env::var(key) {
            let trimmed = val.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

fn detect_system_locale() -> Option<String> {
    sys_locale::get_locale()
}

fn normalize_locale(raw: &str) -> Option<LanguageIdentifier> {
    let mut cleaned = raw.trim();
    if cleaned.is_empty() {
        return None;
    }
    if let Some((head, _)) = cleaned.split_once('.') {
        cleaned = head;
    }
    if let Some((head, _)) = cleaned.split_once('@') {
        cleaned = head;
    }
    cleaned.replace('_', "-").parse::<LanguageIdentifier>().ok()
}

/// Maps `ja_JP.UTF-8`, `zh-Hant-TW`, `es` and the like onto a survey locale
/// by primary language.
pub fn resolve_supported_locale(candidate: &str) -> Option<Locale> {
    let lid = normalize_locale(candidate)?;
    lid.language.as_str().parse().ok()
}

/// Picks the display locale for a new session.
///
/// An explicit CLI value must name a supported locale. `auto` consults
/// `LC_ALL`/`LC_MESSAGES`/`LANG`, then the OS, and falls back to
/// `configured` when neither resolves.
pub fn select_locale(cli: Option<&str>, configured: Locale) -> Result<Locale, UnsupportedLocale> {
    match cli {
        None => Ok(configured),
        Some(value) if value.eq_ignore_ascii_case(AUTO) => Ok(detect_env_locale()
            .and_then(|raw| resolve_supported_locale(&raw))
            .or_else(|| detect_system_locale().and_then(|raw| resolve_supported_locale(&raw)))
            .unwrap_or(configured)),
        Some(value) => {
            resolve_supported_locale(value).ok_or_else(|| UnsupportedLocale(value.to_string()))
        }
    }
}
