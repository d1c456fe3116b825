use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::catalog::SurveyCatalog;
use crate::locale::Locale;
use crate::spec::QuestionId;

pub type Messages = BTreeMap<String, String>;

/// Keys every locale table must define.
pub const I18N_KEYS: &[&str] = &[
    "survey.title",
    "question.nationality.title",
    "question.nationality.hint",
    "question.age_group.title",
    "question.discovery.title",
    "question.social_media.title",
    "question.transport.title",
    "question.rental_pickup.title",
    "question.lacking.title",
    "question.manners_source.title",
    "button.next",
    "button.back",
    "button.submit",
    "notice.sending",
    "notice.success",
    "notice.error",
    "notice.required",
    "select.placeholder",
    "auto.next",
    "auto.submit",
    "thanks.title",
    "thanks.message",
    "thanks.note",
];

static TABLES: OnceLock<BTreeMap<Locale, Messages>> = OnceLock::new();

fn embedded(locale: Locale) -> &'static str {
    match locale {
        Locale::Ja => include_str!("../i18n/ja.json"),
        Locale::En => include_str!("../i18n/en.json"),
        Locale::Zh => include_str!("../i18n/zh.json"),
        Locale::Ko => include_str!("../i18n/ko.json"),
        Locale::Es => include_str!("../i18n/es.json"),
    }
}

fn tables() -> &'static BTreeMap<Locale, Messages> {
    TABLES.get_or_init(|| {
        Locale::ALL
            .into_iter()
            .map(|locale| {
                let messages: Messages = serde_json::from_str(embedded(locale))
                    .unwrap_or_else(|err| panic!("parse embedded i18n/{locale}.json: {err}"));
                (locale, messages)
            })
            .collect()
    })
}

/// String table for `locale`.
pub fn messages(locale: Locale) -> &'static Messages {
    &tables()[&locale]
}

/// Looks `key` up in `locale`, then English, then returns the key itself.
pub fn tr(locale: Locale, key: &str) -> String {
    messages(locale)
        .get(key)
        .or_else(|| messages(Locale::En).get(key))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// Like [`tr`], replacing `{name}` placeholders with `args`.
pub fn tr_args(locale: Locale, key: &str, args: &[(&str, &str)]) -> String {
    let mut output = tr(locale, key);
    for (name, value) in args {
        output = output.replace(&format!("{{{name}}}"), value);
    }
    output
}

/// Read-only lookup of everything a presentation layer shows for a locale.
#[derive(Debug, Clone, Copy)]
pub struct LocalizedContent<'a> {
    catalog: &'a SurveyCatalog,
}

impl LocalizedContent<'static> {
    pub fn builtin() -> Self {
        Self {
            catalog: SurveyCatalog::builtin(),
        }
    }
}

impl<'a> LocalizedContent<'a> {
    pub fn new(catalog: &'a SurveyCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'a SurveyCatalog {
        self.catalog
    }

    pub fn text(&self, locale: Locale, key: &str) -> String {
        tr(locale, key)
    }

    pub fn question_title(&self, locale: Locale, question: QuestionId) -> String {
        tr(locale, question.spec().title_key)
    }

    pub fn choices(&self, locale: Locale, question: QuestionId) -> Vec<&'a str> {
        self.catalog.labels_for(question, locale)
    }
}
