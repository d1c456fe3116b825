use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locale::Locale;
use crate::spec::QuestionId;

/// Id reported for a label that matches no option in any locale.
pub const UNKNOWN_ID: &str = "unknown";

static BUILTIN: Lazy<Arc<SurveyCatalog>> = Lazy::new(|| {
    Arc::new(
        SurveyCatalog::from_json(include_str!("../catalog/options.json"))
            .expect("parse embedded catalog/options.json"),
    )
});

/// One canonical choice with its per-locale display labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OptionDef {
    pub id: String,
    pub labels: BTreeMap<Locale, String>,
    /// Selecting this option clears every other selection ("none of the above").
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclusive: bool,
    /// Choosing this option makes the rental pickup sub-question mandatory.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rental: bool,
}

impl OptionDef {
    pub fn label(&self, locale: Locale) -> Option<&str> {
        self.labels.get(&locale).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("catalog data is not valid json: {0}")]
    Parse(String),
    #[error("{question}: option id '{id}' is defined twice")]
    DuplicateId { question: QuestionId, id: String },
    #[error("{question}: label '{label}' maps to both '{first}' and '{second}'")]
    AmbiguousLabel {
        question: QuestionId,
        label: String,
        first: String,
        second: String,
    },
    #[error("{question}: option '{id}' has no label in any locale")]
    Unlabelled { question: QuestionId, id: String },
}

/// Options of a single question plus the label → option reverse index.
#[derive(Debug, Clone)]
pub struct OptionCatalog {
    question: QuestionId,
    options: Vec<OptionDef>,
    fallback_locale: Option<Locale>,
    by_label: HashMap<String, usize>,
}

impl OptionCatalog {
    /// Builds the catalog and its reverse index. Every label of every locale
    /// is indexed so lookups work regardless of the locale that produced them.
    pub fn new(
        question: QuestionId,
        options: Vec<OptionDef>,
        fallback_locale: Option<Locale>,
    ) -> Result<Self, CatalogError> {
        let mut by_label: HashMap<String, usize> = HashMap::new();
        for (idx, option) in options.iter().enumerate() {
            if options[..idx].iter().any(|prior| prior.id == option.id) {
                return Err(CatalogError::DuplicateId {
                    question,
                    id: option.id.clone(),
                });
            }
            if option.labels.is_empty() {
                return Err(CatalogError::Unlabelled {
                    question,
                    id: option.id.clone(),
                });
            }
            for label in option.labels.values() {
                if let Some(&existing) = by_label.get(label)
                    && existing != idx
                {
                    return Err(CatalogError::AmbiguousLabel {
                        question,
                        label: label.clone(),
                        first: options[existing].id.clone(),
                        second: option.id.clone(),
                    });
                }
                by_label.insert(label.clone(), idx);
            }
        }

        Ok(Self {
            question,
            options,
            fallback_locale,
            by_label,
        })
    }

    pub fn question(&self) -> QuestionId {
        self.question
    }

    pub fn options(&self) -> &[OptionDef] {
        &self.options
    }

    pub fn option_for_label(&self, label: &str) -> Option<&OptionDef> {
        self.by_label.get(label).map(|&idx| &self.options[idx])
    }

    /// Canonical id for a label from any locale, or [`UNKNOWN_ID`].
    pub fn id_for(&self, label: &str) -> &str {
        self.option_for_label(label)
            .map(|option| option.id.as_str())
            .unwrap_or(UNKNOWN_ID)
    }

    /// Ordered display labels for `locale`. Options without a label in that
    /// locale (or in the catalog fallback locale) are left out.
    pub fn labels_for(&self, locale: Locale) -> Vec<&str> {
        self.options
            .iter()
            .filter_map(|option| self.display_label(option, locale))
            .collect()
    }

    pub fn label_in(&self, id: &str, locale: Locale) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.id == id)
            .and_then(|option| self.display_label(option, locale))
    }

    pub fn is_exclusive(&self, label: &str) -> bool {
        self.option_for_label(label)
            .is_some_and(|option| option.exclusive)
    }

    pub fn is_rental(&self, label: &str) -> bool {
        self.option_for_label(label).is_some_and(|option| option.rental)
    }

    fn display_label<'a>(&self, option: &'a OptionDef, locale: Locale) -> Option<&'a str> {
        option
            .label(locale)
            .or_else(|| self.fallback_locale.and_then(|fallback| option.label(fallback)))
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    fallback_locale: Option<Locale>,
    options: Vec<OptionDef>,
}

/// Option catalogs for every question that offers fixed choices.
#[derive(Debug, Clone)]
pub struct SurveyCatalog {
    catalogs: BTreeMap<QuestionId, OptionCatalog>,
}

impl SurveyCatalog {
    /// Catalog compiled into the crate, built once per process.
    pub fn builtin() -> &'static SurveyCatalog {
        &BUILTIN
    }

    /// Another handle on the builtin catalog; never rebuilds the index.
    pub fn shared() -> Arc<SurveyCatalog> {
        Arc::clone(&BUILTIN)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let parsed: BTreeMap<QuestionId, RawCatalog> =
            serde_json::from_str(raw).map_err(|err| CatalogError::Parse(err.to_string()))?;
        let mut catalogs = BTreeMap::new();
        for (question, raw) in parsed {
            let catalog = OptionCatalog::new(question, raw.options, raw.fallback_locale)?;
            catalogs.insert(question, catalog);
        }
        Ok(Self { catalogs })
    }

    pub fn get(&self, question: QuestionId) -> Option<&OptionCatalog> {
        self.catalogs.get(&question)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionCatalog> {
        self.catalogs.values()
    }

    /// Canonical id for `label`; questions without a catalog resolve to
    /// [`UNKNOWN_ID`] like any other unmatched label.
    pub fn id_for(&self, question: QuestionId, label: &str) -> &str {
        self.get(question)
            .map(|catalog| catalog.id_for(label))
            .unwrap_or(UNKNOWN_ID)
    }

    pub fn labels_for(&self, question: QuestionId, locale: Locale) -> Vec<&str> {
        self.get(question)
            .map(|catalog| catalog.labels_for(locale))
            .unwrap_or_default()
    }

    pub fn is_exclusive(&self, question: QuestionId, label: &str) -> bool {
        self.get(question)
            .is_some_and(|catalog| catalog.is_exclusive(label))
    }

    pub fn is_rental(&self, label: &str) -> bool {
        self.get(QuestionId::Transport)
            .is_some_and(|catalog| catalog.is_rental(label))
    }
}
