#![allow(missing_docs)]

pub mod answers;
pub mod catalog;
pub mod i18n;
pub mod locale;
pub mod selection;
pub mod spec;
pub mod validate;

pub use answers::AnswerState;
pub use catalog::{CatalogError, OptionCatalog, OptionDef, SurveyCatalog, UNKNOWN_ID};
pub use i18n::{LocalizedContent, tr, tr_args};
pub use locale::{Locale, UnsupportedLocale};
pub use selection::SelectionSet;
pub use spec::{Cardinality, QuestionId, QuestionSpec, Step, survey_questions};
pub use validate::{StepCheck, check_step, is_step_satisfied, rental_pickup_required};
