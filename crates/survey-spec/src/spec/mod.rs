pub mod question;

pub use question::{Cardinality, QuestionId, QuestionSpec, Step, survey_questions};
