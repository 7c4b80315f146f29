//! Prompt engine: one validated question/answer exchange at a time

pub mod engine;
pub mod question;

pub use engine::{PromptEngine, INVALID_CHOICE_MESSAGE};
pub use question::{Answer, Question, QuestionKind};
