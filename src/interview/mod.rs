pub mod answers;
pub mod aptitude;
pub mod coding;
pub mod engine;
pub mod hr;
pub mod prompts;
pub mod questions;
pub mod report;
pub mod slot;

pub use answers::*;
pub use aptitude::*;
pub use coding::*;
pub use engine::*;
pub use hr::*;
pub use questions::*;
pub use report::*;
pub use slot::*;

use thiserror::Error;

use crate::generation::GenerationError;
use crate::session::{InvalidTransition, Stage};

/// Gate shared by the aptitude round and code evaluation.
pub const PASS_THRESHOLD: f64 = 70.0;

pub const HR_OPENING_LINE: &str = "Hello! I'm the AI HR Manager. \
Congratulations on passing the technical rounds. To start, could you tell me about a time \
you had to learn a new technology quickly under pressure?";

/// Every variant is scoped to the current round and leaves the stage untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterviewError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not allowed during the {actual} stage (expected {expected})")]
    WrongStage { expected: Stage, actual: Stage },
    #[error("a generation call is already in flight for this round")]
    Busy,
    #[error("round has not been started")]
    NotStarted,
    #[error("answers were already submitted")]
    AlreadySubmitted,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

pub type Result<T> = std::result::Result<T, InterviewError>;

pub fn passes(score: f64) -> bool {
    score >= PASS_THRESHOLD
}
