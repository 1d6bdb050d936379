use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unknown exercise: {0}")]
    UnknownExercise(String),
    #[error("unknown sound language: {0}")]
    UnknownLanguage(String),
}
