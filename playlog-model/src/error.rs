use std::fmt::{self, Display};

use crate::job::JobState;

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    InvalidJobId(String),
    InvalidTransition { from: JobState, to: JobState },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidJobId(raw) => {
                write!(f, "invalid job id: {raw:?}")
            }
            ModelError::InvalidTransition { from, to } => {
                write!(f, "job cannot move from {from} to {to}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
