use crate::domain::models::BlockId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("clock time must be HH:MM, got '{input}'")]
pub struct FormatError {
    pub input: String,
}

impl FormatError {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("sleep block of {duration} minutes is shorter than the 15 minute minimum")]
    TooShort { duration: u32 },
    #[error("sleep block of {duration} minutes is longer than a full day")]
    TooLong { duration: u32 },
    #[error("sleep block overlaps {with}")]
    Collision { with: BlockId },
    #[error("sleep block id {id} appears more than once")]
    DuplicateId { id: BlockId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("sleep block is shorter than 15 minutes")]
    TooShort,
    #[error("sleep block is longer than a full day")]
    TooLong,
    #[error("sleep block overlaps {with}")]
    Collision { with: BlockId },
    #[error("sleep block not found: {0}")]
    NotFound(BlockId),
    #[error("sleep block id {0} appears more than once")]
    DuplicateId(BlockId),
    #[error(transparent)]
    InvalidFormat(#[from] FormatError),
}

impl From<ValidationError> for MutationError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::TooShort { .. } => Self::TooShort,
            ValidationError::TooLong { .. } => Self::TooLong,
            ValidationError::Collision { with } => Self::Collision { with },
            ValidationError::DuplicateId { id } => Self::DuplicateId(id),
        }
    }
}

impl MutationError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::TooShort => "tooShort",
            Self::TooLong => "tooLong",
            Self::Collision { .. } => "collision",
            Self::NotFound(_) => "notFound",
            Self::DuplicateId(_) => "duplicateId",
            Self::InvalidFormat(_) => "invalidFormat",
        }
    }
}
