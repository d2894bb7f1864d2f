use std::fmt;

use crate::repo::StoreError;

/// Failure of a whole allocation call. Per-item batch rejections are not
/// errors — they travel in the batch outcome. `SpaceNotFound` and
/// `Conflict` are expected, recoverable-by-caller results; `Store` is the
/// only fatal case.
#[derive(Debug, PartialEq, Eq)]
pub enum EngineError {
    SpaceNotFound,
    Conflict,
    Store(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::SpaceNotFound => f.write_str("Space not found"),
            EngineError::Conflict => {
                f.write_str("The selected time slot is already booked.")
            }
            EngineError::Store(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Store(e.0)
    }
}
