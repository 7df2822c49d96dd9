use crate::types::SlotId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HavenError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid save slot {slot}: expected 1..={max}")]
    InvalidSlot { slot: SlotId, max: SlotId },

    #[error("Mode '{name}' is not registered")]
    ModeNotRegistered { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type HavenResult<T> = Result<T, HavenError>;
