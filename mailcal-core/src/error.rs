//! Error types for mailcal.

use thiserror::Error;

/// Errors that can occur while running the assistant.
#[derive(Error, Debug)]
pub enum MailcalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Booked-slot memory error: {0}")]
    Memory(String),

    #[error("Mailbox error: {0}")]
    Mailbox(String),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("Could not interpret date/time: {0}")]
    Extraction(String),
}

/// Result type alias for mailcal operations.
pub type MailcalResult<T> = Result<T, MailcalError>;
