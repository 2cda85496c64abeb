// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid booking status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Booking not found: {0}")]
    BookingNotFound(i64),

    #[error("Invalid post capacity: {0}")]
    InvalidCapacity(i64),

    #[error("Post number out of range: {0}")]
    PostOutOfRange(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
