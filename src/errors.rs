use thiserror::Error;

use crate::sync::remote::MirrorError;

/// Error taxonomy shared by every service boundary.
///
/// Local persistence failures abort the requested operation; remote mirror
/// failures never do. `ValidationError` carries a user-correctable message
/// listing every offending field.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Remote mirror error: {0}")]
    Mirror(#[from] MirrorError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}
