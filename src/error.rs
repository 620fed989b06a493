//! Error types for arithmetic, encoding and transaction resolution

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("Value out of range: {0}")]
    Range(String),

    #[error("Field mismatch: {0}")]
    FieldMismatch(String),

    #[error("Curve mismatch: {0}")]
    CurveMismatch(String),

    #[error("Point not on curve: {0}")]
    NotOnCurve(String),

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("Transaction resolution failed: {0}")]
    Resolution(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for TxError {
    fn from(err: std::io::Error) -> Self {
        TxError::MalformedEncoding(format!("truncated input: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, TxError>;
