//! Error types for the conversion pipeline.

use thiserror::Error;

/// Errors that can occur during HTML to text conversion.
///
/// Malformed markup is never an error: the converter recovers locally from
/// bad entities, unbalanced tags, and truncated input. The only runtime
/// failure mode is the output sink refusing a write.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The output sink failed to accept a write.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ConversionError>;
