//! Error types for the nesting engine.

use thiserror::Error;

/// Errors surfaced by the nesting engine.
///
/// Geometric NFP failures (an orbit that never closes, a failed area sanity
/// check) are NOT errors: they are reported as `None` by the generator and the
/// affected pair is treated as unplaceable for the attempt. Everything here is
/// fatal at setup time or an explicit external stop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid geometry input (e.g. fewer than 3 points).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Invalid configuration, including a bin offset that degenerates to zero
    /// or multiple loops.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// No parts were supplied to the solver.
    #[error("no parts to nest")]
    NoParts,

    /// Operation was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using the engine error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidGeometry("polygon must have at least 3 points".to_string());
        assert!(err.to_string().contains("at least 3 points"));

        let err = Error::ConfigError("mutation_rate must be in 0..=100".to_string());
        assert!(err.to_string().starts_with("configuration error"));
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(Error::NoParts, Error::NoParts);
        assert_ne!(Error::Cancelled, Error::NoParts);
    }
}
