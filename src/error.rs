//! Errors

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, FdstagError>;

/// Errors raised while setting up or driving the discretisation
#[derive(Error, Debug)]
pub enum FdstagError {
    /// Invalid or inconsistent parameter
    #[error("invalid parameter `{parameter}`: {message}")]
    Config {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Description of the problem
        message: String,
    },

    /// Grid size incompatible with the decomposition along one axis
    #[error("{message} in {axis}-direction")]
    Axis {
        /// Name of the offending axis
        axis: &'static str,
        /// Description of the problem
        message: String,
    },

    /// A required parameter was not supplied
    #[error("required parameter `{0}` is not defined")]
    MissingParameter(&'static str),

    /// A caller-provided buffer does not match the grid
    #[error("size mismatch for {what}: expected {expected}, found {found}")]
    SizeMismatch {
        /// Buffer description
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        found: usize,
    },

    /// File I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed RON input
    #[cfg(feature = "serde")]
    #[error("cannot parse configuration: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

impl FdstagError {
    pub(crate) fn config(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::Config {
            parameter,
            message: message.into(),
        }
    }

    pub(crate) fn axis(axis: &'static str, message: impl Into<String>) -> Self {
        Self::Axis {
            axis,
            message: message.into(),
        }
    }

    pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::SizeMismatch {
                what,
                expected,
                found,
            })
        }
    }
}
