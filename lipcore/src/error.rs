//! Error types shared by every analysis in this crate.

use thiserror::Error;

/// Failure of a single requested operation.
///
/// None of these are retried: trajectory and label data are deterministic,
/// so the same input yields the same error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid cutoff, empty selection, invalid frame range and the like
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A frame position was queried before its relation was computed
    #[error("Not computed: frame position {position} (trajectory frame {frame}) has no stored relation")]
    NotComputed { position: usize, frame: usize },

    /// Provider orderings or mask shapes that do not line up
    #[error("Inconsistent input: {0}")]
    InconsistentInput(String),
}

impl AnalysisError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        AnalysisError::Configuration(message.into())
    }

    /// Creates an inconsistent-input error.
    pub fn inconsistent(message: impl Into<String>) -> Self {
        AnalysisError::InconsistentInput(message.into())
    }

    pub fn not_computed(position: usize, frame: usize) -> Self {
        AnalysisError::NotComputed { position, frame }
    }

    /// Returns `true` for errors caused by caller configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AnalysisError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
