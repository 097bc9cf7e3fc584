use lipcore::error::AnalysisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrajError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl TrajError {
    /// The analysis error behind this one, if any.
    pub fn analysis(&self) -> Option<&AnalysisError> {
        match self {
            TrajError::Analysis(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrajError>;

/// Prefixes the frame number to configuration and input errors raised while processing it.
pub fn at_frame(error: AnalysisError, frame: usize) -> AnalysisError {
    match error {
        AnalysisError::Configuration(msg) => AnalysisError::Configuration(format!("frame {}: {}", frame, msg)),
        AnalysisError::InconsistentInput(msg) => {
            AnalysisError::InconsistentInput(format!("frame {}: {}", frame, msg))
        }
        other => other,
    }
}
