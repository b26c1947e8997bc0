use crate::domain::backend::BackendId;
use derive_more::Display;
use serde::Serialize;
use strum::AsRefStr;

/// Everything that can stop a benchmark run.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum BenchError {
    /// User asked to stop. Not a failure.
    #[display(fmt = "Benchmark cancelled")]
    Cancelled,
    #[display(fmt = "Backend {} failed: {}", backend, message)]
    Backend { backend: BackendId, message: String },
    #[display(fmt = "No adapter registered for backend {}", _0)]
    UnknownBackend(BackendId),
    #[display(fmt = "A benchmark run is already active")]
    AlreadyRunning,
    #[display(fmt = "Invalid configuration: {}", _0)]
    InvalidConfig(String),
    #[display(fmt = "Frame clock failure: {}", _0)]
    Clock(String),
    #[display(fmt = "Serialization failed: {}", _0)]
    Serialization(String),
}

impl std::error::Error for BenchError {}

/// Coarse tag surfaced to JS so callers can tell cancellation from failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Cancelled,
    Backend,
    Busy,
    Config,
    Internal,
}

impl BenchError {
    pub fn backend(backend: BackendId, message: impl Into<String>) -> Self {
        BenchError::Backend { backend, message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BenchError::Cancelled => ErrorKind::Cancelled,
            BenchError::Backend { .. } | BenchError::UnknownBackend(_) => ErrorKind::Backend,
            BenchError::AlreadyRunning => ErrorKind::Busy,
            BenchError::InvalidConfig(_) => ErrorKind::Config,
            BenchError::Clock(_) | BenchError::Serialization(_) => ErrorKind::Internal,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BenchError::Cancelled)
    }
}

pub type BenchResult<T> = Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_separate_cancellation_from_faults() {
        assert_eq!(BenchError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(BenchError::backend(BackendId::DeckGl, "boom").kind(), ErrorKind::Backend);
        assert_eq!(BenchError::AlreadyRunning.kind().as_ref(), "busy");
        assert_eq!(
            BenchError::backend(BackendId::Leaflet, "boom").to_string(),
            "Backend leaflet failed: boom"
        );
    }
}
