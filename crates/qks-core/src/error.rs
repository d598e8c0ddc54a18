//! Error types for the featurization core.

use std::time::Duration;

use thiserror::Error;

/// Errors raised at the executor boundary.
///
/// Adapters return these from [`Executor::compile`](crate::Executor::compile)
/// and [`Executor::run`](crate::Executor::run). The featurizer wraps them in
/// [`QksError::Execution`] together with the failing (point, episode) pair.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecError {
    /// The execution did not finish within the configured limit.
    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    /// The backend returned an outcome of the wrong length.
    #[error("Malformed outcome: expected {expected} bits, got {got}")]
    MalformedOutcome {
        /// Number of bits the template requires.
        expected: usize,
        /// Number of bits actually returned.
        got: usize,
    },

    /// The backend returned a value other than 0 or 1.
    #[error("Outcome bit {position} has non-binary value {value}")]
    InvalidBit {
        /// Offset of the offending value within the outcome.
        position: usize,
        /// The value that was returned.
        value: u8,
    },

    /// Parameter bindings do not match the compiled circuit.
    #[error("Parameter binding error: {0}")]
    Binding(String),

    /// The circuit template cannot be compiled by this backend.
    #[error("Invalid circuit template: {0}")]
    InvalidTemplate(String),

    /// A failure the backend expects to clear up on retry.
    #[error("Transient backend failure: {0}")]
    Transient(String),

    /// Unsupported feature.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ExecError {
    /// Whether a retry of the same call may succeed.
    ///
    /// Timeouts and malformed outcomes are never transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExecError::Transient(_))
    }
}

/// Result type for executor operations.
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors that can occur while featurizing a dataset.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QksError {
    /// Malformed input: dataset shape, counts, configuration or parameter names.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A point or episode index outside its valid range.
    #[error("{kind} index {index} out of range (0..{len})")]
    OutOfRange {
        /// Which index was checked.
        kind: IndexKind,
        /// The offending index.
        index: usize,
        /// Number of valid indices.
        len: usize,
    },

    /// The circuit template failed to compile.
    #[error("Compilation failed: {0}")]
    Compile(#[source] ExecError),

    /// Execution failed for one (point, episode) pair; the run is aborted.
    #[error("Execution failed at point {point}, episode {episode}: {source}")]
    Execution {
        /// Row of the dataset being featurized.
        point: usize,
        /// Episode being executed.
        episode: usize,
        /// Underlying executor error.
        #[source]
        source: ExecError,
    },

    /// The run was cancelled between execution calls.
    #[error("Featurization cancelled")]
    Cancelled,

    /// I/O error while reading or writing configuration or parameters.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml_ng::Error),
}

impl QksError {
    /// Shorthand for [`QksError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        QksError::InvalidArgument(message.into())
    }

    /// The (point, episode) pair an execution error is attached to.
    pub fn failed_pair(&self) -> Option<(usize, usize)> {
        match self {
            QksError::Execution { point, episode, .. } => Some((*point, *episode)),
            _ => None,
        }
    }
}

/// Index checked by [`QksError::OutOfRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Row of the dataset.
    Point,
    /// Episode number.
    Episode,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Point => write!(f, "Point"),
            IndexKind::Episode => write!(f, "Episode"),
        }
    }
}

/// Result type for featurization operations.
pub type QksResult<T> = Result<T, QksError>;
