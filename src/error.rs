use crate::parameters::path::ParamPath;
use thiserror::Error;

/// The failure categories a collaborator can match on.
///
/// Every [`ParamError`] maps onto exactly one kind through [`ParamError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown path, or a write aimed at something that is not a literal.
    NotFound,
    /// Structural failure while loading a snapshot.
    MalformedInput,
    /// Expression grammar violation.
    SyntaxError,
    /// A derived parameter depends on itself.
    CycleDetected,
    /// An acyclic reference chain is longer than the configured cap.
    DepthExceeded,
    /// Division or remainder by an operand equal to zero.
    DivisionByZero,
    /// Literal write outside the declared range.
    OutOfBounds,
}

/// Error types for the paramtree engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    /// The path does not name a parameter.
    #[error("Parameter not found: {path}")]
    NotFound { path: ParamPath },

    /// The path names a derived parameter, which cannot be written.
    #[error("Parameter {path} is derived and cannot be written")]
    NotLiteral { path: ParamPath },

    /// The snapshot violates the persisted format.
    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    /// The expression text does not match the grammar.
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Evaluating `path` would require evaluating itself.
    #[error("Circular dependency at {path}: {}", format_chain(.chain))]
    CycleDetected { path: ParamPath, chain: Vec<ParamPath> },

    /// The reference chain reached the depth limit.
    #[error("Reference chain exceeds {limit} levels at {path}")]
    DepthExceeded { path: ParamPath, limit: usize },

    #[error("Division by zero")]
    DivisionByZero,

    /// Literal edit outside `[lower, upper]`.
    #[error("Value {value} for {path} is outside bounds [{lower}, {upper}]")]
    OutOfBounds {
        path: ParamPath,
        value: f64,
        lower: f64,
        upper: f64,
    },
}

impl ParamError {
    /// Map this error onto its collaborator-facing kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::NotLiteral { .. } => ErrorKind::NotFound,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::Syntax { .. } => ErrorKind::SyntaxError,
            Self::CycleDetected { .. } => ErrorKind::CycleDetected,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::DivisionByZero => ErrorKind::DivisionByZero,
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }
}

fn format_chain(chain: &[ParamPath]) -> String {
    chain
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ParamError>;

/// Error that can occur when reading or writing snapshot files
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Param(#[from] ParamError),
}
