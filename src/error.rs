use std::{error::Error, fmt, io};

/// The result type used across the entire crate.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Failures produced while building, evaluating or exporting a graph.
#[derive(Debug)]
pub enum FlowError {
    /// Two sequences that must agree in length do not.
    DimensionMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A node name was requested that does not exist in the graph.
    NodeNotFound { name: String },
    /// A placeholder reachable from the fetched node has no fed value.
    MissingFeed { name: String },
    /// An underlying I/O failure during export or import.
    Io(io::Error),
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::DimensionMismatch {
                what,
                got,
                expected,
            } => {
                write!(
                    f,
                    "dimension mismatch for {what}: got {got}, expected {expected}"
                )
            }
            FlowError::NodeNotFound { name } => write!(f, "node not found: {name}"),
            FlowError::MissingFeed { name } => {
                write!(f, "placeholder {name} has no fed value")
            }
            FlowError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for FlowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FlowError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FlowError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<FlowError> for io::Error {
    fn from(value: FlowError) -> Self {
        match value {
            FlowError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
