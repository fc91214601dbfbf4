//! Error types for tensr

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using tensr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error classification
///
/// Every [`Error`] variant belongs to exactly one kind. The structured
/// variants carry the diagnostic payload; the kind is what callers branch on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A precondition on an argument failed (bad shape, slice, rank, bounds,
    /// incompatible broadcast, duplicate node id, dangling edge endpoint)
    InvalidArgument,
    /// An operation was invoked outside its required context
    /// (e.g. nested recording, stop without start)
    InvalidState,
    /// The operation or dtype combination is not supported
    Unsupported,
}

/// Errors that can occur in tensr operations
#[derive(Error, Debug)]
pub enum Error {
    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Shapes cannot be broadcast together
    #[error("Cannot broadcast shape {src:?} to {target:?}")]
    BroadcastIncompatible {
        /// Source shape
        src: Vec<usize>,
        /// Target shape
        target: Vec<usize>,
    },

    /// Wrong number of indices or slice descriptors for a tensor's rank
    #[error("Rank mismatch: tensor has {rank} dimensions, got {got}")]
    RankMismatch {
        /// Tensor rank
        rank: usize,
        /// Number of indices/descriptors provided
        got: usize,
    },

    /// Index out of bounds along one dimension
    #[error("Index {index} out of bounds for dimension {dim} of size {size}")]
    IndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// The dimension it was applied to
        dim: usize,
        /// Size of the dimension
        size: usize,
    },

    /// Malformed slice descriptor for a dimension
    #[error("Invalid slice for dimension of size {dim_size}: {reason}")]
    InvalidSlice {
        /// Size of the sliced dimension
        dim_size: usize,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// A node with this id is already registered in the graph
    #[error("Duplicate node id '{id}'")]
    DuplicateNode {
        /// The conflicting node id
        id: String,
    },

    /// An edge references a node id that is not in the graph
    #[error("Edge '{edge}' references unknown node '{node}'")]
    UnknownNode {
        /// The edge id
        edge: String,
        /// The missing node id
        node: String,
    },

    /// The graph contains a cycle where an acyclic graph is required
    #[error("Graph contains a cycle; topological order is undefined")]
    GraphCycle,

    /// Recording bracket misuse
    #[error("Invalid recording state: {0}")]
    RecordingState(String),

    /// Unsupported operation for a tensor variant or dtype
    #[error("Unsupported: {op} - {reason}")]
    Unsupported {
        /// The operation name
        op: &'static str,
        /// Why it is unsupported
        reason: String,
    },

    /// DType combination rejected by the promotion rules
    #[error("DType mismatch: {lhs} vs {rhs}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },
}

impl Error {
    /// Classify this error into the coarse taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ShapeMismatch { .. }
            | Error::BroadcastIncompatible { .. }
            | Error::RankMismatch { .. }
            | Error::IndexOutOfBounds { .. }
            | Error::InvalidSlice { .. }
            | Error::InvalidArgument { .. }
            | Error::DuplicateNode { .. }
            | Error::UnknownNode { .. }
            | Error::GraphCycle => ErrorKind::InvalidArgument,
            Error::RecordingState(_) => ErrorKind::InvalidState,
            Error::Unsupported { .. } | Error::DTypeMismatch { .. } => ErrorKind::Unsupported,
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create a broadcast incompatibility error
    pub fn broadcast(src: &[usize], target: &[usize]) -> Self {
        Self::BroadcastIncompatible {
            src: src.to_vec(),
            target: target.to_vec(),
        }
    }

    /// Create an invalid slice error
    pub fn invalid_slice(dim_size: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSlice {
            dim_size,
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create an unsupported-operation error
    pub fn unsupported(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            op,
            reason: reason.into(),
        }
    }
}
