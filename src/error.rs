//! Error types.

use std::fmt;

use crate::node::NodeId;

/// Error returned by [`UniqueTable`][crate::table::UniqueTable] and
/// [`Factory`][crate::factory::Factory] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The arena is full and already at its maximum capacity.
    ///
    /// Recoverable by running a garbage collection pass and retrying.
    CapacityExceeded { max_capacity: usize },
    /// Malformed input, e.g. a liveness bitmap of the wrong length.
    InvalidArgument(String),
    /// Node id outside the allocated range.
    OutOfRange { id: NodeId, allocated: usize },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::CapacityExceeded { max_capacity } => {
                write!(f, "unique table is full (maximum capacity {})", max_capacity)
            }
            TableError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            TableError::OutOfRange { id, allocated } => {
                write!(f, "node {} is out of range (allocated: {})", id, allocated)
            }
        }
    }
}

impl std::error::Error for TableError {}

pub type Result<T, E = TableError> = std::result::Result<T, E>;
