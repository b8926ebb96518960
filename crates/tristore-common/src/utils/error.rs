//! Error types shared by every tristore crate.
//!
//! Most index and join conditions are ordinary control flow (a missing triple
//! on remove is `false`, a timeout is an outcome). What ends up here is input
//! that can never be valid and internal failures.

use thiserror::Error;

/// Convenience alias for results carrying a tristore [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The top-level error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A triple used the reserved id 0 in one of its positions.
    #[error("invalid triple {0}: surrogate id 0 is reserved")]
    InvalidTriple(String),

    /// The query could not be planned.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// The six permutations of the index disagree with each other.
    #[error("index corruption: {0}")]
    Corruption(String),

    /// Anything else, usually serialization failures.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Reasons a basic graph pattern is rejected before the join starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The query has no triple patterns.
    #[error("query has no triple patterns")]
    EmptyQuery,

    /// A constant in pattern `pattern` uses the reserved id 0.
    #[error("pattern {pattern} uses the reserved id 0 as a constant")]
    ReservedConstant {
        /// Index of the offending pattern.
        pattern: usize,
    },

    /// A variable appears more than once inside a single pattern.
    #[error("variable ?{variable} appears more than once in pattern {pattern}")]
    RepeatedVariable {
        /// Index of the offending pattern.
        pattern: usize,
        /// The repeated variable.
        variable: u32,
    },
}
