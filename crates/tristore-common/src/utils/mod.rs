//! Common utilities used throughout tristore.
//!
//! - [`error`] - Error types like [`Error`] and [`QueryError`](error::QueryError)

pub mod error;

pub use error::{Error, Result};
