//! # tristore-common
//!
//! The vocabulary every other tristore crate speaks: surrogate ids, triples,
//! triple patterns, collection aliases and the shared error type.
//!
//! Nothing in here knows about tries or joins. If you are looking for the
//! index, see `tristore-core`; for the store you open and query, see
//! `tristore-engine`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod types;
pub mod utils;

pub use types::{Attribute, Term, TermId, Triple, TriplePattern, VarId};
pub use utils::error::{Error, QueryError, Result};
