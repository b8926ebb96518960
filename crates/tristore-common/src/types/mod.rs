//! Core type definitions for tristore.
//!
//! - Identifier types ([`TermId`], [`VarId`])
//! - Triples and attributes ([`Triple`], [`Attribute`])
//! - Query shapes ([`Term`], [`TriplePattern`])

mod id;
mod pattern;
mod triple;

pub use id::{TermId, VarId};
pub use pattern::{Term, TriplePattern};
pub use triple::{Attribute, Triple};
