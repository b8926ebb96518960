//! # tristore-engine
//!
//! The store you open and query. [`TripleStore`] wraps the six-trie index
//! of `tristore-core` behind a read/write lock and adds what an application
//! needs around it:
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Query defaults, estimator choice, update verification |
//! | [`store`] | Updates, basic graph pattern queries, snapshots |
//! | [`admin`] | Statistics |
//!
//! ```
//! use tristore_engine::{Config, Term, Triple, TriplePattern, TripleStore};
//!
//! let store = TripleStore::with_config(Config::default().with_limit(100))?;
//! store.insert_all([Triple::new(1, 7, 2), Triple::new(2, 7, 3)])?;
//!
//! let result = store.query(&[TriplePattern::new(
//!     Term::var(0),
//!     Term::constant(7),
//!     Term::var(1),
//! )])?;
//! for row in &result.rows {
//!     println!("{row}");
//! }
//! assert_eq!(result.len(), 2);
//! # Ok::<(), tristore_engine::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod admin;
pub mod config;
pub mod store;

pub use admin::StoreStats;
pub use config::{Config, ConfigError};
pub use store::{QueryResult, TripleStore};

pub use tristore_common::{
    Attribute, Error, QueryError, Result, Term, TermId, Triple, TriplePattern, VarId,
};
pub use tristore_core::{CardinalityEstimator, JoinOptions, JoinOutcome, RemoveReport, ResultRow};
