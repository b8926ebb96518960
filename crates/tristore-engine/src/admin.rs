//! Admin API types for store inspection.

use serde::{Deserialize, Serialize};

/// Store statistics returned by `store.stats()`.
///
/// The distinct counts are read off the root levels of the SPO, POS and OSP
/// tries, so computing them costs nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of triples.
    pub triples: usize,
    /// Number of distinct subjects.
    pub subjects: usize,
    /// Number of distinct predicates.
    pub predicates: usize,
    /// Number of distinct objects.
    pub objects: usize,
    /// Memory used by the index in bytes (approximate).
    pub memory_bytes: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} triples ({} subjects, {} predicates, {} objects), {} bytes",
            self.triples, self.subjects, self.predicates, self.objects, self.memory_bytes
        )
    }
}
