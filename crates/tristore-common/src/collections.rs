//! Standard collection type aliases for tristore.
//!
//! Use these instead of `std::collections::HashMap` so hashing is consistent
//! across the workspace.
//!
//! # Example
//!
//! ```rust
//! use tristore_common::collections::{TristoreMap, tristore_map};
//!
//! let mut map: TristoreMap<u32, usize> = tristore_map();
//! map.insert(7, 42);
//! assert_eq!(map[&7], 42);
//! ```

use rustc_hash::FxBuildHasher;

/// Standard HashMap with FxHash (fast, non-cryptographic).
///
/// Keys in this workspace are small integers (term ids, variable ids,
/// positions), which is exactly what FxHash is good at.
pub type TristoreMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Create a new empty [`TristoreMap`].
#[inline]
#[must_use]
pub fn tristore_map<K, V>() -> TristoreMap<K, V> {
    TristoreMap::default()
}
