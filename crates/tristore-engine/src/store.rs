//! The [`TripleStore`] facade.

use std::path::Path;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tristore_common::{Error, Result, Triple, TriplePattern, VarId};
use tristore_core::{
    CountingSink, JoinEngine, JoinOptions, JoinOutcome, RemoveReport, ResultRow, RowCollector,
    SixTrieIndex,
};

use crate::admin::StoreStats;
use crate::config::Config;

/// Rows and bookkeeping of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// The query variables in ascending order.
    pub variables: Vec<VarId>,
    /// One row per solution, bindings ordered like `variables`.
    pub rows: Vec<ResultRow>,
    /// How the join ended.
    pub outcome: JoinOutcome,
    /// Wall-clock time spent in the join.
    pub elapsed: Duration,
}

impl QueryResult {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the query produced no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `true` if every solution was produced.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome.is_complete()
    }
}

/// An in-memory RDF triple store over a six-trie index.
///
/// Updates take the write lock. A query holds the read lock for the whole
/// join, so it never observes a concurrent update.
///
/// # Examples
///
/// ```
/// use tristore_engine::{Term, Triple, TriplePattern, TripleStore};
///
/// let store = TripleStore::new_in_memory();
/// store.insert(Triple::new(1, 2, 3))?;
/// store.insert(Triple::new(3, 2, 4))?;
///
/// // ?a 2 ?b . ?b 2 ?c
/// let result = store.query(&[
///     TriplePattern::new(Term::var(0), Term::constant(2), Term::var(1)),
///     TriplePattern::new(Term::var(1), Term::constant(2), Term::var(2)),
/// ])?;
/// assert_eq!(result.len(), 1);
/// assert_eq!(result.rows[0].to_string(), "{?0=1, ?1=3, ?2=4}");
/// # Ok::<(), tristore_engine::Error>(())
/// ```
pub struct TripleStore {
    index: RwLock<SixTrieIndex>,
    config: Config,
}

impl TripleStore {
    /// Creates an empty store with the default configuration.
    #[must_use]
    pub fn new_in_memory() -> Self {
        Self {
            index: RwLock::new(SixTrieIndex::new()),
            config: Config::default(),
        }
    }

    /// Creates an empty store with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn with_config(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(Self {
            index: RwLock::new(SixTrieIndex::new()),
            config,
        })
    }

    /// Bulk-builds a store from `triples`. Duplicates are stored once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTriple`] if a triple uses the reserved id 0.
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Result<Self> {
        let triples: Vec<Triple> = triples.into_iter().collect();
        if let Some(bad) = triples.iter().find(|t| !t.is_valid()) {
            return Err(Error::InvalidTriple(bad.to_string()));
        }
        Ok(Self {
            index: RwLock::new(SixTrieIndex::from_triples(triples)),
            config: Config::default(),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of stored triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    /// Returns `true` if the store holds no triples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Inserts a triple. Returns `false` if it was already stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTriple`] for a triple using id 0, and
    /// [`Error::Corruption`] if update verification is on and fails.
    pub fn insert(&self, triple: Triple) -> Result<bool> {
        check(triple)?;
        let mut index = self.index.write();
        let inserted = index.insert(triple);
        self.verify_update(&index, "insert", triple)?;
        Ok(inserted)
    }

    /// Inserts every triple of `triples` and returns how many were new.
    ///
    /// The batch is checked up front: if one triple is invalid, nothing is
    /// inserted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTriple`] for a triple using id 0, and
    /// [`Error::Corruption`] if update verification is on and fails.
    pub fn insert_all(&self, triples: impl IntoIterator<Item = Triple>) -> Result<usize> {
        let triples: Vec<Triple> = triples.into_iter().collect();
        for &triple in &triples {
            check(triple)?;
        }

        let mut index = self.index.write();
        let mut inserted = 0;
        for &triple in &triples {
            if index.insert(triple) {
                inserted += 1;
            }
            self.verify_update(&index, "insert", triple)?;
        }
        Ok(inserted)
    }

    /// Removes a triple. Returns `false` if it was not stored.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn remove(&self, triple: Triple) -> Result<bool> {
        Ok(self.remove_and_report(triple)?.removed)
    }

    /// Removes a triple and reports which of its surrogate ids are no longer
    /// referenced by any stored triple, so the dictionary may release them.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn remove_and_report(&self, triple: Triple) -> Result<RemoveReport> {
        check(triple)?;
        let mut index = self.index.write();
        let report = index.remove_and_report(triple);
        self.verify_update(&index, "remove", triple)?;
        Ok(report)
    }

    /// Returns `true` if the triple is stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTriple`] for a triple using id 0.
    pub fn contains(&self, triple: Triple) -> Result<bool> {
        check(triple)?;
        Ok(self.index.read().contains(triple))
    }

    /// All stored triples in subject, predicate, object order.
    #[must_use]
    pub fn triples(&self) -> Vec<Triple> {
        self.index.read().triples()
    }

    /// Runs a basic graph pattern with the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if the patterns are rejected.
    pub fn query(&self, patterns: &[TriplePattern]) -> Result<QueryResult> {
        self.query_with(patterns, self.config.join_options())
    }

    /// Runs a basic graph pattern with explicit join options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if the patterns are rejected.
    pub fn query_with(
        &self,
        patterns: &[TriplePattern],
        options: JoinOptions,
    ) -> Result<QueryResult> {
        let index = self.index.read();
        let engine = JoinEngine::new(&*index, patterns, options)?;
        let variables: Vec<VarId> = engine.variables().collect();

        let start = Instant::now();
        let mut rows = RowCollector::new();
        let outcome = engine.join(&mut rows);
        let elapsed = start.elapsed();

        if self.config.query_logging {
            tracing::debug!(
                "Query [{}]: {} rows, {outcome}, {:?}",
                patterns
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" . "),
                rows.rows().len(),
                elapsed
            );
        }

        Ok(QueryResult {
            variables,
            rows: rows.into_rows(),
            outcome,
            elapsed,
        })
    }

    /// Counts the solutions of a basic graph pattern without keeping them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if the patterns are rejected.
    pub fn count(&self, patterns: &[TriplePattern]) -> Result<(usize, JoinOutcome)> {
        let index = self.index.read();
        let engine = JoinEngine::new(&*index, patterns, self.config.join_options())?;
        let mut sink = CountingSink::new();
        let outcome = engine.join(&mut sink);
        Ok((sink.count(), outcome))
    }

    /// Checks that all six tries agree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corruption`] describing the first disagreement.
    pub fn verify(&self) -> Result<()> {
        self.index.read().verify()
    }

    /// Returns store statistics.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let index = self.index.read();
        StoreStats {
            triples: index.len(),
            subjects: index.gap(0),
            predicates: index.gap(1),
            objects: index.gap(2),
            memory_bytes: index.size_bytes(),
        }
    }

    fn verify_update(&self, index: &SixTrieIndex, op: &str, triple: Triple) -> Result<()> {
        if !self.config.verify_updates {
            return Ok(());
        }
        index.verify().inspect_err(|e| {
            tracing::warn!("Index verification failed after {op} of {triple}: {e}");
        })
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Exports the store to a binary snapshot.
    ///
    /// The snapshot holds the index as it is laid out in memory: the six
    /// tries, the three pair gaps and the triple count. The returned bytes
    /// can later be restored with [`import_snapshot()`](Self::import_snapshot).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_snapshot(&self) -> Result<Vec<u8>> {
        let index = self.index.read();
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            index: &*index,
        };

        let config = bincode::config::standard();
        bincode::serde::encode_to_vec(&snapshot, config)
            .map_err(|e| Error::Internal(format!("snapshot export failed: {e}")))
    }

    /// Creates a store from a binary snapshot, with the default
    /// configuration.
    ///
    /// The `data` must have been produced by
    /// [`export_snapshot()`](Self::export_snapshot). The decoded index is
    /// verified before the store is handed out.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the version is unknown,
    /// and [`Error::Corruption`] if the decoded index is not consistent.
    pub fn import_snapshot(data: &[u8]) -> Result<Self> {
        let config = bincode::config::standard();
        let (snapshot, _): (Snapshot<SixTrieIndex>, _) =
            bincode::serde::decode_from_slice(data, config)
            .map_err(|e| Error::Internal(format!("snapshot import failed: {e}")))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::Internal(format!(
                "unsupported snapshot version: {}",
                snapshot.version
            )));
        }

        snapshot.index.verify().inspect_err(|e| {
            tracing::warn!("Rejected snapshot: {e}");
        })?;
        tracing::info!("Imported snapshot with {} triples", snapshot.index.len());
        Ok(Self {
            index: RwLock::new(snapshot.index),
            config: Config::default(),
        })
    }

    /// Writes a snapshot of the store to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self.export_snapshot()?;
        std::fs::write(path, data).map_err(|e| {
            Error::Internal(format!("failed to write snapshot {}: {e}", path.display()))
        })
    }

    /// Reads a store back from a snapshot written by [`save()`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns an error if the file can not be read or holds no valid
    /// snapshot.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            Error::Internal(format!("failed to read snapshot {}: {e}", path.display()))
        })?;
        Self::import_snapshot(&data)
    }
}

impl Default for TripleStore {
    fn default() -> Self {
        Self::new_in_memory()
    }
}

impl std::fmt::Debug for TripleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripleStore")
            .field("triples", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

fn check(triple: Triple) -> Result<()> {
    if triple.is_valid() {
        Ok(())
    } else {
        Err(Error::InvalidTriple(triple.to_string()))
    }
}

const SNAPSHOT_VERSION: u8 = 1;

/// Binary snapshot format for store export/import.
#[derive(serde::Serialize, serde::Deserialize)]
struct Snapshot<I> {
    version: u8,
    index: I,
}
