//! Store configuration.

use std::fmt;
use std::time::Duration;

use tristore_core::{CardinalityEstimator, JoinOptions};

/// Errors from [`Config::validate()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The default row limit must be greater than zero.
    ZeroLimit,
    /// The default timeout must be greater than zero.
    ZeroTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLimit => write!(f, "default_limit must be greater than zero"),
            Self::ZeroTimeout => write!(f, "default_timeout must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Triple store configuration.
///
/// The query-related fields are the defaults every [`query`] starts from;
/// [`query_with`] overrides them per call.
///
/// [`query`]: crate::TripleStore::query
/// [`query_with`]: crate::TripleStore::query_with
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)] // Config structs naturally have many boolean flags
pub struct Config {
    /// Maximum number of rows a query returns (None for unlimited).
    pub default_limit: Option<usize>,

    /// Wall-clock budget of a query (None for unlimited).
    pub default_timeout: Option<Duration>,

    /// Estimator used by the adaptive variable order.
    pub estimator: CardinalityEstimator,

    /// Whether a variable left to a single iterator in its last level is
    /// enumerated directly instead of through the general intersection.
    pub lonely_fast_path: bool,

    /// Whether every update re-checks the consistency of all six tries.
    ///
    /// This is a full scan of the index per update. Meant for tests and for
    /// hunting bugs, never for production loads.
    pub verify_updates: bool,

    /// Whether to log a summary of every query at debug level.
    pub query_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_limit: None,
            default_timeout: None,
            estimator: CardinalityEstimator::default(),
            lonely_fast_path: true,
            verify_updates: false,
            query_logging: false,
        }
    }
}

impl Config {
    /// Sets the default row limit.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.default_limit = Some(limit);
        self
    }

    /// Sets the default query timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Sets the cardinality estimator.
    #[must_use]
    pub fn with_estimator(mut self, estimator: CardinalityEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Disables the lonely-variable fast path.
    #[must_use]
    pub fn without_lonely_fast_path(mut self) -> Self {
        self.lonely_fast_path = false;
        self
    }

    /// Enables the consistency check after every update.
    #[must_use]
    pub fn with_update_verification(mut self) -> Self {
        self.verify_updates = true;
        self
    }

    /// Enables query logging.
    #[must_use]
    pub fn with_query_logging(mut self) -> Self {
        self.query_logging = true;
        self
    }

    /// The join options a query starts from.
    #[must_use]
    pub fn join_options(&self) -> JoinOptions {
        let mut options = JoinOptions::default()
            .with_estimator(self.estimator)
            .with_lonely_fast_path(self.lonely_fast_path);
        if let Some(limit) = self.default_limit {
            options = options.with_limit(limit);
        }
        if let Some(timeout) = self.default_timeout {
            options = options.with_timeout(timeout);
        }
        options
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any setting is invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if let Some(limit) = self.default_limit
            && limit == 0
        {
            return Err(ConfigError::ZeroLimit);
        }

        if let Some(timeout) = self.default_timeout
            && timeout.is_zero()
        {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }
}
