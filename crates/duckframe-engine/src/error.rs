//! Error types for the duckframe engine.
//!
//! The taxonomy follows the life of one top-level call: configuration is
//! validated first, then the connection is opened, sources are registered
//! and statements are executed. Only statement errors are subject to the
//! configured [`OnError`](crate::config::OnError) policy; everything else
//! always reaches the caller.

/// Errors from the duckframe engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid or malformed session configuration. Raised before any
    /// connection work begins.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backing store does not exist (e.g. a read-only open of a missing
    /// file).
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// DuckDB refused to open the backing store (corrupt or unreadable file).
    #[error("Failed to open {location}: {detail}")]
    Open {
        /// The location that was being opened.
        location: String,
        /// The DuckDB diagnostic message.
        detail: String,
    },

    /// Attaching a file-backed source failed.
    #[error("Failed to attach {path} as {name}: {detail}")]
    Attach {
        /// Alias the store was attached under.
        name: String,
        /// Path of the attached store.
        path: String,
        /// The DuckDB diagnostic message.
        detail: String,
    },

    /// An in-memory source could not be registered.
    #[error("Failed to register source {name}: {detail}")]
    Registration {
        /// Name of the source.
        name: String,
        /// What went wrong.
        detail: String,
    },

    /// Installing or loading a DuckDB extension failed.
    #[error("Failed to load extension {name}: {detail}")]
    Extension {
        /// Extension name.
        name: String,
        /// The DuckDB diagnostic message.
        detail: String,
    },

    /// A statement failed for a reason other than a DuckDB query failure
    /// (e.g. an unreadable result value). Carries the statement text.
    #[error("{detail} (statement: {sql})")]
    Statement {
        /// Statement text, truncated for display.
        sql: String,
        /// What went wrong.
        detail: String,
    },

    /// DuckDB's own query error, propagated unwrapped so callers can match
    /// on it.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),
}

impl EngineError {
    /// Create a `Statement` error, truncating very long SQL for display.
    ///
    /// # Examples
    ///
    /// ```
    /// use duckframe_engine::error::EngineError;
    ///
    /// let err = EngineError::statement("SELECT * FROM t", "column out of range");
    /// assert!(err.to_string().contains("SELECT * FROM t"));
    /// ```
    pub fn statement(sql: &str, detail: impl Into<String>) -> Self {
        let sql_preview = if sql.chars().count() > 120 {
            format!("{}...", sql.chars().take(120).collect::<String>())
        } else {
            sql.to_string()
        };
        Self::Statement {
            sql: sql_preview,
            detail: detail.into(),
        }
    }

    /// Wrap a failure from the engine for `sql`.
    ///
    /// DuckDB query failures stay unwrapped; any other error kind is
    /// rendered together with the statement text.
    pub fn from_execution(sql: &str, e: duckdb::Error) -> Self {
        match e {
            duckdb::Error::DuckDBFailure(..) => Self::DuckDb(e),
            other => Self::statement(sql, other.to_string()),
        }
    }

    /// Create a `Config` error.
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config(detail.into())
    }

    /// Create a `Registration` error for the named source.
    pub fn registration(name: &str, detail: impl Into<String>) -> Self {
        Self::Registration {
            name: name.to_string(),
            detail: detail.into(),
        }
    }

    /// Returns `true` when the error reports a missing catalog object
    /// (table, view or schema that does not exist).
    pub fn is_not_found(&self) -> bool {
        let msg = self.to_string();
        msg.contains("Catalog Error") || msg.contains("does not exist")
    }

    /// Returns `true` for errors raised while opening the backing store.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            EngineError::SourceUnavailable(_) | EngineError::Open { .. }
        )
    }
}

/// A specialised `Result` type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
