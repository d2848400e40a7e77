//! Opening and configuring DuckDB sessions.
//!
//! [`open`] returns a [`Connection`] that owns exactly one DuckDB session.
//! The session is released by [`Connection::close`], or on drop if the
//! caller never closed it; either way it is released exactly once.

use duckdb::{AccessMode, Config};
use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{
    OptionValue, SessionConfig, OPT_BATCH_SIZE, OPT_EXTENSIONS, OPT_FORCE_MANUAL,
    OPT_MEMORY_LIMIT, OPT_THREADS,
};
use crate::error::{EngineError, Result};
use crate::format::{format_value, quote_text};

/// Location string meaning "in-memory database".
pub const MEMORY_LOCATION: &str = ":memory:";

/// Where the session's database lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Location {
    #[default]
    Memory,
    File(PathBuf),
}

impl Location {
    /// Parse a location string; `":memory:"` and the empty string mean
    /// in-memory.
    pub fn parse(location: &str) -> Self {
        if location.is_empty() || location == MEMORY_LOCATION {
            Location::Memory
        } else {
            Location::File(PathBuf::from(location))
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Location::Memory)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Memory => f.write_str(MEMORY_LOCATION),
            Location::File(p) => write!(f, "{}", p.display()),
        }
    }
}

impl From<&str> for Location {
    fn from(s: &str) -> Self {
        Location::parse(s)
    }
}

impl From<&Path> for Location {
    fn from(p: &Path) -> Self {
        Location::File(p.to_path_buf())
    }
}

impl From<PathBuf> for Location {
    fn from(p: PathBuf) -> Self {
        Location::File(p)
    }
}

/// One open DuckDB session.
pub struct Connection {
    inner: Option<duckdb::Connection>,
    location: Location,
    readonly: bool,
    arrow_scan_registered: Cell<bool>,
}

impl Connection {
    /// The underlying DuckDB handle.
    ///
    /// # Panics
    ///
    /// Panics if called after [`close`](Self::close).
    pub fn raw(&self) -> &duckdb::Connection {
        match &self.inner {
            Some(conn) => conn,
            None => panic!("connection to {} used after close", self.location),
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Whether the session was actually opened read-only.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Run one or more semicolon-separated statements, discarding results.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.raw()
            .execute_batch(sql)
            .map_err(|e| EngineError::from_execution(sql, e))
    }

    pub(crate) fn arrow_scan_registered(&self) -> bool {
        self.arrow_scan_registered.get()
    }

    pub(crate) fn mark_arrow_scan_registered(&self) {
        self.arrow_scan_registered.set(true);
    }

    /// Release the session. Later calls do nothing.
    ///
    /// Teardown failures are logged, never returned.
    pub fn close(&mut self) {
        if let Some(conn) = self.inner.take() {
            match conn.close() {
                Ok(()) => debug!(location = %self.location, "Connection closed"),
                Err((_conn, e)) => {
                    warn!(location = %self.location, error = %e, "Failed to close connection");
                }
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("location", &self.location)
            .field("readonly", &self.readonly)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Open a session at `location` and apply `config` to it.
///
/// Read-only intent is honoured for files and ignored for in-memory
/// databases. Options are applied in insertion order, then the
/// initialisation statements run.
///
/// # Errors
///
/// - `SourceUnavailable` when a read-only file does not exist.
/// - `Open` when DuckDB cannot open the file (e.g. not a database).
/// - `Config` when `memory_limit` is rejected.
/// - `Extension` when an extension cannot be installed or loaded.
/// - Statement errors from the initialisation statements.
pub fn open(location: &Location, config: &SessionConfig) -> Result<Connection> {
    let (inner, readonly) = match location {
        Location::Memory => {
            if config.readonly() {
                debug!("Ignoring read-only intent for in-memory database");
            }
            let conn = duckdb::Connection::open_in_memory().map_err(|e| EngineError::Open {
                location: MEMORY_LOCATION.to_string(),
                detail: e.to_string(),
            })?;
            (conn, false)
        }
        Location::File(path) => {
            if config.readonly() && !path.exists() {
                return Err(EngineError::SourceUnavailable(format!(
                    "{} does not exist and cannot be opened read-only",
                    path.display()
                )));
            }
            let conn = open_file(path, config.readonly()).map_err(|e| EngineError::Open {
                location: path.display().to_string(),
                detail: e.to_string(),
            })?;
            (conn, config.readonly())
        }
    };

    let conn = Connection {
        inner: Some(inner),
        location: location.clone(),
        readonly,
        arrow_scan_registered: Cell::new(false),
    };

    info!(location = %conn.location, readonly, "Connection opened");

    apply_options(&conn, config)?;
    run_init_queries(&conn, config)?;

    Ok(conn)
}

fn open_file(path: &Path, readonly: bool) -> duckdb::Result<duckdb::Connection> {
    let mut db_config = Config::default();
    if readonly {
        db_config = db_config.access_mode(AccessMode::ReadOnly)?;
    }
    duckdb::Connection::open_with_flags(path, db_config)
}

fn apply_options(conn: &Connection, config: &SessionConfig) -> Result<()> {
    for (key, value) in config.options() {
        match key {
            OPT_MEMORY_LIMIT => {
                let sql = format!("SET memory_limit = {}", quote_text(&value.to_string()));
                conn.raw().execute_batch(&sql).map_err(|e| {
                    EngineError::config(format!("invalid memory_limit '{}': {}", value, e))
                })?;
                debug!(memory_limit = %value, "Applied memory limit");
            }
            OPT_THREADS => {
                let sql = format!("SET threads = {}", value);
                match conn.raw().execute_batch(&sql) {
                    Ok(()) => debug!(threads = %value, "Applied thread count"),
                    Err(e) => warn!(
                        threads = %value,
                        error = %e,
                        "Could not set thread count; keeping the session default"
                    ),
                }
            }
            OPT_EXTENSIONS => load_extensions(conn, value, config)?,
            OPT_BATCH_SIZE | OPT_FORCE_MANUAL => {}
            other => {
                let sql = format!("SET {} = {}", other, format_value(&value.to_value()));
                match conn.raw().execute_batch(&sql) {
                    Ok(()) => debug!(option = %other, value = %value, "Applied session option"),
                    Err(e) => warn!(
                        option = %other,
                        value = %value,
                        error = %e,
                        "Could not apply session option; ignoring it"
                    ),
                }
            }
        }
    }
    Ok(())
}

fn load_extensions(conn: &Connection, value: &OptionValue, config: &SessionConfig) -> Result<()> {
    let names = value.as_list().ok_or_else(|| {
        EngineError::config(format!("extensions must be a string or list, got '{}'", value))
    })?;
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        for verb in ["INSTALL", "LOAD"] {
            conn.raw()
                .execute_batch(&format!("{} {}", verb, quote_text(name)))
                .map_err(|e| EngineError::Extension {
                    name: name.to_string(),
                    detail: e.to_string(),
                })?;
        }
        if config.verbose() {
            info!(extension = %name, "Extension loaded");
        }
    }
    Ok(())
}

fn run_init_queries(conn: &Connection, config: &SessionConfig) -> Result<()> {
    for sql in config.init_queries() {
        debug!(sql = %sql, "Running initialisation statement");
        conn.execute_batch(sql)?;
    }
    Ok(())
}
