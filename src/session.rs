//! The single entry point: one call, one connection.
//!
//! [`run`] resolves the caller's [`SessionSource`] into a location plus named
//! sources, opens a connection, registers the sources, runs the optional
//! setup callback, executes the statements and always closes the
//! connection before returning.
//!
//! # Examples
//!
//! ```no_run
//! use duckframe::{query, Column, ColumnType, Table, Value};
//!
//! # fn main() -> duckframe::Result<()> {
//! let df = Table::from_rows(
//!     vec![Column::new("id", ColumnType::Int), Column::new("name", ColumnType::Text)],
//!     vec![vec![1.into(), "Alice".into()], vec![2.into(), "Bob".into()]],
//! )?;
//! let result = query(df, "SELECT name FROM df WHERE id > 1")?;
//! assert_eq!(result.get(0, "name"), Some(&Value::Text("Bob".into())));
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use tracing::debug;

use duckframe_engine::config::{SessionConfig, SessionConfigBuilder};
use duckframe_engine::connection::{self, Connection, Location};
use duckframe_engine::error::Result;
use duckframe_engine::table::{Sources, Table};
use duckframe_engine::{executor, registrar};

/// Name a single unnamed table is registered under.
pub const DEFAULT_TABLE_NAME: &str = "df";

/// What the statements run against.
#[derive(Debug, Clone)]
pub enum SessionSource {
    /// A database location (`:memory:` or a file) with nothing registered.
    Location(Location),
    /// One in-memory table, registered as [`DEFAULT_TABLE_NAME`].
    Table(Table),
    /// Named tables and/or stores, registered in iteration order on an
    /// in-memory database.
    Named(Sources),
}

impl From<Location> for SessionSource {
    fn from(location: Location) -> Self {
        SessionSource::Location(location)
    }
}

impl From<&str> for SessionSource {
    fn from(location: &str) -> Self {
        SessionSource::Location(Location::parse(location))
    }
}

impl From<&Path> for SessionSource {
    fn from(path: &Path) -> Self {
        SessionSource::Location(Location::from(path))
    }
}

impl From<PathBuf> for SessionSource {
    fn from(path: PathBuf) -> Self {
        SessionSource::Location(Location::from(path))
    }
}

impl From<Table> for SessionSource {
    fn from(table: Table) -> Self {
        SessionSource::Table(table)
    }
}

impl From<Sources> for SessionSource {
    fn from(sources: Sources) -> Self {
        SessionSource::Named(sources)
    }
}

/// One statement or an ordered sequence of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statements {
    One(String),
    Many(Vec<String>),
}

impl Statements {
    fn as_slice(&self) -> &[String] {
        match self {
            Statements::One(sql) => std::slice::from_ref(sql),
            Statements::Many(sqls) => sqls,
        }
    }
}

impl From<&str> for Statements {
    fn from(sql: &str) -> Self {
        Statements::One(sql.to_string())
    }
}

impl From<String> for Statements {
    fn from(sql: String) -> Self {
        Statements::One(sql)
    }
}

impl From<Vec<String>> for Statements {
    fn from(sqls: Vec<String>) -> Self {
        Statements::Many(sqls)
    }
}

impl From<Vec<&str>> for Statements {
    fn from(sqls: Vec<&str>) -> Self {
        Statements::Many(sqls.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Statements {
    fn from(sqls: [&str; N]) -> Self {
        Statements::Many(sqls.iter().map(|s| s.to_string()).collect())
    }
}

/// Setup callback run against the live connection before the statements.
/// It borrows the connection; its `Ok` value is discarded.
pub type SetupFn<'a> = Box<dyn FnOnce(&Connection) -> Result<()> + 'a>;

/// Run `statements` against `source`.
///
/// The configuration and source names are validated before any connection
/// is opened. The connection is closed on every exit path.
///
/// # Errors
///
/// Configuration, connection and registration errors always propagate.
/// Statement errors propagate only under the `fail` policy. Errors from
/// `setup` propagate.
pub fn run(
    source: SessionSource,
    statements: Statements,
    options: SessionConfigBuilder,
    setup: Option<SetupFn<'_>>,
) -> Result<Table> {
    let config = options.build()?;

    let (location, sources) = match source {
        SessionSource::Location(location) => (location, Sources::new()),
        SessionSource::Table(table) => (
            Location::Memory,
            Sources::new().with(DEFAULT_TABLE_NAME, table),
        ),
        SessionSource::Named(sources) => (Location::Memory, sources),
    };
    for (name, _) in sources.iter() {
        registrar::validate_name(name)?;
    }

    let mut conn = connection::open(&location, &config)?;
    let outcome = run_on(&conn, &sources, &statements, &config, setup);
    conn.close();
    outcome
}

fn run_on(
    conn: &Connection,
    sources: &Sources,
    statements: &Statements,
    config: &SessionConfig,
    setup: Option<SetupFn<'_>>,
) -> Result<Table> {
    let reports = registrar::register_all(conn, sources, config)?;
    debug!(sources = reports.len(), "Sources registered");

    if let Some(setup) = setup {
        setup(conn)?;
        debug!("Setup callback completed");
    }

    match statements {
        Statements::One(sql) => executor::execute(conn, sql, config),
        Statements::Many(_) => executor::execute_many(conn, statements.as_slice(), config),
    }
}

/// Run `statements` against `source` with default configuration.
pub fn query(source: impl Into<SessionSource>, statements: impl Into<Statements>) -> Result<Table> {
    run(
        source.into(),
        statements.into(),
        SessionConfig::builder(),
        None,
    )
}

/// Run `statements` against `source` with the given options.
pub fn query_with(
    source: impl Into<SessionSource>,
    statements: impl Into<Statements>,
    options: SessionConfigBuilder,
) -> Result<Table> {
    run(source.into(), statements.into(), options, None)
}

/// Run `statements` against `source` after calling `setup` on the live
/// connection.
pub fn query_with_setup<F, T>(
    source: impl Into<SessionSource>,
    statements: impl Into<Statements>,
    options: SessionConfigBuilder,
    setup: F,
) -> Result<Table>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    let setup: SetupFn<'_> = Box::new(move |conn: &Connection| setup(conn).map(|_| ()));
    run(source.into(), statements.into(), options, Some(setup))
}
