//! Making named sources queryable inside a connection.
//!
//! # Registration paths
//!
//! 1. **Attach** -- a [`Source::Store`] is attached under its name.
//! 2. **Native** -- an in-memory [`Table`] is converted to an Arrow record
//!    batch and scanned into a temporary table in one statement. Available
//!    when the crate is built with the `native-registration` feature.
//! 3. **Manual** -- the table is recreated with `CREATE TEMPORARY TABLE`
//!    and generated `INSERT` statements, one batch per round trip. A batch
//!    that fails is replayed row by row through the ordered
//!    [`InsertStrategy`] list: plain `VALUES`, explicit `CAST`, then
//!    type-appropriate placeholders.
//!
//! ```text
//! start ─▶ native ─┬─ registered ─────────────────────────────▶ done
//!                  └─ unsupported / failed ─▶ CREATE TABLE ─┬─ 0 rows ─▶ done
//!                                                           └─ batches ─▶ done
//!                                     (per failed batch: row ─▶ plain ─▶ cast ─▶ placeholder)
//! ```

use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::connection::Connection;
use crate::error::{EngineError, Result};
use crate::format::{format_value, quote_identifier, quote_text};
use crate::table::{ColumnType, Source, Sources, Table, Value};
use crate::types::{map_type, EngineType};

// ─── Public types ────────────────────────────────────────────────────────────

/// Whether the running build can register tables natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Supported,
    Unsupported,
}

/// Result of one native registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeOutcome {
    Registered,
    Unsupported,
    /// The native path exists but failed; the reason is kept for logging.
    Failed(String),
}

/// Which path made a source queryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationPath {
    Attached,
    Native,
    Manual,
}

/// Summary of one source registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReport {
    pub name: String,
    pub path: RegistrationPath,
    /// Rows now present in the registered table (0 for attached stores).
    pub rows: usize,
    /// Rows that needed the explicit-cast strategy.
    pub cast_rows: usize,
    /// Rows replaced by placeholder defaults.
    pub placeholder_rows: usize,
}

impl RegistrationReport {
    fn new(name: &str, path: RegistrationPath) -> Self {
        Self {
            name: name.to_string(),
            path,
            rows: 0,
            cast_rows: 0,
            placeholder_rows: 0,
        }
    }
}

/// Table being filled by the manual path: its name and columns.
#[derive(Debug, Clone)]
pub struct TableTarget {
    name: String,
    columns: Vec<TargetColumn>,
}

/// One column of a [`TableTarget`]: declared type plus the DuckDB type it
/// is stored as.
#[derive(Debug, Clone)]
pub struct TargetColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub engine_type: EngineType,
}

impl TargetColumn {
    /// Literal the placeholder strategy inserts for this column.
    ///
    /// Only declared text columns get `''`. Lists, blobs and mixed columns
    /// are stored as `VARCHAR` but get `NULL`.
    pub fn placeholder_literal(&self) -> &'static str {
        match (self.engine_type, self.column_type.unwrap_nullable()) {
            (EngineType::Varchar, Some(ColumnType::Text)) => "''",
            (EngineType::Varchar, _) => "NULL",
            (ty, _) => ty.placeholder_literal(),
        }
    }
}

impl TableTarget {
    /// Derive the target schema from a table's declared column types.
    pub fn from_table(name: &str, table: &Table) -> Self {
        Self {
            name: name.to_string(),
            columns: table
                .columns()
                .iter()
                .map(|c| TargetColumn {
                    name: c.name.clone(),
                    column_type: c.column_type.clone(),
                    engine_type: map_type(&c.column_type),
                })
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[TargetColumn] {
        &self.columns
    }

    /// `CREATE OR REPLACE TEMPORARY TABLE` statement for this target.
    pub fn create_sql(&self) -> String {
        let cols = self
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_identifier(&c.name), c.engine_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE OR REPLACE TEMPORARY TABLE {} ({})",
            quote_identifier(&self.name),
            cols
        )
    }
}

/// One way of inserting a single row into a [`TableTarget`].
pub trait InsertStrategy {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Insert `row`. The row has exactly one value per target column.
    fn insert_row(
        &self,
        conn: &duckdb::Connection,
        target: &TableTarget,
        row: &[Value],
    ) -> duckdb::Result<()>;
}

/// `INSERT INTO t VALUES (...)` with formatted literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainValues;

impl PlainValues {
    /// Insert several rows with a single multi-row `VALUES` statement.
    pub fn insert_batch(
        &self,
        conn: &duckdb::Connection,
        target: &TableTarget,
        rows: &[Vec<Value>],
    ) -> duckdb::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tuples = rows
            .iter()
            .map(|row| values_tuple(row))
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute_batch(&format!(
            "INSERT INTO {} VALUES {}",
            quote_identifier(target.name()),
            tuples
        ))
    }
}

impl InsertStrategy for PlainValues {
    fn name(&self) -> &'static str {
        "values"
    }

    fn insert_row(
        &self,
        conn: &duckdb::Connection,
        target: &TableTarget,
        row: &[Value],
    ) -> duckdb::Result<()> {
        conn.execute_batch(&format!(
            "INSERT INTO {} VALUES {}",
            quote_identifier(target.name()),
            values_tuple(row)
        ))
    }
}

/// `INSERT INTO t SELECT CAST(lit AS type), ...` for values the implicit
/// coercion of `VALUES` rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct CastSelect;

impl InsertStrategy for CastSelect {
    fn name(&self) -> &'static str {
        "cast"
    }

    fn insert_row(
        &self,
        conn: &duckdb::Connection,
        target: &TableTarget,
        row: &[Value],
    ) -> duckdb::Result<()> {
        let exprs = row
            .iter()
            .zip(target.columns())
            .map(|(value, column)| {
                let ty = column.engine_type;
                match value {
                    Value::Null => format!("CAST(NULL AS {})", ty),
                    // Non-text values headed for a text column are cast from
                    // their text rendering.
                    Value::List(_) | Value::Blob(_) => {
                        format!("CAST({} AS {})", format_value(value), ty)
                    }
                    other if ty == EngineType::Varchar => {
                        format!("CAST({} AS {})", quote_text(&other.to_string()), ty)
                    }
                    other => format!("CAST({} AS {})", format_value(other), ty),
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute_batch(&format!(
            "INSERT INTO {} SELECT {}",
            quote_identifier(target.name()),
            exprs
        ))
    }
}

/// Inserts type-appropriate defaults so the row count is preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct Placeholder;

impl InsertStrategy for Placeholder {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn insert_row(
        &self,
        conn: &duckdb::Connection,
        target: &TableTarget,
        _row: &[Value],
    ) -> duckdb::Result<()> {
        let defaults = target
            .columns()
            .iter()
            .map(TargetColumn::placeholder_literal)
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute_batch(&format!(
            "INSERT INTO {} VALUES ({})",
            quote_identifier(target.name()),
            defaults
        ))
    }
}

static PLAIN: PlainValues = PlainValues;
static CAST: CastSelect = CastSelect;
static PLACEHOLDER: Placeholder = Placeholder;

/// The row recovery cascade, in the order strategies are tried.
pub fn default_strategies() -> [&'static dyn InsertStrategy; 3] {
    [&PLAIN, &CAST, &PLACEHOLDER]
}

// ─── Registration ────────────────────────────────────────────────────────────

/// Check that `name` is a plain SQL identifier.
pub fn validate_name(name: &str) -> Result<()> {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let ident = IDENT.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    });
    if ident.is_match(name) {
        Ok(())
    } else {
        Err(EngineError::config(format!(
            "source name '{}' is not a valid identifier",
            name
        )))
    }
}

/// Whether this build carries the native registration path.
pub fn native_capability() -> Capability {
    if cfg!(feature = "native-registration") {
        Capability::Supported
    } else {
        Capability::Unsupported
    }
}

/// Register every source in iteration order.
pub fn register_all(
    conn: &Connection,
    sources: &Sources,
    config: &SessionConfig,
) -> Result<Vec<RegistrationReport>> {
    sources
        .iter()
        .map(|(name, source)| register(conn, name, source, config))
        .collect()
}

/// Make `source` queryable as `name` inside `conn`.
///
/// # Errors
///
/// - `Config` for an invalid name.
/// - `Attach` when a store cannot be attached.
/// - `Registration` when an in-memory table has no columns, its table cannot
///   be created, or a row defeats every insert strategy.
pub fn register(
    conn: &Connection,
    name: &str,
    source: &Source,
    config: &SessionConfig,
) -> Result<RegistrationReport> {
    validate_name(name)?;
    let report = match source {
        Source::Store(path) => attach(conn, name, path, config)?,
        Source::Table(table) => register_table(conn, name, table, config)?,
    };
    debug!(
        source = %report.name,
        path = ?report.path,
        rows = report.rows,
        cast_rows = report.cast_rows,
        placeholder_rows = report.placeholder_rows,
        "Source registered"
    );
    Ok(report)
}

fn attach(
    conn: &Connection,
    name: &str,
    path: &std::path::Path,
    config: &SessionConfig,
) -> Result<RegistrationReport> {
    let path_str = path.display().to_string();
    let mut sql = format!("ATTACH {} AS {}", quote_text(&path_str), quote_identifier(name));
    if config.readonly() {
        sql.push_str(" (READ_ONLY)");
    }
    conn.raw()
        .execute_batch(&sql)
        .map_err(|e| EngineError::Attach {
            name: name.to_string(),
            path: path_str.clone(),
            detail: e.to_string(),
        })?;
    info!(source = %name, path = %path_str, readonly = config.readonly(), "Store attached");
    Ok(RegistrationReport::new(name, RegistrationPath::Attached))
}

fn register_table(
    conn: &Connection,
    name: &str,
    table: &Table,
    config: &SessionConfig,
) -> Result<RegistrationReport> {
    if table.column_count() == 0 {
        return Err(EngineError::registration(name, "table has no columns"));
    }

    if !config.force_manual_registration() {
        match register_native(conn, name, table) {
            NativeOutcome::Registered => {
                let mut report = RegistrationReport::new(name, RegistrationPath::Native);
                report.rows = table.row_count();
                return Ok(report);
            }
            NativeOutcome::Unsupported => {
                if config.verbose() {
                    info!(source = %name, "Native registration unavailable; using manual path");
                }
            }
            NativeOutcome::Failed(reason) => {
                if config.verbose() {
                    warn!(
                        source = %name,
                        reason = %reason,
                        "Native registration failed; using manual path"
                    );
                } else {
                    debug!(source = %name, reason = %reason, "Native registration failed");
                }
            }
        }
    }

    register_manual(conn, name, table, config)
}

/// Attempt the native path for `table`.
pub fn register_native(conn: &Connection, name: &str, table: &Table) -> NativeOutcome {
    match native_capability() {
        Capability::Unsupported => NativeOutcome::Unsupported,
        Capability::Supported => native::register(conn, name, table),
    }
}

/// Recreate `table` as a temporary table through generated SQL.
pub fn register_manual(
    conn: &Connection,
    name: &str,
    table: &Table,
    config: &SessionConfig,
) -> Result<RegistrationReport> {
    let target = TableTarget::from_table(name, table);
    let create = target.create_sql();
    conn.raw()
        .execute_batch(&create)
        .map_err(|e| EngineError::registration(name, format!("{} ({})", e, create)))?;

    let mut report = RegistrationReport::new(name, RegistrationPath::Manual);
    if table.row_count() == 0 {
        return Ok(report);
    }

    let strategies = default_strategies();
    let batch_size = config.batch_size().max(1);
    for (batch_no, batch) in table.rows().chunks(batch_size).enumerate() {
        if let Err(e) = PLAIN.insert_batch(conn.raw(), &target, batch) {
            debug!(
                source = %name,
                batch = batch_no,
                error = %e,
                "Batch insert failed; inserting row by row"
            );
            for (offset, row) in batch.iter().enumerate() {
                let row_no = batch_no * batch_size + offset;
                insert_with_recovery(conn, &target, row, row_no, &strategies, config, &mut report)?;
            }
        }
        report.rows += batch.len();
    }

    Ok(report)
}

fn insert_with_recovery(
    conn: &Connection,
    target: &TableTarget,
    row: &[Value],
    row_no: usize,
    strategies: &[&dyn InsertStrategy],
    config: &SessionConfig,
    report: &mut RegistrationReport,
) -> Result<()> {
    let mut last_error = None;
    for (tier, strategy) in strategies.iter().enumerate() {
        match strategy.insert_row(conn.raw(), target, row) {
            Ok(()) => {
                match tier {
                    0 => {}
                    1 => report.cast_rows += 1,
                    _ => report.placeholder_rows += 1,
                }
                return Ok(());
            }
            Err(e) => {
                if config.verbose() {
                    warn!(
                        source = %target.name(),
                        row = row_no,
                        strategy = strategy.name(),
                        error = %e,
                        "Row insert failed"
                    );
                }
                last_error = Some(e);
            }
        }
    }
    Err(EngineError::registration(
        target.name(),
        format!(
            "row {} could not be inserted: {}",
            row_no,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        ),
    ))
}

fn values_tuple(row: &[Value]) -> String {
    let literals = row.iter().map(format_value).collect::<Vec<_>>().join(", ");
    format!("({})", literals)
}

// ─── Native path ─────────────────────────────────────────────────────────────

#[cfg(feature = "native-registration")]
mod native {
    use chrono::Datelike;
    use duckdb::arrow::array::{
        ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
        TimestampMicrosecondArray,
    };
    use duckdb::arrow::datatypes::{DataType, Field, Schema, TimeUnit};
    use duckdb::arrow::record_batch::RecordBatch;
    use duckdb::vtab::arrow::ArrowVTab;
    use duckdb::vtab::arrow_recordbatch_to_query_params;
    use std::sync::Arc;

    use super::NativeOutcome;
    use crate::connection::Connection;
    use crate::format::quote_identifier;
    use crate::table::{ColumnType, Table, Value};

    /// Table function name the Arrow scan is registered under.
    const SCAN_FUNCTION: &str = "duckframe_arrow_scan";

    /// Days from 0001-01-01 to 1970-01-01.
    const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

    pub(super) fn register(conn: &Connection, name: &str, table: &Table) -> NativeOutcome {
        let batch = match to_record_batch(table) {
            Ok(batch) => batch,
            Err(reason) => return NativeOutcome::Failed(reason),
        };

        if !conn.arrow_scan_registered() {
            if let Err(e) = conn.raw().register_table_function::<ArrowVTab>(SCAN_FUNCTION) {
                return NativeOutcome::Failed(format!("cannot register Arrow scan: {}", e));
            }
            conn.mark_arrow_scan_registered();
        }

        let sql = format!(
            "CREATE OR REPLACE TEMPORARY TABLE {} AS SELECT * FROM {}(?, ?)",
            quote_identifier(name),
            SCAN_FUNCTION
        );
        let params = arrow_recordbatch_to_query_params(batch);
        match conn.raw().execute(&sql, params) {
            Ok(_) => NativeOutcome::Registered,
            Err(e) => NativeOutcome::Failed(e.to_string()),
        }
    }

    /// Convert `table` into one Arrow record batch.
    ///
    /// Fails for column types without an Arrow rendition here and for
    /// values that do not match their column's declared type.
    pub(super) fn to_record_batch(table: &Table) -> Result<RecordBatch, String> {
        let rows = table.rows();
        let mut fields = Vec::with_capacity(table.column_count());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.column_count());

        for (idx, column) in table.columns().iter().enumerate() {
            let name = column.name.as_str();
            let declared = column.column_type.unwrap_nullable();
            let (data_type, array): (DataType, ArrayRef) = match declared {
                Some(ColumnType::Int) => (
                    DataType::Int64,
                    Arc::new(Int64Array::from(collect(rows, idx, name, |v| v.as_i64())?)),
                ),
                Some(ColumnType::Float) => (
                    DataType::Float64,
                    Arc::new(Float64Array::from(collect(rows, idx, name, |v| v.as_f64())?)),
                ),
                Some(ColumnType::Bool) => (
                    DataType::Boolean,
                    Arc::new(BooleanArray::from(collect(rows, idx, name, |v| v.as_bool())?)),
                ),
                Some(ColumnType::Text) => (
                    DataType::Utf8,
                    Arc::new(StringArray::from(collect(rows, idx, name, |v| {
                        v.as_str().map(str::to_string)
                    })?)),
                ),
                Some(ColumnType::Date) => (
                    DataType::Date32,
                    Arc::new(Date32Array::from(collect(rows, idx, name, |v| match v {
                        Value::Date(d) => Some(d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
                        _ => None,
                    })?)),
                ),
                Some(ColumnType::Timestamp) => (
                    DataType::Timestamp(TimeUnit::Microsecond, None),
                    Arc::new(TimestampMicrosecondArray::from(collect(rows, idx, name, |v| {
                        match v {
                            Value::Timestamp(ts) => Some(ts.and_utc().timestamp_micros()),
                            _ => None,
                        }
                    })?)),
                ),
                // Several non-null alternatives: stored as text, like the
                // manual path does.
                None if matches!(column.column_type, ColumnType::Union(_)) => (
                    DataType::Utf8,
                    Arc::new(StringArray::from(collect(rows, idx, name, |v| match v {
                        Value::List(_) | Value::Blob(_) => None,
                        other => Some(other.to_string()),
                    })?)),
                ),
                _ => {
                    return Err(format!(
                        "column {} has type {:?}, which has no native rendition",
                        name, column.column_type
                    ))
                }
            };
            fields.push(Field::new(name, data_type, true));
            arrays.push(array);
        }

        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(|e| e.to_string())
    }

    fn collect<T, F>(
        rows: &[Vec<Value>],
        idx: usize,
        column: &str,
        f: F,
    ) -> Result<Vec<Option<T>>, String>
    where
        F: Fn(&Value) -> Option<T>,
    {
        rows.iter()
            .enumerate()
            .map(|(row_no, row)| match &row[idx] {
                Value::Null => Ok(None),
                value => f(value).map(Some).ok_or_else(|| {
                    format!(
                        "row {} column {} holds {:?}, which does not match the declared type",
                        row_no, column, value
                    )
                }),
            })
            .collect()
    }
}

#[cfg(not(feature = "native-registration"))]
mod native {
    use super::NativeOutcome;
    use crate::connection::Connection;
    use crate::table::Table;

    pub(super) fn register(_conn: &Connection, _name: &str, _table: &Table) -> NativeOutcome {
        NativeOutcome::Unsupported
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{open, Location};
    use crate::table::Column;
    use chrono::NaiveDate;

    fn memory() -> Connection {
        open(&Location::Memory, &SessionConfig::default()).unwrap()
    }

    fn manual_config() -> SessionConfig {
        SessionConfig::builder()
            .option("force_manual_registration", true)
            .build()
            .unwrap()
    }

    fn scalar_i64(conn: &Connection, sql: &str) -> i64 {
        conn.raw().query_row(sql, [], |row| row.get(0)).unwrap()
    }

    fn people() -> Table {
        Table::from_rows(
            vec![
                Column::new("id", ColumnType::Int),
                Column::new("name", ColumnType::Text),
                Column::new("score", ColumnType::nullable(ColumnType::Float)),
                Column::new("joined", ColumnType::nullable(ColumnType::Date)),
            ],
            vec![
                vec![
                    1.into(),
                    "Alice".into(),
                    1.5.into(),
                    NaiveDate::from_ymd_opt(2020, 1, 2).into(),
                ],
                vec![2.into(), "O'Brien".into(), Value::Null, Value::Null],
                vec![3.into(), "Charlie".into(), 3.0.into(), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("df").is_ok());
        assert!(validate_name("_orders_2024").is_ok());
        assert!(validate_name("1abc").is_err());
        assert!(validate_name("drop table").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_create_sql() {
        let target = TableTarget::from_table("people", &people());
        assert_eq!(
            target.create_sql(),
            "CREATE OR REPLACE TEMPORARY TABLE \"people\" (\"id\" INTEGER, \"name\" VARCHAR, \"score\" DOUBLE, \"joined\" DATE)"
        );
    }

    #[test]
    fn test_manual_registration_round_trip() {
        let conn = memory();
        let report = register(&conn, "people", &Source::Table(people()), &manual_config()).unwrap();
        assert_eq!(report.path, RegistrationPath::Manual);
        assert_eq!(report.rows, 3);
        assert_eq!(report.placeholder_rows, 0);

        assert_eq!(scalar_i64(&conn, "SELECT COUNT(*) FROM people"), 3);
        assert_eq!(scalar_i64(&conn, "SELECT COUNT(score) FROM people"), 2);
        let name: String = conn
            .raw()
            .query_row("SELECT name FROM people WHERE id = 2", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "O'Brien");
    }

    #[cfg(feature = "native-registration")]
    #[test]
    fn test_native_registration_round_trip() {
        let conn = memory();
        let report = register(&conn, "people", &Source::Table(people()), &SessionConfig::default())
            .unwrap();
        assert_eq!(scalar_i64(&conn, "SELECT COUNT(*) FROM people"), 3);
        assert_eq!(scalar_i64(&conn, "SELECT COUNT(joined) FROM people"), 1);
        assert_eq!(report.rows, 3);
        assert_eq!(report.path, RegistrationPath::Native);
    }

    fn wide_ints() -> Table {
        Table::from_rows(
            vec![Column::new("n", ColumnType::Int)],
            vec![vec![Value::Int(7)], vec![Value::Int(5_000_000_000)]],
        )
        .unwrap()
    }

    #[test]
    fn test_out_of_range_int_on_manual_path_becomes_placeholder() {
        let conn = memory();
        let report = register(&conn, "wide", &Source::Table(wide_ints()), &manual_config())
            .unwrap();
        assert_eq!(report.path, RegistrationPath::Manual);
        assert_eq!(report.rows, 2);
        assert_eq!(report.placeholder_rows, 1);
        assert_eq!(scalar_i64(&conn, "SELECT COUNT(*) FROM wide"), 2);
        assert_eq!(scalar_i64(&conn, "SELECT MAX(n) FROM wide"), 7);
        assert_eq!(scalar_i64(&conn, "SELECT COUNT(*) FROM wide WHERE n = 0"), 1);
    }

    #[cfg(feature = "native-registration")]
    #[test]
    fn test_out_of_range_int_on_native_path_is_kept() {
        let conn = memory();
        let report = register(
            &conn,
            "wide",
            &Source::Table(wide_ints()),
            &SessionConfig::default(),
        )
        .unwrap();
        assert_eq!(report.path, RegistrationPath::Native);
        assert_eq!(report.placeholder_rows, 0);
        assert_eq!(scalar_i64(&conn, "SELECT MAX(n) FROM wide"), 5_000_000_000);
    }

    #[test]
    fn test_placeholders_follow_declared_type() {
        let table = Table::new(vec![
            Column::new("label", ColumnType::nullable(ColumnType::Text)),
            Column::new("tags", ColumnType::List(Box::new(ColumnType::Text))),
            Column::new("raw", ColumnType::Blob),
            Column::new("mixed", ColumnType::Union(vec![ColumnType::Int, ColumnType::Text])),
            Column::new("n", ColumnType::Int),
        ]);
        let target = TableTarget::from_table("p", &table);
        let literals: Vec<_> = target
            .columns()
            .iter()
            .map(TargetColumn::placeholder_literal)
            .collect();
        assert_eq!(literals, vec!["''", "NULL", "NULL", "NULL", "0"]);

        let conn = memory();
        conn.raw().execute_batch(&target.create_sql()).unwrap();
        Placeholder.insert_row(conn.raw(), &target, &[]).unwrap();
        assert_eq!(scalar_i64(&conn, "SELECT COUNT(*) FROM p WHERE label = ''"), 1);
        assert_eq!(scalar_i64(&conn, "SELECT COUNT(tags) + COUNT(raw) + COUNT(mixed) FROM p"), 0);
    }

    #[test]
    fn test_empty_table_creates_typed_table() {
        let conn = memory();
        let table = Table::new(vec![Column::new("x", ColumnType::Int)]);
        let report = register(&conn, "empty_t", &Source::Table(table), &manual_config()).unwrap();
        assert_eq!(report.rows, 0);
        assert_eq!(scalar_i64(&conn, "SELECT COUNT(*) FROM empty_t"), 0);
        let ty: String = conn
            .raw()
            .query_row(
                "SELECT data_type FROM information_schema.columns WHERE table_name = 'empty_t'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(ty, "INTEGER");
    }

    #[test]
    fn test_zero_column_table_is_rejected() {
        let conn = memory();
        let err = register(&conn, "nothing", &Source::Table(Table::empty()), &manual_config())
            .unwrap_err();
        assert!(matches!(err, EngineError::Registration { .. }));
    }

    #[test]
    fn test_unrepresentable_row_gets_placeholders() {
        let conn = memory();
        let table = Table::from_rows(
            vec![
                Column::new("n", ColumnType::Int),
                Column::new("label", ColumnType::Text),
            ],
            vec![
                vec![1.into(), "ok".into()],
                vec!["not a number".into(), "bad".into()],
                vec![3.into(), "ok".into()],
            ],
        )
        .unwrap();
        let report =
            register(&conn, "t", &Source::Table(table), &SessionConfig::default()).unwrap();

        // The mismatched value also defeats the native path.
        assert_eq!(report.path, RegistrationPath::Manual);
        assert_eq!(report.rows, 3);
        assert_eq!(report.placeholder_rows, 1);
        assert_eq!(scalar_i64(&conn, "SELECT COUNT(*) FROM t"), 3);
        assert_eq!(scalar_i64(&conn, "SELECT SUM(n) FROM t"), 4);
        let label: String = conn
            .raw()
            .query_row("SELECT label FROM t WHERE n = 0", [], |r| r.get(0))
            .unwrap();
        assert_eq!(label, "");
    }

    #[test]
    fn test_list_column_is_stored_as_text() {
        let conn = memory();
        let table = Table::from_rows(
            vec![Column::new("tags", ColumnType::List(Box::new(ColumnType::Text)))],
            vec![vec![Value::List(vec!["a".into(), "b".into()])]],
        )
        .unwrap();
        let report = register(&conn, "tagged", &Source::Table(table), &SessionConfig::default())
            .unwrap();
        assert_eq!(report.path, RegistrationPath::Manual);
        let tags: String = conn
            .raw()
            .query_row("SELECT tags FROM tagged", [], |r| r.get(0))
            .unwrap();
        assert_eq!(tags, "['a', 'b']");
    }

    #[test]
    fn test_batch_size_does_not_change_contents() {
        let rows: Vec<Vec<Value>> = (0..250).map(|i| vec![Value::Int(i)]).collect();
        let table = Table::from_rows(vec![Column::new("v", ColumnType::Int)], rows).unwrap();

        for batch_size in [1, 7, 100, 1000] {
            let conn = memory();
            let config = SessionConfig::builder()
                .option("force_manual_registration", true)
                .option("batch_size", batch_size)
                .build()
                .unwrap();
            register(&conn, "nums", &Source::Table(table.clone()), &config).unwrap();
            assert_eq!(scalar_i64(&conn, "SELECT COUNT(*) FROM nums"), 250);
            assert_eq!(scalar_i64(&conn, "SELECT SUM(v) FROM nums"), 31_125);
        }
    }

    #[test]
    fn test_strategies_individually() {
        let conn = memory();
        let table = Table::new(vec![
            Column::new("n", ColumnType::Int),
            Column::new("d", ColumnType::Date),
            Column::new("b", ColumnType::Bool),
        ]);
        let target = TableTarget::from_table("s", &table);
        conn.raw().execute_batch(&target.create_sql()).unwrap();

        let good = vec![
            Value::Int(5),
            NaiveDate::from_ymd_opt(2021, 3, 4).into(),
            Value::Bool(true),
        ];
        let bad = vec![Value::Text("x".into()), Value::Text("y".into()), Value::Int(1)];

        assert!(PlainValues.insert_row(conn.raw(), &target, &good).is_ok());
        assert!(CastSelect.insert_row(conn.raw(), &target, &good).is_ok());
        assert!(PlainValues.insert_row(conn.raw(), &target, &bad).is_err());
        assert!(CastSelect.insert_row(conn.raw(), &target, &bad).is_err());
        assert!(Placeholder.insert_row(conn.raw(), &target, &bad).is_ok());

        assert_eq!(scalar_i64(&conn, "SELECT COUNT(*) FROM s"), 3);
        assert_eq!(scalar_i64(&conn, "SELECT COUNT(*) FROM s WHERE d = DATE '1970-01-01'"), 1);
        let names: Vec<_> = default_strategies().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["values", "cast", "placeholder"]);
    }

    #[test]
    fn test_duplicate_name_replaces_earlier_table() {
        let conn = memory();
        let config = manual_config();
        register(&conn, "t", &Source::Table(people()), &config).unwrap();
        let single = Table::from_rows(vec![Column::new("x", ColumnType::Int)], vec![vec![9.into()]])
            .unwrap();
        register(&conn, "t", &Source::Table(single), &config).unwrap();
        assert_eq!(scalar_i64(&conn, "SELECT x FROM t"), 9);
    }

    #[test]
    fn test_attach_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.duckdb");
        {
            let other = duckdb::Connection::open(&path).unwrap();
            other
                .execute_batch("CREATE TABLE items AS SELECT range AS i FROM range(4)")
                .unwrap();
        }

        let conn = memory();
        let report = register(&conn, "other", &Source::Store(path), &SessionConfig::default())
            .unwrap();
        assert_eq!(report.path, RegistrationPath::Attached);
        assert_eq!(scalar_i64(&conn, "SELECT COUNT(*) FROM other.items"), 4);
    }

    #[test]
    fn test_attach_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.duckdb");
        std::fs::write(&path, b"junk junk junk\n".repeat(512)).unwrap();
        let err = register(&memory(), "junk", &Source::Store(path), &SessionConfig::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::Attach { .. }));
    }
}
