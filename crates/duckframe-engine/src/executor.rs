//! Statement execution.
//!
//! Each statement goes through the configured preprocessors, runs against
//! the connection, and its result table goes through the postprocessors.
//! Failures are handled according to the session's [`OnError`] policy.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use duckdb::arrow::datatypes::DataType;
use duckdb::types::{TimeUnit, ValueRef};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::config::{OnError, SessionConfig};
use crate::connection::Connection;
use crate::error::{EngineError, Result};
use crate::table::{Column, ColumnType, Table, Value};

/// Run one statement and return its (post-processed) result table.
///
/// # Errors
///
/// Only under [`OnError::Fail`]: DuckDB query failures are returned as
/// `EngineError::DuckDb`, anything else as `EngineError::Statement`.
///
/// # Examples
///
/// ```no_run
/// # use duckframe_engine::{connection, executor, config::SessionConfig};
/// # fn main() -> duckframe_engine::Result<()> {
/// let config = SessionConfig::default();
/// let conn = connection::open(&connection::Location::Memory, &config)?;
/// let table = executor::execute(&conn, "SELECT 42 AS answer", &config)?;
/// assert_eq!(table.row_count(), 1);
/// # Ok(())
/// # }
/// ```
pub fn execute(conn: &Connection, statement: &str, config: &SessionConfig) -> Result<Table> {
    let sql = config.preprocess(statement);
    if sql != statement {
        debug!(original = %statement, rewritten = %sql, "Statement preprocessed");
    }

    let start_time = Instant::now();
    let outcome = run_statement(conn, &sql, statement);
    if config.profile() {
        info!(
            sql = %sql,
            elapsed_ms = start_time.elapsed().as_secs_f64() * 1000.0,
            "Statement profiled"
        );
    }

    match outcome {
        Ok(table) => {
            debug!(rows = table.row_count(), columns = table.column_count(), "Statement executed");
            Ok(config.postprocess(table))
        }
        Err(e) => match config.on_error() {
            OnError::Fail => Err(e),
            OnError::ReturnEmpty => {
                debug!(
                    statement = %statement,
                    error = %e,
                    "Statement failed; returning empty table"
                );
                Ok(Table::empty())
            }
            OnError::LogAndReturnEmpty => {
                error!(
                    statement = %statement,
                    error = %e,
                    "Statement failed; returning empty table"
                );
                Ok(Table::empty())
            }
        },
    }
}

/// Run statements in order and return the last result.
///
/// An error that the policy lets through stops the sequence. An empty
/// sequence returns [`Table::empty`].
pub fn execute_many<S: AsRef<str>>(
    conn: &Connection,
    statements: &[S],
    config: &SessionConfig,
) -> Result<Table> {
    let mut last = Table::empty();
    for statement in statements {
        last = execute(conn, statement.as_ref(), config)?;
    }
    Ok(last)
}

/// Run `sql`. Errors name `original`, the statement as the caller wrote it.
fn run_statement(conn: &Connection, sql: &str, original: &str) -> Result<Table> {
    let mut stmt = conn
        .raw()
        .prepare(sql)
        .map_err(|e| EngineError::from_execution(original, e))?;
    let mut rows_result = stmt
        .query([])
        .map_err(|e| EngineError::from_execution(original, e))?;

    let mut rows = Vec::new();
    while let Some(row) = rows_result
        .next()
        .map_err(|e| EngineError::from_execution(original, e))?
    {
        let mut values = Vec::new();
        for i in 0.. {
            match row.get_ref(i) {
                Ok(value) => values.push(from_duckdb(value)),
                Err(duckdb::Error::InvalidColumnIndex(_)) => break,
                Err(e) => return Err(EngineError::statement(original, e.to_string())),
            }
        }
        rows.push(values);
    }

    // Column metadata is only readable once the Rows borrow is released.
    drop(rows_result);

    let columns = stmt
        .column_names()
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, from_arrow_type(&stmt.column_type(i))))
        .collect();

    Table::from_rows(columns, rows).map_err(|e| EngineError::statement(original, e.to_string()))
}

/// Convert a DuckDB cell into a [`Value`].
pub fn from_duckdb(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(i) => Value::Int(i.into()),
        ValueRef::SmallInt(i) => Value::Int(i.into()),
        ValueRef::Int(i) => Value::Int(i.into()),
        ValueRef::BigInt(i) => Value::Int(i),
        ValueRef::HugeInt(i) => match i64::try_from(i) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Text(i.to_string()),
        },
        ValueRef::UTinyInt(i) => Value::Int(i.into()),
        ValueRef::USmallInt(i) => Value::Int(i.into()),
        ValueRef::UInt(i) => Value::Int(i.into()),
        ValueRef::UBigInt(i) => match i64::try_from(i) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Text(i.to_string()),
        },
        ValueRef::Float(f) => Value::Float(f.into()),
        ValueRef::Double(f) => Value::Float(f),
        ValueRef::Decimal(d) => match d.to_string().parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => Value::Text(d.to_string()),
        },
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        ValueRef::Date32(days) => epoch_date()
            .checked_add_signed(Duration::days(days.into()))
            .map(Value::Date)
            .unwrap_or(Value::Null),
        ValueRef::Timestamp(unit, v) => timestamp(unit, v)
            .map(Value::Timestamp)
            .unwrap_or(Value::Null),
        other => Value::Text(format!("{:?}", other)),
    }
}

/// Semantic column type for a DuckDB result column.
pub fn from_arrow_type(data_type: &DataType) -> ColumnType {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ColumnType::Int,
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(..)
        | DataType::Decimal256(..) => ColumnType::Float,
        DataType::Utf8 | DataType::LargeUtf8 => ColumnType::Text,
        DataType::Boolean => ColumnType::Bool,
        DataType::Date32 | DataType::Date64 => ColumnType::Date,
        DataType::Timestamp(..) => ColumnType::Timestamp,
        DataType::Binary | DataType::LargeBinary | DataType::FixedSizeBinary(_) => ColumnType::Blob,
        DataType::List(field) | DataType::LargeList(field) => {
            ColumnType::List(Box::new(from_arrow_type(field.data_type())))
        }
        DataType::Null => ColumnType::Null,
        _ => ColumnType::Any,
    }
}

/// 1970-01-01, the origin of DuckDB's `DATE` day counts.
fn epoch_date() -> NaiveDate {
    NaiveDate::default()
}

fn timestamp(unit: TimeUnit, v: i64) -> Option<NaiveDateTime> {
    let micros = match unit {
        TimeUnit::Second => v.checked_mul(1_000_000)?,
        TimeUnit::Millisecond => v.checked_mul(1_000)?,
        TimeUnit::Microsecond => v,
        TimeUnit::Nanosecond => v / 1_000,
    };
    chrono::DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}
