//! Shared test fixtures for duckframe integration tests
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use duckframe::{Column, ColumnType, Table, Value};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

// ============================================================================
// Fixtures
// ============================================================================

/// `df{id, name}` with Alice, Bob and Charlie.
pub fn people() -> Table {
    Table::from_rows(
        vec![
            Column::new("id", ColumnType::Int),
            Column::new("name", ColumnType::Text),
        ],
        vec![
            vec![1.into(), "Alice".into()],
            vec![2.into(), "Bob".into()],
            vec![3.into(), "Charlie".into()],
        ],
    )
    .unwrap()
}

pub fn customers() -> Table {
    Table::from_rows(
        vec![
            Column::new("id", ColumnType::Int),
            Column::new("name", ColumnType::Text),
        ],
        vec![
            vec![1.into(), "Ada".into()],
            vec![2.into(), "Grace".into()],
            vec![3.into(), "Linus".into()],
        ],
    )
    .unwrap()
}

pub fn orders() -> Table {
    Table::from_rows(
        vec![
            Column::new("id", ColumnType::Int),
            Column::new("customer_id", ColumnType::Int),
            Column::new("amount", ColumnType::Float),
        ],
        vec![
            vec![10.into(), 1.into(), 25.0.into()],
            vec![11.into(), 2.into(), 99.5.into()],
            vec![12.into(), 1.into(), 5.25.into()],
            vec![13.into(), 3.into(), 60.0.into()],
        ],
    )
    .unwrap()
}

/// `n` rows of `{category, count}` where every count is 1.
pub fn category_counts(n: usize, categories: usize) -> Table {
    let rows = (0..n)
        .map(|i| vec![Value::Text(format!("cat_{}", i % categories)), Value::Int(1)])
        .collect();
    Table::from_rows(
        vec![
            Column::new("category", ColumnType::Text),
            Column::new("count", ColumnType::Int),
        ],
        rows,
    )
    .unwrap()
}

// ============================================================================
// Database files
// ============================================================================

/// Create a DuckDB file at `dir/name` populated by `sql`.
pub fn create_store(dir: &TempDir, name: &str, sql: &str) -> PathBuf {
    let path = dir.path().join(name);
    let conn = duckdb::Connection::open(&path).unwrap();
    conn.execute_batch(sql).unwrap();
    drop(conn);
    path
}

/// Write bytes that are not a database.
pub fn create_junk_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"this is definitely not a duckdb database file")
        .unwrap();
    path
}

// ============================================================================
// Log capture
// ============================================================================

/// In-memory writer for capturing `tracing` output.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuf {
    type Writer = SharedBuf;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a thread-local subscriber and return what it logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buf = SharedBuf::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buf.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, buf.contents())
}

// ============================================================================
// Assertions
// ============================================================================

pub fn text(table: &Table, row: usize, column: &str) -> String {
    table
        .get(row, column)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("no text at row {} column {}", row, column))
        .to_string()
}

pub fn int(table: &Table, row: usize, column: &str) -> i64 {
    table
        .get(row, column)
        .and_then(Value::as_i64)
        .unwrap_or_else(|| panic!("no integer at row {} column {}", row, column))
}
