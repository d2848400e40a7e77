//! In-memory tabular data exchanged with the engine.
//!
//! A [`Table`] is both what callers hand in as a source and what statement
//! execution hands back. Columns carry a semantic [`ColumnType`]; the
//! [`types`](crate::types) module maps those onto DuckDB column types.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::PathBuf;

use crate::error::{EngineError, Result};

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Blob(Vec<u8>),
    /// Nested collection. Stored as text on the manual registration path.
    List(Vec<Value>),
}

impl Value {
    /// Returns `true` for the missing-value marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of the value, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float view of the value; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Render the value as JSON. Blobs become base64 strings, dates and
    /// timestamps ISO-8601 strings.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            Value::Timestamp(ts) => {
                JsonValue::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            Value::Blob(b) => JsonValue::String(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                b,
            )),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::Blob(b) => write!(f, "{:?}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::Text(s) => write!(f, "'{}'", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Semantic type of a column, as declared by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    /// Integer values. The manual registration path stores these as
    /// 32-bit `INTEGER`; a value outside the `i32` range cannot be inserted
    /// there and is replaced by the placeholder `0`. The native path keeps
    /// the full `i64`.
    Int,
    Float,
    Text,
    Bool,
    Date,
    Timestamp,
    Blob,
    List(Box<ColumnType>),
    /// Unknown or heterogeneous content.
    Any,
    /// The missing-value type; only meaningful inside a `Union`.
    Null,
    /// One of several alternatives. A union containing `Null` is the
    /// nullable wrapper.
    Union(Vec<ColumnType>),
}

impl ColumnType {
    /// Nullable wrapper around `base`.
    pub fn nullable(base: ColumnType) -> Self {
        ColumnType::Union(vec![base, ColumnType::Null])
    }

    /// Returns `true` if missing values are part of the declared type.
    pub fn is_nullable(&self) -> bool {
        match self {
            ColumnType::Null => true,
            ColumnType::Union(alts) => alts.iter().any(ColumnType::is_nullable),
            _ => false,
        }
    }

    /// Strip the nullable wrapper.
    ///
    /// Returns the single non-null alternative, or `None` when the union
    /// holds zero or several of them.
    pub fn unwrap_nullable(&self) -> Option<&ColumnType> {
        match self {
            ColumnType::Union(alts) => {
                let mut non_null = alts.iter().filter(|t| !matches!(t, ColumnType::Null));
                match (non_null.next(), non_null.next()) {
                    (Some(only), None) => only.unwrap_nullable(),
                    _ => None,
                }
            }
            other => Some(other),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Row-major table with a typed header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Table with the given header and no rows.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// The zero-column, zero-row table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from a header and rows, checking every row's width.
    pub fn from_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append one row.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(EngineError::config(format!(
                "row has {} values but the table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `true` when the table has neither columns nor rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Position of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// All values of the column called `name`.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Cell at (`row`, column `name`).
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json_rows(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|row| {
                let obj = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(c, v)| (c.name.clone(), v.to_json()))
                    .collect::<serde_json::Map<_, _>>();
                JsonValue::Object(obj)
            })
            .collect()
    }
}

/// A named data source to expose inside the connection.
#[derive(Debug, Clone)]
pub enum Source {
    /// In-memory table, registered as a temporary table.
    Table(Table),
    /// Path to another DuckDB file, attached under the source name.
    Store(PathBuf),
}

impl From<Table> for Source {
    fn from(t: Table) -> Self {
        Source::Table(t)
    }
}

impl From<PathBuf> for Source {
    fn from(p: PathBuf) -> Self {
        Source::Store(p)
    }
}

/// Ordered collection of named sources.
///
/// Inserting an existing name replaces its source but keeps the original
/// position, so iteration order is first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    entries: Vec<(String, Source)>,
}

impl Sources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the source called `name`.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<Source>) {
        let name = name.into();
        let source = source.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = source,
            None => self.entries.push((name, source)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, source: impl Into<Source>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Source> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Source)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }
}

impl<N: Into<String>, S: Into<Source>> FromIterator<(N, S)> for Sources {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        let mut sources = Sources::new();
        for (name, source) in iter {
            sources.insert(name, source);
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Table {
        Table::from_rows(
            vec![
                Column::new("id", ColumnType::Int),
                Column::new("name", ColumnType::nullable(ColumnType::Text)),
            ],
            vec![
                vec![1.into(), "Alice".into()],
                vec![2.into(), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_row_width_is_checked() {
        let mut t = people();
        let err = t.push_row(vec![Value::Int(3)]).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert_eq!(t.row_count(), 2);
    }

    #[test]
    fn test_column_access() {
        let t = people();
        assert_eq!(t.column_names(), vec!["id", "name"]);
        assert_eq!(t.get(0, "name"), Some(&Value::Text("Alice".into())));
        assert_eq!(t.column("id").unwrap(), vec![&Value::Int(1), &Value::Int(2)]);
        assert!(t.get(5, "id").is_none());
    }

    #[test]
    fn test_unwrap_nullable() {
        let t = ColumnType::nullable(ColumnType::Int);
        assert!(t.is_nullable());
        assert_eq!(t.unwrap_nullable(), Some(&ColumnType::Int));

        let mixed = ColumnType::Union(vec![ColumnType::Int, ColumnType::Text, ColumnType::Null]);
        assert_eq!(mixed.unwrap_nullable(), None);
        assert_eq!(ColumnType::Float.unwrap_nullable(), Some(&ColumnType::Float));
    }

    #[test]
    fn test_sources_last_insert_wins_in_first_position() {
        let mut sources = Sources::new();
        sources.insert("a", Table::empty());
        sources.insert("b", PathBuf::from("b.duckdb"));
        sources.insert("a", PathBuf::from("a.duckdb"));

        let names: Vec<_> = sources.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(matches!(sources.get("a"), Some(Source::Store(_))));
    }

    #[test]
    fn test_json_rows() {
        let rows = people().to_json_rows();
        assert_eq!(rows[0], serde_json::json!({"id": 1, "name": "Alice"}));
        assert_eq!(rows[1], serde_json::json!({"id": 2, "name": null}));
    }

    #[test]
    fn test_list_display() {
        let v = Value::List(vec![Value::Int(1), Value::Text("a".into())]);
        assert_eq!(v.to_string(), "[1, 'a']");
    }
}
