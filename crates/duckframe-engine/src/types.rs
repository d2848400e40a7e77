//! Mapping from semantic column types to DuckDB column types.

use std::fmt;

use crate::table::ColumnType;

/// DuckDB column types produced by [`map_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineType {
    Integer,
    Double,
    Varchar,
    Boolean,
    Date,
    Timestamp,
}

impl EngineType {
    /// DuckDB type name.
    pub fn as_sql(&self) -> &'static str {
        match self {
            EngineType::Integer => "INTEGER",
            EngineType::Double => "DOUBLE",
            EngineType::Varchar => "VARCHAR",
            EngineType::Boolean => "BOOLEAN",
            EngineType::Date => "DATE",
            EngineType::Timestamp => "TIMESTAMP",
        }
    }

    /// Literal inserted when a row cannot be represented at all.
    ///
    /// For `VARCHAR` this is the text default; columns stored as `VARCHAR`
    /// without being declared text use `NULL` instead (see
    /// [`TargetColumn::placeholder_literal`](crate::registrar::TargetColumn::placeholder_literal)).
    pub fn placeholder_literal(&self) -> &'static str {
        match self {
            EngineType::Integer => "0",
            EngineType::Double => "0.0",
            EngineType::Varchar => "''",
            EngineType::Boolean => "FALSE",
            EngineType::Date => "'1970-01-01'",
            EngineType::Timestamp => "'1970-01-01 00:00:00'",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Map a semantic column type onto a DuckDB column type.
///
/// The nullable wrapper is stripped first. A union with more than one
/// non-null alternative, nested types and anything unknown all become
/// `VARCHAR`; values of those columns are stored as text.
pub fn map_type(column_type: &ColumnType) -> EngineType {
    match column_type.unwrap_nullable() {
        Some(ColumnType::Int) => EngineType::Integer,
        Some(ColumnType::Float) => EngineType::Double,
        Some(ColumnType::Text) => EngineType::Varchar,
        Some(ColumnType::Bool) => EngineType::Boolean,
        Some(ColumnType::Date) => EngineType::Date,
        Some(ColumnType::Timestamp) => EngineType::Timestamp,
        _ => EngineType::Varchar,
    }
}
