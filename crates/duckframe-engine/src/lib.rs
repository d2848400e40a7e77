//! Embedded DuckDB session layer for duckframe.
//!
//! This crate is a workspace member that isolates the heavy `duckdb`
//! (bundled C++) dependency into its own compilation unit.
//!
//! # Overview
//!
//! One top-level call owns one [`Connection`]:
//!
//! 1. [`connection::open`] opens the database (in-memory or a file) and
//!    applies the [`SessionConfig`] options and initialisation statements.
//! 2. [`registrar::register`] exposes each named [`Source`] inside the
//!    connection: in-memory tables natively or through generated SQL,
//!    files through `ATTACH`.
//! 3. [`executor::execute`] runs statements and returns [`Table`] results,
//!    applying the configured error policy.
//!
//! # Modules
//!
//! - [`config`] -- Immutable per-call session configuration.
//! - [`connection`] -- Opening and configuring DuckDB sessions.
//! - [`registrar`] -- Source registration (attach, native, manual).
//! - [`executor`] -- Statement execution and result conversion.
//! - [`table`] -- Tabular data model.
//! - [`types`] -- Semantic type to DuckDB type mapping.
//! - [`format`] -- SQL literal rendering.
//! - [`error`] -- Error taxonomy.

pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod format;
pub mod registrar;
pub mod table;
pub mod types;

pub use config::{OnError, OptionValue, SessionConfig, SessionConfigBuilder, DEFAULT_BATCH_SIZE};
pub use connection::{Connection, Location, MEMORY_LOCATION};
pub use error::{EngineError, Result};
pub use registrar::{
    native_capability, Capability, InsertStrategy, NativeOutcome, RegistrationPath,
    RegistrationReport,
};
pub use table::{Column, ColumnType, Source, Sources, Table, Value};
pub use types::{map_type, EngineType};
