//! # duckframe
//!
//! Run SQL against in-memory tables or DuckDB database files in one call.
//!
//! Every call opens its own connection, registers the supplied sources,
//! runs the statements and closes the connection again. In-memory tables
//! are exposed through DuckDB's Arrow scan when available, otherwise they
//! are recreated as typed temporary tables row by row.
//!
//! ## Quick Start
//!
//! ```no_run
//! use duckframe::{query_with, Column, ColumnType, SessionConfig, Sources, Table};
//!
//! # fn main() -> duckframe::Result<()> {
//! let customers = Table::from_rows(
//!     vec![Column::new("id", ColumnType::Int), Column::new("name", ColumnType::Text)],
//!     vec![vec![1.into(), "Ada".into()]],
//! )?;
//! let orders = Table::from_rows(
//!     vec![Column::new("customer_id", ColumnType::Int), Column::new("amount", ColumnType::Float)],
//!     vec![vec![1.into(), 9.5.into()]],
//! )?;
//!
//! let sources = Sources::new().with("customers", customers).with("orders", orders);
//! let result = query_with(
//!     sources,
//!     "SELECT c.name, o.amount FROM customers c JOIN orders o ON c.id = o.customer_id",
//!     SessionConfig::builder().on_error("fail"),
//! )?;
//! println!("{:?}", result.to_json_rows());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `native-registration` (default): register tables through DuckDB's Arrow
//!   table function instead of generated `INSERT` statements.

pub mod config;
pub mod logging;
pub mod session;

pub use duckframe_engine as engine;

pub use duckframe_engine::{
    map_type, native_capability, Capability, Column, ColumnType, Connection, EngineError,
    EngineType, InsertStrategy, Location, NativeOutcome, OnError, OptionValue, RegistrationPath,
    RegistrationReport, Result, SessionConfig, SessionConfigBuilder, Source, Sources, Table,
    Value, DEFAULT_BATCH_SIZE, MEMORY_LOCATION,
};

pub use config::ConfigFile;
pub use session::{
    query, query_with, query_with_setup, run, SetupFn, SessionSource, Statements,
    DEFAULT_TABLE_NAME,
};
