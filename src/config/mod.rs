//! Configuration for duckframe sessions
//!
//! - `defaults` - Default constants
//! - `file` - TOML configuration file loading
//!
//! The session configuration itself lives in the engine crate and is
//! re-exported here.

mod defaults;
pub mod file;

pub use defaults::*;
pub use file::{ConfigFile, SessionSection};

pub use duckframe_engine::config::{
    OnError, OptionValue, Postprocessor, Preprocessor, SessionConfig, SessionConfigBuilder,
};
