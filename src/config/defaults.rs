//! Default constants for duckframe configuration

pub use duckframe_engine::config::DEFAULT_BATCH_SIZE;
pub use duckframe_engine::connection::MEMORY_LOCATION;

pub use crate::session::DEFAULT_TABLE_NAME;

/// File name searched for by [`ConfigFile::load_default`](super::ConfigFile::load_default)
pub const DEFAULT_CONFIG_FILE: &str = "duckframe.toml";

/// Directory under the user config dir holding the config file
pub const CONFIG_DIR_NAME: &str = "duckframe";

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Log filter used when `RUST_LOG` is unset and verbose logging is requested
pub const VERBOSE_LOG_FILTER: &str = "warn,duckframe=debug,duckframe_engine=debug";
