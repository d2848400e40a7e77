//! Session configuration.
//!
//! A [`SessionConfig`] is built once per top-level call through
//! [`SessionConfigBuilder`] and then only borrowed. `build()` validates every
//! recognised option so that configuration mistakes surface before a
//! connection is opened.
//!
//! # Recognised options
//!
//! | Key | Type | Consumer |
//! |---|---|---|
//! | `memory_limit` | string (`"100MB"`) | connection |
//! | `threads` | integer | connection (failure only warns) |
//! | `extensions` | string or list of strings | connection (failure is fatal) |
//! | `batch_size` | positive integer, default `1000` | registrar |
//! | `force_manual_registration` | boolean | registrar |
//!
//! Any other key is applied as `SET key = value`; failures only warn.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, Result};
use crate::table::{Table, Value};

/// Rows per insert batch on the manual registration path.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

pub const OPT_MEMORY_LIMIT: &str = "memory_limit";
pub const OPT_THREADS: &str = "threads";
pub const OPT_EXTENSIONS: &str = "extensions";
pub const OPT_BATCH_SIZE: &str = "batch_size";
pub const OPT_FORCE_MANUAL: &str = "force_manual_registration";

/// Statement-text transform applied before execution.
pub type Preprocessor = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Result-table transform applied after execution.
pub type Postprocessor = Box<dyn Fn(Table) -> Table + Send + Sync>;

/// What to do when a statement fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnError {
    /// Propagate the error.
    #[default]
    Fail,
    /// Swallow the error and return an empty table.
    ReturnEmpty,
    /// Log the error and return an empty table.
    LogAndReturnEmpty,
}

impl FromStr for OnError {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(OnError::Fail),
            "return-empty" | "return_empty" => Ok(OnError::ReturnEmpty),
            "log-and-return-empty" | "log_and_return_empty" | "log" => {
                Ok(OnError::LogAndReturnEmpty)
            }
            other => Err(EngineError::config(format!(
                "invalid on_error value '{}' (expected fail, return-empty or log-and-return-empty)",
                other
            ))),
        }
    }
}

impl fmt::Display for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OnError::Fail => "fail",
            OnError::ReturnEmpty => "return-empty",
            OnError::LogAndReturnEmpty => "log-and-return-empty",
        })
    }
}

/// Value of a named session option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl OptionValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            OptionValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Items of a string-or-list option.
    pub fn as_list(&self) -> Option<Vec<String>> {
        match self {
            OptionValue::Str(s) => Some(vec![s.clone()]),
            OptionValue::List(items) => Some(items.clone()),
            _ => None,
        }
    }

    /// The option as a scalar cell, for rendering in `SET` statements.
    pub fn to_value(&self) -> Value {
        match self {
            OptionValue::Bool(b) => Value::Bool(*b),
            OptionValue::Int(i) => Value::Int(*i),
            OptionValue::Float(f) => Value::Float(*f),
            OptionValue::Str(s) => Value::Text(s.clone()),
            OptionValue::List(items) => Value::Text(items.join(",")),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Float(v) => write!(f, "{}", v),
            OptionValue::Str(s) => write!(f, "{}", s),
            OptionValue::List(items) => write!(f, "{}", items.join(",")),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Str(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Str(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        OptionValue::Int(v.into())
    }
}

impl From<usize> for OptionValue {
    fn from(v: usize) -> Self {
        OptionValue::Int(v as i64)
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Float(v)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(v: Vec<String>) -> Self {
        OptionValue::List(v)
    }
}

impl From<Vec<&str>> for OptionValue {
    fn from(v: Vec<&str>) -> Self {
        OptionValue::List(v.into_iter().map(String::from).collect())
    }
}

/// Immutable per-call configuration shared by every component.
pub struct SessionConfig {
    init_queries: Vec<String>,
    options: Vec<(String, OptionValue)>,
    verbose: bool,
    profile: bool,
    preprocessors: Vec<Preprocessor>,
    postprocessors: Vec<Postprocessor>,
    on_error: OnError,
    readonly: bool,
    batch_size: usize,
    force_manual_registration: bool,
}

impl SessionConfig {
    /// Create a builder with every field at its default.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Statements run once after the connection is configured.
    pub fn init_queries(&self) -> &[String] {
        &self.init_queries
    }

    /// Options in insertion order.
    pub fn options(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a single option.
    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn profile(&self) -> bool {
        self.profile
    }

    pub fn on_error(&self) -> OnError {
        self.on_error
    }

    pub fn readonly(&self) -> bool {
        self.readonly
    }

    /// Rows per insert batch on the manual registration path.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Skip the native registration path entirely.
    pub fn force_manual_registration(&self) -> bool {
        self.force_manual_registration
    }

    /// Apply every preprocessor to `sql` in declaration order.
    pub fn preprocess(&self, sql: &str) -> String {
        self.preprocessors
            .iter()
            .fold(sql.to_string(), |text, p| p(&text))
    }

    /// Apply every postprocessor to `table` in declaration order.
    pub fn postprocess(&self, table: Table) -> Table {
        self.postprocessors.iter().fold(table, |t, p| p(t))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            init_queries: Vec::new(),
            options: Vec::new(),
            verbose: false,
            profile: false,
            preprocessors: Vec::new(),
            postprocessors: Vec::new(),
            on_error: OnError::Fail,
            readonly: false,
            batch_size: DEFAULT_BATCH_SIZE,
            force_manual_registration: false,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("init_queries", &self.init_queries)
            .field("options", &self.options)
            .field("verbose", &self.verbose)
            .field("profile", &self.profile)
            .field("preprocessors", &self.preprocessors.len())
            .field("postprocessors", &self.postprocessors.len())
            .field("on_error", &self.on_error)
            .field("readonly", &self.readonly)
            .finish()
    }
}

/// Builder for [`SessionConfig`].
#[derive(Default)]
pub struct SessionConfigBuilder {
    init_queries: Vec<String>,
    options: Vec<(String, OptionValue)>,
    verbose: bool,
    profile: bool,
    preprocessors: Vec<Preprocessor>,
    postprocessors: Vec<Postprocessor>,
    on_error: Option<String>,
    readonly: bool,
}

impl SessionConfigBuilder {
    /// Append an initialisation statement.
    pub fn init_query(mut self, sql: impl Into<String>) -> Self {
        self.init_queries.push(sql.into());
        self
    }

    /// Append several initialisation statements.
    pub fn init_queries<I, S>(mut self, queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.init_queries.extend(queries.into_iter().map(Into::into));
        self
    }

    /// Set an option. Setting the same key again replaces its value in place.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.options.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.options.push((key, value)),
        }
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Error policy by name; validated in [`build`](Self::build).
    pub fn on_error(mut self, policy: impl Into<String>) -> Self {
        self.on_error = Some(policy.into());
        self
    }

    /// Error policy by value.
    pub fn on_error_policy(mut self, policy: OnError) -> Self {
        self.on_error = Some(policy.to_string());
        self
    }

    pub fn preprocessor<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.preprocessors.push(Box::new(f));
        self
    }

    pub fn postprocessor<F>(mut self, f: F) -> Self
    where
        F: Fn(Table) -> Table + Send + Sync + 'static,
    {
        self.postprocessors.push(Box::new(f));
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` for an unknown error policy or a
    /// recognised option with a value of the wrong shape.
    pub fn build(self) -> Result<SessionConfig> {
        let on_error = match &self.on_error {
            Some(policy) => policy.parse()?,
            None => OnError::Fail,
        };

        let mut batch_size = DEFAULT_BATCH_SIZE;
        let mut force_manual_registration = false;
        for (key, value) in &self.options {
            match key.as_str() {
                OPT_BATCH_SIZE => {
                    batch_size = value
                        .as_i64()
                        .filter(|n| *n > 0)
                        .map(|n| n as usize)
                        .ok_or_else(|| {
                            EngineError::config(format!(
                                "batch_size must be a positive integer, got '{}'",
                                value
                            ))
                        })?;
                }
                OPT_FORCE_MANUAL => {
                    force_manual_registration = value.as_bool().ok_or_else(|| {
                        EngineError::config(format!(
                            "force_manual_registration must be a boolean, got '{}'",
                            value
                        ))
                    })?;
                }
                OPT_THREADS => {
                    if value.as_i64().is_none() {
                        return Err(EngineError::config(format!(
                            "threads must be an integer, got '{}'",
                            value
                        )));
                    }
                }
                OPT_EXTENSIONS => {
                    if value.as_list().is_none() {
                        return Err(EngineError::config(format!(
                            "extensions must be a string or a list of strings, got '{}'",
                            value
                        )));
                    }
                }
                OPT_MEMORY_LIMIT => {
                    if !matches!(value, OptionValue::Str(_)) {
                        return Err(EngineError::config(format!(
                            "memory_limit must be a string such as '100MB', got '{}'",
                            value
                        )));
                    }
                }
                _ => {}
            }
        }

        Ok(SessionConfig {
            init_queries: self.init_queries,
            options: self.options,
            verbose: self.verbose,
            profile: self.profile,
            preprocessors: self.preprocessors,
            postprocessors: self.postprocessors,
            on_error,
            readonly: self.readonly,
            batch_size,
            force_manual_registration,
        })
    }
}
