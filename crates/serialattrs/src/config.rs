//! # Configuration
//!
//! Group-level defaults are an explicit [`SchemaDefaults`] value passed to
//! [`Schema::builder`](crate::schema::Schema::builder). Options given on the
//! builder always win over these defaults.
//!
//! ## Loading
//!
//! [`SchemaDefaults::load`] resolves, in priority order:
//! 1. **Environment variables**: `SERIALATTRS_SKIP_ENCODING`, etc.
//! 2. **Config file**: an optional TOML file.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `skip_encoding` | `false` | Pass values to the formatter without type coercion |
//! | `symbolize_keys` | `false` | Normalize nested map keys on decode |
//! | `formatter` | `json` | Blob formatter |
//! | `parse_json_times` | `false` | Decode ISO 8601 strings in JSON blobs as datetimes |
//!
//! ## Process-wide defaults
//!
//! Applications that want one shared value call [`init_defaults`] once at
//! startup, before building any schema from [`defaults`]. Until then
//! [`defaults`] returns the compiled defaults.

use std::path::Path;
use std::sync::Arc;

use confique::Config;
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AttrError, Result};
use crate::format::{Formatter, JsonFormatter};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    #[default]
    Json,
}

/// Defaults applied to every schema built with them.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefaults {
    /// Pass attribute maps to the formatter without type coercion.
    #[config(default = false, env = "SERIALATTRS_SKIP_ENCODING")]
    #[serde(default)]
    pub skip_encoding: bool,

    /// Normalize map keys of nested values when decoding.
    #[config(default = false, env = "SERIALATTRS_SYMBOLIZE_KEYS")]
    #[serde(default)]
    pub symbolize_keys: bool,

    /// Formatter used by schemas that do not set one.
    #[config(default = "json", env = "SERIALATTRS_FORMATTER")]
    #[serde(default)]
    pub formatter: FormatterKind,

    /// Decode timestamp-shaped JSON strings as datetimes.
    #[config(default = false, env = "SERIALATTRS_PARSE_JSON_TIMES")]
    #[serde(default)]
    pub parse_json_times: bool,
}

impl Default for SchemaDefaults {
    fn default() -> Self {
        Self {
            skip_encoding: false,
            symbolize_keys: false,
            formatter: FormatterKind::Json,
            parse_json_times: false,
        }
    }
}

impl SchemaDefaults {
    /// Load from the environment layered over an optional TOML file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = path {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    /// Build the configured formatter.
    pub fn formatter(&self) -> Arc<dyn Formatter> {
        match self.formatter {
            FormatterKind::Json if self.parse_json_times => {
                Arc::new(JsonFormatter::with_time_parsing())
            }
            FormatterKind::Json => Arc::new(JsonFormatter::new()),
        }
    }
}

static COMPILED_DEFAULTS: Lazy<SchemaDefaults> = Lazy::new(SchemaDefaults::default);
static PROCESS_DEFAULTS: OnceCell<SchemaDefaults> = OnceCell::new();

/// Set the process-wide defaults. Only the first call succeeds.
pub fn init_defaults(defaults: SchemaDefaults) -> Result<()> {
    PROCESS_DEFAULTS.set(defaults).map_err(|_| {
        warn!("process-wide schema defaults were already initialized");
        AttrError::Config("schema defaults already initialized".to_string())
    })
}

/// The process-wide defaults, or the compiled ones if never initialized.
pub fn defaults() -> &'static SchemaDefaults {
    PROCESS_DEFAULTS.get().unwrap_or(&COMPILED_DEFAULTS)
}
