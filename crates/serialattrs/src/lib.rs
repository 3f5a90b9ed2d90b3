//! # Serialattrs Architecture
//!
//! Serialattrs stores a set of typed, named attributes inside one opaque text
//! blob per record, and hands them to callers as ordinary typed fields with
//! defaults, lazy decoding and per-field change tracking.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host records (record.rs, store/)                           │
//! │  - RecordType: named set of attribute groups                │
//! │  - Record: blobs + one container per group, save/reload     │
//! │  - RecordStore trait, MemStore for tests                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Lazy container (container.rs)                              │
//! │  - Decodes once on first access                             │
//! │  - Defaults on read, never stored                           │
//! │  - Change-set of pre-write values                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Schema (schema.rs)                                         │
//! │  - Declared fields of one group                             │
//! │  - Decode: drop undeclared keys, parse, materialize defaults│
//! │  - Encode: type-encode, hand to the formatter               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Types and formatters (types/, registry.rs, format.rs)      │
//! │  - Attribute types: parse/encode per field                  │
//! │  - Registry: type names and value-kind inference            │
//! │  - Formatter: map <-> blob text (JSON by default)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use serialattrs::{FieldOptions, MemStore, RecordType, Schema, SchemaDefaults, Value};
//! use serialattrs::registry::default_registry;
//!
//! let data = Schema::builder("data", default_registry(), &SchemaDefaults::default())
//!     .integer(&["score"], FieldOptions::new().with_default(0))?
//!     .datetime(&["ran_at"], FieldOptions::new())?
//!     .build();
//! let runs = RecordType::builder("Run").group(data).build();
//!
//! let store = MemStore::new();
//! let mut run = runs.new_record();
//! assert_eq!(run.read("data", "score")?, Value::Integer(0));
//!
//! run.write("data", "score", "5")?;
//! assert!(run.is_changed("data", "score")?);
//! run.save(&store)?;
//! assert_eq!(run.raw_blob("data")?, Some(r#"{"score":5}"#));
//!
//! run.reload(&store)?;
//! assert_eq!(run.read("data", "score")?, Value::Integer(5));
//! assert!(!run.is_changed("data", "score")?);
//! # Ok::<(), serialattrs::AttrError>(())
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events (blob decode/encode at `debug`, writes at
//! `trace`) and never installs a subscriber.
//!
//! ## Module Overview
//!
//! - [`value`]: the closed runtime value model
//! - [`types`]: attribute types and per-field options
//! - [`registry`]: type-name and inference registry
//! - [`format`]: blob formatters
//! - [`schema`]: group schemas and the decode/encode pipeline
//! - [`container`]: lazily decoded, change-tracking attribute maps
//! - [`record`]: host record types and instances
//! - [`store`]: record persistence
//! - [`config`]: schema defaults
//! - [`error`]: error types

pub mod config;
pub mod container;
pub mod error;
pub mod format;
pub mod record;
pub mod registry;
pub mod schema;
pub mod store;
pub mod types;
pub mod value;

pub use config::SchemaDefaults;
pub use error::{AttrError, Result};
pub use format::{Formatter, JsonFormatter};
pub use record::{Record, RecordType};
pub use registry::TypeRegistry;
pub use schema::Schema;
pub use store::{MemStore, RecordStore};
pub use types::{AttributeType, FieldOptions};
pub use value::{Map, Value};
