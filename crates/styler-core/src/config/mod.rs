//! Configuration for the mutation engine
//!
//! The engine performs no I/O, so configuration arrives as text that the
//! caller already read:
//!
//! - JSON via [`ConfigLoader::from_json_str`]
//! - TOML via [`ConfigLoader::from_toml_str`]
//!
//! Every field has a default, so a partial document only overrides what it
//! names. A JSON Schema for editor support comes from
//! [`ConfigLoader::json_schema`].
//!
//! ## Example Configuration
//!
//! ```json
//! {
//!   "maxRecursionDepth": 1000,
//!   "maxModifications": 10000,
//!   "batch": { "maxRecursionDepth": 2000, "maxModifications": 50000 },
//!   "block": { "maxNodes": 100000, "maxMemoryBytes": 52428800 }
//! }
//! ```

pub mod limits;
pub mod loader;

pub use limits::{BatchLimits, BlockLimits, MutationConfiguration};
pub use loader::ConfigLoader;
