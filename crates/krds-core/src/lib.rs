//! # krds-core
//!
//! A library for decoding e-reader "reader data store" files (`.yjr`, `.yjf`,
//! `.azw3r`, `.azw3f`, `.mbp1`, `.mbs`) into an ordered, JSON-serializable
//! value tree.
//!
//! These files persist per-book reading state: bookmarks, highlights, notes,
//! the last-read position, reading timer statistics and font preferences.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`store`]: Byte cursor, tagged value decoding and the top-level driver
//! - [`schema`]: Per-structure layouts that turn named objects into maps,
//!   lists and scalars
//! - [`value`]: The decoded value model
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use krds_core::ReaderDataStore;
//! use std::fs;
//!
//! let data = fs::read("./My Book.sdr/My Book.yjr")?;
//!
//! let decoded = ReaderDataStore::new().decode(&data)?;
//! if let Some(lpr) = decoded.get("lpr") {
//!     println!("last read: {lpr:?}");
//! }
//! for diagnostic in decoded.diagnostics() {
//!     eprintln!("warning: {diagnostic}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`PositionDecoder`]: Customize how reading positions are interpreted
//! - [`DecoderConfig`]: Nesting limit, timestamp zone, trailing-byte policy

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod schema;
pub mod store;
pub mod value;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use schema::{OpaquePositions, PositionDecoder, TimeZoneMode};
pub use store::{
    decode, decode_file, decode_file_with_config, DecodedStore, DecoderConfig, Diagnostic,
    ReaderDataStore,
};
pub use value::{Map, Value};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extensions used for reader data store files
pub const FILE_EXTENSIONS: &[&str] = &["azw3f", "azw3r", "mbp1", "mbs", "yjf", "yjr"];
