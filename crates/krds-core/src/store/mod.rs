//! Reader data store decoding.
//!
//! This module drives a full decode of one store file:
//!
//! 1. Check the 8-byte signature
//! 2. Read the format version (must be `1`)
//! 3. Read the top-level entry count `N`
//! 4. Decode `N` named objects and merge them into one ordered mapping,
//!    rejecting repeated names
//! 5. Report trailing bytes after the last entry
//!
//! Failures abort the whole decode. The byte offset and the partially
//! merged mapping are logged before the error is returned.
//!
//! ## Extensibility
//!
//! [`ReaderDataStore`] is generic over the [`PositionDecoder`] used for
//! reading positions:
//!
//! ```no_run
//! use krds_core::{DecoderConfig, ReaderDataStore, TimeZoneMode};
//!
//! let data = std::fs::read("book.yjr")?;
//! let store = ReaderDataStore::with_config(DecoderConfig::new().time_zone(TimeZoneMode::Utc));
//! let decoded = store.decode(&data)?;
//! for (name, _) in decoded.entries().iter() {
//!     println!("{name}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cursor;
mod decoder;
mod tag;

use crate::error::{Error, Result};
use crate::schema::{OpaquePositions, PositionDecoder, Schema, TimeZoneMode};
use crate::value::{Map, Value};
use decoder::Decoder;
use std::fmt;
use tracing::{debug, error, warn};

pub use cursor::ByteCursor;
pub use tag::Tag;

/// File signature at offset 0
pub const SIGNATURE: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x1A, 0xB1, 0x26];

/// The only supported format version
pub const FORMAT_VERSION: i32 = 1;

/// Default limit on named-object nesting
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Name used in errors about the top-level entry list
const TOP_LEVEL: &str = "<top-level>";

/// Configuration for decoding
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum named-object nesting depth
    pub max_depth: usize,
    /// Zone used to render timestamps
    pub time_zone: TimeZoneMode,
    /// Treat bytes after the last entry as a fatal error
    pub strict_trailing: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            time_zone: TimeZoneMode::Local,
            strict_trailing: false,
        }
    }
}

impl DecoderConfig {
    /// Creates a new decoder config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the timestamp time zone
    pub fn time_zone(mut self, zone: TimeZoneMode) -> Self {
        self.time_zone = zone;
        self
    }

    /// Sets whether trailing bytes are fatal
    pub fn strict_trailing(mut self, strict: bool) -> Self {
        self.strict_trailing = strict;
        self
    }
}

/// Non-fatal conditions met while decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A structure name with no known layout; its raw children were kept
    UnknownStructure {
        /// Structure name
        name: String,
    },
    /// Bytes left after the last top-level entry
    TrailingBytes {
        /// Number of extra bytes
        count: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownStructure { name } => write!(f, "unknown data structure {name}"),
            Diagnostic::TrailingBytes { count } => {
                write!(f, "reader data store has {count} bytes of extra data")
            }
        }
    }
}

/// Result of a successful decode
#[derive(Debug, Clone)]
pub struct DecodedStore {
    entries: Map,
    diagnostics: Vec<Diagnostic>,
}

impl DecodedStore {
    /// Top-level entries keyed by structure name, in file order
    pub fn entries(&self) -> &Map {
        &self.entries
    }

    /// Consumes the result, returning the top-level entries
    pub fn into_entries(self) -> Map {
        self.entries
    }

    /// Looks up one top-level entry
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Non-fatal diagnostics, in the order they were met
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Decoder for reader data store files
#[derive(Debug, Clone, Default)]
pub struct ReaderDataStore<P = OpaquePositions> {
    config: DecoderConfig,
    positions: P,
}

impl ReaderDataStore {
    /// Creates a decoder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder with custom configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            positions: OpaquePositions,
        }
    }
}

impl<P: PositionDecoder> ReaderDataStore<P> {
    /// Replaces the position decoder
    pub fn with_position_decoder<Q: PositionDecoder>(self, positions: Q) -> ReaderDataStore<Q> {
        ReaderDataStore {
            config: self.config,
            positions,
        }
    }

    /// Decodes a complete store
    pub fn decode(&self, data: &[u8]) -> Result<DecodedStore> {
        let schema = Schema::new(&self.positions, self.config.time_zone);
        let mut decoder = Decoder::new(data, schema, self.config.max_depth);

        let signature = decoder.cursor().take(SIGNATURE.len())?;
        if signature != SIGNATURE {
            return Err(Error::BadSignature {
                found: signature.to_vec(),
            });
        }

        let version = decoder.decode_next()?;
        if version != Value::I32(FORMAT_VERSION) {
            return Err(Error::UnsupportedVersion {
                found: format!("{version:?}"),
            });
        }

        let mut entries = Map::new();
        if let Err(err) = decode_entries(&mut decoder, &mut entries) {
            error!(
                offset = decoder.position(),
                partial = ?entries,
                "reader data store decode failed: {err}"
            );
            return Err(err);
        }

        let extra = decoder.remaining_len();
        let mut diagnostics = decoder.into_diagnostics();
        if extra > 0 {
            if self.config.strict_trailing {
                return Err(Error::TrailingBytes { count: extra });
            }
            warn!(extra_bytes = extra, "reader data store has extra data");
            diagnostics.push(Diagnostic::TrailingBytes { count: extra });
        }

        Ok(DecodedStore {
            entries,
            diagnostics,
        })
    }
}

/// Reads the entry count and merges each top-level object into `entries`
fn decode_entries(decoder: &mut Decoder<'_, '_>, entries: &mut Map) -> Result<()> {
    let count = decoder.decode_next()?;
    let count = count
        .as_integer()
        .ok_or_else(|| Error::unexpected_value(TOP_LEVEL, "entry count", count.kind()))?;
    let count = usize::try_from(count).map_err(|_| Error::InvalidCount {
        structure: TOP_LEVEL.to_string(),
        count,
    })?;
    debug!(count, "decoding top-level entries");

    for _ in 0..count {
        let value = match decoder.decode_next()? {
            Value::Map(map) => map,
            other => return Err(Error::unexpected_value(TOP_LEVEL, "named object", other.kind())),
        };
        for (name, value) in value {
            if entries.contains_key(&name) {
                return Err(Error::DuplicateKey(name));
            }
            debug!(structure = %name, offset = decoder.position(), "decoded entry");
            entries.insert(name, value);
        }
    }
    Ok(())
}

/// Decode a store held in memory with the default configuration
pub fn decode(data: &[u8]) -> Result<DecodedStore> {
    ReaderDataStore::new().decode(data)
}

/// Read and decode a store file
///
/// This is a convenience function that reads the file and decodes it.
pub fn decode_file(path: impl AsRef<std::path::Path>) -> Result<DecodedStore> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    ReaderDataStore::new().decode(&data)
}

/// Read and decode a store file with custom configuration
pub fn decode_file_with_config(
    path: impl AsRef<std::path::Path>,
    config: DecoderConfig,
) -> Result<DecodedStore> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    ReaderDataStore::with_config(config).decode(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Encoder;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn utc() -> ReaderDataStore {
        ReaderDataStore::with_config(DecoderConfig::new().time_zone(TimeZoneMode::Utc))
    }

    fn json(store: &DecodedStore) -> String {
        serde_json::to_string(store.entries()).unwrap()
    }

    #[test]
    fn test_config_builder() {
        let config = DecoderConfig::new()
            .max_depth(4)
            .time_zone(TimeZoneMode::Utc)
            .strict_trailing(true);
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.time_zone, TimeZoneMode::Utc);
        assert!(config.strict_trailing);
    }

    #[test]
    fn test_single_entry() {
        let bytes = Encoder::header(1)
            .begin("clock.data.store")
            .int(42)
            .end()
            .into_bytes();
        let store = utc().decode(&bytes).unwrap();
        assert_eq!(json(&store), r#"{"clock.data.store":42}"#);
        assert!(store.diagnostics().is_empty());
    }

    #[test]
    fn test_entries_keep_file_order() {
        let bytes = Encoder::header(3)
            .begin("sync_lpr")
            .bool(true)
            .end()
            .begin("erl")
            .utf("AbQFAAAAAAAA:0")
            .end()
            .begin("lpr")
            .byte(2)
            .utf("pos")
            .long(-1)
            .end()
            .into_bytes();
        let store = utc().decode(&bytes).unwrap();
        assert_eq!(
            json(&store),
            r#"{"sync_lpr":true,"erl":"AbQFAAAAAAAA:0","lpr":{"position":"pos","time":null}}"#
        );
    }

    #[test]
    fn test_zero_entries() {
        let bytes = Encoder::header(0).into_bytes();
        let store = utc().decode(&bytes).unwrap();
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_bad_signature() {
        let mut bytes = Encoder::header(0).into_bytes();
        bytes[7] = 0x27;
        assert!(matches!(
            utc().decode(&bytes),
            Err(Error::BadSignature { .. })
        ));
    }

    #[test]
    fn test_short_input() {
        let err = utc().decode(&SIGNATURE[..5]).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedInput { .. } | Error::BadSignature { .. }
        ));
        assert!(utc().decode(&[]).is_err());
    }

    #[test]
    fn test_unsupported_version() {
        let bytes = Encoder::new().raw(&SIGNATURE).int(2).int(0).into_bytes();
        assert!(matches!(
            utc().decode(&bytes),
            Err(Error::UnsupportedVersion { .. })
        ));

        let bytes = Encoder::new().raw(&SIGNATURE).long(1).int(0).into_bytes();
        assert!(matches!(
            utc().decode(&bytes),
            Err(Error::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_duplicate_top_level_name() {
        let bytes = Encoder::header(2)
            .begin("lpu")
            .int(1)
            .end()
            .begin("lpu")
            .int(2)
            .end()
            .into_bytes();
        match utc().decode(&bytes) {
            Err(Error::DuplicateKey(name)) => assert_eq!(name, "lpu"),
            other => panic!("expected duplicate key, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_font_prefs() {
        let mut encoder = Encoder::header(2);
        for typeface in ["Bookerly", "Caecilia"] {
            encoder = encoder.begin("font.prefs").utf(typeface);
            for i in 0..8 {
                encoder = encoder.int(i);
            }
            encoder = encoder.end();
        }
        assert!(matches!(
            utc().decode(&encoder.into_bytes()),
            Err(Error::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_tolerated() {
        let bytes = Encoder::header(1)
            .begin("lpu")
            .int(1)
            .end()
            .raw(&[0x00, 0x00, 0x00])
            .into_bytes();
        let store = utc().decode(&bytes).unwrap();
        assert_eq!(store.get("lpu"), Some(&Value::I32(1)));
        assert_eq!(
            store.diagnostics(),
            &[Diagnostic::TrailingBytes { count: 3 }]
        );
    }

    #[test]
    fn test_trailing_bytes_strict() {
        let bytes = Encoder::header(0).raw(&[0x01]).into_bytes();
        let store =
            ReaderDataStore::with_config(DecoderConfig::new().strict_trailing(true));
        assert!(matches!(
            store.decode(&bytes),
            Err(Error::TrailingBytes { count: 1 })
        ));
    }

    #[test]
    fn test_unknown_structure_is_not_fatal() {
        let bytes = Encoder::header(2)
            .begin("brand.new.store")
            .int(7)
            .utf("seven")
            .end()
            .begin("lpu")
            .int(1)
            .end()
            .into_bytes();
        let store = utc().decode(&bytes).unwrap();
        assert_eq!(
            store.get("brand.new.store"),
            Some(&Value::List(vec![Value::I32(7), Value::from("seven")]))
        );
        assert_eq!(
            store.diagnostics(),
            &[Diagnostic::UnknownStructure {
                name: "brand.new.store".into()
            }]
        );
    }

    #[test]
    fn test_failure_mid_stream_propagates() {
        let bytes = Encoder::header(2)
            .begin("lpu")
            .int(1)
            .end()
            .begin("lpu")
            .int(1)
            .int(2)
            .end()
            .into_bytes();
        assert!(matches!(
            utc().decode(&bytes),
            Err(Error::ExcessValues { .. })
        ));
    }

    #[test]
    fn test_count_exceeds_entries() {
        let bytes = Encoder::header(2).begin("lpu").int(1).end().into_bytes();
        assert!(matches!(
            utc().decode(&bytes),
            Err(Error::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_top_level_scalar_rejected() {
        let bytes = Encoder::header(1).int(5).into_bytes();
        assert!(matches!(
            utc().decode(&bytes),
            Err(Error::UnexpectedValue { .. })
        ));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let bytes = Encoder::header(1)
            .begin("purchase.state.data")
            .utf("PURCHASED")
            .long(1_609_459_200_000)
            .end()
            .into_bytes();
        let first = json(&utc().decode(&bytes).unwrap());
        let second = json(&utc().decode(&bytes).unwrap());
        assert_eq!(first, second);
        assert_eq!(
            first,
            r#"{"purchase.state.data":{"state":"PURCHASED","time":"2021-01-01T00:00:00"}}"#
        );
    }

    #[test]
    fn test_annotations_end_to_end() {
        let bytes = Encoder::header(1)
            .begin("annotation.cache.object")
            .int(1)
            .int(0)
            .begin("saved.avl.interval.tree")
            .int(1)
            .begin("annotation.personal.bookmark")
            .utf("start")
            .utf("end")
            .long(1_609_459_200_000)
            .long(1_609_459_200_000)
            .empty_utf()
            .end()
            .end()
            .end()
            .into_bytes();
        let store = utc().decode(&bytes).unwrap();
        assert_eq!(
            json(&store),
            concat!(
                r#"{"annotation.cache.object":{"annotation.personal.bookmark":[{"#,
                r#""startPosition":"start","endPosition":"end","#,
                r#""creationTime":"2021-01-01T00:00:00","lastModificationTime":"2021-01-01T00:00:00","#,
                r#""template":""}]}}"#
            )
        );
    }

    #[test]
    fn test_decode_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("book.yjr");
        let bytes = Encoder::header(1)
            .begin("purchase.state.data")
            .utf("PURCHASED")
            .long(1_609_459_200_000)
            .end()
            .into_bytes();
        fs::write(&path, bytes).unwrap();

        let store = decode_file(&path).unwrap();
        assert!(store.get("purchase.state.data").is_some());

        let config = DecoderConfig::new().time_zone(TimeZoneMode::Utc);
        let store = decode_file_with_config(&path, config).unwrap();
        assert_eq!(
            json(&store),
            r#"{"purchase.state.data":{"state":"PURCHASED","time":"2021-01-01T00:00:00"}}"#
        );
    }

    #[test]
    fn test_decode_file_with_config_applies_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("book.yjf");
        fs::write(&path, Encoder::header(0).raw(&[0x00]).into_bytes()).unwrap();

        assert!(decode_file(&path).is_ok());
        let config = DecoderConfig::new().strict_trailing(true);
        assert!(matches!(
            decode_file_with_config(&path, config),
            Err(Error::TrailingBytes { count: 1 })
        ));
    }

    #[test]
    fn test_decode_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.yjr");

        match decode_file(&path) {
            Err(Error::FileRead { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected file read error, got {other:?}"),
        }
        assert!(matches!(
            decode_file_with_config(&path, DecoderConfig::new()),
            Err(Error::FileRead { .. })
        ));
    }

    #[test]
    fn test_custom_position_decoder() {
        struct Prefixed;
        impl PositionDecoder for Prefixed {
            fn decode_position(&self, raw: Value) -> Result<Value> {
                Ok(match raw {
                    Value::String(s) => Value::String(format!("pos:{s}")),
                    other => other,
                })
            }
        }

        let bytes = Encoder::header(1).begin("erl").utf("12").end().into_bytes();
        let store = utc().with_position_decoder(Prefixed).decode(&bytes).unwrap();
        assert_eq!(store.get("erl"), Some(&Value::from("pos:12")));
    }
}
