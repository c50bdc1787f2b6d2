//! Error types for the krds-core library.
//!
//! This module provides comprehensive error handling using the `thiserror` crate.
//! Every variant is fatal: a decode aborts on the first error it meets. The two
//! recoverable conditions (unknown structures and trailing bytes) are reported
//! as [`Diagnostic`](crate::store::Diagnostic) values instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for krds operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all krds operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The leading 8 bytes are not the reader data store signature
    #[error("reader data store signature is incorrect: found {found:02x?}")]
    BadSignature {
        /// The bytes found where the signature was expected
        found: Vec<u8>,
    },

    /// The format-version value following the signature is not `1`
    #[error("unsupported reader data store version: {found}")]
    UnsupportedVersion {
        /// Rendering of the value that was found
        found: String,
    },

    /// The buffer ended before a read could complete
    #[error("insufficient data at offset {offset}: need {need} bytes, have {have}")]
    TruncatedInput {
        /// Byte offset of the failed read
        offset: usize,
        /// Bytes required by the read
        need: usize,
        /// Bytes left in the buffer
        have: usize,
    },

    /// A type tag outside the known set
    #[error("unknown datatype {tag} at offset {offset}")]
    UnknownTag {
        /// Byte offset of the tag
        offset: usize,
        /// The tag value
        tag: i8,
    },

    /// A boolean byte other than 0 or 1
    #[error("unknown boolean value {value} at offset {offset}")]
    InvalidBoolean {
        /// Byte offset of the boolean payload
        offset: usize,
        /// The offending byte
        value: u8,
    },

    /// String or char payload is not valid UTF-8
    #[error("invalid UTF-8 at offset {offset}: {source}")]
    InvalidUtf8 {
        /// Byte offset of the payload
        offset: usize,
        /// Underlying decode error
        #[source]
        source: std::str::Utf8Error,
    },

    /// Object nesting exceeded the configured limit
    #[error("object nesting deeper than {limit} levels at offset {offset}")]
    NestingTooDeep {
        /// Byte offset of the object that crossed the limit
        offset: usize,
        /// Configured maximum depth
        limit: usize,
    },

    /// `lpr` record with a version discriminator above 2
    #[error("unknown lpr version {0}")]
    UnknownLprVersion(i64),

    /// Annotation cache entry with an unmapped annotation type code
    #[error("unknown annotation type {0}")]
    UnknownAnnotationType(i64),

    /// Annotation list entry that is not a single-key wrapper of the expected class
    #[error("unknown annotation format for {class}: {details}")]
    MalformedAnnotation {
        /// Expected annotation class name
        class: String,
        /// Description of what was found
        details: String,
    },

    /// A structure rule left children unconsumed
    #[error("excess values found for structure {structure}: {count} unconsumed")]
    ExcessValues {
        /// Structure name
        structure: String,
        /// Number of children left over
        count: usize,
    },

    /// A structure rule needed more children than were present
    #[error("missing value for structure {structure} after {consumed} values")]
    MissingValue {
        /// Structure name
        structure: String,
        /// Number of children consumed before running out
        consumed: usize,
    },

    /// A child had a different kind than the rule requires
    #[error("structure {structure} expected {expected}, found {found}")]
    UnexpectedValue {
        /// Structure name
        structure: String,
        /// What the rule needed
        expected: &'static str,
        /// Kind of value that was present
        found: &'static str,
    },

    /// A count prefix was negative
    #[error("structure {structure} has invalid count {count}")]
    InvalidCount {
        /// Structure name
        structure: String,
        /// The count value
        count: i64,
    },

    /// An epoch-millis value outside the representable date range
    #[error("timestamp {millis} ms is out of range")]
    TimestampOutOfRange {
        /// Raw epoch milliseconds
        millis: i64,
    },

    /// Two top-level entries share a name
    #[error("reader data store has duplicate item {0}")]
    DuplicateKey(String),

    /// Trailing bytes after the last entry while strict trailing checks are on
    #[error("reader data store has {count} bytes of extra data")]
    TrailingBytes {
        /// Number of unconsumed bytes
        count: usize,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new truncated input error
    pub fn truncated(offset: usize, need: usize, have: usize) -> Self {
        Self::TruncatedInput { offset, need, have }
    }

    /// Creates a new excess values error
    pub fn excess_values(structure: impl Into<String>, count: usize) -> Self {
        Self::ExcessValues {
            structure: structure.into(),
            count,
        }
    }

    /// Creates a new missing value error
    pub fn missing_value(structure: impl Into<String>, consumed: usize) -> Self {
        Self::MissingValue {
            structure: structure.into(),
            consumed,
        }
    }

    /// Creates a new unexpected value error
    pub fn unexpected_value(
        structure: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::UnexpectedValue {
            structure: structure.into(),
            expected,
            found,
        }
    }

    /// Creates a new malformed annotation error
    pub fn malformed_annotation(class: impl Into<String>, details: impl Into<String>) -> Self {
        Self::MalformedAnnotation {
            class: class.into(),
            details: details.into(),
        }
    }

    /// Returns the byte offset for errors raised while reading the buffer
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::TruncatedInput { offset, .. }
            | Self::UnknownTag { offset, .. }
            | Self::InvalidBoolean { offset, .. }
            | Self::InvalidUtf8 { offset, .. }
            | Self::NestingTooDeep { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Returns true if the error comes from a structure layout mismatch
    /// rather than from the byte-level encoding
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::ExcessValues { .. }
                | Self::MissingValue { .. }
                | Self::UnexpectedValue { .. }
                | Self::InvalidCount { .. }
                | Self::UnknownLprVersion(_)
                | Self::UnknownAnnotationType(_)
                | Self::MalformedAnnotation { .. }
        )
    }
}
