//! Reading-position decoding hook.
//!
//! Every rule that reads a reading position (`erl`, `lpr`, `fpr`,
//! annotation start/end, page history) routes the raw value through a
//! [`PositionDecoder`]. Positions are opaque today, so the default
//! implementation returns them unchanged.
//!
//! # Example
//!
//! ```
//! use krds_core::{PositionDecoder, Result, Value};
//!
//! struct Uppercase;
//!
//! impl PositionDecoder for Uppercase {
//!     fn decode_position(&self, raw: Value) -> Result<Value> {
//!         Ok(match raw {
//!             Value::String(s) => Value::String(s.to_uppercase()),
//!             other => other,
//!         })
//!     }
//! }
//! ```

use crate::error::Result;
use crate::value::Value;

/// Trait for interpreting raw reading-position values
pub trait PositionDecoder: Send + Sync {
    /// Decode one raw position value
    fn decode_position(&self, raw: Value) -> Result<Value>;
}

/// Passes positions through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaquePositions;

impl PositionDecoder for OpaquePositions {
    fn decode_position(&self, raw: Value) -> Result<Value> {
        Ok(raw)
    }
}
