//! Tagged value decoding.

use super::cursor::ByteCursor;
use super::tag::Tag;
use super::Diagnostic;
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::value::Value;
use tracing::trace;

/// Recursive-descent decoder for tagged values.
///
/// Named objects are decoded child by child and handed to the [`Schema`] as
/// soon as their end tag is seen.
pub(crate) struct Decoder<'a, 's> {
    cursor: ByteCursor<'a>,
    schema: Schema<'s>,
    max_depth: usize,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, 's> Decoder<'a, 's> {
    pub(crate) fn new(data: &'a [u8], schema: Schema<'s>, max_depth: usize) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            schema,
            max_depth,
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn cursor(&mut self) -> &mut ByteCursor<'a> {
        &mut self.cursor
    }

    pub(crate) fn position(&self) -> usize {
        self.cursor.position()
    }

    pub(crate) fn remaining_len(&self) -> usize {
        self.cursor.remaining_len()
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Reads a tag byte and decodes the value it introduces
    pub(crate) fn decode_next(&mut self) -> Result<Value> {
        let offset = self.cursor.position();
        let raw = self.cursor.read_i8()?;
        let tag = Tag::from_i8(raw).ok_or(Error::UnknownTag { offset, tag: raw })?;
        self.decode_tagged(tag, offset)
    }

    /// Decodes the payload of an already-read tag at `offset`
    pub(crate) fn decode_tagged(&mut self, tag: Tag, offset: usize) -> Result<Value> {
        let value = match tag {
            Tag::Bool => Value::Bool(self.read_bool()?),
            Tag::Int => Value::I32(self.cursor.read_i32()?),
            Tag::Long => Value::I64(self.cursor.read_i64()?),
            Tag::Utf => Value::String(self.read_utf()?),
            Tag::Double => Value::F64(self.cursor.read_f64()?),
            Tag::Short => Value::I16(self.cursor.read_i16()?),
            Tag::Float => Value::F32(self.cursor.read_f32()?),
            Tag::Byte => Value::I8(self.cursor.read_i8()?),
            Tag::Char => Value::Char(self.read_char()?),
            Tag::ObjectBegin => self.decode_object(offset)?,
            Tag::ObjectEnd => {
                return Err(Error::UnknownTag {
                    offset,
                    tag: Tag::ObjectEnd as i8,
                })
            }
        };
        Ok(value)
    }

    fn read_bool(&mut self) -> Result<bool> {
        let offset = self.cursor.position();
        match self.cursor.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(Error::InvalidBoolean { offset, value }),
        }
    }

    /// Empty flag, then (when not empty) a 2-byte length and UTF-8 bytes
    fn read_utf(&mut self) -> Result<String> {
        if self.read_bool()? {
            return Ok(String::new());
        }
        let len = usize::from(self.cursor.read_u16()?);
        let offset = self.cursor.position();
        let bytes = self.cursor.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|source| Error::InvalidUtf8 { offset, source })
    }

    fn read_char(&mut self) -> Result<char> {
        let offset = self.cursor.position();
        let byte = self.cursor.take(1)?;
        let text =
            std::str::from_utf8(byte).map_err(|source| Error::InvalidUtf8 { offset, source })?;
        // a valid single-byte sequence is exactly one ASCII char
        Ok(text.chars().next().unwrap_or_default())
    }

    fn decode_object(&mut self, offset: usize) -> Result<Value> {
        if self.depth >= self.max_depth {
            return Err(Error::NestingTooDeep {
                offset,
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = self.decode_object_body();
        self.depth -= 1;
        result
    }

    fn decode_object_body(&mut self) -> Result<Value> {
        let name = self.read_utf()?;
        let mut children = Vec::new();
        while self.cursor.peek_i8()? != Tag::ObjectEnd as i8 {
            children.push(self.decode_next()?);
        }
        self.cursor.read_i8()?;

        trace!(structure = %name, children = children.len(), depth = self.depth, "decoded object");
        self.schema.reconstruct(name, children, &mut self.diagnostics)
    }
}
