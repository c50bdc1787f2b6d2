//! Byte-stream builder for tests.

use crate::store::{FORMAT_VERSION, SIGNATURE};

/// Builds tagged reader data store bytes
#[derive(Debug, Default)]
pub(crate) struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Signature, format version and top-level entry count
    pub(crate) fn header(count: i32) -> Self {
        let mut encoder = Self::new();
        encoder.buf.extend_from_slice(&SIGNATURE);
        encoder.int(FORMAT_VERSION).int(count)
    }

    pub(crate) fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub(crate) fn bool(mut self, v: bool) -> Self {
        self.buf.extend_from_slice(&[0, u8::from(v)]);
        self
    }

    pub(crate) fn int(mut self, v: i32) -> Self {
        self.buf.push(1);
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub(crate) fn long(mut self, v: i64) -> Self {
        self.buf.push(2);
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub(crate) fn utf(mut self, v: &str) -> Self {
        self.buf.push(3);
        self.push_utf_payload(v);
        self
    }

    pub(crate) fn empty_utf(mut self) -> Self {
        self.buf.extend_from_slice(&[3, 1]);
        self
    }

    pub(crate) fn double(mut self, v: f64) -> Self {
        self.buf.push(4);
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub(crate) fn short(mut self, v: i16) -> Self {
        self.buf.push(5);
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub(crate) fn float(mut self, v: f32) -> Self {
        self.buf.push(6);
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub(crate) fn byte(mut self, v: i8) -> Self {
        self.buf.extend_from_slice(&[7, v as u8]);
        self
    }

    pub(crate) fn char(mut self, v: u8) -> Self {
        self.buf.extend_from_slice(&[9, v]);
        self
    }

    pub(crate) fn begin(mut self, name: &str) -> Self {
        self.buf.push(0xFE);
        self.push_utf_payload(name);
        self
    }

    pub(crate) fn end(mut self) -> Self {
        self.buf.push(0xFF);
        self
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn push_utf_payload(&mut self, v: &str) {
        let len = u16::try_from(v.len()).expect("test string fits in u16 length");
        self.buf.push(0);
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(v.as_bytes());
    }
}
