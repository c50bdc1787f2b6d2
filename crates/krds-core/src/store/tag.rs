//! Value type tags.
//!
//! Every value in a reader data store is introduced by a single signed tag
//! byte:
//!
//! | tag | payload |
//! |-----|---------|
//! | 0   | boolean byte (0 or 1) |
//! | 1   | 4-byte signed integer |
//! | 2   | 8-byte signed integer |
//! | 3   | boolean "empty" flag, then (if false) 2-byte length + UTF-8 |
//! | 4   | 8-byte float |
//! | 5   | 2-byte signed integer |
//! | 6   | 4-byte float |
//! | 7   | signed byte |
//! | 9   | single character |
//! | -2  | named object: name string, tagged children, then tag -1 |
//!
//! Tag 8 is unassigned.

/// Value type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum Tag {
    /// Boolean byte
    Bool = 0,
    /// 4-byte signed integer
    Int = 1,
    /// 8-byte signed integer
    Long = 2,
    /// Length-prefixed UTF-8 string
    Utf = 3,
    /// 8-byte float
    Double = 4,
    /// 2-byte signed integer
    Short = 5,
    /// 4-byte float
    Float = 6,
    /// Signed byte
    Byte = 7,
    /// Single character
    Char = 9,
    /// Start of a named object
    ObjectBegin = -2,
    /// End of the current named object
    ObjectEnd = -1,
}

impl Tag {
    /// Maps a raw tag byte to a known tag
    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            0 => Some(Tag::Bool),
            1 => Some(Tag::Int),
            2 => Some(Tag::Long),
            3 => Some(Tag::Utf),
            4 => Some(Tag::Double),
            5 => Some(Tag::Short),
            6 => Some(Tag::Float),
            7 => Some(Tag::Byte),
            9 => Some(Tag::Char),
            -2 => Some(Tag::ObjectBegin),
            -1 => Some(Tag::ObjectEnd),
            _ => None,
        }
    }
}
