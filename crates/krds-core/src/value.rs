//! Decoded value model.
//!
//! Primitive decoding produces the scalar variants; structure reconstruction
//! produces [`Value::List`], [`Value::Map`] and [`Value::Null`]. Maps keep
//! insertion order, which is the on-disk encounter order and the output
//! field order.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A decoded value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (sentinel-mapped timestamps and offsets)
    Null,
    /// Boolean (tag 0)
    Bool(bool),
    /// 4-byte signed integer (tag 1)
    I32(i32),
    /// 8-byte signed integer (tag 2)
    I64(i64),
    /// UTF-8 string (tag 3)
    String(String),
    /// 8-byte float (tag 4)
    F64(f64),
    /// 2-byte signed integer (tag 5)
    I16(i16),
    /// 4-byte float (tag 6)
    F32(f32),
    /// Signed byte (tag 7)
    I8(i8),
    /// Single character (tag 9)
    Char(char),
    /// Ordered sequence
    List(Vec<Value>),
    /// Ordered string-keyed mapping
    Map(Map),
}

impl Value {
    /// Short name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I32(_) => "int",
            Value::I64(_) => "long",
            Value::String(_) => "string",
            Value::F64(_) => "double",
            Value::I16(_) => "short",
            Value::F32(_) => "float",
            Value::I8(_) => "byte",
            Value::Char(_) => "char",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Returns the value as `i64` for any of the integer variants
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the map payload
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the list payload
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Map(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

/// Insertion-ordered mapping from string keys to values.
///
/// Keys are unique: inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map holding a single entry
    pub fn single(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            entries: vec![(key.into(), value.into())],
        }
    }

    /// Inserts a key, returning the previous value if the key was present
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Looks up a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns true if the key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Removes and returns the only entry, or gives the map back if it does
    /// not hold exactly one
    pub fn into_single(mut self) -> std::result::Result<(String, Value), Map> {
        if self.entries.len() == 1 {
            if let Some(entry) = self.entries.pop() {
                return Ok(entry);
            }
        }
        Err(self)
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::I16(v) => serializer.serialize_i16(*v),
            Value::F32(v) => serializer.serialize_f64(f64::from(*v)),
            Value::I8(v) => serializer.serialize_i8(*v),
            Value::Char(v) => serializer.serialize_char(*v),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_map_preserves_insertion_order() {
        let mut map = Map::new();
        map.insert("zeta", 1);
        map.insert("alpha", 2);
        map.insert("mid", 3);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

        let json = serde_json::to_string(&Value::Map(map)).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":2,"mid":3}"#);
    }

    #[test]
    fn test_map_insert_replaces_in_place() {
        let mut map = Map::new();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.insert("a", 9), Some(Value::I32(1)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&Value::I32(9)));
    }

    #[test]
    fn test_into_single() {
        let (k, v) = Map::single("lpr", 5).into_single().unwrap();
        assert_eq!(k, "lpr");
        assert_eq!(v, Value::I32(5));

        let mut two = Map::single("a", 1);
        two.insert("b", 2);
        assert!(two.into_single().is_err());
        assert!(Map::new().into_single().is_err());
    }

    #[test]
    fn test_serialize_scalars() {
        let value = Value::List(vec![
            Value::Null,
            Value::Bool(true),
            Value::I16(-2),
            Value::I8(-1),
            Value::Char('x'),
            Value::F64(1.5),
            Value::from("text"),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"[null,true,-2,-1,"x",1.5,"text"]"#);
    }

    #[test]
    fn test_float_widens_to_double() {
        let value = Value::List(vec![Value::F32(0.1), Value::F32(0.5)]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "[0.10000000149011612,0.5]");
    }

    #[test]
    fn test_as_integer() {
        assert_eq!(Value::I8(-3).as_integer(), Some(-3));
        assert_eq!(Value::I64(1 << 40).as_integer(), Some(1 << 40));
        assert_eq!(Value::F64(1.0).as_integer(), None);
        assert_eq!(Value::from("1").as_integer(), None);
    }
}
