//! Front-to-back consumption of a named object's children.

use crate::error::{Error, Result};
use crate::value::Value;

/// Cursor over the decoded children of one named object.
///
/// Tracks how many children were consumed so arity errors can report it.
#[derive(Debug)]
pub(crate) struct Children<'n> {
    structure: &'n str,
    items: std::vec::IntoIter<Value>,
    consumed: usize,
}

impl<'n> Children<'n> {
    pub(crate) fn new(structure: &'n str, items: Vec<Value>) -> Self {
        Self {
            structure,
            items: items.into_iter(),
            consumed: 0,
        }
    }

    pub(crate) fn structure(&self) -> &'n str {
        self.structure
    }

    pub(crate) fn remaining(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// Takes the first unconsumed child
    pub(crate) fn next(&mut self) -> Result<Value> {
        let value = self
            .items
            .next()
            .ok_or_else(|| Error::missing_value(self.structure, self.consumed))?;
        self.consumed += 1;
        Ok(value)
    }

    pub(crate) fn next_integer(&mut self) -> Result<i64> {
        let value = self.next()?;
        value
            .as_integer()
            .ok_or_else(|| Error::unexpected_value(self.structure, "integer", value.kind()))
    }

    /// Takes a non-negative count prefix
    pub(crate) fn next_count(&mut self) -> Result<usize> {
        let count = self.next_integer()?;
        usize::try_from(count).map_err(|_| Error::InvalidCount {
            structure: self.structure.to_string(),
            count,
        })
    }

    pub(crate) fn next_string(&mut self) -> Result<String> {
        match self.next()? {
            Value::String(s) => Ok(s),
            other => Err(Error::unexpected_value(
                self.structure,
                "string",
                other.kind(),
            )),
        }
    }

    /// Takes a nested `{name: value}` object and returns its value
    pub(crate) fn next_unwrapped(&mut self, name: &'static str) -> Result<Value> {
        match self.next()? {
            Value::Map(map) => match map.into_single() {
                Ok((key, value)) if key == name => Ok(value),
                _ => Err(Error::unexpected_value(self.structure, name, "map")),
            },
            other => Err(Error::unexpected_value(self.structure, name, other.kind())),
        }
    }

    /// Fails if any child was left unconsumed
    pub(crate) fn finish(self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(Error::excess_values(self.structure, count)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Map;

    #[test]
    fn test_consumes_in_order() {
        let mut children = Children::new("t", vec![Value::I32(1), Value::from("a")]);
        assert_eq!(children.next_integer().unwrap(), 1);
        assert_eq!(children.next_string().unwrap(), "a");
        assert!(!children.has_remaining());
        children.finish().unwrap();
    }

    #[test]
    fn test_missing_value_reports_consumed() {
        let mut children = Children::new("t", vec![Value::I32(1)]);
        children.next().unwrap();
        match children.next().unwrap_err() {
            Error::MissingValue { structure, consumed } => {
                assert_eq!(structure, "t");
                assert_eq!(consumed, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_excess_values() {
        let children = Children::new("t", vec![Value::I32(1), Value::I32(2)]);
        assert!(matches!(
            children.finish(),
            Err(Error::ExcessValues { count: 2, .. })
        ));
    }

    #[test]
    fn test_negative_count() {
        let mut children = Children::new("t", vec![Value::I32(-1)]);
        assert!(matches!(
            children.next_count(),
            Err(Error::InvalidCount { count: -1, .. })
        ));
    }

    #[test]
    fn test_next_unwrapped() {
        let mut children = Children::new(
            "t",
            vec![
                Value::Map(Map::single("inner", 7)),
                Value::Map(Map::single("other", 7)),
            ],
        );
        assert_eq!(children.next_unwrapped("inner").unwrap(), Value::I32(7));
        assert!(matches!(
            children.next_unwrapped("inner"),
            Err(Error::UnexpectedValue {
                expected: "inner",
                ..
            })
        ));
    }
}
