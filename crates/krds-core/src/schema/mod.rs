//! Named-structure reconstruction.
//!
//! A named object arrives as a structure name plus the flat, fully decoded
//! sequence of its children. [`Schema::reconstruct`] looks the name up in the
//! rule table (see `rules.rs`), consumes the children front to back according
//! to that rule, and returns `{name: decoded}`.
//!
//! ## Arity
//!
//! Every known rule must consume its children exactly: a rule that runs out
//! fails with [`Error::MissingValue`], and leftovers fail with
//! [`Error::ExcessValues`]. Unknown names are not an error: the raw children
//! are passed through as a list and a [`Diagnostic::UnknownStructure`] is
//! recorded.
//!
//! ## Extensibility
//!
//! Reading positions are routed through a [`PositionDecoder`] so a future
//! position encoding can be interpreted without touching the rule table.

mod children;
mod position;
mod rules;
mod time;

use crate::error::{Error, Result};
use crate::store::Diagnostic;
use crate::value::{Map, Value};
use children::Children;
use rules::{Element, FieldKind, Layout, Rule, INTERVAL_TREE};
use tracing::{trace, warn};

pub use position::{OpaquePositions, PositionDecoder};
pub use time::{epoch_millis_or_null, format_epoch_millis, TimeZoneMode, NO_TIMESTAMP};

/// Turns named objects into decoded structures
pub struct Schema<'p> {
    positions: &'p dyn PositionDecoder,
    time_zone: TimeZoneMode,
}

impl<'p> Schema<'p> {
    /// Creates a schema using the given position decoder and time zone
    pub fn new(positions: &'p dyn PositionDecoder, time_zone: TimeZoneMode) -> Self {
        Self {
            positions,
            time_zone,
        }
    }

    /// Reconstructs one named object into `{name: decoded}`.
    ///
    /// Unknown names push a diagnostic onto `diagnostics` and keep the raw
    /// children.
    pub fn reconstruct(
        &self,
        name: String,
        children: Vec<Value>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Value> {
        let Some(rule) = rules::rule_for(&name) else {
            warn!(structure = %name, "unknown data structure");
            diagnostics.push(Diagnostic::UnknownStructure { name: name.clone() });
            return Ok(Map::single(name, Value::List(children)).into());
        };

        trace!(structure = %name, children = children.len(), ?rule, "reconstructing");
        let mut children = Children::new(&name, children);
        let decoded = self.apply(rule, &mut children)?;
        children.finish()?;

        Ok(Map::single(name, decoded).into())
    }

    fn apply(&self, rule: Rule, children: &mut Children<'_>) -> Result<Value> {
        match rule {
            Rule::Single => children.next(),
            Rule::Position => self.position(children.next()?),
            Rule::KeyValues => {
                let count = children.next_count()?;
                let mut map = Map::new();
                for _ in 0..count {
                    let key = children.next_string()?;
                    map.insert(key, children.next()?);
                }
                Ok(map.into())
            }
            Rule::LastReadPosition => self.last_read_position(children),
            Rule::AnnotationCache => self.annotation_cache(children),
            Rule::List(element) => self.list(element, children),
            Rule::Record(layout) => self.record(layout, children),
        }
    }

    fn position(&self, raw: Value) -> Result<Value> {
        self.positions.decode_position(raw)
    }

    fn time(&self, children: &mut Children<'_>) -> Result<Value> {
        let millis = children.next_integer()?;
        format_epoch_millis(millis, self.time_zone).map(Value::String)
    }

    fn optional_time(&self, children: &mut Children<'_>) -> Result<Value> {
        let millis = children.next_integer()?;
        epoch_millis_or_null(millis, self.time_zone)
    }

    fn list(&self, element: Element, children: &mut Children<'_>) -> Result<Value> {
        let count = children.next_count()?;
        let mut items = Vec::with_capacity(count.min(children.remaining()));
        for _ in 0..count {
            items.push(match element {
                Element::Value => children.next()?,
                Element::Unwrap(name) => children.next_unwrapped(name)?,
            });
        }
        Ok(Value::List(items))
    }

    fn record(&self, layout: &Layout, children: &mut Children<'_>) -> Result<Value> {
        let mut map = Map::new();
        for field in layout.required {
            map.insert(field.key, self.field(field.kind, children)?);
        }
        for field in layout.optional {
            if !children.has_remaining() {
                break;
            }
            map.insert(field.key, self.field(field.kind, children)?);
        }
        Ok(map.into())
    }

    fn field(&self, kind: FieldKind, children: &mut Children<'_>) -> Result<Value> {
        match kind {
            FieldKind::Value => children.next(),
            FieldKind::Position => self.position(children.next()?),
            FieldKind::Time => self.time(children),
            FieldKind::OptionalTime => self.optional_time(children),
            FieldKind::OptionalInt => {
                let value = children.next()?;
                Ok(if value.as_integer() == Some(-1) {
                    Value::Null
                } else {
                    value
                })
            }
            FieldKind::Unwrap(name) => children.next_unwrapped(name),
            FieldKind::List(element) => self.list(element, children),
        }
    }

    /// `lpr` starts either with the position string itself (legacy layout) or
    /// with a version number; versions up to 2 carry position and time.
    fn last_read_position(&self, children: &mut Children<'_>) -> Result<Value> {
        let mut map = Map::new();
        let first = children.next()?;
        if let Value::String(_) | Value::Char(_) = first {
            map.insert("position", self.position(first)?);
            return Ok(map.into());
        }

        let version = first.as_integer().ok_or_else(|| {
            Error::unexpected_value(children.structure(), "lpr version", first.kind())
        })?;
        if version > 2 {
            return Err(Error::UnknownLprVersion(version));
        }
        map.insert("position", self.position(children.next()?)?);
        map.insert("time", self.optional_time(children)?);
        Ok(map.into())
    }

    /// Groups annotations by class: each entry is a type code followed by a
    /// `saved.avl.interval.tree` whose elements are `{class: payload}`.
    fn annotation_cache(&self, children: &mut Children<'_>) -> Result<Value> {
        let count = children.next_count()?;
        let mut out = Map::new();
        for _ in 0..count {
            let code = children.next_integer()?;
            let class = rules::annotation_class(code).ok_or(Error::UnknownAnnotationType(code))?;

            let entries = interval_tree_entries(class, children.next()?)?;
            let mut annotations = Vec::with_capacity(entries.len());
            for entry in entries {
                annotations.push(unwrap_annotation(class, entry)?);
            }
            out.insert(class, Value::List(annotations));
        }
        Ok(out.into())
    }
}

fn interval_tree_entries(class: &str, tree: Value) -> Result<Vec<Value>> {
    let found = tree.kind();
    if let Value::Map(map) = tree {
        if let Ok((name, Value::List(entries))) = map.into_single() {
            if name == INTERVAL_TREE {
                return Ok(entries);
            }
            return Err(Error::malformed_annotation(
                class,
                format!("expected {INTERVAL_TREE}, found {name}"),
            ));
        }
    }
    Err(Error::malformed_annotation(
        class,
        format!("expected {INTERVAL_TREE}, found {found}"),
    ))
}

fn unwrap_annotation(class: &str, entry: Value) -> Result<Value> {
    match entry {
        Value::Map(map) => match map.into_single() {
            Ok((name, payload)) if name == class => Ok(payload),
            Ok((name, _)) => Err(Error::malformed_annotation(
                class,
                format!("found {name}"),
            )),
            Err(map) => Err(Error::malformed_annotation(
                class,
                format!("expected one entry, found {}", map.len()),
            )),
        },
        other => Err(Error::malformed_annotation(
            class,
            format!("expected map, found {}", other.kind()),
        )),
    }
}
