//! Duplicate-tolerant YAML loading.
//!
//! `serde_yaml_ng::Value` rejects repeated mapping keys outright. For resource
//! mappings a repeated key is meaningful (the same path or verb declared
//! twice), so the document is first read into [`Loose`], which keeps every
//! entry, and then converted. Repeats inside the resource tree are split out
//! as extra declarations so resource building can report them precisely.

use std::fmt;

use serde::de::{Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde_yaml_ng::value::{Tag, TaggedValue};
use serde_yaml_ng::{Mapping, Value};

use crate::error::ParseError;

/// A YAML node that keeps repeated mapping keys.
#[derive(Debug, Clone, PartialEq)]
pub enum Loose {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Seq(Vec<Loose>),
    Map(Vec<(Loose, Loose)>),
    Tagged(String, Box<Loose>),
}

impl<'de> Deserialize<'de> for Loose {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LooseVisitor)
    }
}

struct LooseVisitor;

impl<'de> Visitor<'de> for LooseVisitor {
    type Value = Loose;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Loose, E> {
        Ok(Loose::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Loose, E> {
        Ok(Loose::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Loose, E> {
        Ok(Loose::UInt(v))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Loose, E> {
        Ok(Loose::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Loose, E> {
        Ok(Loose::Str(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Loose, E> {
        Ok(Loose::Str(v))
    }

    fn visit_unit<E>(self) -> Result<Loose, E> {
        Ok(Loose::Null)
    }

    fn visit_none<E>(self) -> Result<Loose, E> {
        Ok(Loose::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Loose, D::Error> {
        Loose::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Loose, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Loose::Seq(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Loose, A::Error> {
        let mut entries = Vec::new();
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(Loose::Map(entries))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Loose, A::Error> {
        let (tag, variant): (String, _) = data.variant()?;
        let value: Loose = variant.newtype_variant()?;
        Ok(Loose::Tagged(tag, Box::new(value)))
    }
}

/// A resource declared again under a path that already has a declaration.
pub type Repeated = (String, Value);

/// Convert a document root, splitting repeated resource declarations out.
pub fn into_document(root: Loose) -> Result<(Value, Vec<Repeated>), ParseError> {
    let mut repeated = Vec::new();
    let value = match root {
        Loose::Map(entries) => Value::Mapping(convert_resource_level(entries, "", &mut repeated)?),
        other => convert(other, "$")?,
    };
    Ok((value, repeated))
}

/// Convert one mapping of the resource tree (the root or a resource body).
///
/// `/child` keys recurse with their full path; any key seen twice at this
/// level is moved to `repeated` under this level's path.
fn convert_resource_level(
    entries: Vec<(Loose, Loose)>,
    path: &str,
    repeated: &mut Vec<Repeated>,
) -> Result<Mapping, ParseError> {
    let mut out = Mapping::with_capacity(entries.len());
    let location = if path.is_empty() { "$" } else { path };

    for (key, value) in entries {
        let key = convert(key, location)?;
        let child_path = key
            .as_str()
            .filter(|k| k.starts_with('/'))
            .map(|k| format!("{path}{k}"));

        let value = match (&child_path, value) {
            (Some(child_path), Loose::Map(entries)) => {
                Value::Mapping(convert_resource_level(entries, child_path, repeated)?)
            }
            (_, value) => convert(value, location)?,
        };

        if out.contains_key(&key) {
            match (&child_path, path.is_empty()) {
                (Some(child_path), _) => repeated.push((child_path.clone(), value)),
                (None, false) => {
                    let mut single = Mapping::new();
                    single.insert(key, value);
                    repeated.push((path.to_string(), Value::Mapping(single)));
                }
                (None, true) => return Err(duplicate(&key, location)),
            }
        } else {
            out.insert(key, value);
        }
    }
    Ok(out)
}

fn convert(node: Loose, location: &str) -> Result<Value, ParseError> {
    Ok(match node {
        Loose::Null => Value::Null,
        Loose::Bool(b) => Value::Bool(b),
        Loose::Int(n) => Value::Number(n.into()),
        Loose::UInt(n) => Value::Number(n.into()),
        Loose::Float(n) => Value::Number(n.into()),
        Loose::Str(s) => Value::String(s),
        Loose::Seq(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| convert(item, location))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Loose::Map(entries) => {
            let mut out = Mapping::with_capacity(entries.len());
            for (key, value) in entries {
                let key = convert(key, location)?;
                if out.contains_key(&key) {
                    return Err(duplicate(&key, location));
                }
                let value = convert(value, location)?;
                out.insert(key, value);
            }
            Value::Mapping(out)
        }
        Loose::Tagged(tag, value) => {
            let value = convert(*value, location)?;
            let tag = tag.trim_start_matches('!');
            if tag.is_empty() {
                value
            } else {
                Value::Tagged(Box::new(TaggedValue {
                    tag: Tag::new(tag),
                    value,
                }))
            }
        }
    })
}

fn duplicate(key: &Value, location: &str) -> ParseError {
    let name = match key {
        Value::String(s) => s.clone(),
        other => format!("{other:?}"),
    };
    ParseError::structure(location, format!("duplicate key `{name}`"))
}
