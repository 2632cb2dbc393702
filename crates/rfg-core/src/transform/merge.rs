//! Resource-type and trait application.
//!
//! Every contributor to a resource or method is turned into a plain YAML
//! mapping ("layer") with its `<<parameters>>` substituted, then the layers
//! are folded highest-precedence first. A key already present is never
//! overwritten, except inside keyed sections (`queryParameters`, `headers`,
//! `responses`, `uriParameters`, media-typed `body`) where missing entries are
//! added one by one.

use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};
use indexmap::IndexMap;
use serde_yaml_ng::{Mapping, Value};

use super::name_normalizer::{pluralize, singularize};
use crate::error::{ParseError, ResolveError, TransformError};
use crate::parse::document::{Application, RamlDocument};
use crate::parse::reader::{METHOD_KEYS, scalar_string};

const KEYED_SECTIONS: [&str; 4] = ["queryParameters", "headers", "responses", "uriParameters"];

/// Expand a raw resource body into a mapping with its resource type, resource
/// type chain, and traits applied. Nested `/child` resources are not included.
pub fn expand_resource(
    raw: &Value,
    path: &str,
    doc: &RamlDocument,
) -> Result<Mapping, TransformError> {
    let own = as_mapping(raw, path)?;
    let mut base_params = IndexMap::new();
    base_params.insert("resourcePath".to_string(), path.to_string());
    base_params.insert("resourcePathName".to_string(), resource_path_name(path));

    let levels = resource_levels(own, path, &base_params, doc)?;

    let mut out = Mapping::new();
    for level in &levels {
        merge_layer(&mut out, level, |key| {
            !is_method_key(key) && !key.starts_with('/') && key != "type" && key != "is"
        });
    }

    for verb in declared_verbs(&levels) {
        let mut method_params = base_params.clone();
        method_params.insert("methodName".to_string(), verb.to_string());
        let context = format!("{} {path}", verb.to_ascii_uppercase());

        let mut layers: Vec<Mapping> = Vec::new();
        for (depth, level) in levels.iter().enumerate() {
            let optional = format!("{verb}?");
            let method = level.get(verb).or_else(|| level.get(optional.as_str()));
            if let Some(method) = method {
                let method = if depth == 0 {
                    method.clone()
                } else {
                    substitute(method, &method_params, &context)?
                };
                let method = as_mapping(&method, &context)?;
                let traits = parse_applications(method.get("is"), &context)?;
                layers.push(method);
                for app in &traits {
                    layers.push(trait_layer(app, &method_params, &context, doc)?);
                }
            }
            for app in parse_applications(level.get("is"), &context)? {
                layers.push(trait_layer(&app, &method_params, &context, doc)?);
            }
        }

        let mut merged = Mapping::new();
        for layer in &layers {
            merge_layer(&mut merged, layer, |key| key != "is");
        }
        out.insert(Value::String(verb.to_string()), Value::Mapping(merged));
    }

    Ok(out)
}

/// The resource itself followed by each resource type in its `type` chain.
fn resource_levels(
    own: Mapping,
    path: &str,
    base_params: &IndexMap<String, String>,
    doc: &RamlDocument,
) -> Result<Vec<Mapping>, TransformError> {
    let mut next = single_application(own.get("type"), path)?;
    let mut levels = vec![own];
    let mut chain: Vec<String> = Vec::new();

    while let Some(app) = next {
        if chain.contains(&app.name) {
            chain.push(app.name);
            return Err(ResolveError::CircularResourceType(chain.join(" -> ")).into());
        }
        let declared = doc.resource_types.get(&app.name).ok_or_else(|| {
            ResolveError::UnknownResourceType {
                name: app.name.clone(),
                context: path.to_string(),
            }
        })?;
        let mut params = base_params.clone();
        params.extend(app.params.clone());
        let location = format!("resourceTypes.{}", app.name);
        let level = as_mapping(&substitute(declared, &params, &location)?, &location)?;
        next = single_application(level.get("type"), &location)?;
        chain.push(app.name);
        levels.push(level);
    }

    Ok(levels)
}

/// Verbs that end up on the resource: any non-optional method key on any level.
fn declared_verbs(levels: &[Mapping]) -> Vec<&'static str> {
    let mut verbs = Vec::new();
    for level in levels {
        for key in level.keys().filter_map(Value::as_str) {
            if let Some(verb) = METHOD_KEYS.iter().find(|v| **v == key) {
                if !verbs.contains(verb) {
                    verbs.push(*verb);
                }
            }
        }
    }
    verbs
}

fn trait_layer(
    app: &Application,
    base_params: &IndexMap<String, String>,
    context: &str,
    doc: &RamlDocument,
) -> Result<Mapping, TransformError> {
    let declared = doc.traits.get(&app.name).ok_or_else(|| ResolveError::UnknownTrait {
        name: app.name.clone(),
        context: context.to_string(),
    })?;
    let mut params = base_params.clone();
    params.extend(app.params.clone());
    let location = format!("traits.{}", app.name);
    Ok(as_mapping(&substitute(declared, &params, &location)?, &location)?)
}

/// Fold `layer` into `acc`; keys already in `acc` win.
pub fn merge_layer(acc: &mut Mapping, layer: &Mapping, include: impl Fn(&str) -> bool) {
    for (key, value) in layer {
        let Some(name) = key.as_str() else {
            continue;
        };
        if !include(name) {
            continue;
        }
        match acc.get_mut(key) {
            None => {
                acc.insert(key.clone(), value.clone());
            }
            Some(existing) => {
                let keyed = KEYED_SECTIONS.contains(&name)
                    || (name == "body" && is_media_keyed(existing) && is_media_keyed(value));
                if keyed {
                    merge_entries(existing, value);
                }
            }
        }
    }
}

fn merge_entries(existing: &mut Value, inherited: &Value) {
    let (Value::Mapping(existing), Value::Mapping(inherited)) = (existing, inherited) else {
        return;
    };
    for (key, value) in inherited {
        let name = entry_name(key);
        let present = existing.keys().any(|k| entry_name(k) == name);
        if !present {
            existing.insert(key.clone(), value.clone());
        }
    }
}

/// `page?` and `page`, `200` and `"200"` name the same entry.
fn entry_name(key: &Value) -> Option<String> {
    scalar_string(key).map(|s| s.trim_end_matches('?').to_string())
}

fn is_media_keyed(value: &Value) -> bool {
    value.as_mapping().is_some_and(|m| {
        !m.is_empty()
            && m.keys()
                .all(|k| k.as_str().is_some_and(|s| s.contains('/')))
    })
}

fn is_method_key(key: &str) -> bool {
    let verb = key.trim_end_matches('?');
    METHOD_KEYS.contains(&verb)
}

/// `resourcePathName`: the rightmost path segment without URI parameters.
pub fn resource_path_name(path: &str) -> String {
    path.split('/')
        .rev()
        .find(|s| !s.is_empty() && !s.contains('{'))
        .unwrap_or_default()
        .to_string()
}

/// Parse an `is` or `type` value into its applications.
pub fn parse_applications(value: Option<&Value>, location: &str) -> Result<Vec<Application>, ParseError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let entries: Vec<&Value> = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(items) => items.iter().collect(),
        other => vec![other],
    };

    let mut apps = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::String(name) => apps.push(Application {
                name: name.clone(),
                params: IndexMap::new(),
            }),
            Value::Mapping(map) => {
                for (name, params) in map {
                    let Some(name) = name.as_str() else {
                        return Err(ParseError::structure(location, "application names must be strings"));
                    };
                    apps.push(Application {
                        name: name.to_string(),
                        params: read_params(params, location)?,
                    });
                }
            }
            _ => return Err(ParseError::structure(location, "invalid trait or resource type application")),
        }
    }
    Ok(apps)
}

fn single_application(value: Option<&Value>, location: &str) -> Result<Option<Application>, ParseError> {
    let mut apps = parse_applications(value, location)?;
    match apps.len() {
        0 => Ok(None),
        1 => Ok(apps.pop()),
        _ => Err(ParseError::structure(location, "a resource can apply only one resource type")),
    }
}

fn read_params(value: &Value, location: &str) -> Result<IndexMap<String, String>, ParseError> {
    let mut params = IndexMap::new();
    match value {
        Value::Null => {}
        Value::Mapping(map) => {
            for (key, value) in map {
                match (scalar_string(key), scalar_string(value)) {
                    (Some(key), Some(value)) => {
                        params.insert(key, value);
                    }
                    _ => return Err(ParseError::structure(location, "parameter values must be scalars")),
                }
            }
        }
        _ => return Err(ParseError::structure(location, "parameters must be a mapping")),
    }
    Ok(params)
}

/// Replace `<<name>>` and `<<name | !fn>>` in every string and key of `value`.
///
/// `<<methodName>>` is left in place when not supplied, so resource types can be
/// substituted once per resource and again per method.
pub fn substitute(
    value: &Value,
    params: &IndexMap<String, String>,
    location: &str,
) -> Result<Value, ParseError> {
    match value {
        Value::String(s) => {
            let replaced = substitute_str(s, params, location)?;
            Ok(coerce(s, replaced))
        }
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (key, child) in map {
                let key = match key {
                    Value::String(s) => Value::String(substitute_str(s, params, location)?),
                    other => other.clone(),
                };
                out.insert(key, substitute(child, params, location)?);
            }
            Ok(Value::Mapping(out))
        }
        Value::Sequence(items) => items
            .iter()
            .map(|item| substitute(item, params, location))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        other => Ok(other.clone()),
    }
}

fn substitute_str(
    input: &str,
    params: &IndexMap<String, String>,
    location: &str,
) -> Result<String, ParseError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("<<") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find(">>") else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let token = &rest[start..start + 2 + end + 2];
        let mut parts = after[..end].split('|').map(str::trim);
        let name = parts.next().unwrap_or_default();

        match params.get(name) {
            Some(value) => {
                let mut value = value.clone();
                for function in parts {
                    value = apply_function(function, &value).ok_or_else(|| {
                        ParseError::structure(location, format!("unknown transform `{function}`"))
                    })?;
                }
                out.push_str(&value);
            }
            None if name == "methodName" => out.push_str(token),
            None => {
                return Err(ParseError::structure(
                    location,
                    format!("no value for parameter <<{name}>>"),
                ));
            }
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// A scalar that was exactly one parameter keeps the YAML type of its value.
fn coerce(original: &str, replaced: String) -> Value {
    let trimmed = original.trim();
    let single = trimmed.starts_with("<<") && trimmed.ends_with(">>") && trimmed.matches("<<").count() == 1;
    if single && replaced != trimmed {
        match replaced.as_str() {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {
                if let Ok(n) = replaced.parse::<i64>() {
                    return Value::Number(n.into());
                }
            }
        }
    }
    Value::String(replaced)
}

fn apply_function(function: &str, value: &str) -> Option<String> {
    let transformed = match function.trim_start_matches('!') {
        "singularize" => singularize(value),
        "pluralize" => pluralize(value),
        "uppercase" => value.to_uppercase(),
        "lowercase" => value.to_lowercase(),
        "lowercamelcase" => value.to_lower_camel_case(),
        "uppercamelcase" => value.to_pascal_case(),
        "lowerunderscorecase" => value.to_snake_case(),
        "upperunderscorecase" => value.to_shouty_snake_case(),
        "lowerhyphencase" => value.to_kebab_case(),
        "upperhyphencase" => value.to_kebab_case().to_uppercase(),
        _ => return None,
    };
    Some(transformed)
}

fn as_mapping(value: &Value, location: &str) -> Result<Mapping, ParseError> {
    match value {
        Value::Mapping(map) => Ok(map.clone()),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ParseError::structure(location, "expected a mapping")),
    }
}
