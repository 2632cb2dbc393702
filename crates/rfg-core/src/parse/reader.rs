use indexmap::IndexMap;
use serde_yaml_ng::{Mapping, Value};

use super::document::{BodyDecl, MethodDecl, RamlDocument, ResourceDecl, ResponseDecl};
use super::security::{SecuredBy, SecuritySchemeDecl};
use super::type_expr::{TypeExpr, parse_type_expr};
use super::types::{PropertyDecl, TypeBase, TypeDecl, TypeDeclBody};
use crate::error::ParseError;

/// HTTP verbs recognised as method keys on a resource.
pub const METHOD_KEYS: [&str; 7] = ["get", "post", "put", "delete", "patch", "head", "options"];

/// Build a [`RamlDocument`] from an include-resolved YAML tree.
pub fn read_document(root: &Value, raml_version: Option<String>) -> Result<RamlDocument, ParseError> {
    let empty = Mapping::new();
    let map = match root {
        Value::Mapping(map) => map,
        Value::Null => &empty,
        _ => return Err(ParseError::structure("$", "document root must be a mapping")),
    };

    let mut types = IndexMap::new();
    for key in ["types", "schemas"] {
        if let Some(value) = map.get(key) {
            for (name, decl) in named_entries(value, key)? {
                let decl = read_type_decl(&decl, &format!("{key}.{name}"))?;
                types.insert(name, decl);
            }
        }
    }

    let mut traits = IndexMap::new();
    if let Some(value) = map.get("traits") {
        traits.extend(named_entries(value, "traits")?);
    }
    let mut resource_types = IndexMap::new();
    if let Some(value) = map.get("resourceTypes") {
        resource_types.extend(named_entries(value, "resourceTypes")?);
    }

    let mut security_schemes = IndexMap::new();
    if let Some(value) = map.get("securitySchemes") {
        for (name, decl) in named_entries(value, "securitySchemes")? {
            let location = format!("securitySchemes.{name}");
            let scheme: SecuritySchemeDecl = serde_yaml_ng::from_value(decl)
                .map_err(|e| ParseError::structure(&location, e.to_string()))?;
            security_schemes.insert(name, scheme);
        }
    }

    let mut resources = IndexMap::new();
    for (key, value) in map {
        if let Some(path) = key.as_str().filter(|k| k.starts_with('/')) {
            if !matches!(value, Value::Mapping(_) | Value::Null) {
                return Err(ParseError::structure(path, "resource must be a mapping"));
            }
            resources.insert(path.to_string(), value.clone());
        }
    }

    let media_type = match map.get("mediaType") {
        Some(Value::Sequence(items)) => items.iter().find_map(scalar_string),
        Some(value) => scalar_string(value),
        None => None,
    };

    Ok(RamlDocument {
        raml_version,
        title: opt_string(map, "title", "$")?.unwrap_or_else(|| "API".to_string()),
        version: opt_string(map, "version", "$")?.unwrap_or_else(|| "1.0".to_string()),
        base_uri: opt_string(map, "baseUri", "$")?.unwrap_or_else(|| "/api".to_string()),
        description: opt_string(map, "description", "$")?,
        media_type: media_type.unwrap_or_else(|| "application/json".to_string()),
        protocols: string_list(map.get("protocols")),
        types,
        traits,
        resource_types,
        security_schemes,
        secured_by: read_secured_by(map.get("securedBy"), "securedBy")?.unwrap_or_default(),
        resources,
        repeated_resources: Vec::new(),
    })
}

/// Read a merged resource body (nested `/children`, `type`, and `is` are ignored here).
pub fn read_resource_decl(
    value: &Value,
    location: &str,
    default_media_type: &str,
) -> Result<ResourceDecl, ParseError> {
    let empty = Mapping::new();
    let map = as_mapping(value, location, &empty)?;

    let mut methods = IndexMap::new();
    for verb in METHOD_KEYS {
        if let Some(body) = map.get(verb) {
            let method_location = format!("{location}.{verb}");
            methods.insert(
                verb.to_string(),
                read_method_decl(body, &method_location, default_media_type)?,
            );
        }
    }

    Ok(ResourceDecl {
        display_name: opt_string(map, "displayName", location)?,
        description: opt_string(map, "description", location)?,
        uri_parameters: read_parameters(map.get("uriParameters"), &format!("{location}.uriParameters"))?,
        secured_by: read_secured_by(map.get("securedBy"), &format!("{location}.securedBy"))?,
        methods,
    })
}

/// Read a merged method body.
pub fn read_method_decl(
    value: &Value,
    location: &str,
    default_media_type: &str,
) -> Result<MethodDecl, ParseError> {
    let empty = Mapping::new();
    let map = as_mapping(value, location, &empty)?;

    let mut responses = IndexMap::new();
    if let Some(value) = map.get("responses") {
        let responses_location = format!("{location}.responses");
        let response_map = as_mapping(value, &responses_location, &empty)?;
        for (code, response) in response_map {
            let Some(code) = scalar_string(code) else {
                return Err(ParseError::structure(&responses_location, "status code must be a scalar"));
            };
            let response_location = format!("{responses_location}.{code}");
            responses.insert(code, read_response(response, &response_location, default_media_type)?);
        }
    }

    Ok(MethodDecl {
        display_name: opt_string(map, "displayName", location)?,
        description: opt_string(map, "description", location)?,
        query_parameters: read_parameters(map.get("queryParameters"), &format!("{location}.queryParameters"))?,
        headers: read_parameters(map.get("headers"), &format!("{location}.headers"))?,
        body: read_body(map.get("body"), &format!("{location}.body"), default_media_type)?,
        responses,
        secured_by: read_secured_by(map.get("securedBy"), &format!("{location}.securedBy"))?,
    })
}

fn read_response(
    value: &Value,
    location: &str,
    default_media_type: &str,
) -> Result<ResponseDecl, ParseError> {
    let empty = Mapping::new();
    let map = as_mapping(value, location, &empty)?;
    Ok(ResponseDecl {
        description: opt_string(map, "description", location)?,
        body: read_body(map.get("body"), &format!("{location}.body"), default_media_type)?,
    })
}

fn read_body(
    value: Option<&Value>,
    location: &str,
    default_media_type: &str,
) -> Result<Option<BodyDecl>, ParseError> {
    let Some(value) = value else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }

    let mut body = IndexMap::new();
    let keyed_by_media = value
        .as_mapping()
        .is_some_and(|m| !m.is_empty() && m.keys().all(|k| k.as_str().is_some_and(|s| s.contains('/'))));

    if keyed_by_media {
        if let Some(map) = value.as_mapping() {
            for (media, decl) in map {
                let media = media.as_str().unwrap_or_default().to_string();
                let decl = if decl.is_null() {
                    TypeDecl::named("any")
                } else {
                    read_type_decl(decl, &format!("{location}.{media}"))?
                };
                body.insert(media, decl);
            }
        }
    } else {
        body.insert(default_media_type.to_string(), read_type_decl(value, location)?);
    }
    Ok(Some(body))
}

fn read_parameters(
    value: Option<&Value>,
    location: &str,
) -> Result<IndexMap<String, PropertyDecl>, ParseError> {
    match value {
        None | Some(Value::Null) => Ok(IndexMap::new()),
        Some(Value::Mapping(map)) => read_properties(map, location),
        Some(_) => Err(ParseError::structure(location, "expected a mapping of parameters")),
    }
}

/// Read a type declaration in shorthand or expanded form.
pub fn read_type_decl(value: &Value, location: &str) -> Result<TypeDecl, ParseError> {
    match value {
        Value::Null => Ok(TypeDecl::named("string")),
        Value::String(s) => read_type_string(s, location).map(TypeDecl::Expr),
        Value::Sequence(_) => {
            let base = read_base(value, location)?;
            Ok(TypeDecl::Full(Box::new(TypeDeclBody {
                base,
                ..TypeDeclBody::default()
            })))
        }
        Value::Mapping(map) => read_type_body(map, location).map(|b| TypeDecl::Full(Box::new(b))),
        _ => Err(ParseError::structure(location, "expected a type declaration")),
    }
}

fn read_type_string(s: &str, location: &str) -> Result<TypeExpr, ParseError> {
    let trimmed = s.trim();
    // Inline JSON/XML schema documents are opaque.
    if trimmed.starts_with('{') || trimmed.starts_with('<') {
        return Ok(TypeExpr::Name("any".to_string()));
    }
    parse_type_expr(trimmed).map_err(|message| ParseError::structure(location, message))
}

fn read_base(value: &Value, location: &str) -> Result<Option<TypeBase>, ParseError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(TypeBase::Expr(read_type_string(s, location)?))),
        Value::Sequence(items) => {
            let mut exprs = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => read_type_string(s, location),
                    _ => Err(ParseError::structure(location, "type list entries must be names")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            match exprs.len() {
                0 => Ok(None),
                1 => Ok(Some(TypeBase::Expr(exprs.remove(0)))),
                _ => Ok(Some(TypeBase::Multiple(exprs))),
            }
        }
        Value::Mapping(_) => Ok(Some(TypeBase::Inline(Box::new(read_type_decl(value, location)?)))),
        _ => Err(ParseError::structure(location, "invalid `type` facet")),
    }
}

fn read_type_body(map: &Mapping, location: &str) -> Result<TypeDeclBody, ParseError> {
    let mut body = TypeDeclBody::default();

    let base = map.get("type").or_else(|| map.get("schema"));
    if let Some(base) = base {
        body.base = read_base(base, &format!("{location}.type"))?;
    }
    body.description = opt_string(map, "description", location)?;
    body.format = opt_string(map, "format", location)?;

    if let Some(props) = map.get("properties") {
        let props_location = format!("{location}.properties");
        match props {
            Value::Mapping(props) => body.properties = read_properties(props, &props_location)?,
            Value::Null => {}
            _ => return Err(ParseError::structure(props_location, "properties must be a mapping")),
        }
    }

    match map.get("required") {
        Some(Value::Bool(required)) => body.required = Some(*required),
        Some(Value::Sequence(names)) => {
            let names: Vec<String> = names.iter().filter_map(scalar_string).collect();
            for (name, prop) in body.properties.iter_mut() {
                prop.required = names.contains(name);
            }
        }
        _ => {}
    }

    if let Some(items) = map.get("items") {
        body.items = Some(read_type_decl(items, &format!("{location}.items"))?);
    }
    if let Some(Value::Sequence(values)) = map.get("enum") {
        body.enum_values = values.iter().filter_map(scalar_string).collect();
    }
    if let Some(Value::Bool(additional)) = map.get("additionalProperties") {
        body.additional_properties = Some(*additional);
    }
    body.example = match (map.get("example"), map.get("examples")) {
        (Some(example), _) => Some(example.clone()),
        (None, Some(Value::Mapping(examples))) => examples.values().next().cloned(),
        _ => None,
    };

    Ok(body)
}

fn read_properties(map: &Mapping, location: &str) -> Result<IndexMap<String, PropertyDecl>, ParseError> {
    let mut properties = IndexMap::new();
    for (key, value) in map {
        let Some(raw) = scalar_string(key) else {
            return Err(ParseError::structure(location, "property names must be scalars"));
        };
        let (name, optional) = match raw.strip_suffix('?') {
            Some(stripped) => (stripped.to_string(), true),
            None => (raw.clone(), false),
        };
        let decl = read_type_decl(value, &format!("{location}.{name}"))?;
        let declared = match &decl {
            TypeDecl::Full(body) => body.required,
            TypeDecl::Expr(_) => None,
        };
        let required = !optional && declared.unwrap_or(true);
        properties.insert(name, PropertyDecl { decl, required });
    }
    Ok(properties)
}

/// Read a `securedBy` value. `None` when the key is absent.
pub fn read_secured_by(value: Option<&Value>, location: &str) -> Result<Option<Vec<SecuredBy>>, ParseError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let entries = match value {
        Value::Sequence(items) => items.iter().collect::<Vec<_>>(),
        other => vec![other],
    };
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::Null => out.push(SecuredBy::Anonymous),
            Value::String(name) => out.push(SecuredBy::Scheme(name.clone())),
            Value::Mapping(map) if map.len() == 1 => {
                if let Some(name) = map.keys().next().and_then(Value::as_str) {
                    out.push(SecuredBy::Scheme(name.to_string()));
                }
            }
            _ => return Err(ParseError::structure(location, "invalid securedBy entry")),
        }
    }
    Ok(Some(out))
}

/// Entries of a name-keyed section, accepting both the mapping form and the
/// RAML 0.8 list-of-single-key-mappings form.
pub fn named_entries(value: &Value, location: &str) -> Result<Vec<(String, Value)>, ParseError> {
    let mut out = Vec::new();
    let mut push_map = |map: &Mapping| -> Result<(), ParseError> {
        for (key, value) in map {
            let Some(name) = scalar_string(key) else {
                return Err(ParseError::structure(location, "names must be scalars"));
            };
            out.push((name, value.clone()));
        }
        Ok(())
    };
    match value {
        Value::Null => {}
        Value::Mapping(map) => push_map(map)?,
        Value::Sequence(items) => {
            for item in items {
                match item {
                    Value::Mapping(map) => push_map(map)?,
                    _ => return Err(ParseError::structure(location, "expected a list of mappings")),
                }
            }
        }
        _ => return Err(ParseError::structure(location, "expected a mapping")),
    }
    Ok(out)
}

fn as_mapping<'a>(value: &'a Value, location: &str, empty: &'a Mapping) -> Result<&'a Mapping, ParseError> {
    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(empty),
        _ => Err(ParseError::structure(location, "expected a mapping")),
    }
}

fn opt_string(map: &Mapping, key: &str, location: &str) -> Result<Option<String>, ParseError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_string(value)
            .map(Some)
            .ok_or_else(|| ParseError::structure(format!("{location}.{key}"), "expected a string")),
    }
}

/// Render a scalar YAML value as a string.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(value) => scalar_string(value).into_iter().collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml_ng::from_str(text).unwrap()
    }

    #[test]
    fn test_optional_property_suffix() {
        let decl = read_type_decl(
            &yaml("properties:\n  id: integer\n  nickname?: string\n  age:\n    type: integer\n    required: false\n"),
            "User",
        )
        .unwrap();
        let TypeDecl::Full(body) = decl else {
            panic!("expected expanded form");
        };
        assert!(body.properties["id"].required);
        assert!(!body.properties["nickname"].required);
        assert!(!body.properties["age"].required);
    }

    #[test]
    fn test_required_list_overrides_default() {
        let decl = read_type_decl(
            &yaml("type: object\nrequired: [name]\nproperties:\n  name: string\n  email: string\n"),
            "User",
        )
        .unwrap();
        let TypeDecl::Full(body) = decl else {
            panic!("expected expanded form");
        };
        assert!(body.properties["name"].required);
        assert!(!body.properties["email"].required);
    }

    #[test]
    fn test_multiple_inheritance_is_kept_for_rejection() {
        let decl = read_type_decl(&yaml("type: [A, B]\n"), "C").unwrap();
        let TypeDecl::Full(body) = decl else {
            panic!("expected expanded form");
        };
        assert!(matches!(body.base, Some(TypeBase::Multiple(ref v)) if v.len() == 2));
    }

    #[test]
    fn test_inline_json_schema_is_any() {
        let decl = read_type_decl(&yaml("'{\"type\": \"object\"}'"), "x").unwrap();
        assert_eq!(decl, TypeDecl::Expr(TypeExpr::Name("any".into())));
    }

    #[test]
    fn test_bare_body_uses_default_media_type() {
        let method = read_method_decl(
            &yaml("body: User\nresponses:\n  201:\n    body:\n      application/json: User\n"),
            "/users.post",
            "application/json",
        )
        .unwrap();
        let body = method.body.unwrap();
        assert!(body.contains_key("application/json"));
        assert!(method.responses.contains_key("201"));
    }

    #[test]
    fn test_secured_by_forms() {
        let parsed = read_secured_by(Some(&yaml("- null\n- oauth:\n    scopes: [read]\n- apiKey\n")), "x")
            .unwrap()
            .unwrap();
        assert_eq!(
            parsed,
            vec![
                SecuredBy::Anonymous,
                SecuredBy::Scheme("oauth".into()),
                SecuredBy::Scheme("apiKey".into())
            ]
        );
    }

    #[test]
    fn test_non_mapping_root_is_rejected() {
        let err = read_document(&yaml("- a\n- b\n"), None).unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure { .. }));
    }
}
