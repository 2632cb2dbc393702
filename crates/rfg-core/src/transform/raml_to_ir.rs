use std::collections::HashSet;

use heck::ToPascalCase;
use indexmap::IndexMap;
use serde_yaml_ng::Value;

use super::merge::expand_resource;
use super::name_normalizer::{normalize_name, route_to_name, unique_snake_name};
use super::type_resolver::TypeResolver;
use crate::error::{ResolveError, TransformError};
use crate::ir::*;
use crate::parse::document::{BodyDecl, MethodDecl, RamlDocument};
use crate::parse::reader::read_resource_decl;
use crate::parse::security::{SecuredBy, SecuritySchemeDecl};
use crate::parse::types::{PropertyDecl, TypeDecl};

/// Transform a parsed RAML document into the fully resolved IR.
pub fn transform(doc: &RamlDocument) -> Result<IrSpec, TransformError> {
    let mut warnings = Vec::new();
    if doc.raml_version.is_none() {
        warnings.push(IrWarning::new("$", "missing `#%RAML 1.0` header"));
    }

    // Phase 1: Resolve declared types
    let mut types = TypeResolver::new(&doc.types)?;
    types.resolve_declared()?;

    // Phase 2: Security schemes
    let security_schemes = doc
        .security_schemes
        .iter()
        .map(|(name, decl)| (name.clone(), security_scheme(name, decl)))
        .collect();

    // Phase 3: Split resource keys into a segment tree
    let mut root = Node::default();
    for (key, value) in &doc.resources {
        root.add(key, value, key);
    }
    for (path, value) in &doc.repeated_resources {
        root.add(path, value, path);
    }

    // Phase 4: Merge, read, and resolve every node
    let mut builder = Builder {
        doc,
        types,
        method_names: HashSet::new(),
        warnings,
    };
    let mut resources = Vec::with_capacity(root.children.len());
    for child in root.children.values() {
        resources.push(builder.build(child, "", &[])?);
    }
    if resources.is_empty() {
        builder
            .warnings
            .push(IrWarning::new("$", "document declares no resources"));
    }

    log::debug!(
        "transformed `{}`: {} top-level resources, {} declared types",
        doc.title,
        resources.len(),
        doc.types.len()
    );

    Ok(IrSpec {
        info: IrInfo {
            title: doc.title.clone(),
            description: doc.description.clone(),
            version: doc.version.clone(),
            base_uri: doc.base_uri.clone(),
            media_type: doc.media_type.clone(),
            protocols: doc.protocols.clone(),
        },
        resources,
        types: builder.types.finish(),
        security_schemes,
        warnings: builder.warnings,
    })
}

/// A resource tree node before merging: every declaration that lands on the
/// same path contributes to it.
#[derive(Default)]
struct Node {
    segment: String,
    declarations: Vec<(Value, String)>,
    children: IndexMap<String, Node>,
}

impl Node {
    fn add(&mut self, key: &str, value: &Value, location: &str) {
        let mut node = self;
        for segment in split_segments(key) {
            node = node.children.entry(segment.clone()).or_insert_with(|| Node {
                segment,
                ..Node::default()
            });
        }
        node.declarations.push((value.clone(), location.to_string()));

        if let Value::Mapping(map) = value {
            for (child_key, child_value) in map {
                if let Some(child_key) = child_key.as_str().filter(|k| k.starts_with('/')) {
                    node.add(child_key, child_value, &format!("{location}{child_key}"));
                }
            }
        }
    }
}

/// `/api/users/` → `["/api", "/users"]`; `/` → `["/"]`.
fn split_segments(key: &str) -> Vec<String> {
    let segments: Vec<String> = key
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| format!("/{s}"))
        .collect();
    if segments.is_empty() {
        vec!["/".to_string()]
    } else {
        segments
    }
}

struct Builder<'a> {
    doc: &'a RamlDocument,
    types: TypeResolver<'a>,
    method_names: HashSet<String>,
    warnings: Vec<IrWarning>,
}

impl<'a> Builder<'a> {
    fn build(
        &mut self,
        node: &Node,
        parent_path: &str,
        inherited_params: &[IrParameter],
    ) -> Result<IrResource, TransformError> {
        let path = if node.segment == "/" {
            "/".to_string()
        } else {
            format!("{}{}", parent_path.trim_end_matches('/'), node.segment)
        };
        let resource_name = resource_name(&path);

        let mut display_name = None;
        let mut description = None;
        let mut uri_parameters: IndexMap<String, PropertyDecl> = IndexMap::new();
        let mut methods: Vec<(MethodDecl, Option<Vec<SecuredBy>>, String)> = Vec::new();

        for (raw, location) in &node.declarations {
            let expanded = expand_resource(raw, &path, self.doc)?;
            let decl = read_resource_decl(&Value::Mapping(expanded), location, &self.doc.media_type)?;
            display_name = display_name.or(decl.display_name);
            description = description.or(decl.description);
            for (name, param) in decl.uri_parameters {
                uri_parameters.entry(name).or_insert(param);
            }
            for (verb, method) in decl.methods {
                if methods.iter().any(|(_, _, v)| *v == verb) {
                    return Err(ResolveError::DuplicateMethod {
                        method: verb.to_ascii_uppercase(),
                        path: path.clone(),
                    }
                    .into());
                }
                methods.push((method, decl.secured_by.clone(), verb));
            }
        }

        // Path parameters introduced by this segment.
        let mut own_params = Vec::new();
        for original in extract_path_params(&node.segment) {
            let context = format!("uri parameter {original} of {path}");
            let (type_ref, description, enum_values) = match uri_parameters.get(&original) {
                Some(param) => (
                    self.types.resolve_ref(
                        &param.decl,
                        &format!("{}{}", resource_name.pascal_case, original.to_pascal_case()),
                        &context,
                    )?,
                    param.decl.description().map(str::to_string),
                    enum_values(&param.decl),
                ),
                None => (TypeRef::Primitive(PrimitiveKind::String), None, Vec::new()),
            };
            own_params.push(IrParameter {
                name: normalize_name(&original),
                original_name: original,
                location: IrParameterLocation::Path,
                type_ref,
                required: true,
                description,
                enum_values,
            });
        }
        let mut path_params = inherited_params.to_vec();
        path_params.extend(own_params.iter().cloned());

        let mut ir_methods = Vec::with_capacity(methods.len());
        for (decl, resource_security, verb) in &methods {
            let Some(verb) = HttpMethod::from_key(verb) else {
                continue;
            };
            ir_methods.push(self.build_method(
                verb,
                decl,
                resource_security.as_deref(),
                &path,
                &resource_name,
                &path_params,
            )?);
        }

        let mut children = Vec::with_capacity(node.children.len());
        for child in node.children.values() {
            children.push(self.build(child, &path, &path_params)?);
        }

        if !node.declarations.is_empty() && ir_methods.is_empty() && children.is_empty() {
            self.warnings
                .push(IrWarning::new(&path, "resource declares no methods"));
        }

        Ok(IrResource {
            segment: node.segment.clone(),
            path,
            name: resource_name,
            display_name,
            description,
            uri_parameters: own_params,
            methods: ir_methods,
            children,
        })
    }

    fn build_method(
        &mut self,
        verb: HttpMethod,
        decl: &MethodDecl,
        resource_security: Option<&[SecuredBy]>,
        path: &str,
        resource_name: &NormalizedName,
        path_params: &[IrParameter],
    ) -> Result<IrMethod, TransformError> {
        let context = format!("{verb} {path}");
        let prefix = format!("{}{}", resource_name.pascal_case, verb.key().to_pascal_case());

        let name = unique_snake_name(&route_to_name(verb, path), &mut self.method_names);

        let mut parameters = path_params.to_vec();
        for (location, params) in [
            (IrParameterLocation::Query, &decl.query_parameters),
            (IrParameterLocation::Header, &decl.headers),
        ] {
            for (original, param) in params {
                let normalized = normalize_name(original);
                let type_ref = self.types.resolve_ref(
                    &param.decl,
                    &format!("{prefix}{}", normalized.pascal_case),
                    &format!("parameter {original} of {context}"),
                )?;
                parameters.push(IrParameter {
                    name: normalized,
                    original_name: original.clone(),
                    location,
                    type_ref,
                    required: param.required,
                    description: param.decl.description().map(str::to_string),
                    enum_values: enum_values(&param.decl),
                });
            }
        }

        let body = match decl.body.as_ref().and_then(pick_media) {
            Some((media_type, type_decl)) => Some(IrBody {
                media_type: media_type.clone(),
                type_ref: self.types.resolve_ref(
                    type_decl,
                    &format!("{prefix}RequestBody"),
                    &format!("body of {context}"),
                )?,
            }),
            None => None,
        };

        let mut responses = Vec::with_capacity(decl.responses.len());
        for (status, response) in &decl.responses {
            let body = match response.body.as_ref().and_then(pick_media) {
                Some((media_type, type_decl)) => Some(IrBody {
                    media_type: media_type.clone(),
                    type_ref: self.types.resolve_ref(
                        type_decl,
                        &format!("{prefix}{status}Response"),
                        &format!("response {status} of {context}"),
                    )?,
                }),
                None => None,
            };
            responses.push(IrResponse {
                status: status.clone(),
                description: response.description.clone(),
                body,
            });
        }

        let security = decl
            .secured_by
            .as_deref()
            .or(resource_security)
            .unwrap_or(self.doc.secured_by.as_slice());
        let mut secured_by = Vec::new();
        let mut allows_anonymous = false;
        for entry in security {
            match entry {
                SecuredBy::Anonymous => allows_anonymous = true,
                SecuredBy::Scheme(scheme) => {
                    if !self.doc.security_schemes.contains_key(scheme) {
                        return Err(ResolveError::UnknownSecurityScheme {
                            scheme: scheme.clone(),
                            context: context.clone(),
                        }
                        .into());
                    }
                    if !secured_by.contains(scheme) {
                        secured_by.push(scheme.clone());
                    }
                }
            }
        }

        Ok(IrMethod {
            verb,
            name: normalize_name(&name),
            path: path.to_string(),
            display_name: decl.display_name.clone(),
            description: decl.description.clone(),
            parameters,
            body,
            responses,
            secured_by,
            allows_anonymous,
        })
    }
}

/// Resource name from its full path, e.g. `/users/{userId}` → `UsersUserId`.
fn resource_name(path: &str) -> NormalizedName {
    if path.chars().any(char::is_alphanumeric) {
        normalize_name(path)
    } else {
        normalize_name("root")
    }
}

/// `{name}` placeholders of one segment, in order.
pub fn extract_path_params(segment: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut rest = segment;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = rest[start + 1..start + len].trim();
        if !name.is_empty() {
            params.push(name.to_string());
        }
        rest = &rest[start + len + 1..];
    }
    params
}

/// JSON wins when a body offers several media types.
fn pick_media(body: &BodyDecl) -> Option<(&String, &TypeDecl)> {
    body.iter()
        .find(|(media, _)| media.contains("json"))
        .or_else(|| body.iter().next())
}

fn enum_values(decl: &TypeDecl) -> Vec<String> {
    match decl {
        TypeDecl::Full(body) => body.enum_values.clone(),
        TypeDecl::Expr(_) => Vec::new(),
    }
}

fn security_scheme(name: &str, decl: &SecuritySchemeDecl) -> IrSecurityScheme {
    let scheme_type = decl.scheme_type.to_ascii_lowercase();
    let described = decl.described_by.clone().unwrap_or_default();

    let kind = if scheme_type.contains("bearer") || scheme_type.contains("jwt") {
        SecurityKind::Bearer
    } else if scheme_type.contains("basic") {
        SecurityKind::Basic
    } else if scheme_type.starts_with("oauth 2") {
        SecurityKind::OAuth2
    } else if scheme_type == "pass through" || scheme_type.starts_with("x-") {
        match (
            described.headers.keys().next(),
            described.query_parameters.keys().next(),
        ) {
            (Some(header), _) if header.eq_ignore_ascii_case("authorization") => SecurityKind::Bearer,
            (Some(header), _) => SecurityKind::ApiKey {
                location: ApiKeyLocation::Header,
                param_name: header.clone(),
            },
            (None, Some(query)) => SecurityKind::ApiKey {
                location: ApiKeyLocation::Query,
                param_name: query.clone(),
            },
            (None, None) => SecurityKind::Other,
        }
    } else {
        SecurityKind::Other
    };

    IrSecurityScheme {
        name: normalize_name(name),
        scheme_type: decl.scheme_type.clone(),
        kind,
        description: decl.description.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_segments() {
        assert_eq!(split_segments("/api/users/"), vec!["/api", "/users"]);
        assert_eq!(split_segments("/"), vec!["/"]);
        assert_eq!(split_segments("/{id}"), vec!["/{id}"]);
    }

    #[test]
    fn test_extract_path_params() {
        assert_eq!(extract_path_params("/{userId}"), vec!["userId"]);
        assert_eq!(extract_path_params("/{from}-{to}"), vec!["from", "to"]);
        assert!(extract_path_params("/users").is_empty());
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(resource_name("/users/{userId}").pascal_case, "UsersUserId");
        assert_eq!(resource_name("/").pascal_case, "Root");
    }
}
