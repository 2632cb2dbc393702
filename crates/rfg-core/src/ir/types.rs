use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::resources::{IrMethod, IrResource};
use super::schemas::{IrTypeDef, IrTypeKind};

/// A fully resolved, generator-ready intermediate representation of a RAML document.
#[derive(Debug, Clone, Serialize)]
pub struct IrSpec {
    pub info: IrInfo,
    /// Top-level resources; each owns its subtree.
    pub resources: Vec<IrResource>,
    /// Every named type, declared and synthesized, keyed by its PascalCase name.
    pub types: IndexMap<String, IrTypeDef>,
    pub security_schemes: IndexMap<String, IrSecurityScheme>,
    /// Non-fatal findings from parsing and resolution.
    pub warnings: Vec<IrWarning>,
}

impl IrSpec {
    /// Every method in the tree, parents before children, in declaration order.
    pub fn all_methods(&self) -> Vec<MethodRef<'_>> {
        let mut out = Vec::new();
        for resource in &self.resources {
            collect_methods(resource, &mut out);
        }
        out
    }

    /// Every resource in the tree, parents before children.
    pub fn all_resources(&self) -> Vec<&IrResource> {
        fn walk<'a>(resource: &'a IrResource, out: &mut Vec<&'a IrResource>) {
            out.push(resource);
            for child in &resource.children {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        for resource in &self.resources {
            walk(resource, &mut out);
        }
        out
    }

    pub fn type_def(&self, name: &str) -> Option<&IrTypeDef> {
        self.types.get(name)
    }

    /// Object type definitions in declaration order.
    pub fn object_types(&self) -> impl Iterator<Item = &IrTypeDef> {
        self.types
            .values()
            .filter(|t| matches!(t.kind, IrTypeKind::Object(_)))
    }
}

fn collect_methods<'a>(resource: &'a IrResource, out: &mut Vec<MethodRef<'a>>) {
    for method in &resource.methods {
        out.push(MethodRef { resource, method });
    }
    for child in &resource.children {
        collect_methods(child, out);
    }
}

/// A method together with the resource that declares it.
#[derive(Debug, Clone, Copy)]
pub struct MethodRef<'a> {
    pub resource: &'a IrResource,
    pub method: &'a IrMethod,
}

/// API metadata.
#[derive(Debug, Clone, Serialize)]
pub struct IrInfo {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
    pub base_uri: String,
    pub media_type: String,
    pub protocols: Vec<String>,
}

/// A warning raised while building the IR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IrWarning {
    pub location: String,
    pub message: String,
}

impl IrWarning {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for IrWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// A declared security scheme.
#[derive(Debug, Clone, Serialize)]
pub struct IrSecurityScheme {
    pub name: NormalizedName,
    /// The `type:` string as written, e.g. `OAuth 2.0`.
    pub scheme_type: String,
    pub kind: SecurityKind,
    pub description: Option<String>,
}

/// What a generated auth check has to look for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecurityKind {
    ApiKey {
        location: ApiKeyLocation,
        param_name: String,
    },
    Basic,
    Bearer,
    OAuth2,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyLocation {
    Header,
    Query,
}

/// A name with multiple casing variants pre-computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
    pub snake_case: String,
    pub screaming_snake: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}
