use indexmap::IndexMap;
use serde_yaml_ng::Value;

use super::security::{SecuredBy, SecuritySchemeDecl};
use super::types::{PropertyDecl, TypeDecl};

/// Top-level RAML document, after `!include` resolution.
///
/// Traits, resource types, and resources stay as raw YAML until the transform
/// phase has applied `<<parameter>>` substitution and merged them.
#[derive(Debug, Clone, PartialEq)]
pub struct RamlDocument {
    /// Version from the `#%RAML x` header line, if present.
    pub raml_version: Option<String>,
    pub title: String,
    pub version: String,
    pub base_uri: String,
    pub description: Option<String>,
    pub media_type: String,
    pub protocols: Vec<String>,
    pub types: IndexMap<String, TypeDecl>,
    pub traits: IndexMap<String, Value>,
    pub resource_types: IndexMap<String, Value>,
    pub security_schemes: IndexMap<String, SecuritySchemeDecl>,
    pub secured_by: Vec<SecuredBy>,
    /// Top-level resources keyed by their (possibly multi-segment) path.
    pub resources: IndexMap<String, Value>,
    /// Later declarations of a path (or of a key inside a resource) that was
    /// already declared at the same level, keyed by full path.
    pub repeated_resources: Vec<(String, Value)>,
}

/// A trait or resource-type application: `name` or `{ name: { param: value } }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub params: IndexMap<String, String>,
}

/// A resource after resource-type and trait merging.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceDecl {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub uri_parameters: IndexMap<String, PropertyDecl>,
    pub secured_by: Option<Vec<SecuredBy>>,
    /// Lowercase verb → method.
    pub methods: IndexMap<String, MethodDecl>,
}

/// A method after trait merging.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodDecl {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub query_parameters: IndexMap<String, PropertyDecl>,
    pub headers: IndexMap<String, PropertyDecl>,
    pub body: Option<BodyDecl>,
    pub responses: IndexMap<String, ResponseDecl>,
    pub secured_by: Option<Vec<SecuredBy>>,
}

/// Media type → declared body type.
pub type BodyDecl = IndexMap<String, TypeDecl>;

/// A single status-code response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseDecl {
    pub description: Option<String>,
    pub body: Option<BodyDecl>,
}
