use thiserror::Error;

/// Malformed input: the document is not structurally valid RAML.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("specification is not valid UTF-8")]
    InvalidUtf8,

    #[error("unsupported RAML version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid structure at {location}: {message}")]
    InvalidStructure { location: String, message: String },

    #[error("unresolved include `{fragment}` at {location}")]
    UnresolvedInclude { location: String, fragment: String },

    #[error("circular include: {0}")]
    CircularInclude(String),
}

impl ParseError {
    pub(crate) fn structure(location: impl Into<String>, message: impl Into<String>) -> Self {
        ParseError::InvalidStructure {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Semantic inconsistency in an otherwise well-formed document.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unresolved type `{type_name}` referenced by {context}")]
    UnresolvedType { type_name: String, context: String },

    #[error("unknown security scheme `{scheme}` referenced by {context}")]
    UnknownSecurityScheme { scheme: String, context: String },

    #[error("duplicate method {method} on resource {path}")]
    DuplicateMethod { method: String, path: String },

    #[error("circular type inheritance: {0}")]
    CircularInheritance(String),

    #[error("unknown trait `{name}` applied by {context}")]
    UnknownTrait { name: String, context: String },

    #[error("unknown resource type `{name}` applied by {context}")]
    UnknownResourceType { name: String, context: String },

    #[error("circular resource type application: {0}")]
    CircularResourceType(String),
}

/// Everything that can stop `parse → IR`.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),
}

/// A single facet failed to generate. Aggregated into the report, never fatal to a run.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to render template {template}: {message}")]
    Render { template: String, message: String },
}

/// Failure loading the `.rfg.yaml` project file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
}
