use indexmap::IndexMap;
use serde::Deserialize;

/// A `securitySchemes` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SecuritySchemeDecl {
    #[serde(rename = "type")]
    pub scheme_type: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "describedBy", default)]
    pub described_by: Option<DescribedBy>,

    #[serde(default)]
    pub settings: Option<serde_yaml_ng::Value>,
}

/// How a scheme shows up on the wire.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DescribedBy {
    pub headers: IndexMap<String, serde_yaml_ng::Value>,
    #[serde(rename = "queryParameters")]
    pub query_parameters: IndexMap<String, serde_yaml_ng::Value>,
}

/// One entry of a `securedBy` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecuredBy {
    Scheme(String),
    /// `null` — the method may also be called anonymously.
    Anonymous,
}
