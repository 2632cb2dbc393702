pub mod config;
pub mod error;
pub mod ir;
pub mod parse;
pub mod transform;

pub use error::GeneratorError;

use serde::Serialize;

/// The category of generated output a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetTag {
    App,
    Models,
    Schemas,
    Services,
    Routes,
    Auth,
    ServerTests,
    Client,
    ClientTests,
}

impl FacetTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetTag::App => "app",
            FacetTag::Models => "models",
            FacetTag::Schemas => "schemas",
            FacetTag::Services => "services",
            FacetTag::Routes => "routes",
            FacetTag::Auth => "auth",
            FacetTag::ServerTests => "server_tests",
            FacetTag::Client => "client",
            FacetTag::ClientTests => "client_tests",
        }
    }

    /// Whether the facet produces test code rather than shipped code.
    pub fn is_test(&self) -> bool {
        matches!(self, FacetTag::ServerTests | FacetTag::ClientTests)
    }
}

impl std::fmt::Display for FacetTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated file with path, content, and the facet that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    pub facet: FacetTag,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>, facet: FacetTag) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            facet,
        }
    }
}
