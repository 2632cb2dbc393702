use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level project configuration loaded from `.rfg.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RfgConfig {
    pub input: String,
    pub output: String,
    pub generation: GenerationConfig,
}

impl Default for RfgConfig {
    fn default() -> Self {
        Self {
            input: "api.raml".to_string(),
            output: "generated".to_string(),
            generation: GenerationConfig::default(),
        }
    }
}

/// What the caller asks a generation run to produce.
///
/// Consumed read-only by every facet; nothing in the engine mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Python package / application name used in generated code.
    pub app_name: String,
    /// API version segment, e.g. `v1` → `app/api/v1/routes.py`.
    pub version: String,
    pub facets: BTreeSet<Facet>,
    /// URL prefix every route is mounted under.
    pub base_path: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            app_name: "flask_api".to_string(),
            version: "v1".to_string(),
            facets: [Facet::FlaskApp, Facet::Tests, Facet::Auth, Facet::Cors]
                .into_iter()
                .collect(),
            base_path: "/api/v1".to_string(),
        }
    }
}

impl GenerationConfig {
    pub fn with_facets(facets: impl IntoIterator<Item = Facet>) -> Self {
        Self {
            facets: facets.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn wants(&self, facet: Facet) -> bool {
        self.facets.contains(&facet)
    }

    pub fn auth_enabled(&self) -> bool {
        self.wants(Facet::Auth)
    }

    pub fn cors_enabled(&self) -> bool {
        self.wants(Facet::Cors)
    }

    /// `base_path` normalised to a leading slash and no trailing slash ("" for root).
    pub fn url_prefix(&self) -> String {
        let trimmed = self.base_path.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

/// Generation facets a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    FlaskApp,
    Client,
    Tests,
    Auth,
    Cors,
}

impl Facet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::FlaskApp => "flask_app",
            Facet::Client => "client",
            Facet::Tests => "tests",
            Facet::Auth => "auth",
            Facet::Cors => "cors",
        }
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".rfg.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<RfgConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: RfgConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# rfg configuration
input: api.raml
output: generated

generation:
  app_name: flask_api
  version: v1            # app/api/<version>/routes.py
  base_path: /api/v1     # URL prefix for every route
  facets:                # flask_app | client | tests | auth | cors
    - flask_app
    - tests
    - auth
    - cors
"#
}
