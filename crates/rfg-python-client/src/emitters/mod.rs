pub mod client;
pub mod tests;

use rfg_core::ir::{ApiKeyLocation, SecurityKind};
use rfg_python::GenerationContext;
use rfg_python::identifiers::py_ident;
use serde::Serialize;

/// Default `base_url` of the generated client: the local development server.
pub const DEFAULT_HOST: &str = "http://localhost:5000";

/// Credentials the generated `ApiClient` accepts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientAuth {
    pub api_key: bool,
    pub api_key_headers: Vec<String>,
    pub api_key_queries: Vec<String>,
    pub basic: bool,
    pub bearer: bool,
}

impl ClientAuth {
    /// Collect the options every declared scheme needs. Empty when auth is disabled.
    pub fn new(ctx: &GenerationContext<'_>) -> Self {
        let mut auth = Self::default();
        if !ctx.config.auth_enabled() {
            return auth;
        }
        for scheme in ctx.ir.security_schemes.values() {
            match &scheme.kind {
                SecurityKind::ApiKey { location, param_name } => {
                    auth.api_key = true;
                    let names = match location {
                        ApiKeyLocation::Header => &mut auth.api_key_headers,
                        ApiKeyLocation::Query => &mut auth.api_key_queries,
                    };
                    if !names.contains(param_name) {
                        names.push(param_name.clone());
                    }
                }
                SecurityKind::Basic => auth.basic = true,
                SecurityKind::Bearer | SecurityKind::OAuth2 => auth.bearer = true,
                SecurityKind::Other => {}
            }
        }
        auth
    }

    /// Constructor keyword arguments, for the README and tests.
    pub fn options(&self) -> Vec<&'static str> {
        let mut options = Vec::new();
        if self.api_key {
            options.push("api_key");
        }
        if self.basic {
            options.extend(["username", "password"]);
        }
        if self.bearer {
            options.push("token");
        }
        options
    }
}

/// Project-wide values the client templates print.
#[derive(Debug, Clone, Serialize)]
pub struct ClientProject {
    pub title: String,
    pub description: Option<String>,
    pub package: String,
    pub base_url: String,
    pub auth: ClientAuth,
}

impl ClientProject {
    pub fn new(ctx: &GenerationContext<'_>) -> Self {
        Self {
            title: ctx.ir.info.title.clone(),
            description: ctx.ir.info.description.clone(),
            package: format!("{}-client", py_ident(&ctx.config.app_name).replace('_', "-")),
            base_url: format!("{DEFAULT_HOST}{}", ctx.config.url_prefix()),
            auth: ClientAuth::new(ctx),
        }
    }
}
