pub mod app;
pub mod auth;
pub mod models;
pub mod routes;
pub mod schemas;
pub mod services;
pub mod tests;

use rfg_python::GenerationContext;
use rfg_python::identifiers::py_ident;
use serde::Serialize;

/// Project-wide values most templates print.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub title: String,
    pub description: Option<String>,
    /// The API's own version string, as documented.
    pub api_version: String,
    pub app_name: String,
    /// Package segment under `app/api/`.
    pub version_pkg: String,
    /// URL prefix the blueprint is mounted at, `""` for root.
    pub prefix: String,
    pub auth: bool,
    pub cors: bool,
}

impl Project {
    pub fn new(ctx: &GenerationContext<'_>) -> Self {
        Self {
            title: ctx.ir.info.title.clone(),
            description: ctx.ir.info.description.clone(),
            api_version: ctx.ir.info.version.clone(),
            app_name: py_ident(&ctx.config.app_name),
            version_pkg: py_ident(&ctx.config.version),
            prefix: ctx.config.url_prefix(),
            auth: ctx.config.auth_enabled(),
            cors: ctx.config.cors_enabled(),
        }
    }
}
