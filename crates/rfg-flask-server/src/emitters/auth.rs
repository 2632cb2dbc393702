use minijinja::context;
use rfg_core::ir::{ApiKeyLocation, IrSecurityScheme, SecurityKind};
use rfg_core::{FacetTag, GeneratedFile, GeneratorError};
use rfg_python::GenerationContext;
use rfg_python::identifiers::py_ident;
use rfg_python::templates::{python_env, render};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct SchemeView {
    name: String,
    ident: String,
    kind: &'static str,
    /// Header or query parameter carrying an API key.
    param: String,
    summary: String,
}

fn scheme_view(scheme: &IrSecurityScheme) -> SchemeView {
    let (kind, param) = match &scheme.kind {
        SecurityKind::ApiKey {
            location: ApiKeyLocation::Header,
            param_name,
        } => ("api_key_header", param_name.clone()),
        SecurityKind::ApiKey {
            location: ApiKeyLocation::Query,
            param_name,
        } => ("api_key_query", param_name.clone()),
        SecurityKind::Basic => ("basic", String::new()),
        SecurityKind::Bearer | SecurityKind::OAuth2 => ("bearer", String::new()),
        SecurityKind::Other => ("other", String::new()),
    };
    let summary = match kind {
        "api_key_header" => format!("API key in the `{param}` header."),
        "api_key_query" => format!("API key in the `{param}` query parameter."),
        "basic" => "HTTP basic credentials.".to_string(),
        "bearer" => format!("JWT bearer token ({}).", scheme.scheme_type),
        _ => format!("{} is passed through unchecked.", scheme.scheme_type),
    };
    SchemeView {
        name: scheme.name.original.clone(),
        ident: py_ident(&scheme.name.original),
        kind,
        param,
        summary,
    }
}

/// Emit `app/auth/`: the JWT manager and a guard per security scheme.
pub fn emit_auth(ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let schemes: Vec<SchemeView> = ctx.ir.security_schemes.values().map(scheme_view).collect();

    let mut exports = vec!["require_any".to_string()];
    for s in &schemes {
        exports.push(format!("check_{}", s.ident));
        exports.push(format!("require_{}", s.ident));
    }

    let mut env = python_env();
    Ok(vec![
        GeneratedFile::new(
            "app/auth/__init__.py",
            render(
                &mut env,
                "auth_init.py.j2",
                include_str!("../../templates/auth_init.py.j2"),
                context! { exports => exports },
            )?,
            FacetTag::Auth,
        ),
        GeneratedFile::new(
            "app/auth/security.py",
            render(
                &mut env,
                "security.py.j2",
                include_str!("../../templates/security.py.j2"),
                context! { schemes => schemes },
            )?,
            FacetTag::Auth,
        ),
    ])
}
