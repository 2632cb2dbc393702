use std::collections::BTreeSet;

use minijinja::context;
use rfg_core::ir::SecurityKind;
use rfg_core::{FacetTag, GeneratedFile, GeneratorError};
use rfg_python::identifiers::{py_ident, py_str};
use rfg_python::templates::{python_env, render};
use rfg_python::{GenerationContext, Operation, Param, operation_groups};
use serde::Serialize;

use super::Project;
use super::services::{service_class, service_module};

/// The auth decorator wired onto a route.
#[derive(Debug, Clone, Serialize)]
pub struct Guard {
    /// Decorator expression without the `@`.
    pub decorator: String,
    /// Name imported from `app.auth.security` for the decorator.
    pub import: String,
    /// `check_*` functions consulted by the decorator.
    pub checks: Vec<String>,
    /// False when some scheme lets every request through.
    pub rejects_anonymous: bool,
}

#[derive(Debug, Clone, Serialize)]
struct RouteView {
    function: String,
    verb: String,
    rule: String,
    summary: String,
    path_args: String,
    query_params: Vec<Param>,
    header_params: Vec<Param>,
    body: bool,
    body_load: String,
    service: String,
    call_args: String,
    status: u16,
    result_dump: String,
    guard: Option<Guard>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
struct Import {
    module: String,
    class_name: String,
}

/// The auth guard for an operation, when auth is enabled and the method demands credentials.
pub fn guard(ctx: &GenerationContext<'_>, op: &Operation) -> Option<Guard> {
    if !ctx.config.auth_enabled() || op.secured_by.is_empty() || op.allows_anonymous {
        return None;
    }
    let idents: Vec<String> = op.secured_by.iter().map(|s| py_ident(s)).collect();
    let rejects_anonymous = op.secured_by.iter().all(|name| {
        ctx.ir
            .security_schemes
            .get(name)
            .is_some_and(|scheme| scheme.kind != SecurityKind::Other)
    });
    let (decorator, import) = match idents.as_slice() {
        [single] => (format!("require_{single}"), format!("require_{single}")),
        many => {
            let names: Vec<String> = many.iter().map(|i| py_str(i)).collect();
            (format!("require_any({})", names.join(", ")), "require_any".to_string())
        }
    };
    Some(Guard {
        decorator,
        import,
        checks: idents.iter().map(|i| format!("check_{i}")).collect(),
        rejects_anonymous,
    })
}

/// Flask rule for a path template: `/books/{bookId}` → `/books/<int:book_id>`.
pub fn flask_rule(op: &Operation) -> String {
    let mut rule = op.path.clone();
    for p in &op.path_params {
        let placeholder = match p.converter {
            "int" | "float" => format!("<{}:{}>", p.converter, p.name),
            _ => format!("<{}>", p.name),
        };
        rule = rule.replace(&format!("{{{}}}", p.key), &placeholder);
    }
    if rule.is_empty() { "/".to_string() } else { rule }
}

/// Emit the versioned blueprint package and its routes module.
pub fn emit_routes(ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let project = Project::new(ctx);
    let groups = operation_groups(ctx);

    let mut schemas: BTreeSet<Import> = BTreeSet::new();
    let mut services: Vec<Import> = Vec::new();
    let mut auth_imports: BTreeSet<String> = BTreeSet::new();
    let mut routes: Vec<RouteView> = Vec::new();

    for group in &groups {
        let service = service_class(group);
        services.push(Import {
            module: service_module(group),
            class_name: service.clone(),
        });

        for op in &group.operations {
            for schema in op.body.iter().chain(&op.response).filter_map(|p| p.schema.as_ref()) {
                schemas.insert(Import {
                    module: schema.module.clone(),
                    class_name: schema.class_name.clone(),
                });
            }

            let guard = guard(ctx, op);
            if let Some(g) = &guard {
                auth_imports.insert(g.import.clone());
            }

            let body_load = match op.body.as_ref().and_then(|b| b.schema.as_ref()) {
                Some(s) if s.many => format!("{}(many=True).load(request.get_json(silent=True) or [])", s.class_name),
                Some(s) => format!("{}().load(request.get_json(silent=True) or {{}})", s.class_name),
                None => "request.get_json(silent=True)".to_string(),
            };
            let result_dump = match op.response.as_ref().and_then(|r| r.schema.as_ref()) {
                Some(s) if s.many => format!("{}(many=True).dump(result)", s.class_name),
                Some(s) => format!("{}().dump(result)", s.class_name),
                None => "result".to_string(),
            };

            routes.push(RouteView {
                function: op.function.clone(),
                verb: op.verb.clone(),
                rule: flask_rule(op),
                summary: op.summary.clone(),
                path_args: op
                    .path_params
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                query_params: op.query_params.clone(),
                header_params: op.header_params.clone(),
                body: op.body.is_some(),
                body_load,
                service: service.clone(),
                call_args: op.call_args(),
                status: op.status,
                result_dump,
                guard,
            });
        }
    }

    log::debug!("routes: {} handlers in {} groups", routes.len(), groups.len());

    let mut env = python_env();
    let version_dir = format!("app/api/{}", project.version_pkg);
    Ok(vec![
        GeneratedFile::new(
            "app/api/__init__.py",
            render(&mut env, "api_init.py.j2", include_str!("../../templates/api_init.py.j2"), &project)?,
            FacetTag::Routes,
        ),
        GeneratedFile::new(
            format!("{version_dir}/__init__.py"),
            render(
                &mut env,
                "api_version_init.py.j2",
                include_str!("../../templates/api_version_init.py.j2"),
                &project,
            )?,
            FacetTag::Routes,
        ),
        GeneratedFile::new(
            format!("{version_dir}/routes.py"),
            render(
                &mut env,
                "routes.py.j2",
                include_str!("../../templates/routes.py.j2"),
                context! {
                    routes => routes,
                    schemas => schemas,
                    services => services,
                    auth_imports => auth_imports,
                    ..minijinja::Value::from_serialize(&project)
                },
            )?,
            FacetTag::Routes,
        ),
    ])
}
