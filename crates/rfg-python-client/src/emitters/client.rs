use std::collections::BTreeSet;

use log::debug;
use minijinja::context;
use rfg_core::{FacetTag, GeneratedFile, GeneratorError};
use rfg_python::identifiers::py_str;
use rfg_python::templates::{python_env, render};
use rfg_python::{GenerationContext, Operation, Param, operation_groups};
use serde::Serialize;

use super::ClientProject;

#[derive(Debug, Clone, Serialize)]
struct ClientMethod {
    function: String,
    verb: String,
    path: String,
    summary: String,
    signature: String,
    returns: String,
    /// Python expression for the request path.
    url: String,
    query: Vec<String>,
    headers: Vec<String>,
    body: Option<String>,
    response: Option<String>,
}

/// Python expression for the request path, an f-string when the path has parameters.
pub fn path_expr(op: &Operation) -> String {
    if op.path_params.is_empty() {
        return py_str(&op.path);
    }
    let mut path = op.path.clone();
    for p in &op.path_params {
        path = path.replace(&format!("{{{}}}", p.key), &format!("{{{}}}", p.encode));
    }
    format!("f{}", py_str(&path))
}

fn client_method(op: &Operation) -> ClientMethod {
    let entry = |p: &Param| format!("{}: {}", py_str(&p.key), p.encode);
    ClientMethod {
        function: op.function.clone(),
        verb: op.verb.clone(),
        path: op.path.clone(),
        summary: op.summary.clone(),
        signature: op.signature(),
        returns: op
            .response
            .as_ref()
            .map_or_else(|| "None".to_string(), |r| r.annotation.clone()),
        url: path_expr(op),
        query: op.query_params.iter().map(entry).collect(),
        headers: op.header_params.iter().map(entry).collect(),
        body: op.body.as_ref().map(|b| b.encode.clone()),
        response: op.response.as_ref().map(|r| r.decode.clone()),
    }
}

/// Emit `client/`: `ApiClient`, the models it exchanges, errors, and packaging.
pub fn emit_client(ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let project = ClientProject::new(ctx);
    let operations: Vec<Operation> = operation_groups(ctx)
        .into_iter()
        .flat_map(|g| g.operations)
        .collect();
    let methods: Vec<ClientMethod> = operations.iter().map(client_method).collect();
    debug!("client: {} methods", methods.len());

    let used: BTreeSet<String> = operations
        .iter()
        .flat_map(|op| op.model_refs.iter().map(|r| r.class_name.clone()))
        .collect();
    let temporal: BTreeSet<String> = operations.iter().flat_map(|op| op.temporal.iter().cloned()).collect();

    let models: Vec<_> = ctx.types.models().collect();
    let model_temporal: BTreeSet<String> = models.iter().flat_map(|m| m.temporal.iter().cloned()).collect();

    let mut env = python_env();
    let file = |path: &str, content: String| GeneratedFile::new(path, content, FacetTag::Client);

    Ok(vec![
        file(
            "client/__init__.py",
            render(
                &mut env,
                "init.py.j2",
                include_str!("../../templates/init.py.j2"),
                context! { title => &project.title, models => &models },
            )?,
        ),
        file(
            "client/api_client.py",
            render(
                &mut env,
                "api_client.py.j2",
                include_str!("../../templates/api_client.py.j2"),
                context! {
                    title => &project.title,
                    base_url => &project.base_url,
                    auth => &project.auth,
                    models => used,
                    temporal => temporal,
                    operations => methods,
                },
            )?,
        ),
        file(
            "client/models.py",
            render(
                &mut env,
                "models.py.j2",
                include_str!("../../templates/models.py.j2"),
                context! { title => &project.title, models => &models, temporal => model_temporal },
            )?,
        ),
        file(
            "client/exceptions.py",
            include_str!("../../templates/exceptions.py.j2").to_string(),
        ),
        file(
            "client/pyproject.toml",
            render(
                &mut env,
                "pyproject.toml.j2",
                include_str!("../../templates/pyproject.toml.j2"),
                &project,
            )?,
        ),
        file(
            "client/README.md",
            render(
                &mut env,
                "readme.md.j2",
                include_str!("../../templates/readme.md.j2"),
                context! {
                    project => &project,
                    options => project.auth.options(),
                    example => operations.first().map(|op| &op.function),
                    operations => &operations,
                },
            )?,
        ),
    ])
}
