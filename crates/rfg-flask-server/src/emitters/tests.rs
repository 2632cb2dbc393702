use minijinja::context;
use rfg_core::{FacetTag, GeneratedFile, GeneratorError};
use rfg_python::templates::{python_env, render};
use rfg_python::{GenerationContext, Operation, OperationGroup, operation_groups};
use serde::Serialize;

use super::Project;
use super::routes::guard;
use super::services::{service_class, service_module};

#[derive(Debug, Clone, Serialize)]
struct RouteTest {
    function: String,
    client_method: String,
    url: String,
    body: Option<String>,
    result: String,
    status: u16,
    checks: Vec<String>,
    rejects_anonymous: bool,
}

/// Emit pytest suites that drive each route through Flask's test client.
pub fn emit_tests(ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let project = Project::new(ctx);
    let mut env = python_env();

    let mut files = vec![
        GeneratedFile::new(
            "tests/__init__.py",
            render(&mut env, "tests_init.py.j2", include_str!("../../templates/tests_init.py.j2"), &project)?,
            FacetTag::ServerTests,
        ),
        GeneratedFile::new(
            "tests/conftest.py",
            render(&mut env, "conftest.py.j2", include_str!("../../templates/conftest.py.j2"), &project)?,
            FacetTag::ServerTests,
        ),
        GeneratedFile::new(
            "pytest.ini",
            include_str!("../../templates/pytest.ini.j2"),
            FacetTag::ServerTests,
        ),
        GeneratedFile::new(
            "requirements-dev.txt",
            include_str!("../../templates/requirements_dev.txt.j2"),
            FacetTag::ServerTests,
        ),
    ];

    for group in operation_groups(ctx) {
        let tests: Vec<RouteTest> = group.operations.iter().map(|op| route_test(ctx, op)).collect();
        files.push(GeneratedFile::new(
            format!("tests/test_{}.py", group.module_stem),
            render(
                &mut env,
                "test_group.py.j2",
                include_str!("../../templates/test_group.py.j2"),
                context! { group => group_view(&group), tests => tests },
            )?,
            FacetTag::ServerTests,
        ));
    }

    Ok(files)
}

#[derive(Debug, Clone, Serialize)]
struct GroupView {
    name: String,
    module: String,
    class_name: String,
}

fn group_view(group: &OperationGroup) -> GroupView {
    GroupView {
        name: group.name.clone(),
        module: service_module(group),
        class_name: service_class(group),
    }
}

fn route_test(ctx: &GenerationContext<'_>, op: &Operation) -> RouteTest {
    let mut url = op.path.clone();
    for p in &op.path_params {
        url = url.replace(&format!("{{{}}}", p.key), &p.sample);
    }
    let result = match op.response.as_ref().and_then(|r| r.schema.as_ref()) {
        Some(s) if s.many => "[]",
        Some(_) => "{}",
        None => "None",
    };
    let guard = guard(ctx, op);
    RouteTest {
        function: op.function.clone(),
        client_method: op.verb.to_lowercase(),
        url,
        body: op.body.as_ref().map(|b| b.sample.clone()),
        result: result.to_string(),
        status: op.status,
        checks: guard.as_ref().map(|g| g.checks.clone()).unwrap_or_default(),
        rejects_anonymous: guard.is_some_and(|g| g.rejects_anonymous),
    }
}
