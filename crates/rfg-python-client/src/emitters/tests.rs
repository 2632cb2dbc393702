use std::collections::BTreeSet;

use minijinja::context;
use rfg_core::{FacetTag, GeneratedFile, GeneratorError};
use rfg_python::templates::{python_env, render};
use rfg_python::{GenerationContext, Operation, operation_groups};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct MethodTest {
    function: String,
    verb: String,
    /// Expected path once the sample arguments are substituted.
    url: String,
    args: String,
    /// JSON the mocked transport answers with.
    payload: String,
    status: u16,
    sends_body: bool,
}

fn method_test(op: &Operation) -> MethodTest {
    let mut url = op.path.clone();
    for p in &op.path_params {
        url = url.replace(&format!("{{{}}}", p.key), &p.sample);
    }
    let mut args: Vec<String> = op
        .ordered_params()
        .into_iter()
        .filter(|p| p.required)
        .map(|p| format!("{}={}", p.name, p.value))
        .collect();
    if let Some(body) = &op.body {
        args.push(format!("body={}", body.value));
    }
    MethodTest {
        function: op.function.clone(),
        verb: op.verb.clone(),
        url,
        args: args.join(", "),
        payload: op
            .response
            .as_ref()
            .map_or_else(|| "None".to_string(), |r| r.sample.clone()),
        status: op.status,
        sends_body: op.body.is_some(),
    }
}

/// Emit `client/tests/`: one test per client method plus error mapping checks.
pub fn emit_tests(ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let operations: Vec<Operation> = operation_groups(ctx)
        .into_iter()
        .flat_map(|g| g.operations)
        .collect();
    let tests: Vec<MethodTest> = operations.iter().map(method_test).collect();

    let models: BTreeSet<String> = operations
        .iter()
        .filter_map(|op| op.body.as_ref()?.schema.as_ref())
        .map(|s| s.model.clone())
        .collect();
    let temporal: BTreeSet<String> = operations.iter().flat_map(|op| op.temporal.iter().cloned()).collect();

    let mut env = python_env();
    Ok(vec![
        GeneratedFile::new(
            "client/tests/__init__.py",
            include_str!("../../templates/tests_init.py.j2"),
            FacetTag::ClientTests,
        ),
        GeneratedFile::new(
            "client/tests/test_api_client.py",
            render(
                &mut env,
                "test_api_client.py.j2",
                include_str!("../../templates/test_api_client.py.j2"),
                context! {
                    first => tests.first(),
                    tests => &tests,
                    models => models,
                    temporal => temporal,
                },
            )?,
            FacetTag::ClientTests,
        ),
    ])
}
