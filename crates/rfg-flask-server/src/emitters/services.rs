use minijinja::context;
use rfg_core::{FacetTag, GeneratedFile, GeneratorError};
use rfg_python::templates::{python_env, render};
use rfg_python::{GenerationContext, ModelRef, OperationGroup, operation_groups};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct ServiceView {
    name: String,
    class_name: String,
    module: String,
    refs: Vec<ModelRef>,
    temporal: Vec<String>,
    methods: Vec<ServiceMethod>,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceMethod {
    function: String,
    verb: String,
    path: String,
    summary: String,
    signature: String,
    returns: String,
}

pub fn service_class(group: &OperationGroup) -> String {
    format!("{}Service", group.class_stem)
}

pub fn service_module(group: &OperationGroup) -> String {
    format!("{}_service", group.module_stem)
}

/// Emit `app/services/`: one stub class per resource group.
pub fn emit_services(ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let services: Vec<ServiceView> = operation_groups(ctx).iter().map(service_view).collect();
    let mut env = python_env();
    let mut files = Vec::with_capacity(services.len() + 1);

    files.push(GeneratedFile::new(
        "app/services/__init__.py",
        render(
            &mut env,
            "services_init.py.j2",
            include_str!("../../templates/services_init.py.j2"),
            context! { services => &services },
        )?,
        FacetTag::Services,
    ));

    for service in &services {
        files.push(GeneratedFile::new(
            format!("app/services/{}.py", service.module),
            render(
                &mut env,
                "service.py.j2",
                include_str!("../../templates/service.py.j2"),
                context! { service => service },
            )?,
            FacetTag::Services,
        ));
    }

    Ok(files)
}

fn service_view(group: &OperationGroup) -> ServiceView {
    ServiceView {
        name: group.name.clone(),
        class_name: service_class(group),
        module: service_module(group),
        refs: group.model_refs(),
        temporal: group.temporal(),
        methods: group
            .operations
            .iter()
            .map(|op| ServiceMethod {
                function: op.function.clone(),
                verb: op.verb.clone(),
                path: op.path.clone(),
                summary: op.summary.clone(),
                signature: op.signature(),
                returns: op
                    .response
                    .as_ref()
                    .map(|r| r.annotation.clone())
                    .unwrap_or_else(|| "None".to_string()),
            })
            .collect(),
    }
}
