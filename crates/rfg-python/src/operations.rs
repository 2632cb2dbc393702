//! Per-method views shared by the server and client emitters.

use std::collections::{BTreeSet, HashSet};

use rfg_core::ir::grouping::group_resources;
use rfg_core::ir::{IrParameter, IrParameterLocation, MethodRef, TypeRef};
use rfg_core::transform::name_normalizer::unique_name;
use serde::Serialize;

use crate::generator::GenerationContext;
use crate::identifiers::{py_class, py_ident, py_str};
use crate::type_mapper::{ModelRef, PyShape, TypeMapper};

/// Methods of one top-level resource subtree.
#[derive(Debug, Clone, Serialize)]
pub struct OperationGroup {
    /// The literal path segment the group is named after, e.g. `books`.
    pub name: String,
    /// PascalCase stem, e.g. `Books`.
    pub class_stem: String,
    /// snake_case stem, e.g. `books`.
    pub module_stem: String,
    pub operations: Vec<Operation>,
}

impl OperationGroup {
    /// Models referenced by any operation in the group.
    pub fn model_refs(&self) -> Vec<ModelRef> {
        let refs: BTreeSet<ModelRef> = self
            .operations
            .iter()
            .flat_map(|op| op.model_refs.iter().cloned())
            .collect();
        refs.into_iter().collect()
    }

    pub fn temporal(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .operations
            .iter()
            .flat_map(|op| op.temporal.iter().cloned())
            .collect();
        names.into_iter().collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    /// snake_case function name, e.g. `list_books`.
    pub function: String,
    /// Upper-case HTTP verb.
    pub verb: String,
    /// Path template as declared, e.g. `/books/{bookId}`.
    pub path: String,
    pub summary: String,
    pub description: Option<String>,
    pub path_params: Vec<Param>,
    pub query_params: Vec<Param>,
    pub header_params: Vec<Param>,
    pub body: Option<Payload>,
    pub response: Option<Payload>,
    pub status: u16,
    pub secured_by: Vec<String>,
    pub allows_anonymous: bool,
    /// Every model the signature mentions.
    pub model_refs: Vec<ModelRef>,
    /// `datetime` names the signature mentions.
    pub temporal: Vec<String>,
}

impl Operation {
    /// Path, query, and header parameters, required ones first.
    pub fn ordered_params(&self) -> Vec<&Param> {
        let all = || {
            self.path_params
                .iter()
                .chain(&self.query_params)
                .chain(&self.header_params)
        };
        all().filter(|p| p.required).chain(all().filter(|p| !p.required)).collect()
    }

    /// Parameter list: required parameters, then `body`, then optional ones defaulting to `None`.
    pub fn signature(&self) -> String {
        self.arguments(
            |p| {
                if p.required {
                    format!("{}: {}", p.name, p.annotation)
                } else {
                    format!("{}: {} = None", p.name, p.annotation)
                }
            },
            |b| format!("body: {}", b.annotation),
        )
    }

    /// Keyword arguments forwarding every parameter of [`Operation::signature`].
    pub fn call_args(&self) -> String {
        self.arguments(|p| format!("{0}={0}", p.name), |_| "body=body".to_string())
    }

    fn arguments(&self, param: impl Fn(&Param) -> String, body: impl Fn(&Payload) -> String) -> String {
        let ordered = self.ordered_params();
        let required = ordered.iter().filter(|p| p.required).map(|p| param(p));
        let body = self.body.iter().map(body);
        let optional = ordered.iter().filter(|p| !p.required).map(|p| param(p));
        required.chain(body).chain(optional).collect::<Vec<_>>().join(", ")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    /// Python identifier.
    pub name: String,
    /// Name on the wire.
    pub key: String,
    pub annotation: String,
    pub required: bool,
    pub description: Option<String>,
    /// `int`, `float`, or `string`.
    pub converter: &'static str,
    /// Text substituted into the URL in generated tests.
    pub sample: String,
    /// Python value passed for the parameter in generated tests.
    pub value: String,
    /// Expression turning the Python value into a wire value.
    pub encode: String,
}

/// A request or response body.
#[derive(Debug, Clone, Serialize)]
pub struct Payload {
    pub annotation: String,
    /// Set when the body is a model or a list of models.
    pub schema: Option<SchemaUse>,
    /// Expression serializing the variable `body`.
    pub encode: String,
    /// Expression building the Python value from the variable `data`.
    pub decode: String,
    /// JSON sample as a Python literal.
    pub sample: String,
    /// Python value built from `sample`.
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaUse {
    pub model: String,
    pub model_module: String,
    pub class_name: String,
    pub module: String,
    pub many: bool,
}

/// Build the operation groups for every method in the IR.
pub fn operation_groups(ctx: &GenerationContext<'_>) -> Vec<OperationGroup> {
    group_resources(ctx.ir)
        .into_iter()
        .map(|group| OperationGroup {
            class_stem: py_class(&group.name.original),
            module_stem: py_ident(&group.name.original),
            name: group.name.original.clone(),
            operations: group
                .methods
                .iter()
                .map(|m| build_operation(ctx.types, m))
                .collect(),
        })
        .collect()
}

/// Names a parameter local must not take: the generated function's own locals
/// and the module-level names its body reads.
const RESERVED_LOCALS: &[&str] = &[
    "body", "result", "data", "self", "request", "jsonify", "bp", "require_any", "date",
    "datetime", "time",
];

/// Build the view of one method.
pub fn build_operation(types: &TypeMapper, m: &MethodRef<'_>) -> Operation {
    let method = m.method;
    let mut taken: HashSet<String> = RESERVED_LOCALS.iter().map(|s| s.to_string()).collect();
    let mut refs: BTreeSet<ModelRef> = BTreeSet::new();
    let mut temporal: BTreeSet<&'static str> = BTreeSet::new();

    let mut param = |p: &IrParameter| {
        let mapped = types.map(&p.type_ref);
        let value = match (&p.location, &mapped.shape) {
            (IrParameterLocation::Path, _) => path_value(mapped.converter),
            (_, PyShape::Temporal(kind)) => format!("{kind}.fromisoformat({})", types.sample(&p.type_ref)),
            _ => types.sample(&p.type_ref),
        };
        refs.extend(types.model_refs(&p.type_ref));
        temporal.extend(mapped.temporal_names());
        let name = unique_name(&py_ident(&p.original_name), &mut taken);
        Param {
            annotation: mapped.optional_annotation(p.required),
            encode: mapped.encode(&name, p.required),
            converter: mapped.converter,
            sample: path_sample(mapped.converter),
            value,
            key: p.original_name.clone(),
            required: p.required,
            description: p.description.clone(),
            name,
        }
    };
    let path_params: Vec<Param> = method.path_params().map(&mut param).collect();
    let query_params: Vec<Param> = method.query_params().map(&mut param).collect();
    let header_params: Vec<Param> = method.header_params().map(&mut param).collect();

    let mut payload = |type_ref: &TypeRef| {
        refs.extend(types.model_refs(type_ref));
        let mapped = types.map(type_ref);
        temporal.extend(mapped.temporal_names());
        let schema = match &mapped.shape {
            PyShape::Model(class) => schema_use(types, class, false),
            PyShape::List(inner) => match inner.as_ref() {
                PyShape::Model(class) => schema_use(types, class, true),
                _ => None,
            },
            _ => None,
        };
        let sample = types.sample(type_ref);
        Payload {
            annotation: mapped.optional_annotation(true),
            encode: mapped.encode("body", true),
            decode: mapped.decode_value("data"),
            value: mapped.decode_value(&sample),
            sample,
            schema,
        }
    };
    let body = method.body.as_ref().map(|b| payload(&b.type_ref));
    let response = method
        .success_response()
        .and_then(|r| r.body.as_ref())
        .map(|b| payload(&b.type_ref));

    let summary = method
        .display_name
        .clone()
        .or_else(|| {
            method
                .description
                .as_deref()
                .and_then(|d| d.lines().next())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("{} {}", method.verb, method.path));

    Operation {
        function: method.name.snake_case.clone(),
        verb: method.verb.as_str().to_string(),
        path: method.path.clone(),
        summary,
        description: method.description.clone(),
        path_params,
        query_params,
        header_params,
        body,
        response,
        status: method.success_status(),
        secured_by: method.secured_by.clone(),
        allows_anonymous: method.allows_anonymous,
        model_refs: refs.into_iter().collect(),
        temporal: temporal.into_iter().map(str::to_string).collect(),
    }
}

fn schema_use(types: &TypeMapper, class: &str, many: bool) -> Option<SchemaUse> {
    types.model_for_class(class).map(|model| SchemaUse {
        model: model.class_name.clone(),
        model_module: model.module.clone(),
        class_name: model.schema_class.clone(),
        module: model.schema_module.clone(),
        many,
    })
}

fn path_value(converter: &str) -> String {
    match converter {
        "int" | "float" => path_sample(converter),
        _ => py_str(&path_sample(converter)),
    }
}

fn path_sample(converter: &str) -> String {
    match converter {
        "int" => "1".to_string(),
        "float" => "1.5".to_string(),
        _ => "sample".to_string(),
    }
}
