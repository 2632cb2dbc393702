//! IR types → Python descriptors.
//!
//! Every object type becomes one flattened [`PyModel`]: its parent chain is
//! walked root-first and a field redeclared lower in the chain replaces the
//! inherited one in place. Named non-object types (aliases, arrays, unions)
//! are expanded wherever they are used.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use rfg_core::ir::{IrField, IrSpec, IrTypeDef, IrTypeKind, IrWarning, PrimitiveKind, TypeRef};
use rfg_core::transform::name_normalizer::unique_name;
use serde::Serialize;

use crate::identifiers::{py_class, py_ident, py_module, py_str};

/// Past this depth a self-referential alias maps to `Any`.
const MAX_DEPTH: usize = 16;
/// Nesting limit for sample values of recursive models.
const SAMPLE_DEPTH: usize = 3;
/// Field names that would shadow generated model methods.
const RESERVED_FIELDS: [&str; 2] = ["to_dict", "from_dict"];

/// A marshmallow field constructor, rendered with per-use keyword arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub ctor: String,
    pub args: Vec<String>,
}

impl SchemaField {
    fn plain(ctor: &str) -> Self {
        Self {
            ctor: ctor.to_string(),
            args: Vec::new(),
        }
    }

    fn with_arg(ctor: &str, arg: String) -> Self {
        Self {
            ctor: ctor.to_string(),
            args: vec![arg],
        }
    }

    /// `fields.List(fields.Integer(), required=True)`.
    pub fn render(&self, kwargs: &[String]) -> String {
        let all: Vec<&str> = self
            .args
            .iter()
            .chain(kwargs.iter())
            .map(String::as_str)
            .collect();
        format!("{}({})", self.ctor, all.join(", "))
    }
}

/// How a value crosses the JSON boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PyShape {
    /// Passed through unchanged.
    Plain,
    /// `date`, `datetime`, or `time`, exchanged as ISO 8601 text.
    Temporal(&'static str),
    /// A generated model class.
    Model(String),
    List(Box<PyShape>),
}

impl PyShape {
    fn is_plain(&self) -> bool {
        match self {
            PyShape::Plain => true,
            PyShape::List(inner) => inner.is_plain(),
            _ => false,
        }
    }

    fn encode(&self, expr: &str, depth: usize) -> String {
        match self {
            PyShape::Plain => expr.to_string(),
            PyShape::Temporal(_) => format!("{expr}.isoformat()"),
            PyShape::Model(_) => format!("{expr}.to_dict()"),
            PyShape::List(inner) if inner.is_plain() => expr.to_string(),
            PyShape::List(inner) => {
                let item = format!("item{depth}");
                format!("[{} for {item} in {expr}]", inner.encode(&item, depth + 1))
            }
        }
    }

    fn decode(&self, expr: &str, depth: usize) -> String {
        match self {
            PyShape::Plain => expr.to_string(),
            PyShape::Temporal(kind) => format!("{kind}.fromisoformat({expr})"),
            PyShape::Model(class) => format!("{class}.from_dict({expr})"),
            PyShape::List(inner) if inner.is_plain() => expr.to_string(),
            PyShape::List(inner) => {
                let item = format!("item{depth}");
                format!("[{} for {item} in {expr}]", inner.decode(&item, depth + 1))
            }
        }
    }

    fn temporal(&self, out: &mut BTreeSet<&'static str>) {
        match self {
            PyShape::Temporal(kind) => {
                out.insert(kind);
            }
            PyShape::List(inner) => inner.temporal(out),
            _ => {}
        }
    }
}

/// The Python rendition of one IR type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyType {
    /// Type annotation, e.g. `list[Book]`.
    pub annotation: String,
    pub schema_field: SchemaField,
    /// Flask URL converter for path parameters: `int`, `float`, or `string`.
    pub converter: &'static str,
    pub shape: PyShape,
    /// `nil` was one of the union members.
    pub nullable: bool,
    /// Allowed values inherited from a named enum type.
    pub enum_values: Vec<String>,
    /// Model classes mentioned in the annotation.
    pub refs: Vec<String>,
}

impl PyType {
    fn simple(annotation: &str, field: &str, converter: &'static str) -> Self {
        Self {
            annotation: annotation.to_string(),
            schema_field: SchemaField::plain(field),
            converter,
            shape: PyShape::Plain,
            nullable: false,
            enum_values: Vec::new(),
            refs: Vec::new(),
        }
    }

    fn primitive(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::String => Self::simple("str", "fields.String", "string"),
            PrimitiveKind::Integer => Self::simple("int", "fields.Integer", "int"),
            PrimitiveKind::Number => Self::simple("float", "fields.Float", "float"),
            PrimitiveKind::Boolean => Self::simple("bool", "fields.Boolean", "string"),
            PrimitiveKind::File => Self::simple("str", "fields.Raw", "string"),
            PrimitiveKind::Date => Self::temporal("date", "fields.Date"),
            PrimitiveKind::DateTime => Self::temporal("datetime", "fields.DateTime"),
            PrimitiveKind::Time => Self::temporal("time", "fields.Time"),
        }
    }

    fn temporal(kind: &'static str, field: &str) -> Self {
        Self {
            shape: PyShape::Temporal(kind),
            ..Self::simple(kind, field, "string")
        }
    }

    fn model(class: &str) -> Self {
        Self {
            annotation: class.to_string(),
            schema_field: SchemaField::with_arg("fields.Nested", py_str(&format!("{class}Schema"))),
            converter: "string",
            shape: PyShape::Model(class.to_string()),
            nullable: false,
            enum_values: Vec::new(),
            refs: vec![class.to_string()],
        }
    }

    fn any() -> Self {
        Self::simple("Any", "fields.Raw", "string")
    }

    fn list_of(inner: PyType) -> Self {
        Self {
            annotation: format!("list[{}]", inner.annotation),
            schema_field: SchemaField::with_arg("fields.List", inner.schema_field.render(&[])),
            converter: "string",
            shape: PyShape::List(Box::new(inner.shape)),
            nullable: false,
            enum_values: Vec::new(),
            refs: inner.refs,
        }
    }

    /// `datetime` module names the annotation uses.
    pub fn temporal_names(&self) -> Vec<&'static str> {
        let mut out = BTreeSet::new();
        self.shape.temporal(&mut out);
        out.into_iter().collect()
    }

    /// Annotation with `| None` appended when the value may be absent.
    pub fn optional_annotation(&self, required: bool) -> String {
        if (!required || self.nullable) && self.annotation != "None" && self.annotation != "Any" {
            format!("{} | None", self.annotation)
        } else {
            self.annotation.clone()
        }
    }

    /// Expression converting `expr` to a JSON-compatible value.
    pub fn encode(&self, expr: &str, required: bool) -> String {
        let encoded = self.shape.encode(expr, 0);
        if encoded == expr || (required && !self.nullable) {
            encoded
        } else {
            format!("None if {expr} is None else {encoded}")
        }
    }

    /// Expression building the Python value from the JSON value `expr`.
    pub fn decode_value(&self, expr: &str) -> String {
        self.shape.decode(expr, 0)
    }

    /// Expression building the Python value from JSON `data[key]`.
    pub fn decode(&self, data: &str, key: &str, required: bool) -> String {
        let key = py_str(key);
        if required && !self.nullable {
            return self.shape.decode(&format!("{data}[{key}]"), 0);
        }
        let raw = format!("{data}.get({key})");
        let decoded = self.shape.decode(&format!("{data}[{key}]"), 0);
        if self.shape.is_plain() {
            raw
        } else {
            format!("None if {raw} is None else {decoded}")
        }
    }
}

/// A reference to a generated model class and the module that defines it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ModelRef {
    pub class_name: String,
    pub module: String,
}

/// One object type, inheritance flattened, ready for templates.
#[derive(Debug, Clone, Serialize)]
pub struct PyModel {
    /// IR type name.
    pub type_name: String,
    pub class_name: String,
    pub module: String,
    pub schema_class: String,
    pub schema_module: String,
    pub description: Option<String>,
    pub fields: Vec<PyField>,
    /// Other models the fields mention.
    pub refs: Vec<ModelRef>,
    /// Names to import from `datetime`.
    pub temporal: Vec<String>,
    /// Some field validates against an enum.
    pub has_enums: bool,
    pub synthesized: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PyField {
    /// Python attribute name.
    pub name: String,
    /// JSON key.
    pub key: String,
    pub annotation: String,
    pub required: bool,
    pub description: Option<String>,
    /// Complete marshmallow field expression.
    pub schema_field: String,
    /// Expression serializing `self.<name>`.
    pub to_json: String,
    /// Expression reading the value from `data`.
    pub from_json: String,
    pub enum_values: Vec<String>,
}

/// Maps IR types to Python, once per run.
///
/// Named types and models are computed eagerly at construction; anonymous
/// references are composed from them on demand.
#[derive(Debug, Clone)]
pub struct TypeMapper {
    types: IndexMap<String, IrTypeDef>,
    named: IndexMap<String, PyType>,
    models: IndexMap<String, PyModel>,
    warnings: Vec<IrWarning>,
}

impl TypeMapper {
    pub fn new(ir: &IrSpec) -> Self {
        let mut mapper = Self {
            types: ir.types.clone(),
            named: IndexMap::new(),
            models: IndexMap::new(),
            warnings: Vec::new(),
        };
        let mut warnings = Warnings::default();

        for (name, def) in &ir.types {
            let mapped = mapper.map_def(def, 0, &mut warnings.at(&format!("type {name}")));
            mapper.named.insert(name.clone(), mapped);
        }
        for def in ir.object_types() {
            let model = mapper.build_model(def, &mut warnings);
            mapper.models.insert(def.name.original.clone(), model);
        }
        for m in ir.all_methods() {
            let context = format!("{} {}", m.method.verb, m.method.path);
            let mut sink = warnings.at(&context);
            for param in &m.method.parameters {
                mapper.map_ref(&param.type_ref, 0, &mut sink);
            }
            if let Some(body) = &m.method.body {
                mapper.map_ref(&body.type_ref, 0, &mut sink);
            }
            for response in &m.method.responses {
                if let Some(body) = &response.body {
                    mapper.map_ref(&body.type_ref, 0, &mut sink);
                }
            }
        }

        mapper.warnings = warnings.collected;
        log::debug!(
            "mapped {} named types into {} models",
            mapper.named.len(),
            mapper.models.len()
        );
        mapper
    }

    /// Map a type reference.
    pub fn map(&self, type_ref: &TypeRef) -> PyType {
        self.map_ref(type_ref, 0, &mut Sink::Discard)
    }

    pub fn named(&self, name: &str) -> Option<&PyType> {
        self.named.get(name)
    }

    pub fn model(&self, type_name: &str) -> Option<&PyModel> {
        self.models.get(type_name)
    }

    /// Models in type declaration order.
    pub fn models(&self) -> impl Iterator<Item = &PyModel> {
        self.models.values()
    }

    /// Degraded mappings (e.g. unions without a common field type).
    pub fn warnings(&self) -> &[IrWarning] {
        &self.warnings
    }

    /// Model classes a type reference mentions, with their modules.
    pub fn model_refs(&self, type_ref: &TypeRef) -> Vec<ModelRef> {
        let mut refs: Vec<ModelRef> = self
            .map(type_ref)
            .refs
            .iter()
            .filter_map(|class| self.model_ref(class))
            .collect();
        refs.sort();
        refs.dedup();
        refs
    }

    /// The model generated under `class_name`.
    pub fn model_for_class(&self, class_name: &str) -> Option<&PyModel> {
        self.models.values().find(|m| m.class_name == class_name)
    }

    fn model_ref(&self, class: &str) -> Option<ModelRef> {
        self.model_for_class(class).map(|m| ModelRef {
            class_name: m.class_name.clone(),
            module: m.module.clone(),
        })
    }

    /// A Python literal that the generated schema accepts for this type.
    pub fn sample(&self, type_ref: &TypeRef) -> String {
        self.sample_at(type_ref, 0)
    }

    fn sample_at(&self, type_ref: &TypeRef, depth: usize) -> String {
        match type_ref {
            TypeRef::Primitive(kind) => primitive_sample(*kind).to_string(),
            TypeRef::Array(_) => "[]".to_string(),
            TypeRef::AnyObject => "{}".to_string(),
            TypeRef::Any => py_str("value"),
            TypeRef::Nil => "None".to_string(),
            TypeRef::Union(members) => {
                let non_nil: Vec<&TypeRef> = members.iter().filter(|m| **m != TypeRef::Nil).collect();
                let widest = non_nil.iter().find(|m| **m == &TypeRef::Primitive(PrimitiveKind::Number));
                match widest.or(non_nil.first()) {
                    Some(member) => self.sample_at(member, depth),
                    None => "None".to_string(),
                }
            }
            TypeRef::Named(name) => {
                if depth > MAX_DEPTH {
                    return "None".to_string();
                }
                let Some(def) = self.types.get(name) else {
                    return "None".to_string();
                };
                if let Some(first) = def.enum_values.first() {
                    return py_str(first);
                }
                match &def.kind {
                    IrTypeKind::Object(_) => self.model_sample(name, depth),
                    IrTypeKind::Primitive(kind) => primitive_sample(*kind).to_string(),
                    IrTypeKind::Array(_) => "[]".to_string(),
                    IrTypeKind::Union(members) => self.sample_at(&TypeRef::Union(members.clone()), depth + 1),
                    IrTypeKind::Alias(target) => self.sample_at(target, depth + 1),
                }
            }
        }
    }

    fn model_sample(&self, name: &str, depth: usize) -> String {
        let Some(model) = self.models.get(name) else {
            return "{}".to_string();
        };
        if depth >= SAMPLE_DEPTH {
            return "{}".to_string();
        }
        let Some(fields) = self.flattened_ir_fields(name) else {
            return "{}".to_string();
        };
        let entries: Vec<String> = fields
            .iter()
            .zip(&model.fields)
            .filter(|(_, py)| py.required)
            .map(|(ir, py)| {
                let value = match py.enum_values.first() {
                    Some(first) => py_str(first),
                    None => self.sample_at(&ir.type_ref, depth + 1),
                };
                format!("{}: {value}", py_str(&py.key))
            })
            .collect();
        format!("{{{}}}", entries.join(", "))
    }

    fn map_ref(&self, type_ref: &TypeRef, depth: usize, sink: &mut Sink<'_>) -> PyType {
        if depth > MAX_DEPTH {
            return PyType::any();
        }
        match type_ref {
            TypeRef::Primitive(kind) => PyType::primitive(*kind),
            TypeRef::Array(inner) => PyType::list_of(self.map_ref(inner, depth + 1, sink)),
            TypeRef::AnyObject => PyType::simple("dict[str, Any]", "fields.Dict", "string"),
            TypeRef::Any => PyType::any(),
            TypeRef::Nil => PyType {
                nullable: true,
                ..PyType::simple("None", "fields.Raw", "string")
            },
            TypeRef::Union(members) => self.map_union(members, depth, sink),
            TypeRef::Named(name) => {
                if let Some(mapped) = self.named.get(name) {
                    return mapped.clone();
                }
                match self.types.get(name) {
                    Some(def) => self.map_def(def, depth + 1, sink),
                    None => PyType::any(),
                }
            }
        }
    }

    fn map_def(&self, def: &IrTypeDef, depth: usize, sink: &mut Sink<'_>) -> PyType {
        let mut mapped = match &def.kind {
            IrTypeKind::Object(_) => PyType::model(&py_class(&def.name.original)),
            IrTypeKind::Primitive(kind) => PyType::primitive(*kind),
            IrTypeKind::Array(item) => PyType::list_of(self.map_ref(item, depth + 1, sink)),
            IrTypeKind::Union(members) => self.map_union(members, depth, sink),
            IrTypeKind::Alias(target) => self.map_ref(target, depth + 1, sink),
        };
        if !def.enum_values.is_empty() {
            mapped.enum_values = def.enum_values.clone();
        }
        mapped
    }

    /// Unions collapse to one member when they can; otherwise any member shape is accepted.
    fn map_union(&self, members: &[TypeRef], depth: usize, sink: &mut Sink<'_>) -> PyType {
        let nullable = members.contains(&TypeRef::Nil);
        let mapped: Vec<PyType> = members
            .iter()
            .filter(|m| **m != TypeRef::Nil)
            .map(|m| self.map_ref(m, depth + 1, sink))
            .collect();

        let Some(first) = mapped.first() else {
            return self.map_ref(&TypeRef::Nil, depth, sink);
        };

        let mut collapsed = if mapped.iter().all(|m| m.annotation == first.annotation) {
            first.clone()
        } else if mapped.iter().all(|m| m.annotation == "int" || m.annotation == "float") {
            PyType::primitive(PrimitiveKind::Number)
        } else {
            let mut annotations: Vec<&str> = Vec::new();
            let mut refs: Vec<String> = Vec::new();
            for m in &mapped {
                if !annotations.contains(&m.annotation.as_str()) {
                    annotations.push(&m.annotation);
                }
                for r in &m.refs {
                    if !refs.contains(r) {
                        refs.push(r.clone());
                    }
                }
            }
            let annotation = annotations.join(" | ");
            sink.warn(format!(
                "union `{annotation}` has no single Python field type; any member shape is accepted"
            ));
            PyType {
                annotation,
                refs,
                ..PyType::any()
            }
        };
        collapsed.nullable |= nullable;
        collapsed
    }

    fn flattened_ir_fields(&self, name: &str) -> Option<Vec<&IrField>> {
        let mut chain: Vec<&str> = Vec::new();
        let mut current = Some(name);
        while let Some(type_name) = current {
            if chain.contains(&type_name) {
                break;
            }
            let object = self.types.get(type_name)?.as_object()?;
            chain.push(type_name);
            current = object.parent.as_deref();
        }

        let mut fields: Vec<&IrField> = Vec::new();
        for type_name in chain.iter().rev() {
            let Some(object) = self.types.get(*type_name).and_then(IrTypeDef::as_object) else {
                continue;
            };
            for field in &object.fields {
                match fields.iter().position(|f| f.original_name == field.original_name) {
                    Some(pos) => fields[pos] = field,
                    None => fields.push(field),
                }
            }
        }
        Some(fields)
    }

    fn build_model(&self, def: &IrTypeDef, warnings: &mut Warnings) -> PyModel {
        let class_name = py_class(&def.name.original);
        let module = py_module(&class_name);
        let ir_fields = self
            .flattened_ir_fields(&def.name.original)
            .unwrap_or_default();

        let mut taken: HashSet<String> = HashSet::new();
        let mut refs: BTreeSet<String> = BTreeSet::new();
        let mut temporal: BTreeSet<&'static str> = BTreeSet::new();
        let mut fields = Vec::with_capacity(ir_fields.len());

        for field in ir_fields {
            let context = format!("{}.{}", def.name.original, field.original_name);
            let mapped = self.map_ref(&field.type_ref, 0, &mut warnings.at(&context));
            mapped.shape.temporal(&mut temporal);
            refs.extend(mapped.refs.iter().filter(|r| **r != class_name).cloned());

            let mut name = py_ident(&field.original_name);
            if RESERVED_FIELDS.contains(&name.as_str()) {
                name.push('_');
            }
            let name = unique_name(&name, &mut taken);

            let enum_values = if field.enum_values.is_empty() {
                mapped.enum_values.clone()
            } else {
                field.enum_values.clone()
            };

            let mut kwargs = Vec::new();
            if field.required {
                kwargs.push("required=True".to_string());
            }
            if !field.required || mapped.nullable {
                kwargs.push("allow_none=True".to_string());
            }
            if name != field.original_name {
                kwargs.push(format!("data_key={}", py_str(&field.original_name)));
            }
            if !enum_values.is_empty() && mapped.shape == PyShape::Plain {
                let values: Vec<String> = enum_values.iter().map(|v| py_str(v)).collect();
                kwargs.push(format!("validate=validate.OneOf([{}])", values.join(", ")));
            }

            fields.push(PyField {
                annotation: mapped.optional_annotation(field.required),
                to_json: mapped.encode(&format!("self.{name}"), field.required),
                from_json: mapped.decode("data", &field.original_name, field.required),
                schema_field: mapped.schema_field.render(&kwargs),
                key: field.original_name.clone(),
                required: field.required,
                description: field.description.clone(),
                enum_values: if mapped.shape == PyShape::Plain { enum_values } else { Vec::new() },
                name,
            });
        }

        PyModel {
            type_name: def.name.original.clone(),
            schema_class: format!("{class_name}Schema"),
            schema_module: format!("{module}_schema"),
            refs: refs
                .into_iter()
                .map(|class| ModelRef {
                    module: py_module(&class),
                    class_name: class,
                })
                .collect(),
            temporal: temporal.into_iter().map(str::to_string).collect(),
            has_enums: fields.iter().any(|f| !f.enum_values.is_empty()),
            description: def.description.clone(),
            synthesized: def.synthesized,
            class_name,
            module,
            fields,
        }
    }
}

fn primitive_sample(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::String | PrimitiveKind::File => "\"string\"",
        PrimitiveKind::Integer => "1",
        PrimitiveKind::Number => "1.5",
        PrimitiveKind::Boolean => "True",
        PrimitiveKind::Date => "\"2024-01-01\"",
        PrimitiveKind::DateTime => "\"2024-01-01T00:00:00\"",
        PrimitiveKind::Time => "\"12:00:00\"",
    }
}

/// Collects mapping warnings, each once.
#[derive(Default)]
struct Warnings {
    collected: Vec<IrWarning>,
}

impl Warnings {
    fn at<'w>(&'w mut self, location: &str) -> Sink<'w> {
        Sink::Collect {
            location: location.to_string(),
            warnings: self,
        }
    }
}

enum Sink<'w> {
    Discard,
    Collect {
        location: String,
        warnings: &'w mut Warnings,
    },
}

impl Sink<'_> {
    fn warn(&mut self, message: String) {
        if let Sink::Collect { location, warnings } = self {
            let warning = IrWarning::new(location.clone(), message);
            if !warnings.collected.contains(&warning) {
                log::warn!("{warning}");
                warnings.collected.push(warning);
            }
        }
    }
}
