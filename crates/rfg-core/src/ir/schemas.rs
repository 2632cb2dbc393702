use serde::Serialize;

use super::types::NormalizedName;

/// A named type in the IR.
#[derive(Debug, Clone, Serialize)]
pub struct IrTypeDef {
    pub name: NormalizedName,
    pub description: Option<String>,
    pub kind: IrTypeKind,
    pub enum_values: Vec<String>,
    /// Example value rendered as JSON.
    pub example: Option<String>,
    /// True for types named after their inline declaration site.
    pub synthesized: bool,
}

impl IrTypeDef {
    pub fn as_object(&self) -> Option<&IrObject> {
        match &self.kind {
            IrTypeKind::Object(object) => Some(object),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum IrTypeKind {
    Primitive(PrimitiveKind),
    Object(IrObject),
    Array(TypeRef),
    Union(Vec<TypeRef>),
    /// Another name for an existing type, e.g. `Email: string` refined by facets.
    Alias(TypeRef),
}

/// An object type's own fields plus its single parent, not yet flattened.
#[derive(Debug, Clone, Serialize)]
pub struct IrObject {
    pub fields: Vec<IrField>,
    /// PascalCase name of the parent object type.
    pub parent: Option<String>,
    pub additional_properties: bool,
}

/// A field on an object type.
#[derive(Debug, Clone, Serialize)]
pub struct IrField {
    pub name: NormalizedName,
    pub original_name: String,
    pub type_ref: TypeRef,
    pub required: bool,
    pub description: Option<String>,
    pub enum_values: Vec<String>,
}

/// A resolved type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "ref", content = "of", rename_all = "snake_case")]
pub enum TypeRef {
    /// Reference to a named type (PascalCase key of `IrSpec::types`).
    Named(String),
    Primitive(PrimitiveKind),
    Array(Box<TypeRef>),
    Union(Vec<TypeRef>),
    /// `object` with no declared properties.
    AnyObject,
    Any,
    Nil,
}

impl TypeRef {
    /// Every named type this reference mentions.
    pub fn named_types(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeRef::Named(name) => out.push(name),
            TypeRef::Array(inner) => inner.collect_names(out),
            TypeRef::Union(members) => members.iter().for_each(|m| m.collect_names(out)),
            _ => {}
        }
    }
}

/// RAML scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    DateTime,
    Time,
    File,
}

impl PrimitiveKind {
    /// Look up a RAML built-in scalar type name.
    pub fn from_raml(name: &str) -> Option<Self> {
        match name {
            "string" => Some(PrimitiveKind::String),
            "number" => Some(PrimitiveKind::Number),
            "integer" => Some(PrimitiveKind::Integer),
            "boolean" => Some(PrimitiveKind::Boolean),
            "date-only" | "date" => Some(PrimitiveKind::Date),
            "datetime" | "datetime-only" => Some(PrimitiveKind::DateTime),
            "time-only" => Some(PrimitiveKind::Time),
            "file" => Some(PrimitiveKind::File),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PrimitiveKind::Number | PrimitiveKind::Integer)
    }
}
