use indexmap::IndexMap;
use serde_yaml_ng::Value;

use super::type_expr::TypeExpr;

/// A type declaration as written in the document: either the shorthand
/// expression form (`id: integer`) or the expanded map form.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDecl {
    Expr(TypeExpr),
    Full(Box<TypeDeclBody>),
}

impl TypeDecl {
    pub fn named(name: &str) -> Self {
        TypeDecl::Expr(TypeExpr::Name(name.to_string()))
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            TypeDecl::Expr(_) => None,
            TypeDecl::Full(body) => body.description.as_deref(),
        }
    }
}

/// The `type:` facet of an expanded declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeBase {
    Expr(TypeExpr),
    Inline(Box<TypeDecl>),
    /// `type: [A, B]` — multiple inheritance.
    Multiple(Vec<TypeExpr>),
}

/// The expanded map form of a type declaration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeDeclBody {
    pub base: Option<TypeBase>,
    pub description: Option<String>,
    pub properties: IndexMap<String, PropertyDecl>,
    pub items: Option<TypeDecl>,
    pub enum_values: Vec<String>,
    /// Property-level `required: true|false` (parameters and properties).
    pub required: Option<bool>,
    pub format: Option<String>,
    pub additional_properties: Option<bool>,
    pub example: Option<Value>,
}

impl TypeDeclBody {
    pub fn defines_properties(&self) -> bool {
        !self.properties.is_empty()
    }
}

/// A single property of an object type, with the `?` suffix already stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub decl: TypeDecl,
    pub required: bool,
}
