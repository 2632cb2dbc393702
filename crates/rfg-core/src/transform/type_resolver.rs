use std::collections::HashSet;

use indexmap::IndexMap;

use super::name_normalizer::{normalize_name, unique_name};
use crate::error::{ParseError, ResolveError, TransformError};
use crate::ir::{IrField, IrObject, IrTypeDef, IrTypeKind, PrimitiveKind, TypeRef};
use crate::parse::type_expr::TypeExpr;
use crate::parse::types::{PropertyDecl, TypeBase, TypeDecl, TypeDeclBody};

/// Turns RAML type declarations into IR type definitions.
///
/// Declared types keep their declaration order; inline object types met while
/// resolving are synthesized under a name derived from where they appear and
/// appended after them.
pub struct TypeResolver<'a> {
    decls: &'a IndexMap<String, TypeDecl>,
    /// RAML name → unique PascalCase name.
    names: IndexMap<String, String>,
    types: IndexMap<String, IrTypeDef>,
    taken: HashSet<String>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(decls: &'a IndexMap<String, TypeDecl>) -> Result<Self, TransformError> {
        let mut taken = HashSet::new();
        let names = decls
            .keys()
            .map(|raml| (raml.clone(), unique_name(&normalize_name(raml).pascal_case, &mut taken)))
            .collect();
        let resolver = Self {
            decls,
            names,
            types: IndexMap::new(),
            taken,
        };
        resolver.check_inheritance()?;
        Ok(resolver)
    }

    /// Build every declared type.
    pub fn resolve_declared(&mut self) -> Result<(), TransformError> {
        // Reserve positions so declared types precede synthesized ones.
        for pascal in self.names.values() {
            self.types.insert(pascal.clone(), placeholder(pascal));
        }
        for (raml, decl) in self.decls {
            let pascal = self.names[raml].clone();
            let def = self.build_typedef(&pascal, decl, false, &format!("type {raml}"))?;
            self.types.insert(pascal, def);
        }
        Ok(())
    }

    pub fn finish(self) -> IndexMap<String, IrTypeDef> {
        self.types
    }

    /// Resolve a type usage, synthesizing a named type for inline objects.
    pub fn resolve_ref(
        &mut self,
        decl: &TypeDecl,
        hint: &str,
        context: &str,
    ) -> Result<TypeRef, TransformError> {
        let body = match decl {
            TypeDecl::Expr(expr) => return self.ref_from_expr(expr, context),
            TypeDecl::Full(body) => body,
        };

        if body.defines_properties() {
            let name = unique_name(hint, &mut self.taken);
            let def = self.build_typedef(&name, decl, true, context)?;
            self.types.insert(name.clone(), def);
            return Ok(TypeRef::Named(name));
        }

        match &body.base {
            None => match &body.items {
                Some(items) => Ok(TypeRef::Array(Box::new(self.resolve_ref(
                    items,
                    &format!("{hint}Item"),
                    context,
                )?))),
                None => Ok(TypeRef::Primitive(PrimitiveKind::String)),
            },
            Some(TypeBase::Expr(TypeExpr::Name(name))) if name == "array" => {
                let items = match &body.items {
                    Some(items) => self.resolve_ref(items, &format!("{hint}Item"), context)?,
                    None => TypeRef::Any,
                };
                Ok(TypeRef::Array(Box::new(items)))
            }
            Some(TypeBase::Expr(expr)) => self.ref_from_expr(expr, context),
            Some(TypeBase::Inline(inner)) => self.resolve_ref(inner, hint, context),
            Some(TypeBase::Multiple(_)) => Err(multiple_inheritance(context)),
        }
    }

    fn ref_from_expr(&self, expr: &TypeExpr, context: &str) -> Result<TypeRef, TransformError> {
        match expr {
            TypeExpr::Name(name) => {
                if let Some(pascal) = self.names.get(name) {
                    return Ok(TypeRef::Named(pascal.clone()));
                }
                if let Some(kind) = PrimitiveKind::from_raml(name) {
                    return Ok(TypeRef::Primitive(kind));
                }
                match name.as_str() {
                    "any" => Ok(TypeRef::Any),
                    "nil" | "null" => Ok(TypeRef::Nil),
                    "object" => Ok(TypeRef::AnyObject),
                    "array" => Ok(TypeRef::Array(Box::new(TypeRef::Any))),
                    _ => Err(ResolveError::UnresolvedType {
                        type_name: name.clone(),
                        context: context.to_string(),
                    }
                    .into()),
                }
            }
            TypeExpr::Array(inner) => Ok(TypeRef::Array(Box::new(self.ref_from_expr(inner, context)?))),
            TypeExpr::Union(members) => members
                .iter()
                .map(|m| self.ref_from_expr(m, context))
                .collect::<Result<Vec<_>, _>>()
                .map(TypeRef::Union),
        }
    }

    fn build_typedef(
        &mut self,
        pascal: &str,
        decl: &TypeDecl,
        synthesized: bool,
        context: &str,
    ) -> Result<IrTypeDef, TransformError> {
        let (kind, enum_values, example) = match decl {
            TypeDecl::Expr(expr) => (self.kind_from_expr(expr, context)?, Vec::new(), None),
            TypeDecl::Full(body) => (
                self.kind_from_body(pascal, body, context)?,
                body.enum_values.clone(),
                body.example
                    .as_ref()
                    .and_then(|v| serde_json::to_string(v).ok()),
            ),
        };
        Ok(IrTypeDef {
            name: normalize_name(pascal),
            description: decl.description().map(str::to_string),
            kind,
            enum_values,
            example,
            synthesized,
        })
    }

    fn kind_from_expr(&self, expr: &TypeExpr, context: &str) -> Result<IrTypeKind, TransformError> {
        if let TypeExpr::Name(name) = expr {
            if name == "object" {
                return Ok(IrTypeKind::Object(IrObject {
                    fields: Vec::new(),
                    parent: None,
                    additional_properties: true,
                }));
            }
            if self.is_object_name(name) {
                return Ok(IrTypeKind::Object(IrObject {
                    fields: Vec::new(),
                    parent: self.names.get(name).cloned(),
                    additional_properties: true,
                }));
            }
        }
        Ok(match self.ref_from_expr(expr, context)? {
            TypeRef::Primitive(kind) => IrTypeKind::Primitive(kind),
            TypeRef::Array(inner) => IrTypeKind::Array(*inner),
            TypeRef::Union(members) => IrTypeKind::Union(members),
            other => IrTypeKind::Alias(other),
        })
    }

    fn kind_from_body(
        &mut self,
        pascal: &str,
        body: &TypeDeclBody,
        context: &str,
    ) -> Result<IrTypeKind, TransformError> {
        let fields = self.build_fields(pascal, &body.properties)?;
        let additional_properties = body.additional_properties.unwrap_or(true);
        let object = |fields: Vec<IrField>, parent: Option<String>| {
            IrTypeKind::Object(IrObject {
                fields,
                parent,
                additional_properties,
            })
        };

        match &body.base {
            Some(TypeBase::Multiple(_)) => Err(multiple_inheritance(context)),
            None if !fields.is_empty() => Ok(object(fields, None)),
            None => match &body.items {
                Some(items) => {
                    let item = self.resolve_ref(items, &format!("{pascal}Item"), context)?;
                    Ok(IrTypeKind::Array(item))
                }
                None => Ok(IrTypeKind::Primitive(PrimitiveKind::String)),
            },
            Some(TypeBase::Expr(TypeExpr::Name(name))) if name == "object" => Ok(object(fields, None)),
            Some(TypeBase::Expr(TypeExpr::Name(name))) if name == "array" => {
                let item = match &body.items {
                    Some(items) => self.resolve_ref(items, &format!("{pascal}Item"), context)?,
                    None => TypeRef::Any,
                };
                Ok(IrTypeKind::Array(item))
            }
            Some(TypeBase::Expr(TypeExpr::Name(name))) if self.is_object_name(name) => {
                Ok(object(fields, self.names.get(name).cloned()))
            }
            Some(TypeBase::Expr(expr)) => {
                if !fields.is_empty() {
                    return Err(ParseError::structure(context, "properties declared on a non-object type").into());
                }
                self.kind_from_expr(expr, context)
            }
            Some(TypeBase::Inline(inner)) => {
                if fields.is_empty() {
                    let def = self.build_typedef(pascal, inner, true, context)?;
                    return Ok(def.kind);
                }
                match self.resolve_ref(inner, &format!("{pascal}Base"), context)? {
                    TypeRef::Named(parent) if self.types.get(&parent).is_some_and(|t| t.as_object().is_some()) => {
                        Ok(object(fields, Some(parent)))
                    }
                    TypeRef::AnyObject => Ok(object(fields, None)),
                    _ => Err(ParseError::structure(context, "properties declared on a non-object type").into()),
                }
            }
        }
    }

    fn build_fields(
        &mut self,
        owner: &str,
        properties: &IndexMap<String, PropertyDecl>,
    ) -> Result<Vec<IrField>, TransformError> {
        let mut fields = Vec::with_capacity(properties.len());
        for (original, prop) in properties {
            let name = normalize_name(original);
            let type_ref = self.resolve_ref(
                &prop.decl,
                &format!("{owner}{}", name.pascal_case),
                &format!("property {owner}.{original}"),
            )?;
            fields.push(IrField {
                enum_values: enum_values(&prop.decl),
                description: prop.decl.description().map(str::to_string),
                name,
                original_name: original.clone(),
                type_ref,
                required: prop.required,
            });
        }
        Ok(fields)
    }

    /// Whether a declared type name denotes an object (directly or through its parents).
    fn is_object_name(&self, name: &str) -> bool {
        self.decls.get(name).is_some_and(|decl| self.is_object_decl(decl))
    }

    fn is_object_decl(&self, decl: &TypeDecl) -> bool {
        match decl {
            TypeDecl::Expr(TypeExpr::Name(name)) => name == "object" || self.is_object_name(name),
            TypeDecl::Expr(_) => false,
            TypeDecl::Full(body) => {
                if body.defines_properties() {
                    return true;
                }
                match &body.base {
                    Some(TypeBase::Expr(TypeExpr::Name(name))) => {
                        name == "object" || self.is_object_name(name)
                    }
                    Some(TypeBase::Inline(inner)) => self.is_object_decl(inner),
                    _ => false,
                }
            }
        }
    }

    /// Reject cycles in the parent graph of declared types.
    fn check_inheritance(&self) -> Result<(), TransformError> {
        let mut done: HashSet<&str> = HashSet::new();
        for name in self.decls.keys() {
            let mut path: Vec<&str> = Vec::new();
            self.visit(name, &mut path, &mut done)?;
        }
        Ok(())
    }

    fn visit<'s>(
        &'s self,
        name: &'s str,
        path: &mut Vec<&'s str>,
        done: &mut HashSet<&'s str>,
    ) -> Result<(), TransformError> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(pos) = path.iter().position(|n| *n == name) {
            let mut cycle: Vec<&str> = path[pos..].to_vec();
            cycle.push(name);
            return Err(ResolveError::CircularInheritance(cycle.join(" -> ")).into());
        }
        let Some(decl) = self.decls.get(name) else {
            return Ok(());
        };
        path.push(name);
        for parent in self.parent_names(decl) {
            self.visit(parent, path, done)?;
        }
        path.pop();
        done.insert(name);
        Ok(())
    }

    fn parent_names<'d>(&self, decl: &'d TypeDecl) -> Vec<&'d str> {
        let declared = |expr: &'d TypeExpr| match expr {
            TypeExpr::Name(name) if self.decls.contains_key(name) => Some(name.as_str()),
            _ => None,
        };
        match decl {
            TypeDecl::Expr(expr) => declared(expr).into_iter().collect(),
            TypeDecl::Full(body) => match &body.base {
                Some(TypeBase::Expr(expr)) => declared(expr).into_iter().collect(),
                Some(TypeBase::Multiple(exprs)) => exprs.iter().filter_map(declared).collect(),
                Some(TypeBase::Inline(inner)) => self.parent_names(inner),
                None => Vec::new(),
            },
        }
    }
}

fn enum_values(decl: &TypeDecl) -> Vec<String> {
    match decl {
        TypeDecl::Full(body) => body.enum_values.clone(),
        TypeDecl::Expr(_) => Vec::new(),
    }
}

fn multiple_inheritance(context: &str) -> TransformError {
    ParseError::structure(context, "multiple inheritance is not supported").into()
}

fn placeholder(pascal: &str) -> IrTypeDef {
    IrTypeDef {
        name: normalize_name(pascal),
        description: None,
        kind: IrTypeKind::Alias(TypeRef::Any),
        enum_values: Vec::new(),
        example: None,
        synthesized: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::reader::read_type_decl;

    fn decls(yaml: &str) -> IndexMap<String, TypeDecl> {
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml).unwrap();
        value
            .as_mapping()
            .unwrap()
            .iter()
            .map(|(k, v)| {
                let name = k.as_str().unwrap().to_string();
                let decl = read_type_decl(v, &name).unwrap();
                (name, decl)
            })
            .collect()
    }

    fn resolve(yaml: &str) -> Result<IndexMap<String, IrTypeDef>, TransformError> {
        let decls = decls(yaml);
        let mut resolver = TypeResolver::new(&decls)?;
        resolver.resolve_declared()?;
        Ok(resolver.finish())
    }

    #[test]
    fn test_object_with_parent() {
        let types = resolve(
            "Base:\n  properties:\n    id: number\nUser:\n  type: Base\n  properties:\n    name: string\n",
        )
        .unwrap();
        let user = types["User"].as_object().unwrap();
        assert_eq!(user.parent.as_deref(), Some("Base"));
        assert_eq!(user.fields.len(), 1);
        assert_eq!(user.fields[0].name.snake_case, "name");
    }

    #[test]
    fn test_shorthand_subtype() {
        let types = resolve("Base:\n  properties:\n    id: number\nAdmin: Base\n").unwrap();
        let admin = types["Admin"].as_object().unwrap();
        assert_eq!(admin.parent.as_deref(), Some("Base"));
        assert!(admin.fields.is_empty());
    }

    #[test]
    fn test_inline_property_is_synthesized() {
        let types = resolve(
            "User:\n  properties:\n    address:\n      properties:\n        city: string\n",
        )
        .unwrap();
        let keys: Vec<&String> = types.keys().collect();
        assert_eq!(keys, vec!["User", "UserAddress"]);
        assert!(types["UserAddress"].synthesized);
        let user = types["User"].as_object().unwrap();
        assert_eq!(user.fields[0].type_ref, TypeRef::Named("UserAddress".into()));
    }

    #[test]
    fn test_synthesized_name_avoids_declared() {
        let types = resolve(
            "UserAddress:\n  properties:\n    line: string\nUser:\n  properties:\n    address:\n      properties:\n        city: string\n",
        )
        .unwrap();
        assert!(types.contains_key("UserAddress2"));
    }

    #[test]
    fn test_aliases_and_composites() {
        let types = resolve(
            "Email:\n  type: string\n  pattern: .+@.+\nUsers: User[]\nUser:\n  properties:\n    status:\n      enum: [active, banned]\nPet: Cat | Dog\nCat:\n  properties:\n    meow: boolean\nDog:\n  properties:\n    bark: boolean\n",
        )
        .unwrap();
        assert!(matches!(types["Email"].kind, IrTypeKind::Primitive(PrimitiveKind::String)));
        assert!(matches!(
            &types["Users"].kind,
            IrTypeKind::Array(TypeRef::Named(n)) if n == "User"
        ));
        assert!(matches!(&types["Pet"].kind, IrTypeKind::Union(m) if m.len() == 2));
        let user = types["User"].as_object().unwrap();
        assert_eq!(user.fields[0].enum_values, vec!["active", "banned"]);
    }

    #[test]
    fn test_unresolved_type() {
        let err = resolve("User:\n  properties:\n    team: Team\n").unwrap_err();
        assert!(matches!(
            err,
            TransformError::Resolve(ResolveError::UnresolvedType { ref type_name, .. }) if type_name == "Team"
        ));
    }

    #[test]
    fn test_circular_inheritance() {
        let err = resolve("A:\n  type: B\nB:\n  type: A\n").unwrap_err();
        assert!(matches!(
            err,
            TransformError::Resolve(ResolveError::CircularInheritance(_))
        ));
        let err = resolve("Self:\n  type: Self\n  properties:\n    x: string\n").unwrap_err();
        assert!(matches!(
            err,
            TransformError::Resolve(ResolveError::CircularInheritance(_))
        ));
    }

    #[test]
    fn test_multiple_inheritance_rejected() {
        let err = resolve(
            "A:\n  properties:\n    a: string\nB:\n  properties:\n    b: string\nC:\n  type: [A, B]\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TransformError::Parse(ParseError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn test_recursive_property_is_allowed() {
        let types = resolve("Node:\n  properties:\n    children: Node[]\n").unwrap();
        let node = types["Node"].as_object().unwrap();
        assert_eq!(
            node.fields[0].type_ref,
            TypeRef::Array(Box::new(TypeRef::Named("Node".into())))
        );
    }
}
