use indexmap::IndexMap;

use super::resources::IrResource;
use super::types::{IrSpec, MethodRef, NormalizedName};
use crate::transform::name_normalizer::normalize_name;

/// The methods of one top-level resource subtree; one service per group.
#[derive(Debug, Clone)]
pub struct ResourceGroup<'a> {
    pub name: NormalizedName,
    pub methods: Vec<MethodRef<'a>>,
}

/// Group methods by the top-level resource subtree they live in.
///
/// Top-level resources whose first literal segments normalize to the same
/// snake_case stem land in one group, named after the first one seen.
/// Subtrees without any method produce no group.
pub fn group_resources(ir: &IrSpec) -> Vec<ResourceGroup<'_>> {
    let mut groups: IndexMap<String, ResourceGroup<'_>> = IndexMap::new();

    for resource in &ir.resources {
        let mut methods = Vec::new();
        collect(resource, &mut methods);
        if methods.is_empty() {
            continue;
        }
        let name = normalize_name(&extract_path_prefix(&resource.path));
        groups
            .entry(name.snake_case.clone())
            .or_insert_with(|| ResourceGroup { name, methods: Vec::new() })
            .methods
            .extend(methods);
    }

    groups.into_values().collect()
}

fn collect<'a>(resource: &'a IrResource, out: &mut Vec<MethodRef<'a>>) {
    for method in &resource.methods {
        out.push(MethodRef { resource, method });
    }
    for child in &resource.children {
        collect(child, out);
    }
}

/// Extract the first literal path segment as a group name.
/// e.g. "/pets/{petId}" → "pets", "/store/inventory" → "store"
fn extract_path_prefix(path: &str) -> String {
    path.split('/')
        .find(|s| !s.is_empty() && !s.starts_with('{'))
        .unwrap_or("root")
        .to_string()
}
