//! Static checks over a generated artifact set.
//!
//! Artifact paths must be unique and every Python artifact must parse without
//! defining a function or method twice. Imports between generated packages must
//! name modules and symbols that were actually generated. Every IR method must
//! have a route (and a client method when the client was requested).

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use log::debug;
use rfg_core::GeneratedFile;
use rfg_core::config::{Facet, GenerationConfig};
use rfg_core::ir::IrSpec;
use rfg_python::identifiers::py_ident;
use rfg_python::syntax::PyImport;
use rfg_python::{PyModuleSummary, check_syntax};

use crate::report::ValidationReport;

/// A parsed artifact and the dotted module name its path maps to.
struct Module<'a> {
    path: &'a str,
    name: String,
    is_package: bool,
    summary: PyModuleSummary,
}

/// Validate `files` against the IR they were generated from.
pub fn validate(files: &[GeneratedFile], ir: &IrSpec, config: &GenerationConfig) -> ValidationReport {
    let mut report = ValidationReport::new();
    let mut modules: IndexMap<String, Module<'_>> = IndexMap::new();

    let mut paths: HashSet<&str> = HashSet::new();
    for file in files {
        if !paths.insert(file.path.as_str()) {
            report.fatal(&file.path, "generated more than once");
        }
    }

    for file in files.iter().filter(|f| f.path.ends_with(".py")) {
        match check_syntax(&file.content) {
            Ok(summary) => {
                check_duplicate_defs(&file.path, &summary, &mut report);
                let (name, is_package) = module_name(&file.path);
                modules.insert(
                    name.clone(),
                    Module {
                        path: &file.path,
                        name,
                        is_package,
                        summary,
                    },
                );
            }
            Err(err) => report.fatal(&file.path, format!("invalid Python: {err}")),
        }
    }
    debug!("validating {} Python modules", modules.len());

    check_imports(&modules, &mut report);
    check_completeness(&modules, ir, config, &mut report);
    report
}

/// A second `def` with the same name silently replaces the first.
fn check_duplicate_defs(path: &str, summary: &PyModuleSummary, report: &mut ValidationReport) {
    for name in duplicates(&summary.functions) {
        report.fatal(path, format!("function `{name}` is defined more than once"));
    }
    for class in &summary.classes {
        for name in duplicates(&class.methods) {
            report.fatal(
                path,
                format!("method `{}.{name}` is defined more than once", class.name),
            );
        }
    }
}

fn duplicates(names: &[String]) -> BTreeSet<&str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(String::as_str)
        .filter(|name| !seen.insert(*name))
        .collect()
}

/// `app/models/book.py` → `app.models.book`; `app/models/__init__.py` → `app.models`.
fn module_name(path: &str) -> (String, bool) {
    let stem = path.trim_end_matches(".py");
    match stem.strip_suffix("/__init__") {
        Some(package) => (package.replace('/', "."), true),
        None => (stem.replace('/', "."), false),
    }
}

fn check_imports(modules: &IndexMap<String, Module<'_>>, report: &mut ValidationReport) {
    let roots: BTreeSet<&str> = modules
        .keys()
        .filter_map(|name| name.split('.').next())
        .collect();

    for module in modules.values() {
        for import in &module.summary.imports {
            let Some(target) = import_target(module, import) else {
                report.fatal(
                    module.path,
                    format!("line {}: relative import escapes the package", import.line),
                );
                continue;
            };
            let root = target.split('.').next().unwrap_or_default();
            if import.level == 0 && !roots.contains(root) {
                continue;
            }
            let Some(found) = modules.get(&target) else {
                report.fatal(
                    module.path,
                    format!("line {}: imports `{target}`, which was not generated", import.line),
                );
                continue;
            };
            for name in import.names.iter().filter(|n| n.as_str() != "*") {
                let submodule = format!("{target}.{name}");
                if !found.summary.defines(name) && !modules.contains_key(&submodule) {
                    report.fatal(
                        module.path,
                        format!("line {}: `{name}` is not defined in `{target}`", import.line),
                    );
                }
            }
        }
    }
}

/// Absolute dotted name an import refers to, `None` when it climbs above the root.
fn import_target(module: &Module<'_>, import: &PyImport) -> Option<String> {
    if import.level == 0 {
        return Some(import.module.clone());
    }
    let mut base: Vec<&str> = module.name.split('.').collect();
    if !module.is_package {
        base.pop();
    }
    for _ in 1..import.level {
        base.pop()?;
    }
    if !import.module.is_empty() {
        base.push(&import.module);
    }
    if base.is_empty() {
        return None;
    }
    Some(base.join("."))
}

fn check_completeness(
    modules: &IndexMap<String, Module<'_>>,
    ir: &IrSpec,
    config: &GenerationConfig,
    report: &mut ValidationReport,
) {
    let methods = ir.all_methods();

    if config.wants(Facet::FlaskApp) {
        let routes = format!("app.api.{}.routes", py_ident(&config.version));
        let path = format!("app/api/{}/routes.py", py_ident(&config.version));
        match modules.get(&routes) {
            Some(module) => {
                for m in &methods {
                    let function = &m.method.name.snake_case;
                    if !module.summary.functions.iter().any(|f| f == function) {
                        report.fatal(
                            &path,
                            format!("no route `{function}` for {} {}", m.method.verb, m.method.path),
                        );
                    }
                }
            }
            None if !methods.is_empty() => report.fatal(&path, "route module was not generated"),
            None => {}
        }
    }

    if config.wants(Facet::Client) {
        let path = "client/api_client.py";
        match modules.get("client.api_client").and_then(|m| m.summary.class("ApiClient")) {
            Some(client) => {
                for m in &methods {
                    let function = &m.method.name.snake_case;
                    if !client.methods.iter().any(|f| f == function) {
                        report.fatal(
                            path,
                            format!("no client method `{function}` for {} {}", m.method.verb, m.method.path),
                        );
                    }
                }
            }
            None => report.fatal(path, "`ApiClient` was not generated"),
        }
    }
}
