//! Python syntax checking and a shallow summary of what a module defines and imports.

use ruff_python_ast::{ExceptHandler, Expr, Stmt};
use ruff_python_parser::parse_module;
use ruff_text_size::TextSize;
use serde::Serialize;

/// A Python source file that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PySyntaxError {
    pub message: String,
    /// 1-based line of the error.
    pub line: usize,
}

impl std::fmt::Display for PySyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// `from <module> import <names>`, at any nesting depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PyImport {
    /// Dotted module path, empty for `from . import x`.
    pub module: String,
    /// Leading dots.
    pub level: u32,
    pub names: Vec<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PyClass {
    pub name: String,
    pub methods: Vec<String>,
}

/// What a parsed module exposes at top level and what it pulls in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PyModuleSummary {
    pub classes: Vec<PyClass>,
    pub functions: Vec<String>,
    /// Every top-level binding: classes, functions, assignments, imports.
    pub defined: Vec<String>,
    pub imports: Vec<PyImport>,
}

impl PyModuleSummary {
    pub fn defines(&self, name: &str) -> bool {
        self.defined.iter().any(|d| d == name)
    }

    pub fn class(&self, name: &str) -> Option<&PyClass> {
        self.classes.iter().find(|c| c.name == name)
    }
}

/// Parse `source` and summarise it.
pub fn check_syntax(source: &str) -> Result<PyModuleSummary, PySyntaxError> {
    let parsed = parse_module(source).map_err(|err| PySyntaxError {
        message: err.error.to_string(),
        line: line_of(source, err.location.start()),
    })?;

    let mut summary = PyModuleSummary::default();
    for stmt in &parsed.syntax().body {
        define_top_level(stmt, &mut summary);
    }
    collect_imports(source, &parsed.syntax().body, &mut summary.imports);
    Ok(summary)
}

fn define_top_level(stmt: &Stmt, summary: &mut PyModuleSummary) {
    match stmt {
        Stmt::ClassDef(class) => {
            let methods = class
                .body
                .iter()
                .filter_map(|s| match s {
                    Stmt::FunctionDef(f) => Some(f.name.as_str().to_string()),
                    _ => None,
                })
                .collect();
            summary.defined.push(class.name.as_str().to_string());
            summary.classes.push(PyClass {
                name: class.name.as_str().to_string(),
                methods,
            });
        }
        Stmt::FunctionDef(function) => {
            summary.defined.push(function.name.as_str().to_string());
            summary.functions.push(function.name.as_str().to_string());
        }
        Stmt::Assign(assign) => {
            for target in &assign.targets {
                bind_target(target, &mut summary.defined);
            }
        }
        Stmt::AnnAssign(assign) => bind_target(&assign.target, &mut summary.defined),
        Stmt::ImportFrom(import) => {
            for alias in &import.names {
                let bound = alias.asname.as_ref().unwrap_or(&alias.name);
                summary.defined.push(bound.as_str().to_string());
            }
        }
        Stmt::Import(import) => {
            for alias in &import.names {
                let bound = match &alias.asname {
                    Some(asname) => asname.as_str().to_string(),
                    None => alias
                        .name
                        .as_str()
                        .split('.')
                        .next()
                        .unwrap_or_default()
                        .to_string(),
                };
                summary.defined.push(bound);
            }
        }
        Stmt::If(branch) => {
            for s in &branch.body {
                define_top_level(s, summary);
            }
            for clause in &branch.elif_else_clauses {
                for s in &clause.body {
                    define_top_level(s, summary);
                }
            }
        }
        Stmt::Try(block) => {
            for s in block.body.iter().chain(&block.orelse).chain(&block.finalbody) {
                define_top_level(s, summary);
            }
        }
        _ => {}
    }
}

fn bind_target(target: &Expr, defined: &mut Vec<String>) {
    match target {
        Expr::Name(name) => defined.push(name.id.as_str().to_string()),
        Expr::Tuple(tuple) => tuple.elts.iter().for_each(|e| bind_target(e, defined)),
        Expr::List(list) => list.elts.iter().for_each(|e| bind_target(e, defined)),
        _ => {}
    }
}

fn collect_imports(source: &str, body: &[Stmt], out: &mut Vec<PyImport>) {
    for stmt in body {
        match stmt {
            Stmt::ImportFrom(import) => out.push(PyImport {
                module: import
                    .module
                    .as_ref()
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                level: import.level,
                names: import
                    .names
                    .iter()
                    .map(|a| a.name.as_str().to_string())
                    .collect(),
                line: line_of(source, import.range.start()),
            }),
            Stmt::ClassDef(class) => collect_imports(source, &class.body, out),
            Stmt::FunctionDef(function) => collect_imports(source, &function.body, out),
            Stmt::If(branch) => {
                collect_imports(source, &branch.body, out);
                for clause in &branch.elif_else_clauses {
                    collect_imports(source, &clause.body, out);
                }
            }
            Stmt::With(with) => collect_imports(source, &with.body, out),
            Stmt::Try(block) => {
                collect_imports(source, &block.body, out);
                for handler in &block.handlers {
                    let ExceptHandler::ExceptHandler(handler) = handler;
                    collect_imports(source, &handler.body, out);
                }
                collect_imports(source, &block.orelse, out);
                collect_imports(source, &block.finalbody, out);
            }
            _ => {}
        }
    }
}

fn line_of(source: &str, offset: TextSize) -> usize {
    let end = usize::from(offset).min(source.len());
    source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let source = "\
from __future__ import annotations

from typing import TYPE_CHECKING

if TYPE_CHECKING:
    from .author import Author

VERSION = \"1\"


class Book:
    def to_dict(self):
        return {}

    @classmethod
    def from_dict(cls, data):
        from .author import Author
        return cls()


def helper():
    pass
";
        let summary = check_syntax(source).unwrap();
        assert_eq!(summary.functions, vec!["helper"]);
        assert_eq!(
            summary.class("Book").unwrap().methods,
            vec!["to_dict", "from_dict"]
        );
        assert!(summary.defines("VERSION"));
        assert!(summary.defines("Author"));
        assert!(summary.defines("TYPE_CHECKING"));
        assert_eq!(summary.imports.len(), 4);
        assert_eq!(summary.imports[2].module, "author");
        assert_eq!(summary.imports[2].level, 1);
        assert_eq!(summary.imports[2].line, 6);
        assert_eq!(summary.imports[3].line, 17);
    }

    #[test]
    fn test_syntax_error_line() {
        let err = check_syntax("x = 1\ndef broken(:\n    pass\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_empty_module() {
        let summary = check_syntax("").unwrap();
        assert!(summary.defined.is_empty());
    }
}
