use minijinja::{Value, context};
use rfg_core::{FacetTag, GeneratedFile, GeneratorError};
use rfg_python::templates::{python_env, render};
use rfg_python::{GenerationContext, operation_groups};

use super::Project;

/// Emit the application skeleton: factory, config, extensions, error handlers, entry points.
pub fn emit_app(ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let project = Value::from_serialize(Project::new(ctx));
    let operations: Vec<_> = operation_groups(ctx)
        .into_iter()
        .flat_map(|g| g.operations)
        .collect();

    let mut env = python_env();
    let mut emit = |path: &str, name: &'static str, source: &'static str, values: &Value| {
        render(&mut env, name, source, values).map(|content| GeneratedFile::new(path, content, FacetTag::App))
    };

    let readme = context! { operations => operations, ..project.clone() };
    Ok(vec![
        emit("app/__init__.py", "app_init.py.j2", include_str!("../../templates/app_init.py.j2"), &project)?,
        emit("app/config.py", "config.py.j2", include_str!("../../templates/config.py.j2"), &project)?,
        emit(
            "app/extensions/__init__.py",
            "extensions_init.py.j2",
            include_str!("../../templates/extensions_init.py.j2"),
            &project,
        )?,
        emit(
            "app/extensions/db.py",
            "extensions_db.py.j2",
            include_str!("../../templates/extensions_db.py.j2"),
            &project,
        )?,
        emit(
            "app/errors/__init__.py",
            "errors_init.py.j2",
            include_str!("../../templates/errors_init.py.j2"),
            &project,
        )?,
        emit(
            "app/errors/handlers.py",
            "errors_handlers.py.j2",
            include_str!("../../templates/errors_handlers.py.j2"),
            &project,
        )?,
        emit("wsgi.py", "wsgi.py.j2", include_str!("../../templates/wsgi.py.j2"), &project)?,
        emit("run.py", "run.py.j2", include_str!("../../templates/run.py.j2"), &project)?,
        emit(
            "requirements.txt",
            "requirements.txt.j2",
            include_str!("../../templates/requirements.txt.j2"),
            &project,
        )?,
        emit(".env.example", "env.example.j2", include_str!("../../templates/env.example.j2"), &project)?,
        GeneratedFile::new(".gitignore", include_str!("../../templates/gitignore.j2"), FacetTag::App),
        emit("README.md", "readme.md.j2", include_str!("../../templates/readme.md.j2"), &readme)?,
    ])
}
