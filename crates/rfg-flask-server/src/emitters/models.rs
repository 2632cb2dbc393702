use minijinja::context;
use rfg_core::{FacetTag, GeneratedFile, GeneratorError};
use rfg_python::GenerationContext;
use rfg_python::templates::{python_env, render};

/// Emit `app/models/`: one dataclass module per object type plus the package index.
pub fn emit_models(ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let models: Vec<_> = ctx.types.models().collect();
    let mut env = python_env();
    let mut files = Vec::with_capacity(models.len() + 1);

    files.push(GeneratedFile::new(
        "app/models/__init__.py",
        render(
            &mut env,
            "models_init.py.j2",
            include_str!("../../templates/models_init.py.j2"),
            context! { models => &models },
        )?,
        FacetTag::Models,
    ));

    for model in &models {
        files.push(GeneratedFile::new(
            format!("app/models/{}.py", model.module),
            render(
                &mut env,
                "model.py.j2",
                include_str!("../../templates/model.py.j2"),
                context! { model => model },
            )?,
            FacetTag::Models,
        ));
    }

    Ok(files)
}
