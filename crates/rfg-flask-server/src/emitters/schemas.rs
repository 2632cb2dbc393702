use minijinja::context;
use rfg_core::{FacetTag, GeneratedFile, GeneratorError};
use rfg_python::GenerationContext;
use rfg_python::templates::{python_env, render};

/// Emit `app/schemas/`: a marshmallow schema per model, loading into the model class.
pub fn emit_schemas(ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
    let models: Vec<_> = ctx.types.models().collect();
    let mut env = python_env();
    let mut files = Vec::with_capacity(models.len() + 1);

    files.push(GeneratedFile::new(
        "app/schemas/__init__.py",
        render(
            &mut env,
            "schemas_init.py.j2",
            include_str!("../../templates/schemas_init.py.j2"),
            context! { models => &models },
        )?,
        FacetTag::Schemas,
    ));

    for model in &models {
        files.push(GeneratedFile::new(
            format!("app/schemas/{}.py", model.schema_module),
            render(
                &mut env,
                "schema.py.j2",
                include_str!("../../templates/schema.py.j2"),
                context! { model => model },
            )?,
            FacetTag::Schemas,
        ));
    }

    Ok(files)
}
