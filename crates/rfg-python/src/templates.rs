use minijinja::Environment;
use rfg_core::GeneratorError;
use serde::Serialize;

use crate::identifiers::{escape_docstring, py_str};

/// A template environment with the filters every Python emitter uses.
///
/// Blocks trim their own newline so templates can be indented for reading.
pub fn python_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_filter("pystr", |value: String| py_str(&value));
    env.add_filter("docstring", |value: String| escape_docstring(&value));
    env
}

/// Render `name` with `ctx`, registering `source` under that name on first use.
pub fn render<S: Serialize>(
    env: &mut Environment<'static>,
    name: &'static str,
    source: &'static str,
    ctx: S,
) -> Result<String, GeneratorError> {
    let failed = |e: minijinja::Error| GeneratorError::Render {
        template: name.to_string(),
        message: e.to_string(),
    };
    if env.get_template(name).is_err() {
        env.add_template(name, source).map_err(failed)?;
    }
    env.get_template(name).map_err(failed)?.render(ctx).map_err(failed)
}

/// Render a one-off template with the shared filters.
pub fn render_once<S: Serialize>(
    name: &'static str,
    source: &'static str,
    ctx: S,
) -> Result<String, GeneratorError> {
    render(&mut python_env(), name, source, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_filters() {
        let out = render_once(
            "t.j2",
            "KEY = {{ key | pystr }}\n\"\"\"{{ doc | docstring }}\"\"\"\n",
            context! { key => "a\"b", doc => "say \"hi\"" },
        )
        .unwrap();
        assert_eq!(out, "KEY = \"a\\\"b\"\n\"\"\"say \\\"hi\\\"\"\"\"\n");
    }

    #[test]
    fn test_trim_blocks() {
        let out = render_once(
            "t.j2",
            "{% for x in xs %}\n    item_{{ x }} = {{ x }}\n{% endfor %}\n",
            context! { xs => vec![1, 2] },
        )
        .unwrap();
        assert_eq!(out, "    item_1 = 1\n    item_2 = 2\n");
    }

    #[test]
    fn test_render_error() {
        let err = render_once("bad.j2", "{% for %}", context! {}).unwrap_err();
        assert!(matches!(err, GeneratorError::Render { ref template, .. } if template == "bad.j2"));
    }
}
