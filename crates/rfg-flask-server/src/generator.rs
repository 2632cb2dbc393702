use rfg_core::{FacetTag, GeneratedFile, GeneratorError};
use rfg_python::{FacetGenerator, GenerationContext};

use crate::emitters;

/// `app/__init__.py`, config, extensions, error handlers, entry points, project files.
pub struct AppGenerator;

/// `app/models/`.
pub struct ModelsGenerator;

/// `app/schemas/`.
pub struct SchemasGenerator;

/// `app/services/`.
pub struct ServicesGenerator;

/// `app/api/<version>/`.
pub struct RoutesGenerator;

/// `app/auth/`, only requested when auth is enabled.
pub struct AuthGenerator;

/// `tests/` for the Flask app.
pub struct ServerTestsGenerator;

macro_rules! facet {
    ($generator:ty, $tag:expr, $emit:path) => {
        impl FacetGenerator for $generator {
            fn facet(&self) -> FacetTag {
                $tag
            }

            fn generate(&self, ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
                $emit(ctx)
            }
        }
    };
}

facet!(AppGenerator, FacetTag::App, emitters::app::emit_app);
facet!(ModelsGenerator, FacetTag::Models, emitters::models::emit_models);
facet!(SchemasGenerator, FacetTag::Schemas, emitters::schemas::emit_schemas);
facet!(ServicesGenerator, FacetTag::Services, emitters::services::emit_services);
facet!(RoutesGenerator, FacetTag::Routes, emitters::routes::emit_routes);
facet!(AuthGenerator, FacetTag::Auth, emitters::auth::emit_auth);
facet!(ServerTestsGenerator, FacetTag::ServerTests, emitters::tests::emit_tests);
