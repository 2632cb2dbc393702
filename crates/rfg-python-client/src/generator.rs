use rfg_core::{FacetTag, GeneratedFile, GeneratorError};
use rfg_python::{FacetGenerator, GenerationContext};

use crate::emitters;

/// `client/`: the package, its models, and packaging metadata.
pub struct ClientGenerator;

/// `client/tests/`.
pub struct ClientTestsGenerator;

impl FacetGenerator for ClientGenerator {
    fn facet(&self) -> FacetTag {
        FacetTag::Client
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
        emitters::client::emit_client(ctx)
    }
}

impl FacetGenerator for ClientTestsGenerator {
    fn facet(&self) -> FacetTag {
        FacetTag::ClientTests
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError> {
        emitters::tests::emit_tests(ctx)
    }
}
