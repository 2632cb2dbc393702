use rfg_core::config::GenerationConfig;
use rfg_core::ir::IrSpec;
use rfg_core::{FacetTag, GeneratedFile, GeneratorError};

use crate::type_mapper::TypeMapper;

/// Everything a facet reads. Shared immutably across facets.
#[derive(Clone, Copy)]
pub struct GenerationContext<'a> {
    pub ir: &'a IrSpec,
    pub types: &'a TypeMapper,
    pub config: &'a GenerationConfig,
}

impl<'a> GenerationContext<'a> {
    pub fn new(ir: &'a IrSpec, types: &'a TypeMapper, config: &'a GenerationConfig) -> Self {
        Self { ir, types, config }
    }
}

/// One independently failing unit of generated output.
pub trait FacetGenerator: Send + Sync {
    fn facet(&self) -> FacetTag;

    fn generate(&self, ctx: &GenerationContext<'_>) -> Result<Vec<GeneratedFile>, GeneratorError>;
}
