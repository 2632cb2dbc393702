use log::{debug, warn};
use rayon::prelude::*;
use rfg_core::config::{Facet, GenerationConfig};
use rfg_core::error::TransformError;
use rfg_core::ir::IrSpec;
use rfg_core::parse::include::{IncludeResolver, NoIncludes};
use rfg_core::transform;
use rfg_flask_server::{
    AppGenerator, AuthGenerator, ModelsGenerator, RoutesGenerator, SchemasGenerator, ServerTestsGenerator,
    ServicesGenerator,
};
use rfg_python::{FacetGenerator, GenerationContext, TypeMapper};
use rfg_python_client::{ClientGenerator, ClientTestsGenerator};

use crate::cache::ParseCache;
use crate::report::{GenerationOutput, ValidationReport};
use crate::validator::validate;

/// The facet generators a configuration asks for, in emission order.
pub fn generators_for(config: &GenerationConfig) -> Vec<Box<dyn FacetGenerator>> {
    let mut generators: Vec<Box<dyn FacetGenerator>> = Vec::new();
    if config.wants(Facet::FlaskApp) {
        generators.push(Box::new(AppGenerator));
        generators.push(Box::new(ModelsGenerator));
        generators.push(Box::new(SchemasGenerator));
        generators.push(Box::new(ServicesGenerator));
        generators.push(Box::new(RoutesGenerator));
        if config.auth_enabled() {
            generators.push(Box::new(AuthGenerator));
        }
        if config.wants(Facet::Tests) {
            generators.push(Box::new(ServerTestsGenerator));
        }
    }
    if config.wants(Facet::Client) {
        generators.push(Box::new(ClientGenerator));
        if config.wants(Facet::Tests) {
            generators.push(Box::new(ClientTestsGenerator));
        }
    }
    generators
}

/// Runs parse → map → generate → validate.
///
/// Runs share nothing but the parse cache, so one orchestrator can serve many
/// threads.
#[derive(Debug, Default)]
pub struct Orchestrator {
    cache: ParseCache,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ParseCache {
        &self.cache
    }

    /// Generate from a self-contained document. Parse and resolve errors abort the run.
    pub fn run(&self, bytes: &[u8], config: &GenerationConfig) -> Result<GenerationOutput, TransformError> {
        let ir = self.cache.get_or_parse(bytes, &NoIncludes)?;
        Ok(self.generate(&ir, config))
    }

    /// Generate from a document whose `!include` fragments come from `resolver`.
    ///
    /// The fragments are not part of the cache key, so these runs bypass the cache.
    pub fn run_with_includes(
        &self,
        bytes: &[u8],
        resolver: &dyn IncludeResolver,
        config: &GenerationConfig,
    ) -> Result<GenerationOutput, TransformError> {
        let ir = transform::load_bytes(bytes, resolver)?;
        Ok(self.generate(&ir, config))
    }

    /// Run every input independently and in parallel. Results keep input order.
    pub fn run_batch<B>(&self, inputs: &[B], config: &GenerationConfig) -> Vec<Result<GenerationOutput, TransformError>>
    where
        B: AsRef<[u8]> + Sync,
    {
        inputs.par_iter().map(|input| self.run(input.as_ref(), config)).collect()
    }

    /// Emit every requested facet for an already parsed IR and validate the result.
    pub fn generate(&self, ir: &IrSpec, config: &GenerationConfig) -> GenerationOutput {
        self.generate_with(ir, config, &generators_for(config))
    }

    /// Like [`Orchestrator::generate`], with the caller choosing the generators.
    ///
    /// A failing facet is reported and its files dropped; the other facets still run.
    pub fn generate_with(
        &self,
        ir: &IrSpec,
        config: &GenerationConfig,
        generators: &[Box<dyn FacetGenerator>],
    ) -> GenerationOutput {
        let types = TypeMapper::new(ir);
        let ctx = GenerationContext::new(ir, &types, config);

        let mut report = ValidationReport::new();
        report.extend_warnings(&ir.warnings);
        report.extend_warnings(types.warnings());

        let mut artifacts = Vec::new();
        for generator in generators {
            let facet = generator.facet();
            match generator.generate(&ctx) {
                Ok(files) => {
                    debug!("facet {facet}: {} files", files.len());
                    artifacts.extend(files);
                }
                Err(err) => {
                    warn!("facet {facet} failed: {err}");
                    report.fatal(format!("facet:{facet}"), err.to_string());
                }
            }
        }

        report.merge(validate(&artifacts, ir, config));
        GenerationOutput { artifacts, report }
    }

    /// Drop cached IRs for every document parsed so far.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

