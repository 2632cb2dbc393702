pub mod merge;
pub mod name_normalizer;
pub mod raml_to_ir;
pub mod type_resolver;

pub use raml_to_ir::transform;

use crate::error::TransformError;
use crate::ir::IrSpec;
use crate::parse::{self, include::IncludeResolver};

/// Parse RAML text and transform it into the IR in one step.
pub fn load(input: &str, resolver: &dyn IncludeResolver) -> Result<IrSpec, TransformError> {
    let doc = parse::from_raml_with_includes(input, resolver)?;
    transform(&doc)
}

/// Like [`load`], but from raw bytes.
pub fn load_bytes(bytes: &[u8], resolver: &dyn IncludeResolver) -> Result<IrSpec, TransformError> {
    let doc = parse::from_bytes(bytes, resolver)?;
    transform(&doc)
}
