use std::sync::Arc;

use dashmap::DashMap;
use log::debug;
use rfg_core::error::TransformError;
use rfg_core::ir::IrSpec;
use rfg_core::parse::include::IncludeResolver;
use rfg_core::transform;
use sha2::{Digest, Sha256};

/// Hex SHA-256 of a document.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Parsed IRs keyed by the content hash of their source.
///
/// Entries are written at most once per hash. Two runs racing on the same
/// document both parse it; whichever inserts first is kept and both get that IR.
/// Failed parses are never cached.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: DashMap<String, Arc<IrSpec>>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached IR for `bytes`, parsing and inserting it on a miss.
    pub fn get_or_parse(&self, bytes: &[u8], resolver: &dyn IncludeResolver) -> Result<Arc<IrSpec>, TransformError> {
        let key = content_hash(bytes);
        if let Some(ir) = self.entries.get(&key) {
            debug!("parse cache hit {}", &key[..12]);
            return Ok(Arc::clone(ir.value()));
        }
        let ir = Arc::new(transform::load_bytes(bytes, resolver)?);
        let entry = self.entries.entry(key).or_insert(ir);
        Ok(Arc::clone(entry.value()))
    }

    pub fn get(&self, bytes: &[u8]) -> Option<Arc<IrSpec>> {
        self.entries.get(&content_hash(bytes)).map(|ir| Arc::clone(ir.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
