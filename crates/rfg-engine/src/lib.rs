//! Sequences parse → map → generate → validate and aggregates the outcome.

pub mod cache;
pub mod orchestrator;
pub mod report;
pub mod validator;

pub use cache::{ParseCache, content_hash};
pub use orchestrator::{Orchestrator, generators_for};
pub use report::{Finding, GenerationOutput, Severity, ValidationReport};
pub use validator::validate;
