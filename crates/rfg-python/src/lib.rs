//! Shared Python emission: identifier rules, type mapping, templates, and syntax checks.

pub mod generator;
pub mod identifiers;
pub mod operations;
pub mod syntax;
pub mod templates;
pub mod type_mapper;

pub use generator::{FacetGenerator, GenerationContext};
pub use operations::{Operation, OperationGroup, Param, Payload, SchemaUse, operation_groups};
pub use syntax::{PyModuleSummary, PySyntaxError, check_syntax};
pub use type_mapper::{ModelRef, PyField, PyModel, PyType, TypeMapper};
