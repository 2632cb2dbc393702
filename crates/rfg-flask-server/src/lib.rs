//! Flask application facets.

pub mod emitters;
pub mod generator;

pub use generator::{
    AppGenerator, AuthGenerator, ModelsGenerator, RoutesGenerator, SchemasGenerator, ServerTestsGenerator,
    ServicesGenerator,
};
