//! Python client facets: a `requests` package and its mocked-transport tests.

pub mod emitters;
pub mod generator;

pub use generator::{ClientGenerator, ClientTestsGenerator};
