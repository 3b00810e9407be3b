//! OpenAPI 3 document synthesis from a static route table.

pub mod build;
pub mod document;
pub mod registry;
pub mod schema;

pub use build::{BuildDiagnostics, BuildError, DocumentBuilder};
pub use document::{Components, Document, Info, MediaType, Operation, Parameter, RequestBody, Response};
pub use registry::SchemaRegistry;
pub use schema::{default_naming, schema_of, NamingFn, SchemaExtractor};
