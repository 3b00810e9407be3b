//! # apikit — typed response dispatch and OpenAPI generation
//!
//! Two tightly coupled subsystems sharing one conceptual machinery:
//!
//! - **Runtime**: wrap any handler outcome in an [`Envelope`], hand it to the
//!   [`Dispatcher`], and get a fully-formed HTTP response — status inference,
//!   redirects, metadata headers, cookies, and codec-encoded bodies resolved
//!   through a single deterministic pass.
//! - **Build time**: walk a static route table with [`DocumentBuilder`] and
//!   synthesize an OpenAPI 3 [`Document`] — operations, parameters, request
//!   bodies, success and error response schemas, deduplicated component
//!   schemas.
//!
//! Both sides query values for optional capabilities instead of fixing a
//! protocol: a response value may carry a status code or a redirect, a route
//! operator may declare a verb, a payload type, or sentinel errors. The
//! [`StatusError`] mapping and the [`CodecRegistry`] are the collaborators
//! shared between the two passes.

pub mod codec;
pub mod openapi;
pub mod response;
pub mod route;
pub mod status;

pub use codec::{Codec, CodecRegistry, EncodeContext, JsonCodec, TextCodec, APPLICATION_JSON};
pub use openapi::build::{BuildDiagnostics, BuildError, DocumentBuilder};
pub use openapi::document::{Components, Document, Info, MediaType, Operation, Parameter, RequestBody, Response};
pub use openapi::registry::SchemaRegistry;
pub use openapi::schema::{default_naming, schema_of, NamingFn, SchemaExtractor};
pub use response::dispatch::{BufferedSink, DispatchError, Dispatcher, RequestInfo, ResponseSink};
pub use response::envelope::{wrap, wrap_result, Envelope};
pub use response::value::{
    Body, BodyValue, Redirect, ResponseValue, SameSite, SetCookie, WriteBody, WriteResponse,
};
pub use route::{
    ApiOperator, BoxError, Doc, FieldSpec, Location, Operator, Route, RouteTable, Routes, SchemaFn,
};
pub use status::StatusError;
