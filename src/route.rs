//! Static route table model consumed by the document builder.
//!
//! There is no runtime reflection here: an operator's "input type" is a
//! descriptor of its fields, and its optional behaviors (verb, response
//! payload, sentinel errors) are default-`None` methods on [`ApiOperator`].
//! Only the terminal operator of a route determines the documented response;
//! every operator's input contributes parameters and request body.

use std::sync::Arc;

use http::{Method, StatusCode};

use crate::openapi::schema::SchemaExtractor;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Derives a schema fragment through the shared extractor, registering named
/// component schemas as a side effect. Usually [`crate::schema_of`]`::<T>`.
pub type SchemaFn = fn(&mut SchemaExtractor<'_>) -> serde_json::Value;

/// Where a field is carried on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Cookie => "cookie",
            Location::Body => "body",
        }
    }
}

/// One field of an operator's input descriptor.
///
/// A `location` of `None` models a field that was never tagged with a
/// request location; the builder treats it as a fatal configuration error.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub location: Option<Location>,
    /// Declared MIME; meaningful for body fields only. `None` means the
    /// default structured-data MIME.
    pub mime: Option<&'static str>,
    /// Fields flagged omit-if-empty are optional everywhere except `path`.
    pub omit_empty: bool,
    pub schema: SchemaFn,
    /// Per-field documentation text, merged into body schemas as an
    /// intersection with the structural schema.
    pub doc: Option<&'static str>,
}

impl FieldSpec {
    pub fn new(name: &'static str, location: Location, schema: SchemaFn) -> Self {
        Self {
            name,
            location: Some(location),
            mime: None,
            omit_empty: false,
            schema,
            doc: None,
        }
    }

    /// A field with no location tag — rejected by the builder.
    pub fn untagged(name: &'static str, schema: SchemaFn) -> Self {
        Self {
            name,
            location: None,
            mime: None,
            omit_empty: false,
            schema,
            doc: None,
        }
    }

    pub fn mime(mut self, mime: &'static str) -> Self {
        self.mime = Some(mime);
        self
    }

    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    pub fn doc(mut self, text: &'static str) -> Self {
        self.doc = Some(text);
        self
    }
}

/// Operation-level documentation copied from the terminal handler.
#[derive(Debug, Clone, Default)]
pub struct Doc {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    pub tags: Vec<String>,
}

/// The capability surface of a route handler stage.
///
/// Every method has a default so implementors declare only what they
/// support. The build pass never probes beyond this closed set.
pub trait ApiOperator: Send + Sync {
    /// Input descriptor: every field becomes a parameter or (part of) the
    /// request body.
    fn input(&self) -> Vec<FieldSpec> {
        Vec::new()
    }

    /// Documentation for the operation; consulted on the terminal operator.
    fn doc(&self) -> Doc {
        Doc::default()
    }

    /// The HTTP verb this handler serves. A terminal operator without a verb
    /// produces no documented response at all.
    fn method(&self) -> Option<Method> {
        None
    }

    /// Overrides the default success status (POST → 201, else 200).
    fn response_status(&self) -> Option<StatusCode> {
        None
    }

    /// Overrides the default success content type (`application/json`).
    fn response_content_type(&self) -> Option<&'static str> {
        None
    }

    /// The success payload type. `None` documents "responds, no typed
    /// contract" as an empty media type.
    fn response_schema(&self) -> Option<SchemaFn> {
        None
    }

    /// Sentinel errors this handler can return; each is resolved through
    /// [`crate::StatusError::from_err`] and grouped by status code.
    fn response_errors(&self) -> Vec<BoxError> {
        Vec::new()
    }
}

/// One stage of a route's processing pipeline.
#[derive(Clone)]
pub struct Operator {
    pub handler: Arc<dyn ApiOperator>,
    pub terminal: bool,
}

/// One route of the table: method, path template, and its operator chain.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub operation_id: String,
    pub operators: Vec<Operator>,
}

impl Route {
    /// A route with a single terminal operator.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        operation_id: impl Into<String>,
        handler: Arc<dyn ApiOperator>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: operation_id.into(),
            operators: vec![Operator {
                handler,
                terminal: true,
            }],
        }
    }

    /// Insert a non-terminal stage ahead of the terminal operator. Its input
    /// contributes parameters and request body; its output is ignored.
    pub fn with_stage(mut self, handler: Arc<dyn ApiOperator>) -> Self {
        let terminal_at = self.operators.len().saturating_sub(1);
        self.operators.insert(
            terminal_at,
            Operator {
                handler,
                terminal: false,
            },
        );
        self
    }
}

/// The router collaborator: an ordered list of routes.
pub trait Routes {
    fn routes(&self) -> Vec<Route>;
}

/// A plain in-memory route table.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Routes for RouteTable {
    fn routes(&self) -> Vec<Route> {
        self.routes.clone()
    }
}
