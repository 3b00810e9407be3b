//! The route scanner: one synchronous pass over a route table producing an
//! immutable [`Document`].
//!
//! The pass is fail-fast — the first configuration error (an untagged field,
//! an unresolvable codec) aborts the whole build with no partial document.
//! Not safe for concurrent calls sharing one output document.

use std::collections::BTreeMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::codec::{CodecRegistry, APPLICATION_JSON};
use crate::openapi::document::{
    Components, Document, Info, MediaType, Operation, Parameter, RequestBody, Response,
};
use crate::openapi::registry::SchemaRegistry;
use crate::openapi::schema::{default_naming, NamingFn, SchemaExtractor};
use crate::route::{ApiOperator, Location, Route, Routes};
use crate::status::StatusError;

/// Response extension listing the error summaries grouped under a status.
pub const X_STATUS_ERRORS: &str = "x-status-errors";

/// Fatal build-pass configuration errors. Programmer-facing: expected to be
/// caught before production.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing location tag for field `{field}` of operation `{operation}`")]
    MissingLocation { field: String, operation: String },

    #[error("no codec registered for MIME `{mime}` (field `{field}` of operation `{operation}`)")]
    UnknownCodec {
        mime: String,
        field: String,
        operation: String,
    },
}

/// Non-fatal observations collected during a build.
#[derive(Debug, Clone, Default)]
pub struct BuildDiagnostics {
    /// Schema names whose later, conflicting registrations were dropped
    /// (first-wins policy).
    pub dropped_schemas: Vec<String>,
}

/// Builds one OpenAPI document from a route table.
pub struct DocumentBuilder {
    codecs: Arc<CodecRegistry>,
    info: Info,
    naming: Box<NamingFn>,
}

impl DocumentBuilder {
    pub fn new(codecs: Arc<CodecRegistry>) -> Self {
        Self {
            codecs,
            info: Info::default(),
            naming: Box::new(default_naming),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.info.title = title.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.info.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.info.description = Some(description.into());
        self
    }

    /// Replace the default component naming function.
    pub fn naming(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.naming = Box::new(f);
        self
    }

    /// Run the build pass. See [`DocumentBuilder::build_with_diagnostics`]
    /// for the collision diagnostics.
    pub fn build(&self, routes: &dyn Routes) -> Result<Document, BuildError> {
        self.build_with_diagnostics(routes).map(|(doc, _)| doc)
    }

    /// Run the build pass, returning the document together with the
    /// diagnostics collected along the way.
    pub fn build_with_diagnostics(
        &self,
        routes: &dyn Routes,
    ) -> Result<(Document, BuildDiagnostics), BuildError> {
        let registry = SchemaRegistry::new();
        let mut paths: BTreeMap<String, BTreeMap<String, Operation>> = BTreeMap::new();

        let route_list = routes.routes();
        for route in &route_list {
            let op = self.scan_route(route, &registry)?;
            let path = translate_path(&route.path, &op);
            let method = route.method.as_str().to_lowercase();
            paths.entry(path).or_default().insert(method, op);
        }

        let diagnostics = BuildDiagnostics {
            dropped_schemas: registry.dropped(),
        };
        if !diagnostics.dropped_schemas.is_empty() {
            tracing::warn!(
                dropped = ?diagnostics.dropped_schemas,
                "schema name collisions; first registrations kept"
            );
        }
        tracing::info!(operations = route_list.len(), "built OpenAPI document");

        let doc = Document {
            openapi: "3.0.3",
            info: self.info.clone(),
            paths,
            components: Components {
                schemas: registry.into_components(),
            },
        };
        Ok((doc, diagnostics))
    }

    fn scan_route(
        &self,
        route: &Route,
        registry: &SchemaRegistry,
    ) -> Result<Operation, BuildError> {
        let mut op = Operation {
            operation_id: Some(route.operation_id.clone()),
            ..Default::default()
        };
        let mut extractor = SchemaExtractor::new(registry, self.naming.as_ref());

        for operator in &route.operators {
            self.scan_input(
                &mut op,
                operator.handler.as_ref(),
                &route.operation_id,
                &mut extractor,
            )?;

            if operator.terminal {
                let doc = operator.handler.doc();
                op.summary = doc.summary;
                op.description = doc.description;
                op.deprecated = doc.deprecated;
                op.tags = doc.tags;

                self.scan_response(&mut op, operator.handler.as_ref(), &mut extractor);
            }
        }
        Ok(op)
    }

    /// Every field of an operator's input becomes a parameter or part of
    /// the single request body.
    fn scan_input(
        &self,
        op: &mut Operation,
        handler: &dyn ApiOperator,
        operation_id: &str,
        extractor: &mut SchemaExtractor<'_>,
    ) -> Result<(), BuildError> {
        for field in handler.input() {
            let location = field.location.ok_or_else(|| BuildError::MissingLocation {
                field: field.name.to_string(),
                operation: operation_id.to_string(),
            })?;

            let codec =
                self.codecs
                    .resolve(field.mime)
                    .ok_or_else(|| BuildError::UnknownCodec {
                        mime: field.mime.unwrap_or(APPLICATION_JSON).to_string(),
                        field: field.name.to_string(),
                        operation: operation_id.to_string(),
                    })?;

            let schema = (field.schema)(extractor);

            match location {
                Location::Body => {
                    let body = op.request_body.get_or_insert_with(|| RequestBody {
                        description: None,
                        required: true,
                        content: BTreeMap::new(),
                    });
                    // Field documentation intersects with the structural
                    // schema; it never replaces it.
                    let schema = match field.doc {
                        Some(text) => serde_json::json!({
                            "allOf": [schema, { "description": text }]
                        }),
                        None => schema,
                    };
                    body.content.insert(
                        codec.content_type().to_string(),
                        MediaType {
                            schema: Some(schema),
                        },
                    );
                }
                Location::Path => op.parameters.push(Parameter {
                    name: field.name.to_string(),
                    location: "path",
                    // Path parameters are always required.
                    required: true,
                    schema,
                }),
                Location::Query | Location::Header | Location::Cookie => {
                    op.parameters.push(Parameter {
                        name: field.name.to_string(),
                        location: location.as_str(),
                        required: !field.omit_empty,
                        schema,
                    })
                }
            }
        }
        Ok(())
    }

    /// Response derivation, terminal operator only. A handler with no verb
    /// capability records no response entry at all.
    fn scan_response(
        &self,
        op: &mut Operation,
        handler: &dyn ApiOperator,
        extractor: &mut SchemaExtractor<'_>,
    ) {
        let Some(method) = handler.method() else {
            return;
        };

        let status = handler.response_status().unwrap_or(if method == Method::POST {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        });
        let content_type = handler.response_content_type().unwrap_or(APPLICATION_JSON);

        let mut resp = Response {
            description: reason(status),
            ..Default::default()
        };
        match handler.response_schema() {
            Some(schema_fn) => {
                let schema = schema_fn(extractor);
                resp.content.insert(
                    content_type.to_string(),
                    MediaType {
                        schema: Some(schema),
                    },
                );
            }
            // Responds, but declares no typed contract.
            None => {
                resp.content
                    .insert(content_type.to_string(), MediaType::default());
            }
        }
        op.responses.insert(status.as_u16().to_string(), resp);

        let errors = handler.response_errors();
        if errors.is_empty() {
            return;
        }

        // Group summaries by resulting status; one extra response per code.
        let mut grouped: BTreeMap<u16, Vec<String>> = BTreeMap::new();
        for err in &errors {
            let se = StatusError::from_err(err.as_ref());
            grouped.entry(se.status).or_default().push(se.summary);
        }
        let error_schema = extractor.extract::<StatusError>();
        for (code, summaries) in grouped {
            let mut resp = Response {
                description: StatusCode::from_u16(code)
                    .ok()
                    .map(reason)
                    .unwrap_or_default(),
                ..Default::default()
            };
            resp.content.insert(
                APPLICATION_JSON.to_string(),
                MediaType {
                    schema: Some(error_schema.clone()),
                },
            );
            resp.extensions
                .insert(X_STATUS_ERRORS.to_string(), serde_json::json!(summaries));
            op.responses.insert(code.to_string(), resp);
        }
    }
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_string()
}

static ROUTE_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/[*:]([^/]+)").expect("route parameter pattern"));

/// Rewrite router path-parameter syntax (`/:name`, `/*name`) into the
/// brace-delimited placeholder form, but only for parameters the operation
/// actually declares; anything else becomes the non-matching literal `/0` so
/// an unbound internal route variable is never published.
fn translate_path(path: &str, op: &Operation) -> String {
    ROUTE_PARAM
        .replace_all(path, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            if op.declares_path_param(name) {
                format!("/{{{name}}}")
            } else {
                "/0".to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::schema::schema_of;

    #[test]
    fn translate_path_keeps_declared_params_only() {
        let mut op = Operation::default();
        op.parameters.push(Parameter {
            name: "id".into(),
            location: "path",
            required: true,
            schema: serde_json::json!({ "type": "string" }),
        });
        assert_eq!(
            translate_path("/users/:id/orders/*rest", &op),
            "/users/{id}/orders/0"
        );
    }

    #[test]
    fn translate_path_ignores_plain_segments() {
        let op = Operation::default();
        assert_eq!(translate_path("/health", &op), "/health");
    }

    #[test]
    fn query_parameter_required_follows_omit_empty() {
        let builder = DocumentBuilder::new(Arc::new(CodecRegistry::default()));
        let registry = SchemaRegistry::new();
        let naming = default_naming;
        let mut extractor = SchemaExtractor::new(&registry, &naming);

        struct Op;
        impl ApiOperator for Op {
            fn input(&self) -> Vec<crate::route::FieldSpec> {
                vec![
                    crate::route::FieldSpec::new("page", Location::Query, schema_of::<u32>)
                        .omit_empty(),
                    crate::route::FieldSpec::new("q", Location::Query, schema_of::<String>),
                ]
            }
        }

        let mut op = Operation::default();
        builder
            .scan_input(&mut op, &Op, "test:list", &mut extractor)
            .expect("valid input");
        assert_eq!(op.parameters.len(), 2);
        assert!(!op.parameters[0].required);
        assert!(op.parameters[1].required);
    }
}
