//! Document builder behavior over small route tables.

use std::sync::Arc;

use apikit::{
    schema_of, ApiOperator, BuildError, CodecRegistry, Doc, DocumentBuilder, FieldSpec, Location,
    Route, RouteTable, StatusError,
};
use http::{Method, StatusCode};
use schemars::JsonSchema;
use serde::Serialize;

fn builder() -> DocumentBuilder {
    DocumentBuilder::new(Arc::new(CodecRegistry::default())).title("pets").version("1.0.0")
}

fn table(route: Route) -> RouteTable {
    let mut t = RouteTable::new();
    t.add(route);
    t
}

#[derive(Serialize, JsonSchema)]
struct Pet {
    name: String,
    tag: Option<String>,
}

struct GetPet;
impl ApiOperator for GetPet {
    fn input(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("id", Location::Path, schema_of::<String>),
            FieldSpec::new("verbose", Location::Query, schema_of::<bool>).omit_empty(),
        ]
    }

    fn doc(&self) -> Doc {
        Doc {
            summary: Some("Fetch one pet".into()),
            tags: vec!["pets".into()],
            ..Default::default()
        }
    }

    fn method(&self) -> Option<Method> {
        Some(Method::GET)
    }

    fn response_schema(&self) -> Option<apikit::route::SchemaFn> {
        Some(schema_of::<Pet>)
    }

    fn response_errors(&self) -> Vec<apikit::route::BoxError> {
        vec![
            Box::new(StatusError::not_found("pet gone")),
            Box::new(StatusError::not_found("owner gone")),
            Box::new(std::io::Error::new(std::io::ErrorKind::Other, "db down")),
        ]
    }
}

struct CreatePet;
impl ApiOperator for CreatePet {
    fn input(&self) -> Vec<FieldSpec> {
        vec![FieldSpec::new("pet", Location::Body, schema_of::<Pet>).doc("The pet to create")]
    }

    fn method(&self) -> Option<Method> {
        Some(Method::POST)
    }

    fn response_schema(&self) -> Option<apikit::route::SchemaFn> {
        Some(schema_of::<Pet>)
    }
}

#[test]
fn get_route_documents_params_response_and_errors() {
    let route = Route::new(Method::GET, "/pets/:id", "pets:get", Arc::new(GetPet));
    let doc = builder().build(&table(route)).expect("builds");

    let op = doc.operation(&Method::GET, "/pets/{id}").expect("operation");
    assert_eq!(op.operation_id.as_deref(), Some("pets:get"));
    assert_eq!(op.summary.as_deref(), Some("Fetch one pet"));
    assert_eq!(op.tags, vec!["pets".to_string()]);

    assert_eq!(op.parameters.len(), 2);
    assert_eq!(op.parameters[0].name, "id");
    assert_eq!(op.parameters[0].location, "path");
    assert!(op.parameters[0].required);
    assert_eq!(op.parameters[1].name, "verbose");
    assert!(!op.parameters[1].required);

    // Success response: 200 default for GET, JSON media type, Pet $ref.
    let ok = op.responses.get("200").expect("success response");
    let media = ok.content.get("application/json").expect("json media");
    assert_eq!(
        media.schema.as_ref().expect("schema")["$ref"],
        serde_json::json!("#/components/schemas/Pet")
    );

    // Sentinel errors: two 404s grouped, the opaque error under 500.
    let not_found = op.responses.get("404").expect("grouped 404");
    assert_eq!(
        not_found.extensions.get("x-status-errors"),
        Some(&serde_json::json!(["not_found", "not_found"]))
    );
    let internal = op.responses.get("500").expect("500 from opaque error");
    assert_eq!(
        internal.extensions.get("x-status-errors"),
        Some(&serde_json::json!(["internal"]))
    );
    let media = not_found.content.get("application/json").expect("media");
    assert_eq!(
        media.schema.as_ref().expect("schema")["$ref"],
        serde_json::json!("#/components/schemas/StatusError")
    );

    assert!(doc.components.schemas.contains_key("Pet"));
    assert!(doc.components.schemas.contains_key("StatusError"));
}

#[test]
fn post_route_defaults_to_201_and_merges_body_doc() {
    let route = Route::new(Method::POST, "/pets", "pets:create", Arc::new(CreatePet));
    let doc = builder().build(&table(route)).expect("builds");

    let op = doc.operation(&Method::POST, "/pets").expect("operation");
    assert!(op.responses.contains_key("201"));
    assert!(!op.responses.contains_key("200"));

    let body = op.request_body.as_ref().expect("request body");
    assert!(body.required);
    let media = body.content.get("application/json").expect("json media");
    let schema = media.schema.as_ref().expect("schema");
    // Field doc intersects the structural schema through allOf.
    assert_eq!(
        schema["allOf"][0]["$ref"],
        serde_json::json!("#/components/schemas/Pet")
    );
    assert_eq!(
        schema["allOf"][1]["description"],
        serde_json::json!("The pet to create")
    );
}

#[test]
fn undeclared_path_params_collapse_to_literal_zero() {
    let route = Route::new(
        Method::GET,
        "/users/:id/orders/*rest",
        "orders:list",
        Arc::new(GetPet),
    );
    let doc = builder().build(&table(route)).expect("builds");
    // `id` is declared by GetPet's input, `rest` is not.
    assert!(doc.paths.contains_key("/users/{id}/orders/0"));
}

#[test]
fn missing_location_tag_aborts_the_build() {
    struct Untagged;
    impl ApiOperator for Untagged {
        fn input(&self) -> Vec<FieldSpec> {
            vec![FieldSpec::untagged("mystery", schema_of::<String>)]
        }
        fn method(&self) -> Option<Method> {
            Some(Method::GET)
        }
    }

    let route = Route::new(Method::GET, "/x", "x:get", Arc::new(Untagged));
    let err = builder().build(&table(route)).expect_err("aborts");
    match err {
        BuildError::MissingLocation { field, operation } => {
            assert_eq!(field, "mystery");
            assert_eq!(operation, "x:get");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_body_mime_aborts_the_build() {
    struct Binary;
    impl ApiOperator for Binary {
        fn input(&self) -> Vec<FieldSpec> {
            vec![FieldSpec::new("blob", Location::Body, schema_of::<String>)
                .mime("application/x-msgpack")]
        }
        fn method(&self) -> Option<Method> {
            Some(Method::POST)
        }
    }

    let route = Route::new(Method::POST, "/x", "x:put", Arc::new(Binary));
    let err = builder().build(&table(route)).expect_err("aborts");
    assert!(matches!(
        err,
        BuildError::UnknownCodec { ref mime, .. } if mime == "application/x-msgpack"
    ));
}

#[test]
fn terminal_without_verb_documents_no_response() {
    struct Mute;
    impl ApiOperator for Mute {}

    let route = Route::new(Method::GET, "/x", "x:get", Arc::new(Mute));
    let doc = builder().build(&table(route)).expect("builds");
    let op = doc.operation(&Method::GET, "/x").expect("operation");
    assert!(op.responses.is_empty());
}

#[test]
fn response_status_and_content_type_overrides() {
    struct Report;
    impl ApiOperator for Report {
        fn method(&self) -> Option<Method> {
            Some(Method::GET)
        }
        fn response_status(&self) -> Option<StatusCode> {
            Some(StatusCode::ACCEPTED)
        }
        fn response_content_type(&self) -> Option<&'static str> {
            Some("text/plain")
        }
        fn response_schema(&self) -> Option<apikit::route::SchemaFn> {
            Some(schema_of::<String>)
        }
    }

    let route = Route::new(Method::GET, "/report", "report:get", Arc::new(Report));
    let doc = builder().build(&table(route)).expect("builds");
    let op = doc.operation(&Method::GET, "/report").expect("operation");
    let resp = op.responses.get("202").expect("overridden status");
    assert!(resp.content.contains_key("text/plain"));
}

#[test]
fn colliding_schema_names_keep_the_first_and_report_the_drop() {
    mod a {
        use super::*;
        #[derive(Serialize, JsonSchema)]
        pub struct Widget {
            pub x: u32,
        }
    }
    mod b {
        use super::*;
        #[derive(Serialize, JsonSchema)]
        pub struct Widget {
            pub y: String,
        }
    }

    struct First;
    impl ApiOperator for First {
        fn method(&self) -> Option<Method> {
            Some(Method::GET)
        }
        fn response_schema(&self) -> Option<apikit::route::SchemaFn> {
            Some(schema_of::<a::Widget>)
        }
    }
    struct Second;
    impl ApiOperator for Second {
        fn method(&self) -> Option<Method> {
            Some(Method::GET)
        }
        fn response_schema(&self) -> Option<apikit::route::SchemaFn> {
            Some(schema_of::<b::Widget>)
        }
    }

    let mut t = RouteTable::new();
    t.add(Route::new(Method::GET, "/a", "a:get", Arc::new(First)));
    t.add(Route::new(Method::GET, "/b", "b:get", Arc::new(Second)));

    let (doc, diagnostics) = builder().build_with_diagnostics(&t).expect("builds");
    assert_eq!(diagnostics.dropped_schemas, vec!["Widget".to_string()]);

    let widget = doc.components.schemas.get("Widget").expect("kept schema");
    assert!(widget["properties"].get("x").is_some());
    assert!(widget["properties"].get("y").is_none());
}

#[test]
fn non_terminal_stages_contribute_input_only() {
    struct Auth;
    impl ApiOperator for Auth {
        fn input(&self) -> Vec<FieldSpec> {
            vec![FieldSpec::new("authorization", Location::Header, schema_of::<String>)]
        }
        fn doc(&self) -> Doc {
            Doc {
                summary: Some("never copied".into()),
                ..Default::default()
            }
        }
        fn method(&self) -> Option<Method> {
            Some(Method::GET)
        }
    }

    let route = Route::new(Method::GET, "/pets/:id", "pets:get", Arc::new(GetPet))
        .with_stage(Arc::new(Auth));
    let doc = builder().build(&table(route)).expect("builds");
    let op = doc.operation(&Method::GET, "/pets/{id}").expect("operation");

    // The stage's header joins the terminal's params; docs and responses
    // come from the terminal alone.
    assert!(op.parameters.iter().any(|p| p.name == "authorization"));
    assert_eq!(op.summary.as_deref(), Some("Fetch one pet"));
    assert!(op.responses.contains_key("200"));
}

#[test]
fn document_serializes_with_the_fixed_version() {
    let route = Route::new(Method::GET, "/pets/:id", "pets:get", Arc::new(GetPet));
    let doc = builder().build(&table(route)).expect("builds");
    let v = serde_json::to_value(&doc).expect("serializable");
    assert_eq!(v["openapi"], serde_json::json!("3.0.3"));
    assert_eq!(v["info"]["title"], serde_json::json!("pets"));
    assert!(v["components"]["schemas"]["Pet"].is_object());
}
