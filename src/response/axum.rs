//! Bridge into axum response types.

use axum::response::{IntoResponse, Response};
use http::StatusCode;

use crate::response::dispatch::{BufferedSink, Dispatcher, RequestInfo};
use crate::response::envelope::Envelope;
use crate::status::StatusError;

impl Dispatcher {
    /// Dispatch into an axum [`Response`].
    ///
    /// A failure of the pass itself (not a handler error) is logged and
    /// degrades to a 500 `StatusError` body.
    pub fn respond(&self, mut envelope: Envelope, req: &RequestInfo) -> Response {
        let mut sink = BufferedSink::new();
        if let Err(err) = self.dispatch(&mut envelope, req, &mut sink) {
            tracing::error!(error = %err, path = %req.path, "response dispatch failed");
            return StatusError::internal(err.to_string()).into_response();
        }
        let (status, headers, body) = sink.into_parts();
        let mut response = Response::new(axum::body::Body::from(body));
        *response.status_mut() = status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = headers;
        response
    }
}

impl IntoResponse for StatusError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, axum::Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::value::ResponseValue;
    use http::header::CONTENT_TYPE;
    use http::Method;

    #[test]
    fn respond_maps_the_buffered_parts() {
        let d = Dispatcher::default();
        let req = RequestInfo::new(Method::GET, "/pets");
        let response = d.respond(Envelope::ok(ResponseValue::json("ok")), &req);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(b"application/json".as_slice())
        );
    }

    #[test]
    fn status_error_into_response_uses_its_code() {
        let response = StatusError::conflict("duplicate").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
