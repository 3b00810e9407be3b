//! The dispatch pass: one envelope in, one fully-formed HTTP response out.
//!
//! The pass is a fixed pipeline. Self-describing responders delegate first;
//! errors resolve through [`StatusError::from_err`]; status comes from the
//! explicit envelope setting, then the value's capability, then inference;
//! redirects short-circuit before any body is written.

use std::io;
use std::sync::Arc;

use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LOCATION, SET_COOKIE};
use http::{Method, StatusCode};

use crate::codec::{CodecRegistry, EncodeContext, APPLICATION_JSON};
use crate::response::envelope::Envelope;
use crate::response::value::{Body, ResponseValue};
use crate::status::StatusError;

/// The request-side facts dispatch needs.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
}

impl RequestInfo {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl Default for RequestInfo {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}

/// The transport seam the dispatcher writes through.
///
/// Headers must be set before `write_head`; the head must be written exactly
/// once, before any body bytes.
pub trait ResponseSink {
    fn headers_mut(&mut self) -> &mut HeaderMap;
    fn write_head(&mut self, status: StatusCode) -> io::Result<()>;
    fn body(&mut self) -> &mut dyn io::Write;
}

/// An in-memory [`ResponseSink`], also the bridge into framework response
/// types.
#[derive(Debug, Default)]
pub struct BufferedSink {
    headers: HeaderMap,
    status: Option<StatusCode>,
    body: Vec<u8>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (Option<StatusCode>, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

impl ResponseSink for BufferedSink {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) -> io::Result<()> {
        self.status = Some(status);
        Ok(())
    }

    fn body(&mut self) -> &mut dyn io::Write {
        &mut self.body
    }
}

/// Failures of the dispatch pass itself, distinct from handler errors (those
/// become `StatusError` responses).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("response write failed: {0}")]
    Io(#[from] io::Error),

    #[error("body encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no codec registered for content type `{mime}`")]
    NoCodec { mime: String },

    #[error("invalid metadata header `{name}`")]
    InvalidHeader { name: String },
}

/// Turns envelopes into wire responses. Cheap to clone; holds the shared
/// codec registry.
#[derive(Clone)]
pub struct Dispatcher {
    codecs: Arc<CodecRegistry>,
}

impl Dispatcher {
    pub fn new(codecs: Arc<CodecRegistry>) -> Self {
        Self { codecs }
    }

    /// Run the pass. Consumes the envelope's wrapped outcome; a consumed
    /// envelope dispatches as a no-op.
    pub fn dispatch(
        &self,
        envelope: &mut Envelope,
        req: &RequestInfo,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), DispatchError> {
        let Some(outcome) = envelope.take_value() else {
            return Ok(());
        };

        let value = match outcome {
            Ok(v) => v,
            Err(err) => ResponseValue::from(StatusError::from_err(err.as_ref())),
        };
        let ResponseValue {
            body,
            status: value_status,
            redirect,
        } = value;

        // Self-describing responders own the whole write.
        let body = match body {
            Body::Responder(mut responder) => return responder.write_response(req, sink),
            other => other,
        };

        let mut status = envelope.status.or(value_status).unwrap_or_else(|| {
            if matches!(body, Body::Empty) {
                StatusCode::NO_CONTENT
            } else if req.method == Method::POST {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            }
        });

        let mut location = envelope.location.clone();
        if let Some(r) = redirect {
            if location.is_none() {
                location = Some(r.location);
            }
            // An explicit envelope status still wins over the redirect's.
            if envelope.status.is_none() {
                status = r.status;
            }
        }

        for (name, values) in &envelope.metadata {
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                DispatchError::InvalidHeader { name: name.clone() }
            })?;
            sink.headers_mut().remove(&header);
            for value in values {
                let value = HeaderValue::from_str(value).map_err(|_| {
                    DispatchError::InvalidHeader { name: name.clone() }
                })?;
                sink.headers_mut().append(header.clone(), value);
            }
        }

        for cookie in &envelope.cookies {
            let value = HeaderValue::from_str(&cookie.to_header_value()).map_err(|_| {
                DispatchError::InvalidHeader {
                    name: SET_COOKIE.to_string(),
                }
            })?;
            sink.headers_mut().append(SET_COOKIE, value);
        }

        // A redirect carries metadata and cookies but never a body or an
        // explicit content type.
        if let Some(location) = location {
            let value = HeaderValue::from_str(location.as_str()).map_err(|_| {
                DispatchError::InvalidHeader {
                    name: LOCATION.to_string(),
                }
            })?;
            sink.headers_mut().insert(LOCATION, value);
            sink.write_head(status)?;
            return Ok(());
        }

        if status == StatusCode::NO_CONTENT {
            sink.write_head(status)?;
            return Ok(());
        }

        if let Some(ct) = envelope.content_type.as_deref() {
            let value = HeaderValue::from_str(ct).map_err(|_| DispatchError::InvalidHeader {
                name: CONTENT_TYPE.to_string(),
            })?;
            sink.headers_mut().insert(CONTENT_TYPE, value);
        }

        match body {
            Body::Empty => sink.write_head(status)?,
            Body::Writer(mut writer) => {
                sink.write_head(status)?;
                writer.write_into(sink.body())?;
            }
            Body::Stream(mut reader) => {
                sink.write_head(status)?;
                let copied = io::copy(&mut reader, sink.body());
                // The stream closes on drop before any error propagates.
                drop(reader);
                copied?;
            }
            Body::Value(value) => {
                let codec = self
                    .codecs
                    .resolve(envelope.content_type.as_deref())
                    .ok_or_else(|| DispatchError::NoCodec {
                        mime: envelope
                            .content_type
                            .clone()
                            .unwrap_or_else(|| APPLICATION_JSON.to_string()),
                    })?;
                if envelope.content_type.is_none() {
                    sink.headers_mut()
                        .insert(CONTENT_TYPE, HeaderValue::from_static(codec.content_type()));
                }
                sink.write_head(status)?;
                codec.encode(&EncodeContext { status }, value.as_ref(), sink.body())?;
            }
            // Delegated before the pipeline ran.
            Body::Responder(_) => {}
        }
        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Arc::new(CodecRegistry::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::envelope::wrap_result;

    fn get() -> RequestInfo {
        RequestInfo::new(Method::GET, "/x")
    }

    #[test]
    fn empty_infers_204_and_writes_nothing() {
        let d = Dispatcher::default();
        let mut sink = BufferedSink::new();
        let mut e = Envelope::ok(ResponseValue::empty());
        d.dispatch(&mut e, &get(), &mut sink).expect("dispatch");
        assert_eq!(sink.status(), Some(StatusCode::NO_CONTENT));
        assert!(sink.body_bytes().is_empty());
        assert!(sink.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn post_with_body_infers_201() {
        let d = Dispatcher::default();
        let mut sink = BufferedSink::new();
        let mut e = Envelope::ok(ResponseValue::json("created"));
        let req = RequestInfo::new(Method::POST, "/x");
        d.dispatch(&mut e, &req, &mut sink).expect("dispatch");
        assert_eq!(sink.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn error_outcome_becomes_a_status_error_body() {
        let d = Dispatcher::default();
        let mut sink = BufferedSink::new();
        let mut e = wrap_result(Err::<ResponseValue, _>(StatusError::not_found(
            "no such pet",
        )));
        d.dispatch(&mut e, &get(), &mut sink).expect("dispatch");
        assert_eq!(sink.status(), Some(StatusCode::NOT_FOUND));
        let body: serde_json::Value =
            serde_json::from_slice(sink.body_bytes()).expect("json body");
        assert_eq!(body["summary"], serde_json::json!("not_found"));
        assert_eq!(body["status"], serde_json::json!(404));
    }

    #[test]
    fn consumed_envelope_is_a_noop() {
        let d = Dispatcher::default();
        let mut sink = BufferedSink::new();
        let mut e = Envelope::ok(ResponseValue::json("once"));
        d.dispatch(&mut e, &get(), &mut sink).expect("dispatch");
        let mut second = BufferedSink::new();
        d.dispatch(&mut e, &get(), &mut second).expect("noop");
        assert_eq!(second.status(), None);
        assert!(second.body_bytes().is_empty());
    }
}
