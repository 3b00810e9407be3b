//! MIME-keyed body codecs.
//!
//! The document builder uses the registry to name request-body content types
//! and to reject unresolvable MIMEs at build time; the dispatcher uses it to
//! encode structured payloads at request time. Byte-level rules beyond the
//! built-in JSON and plain-text codecs are out of scope — applications
//! register their own.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use http::StatusCode;

use crate::response::dispatch::DispatchError;
use crate::response::value::BodyValue;

/// The default structured-data MIME used when no content type is set.
pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain";

/// Request-scoped facts a codec may use for protocol-specific wrapping.
#[derive(Debug, Clone, Copy)]
pub struct EncodeContext {
    /// The resolved response status.
    pub status: StatusCode,
}

/// One wire encoding, keyed by its canonical content type.
pub trait Codec: Send + Sync {
    /// Canonical MIME name, used as the content-type key in documents and as
    /// the `Content-Type` header when none was set explicitly.
    fn content_type(&self) -> &'static str;

    /// Encode an erased structured value into the sink.
    fn encode(
        &self,
        cx: &EncodeContext,
        value: &dyn BodyValue,
        sink: &mut dyn io::Write,
    ) -> Result<(), DispatchError>;
}

/// `application/json` via serde_json.
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        APPLICATION_JSON
    }

    fn encode(
        &self,
        _cx: &EncodeContext,
        value: &dyn BodyValue,
        sink: &mut dyn io::Write,
    ) -> Result<(), DispatchError> {
        let v = value.to_json()?;
        serde_json::to_writer(&mut *sink, &v)?;
        Ok(())
    }
}

/// `text/plain`: scalar values written as their text form.
pub struct TextCodec;

impl Codec for TextCodec {
    fn content_type(&self) -> &'static str {
        TEXT_PLAIN
    }

    fn encode(
        &self,
        _cx: &EncodeContext,
        value: &dyn BodyValue,
        sink: &mut dyn io::Write,
    ) -> Result<(), DispatchError> {
        match value.to_json()? {
            serde_json::Value::Null => {}
            serde_json::Value::String(s) => sink.write_all(s.as_bytes())?,
            other => sink.write_all(other.to_string().as_bytes())?,
        }
        Ok(())
    }
}

/// MIME → codec resolver, shared by the builder and the dispatcher.
pub struct CodecRegistry {
    codecs: HashMap<&'static str, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// An empty registry; most callers want [`CodecRegistry::default`].
    pub fn new() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        self.codecs.insert(codec.content_type(), codec);
    }

    /// Resolve a codec for a MIME. Unset/empty falls back to
    /// `application/json`; media-type parameters (`; charset=...`) are
    /// ignored; an unknown MIME resolves to `None`.
    pub fn resolve(&self, mime: Option<&str>) -> Option<Arc<dyn Codec>> {
        let key = mime.filter(|m| !m.is_empty()).unwrap_or(APPLICATION_JSON);
        let key = key.split(';').next().unwrap_or(key).trim();
        self.codecs.get(key).cloned()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut r = Self::new();
        r.register(Arc::new(JsonCodec));
        r.register(Arc::new(TextCodec));
        r
    }
}
