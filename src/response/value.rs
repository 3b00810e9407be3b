//! The response value model: what a handler produced, described as data.
//!
//! A [`ResponseValue`] is a closed set of capabilities fixed at creation: a
//! body shape, an optional status override, an optional redirect. The
//! dispatcher never probes values for behavior beyond this set.

use std::io;

use http::StatusCode;
use serde::Serialize;
use url::Url;

use crate::response::dispatch::{DispatchError, RequestInfo, ResponseSink};

/// An erased structured payload, encodable by any registered codec.
pub trait BodyValue: Send {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;
}

impl<T: Serialize + Send> BodyValue for T {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// A body that writes its own raw bytes, bypassing the codec layer.
pub trait WriteBody: Send {
    fn write_into(&mut self, sink: &mut dyn io::Write) -> io::Result<()>;
}

impl<F> WriteBody for F
where
    F: FnMut(&mut dyn io::Write) -> io::Result<()> + Send,
{
    fn write_into(&mut self, sink: &mut dyn io::Write) -> io::Result<()> {
        self(sink)
    }
}

/// A fully self-describing response: takes over the whole write, headers and
/// status included. The dispatcher delegates and touches nothing else.
pub trait WriteResponse: Send {
    fn write_response(
        &mut self,
        req: &RequestInfo,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), DispatchError>;
}

/// The body shape of a response value.
pub enum Body {
    /// No body at all; an empty success infers 204.
    Empty,
    /// A structured value, encoded through the resolved codec.
    Value(Box<dyn BodyValue>),
    /// A byte stream copied to the wire and closed afterwards.
    Stream(Box<dyn io::Read + Send>),
    /// A raw body writer.
    Writer(Box<dyn WriteBody>),
    /// A self-describing responder; short-circuits the dispatch pass.
    Responder(Box<dyn WriteResponse>),
}

/// A redirect capability: the target plus the status to respond with.
#[derive(Debug, Clone)]
pub struct Redirect {
    pub status: StatusCode,
    pub location: Url,
}

/// What a handler produced, before the envelope's explicit overrides apply.
pub struct ResponseValue {
    pub body: Body,
    /// Status carried by the value itself. Overridden by an explicit
    /// envelope status, overrides status inference.
    pub status: Option<StatusCode>,
    pub redirect: Option<Redirect>,
}

impl ResponseValue {
    pub fn empty() -> Self {
        Self {
            body: Body::Empty,
            status: None,
            redirect: None,
        }
    }

    /// A structured payload, encoded by the content-type-resolved codec
    /// (JSON unless the envelope says otherwise).
    pub fn json<T: Serialize + Send + 'static>(value: T) -> Self {
        Self {
            body: Body::Value(Box::new(value)),
            status: None,
            redirect: None,
        }
    }

    pub fn stream(reader: impl io::Read + Send + 'static) -> Self {
        Self {
            body: Body::Stream(Box::new(reader)),
            status: None,
            redirect: None,
        }
    }

    pub fn writer(writer: impl WriteBody + 'static) -> Self {
        Self {
            body: Body::Writer(Box::new(writer)),
            status: None,
            redirect: None,
        }
    }

    pub fn responder(responder: impl WriteResponse + 'static) -> Self {
        Self {
            body: Body::Responder(Box::new(responder)),
            status: None,
            redirect: None,
        }
    }

    pub fn redirect(status: StatusCode, location: Url) -> Self {
        Self {
            body: Body::Empty,
            status: None,
            redirect: Some(Redirect { status, location }),
        }
    }

    /// The post-mutation redirect: 303 See Other.
    pub fn see_other(location: Url) -> Self {
        Self::redirect(StatusCode::SEE_OTHER, location)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

impl From<()> for ResponseValue {
    fn from(_: ()) -> Self {
        ResponseValue::empty()
    }
}

impl From<serde_json::Value> for ResponseValue {
    fn from(value: serde_json::Value) -> Self {
        ResponseValue::json(value)
    }
}

impl From<crate::StatusError> for ResponseValue {
    fn from(err: crate::StatusError) -> Self {
        let status = err.status_code();
        ResponseValue::json(err).with_status(status)
    }
}

/// The `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// One `Set-Cookie` header value, modelled structurally.
#[derive(Debug, Clone)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    /// Lifetime in seconds; zero expires the cookie.
    pub max_age: Option<i64>,
    pub same_site: Option<SameSite>,
    pub http_only: bool,
    pub secure: bool,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            same_site: None,
            http_only: false,
            secure: false,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(max_age) = self.max_age {
            out.push_str("; Max-Age=");
            out.push_str(&max_age.to_string());
        }
        if let Some(same_site) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }
}
