//! The response envelope: a handler outcome plus explicit per-request
//! overrides layered on top of it.
//!
//! Every setter is last-write-wins. Explicit settings take precedence over
//! the capabilities of the wrapped value during dispatch.

use std::collections::HashMap;

use http::StatusCode;
use url::Url;

use crate::response::value::{ResponseValue, SetCookie};
use crate::route::BoxError;

/// Wrap a successful handler outcome for dispatch.
pub fn wrap(value: impl Into<ResponseValue>) -> Envelope {
    Envelope::ok(value.into())
}

/// Wrap a fallible handler outcome for dispatch.
pub fn wrap_result<T, E>(result: Result<T, E>) -> Envelope
where
    T: Into<ResponseValue>,
    E: Into<BoxError>,
{
    Envelope::from_result(result.map(Into::into))
}

/// A single-use carrier of one handler outcome.
///
/// The wrapped result is consumed by the first dispatch; dispatching a
/// consumed envelope is a no-op.
pub struct Envelope {
    pub(crate) value: Option<Result<ResponseValue, BoxError>>,
    /// Explicit status; wins over any status the value carries.
    pub(crate) status: Option<StatusCode>,
    /// Explicit redirect target; wins over the value's redirect capability.
    pub(crate) location: Option<Url>,
    pub(crate) content_type: Option<String>,
    pub(crate) cookies: Vec<SetCookie>,
    /// Metadata header values keyed by header name; replaces any existing
    /// values under the same name on the wire.
    pub(crate) metadata: HashMap<String, Vec<String>>,
}

impl Envelope {
    pub fn from_result<E: Into<BoxError>>(result: Result<ResponseValue, E>) -> Self {
        Self {
            value: Some(result.map_err(Into::into)),
            status: None,
            location: None,
            content_type: None,
            cookies: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn ok(value: ResponseValue) -> Self {
        Self::from_result(Ok::<_, BoxError>(value))
    }

    pub fn err<E: Into<BoxError>>(err: E) -> Self {
        Self::from_result(Err(err))
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn location(mut self, location: Url) -> Self {
        self.location = Some(location);
        self
    }

    /// Explicit content type; an empty string is treated as unset.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into()).filter(|s| !s.is_empty());
        self
    }

    /// Append one cookie to the current list.
    pub fn cookie(mut self, cookie: SetCookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Set the cookie list wholesale, replacing any previous cookies.
    pub fn cookies(mut self, cookies: Vec<SetCookie>) -> Self {
        self.cookies = cookies;
        self
    }

    /// Set metadata header values under `name`, replacing any previous call
    /// for the same name.
    pub fn metadata(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.metadata.insert(name.into(), values);
        self
    }

    /// Take the wrapped outcome; subsequent takes return `None`.
    pub fn take_value(&mut self) -> Option<Result<ResponseValue, BoxError>> {
        self.value.take()
    }

    pub fn is_consumed(&self) -> bool {
        self.value.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_are_last_write_wins() {
        let e = Envelope::ok(ResponseValue::empty())
            .status(StatusCode::ACCEPTED)
            .status(StatusCode::OK)
            .content_type("text/plain")
            .content_type("application/json");
        assert_eq!(e.status, Some(StatusCode::OK));
        assert_eq!(e.content_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn empty_content_type_means_unset() {
        let e = Envelope::ok(ResponseValue::empty())
            .content_type("text/plain")
            .content_type("");
        assert!(e.content_type.is_none());
    }

    #[test]
    fn cookies_replace_the_whole_list() {
        let e = Envelope::ok(ResponseValue::empty())
            .cookies(vec![SetCookie::new("a", "1"), SetCookie::new("b", "2")])
            .cookies(vec![SetCookie::new("c", "3")]);
        assert_eq!(e.cookies.len(), 1);
        assert_eq!(e.cookies[0].name, "c");
    }

    #[test]
    fn metadata_replaces_per_name() {
        let e = Envelope::ok(ResponseValue::empty())
            .metadata("x-trace", vec!["a".into()])
            .metadata("x-trace", vec!["b".into(), "c".into()]);
        assert_eq!(
            e.metadata.get("x-trace"),
            Some(&vec!["b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn take_value_consumes_the_envelope() {
        let mut e = Envelope::ok(ResponseValue::empty());
        assert!(!e.is_consumed());
        assert!(e.take_value().is_some());
        assert!(e.is_consumed());
        assert!(e.take_value().is_none());
    }
}
