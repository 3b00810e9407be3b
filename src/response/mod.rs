//! Runtime response handling: values, envelopes, and the dispatch pass.

pub mod axum;
pub mod dispatch;
pub mod envelope;
pub mod value;

pub use dispatch::{BufferedSink, DispatchError, Dispatcher, RequestInfo, ResponseSink};
pub use envelope::{wrap, wrap_result, Envelope};
pub use value::{
    Body, BodyValue, Redirect, ResponseValue, SameSite, SetCookie, WriteBody, WriteResponse,
};
