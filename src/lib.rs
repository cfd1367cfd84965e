//! Smoke test for the todo backend: POST one fixed task, pretty-print the JSON
//! reply. The HTTP plumbing wraps reqwest behind a transport trait, with an
//! in-memory mock transport for deterministic tests.

pub mod adapter;
pub mod issuer;
pub mod mock;
pub mod render;

pub use reqwest::Method;

pub use adapter::{
    Client, ReqwestTransport, RestError, RestFuture, RestRequest, RestResponse, RestResult,
    RestTransport,
};
pub use issuer::{
    RequestIssuer, ResponseDocument, TODO_BODY, TODO_ENDPOINT, TODO_HEADERS, TODO_TEXT, TodoBody,
};
pub use mock::{MockReply, MockTransport};
pub use render::render_pretty;
