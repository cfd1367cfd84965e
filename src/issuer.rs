//! The todo smoke request: one POST with a fixed body, JSON back.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapter::{Client, RestRequest, RestResult};

pub const TODO_ENDPOINT: &str = "http://localhost:8000/backend/todo/";

pub const TODO_HEADERS: [(&str, &str); 2] = [
    ("Content-Type", "application/json"),
    ("Accept", "application/json"),
];

pub const TODO_TEXT: &str = "Delete this task created by a python script";

/// Decoded response. Its shape is whatever the server sends.
pub type ResponseDocument = Value;

#[derive(Clone, Copy, Debug, Serialize)]
pub struct TodoBody<'a> {
    pub text: &'a str,
}

pub const TODO_BODY: TodoBody<'static> = TodoBody { text: TODO_TEXT };

#[derive(Clone)]
pub struct RequestIssuer {
    client: Client,
    endpoint: String,
}

impl RequestIssuer {
    pub fn new() -> RestResult<Self> {
        Ok(Self::with_client(Client::new()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self::with_endpoint(client, TODO_ENDPOINT)
    }

    /// Points the issuer at another endpoint. Headers and body do not change.
    pub fn with_endpoint(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn request(&self) -> RestResult<RestRequest> {
        TODO_HEADERS
            .iter()
            .fold(RestRequest::post(self.endpoint.as_str()), |req, (key, value)| {
                req.with_header(*key, *value)
            })
            .with_json_body(&TODO_BODY)
    }

    /// Sends the request once and decodes the reply. Non-2xx replies are
    /// decoded like any other; only transport and decode failures are errors.
    pub async fn issue(&self) -> RestResult<ResponseDocument> {
        let response = self.client.execute(self.request()?).await?;
        if response.is_success() {
            debug!(status = response.status, "todo endpoint answered");
        } else {
            warn!(
                status = response.status,
                endpoint = %self.endpoint,
                "todo endpoint answered with non-success status"
            );
        }
        response.json::<ResponseDocument>()
    }
}
