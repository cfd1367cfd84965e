use std::{future::Future, pin::Pin, str, sync::Arc, time::Instant};

use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

pub type RestFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub type RestResult<T> = Result<T, RestError>;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid request header {name}: {message}")]
    Header { name: String, message: String },
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },
    #[error("sending request to {url} failed: {message}")]
    Send { url: String, message: String },
    #[error("reading response from {url} failed: {message}")]
    Receive { url: String, message: String },
    #[error("response body (status {status}) is not valid utf-8: {source}")]
    Utf8 {
        status: u16,
        #[source]
        source: str::Utf8Error,
    },
    #[error("response body (status {status}) is not valid json: {source}")]
    Json {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to render json: {0}")]
    Render(String),
}

impl RestError {
    /// Status of the response whose body failed to decode.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Utf8 { status, .. } | Self::Json { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn from_reqwest(url: &str, err: reqwest::Error, reading: bool) -> Self {
        let url = url.to_owned();
        let message = err.to_string();
        if err.is_connect() {
            Self::Connect { url, message }
        } else if reading {
            Self::Receive { url, message }
        } else {
            Self::Send { url, message }
        }
    }
}

#[derive(Clone, Debug)]
pub struct RestRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, Bytes)>,
    pub body: Option<Bytes>,
}

impl RestRequest {
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_json_body<T: Serialize>(mut self, payload: &T) -> RestResult<Self> {
        let body = serde_json::to_vec(payload).map_err(RestError::Encode)?;
        self.body = Some(body.into());
        Ok(self)
    }

    /// First header value whose name matches `key`, ignoring ASCII case.
    pub fn header(&self, key: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_ref())
    }
}

#[derive(Clone, Debug)]
pub struct RestResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RestResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> RestResult<&str> {
        str::from_utf8(&self.body).map_err(|source| RestError::Utf8 {
            status: self.status,
            source,
        })
    }

    pub fn json<T: DeserializeOwned>(&self) -> RestResult<T> {
        serde_json::from_str(self.text()?).map_err(|source| RestError::Json {
            status: self.status,
            source,
        })
    }
}

pub trait RestTransport: Send + Sync {
    fn execute(&self, request: RestRequest) -> RestFuture<RestResult<RestResponse>>;
}

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn RestTransport>,
}

impl Client {
    pub fn new() -> RestResult<Self> {
        Ok(Self::with_transport(ReqwestTransport::new()?))
    }

    pub fn with_transport<T>(transport: T) -> Self
    where
        T: RestTransport + 'static,
    {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub async fn execute(&self, request: RestRequest) -> RestResult<RestResponse> {
        self.transport.execute(request).await
    }
}

/// Reqwest-backed transport. Idle connections are not pooled, so the socket
/// is closed once the exchange completes.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new() -> RestResult<Self> {
        let client = ReqwestClient::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(RestError::Client)?;
        Ok(Self { client })
    }
}

impl RestTransport for ReqwestTransport {
    fn execute(&self, request: RestRequest) -> RestFuture<RestResult<RestResponse>> {
        let client = self.client.clone();
        Box::pin(async move {
            let RestRequest {
                method,
                url,
                headers,
                body,
            } = request;
            let mut builder = client.request(method.clone(), &url);

            for (name, value) in headers {
                let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                    RestError::Header {
                        name: name.clone(),
                        message: err.to_string(),
                    }
                })?;
                let header_value = HeaderValue::from_maybe_shared(value).map_err(|err| {
                    RestError::Header {
                        name: name.clone(),
                        message: err.to_string(),
                    }
                })?;
                builder = builder.header(header_name, header_value);
            }
            if let Some(body) = body {
                builder = builder.body(body);
            }

            let started = Instant::now();
            debug!(%method, %url, "sending request");
            let response = builder
                .send()
                .await
                .map_err(|err| RestError::from_reqwest(&url, err, false))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|err| RestError::from_reqwest(&url, err, true))?;
            debug!(status, bytes = body.len(), elapsed = ?started.elapsed(), "received response");

            Ok(RestResponse { status, body })
        })
    }
}
