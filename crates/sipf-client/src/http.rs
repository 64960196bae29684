use std::io::Read;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::auth::Credentials;
use crate::error::{ClientError, Result};

/// HTTP methods used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

/// Request body.
pub enum RequestBody {
    Empty,
    Bytes(Bytes),
    /// Streamed body of a known length.
    Stream {
        reader: Box<dyn Read + Send>,
        len: u64,
    },
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            RequestBody::Stream { len, .. } => write!(f, "Stream({len} bytes)"),
        }
    }
}

/// A request handed to an [`HttpTransport`].
#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: RequestBody,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Add the Basic-Auth header when credentials are known.
    pub fn auth(self, credentials: Option<&Credentials>) -> Self {
        match credentials {
            Some(credentials) => self.header("Authorization", credentials.authorization_header()),
            None => self,
        }
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Bytes(body.into());
        self
    }

    pub fn stream(mut self, reader: impl Read + Send + 'static, len: u64) -> Self {
        self.body = RequestBody::Stream {
            reader: Box::new(reader),
            len,
        };
        self
    }

    /// Value of the first header named `name`.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    /// Reason phrase, e.g. `OK` or `Unauthorized`.
    pub status_text: String,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status_code: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status_code,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    /// Fail unless the status is 200 OK; 401 maps to [`ClientError::Unauthorized`].
    pub fn check_status(&self) -> Result<()> {
        check_status(self.status_code, &self.status_text)
    }
}

/// A response whose body is read incrementally.
pub struct StreamResponse {
    pub status_code: u16,
    pub status_text: String,
    pub body: Box<dyn Read + Send>,
}

impl StreamResponse {
    pub fn check_status(&self) -> Result<()> {
        check_status(self.status_code, &self.status_text)
    }
}

impl std::fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status_code", &self.status_code)
            .field("status_text", &self.status_text)
            .finish()
    }
}

pub(crate) fn check_status(code: u16, text: &str) -> Result<()> {
    match code {
        200 => Ok(()),
        401 => Err(ClientError::Unauthorized),
        _ if text == "Unauthorized" => Err(ClientError::Unauthorized),
        _ => Err(ClientError::Status {
            code,
            text: text.to_string(),
        }),
    }
}

/// Performs HTTP exchanges for the client.
pub trait HttpTransport: Send + Sync {
    /// Send a request and buffer the whole response.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Send a request and return the response body as a stream.
    fn open(&self, request: HttpRequest) -> Result<StreamResponse>;
}

/// [`HttpTransport`] backed by a blocking `reqwest` client (rustls).
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("sipf-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn prepare(&self, request: HttpRequest) -> reqwest::blocking::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };
        debug!(method = request.method.as_str(), url = %request.url, "http request");

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        match request.body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Stream { reader, len } => {
                builder.body(reqwest::blocking::Body::sized(reader, len))
            }
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.prepare(request).send()?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.bytes()?;
        debug!(status = status.as_u16(), len = body.len(), "http response");
        Ok(HttpResponse {
            status_code: status.as_u16(),
            status_text,
            body,
        })
    }

    fn open(&self, request: HttpRequest) -> Result<StreamResponse> {
        let response = self.prepare(request).send()?;
        let status = response.status();
        debug!(status = status.as_u16(), "http stream opened");
        Ok(StreamResponse {
            status_code: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body: Box::new(response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(check_status(200, "OK").is_ok());
        assert!(matches!(
            check_status(401, "Unauthorized"),
            Err(ClientError::Unauthorized)
        ));
        assert!(matches!(
            check_status(500, "Internal Server Error"),
            Err(ClientError::Status { code: 500, .. })
        ));
    }

    #[test]
    fn auth_header_is_added_only_with_credentials() {
        let credentials = Credentials::new("user", "pass");
        let with = HttpRequest::new(Method::Post, "http://x", Duration::from_secs(1))
            .auth(Some(&credentials));
        let without =
            HttpRequest::new(Method::Post, "http://x", Duration::from_secs(1)).auth(None);

        assert_eq!(with.header_value("authorization"), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(without.header_value("Authorization"), None);
    }
}
