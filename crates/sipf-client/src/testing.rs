use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::sync::Mutex;

use crate::error::{ClientError, Result};
use crate::http::{HttpRequest, HttpResponse, HttpTransport, Method, RequestBody, StreamResponse};

/// A request as seen by [`ScriptedTransport`], with the body fully read.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Replays canned responses in order and records every request.
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<HttpResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: HttpRequest) -> Result<HttpResponse> {
        let body = match request.body {
            RequestBody::Empty => Vec::new(),
            RequestBody::Bytes(bytes) => bytes.to_vec(),
            RequestBody::Stream { mut reader, .. } => {
                let mut body = Vec::new();
                reader.read_to_end(&mut body)?;
                body
            }
        };
        self.requests.lock().unwrap().push(Recorded {
            method: request.method,
            url: request.url,
            headers: request.headers,
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Http("no scripted response".into())))
    }
}

impl HttpTransport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.record(request)
    }

    fn open(&self, request: HttpRequest) -> Result<StreamResponse> {
        let response = self.record(request)?;
        Ok(StreamResponse {
            status_code: response.status_code,
            status_text: response.status_text,
            body: Box::new(Cursor::new(response.body)),
        })
    }
}
