use std::sync::Arc;

use sipf_object::{
    decode_objects_down, decode_objid_notification, encode_objects_down_request,
    encode_objects_up, DownloadResult, ObjectsUp, Otid,
};
use tracing::{debug, info, warn};

use crate::auth::Credentials;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http::{HttpRequest, HttpTransport, Method};

const OCTET_STREAM: &str = "application/octet-stream";

/// Object upload/download operations used by the command layer.
pub trait ObjectClient {
    /// Replace the identity sent with every request.
    fn set_credentials(&mut self, credentials: Option<Credentials>);

    /// Obtain credentials from the session-key endpoint.
    fn request_session_key(&mut self) -> Result<Credentials>;

    /// Upload an already encoded object payload.
    fn upload_raw(&mut self, payload: &[u8]) -> Result<Otid>;

    /// Upload a set of objects in one request.
    fn upload(&mut self, objects: &ObjectsUp) -> Result<Otid> {
        self.upload_raw(&objects.encode_payload())
    }

    /// Fetch the next batch of downlink objects.
    fn download(&mut self) -> Result<DownloadResult>;
}

/// SIPF connector client.
pub struct SipfClient<T> {
    transport: Arc<T>,
    config: ClientConfig,
    credentials: Option<Credentials>,
}

impl<T: HttpTransport> SipfClient<T> {
    pub fn new(transport: Arc<T>, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            credentials: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    fn connector_request(&self, frame: bytes::Bytes) -> Result<bytes::Bytes> {
        debug!(len = frame.len(), frame = %hex::encode(&frame), "connector request");
        let request = HttpRequest::new(Method::Post, &self.config.connector_url, self.config.timeout)
            .header("Content-Type", OCTET_STREAM)
            .auth(self.credentials.as_ref())
            .body(frame);

        let response = self.transport.send(request)?;
        if let Err(err) = response.check_status() {
            warn!(status = response.status_code, text = %response.status_text, "connector rejected request");
            return Err(err);
        }
        debug!(len = response.body.len(), body = %hex::encode(&response.body), "connector response");
        Ok(response.body)
    }
}

impl<T: HttpTransport> ObjectClient for SipfClient<T> {
    fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.credentials = credentials;
    }

    fn request_session_key(&mut self) -> Result<Credentials> {
        let request = HttpRequest::new(Method::Post, &self.config.auth_url, self.config.timeout)
            .header("Content-Type", "text/plain")
            .header("Accept", "text/plain");
        let response = self.transport.send(request)?;
        response.check_status()?;

        let credentials = Credentials::parse_session_key(&response.body)?;
        info!(user = credentials.user(), "session key acquired");
        Ok(credentials)
    }

    fn upload_raw(&mut self, payload: &[u8]) -> Result<Otid> {
        let frame = encode_objects_up(payload)?;
        let body = self.connector_request(frame)?;
        let otid = decode_objid_notification(&body)?;
        info!(%otid, size = payload.len(), "objects uploaded");
        Ok(otid)
    }

    fn download(&mut self) -> Result<DownloadResult> {
        let body = self.connector_request(encode_objects_down_request())?;
        let result = decode_objects_down(&body).map_err(ClientError::from)?;
        info!(otid = %result.otid, count = result.objects.len(), "objects downloaded");
        Ok(result)
    }
}
