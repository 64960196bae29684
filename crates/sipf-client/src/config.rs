use std::time::Duration;

/// Default object connector endpoint.
pub const DEFAULT_CONNECTOR_URL: &str = "https://sipf.iot.sakura.ad.jp/v0/";
/// Default session-key endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://auth.sipf.iot.sakura.ad.jp/v0/session_key";
/// Default file URL endpoint; `{file_id}` is replaced with the id.
pub const DEFAULT_FILE_URL: &str = "https://file.sipf.iot.sakura.ad.jp/v1/files/{file_id}/";

/// Endpoints and timeouts used by the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Objects up/down endpoint.
    pub connector_url: String,
    /// Session-key endpoint.
    pub auth_url: String,
    /// File URL request endpoint, with a `{file_id}` placeholder.
    pub file_url: String,
    /// Timeout for connector, auth and URL requests. Default: 3 s.
    pub timeout: Duration,
    /// Timeout for file body transfers. Default: 5 min.
    pub transfer_timeout: Duration,
}

impl ClientConfig {
    /// File URL request endpoint for one file.
    pub fn file_url_for(&self, file_id: &str) -> String {
        self.file_url.replace("{file_id}", file_id)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connector_url: DEFAULT_CONNECTOR_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            file_url: DEFAULT_FILE_URL.to_string(),
            timeout: Duration::from_secs(3),
            transfer_timeout: Duration::from_secs(300),
        }
    }
}
