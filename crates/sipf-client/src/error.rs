use sipf_object::ObjectError;

/// Errors raised by the SIPF client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend rejected the credentials (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-success HTTP status.
    #[error("unexpected HTTP status {code} {text}")]
    Status { code: u16, text: String },

    /// The request did not complete within its timeout.
    #[error("request timed out")]
    Timeout,

    /// The HTTP exchange failed below the status level.
    #[error("http error: {0}")]
    Http(String),

    /// The response body could not be parsed as a SIPF frame.
    #[error(transparent)]
    Object(#[from] ObjectError),

    /// The response body was not in the expected text form.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The file id is empty, too long, or has characters outside `[A-Za-z0-9._-]`.
    #[error("invalid file id {0:?}")]
    InvalidFileId(String),

    /// The transfer stopped before the declared size was reached.
    #[error("transfer incomplete ({sent} of {expected} bytes)")]
    Incomplete { sent: u64, expected: u64 },

    /// The chunk source or sink gave up (link failure, peer cancel).
    #[error("transfer aborted: {0}")]
    Aborted(String),

    /// Local I/O failed.
    #[error("client I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
