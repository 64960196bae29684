use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur on the serial link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to bind to the specified address.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// No byte arrived within the requested wait.
    #[error("no data within {0:?}")]
    Timeout(Duration),

    /// The outbound queue stayed full for the whole write timeout.
    #[error("outbound queue full")]
    QueueFull,

    /// The relay has stopped (stream closed or relay thread exited).
    #[error("serial relay closed")]
    Closed,
}

impl TransportError {
    /// True when this error only reports an expired wait.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
