use sipf_client::ClientError;
use sipf_xmodem::XmodemError;

use crate::response::{ILLEGAL_PARAMETER, NG, NG_AFTER_TRANSFER};

/// Register store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    /// The address is a read-only common register.
    #[error("register 0x{0:02X} is read-only")]
    ReadOnly(u8),

    /// The bank select value names a bank that does not exist.
    #[error("no register bank {0}")]
    NoSuchBank(u8),

    /// The address does not exist in the selected bank.
    #[error("register 0x{0:02X} out of range")]
    OutOfRange(u8),
}

/// Positioning receiver failures.
#[derive(Debug, thiserror::Error)]
pub enum GnssError {
    #[error("no positioning receiver available")]
    Unavailable,

    #[error("positioning receiver error: {0}")]
    Device(String),
}

/// Firmware update failures.
#[derive(Debug, thiserror::Error)]
pub enum FotaError {
    #[error("firmware update not supported")]
    Unsupported,

    #[error("firmware image {image} rejected: {reason}")]
    Rejected { image: String, reason: String },
}

/// Why a command did not succeed. Each variant renders to the text sent
/// back over the UART.
#[derive(Debug, thiserror::Error)]
pub enum CmdError {
    /// Malformed arguments.
    #[error("illegal parameter: {0}")]
    IllegalParameter(&'static str),

    /// The command requires an unlocked session.
    #[error("session is locked")]
    Locked,

    /// A collaborator rejected or failed the operation.
    #[error("command failed: {0}")]
    Failed(String),

    /// A block send ended early; the terminal may be mid-line.
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error(transparent)]
    Xmodem(#[from] XmodemError),
}

impl CmdError {
    /// Text written back for this failure.
    pub fn response(&self) -> &'static [u8] {
        match self {
            CmdError::IllegalParameter(_) => ILLEGAL_PARAMETER,
            CmdError::TransferFailed(_) => NG_AFTER_TRANSFER,
            CmdError::Locked
            | CmdError::Failed(_)
            | CmdError::Client(_)
            | CmdError::Register(_)
            | CmdError::Xmodem(_) => NG,
        }
    }
}

pub type Result<T> = std::result::Result<T, CmdError>;
