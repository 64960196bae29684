//! ASCII command session for the SIPF gateway.
//!
//! A [`CommandSession`] owns the UART byte channel and the collaborators
//! behind each command (register store, object client, file transfer,
//! positioning receiver, firmware updater). It implements
//! [`LineHandler`](sipf_frame::LineHandler), so a
//! [`CommandFramer`](sipf_frame::CommandFramer) can feed it lines directly.
//! [`Gateway`] wraps both into the control loop.
//!
//! Responses follow one convention: success ends in `OK\r\n`, a malformed
//! command yields `ILLEGAL PARAMETER\r\nNG\r\n`, and a failed operation
//! yields `NG\r\n`.

mod args;
pub mod dispatcher;
pub mod error;
pub mod fota;
pub mod gateway;
pub mod gnss;
mod handlers;
pub mod registers;
pub mod response;
pub mod session;

pub use dispatcher::{CommandKind, COMMAND_TABLE};
pub use error::{CmdError, FotaError, GnssError, RegisterError, Result};
pub use fota::{FirmwareUpdater, NoFirmwareUpdate, DEFAULT_IMAGE};
pub use gateway::{Gateway, GatewayConfig, READY_LINE, RESET_LINE};
pub use gnss::{GnssFix, GnssReceiver, GnssStatus, NoGnss};
pub use registers::{AuthMode, BankedRegisters, FirmwareInfo, RegisterStore};
pub use session::{CommandSession, SessionConfig};
