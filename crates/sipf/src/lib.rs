//! SIPF cellular IoT gateway.
//!
//! A host MCU drives the gateway over a UART with `$`-prefixed ASCII
//! commands; the gateway answers in text, moves files with XMODEM and
//! talks to the SIPF backend over HTTP.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial relay, echo flag and the `ByteChannel` seam
//! - [`frame`]: command line framing and bounds-checked wire reading
//! - [`object`]: typed object codec and backend envelope frames
//! - [`xmodem`]: block transfer engine
//! - [`client`]: messaging and file-transfer HTTP client
//! - [`cmd`]: command dispatcher, handlers and the control loop

/// Re-export transport types.
pub mod transport {
    pub use sipf_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use sipf_frame::*;
}

/// Re-export object codec types.
pub mod object {
    pub use sipf_object::*;
}

/// Re-export block transfer types.
pub mod xmodem {
    pub use sipf_xmodem::*;
}

/// Re-export client types.
pub mod client {
    pub use sipf_client::*;
}

/// Re-export command engine types.
pub mod cmd {
    pub use sipf_cmd::*;
}
