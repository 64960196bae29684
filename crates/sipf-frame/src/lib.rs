//! Command line framing and bounds-checked wire reading.
//!
//! Two pieces sit between the raw serial byte stream and the protocol logic:
//! - [`CommandFramer`] turns `$`-started, CR/LF-terminated input into
//!   discrete command lines and hands each one to a [`LineHandler`]
//! - [`ByteReader`] walks binary response frames without ever reading past
//!   the end of the buffer

pub mod error;
pub mod framer;
pub mod reader;

pub use error::{FrameError, Result};
pub use framer::{
    CommandFramer, FramerConfig, FramerState, LineHandler, BACKSPACE, COMMAND_BUFFER_SIZE,
    OVERFLOW_RESPONSE, START_MARKER,
};
pub use reader::ByteReader;
