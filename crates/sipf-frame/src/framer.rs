use bytes::BytesMut;
use tracing::{debug, trace, warn};

/// Capacity of the command line buffer.
pub const COMMAND_BUFFER_SIZE: usize = 4096;

/// Byte that opens a command line.
pub const START_MARKER: u8 = b'$';

/// Backspace (0x08).
pub const BACKSPACE: u8 = 0x08;

/// Emitted when a line outgrows the buffer.
pub const OVERFLOW_RESPONSE: &[u8] = b"\r\nNG\r\n";

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Framer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    /// Discarding input until a start marker.
    Wait,
    /// Collecting an ASCII command line.
    BufferingAscii,
    /// Reserved for binary commands; no transition enters it.
    BufferingBinary,
}

/// Receives each completed command line and returns the response bytes.
///
/// An empty response means nothing is written back.
pub trait LineHandler {
    fn handle_line(&mut self, line: &[u8]) -> Vec<u8>;
}

impl<F> LineHandler for F
where
    F: FnMut(&[u8]) -> Vec<u8>,
{
    fn handle_line(&mut self, line: &[u8]) -> Vec<u8> {
        self(line)
    }
}

/// Configuration for the command framer.
#[derive(Debug, Clone)]
pub struct FramerConfig {
    /// Maximum command line length in bytes. Default: 4096.
    pub max_line_len: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            max_line_len: COMMAND_BUFFER_SIZE,
        }
    }
}

/// Splits a serial byte stream into command lines.
///
/// A line starts after `$` and ends at CR or LF. The marker and terminator
/// are not part of the line passed to the handler.
#[derive(Debug)]
pub struct CommandFramer {
    state: FramerState,
    buf: BytesMut,
    config: FramerConfig,
}

impl CommandFramer {
    /// Create a framer with the default 4096-byte line buffer.
    pub fn new() -> Self {
        Self::with_config(FramerConfig::default())
    }

    /// Create a framer with explicit configuration.
    pub fn with_config(config: FramerConfig) -> Self {
        Self {
            state: FramerState::Wait,
            buf: BytesMut::with_capacity(config.max_line_len),
            config,
        }
    }

    /// Current state.
    pub fn state(&self) -> FramerState {
        self.state
    }

    /// Bytes collected for the line in progress.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Drop any partial line and return to [`FramerState::Wait`].
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = FramerState::Wait;
    }

    /// Consume one byte.
    ///
    /// Returns the bytes to write back, if any: the handler's response when a
    /// line completes, or [`OVERFLOW_RESPONSE`] when the buffer fills.
    pub fn push<H>(&mut self, byte: u8, handler: &mut H) -> Option<Vec<u8>>
    where
        H: LineHandler + ?Sized,
    {
        match self.state {
            FramerState::Wait => {
                if byte == START_MARKER {
                    self.buf.clear();
                    self.state = FramerState::BufferingAscii;
                }
                None
            }
            FramerState::BufferingAscii => match byte {
                CR | LF => {
                    self.state = FramerState::Wait;
                    debug!(len = self.buf.len(), "command line complete");
                    let response = handler.handle_line(&self.buf);
                    self.buf.clear();
                    (!response.is_empty()).then_some(response)
                }
                BACKSPACE => {
                    if self.buf.is_empty() {
                        self.state = FramerState::Wait;
                    } else {
                        self.buf.truncate(self.buf.len() - 1);
                    }
                    None
                }
                _ => {
                    if self.buf.len() >= self.config.max_line_len {
                        warn!(max = self.config.max_line_len, "command line overflow");
                        self.reset();
                        return Some(OVERFLOW_RESPONSE.to_vec());
                    }
                    self.buf.extend_from_slice(&[byte]);
                    None
                }
            },
            FramerState::BufferingBinary => {
                trace!(byte, "binary framing not supported; byte dropped");
                None
            }
        }
    }

    /// Consume a run of bytes, collecting every response in arrival order.
    pub fn feed<H>(&mut self, bytes: &[u8], handler: &mut H) -> Vec<Vec<u8>>
    where
        H: LineHandler + ?Sized,
    {
        bytes
            .iter()
            .filter_map(|&byte| self.push(byte, handler))
            .collect()
    }
}

impl Default for CommandFramer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        lines: Vec<Vec<u8>>,
        response: Vec<u8>,
    }

    impl LineHandler for Recorder {
        fn handle_line(&mut self, line: &[u8]) -> Vec<u8> {
            self.lines.push(line.to_vec());
            self.response.clone()
        }
    }

    fn recorder(response: &[u8]) -> Recorder {
        Recorder {
            lines: Vec::new(),
            response: response.to_vec(),
        }
    }

    #[test]
    fn single_line_dispatches_once() {
        let mut framer = CommandFramer::new();
        let mut handler = recorder(b"OK\r\n");

        let responses = framer.feed(b"$R 00\r", &mut handler);

        assert_eq!(handler.lines, vec![b"R 00".to_vec()]);
        assert_eq!(responses, vec![b"OK\r\n".to_vec()]);
        assert_eq!(framer.state(), FramerState::Wait);
    }

    #[test]
    fn two_lines_dispatch_in_order() {
        let mut framer = CommandFramer::new();
        let mut handler = recorder(b"OK\r\n");

        let responses = framer.feed(b"$A\r$B\n", &mut handler);

        assert_eq!(handler.lines, vec![b"A".to_vec(), b"B".to_vec()]);
        assert_eq!(responses.len(), 2);
    }

    #[test]
    fn bytes_before_marker_are_ignored() {
        let mut framer = CommandFramer::new();
        let mut handler = recorder(b"OK\r\n");

        framer.feed(b"noise\r\n$RX\r", &mut handler);

        assert_eq!(handler.lines, vec![b"RX".to_vec()]);
    }

    #[test]
    fn empty_response_writes_nothing() {
        let mut framer = CommandFramer::new();
        let mut handler = Recorder::default();

        let responses = framer.feed(b"$X\r", &mut handler);

        assert_eq!(handler.lines.len(), 1);
        assert!(responses.is_empty());
    }

    #[test]
    fn crlf_does_not_dispatch_twice() {
        let mut framer = CommandFramer::new();
        let mut handler = recorder(b"OK\r\n");

        framer.feed(b"$RX\r\n", &mut handler);

        assert_eq!(handler.lines.len(), 1);
    }

    #[test]
    fn backspace_removes_last_byte() {
        let mut framer = CommandFramer::new();
        let mut handler = recorder(b"OK\r\n");

        framer.feed(b"$RXX\x08\r", &mut handler);

        assert_eq!(handler.lines, vec![b"RX".to_vec()]);
    }

    #[test]
    fn backspace_on_empty_line_returns_to_wait() {
        let mut framer = CommandFramer::new();
        let mut handler = recorder(b"OK\r\n");

        framer.push(b'$', &mut handler);
        framer.push(BACKSPACE, &mut handler);
        assert_eq!(framer.state(), FramerState::Wait);

        // Without a new marker the rest is ignored.
        framer.feed(b"RX\r", &mut handler);
        assert!(handler.lines.is_empty());
    }

    #[test]
    fn overflow_emits_ng_and_resets() {
        let mut framer = CommandFramer::with_config(FramerConfig { max_line_len: 4 });
        let mut handler = recorder(b"OK\r\n");

        let responses = framer.feed(b"$ABCDE", &mut handler);

        assert_eq!(responses, vec![OVERFLOW_RESPONSE.to_vec()]);
        assert_eq!(framer.state(), FramerState::Wait);
        assert!(framer.pending().is_empty());

        // The terminator of the oversized line is not dispatched.
        framer.feed(b"\r", &mut handler);
        assert!(handler.lines.is_empty());
    }

    #[test]
    fn line_at_capacity_is_accepted() {
        let mut framer = CommandFramer::with_config(FramerConfig { max_line_len: 4 });
        let mut handler = recorder(b"OK\r\n");

        framer.feed(b"$ABCD\r", &mut handler);

        assert_eq!(handler.lines, vec![b"ABCD".to_vec()]);
    }

    #[test]
    fn closures_act_as_handlers() {
        let mut framer = CommandFramer::new();
        let mut seen = 0usize;
        let mut handler = |line: &[u8]| {
            seen += line.len();
            Vec::new()
        };

        framer.feed(b"$TX\r", &mut handler);
        assert_eq!(seen, 2);
    }
}
