use std::collections::VecDeque;
use std::time::Duration;

use crate::channel::ByteChannel;
use crate::error::{Result, TransportError};

#[derive(Debug, Clone, Copy)]
enum Inbound {
    Byte(u8),
    Timeout,
}

/// Scripted in-memory [`ByteChannel`].
///
/// Inbound bytes are queued up front; an exhausted script, or an explicit
/// [`push_timeout`](MemoryChannel::push_timeout) marker, reads as a timeout
/// without sleeping. Everything written lands in [`output`](MemoryChannel::output).
#[derive(Debug)]
pub struct MemoryChannel {
    inbound: VecDeque<Inbound>,
    outbound: Vec<u8>,
    echo: bool,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self {
            inbound: VecDeque::new(),
            outbound: Vec::new(),
            echo: true,
        }
    }

    /// A channel whose inbound script starts with `input`.
    pub fn with_input(input: &[u8]) -> Self {
        let mut channel = Self::new();
        channel.push_input(input);
        channel
    }

    /// Append bytes to the inbound script.
    pub fn push_input(&mut self, input: &[u8]) {
        self.inbound.extend(input.iter().copied().map(Inbound::Byte));
    }

    /// Append a single expired wait to the inbound script.
    pub fn push_timeout(&mut self) {
        self.inbound.push_back(Inbound::Timeout);
    }

    /// Everything written to the channel so far.
    pub fn output(&self) -> &[u8] {
        &self.outbound
    }

    /// Take and clear the written bytes.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }

    /// Scripted inbound entries not yet consumed.
    pub fn remaining_input(&self) -> usize {
        self.inbound.len()
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteChannel for MemoryChannel {
    fn get_byte(&mut self, timeout: Duration) -> Result<u8> {
        match self.inbound.pop_front() {
            Some(Inbound::Byte(byte)) => {
                if self.echo {
                    self.outbound.push(byte);
                }
                Ok(byte)
            }
            Some(Inbound::Timeout) | None => Err(TransportError::Timeout(timeout)),
        }
    }

    fn put_byte(&mut self, byte: u8) -> Result<()> {
        self.outbound.push(byte);
        Ok(())
    }

    fn put(&mut self, data: &[u8]) -> Result<()> {
        self.outbound.extend_from_slice(data);
        Ok(())
    }

    fn set_echo(&mut self, enabled: bool) {
        self.echo = enabled;
    }

    fn echo_enabled(&self) -> bool {
        self.echo
    }

    fn clear_inbound(&mut self) {
        self.inbound.clear();
    }
}
