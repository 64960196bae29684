use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Bidirectional byte relay seen by the command layer.
///
/// `get_byte` returns [`TransportError::Timeout`](crate::TransportError::Timeout)
/// when nothing arrives within `timeout`; a zero timeout polls without waiting.
pub trait ByteChannel {
    /// Receive one byte, waiting at most `timeout`.
    fn get_byte(&mut self, timeout: Duration) -> Result<u8>;

    /// Queue one byte for transmission.
    fn put_byte(&mut self, byte: u8) -> Result<()>;

    /// Queue a run of bytes for transmission.
    fn put(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            self.put_byte(byte)?;
        }
        Ok(())
    }

    /// Enable or disable echo of received bytes back to the sender.
    fn set_echo(&mut self, enabled: bool);

    /// Current echo setting.
    fn echo_enabled(&self) -> bool;

    /// Drop every byte still waiting in the inbound queue.
    fn clear_inbound(&mut self);
}

impl<C: ByteChannel + ?Sized> ByteChannel for &mut C {
    fn get_byte(&mut self, timeout: Duration) -> Result<u8> {
        (**self).get_byte(timeout)
    }

    fn put_byte(&mut self, byte: u8) -> Result<()> {
        (**self).put_byte(byte)
    }

    fn put(&mut self, data: &[u8]) -> Result<()> {
        (**self).put(data)
    }

    fn set_echo(&mut self, enabled: bool) {
        (**self).set_echo(enabled)
    }

    fn echo_enabled(&self) -> bool {
        (**self).echo_enabled()
    }

    fn clear_inbound(&mut self) {
        (**self).clear_inbound()
    }
}

impl<C: ByteChannel + ?Sized> ByteChannel for Box<C> {
    fn get_byte(&mut self, timeout: Duration) -> Result<u8> {
        (**self).get_byte(timeout)
    }

    fn put_byte(&mut self, byte: u8) -> Result<()> {
        (**self).put_byte(byte)
    }

    fn put(&mut self, data: &[u8]) -> Result<()> {
        (**self).put(data)
    }

    fn set_echo(&mut self, enabled: bool) {
        (**self).set_echo(enabled)
    }

    fn echo_enabled(&self) -> bool {
        (**self).echo_enabled()
    }

    fn clear_inbound(&mut self) {
        (**self).clear_inbound()
    }
}

/// Echo-enable flag shared between the relay thread and the control loop.
#[derive(Debug, Clone)]
pub struct EchoFlag(Arc<AtomicBool>);

impl EchoFlag {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }
}

impl Default for EchoFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_flag_is_shared_between_clones() {
        let flag = EchoFlag::default();
        let relay_view = flag.clone();
        assert!(relay_view.is_enabled());

        flag.set(false);
        assert!(!relay_view.is_enabled());
    }
}
