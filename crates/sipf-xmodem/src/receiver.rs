use std::time::Duration;

use sipf_transport::ByteChannel;
use tracing::{debug, trace, warn};

use crate::block::{checksum, ACK, BLOCK_LEN, BN, BN_COMPLEMENT, CAN, EOT, NAK, PAYLOAD, SOH, SUM};
use crate::config::XmodemConfig;
use crate::error::{Result, XmodemError};

/// Outcome of one [`XmodemReceiver::receive_block`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvStatus {
    /// A new, valid block is in [`XmodemReceiver::payload`].
    Ok,
    /// EOT received and acknowledged.
    Finished,
    /// The sender canceled.
    Canceled,
    /// Nothing usable arrived; ask for the block again.
    Retry,
    /// The previous block was sent again.
    Duplicate,
}

/// Receiving side of a transfer.
///
/// The caller decides when to [`ack`](Self::ack) or [`nak`](Self::nak), so a
/// block can be consumed before the next one is requested.
pub struct XmodemReceiver<C: ByteChannel> {
    channel: C,
    block: [u8; BLOCK_LEN],
    last_accepted: u8,
    config: XmodemConfig,
}

impl<C: ByteChannel> XmodemReceiver<C> {
    pub fn new(channel: C, config: XmodemConfig) -> Self {
        Self {
            channel,
            block: [0u8; BLOCK_LEN],
            last_accepted: 0,
            config,
        }
    }

    /// Ask the sender to start (NAK).
    pub fn start(&mut self) -> Result<()> {
        debug!("xmodem receive start");
        self.nak()
    }

    /// Receive and validate one block, waiting at most `timeout` for it to begin.
    pub fn receive_block(&mut self, timeout: Duration) -> Result<RecvStatus> {
        let lead = match self.channel.get_byte(timeout) {
            Ok(byte) => byte,
            Err(err) if err.is_timeout() => {
                debug!("no block within {timeout:?}");
                return Ok(RecvStatus::Retry);
            }
            Err(err) => return Err(err.into()),
        };

        match lead {
            SOH => {}
            EOT => {
                self.ack()?;
                debug!(last = self.last_accepted, "xmodem receive finished");
                return Ok(RecvStatus::Finished);
            }
            CAN => {
                debug!("xmodem receive canceled by sender");
                return Ok(RecvStatus::Canceled);
            }
            other => {
                trace!(byte = other, "unexpected lead byte");
                return Ok(RecvStatus::Retry);
            }
        }

        self.block[0] = SOH;
        for received in 1..BLOCK_LEN {
            match self.channel.get_byte(self.config.inter_byte_timeout) {
                Ok(byte) => self.block[received] = byte,
                Err(err) if err.is_timeout() => {
                    warn!(received, "block truncated");
                    return Err(XmodemError::BlockTimeout { received });
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(self.validate())
    }

    fn validate(&mut self) -> RecvStatus {
        let bn = self.block[BN];
        let bnc = self.block[BN_COMPLEMENT];
        if bn.wrapping_add(bnc) != 0xFF {
            warn!(bn, bnc, "block number complement mismatch");
            return RecvStatus::Retry;
        }
        if bn == self.last_accepted {
            debug!(bn, "duplicate block");
            return RecvStatus::Duplicate;
        }
        if bn != self.last_accepted.wrapping_add(1) {
            warn!(bn, last = self.last_accepted, "block out of sequence");
            return RecvStatus::Retry;
        }
        let sum = checksum(&self.block[PAYLOAD]);
        if sum != self.block[SUM] {
            warn!(bn, sum, expected = self.block[SUM], "block checksum mismatch");
            return RecvStatus::Retry;
        }
        self.last_accepted = bn;
        trace!(bn, "block accepted");
        RecvStatus::Ok
    }

    /// Payload of the last accepted block.
    pub fn payload(&self) -> &[u8] {
        &self.block[PAYLOAD]
    }

    /// Number of the last accepted block (0 before the first).
    pub fn last_accepted(&self) -> u8 {
        self.last_accepted
    }

    /// Request the next block.
    pub fn ack(&mut self) -> Result<()> {
        self.channel.put_byte(ACK)?;
        Ok(())
    }

    /// Request the current block again (also the start request).
    pub fn nak(&mut self) -> Result<()> {
        self.channel.put_byte(NAK)?;
        Ok(())
    }

    /// Abort the transfer (CAN twice) and drop whatever the peer already
    /// sent, so block remnants never reach the command parser.
    pub fn cancel(&mut self) -> Result<()> {
        debug!("xmodem receive cancel");
        self.channel.put(&[CAN, CAN])?;
        self.channel.clear_inbound();
        Ok(())
    }

    pub fn config(&self) -> &XmodemConfig {
        &self.config
    }

    pub fn into_inner(self) -> C {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use sipf_transport::MemoryChannel;

    use super::*;
    use crate::block::{build, PAD, PAYLOAD_LEN};

    fn block(bn: u8, data: &[u8]) -> Vec<u8> {
        let mut block = [0u8; BLOCK_LEN];
        build(&mut block, bn, data, PAD);
        block.to_vec()
    }

    fn channel(input: &[u8]) -> MemoryChannel {
        let mut channel = MemoryChannel::with_input(input);
        channel.set_echo(false);
        channel
    }

    fn wait() -> Duration {
        Duration::from_millis(10)
    }

    #[test]
    fn receives_valid_block() {
        let data: Vec<u8> = (0..PAYLOAD_LEN as u8).collect();
        let mut ch = channel(&block(1, &data));
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        rx.start().unwrap();
        assert_eq!(rx.receive_block(wait()).unwrap(), RecvStatus::Ok);
        assert_eq!(rx.payload(), data.as_slice());
        assert_eq!(rx.last_accepted(), 1);
        assert_eq!(ch.output(), &[NAK]);
    }

    #[test]
    fn corrupted_checksum_asks_for_retry() {
        let mut wire = block(1, b"payload");
        wire[SUM] = wire[SUM].wrapping_add(1);
        let mut ch = channel(&wire);
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        assert_eq!(rx.receive_block(wait()).unwrap(), RecvStatus::Retry);
        assert_eq!(rx.last_accepted(), 0);
    }

    #[test]
    fn repeated_block_is_duplicate() {
        let mut wire = block(1, b"first");
        wire.extend(block(1, b"first"));
        let mut ch = channel(&wire);
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        assert_eq!(rx.receive_block(wait()).unwrap(), RecvStatus::Ok);
        assert_eq!(rx.receive_block(wait()).unwrap(), RecvStatus::Duplicate);
        assert_eq!(rx.last_accepted(), 1);
    }

    #[test]
    fn skipped_block_asks_for_retry() {
        let mut ch = channel(&block(2, b"early"));
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        assert_eq!(rx.receive_block(wait()).unwrap(), RecvStatus::Retry);
    }

    #[test]
    fn bad_complement_asks_for_retry() {
        let mut wire = block(1, b"x");
        wire[BN_COMPLEMENT] = 0x00;
        let mut ch = channel(&wire);
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        assert_eq!(rx.receive_block(wait()).unwrap(), RecvStatus::Retry);
    }

    #[test]
    fn eot_is_acknowledged() {
        let mut ch = channel(&[EOT]);
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        assert_eq!(rx.receive_block(wait()).unwrap(), RecvStatus::Finished);
        assert_eq!(ch.output(), &[ACK]);
    }

    #[test]
    fn can_reports_canceled() {
        let mut ch = channel(&[CAN]);
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        assert_eq!(rx.receive_block(wait()).unwrap(), RecvStatus::Canceled);
    }

    #[test]
    fn silence_before_block_is_retry() {
        let mut ch = channel(&[]);
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        assert_eq!(rx.receive_block(wait()).unwrap(), RecvStatus::Retry);
    }

    #[test]
    fn silence_inside_block_is_hard_failure() {
        let wire = block(1, b"cut");
        let mut ch = channel(&wire[..40]);
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        let err = rx.receive_block(wait()).unwrap_err();
        assert!(matches!(err, XmodemError::BlockTimeout { received: 40 }));
    }

    #[test]
    fn block_numbers_wrap_after_255() {
        let mut wire = Vec::new();
        for bn in 1..=255u8 {
            wire.extend(block(bn, &[bn]));
        }
        wire.extend(block(0, b"wrapped"));
        let mut ch = channel(&wire);
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        for _ in 1..=255 {
            assert_eq!(rx.receive_block(wait()).unwrap(), RecvStatus::Ok);
            rx.ack().unwrap();
        }
        assert_eq!(rx.receive_block(wait()).unwrap(), RecvStatus::Ok);
        assert_eq!(rx.last_accepted(), 0);
    }

    #[test]
    fn cancel_sends_two_can() {
        let mut ch = channel(&[]);
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        rx.cancel().unwrap();
        assert_eq!(ch.output(), &[CAN, CAN]);
    }

    #[test]
    fn cancel_discards_rest_of_block() {
        let wire = block(2, b"late data");
        let mut ch = channel(&wire[..20]);
        ch.push_input(&wire[20..]);
        let mut rx = XmodemReceiver::new(&mut ch, XmodemConfig::default());

        rx.cancel().unwrap();

        assert_eq!(ch.remaining_input(), 0);
        assert_eq!(ch.output(), &[CAN, CAN]);
    }
}
