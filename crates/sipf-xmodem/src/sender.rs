use std::time::{Duration, Instant};

use sipf_transport::ByteChannel;
use tracing::{debug, trace, warn};

use crate::block::{build, ACK, BLOCK_LEN, CAN, EOT, NAK, PAYLOAD_LEN};
use crate::config::XmodemConfig;
use crate::error::{Result, XmodemError};

/// Outcome of a sending step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Ok,
    /// The receiver canceled.
    Canceled,
    /// The receiver never answered, or kept rejecting the block.
    Failed,
}

/// Sending side of a transfer.
pub struct XmodemSender<C: ByteChannel> {
    channel: C,
    block: [u8; BLOCK_LEN],
    block_no: u8,
    retries: u32,
    config: XmodemConfig,
}

impl<C: ByteChannel> XmodemSender<C> {
    pub fn new(channel: C, config: XmodemConfig) -> Self {
        Self {
            channel,
            block: [0u8; BLOCK_LEN],
            block_no: 1,
            retries: 0,
            config,
        }
    }

    /// Wait for the receiver's start request (NAK) within the request budget.
    pub fn wait_request(&mut self) -> Result<SendStatus> {
        let deadline = Instant::now() + self.config.request_timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                warn!("no xmodem start request");
                return Ok(SendStatus::Failed);
            }
            let poll = self.config.request_poll.min(deadline - now);
            match self.channel.get_byte(poll) {
                Ok(NAK) => {
                    debug!("xmodem send start");
                    return Ok(SendStatus::Ok);
                }
                Ok(CAN) => return Ok(SendStatus::Canceled),
                Ok(other) => trace!(byte = other, "ignored while waiting for start"),
                Err(err) if err.is_timeout() => {
                    // An instant timeout means no data will ever arrive.
                    if poll.is_zero() {
                        return Ok(SendStatus::Failed);
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Send one chunk (at most 128 bytes) as the next block.
    ///
    /// NAKs and missing replies resend the same block number until
    /// `send_attempts` transmissions are used up.
    pub fn send_block(&mut self, chunk: &[u8]) -> Result<SendStatus> {
        if chunk.len() > PAYLOAD_LEN {
            return Err(XmodemError::ChunkTooLarge {
                len: chunk.len(),
                max: PAYLOAD_LEN,
            });
        }
        build(&mut self.block, self.block_no, chunk, self.config.pad_byte);

        for attempt in 1..=self.config.send_attempts {
            if attempt > 1 {
                self.retries += 1;
            }
            self.channel.put(&self.block)?;
            match self.channel.get_byte(self.config.reply_timeout) {
                Ok(ACK) => {
                    trace!(bn = self.block_no, "block acknowledged");
                    self.block_no = self.block_no.wrapping_add(1);
                    return Ok(SendStatus::Ok);
                }
                Ok(CAN) => {
                    debug!(bn = self.block_no, "xmodem send canceled by receiver");
                    return Ok(SendStatus::Canceled);
                }
                Ok(NAK) => debug!(bn = self.block_no, attempt, "block rejected"),
                Ok(other) => trace!(bn = self.block_no, byte = other, "unexpected reply"),
                Err(err) if err.is_timeout() => debug!(bn = self.block_no, attempt, "no reply"),
                Err(err) => return Err(err.into()),
            }
        }

        warn!(bn = self.block_no, "block send attempts exhausted");
        Ok(SendStatus::Failed)
    }

    /// Send EOT and wait for its ACK.
    pub fn finish(&mut self) -> Result<SendStatus> {
        for attempt in 1..=self.config.send_attempts {
            self.channel.put_byte(EOT)?;
            match self.channel.get_byte(self.config.end_timeout) {
                Ok(ACK) => {
                    debug!(blocks = self.block_no.wrapping_sub(1), "xmodem send finished");
                    return Ok(SendStatus::Ok);
                }
                Ok(CAN) => return Ok(SendStatus::Canceled),
                Ok(other) => trace!(byte = other, attempt, "EOT not acknowledged"),
                Err(err) if err.is_timeout() => {
                    warn!("EOT acknowledgement timed out");
                    return Ok(SendStatus::Failed);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(SendStatus::Failed)
    }

    /// Abort the transfer (CAN twice) and drop whatever the peer already
    /// sent, so block remnants never reach the command parser.
    pub fn cancel(&mut self) -> Result<()> {
        debug!("xmodem send cancel");
        self.channel.put(&[CAN, CAN])?;
        self.channel.clear_inbound();
        Ok(())
    }

    /// Number the next block will carry.
    pub fn block_no(&self) -> u8 {
        self.block_no
    }

    /// Resends performed so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn config(&self) -> &XmodemConfig {
        &self.config
    }

    pub fn into_inner(self) -> C {
        self.channel
    }
}
