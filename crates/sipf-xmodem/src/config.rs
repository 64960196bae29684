use std::time::Duration;

use crate::block::PAD;

/// Timing and retry limits for both transfer directions.
#[derive(Debug, Clone)]
pub struct XmodemConfig {
    /// Wait for the first block after the start NAK. Default: 3 s.
    pub first_block_timeout: Duration,
    /// Wait for each later block. Default: 1 s.
    pub block_timeout: Duration,
    /// Gap allowed between bytes inside a block. Default: 100 ms.
    pub inter_byte_timeout: Duration,
    /// Consecutive bad or missing blocks tolerated by the receiving side. Default: 10.
    pub max_receive_retries: u32,
    /// Total wait for the receiver's start request. Default: 30 s.
    pub request_timeout: Duration,
    /// Slice of `request_timeout` spent per poll. Default: 100 ms.
    pub request_poll: Duration,
    /// Wait for ACK/NAK after each sent block. Default: 500 ms.
    pub reply_timeout: Duration,
    /// Transmissions of one block before giving up. Default: 3.
    pub send_attempts: u32,
    /// Wait for the ACK of EOT. Default: 500 ms.
    pub end_timeout: Duration,
    /// Fill byte for the last block. Default: 0x1A.
    pub pad_byte: u8,
}

impl Default for XmodemConfig {
    fn default() -> Self {
        Self {
            first_block_timeout: Duration::from_millis(3000),
            block_timeout: Duration::from_millis(1000),
            inter_byte_timeout: Duration::from_millis(100),
            max_receive_retries: 10,
            request_timeout: Duration::from_secs(30),
            request_poll: Duration::from_millis(100),
            reply_timeout: Duration::from_millis(500),
            send_attempts: 3,
            end_timeout: Duration::from_millis(500),
            pad_byte: PAD,
        }
    }
}
