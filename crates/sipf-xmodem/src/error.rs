use sipf_transport::TransportError;

/// Hard failures that end a transfer.
///
/// Recoverable conditions (bad checksum, duplicate block, a missing reply)
/// are reported as [`RecvStatus`](crate::RecvStatus) or
/// [`SendStatus`](crate::SendStatus) values instead.
#[derive(Debug, thiserror::Error)]
pub enum XmodemError {
    /// The byte channel failed.
    #[error("xmodem channel error: {0}")]
    Transport(#[from] TransportError),

    /// The sender went quiet in the middle of a block.
    #[error("block truncated after {received} bytes")]
    BlockTimeout { received: usize },

    /// Too many consecutive bad blocks.
    #[error("retry limit exceeded ({retries})")]
    RetryExceeded { retries: u32 },

    /// The peer canceled the transfer.
    #[error("transfer canceled by peer")]
    Canceled,

    /// A chunk larger than one block was handed to the sender.
    #[error("chunk too large ({len} bytes, max {max})")]
    ChunkTooLarge { len: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, XmodemError>;
