/// Errors raised while reading binary frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A read asked for more bytes than the buffer holds.
    #[error("frame truncated (needed {needed} bytes, {remaining} remaining)")]
    Truncated { needed: usize, remaining: usize },

    /// Bytes were left over after the last expected field.
    #[error("{remaining} unexpected trailing bytes")]
    Trailing { remaining: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
