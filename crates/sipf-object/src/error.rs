use sipf_frame::FrameError;

use crate::envelope::CommandType;
use crate::object::ObjectType;

/// Errors raised while building or parsing SIPF objects and frames.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    /// The type code is not one of the defined object types.
    #[error("unknown object type 0x{0:02X}")]
    UnknownType(u8),

    /// The value length does not fit the object type.
    #[error("invalid value length {len} for {obj_type}")]
    LengthMismatch { obj_type: ObjectType, len: usize },

    /// The encoded object is shorter than the minimum frame.
    #[error("object frame too short ({len} bytes, min {min})")]
    FrameTooShort { len: usize, min: usize },

    /// The encoded object is longer than the maximum frame.
    #[error("object frame too long ({len} bytes, max {max})")]
    FrameTooLong { len: usize, max: usize },

    /// The length byte disagrees with the bytes supplied.
    #[error("declared value length {declared} but {actual} bytes present")]
    DeclaredLength { declared: usize, actual: usize },

    /// The envelope carries a different command than expected.
    #[error("unexpected command type 0x{found:02X} (expected {expected:?})")]
    UnexpectedCommand { expected: CommandType, found: u8 },

    /// The backend reported a non-zero result code.
    #[error("request failed with result 0x{0:02X}")]
    RequestFailed(u8),

    /// The response body has the wrong size.
    #[error("unexpected response length {len}")]
    ResponseLength { len: usize },

    /// The upload payload exceeds the request buffer.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// More objects than a single request can carry.
    #[error("too many objects (max {max})")]
    TooManyObjects { max: usize },

    /// A field ran past the end of the frame.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, ObjectError>;
