use bytes::{BufMut, Bytes, BytesMut};
use sipf_frame::ByteReader;

use crate::error::{ObjectError, Result};

/// Envelope header: type (1) + time (8) + option (1) + length (2) = 12 bytes.
pub const HEADER_LEN: usize = 12;

/// Largest request the client will build.
pub const MAX_REQUEST_LEN: usize = 1024;

/// Largest objects-up payload that fits in one request.
pub const MAX_UP_PAYLOAD_LEN: usize = MAX_REQUEST_LEN - HEADER_LEN;

/// Envelope command types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    ObjectsUp = 0x00,
    ObjectsUpRetry = 0x01,
    ObjidNotification = 0x02,
    ObjectsDownRequest = 0x11,
    ObjectsDown = 0x12,
    CommandError = 0xFF,
}

impl CommandType {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        let command = match code {
            0x00 => Self::ObjectsUp,
            0x01 => Self::ObjectsUpRetry,
            0x02 => Self::ObjidNotification,
            0x11 => Self::ObjectsDownRequest,
            0x12 => Self::ObjectsDown,
            0xFF => Self::CommandError,
            _ => return None,
        };
        Some(command)
    }
}

/// The 12-byte envelope header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    pub command_type: CommandType,
    /// Always zero in requests; the backend stamps its own time.
    pub command_time: u64,
    pub option_flag: u8,
    pub payload_len: u16,
}

impl CommandHeader {
    /// A request header with zero time and option.
    pub fn new(command_type: CommandType, payload_len: u16) -> Self {
        Self {
            command_type,
            command_time: 0,
            option_flag: 0,
            payload_len,
        }
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_LEN);
        dst.put_u8(self.command_type.code());
        dst.put_u64(self.command_time);
        dst.put_u8(self.option_flag);
        dst.put_u16(self.payload_len);
    }

    /// Read a header and require the given command type.
    pub fn decode_expecting(reader: &mut ByteReader<'_>, expected: CommandType) -> Result<Self> {
        let found = reader.read_u8()?;
        match CommandType::from_code(found) {
            Some(command_type) if command_type == expected => Ok(Self {
                command_type,
                command_time: reader.read_u64_be()?,
                option_flag: reader.read_u8()?,
                payload_len: reader.read_u16_be()?,
            }),
            _ => Err(ObjectError::UnexpectedCommand { expected, found }),
        }
    }
}

/// Build an objects-up request around an already encoded payload.
pub fn encode_objects_up(payload: &[u8]) -> Result<Bytes> {
    if payload.len() > MAX_UP_PAYLOAD_LEN {
        return Err(ObjectError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_UP_PAYLOAD_LEN,
        });
    }
    let mut dst = BytesMut::with_capacity(HEADER_LEN + payload.len());
    CommandHeader::new(CommandType::ObjectsUp, payload.len() as u16).encode(&mut dst);
    dst.put_slice(payload);
    Ok(dst.freeze())
}

/// Build the 13-byte objects-down request (header plus one reserved byte).
pub fn encode_objects_down_request() -> Bytes {
    let mut dst = BytesMut::with_capacity(HEADER_LEN + 1);
    CommandHeader::new(CommandType::ObjectsDownRequest, 1).encode(&mut dst);
    dst.put_u8(0x00);
    dst.freeze()
}
