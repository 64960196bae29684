use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::error::{ObjectError, Result};

/// `type + tag + len` prefix of every encoded object.
pub const OBJECT_HEADER_LEN: usize = 3;

/// Shortest encoded object accepted by [`SipfObject::decode`].
pub const MIN_FRAME_LEN: usize = 4;

/// Longest encoded object accepted by [`SipfObject::decode`].
pub const MAX_FRAME_LEN: usize = 256;

/// Largest value for binary and string objects.
///
/// Keeps every encodable object within [`MAX_FRAME_LEN`].
pub const MAX_VARIABLE_LEN: usize = MAX_FRAME_LEN - OBJECT_HEADER_LEN;

/// Most objects one upload or download may carry.
pub const MAX_OBJECTS: usize = 255;

/// Object type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectType {
    Uint8 = 0x00,
    Int8 = 0x01,
    Uint16 = 0x02,
    Int16 = 0x03,
    Uint32 = 0x04,
    Int32 = 0x05,
    Uint64 = 0x06,
    Int64 = 0x07,
    Float32 = 0x08,
    Float64 = 0x09,
    /// Binary, base64-encoded by the backend.
    BinBase64 = 0x10,
    StrUtf8 = 0x20,
}

impl ObjectType {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        let obj_type = match code {
            0x00 => Self::Uint8,
            0x01 => Self::Int8,
            0x02 => Self::Uint16,
            0x03 => Self::Int16,
            0x04 => Self::Uint32,
            0x05 => Self::Int32,
            0x06 => Self::Uint64,
            0x07 => Self::Int64,
            0x08 => Self::Float32,
            0x09 => Self::Float64,
            0x10 => Self::BinBase64,
            0x20 => Self::StrUtf8,
            _ => return None,
        };
        Some(obj_type)
    }

    /// Value size for fixed-width types, `None` for binary and string.
    pub const fn fixed_len(self) -> Option<usize> {
        match self {
            Self::Uint8 | Self::Int8 => Some(1),
            Self::Uint16 | Self::Int16 => Some(2),
            Self::Uint32 | Self::Int32 | Self::Float32 => Some(4),
            Self::Uint64 | Self::Int64 | Self::Float64 => Some(8),
            Self::BinBase64 | Self::StrUtf8 => None,
        }
    }

    /// Multi-byte numerics are byte-reversed between memory and wire.
    pub const fn is_byte_swapped(self) -> bool {
        matches!(self.fixed_len(), Some(len) if len > 1)
    }

    /// Check that `len` is a legal value length for this type.
    pub fn check_len(self, len: usize) -> Result<()> {
        let ok = match self.fixed_len() {
            Some(fixed) => len == fixed,
            None => len <= MAX_VARIABLE_LEN,
        };
        if ok {
            Ok(())
        } else {
            Err(ObjectError::LengthMismatch {
                obj_type: self,
                len,
            })
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Uint8 => "uint8",
            Self::Int8 => "int8",
            Self::Uint16 => "uint16",
            Self::Int16 => "int16",
            Self::Uint32 => "uint32",
            Self::Int32 => "int32",
            Self::Uint64 => "uint64",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::BinBase64 => "bin_base64",
            Self::StrUtf8 => "str_utf8",
        }
    }
}

impl TryFrom<u8> for ObjectType {
    type Error = ObjectError;

    fn try_from(code: u8) -> Result<Self> {
        Self::from_code(code).ok_or(ObjectError::UnknownType(code))
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed value with a tag.
///
/// The value length always matches the type; construction validates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipfObject {
    obj_type: ObjectType,
    tag_id: u8,
    value: Vec<u8>,
}

impl SipfObject {
    /// Build an object from in-memory value bytes (little-endian for numerics).
    pub fn new(obj_type: ObjectType, tag_id: u8, value: impl Into<Vec<u8>>) -> Result<Self> {
        let value = value.into();
        obj_type.check_len(value.len())?;
        Ok(Self {
            obj_type,
            tag_id,
            value,
        })
    }

    /// Build an object from value bytes in wire order.
    pub fn from_wire(obj_type: ObjectType, tag_id: u8, wire: &[u8]) -> Result<Self> {
        let mut value = wire.to_vec();
        if obj_type.is_byte_swapped() {
            value.reverse();
        }
        Self::new(obj_type, tag_id, value)
    }

    pub fn uint8(tag_id: u8, value: u8) -> Self {
        Self::fixed(ObjectType::Uint8, tag_id, &[value])
    }

    pub fn int8(tag_id: u8, value: i8) -> Self {
        Self::fixed(ObjectType::Int8, tag_id, &value.to_le_bytes())
    }

    pub fn uint16(tag_id: u8, value: u16) -> Self {
        Self::fixed(ObjectType::Uint16, tag_id, &value.to_le_bytes())
    }

    pub fn int16(tag_id: u8, value: i16) -> Self {
        Self::fixed(ObjectType::Int16, tag_id, &value.to_le_bytes())
    }

    pub fn uint32(tag_id: u8, value: u32) -> Self {
        Self::fixed(ObjectType::Uint32, tag_id, &value.to_le_bytes())
    }

    pub fn int32(tag_id: u8, value: i32) -> Self {
        Self::fixed(ObjectType::Int32, tag_id, &value.to_le_bytes())
    }

    pub fn uint64(tag_id: u8, value: u64) -> Self {
        Self::fixed(ObjectType::Uint64, tag_id, &value.to_le_bytes())
    }

    pub fn int64(tag_id: u8, value: i64) -> Self {
        Self::fixed(ObjectType::Int64, tag_id, &value.to_le_bytes())
    }

    pub fn float32(tag_id: u8, value: f32) -> Self {
        Self::fixed(ObjectType::Float32, tag_id, &value.to_le_bytes())
    }

    pub fn float64(tag_id: u8, value: f64) -> Self {
        Self::fixed(ObjectType::Float64, tag_id, &value.to_le_bytes())
    }

    /// A UTF-8 string object. Fails when longer than [`MAX_VARIABLE_LEN`].
    pub fn string(tag_id: u8, value: &str) -> Result<Self> {
        Self::new(ObjectType::StrUtf8, tag_id, value.as_bytes())
    }

    /// A binary object. Fails when longer than [`MAX_VARIABLE_LEN`].
    pub fn binary(tag_id: u8, value: &[u8]) -> Result<Self> {
        Self::new(ObjectType::BinBase64, tag_id, value)
    }

    fn fixed(obj_type: ObjectType, tag_id: u8, value: &[u8]) -> Self {
        Self {
            obj_type,
            tag_id,
            value: value.to_vec(),
        }
    }

    pub fn obj_type(&self) -> ObjectType {
        self.obj_type
    }

    pub fn tag_id(&self) -> u8 {
        self.tag_id
    }

    /// Value bytes in memory order.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn value_len(&self) -> usize {
        self.value.len()
    }

    /// Value bytes in wire order.
    pub fn wire_value(&self) -> Vec<u8> {
        let mut wire = self.value.clone();
        if self.obj_type.is_byte_swapped() {
            wire.reverse();
        }
        wire
    }

    /// Size of the encoded object.
    pub fn encoded_len(&self) -> usize {
        OBJECT_HEADER_LEN + self.value.len()
    }

    /// Append the wire form to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_u8(self.obj_type.code());
        dst.put_u8(self.tag_id);
        dst.put_u8(self.value.len() as u8);
        if self.obj_type.is_byte_swapped() {
            dst.extend(self.value.iter().rev());
        } else {
            dst.put_slice(&self.value);
        }
    }

    /// The wire form as a standalone buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut dst = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut dst);
        dst.to_vec()
    }

    /// Decode exactly one encoded object.
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() < MIN_FRAME_LEN {
            return Err(ObjectError::FrameTooShort {
                len: src.len(),
                min: MIN_FRAME_LEN,
            });
        }
        if src.len() > MAX_FRAME_LEN {
            return Err(ObjectError::FrameTooLong {
                len: src.len(),
                max: MAX_FRAME_LEN,
            });
        }

        let obj_type = ObjectType::try_from(src[0])?;
        let tag_id = src[1];
        let declared = usize::from(src[2]);
        let wire = &src[OBJECT_HEADER_LEN..];
        if declared != wire.len() {
            return Err(ObjectError::DeclaredLength {
                declared,
                actual: wire.len(),
            });
        }
        Self::from_wire(obj_type, tag_id, wire)
    }
}

/// Objects uploaded together in one request.
///
/// The wire payload is the objects back to back; the count is not encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectsUp {
    objects: Vec<SipfObject>,
}

impl ObjectsUp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object. At most [`MAX_OBJECTS`] fit in one upload.
    pub fn push(&mut self, object: SipfObject) -> Result<()> {
        if self.objects.len() >= MAX_OBJECTS {
            return Err(ObjectError::TooManyObjects { max: MAX_OBJECTS });
        }
        self.objects.push(object);
        Ok(())
    }

    pub fn obj_qty(&self) -> usize {
        self.objects.len()
    }

    pub fn objects(&self) -> &[SipfObject] {
        &self.objects
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Concatenated wire form of every object.
    pub fn encode_payload(&self) -> Vec<u8> {
        let len = self.objects.iter().map(SipfObject::encoded_len).sum();
        let mut dst = BytesMut::with_capacity(len);
        for object in &self.objects {
            object.encode(&mut dst);
        }
        dst.to_vec()
    }
}

impl TryFrom<Vec<SipfObject>> for ObjectsUp {
    type Error = ObjectError;

    fn try_from(objects: Vec<SipfObject>) -> Result<Self> {
        if objects.len() > MAX_OBJECTS {
            return Err(ObjectError::TooManyObjects { max: MAX_OBJECTS });
        }
        Ok(Self { objects })
    }
}
