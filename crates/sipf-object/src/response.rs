use std::fmt;

use sipf_frame::ByteReader;
use tracing::debug;

use crate::envelope::{CommandHeader, CommandType, HEADER_LEN};
use crate::error::{ObjectError, Result};
use crate::object::{ObjectType, SipfObject, MAX_OBJECTS};

/// Length of an objid notification: header + result + reserved + OTID.
pub const NOTIFICATION_LEN: usize = HEADER_LEN + 2 + Otid::LEN;

/// Fixed part of an objects-down payload before the object list.
pub const DOWN_FIXED_LEN: usize = 1 + Otid::LEN + 8 + 8 + 1 + 1;

/// Largest objects-down body accepted.
pub const MAX_DOWN_LEN: usize = HEADER_LEN + 1500;

/// Opaque 16-byte transaction id assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Otid([u8; 16]);

impl Otid {
    pub const LEN: usize = 16;

    pub fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Otid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

/// Parse the backend's reply to an objects-up request.
pub fn decode_objid_notification(body: &[u8]) -> Result<Otid> {
    if body.len() != NOTIFICATION_LEN {
        return Err(ObjectError::ResponseLength { len: body.len() });
    }
    let mut reader = ByteReader::new(body);
    CommandHeader::decode_expecting(&mut reader, CommandType::ObjidNotification)?;

    let result = reader.read_u8()?;
    if result != 0x00 {
        return Err(ObjectError::RequestFailed(result));
    }
    reader.skip(1)?;
    Ok(Otid(reader.read_array()?))
}

/// One batch of downlink objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub otid: Otid,
    /// Time the sender queued the objects, as sent by the backend.
    pub user_send_datetime: [u8; 8],
    /// Time the backend received them.
    pub received_datetime: [u8; 8],
    /// Batches still waiting after this one.
    pub remains: u8,
    pub objects: Vec<SipfObject>,
}

impl DownloadResult {
    /// True when the queue was empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Send time as epoch milliseconds.
    pub fn user_send_millis(&self) -> u64 {
        u64::from_be_bytes(self.user_send_datetime)
    }

    /// Receive time as epoch milliseconds.
    pub fn received_millis(&self) -> u64 {
        u64::from_be_bytes(self.received_datetime)
    }
}

/// Parse the backend's reply to an objects-down request.
pub fn decode_objects_down(body: &[u8]) -> Result<DownloadResult> {
    if body.len() < HEADER_LEN || body.len() > MAX_DOWN_LEN {
        return Err(ObjectError::ResponseLength { len: body.len() });
    }
    let mut reader = ByteReader::new(body);
    let header = CommandHeader::decode_expecting(&mut reader, CommandType::ObjectsDown)?;
    if usize::from(header.payload_len) != reader.remaining() {
        debug!(
            declared = header.payload_len,
            actual = reader.remaining(),
            "objects-down length disagrees with body"
        );
    }

    let result = reader.read_u8()?;
    if result != 0x00 {
        return Err(ObjectError::RequestFailed(result));
    }
    let otid = Otid(reader.read_array()?);
    let user_send_datetime = reader.read_array()?;
    let received_datetime = reader.read_array()?;
    let remains = reader.read_u8()?;
    reader.skip(1)?;

    let mut objects = Vec::new();
    while !reader.is_empty() && objects.len() < MAX_OBJECTS {
        let obj_type = ObjectType::try_from(reader.read_u8()?)?;
        let tag_id = reader.read_u8()?;
        let len = usize::from(reader.read_u8()?);
        let wire = reader.read_bytes(len)?;
        objects.push(SipfObject::from_wire(obj_type, tag_id, wire)?);
    }

    debug!(%otid, count = objects.len(), remains, "objects-down parsed");
    Ok(DownloadResult {
        otid,
        user_send_datetime,
        received_datetime,
        remains,
        objects,
    })
}
