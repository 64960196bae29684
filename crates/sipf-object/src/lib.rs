//! SIPF typed object codec and envelope frames.
//!
//! Objects travel as `[type, tag, len, value...]`. Multi-byte numeric values
//! are held little-endian in memory and written big-endian on the wire; byte
//! values, binary blobs and strings are copied as-is.
//!
//! Requests and responses exchanged with the backend wrap objects in a
//! 12-byte envelope:
//!
//! ```text
//! ┌──────────┬──────────────┬────────────┬──────────────┬─────────────┐
//! │ Type (1) │ Time (8, BE) │ Option (1) │ Len (2, BE)  │ Payload     │
//! └──────────┴──────────────┴────────────┴──────────────┴─────────────┘
//! ```

pub mod envelope;
pub mod error;
pub mod object;
pub mod response;

pub use envelope::{
    encode_objects_down_request, encode_objects_up, CommandHeader, CommandType, HEADER_LEN,
    MAX_UP_PAYLOAD_LEN,
};
pub use error::{ObjectError, Result};
pub use object::{
    ObjectType, ObjectsUp, SipfObject, MAX_FRAME_LEN, MAX_OBJECTS, MAX_VARIABLE_LEN,
    MIN_FRAME_LEN, OBJECT_HEADER_LEN,
};
pub use response::{decode_objects_down, decode_objid_notification, DownloadResult, Otid};
