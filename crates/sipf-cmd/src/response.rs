use std::fmt::Write;

use sipf_object::{DownloadResult, Otid};

pub const OK: &[u8] = b"OK\r\n";
pub const NG: &[u8] = b"NG\r\n";
pub const ILLEGAL_PARAMETER: &[u8] = b"ILLEGAL PARAMETER\r\nNG\r\n";
pub const NG_AFTER_TRANSFER: &[u8] = b"\r\nNG\r\n";

/// `<OTID>\r\nOK\r\n`.
pub fn otid(otid: &Otid) -> Vec<u8> {
    format!("{otid}\r\nOK\r\n").into_bytes()
}

/// `<value:2hex>\r\nOK\r\n`.
pub fn register_value(value: u8) -> Vec<u8> {
    format!("{value:02X}\r\nOK\r\n").into_bytes()
}

/// `<size:8hex>\r\nOK\r\n`, with a leading blank line after a block send.
pub fn file_size(size: u32, after_transfer: bool) -> Vec<u8> {
    let lead = if after_transfer { "\r\n" } else { "" };
    format!("{lead}{size:08X}\r\nOK\r\n").into_bytes()
}

/// Listing of a downlink batch, or a bare `OK` when it is empty.
pub fn download(result: &DownloadResult) -> Vec<u8> {
    if result.is_empty() {
        return OK.to_vec();
    }

    let mut out = String::with_capacity(128 + result.objects.len() * 16);
    let _ = write!(out, "{}\r\n", result.otid);
    let _ = write!(out, "{}\r\n", hex::encode_upper(result.user_send_datetime));
    let _ = write!(out, "{}\r\n", hex::encode_upper(result.received_datetime));
    let _ = write!(out, "{:02X}\r\n", result.remains);
    let _ = write!(out, "{:02X}\r\n", result.objects.len());
    for object in &result.objects {
        let wire = object.wire_value();
        let _ = write!(
            out,
            "{:02X} {:02X} {:02X} {}\r\n",
            object.tag_id(),
            object.obj_type().code(),
            wire.len(),
            hex::encode_upper(&wire)
        );
    }
    out.push_str("OK\r\n");
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use sipf_object::SipfObject;

    use super::*;

    #[test]
    fn empty_download_is_plain_ok() {
        let result = DownloadResult {
            otid: Otid::new([0; 16]),
            user_send_datetime: [0; 8],
            received_datetime: [0; 8],
            remains: 3,
            objects: Vec::new(),
        };
        assert_eq!(download(&result), OK);
    }

    #[test]
    fn download_listing_uses_wire_order() {
        let result = DownloadResult {
            otid: Otid::new([0xAB; 16]),
            user_send_datetime: [0, 0, 0, 0, 0, 0, 0x01, 0x02],
            received_datetime: [0, 0, 0, 0, 0, 0, 0x03, 0x04],
            remains: 1,
            objects: vec![
                SipfObject::uint16(0x10, 0x1234),
                SipfObject::string(0x11, "hi").unwrap(),
            ],
        };
        let text = String::from_utf8(download(&result)).unwrap();
        let expected = format!(
            "{}\r\n0000000000000102\r\n0000000000000304\r\n01\r\n02\r\n10 02 02 1234\r\n11 20 02 6869\r\nOK\r\n",
            "AB".repeat(16)
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn file_size_rendering() {
        assert_eq!(file_size(0x1F4, false), b"000001F4\r\nOK\r\n");
        assert_eq!(file_size(0x1F4, true), b"\r\n000001F4\r\nOK\r\n");
    }
}
