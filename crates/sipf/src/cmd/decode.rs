use sipf_frame::ByteReader;
use sipf_object::{decode_objects_down, ObjectType, SipfObject};

use crate::cmd::DecodeArgs;
use crate::exit::{object_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_download, print_objects, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex)?;

    if args.down {
        let result =
            decode_objects_down(&bytes).map_err(|err| object_error("decode failed", err))?;
        print_download(&result, format);
    } else {
        let objects = decode_sequence(&bytes).map_err(|err| object_error("decode failed", err))?;
        print_objects(&objects, format);
    }
    Ok(SUCCESS)
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() {
        return Err(CliError::new(DATA_INVALID, "no input bytes"));
    }
    hex::decode(&digits).map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex: {err}")))
}

/// Back-to-back `[type, tag, len, value...]` objects, as in an objects-up payload.
fn decode_sequence(bytes: &[u8]) -> sipf_object::Result<Vec<SipfObject>> {
    let mut reader = ByteReader::new(bytes);
    let mut objects = Vec::new();
    while !reader.is_empty() {
        let obj_type = ObjectType::try_from(reader.read_u8()?)?;
        let tag_id = reader.read_u8()?;
        let len = usize::from(reader.read_u8()?);
        let wire = reader.read_bytes(len)?;
        objects.push(SipfObject::from_wire(obj_type, tag_id, wire)?);
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_ignores_whitespace() {
        assert_eq!(parse_hex("02 01\n02 12 34").unwrap(), [0x02, 0x01, 0x02, 0x12, 0x34]);
    }

    #[test]
    fn parse_hex_rejects_odd_digits() {
        assert_eq!(parse_hex("0A1").unwrap_err().code, DATA_INVALID);
        assert_eq!(parse_hex("  ").unwrap_err().code, DATA_INVALID);
    }

    #[test]
    fn decodes_objects_back_to_back() {
        let bytes = [
            0x02, 0x01, 0x02, 0x12, 0x34, // uint16 tag 1
            0x20, 0x02, 0x02, b'h', b'i', // string tag 2
        ];
        let objects = decode_sequence(&bytes).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0], SipfObject::uint16(0x01, 0x1234));
        assert_eq!(objects[1], SipfObject::string(0x02, "hi").unwrap());
    }

    #[test]
    fn truncated_value_is_an_error() {
        assert!(decode_sequence(&[0x04, 0x01, 0x04, 0x00, 0x00]).is_err());
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(decode_sequence(&[0x42, 0x01, 0x01, 0x00]).is_err());
    }
}
