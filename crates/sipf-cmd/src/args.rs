//! Parameter parsing shared by the command handlers.

use crate::error::{CmdError, Result};

/// Parameters after the single space that follows the command name.
pub(crate) fn params(rest: &[u8]) -> Result<&[u8]> {
    match rest.split_first() {
        Some((b' ', tail)) if !tail.is_empty() => Ok(tail),
        _ => Err(CmdError::IllegalParameter("expected parameters")),
    }
}

/// The command takes no parameters.
pub(crate) fn none(rest: &[u8]) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(CmdError::IllegalParameter("unexpected parameters"))
    }
}

/// Space-separated fields.
pub(crate) fn fields(params: &[u8]) -> Vec<&[u8]> {
    params.split(|&b| b == b' ').collect()
}

/// Exactly two hex digits.
pub(crate) fn hex_u8(field: &[u8]) -> Result<u8> {
    match hex_fixed::<1>(field) {
        Some([byte]) => Ok(byte),
        None => Err(CmdError::IllegalParameter("expected two hex digits")),
    }
}

/// Exactly eight hex digits, most significant first.
pub(crate) fn hex_u32(field: &[u8]) -> Result<u32> {
    hex_fixed::<4>(field)
        .map(u32::from_be_bytes)
        .ok_or(CmdError::IllegalParameter("expected eight hex digits"))
}

/// An even number of hex digits.
pub(crate) fn hex_bytes(field: &[u8]) -> Result<Vec<u8>> {
    hex::decode(field).map_err(|_| CmdError::IllegalParameter("malformed hex value"))
}

/// UTF-8 text parameter.
pub(crate) fn text(field: &[u8]) -> Result<&str> {
    std::str::from_utf8(field).map_err(|_| CmdError::IllegalParameter("parameter is not text"))
}

fn hex_fixed<const N: usize>(field: &[u8]) -> Option<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(field, &mut out).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_need_leading_space() {
        assert_eq!(params(b" 01 02").unwrap(), b"01 02");
        assert!(params(b"01").is_err());
        assert!(params(b" ").is_err());
        assert!(params(b"").is_err());
    }

    #[test]
    fn hex_fields() {
        assert_eq!(hex_u8(b"fF").unwrap(), 0xFF);
        assert!(hex_u8(b"F").is_err());
        assert!(hex_u8(b"0G").is_err());
        assert!(hex_u8(b"001").is_err());
        assert_eq!(hex_u32(b"000001F4").unwrap(), 0x1F4);
        assert!(hex_u32(b"1F4").is_err());
        assert_eq!(hex_bytes(b"0a0B").unwrap(), vec![0x0A, 0x0B]);
        assert!(hex_bytes(b"abc").is_err());
    }
}
