use sipf_object::{ObjectType, ObjectsUp, SipfObject};
use sipf_transport::ByteChannel;
use tracing::debug;

use crate::args;
use crate::error::{CmdError, Result};
use crate::response;
use crate::session::CommandSession;

impl<C: ByteChannel> CommandSession<C> {
    /// `TXRAW <size> <hexbytes>`: upload an already encoded object payload.
    pub(crate) fn cmd_tx_raw(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        self.unlocked = false;
        let params = args::params(rest)?;
        let fields = args::fields(params);
        let [size, data] = fields[..] else {
            return Err(CmdError::IllegalParameter("expected <size> <hexbytes>"));
        };
        let size = args::hex_u8(size)?;
        if size == 0 {
            return Err(CmdError::IllegalParameter("size must be at least 1"));
        }
        if data.len() != usize::from(size) * 2 {
            return Err(CmdError::IllegalParameter("data length does not match size"));
        }
        let payload = args::hex_bytes(data)?;
        debug!(size, "TXRAW");

        self.refresh_credentials();
        let otid = self.objects.upload_raw(&payload)?;
        Ok(response::otid(&otid))
    }

    /// `TX <tag> <type> <value> [<tag> <type> <value> ...]`
    pub(crate) fn cmd_tx(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        self.unlocked = false;
        let objects = parse_objects(args::params(rest)?)?;
        debug!(count = objects.obj_qty(), "TX");

        self.refresh_credentials();
        let otid = self.objects.upload(&objects)?;
        Ok(response::otid(&otid))
    }

    /// `RX`
    pub(crate) fn cmd_rx(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        args::none(rest)?;
        self.refresh_credentials();
        let result = self.objects.download()?;
        debug!(remains = result.remains, count = result.objects.len(), "RX");
        Ok(response::download(&result))
    }
}

/// Parse `tag type value` triples; values are hex in wire byte order.
fn parse_objects(params: &[u8]) -> Result<ObjectsUp> {
    let fields = args::fields(params);
    if fields.is_empty() || fields.len() % 3 != 0 {
        return Err(CmdError::IllegalParameter("expected <tag> <type> <value> triples"));
    }

    let mut objects = ObjectsUp::new();
    for triple in fields.chunks_exact(3) {
        let tag_id = args::hex_u8(triple[0])?;
        let obj_type = ObjectType::try_from(args::hex_u8(triple[1])?)
            .map_err(|_| CmdError::IllegalParameter("unknown object type"))?;
        let value = args::hex_bytes(triple[2])?;
        let object = SipfObject::from_wire(obj_type, tag_id, &value)
            .map_err(|_| CmdError::IllegalParameter("value length does not match type"))?;
        objects
            .push(object)
            .map_err(|_| CmdError::IllegalParameter("too many objects"))?;
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_triples() {
        let objects = parse_objects(b"01 02 0A0B 02 20 6869").unwrap();
        assert_eq!(objects.obj_qty(), 2);
        assert_eq!(
            objects.encode_payload(),
            vec![0x02, 0x01, 0x02, 0x0A, 0x0B, 0x20, 0x02, 0x02, 0x68, 0x69]
        );
    }

    #[test]
    fn rejects_bad_triples() {
        assert!(parse_objects(b"01 02").is_err());
        assert!(parse_objects(b"01 02 0A").is_err());
        assert!(parse_objects(b"01 7F 00").is_err());
        assert!(parse_objects(b"01 04 0102").is_err());
        assert!(parse_objects(b"01 00 0").is_err());
    }
}
