/// Start of block.
pub const SOH: u8 = 0x01;
/// End of transmission.
pub const EOT: u8 = 0x04;
/// Positive acknowledgement.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement, also the receiver's start request.
pub const NAK: u8 = 0x15;
/// Cancel.
pub const CAN: u8 = 0x18;
/// Fill for the unused tail of the last block.
pub const PAD: u8 = 0x1A;

/// Payload bytes per block.
pub const PAYLOAD_LEN: usize = 128;
/// Full block: SOH + BN + !BN + payload + checksum.
pub const BLOCK_LEN: usize = 3 + PAYLOAD_LEN + 1;

pub(crate) const BN: usize = 1;
pub(crate) const BN_COMPLEMENT: usize = 2;
pub(crate) const PAYLOAD: std::ops::Range<usize> = 3..3 + PAYLOAD_LEN;
pub(crate) const SUM: usize = BLOCK_LEN - 1;

/// 8-bit additive checksum over `data`.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Fill `block` with a complete block carrying `chunk` (at most 128 bytes).
pub(crate) fn build(block: &mut [u8; BLOCK_LEN], block_no: u8, chunk: &[u8], pad: u8) {
    block[0] = SOH;
    block[BN] = block_no;
    block[BN_COMPLEMENT] = !block_no;
    let payload = &mut block[PAYLOAD];
    payload[..chunk.len()].copy_from_slice(chunk);
    payload[chunk.len()..].fill(pad);
    block[SUM] = checksum(&block[PAYLOAD]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(checksum(&[]), 0x00);
    }

    #[test]
    fn build_pads_short_chunk() {
        let mut block = [0u8; BLOCK_LEN];
        build(&mut block, 1, b"hi", PAD);

        assert_eq!(&block[..3], &[SOH, 0x01, 0xFE]);
        assert_eq!(&block[3..5], b"hi");
        assert!(block[5..SUM].iter().all(|&b| b == PAD));
        assert_eq!(block[SUM], checksum(&block[PAYLOAD]));
    }
}
