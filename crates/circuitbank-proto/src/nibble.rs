//! Nibble encoding for 32-bit transfer fields
//!
//! The protocol transmits length, offset and checksum as 8 bytes, one 4-bit
//! nibble per byte, most significant nibble first. The high half of every
//! transmitted byte stays clear, which keeps the field 7-bit safe without
//! going through the bit packer.

/// Spread a 32-bit value over 8 bytes, one nibble each, MSB first.
pub fn encode(value: u32) -> [u8; 8] {
    let mut out = [0u8; 8];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = ((value >> (4 * (7 - i))) & 0x0F) as u8;
    }
    out
}

/// Fold 8 nibble bytes back into a 32-bit value.
///
/// Only the low nibble of each input byte participates; stray high bits are
/// ignored rather than rejected.
pub fn decode(bytes: &[u8; 8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| (acc << 4) | u32::from(b & 0x0F))
}
