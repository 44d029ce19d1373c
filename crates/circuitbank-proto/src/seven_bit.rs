//! 7-bit-safe packing of arbitrary bytes
//!
//! SysEx payload bytes must keep their high bit clear. The Circuit groups
//! data in runs of 7: a flag byte collects the high bits (bit k belongs to
//! the k-th byte of the group), then the 7 bytes follow with bit 7 masked
//! off. A trailing group may be shorter than 7 bytes.

/// Pack 8-bit data into the 7-bit-safe group format.
///
/// Output is one flag byte plus up to 7 masked data bytes per group. A
/// partial final group emits the flag and only the bytes that exist; empty
/// input emits nothing.
pub fn pack(data: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(data.len() + data.len() / 7 + 1);

    for group in data.chunks(7) {
        let mut flags = 0u8;
        for (k, &byte) in group.iter().enumerate() {
            flags |= (byte & 0x80) >> (7 - k);
        }
        packet.push(flags);
        packet.extend(group.iter().map(|&byte| byte & 0x7F));
    }

    packet
}

/// Reverse [`pack`]: consume flag-plus-data groups and restore high bits.
///
/// A final group shorter than 8 bytes is consumed as-is; only the data
/// bytes actually present are restored.
pub fn unpack(packet: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(packet.len());

    for group in packet.chunks(8) {
        let flags = group[0];
        for (k, &byte) in group[1..].iter().enumerate() {
            if flags & (1 << k) != 0 {
                data.push(byte | 0x80);
            } else {
                data.push(byte);
            }
        }
    }

    data
}
