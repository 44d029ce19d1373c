//! SysEx message assembly for sample-bank transfers
//!
//! A bank travels as one burst of SysEx messages, each starting with the
//! Novation vendor header and a command byte:
//! - HEADER (0x77): nibble-encoded total length and device memory offset
//! - DATA (0x79): one 7-bit-packed slice of the flat bank image
//! - TRAILER (0x7A): nibble-encoded CRC-32 of the flat image
//!
//! The protocol carries no sequence numbers; DATA order on the wire is the
//! only ordering signal, so reassembly appends in arrival order.

use tracing::{debug, warn};

use crate::{nibble, seven_bit, ProtoError, Result};

/// Novation vendor/device identifier carried by every message.
pub const VENDOR_HEADER: [u8; 4] = [0x00, 0x20, 0x29, 0x00];

pub const CMD_HEADER: u8 = 0x77;
pub const CMD_DATA: u8 = 0x79;
pub const CMD_TRAILER: u8 = 0x7A;

/// Bytes of flat bank image per DATA message, before 7-bit packing.
pub const DATA_CHUNK: usize = 256;

const SYSEX_START: u8 = 0xF0;
const SYSEX_END: u8 = 0xF7;

/// One transport message, decoded by command.
///
/// `Unknown` keeps the forward-compatibility policy explicit: commands this
/// codec does not understand are representable and get skipped during
/// reassembly instead of failing the transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Header { length: u32, offset: u32 },
    Data { packed: Vec<u8> },
    Trailer { checksum: u32 },
    Unknown { command: u8 },
}

impl Envelope {
    /// Build a DATA envelope from one unpacked chunk of the flat image.
    pub fn data_chunk(chunk: &[u8]) -> Self {
        Envelope::Data {
            packed: seven_bit::pack(chunk),
        }
    }

    /// Decode one SysEx message body (vendor header onward, no 0xF0/0xF7).
    ///
    /// Returns `Ok(None)` when the message is too short to carry the vendor
    /// header or the header belongs to another device; such messages are
    /// filtered, not errors. HEADER and TRAILER payloads shorter than their
    /// fixed width are malformed-envelope errors.
    pub fn decode(message: &[u8]) -> Result<Option<Self>> {
        if message.len() < 5 || message[..4] != VENDOR_HEADER {
            return Ok(None);
        }

        let command = message[4];
        let payload = &message[5..];
        let envelope = match command {
            CMD_HEADER => {
                if payload.len() < 16 {
                    return Err(ProtoError::MalformedEnvelope {
                        command,
                        expected: 16,
                        actual: payload.len(),
                    });
                }
                Envelope::Header {
                    length: nibble::decode(&nibble_field(&payload[..8])),
                    offset: nibble::decode(&nibble_field(&payload[8..16])),
                }
            }
            CMD_DATA => Envelope::Data {
                packed: payload.to_vec(),
            },
            CMD_TRAILER => {
                if payload.len() < 8 {
                    return Err(ProtoError::MalformedEnvelope {
                        command,
                        expected: 8,
                        actual: payload.len(),
                    });
                }
                Envelope::Trailer {
                    checksum: nibble::decode(&nibble_field(&payload[..8])),
                }
            }
            other => Envelope::Unknown { command: other },
        };

        Ok(Some(envelope))
    }

    /// Encode the message body: vendor header, command byte, payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut message = Vec::with_capacity(5 + 16);
        message.extend_from_slice(&VENDOR_HEADER);
        match self {
            Envelope::Header { length, offset } => {
                message.push(CMD_HEADER);
                message.extend_from_slice(&nibble::encode(*length));
                message.extend_from_slice(&nibble::encode(*offset));
            }
            Envelope::Data { packed } => {
                message.push(CMD_DATA);
                message.extend_from_slice(packed);
            }
            Envelope::Trailer { checksum } => {
                message.push(CMD_TRAILER);
                message.extend_from_slice(&nibble::encode(*checksum));
            }
            Envelope::Unknown { command } => {
                message.push(*command);
            }
        }
        message
    }
}

fn nibble_field(payload: &[u8]) -> [u8; 8] {
    let mut field = [0u8; 8];
    field.copy_from_slice(&payload[..8]);
    field
}

/// Result of reassembling one message burst.
///
/// The HEADER fields and the transmitted checksum are exposed but never
/// enforced; whether a mismatch is fatal is the caller's call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Reassembled flat bank image, DATA payloads unpacked in arrival order.
    pub data: Vec<u8>,
    /// Total length announced by the HEADER, if one was seen.
    pub declared_length: Option<u32>,
    /// Device memory offset announced by the HEADER, if one was seen.
    pub offset: Option<u32>,
    /// CRC-32 carried by the TRAILER, if one was seen.
    pub checksum: Option<u32>,
}

impl Transfer {
    /// Compare the transmitted checksum against one recomputed over `data`.
    ///
    /// `None` when no trailer was seen. Advisory only; the parse never
    /// fails on a mismatch.
    pub fn verify_checksum(&self) -> Option<bool> {
        self.checksum
            .map(|transmitted| transmitted == crc32fast::hash(&self.data))
    }
}

/// Split a flat bank image into the HEADER / DATA… / TRAILER burst.
///
/// `offset` is the device memory target address; it is caller-assigned, not
/// derived from the content.
pub fn build_messages(flat: &[u8], offset: u32) -> Vec<Envelope> {
    let checksum = crc32fast::hash(flat);
    debug!(
        length = flat.len(),
        offset, checksum, "building transfer messages"
    );

    let mut messages = Vec::with_capacity(2 + flat.len().div_ceil(DATA_CHUNK));
    messages.push(Envelope::Header {
        length: flat.len() as u32,
        offset,
    });
    for chunk in flat.chunks(DATA_CHUNK) {
        messages.push(Envelope::data_chunk(chunk));
    }
    messages.push(Envelope::Trailer { checksum });
    messages
}

/// Reassemble a flat bank image from envelopes in arrival order.
pub fn parse_messages<I>(envelopes: I) -> Transfer
where
    I: IntoIterator<Item = Envelope>,
{
    let mut transfer = Transfer::default();

    for envelope in envelopes {
        match envelope {
            Envelope::Header { length, offset } => {
                transfer.declared_length = Some(length);
                transfer.offset = Some(offset);
            }
            Envelope::Data { packed } => {
                transfer.data.extend(seven_bit::unpack(&packed));
            }
            Envelope::Trailer { checksum } => {
                transfer.checksum = Some(checksum);
            }
            Envelope::Unknown { command } => {
                debug!(command, "skipping unrecognized command");
            }
        }
    }

    if let Some(declared) = transfer.declared_length {
        if declared as usize != transfer.data.len() {
            debug!(
                declared,
                reassembled = transfer.data.len(),
                "header length disagrees with reassembled size"
            );
        }
    }
    if transfer.verify_checksum() == Some(false) {
        warn!("transmitted checksum does not match reassembled data");
    }

    transfer
}

/// Split a binary `.syx` byte stream into message bodies.
///
/// Each message is the bytes between an 0xF0 and the following 0xF7,
/// exclusive. Bytes outside any frame are skipped.
pub fn read_syx(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut messages = Vec::new();
    let mut current: Option<Vec<u8>> = None;

    for &byte in bytes {
        match current.as_mut() {
            None if byte == SYSEX_START => current = Some(Vec::new()),
            None => {}
            Some(_) if byte == SYSEX_END => {
                if let Some(message) = current.take() {
                    messages.push(message);
                }
            }
            Some(message) => message.push(byte),
        }
    }

    messages
}

/// Frame message bodies back into a binary `.syx` byte stream.
pub fn write_syx(messages: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = messages.iter().map(|m| m.len() + 2).sum();
    let mut bytes = Vec::with_capacity(total);
    for message in messages {
        bytes.push(SYSEX_START);
        bytes.extend_from_slice(message);
        bytes.push(SYSEX_END);
    }
    bytes
}

/// Parse a `.syx` file image into a [`Transfer`].
///
/// Messages for other devices and unrecognized commands are filtered the
/// same way a live receiver would ignore them.
pub fn parse_syx(bytes: &[u8]) -> Result<Transfer> {
    let mut envelopes = Vec::new();
    for message in read_syx(bytes) {
        if let Some(envelope) = Envelope::decode(&message)? {
            envelopes.push(envelope);
        }
    }
    Ok(parse_messages(envelopes))
}

/// Build the `.syx` file image for one flat bank transfer.
pub fn build_syx(flat: &[u8], offset: u32) -> Vec<u8> {
    let messages: Vec<Vec<u8>> = build_messages(flat, offset)
        .iter()
        .map(Envelope::encode)
        .collect();
    write_syx(&messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_build_parse_round_trip() {
        for len in [0usize, 1, 255, 256, 513] {
            let flat = ramp(len);
            let transfer = parse_messages(build_messages(&flat, 0x0057_F000));
            assert_eq!(transfer.data, flat, "len={len}");
            assert_eq!(transfer.declared_length, Some(len as u32));
            assert_eq!(transfer.offset, Some(0x0057_F000));
            assert_eq!(transfer.checksum, Some(crc32fast::hash(&flat)));
            assert_eq!(transfer.verify_checksum(), Some(true));
        }
    }

    #[test]
    fn test_chunking_boundary() {
        let messages = build_messages(&ramp(600), 0);
        let data_count = messages
            .iter()
            .filter(|m| matches!(m, Envelope::Data { .. }))
            .count();
        assert_eq!(data_count, 3);
        assert_eq!(messages.len(), 5);

        // 256, 256 and 88 bytes pre-pack.
        let sizes: Vec<usize> = messages
            .iter()
            .filter_map(|m| match m {
                Envelope::Data { packed } => Some(seven_bit::unpack(packed).len()),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![256, 256, 88]);
    }

    #[test]
    fn test_offset_is_caller_assigned() {
        let transfer = parse_messages(build_messages(&ramp(10), 42));
        assert_eq!(transfer.offset, Some(42));
    }

    #[test]
    fn test_envelope_encode_decode() {
        let header = Envelope::Header {
            length: 0x0023_B000,
            offset: 0x0057_F000,
        };
        assert_eq!(Envelope::decode(&header.encode()).unwrap(), Some(header));

        let data = Envelope::data_chunk(&ramp(100));
        assert_eq!(Envelope::decode(&data.encode()).unwrap(), Some(data));

        let trailer = Envelope::Trailer {
            checksum: 0xDEAD_BEEF,
        };
        assert_eq!(Envelope::decode(&trailer.encode()).unwrap(), Some(trailer));
    }

    #[test]
    fn test_foreign_vendor_header_is_filtered() {
        let mut message = Envelope::Trailer { checksum: 1 }.encode();
        message[1] = 0x42;
        assert_eq!(Envelope::decode(&message).unwrap(), None);
        // Too short to carry header + command at all.
        assert_eq!(Envelope::decode(&[0x00, 0x20]).unwrap(), None);
    }

    #[test]
    fn test_unknown_command_is_skipped() {
        let mut envelopes = build_messages(&ramp(20), 0);
        envelopes.insert(1, Envelope::Unknown { command: 0x33 });
        let transfer = parse_messages(envelopes);
        assert_eq!(transfer.data, ramp(20));
    }

    #[test]
    fn test_short_header_payload_is_malformed() {
        let mut message = VENDOR_HEADER.to_vec();
        message.push(CMD_HEADER);
        message.extend_from_slice(&[0u8; 9]);
        assert!(matches!(
            Envelope::decode(&message),
            Err(crate::ProtoError::MalformedEnvelope {
                command: CMD_HEADER,
                expected: 16,
                actual: 9,
            })
        ));
    }

    #[test]
    fn test_short_trailer_payload_is_malformed() {
        let mut message = VENDOR_HEADER.to_vec();
        message.push(CMD_TRAILER);
        message.extend_from_slice(&[0u8; 3]);
        assert!(Envelope::decode(&message).is_err());
    }

    #[test]
    fn test_syx_framing_round_trip() {
        let messages: Vec<Vec<u8>> = build_messages(&ramp(300), 7)
            .iter()
            .map(Envelope::encode)
            .collect();
        assert_eq!(read_syx(&write_syx(&messages)), messages);
    }

    #[test]
    fn test_syx_skips_bytes_outside_frames() {
        let bytes = [0xFE, 0xF0, 0x01, 0x02, 0xF7, 0xF8, 0xF8];
        assert_eq!(read_syx(&bytes), vec![vec![0x01, 0x02]]);
    }

    #[test]
    fn test_syx_file_round_trip() {
        let flat = ramp(1000);
        let transfer = parse_syx(&build_syx(&flat, 0x0057_F000)).unwrap();
        assert_eq!(transfer.data, flat);
        assert_eq!(transfer.verify_checksum(), Some(true));
    }

    #[test]
    fn test_checksum_mismatch_is_advisory() {
        let mut envelopes = build_messages(&ramp(50), 0);
        if let Some(Envelope::Trailer { checksum }) = envelopes.last_mut() {
            *checksum ^= 1;
        }
        let transfer = parse_messages(envelopes);
        // Data still comes back; only the advisory check reports the problem.
        assert_eq!(transfer.data, ramp(50));
        assert_eq!(transfer.verify_checksum(), Some(false));
    }
}
