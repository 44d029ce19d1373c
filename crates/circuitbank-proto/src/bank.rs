//! Fixed binary layout of the sample bank
//!
//! The flat bank image the transport carries is one count byte followed by
//! `count` records, each `{u8 channels, u8 bits, u32le rate, u32le length,
//! length bytes data}` with no padding between records. Sample data for
//! widths above 8 bits is stored big-endian per word; see [`crate::endian`].

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use crate::{ProtoError, Result};

/// Vendor-defined transfer constants for the Circuit.
///
/// Threaded explicitly into padding and capacity checks; callers may
/// override the memory offset per transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    /// Maximum serialized bank size the device accepts, in bytes.
    pub capacity: usize,
    /// Default device memory address for the bank image.
    pub memory_offset: u32,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            capacity: 0x0023_B000,
            memory_offset: 0x0057_F000,
        }
    }
}

/// One sample slot: audio format header plus raw payload bytes.
///
/// The on-wire `length` field is always written from `data.len()`, so the
/// two cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    pub channels: u8,
    /// Sample width in bits, normally 8 or 16.
    pub bits: u8,
    /// Sample rate in Hz.
    pub rate: u32,
    /// Raw audio payload, big-endian per word when `bits > 8`.
    pub data: Vec<u8>,
}

impl SampleRecord {
    /// Bytes per sample word.
    pub fn width(&self) -> usize {
        usize::from(self.bits / 8)
    }

    /// Playback duration in seconds, for summaries.
    pub fn duration_secs(&self) -> f64 {
        let denom = f64::from(self.bits) * f64::from(self.rate);
        if denom == 0.0 {
            return 0.0;
        }
        (self.data.len() as f64) * 8.0 / denom
    }

    fn serialized_len(&self) -> usize {
        1 + 1 + 4 + 4 + self.data.len()
    }
}

/// An ordered bank of sample records, slot order significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleBank {
    pub records: Vec<SampleRecord>,
}

impl SampleBank {
    /// Parse a flat bank image.
    ///
    /// Consumes exactly `count` records; running out of bytes mid-record is
    /// a truncation error. Anything after the last record (the zero padding
    /// a full-capacity dump carries) is ignored.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(buf);

        let count = cursor
            .read_u8()
            .map_err(|_| ProtoError::Truncated("missing count byte".into()))?;

        let mut records = Vec::with_capacity(usize::from(count));
        for slot in 1..=count {
            records.push(Self::parse_record(&mut cursor, slot, count)?);
        }

        debug!(count, "parsed sample bank");
        Ok(Self { records })
    }

    fn parse_record(cursor: &mut Cursor<&[u8]>, slot: u8, count: u8) -> Result<SampleRecord> {
        let truncated =
            |what: &str| ProtoError::Truncated(format!("{what} of record {slot}/{count}"));

        let channels = cursor.read_u8().map_err(|_| truncated("channels"))?;
        let bits = cursor.read_u8().map_err(|_| truncated("bit depth"))?;
        let rate = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| truncated("sample rate"))?;
        let length = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| truncated("length"))?;

        let mut data = vec![0u8; length as usize];
        cursor.read_exact(&mut data).map_err(|_| truncated("data"))?;

        Ok(SampleRecord {
            channels,
            bits,
            rate,
            data,
        })
    }

    /// Serialize to the flat layout, records in slot order.
    ///
    /// The count byte is derived from the record list; more than 255
    /// records cannot be represented.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.records.len() > usize::from(u8::MAX) {
            return Err(ProtoError::TooManySamples(self.records.len()));
        }

        let total = 1 + self
            .records
            .iter()
            .map(SampleRecord::serialized_len)
            .sum::<usize>();
        let mut bytes = Vec::with_capacity(total);

        bytes.push(self.records.len() as u8);
        for record in &self.records {
            bytes.push(record.channels);
            bytes.push(record.bits);
            bytes.extend_from_slice(&record.rate.to_le_bytes());
            bytes.extend_from_slice(&(record.data.len() as u32).to_le_bytes());
            bytes.extend_from_slice(&record.data);
        }

        Ok(bytes)
    }

    /// Serialize for transfer: capacity-checked, zero-padded to capacity
    /// unless `pad` is false.
    pub fn to_transfer_payload(&self, limits: &DeviceLimits, pad: bool) -> Result<Vec<u8>> {
        let mut bytes = self.to_bytes()?;
        if bytes.len() > limits.capacity {
            return Err(ProtoError::OverCapacity {
                size: bytes.len(),
                capacity: limits.capacity,
            });
        }
        if pad {
            bytes.resize(limits.capacity, 0);
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(bits: u8, data: &[u8]) -> SampleRecord {
        SampleRecord {
            channels: 1,
            bits,
            rate: 48_000,
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_empty_bank_round_trip() {
        let bank = SampleBank::default();
        let bytes = bank.to_bytes().unwrap();
        assert_eq!(bytes, vec![0]);
        assert_eq!(SampleBank::parse(&bytes).unwrap(), bank);
    }

    #[test]
    fn test_bank_round_trip() {
        let bank = SampleBank {
            records: vec![
                record(16, &[0x01, 0x02, 0x03, 0x04]),
                record(8, &[]),
                record(16, &[0xFF; 33]),
            ],
        };
        let parsed = SampleBank::parse(&bank.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, bank);
    }

    #[test]
    fn test_layout_is_fixed() {
        let bank = SampleBank {
            records: vec![record(16, &[0xAA, 0xBB])],
        };
        assert_eq!(
            bank.to_bytes().unwrap(),
            vec![
                1, // count
                1, 16, // channels, bits
                0x80, 0xBB, 0x00, 0x00, // 48000 LE
                0x02, 0x00, 0x00, 0x00, // length LE
                0xAA, 0xBB,
            ]
        );
    }

    #[test]
    fn test_trailing_padding_is_ignored() {
        let bank = SampleBank {
            records: vec![record(16, &[1, 2, 3, 4])],
        };
        let mut bytes = bank.to_bytes().unwrap();
        bytes.extend_from_slice(&[0u8; 512]);
        assert_eq!(SampleBank::parse(&bytes).unwrap(), bank);
    }

    #[test]
    fn test_truncated_data_is_an_error() {
        let bank = SampleBank {
            records: vec![record(16, &[1, 2, 3, 4])],
        };
        let bytes = bank.to_bytes().unwrap();
        let err = SampleBank::parse(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, ProtoError::Truncated(_)));
    }

    #[test]
    fn test_truncated_header_is_an_error() {
        // Count says one record but only the channels byte follows.
        assert!(SampleBank::parse(&[1, 1]).is_err());
        assert!(SampleBank::parse(&[]).is_err());
    }

    #[test]
    fn test_over_capacity_is_an_error() {
        let limits = DeviceLimits {
            capacity: 16,
            memory_offset: 0,
        };
        let bank = SampleBank {
            records: vec![record(16, &[0u8; 32])],
        };
        assert!(matches!(
            bank.to_transfer_payload(&limits, true),
            Err(ProtoError::OverCapacity { .. })
        ));
    }

    #[test]
    fn test_padding_policy() {
        let limits = DeviceLimits {
            capacity: 64,
            memory_offset: 0,
        };
        let bank = SampleBank {
            records: vec![record(8, &[9, 9])],
        };

        let padded = bank.to_transfer_payload(&limits, true).unwrap();
        assert_eq!(padded.len(), 64);
        assert!(padded[13..].iter().all(|&b| b == 0));

        let unpadded = bank.to_transfer_payload(&limits, false).unwrap();
        assert_eq!(unpadded, bank.to_bytes().unwrap());
    }

    #[test]
    fn test_count_range() {
        let bank = SampleBank {
            records: vec![record(8, &[]); 256],
        };
        assert!(matches!(
            bank.to_bytes(),
            Err(ProtoError::TooManySamples(256))
        ));
    }

    #[test]
    fn test_duration() {
        // 4 bytes of 16-bit mono at 48 kHz = 2 frames.
        let r = record(16, &[1, 2, 3, 4]);
        assert!((r.duration_secs() - 2.0 / 48_000.0).abs() < 1e-12);
        assert_eq!(r.width(), 2);
    }

    #[test]
    fn test_full_transfer_scenario() {
        // One 16-bit record, padded to device capacity, survives the full
        // build/parse cycle byte-identically.
        let bank = SampleBank {
            records: vec![record(16, &[0x01, 0x02, 0x03, 0x04])],
        };
        let limits = DeviceLimits::default();
        let flat = bank.to_transfer_payload(&limits, true).unwrap();
        assert_eq!(flat.len(), limits.capacity);

        let transfer =
            crate::sysex::parse_messages(crate::sysex::build_messages(&flat, limits.memory_offset));
        assert_eq!(transfer.verify_checksum(), Some(true));

        let parsed = SampleBank::parse(&transfer.data).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed, bank);
    }
}
