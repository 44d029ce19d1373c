//! WAV and raw-PCM mapping for Circuit sample records
//!
//! The bank stores multi-byte sample words big-endian; WAV stores them
//! little-endian. This crate converts between [`SampleRecord`] payloads and
//! file images, swapping word byte order where the bit depth requires it.
//! Payload bytes are otherwise passed through untouched.

use thiserror::Error;

use circuitbank_proto::endian::swap_word_order;
use circuitbank_proto::SampleRecord;

pub mod wav;

pub use wav::{decode_wav, encode_wav, WavSpec};

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("not a RIFF/WAVE file")]
    NotWav,

    #[error("unsupported WAV: {0}")]
    Unsupported(String),

    #[error("failed to read WAV data: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// Render a record as a WAV image, converting word order to little-endian.
pub fn record_to_wav(record: &SampleRecord) -> Vec<u8> {
    let spec = WavSpec {
        channels: u16::from(record.channels),
        bits_per_sample: u16::from(record.bits),
        sample_rate: record.rate,
    };

    let width = record.width();
    if width > 1 {
        encode_wav(&spec, &swap_word_order(&record.data, width))
    } else {
        encode_wav(&spec, &record.data)
    }
}

/// Build a record from a WAV image, converting word order to big-endian.
///
/// `force` overrides the format fields taken from the file; the frame bytes
/// themselves are still swapped according to the file's own bit depth, as
/// that is what determines the word size on disk.
pub fn record_from_wav(bytes: &[u8], force: Option<(u8, u8, u32)>) -> Result<SampleRecord> {
    let (spec, frames) = decode_wav(bytes)?;

    if spec.bits_per_sample == 0 || spec.bits_per_sample % 8 != 0 {
        return Err(AudioError::Unsupported(format!(
            "{}-bit samples, need a whole number of bytes per word",
            spec.bits_per_sample
        )));
    }
    if spec.channels > u16::from(u8::MAX) {
        return Err(AudioError::Unsupported(format!(
            "{} channels",
            spec.channels
        )));
    }

    let width = usize::from(spec.bits_per_sample / 8);
    let data = if width > 1 {
        swap_word_order(&frames, width)
    } else {
        frames
    };

    let (channels, bits, rate) = force.unwrap_or((
        spec.channels as u8,
        spec.bits_per_sample as u8,
        spec.sample_rate,
    ));

    Ok(SampleRecord {
        channels,
        bits,
        rate,
        data,
    })
}

/// The stored payload as-is: big-endian words, no header.
pub fn record_to_raw(record: &SampleRecord) -> Vec<u8> {
    record.data.clone()
}

/// Wrap raw device-order bytes in a record with caller-supplied format.
pub fn record_from_raw(bytes: Vec<u8>, channels: u8, bits: u8, rate: u32) -> SampleRecord {
    SampleRecord {
        channels,
        bits,
        rate,
        data: bytes,
    }
}
