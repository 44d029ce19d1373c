//! Minimal RIFF/WAVE reader and writer for PCM data
//!
//! The sample payload stays opaque: frames go in and out as raw
//! little-endian bytes, never converted to typed samples. Only the `fmt `
//! and `data` chunks are interpreted; other chunks are skipped.

use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{AudioError, Result};

/// PCM format fields from the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sample_rate: u32,
}

/// Parse a WAV image into its format fields and raw frame bytes.
pub fn decode_wav(bytes: &[u8]) -> Result<(WavSpec, Vec<u8>)> {
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if &magic != b"RIFF" {
        return Err(AudioError::NotWav);
    }
    let _file_len = cursor.read_u32::<LittleEndian>()?;
    cursor.read_exact(&mut magic)?;
    if &magic != b"WAVE" {
        return Err(AudioError::NotWav);
    }

    let mut spec: Option<WavSpec> = None;
    let mut frames: Option<Vec<u8>> = None;

    // Walk chunks until both fmt and data were seen or input ends.
    while (cursor.position() as usize) + 8 <= bytes.len() {
        let mut fourcc = [0u8; 4];
        cursor.read_exact(&mut fourcc)?;
        let chunk_len = cursor.read_u32::<LittleEndian>()?;
        let chunk_end = cursor.position() + u64::from(chunk_len);

        match &fourcc {
            b"fmt " => {
                let format = cursor.read_u16::<LittleEndian>()?;
                if format != 1 {
                    return Err(AudioError::Unsupported(format!(
                        "audio format {format}, only PCM is handled"
                    )));
                }
                let channels = cursor.read_u16::<LittleEndian>()?;
                let sample_rate = cursor.read_u32::<LittleEndian>()?;
                let _byte_rate = cursor.read_u32::<LittleEndian>()?;
                let _block_align = cursor.read_u16::<LittleEndian>()?;
                let bits_per_sample = cursor.read_u16::<LittleEndian>()?;
                spec = Some(WavSpec {
                    channels,
                    bits_per_sample,
                    sample_rate,
                });
            }
            b"data" => {
                let mut data = vec![0u8; chunk_len as usize];
                cursor.read_exact(&mut data)?;
                frames = Some(data);
            }
            other => {
                tracing::debug!(fourcc = ?String::from_utf8_lossy(other), chunk_len, "skipping chunk");
            }
        }

        // Chunks are word-aligned; odd lengths carry one pad byte.
        let aligned_end = chunk_end + u64::from(chunk_len) % 2;
        cursor.seek(SeekFrom::Start(aligned_end))?;
    }

    let spec = spec.ok_or_else(|| AudioError::Unsupported("missing fmt chunk".into()))?;
    let frames = frames.ok_or_else(|| AudioError::Unsupported("missing data chunk".into()))?;
    Ok((spec, frames))
}

/// Emit a canonical PCM WAV image: 44-byte header plus the frame bytes.
pub fn encode_wav(spec: &WavSpec, frames: &[u8]) -> Vec<u8> {
    let byte_rate =
        spec.sample_rate * u32::from(spec.channels) * u32::from(spec.bits_per_sample) / 8;
    let block_align = spec.channels * spec.bits_per_sample / 8;
    let data_len = frames.len() as u32;
    let file_len = 36 + data_len;

    let mut wav = Vec::with_capacity(frames.len() + 44);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.write_u32::<LittleEndian>(file_len).unwrap();
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.write_u32::<LittleEndian>(16).unwrap();
    wav.write_u16::<LittleEndian>(1).unwrap(); // PCM format
    wav.write_u16::<LittleEndian>(spec.channels).unwrap();
    wav.write_u32::<LittleEndian>(spec.sample_rate).unwrap();
    wav.write_u32::<LittleEndian>(byte_rate).unwrap();
    wav.write_u16::<LittleEndian>(block_align).unwrap();
    wav.write_u16::<LittleEndian>(spec.bits_per_sample).unwrap();

    // data chunk
    wav.extend_from_slice(b"data");
    wav.write_u32::<LittleEndian>(data_len).unwrap();
    wav.extend_from_slice(frames);

    wav
}
