//! Transport codec for the Novation Circuit sample-bank SysEx format
//!
//! This crate handles:
//! - 7-bit-safe packing of 8-bit data for SysEx transport (`seven_bit`)
//! - nibble encoding of 32-bit length/offset/checksum fields (`nibble`)
//! - splitting/reassembling a bank across HEADER/DATA/TRAILER messages (`sysex`)
//! - the fixed binary layout of the sample bank itself (`bank`)
//! - big/little-endian conversion of multi-byte sample words (`endian`)
//!
//! The crate does not talk to a MIDI device; it converts between in-memory
//! banks and the byte-level message sequence a device accepts or emits.

use thiserror::Error;

pub mod bank;
pub mod endian;
pub mod nibble;
pub mod seven_bit;
pub mod sysex;

pub use bank::{DeviceLimits, SampleBank, SampleRecord};
pub use sysex::{Envelope, Transfer};

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("sample bank truncated: {0}")]
    Truncated(String),

    #[error("bank holds {0} samples, the count field is a single byte")]
    TooManySamples(usize),

    #[error("serialized bank is {size} bytes, device capacity is {capacity}")]
    OverCapacity { size: usize, capacity: usize },

    #[error("command {command:#04x} payload is {actual} bytes, expected {expected}")]
    MalformedEnvelope {
        command: u8,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, ProtoError>;
