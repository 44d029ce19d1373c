//! `circuitbank` — inspect and rebuild Circuit sample-bank SysEx files
//!
//! Thin adapter over `circuitbank-proto` / `circuitbank-audio`: reads a
//! `.syx` bank dump, lets samples be listed, extracted, replaced or packed
//! from a directory, and writes the result back as a device-loadable dump.
//! Sample numbering on the command line is 1-based, matching the device.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use circuitbank_audio::{record_from_raw, record_from_wav, record_to_raw, record_to_wav};
use circuitbank_proto::{sysex, DeviceLimits, SampleBank, SampleRecord};

/// Samples per bank the device exposes.
const MAX_SLOTS: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "circuitbank", version, about = "Decode, edit and encode Circuit sample SysEx banks")]
struct Args {
    /// Input SysEx bank file
    file: Option<PathBuf>,

    /// Summarize the bank in human-readable form
    #[arg(short, long)]
    info: bool,

    /// Store the resulting SysEx into this file
    #[arg(short, long, value_name = "FILE")]
    outfile: Option<PathBuf>,

    /// Store the resulting SysEx back into the input file
    #[arg(short = 'O', long)]
    samefile: bool,

    /// Do not pad the resulting SysEx up to device capacity
    #[arg(short = 'n', long)]
    no_pad: bool,

    /// Unpack every sample into this directory
    #[arg(short, long, value_name = "DIR")]
    unpack: Option<PathBuf>,

    /// Pack a directory of sample_NN files into the bank
    #[arg(short, long, value_name = "DIR")]
    pack: Option<PathBuf>,

    /// Export sample number --sample to this file
    #[arg(short = 'x', long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Add this file at the end, or replace sample number --sample
    #[arg(short, long, value_name = "FILE")]
    add: Option<PathBuf>,

    /// Sample number (1-based) for --export / --add
    #[arg(short, long, default_value_t = MAX_SLOTS)]
    sample: usize,

    /// Use raw PCM sample files instead of WAV
    #[arg(short = 'R', long)]
    raw: bool,

    /// Force --rate/--channels/--bits when importing WAV files
    #[arg(short = 'F', long)]
    force: bool,

    /// Sample rate for raw or forced imports
    #[arg(short, long, default_value_t = 48_000)]
    rate: u32,

    /// Channel count for raw or forced imports
    #[arg(short, long, default_value_t = 1)]
    channels: u8,

    /// Bit depth for raw or forced imports
    #[arg(short, long, default_value_t = 16)]
    bits: u8,

    /// Log wire-level detail
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .init();

    let mut bank = match &args.file {
        Some(path) => load_bank(path)?,
        None => SampleBank::default(),
    };

    if let Some(dir) = &args.unpack {
        unpack_bank(&bank, dir, args.raw)?;
    }

    if let Some(dest) = &args.export {
        export_sample(&bank, args.sample, dest, args.raw)?;
    }

    if let Some(dir) = &args.pack {
        pack_directory(&mut bank, dir, &args)?;
    }

    if let Some(source) = &args.add {
        add_sample(&mut bank, source, &args)?;
    }

    if args.info {
        print_summary(&bank);
    }

    let outfile = match (&args.outfile, args.samefile, &args.file) {
        (Some(path), _, _) => Some(path.clone()),
        (None, true, Some(input)) => Some(input.clone()),
        (None, true, None) => bail!("--samefile needs an input file"),
        _ => None,
    };
    if let Some(path) = outfile {
        write_bank(&bank, &path, !args.no_pad)?;
    }

    Ok(())
}

fn load_bank(path: &Path) -> Result<SampleBank> {
    let bytes =
        fs::read(path).with_context(|| format!("reading SysEx file {}", path.display()))?;
    let transfer = sysex::parse_syx(&bytes)
        .with_context(|| format!("decoding SysEx file {}", path.display()))?;

    if transfer.verify_checksum() == Some(false) {
        warn!(file = %path.display(), "checksum mismatch, continuing anyway");
    }
    if transfer.data.is_empty() {
        // Same policy as the wire filter: a file for some other device is
        // skipped, leaving an empty bank to work from.
        warn!(file = %path.display(), "no bank data for this device, starting empty");
        return Ok(SampleBank::default());
    }

    let bank = SampleBank::parse(&transfer.data)
        .with_context(|| format!("parsing sample bank from {}", path.display()))?;
    info!(
        samples = bank.records.len(),
        bytes = transfer.data.len(),
        "loaded bank"
    );
    Ok(bank)
}

fn write_bank(bank: &SampleBank, path: &Path, pad: bool) -> Result<()> {
    let limits = DeviceLimits::default();
    let flat = bank.to_transfer_payload(&limits, pad)?;
    let syx = sysex::build_syx(&flat, limits.memory_offset);

    fs::write(path, syx).with_context(|| format!("writing SysEx file {}", path.display()))?;
    info!(file = %path.display(), bytes = flat.len(), "wrote bank");
    Ok(())
}

/// `sample_01.wav` … `sample_64.wav`, 1-based like the device display.
fn slot_file_name(index: usize, raw: bool) -> String {
    let ext = if raw { "raw" } else { "wav" };
    format!("sample_{index:02}.{ext}")
}

fn write_sample_file(record: &SampleRecord, path: &Path, raw: bool) -> Result<()> {
    let bytes = if raw {
        record_to_raw(record)
    } else {
        record_to_wav(record)
    };
    fs::write(path, bytes).with_context(|| format!("writing sample {}", path.display()))
}

fn read_sample_file(path: &Path, args: &Args) -> Result<SampleRecord> {
    let bytes =
        fs::read(path).with_context(|| format!("reading sample {}", path.display()))?;

    if args.raw {
        Ok(record_from_raw(bytes, args.channels, args.bits, args.rate))
    } else {
        let force = args
            .force
            .then_some((args.channels, args.bits, args.rate));
        record_from_wav(&bytes, force)
            .with_context(|| format!("decoding WAV {}", path.display()))
    }
}

fn unpack_bank(bank: &SampleBank, dir: &Path, raw: bool) -> Result<()> {
    if dir.exists() {
        bail!("directory {} already exists", dir.display());
    }
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    for (i, record) in bank.records.iter().enumerate() {
        let path = dir.join(slot_file_name(i + 1, raw));
        info!(sample = i + 1, file = %path.display(), "unpacking");
        write_sample_file(record, &path, raw)?;
    }
    Ok(())
}

fn export_sample(bank: &SampleBank, number: usize, dest: &Path, raw: bool) -> Result<()> {
    if number == 0 || number > bank.records.len() {
        bail!("sample {number} does not exist");
    }

    // Raw export still lands in a .raw file even when named .wav.
    let dest = if raw && dest.extension().is_some_and(|e| e == "wav") {
        dest.with_extension("raw")
    } else {
        dest.to_path_buf()
    };

    info!(sample = number, file = %dest.display(), "exporting");
    write_sample_file(&bank.records[number - 1], &dest, raw)
}

fn pack_directory(bank: &mut SampleBank, dir: &Path, args: &Args) -> Result<()> {
    for index in 1..=MAX_SLOTS {
        let path = dir.join(slot_file_name(index, args.raw));
        if !path.is_file() {
            break;
        }
        info!(sample = index, file = %path.display(), "packing");
        bank.records.push(read_sample_file(&path, args)?);
    }
    Ok(())
}

fn add_sample(bank: &mut SampleBank, source: &Path, args: &Args) -> Result<()> {
    if !source.is_file() {
        bail!("unable to open {} for reading", source.display());
    }
    let record = read_sample_file(source, args)?;

    if args.sample >= 1 && args.sample <= bank.records.len() {
        info!(sample = args.sample, file = %source.display(), "replacing");
        bank.records[args.sample - 1] = record;
    } else {
        info!(sample = bank.records.len() + 1, file = %source.display(), "appending");
        bank.records.push(record);
    }
    Ok(())
}

fn print_summary(bank: &SampleBank) {
    println!("Number of samples: {}", bank.records.len());
    for (i, record) in bank.records.iter().enumerate() {
        println!(
            "Sample {}: {} bytes ({:.6} seconds, {} ch {} bits @ {})",
            i + 1,
            record.data.len(),
            record.duration_secs(),
            record.channels,
            record.bits,
            record.rate,
        );
    }
}
