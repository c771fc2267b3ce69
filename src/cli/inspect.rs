//! Implementation of `pgincr inspect` subcommand.

use std::io::{self, Read};
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::scan::ReportFormat;
use crate::cli::stream::open_input;
use crate::increment::codec::ensure_stream_exhausted;
use crate::increment::{read_header, read_meta};
use crate::page::block_count;
use crate::{Error, Result};

#[derive(Debug, Clone, Args, Default)]
pub struct InspectArgs {
    /// Increment stream to inspect
    #[arg(short = 'i', long = "increment")]
    pub increment: Option<PathBuf>,

    /// Increment stream is gzip compressed
    #[arg(long = "gzip", default_value_t = false)]
    pub gzip: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IncrementSummary {
    pub version: char,
    pub file_size: u64,
    pub total_blocks: u64,
    pub diff_blocks: u32,
    pub diff_map: Vec<u32>,
    pub payload_bytes: u64,
}

/// Parse an increment fully, validating framing, without writing anything.
pub fn summarize<R: Read + ?Sized>(reader: &mut R) -> Result<IncrementSummary> {
    let version = read_header(reader)?;
    let meta = read_meta(reader)?;

    let expected = meta.payload_size();
    let payload_bytes = io::copy(&mut (&mut *reader).take(expected), &mut io::sink())?;
    if payload_bytes < expected {
        return Err(Error::TruncatedStream {
            context: format!("payload: expected {expected} bytes, got {payload_bytes}"),
        }
        .into());
    }
    ensure_stream_exhausted(reader)?;

    Ok(IncrementSummary {
        version: version as char,
        file_size: meta.file_size,
        total_blocks: block_count(meta.file_size),
        diff_blocks: meta.diff_block_count(),
        diff_map: meta.diff_map,
        payload_bytes,
    })
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let increment = args
        .increment
        .ok_or_else(|| Error::Cli("increment is required".into()))?;
    let mut reader = open_input(&increment, args.gzip)?;
    let summary = summarize(&mut reader)?;

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        ReportFormat::Text => {
            println!("version={}", summary.version);
            println!("file_size={}", summary.file_size);
            println!("total_blocks={}", summary.total_blocks);
            println!("diff_blocks={}", summary.diff_blocks);
            println!("payload_bytes={}", summary.payload_bytes);
            let blocks: Vec<String> = summary.diff_map.iter().map(u32::to_string).collect();
            println!("diff_map={}", blocks.join(","));
        }
    }
    Ok(())
}
