//! Implementation of `pgincr write-pages` subcommand.

use std::fs::OpenOptions;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::cli::stream::open_input;
use crate::increment::write_pages_from_increment;
use crate::{Error, Result};

#[derive(Debug, Clone, Args, Default)]
pub struct WritePagesArgs {
    /// Increment stream to take pages from
    #[arg(short = 'i', long = "increment")]
    pub increment: Option<PathBuf>,

    /// Partially restored page file (created if missing)
    #[arg(short = 't', long = "target")]
    pub target: Option<PathBuf>,

    /// Overwrite blocks that already hold data
    #[arg(long = "overwrite", default_value_t = false)]
    pub overwrite: bool,

    /// Increment stream is gzip compressed
    #[arg(long = "gzip", default_value_t = false)]
    pub gzip: bool,
}

pub fn execute(args: WritePagesArgs) -> Result<()> {
    let increment = args
        .increment
        .ok_or_else(|| Error::Cli("increment is required".into()))?;
    let target = args
        .target
        .ok_or_else(|| Error::Cli("target is required".into()))?;

    let mut reader = open_input(&increment, args.gzip)?;
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&target)?;

    let written = write_pages_from_increment(&mut reader, &mut file, args.overwrite)?;
    file.sync_all()?;

    info!(target = %target.display(), bytes_written = written, "increment pages written");
    println!("{written} bytes written");
    Ok(())
}
