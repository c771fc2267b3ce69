//! Implementation of `pgincr create` subcommand.

use std::fs::OpenOptions;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::cli::stream::open_input;
use crate::increment::create_file_from_increment;
use crate::{Error, Result};

#[derive(Debug, Clone, Args, Default)]
pub struct CreateArgs {
    /// Increment stream to materialize
    #[arg(short = 'i', long = "increment")]
    pub increment: Option<PathBuf>,

    /// Page file to create (must not exist)
    #[arg(short = 't', long = "target")]
    pub target: Option<PathBuf>,

    /// Increment stream is gzip compressed
    #[arg(long = "gzip", default_value_t = false)]
    pub gzip: bool,
}

pub fn execute(args: CreateArgs) -> Result<()> {
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
        .create_new(true)
        .open(&target)?;

    let written = create_file_from_increment(&mut reader, &mut file)?;
    file.sync_all()?;

    info!(target = %target.display(), bytes_written = written, "page file created");
    println!("{written} bytes written");
    Ok(())
}
