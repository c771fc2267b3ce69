//! Implementation of `pgincr apply` subcommand.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::cli::stream::open_input;
use crate::increment::{apply_file_increment, ApplyOptions};
use crate::{Error, Result};

#[derive(Debug, Clone, Args, Default)]
pub struct ApplyArgs {
    /// Increment stream to apply
    #[arg(short = 'i', long = "increment")]
    pub increment: Option<PathBuf>,

    /// Page file to patch in place
    #[arg(short = 't', long = "target")]
    pub target: Option<PathBuf>,

    /// Create the target if it does not exist
    #[arg(long = "create", default_value_t = false)]
    pub create: bool,

    /// fsync the target after patching
    #[arg(long = "fsync", default_value_t = false)]
    pub fsync: bool,

    /// Increment stream is gzip compressed
    #[arg(long = "gzip", default_value_t = false)]
    pub gzip: bool,
}

pub fn execute(args: ApplyArgs) -> Result<()> {
    let increment = args
        .increment
        .ok_or_else(|| Error::Cli("increment is required".into()))?;
    let target = args
        .target
        .ok_or_else(|| Error::Cli("target is required".into()))?;

    let mut reader = open_input(&increment, args.gzip)?;
    apply_file_increment(
        &target,
        &mut reader,
        ApplyOptions {
            create_missing: args.create,
            fsync: args.fsync,
        },
    )?;

    info!(target = %target.display(), "increment applied");
    Ok(())
}
