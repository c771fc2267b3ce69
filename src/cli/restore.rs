//! Implementation of `pgincr restore-missing` subcommand.

use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::increment::restore_missing_pages;
use crate::{Error, Result};

#[derive(Debug, Clone, Args, Default)]
pub struct RestoreMissingArgs {
    /// Full base copy of the page file
    #[arg(short = 'r', long = "reference")]
    pub reference: Option<PathBuf>,

    /// Page file whose zero-filled blocks should be restored
    #[arg(short = 't', long = "target")]
    pub target: Option<PathBuf>,
}

pub fn execute(args: RestoreMissingArgs) -> Result<()> {
    let reference = args
        .reference
        .ok_or_else(|| Error::Cli("reference is required".into()))?;
    let target = args
        .target
        .ok_or_else(|| Error::Cli("target is required".into()))?;

    let mut base = BufReader::new(File::open(&reference)?);
    let mut file = OpenOptions::new().read(true).write(true).open(&target)?;

    let written = restore_missing_pages(&mut base, &mut file)?;
    file.sync_all()?;

    info!(
        target = %target.display(),
        reference = %reference.display(),
        bytes_written = written,
        "missing pages restored"
    );
    println!("{written} bytes written");
    Ok(())
}
