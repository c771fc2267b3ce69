//! Implementation of `pgincr diff` subcommand.

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use clap::Args;
use tracing::{info, instrument};

use crate::cli::stream::Output;
use crate::increment::read_incremental_file;
use crate::page::{is_paged_file, Lsn, PostgresPageParser};
use crate::{Error, Result};

#[derive(Debug, Clone, Args, Default)]
pub struct DiffArgs {
    /// Page file to diff
    #[arg(long = "file")]
    pub file: Option<PathBuf>,

    /// Cutoff LSN (`X/X`, `0x...` or decimal); 0 produces a full increment
    #[arg(long = "lsn")]
    pub lsn: Option<String>,

    /// Where to write the increment stream
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,

    /// Known changed blocks (comma separated); skips the page scan
    #[arg(long = "blocks", value_delimiter = ',')]
    pub blocks: Vec<u32>,

    /// Gzip the increment stream
    #[arg(long = "gzip", default_value_t = false)]
    pub gzip: bool,
}

#[instrument(skip_all)]
pub fn execute(args: DiffArgs) -> Result<()> {
    let file = args
        .file
        .ok_or_else(|| Error::Cli("file is required".into()))?;
    let lsn: Lsn = args
        .lsn
        .ok_or_else(|| Error::Cli("lsn is required".into()))?
        .parse()?;
    let out = args.out.ok_or_else(|| Error::Cli("out is required".into()))?;

    let meta = std::fs::metadata(&file)?;
    if !is_paged_file(&file, meta.len(), meta.is_dir()) {
        return Err(Error::Cli(format!("{} is not a paged file", file.display())).into());
    }

    let changed: BTreeSet<u32> = args.blocks.into_iter().collect();
    let changed = (!changed.is_empty()).then_some(&changed);

    let (mut reader, predicted) =
        read_incremental_file(&file, meta.len(), lsn, changed, &PostgresPageParser)?;
    let diff_blocks = reader.diff_map().len();

    let mut output = Output::create(&out, args.gzip)?;
    let copied = io::copy(&mut reader, &mut output)?;
    output.finish()?;

    if copied != predicted {
        return Err(Error::Cli(format!(
            "increment size mismatch: predicted {predicted}, produced {copied}"
        ))
        .into());
    }

    info!(
        file = %file.display(),
        lsn = %lsn,
        diff_blocks,
        bytes = copied,
        out = %out.display(),
        "increment written"
    );
    println!("{diff_blocks} blocks, {copied} bytes");
    Ok(())
}
