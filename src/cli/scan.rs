//! Implementation of `pgincr scan` subcommand.
//!
//! Reports which files under a data directory are eligible for page-level
//! increments. Choosing what to back up stays with the caller.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::warn;
use walkdir::WalkDir;

use crate::page::is_paged_file;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Args, Default)]
pub struct ScanArgs {
    /// Data directory to walk
    #[arg(short = 'D', long = "root")]
    pub root: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub size: u64,
    pub paged: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScanReport {
    pub root: PathBuf,
    pub paged_files: usize,
    pub paged_bytes: u64,
    pub other_files: usize,
    pub other_bytes: u64,
    pub entries: Vec<ScanEntry>,
}

/// Classify every regular file under `root`. Paths are relative to `root`.
pub fn scan_tree(root: &Path) -> Result<ScanReport> {
    if !root.is_dir() {
        return Err(Error::Cli(format!("{} is not a directory", root.display())).into());
    }

    let mut report = ScanReport {
        root: root.to_path_buf(),
        paged_files: 0,
        paged_bytes: 0,
        other_files: 0,
        other_bytes: 0,
        entries: Vec::new(),
    };

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let meta = entry.metadata().map_err(std::io::Error::from)?;
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let paged = is_paged_file(rel, meta.len(), false);
        if paged {
            report.paged_files += 1;
            report.paged_bytes += meta.len();
        } else {
            report.other_files += 1;
            report.other_bytes += meta.len();
        }
        report.entries.push(ScanEntry {
            path: rel.to_path_buf(),
            size: meta.len(),
            paged,
        });
    }

    Ok(report)
}

pub fn execute(args: ScanArgs) -> Result<()> {
    let root = args
        .root
        .ok_or_else(|| Error::Cli("root is required".into()))?;
    let report = scan_tree(&root)?;

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print!("{}", format_text(&report)),
    }
    Ok(())
}

fn format_text(report: &ScanReport) -> String {
    let mut out = String::new();
    for entry in &report.entries {
        let kind = if entry.paged { "paged" } else { "other" };
        out.push_str(&format!("{kind}\t{}\t{}\n", entry.size, entry.path.display()));
    }
    out.push_str(&format!(
        "paged_files={} paged_bytes={} other_files={} other_bytes={}\n",
        report.paged_files, report.paged_bytes, report.other_files, report.other_bytes
    ));
    out
}
