//! Reconciling increment streams into target files.
//!
//! Three policies share the payload loop:
//! - `create_file_from_increment`: target starts empty, every page is written.
//! - `apply_file_increment`: existing file on disk is patched in place.
//! - `write_pages_from_increment`: only placeholder (all-zero) blocks are
//!   filled unless overwriting is forced, so re-applying is idempotent.
//!
//! Every policy requires the stream to end exactly after the declared payload.

use std::fs::OpenOptions;
use std::io::{self, Read};
use std::path::Path;

use tracing::debug;

use super::codec::{
    ensure_stream_exhausted, read_exact_or_truncated, read_increment_prelude, IncrementMeta,
};
use super::target::{read_block, ReadWriterAt};
use crate::logging::{log_increment_stats, IncrementStats};
use crate::page::{block_offset, is_zero_page, PAGE_SIZE};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyOptions {
    /// Create the target file when it does not exist yet.
    pub create_missing: bool,
    /// `fsync` the target before checking for trailing data.
    pub fsync: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WritePolicy {
    Always,
    PlaceholdersOnly,
}

/// Materialize a file from a single increment into an empty target.
///
/// The target ends up exactly `file_size` bytes long; blocks absent from the
/// increment read back as zeros. Returns bytes written.
pub fn create_file_from_increment<R, T>(increment: &mut R, target: &mut T) -> Result<u64>
where
    R: Read + ?Sized,
    T: ReadWriterAt + ?Sized,
{
    let meta = read_increment_prelude(increment)?;
    let stats = write_payload(increment, target, &meta, WritePolicy::Always)?;
    target.set_len(meta.file_size)?;
    ensure_stream_exhausted(increment)?;

    log_increment_stats("create", None, stats);
    Ok(stats.bytes_written)
}

/// Patch the file at `path` in place with an increment.
///
/// The file is resized to the increment's original size before the payload
/// is written. The handle is closed on every return path.
pub fn apply_file_increment<R>(
    path: &Path,
    increment: &mut R,
    options: ApplyOptions,
) -> Result<()>
where
    R: Read + ?Sized,
{
    debug!(file = %path.display(), "incrementing file");
    let meta = read_increment_prelude(increment)?;

    let mut file = match OpenOptions::new()
        .read(true)
        .write(true)
        .create(options.create_missing)
        .open(path)
    {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::IncrementTargetMissing(path.display().to_string()).into())
        }
        Err(e) => return Err(e.into()),
    };

    file.set_len(meta.file_size)?;
    let stats = write_payload(increment, &mut file, &meta, WritePolicy::Always)?;
    if options.fsync {
        file.sync_all()?;
    }
    ensure_stream_exhausted(increment)?;

    log_increment_stats("apply", Some(path), stats);
    Ok(())
}

/// Write increment pages only where the target still holds placeholders.
///
/// With `overwrite_existing` every page is written. A target shorter than the
/// increment's original size is extended; a longer one is left as is.
/// Returns bytes written; skipped pages are not counted.
pub fn write_pages_from_increment<R, T>(
    increment: &mut R,
    target: &mut T,
    overwrite_existing: bool,
) -> Result<u64>
where
    R: Read + ?Sized,
    T: ReadWriterAt + ?Sized,
{
    let meta = read_increment_prelude(increment)?;
    let policy = if overwrite_existing {
        WritePolicy::Always
    } else {
        WritePolicy::PlaceholdersOnly
    };
    let stats = write_payload(increment, target, &meta, policy)?;
    if target.size()? < meta.file_size {
        target.set_len(meta.file_size)?;
    }
    ensure_stream_exhausted(increment)?;

    log_increment_stats("write_pages", None, stats);
    Ok(stats.bytes_written)
}

fn write_payload<R, T>(
    increment: &mut R,
    target: &mut T,
    meta: &IncrementMeta,
    policy: WritePolicy,
) -> Result<IncrementStats>
where
    R: Read + ?Sized,
    T: ReadWriterAt + ?Sized,
{
    let mut stats = IncrementStats {
        file_size: meta.file_size,
        diff_blocks: meta.diff_block_count(),
        ..Default::default()
    };
    let mut page = vec![0u8; PAGE_SIZE];
    let mut current = vec![0u8; PAGE_SIZE];

    for &block in &meta.diff_map {
        read_exact_or_truncated(increment, &mut page, "payload page")?;
        let offset = block_offset(block);

        if policy == WritePolicy::PlaceholdersOnly {
            read_block(&*target, &mut current, offset)?;
            if !is_zero_page(&current) {
                stats.pages_skipped += 1;
                continue;
            }
        }

        target.write_at(&page, offset)?;
        stats.pages_written += 1;
        stats.bytes_written += PAGE_SIZE as u64;
    }

    Ok(stats)
}
