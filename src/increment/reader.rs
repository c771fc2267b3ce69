//! Builds an increment stream from a live relation file.
//!
//! The file is scanned once up front to pick the changed blocks (the diff map
//! must precede the payload), then pages are re-read lazily as the returned
//! reader is drained. Only one page is buffered at a time.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::codec::{
    predicted_stream_size, IncrementMeta, INCREMENT_HEADER, META_FIXED_SIZE,
};
use super::target::read_block;
use crate::page::{block_count, block_offset, Lsn, PageLsnParser, PAGE_SIZE};
use crate::Result;

/// Single-pass byte source producing an increment stream.
///
/// Owns the source file handle; dropping the reader releases it. Reading it a
/// second time requires building a new one.
#[derive(Debug)]
pub struct IncrementReader {
    path: PathBuf,
    source: File,
    meta: IncrementMeta,
    next_block: usize,
    buf: Vec<u8>,
    pos: usize,
}

/// Scan `path` and return a lazy increment reader plus its exact byte size.
///
/// A block is included when `cutoff` is `Lsn::INVALID` (full increment), when
/// `parser` rejects the page, or when the page LSN is strictly greater than
/// `cutoff`. When `changed_blocks` is given (e.g. collected from WAL), the
/// pages are not scanned and the set is taken as-is, clipped to the file.
pub fn read_incremental_file<P: PageLsnParser + ?Sized>(
    path: &Path,
    file_size: u64,
    cutoff: Lsn,
    changed_blocks: Option<&BTreeSet<u32>>,
    parser: &P,
) -> Result<(IncrementReader, u64)> {
    let source = File::open(path)?;
    let total_blocks = block_count(file_size);
    if total_blocks > u32::MAX as u64 + 1 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has too many blocks ({total_blocks})", path.display()),
        )
        .into());
    }

    let diff_map: Vec<u32> = if !cutoff.is_valid() {
        (0..total_blocks).map(|b| b as u32).collect()
    } else if let Some(changed) = changed_blocks {
        changed
            .iter()
            .copied()
            .take_while(|&b| (b as u64) < total_blocks)
            .collect()
    } else {
        scan_changed_blocks(path, &source, total_blocks, cutoff, parser)?
    };

    debug!(
        file = %path.display(),
        file_size,
        cutoff = %cutoff,
        total_blocks,
        diff_blocks = diff_map.len(),
        "increment_scan"
    );

    let meta = IncrementMeta {
        file_size,
        diff_map,
    };
    let size = predicted_stream_size(meta.diff_block_count());

    let mut prelude =
        Vec::with_capacity(INCREMENT_HEADER.len() + META_FIXED_SIZE + meta.diff_map.len() * 4);
    prelude.extend_from_slice(&INCREMENT_HEADER);
    prelude.extend_from_slice(&meta.encode());

    Ok((
        IncrementReader {
            path: path.to_path_buf(),
            source,
            meta,
            next_block: 0,
            buf: prelude,
            pos: 0,
        },
        size,
    ))
}

fn scan_changed_blocks<P: PageLsnParser + ?Sized>(
    path: &Path,
    source: &File,
    total_blocks: u64,
    cutoff: Lsn,
    parser: &P,
) -> Result<Vec<u32>> {
    let mut page = vec![0u8; PAGE_SIZE];
    let mut changed = Vec::new();
    for block in 0..total_blocks {
        let block = block as u32;
        let filled = read_block(source, &mut page, block_offset(block))?;
        if filled == 0 {
            // File shrank since it was stat'ed; nothing left to diff.
            warn!(file = %path.display(), block, "page file shorter than expected");
            break;
        }
        match parser.parse_page_lsn(&page) {
            Ok(lsn) if lsn > cutoff => changed.push(block),
            Ok(_) => {}
            Err(err) => {
                debug!(
                    file = %path.display(),
                    block,
                    error = %err,
                    "unparsable page; including it"
                );
                changed.push(block);
            }
        }
    }
    Ok(changed)
}

impl IncrementReader {
    pub fn meta(&self) -> &IncrementMeta {
        &self.meta
    }

    pub fn diff_map(&self) -> &[u32] {
        &self.meta.diff_map
    }

    pub fn predicted_size(&self) -> u64 {
        self.meta.stream_size()
    }

    fn load_next_page(&mut self) -> io::Result<bool> {
        let Some(&block) = self.meta.diff_map.get(self.next_block) else {
            return Ok(false);
        };
        self.buf.clear();
        self.buf.resize(PAGE_SIZE, 0);
        let filled = read_block(&self.source, &mut self.buf, block_offset(block))?;
        if filled < PAGE_SIZE {
            // Keep the framing promised by the diff map.
            warn!(
                file = %self.path.display(),
                block,
                filled,
                "page truncated while streaming; padding with zeros"
            );
        }
        self.pos = 0;
        self.next_block += 1;
        Ok(true)
    }
}

impl Read for IncrementReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        loop {
            if self.pos < self.buf.len() {
                let n = out.len().min(self.buf.len() - self.pos);
                out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            if !self.load_next_page()? {
                return Ok(0);
            }
        }
    }
}
