//! Fills placeholder blocks of a restored file from a full base copy.

use std::io::{self, Read};

use tracing::warn;

use super::target::{read_block, ReadWriterAt};
use crate::logging::{log_increment_stats, IncrementStats};
use crate::page::{block_count, block_offset, is_zero_page, PAGE_SIZE};
use crate::{Error, Result};

/// Walk `target` page by page in lockstep with `reference` and copy the
/// reference page into every all-zero target block. Non-zero blocks are left
/// untouched. Returns bytes written.
///
/// A reference shorter than the target is `TruncatedStream`, whether it ends
/// on a page boundary or mid-page. Blocks before that point stay written.
pub fn restore_missing_pages<R, T>(reference: &mut R, target: &mut T) -> Result<u64>
where
    R: Read + ?Sized,
    T: ReadWriterAt + ?Sized,
{
    let total_blocks = block_count(target.size()?);
    let mut stats = IncrementStats {
        file_size: target.size()?,
        ..Default::default()
    };
    let mut base_page = vec![0u8; PAGE_SIZE];
    let mut current = vec![0u8; PAGE_SIZE];

    for block in 0..total_blocks {
        if !read_reference_page(reference, &mut base_page)? {
            warn!(block, total_blocks, "reference ended before target");
            return Err(Error::TruncatedStream {
                context: format!("reference ended at block {block} of {total_blocks}"),
            }
            .into());
        }

        let offset = block_offset(block as u32);
        read_block(&*target, &mut current, offset)?;
        if !is_zero_page(&current) {
            stats.pages_skipped += 1;
            continue;
        }

        target.write_at(&base_page, offset)?;
        stats.pages_written += 1;
        stats.bytes_written += PAGE_SIZE as u64;
    }

    log_increment_stats("restore_missing", None, stats);
    Ok(stats.bytes_written)
}

/// Returns `false` on a clean end of input before any byte of the page.
fn read_reference_page<R: Read + ?Sized>(reference: &mut R, page: &mut [u8]) -> Result<bool> {
    let mut filled = 0usize;
    while filled < page.len() {
        match reference.read(&mut page[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(Error::TruncatedStream {
                    context: format!("reference page: got {filled} of {} bytes", page.len()),
                }
                .into())
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}
