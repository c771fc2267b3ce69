//! Binary layout of an increment stream.
//!
//! ```text
//! offset  size        field
//! 0       2           tag "wi"
//! 2       1           format version
//! 3       4           signature
//! 7       8           original file size (u64 LE)
//! 15      4           diff block count N (u32 LE)
//! 19      4*N         diff map, ascending u32 LE block numbers
//! 19+4N   PAGE_SIZE*N page payload, same order as the diff map
//! ```

use std::io::{self, Read};

use crate::page::{block_count, PAGE_SIZE};
use crate::{Error, Result};

pub const INCREMENT_TAG: [u8; 2] = *b"wi";
pub const INCREMENT_VERSION: u8 = b'1';
pub const SUPPORTED_VERSIONS: &[u8] = &[INCREMENT_VERSION];
pub const SIGNATURE_MAGIC: [u8; 4] = [0x55, 0x49, 0x4e, 0x43];

pub const HEADER_SIZE: usize = 7;
/// Original file size plus diff block count.
pub const META_FIXED_SIZE: usize = 8 + 4;
const DIFF_MAP_ENTRY_SIZE: usize = 4;
const DIFF_MAP_CHUNK_ENTRIES: usize = 1024;

pub const INCREMENT_HEADER: [u8; HEADER_SIZE] = write_header(INCREMENT_VERSION);

pub const fn write_header(version: u8) -> [u8; HEADER_SIZE] {
    [
        INCREMENT_TAG[0],
        INCREMENT_TAG[1],
        version,
        SIGNATURE_MAGIC[0],
        SIGNATURE_MAGIC[1],
        SIGNATURE_MAGIC[2],
        SIGNATURE_MAGIC[3],
    ]
}

/// Total stream length for an increment carrying `diff_blocks` pages.
pub fn predicted_stream_size(diff_blocks: u32) -> u64 {
    let n = diff_blocks as u64;
    (HEADER_SIZE + META_FIXED_SIZE) as u64 + n * DIFF_MAP_ENTRY_SIZE as u64 + n * PAGE_SIZE as u64
}

/// Read and validate the header, returning the format version.
///
/// Tag and signature are checked before the version so that a well-formed
/// header from a newer format is reported as `UnknownIncrementVersion`
/// rather than garbage.
pub fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; HEADER_SIZE];
    if let Err(e) = reader.read_exact(&mut buf) {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            return Err(Error::InvalidIncrementHeader.into());
        }
        return Err(e.into());
    }

    if buf[..2] != INCREMENT_TAG || buf[3..] != SIGNATURE_MAGIC {
        return Err(Error::InvalidIncrementHeader.into());
    }
    let version = buf[2];
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(Error::UnknownIncrementVersion(version).into());
    }
    Ok(version)
}

/// Everything between the header and the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementMeta {
    pub file_size: u64,
    pub diff_map: Vec<u32>,
}

impl IncrementMeta {
    pub fn diff_block_count(&self) -> u32 {
        self.diff_map.len() as u32
    }

    pub fn payload_size(&self) -> u64 {
        self.diff_map.len() as u64 * PAGE_SIZE as u64
    }

    pub fn stream_size(&self) -> u64 {
        predicted_stream_size(self.diff_block_count())
    }

    /// Serialize size, count and diff map (no header).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(META_FIXED_SIZE + self.diff_map.len() * 4);
        buf.extend_from_slice(&self.file_size.to_le_bytes());
        buf.extend_from_slice(&self.diff_block_count().to_le_bytes());
        for block in &self.diff_map {
            buf.extend_from_slice(&block.to_le_bytes());
        }
        buf
    }
}

/// Read original file size, diff block count and diff map.
///
/// A diff map that is not strictly ascending, or that references a page past
/// the end of the original file, is `CorruptDiffMap`; it is never re-sorted.
pub fn read_meta<R: Read + ?Sized>(reader: &mut R) -> Result<IncrementMeta> {
    let mut fixed = [0u8; META_FIXED_SIZE];
    read_exact_or_truncated(reader, &mut fixed, "increment meta")?;

    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&fixed[..8]);
    let file_size = u64::from_le_bytes(size_bytes);
    let diff_block_count = u32::from_le_bytes([fixed[8], fixed[9], fixed[10], fixed[11]]);

    let max_blocks = block_count(file_size);
    if diff_block_count as u64 > max_blocks {
        return Err(Error::CorruptDiffMap {
            reason: format!(
                "{diff_block_count} diff blocks declared for a file of {max_blocks} blocks"
            ),
        }
        .into());
    }

    // The count is untrusted: grow the map only as entries actually arrive.
    let mut diff_map: Vec<u32> =
        Vec::with_capacity((diff_block_count as usize).min(DIFF_MAP_CHUNK_ENTRIES));
    let mut chunk = [0u8; DIFF_MAP_CHUNK_ENTRIES * DIFF_MAP_ENTRY_SIZE];
    let mut remaining = diff_block_count as usize;
    while remaining > 0 {
        let entries = remaining.min(DIFF_MAP_CHUNK_ENTRIES);
        let bytes = &mut chunk[..entries * DIFF_MAP_ENTRY_SIZE];
        read_exact_or_truncated(reader, bytes, "diff map")?;
        diff_map.extend(
            bytes
                .chunks_exact(DIFF_MAP_ENTRY_SIZE)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])),
        );
        remaining -= entries;
    }
    validate_diff_map(&diff_map, file_size)?;

    Ok(IncrementMeta {
        file_size,
        diff_map,
    })
}

pub(crate) fn validate_diff_map(diff_map: &[u32], file_size: u64) -> Result<()> {
    let max_blocks = block_count(file_size);
    let mut prev: Option<u32> = None;
    for (idx, &block) in diff_map.iter().enumerate() {
        if let Some(prev) = prev {
            if block <= prev {
                return Err(Error::CorruptDiffMap {
                    reason: format!("entry {idx} ({block}) does not follow {prev}"),
                }
                .into());
            }
        }
        if block as u64 >= max_blocks {
            return Err(Error::CorruptDiffMap {
                reason: format!("block {block} beyond file of {max_blocks} blocks"),
            }
            .into());
        }
        prev = Some(block);
    }
    Ok(())
}

/// `read_exact` that reports a short stream as `TruncatedStream`.
pub(crate) fn read_exact_or_truncated<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    context: &str,
) -> Result<()> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(Error::TruncatedStream {
            context: format!("{context}: expected {} bytes", buf.len()),
        }
        .into()),
        Err(e) => Err(e.into()),
    }
}

/// Fail with `UnexpectedTrailingData` unless the reader is at end of input.
pub(crate) fn ensure_stream_exhausted<R: Read + ?Sized>(reader: &mut R) -> Result<()> {
    let mut probe = [0u8; 1];
    loop {
        match reader.read(&mut probe) {
            Ok(0) => return Ok(()),
            Ok(_) => return Err(Error::UnexpectedTrailingData.into()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Parse header and meta in one go.
pub fn read_increment_prelude<R: Read + ?Sized>(reader: &mut R) -> Result<IncrementMeta> {
    read_header(reader)?;
    read_meta(reader)
}
