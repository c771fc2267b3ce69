//! Random-access targets that increments are written into.

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;

/// Positional read/write access to a file being rebuilt.
///
/// Writes past the current end extend the target; reads past the end return
/// fewer bytes (zero at or beyond the end).
pub trait ReadWriterAt {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;
    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<()>;
    fn size(&self) -> io::Result<u64>;
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

/// Fill `buf` from `offset`, zero-filling anything past the end of `target`.
/// Returns the number of bytes actually read.
pub(crate) fn read_block<T: ReadWriterAt + ?Sized>(
    target: &T,
    buf: &mut [u8],
    offset: u64,
) -> io::Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match target.read_at(&mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    buf[filled..].fill(0);
    Ok(filled)
}

impl ReadWriterAt for File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        FileExt::read_at(self, buf, offset)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<()> {
        self.write_all_at(buf, offset)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

/// Growable in-memory target; counts bytes handed to `write_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTarget {
    content: Vec<u8>,
    bytes_written: u64,
}

impl MemoryTarget {
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            bytes_written: 0,
        }
    }

    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0u8; len])
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.content
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl ReadWriterAt for MemoryTarget {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let len = self.content.len() as u64;
        if offset >= len {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.content.len() - start);
        buf[..n].copy_from_slice(&self.content[start..start + n]);
        Ok(n)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<()> {
        let end = offset as usize + buf.len();
        if self.content.len() < end {
            self.content.resize(end, 0);
        }
        self.content[offset as usize..end].copy_from_slice(buf);
        self.bytes_written += buf.len() as u64;
        Ok(())
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.content.len() as u64)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.content.resize(len as usize, 0);
        Ok(())
    }
}
