//! File streams for the CLI, optionally layered over gzip.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use crate::Result;

/// Open `path` for reading, decompressing on the fly when `gzip` is set.
pub fn open_input(path: &Path, gzip: bool) -> Result<Box<dyn Read>> {
    let reader = BufReader::new(File::open(path)?);
    if gzip {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Output file that must be `finish`ed so the gzip trailer gets written.
pub enum Output {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Output {
    pub fn create(path: &Path, gzip: bool) -> Result<Self> {
        let writer = BufWriter::new(File::create(path)?);
        if gzip {
            Ok(Output::Gzip(GzEncoder::new(writer, Compression::default())))
        } else {
            Ok(Output::Plain(writer))
        }
    }

    pub fn finish(self) -> Result<()> {
        let mut inner = match self {
            Output::Plain(w) => w,
            Output::Gzip(enc) => enc.finish()?,
        };
        inner.flush()?;
        inner.get_ref().sync_all()?;
        Ok(())
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Plain(w) => w.write(buf),
            Output::Gzip(enc) => enc.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Plain(w) => w.flush(),
            Output::Gzip(enc) => enc.flush(),
        }
    }
}
