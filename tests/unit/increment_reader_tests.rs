#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;

use pgincr::increment::codec::{read_increment_prelude, HEADER_SIZE};
use pgincr::increment::{predicted_stream_size, read_incremental_file};
use pgincr::page::{Lsn, PostgresPageParser, PAGE_SIZE};
use tempfile::tempdir;

use common::{
    increment_bytes, make_page, page_of, sample_content, write_sample_file, BIG_LSN,
    SAMPLE_CHANGED_BLOCKS, SAMPLE_FILE_SIZE, SAMPLE_LSN, SAMPLE_PAGE_LSNS, SMALL_LSN,
};

fn build(path: &std::path::Path, cutoff: u64) -> (pgincr::increment::IncrementReader, u64) {
    let size = fs::metadata(path).unwrap().len();
    read_incremental_file(path, size, Lsn(cutoff), None, &PostgresPageParser).unwrap()
}

#[test]
fn predicted_size_matches_produced_bytes() -> pgincr::Result<()> {
    let dir = tempdir()?;
    let path = write_sample_file(dir.path());

    for cutoff in [SMALL_LSN, SAMPLE_LSN, BIG_LSN] {
        let (mut reader, predicted) = build(&path, cutoff);
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        assert_eq!(buf.len() as u64, predicted, "cutoff {cutoff:#x}");
    }
    Ok(())
}

#[test]
fn zero_cutoff_selects_every_block() -> pgincr::Result<()> {
    let dir = tempdir()?;
    let path = write_sample_file(dir.path());

    let (reader, predicted) = build(&path, SMALL_LSN);
    let all: Vec<u32> = (0..SAMPLE_PAGE_LSNS.len() as u32).collect();
    assert_eq!(reader.diff_map(), all.as_slice());
    assert!(predicted > SAMPLE_FILE_SIZE as u64, "full increment is larger than the file");
    Ok(())
}

#[test]
fn cutoff_past_every_page_selects_nothing() -> pgincr::Result<()> {
    let dir = tempdir()?;
    let path = write_sample_file(dir.path());

    let (mut reader, predicted) = build(&path, BIG_LSN);
    assert!(reader.diff_map().is_empty());
    assert_eq!(predicted, predicted_stream_size(0));

    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    let meta = read_increment_prelude(&mut buf.as_slice())?;
    assert_eq!(meta.file_size, SAMPLE_FILE_SIZE as u64);
    assert_eq!(meta.diff_block_count(), 0);
    Ok(())
}

#[test]
fn sample_cutoff_selects_strictly_newer_pages() -> pgincr::Result<()> {
    let dir = tempdir()?;
    let path = write_sample_file(dir.path());
    let content = sample_content();

    let bytes = increment_bytes(&path, SAMPLE_LSN);
    let mut stream = bytes.as_slice();
    let meta = read_increment_prelude(&mut stream)?;
    // Block 3 carries exactly the cutoff LSN and must not be selected.
    assert_eq!(meta.diff_map, SAMPLE_CHANGED_BLOCKS.to_vec());
    assert!((bytes.len() as u64) < SAMPLE_FILE_SIZE as u64);

    for (i, block) in meta.diff_map.iter().enumerate() {
        let payload = &stream[i * PAGE_SIZE..(i + 1) * PAGE_SIZE];
        assert_eq!(payload, page_of(&content, *block as usize));
    }
    assert_eq!(stream.len(), meta.diff_map.len() * PAGE_SIZE);
    Ok(())
}

#[test]
fn unreadable_pages_are_treated_as_changed() -> pgincr::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("16390");
    let mut content = Vec::new();
    content.extend(make_page(0x10, 1));
    content.extend(vec![0xAAu8; PAGE_SIZE]);
    content.extend(make_page(0x20, 2));
    content.extend(vec![0u8; PAGE_SIZE]);
    fs::write(&path, &content)?;

    let (reader, _) = build(&path, 0x100);
    // Garbage block 1 is included; the all-zero block 3 is not.
    assert_eq!(reader.diff_map(), &[1]);
    Ok(())
}

#[test]
fn known_changed_blocks_skip_the_scan() -> pgincr::Result<()> {
    let dir = tempdir()?;
    let path = write_sample_file(dir.path());
    let size = fs::metadata(&path)?.len();

    let changed: BTreeSet<u32> = [1, 3, 42].into_iter().collect();
    let (reader, predicted) = read_incremental_file(
        &path,
        size,
        Lsn(BIG_LSN),
        Some(&changed),
        &PostgresPageParser,
    )?;
    assert_eq!(reader.diff_map(), &[1, 3]);
    assert_eq!(predicted, predicted_stream_size(2));

    // A zero cutoff still means a full increment.
    let (reader, _) =
        read_incremental_file(&path, size, Lsn::INVALID, Some(&changed), &PostgresPageParser)?;
    assert_eq!(reader.diff_map().len(), SAMPLE_PAGE_LSNS.len());
    Ok(())
}

#[test]
fn injected_parser_decides_selection() -> pgincr::Result<()> {
    let dir = tempdir()?;
    let path = write_sample_file(dir.path());
    let size = fs::metadata(&path)?.len();

    // Treat the first byte of the tuple fill as the page's LSN.
    let parser = |page: &[u8]| -> pgincr::Result<Lsn> { Ok(Lsn(page[8000] as u64)) };
    let (reader, _) = read_incremental_file(&path, size, Lsn(0x14), None, &parser)?;
    assert_eq!(reader.diff_map(), &[5, 6, 7]);
    Ok(())
}

#[test]
fn small_reads_produce_the_same_stream() -> pgincr::Result<()> {
    let dir = tempdir()?;
    let path = write_sample_file(dir.path());
    let expected = increment_bytes(&path, SAMPLE_LSN);

    let (mut reader, _) = build(&path, SAMPLE_LSN);
    let mut out = Vec::new();
    let mut chunk = [0u8; 5];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }
    assert_eq!(out, expected);
    assert_eq!(&out[..2], b"wi");
    assert_eq!(out.len(), HEADER_SIZE + 12 + 4 * 4 + 4 * PAGE_SIZE);
    Ok(())
}

#[test]
fn file_truncated_after_scan_is_zero_padded() -> pgincr::Result<()> {
    let dir = tempdir()?;
    let path = write_sample_file(dir.path());

    let (mut reader, predicted) = build(&path, SMALL_LSN);
    fs::OpenOptions::new()
        .write(true)
        .open(&path)?
        .set_len(4 * PAGE_SIZE as u64)?;

    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    assert_eq!(buf.len() as u64, predicted);
    assert!(buf[buf.len() - PAGE_SIZE..].iter().all(|b| *b == 0));
    Ok(())
}
