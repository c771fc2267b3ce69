use std::fs;
use std::path::Path;

use pgincr::page::{is_paged_file, is_paged_path, PAGE_SIZE};
use tempfile::tempdir;

const ONE_PAGE: u64 = PAGE_SIZE as u64;

#[test]
fn classifies_by_name_size_and_location() {
    let cases: &[(&str, &str, u64, bool, bool)] = &[
        ("directory", "base/16384", ONE_PAGE, true, false),
        ("empty file", "base/1/12345", 0, false, false),
        ("bad sized file", "base/1/12345", ONE_PAGE + 1, false, false),
        ("name starts with letter", "base/1/a.123", ONE_PAGE, false, false),
        ("name starts with dot", "base/1/.123", ONE_PAGE, false, false),
        ("fork suffix", "base/1/123_fsm", ONE_PAGE, false, false),
        ("digits only", "base/1/123", ONE_PAGE, false, true),
        ("digits separated by dot", "base/1/123.123", 2 * ONE_PAGE, false, true),
        ("two dots", "base/1/123.1.2", ONE_PAGE, false, false),
        ("global catalog", "global/1262", ONE_PAGE, false, true),
        ("pg_xact file", "~/DemoDb/pg_xact/0000", ONE_PAGE, false, false),
        ("pg_clog file", "data/pg_clog/0000", ONE_PAGE, false, false),
        (
            "pg_multixact members file",
            "~/DemoDb/pg_multixact/members/0000",
            ONE_PAGE,
            false,
            false,
        ),
        (
            "pg_multixact offsets file",
            "~/DemoDb/pg_multixact/offsets/0000",
            ONE_PAGE,
            false,
            false,
        ),
        ("relative pg_xact", "pg_xact/0000", ONE_PAGE, false, false),
    ];

    for (name, path, size, is_dir, expected) in cases {
        assert_eq!(
            is_paged_file(Path::new(path), *size, *is_dir),
            *expected,
            "case '{name}' ({path})"
        );
    }
}

#[test]
fn classifies_real_files_without_reading_them() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("base").join("5");
    fs::create_dir_all(&base).unwrap();
    let xact = dir.path().join("pg_xact");
    fs::create_dir_all(&xact).unwrap();

    fs::write(base.join("16384"), vec![7u8; PAGE_SIZE * 2]).unwrap();
    fs::write(base.join("16385"), b"short").unwrap();
    fs::write(base.join("PG_VERSION"), vec![0u8; PAGE_SIZE]).unwrap();
    fs::write(xact.join("0000"), vec![0u8; PAGE_SIZE]).unwrap();

    assert!(is_paged_path(&base.join("16384")));
    assert!(!is_paged_path(&base.join("16385")));
    assert!(!is_paged_path(&base.join("PG_VERSION")));
    assert!(!is_paged_path(&xact.join("0000")));
    assert!(!is_paged_path(&base));
    assert!(!is_paged_path(&base.join("missing")));
}
