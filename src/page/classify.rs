//! Decides whether a data directory file can be diffed page by page.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::PAGE_SIZE;

/// Relation segments are named `<relfilenode>` or `<relfilenode>.<segno>`.
fn relation_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)?$").expect("static regex"))
}

/// SLRU directories hold fixed-size files with numeric names but no page
/// header, so they are excluded by location alone.
fn slru_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(^|/)(pg_xact|pg_clog|pg_multixact/members|pg_multixact/offsets)/[^/]+$")
            .expect("static regex")
    })
}

/// Return true if the file at `path` is a relation segment eligible for
/// block-level increments.
pub fn is_paged_file(path: &Path, size: u64, is_dir: bool) -> bool {
    if is_dir || size == 0 || size % PAGE_SIZE as u64 != 0 {
        return false;
    }

    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return false,
    };
    if !relation_name_re().is_match(name) {
        return false;
    }

    let normalized = path.to_string_lossy().replace('\\', "/");
    !slru_path_re().is_match(&normalized)
}

/// Stat `path` and classify it. Unreadable metadata is treated as not paged.
pub fn is_paged_path(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => is_paged_file(path, meta.len(), meta.is_dir()),
        Err(_) => false,
    }
}
