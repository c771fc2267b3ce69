//! Incremental page-file engine.
//!
//! Builds increment streams from relation files and reconciles them back into
//! full files. Each call owns its stream and target; nothing is shared across
//! calls.

pub mod apply;
pub mod codec;
pub mod reader;
pub mod restore;
pub mod target;

pub use apply::{
    apply_file_increment, create_file_from_increment, write_pages_from_increment, ApplyOptions,
};
pub use codec::{
    predicted_stream_size, read_header, read_increment_prelude, read_meta, write_header,
    IncrementMeta, INCREMENT_HEADER,
};
pub use reader::{read_incremental_file, IncrementReader};
pub use restore::restore_missing_pages;
pub use target::{MemoryTarget, ReadWriterAt};
