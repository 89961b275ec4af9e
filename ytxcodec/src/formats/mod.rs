//! File format handlers

pub mod ytx;

// Re-export main document types
pub use ytx::{
    Entry, EntrySection, YtxFile, build_pof0, decode_pof0, decode_pof0_within, parse_ytx_bytes,
    read_ytx, reassemble, serialize_ytx, write_ytx,
};
