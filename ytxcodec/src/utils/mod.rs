//! Utility functions

pub mod bytes;
pub mod path;
pub mod text;

pub use bytes::{ByteView, write_u32_be};
pub use path::{file_name, normalize_path, paths_equal};
pub use text::{encode_utf16_be, encoded_size, read_utf16_be, utf8_to_utf16, utf16_to_utf8};
