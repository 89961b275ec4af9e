//! Hand-built `.ytx` fixtures
//!
//! Files are laid out byte by byte here, without going through the crate's
//! writer, so round-trip tests compare against an independent encoding.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Arbitrary bytes placed at the start of every fixture header
pub const HEADER_TAG: &[u8; 8] = b"YTX\x00\x01\x02\x03\x04";

/// A section given as `(section_id, [(entry_id, text)])`
pub type SectionDef<'a> = (u32, &'a [(u32, &'a str)]);

/// UTF-16BE, NUL-terminated, padded to 4 bytes
pub fn encode_string(text: &str) -> Vec<u8> {
    let mut blob: Vec<u8> = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
    blob.extend_from_slice(&[0, 0]);
    while blob.len() % 4 != 0 {
        blob.push(0);
    }
    blob
}

fn push_u32(out: &mut Vec<u8>, value: usize) {
    out.extend_from_slice(&u32::try_from(value).unwrap().to_be_bytes());
}

/// Lay out a complete file, POF0 table included.
pub fn build_ytx(sections: &[SectionDef<'_>]) -> Vec<u8> {
    let mut out = vec![0u8; 0x28];
    out[..8].copy_from_slice(HEADER_TAG);
    out[0x20..0x24].copy_from_slice(&(sections.len() as u32).to_be_bytes());
    out[0x24..0x28].copy_from_slice(&8u32.to_be_bytes());

    let string_areas: Vec<usize> = sections
        .iter()
        .map(|(_, entries)| entries.iter().map(|(_, t)| encode_string(t).len()).sum())
        .collect();

    // Section table
    let mut address = 0x28 + sections.len() * 12 - 0x20;
    for ((id, entries), area) in sections.iter().zip(&string_areas) {
        push_u32(&mut out, *id as usize);
        push_u32(&mut out, entries.len());
        push_u32(&mut out, address);
        address += entries.len() * 8 + area;
    }

    // Entry tables, each followed by its strings
    for (_, entries) in sections {
        let mut string_pos = out.len() + entries.len() * 8;
        let blobs: Vec<Vec<u8>> = entries.iter().map(|(_, t)| encode_string(t)).collect();
        for ((id, _), blob) in entries.iter().zip(&blobs) {
            push_u32(&mut out, *id as usize);
            push_u32(&mut out, string_pos - 0x20);
            string_pos += blob.len();
        }
        for blob in blobs {
            out.extend_from_slice(&blob);
        }
    }

    let pof0_address = out.len() - 0x20;
    out[0x1C..0x20].copy_from_slice(&(pof0_address as u32).to_be_bytes());

    let mut markers = vec![b'A'];
    markers.extend(std::iter::repeat_n(b'C', sections.len()));
    for (index, ((_, entries), area)) in sections.iter().zip(&string_areas).enumerate() {
        let skipped = usize::from(index > 0);
        markers.extend(std::iter::repeat_n(b'B', entries.len().saturating_sub(skipped)));
        if index + 1 < sections.len() {
            let words = area / 4;
            assert!(words < 0x7FFE, "fixture only emits short gap markers");
            markers.extend_from_slice(&((words + 0x8002) as u16).to_be_bytes());
        }
    }

    out.extend_from_slice(b"POF0");
    push_u32(&mut out, markers.len());
    out.extend_from_slice(&markers);
    out
}

/// Two sections of two entries each
pub fn two_by_two() -> Vec<u8> {
    build_ytx(&[
        (0x1, &[(0x10, "Hello"), (0x11, "World!")]),
        (0x2, &[(0x20, "Caf\u{e9}"), (0x21, "Goodbye")]),
    ])
}

/// Mixed content: surrogate pairs, empty strings, newlines, odd lengths
pub fn mixed() -> Vec<u8> {
    build_ytx(&[
        (0x1, &[(0x1, "A"), (0x2, ""), (0x3, "Line one\nLine two")]),
        (0x7, &[(0x100, "\u{1F600} smile"), (0x101, "\u{1D11E}")]),
        (0xABCD, &[(0x0, "abc")]),
    ])
}

/// Write fixture bytes to `dir/name`
pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
