//! `.ytx` file writing
//!
//! Reassembly rebuilds the whole file from the model: the section table is
//! laid out in one forward pass from the first section's original address,
//! each section's entry records are followed by its strings, and the POF0
//! table is regenerated at the end. Resolved addresses are only written back
//! into the model once the whole buffer has been produced.

use std::path::Path;

use byteorder::{BigEndian, WriteBytesExt};

use super::pof0::build_pof0;
use super::{
    BASE_OFFSET, ENTRY_RECORD_SIZE, EntrySection, HEADER_SIZE, RELOCATION_ADDRESS_OFFSET,
    SECTION_COUNT_OFFSET, YtxFile,
};
use crate::error::{Error, Result, Warning};
use crate::utils::text::STRING_ALIGNMENT;
use crate::utils::{encode_utf16_be, encoded_size, write_u32_be};

/// Output of a reassembly pass
#[derive(Debug, Clone)]
pub struct Reassembled {
    /// Complete file contents
    pub bytes: Vec<u8>,
    /// Non-fatal issues found while writing
    pub warnings: Vec<Warning>,
}

/// Reassemble and write a .ytx file to disk
///
/// # Errors
/// Returns an error if reassembly or file writing fails.
pub fn write_ytx<P: AsRef<Path>>(path: P, file: &mut YtxFile) -> Result<Vec<Warning>> {
    let reassembled = reassemble(file)?;
    std::fs::write(path, &reassembled.bytes)?;
    Ok(reassembled.warnings)
}

/// Reassemble a .ytx file into bytes
///
/// # Errors
/// See [`reassemble`].
pub fn serialize_ytx(file: &mut YtxFile) -> Result<Vec<u8>> {
    Ok(reassemble(file)?.bytes)
}

/// Rebuild the file contents and resolve every address in the model.
///
/// On success, each section's `base_address`, each entry's
/// `string_address`, and the file's relocation address and table are
/// updated to match the returned bytes. On failure the model is untouched.
///
/// Entries that were decoded lossily and not edited since are reported as
/// [`Warning::LossyText`] on every pass.
///
/// # Errors
///
/// - [`Error::SectionTableOverlap`] if the first section is anchored inside
///   the section table.
/// - [`Error::AddressOverflow`] if an offset no longer fits 32 bits.
/// - [`Error::GapMarkerOverflow`] if the POF0 table cannot be encoded.
pub fn reassemble(file: &mut YtxFile) -> Result<Reassembled> {
    tracing::info!("Reassembling {} entry sections", file.sections().len());
    let mut warnings = Vec::new();

    let mut output = file.header().to_vec();
    output.resize(HEADER_SIZE, 0);
    write_u32_be(
        &mut output,
        SECTION_COUNT_OFFSET,
        to_u32(file.sections().len(), "section count")?,
    );

    let section_addresses = write_section_table(&mut output, file)?;
    write_padding(&mut output, file, section_addresses.first().copied());

    let mut string_addresses = Vec::with_capacity(file.sections().len());
    for (section, &address) in file.sections().iter().zip(&section_addresses) {
        debug_assert_eq!(output.len(), address as usize + BASE_OFFSET);
        string_addresses.push(write_section(&mut output, section, &mut warnings)?);
    }

    for &(section, entry) in file.lossy_entries() {
        if file.entry(entry, section).is_some() {
            warnings.push(Warning::LossyText { section, entry });
        }
    }

    let relocation_address = to_i32(output.len() - BASE_OFFSET, "POF0 address")?;
    write_u32_be(
        &mut output,
        RELOCATION_ADDRESS_OFFSET,
        relocation_address as u32,
    );
    let relocation_table = build_pof0(file.sections())?;
    output.extend_from_slice(&relocation_table);

    // Everything resolved; commit addresses back into the model
    for ((section, address), strings) in file
        .sections_mut()
        .iter_mut()
        .zip(section_addresses)
        .zip(string_addresses)
    {
        section.base_address = address;
        for (entry, string_address) in section.entries_mut().iter_mut().zip(strings) {
            entry.string_address = Some(string_address);
        }
    }
    file.header = output[..HEADER_SIZE].to_vec();
    file.relocation_address = relocation_address;
    file.relocation_table = relocation_table;

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    tracing::info!(
        "File reassembled: 0x{:x} bytes, POF0 at 0x{:x} (0x{:x} bytes)",
        output.len(),
        relocation_address,
        file.relocation_table.len()
    );

    Ok(Reassembled {
        bytes: output,
        warnings,
    })
}

/// Append the section table and return each section's new address.
fn write_section_table(output: &mut Vec<u8>, file: &YtxFile) -> Result<Vec<i32>> {
    let table_end = (file.section_table_end() - BASE_OFFSET) as i64;
    let anchor = file
        .sections()
        .first()
        .map_or(table_end, |s| i64::from(s.base_address));

    if anchor < table_end {
        return Err(Error::SectionTableOverlap { anchor, table_end });
    }

    let mut addresses = Vec::with_capacity(file.sections().len());
    let mut running = anchor;
    for section in file.sections() {
        debug_assert_eq!(section.len(), section.entry_count() as usize);
        let address = to_i32(running, "section address")?;

        output.write_u32::<BigEndian>(section.id)?;
        output.write_u32::<BigEndian>(section.entry_count())?;
        output.write_u32::<BigEndian>(address as u32)?;
        tracing::debug!(
            "Section 0x{:x}: {} entries at 0x{:x}",
            section.id,
            section.len(),
            address
        );

        addresses.push(address);
        running += section.block_size() as i64;
    }

    Ok(addresses)
}

/// Fill the space between the section table and the first entry table.
fn write_padding(output: &mut Vec<u8>, file: &YtxFile, anchor: Option<i32>) {
    let Some(anchor) = anchor else {
        return;
    };
    let target = anchor as usize + BASE_OFFSET;
    let gap = target.saturating_sub(output.len());

    let kept = file.padding();
    let copied = kept.len().min(gap);
    output.extend_from_slice(&kept[..copied]);
    output.resize(target.max(output.len()), 0);
}

/// Append one section's entry records followed by its strings.
///
/// Returns the resolved string address of each entry.
fn write_section(
    output: &mut Vec<u8>,
    section: &EntrySection,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<i32>> {
    let entries = section.entries();
    let mut string_cursor = output.len() + entries.len() * ENTRY_RECORD_SIZE;

    let mut string_addresses = Vec::with_capacity(entries.len());
    for entry in entries {
        let string_address = to_i32(string_cursor - BASE_OFFSET, "string address")?;
        output.write_u32::<BigEndian>(entry.id)?;
        output.write_u32::<BigEndian>(string_address as u32)?;

        string_addresses.push(string_address);
        string_cursor += encoded_size(&entry.text);
    }

    let strings_start = output.len();
    for entry in entries {
        let blob = encode_utf16_be(&entry.text);
        if blob.len() % STRING_ALIGNMENT != 0 {
            warnings.push(Warning::Alignment {
                section: section.id,
                entry: Some(entry.id),
                size: blob.len(),
            });
        }
        output.extend_from_slice(&blob);
    }

    let area = output.len() - strings_start;
    if area % STRING_ALIGNMENT != 0 {
        warnings.push(Warning::Alignment {
            section: section.id,
            entry: None,
            size: area,
        });
    }
    debug_assert_eq!(output.len(), string_cursor);

    Ok(string_addresses)
}

fn to_i32<T: TryInto<i32>>(value: T, what: &'static str) -> Result<i32> {
    value.try_into().map_err(|_| Error::AddressOverflow { what })
}

fn to_u32<T: TryInto<u32>>(value: T, what: &'static str) -> Result<u32> {
    value.try_into().map_err(|_| Error::AddressOverflow { what })
}
