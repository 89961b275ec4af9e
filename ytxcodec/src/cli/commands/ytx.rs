//! CLI commands for .ytx string table operations

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use super::SaveArgs;
use crate::batch::{collect_stats, find_ytx_files};
use crate::cli::progress::{
    DISK, DOCUMENT, GEAR, LOOKING_GLASS, print_done, print_step, simple_bar, simple_spinner,
};
use crate::document::YtxDocument;
use crate::formats::ytx::{
    BASE_OFFSET, HEADER_SIZE, SECTION_TABLE_POINTER_OFFSET, YtxFile, parse_ytx_bytes,
    read_ytx, serialize_ytx,
};

#[derive(Serialize)]
struct EntryRow<'a> {
    section: u32,
    id: u32,
    string_address: Option<i32>,
    text: &'a str,
}

/// Show header values, sections and relocation info
pub fn info(path: &Path) -> anyhow::Result<()> {
    let data = std::fs::read(path)?;
    let file = parse_ytx_bytes(&data)?;

    let table_pointer = u32::from_be_bytes([
        data[SECTION_TABLE_POINTER_OFFSET],
        data[SECTION_TABLE_POINTER_OFFSET + 1],
        data[SECTION_TABLE_POINTER_OFFSET + 2],
        data[SECTION_TABLE_POINTER_OFFSET + 3],
    ]);

    println!("YTX Information: {}", path.display());
    println!();
    println!("File size: {} bytes", data.len());
    println!("Entry sections: {}", file.sections().len());
    println!("Entries: {}", file.entry_count());
    println!("Section table pointer: 0x{table_pointer:x}");
    println!(
        "POF0 address: 0x{:x} (file offset 0x{:x})",
        file.relocation_address,
        file.relocation_address as usize + BASE_OFFSET
    );
    println!("POF0 size: {} bytes", file.relocation_table.len());
    match file.relocation_offsets() {
        Ok(offsets) => println!("Relocated pointers: {}", offsets.len()),
        Err(e) => println!("Relocated pointers: unreadable ({e})"),
    }
    println!();

    println!("Sections:");
    for section in file.sections() {
        println!(
            "  0x{:08x}  {:>6} entries  at 0x{:x}  ({} string bytes)",
            section.id,
            section.entry_count(),
            section.base_address,
            section.string_area_size()
        );
    }

    Ok(())
}

/// List entries, optionally from a single section
pub fn list(path: &Path, section: Option<u32>, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let file = read_ytx(path)?;
    if let Some(id) = section.filter(|&id| file.section(id).is_none()) {
        anyhow::bail!("Section not found: 0x{id:x}");
    }

    let rows: Vec<EntryRow<'_>> = file
        .iter_entries()
        .filter(|(s, _)| section.is_none_or(|id| id == *s))
        .take(limit.unwrap_or(usize::MAX))
        .map(|(s, e)| EntryRow {
            section: s,
            id: e.id,
            string_address: e.string_address,
            text: &e.text,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        println!(
            "0x{:x}/0x{:x}  {}",
            row.section,
            row.id,
            truncate_text(row.text, 100)
        );
    }

    Ok(())
}

/// Print one entry's text
pub fn get(path: &Path, section: u32, id: u32) -> anyhow::Result<()> {
    let file = read_ytx(path)?;

    if file.section(section).is_none() {
        anyhow::bail!("Section not found: 0x{section:x}");
    }
    let Some(entry) = file.entry(id, section) else {
        anyhow::bail!("Entry not found: 0x{id:x} in section 0x{section:x}");
    };

    println!("{}", entry.text);
    Ok(())
}

/// Replace an entry's text and save
pub fn set(path: &Path, section: u32, id: u32, text: &str, save: &SaveArgs) -> anyhow::Result<()> {
    edit_and_save(path, save, |doc| {
        let previous = doc.set_entry_text(id, section, text)?;
        Ok(format!(
            "Updated entry 0x{id:x} in section 0x{section:x} (was: {})",
            truncate_text(&previous, 80)
        ))
    })
}

/// Append an entry and save
pub fn add(path: &Path, section: u32, id: u32, text: &str, save: &SaveArgs) -> anyhow::Result<()> {
    edit_and_save(path, save, |doc| {
        doc.add_entry(text, id, section)?;
        Ok(format!("Added entry 0x{id:x} to section 0x{section:x}"))
    })
}

/// Remove an entry and save
pub fn remove(path: &Path, section: u32, id: u32, save: &SaveArgs) -> anyhow::Result<()> {
    edit_and_save(path, save, |doc| {
        let removed = doc.remove_entry(id, section)?;
        Ok(format!(
            "Removed entry 0x{id:x} from section 0x{section:x} (text: {})",
            truncate_text(&removed.text, 80)
        ))
    })
}

/// Load, apply one edit, save
fn edit_and_save<F>(path: &Path, save: &SaveArgs, edit: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut YtxDocument) -> crate::Result<String>,
{
    let started = Instant::now();
    let quiet = save.quiet;

    if !quiet {
        print_step(1, 3, LOOKING_GLASS, &format!("Reading {}...", path.display()));
    }
    let mut doc = YtxDocument::open(path, save.options())?;

    if !quiet {
        print_step(2, 3, GEAR, "Applying edit...");
    }
    let summary = edit(&mut doc)?;

    if !quiet {
        print_step(3, 3, DISK, &format!("Writing {}...", doc.output_path().display()));
    }
    let spinner = (!quiet).then(|| simple_spinner("Reassembling"));
    let result = doc.save_changes();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = result?;

    println!("{summary}");
    for warning in &report.warnings {
        println!("  warning: {warning}");
    }
    if !quiet {
        println!(
            "Saved {} bytes ({} bytes of POF0) to {}",
            report.bytes_written,
            report.relocation_size,
            report.path.display()
        );
        print_done(started.elapsed());
    }

    Ok(())
}

/// Search entry text
pub fn search(
    path: &Path,
    query: &str,
    case_sensitive: bool,
    limit: usize,
    quiet: bool,
) -> anyhow::Result<()> {
    let file = read_ytx(path)?;
    let matches = file.find_entries(query, case_sensitive);

    if matches.is_empty() {
        if !quiet {
            println!("No entries found containing '{query}'");
        }
        return Ok(());
    }

    if !quiet {
        println!("Found {} entries containing '{}':", matches.len(), query);
        println!();
    }
    for (section, entry) in matches.iter().take(limit) {
        println!("0x{section:x}/0x{:x}", entry.id);
        if !quiet {
            println!("  {}", truncate_text(&entry.text, 100));
        }
    }

    Ok(())
}

/// Show statistics for files and directories
pub fn stats(paths: &[PathBuf], json: bool) -> anyhow::Result<()> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(find_ytx_files(path));
        } else {
            files.push(path.clone());
        }
    }

    if files.is_empty() {
        anyhow::bail!("No .ytx files found");
    }

    let pb = (!json).then(|| simple_bar(files.len() as u64, "Reading"));
    let batch = collect_stats(&files, |_, _, _| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    });
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    for stats in &batch.files {
        println!(
            "{}{}: {} sections, {} entries ({} empty), {} chars, {} string bytes, {} POF0 bytes",
            DOCUMENT,
            stats.path.display(),
            stats.sections,
            stats.entries,
            stats.empty_entries,
            stats.characters,
            stats.string_bytes,
            stats.relocation_size
        );
    }

    if batch.files.len() > 1 {
        let total = batch.total();
        println!();
        println!(
            "Total: {} files, {} sections, {} entries, {} chars, {} string bytes",
            batch.files.len(),
            total.sections,
            total.entries,
            total.characters,
            total.string_bytes
        );
    }

    if !batch.failures.is_empty() {
        println!();
        println!("Failed to read {} files:", batch.failures.len());
        for (path, error) in &batch.failures {
            println!("  {}: {}", path.display(), error);
        }
    }

    Ok(())
}

/// Byte ranges of the four file regions
struct Regions {
    section_table: usize,
    strings: usize,
    relocation: usize,
    len: usize,
}

impl Regions {
    fn of(file: &YtxFile, len: usize) -> Self {
        Self {
            section_table: HEADER_SIZE,
            strings: file.section_table_end(),
            relocation: file.relocation_address as usize + BASE_OFFSET,
            len,
        }
    }

    fn ranges(&self) -> [(&'static str, std::ops::Range<usize>); 4] {
        [
            ("header", 0..self.section_table),
            ("section table", self.section_table..self.strings),
            ("entries and strings", self.strings..self.relocation),
            ("POF0", self.relocation..self.len),
        ]
    }
}

/// Reassemble without edits and compare with the input
pub fn verify(path: &Path) -> anyhow::Result<()> {
    let original = std::fs::read(path)?;
    let mut file = parse_ytx_bytes(&original)?;
    let before = Regions::of(&file, original.len());

    let rebuilt = serialize_ytx(&mut file)?;
    let after = Regions::of(&file, rebuilt.len());

    println!("Verifying {}", path.display());
    let mut content_differs = false;
    for ((name, old), (_, new)) in before.ranges().into_iter().zip(after.ranges()) {
        let old_start = old.start;
        let old_bytes = original.get(old).unwrap_or_default();
        let new_bytes = rebuilt.get(new).unwrap_or_default();

        let first_diff = old_bytes
            .iter()
            .zip(new_bytes)
            .position(|(a, b)| a != b);
        match first_diff {
            None if old_bytes.len() == new_bytes.len() => {
                println!("  {name:<20} identical ({} bytes)", old_bytes.len());
                continue;
            }
            None => println!(
                "  {name:<20} length differs: {} -> {} bytes",
                old_bytes.len(),
                new_bytes.len()
            ),
            Some(offset) => println!(
                "  {name:<20} differs at file offset 0x{:x}",
                old_start + offset
            ),
        }
        if name != "POF0" {
            content_differs = true;
        }
    }

    if content_differs {
        anyhow::bail!("{} does not round-trip", path.display());
    }
    println!("Round-trip OK");
    Ok(())
}

/// Dump the pointer offsets listed in the POF0 table
pub fn relocs(path: &Path) -> anyhow::Result<()> {
    let data = std::fs::read(path)?;
    let file = parse_ytx_bytes(&data)?;
    let offsets = file.relocation_offsets()?;

    println!("{} relocated pointers in {}", offsets.len(), path.display());
    for offset in offsets {
        let absolute = offset as usize + BASE_OFFSET;
        match data.get(absolute..absolute + 4) {
            Some(bytes) => {
                let value = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                println!("  0x{offset:08x} (file 0x{absolute:08x}) -> 0x{value:08x}");
            }
            None => println!("  0x{offset:08x} (file 0x{absolute:08x}) -> past end of file"),
        }
    }

    Ok(())
}

/// Single-line preview, cut at `max_chars` characters
fn truncate_text(text: &str, max_chars: usize) -> String {
    let text = text.replace('\n', "\\n");
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text
    }
}
