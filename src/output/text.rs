//! Human-readable report of duplicate groups.
//!
//! Groups are listed largest reclaimable space first, followed by a short
//! summary block.

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::duplicates::{DuplicateGroup, ScanSummary};

/// Text report formatter.
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    summary: &'a ScanSummary,
}

impl<'a> TextOutput<'a> {
    /// Create a new text formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a ScanSummary) -> Self {
        Self { groups, summary }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut ordered: Vec<&DuplicateGroup> = self.groups.iter().collect();
        ordered.sort_by(|a, b| {
            b.wasted_space()
                .cmp(&a.wasted_space())
                .then_with(|| a.files.first().cmp(&b.files.first()))
        });

        for (i, group) in ordered.iter().enumerate() {
            writeln!(
                writer,
                "Group {}: {} files, {} each, {} reclaimable (sha256 {})",
                i + 1,
                group.len(),
                ByteSize::b(group.size),
                ByteSize::b(group.wasted_space()),
                group.hash_hex()
            )?;
            for file in &group.files {
                writeln!(writer, "  {}", file.display())?;
            }
            writeln!(writer)?;
        }

        self.write_summary(writer)
    }

    fn write_summary<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let s = self.summary;
        if s.interrupted {
            writeln!(writer, "Scan interrupted; results are incomplete.")?;
        }
        writeln!(
            writer,
            "Scanned {} files ({}), {} skipped",
            s.total_files,
            s.total_size_display(),
            s.skipped.total()
        )?;
        if s.duplicate_groups == 0 {
            writeln!(writer, "No duplicates found.")?;
        } else {
            writeln!(
                writer,
                "Found {} duplicate groups, {} redundant files, {} reclaimable ({:.1}%)",
                s.duplicate_groups,
                s.duplicate_files,
                s.reclaimable_display(),
                s.wasted_percentage()
            )?;
        }
        if s.has_errors() {
            writeln!(writer, "{} files could not be read:", s.errors.len())?;
            for error in &s.errors {
                writeln!(writer, "  {error}")?;
            }
        }
        writeln!(writer, "Completed in {:.2?}", s.scan_duration)
    }
}
