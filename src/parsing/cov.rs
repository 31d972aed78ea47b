//! Read back a per-contig coverage table written by the `cov` subcommand.
//!
//! ```text
//! ## lib1
//! ## Total Reads = 4
//! ## Mapped Reads = 2
//! ## Unmapped Reads = 2
//! ## Parsed Mapped Reads = 2
//! # contig_id	length	read_cov	base_cov	depth
//! ctg1	5000	2	150	0.030
//! ```
//!
//! `##` lines carrying read totals are used; other comment lines are skipped.
//! Only the contig, read count and base coverage columns are read.

use std::io::BufRead;
use std::path::Path;

use crate::core::library::ReadTotals;
use crate::parsing::open_text;
use crate::parsing::sam::ParseError;

/// One contig row of a coverage table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageRow {
    pub contig: String,
    pub read_count: u64,
    pub base_coverage: u64,
}

/// A parsed coverage table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageTable {
    /// `Total Reads` and `Mapped Reads` from the header, when both are present
    pub reported: Option<ReadTotals>,
    /// `Parsed Mapped Reads` from the header
    pub parsed_mapped: Option<u64>,
    pub rows: Vec<CoverageRow>,
}

impl CoverageTable {
    /// Mapped reads counted when the table was written, else the sum of read counts
    #[must_use]
    pub fn mapped_reads(&self) -> u64 {
        self.parsed_mapped.unwrap_or_else(|| {
            self.rows
                .iter()
                .fold(0u64, |sum, row| sum.saturating_add(row.read_count))
        })
    }
}

/// Parse a coverage table file, gzip-aware
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` for a malformed row or header count.
pub fn parse_coverage_file(path: &Path) -> Result<CoverageTable, ParseError> {
    parse_coverage_table(open_text(path)?)
}

/// Parse coverage table text
///
/// # Errors
///
/// Returns `ParseError::Io` if reading fails, or `ParseError::InvalidFormat`
/// for a row with fewer than four columns or a non-numeric count.
pub fn parse_coverage_table<R: BufRead>(reader: R) -> Result<CoverageTable, ParseError> {
    let mut table = CoverageTable::default();
    let mut total = None;
    let mut mapped = None;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = line_num + 1;

        if let Some(header) = line.strip_prefix("##") {
            let Some((key, value)) = header.split_once('=') else {
                continue;
            };
            let slot = match key.trim() {
                "Total Reads" => &mut total,
                "Mapped Reads" => &mut mapped,
                "Parsed Mapped Reads" => &mut table.parsed_mapped,
                _ => continue,
            };
            *slot = Some(parse_count(value.trim(), line_num)?);
            continue;
        }
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num}: expected at least 4 columns, found {}",
                fields.len()
            )));
        }
        table.rows.push(CoverageRow {
            contig: fields[0].trim().to_string(),
            read_count: parse_count(fields[2].trim(), line_num)?,
            base_coverage: parse_count(fields[3].trim(), line_num)?,
        });
    }

    if let (Some(total), Some(mapped)) = (total, mapped) {
        table.reported = Some(ReadTotals::new(total, mapped));
    }

    Ok(table)
}

fn parse_count(value: &str, line_num: usize) -> Result<u64, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::InvalidFormat(format!("Line {line_num}: invalid count '{value}'")))
}
