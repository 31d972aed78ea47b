//! Alignment record parser for SAM text.
//!
//! Only two columns matter for coverage: RNAME (column 3) and CIGAR (column 6).
//! Every `M` run in the CIGAR string is summed into a matched-base count.
//! `=` and `X` runs are not counted.

use std::io::BufRead;
use std::path::Path;
use thiserror::Error;

/// Minimum number of tab-separated fields of an alignment line
pub const MIN_SAM_FIELDS: usize = 11;

/// Reference name used by unmapped records
pub const UNMAPPED_REFERENCE: &str = "*";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Too many contigs: {0} exceeds maximum allowed ({max})", max = crate::utils::validation::MAX_CONTIGS)]
    TooManyContigs(usize),
}

/// Where an alignment record was placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Contig(String),
    Unmapped,
}

/// The parts of one alignment record needed for coverage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub reference: Reference,
    pub matched_bases: u64,
}

impl AlignmentRecord {
    pub fn new(contig: impl Into<String>, matched_bases: u64) -> Self {
        Self {
            reference: Reference::Contig(contig.into()),
            matched_bases,
        }
    }

    #[must_use]
    pub fn unmapped() -> Self {
        Self {
            reference: Reference::Unmapped,
            matched_bases: 0,
        }
    }
}

/// Parse one SAM line.
///
/// Returns `None` for header lines and any line with fewer than 11 fields.
#[must_use]
pub fn parse_alignment_line(line: &str) -> Option<AlignmentRecord> {
    let line = line.trim_end_matches(['\n', '\r']);
    let fields: Vec<&str> = line.splitn(MIN_SAM_FIELDS + 1, '\t').collect();
    if fields.len() < MIN_SAM_FIELDS {
        return None;
    }

    let reference = match fields[2] {
        UNMAPPED_REFERENCE => Reference::Unmapped,
        name => Reference::Contig(name.to_string()),
    };

    Some(AlignmentRecord {
        reference,
        matched_bases: cigar_matched_bases(fields[5]),
    })
}

/// Sum the lengths of all `M` operations in a CIGAR string.
///
/// Anything that is not a run of digits followed by an operation letter
/// contributes nothing, so `*` and garbage yield 0.
#[must_use]
pub fn cigar_matched_bases(cigar: &str) -> u64 {
    let mut total: u64 = 0;
    let mut run: Option<u64> = None;

    for c in cigar.chars() {
        if let Some(d) = c.to_digit(10) {
            run = Some(
                run.unwrap_or(0)
                    .saturating_mul(10)
                    .saturating_add(u64::from(d)),
            );
        } else {
            if c == 'M' {
                if let Some(len) = run {
                    total = total.saturating_add(len);
                }
            }
            run = None;
        }
    }

    total
}

/// Iterate over the alignment records of a SAM text stream, skipping header and short lines
pub fn records<R: BufRead>(reader: R) -> impl Iterator<Item = std::io::Result<AlignmentRecord>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) => parse_alignment_line(&line).map(Ok),
        Err(e) => Some(Err(e)),
    })
}

/// Open a SAM file (plain or gzip-compressed) as a record iterator
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_records(
    path: &Path,
) -> Result<impl Iterator<Item = std::io::Result<AlignmentRecord>>, ParseError> {
    let reader = crate::parsing::open_text(path)?;
    Ok(records(reader))
}
