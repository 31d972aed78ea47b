//! Parsers for the inputs of coverage and group statistics.
//!
//! This module provides parsers for:
//!
//! - **SAM text**: per-record reference name and matched bases ([`sam`])
//! - **BAM files**: the same records decoded with noodles, plus read totals ([`bam`])
//! - **Coverage tables**: per-contig read and base coverage saved by `cov` ([`cov`])
//! - **flagstat reports**: total and mapped read counts from saved `samtools flagstat` output
//! - **Contig tables**: tab-separated contig attributes and group assignments ([`contigs`])
//! - **FASTA files**: contig lengths and GC proportions ([`fasta`])
//!
//! Text inputs ending in `.gz` or `.bgz` are decompressed transparently.
//!
//! ## Example
//!
//! ```rust
//! use blobstats::parsing::sam::parse_alignment_line;
//!
//! let line = "read1\t0\tctg1\t1\t60\t10S40M\t*\t0\t0\tACGT\tIIII";
//! let record = parse_alignment_line(line).unwrap();
//! assert_eq!(record.matched_bases, 40);
//! ```

pub mod bam;
pub mod contigs;
pub mod cov;
pub mod fasta;
pub mod flagstat;
pub mod sam;

use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub(crate) fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Open a text file for buffered line reading, decompressing gzip/bgzip by extension
pub(crate) fn open_text(path: &Path) -> std::io::Result<Box<dyn BufRead + Send>> {
    let file = std::fs::File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
