//! Parser for FASTA files using noodles.
//!
//! Extracts contig names, lengths and GC proportions from FASTA files.
//! Files ending in `.gz` or `.bgz` are decompressed.

use std::io::BufRead;
use std::path::Path;

use noodles::fasta;

use crate::core::contig::{Contig, ContigTable};
use crate::parsing::open_text;
use crate::parsing::sam::ParseError;
use crate::utils::validation::check_contig_limit;

/// GC proportion of a sequence.
///
/// G and C over A, C, G and T, ignoring case; ambiguous bases are excluded
/// from the denominator. A sequence without unambiguous bases has GC 0.
#[must_use]
pub fn gc_proportion(sequence: &[u8]) -> f64 {
    let mut gc: u64 = 0;
    let mut acgt: u64 = 0;
    for base in sequence {
        match base.to_ascii_uppercase() {
            b'G' | b'C' => {
                gc += 1;
                acgt += 1;
            }
            b'A' | b'T' => acgt += 1,
            _ => {}
        }
    }

    if acgt == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        {
            gc as f64 / acgt as f64
        }
    }
}

/// Parse a FASTA file into a contig table without group assignments.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, `ParseError::InvalidFormat` if no contigs are found, or
/// `ParseError::TooManyContigs` if the limit is exceeded.
pub fn parse_fasta_file(path: &Path) -> Result<ContigTable, ParseError> {
    let mut reader = fasta::io::Reader::new(open_text(path)?);
    parse_fasta_reader(&mut reader)
}

/// Parse from a noodles FASTA reader
fn parse_fasta_reader<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
) -> Result<ContigTable, ParseError> {
    let mut table = ContigTable::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        // Check contig limit for DOS protection
        if check_contig_limit(table.len()).is_some() {
            return Err(ParseError::TooManyContigs(table.len()));
        }

        let name = String::from_utf8_lossy(record.name()).to_string();
        let sequence = record.sequence();
        let length = sequence.len() as u64;
        let gc = gc_proportion(sequence.as_ref());

        table.insert(Contig::new(name, length, gc));
    }

    if table.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(table)
}
