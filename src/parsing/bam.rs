//! BAM alignment source using noodles.
//!
//! Decodes the same [`AlignmentRecord`]s the SAM text parser produces, so the
//! coverage aggregator does not care which format a library came from.
//! [`read_totals`] provides the flagstat-style summary used for reconciliation.

use std::io::{self, Read};
use std::path::Path;

use noodles::bam;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::core::library::ReadTotals;
use crate::parsing::sam::{AlignmentRecord, ParseError, Reference};

/// Count all records and the records without the unmapped flag.
///
/// Secondary and supplementary records are included in both counts, like
/// `samtools flagstat`.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened or
/// `ParseError::Noodles` if decoding fails.
pub fn read_totals(path: &Path) -> Result<ReadTotals, ParseError> {
    let mut reader = std::fs::File::open(path).map(bam::io::Reader::new)?;
    reader
        .read_header()
        .map_err(|e| ParseError::Noodles(e.to_string()))?;

    let mut totals = ReadTotals::default();
    for result in reader.records() {
        let record = result.map_err(|e| ParseError::Noodles(e.to_string()))?;
        totals.total += 1;
        if !record.flags().is_unmapped() {
            totals.mapped += 1;
        }
    }

    Ok(totals)
}

/// Open a BAM file as a stream of alignment records.
///
/// Records with the unmapped flag come out as [`Reference::Unmapped`].
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened or
/// `ParseError::Noodles` if the header cannot be read.
pub fn open_records(
    path: &Path,
) -> Result<impl Iterator<Item = io::Result<AlignmentRecord>>, ParseError> {
    let mut reader = std::fs::File::open(path).map(bam::io::Reader::new)?;
    let header = reader
        .read_header()
        .map_err(|e| ParseError::Noodles(e.to_string()))?;

    let reference_names = header
        .reference_sequences()
        .keys()
        .map(ToString::to_string)
        .collect();

    Ok(BamRecords {
        reader,
        reference_names,
        record: bam::Record::default(),
    })
}

struct BamRecords<R> {
    reader: bam::io::Reader<R>,
    reference_names: Vec<String>,
    record: bam::Record,
}

impl<R: Read> Iterator for BamRecords<R> {
    type Item = io::Result<AlignmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(0) => None,
            Ok(_) => Some(to_alignment_record(&self.record, &self.reference_names)),
            Err(e) => Some(Err(e)),
        }
    }
}

fn to_alignment_record(
    record: &bam::Record,
    reference_names: &[String],
) -> io::Result<AlignmentRecord> {
    if record.flags().is_unmapped() {
        return Ok(AlignmentRecord::unmapped());
    }

    let Some(id) = record.reference_sequence_id().transpose()? else {
        return Ok(AlignmentRecord::unmapped());
    };

    let name = reference_names.get(id).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("reference sequence ID {id} is not in the header"),
        )
    })?;

    let mut matched_bases: u64 = 0;
    for op in record.cigar().iter() {
        let op = op?;
        if op.kind() == Kind::Match {
            matched_bases = matched_bases.saturating_add(op.len() as u64);
        }
    }

    Ok(AlignmentRecord {
        reference: Reference::Contig(name.clone()),
        matched_bases,
    })
}
