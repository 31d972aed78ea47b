use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::library::ReadTotals;
use crate::coverage::progress::{Cadence, ProgressObserver};
use crate::parsing::cov::CoverageTable;
use crate::parsing::sam::{parse_alignment_line, AlignmentRecord, ParseError, Reference};

#[derive(Error, Debug)]
pub enum CoverageError {
    /// The alignments and the assembly disagree; the library cannot be used
    #[error("Contig '{contig}' referenced in {input} is not part of the assembly")]
    UnknownContig { contig: String, input: String },

    #[error("Failed to read alignments from {input}: {error}")]
    Io {
        input: String,
        #[source]
        error: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Accumulated coverage of one contig
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContigCoverage {
    /// Sum of matched bases over all records placed on the contig
    pub base_coverage: u64,
    /// Number of records with matched bases placed on the contig
    pub read_count: u64,
}

impl ContigCoverage {
    /// Mean per-base depth over a contig of the given length
    #[must_use]
    pub fn depth(&self, length: u64) -> f64 {
        if length == 0 {
            0.0
        } else {
            crate::utils::count_to_f64(self.base_coverage) / crate::utils::count_to_f64(length)
        }
    }
}

/// Per-contig coverage of one library
///
/// Only contigs that received coverage are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageAccumulator {
    entries: HashMap<String, ContigCoverage>,
}

impl CoverageAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one read with `matched_bases` aligned bases on `contig`
    pub fn add(&mut self, contig: &str, matched_bases: u64) {
        if let Some(entry) = self.entries.get_mut(contig) {
            entry.base_coverage = entry.base_coverage.saturating_add(matched_bases);
            entry.read_count += 1;
        } else {
            self.entries.insert(
                contig.to_string(),
                ContigCoverage {
                    base_coverage: matched_bases,
                    read_count: 1,
                },
            );
        }
    }

    /// Merge already accumulated coverage of `contig`
    pub fn add_coverage(&mut self, contig: &str, coverage: ContigCoverage) {
        let entry = self.entries.entry(contig.to_string()).or_default();
        entry.base_coverage = entry.base_coverage.saturating_add(coverage.base_coverage);
        entry.read_count = entry.read_count.saturating_add(coverage.read_count);
    }

    #[must_use]
    pub fn get(&self, contig: &str) -> Option<&ContigCoverage> {
        self.entries.get(contig)
    }

    /// Base coverage of a contig, 0 if it received none
    #[must_use]
    pub fn base_coverage(&self, contig: &str) -> u64 {
        self.entries.get(contig).map_or(0, |c| c.base_coverage)
    }

    /// Read count of a contig, 0 if it received none
    #[must_use]
    pub fn read_count(&self, contig: &str) -> u64 {
        self.entries.get(contig).map_or(0, |c| c.read_count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContigCoverage)> {
        self.entries.iter().map(|(name, cov)| (name.as_str(), cov))
    }

    /// Number of contigs with coverage
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A problem found during ingestion that does not invalidate the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestWarning {
    /// The reported and parsed mapped-read counts differ
    MappedReadMismatch { reported: u64, parsed: u64 },
}

impl std::fmt::Display for IngestWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MappedReadMismatch { reported, parsed } => write!(
                f,
                "reported mapped reads ({reported}) differ from parsed mapped reads ({parsed})"
            ),
        }
    }
}

/// Outcome of ingesting one alignment stream
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub accumulator: CoverageAccumulator,
    /// Well-formed records seen
    pub total_reads_parsed: u64,
    /// Records with at least one matched base
    pub mapped_reads_parsed: u64,
    pub warnings: Vec<IngestWarning>,
}

/// Compare the reported mapped-read count against the parsed one
#[must_use]
pub fn reconcile(reported: Option<ReadTotals>, mapped_reads_parsed: u64) -> Option<IngestWarning> {
    let reported = reported?;
    (reported.mapped != mapped_reads_parsed).then_some(IngestWarning::MappedReadMismatch {
        reported: reported.mapped,
        parsed: mapped_reads_parsed,
    })
}

/// Folds an alignment stream into per-contig coverage
///
/// Every record placed on a contig must reference a name from the known
/// contig set; the first one that does not aborts the ingestion.
pub struct CoverageAggregator<'a> {
    known_contigs: &'a HashSet<String>,
    input: String,
    reported: Option<ReadTotals>,
    progress: Option<&'a dyn ProgressObserver>,
}

impl<'a> CoverageAggregator<'a> {
    pub fn new(known_contigs: &'a HashSet<String>, input: impl Into<String>) -> Self {
        Self {
            known_contigs,
            input: input.into(),
            reported: None,
            progress: None,
        }
    }

    /// Counts from a separate summary query, used for reconciliation and progress
    #[must_use]
    pub fn with_reported(mut self, reported: Option<ReadTotals>) -> Self {
        self.reported = reported;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, observer: &'a dyn ProgressObserver) -> Self {
        self.progress = Some(observer);
        self
    }

    /// Ingest a stream of parsed alignment records
    ///
    /// # Errors
    ///
    /// Returns `CoverageError::UnknownContig` for a record placed on a contig
    /// outside the known set, or `CoverageError::Io` if the stream fails.
    pub fn ingest<I>(&self, records: I) -> Result<IngestResult, CoverageError>
    where
        I: IntoIterator<Item = io::Result<AlignmentRecord>>,
    {
        let cadence = Cadence::new(self.reported.map(|r| r.total));
        let mut accumulator = CoverageAccumulator::new();
        let mut total_reads_parsed: u64 = 0;
        let mut mapped_reads_parsed: u64 = 0;

        for record in records {
            let record = record.map_err(|error| CoverageError::Io {
                input: self.input.clone(),
                error,
            })?;

            total_reads_parsed += 1;
            if let Some(observer) = self.progress {
                if cadence.is_due(total_reads_parsed) {
                    observer.update(&self.input, total_reads_parsed, cadence.expected());
                }
            }

            let Reference::Contig(contig) = &record.reference else {
                continue;
            };
            if !self.known_contigs.contains(contig) {
                return Err(CoverageError::UnknownContig {
                    contig: contig.clone(),
                    input: self.input.clone(),
                });
            }
            if record.matched_bases > 0 {
                mapped_reads_parsed += 1;
                accumulator.add(contig, record.matched_bases);
            }
        }

        if let Some(observer) = self.progress {
            let done = cadence.final_count(total_reads_parsed);
            observer.update(&self.input, done, done);
        }

        let mut warnings = Vec::new();
        if let Some(warning) = reconcile(self.reported, mapped_reads_parsed) {
            warn!(input = %self.input, "{warning}");
            warnings.push(warning);
        }

        debug!(
            input = %self.input,
            total_reads_parsed,
            mapped_reads_parsed,
            contigs_covered = accumulator.len(),
            "Finished ingesting alignments"
        );

        Ok(IngestResult {
            accumulator,
            total_reads_parsed,
            mapped_reads_parsed,
            warnings,
        })
    }

    /// Ingest a saved per-contig coverage table
    ///
    /// The parsed total is the reported total when known, else the mapped count.
    ///
    /// # Errors
    ///
    /// Returns `CoverageError::UnknownContig` for a row naming a contig outside
    /// the known set.
    pub fn ingest_table(&self, table: &CoverageTable) -> Result<IngestResult, CoverageError> {
        let mut accumulator = CoverageAccumulator::new();

        for row in &table.rows {
            if !self.known_contigs.contains(&row.contig) {
                return Err(CoverageError::UnknownContig {
                    contig: row.contig.clone(),
                    input: self.input.clone(),
                });
            }
            if row.read_count > 0 || row.base_coverage > 0 {
                accumulator.add_coverage(
                    &row.contig,
                    ContigCoverage {
                        base_coverage: row.base_coverage,
                        read_count: row.read_count,
                    },
                );
            }
        }

        let mapped_reads_parsed = table.mapped_reads();
        let total_reads_parsed = self
            .reported
            .map_or(mapped_reads_parsed, |r| r.total.max(mapped_reads_parsed));

        if let Some(observer) = self.progress {
            let rows = table.rows.len() as u64;
            observer.update(&self.input, rows, rows);
        }

        let mut warnings = Vec::new();
        if let Some(warning) = reconcile(self.reported, mapped_reads_parsed) {
            warn!(input = %self.input, "{warning}");
            warnings.push(warning);
        }

        debug!(
            input = %self.input,
            rows = table.rows.len(),
            mapped_reads_parsed,
            contigs_covered = accumulator.len(),
            "Finished reading coverage table"
        );

        Ok(IngestResult {
            accumulator,
            total_reads_parsed,
            mapped_reads_parsed,
            warnings,
        })
    }

    /// Ingest raw SAM text lines; header and short lines are skipped
    ///
    /// # Errors
    ///
    /// Returns `CoverageError::UnknownContig` for a record placed on a contig
    /// outside the known set.
    pub fn ingest_lines<I, S>(&self, lines: I) -> Result<IngestResult, CoverageError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ingest(
            lines
                .into_iter()
                .filter_map(|line| parse_alignment_line(line.as_ref()).map(Ok)),
        )
    }
}
